//! Shared resources, events, and types for Meadowhive.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain directly.

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE — top-level state machine
// ═══════════════════════════════════════════════════════════════════════

/// `Loading` covers the persistence read at boot; all gameplay systems run
/// in `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
}

// ═══════════════════════════════════════════════════════════════════════
// HONEY TYPES
// ═══════════════════════════════════════════════════════════════════════

/// Closed set of honey categories. Types both orders and hive output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HoneyType {
    Light,
    Amber,
    Dark,
    Specialty,
    Wildflower,
}

impl HoneyType {
    pub const ALL: [HoneyType; 5] = [
        HoneyType::Light,
        HoneyType::Amber,
        HoneyType::Dark,
        HoneyType::Specialty,
        HoneyType::Wildflower,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            HoneyType::Light => "Light Honey",
            HoneyType::Amber => "Amber Honey",
            HoneyType::Dark => "Dark Honey",
            HoneyType::Specialty => "Specialty Honey",
            HoneyType::Wildflower => "Wildflower Blend",
        }
    }

    /// Coin reward per bottle in an order of this type.
    pub fn base_price(self) -> u64 {
        match self {
            HoneyType::Light => 15,
            HoneyType::Amber => 20,
            HoneyType::Dark => 25,
            HoneyType::Specialty => 35,
            HoneyType::Wildflower => 18,
        }
    }

    /// XP reward per bottle in an order of this type.
    pub fn base_xp(self) -> u64 {
        match self {
            HoneyType::Light => 10,
            HoneyType::Amber => 15,
            HoneyType::Dark => 20,
            HoneyType::Specialty => 30,
            HoneyType::Wildflower => 12,
        }
    }

    /// Crops whose pollination tends to yield this honey type. Used when
    /// picking an order category the player is likely able to fill.
    pub fn associated_crops(self) -> &'static [&'static str] {
        match self {
            HoneyType::Light => &["tomato"],
            HoneyType::Amber => &["blueberry", "sunflower"],
            HoneyType::Dark => &[],
            HoneyType::Specialty => &["lavender"],
            HoneyType::Wildflower => &[],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SKY & WEATHER — external provider output shapes
// ═══════════════════════════════════════════════════════════════════════

/// Coarse time-of-day bucket derived from the solar ephemeris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Dawn,
    Day,
    Dusk,
    Night,
}

/// One day's solar boundary times for a location, as handed to us by the
/// astronomy provider. We only consume these values, never compute them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub solar_noon: DateTime<Utc>,
    /// Civil dawn — morning twilight begins.
    pub dawn: DateTime<Utc>,
    /// Civil dusk — evening twilight ends.
    pub dusk: DateTime<Utc>,
    /// Evening golden hour begins.
    pub golden_hour: DateTime<Utc>,
    /// Morning golden hour ends.
    pub golden_hour_end: DateTime<Utc>,
    pub elevation_degrees: f64,
    pub azimuth_degrees: f64,
}

/// Point-in-time weather reading from the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f32,
    /// Wind speed in m/s.
    pub wind_speed: f32,
    pub cloud_cover_percent: f32,
    pub is_raining: bool,
}

/// Latest solar ephemeris, refreshed by whatever integration owns the
/// astronomy provider (every few minutes in the client). `None` until the
/// first report arrives.
#[derive(Resource, Debug, Clone, Default)]
pub struct SkyReport {
    pub sun: Option<SunTimes>,
}

/// Latest weather reading. `None` until the first report arrives.
#[derive(Resource, Debug, Clone, Default)]
pub struct WeatherReport {
    pub current: Option<WeatherSnapshot>,
}

// ═══════════════════════════════════════════════════════════════════════
// CLOCK
// ═══════════════════════════════════════════════════════════════════════

/// The single injected "now". Systems read this instead of calling into
/// chrono directly so every downstream computation stays testable.
#[derive(Resource, Debug, Clone)]
pub struct WallClock {
    pub now_utc: DateTime<Utc>,
    /// Local hour of day, 0-23.
    pub local_hour: u32,
    /// Calendar day string, `YYYY-MM-DD`. Empty until the first tick.
    pub today: String,
}

impl Default for WallClock {
    fn default() -> Self {
        Self {
            now_utc: DateTime::<Utc>::UNIX_EPOCH,
            local_hour: 0,
            today: String::new(),
        }
    }
}

/// Coarse hour-based day/night cycle. This is deliberately independent of
/// the sun-elevation classification in the almanac: the cycle drives the
/// bee population reset, the ephemeris drives the activity gate.
#[derive(Resource, Debug, Clone)]
pub struct DayNightState {
    pub is_daytime: bool,
    pub phase: TimeOfDay,
    pub hour: u32,
}

impl Default for DayNightState {
    fn default() -> Self {
        Self {
            is_daytime: false,
            phase: TimeOfDay::Night,
            hour: 0,
        }
    }
}

/// Output of the almanac gate, recomputed every tick.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct BeeActivityGate {
    /// Right time of day AND flyable weather.
    pub bees_active: bool,
    /// Inside one of the two honey accrual windows (wall clock).
    pub production_active: bool,
}

// ═══════════════════════════════════════════════════════════════════════
// PANTRY — player-held stock the economy settles against
// ═══════════════════════════════════════════════════════════════════════

/// A batch of bottled honey of a single type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoneyLot {
    pub honey_type: HoneyType,
    pub bottles: u32,
}

/// Player-held stock: coins, packaging, and bottled honey by type.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pantry {
    pub coins: u64,
    pub glass_bottles: u32,
    pub bottled_nectar: u32,
    pub bottled_honey: Vec<HoneyLot>,
}

impl Pantry {
    /// Total bottles held of the given honey type, across all lots.
    pub fn honey_stock(&self, honey_type: HoneyType) -> u32 {
        self.bottled_honey
            .iter()
            .filter(|lot| lot.honey_type == honey_type)
            .map(|lot| lot.bottles)
            .sum()
    }

    pub fn add_honey(&mut self, honey_type: HoneyType, bottles: u32) {
        if bottles == 0 {
            return;
        }
        if let Some(lot) = self
            .bottled_honey
            .iter_mut()
            .find(|lot| lot.honey_type == honey_type)
        {
            lot.bottles = lot.bottles.saturating_add(bottles);
        } else {
            self.bottled_honey.push(HoneyLot {
                honey_type,
                bottles,
            });
        }
    }

    /// Remove up to `bottles` of a honey type. Returns how many were
    /// actually removed. Drained lots are dropped from the list.
    pub fn try_remove_honey(&mut self, honey_type: HoneyType, bottles: u32) -> u32 {
        let mut remaining = bottles;
        for lot in self.bottled_honey.iter_mut() {
            if remaining == 0 {
                break;
            }
            if lot.honey_type == honey_type {
                let take = lot.bottles.min(remaining);
                lot.bottles -= take;
                remaining -= take;
            }
        }
        self.bottled_honey.retain(|lot| lot.bottles > 0);
        bottles - remaining
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HIVES
// ═══════════════════════════════════════════════════════════════════════

/// One placed beehive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hive {
    pub id: String,
    /// Bees housed in this hive (grown by pollination milestones).
    pub bee_count: u32,
    pub max_capacity: u32,
    /// Nectar gathered so far, 0-100. Ten nectar makes one bottled
    /// nectar.
    pub nectar: u32,
}

impl Hive {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bee_count: 0,
            max_capacity: DEFAULT_HIVE_CAPACITY,
            nectar: 0,
        }
    }

    pub fn free_capacity(&self) -> u32 {
        self.max_capacity.saturating_sub(self.bee_count)
    }
}

/// All placed hives plus the transient count of hover bees on screen.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct HiveLedger {
    pub hives: Vec<Hive>,
    /// Mirrored from `BeeCountChangedEvent`; display-only, not persisted.
    #[serde(skip)]
    pub ambient_bee_count: usize,
}

impl HiveLedger {
    pub fn hive_count(&self) -> u32 {
        self.hives.len() as u32
    }

    pub fn total_bees(&self) -> u32 {
        self.hives.iter().map(|h| h.bee_count).sum()
    }

    pub fn total_capacity(&self) -> u32 {
        self.hives.iter().map(|h| h.max_capacity).sum()
    }

    pub fn available_capacity(&self) -> u32 {
        self.total_capacity().saturating_sub(self.total_bees())
    }

    pub fn total_nectar(&self) -> u32 {
        self.hives.iter().map(|h| h.nectar).sum()
    }
}

/// Every crop kind the player has ever harvested. Grows monotonically;
/// feeds the "likely honey type" pick during order generation.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmingHistory {
    pub crops: BTreeSet<String>,
}

impl FarmingHistory {
    pub fn contains(&self, crop_id: &str) -> bool {
        self.crops.contains(crop_id)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SIMULATION RNG
// ═══════════════════════════════════════════════════════════════════════

/// Deterministic RNG resource for all simulation randomness.
///
/// Systems that need randomness take `ResMut<SimRng>` instead of
/// `rand::thread_rng()` so tests can seed the stream and assert exact
/// generated sequences.
#[derive(Resource)]
pub struct SimRng(pub ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }
}

impl SimRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// EXPERIENCE EVENT SHAPES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XpGainKind {
    Harvest,
    FirstHarvest,
    Pollination,
    Sale,
    Classification,
}

/// One XP gain, as shown in the event log. Award functions return these in
/// presentation order (regular gain before any first-time bonus).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpGain {
    pub kind: XpGainKind,
    pub amount: u64,
    pub description: String,
    pub crop_id: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

/// Sent by the plot interaction layer when the player harvests a crop.
#[derive(Event, Debug, Clone)]
pub struct CropHarvestedEvent {
    pub crop_id: String,
}

/// Sent when a bee completes a pollination visit.
#[derive(Event, Debug, Clone)]
pub struct PollinationEvent {
    pub amount: u32,
}

/// Sent by the classification UI when the player submits a sighting.
#[derive(Event, Debug, Clone)]
pub struct ClassificationEvent {
    pub hive_id: String,
    pub classification_kind: String,
}

/// Sent after a classification passes the per-hive daily limit check.
#[derive(Event, Debug, Clone)]
pub struct ClassificationRecordedEvent {
    pub hive_id: String,
}

/// One XP gain for event-log / toast consumers.
#[derive(Event, Debug, Clone)]
pub struct XpGainEvent {
    pub gain: XpGain,
}

/// Sent when total XP crosses a level boundary.
#[derive(Event, Debug, Clone)]
pub struct LevelUpEvent {
    pub new_level: u32,
}

/// Sent by the order UI to attempt settlement of one order.
#[derive(Event, Debug, Clone)]
pub struct OrderFulfillRequest {
    pub order_id: String,
}

/// Sent after an order settles successfully. Stock/bottle deduction and
/// coin banking have already happened by the time this fires; the ledger
/// picks up `xp_earned` from here.
#[derive(Event, Debug, Clone)]
pub struct OrderFulfilledEvent {
    pub order_id: String,
    pub honey_type: HoneyType,
    pub bottles: u32,
    pub coins_earned: u64,
    pub xp_earned: u64,
    pub was_reduced: bool,
}

/// Sent by the presentation layer when a hover bee's lifetime ends or it
/// flies off-screen.
#[derive(Event, Debug, Clone)]
pub struct DespawnBeeEvent {
    pub bee_id: u64,
}

/// Fired on every colony mutation with the new active count, so dependent
/// displays (hive occupancy) stay consistent. Having zero listeners is fine.
#[derive(Event, Debug, Clone, Copy)]
pub struct BeeCountChangedEvent {
    pub active_count: usize,
}

/// Sent by the UI to bottle 10 nectar into one bottled nectar.
#[derive(Event, Debug, Clone)]
pub struct BottleNectarRequest;

/// Fired by the clock when the local calendar day changes.
#[derive(Event, Debug, Clone)]
pub struct DayRolloverEvent {
    pub date: String,
}

/// Debug action: wipe all progression back to first-launch defaults.
#[derive(Event, Debug, Clone)]
pub struct ResetProgressEvent;

/// Transient user-facing notification.
#[derive(Event, Debug, Clone)]
pub struct ToastEvent {
    pub message: String,
    pub duration_secs: f32,
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

/// Default bee capacity of a single hive.
pub const DEFAULT_HIVE_CAPACITY: u32 = 10;
