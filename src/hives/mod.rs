//! Hive upkeep domain — nectar accrual, bottling, and classification.
//!
//! Responsible for:
//! - Accruing nectar into each hive while the activity gate is open
//! - Bottling 10 nectar + 1 glass bottle into one bottled nectar
//! - Enforcing the one-classification-per-hive-per-day limit and keeping
//!   the capped classification history
//! - Mirroring the hover-bee count into the ledger for the occupancy
//!   display

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::*;

/// Nectar gained per housed bee per accrual tick.
pub const NECTAR_ACCUMULATION_RATE: u32 = 1;
/// Per-hive nectar ceiling.
pub const MAX_NECTAR: u32 = 100;
/// Nectar needed (across all hives) for one bottled nectar.
pub const BOTTLE_CAPACITY: u32 = 10;
/// Nectar granted to every hive for a recorded classification.
pub const NECTAR_CLASSIFICATION_BONUS: u32 = 10;
/// Seconds between accrual ticks.
const ACCRUAL_INTERVAL_SECS: f32 = 60.0;

pub struct HivesPlugin;

impl Plugin for HivesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NectarTimer>()
            .init_resource::<DailyClassifications>()
            .init_resource::<ClassificationHistory>()
            .add_systems(
                Update,
                (
                    accrue_nectar,
                    handle_bottle_requests,
                    record_classifications,
                    sync_hover_count,
                )
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resources
// ─────────────────────────────────────────────────────────────────────────────

/// Fires one accrual tick per minute of real time.
#[derive(Resource, Debug)]
pub struct NectarTimer(pub Timer);

impl Default for NectarTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(ACCRUAL_INTERVAL_SECS, TimerMode::Repeating))
    }
}

/// Per-hive classification counts for the current calendar day.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct DailyClassifications {
    pub date: String,
    pub by_hive: HashMap<String, u32>,
    pub max_per_hive: u32,
}

impl Default for DailyClassifications {
    fn default() -> Self {
        Self {
            date: String::new(),
            by_hive: HashMap::new(),
            max_per_hive: 1,
        }
    }
}

impl DailyClassifications {
    /// Reset the counts when the day has moved on.
    pub fn roll_to(&mut self, today: &str) {
        if self.date != today {
            self.date = today.to_string();
            self.by_hive.clear();
        }
    }

    pub fn can_classify(&self, hive_id: &str) -> bool {
        self.by_hive.get(hive_id).copied().unwrap_or(0) < self.max_per_hive
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub hive_id: String,
    pub classification_kind: String,
    pub recorded_at: DateTime<Utc>,
    pub date: String,
}

/// Classification history for the almanac, capped to bound storage.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationHistory {
    pub entries: Vec<ClassificationRecord>,
}

impl ClassificationHistory {
    pub const MAX_ENTRIES: usize = 1000;

    pub fn push(&mut self, record: ClassificationRecord) {
        self.entries.push(record);
        if self.entries.len() > Self::MAX_ENTRIES {
            let excess = self.entries.len() - Self::MAX_ENTRIES;
            self.entries.drain(0..excess);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hive status projection
// ─────────────────────────────────────────────────────────────────────────────

/// Hive status shown on the hive card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiveStatus {
    /// Production window open and bees out working.
    Active,
    /// Production window open but the bees are idle (weather, no bees).
    Ready,
    /// Outside the production windows.
    Dormant,
}

pub fn hive_status(hive: &Hive, gate: &BeeActivityGate) -> HiveStatus {
    if !gate.production_active {
        HiveStatus::Dormant
    } else if gate.bees_active && hive.bee_count > 0 {
        HiveStatus::Active
    } else {
        HiveStatus::Ready
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nectar
// ─────────────────────────────────────────────────────────────────────────────

/// One accrual pass: every hive gains nectar in proportion to its housed
/// bees, capped at `MAX_NECTAR`.
pub fn accrue_nectar_tick(ledger: &mut HiveLedger) {
    for hive in ledger.hives.iter_mut() {
        let gain = hive.bee_count * NECTAR_ACCUMULATION_RATE;
        hive.nectar = (hive.nectar + gain).min(MAX_NECTAR);
    }
}

/// Drain `amount` nectar across hives in sorted-id order. Callers must
/// check `total_nectar()` first; short draining is a logic error.
fn drain_nectar(ledger: &mut HiveLedger, amount: u32) {
    let mut order: Vec<usize> = (0..ledger.hives.len()).collect();
    order.sort_by(|&a, &b| ledger.hives[a].id.cmp(&ledger.hives[b].id));

    let mut remaining = amount;
    for idx in order {
        if remaining == 0 {
            break;
        }
        let take = ledger.hives[idx].nectar.min(remaining);
        ledger.hives[idx].nectar -= take;
        remaining -= take;
    }
}

/// Bottle 10 nectar into one bottled nectar, consuming a glass bottle.
/// Returns false (leaving everything untouched) when either ingredient is
/// short.
pub fn bottle_nectar(ledger: &mut HiveLedger, pantry: &mut Pantry) -> bool {
    if pantry.glass_bottles < 1 || ledger.total_nectar() < BOTTLE_CAPACITY {
        return false;
    }

    drain_nectar(ledger, BOTTLE_CAPACITY);
    pantry.glass_bottles -= 1;
    pantry.bottled_nectar += 1;
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

pub fn accrue_nectar(
    time: Res<Time>,
    gate: Res<BeeActivityGate>,
    mut timer: ResMut<NectarTimer>,
    mut ledger: ResMut<HiveLedger>,
) {
    if !gate.bees_active {
        return;
    }

    timer.0.tick(time.delta());
    if timer.0.just_finished() {
        accrue_nectar_tick(&mut ledger);
    }
}

pub fn handle_bottle_requests(
    mut requests: EventReader<BottleNectarRequest>,
    mut ledger: ResMut<HiveLedger>,
    mut pantry: ResMut<Pantry>,
    mut toasts: EventWriter<ToastEvent>,
) {
    for _request in requests.read() {
        if bottle_nectar(&mut ledger, &mut pantry) {
            info!(
                "[Hives] Bottled nectar ({} bottled, {} nectar left)",
                pantry.bottled_nectar,
                ledger.total_nectar()
            );
        } else {
            toasts.send(ToastEvent {
                message: "Need a glass bottle and 10 nectar to bottle.".to_string(),
                duration_secs: 3.0,
            });
        }
    }
}

/// Gate classification submissions behind the per-hive daily limit. A
/// successful record grants the nectar bonus and feeds the experience
/// ledger via `ClassificationRecordedEvent`.
pub fn record_classifications(
    mut submissions: EventReader<ClassificationEvent>,
    clock: Res<WallClock>,
    mut daily: ResMut<DailyClassifications>,
    mut history: ResMut<ClassificationHistory>,
    mut ledger: ResMut<HiveLedger>,
    mut recorded: EventWriter<ClassificationRecordedEvent>,
    mut toasts: EventWriter<ToastEvent>,
) {
    for event in submissions.read() {
        daily.roll_to(&clock.today);

        if !daily.can_classify(&event.hive_id) {
            toasts.send(ToastEvent {
                message: "This hive was already classified today.".to_string(),
                duration_secs: 3.0,
            });
            continue;
        }

        *daily.by_hive.entry(event.hive_id.clone()).or_insert(0) += 1;
        history.push(ClassificationRecord {
            hive_id: event.hive_id.clone(),
            classification_kind: event.classification_kind.clone(),
            recorded_at: clock.now_utc,
            date: clock.today.clone(),
        });

        for hive in ledger.hives.iter_mut() {
            hive.nectar = (hive.nectar + NECTAR_CLASSIFICATION_BONUS).min(MAX_NECTAR);
        }

        info!(
            "[Hives] Classification recorded for {} ({})",
            event.hive_id, event.classification_kind
        );
        recorded.send(ClassificationRecordedEvent {
            hive_id: event.hive_id.clone(),
        });
    }
}

/// Keep the ledger's hover-bee count in step with the colony.
pub fn sync_hover_count(
    mut counts: EventReader<BeeCountChangedEvent>,
    mut ledger: ResMut<HiveLedger>,
) {
    for event in counts.read() {
        ledger.ambient_bee_count = event.active_count;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
