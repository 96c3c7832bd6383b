//! Hover-bee population model.
//!
//! A pollination-factor score drives a target bee count: one bee per 5
//! factor, capped by total hive capacity. Bees spawn one at a time on
//! threshold crossings and are despawned by the presentation layer when
//! their hover animation ends. At night the whole set is cleared at once.

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::shared::*;

use super::PollinationFactor;

/// Factor points per hover bee.
pub const FACTOR_PER_BEE: u32 = 5;

/// One hover bee. Lifetime is owned by the presentation layer; the colony
/// only tracks membership.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bee {
    pub id: u64,
    pub spawned_at: DateTime<Utc>,
}

/// What a single evaluation did to the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColonyChange {
    None,
    /// Night reset removed every active bee.
    Cleared,
    Spawned(u64),
}

/// The active hover-bee set, keyed by id for O(1) removal.
#[derive(Resource, Debug, Default)]
pub struct BeeColony {
    active: HashMap<u64, Bee>,
    next_bee_id: u64,
    last_factor: u32,
}

impl BeeColony {
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn contains(&self, bee_id: u64) -> bool {
        self.active.contains_key(&bee_id)
    }

    pub fn bees(&self) -> impl Iterator<Item = &Bee> {
        self.active.values()
    }

    /// How many bees the current factor supports, capped by hive capacity.
    pub fn target_count(factor: u32, hive_count: u32) -> usize {
        let from_factor = factor / FACTOR_PER_BEE;
        from_factor.min(DEFAULT_HIVE_CAPACITY * hive_count) as usize
    }

    /// One evaluation of the model against a new factor reading.
    ///
    /// Not daytime: hard reset, no fade. Daytime: spawn at most ONE bee,
    /// and only when the floored factor/5 step increased since the last
    /// evaluation, the factor has reached 5 at all, and the set is below
    /// target. A jump across several thresholds still spawns a single bee.
    ///
    /// The night branch leaves `last_factor` untouched, so a factor that
    /// grew overnight still registers as a crossing on the first daytime
    /// evaluation.
    pub fn evaluate(
        &mut self,
        factor: u32,
        hive_count: u32,
        is_daytime: bool,
        now: DateTime<Utc>,
    ) -> ColonyChange {
        if !is_daytime {
            if self.active.is_empty() {
                return ColonyChange::None;
            }
            self.active.clear();
            return ColonyChange::Cleared;
        }

        let target = Self::target_count(factor, hive_count);
        let current_step = factor / FACTOR_PER_BEE;
        let last_step = self.last_factor / FACTOR_PER_BEE;

        let mut change = ColonyChange::None;
        if current_step > last_step
            && factor >= FACTOR_PER_BEE
            && self.active.len() < target
        {
            let id = self.next_bee_id;
            self.next_bee_id += 1;
            self.active.insert(id, Bee { id, spawned_at: now });
            change = ColonyChange::Spawned(id);
        }

        self.last_factor = factor;
        change
    }

    /// Remove a bee by id. Returns whether it was present.
    pub fn despawn(&mut self, bee_id: u64) -> bool {
        self.active.remove(&bee_id).is_some()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

/// Poll the model once per tick against the latest factor, hive count, and
/// day/night flag. Every mutation publishes the new count so the hive
/// occupancy display stays consistent.
pub fn evaluate_colony(
    factor: Res<PollinationFactor>,
    ledger: Res<HiveLedger>,
    cycle: Res<DayNightState>,
    clock: Res<WallClock>,
    mut colony: ResMut<BeeColony>,
    mut count_events: EventWriter<BeeCountChangedEvent>,
) {
    let change = colony.evaluate(
        factor.factor,
        ledger.hive_count(),
        cycle.is_daytime,
        clock.now_utc,
    );

    match change {
        ColonyChange::Spawned(id) => {
            info!(
                "[Bees] Spawned bee {} (factor {}, active {})",
                id,
                factor.factor,
                colony.active_count()
            );
            count_events.send(BeeCountChangedEvent {
                active_count: colony.active_count(),
            });
        }
        ColonyChange::Cleared => {
            info!("[Bees] Night reset — cleared active bees");
            count_events.send(BeeCountChangedEvent { active_count: 0 });
        }
        ColonyChange::None => {}
    }
}

/// Handle despawn requests from the presentation layer.
pub fn despawn_bees(
    mut despawns: EventReader<DespawnBeeEvent>,
    mut colony: ResMut<BeeColony>,
    mut count_events: EventWriter<BeeCountChangedEvent>,
) {
    for event in despawns.read() {
        if colony.despawn(event.bee_id) {
            count_events.send(BeeCountChangedEvent {
                active_count: colony.active_count(),
            });
        } else {
            warn!("[Bees] Despawn request for unknown bee {}", event.bee_id);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
