//! Hatching milestones: every 10 pollination factor houses a new bee.
//!
//! Each multiple-of-10 score is a milestone. When one is reached, the
//! player is owed as many housed bees as `factor / 10` minus the bees
//! already in hives, capped by free capacity; the award lands in the hive
//! with the most room. Processed milestones are recorded so restarts and
//! repeat evaluations never pay the same one twice.

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::*;

use super::PollinationFactor;

/// Factor points per milestone (and per housed bee).
pub const MILESTONE_INTERVAL: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollinationMilestone {
    pub score: u32,
    /// Zero when the milestone fired with every hive full.
    pub bees_awarded: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Processed milestones, in the order they fired.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilestoneLog {
    pub milestones: Vec<PollinationMilestone>,
}

impl MilestoneLog {
    pub fn last_processed_score(&self) -> u32 {
        self.milestones.iter().map(|m| m.score).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HatchOutcome {
    None,
    Hatched { hive_id: String, count: u32 },
    AtCapacity,
}

/// Run the milestone check against the current factor. Mutates the ledger
/// (housing new bees) and the log (recording the milestone) on a hit.
pub fn check_for_hatching(
    factor: u32,
    ledger: &mut HiveLedger,
    log: &mut MilestoneLog,
    now: DateTime<Utc>,
) -> HatchOutcome {
    let current_milestone = (factor / MILESTONE_INTERVAL) * MILESTONE_INTERVAL;
    if current_milestone == 0 || current_milestone <= log.last_processed_score() {
        return HatchOutcome::None;
    }

    let bees_deserved = factor / MILESTONE_INTERVAL;
    let owed = bees_deserved.saturating_sub(ledger.total_bees());
    if owed == 0 {
        return HatchOutcome::None;
    }

    if ledger.available_capacity() == 0 {
        // Milestone still counts as processed, otherwise it would retrigger
        // an alert on every evaluation.
        log.milestones.push(PollinationMilestone {
            score: current_milestone,
            bees_awarded: 0,
            recorded_at: now,
        });
        return HatchOutcome::AtCapacity;
    }

    let award = owed.min(ledger.available_capacity());

    // Hive with the most free space; first wins ties.
    let mut target_idx = 0;
    let mut best_free = 0;
    for (idx, hive) in ledger.hives.iter().enumerate() {
        if hive.free_capacity() > best_free {
            best_free = hive.free_capacity();
            target_idx = idx;
        }
    }

    // Overflow beyond one hive's room stays unhoused until more hives are
    // placed; the next milestone re-checks the shortfall.
    let granted = award.min(ledger.hives[target_idx].free_capacity());
    ledger.hives[target_idx].bee_count += granted;
    let hive_id = ledger.hives[target_idx].id.clone();

    log.milestones.push(PollinationMilestone {
        score: current_milestone,
        bees_awarded: granted,
        recorded_at: now,
    });

    HatchOutcome::Hatched {
        hive_id,
        count: granted,
    }
}

/// Re-run the milestone check whenever the factor moves.
pub fn run_hatching_check(
    factor: Res<PollinationFactor>,
    mut ledger: ResMut<HiveLedger>,
    mut log: ResMut<MilestoneLog>,
    clock: Res<WallClock>,
    mut toasts: EventWriter<ToastEvent>,
) {
    if !factor.is_changed() {
        return;
    }

    match check_for_hatching(factor.factor, &mut ledger, &mut log, clock.now_utc) {
        HatchOutcome::Hatched { hive_id, count } => {
            info!("[Bees] {} new bee(s) hatched into {}", count, hive_id);
            let message = if count == 1 {
                format!(
                    "Your pollination efforts attracted a new bee to {}! (Score: {})",
                    hive_id, factor.factor
                )
            } else {
                format!(
                    "Your pollination efforts attracted {} new bees! (Score: {})",
                    count, factor.factor
                )
            };
            toasts.send(ToastEvent {
                message,
                duration_secs: 4.0,
            });
        }
        HatchOutcome::AtCapacity => {
            toasts.send(ToastEvent {
                message: format!(
                    "Your hives are full! Place more hives to house new bees. (Score: {})",
                    factor.factor
                ),
                duration_secs: 4.0,
            });
        }
        HatchOutcome::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
    }

    fn ledger_with_hives(n: usize) -> HiveLedger {
        HiveLedger {
            hives: (0..n).map(|i| Hive::new(format!("hive-{}", i))).collect(),
            ambient_bee_count: 0,
        }
    }

    #[test]
    fn test_first_milestone_hatches() {
        let mut ledger = ledger_with_hives(1);
        let mut log = MilestoneLog::default();

        let outcome = check_for_hatching(10, &mut ledger, &mut log, now());
        assert_eq!(
            outcome,
            HatchOutcome::Hatched {
                hive_id: "hive-0".to_string(),
                count: 1
            }
        );
        assert_eq!(ledger.total_bees(), 1);
        assert_eq!(log.last_processed_score(), 10);
    }

    #[test]
    fn test_milestone_never_pays_twice() {
        let mut ledger = ledger_with_hives(1);
        let mut log = MilestoneLog::default();

        check_for_hatching(10, &mut ledger, &mut log, now());
        assert_eq!(
            check_for_hatching(10, &mut ledger, &mut log, now()),
            HatchOutcome::None
        );
        assert_eq!(ledger.total_bees(), 1);
        assert_eq!(log.milestones.len(), 1);
    }

    #[test]
    fn test_catches_up_across_skipped_milestones() {
        let mut ledger = ledger_with_hives(1);
        let mut log = MilestoneLog::default();

        // Jumping straight to 30 owes three bees at once.
        let outcome = check_for_hatching(30, &mut ledger, &mut log, now());
        assert_eq!(
            outcome,
            HatchOutcome::Hatched {
                hive_id: "hive-0".to_string(),
                count: 3
            }
        );
    }

    #[test]
    fn test_full_hives_record_zero_award() {
        let mut ledger = ledger_with_hives(1);
        ledger.hives[0].bee_count = ledger.hives[0].max_capacity;
        let mut log = MilestoneLog::default();

        // 110 factor deserves 11 bees but all 10 slots are taken.
        assert_eq!(
            check_for_hatching(110, &mut ledger, &mut log, now()),
            HatchOutcome::AtCapacity
        );
        assert_eq!(log.milestones.len(), 1);
        assert_eq!(log.milestones[0].bees_awarded, 0);

        // And the milestone does not retrigger.
        assert_eq!(
            check_for_hatching(110, &mut ledger, &mut log, now()),
            HatchOutcome::None
        );
    }

    #[test]
    fn test_award_goes_to_roomiest_hive() {
        let mut ledger = ledger_with_hives(2);
        ledger.hives[0].bee_count = 8;
        let mut log = MilestoneLog::default();

        let outcome = check_for_hatching(100, &mut ledger, &mut log, now());
        let HatchOutcome::Hatched { hive_id, count } = outcome else {
            panic!("expected a hatch");
        };
        assert_eq!(hive_id, "hive-1");
        // 10 deserved, 8 housed -> 2 owed, hive-1 has room for both.
        assert_eq!(count, 2);
        assert_eq!(ledger.hives[1].bee_count, 2);
    }

    #[test]
    fn test_no_hatch_when_already_housed() {
        let mut ledger = ledger_with_hives(1);
        ledger.hives[0].bee_count = 3;
        let mut log = MilestoneLog::default();

        // 20 factor deserves 2 bees; 3 already housed.
        assert_eq!(
            check_for_hatching(20, &mut ledger, &mut log, now()),
            HatchOutcome::None
        );
    }
}
