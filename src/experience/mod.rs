//! Player experience ledger.
//!
//! Every meaningful action (harvesting, pollination visits, bee
//! classification, honey sales) feeds a single XP total. Level is a pure
//! function of that total: it is recomputed after every award and again on
//! load, so a stale persisted level can never disagree with the XP that
//! backs it.
//!
//! The curve is a sliding scale: level 2 costs 100 XP, and each level after
//! that costs 75 more than the one before (thresholds 0, 100, 275, 525,
//! 850, 1250, ...).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::shared::*;

// ─── Level curve ─────────────────────────────────────────────────────────────

const BASE_LEVEL_XP: u64 = 100;
const LEVEL_XP_STEP: u64 = 75;

/// Total XP required to reach `level`. Level 1 is the floor and costs
/// nothing.
pub fn xp_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    let mut total = 0;
    for i in 2..=level as u64 {
        total += BASE_LEVEL_XP + (i - 2) * LEVEL_XP_STEP;
    }
    total
}

/// The largest level whose threshold is at or below `total_xp`. Hitting a
/// threshold exactly unlocks that level.
pub fn level_for_xp(total_xp: u64) -> u32 {
    let mut level = 1;
    while xp_for_level(level + 1) <= total_xp {
        level += 1;
    }
    level
}

/// Within-level progress for the XP bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub level: u32,
    pub xp_into_level: u64,
    pub xp_for_next: u64,
    /// 0.0-1.0 fraction of the way to the next level.
    pub progress: f32,
}

pub fn xp_progress(total_xp: u64) -> LevelProgress {
    let level = level_for_xp(total_xp);
    let floor = xp_for_level(level);
    let ceiling = xp_for_level(level + 1);

    let xp_into_level = total_xp - floor;
    let xp_for_next = ceiling - floor;
    let progress = if xp_for_next > 0 {
        (xp_into_level as f32 / xp_for_next as f32).min(1.0)
    } else {
        1.0
    };

    LevelProgress {
        level,
        xp_into_level,
        xp_for_next,
        progress,
    }
}

// ─── Resource ────────────────────────────────────────────────────────────────

/// Persistent experience ledger. `level`, `xp_at_level_start`, and
/// `xp_for_next_level` are derived from `total_xp` — `recalculate` keeps
/// them honest after every mutation and after every load.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceState {
    pub total_xp: u64,
    pub level: u32,
    pub harvests_count: u64,
    /// Crop kinds harvested at least once. Grows monotonically; gates the
    /// one-shot first-harvest bonus.
    pub unique_harvest_kinds: BTreeSet<String>,
    pub pollination_event_count: u64,
    pub sales_completed_count: u64,
    pub classification_count: u64,
    pub xp_at_level_start: u64,
    pub xp_for_next_level: u64,
}

impl Default for ExperienceState {
    fn default() -> Self {
        Self {
            total_xp: 0,
            level: 1,
            harvests_count: 0,
            unique_harvest_kinds: BTreeSet::new(),
            pollination_event_count: 0,
            sales_completed_count: 0,
            classification_count: 0,
            xp_at_level_start: 0,
            xp_for_next_level: xp_for_level(2),
        }
    }
}

impl ExperienceState {
    /// XP for one harvest.
    pub const HARVEST_XP: u64 = 1;
    /// Bonus for the first harvest of a new crop kind.
    pub const FIRST_HARVEST_XP: u64 = 10;
    /// XP per pollination visit.
    pub const POLLINATION_XP: u64 = 10;
    /// XP per submitted classification.
    pub const CLASSIFICATION_XP: u64 = 10;

    /// Recompute the derived level fields from `total_xp`.
    pub fn recalculate(&mut self) {
        self.level = level_for_xp(self.total_xp);
        self.xp_at_level_start = xp_for_level(self.level);
        self.xp_for_next_level = xp_for_level(self.level + 1);
    }

    /// Award XP for harvesting a crop: +1 always, +10 more the first time
    /// this kind is ever harvested. Returns the gains in presentation
    /// order: regular first, bonus second.
    pub fn award_harvest(&mut self, crop_kind: &str) -> Vec<XpGain> {
        let mut gains = Vec::with_capacity(2);

        self.total_xp += Self::HARVEST_XP;
        self.harvests_count += 1;
        gains.push(XpGain {
            kind: XpGainKind::Harvest,
            amount: Self::HARVEST_XP,
            description: format!("Harvested {}", crop_kind),
            crop_id: Some(crop_kind.to_string()),
        });

        if self.unique_harvest_kinds.insert(crop_kind.to_string()) {
            self.total_xp += Self::FIRST_HARVEST_XP;
            gains.push(XpGain {
                kind: XpGainKind::FirstHarvest,
                amount: Self::FIRST_HARVEST_XP,
                description: format!("First time harvesting {}!", crop_kind),
                crop_id: Some(crop_kind.to_string()),
            });
        }

        self.recalculate();
        gains
    }

    /// Award XP for a pollination visit.
    pub fn award_pollination(&mut self) -> XpGain {
        self.total_xp += Self::POLLINATION_XP;
        self.pollination_event_count += 1;
        self.recalculate();

        XpGain {
            kind: XpGainKind::Pollination,
            amount: Self::POLLINATION_XP,
            description: "Pollination recorded!".to_string(),
            crop_id: None,
        }
    }

    /// Award XP for a bee classification.
    pub fn award_classification(&mut self) -> XpGain {
        self.total_xp += Self::CLASSIFICATION_XP;
        self.classification_count += 1;
        self.recalculate();

        XpGain {
            kind: XpGainKind::Classification,
            amount: Self::CLASSIFICATION_XP,
            description: "Bee classification completed!".to_string(),
            crop_id: None,
        }
    }

    /// Award XP for a completed honey sale. The amount is whatever the
    /// order economy settled on, quota reduction included; it is not
    /// recomputed here.
    pub fn award_sale(&mut self, xp_amount: u64, honey_type: HoneyType, bottles: u32) -> XpGain {
        self.total_xp += xp_amount;
        self.sales_completed_count += 1;
        self.recalculate();

        XpGain {
            kind: XpGainKind::Sale,
            amount: xp_amount,
            description: format!(
                "Sold {} bottles of {}!",
                bottles,
                honey_type.display_name()
            ),
            crop_id: None,
        }
    }
}

// ─── Plugin ──────────────────────────────────────────────────────────────────

pub struct ExperiencePlugin;

impl Plugin for ExperiencePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ExperienceState>().add_systems(
            Update,
            (
                award_harvest_xp,
                award_pollination_xp,
                award_classification_xp,
                award_sale_xp,
                handle_progress_reset,
            )
                .run_if(in_state(GameState::Playing)),
        );
    }
}

// ─── Systems ─────────────────────────────────────────────────────────────────

/// Shared tail of every award system: publish the gains and announce a
/// level-up if one happened.
fn publish_gains(
    gains: Vec<XpGain>,
    prev_level: u32,
    state: &ExperienceState,
    xp_events: &mut EventWriter<XpGainEvent>,
    level_events: &mut EventWriter<LevelUpEvent>,
    toasts: &mut EventWriter<ToastEvent>,
) {
    for gain in gains {
        xp_events.send(XpGainEvent { gain });
    }

    if state.level > prev_level {
        info!("[Experience] Level up! Now level {}", state.level);
        level_events.send(LevelUpEvent {
            new_level: state.level,
        });
        toasts.send(ToastEvent {
            message: format!("Level up! You reached level {}", state.level),
            duration_secs: 4.0,
        });
    }
}

pub fn award_harvest_xp(
    mut harvests: EventReader<CropHarvestedEvent>,
    mut state: ResMut<ExperienceState>,
    mut history: ResMut<FarmingHistory>,
    mut xp_events: EventWriter<XpGainEvent>,
    mut level_events: EventWriter<LevelUpEvent>,
    mut toasts: EventWriter<ToastEvent>,
) {
    for event in harvests.read() {
        let prev_level = state.level;
        let gains = state.award_harvest(&event.crop_id);
        history.crops.insert(event.crop_id.clone());
        publish_gains(
            gains,
            prev_level,
            &state,
            &mut xp_events,
            &mut level_events,
            &mut toasts,
        );
    }
}

pub fn award_pollination_xp(
    mut pollinations: EventReader<PollinationEvent>,
    mut state: ResMut<ExperienceState>,
    mut xp_events: EventWriter<XpGainEvent>,
    mut level_events: EventWriter<LevelUpEvent>,
    mut toasts: EventWriter<ToastEvent>,
) {
    for _event in pollinations.read() {
        let prev_level = state.level;
        let gain = state.award_pollination();
        publish_gains(
            vec![gain],
            prev_level,
            &state,
            &mut xp_events,
            &mut level_events,
            &mut toasts,
        );
    }
}

pub fn award_classification_xp(
    mut recorded: EventReader<ClassificationRecordedEvent>,
    mut state: ResMut<ExperienceState>,
    mut xp_events: EventWriter<XpGainEvent>,
    mut level_events: EventWriter<LevelUpEvent>,
    mut toasts: EventWriter<ToastEvent>,
) {
    for _event in recorded.read() {
        let prev_level = state.level;
        let gain = state.award_classification();
        publish_gains(
            vec![gain],
            prev_level,
            &state,
            &mut xp_events,
            &mut level_events,
            &mut toasts,
        );
    }
}

pub fn award_sale_xp(
    mut fulfilled: EventReader<OrderFulfilledEvent>,
    mut state: ResMut<ExperienceState>,
    mut xp_events: EventWriter<XpGainEvent>,
    mut level_events: EventWriter<LevelUpEvent>,
    mut toasts: EventWriter<ToastEvent>,
) {
    for event in fulfilled.read() {
        let prev_level = state.level;
        let gain = state.award_sale(event.xp_earned, event.honey_type, event.bottles);
        publish_gains(
            vec![gain],
            prev_level,
            &state,
            &mut xp_events,
            &mut level_events,
            &mut toasts,
        );
    }
}

/// Debug reset: wipe the ledger back to first-launch defaults.
pub fn handle_progress_reset(
    mut resets: EventReader<ResetProgressEvent>,
    mut state: ResMut<ExperienceState>,
) {
    for _event in resets.read() {
        warn!("[Experience] Progress reset requested — wiping ledger");
        *state = ExperienceState::default();
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_thresholds() {
        assert_eq!(xp_for_level(1), 0);
        assert_eq!(xp_for_level(2), 100);
        assert_eq!(xp_for_level(3), 275);
        assert_eq!(xp_for_level(4), 525);
        assert_eq!(xp_for_level(5), 850);
        assert_eq!(xp_for_level(6), 1250);
    }

    #[test]
    fn test_threshold_unlocks_its_level() {
        for level in 1..=30 {
            assert_eq!(level_for_xp(xp_for_level(level)), level);
            if level >= 2 {
                assert_eq!(level_for_xp(xp_for_level(level) - 1), level - 1);
            }
        }
    }

    #[test]
    fn test_level_for_xp_monotonic() {
        let mut last = 0;
        for xp in (0..5000).step_by(7) {
            let level = level_for_xp(xp);
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    fn test_progress_fraction() {
        // 150 XP: level 2 (floor 100), 50/175 of the way to level 3.
        let progress = xp_progress(150);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.xp_into_level, 50);
        assert_eq!(progress.xp_for_next, 175);
        assert!((progress.progress - 50.0 / 175.0).abs() < 1e-6);

        // At an exact threshold, progress restarts at zero.
        let at_threshold = xp_progress(100);
        assert_eq!(at_threshold.level, 2);
        assert_eq!(at_threshold.xp_into_level, 0);
        assert!(at_threshold.progress.abs() < 1e-6);
    }

    #[test]
    fn test_double_harvest_same_kind() {
        let mut state = ExperienceState::default();

        let first = state.award_harvest("tomato");
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].kind, XpGainKind::Harvest);
        assert_eq!(first[1].kind, XpGainKind::FirstHarvest);

        let second = state.award_harvest("tomato");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].kind, XpGainKind::Harvest);

        assert_eq!(state.total_xp, 12);
        assert_eq!(state.harvests_count, 2);
        assert_eq!(state.unique_harvest_kinds.len(), 1);
        assert!(state.unique_harvest_kinds.contains("tomato"));
    }

    #[test]
    fn test_bonus_is_per_kind() {
        let mut state = ExperienceState::default();
        state.award_harvest("tomato");
        state.award_harvest("lavender");
        // 1 + 10 twice.
        assert_eq!(state.total_xp, 22);
        assert_eq!(state.unique_harvest_kinds.len(), 2);
    }

    #[test]
    fn test_flat_awards() {
        let mut state = ExperienceState::default();
        state.award_pollination();
        state.award_classification();
        assert_eq!(state.total_xp, 20);
        assert_eq!(state.pollination_event_count, 1);
        assert_eq!(state.classification_count, 1);
    }

    #[test]
    fn test_sale_uses_supplied_amount() {
        let mut state = ExperienceState::default();
        let gain = state.award_sale(45, HoneyType::Amber, 3);
        assert_eq!(gain.amount, 45);
        assert_eq!(state.total_xp, 45);
        assert_eq!(state.sales_completed_count, 1);
    }

    #[test]
    fn test_level_derived_after_awards() {
        let mut state = ExperienceState::default();
        state.award_sale(100, HoneyType::Light, 1);
        assert_eq!(state.level, 2);
        assert_eq!(state.xp_at_level_start, 100);
        assert_eq!(state.xp_for_next_level, 275);

        state.award_sale(175, HoneyType::Light, 1);
        assert_eq!(state.level, 3);
    }

    #[test]
    fn test_recalculate_reconciles_stale_level() {
        // Simulates a tampered or stale persisted blob.
        let mut state = ExperienceState {
            total_xp: 600,
            level: 1,
            ..Default::default()
        };
        state.recalculate();
        assert_eq!(state.level, 4);
        assert_eq!(state.xp_at_level_start, 525);
    }
}
