//! Pollination factor tracking.
//!
//! The factor is a monotone score of the player's pollination activity.
//! It drives the hover-bee target (one bee per 5 factor) and the hatching
//! milestones (one housed bee per 10 factor). The XP for each pollination
//! visit is awarded by the experience ledger reading the same event.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::*;

const DEFAULT_SPAWN_THRESHOLD: u32 = 10;

/// Monotone pollination score. Never decreases.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct PollinationFactor {
    pub factor: u32,
    pub total_harvests: u32,
    /// Minimum factor before any hover bees appear at all.
    pub threshold: u32,
}

impl Default for PollinationFactor {
    fn default() -> Self {
        Self {
            factor: 0,
            total_harvests: 0,
            threshold: DEFAULT_SPAWN_THRESHOLD,
        }
    }
}

impl PollinationFactor {
    pub fn can_spawn_bees(&self) -> bool {
        self.factor >= self.threshold
    }
}

/// Accumulate pollination events into the factor.
pub fn track_pollination(
    mut pollinations: EventReader<PollinationEvent>,
    mut factor: ResMut<PollinationFactor>,
) {
    for event in pollinations.read() {
        factor.factor += event.amount;
        factor.total_harvests += 1;
        info!(
            "[Bees] Pollination factor now {} ({} events)",
            factor.factor, factor.total_harvests
        );
    }
}
