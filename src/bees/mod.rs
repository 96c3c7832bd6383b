use bevy::prelude::*;

use crate::shared::*;

// ─────────────────────────────────────────────────────────────────────────────
// Sub-modules
// ─────────────────────────────────────────────────────────────────────────────
mod hatching;
mod pollination;
mod population;

pub use hatching::*;
pub use pollination::*;
pub use population::*;

pub struct BeesPlugin;

impl Plugin for BeesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PollinationFactor>()
            .init_resource::<MilestoneLog>()
            .init_resource::<BeeColony>()
            .add_systems(
                Update,
                (
                    track_pollination,
                    run_hatching_check,
                    evaluate_colony,
                    despawn_bees,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            );
    }
}
