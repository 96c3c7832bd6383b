mod almanac;
mod bees;
mod experience;
mod hives;
mod orders;
mod save;
mod shared;

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use almanac::AlmanacPlugin;
use bees::BeesPlugin;
use experience::ExperiencePlugin;
use hives::HivesPlugin;
use orders::OrdersPlugin;
use save::SavePlugin;
use shared::*;

fn main() {
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(250))),
        )
        .add_plugins(LogPlugin::default())
        .add_plugins(StatesPlugin)
        // Game state
        .init_state::<GameState>()
        // Shared resources
        .init_resource::<WallClock>()
        .init_resource::<SkyReport>()
        .init_resource::<WeatherReport>()
        .init_resource::<DayNightState>()
        .init_resource::<BeeActivityGate>()
        .init_resource::<HiveLedger>()
        .init_resource::<Pantry>()
        .init_resource::<FarmingHistory>()
        .init_resource::<SimRng>()
        // Shared events
        .add_event::<CropHarvestedEvent>()
        .add_event::<PollinationEvent>()
        .add_event::<ClassificationEvent>()
        .add_event::<ClassificationRecordedEvent>()
        .add_event::<XpGainEvent>()
        .add_event::<LevelUpEvent>()
        .add_event::<OrderFulfillRequest>()
        .add_event::<OrderFulfilledEvent>()
        .add_event::<DespawnBeeEvent>()
        .add_event::<BeeCountChangedEvent>()
        .add_event::<BottleNectarRequest>()
        .add_event::<DayRolloverEvent>()
        .add_event::<ResetProgressEvent>()
        .add_event::<ToastEvent>()
        // Domain plugins
        .add_plugins((
            AlmanacPlugin,
            ExperiencePlugin,
            BeesPlugin,
            HivesPlugin,
            OrdersPlugin,
            SavePlugin,
        ))
        // First-launch scaffolding; runs after the persisted load.
        .add_systems(
            Startup,
            seed_first_launch.after(save::load_persisted_state),
        )
        .add_systems(Update, print_toasts)
        .run();
}

/// Give a brand-new farm something to work with: two hives, a handful of
/// glass bottles, and a plausible weather reading until the real provider
/// reports in. No-op when a save already exists.
fn seed_first_launch(
    mut ledger: ResMut<HiveLedger>,
    mut pantry: ResMut<Pantry>,
    mut weather: ResMut<WeatherReport>,
) {
    if ledger.hives.is_empty() {
        ledger.hives.push(Hive::new("hive-meadow"));
        ledger.hives.push(Hive::new("hive-orchard"));
        pantry.glass_bottles = 5;
        info!("[Driver] First launch — placed starter hives");
    }

    if weather.current.is_none() {
        weather.current = Some(WeatherSnapshot {
            temperature_c: 21.0,
            wind_speed: 4.0,
            cloud_cover_percent: 25.0,
            is_raining: false,
        });
    }
}

/// Headless stand-in for the toast UI.
fn print_toasts(mut toasts: EventReader<ToastEvent>) {
    for toast in toasts.read() {
        info!("[Toast] {}", toast.message);
    }
}
