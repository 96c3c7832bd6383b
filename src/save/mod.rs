//! Persistence boundary: a key → JSON-blob store on disk.
//!
//! Every persisted resource gets its own `<key>.json` under a `saves/`
//! directory next to the executable. Blobs are read whole and written
//! whole; writes go through a temp file and rename. Missing or corrupt
//! blobs are treated as absent and the resource keeps its defaults. No
//! failure here is ever fatal: the in-memory state stays authoritative
//! and a failed write is logged and skipped.
//!
//! This is the one module that sees every domain's persisted resource;
//! gameplay domains otherwise only talk through `shared`.

use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bees::{MilestoneLog, PollinationFactor};
use crate::experience::ExperienceState;
use crate::hives::{ClassificationHistory, DailyClassifications};
use crate::orders::DailyOrders;
use crate::shared::*;

pub const EXPERIENCE_KEY: &str = "experience";
pub const ORDERS_KEY: &str = "honey_orders";
pub const HIVES_KEY: &str = "hives";
pub const PANTRY_KEY: &str = "pantry";
pub const FACTOR_KEY: &str = "pollination_factor";
pub const MILESTONES_KEY: &str = "pollination_milestones";
pub const FARMING_HISTORY_KEY: &str = "farming_history";
pub const CLASSIFICATIONS_KEY: &str = "daily_classifications";
pub const CLASSIFICATION_HISTORY_KEY: &str = "classification_history";

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, load_persisted_state)
            .add_systems(
                Update,
                autosave_changed_state.run_if(in_state(GameState::Playing)),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM HELPERS
// ═══════════════════════════════════════════════════════════════════════

fn saves_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join("saves")
}

fn blob_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", key))
}

/// Serialize and write one blob atomically (temp file, then rename).
fn write_blob_to<T: Serialize>(dir: &Path, key: &str, value: &T) -> Result<(), String> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .map_err(|e| format!("Could not create saves directory: {}", e))?;
    }

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Serialization failed for '{}': {}", key, e))?;

    let path = blob_path(dir, key);
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json)
        .map_err(|e| format!("Write failed for {}: {}", tmp_path.display(), e))?;
    fs::rename(&tmp_path, &path).map_err(|e| format!("Rename failed: {}", e))?;

    Ok(())
}

/// Read one blob. Missing files and parse failures both come back as
/// `None`; the caller proceeds with defaults either way.
fn read_blob_from<T: DeserializeOwned>(dir: &Path, key: &str) -> Option<T> {
    let path = blob_path(dir, key);
    if !path.exists() {
        return None;
    }

    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            warn!("[Save] Read failed for {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                "[Save] Blob '{}' is malformed ({}). Starting from defaults.",
                key, e
            );
            None
        }
    }
}

fn write_blob<T: Serialize>(key: &str, value: &T) {
    if let Err(e) = write_blob_to(&saves_directory(), key, value) {
        // State stays correct in memory; durability is skipped this time.
        warn!("[Save] Persist failed for '{}': {}", key, e);
    }
}

fn read_blob<T: DeserializeOwned>(key: &str) -> Option<T> {
    read_blob_from(&saves_directory(), key)
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Pull every persisted blob into its resource, then enter gameplay.
/// Runs before any mutation; absent blobs leave first-launch defaults.
pub fn load_persisted_state(
    mut experience: ResMut<ExperienceState>,
    mut orders: ResMut<DailyOrders>,
    mut ledger: ResMut<HiveLedger>,
    mut pantry: ResMut<Pantry>,
    mut factor: ResMut<PollinationFactor>,
    mut milestones: ResMut<MilestoneLog>,
    mut farming: ResMut<FarmingHistory>,
    mut classifications: ResMut<DailyClassifications>,
    mut classification_history: ResMut<ClassificationHistory>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if let Some(mut loaded) = read_blob::<ExperienceState>(EXPERIENCE_KEY) {
        // The persisted level is advisory at best; the XP total is the
        // source of truth.
        loaded.recalculate();
        *experience = loaded;
    }
    if let Some(loaded) = read_blob::<DailyOrders>(ORDERS_KEY) {
        *orders = loaded;
    }
    if let Some(loaded) = read_blob::<HiveLedger>(HIVES_KEY) {
        *ledger = loaded;
    }
    if let Some(loaded) = read_blob::<Pantry>(PANTRY_KEY) {
        *pantry = loaded;
    }
    if let Some(loaded) = read_blob::<PollinationFactor>(FACTOR_KEY) {
        *factor = loaded;
    }
    if let Some(loaded) = read_blob::<MilestoneLog>(MILESTONES_KEY) {
        *milestones = loaded;
    }
    if let Some(loaded) = read_blob::<FarmingHistory>(FARMING_HISTORY_KEY) {
        *farming = loaded;
    }
    if let Some(loaded) = read_blob::<DailyClassifications>(CLASSIFICATIONS_KEY) {
        *classifications = loaded;
    }
    if let Some(loaded) = read_blob::<ClassificationHistory>(CLASSIFICATION_HISTORY_KEY) {
        *classification_history = loaded;
    }

    info!(
        "[Save] Loaded state — level {}, {} hives, {} orders on the board",
        experience.level,
        ledger.hive_count(),
        orders.orders.len()
    );
    next_state.set(GameState::Playing);
}

/// Re-persist any resource that changed this frame. Save failures are
/// logged and ignored; there is no rollback.
pub fn autosave_changed_state(
    experience: Res<ExperienceState>,
    orders: Res<DailyOrders>,
    ledger: Res<HiveLedger>,
    pantry: Res<Pantry>,
    factor: Res<PollinationFactor>,
    milestones: Res<MilestoneLog>,
    farming: Res<FarmingHistory>,
    classifications: Res<DailyClassifications>,
    classification_history: Res<ClassificationHistory>,
) {
    if experience.is_changed() {
        write_blob(EXPERIENCE_KEY, &*experience);
    }
    if orders.is_changed() {
        write_blob(ORDERS_KEY, &*orders);
    }
    if ledger.is_changed() {
        write_blob(HIVES_KEY, &*ledger);
    }
    if pantry.is_changed() {
        write_blob(PANTRY_KEY, &*pantry);
    }
    if factor.is_changed() {
        write_blob(FACTOR_KEY, &*factor);
    }
    if milestones.is_changed() {
        write_blob(MILESTONES_KEY, &*milestones);
    }
    if farming.is_changed() {
        write_blob(FARMING_HISTORY_KEY, &*farming);
    }
    if classifications.is_changed() {
        write_blob(CLASSIFICATIONS_KEY, &*classifications);
    }
    if classification_history.is_changed() {
        write_blob(CLASSIFICATION_HISTORY_KEY, &*classification_history);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("meadowhive-save-test-{}", tag));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_blob_round_trip() {
        let dir = temp_dir("roundtrip");

        let mut state = ExperienceState::default();
        state.award_harvest("tomato");

        write_blob_to(&dir, EXPERIENCE_KEY, &state).unwrap();
        let loaded: ExperienceState = read_blob_from(&dir, EXPERIENCE_KEY).unwrap();

        assert_eq!(loaded.total_xp, 11);
        assert_eq!(loaded.harvests_count, 1);
        assert!(loaded.unique_harvest_kinds.contains("tomato"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_blob_is_none() {
        let dir = temp_dir("missing");
        let loaded: Option<ExperienceState> = read_blob_from(&dir, "does_not_exist");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_blob_is_none() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(blob_path(&dir, EXPERIENCE_KEY), "{not json at all").unwrap();

        let loaded: Option<ExperienceState> = read_blob_from(&dir, EXPERIENCE_KEY);
        assert!(loaded.is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = temp_dir("atomic");
        write_blob_to(&dir, PANTRY_KEY, &Pantry::default()).unwrap();

        assert!(blob_path(&dir, PANTRY_KEY).exists());
        assert!(!blob_path(&dir, PANTRY_KEY).with_extension("json.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_stale_level_reconciled_shape() {
        // Mirrors what load_persisted_state does with a tampered blob.
        let dir = temp_dir("reconcile");

        let mut state = ExperienceState {
            total_xp: 300,
            level: 99,
            ..Default::default()
        };
        write_blob_to(&dir, EXPERIENCE_KEY, &state).unwrap();

        let mut loaded: ExperienceState = read_blob_from(&dir, EXPERIENCE_KEY).unwrap();
        loaded.recalculate();
        assert_eq!(loaded.level, 3);

        state.recalculate();
        assert_eq!(state.level, loaded.level);

        let _ = fs::remove_dir_all(&dir);
    }
}
