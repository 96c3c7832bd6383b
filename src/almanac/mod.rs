//! Almanac domain — wall clock, day/night cycle, and the bee activity gate.
//!
//! Responsible for:
//! - Ticking the `WallClock` resource from real time and emitting
//!   `DayRolloverEvent` when the local calendar day changes
//! - Classifying "now" into dawn/day/dusk/night from the solar ephemeris
//! - Deciding whether bees may fly (time window + temperature + wind)
//! - Tracking the honey accrual windows (a wall-clock policy, separate
//!   from the sun-elevation classification)
//!
//! The ephemeris itself comes from an external astronomy provider via
//! `SkyReport`; this module only consumes boundary timestamps.

use bevy::prelude::*;
use chrono::{Datelike, Local, Timelike, Utc};

use crate::shared::*;

pub struct AlmanacPlugin;

impl Plugin for AlmanacPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (tick_wall_clock, update_day_night, update_activity_gate).chain(),
        );
    }
}

// ─── Pure classification ─────────────────────────────────────────────────────

/// Bucket `now` into a time-of-day category using the solar boundaries.
///
/// Dawn and dusk are inclusive of both their endpoints; day is the open
/// interval between the morning golden hour's end and the evening golden
/// hour's start. Anything else is night, including out-of-order
/// boundaries, which happen at extreme latitudes or with malformed
/// provider data.
pub fn classify_time_of_day(sun: &SunTimes, now: chrono::DateTime<Utc>) -> TimeOfDay {
    let ordered = sun.dawn <= sun.golden_hour_end
        && sun.golden_hour_end <= sun.golden_hour
        && sun.golden_hour <= sun.dusk;
    if !ordered {
        return TimeOfDay::Night;
    }

    if now >= sun.dawn && now <= sun.golden_hour_end {
        TimeOfDay::Dawn
    } else if now > sun.golden_hour_end && now < sun.golden_hour {
        TimeOfDay::Day
    } else if now >= sun.golden_hour && now <= sun.dusk {
        TimeOfDay::Dusk
    } else {
        TimeOfDay::Night
    }
}

/// Right time of day AND flyable weather. Both predicates must hold.
///
/// Bees fly through full daylight plus the bright edges of twilight.
/// Temperature bounds are strict (12°C and 35°C themselves ground the
/// colony), as is the 10 m/s wind ceiling.
pub fn bees_should_be_active(
    sun: &SunTimes,
    now: chrono::DateTime<Utc>,
    weather: &WeatherSnapshot,
) -> bool {
    let right_time = match classify_time_of_day(sun, now) {
        TimeOfDay::Day => true,
        TimeOfDay::Dawn => now > sun.golden_hour_end,
        TimeOfDay::Dusk => now < sun.golden_hour,
        TimeOfDay::Night => false,
    };

    let good_weather = weather.temperature_c > 12.0
        && weather.temperature_c < 35.0
        && weather.wind_speed < 10.0;

    right_time && good_weather
}

/// Honey accrues during two wall-clock windows: 08:00-16:00 and
/// 20:00-04:00 local. This is intentionally independent of the
/// sun-based classification above.
pub fn production_window_active(hour: u32) -> bool {
    (8..=16).contains(&hour) || hour >= 20 || hour <= 4
}

/// Coarse hour-based phase used by the day/night cycle.
fn phase_for_hour(hour: u32) -> TimeOfDay {
    match hour {
        5..=6 => TimeOfDay::Dawn,
        7..=17 => TimeOfDay::Day,
        18..=19 => TimeOfDay::Dusk,
        _ => TimeOfDay::Night,
    }
}

// ─── Systems ─────────────────────────────────────────────────────────────────

/// Refresh `WallClock` from chrono and emit `DayRolloverEvent` when the
/// local date string changes. The rollover is suppressed on the very first
/// tick; boot-time catch-up is handled by the on-enter refresh systems.
pub fn tick_wall_clock(
    mut clock: ResMut<WallClock>,
    mut rollover: EventWriter<DayRolloverEvent>,
) {
    let local = Local::now();
    let today = format!(
        "{:04}-{:02}-{:02}",
        local.year(),
        local.month(),
        local.day()
    );

    clock.now_utc = Utc::now();
    clock.local_hour = local.hour();

    if clock.today != today {
        let first_tick = clock.today.is_empty();
        clock.today = today.clone();
        if !first_tick {
            info!("[Almanac] Day rolled over to {}", today);
            rollover.send(DayRolloverEvent { date: today });
        }
    }
}

/// Keep the hour-based `DayNightState` in step with the wall clock.
/// Only writes when the hour actually changes, so change detection on the
/// resource stays meaningful.
pub fn update_day_night(clock: Res<WallClock>, mut cycle: ResMut<DayNightState>) {
    if cycle.hour == clock.local_hour && cycle.is_daytime == is_daytime_hour(clock.local_hour) {
        return;
    }
    cycle.hour = clock.local_hour;
    cycle.is_daytime = is_daytime_hour(clock.local_hour);
    cycle.phase = phase_for_hour(clock.local_hour);
}

fn is_daytime_hour(hour: u32) -> bool {
    (6..20).contains(&hour)
}

/// Recompute the activity gate from the latest sky and weather reports.
/// Until both providers have reported, fall back to the hour-based cycle
/// for flight and keep the production window check (which needs no
/// provider data).
pub fn update_activity_gate(
    clock: Res<WallClock>,
    sky: Res<SkyReport>,
    weather: Res<WeatherReport>,
    cycle: Res<DayNightState>,
    mut gate: ResMut<BeeActivityGate>,
) {
    gate.production_active = production_window_active(clock.local_hour);

    gate.bees_active = match (&sky.sun, &weather.current) {
        (Some(sun), Some(current)) => bees_should_be_active(sun, clock.now_utc, current),
        _ => cycle.is_daytime,
    };
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn sun_for_test() -> SunTimes {
        let at = |h, m| Utc.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap();
        SunTimes {
            sunrise: at(6, 10),
            sunset: at(18, 20),
            solar_noon: at(12, 15),
            dawn: at(5, 40),
            dusk: at(18, 50),
            golden_hour: at(17, 40),
            golden_hour_end: at(6, 50),
            elevation_degrees: 30.0,
            azimuth_degrees: 120.0,
        }
    }

    fn clear_noon_weather() -> WeatherSnapshot {
        WeatherSnapshot {
            temperature_c: 22.0,
            wind_speed: 3.0,
            cloud_cover_percent: 10.0,
            is_raining: false,
        }
    }

    #[test]
    fn test_time_of_day_buckets() {
        let sun = sun_for_test();
        let at = |h, m| Utc.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap();

        assert_eq!(classify_time_of_day(&sun, sun.dawn), TimeOfDay::Dawn);
        assert_eq!(classify_time_of_day(&sun, at(6, 20)), TimeOfDay::Dawn);
        assert_eq!(
            classify_time_of_day(&sun, sun.golden_hour_end),
            TimeOfDay::Dawn
        );
        assert_eq!(classify_time_of_day(&sun, at(12, 0)), TimeOfDay::Day);
        assert_eq!(classify_time_of_day(&sun, sun.golden_hour), TimeOfDay::Dusk);
        assert_eq!(classify_time_of_day(&sun, at(18, 15)), TimeOfDay::Dusk);
        assert_eq!(classify_time_of_day(&sun, at(2, 0)), TimeOfDay::Night);
        assert_eq!(classify_time_of_day(&sun, at(23, 0)), TimeOfDay::Night);
    }

    #[test]
    fn test_dusk_boundary_is_inclusive() {
        let sun = sun_for_test();
        assert_eq!(classify_time_of_day(&sun, sun.dusk), TimeOfDay::Dusk);
        assert_eq!(
            classify_time_of_day(&sun, sun.dusk + Duration::microseconds(1)),
            TimeOfDay::Night
        );
    }

    #[test]
    fn test_day_is_open_interval() {
        let sun = sun_for_test();
        // The instant after the morning golden hour ends is day.
        assert_eq!(
            classify_time_of_day(&sun, sun.golden_hour_end + Duration::microseconds(1)),
            TimeOfDay::Day
        );
        // The instant before the evening golden hour starts is still day.
        assert_eq!(
            classify_time_of_day(&sun, sun.golden_hour - Duration::microseconds(1)),
            TimeOfDay::Day
        );
    }

    #[test]
    fn test_inverted_boundaries_default_to_night() {
        let mut sun = sun_for_test();
        std::mem::swap(&mut sun.dawn, &mut sun.dusk);
        let noon = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        assert_eq!(classify_time_of_day(&sun, noon), TimeOfDay::Night);
    }

    #[test]
    fn test_bees_active_midday_clear() {
        let sun = sun_for_test();
        let noon = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        assert!(bees_should_be_active(&sun, noon, &clear_noon_weather()));
    }

    #[test]
    fn test_bees_grounded_at_night() {
        let sun = sun_for_test();
        let late = Utc.with_ymd_and_hms(2026, 3, 14, 23, 0, 0).unwrap();
        assert!(!bees_should_be_active(&sun, late, &clear_noon_weather()));
    }

    #[test]
    fn test_temperature_bounds_are_strict() {
        let sun = sun_for_test();
        let noon = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();

        let mut weather = clear_noon_weather();
        weather.temperature_c = 12.0;
        assert!(!bees_should_be_active(&sun, noon, &weather));

        weather.temperature_c = 35.0;
        assert!(!bees_should_be_active(&sun, noon, &weather));

        weather.temperature_c = 12.1;
        assert!(bees_should_be_active(&sun, noon, &weather));
    }

    #[test]
    fn test_wind_ceiling_is_strict() {
        let sun = sun_for_test();
        let noon = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();

        let mut weather = clear_noon_weather();
        weather.wind_speed = 10.0;
        assert!(!bees_should_be_active(&sun, noon, &weather));

        weather.wind_speed = 9.9;
        assert!(bees_should_be_active(&sun, noon, &weather));
    }

    #[test]
    fn test_production_windows() {
        for hour in [0, 2, 4, 8, 12, 16, 20, 23] {
            assert!(production_window_active(hour), "hour {} should accrue", hour);
        }
        for hour in [5, 6, 7, 17, 18, 19] {
            assert!(
                !production_window_active(hour),
                "hour {} should be dormant",
                hour
            );
        }
    }

    #[test]
    fn test_phase_for_hour() {
        assert_eq!(phase_for_hour(5), TimeOfDay::Dawn);
        assert_eq!(phase_for_hour(12), TimeOfDay::Day);
        assert_eq!(phase_for_hour(18), TimeOfDay::Dusk);
        assert_eq!(phase_for_hour(22), TimeOfDay::Night);
        assert!(is_daytime_hour(6));
        assert!(!is_daytime_hour(20));
    }
}
