//! Simulation constants: queue limits, night layout, timing defaults.
//!
//! Plain constants with no runtime dependency. Timing values here are the
//! defaults; the engine reads the effective values from its configuration.

/// Maximum number of observations in a nightly queue.
pub const MAX_QUEUE_SIZE: usize = 6;

/// Nights in a simulated week.
pub const NIGHTS_PER_WEEK: usize = 7;

/// Index of the last night of the week.
pub const LAST_NIGHT: usize = NIGHTS_PER_WEEK - 1;

pub mod night {
    /// Clock hour at which every night starts (19:00).
    pub const START_HOUR: u32 = 19;
    /// Last forecast hour, expressed past midnight (24 + 5 = 05:00).
    pub const END_HOUR: u32 = 24 + 5;
    /// Hourly forecast blocks per night (19:00 through 05:00).
    pub const FORECAST_BLOCKS: usize = (END_HOUR - START_HOUR + 1) as usize;
}

pub mod timing {
    /// Telescope slew between targets, in real milliseconds.
    pub const SLEW_DURATION_MS: f64 = 1000.0;
    /// Real milliseconds per simulated millisecond of observation.
    pub const OBSERVATION_DURATION_SCALE: f64 = 0.0037;
    /// Pause after a completed observation before the next slew.
    pub const INTER_TARGET_PAUSE_MS: f64 = 1000.0;
    /// Exponential smoothing factor applied each weather step.
    pub const WEATHER_SMOOTHING: f64 = 0.1;
    /// Simulated seconds per real second while a night runs.
    pub const TIME_SPEED: f64 = 60.0;
}

pub mod weather_limits {
    /// Seeing never drops below this (arcseconds).
    pub const MIN_SEEING: f64 = 0.2;
    /// Weekly average cloud cover ceiling.
    pub const MAX_DAILY_CLOUDS: f64 = 95.0;
    /// Weekly average humidity ceiling.
    pub const MAX_DAILY_HUMIDITY: f64 = 90.0;
    /// Hourly humidity floor.
    pub const MIN_HOURLY_HUMIDITY: f64 = 10.0;
    /// Hourly humidity ceiling.
    pub const MAX_HOURLY_HUMIDITY: f64 = 95.0;
    /// Hourly cloud noise half-width.
    pub const CLOUD_NOISE: f64 = 10.0;
    /// Hourly seeing noise half-width.
    pub const SEEING_NOISE: f64 = 0.15;
    /// Hourly humidity noise half-width.
    pub const HUMIDITY_NOISE: f64 = 7.5;
}

/// Weekday names, indexed by night of the week.
pub const DAY_NAMES: [&str; NIGHTS_PER_WEEK] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Weekday name for a night index (wraps past the end of the week).
pub fn day_name(night: usize) -> &'static str {
    DAY_NAMES[night % NIGHTS_PER_WEEK]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_block_count() {
        assert_eq!(night::FORECAST_BLOCKS, 11);
    }

    #[test]
    fn test_day_names() {
        assert_eq!(day_name(0), "Sunday");
        assert_eq!(day_name(LAST_NIGHT), "Saturday");
        assert_eq!(day_name(7), "Sunday");
    }
}
