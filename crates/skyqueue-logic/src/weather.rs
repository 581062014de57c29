//! Weather model: instantaneous conditions, forecast blocks, smoothing.
//!
//! The random draws live in the engine; this module holds the tables they
//! sample from, the clamping and classification rules, and the exponential
//! smoothing step that moves current weather toward the hourly forecast.

use crate::constants::{night, weather_limits};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONDITIONS
// ============================================================================

/// Qualitative sky condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Clear,
    PartlyCloudy,
    Cloudy,
}

/// Uniform range `base + span * u` used for a daily average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRange {
    pub base: f64,
    pub span: f64,
}

impl DrawRange {
    const fn new(base: f64, span: f64) -> Self {
        Self { base, span }
    }

    /// Map a unit draw in `[0, 1)` onto the range.
    pub fn at(&self, unit: f64) -> f64 {
        self.base + self.span * unit
    }
}

/// Per-condition ranges for a night's average clouds, seeing and humidity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRanges {
    pub clouds: DrawRange,
    pub seeing: DrawRange,
    pub humidity: DrawRange,
}

impl Condition {
    /// Weekly tendency from a unit draw: 40% clear, 30% partly cloudy, 30% cloudy.
    pub fn from_tendency(unit: f64) -> Self {
        if unit < 0.4 {
            Self::Clear
        } else if unit < 0.7 {
            Self::PartlyCloudy
        } else {
            Self::Cloudy
        }
    }

    /// Hourly classification by cloud cover.
    pub fn from_clouds(clouds: f64) -> Self {
        if clouds < 25.0 {
            Self::Clear
        } else if clouds < 55.0 {
            Self::PartlyCloudy
        } else {
            Self::Cloudy
        }
    }

    pub fn daily_ranges(self) -> DailyRanges {
        match self {
            Self::Clear => DailyRanges {
                clouds: DrawRange::new(10.0, 20.0),
                seeing: DrawRange::new(0.3, 0.4),
                humidity: DrawRange::new(25.0, 20.0),
            },
            Self::PartlyCloudy => DailyRanges {
                clouds: DrawRange::new(35.0, 25.0),
                seeing: DrawRange::new(0.6, 0.5),
                humidity: DrawRange::new(40.0, 25.0),
            },
            Self::Cloudy => DailyRanges {
                clouds: DrawRange::new(65.0, 30.0),
                seeing: DrawRange::new(1.0, 0.8),
                humidity: DrawRange::new(60.0, 30.0),
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::PartlyCloudy => "partly-cloudy",
            Self::Cloudy => "cloudy",
        }
    }
}

// ============================================================================
// STATE & FORECASTS
// ============================================================================

/// Current sky conditions as seen by the scorer and the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    /// Cloud cover, percent.
    pub clouds: f64,
    /// Seeing FWHM, arcseconds.
    pub seeing: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self {
            clouds: 20.0,
            seeing: 0.8,
            humidity: 45.0,
        }
    }
}

impl WeatherState {
    pub fn new(clouds: f64, seeing: f64, humidity: f64) -> Self {
        Self {
            clouds,
            seeing,
            humidity,
        }
    }

    /// Seeing mapped onto a 0–100 bar (0.2" best, 2.0" worst).
    pub fn seeing_bar_percent(&self) -> f64 {
        ((self.seeing - weather_limits::MIN_SEEING) / 1.8 * 100.0).clamp(0.0, 100.0)
    }

    pub fn condition(&self) -> Condition {
        Condition::from_clouds(self.clouds)
    }
}

/// Target weather for one simulated hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastBlock {
    /// Display hour: 19..=24 then 1..=5.
    pub hour: u32,
    pub condition: Condition,
    pub clouds: f64,
    pub seeing: f64,
    pub humidity: f64,
}

impl ForecastBlock {
    /// Build a block from raw perturbed values, clamping them into range.
    ///
    /// `raw_hour` counts past midnight (19..=29); it is folded to a display hour.
    pub fn from_raw(raw_hour: u32, clouds: f64, seeing: f64, humidity: f64) -> Self {
        let clouds = clouds.clamp(0.0, 100.0);
        Self {
            hour: display_hour(raw_hour),
            condition: Condition::from_clouds(clouds),
            clouds,
            seeing: seeing.max(weather_limits::MIN_SEEING),
            humidity: humidity.clamp(
                weather_limits::MIN_HOURLY_HUMIDITY,
                weather_limits::MAX_HOURLY_HUMIDITY,
            ),
        }
    }

    pub fn weather(&self) -> WeatherState {
        WeatherState::new(self.clouds, self.seeing, self.humidity)
    }
}

/// One night's general outlook within the weekly forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub night: usize,
    pub day_name: String,
    pub condition: Condition,
    pub avg_clouds: f64,
    pub avg_seeing: f64,
    pub avg_humidity: f64,
}

impl DailyForecast {
    /// Build a daily outlook, applying the weekly ceilings.
    pub fn new(
        night: usize,
        condition: Condition,
        clouds: f64,
        seeing: f64,
        humidity: f64,
    ) -> Self {
        Self {
            night,
            day_name: crate::constants::day_name(night).to_string(),
            condition,
            avg_clouds: clouds.min(weather_limits::MAX_DAILY_CLOUDS),
            avg_seeing: seeing,
            avg_humidity: humidity.min(weather_limits::MAX_DAILY_HUMIDITY),
        }
    }
}

/// Fold an hour counted past midnight (e.g. 26) back to a clock hour (2).
pub fn display_hour(raw_hour: u32) -> u32 {
    if raw_hour > 24 {
        raw_hour - 24
    } else {
        raw_hour
    }
}

/// Find the block for a clock hour (0..24). Midnight matches the block
/// labelled 24; hours outside the night fall back to the first block.
pub fn block_for_hour(blocks: &[ForecastBlock], clock_hour: u32) -> Option<&ForecastBlock> {
    let label = if clock_hour == 0 { 24 } else { clock_hour };
    blocks
        .iter()
        .find(|b| b.hour == label)
        .or_else(|| blocks.first())
}

/// Raw hours covered by a night's forecast, 19 through 29.
pub fn forecast_hours() -> impl Iterator<Item = u32> {
    night::START_HOUR..=night::END_HOUR
}

// ============================================================================
// SMOOTHING
// ============================================================================

/// Move `current` a fraction `smoothing` of the way toward `target`.
pub fn step_weather(current: &mut WeatherState, target: &ForecastBlock, smoothing: f64) {
    current.clouds += (target.clouds - current.clouds) * smoothing;
    current.seeing += (target.seeing - current.seeing) * smoothing;
    current.humidity += (target.humidity - current.humidity) * smoothing;
}
