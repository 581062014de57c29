//! Weather generation: weekly outlook and hourly night forecasts.
//!
//! All randomness comes from the caller's RNG, so a seeded generator
//! reproduces the same week. Draw order is fixed: for each night the
//! tendency, then clouds, seeing and humidity.

use rand::Rng;
use skyqueue_logic::constants::{weather_limits, NIGHTS_PER_WEEK};
use skyqueue_logic::weather::{forecast_hours, Condition, DailyForecast, ForecastBlock};

/// Draw the seven-night outlook.
pub fn generate_weekly_forecast(rng: &mut impl Rng) -> Vec<DailyForecast> {
    (0..NIGHTS_PER_WEEK)
        .map(|night| {
            let condition = Condition::from_tendency(rng.gen::<f64>());
            let ranges = condition.daily_ranges();
            let clouds = ranges.clouds.at(rng.gen::<f64>());
            let seeing = ranges.seeing.at(rng.gen::<f64>());
            let humidity = ranges.humidity.at(rng.gen::<f64>());
            DailyForecast::new(night, condition, clouds, seeing, humidity)
        })
        .collect()
}

/// Draw the eleven hourly blocks (19:00 through 05:00) around a night's averages.
pub fn generate_night_forecast(rng: &mut impl Rng, daily: &DailyForecast) -> Vec<ForecastBlock> {
    forecast_hours()
        .map(|hour| {
            let clouds = daily.avg_clouds + noise(rng, weather_limits::CLOUD_NOISE);
            let seeing = daily.avg_seeing + noise(rng, weather_limits::SEEING_NOISE);
            let humidity = daily.avg_humidity + noise(rng, weather_limits::HUMIDITY_NOISE);
            ForecastBlock::from_raw(hour, clouds, seeing, humidity)
        })
        .collect()
}

/// Uniform noise in `[-half_width, half_width)`.
fn noise(rng: &mut impl Rng, half_width: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * 2.0 * half_width
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use skyqueue_logic::constants::night;

    #[test]
    fn test_weekly_forecast_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let week = generate_weekly_forecast(&mut rng);
        assert_eq!(week.len(), NIGHTS_PER_WEEK);
        assert_eq!(week[0].day_name, "Sunday");
        assert_eq!(week[6].day_name, "Saturday");
        for day in &week {
            let r = day.condition.daily_ranges();
            assert!(day.avg_clouds >= r.clouds.base && day.avg_clouds <= 95.0);
            assert!(day.avg_seeing >= r.seeing.base);
            assert!(day.avg_seeing <= r.seeing.base + r.seeing.span);
            assert!(day.avg_humidity >= r.humidity.base && day.avg_humidity <= 90.0);
        }
    }

    #[test]
    fn test_seeded_forecast_is_deterministic() {
        let a = generate_weekly_forecast(&mut ChaCha8Rng::seed_from_u64(42));
        let b = generate_weekly_forecast(&mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);

        let na = generate_night_forecast(&mut ChaCha8Rng::seed_from_u64(1), &a[0]);
        let nb = generate_night_forecast(&mut ChaCha8Rng::seed_from_u64(1), &a[0]);
        assert_eq!(na, nb);
    }

    #[test]
    fn test_night_forecast_blocks_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for day in generate_weekly_forecast(&mut rng) {
            let blocks = generate_night_forecast(&mut rng, &day);
            assert_eq!(blocks.len(), night::FORECAST_BLOCKS);
            assert_eq!(blocks[0].hour, 19);
            assert_eq!(blocks[5].hour, 24);
            assert_eq!(blocks[10].hour, 5);
            for b in &blocks {
                assert!((0.0..=100.0).contains(&b.clouds));
                assert!(b.seeing >= 0.2);
                assert!((10.0..=95.0).contains(&b.humidity));
                assert!((b.clouds - day.avg_clouds).abs() <= 10.0);
                assert_eq!(b.condition, Condition::from_clouds(b.clouds));
            }
        }
    }
}
