//! Observation scoring: how well realized weather met a target's tiers.
//!
//! Each of IQ, CC and WV contributes an independent multiplicative factor.
//! Meeting a requirement earns a bonus proportional to the margin; missing
//! it costs a penalty proportional to the shortfall, down to a floor.
//! Pure functions only, so scoring can be checked without running a night.

use crate::tiers::Requirements;
use crate::weather::WeatherState;
use serde::{Deserialize, Serialize};

/// Bonus/penalty shape for one requirement axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorCurve {
    pub bonus_weight: f64,
    pub penalty_weight: f64,
    pub floor: f64,
    /// Percent axes normalise the penalty by the headroom above the
    /// requirement (`100 - required + 1`); seeing normalises by the requirement.
    pub percent_scale: bool,
}

pub const IQ_CURVE: FactorCurve = FactorCurve {
    bonus_weight: 0.3,
    penalty_weight: 0.6,
    floor: 0.3,
    percent_scale: false,
};

pub const CC_CURVE: FactorCurve = FactorCurve {
    bonus_weight: 0.2,
    penalty_weight: 0.7,
    floor: 0.3,
    percent_scale: true,
};

pub const WV_CURVE: FactorCurve = FactorCurve {
    bonus_weight: 0.15,
    penalty_weight: 0.5,
    floor: 0.5,
    percent_scale: true,
};

impl FactorCurve {
    /// Factor for an `actual` value against a `required` ceiling (lower is better).
    ///
    /// The bonus branch is uncapped: it reaches `1 + bonus_weight` only when
    /// `actual` is zero.
    pub fn factor(&self, required: f64, actual: f64) -> f64 {
        if actual <= required {
            let bonus = (required - actual) / required;
            1.0 + bonus * self.bonus_weight
        } else {
            let denominator = if self.percent_scale {
                100.0 - required + 1.0
            } else {
                required
            };
            let penalty = (actual - required) / denominator;
            (1.0 - penalty * self.penalty_weight).max(self.floor)
        }
    }
}

/// Full scoring result for one completed observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub base_points: u32,
    pub iq_factor: f64,
    pub cc_factor: f64,
    pub wv_factor: f64,
    /// Product of the three factors.
    pub multiplier: f64,
    /// `round(base_points * multiplier)`.
    pub points: u32,
    /// `round(multiplier * 100)`.
    pub efficiency: u32,
}

/// Score a target's requirements against the weather at completion.
pub fn score(requirements: &Requirements, weather: &WeatherState) -> Score {
    let iq_factor = IQ_CURVE.factor(requirements.iq.required_seeing(), weather.seeing);
    let cc_factor = CC_CURVE.factor(requirements.cc.required_clouds(), weather.clouds);
    let wv_factor = WV_CURVE.factor(requirements.wv.required_humidity(), weather.humidity);
    let multiplier = iq_factor * cc_factor * wv_factor;
    let base_points = requirements.base_points();

    Score {
        base_points,
        iq_factor,
        cc_factor,
        wv_factor,
        multiplier,
        points: (base_points as f64 * multiplier).round() as u32,
        efficiency: (multiplier * 100.0).round() as u32,
    }
}

/// Percentage of `earned` over `possible`, rounded; zero when nothing was possible.
pub fn efficiency_percent(earned: u32, possible: u32) -> u32 {
    if possible == 0 {
        return 0;
    }
    (earned as f64 / possible as f64 * 100.0).round() as u32
}

/// Display band for a result's efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreClass {
    Good,
    Ok,
    Poor,
}

impl ScoreClass {
    pub fn from_efficiency(efficiency: u32) -> Self {
        if efficiency >= 80 {
            Self::Good
        } else if efficiency >= 50 {
            Self::Ok
        } else {
            Self::Poor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::{CcTier, IqTier, WvTier};
    use proptest::prelude::*;

    fn any_requirements() -> Requirements {
        Requirements::new(IqTier::IqAny, CcTier::CcAny, WvTier::WvAny)
    }

    #[test]
    fn test_all_any_reference_night() {
        let s = score(&any_requirements(), &WeatherState::new(20.0, 0.8, 45.0));
        assert_eq!(s.base_points, 23);
        assert!((s.iq_factor - 1.18).abs() < 1e-12);
        assert!((s.cc_factor - 1.16).abs() < 1e-12);
        assert!((s.wv_factor - 1.0825).abs() < 1e-12);
        assert!((s.multiplier - 1.18 * 1.16 * 1.0825).abs() < 1e-12);
        assert_eq!(s.points, 34);
        assert_eq!(s.efficiency, 148);
    }

    #[test]
    fn test_iq_boundary_is_neutral() {
        let req = Requirements::new(IqTier::Iq20, CcTier::CcAny, WvTier::WvAny);
        let s = score(&req, &WeatherState::new(0.0, 0.4, 0.0));
        assert_eq!(s.iq_factor, 1.0);
    }

    #[test]
    fn test_penalty_branches() {
        // Seeing 1.0 against IQ70 (0.7): penalty 0.3/0.7
        let iq = IQ_CURVE.factor(0.7, 1.0);
        assert!((iq - (1.0 - 0.6 * 0.3 / 0.7)).abs() < 1e-12);
        // Clouds 60 against CC50: penalty 10/51
        let cc = CC_CURVE.factor(50.0, 60.0);
        assert!((cc - (1.0 - 0.7 * 10.0 / 51.0)).abs() < 1e-12);
        // Humidity 40 against WV20 (30): penalty 10/71
        let wv = WV_CURVE.factor(30.0, 40.0);
        assert!((wv - (1.0 - 0.5 * 10.0 / 71.0)).abs() < 1e-12);
    }

    #[test]
    fn test_floors_hit_in_terrible_weather() {
        let req = Requirements::new(IqTier::Iq20, CcTier::Cc50, WvTier::Wv20);
        let s = score(&req, &WeatherState::new(100.0, 5.0, 100.0));
        assert_eq!(s.iq_factor, 0.3);
        // Percent axes bottom out just above their floors at 100%
        assert!((s.cc_factor - (1.0 - 0.7 * 50.0 / 51.0)).abs() < 1e-12);
        assert!((s.wv_factor - (1.0 - 0.5 * 70.0 / 71.0)).abs() < 1e-12);
        assert_eq!(s.efficiency, 5);
        assert_eq!(s.points, 5);

        assert_eq!(CC_CURVE.factor(50.0, 150.0), 0.3);
        assert_eq!(WV_CURVE.factor(30.0, 200.0), 0.5);
    }

    #[test]
    fn test_any_tier_at_full_cover_is_neutral() {
        let s = score(&any_requirements(), &WeatherState::new(100.0, 2.0, 100.0));
        assert_eq!(s.multiplier, 1.0);
        assert_eq!(s.points, 23);
    }

    #[test]
    fn test_efficiency_percent() {
        assert_eq!(efficiency_percent(0, 0), 0);
        assert_eq!(efficiency_percent(34, 23), 148);
        assert_eq!(efficiency_percent(50, 100), 50);
    }

    #[test]
    fn test_score_class_bands() {
        assert_eq!(ScoreClass::from_efficiency(80), ScoreClass::Good);
        assert_eq!(ScoreClass::from_efficiency(79), ScoreClass::Ok);
        assert_eq!(ScoreClass::from_efficiency(50), ScoreClass::Ok);
        assert_eq!(ScoreClass::from_efficiency(49), ScoreClass::Poor);
    }

    fn iq_strategy() -> impl Strategy<Value = IqTier> {
        prop::sample::select(IqTier::all().to_vec())
    }

    fn cc_strategy() -> impl Strategy<Value = CcTier> {
        prop::sample::select(CcTier::all().to_vec())
    }

    fn wv_strategy() -> impl Strategy<Value = WvTier> {
        prop::sample::select(WvTier::all().to_vec())
    }

    proptest! {
        #[test]
        fn prop_factor_floors_hold(
            iq in iq_strategy(),
            cc in cc_strategy(),
            wv in wv_strategy(),
            clouds in 0.0f64..=100.0,
            seeing in 0.2f64..=10.0,
            humidity in 0.0f64..=100.0,
        ) {
            let s = score(
                &Requirements::new(iq, cc, wv),
                &WeatherState::new(clouds, seeing, humidity),
            );
            prop_assert!(s.iq_factor >= 0.3);
            prop_assert!(s.cc_factor >= 0.3);
            prop_assert!(s.wv_factor >= 0.5);
            prop_assert!(s.multiplier >= 0.3 * 0.3 * 0.5 - 1e-12);
        }

        #[test]
        fn prop_bonus_bounded_for_in_range_weather(
            iq in iq_strategy(),
            cc in cc_strategy(),
            wv in wv_strategy(),
            clouds in 0.0f64..=100.0,
            seeing in 0.2f64..=10.0,
            humidity in 0.0f64..=100.0,
        ) {
            let s = score(
                &Requirements::new(iq, cc, wv),
                &WeatherState::new(clouds, seeing, humidity),
            );
            prop_assert!(s.iq_factor <= 1.3);
            prop_assert!(s.cc_factor <= 1.2);
            prop_assert!(s.wv_factor <= 1.15);
        }

        #[test]
        fn prop_better_seeing_never_scores_lower(
            iq in iq_strategy(),
            seeing in 0.2f64..=5.0,
            delta in 0.0f64..=1.0,
        ) {
            let req = Requirements::new(iq, CcTier::CcAny, WvTier::WvAny);
            let worse = score(&req, &WeatherState::new(30.0, seeing + delta, 30.0));
            let better = score(&req, &WeatherState::new(30.0, seeing, 30.0));
            prop_assert!(better.multiplier >= worse.multiplier);
        }
    }
}
