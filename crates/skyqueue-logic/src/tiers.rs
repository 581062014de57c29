//! Observing-condition tiers: IQ, CC and WV percentile bands.
//!
//! Each tier carries a threshold (the worst acceptable value of the weather
//! quantity it constrains) and a point weight. Stricter tiers have tighter
//! thresholds and higher weights. Labels such as `"IQ20"` are parsed once at
//! catalog load; unknown labels are rejected there rather than at lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A requirement label that does not name a known tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} tier label '{label}'")]
pub struct TierParseError {
    pub kind: &'static str,
    pub label: String,
}

// ============================================================================
// IMAGE QUALITY
// ============================================================================

/// Image-quality percentile (seeing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IqTier {
    /// Best 20% of seeing conditions.
    #[serde(rename = "IQ20")]
    Iq20,
    /// Best 70%.
    #[serde(rename = "IQ70")]
    Iq70,
    /// Best 85%.
    #[serde(rename = "IQ85")]
    Iq85,
    /// Any seeing.
    #[serde(rename = "IQAny")]
    IqAny,
}

impl IqTier {
    pub fn all() -> [IqTier; 4] {
        [Self::Iq20, Self::Iq70, Self::Iq85, Self::IqAny]
    }

    /// Worst acceptable seeing, in arcseconds.
    pub fn required_seeing(self) -> f64 {
        match self {
            Self::Iq20 => 0.4,
            Self::Iq70 => 0.7,
            Self::Iq85 => 1.0,
            Self::IqAny => 2.0,
        }
    }

    pub fn weight(self) -> u32 {
        match self {
            Self::Iq20 => 50,
            Self::Iq70 => 35,
            Self::Iq85 => 25,
            Self::IqAny => 15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Iq20 => "IQ20",
            Self::Iq70 => "IQ70",
            Self::Iq85 => "IQ85",
            Self::IqAny => "IQAny",
        }
    }
}

// ============================================================================
// CLOUD COVER
// ============================================================================

/// Cloud-cover percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CcTier {
    /// Below 50% cloud.
    #[serde(rename = "CC50")]
    Cc50,
    /// Below 70% cloud.
    #[serde(rename = "CC70")]
    Cc70,
    /// Below 80% cloud.
    #[serde(rename = "CC80")]
    Cc80,
    /// Any cloud cover.
    #[serde(rename = "CCAny")]
    CcAny,
}

impl CcTier {
    pub fn all() -> [CcTier; 4] {
        [Self::Cc50, Self::Cc70, Self::Cc80, Self::CcAny]
    }

    /// Worst acceptable cloud cover, in percent.
    pub fn required_clouds(self) -> f64 {
        match self {
            Self::Cc50 => 50.0,
            Self::Cc70 => 70.0,
            Self::Cc80 => 80.0,
            Self::CcAny => 100.0,
        }
    }

    pub fn weight(self) -> u32 {
        match self {
            Self::Cc50 => 30,
            Self::Cc70 => 20,
            Self::Cc80 => 10,
            Self::CcAny => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cc50 => "CC50",
            Self::Cc70 => "CC70",
            Self::Cc80 => "CC80",
            Self::CcAny => "CCAny",
        }
    }
}

// ============================================================================
// WATER VAPOR
// ============================================================================

/// Water-vapor percentile (humidity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WvTier {
    /// Below 30% humidity.
    #[serde(rename = "WV20")]
    Wv20,
    /// Below 50% humidity.
    #[serde(rename = "WV50")]
    Wv50,
    /// Below 70% humidity.
    #[serde(rename = "WV80")]
    Wv80,
    /// Any humidity.
    #[serde(rename = "WVAny")]
    WvAny,
}

impl WvTier {
    pub fn all() -> [WvTier; 4] {
        [Self::Wv20, Self::Wv50, Self::Wv80, Self::WvAny]
    }

    /// Worst acceptable humidity, in percent.
    pub fn required_humidity(self) -> f64 {
        match self {
            Self::Wv20 => 30.0,
            Self::Wv50 => 50.0,
            Self::Wv80 => 70.0,
            Self::WvAny => 100.0,
        }
    }

    pub fn weight(self) -> u32 {
        match self {
            Self::Wv20 => 20,
            Self::Wv50 => 12,
            Self::Wv80 => 6,
            Self::WvAny => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Wv20 => "WV20",
            Self::Wv50 => "WV50",
            Self::Wv80 => "WV80",
            Self::WvAny => "WVAny",
        }
    }
}

macro_rules! tier_text {
    ($tier:ty, $kind:literal) => {
        impl fmt::Display for $tier {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $tier {
            type Err = TierParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::all()
                    .into_iter()
                    .find(|t| t.label() == s)
                    .ok_or_else(|| TierParseError {
                        kind: $kind,
                        label: s.to_string(),
                    })
            }
        }
    };
}

tier_text!(IqTier, "IQ");
tier_text!(CcTier, "CC");
tier_text!(WvTier, "WV");

// ============================================================================
// REQUIREMENTS
// ============================================================================

/// The three condition tiers a target demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirements {
    pub iq: IqTier,
    pub cc: CcTier,
    pub wv: WvTier,
}

impl Requirements {
    pub fn new(iq: IqTier, cc: CcTier, wv: WvTier) -> Self {
        Self { iq, cc, wv }
    }

    /// Maximum points before weather multipliers.
    pub fn base_points(&self) -> u32 {
        self.iq.weight() + self.cc.weight() + self.wv.weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stricter_tiers_weigh_more() {
        let iq = IqTier::all();
        let cc = CcTier::all();
        let wv = WvTier::all();
        for pair in iq.windows(2) {
            assert!(pair[0].weight() > pair[1].weight());
            assert!(pair[0].required_seeing() < pair[1].required_seeing());
        }
        for pair in cc.windows(2) {
            assert!(pair[0].weight() > pair[1].weight());
            assert!(pair[0].required_clouds() < pair[1].required_clouds());
        }
        for pair in wv.windows(2) {
            assert!(pair[0].weight() > pair[1].weight());
            assert!(pair[0].required_humidity() < pair[1].required_humidity());
        }
    }

    #[test]
    fn test_label_roundtrip() {
        for t in IqTier::all() {
            assert_eq!(t.label().parse::<IqTier>().unwrap(), t);
        }
        for t in CcTier::all() {
            assert_eq!(t.to_string().parse::<CcTier>().unwrap(), t);
        }
        for t in WvTier::all() {
            assert_eq!(t.label().parse::<WvTier>().unwrap(), t);
        }
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = "IQ50".parse::<IqTier>().unwrap_err();
        assert_eq!(err.kind, "IQ");
        assert_eq!(err.label, "IQ50");
        assert!("cc50".parse::<CcTier>().is_err());
        assert!("".parse::<WvTier>().is_err());
    }

    #[test]
    fn test_base_points() {
        let any = Requirements::new(IqTier::IqAny, CcTier::CcAny, WvTier::WvAny);
        assert_eq!(any.base_points(), 23);
        let strict = Requirements::new(IqTier::Iq20, CcTier::Cc50, WvTier::Wv20);
        assert_eq!(strict.base_points(), 100);
    }
}
