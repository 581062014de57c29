//! Target catalog: the master list and the subset still open this week.
//!
//! Catalog JSON carries requirement labels as strings; they are validated
//! into tier enums when the catalog loads, so nothing downstream ever looks
//! up a label that might not exist.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use skyqueue_logic::coordinates::Pointing;
use skyqueue_logic::scoring::{self, Score};
use skyqueue_logic::tiers::{CcTier, IqTier, Requirements, WvTier};
use skyqueue_logic::weather::WeatherState;
use std::collections::HashSet;
use std::path::Path;

/// Default catalog shipped with the crate.
const BUILTIN_CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

pub type ObservationId = u32;

/// Target type, used by renderers to pick a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Nebula,
    Galaxy,
    Star,
    Comet,
    Exoplanet,
    Cluster,
    Asteroid,
}

impl TargetKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "nebula" => Some(Self::Nebula),
            "galaxy" => Some(Self::Galaxy),
            "star" => Some(Self::Star),
            "comet" => Some(Self::Comet),
            "exoplanet" => Some(Self::Exoplanet),
            "cluster" => Some(Self::Cluster),
            "asteroid" => Some(Self::Asteroid),
            _ => None,
        }
    }
}

/// A catalog entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: ObservationId,
    pub name: String,
    pub kind: TargetKind,
    /// Right ascension, `HH:MM:SS`.
    pub ra: String,
    /// Declination, `±DD°MM'SS"`.
    pub dec: String,
    pub requirements: Requirements,
    /// Exposure length in simulated minutes.
    pub duration: u32,
    pub non_sidereal: bool,
    pub description: String,
}

impl Observation {
    pub fn base_points(&self) -> u32 {
        self.requirements.base_points()
    }

    /// Parsed pointing; malformed coordinates come back as zero.
    pub fn pointing(&self) -> Pointing {
        Pointing::parse(&self.ra, &self.dec)
    }

    pub fn score(&self, weather: &WeatherState) -> Score {
        scoring::score(&self.requirements, weather)
    }
}

/// Catalog entry as written in JSON, before label validation.
#[derive(Debug, Clone, Deserialize)]
struct RawObservation {
    id: ObservationId,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    ra: String,
    dec: String,
    iq: String,
    cc: String,
    wv: String,
    duration: u32,
    #[serde(default)]
    non_sidereal: bool,
    #[serde(default)]
    description: String,
}

impl TryFrom<RawObservation> for Observation {
    type Error = CatalogError;

    fn try_from(raw: RawObservation) -> Result<Self, Self::Error> {
        let id = raw.id;
        let tier_err = |source| CatalogError::UnknownTier { id, source };
        let iq: IqTier = raw.iq.parse().map_err(tier_err)?;
        let cc: CcTier = raw.cc.parse().map_err(tier_err)?;
        let wv: WvTier = raw.wv.parse().map_err(tier_err)?;
        let kind = TargetKind::from_label(&raw.kind).ok_or_else(|| CatalogError::UnknownKind {
            id,
            kind: raw.kind.clone(),
        })?;
        if raw.duration == 0 {
            return Err(CatalogError::InvalidDuration { id });
        }

        Ok(Observation {
            id,
            name: raw.name,
            kind,
            ra: raw.ra,
            dec: raw.dec,
            requirements: Requirements::new(iq, cc, wv),
            duration: raw.duration,
            non_sidereal: raw.non_sidereal,
            description: raw.description,
        })
    }
}

// ============================================================================
// MASTER CATALOG
// ============================================================================

/// The full, validated target list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    observations: Vec<Observation>,
}

impl Catalog {
    /// Build from already-typed observations, rejecting duplicate ids.
    pub fn new(observations: Vec<Observation>) -> Result<Self, CatalogError> {
        if observations.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for obs in &observations {
            if !seen.insert(obs.id) {
                return Err(CatalogError::DuplicateId(obs.id));
            }
        }
        Ok(Self { observations })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let raw: Vec<RawObservation> = serde_json::from_str(json)?;
        let observations = raw
            .into_iter()
            .map(Observation::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(observations)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The 30-target teaching catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG_JSON)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn get(&self, id: ObservationId) -> Option<&Observation> {
        self.observations.iter().find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Sum of base points over every target; the best a week could score
    /// without weather bonuses.
    pub fn max_possible_score(&self) -> u32 {
        self.observations.iter().map(Observation::base_points).sum()
    }
}

// ============================================================================
// AVAILABLE SUBSET
// ============================================================================

/// Targets not yet completed this week. Completed targets leave for good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    available: Vec<Observation>,
}

impl CatalogState {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            available: catalog.observations.clone(),
        }
    }

    pub fn contains(&self, id: ObservationId) -> bool {
        self.available.iter().any(|o| o.id == id)
    }

    pub fn get(&self, id: ObservationId) -> Option<&Observation> {
        self.available.iter().find(|o| o.id == id)
    }

    /// Remove a completed target. Returns whether it was still available.
    pub fn retire(&mut self, id: ObservationId) -> bool {
        let before = self.available.len();
        self.available.retain(|o| o.id != id);
        self.available.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.available.iter()
    }

    pub fn ids(&self) -> Vec<ObservationId> {
        self.available.iter().map(|o| o.id).collect()
    }

    pub fn len(&self) -> usize {
        self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}
