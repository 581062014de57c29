//! Renderer-facing surface: change events and read-only snapshots.
//!
//! Renderers never touch `WeekState`. They either poll [`Snapshot::capture`]
//! or subscribe to the engine, which hands every listener each event
//! together with a fresh snapshot.

use crate::catalog::ObservationId;
use crate::night::TargetState;
use crate::week::{WeekState, WeekSummary};
use serde::{Deserialize, Serialize};
use skyqueue_logic::rating::WeekRating;
use skyqueue_logic::weather::{Condition, WeatherState};

/// Something observable changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    WeekStarted,
    QueueChanged {
        ids: Vec<ObservationId>,
    },
    NightStarted {
        night: usize,
        targets: usize,
    },
    SlewStarted {
        index: usize,
        id: ObservationId,
    },
    ObservationStarted {
        index: usize,
        id: ObservationId,
    },
    WeatherUpdated(WeatherState),
    ObservationCompleted {
        index: usize,
        id: ObservationId,
        points: u32,
        efficiency: u32,
    },
    /// The last target has settled; the night is about to close.
    QueueExhausted {
        completed: usize,
    },
    NightAborted {
        night: usize,
    },
    NightEnded {
        night: usize,
        score: u32,
        efficiency: u32,
    },
    WeekCompleted {
        weekly_score: u32,
        rating: WeekRating,
    },
}

/// Queue row as displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntryView {
    pub id: ObservationId,
    pub name: String,
    pub duration: u32,
    pub state: TargetState,
}

/// Everything a renderer draws, copied out of the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub night_index: usize,
    pub day_name: String,
    /// `HH:MM`.
    pub clock: String,
    pub weather: WeatherState,
    pub condition: Condition,
    pub seeing_bar_percent: f64,
    pub queue: Vec<QueueEntryView>,
    pub is_running: bool,
    pub current_target: Option<String>,
    pub progress: f64,
    pub progress_text: Option<String>,
    /// Telescope readout, sexagesimal.
    pub ra: String,
    pub dec: String,
    pub night_score: u32,
    pub weekly_score: u32,
    /// Weekly total plus tonight's running score.
    pub display_score: u32,
    /// `completed / queued` for tonight.
    pub completed_tonight: usize,
    pub available_count: usize,
    pub week_complete: bool,
    pub summary: Option<WeekSummary>,
}

impl Snapshot {
    pub fn capture(week: &WeekState) -> Self {
        let night = week.night();
        let weather = week.weather();
        let pointing = night.pointing();

        let queue = if night.targets().is_empty() {
            week.queue()
                .entries()
                .iter()
                .map(|o| QueueEntryView {
                    id: o.id,
                    name: o.name.clone(),
                    duration: o.duration,
                    state: TargetState::Idle,
                })
                .collect()
        } else {
            night
                .targets()
                .iter()
                .zip(night.target_states())
                .map(|(o, state)| QueueEntryView {
                    id: o.id,
                    name: o.name.clone(),
                    duration: o.duration,
                    state,
                })
                .collect()
        };

        Self {
            night_index: week.night_index(),
            day_name: week.day_name().to_string(),
            clock: week.clock().to_string(),
            weather,
            condition: weather.condition(),
            seeing_bar_percent: weather.seeing_bar_percent(),
            queue,
            is_running: week.is_running(),
            current_target: night.current_target().map(|o| o.name.clone()),
            progress: night.progress(),
            progress_text: night.progress_text(),
            ra: pointing.ra_text(),
            dec: pointing.dec_text(),
            night_score: week.night_score(),
            weekly_score: week.weekly_score(),
            display_score: week.display_score(),
            completed_tonight: night.completed().len(),
            available_count: week.available().len(),
            week_complete: week.is_week_complete(),
            summary: week.summary().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::SimConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_planning_snapshot() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut week = WeekState::new(Catalog::builtin().unwrap(), &mut rng);
        week.add_to_queue(1);
        week.add_to_queue(2);
        let snap = Snapshot::capture(&week);
        assert_eq!(snap.day_name, "Sunday");
        assert_eq!(snap.clock, "19:00:00");
        assert_eq!(snap.queue.len(), 2);
        assert!(snap.queue.iter().all(|e| e.state == TargetState::Idle));
        assert!(!snap.is_running);
        assert!(snap.current_target.is_none());
        assert_eq!(snap.available_count, 30);
        assert_eq!(snap.ra, "00:00:00");
    }

    #[test]
    fn test_running_snapshot_tracks_states() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut week = WeekState::new(Catalog::builtin().unwrap(), &mut rng);
        let config = SimConfig::default();
        week.add_to_queue(6);
        week.add_to_queue(1);
        week.start_night();
        // Slew (1000) + 3 minute exposure (666) + part of the pause
        week.tick(2000.0, &config, &mut rng);
        let snap = Snapshot::capture(&week);
        assert!(snap.is_running);
        assert_eq!(snap.queue[0].state, TargetState::Complete);
        assert_eq!(snap.queue[1].state, TargetState::Idle);
        assert_eq!(snap.completed_tonight, 1);
        // Two minutes of running time plus the 3 minute exposure
        assert!((week.clock().total_seconds() - (19.0 * 3600.0 + 300.0)).abs() < 1e-6);
        assert!(snap.clock.starts_with("19:0"));
        assert!(snap.night_score > 0);
        assert_eq!(snap.display_score, snap.night_score);
        assert_ne!(snap.ra, "00:00:00");

        // Pause ends at 2666, slew to M42 ends at 3666
        week.tick(1800.0, &config, &mut rng);
        let snap = Snapshot::capture(&week);
        assert_eq!(snap.queue[1].state, TargetState::Observing);
        assert_eq!(snap.current_target.as_deref(), Some("M42 - Orion Nebula"));
        assert!(snap.progress > 0.0 && snap.progress < 1.0);
    }
}
