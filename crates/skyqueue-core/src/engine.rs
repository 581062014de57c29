//! Simulation engine - main entry point for running a week
//!
//! Wraps a [`WeekState`] with its configuration, seeded RNG and renderer
//! listeners. Every mutation goes through here so listeners see each event.
//! The scheduling loop is the caller's: it calls [`SimulationEngine::tick`]
//! with elapsed real milliseconds, once per frame or in one large step.

use crate::catalog::{Catalog, ObservationId};
use crate::config::SimConfig;
use crate::error::{CatalogError, LeaderboardError, SaveError};
use crate::leaderboard::{LeaderboardClient, ScoreSubmission, SubmitReceipt};
use crate::persistence;
use crate::snapshot::{SimEvent, Snapshot};
use crate::week::{WeekState, WeekSummary};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Renderer callback: the event and the state right after it.
pub type Listener = Box<dyn FnMut(&SimEvent, &Snapshot)>;

/// Handle returned by [`SimulationEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Main simulation engine
pub struct SimulationEngine {
    week: WeekState,
    config: SimConfig,
    seed: u64,
    rng: ChaCha8Rng,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl SimulationEngine {
    /// Create an engine over `catalog`; forecasts come from `seed`.
    pub fn new(catalog: Catalog, config: SimConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut week = WeekState::new(catalog, &mut rng);
        week.drain_events();
        Self {
            week,
            config,
            seed,
            rng,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Engine over the bundled 30-target catalog.
    pub fn with_builtin_catalog(config: SimConfig, seed: u64) -> Result<Self, CatalogError> {
        Ok(Self::new(Catalog::builtin()?, config, seed))
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    pub fn add_to_queue(&mut self, id: ObservationId) -> bool {
        let accepted = self.week.add_to_queue(id);
        self.dispatch();
        accepted
    }

    pub fn remove_from_queue(&mut self, id: ObservationId) -> bool {
        let accepted = self.week.remove_from_queue(id);
        self.dispatch();
        accepted
    }

    pub fn clear_queue(&mut self) -> bool {
        let accepted = self.week.clear_queue();
        self.dispatch();
        accepted
    }

    pub fn start_night(&mut self) -> bool {
        let accepted = self.week.start_night();
        self.dispatch();
        accepted
    }

    pub fn abort_night(&mut self) -> bool {
        let accepted = self.week.abort_night();
        self.dispatch();
        accepted
    }

    /// Close the current night without running it (or after it ran).
    pub fn end_night(&mut self) -> bool {
        let accepted = self.week.end_night(&mut self.rng);
        self.dispatch();
        accepted
    }

    pub fn reset_week(&mut self) {
        self.week.reset_week(&mut self.rng);
        self.dispatch();
    }

    /// Advance by `dt_ms` real milliseconds.
    pub fn tick(&mut self, dt_ms: f64) {
        self.week.tick(dt_ms, &self.config, &mut self.rng);
        self.dispatch();
    }

    /// Tick in fixed steps until the running night closes. Returns the
    /// number of steps taken.
    pub fn run_night(&mut self, step_ms: f64) -> usize {
        let step_ms = if step_ms > 0.0 { step_ms } else { 16.0 };
        let mut steps = 0;
        while self.week.is_running() {
            self.tick(step_ms);
            steps += 1;
        }
        steps
    }

    // ========================================================================
    // OBSERVATION SURFACE
    // ========================================================================

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.week)
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn dispatch(&mut self) {
        let events = self.week.drain_events();
        if self.listeners.is_empty() || events.is_empty() {
            return;
        }
        // Every event of one operation shares the post-operation snapshot
        let snapshot = Snapshot::capture(&self.week);
        for event in &events {
            for (_, listener) in self.listeners.iter_mut() {
                listener(event, &snapshot);
            }
        }
    }

    pub fn week(&self) -> &WeekState {
        &self.week
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn summary(&self) -> Option<&WeekSummary> {
        self.week.summary()
    }

    // ========================================================================
    // LEADERBOARD
    // ========================================================================

    /// Submit the finished week. On failure the summary stays in place, so
    /// the call can simply be repeated.
    pub fn submit_week(
        &self,
        client: &dyn LeaderboardClient,
        name: &str,
    ) -> Result<SubmitReceipt, LeaderboardError> {
        let summary = self.week.summary().ok_or(LeaderboardError::WeekNotComplete)?;
        let submission = ScoreSubmission::from_summary(name, summary);
        match client.submit(&submission) {
            Ok(receipt) => {
                log::info!(
                    "Submitted {} points for {}: rank {}",
                    receipt.score,
                    submission.name,
                    receipt.rank
                );
                Ok(receipt)
            }
            Err(e) => {
                log::warn!("Leaderboard submission failed: {}", e);
                Err(e)
            }
        }
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Save the week to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_week(writer, &self.week, &self.config, self.seed)
    }

    /// Load a week from a reader, replacing the current one. Listeners stay
    /// subscribed.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = persistence::load_week(reader)?;
        let nights_done = loaded.week.results().len() as u64;
        self.week = loaded.week;
        self.config = loaded.config;
        self.seed = loaded.seed;
        // Offset by nights played; the saved RNG position is not kept
        self.rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(nights_done));
        log::info!(
            "Loaded week at night {} with {} points",
            self.week.night_index(),
            self.week.weekly_score()
        );
        Ok(())
    }

    /// Write the finished week as JSON.
    pub fn export_summary<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::export_summary(writer, &self.week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::InMemoryLeaderboard;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(seed: u64) -> SimulationEngine {
        SimulationEngine::with_builtin_catalog(SimConfig::default(), seed).unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let engine = engine(1);
        let snap = engine.snapshot();
        assert_eq!(snap.night_index, 0);
        assert_eq!(snap.available_count, 30);
        assert_eq!(engine.seed(), 1);
    }

    #[test]
    fn test_same_seed_same_week() {
        let a = engine(5);
        let b = engine(5);
        assert_eq!(a.week().weekly_forecast(), b.week().weekly_forecast());
        assert_eq!(a.week().night_forecast(), b.week().night_forecast());
    }

    #[test]
    fn test_listeners_see_every_event() {
        let mut engine = engine(2);
        let seen: Rc<RefCell<Vec<SimEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = engine.subscribe(Box::new(move |event: &SimEvent, snapshot: &Snapshot| {
            if let SimEvent::QueueChanged { ids } = event {
                assert_eq!(ids.len(), snapshot.queue.len());
            }
            sink.borrow_mut().push(event.clone());
        }));

        engine.add_to_queue(6);
        engine.add_to_queue(6);
        engine.start_night();
        engine.run_night(50.0);

        let events = seen.borrow().clone();
        assert_eq!(events[0], SimEvent::QueueChanged { ids: vec![6] });
        assert_eq!(
            events[1],
            SimEvent::NightStarted {
                night: 0,
                targets: 1
            }
        );
        assert!(events.contains(&SimEvent::SlewStarted { index: 0, id: 6 }));
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::ObservationCompleted { id: 6, .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::NightEnded { night: 0, .. })));

        assert!(engine.unsubscribe(id));
        let count = seen.borrow().len();
        engine.add_to_queue(1);
        assert_eq!(seen.borrow().len(), count);
    }

    #[test]
    fn test_events_of_one_tick_share_a_snapshot() {
        let mut engine = engine(7);
        engine.add_to_queue(6);
        engine.start_night();

        let seen: Rc<RefCell<Vec<Snapshot>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.subscribe(Box::new(move |_: &SimEvent, snapshot: &Snapshot| {
            sink.borrow_mut().push(snapshot.clone());
        }));

        // Finishes the slew and starts observing: several events at once
        engine.tick(1500.0);
        let snapshots = seen.borrow();
        assert!(snapshots.len() >= 2);
        let after = engine.snapshot();
        assert!(snapshots.iter().all(|s| *s == after));
    }

    #[test]
    fn test_submit_requires_finished_week() {
        let mut engine = engine(3);
        let board = InMemoryLeaderboard::new();
        assert!(matches!(
            engine.submit_week(&board, "Ana"),
            Err(LeaderboardError::WeekNotComplete)
        ));
        while engine.summary().is_none() {
            engine.end_night();
        }
        let receipt = engine.submit_week(&board, "Ana").unwrap();
        assert_eq!(receipt.rank, 1);
        assert_eq!(receipt.score, 0);
    }

    #[test]
    fn test_failed_submission_can_be_retried() {
        let mut engine = engine(4);
        while engine.summary().is_none() {
            engine.end_night();
        }
        let board = InMemoryLeaderboard::new();
        assert!(matches!(
            engine.submit_week(&board, "  "),
            Err(LeaderboardError::Rejected(_))
        ));
        assert!(engine.summary().is_some());
        assert!(engine.submit_week(&board, "Ana").is_ok());
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_engine_save_load() {
        let mut engine = engine(6);
        engine.add_to_queue(11);
        engine.start_night();
        engine.run_night(100.0);
        let score = engine.week().weekly_score();

        let mut buffer = Vec::new();
        engine.save(&mut buffer).expect("Save failed");

        let mut restored =
            SimulationEngine::with_builtin_catalog(SimConfig::default(), 99).unwrap();
        restored.load(&buffer[..]).expect("Load failed");
        assert_eq!(restored.seed(), 6);
        assert_eq!(restored.week().weekly_score(), score);
        assert_eq!(restored.week().night_index(), 1);
        assert!(!restored.week().available().contains(11));
    }
}
