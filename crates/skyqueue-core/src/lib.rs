//! SkyQueue Core - queue observing simulation engine
//!
//! A learner queues up to six targets per night, each with image-quality,
//! cloud-cover and water-vapor requirements, then runs the night against
//! stochastic weather. Completed targets are scored on how well the sky met
//! their requirements and leave the catalog for the rest of the seven-night
//! week.
//!
//! # Architecture
//!
//! - [`week::WeekState`] owns the whole session: catalog, queue, the running
//!   night, weather, clock, forecasts and results.
//! - [`night::NightOrchestrator`] is the per-target state machine
//!   (Idle → Slewing → Observing → Complete) driven by elapsed time.
//! - [`weather`] draws forecasts from an injected RNG; smoothing and scoring
//!   are pure functions in `skyqueue-logic`.
//! - [`engine::SimulationEngine`] wraps a week with config, a seeded RNG and
//!   renderer listeners.
//!
//! # Example
//!
//! ```rust,no_run
//! use skyqueue_core::prelude::*;
//!
//! let mut engine = SimulationEngine::with_builtin_catalog(SimConfig::default(), 42)?;
//! engine.add_to_queue(6);
//! engine.add_to_queue(1);
//! engine.start_night();
//!
//! // Run at 60 FPS until the night closes
//! while engine.week().is_running() {
//!     engine.tick(1000.0 / 60.0);
//! }
//! println!("Weekly score: {}", engine.snapshot().weekly_score);
//! # Ok::<(), skyqueue_core::error::CatalogError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod night;
pub mod persistence;
pub mod queue;
pub mod snapshot;
pub mod weather;
pub mod week;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogState, Observation, ObservationId, TargetKind};
    pub use crate::config::SimConfig;
    pub use crate::engine::{Listener, SimulationEngine, SubscriptionId};
    pub use crate::leaderboard::{
        HttpLeaderboard, InMemoryLeaderboard, LeaderboardClient, ScoreRecord, ScoreSubmission,
        SubmitReceipt,
    };
    pub use crate::night::{NightPhase, SimClock, TargetState};
    pub use crate::snapshot::{SimEvent, Snapshot};
    pub use crate::week::{NightResult, WeekState, WeekSummary};
    pub use skyqueue_logic::rating::WeekRating;
    pub use skyqueue_logic::tiers::{CcTier, IqTier, Requirements, WvTier};
    pub use skyqueue_logic::weather::{Condition, WeatherState};
}
