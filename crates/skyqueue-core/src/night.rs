//! Night execution state machine.
//!
//! Each queued target moves Idle → Slewing → Observing → Complete, with a
//! fixed settling pause after every completion. The orchestrator only moves
//! when `tick` hands it elapsed real milliseconds; leftover time from one
//! phase carries into the next, so one coarse tick and many fine ticks walk
//! through the same sequence of states.

use crate::catalog::Observation;
use crate::config::SimConfig;
use crate::snapshot::SimEvent;
use serde::{Deserialize, Serialize};
use skyqueue_logic::constants::night;
use skyqueue_logic::coordinates::Pointing;
use skyqueue_logic::scoring::Score;
use skyqueue_logic::weather::{block_for_hour, step_weather, ForecastBlock, WeatherState};
use std::fmt;

// ============================================================================
// SIMULATED CLOCK
// ============================================================================

/// Simulated wall clock, in seconds since midnight of the night's first day.
/// Runs at `time_speed` while a night executes and jumps forward by a
/// target's duration when its exposure completes.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SimClock {
    seconds: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::night_start()
    }
}

impl SimClock {
    /// 19:00:00.
    pub fn night_start() -> Self {
        Self {
            seconds: f64::from(night::START_HOUR * 3600),
        }
    }

    pub fn advance_minutes(&mut self, minutes: u32) {
        self.seconds += f64::from(minutes * 60);
    }

    /// Negative or non-finite amounts are ignored.
    pub fn advance_seconds(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.seconds += seconds;
        }
    }

    fn whole_seconds(&self) -> u64 {
        self.seconds.floor() as u64
    }

    /// Clock hour, 0..24.
    pub fn hour(&self) -> u32 {
        ((self.whole_seconds() / 3600) % 24) as u32
    }

    pub fn minute(&self) -> u32 {
        ((self.whole_seconds() / 60) % 60) as u32
    }

    pub fn second(&self) -> u32 {
        (self.whole_seconds() % 60) as u32
    }

    pub fn total_seconds(&self) -> f64 {
        self.seconds
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

// ============================================================================
// STATES
// ============================================================================

/// Per-target execution state, as shown next to each queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    Idle,
    Slewing,
    Observing,
    Complete,
}

/// Where the night is. Elapsed times are real milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NightPhase {
    /// Planning; nothing runs.
    Idle,
    Slewing {
        index: usize,
        elapsed_ms: f64,
    },
    Observing {
        index: usize,
        elapsed_ms: f64,
        duration_ms: f64,
    },
    /// Pause after a completion; `next_index` may equal the queue length.
    Settling {
        next_index: usize,
        elapsed_ms: f64,
    },
    /// Every target is done; the week closes the night on its next look.
    NightComplete,
}

impl NightPhase {
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::Slewing { .. } | Self::Observing { .. } | Self::Settling { .. }
        )
    }
}

/// A scored target, kept in completion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedObservation {
    pub observation: Observation,
    pub score: Score,
    /// Simulated time after the exposure finished.
    pub completed_at: SimClock,
}

/// Mutable world state the orchestrator works on during a tick.
pub struct NightContext<'a> {
    pub weather: &'a mut WeatherState,
    pub clock: &'a mut SimClock,
    pub forecast: &'a [ForecastBlock],
    pub config: &'a SimConfig,
}

impl NightContext<'_> {
    /// Run the simulated clock for `real_ms` of night time.
    fn elapse(&mut self, real_ms: f64) {
        self.clock
            .advance_seconds(self.config.simulated_seconds(real_ms));
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightOrchestrator {
    targets: Vec<Observation>,
    phase: NightPhase,
    completed: Vec<CompletedObservation>,
    /// Where the telescope points now.
    pointing: Pointing,
    /// Where the current slew is headed.
    target_pointing: Pointing,
}

impl Default for NightOrchestrator {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            phase: NightPhase::Idle,
            completed: Vec::new(),
            pointing: Pointing::default(),
            target_pointing: Pointing::default(),
        }
    }
}

impl NightOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin executing `targets` in order. Refused (returns false) if the
    /// list is empty or a night is already under way.
    pub fn start(&mut self, targets: Vec<Observation>, events: &mut Vec<SimEvent>) -> bool {
        if targets.is_empty() || self.phase != NightPhase::Idle {
            return false;
        }
        self.targets = targets;
        self.completed.clear();
        self.begin_slew(0, events);
        true
    }

    /// Drop everything and return to planning. Telescope pointing is kept.
    pub fn reset(&mut self) {
        self.targets.clear();
        self.completed.clear();
        self.phase = NightPhase::Idle;
    }

    /// Advance by `dt_ms` real milliseconds.
    pub fn tick(&mut self, dt_ms: f64, ctx: &mut NightContext<'_>, events: &mut Vec<SimEvent>) {
        let mut remaining = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };

        loop {
            match self.phase {
                NightPhase::Idle | NightPhase::NightComplete => break,

                NightPhase::Slewing { index, elapsed_ms } => {
                    let needed = (ctx.config.slew_duration_ms - elapsed_ms).max(0.0);
                    if remaining < needed {
                        ctx.elapse(remaining);
                        self.phase = NightPhase::Slewing {
                            index,
                            elapsed_ms: elapsed_ms + remaining,
                        };
                        break;
                    }
                    ctx.elapse(needed);
                    remaining -= needed;
                    self.pointing = self.target_pointing;
                    let Some(target) = self.targets.get(index) else {
                        self.phase = NightPhase::NightComplete;
                        break;
                    };
                    let duration_ms = ctx.config.observation_real_ms(target.duration);
                    log::debug!("Observing {} for {:.0} ms", target.name, duration_ms);
                    events.push(SimEvent::ObservationStarted {
                        index,
                        id: target.id,
                    });
                    self.phase = NightPhase::Observing {
                        index,
                        elapsed_ms: 0.0,
                        duration_ms,
                    };
                }

                NightPhase::Observing {
                    index,
                    elapsed_ms,
                    duration_ms,
                } => {
                    if let Some(block) = block_for_hour(ctx.forecast, ctx.clock.hour()) {
                        step_weather(ctx.weather, block, ctx.config.weather_smoothing);
                        events.push(SimEvent::WeatherUpdated(*ctx.weather));
                    }

                    let needed = (duration_ms - elapsed_ms).max(0.0);
                    if remaining < needed {
                        ctx.elapse(remaining);
                        self.phase = NightPhase::Observing {
                            index,
                            elapsed_ms: elapsed_ms + remaining,
                            duration_ms,
                        };
                        break;
                    }
                    ctx.elapse(needed);
                    remaining -= needed;
                    self.complete_current(index, ctx, events);
                    self.phase = NightPhase::Settling {
                        next_index: index + 1,
                        elapsed_ms: 0.0,
                    };
                }

                NightPhase::Settling {
                    next_index,
                    elapsed_ms,
                } => {
                    let needed = (ctx.config.inter_target_pause_ms - elapsed_ms).max(0.0);
                    if remaining < needed {
                        ctx.elapse(remaining);
                        self.phase = NightPhase::Settling {
                            next_index,
                            elapsed_ms: elapsed_ms + remaining,
                        };
                        break;
                    }
                    ctx.elapse(needed);
                    remaining -= needed;
                    if next_index < self.targets.len() {
                        self.begin_slew(next_index, events);
                    } else {
                        self.phase = NightPhase::NightComplete;
                        events.push(SimEvent::QueueExhausted {
                            completed: self.completed.len(),
                        });
                    }
                }
            }
        }
    }

    fn begin_slew(&mut self, index: usize, events: &mut Vec<SimEvent>) {
        if let Some(target) = self.targets.get(index) {
            self.target_pointing = target.pointing();
            log::debug!(
                "Slewing to {} (RA {} Dec {})",
                target.name,
                self.target_pointing.ra_text(),
                self.target_pointing.dec_text()
            );
            events.push(SimEvent::SlewStarted {
                index,
                id: target.id,
            });
        }
        self.phase = NightPhase::Slewing {
            index,
            elapsed_ms: 0.0,
        };
    }

    fn complete_current(
        &mut self,
        index: usize,
        ctx: &mut NightContext<'_>,
        events: &mut Vec<SimEvent>,
    ) {
        let Some(target) = self.targets.get(index) else {
            return;
        };
        let score = target.score(ctx.weather);
        ctx.clock.advance_minutes(target.duration);
        log::info!(
            "Completed {}: +{} points ({}% efficiency) at {}",
            target.name,
            score.points,
            score.efficiency,
            ctx.clock
        );
        events.push(SimEvent::ObservationCompleted {
            index,
            id: target.id,
            points: score.points,
            efficiency: score.efficiency,
        });
        self.completed.push(CompletedObservation {
            observation: target.clone(),
            score,
            completed_at: *ctx.clock,
        });
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn phase(&self) -> NightPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == NightPhase::NightComplete
    }

    pub fn targets(&self) -> &[Observation] {
        &self.targets
    }

    pub fn completed(&self) -> &[CompletedObservation] {
        &self.completed
    }

    pub fn take_completed(&mut self) -> Vec<CompletedObservation> {
        std::mem::take(&mut self.completed)
    }

    pub fn pointing(&self) -> Pointing {
        self.pointing
    }

    pub fn target_pointing(&self) -> Pointing {
        self.target_pointing
    }

    /// Index of the target being slewed to or observed.
    pub fn current_index(&self) -> Option<usize> {
        match self.phase {
            NightPhase::Slewing { index, .. } | NightPhase::Observing { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn current_target(&self) -> Option<&Observation> {
        self.current_index().and_then(|i| self.targets.get(i))
    }

    pub fn target_states(&self) -> Vec<TargetState> {
        (0..self.targets.len())
            .map(|i| {
                if i < self.completed.len() {
                    return TargetState::Complete;
                }
                match self.phase {
                    NightPhase::Slewing { index, .. } if index == i => TargetState::Slewing,
                    NightPhase::Observing { index, .. } if index == i => TargetState::Observing,
                    _ => TargetState::Idle,
                }
            })
            .collect()
    }

    /// Exposure progress of the current target, 0.0..=1.0.
    pub fn progress(&self) -> f64 {
        match self.phase {
            NightPhase::Observing {
                elapsed_ms,
                duration_ms,
                ..
            } => {
                if duration_ms <= 0.0 {
                    1.0
                } else {
                    (elapsed_ms / duration_ms).min(1.0)
                }
            }
            _ => 0.0,
        }
    }

    /// Exposure progress in simulated time, `m:ss / d:00`.
    pub fn progress_text(&self) -> Option<String> {
        let NightPhase::Observing { index, .. } = self.phase else {
            return None;
        };
        let target = self.targets.get(index)?;
        let simulated_minutes = self.progress() * target.duration as f64;
        let mins = simulated_minutes.floor() as u32;
        let secs = ((simulated_minutes * 60.0) % 60.0).floor() as u32;
        Some(format!("{}:{:02} / {}:00", mins, secs, target.duration))
    }

    pub fn night_score(&self) -> u32 {
        self.completed.iter().map(|c| c.score.points).sum()
    }

    /// Base points of everything completed so far.
    pub fn possible_points(&self) -> u32 {
        self.completed.iter().map(|c| c.score.base_points).sum()
    }
}
