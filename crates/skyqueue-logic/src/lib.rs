//! Pure observing-queue logic for SkyQueue.
//!
//! This crate holds everything about queue observing that needs no random
//! source, clock or I/O: condition tiers, the scoring curves, the weather
//! model and its smoothing step, and display conversions. The engine crate
//! drives these functions from its tick loop; tests call them directly.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Queue limit, week length, night hours, timing defaults |
//! | [`coordinates`] | Sexagesimal RA/Dec parsing and formatting (display only) |
//! | [`rating`] | End-of-week rating bands |
//! | [`scoring`] | IQ/CC/WV factor curves and observation scoring |
//! | [`tiers`] | IQ, CC and WV tiers with thresholds and point weights |
//! | [`weather`] | Weather state, forecast blocks, smoothing |

pub mod constants;
pub mod coordinates;
pub mod rating;
pub mod scoring;
pub mod tiers;
pub mod weather;
