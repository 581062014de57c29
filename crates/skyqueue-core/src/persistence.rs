//! Save/Load of a week in progress
//!
//! Uses bincode for the binary save and serde_json for the human-readable
//! end-of-week export. A save taken while a night is running stores the
//! week as if that night had been aborted: loading always lands in the
//! planning phase.

use crate::config::SimConfig;
use crate::error::SaveError;
use crate::week::{NightResult, WeekState, WeekSummary};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 2;

/// Everything needed to resume a session.
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Seed the session's RNG was created from
    pub seed: u64,
    pub config: SimConfig,
    pub week: WeekState,
}

/// Result of loading a save
pub struct LoadedWeek {
    pub seed: u64,
    pub config: SimConfig,
    pub week: WeekState,
}

/// Write a binary save of `week`.
pub fn save_week<W: Write>(
    writer: W,
    week: &WeekState,
    config: &SimConfig,
    seed: u64,
) -> Result<(), SaveError> {
    let mut week = week.clone();
    if week.is_running() {
        log::info!(
            "Saving during night {}: the running night is not kept",
            week.night_index()
        );
    }
    week.discard_running_night();
    week.drain_events();

    let save_data = SaveData {
        version: SAVE_VERSION,
        seed,
        config: config.clone(),
        week,
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Read a binary save.
pub fn load_week<R: Read>(reader: R) -> Result<LoadedWeek, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    Ok(LoadedWeek {
        seed: save_data.seed,
        config: save_data.config,
        week: save_data.week,
    })
}

/// JSON layout of the end-of-week export.
#[derive(Serialize)]
struct SummaryExport<'a> {
    summary: &'a WeekSummary,
    nights: &'a [NightResult],
}

/// Write the finished week's summary and per-night results as JSON.
pub fn export_summary<W: Write>(writer: W, week: &WeekState) -> Result<(), SaveError> {
    let summary = week.summary().ok_or(SaveError::NoSummary)?;
    let export = SummaryExport {
        summary,
        nights: week.results(),
    };
    serde_json::to_writer_pretty(writer, &export)?;
    Ok(())
}
