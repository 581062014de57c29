//! Leaderboard client.
//!
//! The service stores and ranks week-end scores; the engine only submits
//! and reads them. Wire layout (`GET /scores`, `POST /scores`, and the
//! `GET /scores/stream` SSE feed) is fixed by the service and mirrored
//! field for field here.

use crate::error::LeaderboardError;
use crate::week::WeekSummary;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::cell::RefCell;
use std::io::{BufRead, BufReader};
use std::time::Duration;

/// Most records the service returns.
pub const LEADERBOARD_SIZE: usize = 20;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// WIRE TYPES
// ============================================================================

/// A ranked entry as returned by `GET /scores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u32,
    pub observations: u32,
    pub efficiency: u32,
    pub date: String,
}

/// Body of `POST /scores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub name: String,
    pub score: u32,
    pub observations: u32,
    pub efficiency: u32,
}

impl ScoreSubmission {
    pub fn from_summary(name: &str, summary: &WeekSummary) -> Self {
        Self {
            name: name.trim().to_string(),
            score: summary.weekly_score,
            observations: summary.observations_completed as u32,
            efficiency: summary.weekly_efficiency,
        }
    }
}

/// Reply to `POST /scores`: either an acceptance or `{ "error": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmitResponse {
    Accepted { success: bool, rank: u32, score: u32 },
    Failed { error: String },
}

/// Where an accepted submission landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub rank: u32,
    pub score: u32,
}

impl SubmitResponse {
    pub fn into_receipt(self) -> Result<SubmitReceipt, LeaderboardError> {
        match self {
            Self::Accepted {
                success: true,
                rank,
                score,
            } => Ok(SubmitReceipt { rank, score }),
            Self::Accepted { success: false, .. } => {
                Err(LeaderboardError::Rejected("service reported failure".to_string()))
            }
            Self::Failed { error } => Err(LeaderboardError::Rejected(error)),
        }
    }
}

// ============================================================================
// CLIENT TRAIT
// ============================================================================

pub trait LeaderboardClient {
    /// Top scores, best first, at most [`LEADERBOARD_SIZE`].
    fn top_scores(&self) -> Result<Vec<ScoreRecord>, LeaderboardError>;

    fn submit(&self, submission: &ScoreSubmission) -> Result<SubmitReceipt, LeaderboardError>;
}

// ============================================================================
// HTTP
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpLeaderboard {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpLeaderboard {
    pub fn new(base_url: &str) -> Result<Self, LeaderboardError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, LeaderboardError> {
        let response = self.client.get(self.url(path)).send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LeaderboardError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .map_err(|e| LeaderboardError::Parse(e.to_string()))
    }

    /// Follow the SSE feed, calling `on_update` with each pushed top list
    /// until it returns `false` or the server closes the stream.
    pub fn stream_updates<F>(&self, mut on_update: F) -> Result<(), LeaderboardError>
    where
        F: FnMut(Vec<ScoreRecord>) -> bool,
    {
        let response = self
            .client
            .get(self.url("/scores/stream"))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .timeout(Duration::from_secs(24 * 60 * 60))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeaderboardError::ServerError {
                status: status.as_u16(),
                message: "stream refused".to_string(),
            });
        }

        let mut decoder = SseDecoder::default();
        for line in BufReader::new(response).lines() {
            let line = line.map_err(|e| LeaderboardError::Connection(e.to_string()))?;
            match decoder.push_line(&line) {
                Some(Ok(records)) => {
                    if !on_update(records) {
                        break;
                    }
                }
                Some(Err(e)) => log::warn!("Skipping malformed leaderboard event: {}", e),
                None => {}
            }
        }
        Ok(())
    }
}

impl LeaderboardClient for HttpLeaderboard {
    fn top_scores(&self) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        self.get("/scores")
    }

    fn submit(&self, submission: &ScoreSubmission) -> Result<SubmitReceipt, LeaderboardError> {
        let response = self.client.post(self.url("/scores")).json(submission).send()?;
        let status = response.status();
        let body = response.text()?;

        // Rejections arrive as `{ "error": ... }` with a 4xx status
        match serde_json::from_str::<SubmitResponse>(&body) {
            Ok(reply) => reply.into_receipt(),
            Err(_) if !status.is_success() => Err(LeaderboardError::ServerError {
                status: status.as_u16(),
                message: body,
            }),
            Err(e) => Err(LeaderboardError::Parse(e.to_string())),
        }
    }
}

// ============================================================================
// SERVER-SENT EVENTS
// ============================================================================

/// Line-at-a-time SSE decoder for the leaderboard feed. `data:` lines
/// accumulate until a blank line ends the event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    data: Vec<String>,
}

impl SseDecoder {
    pub fn push_line(
        &mut self,
        line: &str,
    ) -> Option<Result<Vec<ScoreRecord>, LeaderboardError>> {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let payload = std::mem::take(&mut self.data).join("\n");
            return Some(
                serde_json::from_str(&payload).map_err(|e| LeaderboardError::Parse(e.to_string())),
            );
        }
        if let Some(rest) = line.strip_prefix("data:") {
            self.data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
        // Comments (`:`) and other fields are ignored
        None
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Ranked store with the service's behaviour, for offline runs and tests.
/// Only the top [`LEADERBOARD_SIZE`] records are kept.
#[derive(Debug, Default)]
pub struct InMemoryLeaderboard {
    records: RefCell<Vec<ScoreRecord>>,
}

impl InMemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl LeaderboardClient for InMemoryLeaderboard {
    fn top_scores(&self) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        Ok(self
            .records
            .borrow()
            .iter()
            .take(LEADERBOARD_SIZE)
            .cloned()
            .collect())
    }

    fn submit(&self, submission: &ScoreSubmission) -> Result<SubmitReceipt, LeaderboardError> {
        let name = submission.name.trim();
        if name.is_empty() {
            return Err(LeaderboardError::Rejected("Name is required".to_string()));
        }

        let mut records = self.records.borrow_mut();
        // Ties keep earlier submissions ahead
        let index = records
            .iter()
            .position(|r| r.score < submission.score)
            .unwrap_or(records.len());
        records.insert(
            index,
            ScoreRecord {
                name: name.to_string(),
                score: submission.score,
                observations: submission.observations,
                efficiency: submission.efficiency,
                date: chrono::Utc::now().to_rfc3339(),
            },
        );
        records.truncate(LEADERBOARD_SIZE);

        Ok(SubmitReceipt {
            rank: index as u32 + 1,
            score: submission.score,
        })
    }
}
