//! End-of-week rating bands.

use serde::{Deserialize, Serialize};

/// Qualitative verdict on a finished week, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeekRating {
    OutstandingCoordinator,
    ExcellentObserver,
    GoodWork,
    KeepPracticing,
}

impl WeekRating {
    /// Pick the band from weekly efficiency and catalog completion (both percent).
    /// Both thresholds of a band must be met.
    pub fn from_percentages(efficiency: u32, completion: u32) -> Self {
        if efficiency >= 90 && completion >= 80 {
            Self::OutstandingCoordinator
        } else if efficiency >= 75 && completion >= 60 {
            Self::ExcellentObserver
        } else if efficiency >= 60 && completion >= 40 {
            Self::GoodWork
        } else {
            Self::KeepPracticing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OutstandingCoordinator => "Outstanding Queue Coordinator!",
            Self::ExcellentObserver => "Excellent Observer!",
            Self::GoodWork => "Good Work!",
            Self::KeepPracticing => "Keep Practicing!",
        }
    }
}
