//! Batch outcome records, written as the run summary JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StayError;
use crate::inputs::types::StayId;
use crate::scoring::join::FlaggedSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StayStatus {
    Scored,
    Failed,
}

/// Result of one stay within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayOutcome {
    pub stay_id: StayId,
    pub status: StayStatus,
    pub rows: usize,
    /// Highest composite over the stay's retained rows.
    pub peak_sofa: Option<u8>,
    pub flagged_samples: Vec<FlaggedSample>,
    pub error: Option<String>,
}

impl StayOutcome {
    pub fn scored(stay_id: StayId, rows: usize, peak_sofa: Option<u8>, flagged: Vec<FlaggedSample>) -> Self {
        Self {
            stay_id,
            status: StayStatus::Scored,
            rows,
            peak_sofa,
            flagged_samples: flagged,
            error: None,
        }
    }

    pub fn failed(err: &StayError) -> Self {
        Self {
            stay_id: err.stay_id(),
            status: StayStatus::Failed,
            rows: 0,
            peak_sofa: None,
            flagged_samples: Vec::new(),
            error: Some(err.to_string()),
        }
    }
}

/// Per-stay success/failure report of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub generated_at: DateTime<Utc>,
    pub stays_total: usize,
    pub stays_scored: usize,
    pub stays_failed: usize,
    pub rows: usize,
    pub orphan_events: usize,
    pub outcomes: Vec<StayOutcome>,
}

impl BatchSummary {
    /// Builds the summary; outcomes are ordered by stay id.
    pub fn from_outcomes(mut outcomes: Vec<StayOutcome>, orphan_events: usize) -> Self {
        outcomes.sort_by_key(|o| o.stay_id);
        let stays_scored = outcomes
            .iter()
            .filter(|o| o.status == StayStatus::Scored)
            .count();
        Self {
            generated_at: Utc::now(),
            stays_total: outcomes.len(),
            stays_scored,
            stays_failed: outcomes.len() - stays_scored,
            rows: outcomes.iter().map(|o| o.rows).sum(),
            orphan_events,
            outcomes,
        }
    }

    pub fn flagged_samples(&self) -> usize {
        self.outcomes.iter().map(|o| o.flagged_samples.len()).sum()
    }
}
