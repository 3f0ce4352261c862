//! Per-stay failures. None of these abort a batch.

use chrono::NaiveDateTime;

use crate::inputs::types::StayId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StayError {
    #[error("stay {stay_id}: outtime {outtime} precedes intime {intime}")]
    InvertedInterval {
        stay_id: StayId,
        intime: NaiveDateTime,
        outtime: NaiveDateTime,
    },

    #[error("stay {stay_id}: {count} stay records share this id")]
    DuplicateStay { stay_id: StayId, count: usize },

    #[error("stay {stay_id}: scoring worker failed: {reason}")]
    WorkerFailed { stay_id: StayId, reason: String },
}

impl StayError {
    pub fn stay_id(&self) -> StayId {
        match self {
            StayError::InvertedInterval { stay_id, .. }
            | StayError::DuplicateStay { stay_id, .. }
            | StayError::WorkerFailed { stay_id, .. } => *stay_id,
        }
    }
}
