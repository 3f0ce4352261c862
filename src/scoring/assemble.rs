//! Composite assembly and row retention.

use crate::inputs::types::StayId;
use crate::scoring::types::{BinAggregate, HourlyBin, ScoreRow, SubScores, TrailingScores};

/// Coalesces trailing sub-scores to 0. This is the only place a missing
/// sub-score becomes a number.
pub fn coalesce(trailing: &SubScores) -> TrailingScores {
    TrailingScores {
        respiration_24hours: trailing.respiration.unwrap_or(0),
        coagulation_24hours: trailing.coagulation.unwrap_or(0),
        liver_24hours: trailing.liver.unwrap_or(0),
        cardiovascular_24hours: trailing.cardiovascular.unwrap_or(0),
        cns_24hours: trailing.cns.unwrap_or(0),
        renal_24hours: trailing.renal.unwrap_or(0),
    }
}

/// Pre-admission bins are kept only when a lab was drawn in them.
pub fn is_retained(bin: &HourlyBin, aggregate: &BinAggregate) -> bool {
    bin.hour_offset >= 0 || aggregate.has_lab_signal()
}

/// Zips the per-bin series of one stay into retained output rows.
pub fn assemble(
    stay_id: StayId,
    bins: &[HourlyBin],
    aggregates: &[BinAggregate],
    uo_24hr: &[Option<f64>],
    scores: &[SubScores],
    trailing: &[SubScores],
) -> Vec<ScoreRow> {
    bins.iter()
        .zip(aggregates)
        .zip(uo_24hr)
        .zip(scores)
        .zip(trailing)
        .filter(|((((bin, aggregate), _), _), _)| is_retained(bin, aggregate))
        .map(|((((bin, aggregate), uo), scores), trailing)| {
            let trailing = coalesce(trailing);
            ScoreRow {
                stay_id,
                bin: *bin,
                aggregate: *aggregate,
                uo_24hr: *uo,
                scores: *scores,
                trailing,
                sofa_24hours: trailing.total(),
            }
        })
        .collect()
}
