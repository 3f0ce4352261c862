//! Per-stay scoring and the batch fan-out over stays.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::config::ScoringConfig;
use crate::error::StayError;
use crate::inputs::partition::{Partitioned, StayInputs};
use crate::inputs::types::StayId;
use crate::scoring::join::FlaggedSample;
use crate::scoring::types::{BinAggregate, ScoreRow, SubScores};
use crate::scoring::window::{SubScoreWindow, TrailingSum};
use crate::scoring::{aggregate, assemble, grid, join, thresholds};
use crate::summary::{BatchSummary, StayOutcome};

/// Scored rows of one stay.
#[derive(Debug, Clone, PartialEq)]
pub struct StayScores {
    pub stay_id: StayId,
    pub rows: Vec<ScoreRow>,
    pub flagged: Vec<FlaggedSample>,
}

impl StayScores {
    pub fn peak_sofa(&self) -> Option<u8> {
        self.rows.iter().map(|r| r.sofa_24hours).max()
    }
}

/// Everything a batch run produced.
#[derive(Debug)]
pub struct BatchReport {
    /// Scored stays in ascending stay id order.
    pub scored: Vec<StayScores>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn rows(&self) -> impl Iterator<Item = &ScoreRow> {
        self.scored.iter().flat_map(|s| s.rows.iter())
    }
}

/// Scores one stay.
///
/// Bins are processed in two phases: the trailing urine sum is computed over
/// all aggregates before any threshold is evaluated, since renal scoring
/// reads it; the trailing sub-score maxima run over the finished scores.
pub fn score_stay(inputs: &StayInputs, config: &ScoringConfig) -> Result<StayScores, StayError> {
    let stay_id = inputs.stay.stay_id;
    let bins = grid::build_grid(&inputs.stay, config.lookback_hours)?;
    let joined = join::join_events(&bins, inputs);

    let aggregates: Vec<BinAggregate> = joined.events.iter().map(aggregate::aggregate_bin).collect();

    let mut urine = TrailingSum::new(config.window_hours);
    let uo_24hr: Vec<Option<f64>> = aggregates.iter().map(|a| urine.push(a.urineoutput)).collect();

    let scores: Vec<SubScores> = aggregates
        .iter()
        .zip(&uo_24hr)
        .map(|(a, uo)| thresholds::score_bin(a, *uo))
        .collect();

    let mut window = SubScoreWindow::new(config.window_hours);
    let trailing: Vec<SubScores> = scores.iter().map(|s| window.push(s)).collect();

    let rows = assemble::assemble(stay_id, &bins, &aggregates, &uo_24hr, &scores, &trailing);
    debug!(stay_id, bins = bins.len(), rows = rows.len(), "Stay scored");

    Ok(StayScores {
        stay_id,
        rows,
        flagged: joined.flagged,
    })
}

/// Waits for a permit, then scores the stay on the blocking pool inside the
/// caller's span.
async fn score_in_worker(
    inputs: StayInputs,
    config: Arc<ScoringConfig>,
    sem: Arc<Semaphore>,
) -> Result<StayScores, StayError> {
    let stay_id = inputs.stay.stay_id;
    let _permit = sem.acquire_owned().await.map_err(|e| StayError::WorkerFailed {
        stay_id,
        reason: e.to_string(),
    })?;

    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(|| score_stay(&inputs, &config)))
        .await
        .map_err(|e| StayError::WorkerFailed {
            stay_id,
            reason: e.to_string(),
        })?
}

/// Scores every partitioned stay concurrently, at most `config.concurrency`
/// at a time. A failing stay never aborts the batch.
#[tracing::instrument(skip_all, fields(stays = partitioned.stays.len(), concurrency = config.concurrency))]
pub async fn run_batch(partitioned: Partitioned, config: &ScoringConfig) -> BatchReport {
    let started = Instant::now();
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let config = Arc::new(config.clone());

    let mut outcomes: Vec<StayOutcome> = partitioned.rejected.iter().map(StayOutcome::failed).collect();
    let mut tasks = Vec::with_capacity(partitioned.stays.len());

    for inputs in partitioned.stays {
        let stay_id = inputs.stay.stay_id;
        let sem = semaphore.clone();
        let config = config.clone();
        let span = tracing::info_span!("score_stay", stay_id);

        let task = tokio::spawn(score_in_worker(inputs, config, sem).instrument(span));
        tasks.push((stay_id, task));
    }

    let mut scored = Vec::with_capacity(tasks.len());
    for (stay_id, task) in tasks {
        let result = task.await.unwrap_or_else(|e| {
            Err(StayError::WorkerFailed {
                stay_id,
                reason: e.to_string(),
            })
        });
        match result {
            Ok(stay) => {
                if !stay.flagged.is_empty() {
                    warn!(stay_id, flagged = stay.flagged.len(), "Stay has flagged blood gas samples");
                }
                outcomes.push(StayOutcome::scored(
                    stay_id,
                    stay.rows.len(),
                    stay.peak_sofa(),
                    stay.flagged.clone(),
                ));
                scored.push(stay);
            }
            Err(e) => {
                error!(stay_id, error = %e, "Stay scoring failed");
                outcomes.push(StayOutcome::failed(&e));
            }
        }
    }
    scored.sort_by_key(|s| s.stay_id);

    let summary = BatchSummary::from_outcomes(outcomes, partitioned.orphan_events);
    info!(
        scored = summary.stays_scored,
        failed = summary.stays_failed,
        rows = summary.rows,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Batch scoring finished"
    );

    BatchReport { scored, summary }
}
