use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Upper bound on `lookback_hours` and `window_hours`: one leap year.
pub const MAX_HOURS: usize = 24 * 366;

/// Tunable parameters of a scoring run.
///
/// Stored as a JSON object on disk; omitted keys keep their defaults:
/// ```json
/// {
///   "lookback_hours": 24,
///   "window_hours": 24,
///   "concurrency": 8
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Hours of grid before admission (the first bin is `-lookback_hours`).
    pub lookback_hours: i64,
    /// Preceding bins included in each trailing window, besides the current one.
    pub window_hours: usize,
    /// Maximum number of stays scored at once.
    pub concurrency: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            window_hours: 24,
            concurrency: 8,
        }
    }
}

impl ScoringConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {path}"))?;
        let config: ScoringConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {path}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.lookback_hours >= 0, "lookback_hours must not be negative");
        ensure!(
            self.lookback_hours <= MAX_HOURS as i64,
            "lookback_hours must be at most {MAX_HOURS}"
        );
        ensure!(
            self.window_hours <= MAX_HOURS,
            "window_hours must be at most {MAX_HOURS}"
        );
        ensure!(self.concurrency > 0, "concurrency must be at least 1");
        Ok(())
    }
}
