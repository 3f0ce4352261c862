//! Input feed loading.
//!
//! [`EventSource`] is the seam to the upstream event normalizer. [`CsvDirSource`]
//! reads one CSV file per feed from a directory; a fully materialized
//! [`ClinicalInputs`] is itself a source, which is what tests use.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::inputs::types::ClinicalInputs;

pub const STAYS_FILE: &str = "stays.csv";
pub const VITALS_FILE: &str = "vitals.csv";
pub const GCS_FILE: &str = "gcs.csv";
pub const URINE_OUTPUT_FILE: &str = "urine_output.csv";
pub const LABS_FILE: &str = "labs.csv";
pub const BLOOD_GAS_FILE: &str = "blood_gas.csv";
pub const VENTILATION_FILE: &str = "ventilation.csv";
pub const VASOPRESSORS_FILE: &str = "vasopressors.csv";

/// Supplies every input feed for a scoring run.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn load(&self) -> Result<ClinicalInputs>;
}

/// Reads feeds from `<dir>/<feed>.csv`. Only the stays file is required.
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl EventSource for CsvDirSource {
    async fn load(&self) -> Result<ClinicalInputs> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || load_dir(&dir))
            .await
            .context("feed loader task panicked")?
    }
}

#[async_trait]
impl EventSource for ClinicalInputs {
    async fn load(&self) -> Result<ClinicalInputs> {
        Ok(self.clone())
    }
}

/// Loads all feeds from `dir` synchronously.
#[tracing::instrument(fields(dir = %dir.display()))]
pub fn load_dir(dir: &Path) -> Result<ClinicalInputs> {
    let stays_path = dir.join(STAYS_FILE);
    if !stays_path.exists() {
        bail!("required feed {} not found", stays_path.display());
    }

    let inputs = ClinicalInputs {
        stays: read_csv(&stays_path)?,
        vitals: read_optional(dir, VITALS_FILE)?,
        gcs: read_optional(dir, GCS_FILE)?,
        urine_output: read_optional(dir, URINE_OUTPUT_FILE)?,
        labs: read_optional(dir, LABS_FILE)?,
        blood_gas: read_optional(dir, BLOOD_GAS_FILE)?,
        ventilation: read_optional(dir, VENTILATION_FILE)?,
        vasopressors: read_optional(dir, VASOPRESSORS_FILE)?,
    };

    info!(stays = inputs.stays.len(), "Input feeds loaded");
    Ok(inputs)
}

fn read_optional<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<Vec<T>> {
    let path = dir.join(file_name);
    if !path.exists() {
        warn!(feed = file_name, "Feed file missing, treating as empty");
        return Ok(Vec::new());
    }
    read_csv(&path)
}

/// Deserializes every row of a headed CSV file. A malformed row fails the load.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize().enumerate() {
        let record: T =
            result.with_context(|| format!("{}: malformed row {}", path.display(), idx + 1))?;
        rows.push(record);
    }

    debug!(path = %path.display(), rows = rows.len(), "Feed read");
    Ok(rows)
}
