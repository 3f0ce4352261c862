//! Output of score rows and the batch summary.
//!
//! Score rows go to CSV, optionally gzip-compressed; the summary is written
//! as pretty-printed JSON.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::inputs::types::StayId;
use crate::scoring::types::ScoreRow;
use crate::summary::BatchSummary;

/// Flat CSV layout of a [`ScoreRow`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub stay_id: StayId,
    pub hr: i64,
    #[serde(with = "crate::inputs::timestamp")]
    pub starttime: NaiveDateTime,
    #[serde(with = "crate::inputs::timestamp")]
    pub endtime: NaiveDateTime,

    // per-bin aggregates
    pub meanbp_min: Option<f64>,
    pub gcs_min: Option<f64>,
    pub urineoutput: Option<f64>,
    pub uo_24hr: Option<f64>,
    pub bilirubin_max: Option<f64>,
    pub creatinine_max: Option<f64>,
    pub platelet_min: Option<f64>,
    pub pao2fio2ratio_novent: Option<f64>,
    pub pao2fio2ratio_vent: Option<f64>,
    pub rate_dopamine: Option<f64>,
    pub rate_dobutamine: Option<f64>,
    pub rate_epinephrine: Option<f64>,
    pub rate_norepinephrine: Option<f64>,

    // hourly sub-scores
    pub respiration: Option<u8>,
    pub coagulation: Option<u8>,
    pub liver: Option<u8>,
    pub cardiovascular: Option<u8>,
    pub cns: Option<u8>,
    pub renal: Option<u8>,

    // trailing 24 hour sub-scores
    pub respiration_24hours: u8,
    pub coagulation_24hours: u8,
    pub liver_24hours: u8,
    pub cardiovascular_24hours: u8,
    pub cns_24hours: u8,
    pub renal_24hours: u8,

    pub sofa_24hours: u8,
}

impl From<&ScoreRow> for ScoreRecord {
    fn from(row: &ScoreRow) -> Self {
        let a = &row.aggregate;
        let s = &row.scores;
        let t = &row.trailing;
        ScoreRecord {
            stay_id: row.stay_id,
            hr: row.bin.hour_offset,
            starttime: row.bin.start_time,
            endtime: row.bin.end_time,
            meanbp_min: a.meanbp_min,
            gcs_min: a.gcs_min,
            urineoutput: a.urineoutput,
            uo_24hr: row.uo_24hr,
            bilirubin_max: a.bilirubin_max,
            creatinine_max: a.creatinine_max,
            platelet_min: a.platelet_min,
            pao2fio2ratio_novent: a.pao2fio2ratio_novent,
            pao2fio2ratio_vent: a.pao2fio2ratio_vent,
            rate_dopamine: a.rate_dopamine,
            rate_dobutamine: a.rate_dobutamine,
            rate_epinephrine: a.rate_epinephrine,
            rate_norepinephrine: a.rate_norepinephrine,
            respiration: s.respiration,
            coagulation: s.coagulation,
            liver: s.liver,
            cardiovascular: s.cardiovascular,
            cns: s.cns,
            renal: s.renal,
            respiration_24hours: t.respiration_24hours,
            coagulation_24hours: t.coagulation_24hours,
            liver_24hours: t.liver_24hours,
            cardiovascular_24hours: t.cardiovascular_24hours,
            cns_24hours: t.cns_24hours,
            renal_24hours: t.renal_24hours,
            sofa_24hours: row.sofa_24hours,
        }
    }
}

/// Writes score rows to a new CSV file at `path`, replacing any existing
/// file. With `gzip` the stream is gzip-compressed. Returns the row count.
pub fn write_scores<'a>(
    path: &str,
    rows: impl IntoIterator<Item = &'a ScoreRow>,
    gzip: bool,
) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    let count = if gzip {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let count = write_records(&mut encoder, rows)?;
        encoder.finish()?.flush()?;
        count
    } else {
        let mut writer = BufWriter::new(file);
        let count = write_records(&mut writer, rows)?;
        writer.flush()?;
        count
    };

    info!(path, rows = count, gzip, "Score rows written");
    Ok(count)
}

/// Appends score rows to a CSV file, writing the header only when the file
/// is new.
pub fn append_scores<'a>(path: &str, rows: impl IntoIterator<Item = &'a ScoreRow>) -> Result<usize> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending score rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    let mut count = 0;
    for row in rows {
        writer.serialize(ScoreRecord::from(row))?;
        count += 1;
    }
    writer.flush()?;

    Ok(count)
}

fn write_records<'a, W: Write>(sink: W, rows: impl IntoIterator<Item = &'a ScoreRow>) -> Result<usize> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(sink);
    let mut count = 0;
    for row in rows {
        writer.serialize(ScoreRecord::from(row))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Writes the batch summary as pretty-printed JSON.
pub fn write_summary(path: &str, summary: &BatchSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {path}"))?;
    info!(path, "Batch summary written");
    Ok(())
}

/// Logs the batch summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &BatchSummary) {
    debug!("{:#?}", summary);
}
