//! Record types for the pre-cleaned input feeds.
//!
//! Every feed is produced upstream, already unit-converted and range-filtered.
//! Nullable measurement columns are `Option`: an empty cell means the value was
//! not charted, never that it was normal.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

pub type StayId = i64;
pub type AdmissionId = i64;

/// One ICU stay. Source of truth for the hourly grid bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stay {
    pub stay_id: StayId,
    pub hadm_id: AdmissionId,
    #[serde(with = "crate::inputs::timestamp")]
    pub intime: NaiveDateTime,
    #[serde(with = "crate::inputs::timestamp")]
    pub outtime: NaiveDateTime,
}

/// A charted vital sign row; only mean arterial pressure is scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSign {
    pub stay_id: StayId,
    #[serde(with = "crate::inputs::timestamp")]
    pub charttime: NaiveDateTime,
    pub mbp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcsObservation {
    pub stay_id: StayId,
    #[serde(with = "crate::inputs::timestamp")]
    pub charttime: NaiveDateTime,
    pub gcs: Option<f64>,
}

/// A urine output charting. Irrigant rows record fluid instilled into the
/// bladder and are subtracted from the hourly total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrineOutput {
    pub stay_id: StayId,
    #[serde(with = "crate::inputs::timestamp")]
    pub charttime: NaiveDateTime,
    pub value: f64,
    #[serde(default, deserialize_with = "blank_as_false")]
    pub irrigant: bool,
}

/// Reads an optional flag cell; a blank cell is `false`.
fn blank_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// A lab draw for an admission. Panels are sparse: any analyte may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabPanel {
    pub hadm_id: AdmissionId,
    #[serde(with = "crate::inputs::timestamp")]
    pub charttime: NaiveDateTime,
    pub bilirubin: Option<f64>,
    pub creatinine: Option<f64>,
    pub platelet: Option<f64>,
}

/// An arterial blood gas with its PaO2/FiO2 ratio.
///
/// `ventilated` is an optional classification made upstream. When present it
/// is cross-checked against the stay's ventilation episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodGas {
    pub hadm_id: AdmissionId,
    #[serde(with = "crate::inputs::timestamp")]
    pub charttime: NaiveDateTime,
    pub pao2fio2ratio: Option<f64>,
    #[serde(default)]
    pub ventilated: Option<bool>,
}

/// An invasive ventilation episode, inclusive at both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentilationEpisode {
    pub stay_id: StayId,
    #[serde(with = "crate::inputs::timestamp")]
    pub starttime: NaiveDateTime,
    #[serde(with = "crate::inputs::timestamp")]
    pub endtime: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vasopressor {
    Dopamine,
    Dobutamine,
    Epinephrine,
    Norepinephrine,
}

/// A constant-rate vasopressor infusion over `[starttime, endtime]`.
/// Rates are in mcg/kg/min.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VasopressorRate {
    pub stay_id: StayId,
    pub drug: Vasopressor,
    #[serde(with = "crate::inputs::timestamp")]
    pub starttime: NaiveDateTime,
    #[serde(with = "crate::inputs::timestamp")]
    pub endtime: NaiveDateTime,
    pub rate: f64,
}

/// All input feeds for one scoring run, fully materialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClinicalInputs {
    pub stays: Vec<Stay>,
    pub vitals: Vec<VitalSign>,
    pub gcs: Vec<GcsObservation>,
    pub urine_output: Vec<UrineOutput>,
    pub labs: Vec<LabPanel>,
    pub blood_gas: Vec<BloodGas>,
    pub ventilation: Vec<VentilationEpisode>,
    pub vasopressors: Vec<VasopressorRate>,
}

impl ClinicalInputs {
    /// Row counts per feed, in load order.
    pub fn feed_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("stays", self.stays.len()),
            ("vitals", self.vitals.len()),
            ("gcs", self.gcs.len()),
            ("urine_output", self.urine_output.len()),
            ("labs", self.labs.len()),
            ("blood_gas", self.blood_gas.len()),
            ("ventilation", self.ventilation.len()),
            ("vasopressors", self.vasopressors.len()),
        ]
    }
}
