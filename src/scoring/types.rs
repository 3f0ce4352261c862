//! Derived per-bin types of the scoring pipeline.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::inputs::types::StayId;

/// One hour of a stay's grid, the half-open interval `[start_time, end_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyBin {
    pub hour_offset: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl HourlyBin {
    /// Point events snap to the hour that just ended: `start < t <= end`.
    pub fn captures_instant(&self, t: NaiveDateTime) -> bool {
        self.start_time < t && t <= self.end_time
    }

    /// An infusion over `[starttime, endtime]` counts for this bin when it is
    /// running at bin close, or when it starts and stops inside the bin.
    pub fn captures_infusion(&self, starttime: NaiveDateTime, endtime: NaiveDateTime) -> bool {
        let running_at_close = starttime < self.end_time && self.end_time <= endtime;
        let within_bin = self.start_time <= starttime && endtime < self.end_time;
        running_at_close || within_bin
    }
}

/// Reduced scalar per category for one bin. `None` means no qualifying event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BinAggregate {
    pub meanbp_min: Option<f64>,
    pub gcs_min: Option<f64>,
    pub urineoutput: Option<f64>,
    pub bilirubin_max: Option<f64>,
    pub creatinine_max: Option<f64>,
    pub platelet_min: Option<f64>,
    pub pao2fio2ratio_vent: Option<f64>,
    pub pao2fio2ratio_novent: Option<f64>,
    pub rate_dopamine: Option<f64>,
    pub rate_dobutamine: Option<f64>,
    pub rate_epinephrine: Option<f64>,
    pub rate_norepinephrine: Option<f64>,
}

impl BinAggregate {
    /// True when any lab draw (bilirubin, creatinine, platelets) fell in the bin.
    pub fn has_lab_signal(&self) -> bool {
        self.bilirubin_max.is_some() || self.creatinine_max.is_some() || self.platelet_min.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Respiration,
    Coagulation,
    Liver,
    Cardiovascular,
    Neurological,
    Renal,
}

impl Subsystem {
    pub const ALL: [Subsystem; 6] = [
        Subsystem::Respiration,
        Subsystem::Coagulation,
        Subsystem::Liver,
        Subsystem::Cardiovascular,
        Subsystem::Neurological,
        Subsystem::Renal,
    ];
}

/// Sub-scores for one bin, each 0-4 or `None` when the subsystem had no data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubScores {
    pub respiration: Option<u8>,
    pub coagulation: Option<u8>,
    pub liver: Option<u8>,
    pub cardiovascular: Option<u8>,
    pub cns: Option<u8>,
    pub renal: Option<u8>,
}

impl SubScores {
    pub fn get(&self, subsystem: Subsystem) -> Option<u8> {
        match subsystem {
            Subsystem::Respiration => self.respiration,
            Subsystem::Coagulation => self.coagulation,
            Subsystem::Liver => self.liver,
            Subsystem::Cardiovascular => self.cardiovascular,
            Subsystem::Neurological => self.cns,
            Subsystem::Renal => self.renal,
        }
    }

    pub fn set(&mut self, subsystem: Subsystem, value: Option<u8>) {
        let slot = match subsystem {
            Subsystem::Respiration => &mut self.respiration,
            Subsystem::Coagulation => &mut self.coagulation,
            Subsystem::Liver => &mut self.liver,
            Subsystem::Cardiovascular => &mut self.cardiovascular,
            Subsystem::Neurological => &mut self.cns,
            Subsystem::Renal => &mut self.renal,
        };
        *slot = value;
    }
}

/// Trailing-window sub-scores after null coalescing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrailingScores {
    pub respiration_24hours: u8,
    pub coagulation_24hours: u8,
    pub liver_24hours: u8,
    pub cardiovascular_24hours: u8,
    pub cns_24hours: u8,
    pub renal_24hours: u8,
}

impl TrailingScores {
    pub fn total(&self) -> u8 {
        self.respiration_24hours
            + self.coagulation_24hours
            + self.liver_24hours
            + self.cardiovascular_24hours
            + self.cns_24hours
            + self.renal_24hours
    }
}

/// Final output row for one retained bin.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub stay_id: StayId,
    pub bin: HourlyBin,
    pub aggregate: BinAggregate,
    /// Urine output summed over the trailing window, the renal input.
    pub uo_24hr: Option<f64>,
    pub scores: SubScores,
    pub trailing: TrailingScores,
    pub sofa_24hours: u8,
}
