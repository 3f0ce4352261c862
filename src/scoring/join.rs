//! Interval join of a stay's events onto its hourly grid.
//!
//! Point events (vitals, GCS, urine, labs, blood gases) are located directly
//! from their offset to the grid anchor; infusions are tested against every
//! bin since one infusion may span many hours.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::warn;

use crate::inputs::partition::StayInputs;
use crate::inputs::types::{AdmissionId, BloodGas, Vasopressor, VentilationEpisode};
use crate::scoring::types::HourlyBin;

const MILLIS_PER_HOUR: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrineVolume {
    pub value: f64,
    pub irrigant: bool,
}

/// Raw values of every category that fell into one bin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinEvents {
    pub mbp: Vec<f64>,
    pub gcs: Vec<f64>,
    pub urine: Vec<UrineVolume>,
    pub bilirubin: Vec<f64>,
    pub creatinine: Vec<f64>,
    pub platelet: Vec<f64>,
    pub pafi_vent: Vec<f64>,
    pub pafi_novent: Vec<f64>,
    pub dopamine: Vec<f64>,
    pub dobutamine: Vec<f64>,
    pub epinephrine: Vec<f64>,
    pub norepinephrine: Vec<f64>,
}

/// A blood gas whose upstream ventilation flag contradicts the episode data.
/// It contributes to neither PaO2/FiO2 variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedSample {
    pub hadm_id: AdmissionId,
    #[serde(with = "crate::inputs::timestamp")]
    pub charttime: NaiveDateTime,
    pub pao2fio2ratio: Option<f64>,
    pub flagged_ventilated: bool,
    pub episode_ventilated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedStay {
    /// Parallel to the grid: `events[i]` belongs to `bins[i]`.
    pub events: Vec<BinEvents>,
    pub flagged: Vec<FlaggedSample>,
}

/// Which PaO2/FiO2 variant a blood gas feeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GasClass {
    Ventilated,
    Unventilated,
    Conflict { flagged_ventilated: bool },
}

/// Classifies a blood gas against the stay's ventilation episodes
/// (inclusive at both ends).
pub fn classify_blood_gas(gas: &BloodGas, episodes: &[VentilationEpisode]) -> GasClass {
    let on_vent = episodes
        .iter()
        .any(|ep| ep.starttime <= gas.charttime && gas.charttime <= ep.endtime);

    match gas.ventilated {
        Some(flag) if flag != on_vent => GasClass::Conflict {
            flagged_ventilated: flag,
        },
        _ if on_vent => GasClass::Ventilated,
        _ => GasClass::Unventilated,
    }
}

/// Locates the bin whose `(start, end]` contains `t` in O(1).
struct GridIndex<'a> {
    anchor: NaiveDateTime,
    bins: &'a [HourlyBin],
}

impl<'a> GridIndex<'a> {
    fn new(bins: &'a [HourlyBin]) -> Option<Self> {
        let first = bins.first()?;
        Some(Self {
            anchor: first.start_time,
            bins,
        })
    }

    fn locate(&self, t: NaiveDateTime) -> Option<usize> {
        if t <= self.anchor {
            return None;
        }
        let millis = (t - self.anchor).num_milliseconds();
        // t in (anchor + k h, anchor + (k + 1) h]  =>  k = ceil(millis / h) - 1
        let k = ((millis + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR - 1).max(0);
        let idx = usize::try_from(k).ok()?;
        // whole milliseconds truncate, so the estimate may be one bin early
        [idx, idx + 1].into_iter().find(|&i| {
            self.bins
                .get(i)
                .is_some_and(|bin| bin.captures_instant(t))
        })
    }
}

/// Maps every event of `inputs` onto `bins`.
pub fn join_events(bins: &[HourlyBin], inputs: &StayInputs) -> JoinedStay {
    let mut events = vec![BinEvents::default(); bins.len()];
    let mut flagged = Vec::new();

    let Some(index) = GridIndex::new(bins) else {
        return JoinedStay { events, flagged };
    };

    macro_rules! place {
        ($t:expr, $field:ident, $value:expr) => {
            if let Some(idx) = index.locate($t) {
                events[idx].$field.push($value);
            }
        };
    }

    for row in &inputs.vitals {
        if let Some(mbp) = row.mbp {
            place!(row.charttime, mbp, mbp);
        }
    }
    for row in &inputs.gcs {
        if let Some(gcs) = row.gcs {
            place!(row.charttime, gcs, gcs);
        }
    }
    for row in &inputs.urine_output {
        place!(
            row.charttime,
            urine,
            UrineVolume {
                value: row.value,
                irrigant: row.irrigant,
            }
        );
    }
    for row in &inputs.labs {
        if let Some(v) = row.bilirubin {
            place!(row.charttime, bilirubin, v);
        }
        if let Some(v) = row.creatinine {
            place!(row.charttime, creatinine, v);
        }
        if let Some(v) = row.platelet {
            place!(row.charttime, platelet, v);
        }
    }

    for gas in &inputs.blood_gas {
        let Some(ratio) = gas.pao2fio2ratio else {
            continue;
        };
        if index.locate(gas.charttime).is_none() {
            continue;
        }
        match classify_blood_gas(gas, &inputs.ventilation) {
            GasClass::Ventilated => place!(gas.charttime, pafi_vent, ratio),
            GasClass::Unventilated => place!(gas.charttime, pafi_novent, ratio),
            GasClass::Conflict { flagged_ventilated } => {
                warn!(
                    stay_id = inputs.stay.stay_id,
                    hadm_id = gas.hadm_id,
                    charttime = %gas.charttime,
                    flagged_ventilated,
                    "Blood gas ventilation flag contradicts ventilation episodes"
                );
                flagged.push(FlaggedSample {
                    hadm_id: gas.hadm_id,
                    charttime: gas.charttime,
                    pao2fio2ratio: gas.pao2fio2ratio,
                    flagged_ventilated,
                    episode_ventilated: !flagged_ventilated,
                });
            }
        }
    }

    for infusion in &inputs.vasopressors {
        for (bin, slot) in bins.iter().zip(events.iter_mut()) {
            if !bin.captures_infusion(infusion.starttime, infusion.endtime) {
                continue;
            }
            let target = match infusion.drug {
                Vasopressor::Dopamine => &mut slot.dopamine,
                Vasopressor::Dobutamine => &mut slot.dobutamine,
                Vasopressor::Epinephrine => &mut slot.epinephrine,
                Vasopressor::Norepinephrine => &mut slot.norepinephrine,
            };
            target.push(infusion.rate);
        }
    }

    JoinedStay { events, flagged }
}
