//! Per-bin reduction of joined event values to one scalar per category.

use crate::scoring::join::{BinEvents, UrineVolume};
use crate::scoring::types::BinAggregate;

pub fn aggregate_bin(events: &BinEvents) -> BinAggregate {
    BinAggregate {
        meanbp_min: min_of(&events.mbp),
        gcs_min: min_of(&events.gcs),
        urineoutput: net_urine(&events.urine),
        bilirubin_max: max_of(&events.bilirubin),
        creatinine_max: max_of(&events.creatinine),
        platelet_min: min_of(&events.platelet),
        pao2fio2ratio_vent: min_of(&events.pafi_vent),
        pao2fio2ratio_novent: min_of(&events.pafi_novent),
        rate_dopamine: max_of(&events.dopamine),
        rate_dobutamine: max_of(&events.dobutamine),
        rate_epinephrine: max_of(&events.epinephrine),
        rate_norepinephrine: max_of(&events.norepinephrine),
    }
}

/// Minimum of the values, `None` when there are none.
pub fn min_of(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Maximum of the values, `None` when there are none.
pub fn max_of(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Net urine volume: irrigant instilled is subtracted.
pub fn net_urine(volumes: &[UrineVolume]) -> Option<f64> {
    if volumes.is_empty() {
        return None;
    }
    Some(
        volumes
            .iter()
            .map(|v| if v.irrigant { -v.value } else { v.value })
            .sum(),
    )
}
