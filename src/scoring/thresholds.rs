//! Threshold bands per subsystem.
//!
//! Bands are checked from most to least severe and the first match wins.
//! A subsystem scores `None` only when every input it reads is absent;
//! otherwise values that cross no band score 0.
//!
//! | Subsystem      | 4                                   | 3                                   | 2                      | 1           |
//! |----------------|-------------------------------------|-------------------------------------|------------------------|-------------|
//! | respiration    | vent PF < 100                       | vent PF < 200                       | non-vent PF < 300      | non-vent PF < 400 |
//! | coagulation    | platelets < 20                      | < 50                                | < 100                  | < 150       |
//! | liver          | bilirubin >= 12.0                   | >= 6.0                              | >= 2.0                 | >= 1.2      |
//! | cardiovascular | dopa > 15, epi > 0.1, norepi > 0.1  | dopa > 5, epi <= 0.1, norepi <= 0.1 | dopa > 0, dobu > 0     | MAP < 70    |
//! | neurological   | GCS < 6                             | < 10                                | < 13                   | < 15        |
//! | renal          | creat >= 5.0, 24h urine < 200       | creat 3.5-5.0, 24h urine < 500      | creat 2.0-3.5          | creat 1.2-2.0 |

use crate::scoring::types::{BinAggregate, SubScores};

fn lt(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v < limit)
}

fn le(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v <= limit)
}

fn gt(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v > limit)
}

fn ge(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v >= limit)
}

fn within(value: Option<f64>, low: f64, high: f64) -> bool {
    value.is_some_and(|v| v >= low && v < high)
}

pub fn respiration(vent: Option<f64>, novent: Option<f64>) -> Option<u8> {
    if vent.is_none() && novent.is_none() {
        return None;
    }
    Some(match () {
        _ if lt(vent, 100.0) => 4,
        _ if lt(vent, 200.0) => 3,
        _ if lt(novent, 300.0) => 2,
        _ if lt(novent, 400.0) => 1,
        _ => 0,
    })
}

pub fn coagulation(platelet_min: Option<f64>) -> Option<u8> {
    let p = platelet_min?;
    Some(match p {
        p if p < 20.0 => 4,
        p if p < 50.0 => 3,
        p if p < 100.0 => 2,
        p if p < 150.0 => 1,
        _ => 0,
    })
}

pub fn liver(bilirubin_max: Option<f64>) -> Option<u8> {
    let b = bilirubin_max?;
    Some(match b {
        b if b >= 12.0 => 4,
        b if b >= 6.0 => 3,
        b if b >= 2.0 => 2,
        b if b >= 1.2 => 1,
        _ => 0,
    })
}

pub fn cardiovascular(agg: &BinAggregate) -> Option<u8> {
    let map = agg.meanbp_min;
    let dopa = agg.rate_dopamine;
    let dobu = agg.rate_dobutamine;
    let epi = agg.rate_epinephrine;
    let norepi = agg.rate_norepinephrine;

    if [map, dopa, dobu, epi, norepi].iter().all(Option::is_none) {
        return None;
    }
    Some(match () {
        _ if gt(dopa, 15.0) || gt(epi, 0.1) || gt(norepi, 0.1) => 4,
        _ if gt(dopa, 5.0) || le(epi, 0.1) || le(norepi, 0.1) => 3,
        _ if gt(dopa, 0.0) || gt(dobu, 0.0) => 2,
        _ if lt(map, 70.0) => 1,
        _ => 0,
    })
}

pub fn neurological(gcs_min: Option<f64>) -> Option<u8> {
    let g = gcs_min?;
    Some(match g {
        g if g < 6.0 => 4,
        g if g < 10.0 => 3,
        g if g < 13.0 => 2,
        g if g < 15.0 => 1,
        _ => 0,
    })
}

/// `uo_24hr` is the trailing-window urine sum, not the bin's own volume.
pub fn renal(creatinine_max: Option<f64>, uo_24hr: Option<f64>) -> Option<u8> {
    if creatinine_max.is_none() && uo_24hr.is_none() {
        return None;
    }
    let cr = creatinine_max;
    Some(match () {
        _ if ge(cr, 5.0) || lt(uo_24hr, 200.0) => 4,
        _ if within(cr, 3.5, 5.0) || lt(uo_24hr, 500.0) => 3,
        _ if within(cr, 2.0, 3.5) => 2,
        _ if within(cr, 1.2, 2.0) => 1,
        _ => 0,
    })
}

/// Scores every subsystem for one bin.
pub fn score_bin(agg: &BinAggregate, uo_24hr: Option<f64>) -> SubScores {
    SubScores {
        respiration: respiration(agg.pao2fio2ratio_vent, agg.pao2fio2ratio_novent),
        coagulation: coagulation(agg.platelet_min),
        liver: liver(agg.bilirubin_max),
        cardiovascular: cardiovascular(agg),
        cns: neurological(agg.gcs_min),
        renal: renal(agg.creatinine_max, uo_24hr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respiration_boundaries() {
        assert_eq!(respiration(None, None), None);
        assert_eq!(respiration(Some(99.0), None), Some(4));
        assert_eq!(respiration(Some(100.0), None), Some(3));
        assert_eq!(respiration(Some(199.0), None), Some(3));
        // ventilated ratios above 200 do not fall through to the unventilated bands
        assert_eq!(respiration(Some(250.0), None), Some(0));
        assert_eq!(respiration(None, Some(299.0)), Some(2));
        assert_eq!(respiration(None, Some(300.0)), Some(1));
        assert_eq!(respiration(None, Some(399.0)), Some(1));
        assert_eq!(respiration(None, Some(400.0)), Some(0));
        assert_eq!(respiration(Some(150.0), Some(350.0)), Some(3));
    }

    #[test]
    fn test_coagulation_boundaries() {
        assert_eq!(coagulation(None), None);
        assert_eq!(coagulation(Some(19.0)), Some(4));
        assert_eq!(coagulation(Some(20.0)), Some(3));
        assert_eq!(coagulation(Some(49.0)), Some(3));
        assert_eq!(coagulation(Some(50.0)), Some(2));
        assert_eq!(coagulation(Some(100.0)), Some(1));
        assert_eq!(coagulation(Some(149.0)), Some(1));
        assert_eq!(coagulation(Some(150.0)), Some(0));
    }

    #[test]
    fn test_liver_boundaries() {
        assert_eq!(liver(None), None);
        assert_eq!(liver(Some(12.0)), Some(4));
        assert_eq!(liver(Some(11.9)), Some(3));
        assert_eq!(liver(Some(6.0)), Some(3));
        assert_eq!(liver(Some(2.0)), Some(2));
        assert_eq!(liver(Some(1.2)), Some(1));
        assert_eq!(liver(Some(1.19)), Some(0));
    }

    #[test]
    fn test_cardiovascular_bands() {
        let agg = |f: fn(&mut BinAggregate)| {
            let mut a = BinAggregate::default();
            f(&mut a);
            cardiovascular(&a)
        };
        assert_eq!(agg(|_| {}), None);
        assert_eq!(agg(|a| a.rate_dopamine = Some(15.5)), Some(4));
        assert_eq!(agg(|a| a.rate_norepinephrine = Some(0.11)), Some(4));
        assert_eq!(agg(|a| a.rate_epinephrine = Some(0.1)), Some(3));
        assert_eq!(agg(|a| a.rate_norepinephrine = Some(0.0)), Some(3));
        assert_eq!(agg(|a| a.rate_dopamine = Some(5.5)), Some(3));
        assert_eq!(agg(|a| a.rate_dopamine = Some(5.0)), Some(2));
        assert_eq!(agg(|a| a.rate_dobutamine = Some(2.0)), Some(2));
        assert_eq!(agg(|a| a.meanbp_min = Some(69.0)), Some(1));
        assert_eq!(agg(|a| a.meanbp_min = Some(70.0)), Some(0));
        assert_eq!(agg(|a| a.rate_dobutamine = Some(0.0)), Some(0));
    }

    #[test]
    fn test_cardiovascular_highest_band_wins() {
        let a = BinAggregate {
            meanbp_min: Some(55.0),
            rate_dopamine: Some(3.0),
            rate_epinephrine: Some(0.2),
            ..Default::default()
        };
        assert_eq!(cardiovascular(&a), Some(4));
    }

    #[test]
    fn test_neurological_boundaries() {
        assert_eq!(neurological(None), None);
        assert_eq!(neurological(Some(15.0)), Some(0));
        assert_eq!(neurological(Some(14.0)), Some(1));
        assert_eq!(neurological(Some(13.0)), Some(1));
        assert_eq!(neurological(Some(12.0)), Some(2));
        assert_eq!(neurological(Some(10.0)), Some(2));
        assert_eq!(neurological(Some(9.0)), Some(3));
        assert_eq!(neurological(Some(6.0)), Some(3));
        assert_eq!(neurological(Some(5.0)), Some(4));
        assert_eq!(neurological(Some(3.0)), Some(4));
    }

    #[test]
    fn test_neurological_fractional_gcs_has_no_gaps() {
        assert_eq!(neurological(Some(5.5)), Some(4));
        assert_eq!(neurological(Some(9.5)), Some(3));
        assert_eq!(neurological(Some(12.5)), Some(2));
        assert_eq!(neurological(Some(14.5)), Some(1));
        assert_eq!(neurological(Some(15.5)), Some(0));
    }

    #[test]
    fn test_renal_boundaries() {
        assert_eq!(renal(None, None), None);
        assert_eq!(renal(Some(5.0), None), Some(4));
        assert_eq!(renal(Some(4.9), None), Some(3));
        assert_eq!(renal(Some(3.5), None), Some(3));
        assert_eq!(renal(Some(3.4), None), Some(2));
        assert_eq!(renal(Some(2.0), None), Some(2));
        assert_eq!(renal(Some(1.9), None), Some(1));
        assert_eq!(renal(Some(1.2), None), Some(1));
        assert_eq!(renal(Some(1.1), None), Some(0));
        assert_eq!(renal(None, Some(199.0)), Some(4));
        assert_eq!(renal(None, Some(200.0)), Some(3));
        assert_eq!(renal(None, Some(499.0)), Some(3));
        assert_eq!(renal(None, Some(500.0)), Some(0));
        assert_eq!(renal(Some(1.5), Some(150.0)), Some(4));
    }

    #[test]
    fn test_score_bin_keeps_missing_subsystems_null() {
        let agg = BinAggregate {
            platelet_min: Some(100.0),
            ..Default::default()
        };
        let scores = score_bin(&agg, None);
        assert_eq!(scores.coagulation, Some(1));
        assert_eq!(scores.respiration, None);
        assert_eq!(scores.renal, None);
        assert_eq!(scores.cns, None);
    }
}
