//! Integrity checks and per-stay partitioning of the input feeds.
//!
//! Stay-keyed feeds go to their stay. Admission-keyed feeds (labs, blood
//! gases) go to every stay of that admission; bin membership later restricts
//! them to the stay's own time range.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use crate::error::StayError;
use crate::inputs::types::{
    AdmissionId, BloodGas, ClinicalInputs, GcsObservation, LabPanel, Stay, StayId, UrineOutput,
    VasopressorRate, VentilationEpisode, VitalSign,
};

/// Everything needed to score one stay, independent of every other stay.
#[derive(Debug, Clone, PartialEq)]
pub struct StayInputs {
    pub stay: Stay,
    pub vitals: Vec<VitalSign>,
    pub gcs: Vec<GcsObservation>,
    pub urine_output: Vec<UrineOutput>,
    pub labs: Vec<LabPanel>,
    pub blood_gas: Vec<BloodGas>,
    pub ventilation: Vec<VentilationEpisode>,
    pub vasopressors: Vec<VasopressorRate>,
}

impl StayInputs {
    pub fn new(stay: Stay) -> Self {
        Self {
            stay,
            vitals: Vec::new(),
            gcs: Vec::new(),
            urine_output: Vec::new(),
            labs: Vec::new(),
            blood_gas: Vec::new(),
            ventilation: Vec::new(),
            vasopressors: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Partitioned {
    /// Valid stays in ascending stay id order.
    pub stays: Vec<StayInputs>,
    /// Stays that failed integrity checks, one entry per rejected id.
    pub rejected: Vec<StayError>,
    /// Events whose stay or admission has no stay record.
    pub orphan_events: usize,
}

/// Validates stay records and distributes every event to its stay.
pub fn partition(inputs: ClinicalInputs) -> Partitioned {
    let mut id_counts: HashMap<StayId, usize> = HashMap::new();
    for stay in &inputs.stays {
        *id_counts.entry(stay.stay_id).or_default() += 1;
    }

    let mut rejected = Vec::new();
    let mut rejected_ids = HashSet::new();
    let mut by_stay: BTreeMap<StayId, StayInputs> = BTreeMap::new();

    for stay in inputs.stays {
        let count = id_counts.get(&stay.stay_id).copied().unwrap_or(0);
        if count > 1 {
            if rejected_ids.insert(stay.stay_id) {
                warn!(stay_id = stay.stay_id, count, "Duplicate stay id, skipping stay");
                rejected.push(StayError::DuplicateStay {
                    stay_id: stay.stay_id,
                    count,
                });
            }
            continue;
        }
        if stay.outtime < stay.intime {
            warn!(
                stay_id = stay.stay_id,
                intime = %stay.intime,
                outtime = %stay.outtime,
                "Stay ends before it starts, skipping stay"
            );
            rejected_ids.insert(stay.stay_id);
            rejected.push(StayError::InvertedInterval {
                stay_id: stay.stay_id,
                intime: stay.intime,
                outtime: stay.outtime,
            });
            continue;
        }
        by_stay.insert(stay.stay_id, StayInputs::new(stay));
    }

    let mut stays_by_admission: HashMap<AdmissionId, Vec<StayId>> = HashMap::new();
    for (stay_id, inputs) in &by_stay {
        stays_by_admission
            .entry(inputs.stay.hadm_id)
            .or_default()
            .push(*stay_id);
    }

    let mut orphans = 0usize;

    macro_rules! route_by_stay {
        ($feed:ident) => {
            for event in inputs.$feed {
                match by_stay.get_mut(&event.stay_id) {
                    Some(target) => target.$feed.push(event),
                    None if rejected_ids.contains(&event.stay_id) => {}
                    None => orphans += 1,
                }
            }
        };
    }

    macro_rules! route_by_admission {
        ($feed:ident) => {
            for event in inputs.$feed {
                match stays_by_admission.get(&event.hadm_id) {
                    Some(stay_ids) => {
                        for stay_id in stay_ids {
                            if let Some(target) = by_stay.get_mut(stay_id) {
                                target.$feed.push(event.clone());
                            }
                        }
                    }
                    None => orphans += 1,
                }
            }
        };
    }

    route_by_stay!(vitals);
    route_by_stay!(gcs);
    route_by_stay!(urine_output);
    route_by_stay!(ventilation);
    route_by_stay!(vasopressors);
    route_by_admission!(labs);
    route_by_admission!(blood_gas);

    if orphans > 0 {
        debug!(orphans, "Events without a matching stay were ignored");
    }

    Partitioned {
        stays: by_stay.into_values().collect(),
        rejected,
        orphan_events: orphans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2150, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn stay(stay_id: StayId, hadm_id: AdmissionId, intime: NaiveDateTime, outtime: NaiveDateTime) -> Stay {
        Stay {
            stay_id,
            hadm_id,
            intime,
            outtime,
        }
    }

    #[test]
    fn test_duplicate_ids_reject_every_copy() {
        let inputs = ClinicalInputs {
            stays: vec![
                stay(1, 10, ts(1, 0), ts(2, 0)),
                stay(1, 10, ts(1, 6), ts(2, 0)),
                stay(2, 20, ts(1, 0), ts(2, 0)),
            ],
            ..Default::default()
        };

        let parts = partition(inputs);
        assert_eq!(parts.stays.len(), 1);
        assert_eq!(parts.stays[0].stay.stay_id, 2);
        assert_eq!(
            parts.rejected,
            vec![StayError::DuplicateStay { stay_id: 1, count: 2 }]
        );
    }

    #[test]
    fn test_inverted_stay_is_rejected_not_clamped() {
        let inputs = ClinicalInputs {
            stays: vec![stay(3, 30, ts(2, 0), ts(1, 0))],
            vitals: vec![VitalSign {
                stay_id: 3,
                charttime: ts(1, 12),
                mbp: Some(60.0),
            }],
            ..Default::default()
        };

        let parts = partition(inputs);
        assert!(parts.stays.is_empty());
        assert_eq!(parts.rejected[0].stay_id(), 3);
        assert!(matches!(parts.rejected[0], StayError::InvertedInterval { .. }));
        // events of a rejected stay are not orphans
        assert_eq!(parts.orphan_events, 0);
    }

    #[test]
    fn test_admission_feeds_reach_every_stay_of_the_admission() {
        let inputs = ClinicalInputs {
            stays: vec![
                stay(5, 50, ts(1, 0), ts(2, 0)),
                stay(4, 50, ts(3, 0), ts(4, 0)),
            ],
            labs: vec![LabPanel {
                hadm_id: 50,
                charttime: ts(1, 3),
                bilirubin: Some(1.0),
                creatinine: None,
                platelet: None,
            }],
            ..Default::default()
        };

        let parts = partition(inputs);
        let ids: Vec<_> = parts.stays.iter().map(|s| s.stay.stay_id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(parts.stays[0].labs.len(), 1);
        assert_eq!(parts.stays[1].labs.len(), 1);
    }

    #[test]
    fn test_orphan_events_are_counted() {
        let inputs = ClinicalInputs {
            stays: vec![stay(1, 10, ts(1, 0), ts(2, 0))],
            gcs: vec![GcsObservation {
                stay_id: 99,
                charttime: ts(1, 1),
                gcs: Some(15.0),
            }],
            blood_gas: vec![BloodGas {
                hadm_id: 999,
                charttime: ts(1, 1),
                pao2fio2ratio: Some(350.0),
                ventilated: None,
            }],
            ..Default::default()
        };

        let parts = partition(inputs);
        assert_eq!(parts.orphan_events, 2);
        assert!(parts.stays[0].gcs.is_empty());
    }
}
