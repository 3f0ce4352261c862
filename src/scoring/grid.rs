//! Hourly grid construction.

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::error::StayError;
use crate::inputs::types::Stay;
use crate::scoring::types::HourlyBin;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Drops minutes, seconds and sub-second precision.
pub fn truncate_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    t.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Builds the contiguous hourly grid for a stay.
///
/// Offsets run from `-lookback_hours` to `ceil(outtime - intime)` hours, and
/// never stop before offset 0. Bin 0 starts at the hour-truncated `intime`.
pub fn build_grid(stay: &Stay, lookback_hours: i64) -> Result<Vec<HourlyBin>, StayError> {
    if stay.outtime < stay.intime {
        return Err(StayError::InvertedInterval {
            stay_id: stay.stay_id,
            intime: stay.intime,
            outtime: stay.outtime,
        });
    }

    let anchor = truncate_to_hour(stay.intime);
    let last = ceil_hours(stay.outtime - stay.intime).max(0);

    Ok((-lookback_hours..=last)
        .map(|hour_offset| {
            let start_time = anchor + Duration::hours(hour_offset);
            HourlyBin {
                hour_offset,
                start_time,
                end_time: start_time + Duration::hours(1),
            }
        })
        .collect())
}

fn ceil_hours(d: Duration) -> i64 {
    let millis = d.num_milliseconds();
    millis.div_euclid(MILLIS_PER_HOUR) + i64::from(millis.rem_euclid(MILLIS_PER_HOUR) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2150, 6, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn stay(intime: NaiveDateTime, outtime: NaiveDateTime) -> Stay {
        Stay {
            stay_id: 1,
            hadm_id: 1,
            intime,
            outtime,
        }
    }

    #[test]
    fn test_grid_is_contiguous_from_lookback() {
        let grid = build_grid(&stay(ts(8, 0), ts(8, 0) + Duration::hours(48)), 24).unwrap();
        assert_eq!(grid.first().unwrap().hour_offset, -24);
        assert_eq!(grid.last().unwrap().hour_offset, 48);
        assert_eq!(grid.len(), 73);
        for pair in grid.windows(2) {
            assert_eq!(pair[1].hour_offset - pair[0].hour_offset, 1);
            assert_eq!(pair[0].end_time, pair[1].start_time);
        }
    }

    #[test]
    fn test_bin_zero_starts_at_truncated_intime() {
        let grid = build_grid(&stay(ts(8, 47), ts(11, 5)), 24).unwrap();
        let zero = grid.iter().find(|b| b.hour_offset == 0).unwrap();
        assert_eq!(zero.start_time, ts(8, 0));
        assert_eq!(zero.end_time, ts(9, 0));
        // 2h18m rounds up to 3
        assert_eq!(grid.last().unwrap().hour_offset, 3);
    }

    #[test]
    fn test_zero_length_stay_keeps_lookback() {
        let grid = build_grid(&stay(ts(8, 0), ts(8, 0)), 24).unwrap();
        assert_eq!(grid.len(), 25);
        assert_eq!(grid.last().unwrap().hour_offset, 0);
    }

    #[test]
    fn test_inverted_stay_is_an_error() {
        let err = build_grid(&stay(ts(10, 0), ts(9, 0)), 24).unwrap_err();
        assert!(matches!(err, StayError::InvertedInterval { stay_id: 1, .. }));
    }

    #[test]
    fn test_ceil_hours() {
        assert_eq!(ceil_hours(Duration::zero()), 0);
        assert_eq!(ceil_hours(Duration::minutes(1)), 1);
        assert_eq!(ceil_hours(Duration::hours(2)), 2);
        assert_eq!(ceil_hours(Duration::minutes(121)), 3);
    }
}
