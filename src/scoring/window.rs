//! Trailing-window accumulators over a stay's ordered bins.
//!
//! A window is the current bin plus the `window_hours` bins before it. Early
//! bins get a partial window. Nulls are skipped; a window with no value at
//! all yields `None`.

use std::collections::VecDeque;

use crate::scoring::types::{SubScores, Subsystem};

/// Sliding maximum via a monotonic deque of `(position, value)`.
#[derive(Debug, Clone)]
pub struct TrailingMax {
    span: usize,
    position: usize,
    deque: VecDeque<(usize, u8)>,
}

impl TrailingMax {
    pub fn new(window_hours: usize) -> Self {
        Self {
            span: window_hours + 1,
            position: 0,
            deque: VecDeque::new(),
        }
    }

    /// Pushes the next bin's value and returns the maximum over the window
    /// ending at it.
    pub fn push(&mut self, value: Option<u8>) -> Option<u8> {
        let position = self.position;
        self.position += 1;

        while let Some(&(front, _)) = self.deque.front() {
            if front + self.span <= position {
                self.deque.pop_front();
            } else {
                break;
            }
        }

        if let Some(v) = value {
            while let Some(&(_, back)) = self.deque.back() {
                if back <= v {
                    self.deque.pop_back();
                } else {
                    break;
                }
            }
            self.deque.push_back((position, v));
        }

        self.deque.front().map(|&(_, v)| v)
    }
}

/// Sliding sum over the last `window_hours + 1` values.
#[derive(Debug, Clone)]
pub struct TrailingSum {
    span: usize,
    values: VecDeque<Option<f64>>,
}

impl TrailingSum {
    pub fn new(window_hours: usize) -> Self {
        Self {
            span: window_hours + 1,
            values: VecDeque::with_capacity(window_hours + 1),
        }
    }

    /// Pushes the next bin's value and returns the sum over the window
    /// ending at it.
    pub fn push(&mut self, value: Option<f64>) -> Option<f64> {
        self.values.push_back(value);
        if self.values.len() > self.span {
            self.values.pop_front();
        }
        // summed afresh from the window contents; evictions leave no residue
        let mut present = self.values.iter().flatten().peekable();
        present.peek()?;
        Some(present.sum())
    }
}

/// One [`TrailingMax`] per subsystem.
#[derive(Debug, Clone)]
pub struct SubScoreWindow {
    trackers: [TrailingMax; 6],
}

impl SubScoreWindow {
    pub fn new(window_hours: usize) -> Self {
        Self {
            trackers: std::array::from_fn(|_| TrailingMax::new(window_hours)),
        }
    }

    pub fn push(&mut self, scores: &SubScores) -> SubScores {
        let mut out = SubScores::default();
        for (tracker, subsystem) in self.trackers.iter_mut().zip(Subsystem::ALL) {
            out.set(subsystem, tracker.push(scores.get(subsystem)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trailing_max(values: &[Option<u8>], window_hours: usize) -> Vec<Option<u8>> {
        let mut acc = TrailingMax::new(window_hours);
        values.iter().map(|v| acc.push(*v)).collect()
    }

    fn trailing_sum(values: &[Option<f64>], window_hours: usize) -> Vec<Option<f64>> {
        let mut acc = TrailingSum::new(window_hours);
        values.iter().map(|v| acc.push(*v)).collect()
    }

    fn brute_max(values: &[Option<u8>], window_hours: usize) -> Vec<Option<u8>> {
        (0..values.len())
            .map(|i| {
                let lo = i.saturating_sub(window_hours);
                values[lo..=i].iter().flatten().copied().max()
            })
            .collect()
    }

    #[test]
    fn test_max_matches_brute_force() {
        let values: Vec<Option<u8>> = (0..80u32)
            .map(|i| match (i * 7 + 3) % 11 {
                0 | 5 => None,
                n => Some((n % 5) as u8),
            })
            .collect();
        assert_eq!(trailing_max(&values, 24), brute_max(&values, 24));
        assert_eq!(trailing_max(&values, 3), brute_max(&values, 3));
    }

    #[test]
    fn test_max_evicts_after_window() {
        let mut values = vec![Some(4)];
        values.extend(std::iter::repeat(Some(1)).take(30));
        let out = trailing_max(&values, 24);
        assert_eq!(out[24], Some(4));
        assert_eq!(out[25], Some(1));
    }

    #[test]
    fn test_all_null_window_is_null() {
        let out = trailing_max(&[None, None, None], 24);
        assert_eq!(out, vec![None, None, None]);

        let mut values = vec![Some(2)];
        values.extend(std::iter::repeat(None).take(25));
        let out = trailing_max(&values, 24);
        assert_eq!(out[24], Some(2));
        assert_eq!(out[25], None);
    }

    #[test]
    fn test_sum_partial_and_full_windows() {
        let mut values = vec![Some(150.0)];
        values.extend(std::iter::repeat(Some(0.0)).take(24));
        let out = trailing_sum(&values, 24);
        assert_eq!(out[0], Some(150.0));
        assert_eq!(out[24], Some(150.0));

        values.push(Some(10.0));
        let out = trailing_sum(&values, 24);
        assert_eq!(out[25], Some(10.0));
    }

    #[test]
    fn test_sum_skips_nulls_and_keeps_zero() {
        let out = trailing_sum(&[None, Some(0.0), None], 24);
        assert_eq!(out, vec![None, Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_subscore_window_is_per_subsystem() {
        let mut window = SubScoreWindow::new(24);
        let first = SubScores {
            liver: Some(3),
            ..Default::default()
        };
        let second = SubScores {
            liver: Some(1),
            renal: Some(2),
            ..Default::default()
        };
        window.push(&first);
        let out = window.push(&second);
        assert_eq!(out.liver, Some(3));
        assert_eq!(out.renal, Some(2));
        assert_eq!(out.respiration, None);
    }
}
