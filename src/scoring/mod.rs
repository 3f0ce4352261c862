//! Hourly scoring of a single stay.
//!
//! Grid, interval join, per-bin aggregation, threshold scoring, trailing
//! windows and composite assembly, in that order.

pub mod aggregate;
pub mod assemble;
pub mod grid;
pub mod join;
pub mod thresholds;
pub mod types;
pub mod window;
