//! The server computation service's four reductions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A reduction whose result does not fit its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} overflows a 64-bit integer")]
pub struct ComputeOverflow(pub ComputeOperation);

/// A reduction over the integers of one datafile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputeOperation {
    Sum,
    Min,
    Max,
    Average,
}

impl ComputeOperation {
    /// Every accepted operation, in the order shown to users.
    pub const ALL: [ComputeOperation; 4] = [
        ComputeOperation::Average,
        ComputeOperation::Min,
        ComputeOperation::Max,
        ComputeOperation::Sum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComputeOperation::Sum => "SUM",
            ComputeOperation::Min => "MIN",
            ComputeOperation::Max => "MAX",
            ComputeOperation::Average => "AVERAGE",
        }
    }

    /// Applies the reduction.  An empty input yields zero for every operation.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeOverflow`] when a `SUM` leaves the `i64` range.
    pub fn apply(self, values: &[i64]) -> Result<ComputeResult, ComputeOverflow> {
        Ok(match self {
            ComputeOperation::Sum => ComputeResult::Integer(
                values
                    .iter()
                    .try_fold(0i64, |acc, &v| acc.checked_add(v))
                    .ok_or(ComputeOverflow(self))?,
            ),
            ComputeOperation::Min => ComputeResult::Integer(values.iter().copied().min().unwrap_or(0)),
            ComputeOperation::Max => ComputeResult::Integer(values.iter().copied().max().unwrap_or(0)),
            ComputeOperation::Average => {
                if values.is_empty() {
                    ComputeResult::Real(0.0)
                } else {
                    let total: f64 = values.iter().map(|&v| v as f64).sum();
                    ComputeResult::Real(total / values.len() as f64)
                }
            }
        })
    }
}

impl FromStr for ComputeOperation {
    type Err = ();

    /// Case-sensitive: only the upper-case names are accepted.
    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "SUM" => Ok(ComputeOperation::Sum),
            "MIN" => Ok(ComputeOperation::Min),
            "MAX" => Ok(ComputeOperation::Max),
            "AVERAGE" => Ok(ComputeOperation::Average),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ComputeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value a reduction produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComputeResult {
    Integer(i64),
    Real(f64),
}

impl fmt::Display for ComputeResult {
    /// Real values always show a fractional part (`5.0`, not `5`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeResult::Integer(v) => write!(f, "{v}"),
            ComputeResult::Real(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            ComputeResult::Real(v) => write!(f, "{v}"),
        }
    }
}
