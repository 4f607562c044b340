/// Index computation for the water quality service.
///
/// Everything in here is a pure function of its inputs: no I/O, no logging,
/// no shared state. Callers decide what to log or persist.
///
/// Submodules:
/// - `wqi`: weighted arithmetic water quality index over any subset of
///   parameters with a standard.
/// - `rpi`: river pollution index from fixed breakpoint tables over the
///   four required parameters.
/// - `engine`: `IndexEngine`, which bundles standards and options and runs
///   both computations.

pub mod engine;
pub mod rpi;
pub mod wqi;

use crate::model::Parameter;
use serde::Serialize;
use std::fmt;

/// Why an index came out undefined instead of as a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UndefinedReason {
    /// Fewer qualifying parameters than the caller requires.
    InsufficientData { qualifying: usize, required: usize },
    /// Every parameter that had readings and a standard was skipped because
    /// its standard is degenerate. This is a configuration problem, not a
    /// data-entry one.
    AllStandardsDegenerate { skipped: usize },
    /// The weight scaling constant is not a positive finite number.
    InvalidWeightConstant { value: f64 },
    /// Required parameters with no valid replicate.
    MissingRequired { missing: Vec<Parameter> },
    /// The weighted mean overflowed. Only reachable with extreme limits.
    NonFiniteAggregate,
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndefinedReason::InsufficientData {
                qualifying,
                required,
            } => write!(
                f,
                "insufficient data: {} qualifying parameter(s), {} required",
                qualifying, required
            ),
            UndefinedReason::AllStandardsDegenerate { skipped } => write!(
                f,
                "configuration error: all {} parameter(s) with readings have degenerate standards",
                skipped
            ),
            UndefinedReason::InvalidWeightConstant { value } => {
                write!(f, "configuration error: weight constant {} is not positive", value)
            }
            UndefinedReason::MissingRequired { missing } => {
                let names: Vec<&str> = missing.iter().map(|p| p.key()).collect();
                write!(f, "insufficient data: missing {}", names.join(", "))
            }
            UndefinedReason::NonFiniteAggregate => {
                write!(f, "configuration error: weighted mean is not a finite number")
            }
        }
    }
}

/// Rounds to two decimal places, the precision every index is reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
