//! Weighted arithmetic water quality index.
//!
//! For every parameter that has at least one valid replicate and a usable
//! standard:
//!
//! ```text
//! Qi = |avg - V0| / |Si - V0| * 100      clamped to [0, 100]
//! Wi = k / Si
//! WQI = Σ(Wi * Qi) / Σ Wi
//! ```
//!
//! The absolute-deviation form is used for every parameter regardless of
//! polarity, so a dissolved oxygen reading below saturation and a pH reading
//! below neutral both count as deviation from ideal. Polarity only decides
//! whether the reading is flagged as exceeding its standard.

use super::{UndefinedReason, round2};
use crate::classify::{WqiStatus, classify_index};
use crate::model::{Parameter, ParameterStandard, SampleReadings, StandardError};
use crate::standards::StandardSet;
use serde::Serialize;
use std::fmt;

/// Default scaling constant `k` in `Wi = k / Si`.
pub const DEFAULT_WEIGHT_CONSTANT: f64 = 1.0;

/// Caller-tunable knobs for the aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOptions {
    /// Scaling constant `k`. Must be positive and finite.
    pub weight_constant: f64,
    /// Minimum number of qualifying parameters before the aggregate is
    /// reported. Values below 1 are treated as 1.
    pub min_parameters: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            weight_constant: DEFAULT_WEIGHT_CONSTANT,
            min_parameters: 1,
        }
    }
}

/// One parameter's contribution to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubIndex {
    pub parameter: Parameter,
    pub average: f64,
    pub replicate_count: usize,
    /// Qi, in [0, 100].
    pub quality_rating: f64,
    /// Wi.
    pub weight: f64,
    pub exceeds_standard: bool,
}

/// Why a parameter with readings was left out of the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NoStandard,
    Configuration { error: StandardError },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoStandard => write!(f, "no standard configured"),
            SkipReason::Configuration { error } => write!(f, "configuration error: {}", error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkippedParameter {
    pub parameter: Parameter,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of `compute_aggregate_index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateIndex {
    /// The index rounded to two decimals, or `None` when undefined.
    pub value: Option<f64>,
    pub status: WqiStatus,
    pub sub_indices: Vec<SubIndex>,
    pub skipped: Vec<SkippedParameter>,
    pub undefined_reason: Option<UndefinedReason>,
}

impl AggregateIndex {
    /// Number of parameters that contributed to the weighted mean.
    pub fn qualifying_count(&self) -> usize {
        self.sub_indices.len()
    }

    pub fn sub_index_for(&self, parameter: Parameter) -> Option<&SubIndex> {
        self.sub_indices.iter().find(|s| s.parameter == parameter)
    }
}

/// Qi for an averaged reading, clamped to [0, 100].
///
/// The standard must have passed `ParameterStandard::validate`; a collapsed
/// range yields NaN.
pub fn sub_index(average: f64, standard: &ParameterStandard) -> f64 {
    let span = (standard.standard_limit - standard.ideal_value).abs();
    let rating = (average - standard.ideal_value).abs() / span * 100.0;
    rating.clamp(0.0, 100.0)
}

/// Computes the weighted aggregate index over every parameter present in
/// both `readings` and `standards` with at least one valid replicate.
///
/// Parameters whose standard is degenerate are skipped and listed rather
/// than failing the whole computation. The result is undefined (never zero)
/// when fewer than `options.min_parameters` parameters qualify.
pub fn compute_aggregate_index(
    readings: &SampleReadings,
    standards: &StandardSet,
    options: &AggregateOptions,
) -> AggregateIndex {
    let mut sub_indices = Vec::new();
    let mut skipped = Vec::new();
    let mut degenerate = 0usize;
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let k = options.weight_constant;
    let k_valid = k.is_finite() && k > 0.0;

    for reading in readings.iter() {
        let Some(average) = reading.average() else {
            continue;
        };
        let parameter = reading.parameter();

        let Some(standard) = standards.get(parameter) else {
            skipped.push(SkippedParameter {
                parameter,
                reason: SkipReason::NoStandard,
            });
            continue;
        };

        if let Err(error) = standard.validate() {
            degenerate += 1;
            skipped.push(SkippedParameter {
                parameter,
                reason: SkipReason::Configuration { error },
            });
            continue;
        }

        // k cancels out of the weighted mean, so the mean is taken over 1/Si
        // and k only scales the reported weights.
        let weight = k / standard.standard_limit;
        let relative_weight = standard.standard_limit.recip();
        if k_valid && !(weight.is_finite() && weight > 0.0 && relative_weight.is_finite()) {
            degenerate += 1;
            skipped.push(SkippedParameter {
                parameter,
                reason: SkipReason::Configuration {
                    error: StandardError::UnusableWeight {
                        limit: standard.standard_limit,
                    },
                },
            });
            continue;
        }

        let quality_rating = sub_index(average, standard);
        weighted_sum += relative_weight * quality_rating;
        total_weight += relative_weight;

        sub_indices.push(SubIndex {
            parameter,
            average,
            replicate_count: reading.valid_count(),
            quality_rating,
            weight,
            exceeds_standard: standard.is_exceeded_by(average),
        });
    }

    let qualifying = sub_indices.len();
    let required = options.min_parameters.max(1);

    let undefined_reason = if !k_valid {
        Some(UndefinedReason::InvalidWeightConstant { value: k })
    } else if qualifying == 0 && degenerate > 0 {
        Some(UndefinedReason::AllStandardsDegenerate {
            skipped: degenerate,
        })
    } else if qualifying < required {
        Some(UndefinedReason::InsufficientData {
            qualifying,
            required,
        })
    } else {
        None
    };

    let (value, undefined_reason) = match undefined_reason {
        Some(reason) => (None, Some(reason)),
        None => {
            let mean = weighted_sum / total_weight;
            if mean.is_finite() {
                (Some(round2(mean)), None)
            } else {
                (None, Some(UndefinedReason::NonFiniteAggregate))
            }
        }
    };

    AggregateIndex {
        value,
        status: classify_index(value),
        sub_indices,
        skipped,
        undefined_reason,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
