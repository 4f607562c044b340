//! River pollution index.
//!
//! Four required parameters are each averaged and mapped to a breakpoint
//! score of 1, 3, 6 or 8 using a fixed table. The index is the unweighted
//! mean of the four scores, and is only defined when all four parameters
//! have at least one valid replicate.

use super::{UndefinedReason, round2};
use crate::classify::{PollutionStatus, classify_pollution_index};
use crate::model::{Parameter, Polarity, SampleReadings};
use serde::Serialize;

/// Scores assigned to the four bands of every breakpoint table, cleanest first.
pub const BREAKPOINT_SCORES: [u8; 4] = [1, 3, 6, 8];

/// Thresholds for one parameter.
///
/// `bounds` holds the inclusive edge of the score-1, score-3 and score-6
/// bands, in that order. For `HigherIsWorse` the edges are upper bounds
/// (`avg <= bound`); for `LowerIsWorse` they are lower bounds
/// (`avg >= bound`). Anything past the last edge scores 8.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakpointTable {
    pub parameter: Parameter,
    pub polarity: Polarity,
    pub bounds: [f64; 3],
}

impl BreakpointTable {
    pub fn score(&self, average: f64) -> u8 {
        let band = self
            .bounds
            .iter()
            .position(|&bound| match self.polarity {
                Polarity::HigherIsWorse => average <= bound,
                Polarity::LowerIsWorse => average >= bound,
            })
            .unwrap_or(self.bounds.len());
        BREAKPOINT_SCORES[band]
    }
}

/// Breakpoint tables for the four required parameters.
pub static POLLUTION_TABLES: [BreakpointTable; 4] = [
    BreakpointTable {
        parameter: Parameter::DissolvedOxygen,
        polarity: Polarity::LowerIsWorse,
        bounds: [6.5, 4.6, 2.1],
    },
    BreakpointTable {
        parameter: Parameter::Bod5,
        polarity: Polarity::HigherIsWorse,
        bounds: [3.0, 4.9, 9.9],
    },
    BreakpointTable {
        parameter: Parameter::Tss,
        polarity: Polarity::HigherIsWorse,
        bounds: [20.0, 49.9, 99.9],
    },
    BreakpointTable {
        parameter: Parameter::AmmoniaNitrogen,
        polarity: Polarity::HigherIsWorse,
        bounds: [0.5, 0.99, 1.99],
    },
];

/// The parameters every pollution index needs, in table order.
pub fn required_parameters() -> impl Iterator<Item = Parameter> {
    POLLUTION_TABLES.iter().map(|t| t.parameter)
}

pub fn table_for(parameter: Parameter) -> Option<&'static BreakpointTable> {
    POLLUTION_TABLES.iter().find(|t| t.parameter == parameter)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PollutionScore {
    pub parameter: Parameter,
    pub average: f64,
    pub score: u8,
}

/// Result of `compute_pollution_index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutionIndex {
    pub value: Option<f64>,
    pub status: PollutionStatus,
    /// Scores for the required parameters that had data, even when the
    /// index itself is undefined.
    pub scores: Vec<PollutionScore>,
    pub missing: Vec<Parameter>,
    pub undefined_reason: Option<UndefinedReason>,
}

impl PollutionIndex {
    pub fn score_for(&self, parameter: Parameter) -> Option<&PollutionScore> {
        self.scores.iter().find(|s| s.parameter == parameter)
    }
}

/// Computes the river pollution index. No partial index: if any required
/// parameter lacks a valid replicate the result is undefined.
pub fn compute_pollution_index(readings: &SampleReadings) -> PollutionIndex {
    let mut scores = Vec::with_capacity(POLLUTION_TABLES.len());
    let mut missing = Vec::new();

    for table in &POLLUTION_TABLES {
        match readings.average(table.parameter) {
            Some(average) => scores.push(PollutionScore {
                parameter: table.parameter,
                average,
                score: table.score(average),
            }),
            None => missing.push(table.parameter),
        }
    }

    let (value, undefined_reason) = if missing.is_empty() {
        let total: u32 = scores.iter().map(|s| u32::from(s.score)).sum();
        (Some(round2(f64::from(total) / scores.len() as f64)), None)
    } else {
        (
            None,
            Some(UndefinedReason::MissingRequired {
                missing: missing.clone(),
            }),
        )
    };

    PollutionIndex {
        value,
        status: classify_pollution_index(value),
        scores,
        missing,
        undefined_reason,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
