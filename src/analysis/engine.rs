//! `IndexEngine`: one call from a sample's readings to both indices.

use super::rpi::{PollutionIndex, compute_pollution_index};
use super::wqi::{AggregateIndex, AggregateOptions, SkippedParameter, compute_aggregate_index};
use crate::classify::{PollutionStatus, WqiStatus};
use crate::model::SampleReadings;
use crate::standards::StandardSet;
use serde::Serialize;

/// Stateless index calculator. Holding the standards and options lets the
/// caller configure it once and reuse it for every sample.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEngine {
    standards: StandardSet,
    options: AggregateOptions,
}

impl Default for IndexEngine {
    fn default() -> Self {
        Self::new(StandardSet::defaults(), AggregateOptions::default())
    }
}

impl IndexEngine {
    pub fn new(standards: StandardSet, options: AggregateOptions) -> Self {
        Self { standards, options }
    }

    pub fn standards(&self) -> &StandardSet {
        &self.standards
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    pub fn analyze(&self, readings: &SampleReadings) -> AnalysisResult {
        AnalysisResult {
            aggregate: compute_aggregate_index(readings, &self.standards, &self.options),
            pollution: compute_pollution_index(readings),
        }
    }
}

/// Both indices with their full breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub aggregate: AggregateIndex,
    pub pollution: PollutionIndex,
}

impl AnalysisResult {
    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            aggregate_index: self.aggregate.value,
            aggregate_label: self.aggregate.status,
            pollution_index: self.pollution.value,
            pollution_label: self.pollution.status,
            skipped_parameters: self.aggregate.skipped.clone(),
        }
    }
}

/// Flat key/value view consumed by reports and the narrative prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub aggregate_index: Option<f64>,
    pub aggregate_label: WqiStatus,
    pub pollution_index: Option<f64>,
    pub pollution_label: PollutionStatus,
    pub skipped_parameters: Vec<SkippedParameter>,
}
