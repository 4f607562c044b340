//! Analysis Report
//!
//! Assembles the sample metadata, per-parameter breakdown, both indices and
//! the optional narrative into one shareable document, rendered either as
//! plain text or as JSON.

use crate::analysis::UndefinedReason;
use crate::analysis::engine::{AnalysisResult, IndexSummary};
use crate::ingest::form::SampleForm;
use crate::model::{Parameter, SampleReadings};
use crate::narrative::NarrativeOutcome;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

// ============================================================================
// Report Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteInfo {
    pub site: String,
    pub location: Option<String>,
    pub sampled_on: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
}

impl From<&SampleForm> for SiteInfo {
    fn from(form: &SampleForm) -> Self {
        Self {
            site: form.site.clone(),
            location: form.location.clone(),
            sampled_on: form.sampled_on,
            latitude: form.latitude,
            longitude: form.longitude,
            notes: form.notes.clone(),
        }
    }
}

/// One line of the parameter table. Fields are `None` where the parameter
/// did not take part in that computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterRow {
    pub parameter: Parameter,
    pub name: &'static str,
    pub unit: &'static str,
    pub replicates: Vec<Option<f64>>,
    pub average: Option<f64>,
    pub sub_index: Option<f64>,
    pub weight: Option<f64>,
    pub exceeds_standard: Option<bool>,
    pub pollution_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub generated_at: String,
    pub site: SiteInfo,
    pub parameters: Vec<ParameterRow>,
    pub summary: IndexSummary,
    pub aggregate_undefined_reason: Option<UndefinedReason>,
    pub pollution_undefined_reason: Option<UndefinedReason>,
    pub narrative: Option<NarrativeOutcome>,
}

/// Formats an index for display. Undefined is always `N/A`, never `0`.
pub fn format_index(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "N/A".to_string(),
    }
}

fn format_replicate(value: &Option<f64>) -> String {
    match value {
        Some(v) => format!("{}", v),
        None => "-".to_string(),
    }
}

// ============================================================================
// Assembly
// ============================================================================

impl AnalysisReport {
    /// Builds a report stamped with the current time.
    pub fn new(
        site: SiteInfo,
        readings: &SampleReadings,
        result: &AnalysisResult,
        narrative: Option<NarrativeOutcome>,
    ) -> Self {
        Self::build_at(site, readings, result, narrative, Utc::now())
    }

    /// Same as `new` with an explicit timestamp, for deterministic tests.
    pub fn build_at(
        site: SiteInfo,
        readings: &SampleReadings,
        result: &AnalysisResult,
        narrative: Option<NarrativeOutcome>,
        now: DateTime<Utc>,
    ) -> Self {
        let parameters = readings
            .iter()
            .map(|reading| {
                let parameter = reading.parameter();
                let sub_index = result.aggregate.sub_index_for(parameter);
                ParameterRow {
                    parameter,
                    name: parameter.display_name(),
                    unit: parameter.unit(),
                    replicates: reading.values().to_vec(),
                    average: reading.average(),
                    sub_index: sub_index.map(|s| s.quality_rating),
                    weight: sub_index.map(|s| s.weight),
                    exceeds_standard: sub_index.map(|s| s.exceeds_standard),
                    pollution_score: result.pollution.score_for(parameter).map(|s| s.score),
                }
            })
            .collect();

        Self {
            generated_at: now.to_rfc3339(),
            site,
            parameters,
            summary: result.summary(),
            aggregate_undefined_reason: result.aggregate.undefined_reason.clone(),
            pollution_undefined_reason: result.pollution.undefined_reason.clone(),
            narrative,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering; same as `to_string()`.
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

// ============================================================================
// Text rendering
// ============================================================================

const RULE: &str = "═══════════════════════════════════════════════════════════════════";

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "WATER QUALITY REPORT")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Site:          {}", self.site.site)?;
        if let Some(location) = &self.site.location {
            writeln!(f, "Location:      {}", location)?;
        }
        if let Some(date) = self.site.sampled_on {
            writeln!(f, "Sampled on:    {}", date)?;
        }
        if let (Some(lat), Some(lon)) = (self.site.latitude, self.site.longitude) {
            writeln!(f, "Coordinates:   {:.4}, {:.4}", lat, lon)?;
        }
        if let Some(notes) = &self.site.notes {
            writeln!(f, "Notes:         {}", notes)?;
        }
        writeln!(f, "Generated:     {}", self.generated_at)?;

        writeln!(f)?;
        writeln!(f, "PARAMETERS")?;
        writeln!(
            f,
            "  {:<14}{:<24}{:>10}  {:<10}{:>8}{:>7}",
            "Parameter", "Replicates", "Mean", "Unit", "Qi", "RPI"
        )?;
        for row in &self.parameters {
            let replicates: Vec<String> = row.replicates.iter().map(format_replicate).collect();
            let mean = row
                .average
                .map(|v| format!("{:.3}", v))
                .unwrap_or_else(|| "-".to_string());
            let rating = row
                .sub_index
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string());
            let score = row
                .pollution_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let flag = if row.exceeds_standard == Some(true) { " !" } else { "" };
            writeln!(
                f,
                "  {:<14}{:<24}{:>10}  {:<10}{:>8}{:>7}{}",
                row.parameter.key(),
                replicates.join(", "),
                mean,
                row.unit,
                rating,
                score,
                flag
            )?;
        }
        if self.parameters.iter().any(|r| r.exceeds_standard == Some(true)) {
            writeln!(f, "  (! = mean is outside the permissible standard)")?;
        }

        writeln!(f)?;
        writeln!(f, "INDICES")?;
        writeln!(
            f,
            "  Water Quality Index (WQI):    {:>7}  {}",
            format_index(self.summary.aggregate_index),
            self.summary.aggregate_label
        )?;
        if let Some(reason) = &self.aggregate_undefined_reason {
            writeln!(f, "    not computed: {}", reason)?;
        }
        writeln!(
            f,
            "  River Pollution Index (RPI):  {:>7}  {}",
            format_index(self.summary.pollution_index),
            self.summary.pollution_label
        )?;
        if let Some(reason) = &self.pollution_undefined_reason {
            writeln!(f, "    not computed: {}", reason)?;
        }

        if !self.summary.skipped_parameters.is_empty() {
            writeln!(f)?;
            writeln!(f, "SKIPPED PARAMETERS")?;
            for skipped in &self.summary.skipped_parameters {
                writeln!(f, "  - {}: {}", skipped.parameter.key(), skipped.reason)?;
            }
        }

        match &self.narrative {
            Some(NarrativeOutcome::Generated(text)) => {
                writeln!(f)?;
                writeln!(f, "ASSESSMENT")?;
                for line in text.lines() {
                    writeln!(f, "  {}", line)?;
                }
            }
            Some(NarrativeOutcome::Unavailable(reason)) => {
                writeln!(f)?;
                writeln!(f, "ASSESSMENT")?;
                writeln!(f, "  Narrative unavailable ({}).", reason)?;
            }
            None => {}
        }

        writeln!(f, "{}", RULE)
    }
}

// ============================================================================
// Tests
// ============================================================================
