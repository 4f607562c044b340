/// Sample form ingestion
///
/// Converts what a field technician typed into the data-entry form into
/// `SampleReadings`. This is the only place raw text is interpreted:
/// blank slots become absent replicates, anything else must be a finite
/// number. Nothing is ever coerced to zero.
///
/// Sample files use the same shape as the form, serialized as TOML:
///
/// ```toml
/// site = "Sungai Kinta at Tanjung Tualang"
/// sampled_on = "2026-03-14"
///
/// [readings]
/// DO = ["6.0", "6.2", ""]
/// BOD5 = [2.0]
/// ```

use crate::model::{Parameter, ParameterReading, ReadingError, SampleReadings};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Form structures
// ============================================================================

/// One replicate slot as entered: either a typed number or free text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawReplicate {
    Number(f64),
    Text(String),
}

impl From<&str> for RawReplicate {
    fn from(text: &str) -> Self {
        RawReplicate::Text(text.to_string())
    }
}

impl From<f64> for RawReplicate {
    fn from(value: f64) -> Self {
        RawReplicate::Number(value)
    }
}

/// A filled-in sample form. Unknown keys are rejected so a misspelled
/// `[readings]` table is an error rather than an empty sample.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleForm {
    pub site: String,
    pub location: Option<String>,
    pub sampled_on: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    /// Parameter name → replicate slots. Names are matched leniently
    /// (see `Parameter::from_str`).
    #[serde(default)]
    pub readings: BTreeMap<String, Vec<RawReplicate>>,
}

impl SampleForm {
    /// Validates and parses every reading on the form.
    pub fn parse_readings(&self) -> Result<SampleReadings, Vec<ReadingError>> {
        parse_readings(&self.readings)
    }
}

#[derive(Debug, Error)]
pub enum SampleFileError {
    #[error("failed to read sample file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid sample file: {0}")]
    Toml(#[from] toml::de::Error),
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses one replicate slot. `slot` is 1-based and only used for messages.
///
/// Blank or whitespace-only text is an absent replicate (`Ok(None)`).
/// Non-numeric text, `NaN` and infinities are errors.
pub fn parse_replicate(
    parameter: Parameter,
    slot: usize,
    raw: &RawReplicate,
) -> Result<Option<f64>, ReadingError> {
    let parse_error = |raw: String| ReadingError::Parse {
        parameter,
        slot,
        raw,
    };

    match raw {
        RawReplicate::Number(value) if value.is_finite() => Ok(Some(*value)),
        RawReplicate::Number(value) => Err(parse_error(value.to_string())),
        RawReplicate::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Some(value)),
                _ => Err(parse_error(text.clone())),
            }
        }
    }
}

/// Parses a whole form's readings, collecting every problem rather than
/// stopping at the first so they can all be shown at once.
pub fn parse_readings(
    raw: &BTreeMap<String, Vec<RawReplicate>>,
) -> Result<SampleReadings, Vec<ReadingError>> {
    let mut readings = SampleReadings::new();
    let mut errors = Vec::new();

    for (name, slots) in raw {
        let parameter = match name.parse::<Parameter>() {
            Ok(parameter) => parameter,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        if readings.contains(parameter) {
            errors.push(ReadingError::DuplicateParameter { parameter });
            continue;
        }

        let mut values = Vec::with_capacity(slots.len());
        let mut slot_failed = false;
        for (i, slot) in slots.iter().enumerate() {
            match parse_replicate(parameter, i + 1, slot) {
                Ok(value) => values.push(value),
                Err(e) => {
                    errors.push(e);
                    slot_failed = true;
                }
            }
        }
        if slot_failed {
            continue;
        }

        match ParameterReading::new(parameter, values) {
            Ok(reading) => readings.insert(reading),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(readings)
    } else {
        Err(errors)
    }
}

/// Parses a sample form from TOML text.
pub fn parse_sample(contents: &str) -> Result<SampleForm, SampleFileError> {
    Ok(toml::from_str(contents)?)
}

/// Reads and parses a sample form file.
pub fn load_sample(path: &Path) -> Result<SampleForm, SampleFileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SampleFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_sample(&contents)
}

// ============================================================================
// Tests
// ============================================================================
