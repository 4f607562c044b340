/// Parameter, ParameterReading, SampleReadings, ParameterStandard
/// core data structures and error handling
///
/// Core data types for the water quality index service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains construction checks and trivial accessors only, no I/O.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Maximum number of replicate measurements recorded for one parameter.
pub const MAX_REPLICATES: usize = 3;

/// The closed set of water quality parameters a sample can report.
///
/// Serialized with the short keys used on the data-entry form
/// (`"DO"`, `"BOD5"`, `"NH3N"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "BOD5")]
    Bod5,
    #[serde(rename = "DO")]
    DissolvedOxygen,
    #[serde(rename = "COD")]
    Cod,
    Turbidity,
    #[serde(rename = "TSS")]
    Tss,
    #[serde(rename = "NH3N")]
    AmmoniaNitrogen,
    #[serde(rename = "NO3")]
    Nitrate,
    Temperature,
    #[serde(rename = "Pb")]
    Lead,
    #[serde(rename = "As")]
    Arsenic,
    FecalColiform,
}

impl Parameter {
    /// Every parameter, in form order.
    pub const ALL: [Parameter; 12] = [
        Parameter::Ph,
        Parameter::Bod5,
        Parameter::DissolvedOxygen,
        Parameter::Cod,
        Parameter::Turbidity,
        Parameter::Tss,
        Parameter::AmmoniaNitrogen,
        Parameter::Nitrate,
        Parameter::Temperature,
        Parameter::Lead,
        Parameter::Arsenic,
        Parameter::FecalColiform,
    ];

    /// Short form key, e.g. `"NH3N"`.
    pub fn key(self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Bod5 => "BOD5",
            Parameter::DissolvedOxygen => "DO",
            Parameter::Cod => "COD",
            Parameter::Turbidity => "Turbidity",
            Parameter::Tss => "TSS",
            Parameter::AmmoniaNitrogen => "NH3N",
            Parameter::Nitrate => "NO3",
            Parameter::Temperature => "Temperature",
            Parameter::Lead => "Pb",
            Parameter::Arsenic => "As",
            Parameter::FecalColiform => "FecalColiform",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Bod5 => "Biochemical oxygen demand (5-day)",
            Parameter::DissolvedOxygen => "Dissolved oxygen",
            Parameter::Cod => "Chemical oxygen demand",
            Parameter::Turbidity => "Turbidity",
            Parameter::Tss => "Total suspended solids",
            Parameter::AmmoniaNitrogen => "Ammonia-nitrogen",
            Parameter::Nitrate => "Nitrate",
            Parameter::Temperature => "Temperature",
            Parameter::Lead => "Lead",
            Parameter::Arsenic => "Arsenic",
            Parameter::FecalColiform => "Fecal coliform",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Parameter::Ph => "-",
            Parameter::Turbidity => "NTU",
            Parameter::Temperature => "°C",
            Parameter::FecalColiform => "CFU/100mL",
            _ => "mg/L",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Parameter {
    type Err = ReadingError;

    /// Accepts the form keys plus common spellings, ignoring case,
    /// whitespace, `-` and `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let parameter = match normalized.as_str() {
            "ph" => Parameter::Ph,
            "bod5" | "bod" | "biochemicaloxygendemand" => Parameter::Bod5,
            "do" | "dissolvedoxygen" => Parameter::DissolvedOxygen,
            "cod" | "chemicaloxygendemand" => Parameter::Cod,
            "turbidity" => Parameter::Turbidity,
            "tss" | "totalsuspendedsolids" | "suspendedsolids" => Parameter::Tss,
            "nh3n" | "ammonianitrogen" | "ammoniacalnitrogen" => Parameter::AmmoniaNitrogen,
            "no3" | "nitrate" => Parameter::Nitrate,
            "temperature" | "temp" => Parameter::Temperature,
            "pb" | "lead" => Parameter::Lead,
            "as" | "arsenic" => Parameter::Arsenic,
            "fecalcoliform" | "faecalcoliform" | "coliform" => Parameter::FecalColiform,
            _ => return Err(ReadingError::UnknownParameter(s.to_string())),
        };
        Ok(parameter)
    }
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// Up to three replicate measurements for one parameter.
///
/// `None` marks a blank replicate slot. Blank slots are excluded from the
/// average, never counted as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterReading {
    parameter: Parameter,
    values: Vec<Option<f64>>,
}

impl ParameterReading {
    pub fn new(parameter: Parameter, values: Vec<Option<f64>>) -> Result<Self, ReadingError> {
        if values.len() > MAX_REPLICATES {
            return Err(ReadingError::TooManyReplicates {
                parameter,
                count: values.len(),
                max: MAX_REPLICATES,
            });
        }
        Ok(Self { parameter, values })
    }

    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    /// The raw slots, blanks included.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Replicates that carry a usable number. Non-finite values are
    /// treated the same as blanks.
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().copied().filter(|v| v.is_finite())
    }

    pub fn valid_count(&self) -> usize {
        self.valid_values().count()
    }

    /// Mean of the valid replicates, or `None` when every slot is blank.
    pub fn average(&self) -> Option<f64> {
        let (sum, count) = self
            .valid_values()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

/// All readings entered for one water sample, keyed by parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleReadings {
    readings: BTreeMap<Parameter, ParameterReading>,
}

impl SampleReadings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the reading for its parameter.
    pub fn insert(&mut self, reading: ParameterReading) {
        self.readings.insert(reading.parameter(), reading);
    }

    /// Convenience for `insert(ParameterReading::new(..)?)`.
    pub fn insert_values(
        &mut self,
        parameter: Parameter,
        values: Vec<Option<f64>>,
    ) -> Result<(), ReadingError> {
        self.insert(ParameterReading::new(parameter, values)?);
        Ok(())
    }

    /// Builder-style constructor, mostly for tests and fixtures.
    pub fn from_values<I>(entries: I) -> Result<Self, ReadingError>
    where
        I: IntoIterator<Item = (Parameter, Vec<Option<f64>>)>,
    {
        let mut readings = Self::new();
        for (parameter, values) in entries {
            readings.insert_values(parameter, values)?;
        }
        Ok(readings)
    }

    pub fn get(&self, parameter: Parameter) -> Option<&ParameterReading> {
        self.readings.get(&parameter)
    }

    pub fn contains(&self, parameter: Parameter) -> bool {
        self.readings.contains_key(&parameter)
    }

    pub fn average(&self, parameter: Parameter) -> Option<f64> {
        self.get(parameter).and_then(ParameterReading::average)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterReading> {
        self.readings.values()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Standard types
// ---------------------------------------------------------------------------

/// Which direction away from the standard limit counts as degradation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Values above the limit are degraded (BOD5, TSS, metals, ...).
    HigherIsWorse,
    /// Values below the limit are degraded (dissolved oxygen).
    LowerIsWorse,
}

/// Ideal value, permissible limit and polarity for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterStandard {
    pub parameter: Parameter,
    pub ideal_value: f64,
    pub standard_limit: f64,
    pub polarity: Polarity,
}

impl ParameterStandard {
    /// Checks that the standard can be used in weighted aggregation.
    ///
    /// The sub-index divides by `standard_limit - ideal_value` and the weight
    /// divides by `standard_limit`, so both must be non-zero, and a weight
    /// must be positive.
    pub fn validate(&self) -> Result<(), StandardError> {
        if !self.ideal_value.is_finite() || !self.standard_limit.is_finite() {
            return Err(StandardError::NonFinite);
        }
        if self.standard_limit <= 0.0 {
            return Err(StandardError::NonPositiveLimit {
                limit: self.standard_limit,
            });
        }
        if self.standard_limit == self.ideal_value {
            return Err(StandardError::CollapsedRange {
                value: self.ideal_value,
            });
        }
        Ok(())
    }

    /// Whether an averaged reading is on the wrong side of the limit.
    pub fn is_exceeded_by(&self, average: f64) -> bool {
        match self.polarity {
            Polarity::HigherIsWorse => average > self.standard_limit,
            Polarity::LowerIsWorse => average < self.standard_limit,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Caller-side validation errors raised while turning form input into
/// `SampleReadings`. None of these reach the index engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadingError {
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("{parameter}: replicate {slot} is not a number: {raw:?}")]
    Parse {
        parameter: Parameter,
        slot: usize,
        raw: String,
    },

    #[error("{parameter}: {count} replicates given, at most {max} allowed")]
    TooManyReplicates {
        parameter: Parameter,
        count: usize,
        max: usize,
    },

    #[error("{parameter} entered more than once")]
    DuplicateParameter { parameter: Parameter },
}

/// A standard that cannot take part in weighted aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StandardError {
    #[error("standard limit equals ideal value ({value})")]
    CollapsedRange { value: f64 },

    #[error("standard limit must be positive, got {limit}")]
    NonPositiveLimit { limit: f64 },

    #[error("standard contains a non-finite value")]
    NonFinite,

    #[error("weight for standard limit {limit} is not a usable positive number")]
    UnusableWeight { limit: f64 },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
