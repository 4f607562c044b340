//! Index band classification.
//!
//! Both indices map onto ordinal bands with inclusive upper boundaries.
//! An undefined index always maps to the `NotAvailable` band so that
//! "no data" is never confused with a clean score of zero.

use serde::Serialize;
use std::fmt;

/// Suitability bands for the weighted water quality index, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum WqiStatus {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Poor")]
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    #[serde(rename = "Unsuitable for use")]
    Unsuitable,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl WqiStatus {
    pub fn label(self) -> &'static str {
        match self {
            WqiStatus::Excellent => "Excellent",
            WqiStatus::Good => "Good",
            WqiStatus::Poor => "Poor",
            WqiStatus::VeryPoor => "Very Poor",
            WqiStatus::Unsuitable => "Unsuitable for use",
            WqiStatus::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for WqiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity bands for the river pollution index, cleanest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PollutionStatus {
    #[serde(rename = "Non/mildly polluted")]
    NonOrMildlyPolluted,
    #[serde(rename = "Lightly polluted")]
    LightlyPolluted,
    #[serde(rename = "Moderately polluted")]
    ModeratelyPolluted,
    #[serde(rename = "Severely polluted")]
    SeverelyPolluted,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl PollutionStatus {
    pub fn label(self) -> &'static str {
        match self {
            PollutionStatus::NonOrMildlyPolluted => "Non/mildly polluted",
            PollutionStatus::LightlyPolluted => "Lightly polluted",
            PollutionStatus::ModeratelyPolluted => "Moderately polluted",
            PollutionStatus::SeverelyPolluted => "Severely polluted",
            PollutionStatus::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for PollutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies a weighted aggregate index value.
///
/// | value            | band               |
/// |------------------|--------------------|
/// | ≤ 25             | Excellent          |
/// | (25, 50]         | Good               |
/// | (50, 75]         | Poor               |
/// | (75, 100]        | Very Poor          |
/// | > 100            | Unsuitable for use |
/// | undefined / NaN  | N/A                |
pub fn classify_index(value: Option<f64>) -> WqiStatus {
    match value {
        None => WqiStatus::NotAvailable,
        Some(v) if v.is_nan() => WqiStatus::NotAvailable,
        Some(v) if v <= 25.0 => WqiStatus::Excellent,
        Some(v) if v <= 50.0 => WqiStatus::Good,
        Some(v) if v <= 75.0 => WqiStatus::Poor,
        Some(v) if v <= 100.0 => WqiStatus::VeryPoor,
        Some(_) => WqiStatus::Unsuitable,
    }
}

/// Classifies a river pollution index value.
///
/// | value     | band                |
/// |-----------|---------------------|
/// | ≤ 2       | Non/mildly polluted |
/// | (2, 3]    | Lightly polluted    |
/// | (3, 6]    | Moderately polluted |
/// | > 6       | Severely polluted   |
pub fn classify_pollution_index(value: Option<f64>) -> PollutionStatus {
    match value {
        None => PollutionStatus::NotAvailable,
        Some(v) if v.is_nan() => PollutionStatus::NotAvailable,
        Some(v) if v <= 2.0 => PollutionStatus::NonOrMildlyPolluted,
        Some(v) if v <= 3.0 => PollutionStatus::LightlyPolluted,
        Some(v) if v <= 6.0 => PollutionStatus::ModeratelyPolluted,
        Some(_) => PollutionStatus::SeverelyPolluted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_band_upper_boundaries_are_inclusive() {
        assert_eq!(classify_index(Some(0.0)), WqiStatus::Excellent);
        assert_eq!(classify_index(Some(25.0)), WqiStatus::Excellent);
        assert_eq!(classify_index(Some(25.01)), WqiStatus::Good);
        assert_eq!(classify_index(Some(50.0)), WqiStatus::Good);
        assert_eq!(classify_index(Some(50.01)), WqiStatus::Poor);
        assert_eq!(classify_index(Some(75.0)), WqiStatus::Poor);
        assert_eq!(classify_index(Some(75.01)), WqiStatus::VeryPoor);
        assert_eq!(classify_index(Some(100.0)), WqiStatus::VeryPoor);
        assert_eq!(classify_index(Some(100.01)), WqiStatus::Unsuitable);
    }

    #[test]
    fn test_undefined_index_is_not_excellent() {
        assert_eq!(classify_index(None), WqiStatus::NotAvailable);
        assert_eq!(classify_index(Some(f64::NAN)), WqiStatus::NotAvailable);
        assert_eq!(WqiStatus::NotAvailable.label(), "N/A");
    }

    #[test]
    fn test_pollution_band_boundaries() {
        assert_eq!(classify_pollution_index(Some(1.0)), PollutionStatus::NonOrMildlyPolluted);
        assert_eq!(classify_pollution_index(Some(2.0)), PollutionStatus::NonOrMildlyPolluted);
        assert_eq!(classify_pollution_index(Some(2.5)), PollutionStatus::LightlyPolluted);
        assert_eq!(classify_pollution_index(Some(3.0)), PollutionStatus::LightlyPolluted);
        assert_eq!(classify_pollution_index(Some(3.25)), PollutionStatus::ModeratelyPolluted);
        assert_eq!(classify_pollution_index(Some(6.0)), PollutionStatus::ModeratelyPolluted);
        assert_eq!(classify_pollution_index(Some(6.5)), PollutionStatus::SeverelyPolluted);
        assert_eq!(classify_pollution_index(None), PollutionStatus::NotAvailable);
    }

    #[test]
    fn test_labels_serialize_as_display_text() {
        let json = serde_json::to_string(&WqiStatus::Unsuitable).unwrap();
        assert_eq!(json, "\"Unsuitable for use\"");
        let json = serde_json::to_string(&PollutionStatus::NonOrMildlyPolluted).unwrap();
        assert_eq!(json, "\"Non/mildly polluted\"");
    }
}
