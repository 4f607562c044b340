/// Standard registry for the water quality index service.
///
/// Defines the ideal value, permissible limit and polarity used for every
/// parameter in the weighted aggregate index. This is the single source of
/// truth for default standards; configuration may override individual
/// entries through `StandardSet::apply_override`.

use crate::model::{Parameter, ParameterStandard, Polarity};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Default standards
// ---------------------------------------------------------------------------

const fn standard(
    parameter: Parameter,
    ideal_value: f64,
    standard_limit: f64,
    polarity: Polarity,
) -> ParameterStandard {
    ParameterStandard {
        parameter,
        ideal_value,
        standard_limit,
        polarity,
    }
}

/// Default river water standards used by the weighted arithmetic index.
///
/// Ideal values are the pristine-water reference (0 for pollutants, neutral
/// pH, saturated dissolved oxygen at ~0 °C). Fecal coliform has no default
/// entry and only joins the aggregate when configuration supplies one.
pub static STANDARD_REGISTRY: &[ParameterStandard] = &[
    standard(Parameter::Ph, 7.0, 8.5, Polarity::HigherIsWorse),
    standard(Parameter::Bod5, 0.0, 3.0, Polarity::HigherIsWorse),
    standard(Parameter::DissolvedOxygen, 14.6, 5.0, Polarity::LowerIsWorse),
    standard(Parameter::Cod, 0.0, 10.0, Polarity::HigherIsWorse),
    standard(Parameter::Turbidity, 0.0, 5.0, Polarity::HigherIsWorse),
    standard(Parameter::Tss, 0.0, 25.0, Polarity::HigherIsWorse),
    standard(Parameter::AmmoniaNitrogen, 0.0, 0.5, Polarity::HigherIsWorse),
    standard(Parameter::Nitrate, 0.0, 10.0, Polarity::HigherIsWorse),
    standard(Parameter::Temperature, 0.0, 25.0, Polarity::HigherIsWorse),
    standard(Parameter::Lead, 0.0, 0.01, Polarity::HigherIsWorse),
    standard(Parameter::Arsenic, 0.0, 0.01, Polarity::HigherIsWorse),
];

/// Looks up the default standard for a parameter. Returns `None` if the
/// registry has no entry for it.
pub fn find_default(parameter: Parameter) -> Option<&'static ParameterStandard> {
    STANDARD_REGISTRY.iter().find(|s| s.parameter == parameter)
}

// ---------------------------------------------------------------------------
// Standard sets
// ---------------------------------------------------------------------------

/// Partial replacement for one standard. Unset fields keep the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StandardOverride {
    pub ideal_value: Option<f64>,
    pub standard_limit: Option<f64>,
    pub polarity: Option<Polarity>,
}

/// The standards the engine aggregates against, keyed by parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardSet {
    standards: BTreeMap<Parameter, ParameterStandard>,
}

impl StandardSet {
    /// An empty set. Nothing will aggregate until standards are inserted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every entry in `STANDARD_REGISTRY`.
    pub fn defaults() -> Self {
        STANDARD_REGISTRY.iter().copied().collect()
    }

    pub fn insert(&mut self, standard: ParameterStandard) {
        self.standards.insert(standard.parameter, standard);
    }

    pub fn remove(&mut self, parameter: Parameter) -> Option<ParameterStandard> {
        self.standards.remove(&parameter)
    }

    pub fn get(&self, parameter: Parameter) -> Option<&ParameterStandard> {
        self.standards.get(&parameter)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterStandard> {
        self.standards.values()
    }

    pub fn len(&self) -> usize {
        self.standards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.standards.is_empty()
    }

    /// Merges an override onto the existing standard for `parameter`.
    ///
    /// Returns `false` (and changes nothing) when the parameter has no
    /// existing standard and the override does not name all three fields.
    pub fn apply_override(&mut self, parameter: Parameter, update: StandardOverride) -> bool {
        let merged = match self.standards.get(&parameter) {
            Some(current) => ParameterStandard {
                parameter,
                ideal_value: update.ideal_value.unwrap_or(current.ideal_value),
                standard_limit: update.standard_limit.unwrap_or(current.standard_limit),
                polarity: update.polarity.unwrap_or(current.polarity),
            },
            None => match (update.ideal_value, update.standard_limit, update.polarity) {
                (Some(ideal_value), Some(standard_limit), Some(polarity)) => ParameterStandard {
                    parameter,
                    ideal_value,
                    standard_limit,
                    polarity,
                },
                _ => return false,
            },
        };
        self.insert(merged);
        true
    }
}

impl FromIterator<ParameterStandard> for StandardSet {
    fn from_iter<I: IntoIterator<Item = ParameterStandard>>(iter: I) -> Self {
        let mut set = Self::empty();
        for standard in iter {
            set.insert(standard);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
