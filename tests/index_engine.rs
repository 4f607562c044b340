/// Integration tests for the index engine
///
/// Tests verify:
/// 1. A complete field sample produces both indices with stable rounding
/// 2. Pollution breakpoints are applied to averages at the exact edges
/// 3. Missing data yields an undefined result, never a zero
/// 4. Degenerate standards are skipped instead of dividing by zero
/// 5. Blank replicate slots do not change any result
///
/// Run with: cargo test --test index_engine

use wqmon_service::analysis::UndefinedReason;
use wqmon_service::analysis::engine::IndexEngine;
use wqmon_service::analysis::round2;
use wqmon_service::analysis::wqi::{AggregateOptions, SkipReason};
use wqmon_service::classify::{PollutionStatus, WqiStatus};
use wqmon_service::config::parse_config;
use wqmon_service::model::{Parameter, ParameterStandard, Polarity, SampleReadings, StandardError};
use wqmon_service::standards::StandardSet;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn standard(parameter: Parameter, ideal: f64, limit: f64, polarity: Polarity) -> ParameterStandard {
    ParameterStandard {
        parameter,
        ideal_value: ideal,
        standard_limit: limit,
        polarity,
    }
}

/// Standards used for the field scenario below.
fn field_standards() -> StandardSet {
    [
        standard(Parameter::DissolvedOxygen, 5.0, 6.0, Polarity::LowerIsWorse),
        standard(Parameter::Bod5, 0.0, 3.0, Polarity::HigherIsWorse),
        standard(Parameter::Tss, 0.0, 25.0, Polarity::HigherIsWorse),
        standard(Parameter::AmmoniaNitrogen, 0.0, 0.5, Polarity::HigherIsWorse),
    ]
    .into_iter()
    .collect()
}

fn field_sample() -> SampleReadings {
    SampleReadings::from_values([
        (Parameter::DissolvedOxygen, vec![Some(6.0), Some(6.2), None]),
        (Parameter::Bod5, vec![Some(2.0), None, None]),
        (Parameter::Tss, vec![Some(15.0), None, None]),
        (Parameter::AmmoniaNitrogen, vec![Some(0.3), None, None]),
    ])
    .unwrap()
}

/// Everything clean enough to score 1 on every breakpoint table.
fn clean_sample(bod: f64) -> SampleReadings {
    SampleReadings::from_values([
        (Parameter::DissolvedOxygen, vec![Some(7.2), Some(7.0), None]),
        (Parameter::Bod5, vec![Some(bod), None, None]),
        (Parameter::Tss, vec![Some(15.0), None, None]),
        (Parameter::AmmoniaNitrogen, vec![Some(0.3), None, None]),
    ])
    .unwrap()
}

// ---------------------------------------------------------------------------
// Field Sample
// ---------------------------------------------------------------------------

#[test]
fn test_field_sample_produces_both_indices() {
    let engine = IndexEngine::new(field_standards(), AggregateOptions::default());
    let result = engine.analyze(&field_sample());

    // DO mean 6.1 sits in the 4.6..6.5 band, everything else in the cleanest band.
    let scores: Vec<u8> = result.pollution.scores.iter().map(|s| s.score).collect();
    assert_eq!(scores, vec![3, 1, 1, 1]);
    assert_eq!(result.pollution.value, Some(1.5));
    assert_eq!(result.pollution.status, PollutionStatus::NonOrMildlyPolluted);

    // Qi: DO 110 clamped to 100, BOD5 66.67, TSS 60, NH3N 60.
    let weights = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 25.0, 1.0 / 0.5];
    let ratings = [100.0, 200.0 / 3.0, 60.0, 60.0];
    let expected = weights.iter().zip(ratings).map(|(w, q)| w * q).sum::<f64>()
        / weights.iter().sum::<f64>();

    let value = result.aggregate.value.unwrap();
    assert!((0.0..=100.0).contains(&value));
    assert!((value - round2(expected)).abs() < 1e-9, "got {}", value);
    assert_eq!(value, round2(value));
    assert_eq!(result.aggregate.status, WqiStatus::Poor);
    assert!(result.aggregate.skipped.is_empty());
}

#[test]
fn test_clean_sample_scores_one_on_every_table() {
    let result = IndexEngine::new(field_standards(), AggregateOptions::default())
        .analyze(&clean_sample(2.0));

    assert_eq!(result.pollution.value, Some(1.0));
    assert_eq!(result.pollution.status.label(), "Non/mildly polluted");
}

#[test]
fn test_dissolved_oxygen_below_limit_is_flagged() {
    let sample = SampleReadings::from_values([(
        Parameter::DissolvedOxygen,
        vec![Some(4.0), None, None],
    )])
    .unwrap();

    let result = IndexEngine::default().analyze(&sample);
    let sub_index = result.aggregate.sub_index_for(Parameter::DissolvedOxygen).unwrap();

    assert!(sub_index.exceeds_standard);
    assert!((0.0..=100.0).contains(&sub_index.quality_rating));
}

// ---------------------------------------------------------------------------
// Breakpoint Edges
// ---------------------------------------------------------------------------

#[test]
fn test_bod_edge_moves_pollution_index() {
    let engine = IndexEngine::default();

    let at_edge = engine.analyze(&clean_sample(3.0));
    assert_eq!(
        at_edge.pollution.score_for(Parameter::Bod5).unwrap().score,
        1
    );
    assert_eq!(at_edge.pollution.value, Some(1.0));

    let past_edge = engine.analyze(&clean_sample(3.01));
    assert_eq!(
        past_edge.pollution.score_for(Parameter::Bod5).unwrap().score,
        3
    );
    assert_eq!(past_edge.pollution.value, Some(1.5));
}

// ---------------------------------------------------------------------------
// Undefined Results
// ---------------------------------------------------------------------------

#[test]
fn test_three_of_four_required_parameters_is_undefined() {
    let sample = SampleReadings::from_values([
        (Parameter::DissolvedOxygen, vec![Some(7.0)]),
        (Parameter::Bod5, vec![Some(2.0)]),
        (Parameter::Tss, vec![Some(15.0)]),
    ])
    .unwrap();

    let result = IndexEngine::default().analyze(&sample);

    assert_eq!(result.pollution.value, None);
    assert_eq!(result.pollution.status, PollutionStatus::NotAvailable);
    assert_eq!(
        result.pollution.undefined_reason,
        Some(UndefinedReason::MissingRequired {
            missing: vec![Parameter::AmmoniaNitrogen]
        })
    );
    // The aggregate does not need all four.
    assert!(result.aggregate.value.is_some());
}

#[test]
fn test_empty_sample_is_undefined_not_excellent() {
    let result = IndexEngine::default().analyze(&SampleReadings::new());

    assert_eq!(result.aggregate.value, None);
    assert_eq!(result.aggregate.status, WqiStatus::NotAvailable);
    assert_ne!(result.aggregate.status, WqiStatus::Excellent);
    assert_eq!(
        result.aggregate.undefined_reason,
        Some(UndefinedReason::InsufficientData {
            qualifying: 0,
            required: 1
        })
    );
}

#[test]
fn test_all_blank_replicates_count_as_missing() {
    let sample = SampleReadings::from_values([
        (Parameter::Bod5, vec![None, None, None]),
        (Parameter::Tss, vec![None]),
    ])
    .unwrap();

    let result = IndexEngine::default().analyze(&sample);

    assert_eq!(result.aggregate.value, None);
    assert_eq!(result.aggregate.qualifying_count(), 0);
    assert!(result.aggregate.skipped.is_empty());
}

#[test]
fn test_minimum_parameter_gate() {
    let engine = IndexEngine::new(
        StandardSet::defaults(),
        AggregateOptions {
            min_parameters: 3,
            ..AggregateOptions::default()
        },
    );
    let sample = SampleReadings::from_values([
        (Parameter::Bod5, vec![Some(2.0)]),
        (Parameter::Tss, vec![Some(15.0)]),
    ])
    .unwrap();

    let result = engine.analyze(&sample);

    assert_eq!(result.aggregate.value, None);
    assert_eq!(
        result.aggregate.undefined_reason,
        Some(UndefinedReason::InsufficientData {
            qualifying: 2,
            required: 3
        })
    );
}

// ---------------------------------------------------------------------------
// Degenerate Standards
// ---------------------------------------------------------------------------

#[test]
fn test_collapsed_standard_is_skipped_not_divided_by() {
    let mut standards = StandardSet::defaults();
    standards.insert(standard(Parameter::Cod, 10.0, 10.0, Polarity::HigherIsWorse));
    let engine = IndexEngine::new(standards, AggregateOptions::default());

    let sample = SampleReadings::from_values([
        (Parameter::Bod5, vec![Some(1.5)]),
        (Parameter::Cod, vec![Some(12.0)]),
    ])
    .unwrap();

    let result = engine.analyze(&sample);

    // BOD5 alone: 1.5 / 3.0 * 100.
    assert_eq!(result.aggregate.value, Some(50.0));
    assert_eq!(result.aggregate.skipped.len(), 1);
    let skipped = &result.aggregate.skipped[0];
    assert_eq!(skipped.parameter, Parameter::Cod);
    assert_eq!(
        skipped.reason,
        SkipReason::Configuration {
            error: StandardError::CollapsedRange { value: 10.0 }
        }
    );
}

#[test]
fn test_only_degenerate_standards_is_a_configuration_error() {
    let standards: StandardSet = [standard(Parameter::Cod, 10.0, 10.0, Polarity::HigherIsWorse)]
        .into_iter()
        .collect();
    let engine = IndexEngine::new(standards, AggregateOptions::default());
    let sample = SampleReadings::from_values([(Parameter::Cod, vec![Some(12.0)])]).unwrap();

    let result = engine.analyze(&sample);

    assert_eq!(result.aggregate.value, None);
    assert_eq!(
        result.aggregate.undefined_reason,
        Some(UndefinedReason::AllStandardsDegenerate { skipped: 1 })
    );
}

#[test]
fn test_parameter_without_standard_is_listed() {
    let sample = SampleReadings::from_values([
        (Parameter::Bod5, vec![Some(1.5)]),
        (Parameter::FecalColiform, vec![Some(250.0)]),
    ])
    .unwrap();

    let result = IndexEngine::default().analyze(&sample);

    assert_eq!(result.aggregate.value, Some(50.0));
    let summary = result.summary();
    assert_eq!(summary.skipped_parameters.len(), 1);
    assert_eq!(summary.skipped_parameters[0].parameter, Parameter::FecalColiform);
    assert_eq!(summary.skipped_parameters[0].reason, SkipReason::NoStandard);
}

#[test]
fn test_huge_weight_constant_never_yields_nan() {
    let engine = parse_config("[engine]\nweight_constant = 1e308\n")
        .unwrap()
        .build_engine()
        .unwrap();
    let sample = SampleReadings::from_values([
        (Parameter::Lead, vec![Some(0.005)]),
        (Parameter::Bod5, vec![Some(1.5)]),
    ])
    .unwrap();

    let result = engine.analyze(&sample);

    let value = result.aggregate.value.unwrap();
    assert!((0.0..=100.0).contains(&value), "got {}", value);
    assert_eq!(value, 50.0);
    assert_eq!(result.aggregate.skipped[0].parameter, Parameter::Lead);
    assert_eq!(
        result.aggregate.skipped[0].reason,
        SkipReason::Configuration {
            error: StandardError::UnusableWeight { limit: 0.01 }
        }
    );
}

#[test]
fn test_tiny_configured_limit_is_skipped() {
    let engine = parse_config("[standards.Pb]\nlimit = 1e-310\n")
        .unwrap()
        .build_engine()
        .unwrap();
    let sample = SampleReadings::from_values([
        (Parameter::Lead, vec![Some(0.005)]),
        (Parameter::Bod5, vec![Some(1.5)]),
    ])
    .unwrap();

    let result = engine.analyze(&sample);

    assert_eq!(result.aggregate.value, Some(50.0));
    assert_eq!(result.aggregate.skipped.len(), 1);
    assert!(result.aggregate.undefined_reason.is_none());
}

// ---------------------------------------------------------------------------
// Replicate Handling
// ---------------------------------------------------------------------------

#[test]
fn test_blank_slots_do_not_change_results() {
    let padded = field_sample();
    let compact = SampleReadings::from_values([
        (Parameter::DissolvedOxygen, vec![Some(6.0), Some(6.2)]),
        (Parameter::Bod5, vec![Some(2.0)]),
        (Parameter::Tss, vec![Some(15.0)]),
        (Parameter::AmmoniaNitrogen, vec![Some(0.3)]),
    ])
    .unwrap();

    let engine = IndexEngine::new(field_standards(), AggregateOptions::default());

    assert_eq!(engine.analyze(&padded), engine.analyze(&compact));
}
