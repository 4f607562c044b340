//! Narrative generation.
//!
//! A language model turns the computed indices into a short suitability,
//! risk and treatment write-up. The model is an injected collaborator behind
//! `NarrativeGenerator`; the index results never depend on it. Any failure
//! becomes `NarrativeOutcome::Unavailable` and the report carries on.

use crate::analysis::engine::AnalysisResult;
use crate::config::NarrativeConfig;
use crate::logging::{self, Component};
use crate::model::SampleReadings;
use crate::report::{SiteInfo, format_index};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Collaborator contract
// ============================================================================

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative unavailable: {0}")]
    Config(String),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("rate limited by provider")]
    RateLimit { retry_after_secs: Option<u64> },

    #[error("provider API error: status={status}, body={body}")]
    Api { status: u16, body: String },

    #[error("provider returned invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for NarrativeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NarrativeError::Timeout
        } else if err.is_decode() {
            NarrativeError::InvalidResponse(err.to_string())
        } else {
            NarrativeError::Network(err)
        }
    }
}

/// Anything that can turn a prompt into free text.
pub trait NarrativeGenerator {
    fn name(&self) -> &'static str;

    fn generate(&self, prompt: &str) -> Result<String, NarrativeError>;
}

/// What ended up in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum NarrativeOutcome {
    Generated(String),
    Unavailable(String),
}

/// Runs the generator and folds any failure into `Unavailable`, logging it.
pub fn narrate(generator: &dyn NarrativeGenerator, prompt: &str) -> NarrativeOutcome {
    match generator.generate(prompt) {
        Ok(text) => {
            logging::info(
                Component::Narrative,
                None,
                &format!("narrative generated by {} ({} chars)", generator.name(), text.len()),
            );
            NarrativeOutcome::Generated(text)
        }
        Err(e) => {
            logging::log_narrative_failure(generator.name(), &e);
            NarrativeOutcome::Unavailable(e.to_string())
        }
    }
}

// ============================================================================
// Prompt
// ============================================================================

const SYSTEM_PROMPT: &str = "You are an environmental engineer assessing river water \
quality for a field monitoring team. Be concise and practical.";

/// Builds the user prompt from sample metadata, averaged readings and both
/// indices. Undefined indices are spelled out as not computed, with the
/// reason, so the model does not read them as clean results.
pub fn build_prompt(site: &SiteInfo, readings: &SampleReadings, result: &AnalysisResult) -> String {
    Prompt {
        site,
        readings,
        result,
    }
    .to_string()
}

struct Prompt<'a> {
    site: &'a SiteInfo,
    readings: &'a SampleReadings,
    result: &'a AnalysisResult,
}

impl fmt::Display for Prompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let site = self.site;
        let aggregate = &self.result.aggregate;
        let pollution = &self.result.pollution;

        writeln!(f, "River water sample analysis.")?;
        writeln!(f, "Site: {}", site.site)?;
        if let Some(location) = &site.location {
            writeln!(f, "Location: {}", location)?;
        }
        if let Some(date) = site.sampled_on {
            writeln!(f, "Sampled on: {}", date)?;
        }
        if let Some(notes) = &site.notes {
            writeln!(f, "Field notes: {}", notes)?;
        }

        writeln!(f, "\nMeasured parameters (mean of valid replicates):")?;
        for reading in self.readings.iter() {
            let parameter = reading.parameter();
            match reading.average() {
                Some(average) => writeln!(
                    f,
                    "- {} ({}): {:.3} {} [{} replicate(s)]",
                    parameter.display_name(),
                    parameter.key(),
                    average,
                    parameter.unit(),
                    reading.valid_count()
                )?,
                None => writeln!(f, "- {}: not measured", parameter.display_name())?,
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Weighted arithmetic water quality index: {}",
            describe(aggregate.value, aggregate.status.label(), &aggregate.undefined_reason)
        )?;
        writeln!(
            f,
            "River pollution index: {}",
            describe(pollution.value, pollution.status.label(), &pollution.undefined_reason)
        )?;

        writeln!(f, "\nPlease provide:")?;
        writeln!(
            f,
            "1. Suitability for drinking (after conventional treatment), irrigation and aquatic life."
        )?;
        writeln!(f, "2. The main risks these parameters indicate.")?;
        writeln!(f, "3. Recommended treatment or follow-up sampling.")?;
        write!(f, "Keep it under 300 words and do not repeat the table of values.")
    }
}

fn describe(
    value: Option<f64>,
    label: &str,
    reason: &Option<crate::analysis::UndefinedReason>,
) -> String {
    match (value, reason) {
        (Some(_), _) => format!("{} ({})", format_index(value), label),
        (None, Some(reason)) => format!("not computed ({})", reason),
        (None, None) => "not computed".to_string(),
    }
}

// ============================================================================
// OpenAI-compatible chat completions
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// `NarrativeGenerator` backed by a `/v1/chat/completions` endpoint.
pub struct ChatCompletionNarrator {
    config: NarrativeConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl ChatCompletionNarrator {
    pub fn new(config: NarrativeConfig, api_key: String) -> Result<Self, NarrativeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Builds a narrator from configuration, reading the key from the
    /// environment. Fails with `NarrativeError::Config` when narratives are
    /// disabled or no key is set.
    pub fn from_config(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        if !config.enabled {
            return Err(NarrativeError::Config("disabled in configuration".to_string()));
        }
        let api_key = config.api_key().ok_or_else(|| {
            NarrativeError::Config(format!("{} is not set", config.api_key_env))
        })?;
        Self::new(config.clone(), api_key)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl NarrativeGenerator for ChatCompletionNarrator {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(NarrativeError::RateLimit { retry_after_secs });
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(NarrativeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| NarrativeError::InvalidResponse("no completion text in response".to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::engine::IndexEngine;
    use crate::model::Parameter;

    struct CannedNarrator(&'static str);

    impl NarrativeGenerator for CannedNarrator {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn generate(&self, _prompt: &str) -> Result<String, NarrativeError> {
            Ok(self.0.to_string())
        }
    }

    struct ThrottledNarrator;

    impl NarrativeGenerator for ThrottledNarrator {
        fn name(&self) -> &'static str {
            "throttled"
        }

        fn generate(&self, _prompt: &str) -> Result<String, NarrativeError> {
            Err(NarrativeError::RateLimit {
                retry_after_secs: Some(30),
            })
        }
    }

    fn site() -> SiteInfo {
        SiteInfo {
            site: "Test Reach".to_string(),
            location: Some("Perak".to_string()),
            sampled_on: None,
            latitude: None,
            longitude: None,
            notes: Some("Turbid after overnight rain".to_string()),
        }
    }

    #[test]
    fn test_successful_generation_is_kept() {
        let outcome = narrate(&CannedNarrator("Suitable for irrigation."), "prompt");
        assert_eq!(
            outcome,
            NarrativeOutcome::Generated("Suitable for irrigation.".to_string())
        );
    }

    #[test]
    fn test_failure_is_not_fatal() {
        let outcome = narrate(&ThrottledNarrator, "prompt");
        assert_eq!(
            outcome,
            NarrativeOutcome::Unavailable("rate limited by provider".to_string())
        );
    }

    #[test]
    fn test_prompt_spells_out_undefined_indices() {
        let readings =
            SampleReadings::from_values([(Parameter::Bod5, vec![Some(2.0), None, None])]).unwrap();
        let result = IndexEngine::default().analyze(&readings);

        let prompt = build_prompt(&site(), &readings, &result);

        assert!(prompt.contains("Site: Test Reach"));
        assert!(prompt.contains("Field notes: Turbid after overnight rain"));
        assert!(prompt.contains("BOD5"));
        assert!(prompt.contains("River pollution index: not computed (insufficient data: missing DO, TSS, NH3N)"));
        assert!(!prompt.contains("River pollution index: 0"));
    }

    #[test]
    fn test_disabled_config_refuses_to_build() {
        let config = NarrativeConfig {
            enabled: false,
            ..NarrativeConfig::default()
        };
        assert!(matches!(
            ChatCompletionNarrator::from_config(&config),
            Err(NarrativeError::Config(_))
        ));
    }

    #[test]
    fn test_missing_key_refuses_to_build() {
        let config = NarrativeConfig {
            api_key_env: "WQMON_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..NarrativeConfig::default()
        };
        let err = ChatCompletionNarrator::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("WQMON_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    #[ignore] // Don't run in CI - depends on external API and a real key
    fn live_narrative_round_trip() {
        dotenv::dotenv().ok();
        let narrator = ChatCompletionNarrator::from_config(&NarrativeConfig::default())
            .expect("OPENAI_API_KEY must be set for the live test");
        let text = narrator
            .generate("In one sentence, is water with BOD5 of 2 mg/L clean?")
            .expect("live narrative request failed");
        assert!(!text.is_empty());
    }
}
