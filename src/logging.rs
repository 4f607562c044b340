/// Structured logging for the water quality service
///
/// Thin facade over `tracing` that tags every event with the component it
/// came from and, where relevant, the parameter it concerns. Logs go to
/// stderr (or a file) so stdout stays free for the report itself.
///
/// The index engine never logs; callers report skipped parameters and
/// undefined results through the helpers below.

use crate::analysis::engine::AnalysisResult;
use crate::analysis::wqi::SkippedParameter;
use crate::model::ReadingError;
use crate::narrative::NarrativeError;
use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Engine,
    Ingest,
    Config,
    Narrative,
    Report,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Engine => write!(f, "ENGINE"),
            Component::Ingest => write!(f, "INGEST"),
            Component::Config => write!(f, "CONFIG"),
            Component::Narrative => write!(f, "NARRATIVE"),
            Component::Report => write!(f, "REPORT"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - feature disabled, key not set, or provider throttling
    Expected,
    /// Unexpected failure - indicates a provider outage or a configuration issue
    Unexpected,
    /// Unknown - transport-level trouble that may or may not be transient
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Installs the global subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `min_level`. If `log_file`
/// cannot be opened the logger falls back to stderr. Calling this more than
/// once is harmless; later calls are ignored.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(min_level.as_filter()))
    };

    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
                return;
            }
            Err(e) => eprintln!("Failed to open log file {}: {}", path, e),
        }
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if console_timestamps {
        builder.try_init()
    } else {
        builder.without_time().try_init()
    };
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(component: Component, parameter: Option<&str>, message: &str) {
    tracing::info!(component = %component, parameter = parameter.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(component: Component, parameter: Option<&str>, message: &str) {
    tracing::warn!(component = %component, parameter = parameter.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(component: Component, parameter: Option<&str>, message: &str) {
    tracing::error!(component = %component, parameter = parameter.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(component: Component, parameter: Option<&str>, message: &str) {
    tracing::debug!(component = %component, parameter = parameter.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a narrative provider failure.
pub fn classify_narrative_failure(err: &NarrativeError) -> FailureType {
    match err {
        NarrativeError::Config(_) | NarrativeError::RateLimit { .. } => FailureType::Expected,
        NarrativeError::Api { .. } | NarrativeError::InvalidResponse(_) => {
            FailureType::Unexpected
        }
        NarrativeError::Timeout | NarrativeError::Network(_) => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a narrative failure with automatic classification
pub fn log_narrative_failure(provider: &str, err: &NarrativeError) {
    let failure_type = classify_narrative_failure(err);
    let message = format!("{} narrative failed [{}]: {}", provider, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(Component::Narrative, None, &message),
        FailureType::Unexpected => error(Component::Narrative, None, &message),
        FailureType::Unknown => warn(Component::Narrative, None, &message),
    }
}

/// Log every form validation error, one event per slot
pub fn log_reading_errors(errors: &[ReadingError]) {
    for err in errors {
        let parameter = match err {
            ReadingError::Parse { parameter, .. }
            | ReadingError::TooManyReplicates { parameter, .. }
            | ReadingError::DuplicateParameter { parameter } => Some(parameter.key()),
            ReadingError::UnknownParameter(_) => None,
        };
        error(Component::Ingest, parameter, &err.to_string());
    }
}

/// Log parameters the aggregate left out
pub fn log_skipped_parameters(skipped: &[SkippedParameter]) {
    for entry in skipped {
        warn(
            Component::Engine,
            Some(entry.parameter.key()),
            &format!("excluded from aggregate index: {}", entry.reason),
        );
    }
}

// ---------------------------------------------------------------------------
// Analysis Summary Logging
// ---------------------------------------------------------------------------

/// Log a one-line summary of an analysis
pub fn log_analysis_summary(result: &AnalysisResult) {
    let aggregate = &result.aggregate;
    let pollution = &result.pollution;
    let message = format!(
        "Analysis complete: {} parameter(s) aggregated, {} skipped, WQI {}, RPI {}",
        aggregate.qualifying_count(),
        aggregate.skipped.len(),
        aggregate.status,
        pollution.status
    );

    if aggregate.value.is_some() && pollution.value.is_some() {
        info(Component::Engine, None, &message);
    } else {
        warn(Component::Engine, None, &message);
        for reason in [&aggregate.undefined_reason, &pollution.undefined_reason]
            .into_iter()
            .flatten()
        {
            warn(Component::Engine, None, &format!("index undefined: {}", reason));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parses_cli_spellings() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_failure_classification() {
        let throttled = NarrativeError::RateLimit {
            retry_after_secs: Some(20),
        };
        assert_eq!(classify_narrative_failure(&throttled), FailureType::Expected);

        let outage = NarrativeError::Api {
            status: 503,
            body: "upstream unavailable".to_string(),
        };
        assert_eq!(classify_narrative_failure(&outage), FailureType::Unexpected);

        assert_eq!(
            classify_narrative_failure(&NarrativeError::Timeout),
            FailureType::Unknown
        );
    }
}
