use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use wqmon_service::analysis::rpi::POLLUTION_TABLES;
use wqmon_service::config::{self, AppConfig, DEFAULT_CONFIG_PATH};
use wqmon_service::ingest::form;
use wqmon_service::logging::{self, Component, LogLevel};
use wqmon_service::model::Polarity;
use wqmon_service::narrative::{self, ChatCompletionNarrator, NarrativeOutcome};
use wqmon_service::report::{AnalysisReport, SiteInfo};

/// Water quality index calculator for field river samples
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: wqmon.toml, optional)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Minimum log level: debug, info, warn or error
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute both indices for a sample file and print the report
    Analyze {
        /// Sample form in TOML
        sample: PathBuf,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,

        /// Skip the language-model assessment
        #[arg(long)]
        no_narrative: bool,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the standards and pollution breakpoints in effect
    Standards,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    logging::init_logger(cli.log_level, cli.log_file.as_deref(), false);

    let app_config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            sample,
            json,
            no_narrative,
            output,
        } => analyze(&app_config, &sample, json, no_narrative, output.as_deref()),
        Commands::Standards => {
            print_standards(&app_config)?;
            Ok(())
        }
    }
}

/// An explicit `--config` must exist; the default path is optional.
fn resolve_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            let config = config::load_config(path)?;
            logging::info(
                Component::Config,
                None,
                &format!("loaded configuration from {}", path.display()),
            );
            Ok(config)
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                resolve_config(Some(default_path))
            } else {
                logging::debug(
                    Component::Config,
                    None,
                    "no configuration file found, using built-in defaults",
                );
                Ok(AppConfig::default())
            }
        }
    }
}

fn analyze(
    app_config: &AppConfig,
    sample_path: &Path,
    json: bool,
    no_narrative: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let engine = app_config.build_engine()?;

    let sample = form::load_sample(sample_path)?;
    let readings = match sample.parse_readings() {
        Ok(readings) => readings,
        Err(errors) => {
            logging::log_reading_errors(&errors);
            for err in &errors {
                eprintln!("  ✗ {}", err);
            }
            bail!(
                "{} invalid entr{} in {}",
                errors.len(),
                if errors.len() == 1 { "y" } else { "ies" },
                sample_path.display()
            );
        }
    };
    logging::info(
        Component::Ingest,
        None,
        &format!("{}: {} parameter(s) read", sample.site, readings.len()),
    );

    let result = engine.analyze(&readings);
    logging::log_skipped_parameters(&result.aggregate.skipped);
    logging::log_analysis_summary(&result);

    let site = SiteInfo::from(&sample);
    let narrative = if no_narrative {
        None
    } else {
        let prompt = narrative::build_prompt(&site, &readings, &result);
        Some(match ChatCompletionNarrator::from_config(&app_config.narrative) {
            Ok(narrator) => narrative::narrate(&narrator, &prompt),
            Err(e) => {
                logging::log_narrative_failure("openai-compatible", &e);
                NarrativeOutcome::Unavailable(e.to_string())
            }
        })
    };

    let report = AnalysisReport::new(site, &readings, &result, narrative);
    let rendered = if json {
        report.to_json()?
    } else {
        report.render_text()
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            logging::info(
                Component::Report,
                None,
                &format!("report written to {}", path.display()),
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn print_standards(app_config: &AppConfig) -> anyhow::Result<()> {
    let standards = app_config.standard_set()?;

    println!("PARAMETER STANDARDS (k = {})", app_config.engine.weight_constant);
    println!(
        "  {:<14}{:>10}{:>10}  {:<10}{}",
        "Parameter", "Ideal", "Limit", "Unit", "Degrades when"
    );
    for standard in standards.iter() {
        let note = match standard.validate() {
            Ok(()) => String::new(),
            Err(e) => format!("  (skipped: {})", e),
        };
        println!(
            "  {:<14}{:>10}{:>10}  {:<10}{}{}",
            standard.parameter.key(),
            standard.ideal_value,
            standard.standard_limit,
            standard.parameter.unit(),
            polarity_label(standard.polarity),
            note
        );
    }

    println!();
    println!("RIVER POLLUTION BREAKPOINTS (scores 1 / 3 / 6 / 8)");
    for table in &POLLUTION_TABLES {
        let edge = match table.polarity {
            Polarity::HigherIsWorse => "<=",
            Polarity::LowerIsWorse => ">=",
        };
        println!(
            "  {:<14}score 1 {} {}, score 3 {} {}, score 6 {} {}, else 8",
            table.parameter.key(),
            edge,
            table.bounds[0],
            edge,
            table.bounds[1],
            edge,
            table.bounds[2]
        );
    }

    Ok(())
}

fn polarity_label(polarity: Polarity) -> &'static str {
    match polarity {
        Polarity::HigherIsWorse => "above limit",
        Polarity::LowerIsWorse => "below limit",
    }
}
