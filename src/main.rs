//! refine-loop command line entry point
//!
//! Runs scripted refinement simulations, validates loop configuration and
//! routes complexity assessments to an execution strategy.

use clap::{Parser, Subcommand};
use refine_loop::config::RefinementConfig;
use refine_loop::observability::{init_default_logging, init_logging, metrics, LogFormat};
use refine_loop::recovery::RecoveryAdvice;
use refine_loop::refinement::{CancellationFlag, RefinementLoop, RunControl};
use refine_loop::replay::{parse_scores, ScriptedProducer, ScriptedScorer};
use refine_loop::routing::{route, ComplexityAssessment, DEFAULT_MIN_CONFIDENCE};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, Level};

/// Iterative refinement loop with convergence and plateau detection
#[derive(Parser)]
#[command(name = "refine-loop")]
#[command(about = "Iterative refinement loop with success, budget and plateau termination")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted score sequence through the refinement loop
    Simulate {
        /// Comma-separated scores returned by the scripted scorer, in order
        #[arg(long, value_name = "LIST")]
        scores: String,

        /// Feedback line for each score (repeatable)
        #[arg(long)]
        feedback: Vec<String>,

        /// Task label used in candidate names
        #[arg(long, default_value = "simulated task")]
        task: String,

        /// Delay before every scripted score, in milliseconds
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Route a complexity assessment (JSON file) to an execution strategy
    Route {
        /// Assessment JSON file
        #[arg(long, value_name = "FILE")]
        file: PathBuf,

        /// Confidence below which the user is asked for clarification
        #[arg(long, default_value_t = DEFAULT_MIN_CONFIDENCE)]
        min_confidence: f64,
    },
}

/// Command-line overrides layered over the configuration file
#[derive(clap::Args, Debug, Default)]
struct Overrides {
    #[arg(long, env = "REFINE_SUCCESS_THRESHOLD")]
    success_threshold: Option<f64>,

    #[arg(long, env = "REFINE_MAX_ITERATIONS")]
    max_iterations: Option<usize>,

    #[arg(long)]
    plateau_window: Option<usize>,

    #[arg(long)]
    plateau_epsilon: Option<f64>,

    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.verbose {
        0 => init_default_logging(),
        1 => init_logging(Level::DEBUG, LogFormat::Compact, false),
        _ => init_logging(Level::TRACE, LogFormat::Compact, true),
    }

    let result = match cli.command {
        Commands::Simulate {
            scores,
            feedback,
            task,
            delay_ms,
            overrides,
        } => {
            let config = match effective_config(&cli.config, &overrides) {
                Ok(config) => config,
                Err(e) => {
                    error!("Failed to load configuration: {}", e);
                    process::exit(1);
                }
            };
            run_simulation(config, &scores, feedback, task, delay_ms).await
        }
        Commands::Config { show, overrides } => match effective_config(&cli.config, &overrides) {
            Ok(config) => handle_config_command(config, show),
            Err(e) => Err(e),
        },
        Commands::Route {
            file,
            min_confidence,
        } => handle_route_command(&file, min_confidence),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

/// Configuration file (explicit path or default locations) plus overrides,
/// validated once after the overrides are applied
fn effective_config(
    config_path: &Option<PathBuf>,
    overrides: &Overrides,
) -> Result<RefinementConfig, Box<dyn std::error::Error>> {
    let mut config = match load_configuration(config_path)? {
        Some(config) => config,
        None => match (overrides.success_threshold, overrides.max_iterations) {
            (Some(threshold), Some(max_iterations)) => {
                RefinementConfig::new(threshold, max_iterations)
            }
            _ => {
                return Err("No configuration file found. Provide one with -c/--config, \
                    create refine.toml, or pass --success-threshold and --max-iterations"
                    .into())
            }
        },
    };

    if let Some(threshold) = overrides.success_threshold {
        config.success_threshold = threshold;
    }
    if let Some(max_iterations) = overrides.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(window) = overrides.plateau_window {
        config.plateau_window = window;
    }
    if let Some(epsilon) = overrides.plateau_epsilon {
        config.plateau_epsilon = epsilon;
    }
    if let Some(secs) = overrides.timeout_secs {
        config.timeout_secs = Some(secs);
    }

    config.validate()?;
    Ok(config)
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<Option<RefinementConfig>, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(Some(RefinementConfig::read_from_file(path)?))
        }
        None => {
            for path_str in ["refine.toml", "config/refine.toml"] {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(Some(RefinementConfig::read_from_file(&path)?));
                }
            }
            Ok(None)
        }
    }
}

async fn run_simulation(
    config: RefinementConfig,
    scores: &str,
    feedback: Vec<String>,
    task: String,
    delay_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let scores = parse_scores(scores)?;
    let acceptable_score = config.acceptable_score();
    let refinement = RefinementLoop::new(config)?;

    let mut producer = ScriptedProducer::new(task);
    let mut scorer = ScriptedScorer::new(scores).with_feedback(feedback);
    if let Some(ms) = delay_ms {
        scorer = scorer.with_delay(Duration::from_millis(ms));
    }

    // Ctrl-C stops the run at the next iteration boundary
    let cancellation = CancellationFlag::new();
    let flag = cancellation.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT, cancelling after the current iteration...");
            flag.cancel();
        }
    });

    let control = RunControl::new().with_cancellation(cancellation);
    match refinement.run_with(&mut producer, &mut scorer, control).await {
        Ok(outcome) => {
            let advice = RecoveryAdvice::for_outcome(&outcome, acceptable_score);
            let report = json!({
                "outcome": outcome,
                "best": outcome.best(),
                "advice": advice,
                "metrics": metrics().get_metrics(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(failure) => {
            let advice = RecoveryAdvice::for_failure(&failure, acceptable_score);
            let report = json!({
                "run_id": failure.run_id,
                "error": failure.error.to_string(),
                "error_kind": failure.error.kind(),
                "failed_at": failure.iteration(),
                "best": failure.best(),
                "history": failure.history,
                "advice": advice,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Err(failure.into_parts().0.into())
        }
    }
}

fn handle_config_command(
    config: RefinementConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", config.to_toml_string()?);
    }

    info!("Configuration validation complete");
    Ok(())
}

fn handle_route_command(
    file: &Path,
    min_confidence: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let assessment: ComplexityAssessment = serde_json::from_str(&content)?;
    let strategy = route(&assessment, min_confidence);

    let report = json!({
        "strategy": strategy,
        "recommendation": assessment.recommendation,
        "complexity": assessment.effective_complexity(),
        "confidence": assessment.confidence,
        "questions": assessment.questions,
        "required_context": assessment.required_context,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
