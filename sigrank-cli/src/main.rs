//! SigRank CLI: significance evaluation of per-fold model samples.
//!
//! Commands:
//! - `evaluate`: split, select and evaluate a samples CSV against a config
//! - `check-config`: validate a TOML config and resolve its tests
//! - `default-config`: print the default configuration as TOML

mod import;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sigrank_core::{
    evaluate_pipeline, EngineHandle, NativeEngine, PipelineKind, StatsConfig, TestRegistry,
};

use import::{load_samples, parse_contingency, ImportOptions};

#[derive(Parser)]
#[command(
    name = "sigrank",
    about = "SigRank CLI: statistical significance testing and ordering of ML models"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a samples CSV file.
    Evaluate {
        /// Path to a TOML config file. Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Samples CSV: classifier, feature_set, measure, fold, value[, baseline].
        #[arg(long)]
        samples: PathBuf,

        /// Field separator of the samples file.
        #[arg(long, default_value_t = ',')]
        separator: char,

        /// Evaluation pipeline the samples came from.
        #[arg(long, value_enum, default_value_t = PipelineArg::Cv)]
        pipeline: PipelineArg,

        /// Number of folds per repetition.
        #[arg(long)]
        folds: Option<usize>,

        /// Number of cross-validation repetitions.
        #[arg(long)]
        repetitions: Option<usize>,

        /// 2x2 contingency counts as a,b,c,d (two models, data not split).
        #[arg(long)]
        contingency: Option<String>,

        /// Write full results as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate a TOML config file.
    CheckConfig {
        /// Path to the TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the default configuration as TOML.
    DefaultConfig,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PipelineArg {
    Cv,
    RepeatedCv,
    DatasetCv,
    DatasetRepeatedCv,
    TrainTest,
}

impl From<PipelineArg> for PipelineKind {
    fn from(arg: PipelineArg) -> Self {
        match arg {
            PipelineArg::Cv => PipelineKind::Cv,
            PipelineArg::RepeatedCv => PipelineKind::RepeatedCv,
            PipelineArg::DatasetCv => PipelineKind::DatasetCv,
            PipelineArg::DatasetRepeatedCv => PipelineKind::DatasetRepeatedCv,
            PipelineArg::TrainTest => PipelineKind::TrainTest,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Evaluate {
            config,
            samples,
            separator,
            pipeline,
            folds,
            repetitions,
            contingency,
            output,
        } => {
            let options = ImportOptions {
                delimiter: separator_byte(separator)?,
                pipeline: pipeline.into(),
                folds,
                repetitions,
                contingency: contingency.as_deref().map(parse_contingency).transpose()?,
            };
            run_evaluate(config.as_deref(), &samples, &options, output.as_deref())
        }
        Commands::CheckConfig { config } => run_check_config(&config),
        Commands::DefaultConfig => {
            print!("{}", StatsConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn separator_byte(separator: char) -> Result<u8> {
    if !separator.is_ascii() {
        bail!("separator must be a single ASCII character, got '{separator}'");
    }
    Ok(separator as u8)
}

fn load_config(path: Option<&Path>) -> Result<StatsConfig> {
    match path {
        Some(path) => StatsConfig::load(path)
            .with_context(|| format!("invalid config {}", path.display())),
        None => Ok(StatsConfig::default()),
    }
}

fn run_evaluate(
    config_path: Option<&Path>,
    samples_path: &Path,
    options: &ImportOptions,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let data = load_samples(samples_path, options)?;
    info!(
        models = data.model_count(),
        measures = data.samples().len(),
        "samples loaded"
    );

    let engine = EngineHandle::open(NativeEngine::new())?;
    let outcomes = evaluate_pipeline(&config, &data, &engine)?;
    engine.close()?;

    for outcome in &outcomes {
        print!("{}", report::summary(outcome));
    }

    if let Some(path) = output {
        report::write_json(&outcomes, path)?;
        println!("Results saved to: {}", path.display());
    }

    if outcomes.iter().all(|o| o.result.is_err()) {
        bail!("every split failed to evaluate");
    }
    Ok(())
}

fn run_check_config(path: &Path) -> Result<()> {
    let config = StatsConfig::load(path)
        .with_context(|| format!("invalid config {}", path.display()))?;
    let registry = TestRegistry::resolve(&config.tests)?;

    println!("Config OK: {}", path.display());
    println!("{:<48} {:<30}", "Test class", "Test");
    println!("{}", "-".repeat(78));
    for (class, test) in config.tests.entries() {
        let shape = registry
            .handle(class)
            .map(|h| format!("{:?}", h.shape))
            .unwrap_or_default();
        println!("{:<48} {:<30} {}", class.to_string(), test.to_string(), shape);
    }
    let corrections: Vec<&str> = config.corrections.iter().map(|c| c.as_str()).collect();
    println!();
    println!("Corrections: {}", corrections.join(", "));
    println!(
        "Significance: low={} medium={} high={}",
        config.significance.low, config.significance.medium, config.significance.high
    );
    println!(
        "Select best {} by '{}', fixed variable: {:?}",
        config.select_best_n, config.select_by_measure, config.fix_independent_variable
    );
    Ok(())
}
