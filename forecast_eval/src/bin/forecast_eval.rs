//! forecast-eval command line
//!
//! Usage:
//!   forecast-eval --registry ./registry list
//!   forecast-eval run toy_daily --model sma7 --horizon 3
//!   forecast-eval run-set smoke --model naive --run-id nightly --resume
//!   forecast-eval prompt toy_scenarios --index 1

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use forecast_eval::loaders::Benchmark;
use forecast_eval::registry::build_backtest_config;
use forecast_eval::runner::{default_run_id, run_benchmark_set, run_registered, RunOutput};
use forecast_eval::{ConfigOverrides, ForecastPrompt, ForecastRequest, Registry};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "forecast-eval")]
#[command(about = "Evaluate forecasting models on registered benchmarks", version)]
struct Cli {
    /// Registry directory (repeatable); defaults to $FORECAST_EVAL_REGISTRY or ./registry
    #[arg(long, global = true)]
    registry: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one model on one benchmark
    Run {
        benchmark_id: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        run_id: Option<String>,

        #[arg(long, default_value = "outputs")]
        output_root: PathBuf,

        #[command(flatten)]
        backtest: BacktestArgs,
    },

    /// Run one model on every benchmark of a set
    RunSet {
        set_id: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        run_id: Option<String>,

        #[arg(long, default_value = "outputs")]
        output_root: PathBuf,

        /// Skip benchmarks whose output directory already exists
        #[arg(long)]
        resume: bool,
    },

    /// Print the chat prompt a text-driven forecaster would receive
    Prompt {
        benchmark_id: String,

        /// Scenario sample or walk-forward window to render
        #[arg(long, default_value_t = 0)]
        index: usize,

        #[command(flatten)]
        backtest: BacktestArgs,
    },

    /// List registered benchmarks, models, sets and model kinds
    List,
}

#[derive(Args, Debug)]
struct BacktestArgs {
    #[arg(long)]
    horizon: Option<usize>,

    #[arg(long)]
    step: Option<usize>,

    #[arg(long)]
    min_train_size: Option<usize>,

    #[arg(long)]
    max_train_size: Option<usize>,

    #[arg(long)]
    max_windows: Option<usize>,

    #[arg(long, conflicts_with = "no_retrain")]
    allow_retrain: bool,

    #[arg(long)]
    no_retrain: bool,

    #[arg(long)]
    retrain_frequency: Option<usize>,
}

impl BacktestArgs {
    fn overrides(&self) -> ConfigOverrides {
        let allow_retrain = match (self.allow_retrain, self.no_retrain) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        ConfigOverrides {
            horizon: self.horizon,
            step: self.step,
            min_train_size: self.min_train_size,
            max_train_size: self.max_train_size,
            allow_retrain,
            retrain_frequency: self.retrain_frequency,
            max_windows: self.max_windows,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("forecast_eval=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = if cli.registry.is_empty() {
        Registry::default_paths()
    } else {
        cli.registry.clone()
    };
    let registry = Registry::load(&paths).context("failed to load registry")?;

    match cli.command {
        Commands::Run {
            benchmark_id,
            model,
            run_id,
            output_root,
            backtest,
        } => {
            let run_id = run_id.unwrap_or_else(default_run_id);
            let output = run_registered(
                &registry,
                &benchmark_id,
                &model,
                &output_root,
                &run_id,
                &backtest.overrides(),
            )
            .with_context(|| format!("run of '{}' on '{}' failed", model, benchmark_id))?;
            print_output(&output);
        }
        Commands::RunSet {
            set_id,
            model,
            run_id,
            output_root,
            resume,
        } => {
            let run_id = run_id.unwrap_or_else(default_run_id);
            let outputs =
                run_benchmark_set(&registry, &set_id, &model, &output_root, &run_id, resume)
                    .with_context(|| format!("benchmark set '{}' failed", set_id))?;
            for output in &outputs {
                print_output(output);
            }
        }
        Commands::Prompt {
            benchmark_id,
            index,
            backtest,
        } => {
            let request = prompt_request(&registry, &benchmark_id, index, &backtest.overrides())?;
            let messages = ForecastPrompt::from(&request).to_chat_messages();
            println!("{}", serde_json::to_string_pretty(&messages)?);
        }
        Commands::List => print_registry(&registry),
    }
    Ok(())
}

fn prompt_request(
    registry: &Registry,
    benchmark_id: &str,
    index: usize,
    overrides: &ConfigOverrides,
) -> Result<ForecastRequest> {
    let spec = registry.benchmark(benchmark_id)?;
    let request = match registry.load_benchmark(benchmark_id)? {
        Benchmark::Scenario(samples) => samples.get(index).map(ForecastRequest::from),
        Benchmark::TimeSeries(dataset) => {
            let config = build_backtest_config(spec, overrides)?
                .ok_or_else(|| anyhow!("no backtest config for '{}'", benchmark_id))?;
            let mut windows = dataset.walk_forward_windows(
                config.horizon,
                config.step,
                config.min_train_size,
                config.max_train_size,
                None,
            )?;
            windows.nth(index).map(|window| ForecastRequest::from(&window))
        }
    };
    request.ok_or_else(|| anyhow!("'{}' has no entry at index {}", benchmark_id, index))
}

fn print_output(output: &RunOutput) {
    println!(
        "{} / {} ({} samples)",
        output.benchmark_id, output.model_id, output.num_samples
    );
    for (name, value) in &output.metrics {
        println!("  {:<6} {:.4}", name, value);
    }
}

fn print_registry(registry: &Registry) {
    println!("Benchmarks:");
    for spec in registry.benchmarks() {
        println!("  {:<24} {:?} ({})", spec.id, spec.kind, spec.source);
    }
    println!("Models:");
    for spec in registry.models() {
        println!("  {:<24} {}", spec.id, spec.kind);
    }
    println!("Benchmark sets:");
    for spec in registry.benchmark_sets() {
        println!("  {:<24} {}", spec.id, spec.benchmarks.join(", "));
    }
    println!("Model kinds:");
    for kind in registry.factory().kinds() {
        println!("  {}", kind);
    }
}
