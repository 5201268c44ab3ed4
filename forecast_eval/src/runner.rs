//! Run orchestration and persisted artifacts
//!
//! A run evaluates one model on one benchmark and leaves three files in its
//! output directory: `events.jsonl`, `results.json` and `results.md`.

use crate::backtest::WalkForwardBacktester;
use crate::config::{ConfigOverrides, WalkForwardConfig};
use crate::error::Result;
use crate::loaders::Benchmark;
use crate::models::Model;
use crate::record::{JsonlRecorder, Recorder};
use crate::registry::{build_backtest_config, Registry};
use crate::scenario::ScenarioEvaluator;
use chrono::Utc;
use eval_math::stats::nan_mean;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const EVENTS_FILE: &str = "events.jsonl";
pub const RESULTS_JSON: &str = "results.json";
pub const RESULTS_MARKDOWN: &str = "results.md";

/// Aggregate summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub benchmark_id: String,
    pub model_id: String,
    /// Metrics that were NaN are written as `null` and read back as NaN
    #[serde(deserialize_with = "eval_math::serde_nan::deserialize_map")]
    pub metrics: BTreeMap<String, f64>,
    pub num_samples: usize,
}

/// Evaluates a model on a benchmark and writes the run artifacts
#[derive(Debug, Clone, Copy, Default)]
pub struct Runner;

impl Runner {
    pub fn new() -> Self {
        Self
    }

    /// Run `model` on `benchmark`, writing artifacts under `output_dir`.
    ///
    /// Time-series benchmarks use `backtest_config`, defaulting to a
    /// one-step horizon. The event log is closed whether or not the
    /// evaluation succeeds.
    pub fn run(
        &self,
        benchmark_id: &str,
        benchmark: &Benchmark,
        model_id: &str,
        model: &mut dyn Model,
        output_dir: &Path,
        backtest_config: Option<&WalkForwardConfig>,
    ) -> Result<RunOutput> {
        fs::create_dir_all(output_dir)?;
        let recorder = JsonlRecorder::open(output_dir.join(EVENTS_FILE))?;
        info!(benchmark_id, model_id, kind = benchmark.kind(), "starting run");

        let evaluated = evaluate(benchmark, model, backtest_config, &recorder);
        recorder.close()?;
        let (metrics, num_samples) = evaluated?;

        let output = RunOutput {
            benchmark_id: benchmark_id.to_string(),
            model_id: model_id.to_string(),
            metrics,
            num_samples,
        };
        fs::write(
            output_dir.join(RESULTS_JSON),
            serde_json::to_string_pretty(&output)?,
        )?;
        fs::write(output_dir.join(RESULTS_MARKDOWN), render_markdown(&output))?;

        info!(
            benchmark_id,
            model_id,
            samples = num_samples,
            metrics = ?output.metrics,
            "run finished"
        );
        Ok(output)
    }
}

fn evaluate(
    benchmark: &Benchmark,
    model: &mut dyn Model,
    backtest_config: Option<&WalkForwardConfig>,
    recorder: &dyn Recorder,
) -> Result<(BTreeMap<String, f64>, usize)> {
    match benchmark {
        Benchmark::TimeSeries(dataset) => {
            let default_config = WalkForwardConfig::new(1);
            let config = backtest_config.unwrap_or(&default_config);
            let results = WalkForwardBacktester::new().run(dataset, model, config, recorder)?;
            let metrics = aggregate_metrics(results.iter().map(|r| r.metrics.named()));
            Ok((metrics, results.len()))
        }
        Benchmark::Scenario(samples) => {
            let results = ScenarioEvaluator::new().run(samples, model, recorder)?;
            let rcrps = if results.is_empty() {
                0.0
            } else {
                results.iter().map(|r| r.metric).sum::<f64>() / results.len() as f64
            };
            Ok((BTreeMap::from([("rcrps".to_string(), rcrps)]), results.len()))
        }
    }
}

/// Mean of each named metric across windows, ignoring NaN entries
pub fn aggregate_metrics<I, M>(per_window: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = M>,
    M: IntoIterator<Item = (&'static str, f64)>,
{
    let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for metrics in per_window {
        for (name, value) in metrics {
            columns.entry(name.to_string()).or_default().push(value);
        }
    }
    columns
        .into_iter()
        .map(|(name, values)| (name, nan_mean(&values)))
        .collect()
}

/// Human-readable summary of a run
pub fn render_markdown(output: &RunOutput) -> String {
    let mut text = format!(
        "# {} ({})\n\n## Metrics",
        output.benchmark_id, output.model_id
    );
    for (name, value) in &output.metrics {
        let _ = write!(text, "\n- **{}**: {:.4}", name, value);
    }
    text
}

/// Run one registered benchmark with one registered model into
/// `<output_root>/<benchmark_id>/<run_id>/<model_id>`
pub fn run_registered(
    registry: &Registry,
    benchmark_id: &str,
    model_id: &str,
    output_root: &Path,
    run_id: &str,
    overrides: &ConfigOverrides,
) -> Result<RunOutput> {
    let spec = registry.benchmark(benchmark_id)?;
    let config = build_backtest_config(spec, overrides)?;
    let benchmark = registry.load_benchmark(benchmark_id)?;
    let mut model = registry.build_model(model_id)?;

    let output_dir = run_dir(output_root, benchmark_id, run_id, model_id);
    Runner::new().run(
        benchmark_id,
        &benchmark,
        model_id,
        model.as_mut(),
        &output_dir,
        config.as_ref(),
    )
}

/// Run every benchmark of a set, each with a freshly built model.
///
/// With `resume`, benchmarks whose output directory already exists are
/// skipped and left out of the returned summaries.
pub fn run_benchmark_set(
    registry: &Registry,
    set_id: &str,
    model_id: &str,
    output_root: &Path,
    run_id: &str,
    resume: bool,
) -> Result<Vec<RunOutput>> {
    let set = registry.benchmark_set(set_id)?;
    info!(set_id, model_id, benchmarks = set.benchmarks.len(), "running benchmark set");

    let mut outputs = Vec::with_capacity(set.benchmarks.len());
    for benchmark_id in &set.benchmarks {
        let output_dir = run_dir(output_root, benchmark_id, run_id, model_id);
        if resume && output_dir.exists() {
            warn!(
                benchmark_id = %benchmark_id,
                path = %output_dir.display(),
                "output exists, skipping"
            );
            continue;
        }
        outputs.push(run_registered(
            registry,
            benchmark_id,
            model_id,
            output_root,
            run_id,
            &ConfigOverrides::default(),
        )?);
    }
    Ok(outputs)
}

/// Output directory of one run
pub fn run_dir(output_root: &Path, benchmark_id: &str, run_id: &str, model_id: &str) -> PathBuf {
    output_root.join(benchmark_id).join(run_id).join(model_id)
}

/// Run identifier derived from the current UTC time
pub fn default_run_id() -> String {
    Utc::now().format("%Y%m%d-%H%M%S").to_string()
}
