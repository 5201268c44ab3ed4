//! Benchmark, model and benchmark-set registry
//!
//! Specs are read from YAML files. Model kinds resolve through a static
//! factory table, and benchmark sources through a fixed set of loaders.

use crate::config::{ConfigOverrides, WalkForwardConfig};
use crate::error::{EvalError, Result};
use crate::loaders::{Benchmark, CsvSeriesLoader, JsonlScenarioLoader, SyntheticScenarioLoader};
use crate::models::{
    ExponentialSmoothingModel, LastValueModel, Model, MovingAverageModel, QuantileNaiveModel,
    RandomWalkModel,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable listing registry directories, separated like `PATH`
pub const REGISTRY_ENV: &str = "FORECAST_EVAL_REGISTRY";

/// Free-form constructor arguments of a spec
pub type Args = Mapping;

/// Model constructor stored in the factory table
pub type ModelCtor = fn(&Args) -> Result<Box<dyn Model>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkKind {
    TimeSeries,
    Scenario,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkSpec {
    pub id: String,
    pub kind: BenchmarkKind,
    /// Loader name: `csv_series`, `jsonl_scenarios` or `synthetic_scenarios`
    pub source: String,
    #[serde(default)]
    pub args: Args,
    #[serde(default)]
    pub backtest: Option<ConfigOverrides>,
    /// Directory of the defining file; relative `path` args resolve here
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub args: Args,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkSetSpec {
    pub id: String,
    pub benchmarks: Vec<String>,
}

/// Maps model kinds to constructors
#[derive(Clone)]
pub struct ModelFactory {
    ctors: BTreeMap<&'static str, ModelCtor>,
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ctors.keys()).finish()
    }
}

impl Default for ModelFactory {
    fn default() -> Self {
        let mut factory = Self {
            ctors: BTreeMap::new(),
        };
        factory.register("last_value", build_last_value);
        factory.register("moving_average", build_moving_average);
        factory.register("exponential_smoothing", build_exponential_smoothing);
        factory.register("random_walk", build_random_walk);
        factory.register("quantile_naive", build_quantile_naive);
        factory
    }
}

impl ModelFactory {
    pub fn register(&mut self, kind: &'static str, ctor: ModelCtor) {
        self.ctors.insert(kind, ctor);
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ctors.keys().copied()
    }

    pub fn build(&self, kind: &str, args: &Args) -> Result<Box<dyn Model>> {
        let ctor = self
            .ctors
            .get(kind)
            .ok_or_else(|| EvalError::Registry(format!("Unknown model kind '{}'", kind)))?;
        ctor(args)
    }
}

fn parse_args<T: DeserializeOwned>(kind: &str, args: &Args) -> Result<T> {
    serde_yaml::from_value(Value::Mapping(args.clone()))
        .map_err(|e| EvalError::Registry(format!("Invalid args for '{}': {}", kind, e)))
}

#[derive(Deserialize)]
#[serde(default)]
struct LastValueArgs {
    fallback_value: f64,
}

impl Default for LastValueArgs {
    fn default() -> Self {
        Self { fallback_value: 0.0 }
    }
}

fn build_last_value(args: &Args) -> Result<Box<dyn Model>> {
    let params: LastValueArgs = parse_args("last_value", args)?;
    Ok(Box::new(LastValueModel::with_fallback(params.fallback_value)))
}

#[derive(Deserialize)]
struct MovingAverageArgs {
    #[serde(default = "default_window")]
    window: usize,
}

fn default_window() -> usize {
    5
}

fn build_moving_average(args: &Args) -> Result<Box<dyn Model>> {
    let params: MovingAverageArgs = parse_args("moving_average", args)?;
    Ok(Box::new(MovingAverageModel::new(params.window)?))
}

#[derive(Deserialize)]
struct ExponentialSmoothingArgs {
    #[serde(default = "default_alpha")]
    alpha: f64,
}

fn default_alpha() -> f64 {
    0.3
}

fn build_exponential_smoothing(args: &Args) -> Result<Box<dyn Model>> {
    let params: ExponentialSmoothingArgs = parse_args("exponential_smoothing", args)?;
    Ok(Box::new(ExponentialSmoothingModel::new(params.alpha)?))
}

#[derive(Deserialize)]
struct RandomWalkArgs {
    #[serde(default = "default_num_samples")]
    num_samples: usize,
    #[serde(default)]
    seed: u64,
}

fn default_num_samples() -> usize {
    100
}

fn build_random_walk(args: &Args) -> Result<Box<dyn Model>> {
    let params: RandomWalkArgs = parse_args("random_walk", args)?;
    Ok(Box::new(RandomWalkModel::new(params.num_samples, params.seed)?))
}

#[derive(Deserialize)]
struct QuantileNaiveArgs {
    #[serde(default)]
    levels: Option<Vec<f64>>,
}

fn build_quantile_naive(args: &Args) -> Result<Box<dyn Model>> {
    let params: QuantileNaiveArgs = parse_args("quantile_naive", args)?;
    Ok(Box::new(match params.levels {
        Some(levels) => QuantileNaiveModel::new(levels)?,
        None => QuantileNaiveModel::default(),
    }))
}

/// Registered specs plus the model factory
#[derive(Debug, Clone, Default)]
pub struct Registry {
    benchmarks: BTreeMap<String, BenchmarkSpec>,
    models: BTreeMap<String, ModelSpec>,
    benchmark_sets: BTreeMap<String, BenchmarkSetSpec>,
    factory: ModelFactory,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories named by `FORECAST_EVAL_REGISTRY`, else `./registry`
    pub fn default_paths() -> Vec<PathBuf> {
        match std::env::var_os(REGISTRY_ENV) {
            Some(raw) if !raw.is_empty() => std::env::split_paths(&raw).collect(),
            _ => vec![PathBuf::from("registry")],
        }
    }

    /// Load every `*.yaml` file under `paths`, recursing in sorted order.
    /// Missing directories are skipped.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut registry = Self::new();
        for base in paths {
            let base = base.as_ref();
            if !base.is_dir() {
                debug!(path = %base.display(), "registry directory not found, skipping");
                continue;
            }
            let mut files = Vec::new();
            collect_yaml_files(base, &mut files)?;
            for file in files {
                registry.load_file(&file)?;
            }
        }
        info!(
            benchmarks = registry.benchmarks.len(),
            models = registry.models.len(),
            sets = registry.benchmark_sets.len(),
            "registry loaded"
        );
        Ok(registry)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let base_dir = path.parent().map(Path::to_path_buf);
        self.register_yaml(&text, base_dir.as_deref())
            .map_err(|e| EvalError::Registry(format!("{}: {}", path.display(), e)))
    }

    /// Register the entries of one YAML document: a single mapping or a
    /// list of mappings. Entries without an `id` are ignored.
    pub fn register_yaml(&mut self, text: &str, base_dir: Option<&Path>) -> Result<()> {
        let payload: Value = serde_yaml::from_str(text)?;
        self.register_value(payload, base_dir)
    }

    fn register_value(&mut self, payload: Value, base_dir: Option<&Path>) -> Result<()> {
        let entry = match payload {
            Value::Sequence(items) => {
                for item in items {
                    if item.is_mapping() {
                        self.register_value(item, base_dir)?;
                    }
                }
                return Ok(());
            }
            Value::Mapping(entry) => entry,
            _ => return Ok(()),
        };
        if !entry.contains_key("id") {
            return Ok(());
        }

        let entry_type = entry.get("type").and_then(Value::as_str).map(str::to_string);
        let has_benchmarks = entry.contains_key("benchmarks");
        let value = Value::Mapping(entry);
        match entry_type.as_deref() {
            Some("benchmark") => {
                let mut spec: BenchmarkSpec = serde_yaml::from_value(value)?;
                spec.base_dir = base_dir.map(Path::to_path_buf);
                self.benchmarks.insert(spec.id.clone(), spec);
            }
            Some("model") => {
                let spec: ModelSpec = serde_yaml::from_value(value)?;
                self.models.insert(spec.id.clone(), spec);
            }
            Some("benchmark_set") => self.insert_set(serde_yaml::from_value(value)?),
            _ if has_benchmarks => self.insert_set(serde_yaml::from_value(value)?),
            _ => {}
        }
        Ok(())
    }

    fn insert_set(&mut self, spec: BenchmarkSetSpec) {
        self.benchmark_sets.insert(spec.id.clone(), spec);
    }

    pub fn benchmarks(&self) -> impl Iterator<Item = &BenchmarkSpec> {
        self.benchmarks.values()
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn benchmark_sets(&self) -> impl Iterator<Item = &BenchmarkSetSpec> {
        self.benchmark_sets.values()
    }

    pub fn factory(&self) -> &ModelFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut ModelFactory {
        &mut self.factory
    }

    pub fn benchmark(&self, id: &str) -> Result<&BenchmarkSpec> {
        self.benchmarks
            .get(id)
            .ok_or_else(|| EvalError::Registry(format!("Unknown benchmark '{}'", id)))
    }

    pub fn model(&self, id: &str) -> Result<&ModelSpec> {
        self.models
            .get(id)
            .ok_or_else(|| EvalError::Registry(format!("Unknown model '{}'", id)))
    }

    pub fn benchmark_set(&self, id: &str) -> Result<&BenchmarkSetSpec> {
        self.benchmark_sets
            .get(id)
            .ok_or_else(|| EvalError::Registry(format!("Unknown benchmark set '{}'", id)))
    }

    /// Construct a fresh instance of a registered model
    pub fn build_model(&self, id: &str) -> Result<Box<dyn Model>> {
        let spec = self.model(id)?;
        self.factory.build(&spec.kind, &spec.args)
    }

    /// Load the data of a registered benchmark
    pub fn load_benchmark(&self, id: &str) -> Result<Benchmark> {
        load_source(self.benchmark(id)?)
    }
}

fn collect_yaml_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    let (dirs, files): (Vec<_>, Vec<_>) = entries.into_iter().partition(|p| p.is_dir());
    out.extend(
        files
            .into_iter()
            .filter(|p| p.extension().map_or(false, |ext| ext == "yaml")),
    );
    for sub in dirs {
        collect_yaml_files(&sub, out)?;
    }
    Ok(())
}

fn resolve_path(spec: &BenchmarkSpec, path: PathBuf) -> PathBuf {
    match &spec.base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}

/// Instantiate the loader named by `spec.source` and load its data
pub fn load_source(spec: &BenchmarkSpec) -> Result<Benchmark> {
    let expected = match spec.source.as_str() {
        "csv_series" => BenchmarkKind::TimeSeries,
        "jsonl_scenarios" | "synthetic_scenarios" => BenchmarkKind::Scenario,
        other => {
            return Err(EvalError::Registry(format!(
                "Unknown source '{}' for benchmark '{}'",
                other, spec.id
            )))
        }
    };
    if expected != spec.kind {
        return Err(EvalError::Registry(format!(
            "Source '{}' does not produce {:?} data (benchmark '{}')",
            spec.source, spec.kind, spec.id
        )));
    }

    let benchmark = match spec.source.as_str() {
        "csv_series" => {
            let mut loader: CsvSeriesLoader = parse_args(&spec.source, &spec.args)?;
            loader.path = resolve_path(spec, loader.path);
            Benchmark::TimeSeries(loader.load()?)
        }
        "jsonl_scenarios" => {
            let mut loader: JsonlScenarioLoader = parse_args(&spec.source, &spec.args)?;
            loader.path = resolve_path(spec, loader.path);
            Benchmark::Scenario(loader.load()?)
        }
        _ => Benchmark::Scenario(SyntheticScenarioLoader.load()),
    };
    Ok(benchmark)
}

/// Walk-forward config for a benchmark. Scenario benchmarks have none.
/// `overrides` win over the spec's `backtest` section.
pub fn build_backtest_config(
    spec: &BenchmarkSpec,
    overrides: &ConfigOverrides,
) -> Result<Option<WalkForwardConfig>> {
    if spec.kind == BenchmarkKind::Scenario {
        return Ok(None);
    }
    let merged = spec.backtest.clone().unwrap_or_default().merge(overrides);
    let config = merged.into_config()?;
    config.validate()?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_kind_is_a_registry_error() {
        let factory = ModelFactory::default();
        let err = factory.build("prophet", &Args::new()).unwrap_err();
        assert!(matches!(err, EvalError::Registry(_)));
    }

    #[test]
    fn entries_without_id_are_ignored() {
        let mut registry = Registry::new();
        registry
            .register_yaml("- type: model\n  kind: last_value\n- 42\n", None)
            .unwrap();
        assert_eq!(registry.models().count(), 0);
    }
}
