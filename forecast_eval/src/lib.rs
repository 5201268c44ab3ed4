//! # Forecast Eval
//!
//! A harness for evaluating time-series forecasting models.
//!
//! ## Features
//!
//! - Walk-forward backtesting over a single series with a configurable
//!   retrain cadence
//! - Scenario evaluation of probabilistic forecasts with RCRPS
//! - Forecast contract checks and normalization of samples or quantiles
//!   into per-step scoring sets
//! - Append-only JSONL event logs plus `results.json` / `results.md`
//! - A YAML registry of benchmarks, models and benchmark sets
//! - Prompt rendering and JSON reply parsing for text-driven forecasters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forecast_eval::config::WalkForwardConfig;
//! use forecast_eval::loaders::CsvSeriesLoader;
//! use forecast_eval::models::LastValueModel;
//! use forecast_eval::record::NullRecorder;
//! use forecast_eval::WalkForwardBacktester;
//!
//! let dataset = CsvSeriesLoader::new("series.csv").load()?;
//! let config = WalkForwardConfig::new(2).with_min_train_size(5);
//! let mut model = LastValueModel::new();
//!
//! let results = WalkForwardBacktester::new().run(&dataset, &mut model, &config, &NullRecorder)?;
//! for result in &results {
//!     println!("{}: MAE {:.3}", result.sample_id, result.metrics.mae);
//! }
//! # Ok::<(), forecast_eval::EvalError>(())
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod loaders;
pub mod models;
pub mod prompts;
pub mod record;
pub mod registry;
pub mod runner;
pub mod scenario;
pub mod validation;

// Re-export commonly used types
pub use crate::backtest::{BacktestResult, WalkForwardBacktester};
pub use crate::config::{ConfigOverrides, WalkForwardConfig};
pub use crate::data::{ScenarioSample, TimeSeriesDataset, TimeSeriesPoint, WalkForwardWindow};
pub use crate::error::{EvalError, Result};
pub use crate::models::{ForecastRequest, ForecastResult, Model, Samples};
pub use crate::prompts::{parse_forecast_response, ChatMessage, ForecastPrompt};
pub use crate::record::{JsonlRecorder, MemoryRecorder, NullRecorder, Recorder};
pub use crate::registry::Registry;
pub use crate::runner::{RunOutput, Runner};
pub use crate::scenario::{ScenarioEvaluator, ScenarioResult};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
