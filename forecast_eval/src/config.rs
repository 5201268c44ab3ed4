//! Walk-forward configuration and override merging

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

fn default_step() -> usize {
    1
}

fn default_min_train_size() -> usize {
    24
}

fn default_allow_retrain() -> bool {
    true
}

fn default_retrain_frequency() -> usize {
    1
}

/// Parameters of a walk-forward backtest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    /// Number of future steps each forecast must cover
    pub horizon: usize,
    /// How far the train cutoff advances between windows
    #[serde(default = "default_step")]
    pub step: usize,
    /// Train cutoff of the first window
    #[serde(default = "default_min_train_size")]
    pub min_train_size: usize,
    /// Keep only the most recent points of each history
    #[serde(default)]
    pub max_train_size: Option<usize>,
    /// When false the model is fitted once, on the first window
    #[serde(default = "default_allow_retrain")]
    pub allow_retrain: bool,
    /// Fit on every window whose index is a multiple of this value
    #[serde(default = "default_retrain_frequency")]
    pub retrain_frequency: usize,
    /// Stop after this many windows
    #[serde(default)]
    pub max_windows: Option<usize>,
}

impl WalkForwardConfig {
    /// Create a config with the given horizon and default everything else
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            step: default_step(),
            min_train_size: default_min_train_size(),
            max_train_size: None,
            allow_retrain: default_allow_retrain(),
            retrain_frequency: default_retrain_frequency(),
            max_windows: None,
        }
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    pub fn with_min_train_size(mut self, min_train_size: usize) -> Self {
        self.min_train_size = min_train_size;
        self
    }

    pub fn with_max_train_size(mut self, max_train_size: usize) -> Self {
        self.max_train_size = Some(max_train_size);
        self
    }

    pub fn with_retrain(mut self, allow_retrain: bool, retrain_frequency: usize) -> Self {
        self.allow_retrain = allow_retrain;
        self.retrain_frequency = retrain_frequency;
        self
    }

    pub fn with_max_windows(mut self, max_windows: usize) -> Self {
        self.max_windows = Some(max_windows);
        self
    }

    /// Check the window generator preconditions
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(EvalError::InvalidParameter(
                "horizon must be at least 1".to_string(),
            ));
        }
        if self.step == 0 {
            return Err(EvalError::InvalidParameter(
                "step must be at least 1".to_string(),
            ));
        }
        if self.min_train_size == 0 {
            return Err(EvalError::InvalidParameter(
                "min_train_size must be at least 1".to_string(),
            ));
        }
        if self.max_train_size == Some(0) {
            return Err(EvalError::InvalidParameter(
                "max_train_size must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial walk-forward settings, as found in a benchmark's `backtest`
/// section or on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub horizon: Option<usize>,
    pub step: Option<usize>,
    pub min_train_size: Option<usize>,
    pub max_train_size: Option<usize>,
    pub allow_retrain: Option<bool>,
    pub retrain_frequency: Option<usize>,
    pub max_windows: Option<usize>,
}

impl ConfigOverrides {
    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(&self, other: &ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            horizon: other.horizon.or(self.horizon),
            step: other.step.or(self.step),
            min_train_size: other.min_train_size.or(self.min_train_size),
            max_train_size: other.max_train_size.or(self.max_train_size),
            allow_retrain: other.allow_retrain.or(self.allow_retrain),
            retrain_frequency: other.retrain_frequency.or(self.retrain_frequency),
            max_windows: other.max_windows.or(self.max_windows),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ConfigOverrides::default()
    }

    /// Build a full config.
    ///
    /// With no settings at all the horizon falls back to 1. Once any
    /// setting is given, `horizon` must be one of them.
    pub fn into_config(self) -> Result<WalkForwardConfig> {
        let horizon = match self.horizon {
            Some(horizon) => horizon,
            None if self.is_empty() => 1,
            None => {
                return Err(EvalError::InvalidParameter(
                    "backtest settings must include a horizon".to_string(),
                ))
            }
        };
        let base = WalkForwardConfig::new(horizon);
        Ok(WalkForwardConfig {
            step: self.step.unwrap_or(base.step),
            min_train_size: self.min_train_size.unwrap_or(base.min_train_size),
            max_train_size: self.max_train_size,
            allow_retrain: self.allow_retrain.unwrap_or(base.allow_retrain),
            retrain_frequency: self.retrain_frequency.unwrap_or(base.retrain_frequency),
            max_windows: self.max_windows,
            horizon,
        })
    }
}
