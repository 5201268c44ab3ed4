//! Gaussian random walk baseline producing sample paths

use crate::error::{EvalError, Result};
use crate::models::{difference_std_dev, ForecastRequest, ForecastResult, Model, Samples};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Random walk from the last observation with Gaussian steps.
///
/// The step size is the standard deviation of the history's first
/// differences, taken from the last `fit` when there was one. The point
/// forecast is the per-step mean of the sampled paths. The generator is
/// reseeded on `reset`, so a run is reproducible for a fixed seed.
#[derive(Debug, Clone)]
pub struct RandomWalkModel {
    name: String,
    num_samples: usize,
    seed: u64,
    rng: StdRng,
    /// Step size from the last fit
    sigma: Option<f64>,
}

impl RandomWalkModel {
    pub fn new(num_samples: usize, seed: u64) -> Result<Self> {
        if num_samples == 0 {
            return Err(EvalError::InvalidParameter(
                "Random walk needs at least one sample path".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Random Walk (samples={})", num_samples),
            num_samples,
            seed,
            rng: StdRng::seed_from_u64(seed),
            sigma: None,
        })
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }
}

impl Model for RandomWalkModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) -> Result<()> {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.sigma = None;
        Ok(())
    }

    fn fit(&mut self, request: &ForecastRequest) -> Result<()> {
        self.sigma = Some(difference_std_dev(&request.history));
        Ok(())
    }

    fn predict(&mut self, request: &ForecastRequest) -> Result<ForecastResult> {
        let start = request
            .last_value()
            .ok_or_else(|| EvalError::Model("Random walk needs a history".to_string()))?;
        let sigma = self
            .sigma
            .unwrap_or_else(|| difference_std_dev(&request.history));
        let step = Normal::new(0.0, sigma)
            .map_err(|e| EvalError::Model(format!("Invalid step distribution: {}", e)))?;

        let mut paths = Vec::with_capacity(self.num_samples);
        for _ in 0..self.num_samples {
            let mut level = start;
            let path: Vec<f64> = (0..request.horizon)
                .map(|_| {
                    level += step.sample(&mut self.rng);
                    level
                })
                .collect();
            paths.push(path);
        }

        let point_forecast = (0..request.horizon)
            .map(|h| paths.iter().map(|p| p[h]).sum::<f64>() / self.num_samples as f64)
            .collect();

        Ok(ForecastResult::point(point_forecast).with_samples(Samples::Paths(paths)))
    }
}
