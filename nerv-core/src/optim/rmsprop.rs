use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::NervError;
use crate::optim::optimizer_state::OptimizerState;
use crate::optim::optimizer_trait::{check_gradient, fit_accumulator, Optimizer};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RmsPropHyperParams {
    pub lr: f64,
    /// Weight of the newest squared gradient in the moving average.
    pub decay_rate: f64,
    pub eps: f64,
}

impl Default for RmsPropHyperParams {
    fn default() -> Self {
        RmsPropHyperParams {
            lr: 0.001,
            decay_rate: 0.1,
            eps: 1e-7,
        }
    }
}

impl RmsPropHyperParams {
    pub fn validate(&self) -> Result<(), NervError> {
        if !(self.lr >= 0.0) {
            return Err(NervError::InvalidHyperParameter(format!(
                "learning rate must be non-negative, got {}",
                self.lr
            )));
        }
        if !(0.0..=1.0).contains(&self.decay_rate) {
            return Err(NervError::InvalidHyperParameter(format!(
                "decay rate must be in [0, 1], got {}",
                self.decay_rate
            )));
        }
        if !(self.eps > 0.0) {
            return Err(NervError::InvalidHyperParameter(format!(
                "epsilon must be positive, got {}",
                self.eps
            )));
        }
        Ok(())
    }
}

/// RMSProp (Tieleman and Hinton, 2012).
///
/// `ms ← (1 − d)·ms + d·g²`, then `x ← x − lr·g / (√ms + eps)`.
#[derive(Debug, Clone)]
pub struct RmsPropOptimizer {
    hyper_params: RmsPropHyperParams,
    mean_square: Vec<f64>,
}

impl RmsPropOptimizer {
    pub fn new(hyper_params: RmsPropHyperParams) -> Result<Self, NervError> {
        Self::with_state(hyper_params, Vec::new())
    }

    /// Resumes from a previously returned mean square.
    pub fn with_state(
        hyper_params: RmsPropHyperParams,
        mean_square: Vec<f64>,
    ) -> Result<Self, NervError> {
        hyper_params.validate()?;
        if mean_square.iter().any(|&s| s < 0.0) {
            return Err(NervError::InvalidHyperParameter(
                "mean squares cannot be negative".to_string(),
            ));
        }
        Ok(RmsPropOptimizer {
            hyper_params,
            mean_square,
        })
    }

    pub fn hyper_params(&self) -> &RmsPropHyperParams {
        &self.hyper_params
    }
}

impl Optimizer for RmsPropOptimizer {
    fn name(&self) -> &'static str {
        "RmsPropOptimizer"
    }

    fn update(&mut self, params: &mut [f64], gradient: &[f64]) -> Result<(), NervError> {
        check_gradient(params, gradient)?;
        fit_accumulator(self.name(), &mut self.mean_square, params.len());
        let RmsPropHyperParams {
            lr,
            decay_rate,
            eps,
        } = self.hyper_params;
        for ((x, ms), g) in params
            .iter_mut()
            .zip(self.mean_square.iter_mut())
            .zip(gradient)
        {
            *ms = (1.0 - decay_rate) * *ms + decay_rate * g * g;
            *x -= lr * g / (ms.sqrt() + eps);
        }
        debug!("RmsPropOptimizer: updated {} parameters", params.len());
        Ok(())
    }

    fn accumulator(&self) -> &[f64] {
        &self.mean_square
    }

    fn state(&self) -> OptimizerState {
        OptimizerState::RmsProp {
            mean_square: self.mean_square.clone(),
        }
    }
}

#[cfg(test)]
#[path = "rmsprop_test.rs"]
mod tests;
