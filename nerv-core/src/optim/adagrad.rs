use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::NervError;
use crate::optim::optimizer_state::OptimizerState;
use crate::optim::optimizer_trait::{check_gradient, fit_accumulator, Optimizer};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdagradHyperParams {
    pub lr: f64,
    pub eps: f64,
}

impl Default for AdagradHyperParams {
    fn default() -> Self {
        AdagradHyperParams { lr: 0.1, eps: 1e-3 }
    }
}

impl AdagradHyperParams {
    pub fn validate(&self) -> Result<(), NervError> {
        if !(self.lr >= 0.0) {
            return Err(NervError::InvalidHyperParameter(format!(
                "learning rate must be non-negative, got {}",
                self.lr
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

/// Diagonal AdaGrad (Duchi et al., 2011).
///
/// `s ← s + g²`, then `x ← x − lr·g / (√s + eps)`.
#[derive(Debug, Clone)]
pub struct AdagradOptimizer {
    hyper_params: AdagradHyperParams,
    sum_grad_square: Vec<f64>,
}

impl AdagradOptimizer {
    pub fn new(hyper_params: AdagradHyperParams) -> Result<Self, NervError> {
        Self::with_state(hyper_params, Vec::new())
    }

    /// Resumes from a previously returned sum of squared gradients.
    pub fn with_state(
        hyper_params: AdagradHyperParams,
        sum_grad_square: Vec<f64>,
    ) -> Result<Self, NervError> {
        hyper_params.validate()?;
        if sum_grad_square.iter().any(|&s| s < 0.0) {
            return Err(NervError::InvalidHyperParameter(
                "accumulated squares cannot be negative".to_string(),
            ));
        }
        Ok(AdagradOptimizer {
            hyper_params,
            sum_grad_square,
        })
    }

    pub fn hyper_params(&self) -> &AdagradHyperParams {
        &self.hyper_params
    }
}

impl Optimizer for AdagradOptimizer {
    fn name(&self) -> &'static str {
        "AdagradOptimizer"
    }

    fn update(&mut self, params: &mut [f64], gradient: &[f64]) -> Result<(), NervError> {
        check_gradient(params, gradient)?;
        fit_accumulator(self.name(), &mut self.sum_grad_square, params.len());
        let AdagradHyperParams { lr, eps } = self.hyper_params;
        for ((x, s), g) in params
            .iter_mut()
            .zip(self.sum_grad_square.iter_mut())
            .zip(gradient)
        {
            *s += g * g;
            *x -= lr * g / (s.sqrt() + eps);
        }
        debug!("AdagradOptimizer: updated {} parameters", params.len());
        Ok(())
    }

    fn accumulator(&self) -> &[f64] {
        &self.sum_grad_square
    }

    fn state(&self) -> OptimizerState {
        OptimizerState::Adagrad {
            sum_grad_square: self.sum_grad_square.clone(),
        }
    }
}

#[cfg(test)]
#[path = "adagrad_test.rs"]
mod tests;
