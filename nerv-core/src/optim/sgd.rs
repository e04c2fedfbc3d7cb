use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::NervError;
use crate::optim::optimizer_state::OptimizerState;
use crate::optim::optimizer_trait::{check_gradient, fit_accumulator, Optimizer};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SgdHyperParams {
    pub lr: f64,
    pub momentum: f64,
    /// Take the gradient at the look-ahead point `x + momentum * m`.
    pub nesterov: bool,
}

impl Default for SgdHyperParams {
    fn default() -> Self {
        SgdHyperParams {
            lr: 0.01,
            momentum: 0.5,
            nesterov: false,
        }
    }
}

impl SgdHyperParams {
    pub fn nesterov() -> Self {
        SgdHyperParams {
            nesterov: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), NervError> {
        if !(self.lr >= 0.0) {
            return Err(NervError::InvalidHyperParameter(format!(
                "learning rate must be non-negative, got {}",
                self.lr
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(NervError::InvalidHyperParameter(format!(
                "momentum must be in [0, 1), got {}",
                self.momentum
            )));
        }
        Ok(())
    }
}

/// Stochastic gradient descent with momentum (Polyak, 1964), or Nesterov's
/// accelerated gradient in the momentum formulation of Sutskever et al. (2013).
///
/// `m ← μ·m − lr·∇f(x)` (or `∇f(x + μ·m)` with Nesterov), then `x ← x + m`.
#[derive(Debug, Clone)]
pub struct SgdOptimizer {
    hyper_params: SgdHyperParams,
    momentum: Vec<f64>,
}

impl SgdOptimizer {
    pub fn new(hyper_params: SgdHyperParams) -> Result<Self, NervError> {
        Self::with_state(hyper_params, Vec::new())
    }

    /// Resumes from a previously returned momentum vector.
    pub fn with_state(hyper_params: SgdHyperParams, momentum: Vec<f64>) -> Result<Self, NervError> {
        hyper_params.validate()?;
        Ok(SgdOptimizer {
            hyper_params,
            momentum,
        })
    }

    pub fn hyper_params(&self) -> &SgdHyperParams {
        &self.hyper_params
    }

    fn shift(&mut self, params: &mut [f64], sign: f64) {
        fit_accumulator(self.name(), &mut self.momentum, params.len());
        let mu = self.hyper_params.momentum * sign;
        for (x, m) in params.iter_mut().zip(&self.momentum) {
            *x += mu * m;
        }
    }
}

impl Optimizer for SgdOptimizer {
    fn name(&self) -> &'static str {
        if self.hyper_params.nesterov {
            "NesterovOptimizer"
        } else {
            "SgdOptimizer"
        }
    }

    fn prepare(&mut self, params: &mut [f64]) {
        if self.hyper_params.nesterov {
            self.shift(params, 1.0);
        }
    }

    fn cancel(&mut self, params: &mut [f64]) {
        if self.hyper_params.nesterov {
            self.shift(params, -1.0);
        }
    }

    fn update(&mut self, params: &mut [f64], gradient: &[f64]) -> Result<(), NervError> {
        check_gradient(params, gradient)?;
        fit_accumulator(self.name(), &mut self.momentum, params.len());
        let SgdHyperParams {
            lr,
            momentum: mu,
            nesterov,
        } = self.hyper_params;
        for ((x, m), g) in params.iter_mut().zip(self.momentum.iter_mut()).zip(gradient) {
            let previous = *m;
            *m = mu * previous - lr * g;
            if nesterov {
                // `x` already sits at the look-ahead point.
                *x += *m - mu * previous;
            } else {
                *x += *m;
            }
        }
        debug!("{}: updated {} parameters", self.name(), params.len());
        Ok(())
    }

    fn accumulator(&self) -> &[f64] {
        &self.momentum
    }

    fn state(&self) -> OptimizerState {
        OptimizerState::Sgd {
            momentum: self.momentum.clone(),
        }
    }
}

#[cfg(test)]
#[path = "sgd_test.rs"]
mod tests;
