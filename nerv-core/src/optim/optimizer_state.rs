use serde::{Deserialize, Serialize};

/// Snapshot of an optimizer's accumulated statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptimizerState {
    /// Momentum vector of plain or Nesterov SGD.
    Sgd { momentum: Vec<f64> },
    /// Per-component sum of squared gradients.
    Adagrad { sum_grad_square: Vec<f64> },
    /// Per-component moving average of squared gradients.
    RmsProp { mean_square: Vec<f64> },
}

impl OptimizerState {
    pub fn accumulator(&self) -> &[f64] {
        match self {
            OptimizerState::Sgd { momentum } => momentum,
            OptimizerState::Adagrad { sum_grad_square } => sum_grad_square,
            OptimizerState::RmsProp { mean_square } => mean_square,
        }
    }
}
