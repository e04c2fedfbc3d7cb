use log::debug;

use crate::error::NervError;
use crate::nn::model::Model;
use crate::nn::parameter::ParamStore;
use crate::optim::optimizer_state::OptimizerState;

/// A flat vector of values an optimizer can update in place.
pub trait Parameters {
    fn values(&self) -> &[f64];
    fn values_mut(&mut self) -> &mut [f64];
}

impl Parameters for Vec<f64> {
    fn values(&self) -> &[f64] {
        self
    }

    fn values_mut(&mut self) -> &mut [f64] {
        self
    }
}

impl Parameters for Model {
    fn values(&self) -> &[f64] {
        self.params()
    }

    fn values_mut(&mut self) -> &mut [f64] {
        self.params_mut()
    }
}

/// A first-order update rule with its accumulated state.
///
/// The driver ([`crate::optim::Minimizer`]) calls [`Optimizer::prepare`],
/// evaluates the gradient at the resulting point, then calls
/// [`Optimizer::update`]. The parameter vector may grow between steps; new
/// components start with empty statistics.
pub trait Optimizer {
    fn name(&self) -> &'static str;

    /// Moves `params` to the point the gradient should be taken at.
    fn prepare(&mut self, _params: &mut [f64]) {}

    /// Undoes [`Optimizer::prepare`] when the gradient could not be computed.
    fn cancel(&mut self, _params: &mut [f64]) {}

    /// Applies one update using the gradient taken after [`Optimizer::prepare`].
    fn update(&mut self, params: &mut [f64], gradient: &[f64]) -> Result<(), NervError>;

    /// The running statistic (momentum, sum or mean of squares).
    fn accumulator(&self) -> &[f64];

    /// A copy of the state, enough to resume later.
    fn state(&self) -> OptimizerState;
}

pub(crate) fn check_gradient(params: &[f64], gradient: &[f64]) -> Result<(), NervError> {
    if params.len() != gradient.len() {
        return Err(NervError::GradientSizeMismatch {
            expected: params.len(),
            actual: gradient.len(),
        });
    }
    Ok(())
}

/// Resizes an accumulator to `len`, zero-filling new components.
pub(crate) fn fit_accumulator(name: &str, accumulator: &mut Vec<f64>, len: usize) {
    if accumulator.len() != len {
        debug!(
            "{}: resizing accumulator from {} to {} components",
            name,
            accumulator.len(),
            len
        );
        accumulator.resize(len, 0.0);
    }
}
