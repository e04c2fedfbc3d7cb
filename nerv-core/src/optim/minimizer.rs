use std::marker::PhantomData;

use log::{debug, trace};

use crate::error::NervError;
use crate::optim::objective::Evaluation;
use crate::optim::optimizer_state::OptimizerState;
use crate::optim::optimizer_trait::{Optimizer, Parameters};

/// Outcome of one [`Minimizer::step`].
#[derive(Debug)]
pub struct Step<'a, P, L> {
    /// Number of completed steps, this one included.
    pub iteration: usize,
    /// The parameters after the update.
    pub params: &'a P,
    /// Loss at the point the gradient was taken.
    pub loss: L,
    /// The optimizer's running statistic after the update.
    pub accumulator: &'a [f64],
    state: OptimizerState,
}

impl<P, L> Step<'_, P, L> {
    pub fn state(&self) -> &OptimizerState {
        &self.state
    }
}

/// Pull-based driver applying an [`Optimizer`] to a parameter container.
///
/// Every call to [`Minimizer::step`] evaluates the objective once and updates
/// the parameters in place. There is no stopping criterion: the minimizer is
/// also an infinite [`Iterator`] of losses, and the caller decides when to
/// stop pulling.
pub struct Minimizer<P, O, F, L> {
    params: P,
    optimizer: O,
    objective: F,
    iteration: usize,
    _loss: PhantomData<fn() -> L>,
}

impl<P, O, F, L> Minimizer<P, O, F, L>
where
    P: Parameters,
    O: Optimizer,
    F: FnMut(&P) -> Evaluation<L>,
{
    pub fn new(params: P, optimizer: O, objective: F) -> Self {
        Minimizer {
            params,
            optimizer,
            objective,
            iteration: 0,
            _loss: PhantomData,
        }
    }

    /// Evaluates the objective and applies one update.
    ///
    /// If the objective or the update fails, the parameters are left where
    /// they were before the call.
    pub fn step(&mut self) -> Result<Step<'_, P, L>, NervError> {
        self.optimizer.prepare(self.params.values_mut());
        let (loss, gradient) = match (self.objective)(&self.params) {
            Ok(evaluation) => evaluation,
            Err(err) => {
                debug!("{}: objective failed, step cancelled", self.optimizer.name());
                self.optimizer.cancel(self.params.values_mut());
                return Err(err);
            }
        };
        if let Err(err) = self.optimizer.update(self.params.values_mut(), &gradient) {
            self.optimizer.cancel(self.params.values_mut());
            return Err(err);
        }
        self.iteration += 1;
        trace!("{}: step {}", self.optimizer.name(), self.iteration);
        Ok(Step {
            iteration: self.iteration,
            params: &self.params,
            loss,
            accumulator: self.optimizer.accumulator(),
            state: self.optimizer.state(),
        })
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    /// Mutable access between steps, e.g. to grow the parameter vector.
    pub fn params_mut(&mut self) -> &mut P {
        &mut self.params
    }

    pub fn into_params(self) -> P {
        self.params
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }
}

impl<P, O, F, L> Iterator for Minimizer<P, O, F, L>
where
    P: Parameters,
    O: Optimizer,
    F: FnMut(&P) -> Evaluation<L>,
{
    type Item = Result<L, NervError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.step().map(|step| step.loss))
    }
}

#[cfg(test)]
#[path = "minimizer_test.rs"]
mod tests;
