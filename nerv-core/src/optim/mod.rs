//! First-order optimizers.
//!
//! Each optimizer is a stateful update rule behind the [`Optimizer`] trait.
//! [`Minimizer`] drives one over a parameter container and an objective as a
//! lazy, infinite sequence of steps.

pub mod adagrad;
pub mod minimizer;
pub mod objective;
pub mod optimizer_state;
pub mod optimizer_trait;
pub mod rmsprop;
pub mod sgd;

pub use adagrad::{AdagradHyperParams, AdagradOptimizer};
pub use minimizer::{Minimizer, Step};
pub use objective::Evaluation;
pub use optimizer_state::OptimizerState;
pub use optimizer_trait::{Optimizer, Parameters};
pub use rmsprop::{RmsPropHyperParams, RmsPropOptimizer};
pub use sgd::{SgdHyperParams, SgdOptimizer};
