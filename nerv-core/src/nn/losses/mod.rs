// src/nn/losses/mod.rs
// Loss bookkeeping and the loss functions used by classifier vertices.

pub mod ledger;

pub use crate::maths::{cross_entropy, sum_squared};
pub use ledger::Loss;
