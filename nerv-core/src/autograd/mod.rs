// src/autograd/mod.rs
// Numerical verification of the backpropagated gradients.

pub mod grad_check;

pub use grad_check::{check_gradients, GradCheckConfig, GradCheckReport, Mismatch};
