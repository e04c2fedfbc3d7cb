// src/nn/layers/mod.rs
// Per-variant forward and backward transforms, dispatched from `Vertex`.

pub mod average;
pub mod keyed;
pub mod softmax;
pub mod source;
pub mod weighted_sum;

use crate::error::NervError;
use crate::nn::variant::Variant;

/// Concatenates parent activations in parent order, checking the total
/// against the variant's fan-in.
pub(crate) fn concat(variant: &Variant, parents: &[&[f64]]) -> Result<Vec<f64>, NervError> {
    let actual: usize = parents.iter().map(|p| p.len()).sum();
    if actual != variant.fan_in() {
        return Err(NervError::FanInMismatch {
            variant: variant.name().to_string(),
            expected: variant.fan_in(),
            actual,
        });
    }
    Ok(parents.concat())
}

/// `tanh'(activations) ⊙ incoming`.
pub(crate) fn local_gradient(activations: &[f64], incoming: &[f64]) -> Vec<f64> {
    crate::maths::tanh_prime(activations)
        .into_iter()
        .zip(incoming)
        .map(|(d, m)| d * m)
        .collect()
}
