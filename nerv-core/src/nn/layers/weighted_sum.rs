use crate::maths::{add_assign, matvec, matvec_transposed, outer_add, tanh_inplace};
use crate::nn::layers::local_gradient;

/// `tanh(W · input + b)` for a `fan_out x input.len()` matrix.
pub(crate) fn forward(weights: &[f64], bias: &[f64], fan_out: usize, input: &[f64]) -> Vec<f64> {
    let mut activations = matvec(weights, fan_out, input.len(), input);
    add_assign(&mut activations, bias);
    tanh_inplace(&mut activations);
    activations
}

/// Accumulates the weight and bias gradient and returns the message
/// `Wᵗ · local` for the concatenated parents.
pub(crate) fn backward(
    weights: &[f64],
    activations: &[f64],
    input: &[f64],
    incoming: &[f64],
    grad_weights: &mut [f64],
    grad_bias: &mut [f64],
) -> Vec<f64> {
    let local = local_gradient(activations, incoming);
    outer_add(grad_weights, &local, input, 1.0);
    add_assign(grad_bias, &local);
    matvec_transposed(weights, activations.len(), input.len(), &local)
}
