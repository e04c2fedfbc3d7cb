use crate::maths::{self, add_assign, matvec, matvec_transposed, outer_add};

/// `softmax(W · input + b)`.
pub(crate) fn forward(weights: &[f64], bias: &[f64], fan_out: usize, input: &[f64]) -> Vec<f64> {
    let mut activations = matvec(weights, fan_out, input.len(), input);
    add_assign(&mut activations, bias);
    maths::softmax(&mut activations);
    activations
}

/// Accumulates the gradient of the cross-entropy loss and returns `Wᵗ · error`.
///
/// `activations - target` is the gradient of the composed softmax and
/// cross-entropy only when the target sums to one.
pub(crate) fn backward(
    weights: &[f64],
    activations: &[f64],
    input: &[f64],
    target: &[f64],
    grad_weights: &mut [f64],
    grad_bias: &mut [f64],
) -> Vec<f64> {
    let error: Vec<f64> = activations.iter().zip(target).map(|(a, t)| a - t).collect();
    outer_add(grad_weights, &error, input, 1.0);
    add_assign(grad_bias, &error);
    matvec_transposed(weights, activations.len(), input.len(), &error)
}
