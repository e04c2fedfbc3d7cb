use crate::error::NervError;
use crate::maths::{add_assign, matvec, matvec_transposed, outer_add, tanh_inplace};
use crate::nn::layers::local_gradient;
use crate::nn::variant::Variant;

/// Lays the parents out one after another, each of which must have exactly
/// `fan_in` elements.
pub(crate) fn stack(variant: &Variant, parents: &[&[f64]]) -> Result<Vec<f64>, NervError> {
    if parents.is_empty() {
        return Err(NervError::MissingParents {
            variant: variant.name().to_string(),
        });
    }
    if let Some(bad) = parents.iter().find(|p| p.len() != variant.fan_in()) {
        return Err(NervError::FanInMismatch {
            variant: variant.name().to_string(),
            expected: variant.fan_in(),
            actual: bad.len(),
        });
    }
    Ok(parents.concat())
}

/// `tanh(mean_i(W · x_i) + b)` over the stacked columns `x_i` of `input`.
pub(crate) fn forward(weights: &[f64], bias: &[f64], dim: usize, input: &[f64]) -> Vec<f64> {
    if dim == 0 {
        return Vec::new();
    }
    let columns = input.chunks(dim);
    let n = columns.len() as f64;
    let mut activations = vec![0.0; dim];
    for column in columns {
        add_assign(&mut activations, &matvec(weights, dim, dim, column));
    }
    for (a, b) in activations.iter_mut().zip(bias) {
        *a = *a / n + b;
    }
    tanh_inplace(&mut activations);
    activations
}

/// Accumulates `(1/n) Σ_i local ⊗ x_i` into the weight gradient and returns
/// `(1/n) Wᵗ · local`, the message shared by all `n` parents.
pub(crate) fn backward(
    weights: &[f64],
    activations: &[f64],
    input: &[f64],
    incoming: &[f64],
    grad_weights: &mut [f64],
    grad_bias: &mut [f64],
) -> Vec<f64> {
    let dim = activations.len();
    if dim == 0 {
        return Vec::new();
    }
    let columns = input.chunks(dim);
    let scale = 1.0 / columns.len() as f64;
    let local = local_gradient(activations, incoming);
    for column in columns {
        outer_add(grad_weights, &local, column, scale);
    }
    add_assign(grad_bias, &local);
    let mut message = matvec_transposed(weights, dim, dim, &local);
    message.iter_mut().for_each(|m| *m *= scale);
    message
}
