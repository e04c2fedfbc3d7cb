//! Numeric helpers shared by the vertex variants and the checker.
//!
//! Matrices are stored row-major in flat slices: element `(r, c)` of a
//! `rows x cols` matrix lives at `r * cols + c`.

use num_traits::Float;

/// Square root of the machine epsilon, the default finite-difference step.
pub const EPSILON: f64 = 1.490_116_119_384_765_6e-8;

/// Numerically stabilised softmax, computed in place.
///
/// The maximum is subtracted before exponentiating, so the result is invariant
/// to shifting every input by the same constant.
pub fn softmax<T: Float>(x: &mut [T]) {
    if x.is_empty() {
        return;
    }
    let max = x.iter().fold(T::neg_infinity(), |acc, &v| acc.max(v));
    let mut sum = T::zero();
    for v in x.iter_mut() {
        *v = (*v - max).exp();
        sum = sum + *v;
    }
    for v in x.iter_mut() {
        *v = *v / sum;
    }
}

/// Applies `tanh` element-wise, in place.
pub fn tanh_inplace<T: Float>(x: &mut [T]) {
    for v in x.iter_mut() {
        *v = v.tanh();
    }
}

/// Derivative of `tanh` expressed through its output: `1 - a^2`.
pub fn tanh_prime<T: Float>(activations: &[T]) -> Vec<T> {
    activations.iter().map(|&a| T::one() - a * a).collect()
}

/// Cross-entropy `-sum(target * log(predictions))`.
///
/// Predictions must be strictly positive where the target is non-zero.
pub fn cross_entropy<T: Float>(predictions: &[T], target: &[T]) -> T {
    predictions
        .iter()
        .zip(target)
        .filter(|(_, &t)| t != T::zero())
        .fold(T::zero(), |acc, (&p, &t)| acc - t * p.ln())
}

/// Half the sum of squared errors.
pub fn sum_squared<T: Float>(predictions: &[T], target: &[T]) -> T {
    let half = T::one() / (T::one() + T::one());
    let sum = predictions
        .iter()
        .zip(target)
        .fold(T::zero(), |acc, (&p, &t)| acc + (t - p) * (t - p));
    half * sum
}

/// `W · x` for a `rows x cols` matrix.
pub fn matvec(w: &[f64], rows: usize, cols: usize, x: &[f64]) -> Vec<f64> {
    debug_assert_eq!(w.len(), rows * cols);
    debug_assert_eq!(x.len(), cols);
    (0..rows)
        .map(|r| {
            w[r * cols..(r + 1) * cols]
                .iter()
                .zip(x)
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// `Wᵗ · y` for a `rows x cols` matrix, without materialising the transpose.
pub fn matvec_transposed(w: &[f64], rows: usize, cols: usize, y: &[f64]) -> Vec<f64> {
    debug_assert_eq!(w.len(), rows * cols);
    debug_assert_eq!(y.len(), rows);
    let mut out = vec![0.0; cols];
    for (r, &yr) in y.iter().enumerate() {
        if yr == 0.0 {
            continue;
        }
        for (o, &wv) in out.iter_mut().zip(&w[r * cols..(r + 1) * cols]) {
            *o += wv * yr;
        }
    }
    out
}

/// Accumulates `scale * (a ⊗ b)` into the `a.len() x b.len()` matrix `target`.
pub fn outer_add(target: &mut [f64], a: &[f64], b: &[f64], scale: f64) {
    let cols = b.len();
    debug_assert_eq!(target.len(), a.len() * cols);
    for (r, &ar) in a.iter().enumerate() {
        let factor = scale * ar;
        for (t, &bc) in target[r * cols..(r + 1) * cols].iter_mut().zip(b) {
            *t += factor * bc;
        }
    }
}

/// `target += source`, element-wise.
pub fn add_assign(target: &mut [f64], source: &[f64]) {
    debug_assert_eq!(target.len(), source.len());
    for (t, s) in target.iter_mut().zip(source) {
        *t += s;
    }
}

/// Compensated (Neumaier) summation.
pub fn fsum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut sum = 0.0_f64;
    let mut compensation = 0.0_f64;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

#[cfg(test)]
#[path = "maths_test.rs"]
mod tests;
