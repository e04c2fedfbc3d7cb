use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::NervError;

/// How the weight matrix of a composition variant is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositionInit {
    /// Block identity plus small Gaussian noise, see [`block_identity_matrix`].
    #[default]
    BlockIdentity,
    /// Diagonal decaying with the distance to each input, see [`gradual_matrix`].
    Gradual,
    /// Plain Glorot uniform initialisation, see [`init_layer`].
    Glorot,
}

impl CompositionInit {
    /// Fills the `dim x (num_inputs * dim)` matrix `weights` according to the policy.
    pub fn fill<R: Rng + ?Sized>(
        &self,
        weights: &mut [f64],
        dim: usize,
        num_inputs: usize,
        rng: &mut R,
    ) {
        match self {
            CompositionInit::BlockIdentity => {
                weights.copy_from_slice(&block_identity_matrix(dim, num_inputs, rng))
            }
            CompositionInit::Gradual => {
                weights.copy_from_slice(&gradual_matrix(dim, num_inputs, rng))
            }
            CompositionInit::Glorot => init_layer(weights, dim, dim * num_inputs, false, rng),
        }
    }
}

/// Normalised initialisation range of Glorot and Bengio (2010).
///
/// Units followed by a sigmoid get a range four times as wide.
pub fn init_range(fan_out: usize, fan_in: usize, sigmoid: bool) -> (f64, f64) {
    let upper = (6.0 / (fan_in + fan_out) as f64).sqrt() * if sigmoid { 4.0 } else { 1.0 };
    (-upper, upper)
}

/// Fills `weights` uniformly within [`init_range`].
pub fn init_layer<R: Rng + ?Sized>(
    weights: &mut [f64],
    fan_out: usize,
    fan_in: usize,
    sigmoid: bool,
    rng: &mut R,
) {
    let (_, upper) = init_range(fan_out, fan_in, sigmoid);
    for w in weights.iter_mut() {
        *w = rng.gen::<f64>() * upper * 2.0 - upper;
    }
}

fn noise_matrix<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Vec<f64> {
    (0..rows * cols)
        .map(|_| {
            let v: f64 = StandardNormal.sample(rng);
            v / 100.0
        })
        .collect()
}

/// Block identity matrices with N(0, 0.01²) noise, as in "Parsing with
/// Compositional Vector Grammars" by Socher et al. (2013).
///
/// The result is `dim x (num_inputs * dim)`, row-major; each of the
/// `num_inputs` square blocks carries `1 / num_inputs` on its diagonal.
pub fn block_identity_matrix<R: Rng + ?Sized>(
    dim: usize,
    num_inputs: usize,
    rng: &mut R,
) -> Vec<f64> {
    let cols = dim * num_inputs;
    let mut mtrx = noise_matrix(dim, cols, rng);
    if dim == 0 {
        return mtrx;
    }
    for c in 0..cols {
        mtrx[(c % dim) * cols + c] += 1.0 / num_inputs as f64;
    }
    mtrx
}

/// Like [`block_identity_matrix`], but the diagonal shrinks as the input
/// position grows: blocks `2k` and `2k + 1` carry `1 / (2k + 2)`.
///
/// The diagonal weights do not sum to one across the blocks; callers that
/// need a convex combination should use [`CompositionInit::BlockIdentity`].
pub fn gradual_matrix<R: Rng + ?Sized>(dim: usize, num_inputs: usize, rng: &mut R) -> Vec<f64> {
    let cols = dim * num_inputs;
    let mut mtrx = noise_matrix(dim, cols, rng);
    if dim == 0 {
        return mtrx;
    }
    for c in 0..cols {
        let factor = c / (2 * dim) * 2 + 2;
        mtrx[(c % dim) * cols + c] += 1.0 / factor as f64;
    }
    mtrx
}

/// A vector drawn uniformly from `[lower, upper)`.
pub fn random_uniform<R: Rng + ?Sized>(
    dims: usize,
    lower: f64,
    upper: f64,
    rng: &mut R,
) -> Result<Vec<f64>, NervError> {
    if upper < lower {
        return Err(NervError::InvalidHyperParameter(format!(
            "uniform range is empty: lower {} > upper {}",
            lower, upper
        )));
    }
    let width = upper - lower;
    Ok((0..dims).map(|_| rng.gen::<f64>() * width + lower).collect())
}

/// A random vector of unit euclidean norm.
pub fn random_unitvec<R: Rng + ?Sized>(dims: usize, rng: &mut R) -> Vec<f64> {
    let mut vec: Vec<f64> = (0..dims).map(|_| StandardNormal.sample(rng)).collect();
    let norm = vec.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
    vec
}

/// A Gaussian representation; Socher et al. (2013) use mean 0 and sigma 0.1.
pub fn gaussian_repr<R: Rng + ?Sized>(
    dims: usize,
    mean: f64,
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<f64>, NervError> {
    if !(sigma >= 0.0) || !sigma.is_finite() {
        return Err(NervError::InvalidHyperParameter(format!(
            "gaussian sigma must be finite and non-negative, got {}",
            sigma
        )));
    }
    let normal = Normal::new(mean, sigma)
        .map_err(|e| NervError::InvalidHyperParameter(format!("gaussian sigma {}: {}", sigma, e)))?;
    Ok((0..dims).map(|_| normal.sample(rng)).collect())
}

/// A one-hot column vector with `1.0` at `index`.
pub fn onehot(dims: usize, index: usize) -> Result<Vec<f64>, NervError> {
    if index >= dims {
        return Err(NervError::DimensionMismatch {
            expected: dims,
            actual: index + 1,
        });
    }
    let mut vec = vec![0.0; dims];
    vec[index] = 1.0;
    Ok(vec)
}

/// Hands out distinct one-hot representations until the dimensionality is
/// exhausted.
#[derive(Debug, Clone)]
pub struct OneHotReprs {
    dims: usize,
    hot: f64,
    cold: f64,
    next: usize,
}

impl OneHotReprs {
    pub fn new(dims: usize) -> Self {
        Self::with_values(dims, 1.0, 0.0)
    }

    pub fn with_values(dims: usize, hot: f64, cold: f64) -> Self {
        OneHotReprs {
            dims,
            hot,
            cold,
            next: 0,
        }
    }

    /// The next unused representation.
    pub fn next_repr(&mut self) -> Result<Vec<f64>, NervError> {
        if self.next >= self.dims {
            return Err(NervError::DimensionMismatch {
                expected: self.dims,
                actual: self.next + 1,
            });
        }
        let hot = self.next;
        self.next += 1;
        Ok((0..self.dims)
            .map(|i| if i == hot { self.hot } else { self.cold })
            .collect())
    }
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
