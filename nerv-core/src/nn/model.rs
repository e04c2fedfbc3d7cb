use std::sync::Arc;

use log::debug;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::NervError;
use crate::nn::losses::Loss;
use crate::nn::net::Net;
use crate::nn::parameter::{Gradient, Layout, ParamStore};
use crate::nn::variant::Variant;

/// The parameters of every variant, laid out in one contiguous buffer.
///
/// `weight(name)` and `bias(name)` (see [`ParamStore`]) are views into that
/// buffer, so every vertex instance of a variant, in every net, reads the
/// same memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelState", into = "ModelState")]
pub struct Model {
    variants: Vec<Arc<Variant>>,
    layout: Arc<Layout>,
    params: Vec<f64>,
}

/// What gets serialised: the variant configurations and the raw buffer.
/// The layout is a function of the variants and is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct ModelState {
    variants: Vec<Variant>,
    params: Vec<f64>,
}

impl From<Model> for ModelState {
    fn from(model: Model) -> Self {
        ModelState {
            variants: model.variants.iter().map(|v| v.as_ref().clone()).collect(),
            params: model.params,
        }
    }
}

impl TryFrom<ModelState> for Model {
    type Error = NervError;

    fn try_from(state: ModelState) -> Result<Self, Self::Error> {
        for variant in &state.variants {
            variant.check_consistency()?;
        }
        let variants: Vec<Arc<Variant>> = state.variants.into_iter().map(Arc::new).collect();
        let layout = Layout::new(&variants)?;
        if layout.size() != state.params.len() {
            return Err(NervError::DimensionMismatch {
                expected: layout.size(),
                actual: state.params.len(),
            });
        }
        Ok(Model {
            variants,
            layout: Arc::new(layout),
            params: state.params,
        })
    }
}

impl Model {
    /// Lays out and initialises the parameters of `variants`, seeded from the
    /// thread-local generator.
    pub fn new(variants: Vec<Arc<Variant>>) -> Result<Self, NervError> {
        Self::with_rng(variants, &mut rand::thread_rng())
    }

    /// Like [`Model::new`] with an explicit generator.
    ///
    /// Weights are filled by each variant's initialiser in variant order;
    /// biases start at zero.
    pub fn with_rng<R: Rng + ?Sized>(
        variants: Vec<Arc<Variant>>,
        rng: &mut R,
    ) -> Result<Self, NervError> {
        let layout = Layout::new(&variants)?;
        let mut params = vec![0.0; layout.size()];
        for variant in &variants {
            let range = layout.region(variant.name())?.weight.clone();
            variant.init_weights(&mut params[range], rng);
        }
        debug!(
            "Model: {} variants, {} parameters",
            variants.len(),
            layout.size()
        );
        Ok(Model {
            variants,
            layout: Arc::new(layout),
            params,
        })
    }

    /// A zeroed buffer with the same layout as the parameters.
    pub fn gradient(&self) -> Gradient {
        Gradient::zeros(Arc::clone(&self.layout))
    }

    /// Sets every parameter to zero.
    pub fn clear(&mut self) {
        self.params.iter_mut().for_each(|p| *p = 0.0);
    }

    pub fn variants(&self) -> &[Arc<Variant>] {
        &self.variants
    }

    pub fn variant(&self, name: &str) -> Result<&Arc<Variant>, NervError> {
        self.variants
            .iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| NervError::UnknownVariant(name.to_string()))
    }

    pub fn shared_layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn forward(&self, net: &mut Net, loss: Option<&mut Loss>) -> Result<(), NervError> {
        net.forward(self, loss)
    }

    pub fn backward(&self, net: &mut Net) -> Result<Gradient, NervError> {
        net.backward(self)
    }

    /// Runs every net forward and sums their losses.
    pub fn loss(&self, nets: &mut [Net], normalise: bool) -> Result<Loss, NervError> {
        let mut loss = Loss::new();
        for net in nets.iter_mut() {
            net.forward(self, Some(&mut loss))?;
        }
        if normalise {
            loss.normalise(nets.len())?;
        }
        Ok(loss)
    }

    /// Runs every net forward and backward, adding into `loss` and `gradient`.
    pub fn accumulate(
        &self,
        nets: &mut [Net],
        loss: &mut Loss,
        gradient: &mut Gradient,
    ) -> Result<(), NervError> {
        for net in nets.iter_mut() {
            net.forward(self, Some(&mut *loss))?;
            net.backward_into(self, gradient)?;
        }
        Ok(())
    }

    /// Loss and gradient over a batch, optionally divided by the batch size.
    pub fn loss_and_gradient(
        &self,
        nets: &mut [Net],
        normalise: bool,
    ) -> Result<(Loss, Gradient), NervError> {
        let mut loss = Loss::new();
        let mut gradient = self.gradient();
        self.accumulate(nets, &mut loss, &mut gradient)?;
        if normalise {
            normalise_batch(&mut loss, &mut gradient, nets.len())?;
        }
        Ok((loss, gradient))
    }

    /// [`Model::loss_and_gradient`] spread over the rayon pool.
    ///
    /// Each task accumulates into its own loss and gradient; the partial
    /// results are summed once all tasks are done.
    pub fn par_loss_and_gradient(
        &self,
        nets: &mut [Net],
        normalise: bool,
    ) -> Result<(Loss, Gradient), NervError> {
        let count = nets.len();
        let (mut loss, mut gradient) = nets
            .par_iter_mut()
            .try_fold(
                || (Loss::new(), self.gradient()),
                |(mut loss, mut gradient), net| {
                    net.forward(self, Some(&mut loss))?;
                    net.backward_into(self, &mut gradient)?;
                    Ok::<_, NervError>((loss, gradient))
                },
            )
            .try_reduce(
                || (Loss::new(), self.gradient()),
                |(mut loss, mut gradient), (other_loss, other_gradient)| {
                    loss.merge(&other_loss);
                    gradient.merge(&other_gradient)?;
                    Ok((loss, gradient))
                },
            )?;
        debug!("Model: parallel accumulation over {} nets", count);
        if normalise {
            normalise_batch(&mut loss, &mut gradient, count)?;
        }
        Ok((loss, gradient))
    }

    pub fn to_json(&self) -> Result<String, NervError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restores a model saved with [`Model::to_json`], keyed-source slice
    /// tables included.
    pub fn from_json(json: &str) -> Result<Self, NervError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn normalise_batch(loss: &mut Loss, gradient: &mut Gradient, count: usize) -> Result<(), NervError> {
    loss.normalise(count)?;
    gradient.scale(1.0 / count as f64);
    Ok(())
}

impl ParamStore for Model {
    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn params(&self) -> &[f64] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [f64] {
        &mut self.params
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
