use std::sync::Arc;

use crate::error::NervError;
use crate::maths::cross_entropy;
use crate::nn::layers::{self, average, keyed, softmax, source, weighted_sum};
use crate::nn::model::Model;
use crate::nn::parameter::{Gradient, ParamStore};
use crate::nn::variant::{Variant, VariantKind};

/// Result of evaluating a vertex against its parents, applied afterwards so
/// parents can be read while the vertex itself is still borrowed.
#[derive(Debug)]
pub(crate) struct Evaluation {
    activations: Vec<f64>,
    input: Vec<f64>,
    loss: Option<f64>,
}

impl Evaluation {
    pub(crate) fn loss(&self) -> Option<f64> {
        self.loss
    }
}

/// One node of a net: per-example state around a shared variant.
///
/// Instances never own parameters. Everything they read or write lives in the
/// model (or the gradient) under the variant's name.
#[derive(Debug, Clone)]
pub struct Vertex {
    variant: Arc<Variant>,
    key: Option<String>,
    target: Option<Vec<f64>>,
    activations: Vec<f64>,
    input: Vec<f64>,
    message: Vec<f64>,
}

fn expect_kind(
    variant: &Variant,
    operation: &'static str,
    accept: fn(&VariantKind) -> bool,
) -> Result<(), NervError> {
    if accept(variant.kind()) {
        Ok(())
    } else {
        Err(NervError::VariantMismatch {
            variant: variant.name().to_string(),
            kind: variant.kind_name(),
            operation,
        })
    }
}

/// The variant's weight and bias views, checked against its declared sizes.
fn params_of<'m, S: ParamStore>(
    store: &'m S,
    variant: &Variant,
) -> Result<(&'m [f64], &'m [f64]), NervError> {
    let weight = store.weight(variant.name())?;
    let bias = store.bias(variant.name())?;
    if weight.len() != variant.weight_size() || bias.len() != variant.bias_size() {
        return Err(NervError::LayoutMismatch);
    }
    Ok((weight, bias))
}

fn grads_of<'g>(
    gradient: &'g mut Gradient,
    variant: &Variant,
) -> Result<(&'g mut [f64], &'g mut [f64]), NervError> {
    let (weight, bias) = gradient.weight_and_bias_mut(variant.name())?;
    if weight.len() != variant.weight_size() || bias.len() != variant.bias_size() {
        return Err(NervError::LayoutMismatch);
    }
    Ok((weight, bias))
}

impl Vertex {
    fn with_variant(variant: &Arc<Variant>) -> Self {
        Vertex {
            variant: Arc::clone(variant),
            key: None,
            target: None,
            activations: Vec::new(),
            input: Vec::new(),
            message: Vec::new(),
        }
    }

    /// A fixed source holding `activations`.
    pub fn fixed(variant: &Arc<Variant>, activations: Vec<f64>) -> Result<Self, NervError> {
        expect_kind(variant, "a fixed source", |k| {
            matches!(k, VariantKind::FixedSource)
        })?;
        source::check_activations(variant, &activations)?;
        let mut vertex = Self::with_variant(variant);
        vertex.activations = activations;
        Ok(vertex)
    }

    /// A keyed source reading the slot of `key`, or the fallback slot for
    /// unknown keys.
    pub fn keyed(variant: &Arc<Variant>, key: impl Into<String>) -> Result<Self, NervError> {
        expect_kind(variant, "a keyed source", |k| {
            matches!(k, VariantKind::KeyedSource { .. })
        })?;
        let mut vertex = Self::with_variant(variant);
        vertex.key = Some(key.into());
        Ok(vertex)
    }

    /// A weighted-sum or averaging composition.
    pub fn composition(variant: &Arc<Variant>) -> Result<Self, NervError> {
        expect_kind(variant, "a composition", |k| {
            matches!(
                k,
                VariantKind::WeightedSum { .. } | VariantKind::Average { .. }
            )
        })?;
        Ok(Self::with_variant(variant))
    }

    /// A softmax classifier, optionally supervised by `target`.
    pub fn classifier(variant: &Arc<Variant>, target: Option<Vec<f64>>) -> Result<Self, NervError> {
        expect_kind(variant, "a classifier", |k| matches!(k, VariantKind::Softmax))?;
        let mut vertex = Self::with_variant(variant);
        vertex.set_target(target)?;
        Ok(vertex)
    }

    pub fn variant(&self) -> &Arc<Variant> {
        &self.variant
    }

    pub fn name(&self) -> &str {
        self.variant.name()
    }

    pub fn fan_out(&self) -> usize {
        self.variant.fan_out()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn target(&self) -> Option<&[f64]> {
        self.target.as_deref()
    }

    /// Output of the last forward pass (or the constant of a fixed source).
    pub fn activations(&self) -> &[f64] {
        &self.activations
    }

    /// Input cached by the last forward pass.
    pub fn input(&self) -> &[f64] {
        &self.input
    }

    /// Message to the parents computed by the last backward pass.
    pub fn message(&self) -> &[f64] {
        &self.message
    }

    /// Replaces the supervision signal of a classifier.
    pub fn set_target(&mut self, target: Option<Vec<f64>>) -> Result<(), NervError> {
        expect_kind(&self.variant, "a target", |k| matches!(k, VariantKind::Softmax))?;
        if let Some(t) = &target {
            if t.len() != self.variant.fan_out() {
                return Err(NervError::InvalidTarget {
                    variant: self.variant.name().to_string(),
                    expected: self.variant.fan_out(),
                    actual: t.len(),
                });
            }
        }
        self.target = target;
        Ok(())
    }

    /// Replaces the constant of a fixed source.
    pub fn set_activations(&mut self, activations: Vec<f64>) -> Result<(), NervError> {
        expect_kind(&self.variant, "constant activations", |k| {
            matches!(k, VariantKind::FixedSource)
        })?;
        source::check_activations(&self.variant, &activations)?;
        self.activations = activations;
        Ok(())
    }

    /// Computes the new state from the parents' activations, in parent order.
    /// Returns `None` when the state does not change.
    pub(crate) fn evaluate(
        &self,
        parents: &[&[f64]],
        model: &Model,
    ) -> Result<Option<Evaluation>, NervError> {
        let variant = &*self.variant;
        let fan_out = variant.fan_out();
        let evaluation = match variant.kind() {
            VariantKind::FixedSource => return Ok(None),
            VariantKind::KeyedSource { table, .. } => {
                let (weights, _) = params_of(model, variant)?;
                let key = self.key.as_deref().unwrap_or_else(|| table.fallback());
                Evaluation {
                    activations: keyed::forward(table, fan_out, key, weights),
                    input: Vec::new(),
                    loss: None,
                }
            }
            VariantKind::WeightedSum { .. } => {
                let input = layers::concat(variant, parents)?;
                let (weights, bias) = params_of(model, variant)?;
                Evaluation {
                    activations: weighted_sum::forward(weights, bias, fan_out, &input),
                    input,
                    loss: None,
                }
            }
            VariantKind::Average { .. } => {
                let input = average::stack(variant, parents)?;
                let (weights, bias) = params_of(model, variant)?;
                Evaluation {
                    activations: average::forward(weights, bias, fan_out, &input),
                    input,
                    loss: None,
                }
            }
            VariantKind::Softmax => {
                let input = layers::concat(variant, parents)?;
                let (weights, bias) = params_of(model, variant)?;
                let activations = softmax::forward(weights, bias, fan_out, &input);
                let loss = self
                    .target
                    .as_deref()
                    .map(|target| cross_entropy(&activations, target));
                Evaluation {
                    activations,
                    input,
                    loss,
                }
            }
        };
        Ok(Some(evaluation))
    }

    /// Fails unless a forward pass left activations and input of the sizes
    /// the variant declares.
    fn check_forward_state(&self) -> Result<(), NervError> {
        let fan_in = self.variant.fan_in();
        let input_ok = match self.variant.kind() {
            VariantKind::Average { .. } => {
                fan_in == 0 || (!self.input.is_empty() && self.input.len() % fan_in == 0)
            }
            _ => self.input.len() == fan_in,
        };
        if self.activations.len() != self.variant.fan_out() || !input_ok {
            return Err(NervError::MissingForward {
                variant: self.variant.name().to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn apply(&mut self, evaluation: Evaluation) {
        self.activations = evaluation.activations;
        self.input = evaluation.input;
    }

    /// Accumulates this vertex's parameter gradient and sets its message.
    ///
    /// `incoming` is the sum of what the children sent, `None` if the vertex
    /// has no children.
    pub(crate) fn backward(
        &mut self,
        incoming: Option<&[f64]>,
        model: &Model,
        gradient: &mut Gradient,
    ) -> Result<(), NervError> {
        let variant = Arc::clone(&self.variant);
        match variant.kind() {
            VariantKind::FixedSource => {}
            VariantKind::KeyedSource { table, .. } => {
                if let Some(incoming) = incoming {
                    let key = self.key.as_deref().unwrap_or_else(|| table.fallback());
                    let (grad_weights, _) = grads_of(gradient, &variant)?;
                    keyed::backward(table, variant.fan_out(), key, incoming, grad_weights);
                }
            }
            VariantKind::WeightedSum { .. } => {
                self.message = match incoming {
                    None => vec![0.0; variant.fan_in()],
                    Some(incoming) => {
                        self.check_forward_state()?;
                        let (weights, _) = params_of(model, &variant)?;
                        let (grad_weights, grad_bias) = grads_of(gradient, &variant)?;
                        weighted_sum::backward(
                            weights,
                            &self.activations,
                            &self.input,
                            incoming,
                            grad_weights,
                            grad_bias,
                        )
                    }
                };
            }
            VariantKind::Average { .. } => {
                self.message = match incoming {
                    None => vec![0.0; variant.fan_in()],
                    Some(incoming) => {
                        self.check_forward_state()?;
                        let (weights, _) = params_of(model, &variant)?;
                        let (grad_weights, grad_bias) = grads_of(gradient, &variant)?;
                        average::backward(
                            weights,
                            &self.activations,
                            &self.input,
                            incoming,
                            grad_weights,
                            grad_bias,
                        )
                    }
                };
            }
            VariantKind::Softmax => {
                self.message = match &self.target {
                    None => vec![0.0; variant.fan_in()],
                    Some(target) => {
                        self.check_forward_state()?;
                        let (weights, _) = params_of(model, &variant)?;
                        let (grad_weights, grad_bias) = grads_of(gradient, &variant)?;
                        softmax::backward(
                            weights,
                            &self.activations,
                            &self.input,
                            target,
                            grad_weights,
                            grad_bias,
                        )
                    }
                };
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "vertex_test.rs"]
mod tests;
