use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NervError;
use crate::nn::init::{init_layer, CompositionInit};

/// Maps lookup keys to slots of a keyed source's shared weight region.
///
/// Keys absent from the table resolve to the fallback key's slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SliceTableRepr")]
pub struct SliceTable {
    slots: BTreeMap<String, usize>,
    fallback: String,
}

impl SliceTable {
    /// Builds a table assigning consecutive slots in iteration order.
    /// Repeated keys keep their first slot.
    pub fn new<I, K>(keys: I, fallback: &str) -> Result<Self, NervError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut slots = BTreeMap::new();
        for key in keys {
            let next = slots.len();
            slots.entry(key.into()).or_insert(next);
        }
        if !slots.contains_key(fallback) {
            return Err(NervError::MissingFallbackKey {
                fallback: fallback.to_string(),
            });
        }
        Ok(SliceTable {
            slots,
            fallback: fallback.to_string(),
        })
    }

    /// Slot of `key`, or of the fallback key if `key` is unknown.
    pub fn slot(&self, key: &str) -> usize {
        match self.slots.get(key) {
            Some(&slot) => slot,
            // Construction guarantees the fallback is present.
            None => self.slots.get(&self.fallback).copied().unwrap_or(0),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Keys ordered by slot.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<(&str, usize)> =
            self.slots.iter().map(|(k, &s)| (k.as_str(), s)).collect();
        keys.sort_by_key(|&(_, s)| s);
        keys.into_iter().map(|(k, _)| k).collect()
    }
}

#[derive(Deserialize)]
struct SliceTableRepr {
    slots: BTreeMap<String, usize>,
    fallback: String,
}

impl TryFrom<SliceTableRepr> for SliceTable {
    type Error = NervError;

    fn try_from(repr: SliceTableRepr) -> Result<Self, Self::Error> {
        let mut seen = vec![false; repr.slots.len()];
        for (key, &slot) in &repr.slots {
            match seen.get_mut(slot) {
                Some(taken) if !*taken => *taken = true,
                _ => {
                    return Err(NervError::Serialization(format!(
                        "slot {} of key '{}' is repeated or outside 0..{}",
                        slot,
                        key,
                        repr.slots.len()
                    )))
                }
            }
        }
        if !repr.slots.contains_key(&repr.fallback) {
            return Err(NervError::MissingFallbackKey {
                fallback: repr.fallback,
            });
        }
        Ok(SliceTable {
            slots: repr.slots,
            fallback: repr.fallback,
        })
    }
}

/// The closed set of vertex variants and their variant-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariantKind {
    /// Emits a constant activation vector; owns no parameters.
    FixedSource,
    /// Looks up its activation in a shared, slot-partitioned weight region.
    KeyedSource {
        table: SliceTable,
        /// Initial representations, `table.len() * fan_out` values laid out by slot.
        initial: Vec<f64>,
    },
    /// `tanh(W · [x_1; ...; x_n] + b)` over a fixed number of inputs.
    WeightedSum {
        num_inputs: usize,
        init: CompositionInit,
    },
    /// `tanh(mean_i(W · x_i) + b)` over any number of same-sized inputs.
    Average { init: CompositionInit },
    /// Affine transform followed by a softmax, with optional cross-entropy loss.
    Softmax,
}

/// A vertex variant: the unit of parameter tying.
///
/// Every instance built from the same variant reads and writes the weight and
/// bias regions registered under `name` in the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    name: String,
    fan_in: usize,
    fan_out: usize,
    kind: VariantKind,
}

impl Variant {
    /// A source emitting constant `dims`-sized vectors.
    pub fn fixed_source(name: impl Into<String>, dims: usize) -> Arc<Variant> {
        Arc::new(Variant {
            name: name.into(),
            fan_in: 0,
            fan_out: dims,
            kind: VariantKind::FixedSource,
        })
    }

    /// A source whose `dims`-sized activation is selected by key.
    ///
    /// `dictionary` supplies the keys in slot order together with their initial
    /// representations. Fails if `fallback` is not one of the keys.
    pub fn keyed_source<I, K>(
        name: impl Into<String>,
        dims: usize,
        dictionary: I,
        fallback: &str,
    ) -> Result<Arc<Variant>, NervError>
    where
        I: IntoIterator<Item = (K, Vec<f64>)>,
        K: Into<String>,
    {
        let entries: Vec<(String, Vec<f64>)> = dictionary
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        let table = SliceTable::new(entries.iter().map(|(k, _)| k.clone()), fallback)?;

        let mut initial = vec![0.0; table.len() * dims];
        for (key, repr) in &entries {
            if repr.len() != dims {
                return Err(NervError::RepresentationSizeMismatch {
                    key: key.clone(),
                    expected: dims,
                    actual: repr.len(),
                });
            }
            let start = table.slot(key) * dims;
            initial[start..start + dims].copy_from_slice(repr);
        }

        Ok(Arc::new(Variant {
            name: name.into(),
            fan_in: 0,
            fan_out: dims,
            kind: VariantKind::KeyedSource { table, initial },
        }))
    }

    /// Composes exactly `num_inputs` parents of size `dim` into one of size `dim`.
    pub fn weighted_sum(
        name: impl Into<String>,
        dim: usize,
        num_inputs: usize,
        init: CompositionInit,
    ) -> Arc<Variant> {
        Arc::new(Variant {
            name: name.into(),
            fan_in: dim * num_inputs,
            fan_out: dim,
            kind: VariantKind::WeightedSum { num_inputs, init },
        })
    }

    /// Averages any number of size-`dim` parents through a shared matrix.
    pub fn average(name: impl Into<String>, dim: usize, init: CompositionInit) -> Arc<Variant> {
        Arc::new(Variant {
            name: name.into(),
            fan_in: dim,
            fan_out: dim,
            kind: VariantKind::Average { init },
        })
    }

    /// Classifies the concatenation of its parents (`fan_in` elements) into
    /// `fan_out` labels.
    pub fn softmax(name: impl Into<String>, fan_out: usize, fan_in: usize) -> Arc<Variant> {
        Arc::new(Variant {
            name: name.into(),
            fan_in,
            fan_out,
            kind: VariantKind::Softmax,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fan_in(&self) -> usize {
        self.fan_in
    }

    pub fn fan_out(&self) -> usize {
        self.fan_out
    }

    pub fn kind(&self) -> &VariantKind {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            VariantKind::FixedSource => "fixed-source",
            VariantKind::KeyedSource { .. } => "keyed-source",
            VariantKind::WeightedSum { .. } => "weighted-sum",
            VariantKind::Average { .. } => "average",
            VariantKind::Softmax => "softmax",
        }
    }

    /// The slice table of a keyed source.
    pub fn slice_table(&self) -> Option<&SliceTable> {
        match &self.kind {
            VariantKind::KeyedSource { table, .. } => Some(table),
            _ => None,
        }
    }

    pub fn weight_size(&self) -> usize {
        match &self.kind {
            VariantKind::FixedSource => 0,
            VariantKind::KeyedSource { table, .. } => table.len() * self.fan_out,
            VariantKind::WeightedSum { .. } | VariantKind::Average { .. } | VariantKind::Softmax => {
                self.fan_out * self.fan_in
            }
        }
    }

    pub fn bias_size(&self) -> usize {
        match &self.kind {
            VariantKind::FixedSource | VariantKind::KeyedSource { .. } => 0,
            _ => self.fan_out,
        }
    }

    /// Total number of parameters owned by the variant.
    pub fn size(&self) -> usize {
        self.weight_size() + self.bias_size()
    }

    /// Checks that the sizes of a variant built outside the factories, e.g.
    /// deserialised, agree with its kind.
    pub fn check_consistency(&self) -> Result<(), NervError> {
        let inconsistent = |reason: String| NervError::InconsistentVariant {
            variant: self.name.clone(),
            reason,
        };
        let expected_fan_in = match &self.kind {
            VariantKind::FixedSource => 0,
            VariantKind::KeyedSource { table, initial } => {
                if initial.len() != table.len() * self.fan_out {
                    return Err(inconsistent(format!(
                        "{} initial values for {} slots of size {}",
                        initial.len(),
                        table.len(),
                        self.fan_out
                    )));
                }
                0
            }
            VariantKind::WeightedSum { num_inputs, .. } => self.fan_out * num_inputs,
            VariantKind::Average { .. } => self.fan_out,
            VariantKind::Softmax => self.fan_in,
        };
        if self.fan_in != expected_fan_in {
            return Err(inconsistent(format!(
                "fan-in {} where {} is expected",
                self.fan_in, expected_fan_in
            )));
        }
        Ok(())
    }

    /// Whether a child of this variant lays its parents out side by side, so
    /// its message has to be split by parent position. Averaging children
    /// send the same message to every parent.
    pub fn concatenates_parents(&self) -> bool {
        matches!(
            self.kind,
            VariantKind::WeightedSum { .. } | VariantKind::Softmax
        )
    }

    /// Fills the variant's weight region with its initial values.
    pub fn init_weights<R: Rng + ?Sized>(&self, weights: &mut [f64], rng: &mut R) {
        match &self.kind {
            VariantKind::FixedSource => {}
            VariantKind::KeyedSource { initial, .. } => weights.copy_from_slice(initial),
            VariantKind::WeightedSum { num_inputs, init } => {
                init.fill(weights, self.fan_out, *num_inputs, rng)
            }
            VariantKind::Average { init } => init.fill(weights, self.fan_out, 1, rng),
            VariantKind::Softmax => init_layer(weights, self.fan_out, self.fan_in, false, rng),
        }
    }
}

#[cfg(test)]
#[path = "variant_test.rs"]
mod tests;
