use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use log::debug;

use crate::error::NervError;
use crate::nn::variant::Variant;

/// The weight and bias sub-ranges of one variant inside a parameter buffer.
///
/// The bias range always starts where the weight range ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub weight: Range<usize>,
    pub bias: Range<usize>,
}

/// Where every variant's parameters live inside one contiguous buffer.
///
/// Shared between a model and all gradients derived from it, so the two can
/// be indexed identically.
#[derive(Debug, PartialEq, Eq)]
pub struct Layout {
    names: Vec<String>,
    regions: HashMap<String, Region>,
    size: usize,
}

impl Layout {
    /// Lays the variants out in the given order, weight then bias for each.
    pub fn new(variants: &[Arc<Variant>]) -> Result<Self, NervError> {
        let mut names = Vec::with_capacity(variants.len());
        let mut regions = HashMap::with_capacity(variants.len());
        let mut offset = 0;
        for variant in variants {
            let name = variant.name().to_string();
            if regions.contains_key(&name) {
                return Err(NervError::DuplicateVariant(name));
            }
            let weight = offset..offset + variant.weight_size();
            offset = weight.end;
            let bias = offset..offset + variant.bias_size();
            offset = bias.end;
            debug!(
                "Layout: variant '{}' ({}) weight {:?} bias {:?}",
                name,
                variant.kind_name(),
                weight,
                bias
            );
            names.push(name.clone());
            regions.insert(name, Region { weight, bias });
        }
        Ok(Layout {
            names,
            regions,
            size: offset,
        })
    }

    pub fn region(&self, name: &str) -> Result<&Region, NervError> {
        self.regions
            .get(name)
            .ok_or_else(|| NervError::UnknownVariant(name.to_string()))
    }

    /// Variant names in layout order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Total number of parameters.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Named weight/bias views over a flat parameter buffer.
///
/// Views borrow the buffer; they never copy it.
pub trait ParamStore {
    fn layout(&self) -> &Layout;
    fn params(&self) -> &[f64];
    fn params_mut(&mut self) -> &mut [f64];

    fn weight(&self, name: &str) -> Result<&[f64], NervError> {
        let range = self.layout().region(name)?.weight.clone();
        Ok(&self.params()[range])
    }

    fn bias(&self, name: &str) -> Result<&[f64], NervError> {
        let range = self.layout().region(name)?.bias.clone();
        Ok(&self.params()[range])
    }

    fn weight_mut(&mut self, name: &str) -> Result<&mut [f64], NervError> {
        let range = self.layout().region(name)?.weight.clone();
        Ok(&mut self.params_mut()[range])
    }

    fn bias_mut(&mut self, name: &str) -> Result<&mut [f64], NervError> {
        let range = self.layout().region(name)?.bias.clone();
        Ok(&mut self.params_mut()[range])
    }

    /// Both views of one variant at once.
    fn weight_and_bias_mut(&mut self, name: &str) -> Result<(&mut [f64], &mut [f64]), NervError> {
        let region = self.layout().region(name)?.clone();
        let split = region.weight.len();
        let both = &mut self.params_mut()[region.weight.start..region.bias.end];
        Ok(both.split_at_mut(split))
    }
}

/// A zero-initialised buffer with the same layout as a model's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    layout: Arc<Layout>,
    params: Vec<f64>,
}

impl Gradient {
    pub(crate) fn zeros(layout: Arc<Layout>) -> Self {
        let params = vec![0.0; layout.size()];
        Gradient { layout, params }
    }

    pub fn shared_layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Resets every component to zero, keeping the allocation.
    pub fn zero(&mut self) {
        self.params.iter_mut().for_each(|g| *g = 0.0);
    }

    /// Adds `other` into `self`. Both must share a layout.
    pub fn merge(&mut self, other: &Gradient) -> Result<(), NervError> {
        if !Arc::ptr_eq(&self.layout, &other.layout) && self.layout != other.layout {
            return Err(NervError::LayoutMismatch);
        }
        for (g, o) in self.params.iter_mut().zip(&other.params) {
            *g += o;
        }
        Ok(())
    }

    pub fn scale(&mut self, factor: f64) {
        self.params.iter_mut().for_each(|g| *g *= factor);
    }

    /// Euclidean norm of the whole buffer.
    pub fn norm(&self) -> f64 {
        self.params.iter().map(|g| g * g).sum::<f64>().sqrt()
    }

    pub fn into_params(self) -> Vec<f64> {
        self.params
    }
}

impl ParamStore for Gradient {
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
#[path = "parameter_test.rs"]
mod tests;
