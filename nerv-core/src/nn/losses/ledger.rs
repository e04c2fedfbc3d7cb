use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::NervError;
use crate::maths::fsum;

/// Accumulated loss per variant name.
///
/// Missing names read as zero. Entries iterate in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loss {
    entries: BTreeMap<String, f64>,
}

impl Loss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, value: f64) {
        *self.entries.entry(name.to_string()).or_insert(0.0) += value;
    }

    pub fn get(&self, name: &str) -> f64 {
        self.entries.get(name).copied().unwrap_or(0.0)
    }

    /// Divides every entry by the number of examples that contributed.
    pub fn normalise(&mut self, examples: usize) -> Result<(), NervError> {
        if examples == 0 {
            return Err(NervError::EmptyBatch);
        }
        let n = examples as f64;
        self.entries.values_mut().for_each(|v| *v /= n);
        Ok(())
    }

    /// Sum over all entries, using compensated summation.
    pub fn total(&self) -> f64 {
        fsum(self.entries.values().copied())
    }

    /// Adds every entry of `other` into `self`.
    pub fn merge(&mut self, other: &Loss) {
        for (name, value) in &other.entries {
            self.add(name, *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
