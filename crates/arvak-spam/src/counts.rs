//! Outcome counts keyed by measured bit pattern.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Measurement outcome counts.
///
/// Keys are bit-pattern strings (`"0110"`), one character per measured bit.
/// Values are occurrence counts; corrected counts may be fractional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts {
    counts: BTreeMap<String, f64>,
}

impl Counts {
    /// Create an empty set of counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: f64) {
        *self.counts.entry(bitstring.into()).or_insert(0.0) += count;
    }

    /// Count recorded for `bitstring`, if any.
    pub fn get(&self, bitstring: &str) -> Option<f64> {
        self.counts.get(bitstring).copied()
    }

    /// Iterate over `(bitstring, count)` in lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether there are no outcomes.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> f64 {
        self.counts.values().sum()
    }

    /// Outcomes sorted by descending count.
    pub fn sorted(&self) -> Vec<(&str, f64)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        sorted
    }

    /// Counts divided by their total.
    pub fn probabilities(&self) -> BTreeMap<String, f64> {
        let total = self.total();
        self.counts
            .iter()
            .map(|(k, &v)| (k.clone(), if total > 0.0 { v / total } else { 0.0 }))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (bitstring, count) in iter {
            counts.insert(bitstring, count);
        }
        counts
    }
}

impl<S: Into<String>, const N: usize> From<[(S, f64); N]> for Counts {
    fn from(pairs: [(S, f64); N]) -> Self {
        pairs.into_iter().collect()
    }
}
