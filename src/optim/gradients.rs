use std::collections::HashMap;

use crate::weights::arena::WeightId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientEntry {
    pub weight: WeightId,
    pub sum: f64,
}

/// Raw gradients of one layer, summed per distinct weight.
///
/// A convolution kernel weight shows up once per output position; all of those
/// contributions land in the same entry and the optimiser applies them once.
#[derive(Debug, Clone, Default)]
pub struct Gradients {
    entries: Vec<GradientEntry>,
    index: HashMap<WeightId, usize>,
}

impl Gradients {
    pub fn new() -> Gradients {
        Gradients::default()
    }

    pub fn add(&mut self, weight: WeightId, amount: f64) {
        match self.index.get(&weight) {
            Some(&i) => self.entries[i].sum += amount,
            None => {
                self.index.insert(weight, self.entries.len());
                self.entries.push(GradientEntry { weight, sum: amount });
            }
        }
    }

    pub fn get(&self, weight: WeightId) -> Option<f64> {
        self.index.get(&weight).map(|&i| self.entries[i].sum)
    }

    /// Entries in first-occurrence order.
    pub fn entries(&self) -> &[GradientEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
