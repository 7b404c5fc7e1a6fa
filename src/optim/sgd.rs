use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::network::layer::LayerId;
use crate::optim::gradients::Gradients;
use crate::optim::momentum::Momentum;
use crate::weights::arena::WeightArena;

/// How the learning rate evolves between backward passes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LearningRateSchedule {
    #[default]
    Constant,
    /// `rate = max(rate × factor, floor)` after every pass.
    Decay { factor: f64, floor: f64 },
}

impl LearningRateSchedule {
    pub fn next(&self, rate: f64) -> f64 {
        match *self {
            LearningRateSchedule::Constant => rate,
            LearningRateSchedule::Decay { factor, floor } => (rate * factor).max(floor),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
    pub schedule: LearningRateSchedule,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate, schedule: LearningRateSchedule::Constant }
    }

    pub fn with_schedule(learning_rate: f64, schedule: LearningRateSchedule) -> Sgd {
        Sgd { learning_rate, schedule }
    }

    /// Applies one layer's accumulated gradients, once per distinct weight:
    /// `change = -rate × gradient; w += change`, then with momentum
    /// `w += μ × v; v = change + μ × v`.
    pub fn step(
        &self,
        weights: &mut WeightArena,
        layer: LayerId,
        gradients: &Gradients,
        mut momentum: Option<&mut Momentum>,
    ) -> Result<()> {
        for entry in gradients.entries() {
            let change = -self.learning_rate * entry.sum;
            let carried = match momentum.as_deref_mut() {
                Some(m) => {
                    let slot = m.owner(layer, entry.weight)?;
                    Some(m.apply_momentum(layer, slot, change)?)
                }
                None => None,
            };
            let value = weights.get_mut(entry.weight)?;
            *value += change;
            if let Some(carried) = carried {
                *value += carried;
            }
        }
        Ok(())
    }

    /// Advances the learning rate along the schedule.
    pub fn decay(&mut self) {
        self.learning_rate = self.schedule.next(self.learning_rate);
    }
}
