use crate::error::{NetworkError, Result};
use crate::network::layer::LayerId;
use crate::network::network::Network;
use crate::train::trainer::BackPropagator;
use crate::weights::arena::WeightArena;

/// Value of every input dimension except the selected one.
pub const LOW: f64 = 0.0;
/// Value of the selected input dimension.
pub const HIGH: f64 = 1.0;

impl Network {
    /// One negative-sampling step: a one-hot input at `input_index` trained
    /// towards 1 (`is_positive`) or 0 at `output_index`, and nowhere else.
    ///
    /// Because every other target is unset, only the chosen output node and the
    /// weights feeding it are touched, however wide the output layer is.
    pub fn negative_sample(
        &mut self,
        weights: &mut WeightArena,
        output: LayerId,
        input_index: usize,
        output_index: usize,
        learning_rate: f64,
        is_positive: bool,
    ) -> Result<()> {
        let inputs = self.one_hot(output, input_index)?;
        let targets = self.single_target(output, output_index, is_positive)?;
        self.backpropagate(weights, output, &inputs, &targets, learning_rate, None)
    }

    /// Forward result at `output_index` for a one-hot input at `input_index`.
    pub fn result(
        &mut self,
        weights: &WeightArena,
        output: LayerId,
        input_index: usize,
        output_index: usize,
    ) -> Result<f64> {
        let inputs = self.one_hot(output, input_index)?;
        let outputs = self.evaluate(weights, output, &inputs)?;
        outputs.get(output_index).copied().ok_or_else(|| NetworkError::IndexOutOfRange {
            layer: self.layers[output.index()].name().to_string(),
            index: output_index,
            width: outputs.len(),
        })
    }

    /// Input vector with `LOW` everywhere except `HIGH` at `index`. The output
    /// must depend on exactly one input layer (or several of one width).
    pub(crate) fn one_hot(&self, output: LayerId, index: usize) -> Result<Vec<f64>> {
        let inputs = self.input_layers(output)?;
        let first = inputs.first().ok_or_else(|| {
            NetworkError::InvalidLayer(format!("layer #{} does not depend on any input", output.index()))
        })?;
        let input = self.layer(*first)?;
        if index >= input.width() {
            return Err(NetworkError::IndexOutOfRange {
                layer: input.name().to_string(),
                index,
                width: input.width(),
            });
        }
        let mut values = vec![LOW; input.width()];
        values[index] = HIGH;
        Ok(values)
    }

    fn single_target(&self, output: LayerId, index: usize, is_positive: bool) -> Result<Vec<Option<f64>>> {
        let layer = self.layer(output)?;
        if index >= layer.width() {
            return Err(NetworkError::IndexOutOfRange {
                layer: layer.name().to_string(),
                index,
                width: layer.width(),
            });
        }
        let mut targets = vec![None; layer.width()];
        targets[index] = Some(if is_positive { 1.0 } else { 0.0 });
        Ok(targets)
    }
}

/// Negative sampling on top of a stateful `BackPropagator`, so the learning
/// rate schedule and momentum carry across samples.
#[derive(Debug, Clone)]
pub struct NegativeSampler {
    propagator: BackPropagator,
}

impl NegativeSampler {
    pub fn new(output: LayerId, learning_rate: f64) -> NegativeSampler {
        NegativeSampler { propagator: BackPropagator::new(output, learning_rate) }
    }

    pub fn from_propagator(propagator: BackPropagator) -> NegativeSampler {
        NegativeSampler { propagator }
    }

    pub fn propagator(&self) -> &BackPropagator {
        &self.propagator
    }

    pub fn sample(
        &mut self,
        network: &mut Network,
        weights: &mut WeightArena,
        input_index: usize,
        output_index: usize,
        is_positive: bool,
    ) -> Result<()> {
        self.sample_targets(network, weights, input_index, &[(output_index, is_positive)])
    }

    /// One masked pass with a positive target at `positive` and negative
    /// targets at every index of `negatives`. A negative that coincides with
    /// the positive is dropped rather than overriding it.
    pub fn sample_many(
        &mut self,
        network: &mut Network,
        weights: &mut WeightArena,
        input_index: usize,
        positive: usize,
        negatives: &[usize],
    ) -> Result<()> {
        let mut picks = vec![(positive, true)];
        picks.extend(negatives.iter().filter(|&&n| n != positive).map(|&n| (n, false)));
        self.sample_targets(network, weights, input_index, &picks)
    }

    fn sample_targets(
        &mut self,
        network: &mut Network,
        weights: &mut WeightArena,
        input_index: usize,
        picks: &[(usize, bool)],
    ) -> Result<()> {
        let output = self.propagator.output();
        let inputs = network.one_hot(output, input_index)?;
        let mut targets = vec![None; network.layer(output)?.width()];
        for &(index, is_positive) in picks {
            let width = targets.len();
            let slot = targets.get_mut(index).ok_or_else(|| NetworkError::IndexOutOfRange {
                layer: network.layers[output.index()].name().to_string(),
                index,
                width,
            })?;
            *slot = Some(if is_positive { 1.0 } else { 0.0 });
        }
        self.propagator.backpropagate(network, weights, &inputs, &targets)?;
        Ok(())
    }
}
