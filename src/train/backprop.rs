use tracing::{debug, trace};

use crate::error::{NetworkError, Result};
use crate::layers::pooling;
use crate::loss::mse::MseLoss;
use crate::network::forward::{check_source, Activations, Inputs};
use crate::network::layer::{Layer, LayerId, LayerKind};
use crate::network::network::Network;
use crate::optim::gradients::Gradients;
use crate::optim::momentum::Momentum;
use crate::optim::sgd::Sgd;
use crate::weights::arena::WeightArena;

/// Error signal (∂E/∂output) gathered for each node of a layer. `None` means no
/// downstream node with a delta reads from it.
type Signal = Vec<Option<f64>>;

impl Network {
    /// Trains `output` towards `targets` with one step of gradient descent.
    ///
    /// `targets` holds one entry per output node; `None` entries are skipped
    /// entirely, so only weights on a path to a targeted node move.
    pub fn backpropagate<'a>(
        &mut self,
        weights: &mut WeightArena,
        output: LayerId,
        inputs: impl Into<Inputs<'a>>,
        targets: &[Option<f64>],
        learning_rate: f64,
        momentum: Option<&mut Momentum>,
    ) -> Result<()> {
        self.backward_pass(weights, output, inputs.into(), targets, &Sgd::new(learning_rate), momentum)
            .map(|_| ())
    }

    /// Runs the forward pass, the backward walk and the update; returns the
    /// outputs that were trained against.
    pub(crate) fn backward_pass(
        &mut self,
        weights: &mut WeightArena,
        output: LayerId,
        inputs: Inputs<'_>,
        targets: &[Option<f64>],
        sgd: &Sgd,
        mut momentum: Option<&mut Momentum>,
    ) -> Result<Vec<f64>> {
        self.check_arena(weights)?;
        let out_layer = self.layer(output)?;
        if targets.len() != out_layer.width() {
            return Err(NetworkError::ShapeMismatch {
                layer: out_layer.name().to_string(),
                expected: out_layer.width(),
                actual: targets.len(),
            });
        }
        if let Some(m) = momentum.as_deref() {
            m.verify(self, output)?;
        }

        let activations = self.forward(weights, output, inputs)?;
        self.store_outputs(&activations);
        let predicted = activations.require(output)?.to_vec();

        let order = self.reachable(output)?;
        let mut errors: Vec<Option<Signal>> = vec![None; self.layers.len()];
        let mut updates: Vec<(LayerId, Gradients)> = Vec::new();

        // Reverse topological order: by the time a layer is visited every
        // consumer has already added its share to the layer's error signal.
        for &id in order.iter().rev() {
            let layer = &self.layers[id.index()];
            if layer.is_input() {
                continue;
            }
            let outputs = activations.require(id)?;
            let deltas: Signal = if id == output {
                MseLoss::derivative(outputs, targets)
                    .into_iter()
                    .zip(outputs)
                    .map(|(error, &o)| error.map(|e| e * layer.derivative(o)))
                    .collect()
            } else {
                match errors[id.index()].take() {
                    Some(signal) => signal
                        .into_iter()
                        .zip(outputs)
                        .map(|(error, &o)| error.map(|e| e * layer.derivative(o)))
                        .collect(),
                    None => continue,
                }
            };
            trace!(layer = layer.name(), active = deltas.iter().flatten().count(), "backward");

            match &layer.kind {
                LayerKind::Pooling { window, mode, source } => {
                    let previous = pooling::pooling_source(layer)?;
                    let values = activations.require(previous)?;
                    for (index, share) in pooling::route_deltas(values, &deltas, *source, *window, *mode) {
                        add_error(&mut errors, &self.layers, previous, index, share);
                    }
                }
                LayerKind::Dense { .. } | LayerKind::Filter2D { .. } => {
                    let gradients = self.accumulate(layer, &deltas, weights, &activations, &mut errors)?;
                    if !gradients.is_empty() {
                        updates.push((id, gradients));
                    }
                }
                LayerKind::Input => {}
            }
        }

        // Errors above were propagated through pre-update weights; only now
        // does anything move.
        let touched: usize = updates.iter().map(|(_, g)| g.len()).sum();
        for (id, gradients) in &updates {
            sgd.step(weights, *id, gradients, momentum.as_deref_mut())?;
        }
        debug!(
            output = self.layers[output.index()].name(),
            layers = updates.len(),
            weights = touched,
            rate = sgd.learning_rate,
            "backpropagated"
        );
        Ok(predicted)
    }

    /// Sums the layer's raw gradients per weight and pushes its error signal
    /// to every non-input previous layer.
    fn accumulate(
        &self,
        layer: &Layer,
        deltas: &[Option<f64>],
        weights: &WeightArena,
        activations: &Activations,
        errors: &mut [Option<Signal>],
    ) -> Result<Gradients> {
        let mut gradients = Gradients::new();
        for (node, delta) in layer.nodes.iter().zip(deltas) {
            let Some(delta) = *delta else { continue };
            for edge in &node.weights {
                check_source(layer, edge.source.layer)?;
                let source_output = activations.node(edge.source)?;
                gradients.add(edge.weight, delta * source_output);
                add_error(
                    errors,
                    &self.layers,
                    edge.source.layer,
                    edge.source.index,
                    delta * weights.get(edge.weight)?,
                );
            }
            for bias in &node.bias_weights {
                check_source(layer, bias.source)?;
                gradients.add(bias.weight, delta);
            }
        }
        Ok(gradients)
    }
}

fn add_error(errors: &mut [Option<Signal>], layers: &[Layer], layer: LayerId, index: usize, amount: f64) {
    let target = &layers[layer.index()];
    if target.is_input() {
        return;
    }
    let signal = errors[layer.index()].get_or_insert_with(|| vec![None; target.width()]);
    if let Some(slot) = signal.get_mut(index) {
        *slot = Some(slot.unwrap_or(0.0) + amount);
    }
}
