use crate::error::{NetworkError, Result};
use crate::layers::pooling;
use crate::network::layer::{Layer, LayerId, LayerKind, NodeRef};
use crate::network::network::Network;
use crate::weights::arena::WeightArena;

/// Values fed to the input layers of a pass.
#[derive(Debug, Clone, Copy)]
pub enum Inputs<'a> {
    /// The same vector for every input layer the target depends on.
    All(&'a [f64]),
    /// One vector per input layer.
    ByLayer(&'a [(LayerId, Vec<f64>)]),
}

impl<'a> Inputs<'a> {
    fn for_layer(&self, id: LayerId) -> Option<&'a [f64]> {
        match *self {
            Inputs::All(values) => Some(values),
            Inputs::ByLayer(pairs) => pairs
                .iter()
                .find(|(layer, _)| *layer == id)
                .map(|(_, values)| values.as_slice()),
        }
    }
}

impl<'a> From<&'a [f64]> for Inputs<'a> {
    fn from(values: &'a [f64]) -> Self {
        Inputs::All(values)
    }
}

impl<'a> From<&'a Vec<f64>> for Inputs<'a> {
    fn from(values: &'a Vec<f64>) -> Self {
        Inputs::All(values.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for Inputs<'a> {
    fn from(values: &'a [f64; N]) -> Self {
        Inputs::All(values.as_slice())
    }
}

impl<'a> From<&'a [(LayerId, Vec<f64>)]> for Inputs<'a> {
    fn from(pairs: &'a [(LayerId, Vec<f64>)]) -> Self {
        Inputs::ByLayer(pairs)
    }
}

impl<'a> From<&'a Vec<(LayerId, Vec<f64>)>> for Inputs<'a> {
    fn from(pairs: &'a Vec<(LayerId, Vec<f64>)>) -> Self {
        Inputs::ByLayer(pairs.as_slice())
    }
}

/// Per-call cache of layer outputs. Each layer a pass depends on is computed
/// exactly once, however many consumers it has.
#[derive(Debug, Clone)]
pub struct Activations {
    target: LayerId,
    outputs: Vec<Option<Vec<f64>>>,
}

impl Activations {
    pub fn target(&self) -> LayerId {
        self.target
    }

    pub fn layer(&self, id: LayerId) -> Option<&[f64]> {
        self.outputs.get(id.0).and_then(|o| o.as_deref())
    }

    /// Outputs of the layer the pass was run for.
    pub fn result(&self) -> &[f64] {
        self.layer(self.target).unwrap_or(&[])
    }

    pub(crate) fn require(&self, id: LayerId) -> Result<&[f64]> {
        self.layer(id).ok_or_else(|| {
            NetworkError::InvariantViolation(format!("layer #{} was not evaluated in this pass", id.0))
        })
    }

    pub(crate) fn node(&self, node: NodeRef) -> Result<f64> {
        self.require(node.layer)?.get(node.index).copied().ok_or_else(|| {
            NetworkError::InvariantViolation(format!(
                "node {} is outside layer #{}",
                node.index, node.layer.0
            ))
        })
    }
}

impl Network {
    /// Computes the outputs of `target` without touching the graph.
    pub fn forward<'a>(
        &self,
        weights: &WeightArena,
        target: LayerId,
        inputs: impl Into<Inputs<'a>>,
    ) -> Result<Activations> {
        self.check_arena(weights)?;
        let inputs = inputs.into();
        let mut activations = Activations {
            target,
            outputs: vec![None; self.layers.len()],
        };
        for id in self.reachable(target)? {
            let layer = &self.layers[id.0];
            let values = compute_layer(layer, weights, &activations, &inputs, id)?;
            activations.outputs[id.0] = Some(values);
        }
        Ok(activations)
    }

    /// Evaluates `target`, stores every visited node's output on the graph and
    /// returns the target's outputs.
    pub fn evaluate<'a>(
        &mut self,
        weights: &WeightArena,
        target: LayerId,
        inputs: impl Into<Inputs<'a>>,
    ) -> Result<Vec<f64>> {
        let activations = self.forward(weights, target, inputs)?;
        self.store_outputs(&activations);
        Ok(activations.result().to_vec())
    }

    pub(crate) fn store_outputs(&mut self, activations: &Activations) {
        for (layer, outputs) in self.layers.iter_mut().zip(&activations.outputs) {
            if let Some(outputs) = outputs {
                for (node, value) in layer.nodes.iter_mut().zip(outputs) {
                    node.output = *value;
                }
            }
        }
    }
}

fn compute_layer(
    layer: &Layer,
    weights: &WeightArena,
    activations: &Activations,
    inputs: &Inputs<'_>,
    id: LayerId,
) -> Result<Vec<f64>> {
    match &layer.kind {
        LayerKind::Input => {
            let values = inputs
                .for_layer(id)
                .ok_or_else(|| NetworkError::MissingInput(layer.name.clone()))?;
            if values.len() != layer.width() {
                return Err(NetworkError::ShapeMismatch {
                    layer: layer.name.clone(),
                    expected: layer.width(),
                    actual: values.len(),
                });
            }
            Ok(values.to_vec())
        }
        LayerKind::Dense { activation } | LayerKind::Filter2D { activation, .. } => layer
            .nodes
            .iter()
            .map(|node| {
                let mut raw = 0.0;
                for edge in &node.weights {
                    check_source(layer, edge.source.layer)?;
                    raw += weights.get(edge.weight)? * activations.node(edge.source)?;
                }
                for bias in &node.bias_weights {
                    check_source(layer, bias.source)?;
                    raw += weights.get(bias.weight)?;
                }
                Ok(activation.function(raw))
            })
            .collect(),
        LayerKind::Pooling { window, mode, source } => {
            let previous = pooling::pooling_source(layer)?;
            pooling::pool_forward(activations.require(previous)?, *source, *window, *mode)
        }
    }
}

/// Every weight/bias key must belong to one of the layer's declared previous layers.
pub(crate) fn check_source(layer: &Layer, source: LayerId) -> Result<()> {
    if layer.previous.contains(&source) {
        Ok(())
    } else {
        Err(NetworkError::InvariantViolation(format!(
            "layer `{}` holds a weight keyed on layer #{}, which is not one of its previous layers",
            layer.name, source.0
        )))
    }
}
