use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::weights::arena::WeightId;

/// Position of a layer inside its `Network`. Layers can only point at ids that
/// already exist, so ids double as a topological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub(crate) usize);

impl LayerId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Address of a single node: its layer plus its position in that layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub layer: LayerId,
    pub index: usize,
}

/// Width × height of a 2D layer. Nodes are stored row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape2D {
    pub width: usize,
    pub height: usize,
}

impl Shape2D {
    pub fn new(width: usize, height: usize) -> Shape2D {
        Shape2D { width, height }
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolingMode {
    #[default]
    Max,
    Average,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    /// Takes its outputs straight from the caller.
    Input,
    Dense { activation: ActivationFunction },
    /// Shared-kernel convolution over one or more equally shaped 2D layers.
    Filter2D { kernel: Shape2D, activation: ActivationFunction },
    /// Weight-free reduction of non-overlapping windows of one 2D layer
    /// shaped `source`.
    Pooling { window: Shape2D, mode: PoolingMode, source: Shape2D },
}

/// Edge from a source node, carrying the handle of its weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: NodeRef,
    pub weight: WeightId,
}

/// Bias contributed on behalf of one previous layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasEdge {
    pub source: LayerId,
    pub weight: WeightId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) output: f64,
    pub(crate) weights: Vec<Edge>,
    pub(crate) bias_weights: Vec<BiasEdge>,
}

impl Node {
    pub(crate) fn new(weights: Vec<Edge>, bias_weights: Vec<BiasEdge>) -> Node {
        Node { output: 0.0, weights, bias_weights }
    }

    /// Output of the most recent `evaluate`/`backpropagate` call.
    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn weights(&self) -> &[Edge] {
        &self.weights
    }

    pub fn bias_weights(&self) -> &[BiasEdge] {
        &self.bias_weights
    }

    /// Handle of the weight fed by `source`, if this node has one.
    pub fn weight_from(&self, source: NodeRef) -> Option<WeightId> {
        self.weights.iter().find(|e| e.source == source).map(|e| e.weight)
    }

    pub fn bias_from(&self, source: LayerId) -> Option<WeightId> {
        self.bias_weights.iter().find(|b| b.source == source).map(|b| b.weight)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub(crate) name: String,
    pub(crate) kind: LayerKind,
    pub(crate) shape: Option<Shape2D>,
    pub(crate) previous: Vec<LayerId>,
    pub(crate) nodes: Vec<Node>,
}

impl Layer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    /// Grid shape for 2D layers, `None` for flat ones.
    pub fn shape(&self) -> Option<Shape2D> {
        self.shape
    }

    pub fn previous(&self) -> &[LayerId] {
        &self.previous
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn width(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_input(&self) -> bool {
        self.previous.is_empty()
    }

    pub fn outputs(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.output).collect()
    }

    /// Derivative of this layer's activation at `output`. Pooling and input
    /// layers pass values through unchanged.
    pub fn derivative(&self, output: f64) -> f64 {
        match &self.kind {
            LayerKind::Dense { activation } | LayerKind::Filter2D { activation, .. } => {
                activation.derivative(output)
            }
            LayerKind::Input | LayerKind::Pooling { .. } => 1.0,
        }
    }
}
