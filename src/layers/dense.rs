use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::network::layer::{BiasEdge, Edge, LayerId, LayerKind, Node, NodeRef};
use crate::network::network::Network;
use crate::weights::arena::WeightArena;

impl Network {
    /// Adds a layer that takes its outputs directly from the caller.
    pub fn add_input(&mut self, name: &str, size: usize) -> Result<LayerId> {
        let nodes = (0..size).map(|_| Node::new(Vec::new(), Vec::new())).collect();
        self.push_layer(name, LayerKind::Input, None, Vec::new(), nodes)
    }

    /// Adds a fully connected layer fed by the concatenation of `previous`.
    ///
    /// Every node gets its own weight per source node and one bias per
    /// previous layer. Weights start at zero; run an initialiser afterwards.
    pub fn add_dense(
        &mut self,
        weights: &mut WeightArena,
        name: &str,
        size: usize,
        previous: &[LayerId],
        activation: ActivationFunction,
    ) -> Result<LayerId> {
        self.check_arena(weights)?;
        self.check_previous(name, previous)?;
        if previous.is_empty() {
            return Err(NetworkError::InvalidLayer(format!(
                "dense layer `{}` needs at least one previous layer",
                name
            )));
        }

        let mut nodes = Vec::with_capacity(size);
        for _ in 0..size {
            let mut edges = Vec::new();
            let mut biases = Vec::with_capacity(previous.len());
            for &prev in previous {
                for index in 0..self.layer(prev)?.width() {
                    edges.push(Edge {
                        source: NodeRef { layer: prev, index },
                        weight: weights.alloc(0.0),
                    });
                }
                biases.push(BiasEdge { source: prev, weight: weights.alloc(0.0) });
            }
            nodes.push(Node::new(edges, biases));
        }

        self.push_layer(name, LayerKind::Dense { activation }, None, previous.to_vec(), nodes)
    }
}
