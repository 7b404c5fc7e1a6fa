use tracing::debug;

use crate::error::{NetworkError, Result};
use crate::network::layer::{Layer, LayerId, LayerKind, Node, Shape2D};
use crate::weights::arena::{ArenaId, WeightArena};

/// A directed acyclic graph of layers.
///
/// The network owns topology and the last computed node outputs; parameter
/// values live in the `WeightArena` it was built against. Keeping the two apart
/// is what lets several graphs observe the same weights
/// ([`Network::clone_with_shared_weights`]) or own private copies
/// ([`Network::clone_with_copied_weights`]).
#[derive(Debug, Clone)]
pub struct Network {
    arena: ArenaId,
    pub(crate) layers: Vec<Layer>,
}

impl Network {
    /// Creates an empty network whose weights will live in `weights`.
    pub fn new(weights: &WeightArena) -> Network {
        Network { arena: weights.id(), layers: Vec::new() }
    }

    pub fn arena_id(&self) -> ArenaId {
        self.arena
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Result<&Layer> {
        self.layers
            .get(id.0)
            .ok_or_else(|| NetworkError::UnknownLayer(format!("#{}", id.0)))
    }

    pub fn layer_by_name(&self, name: &str) -> Option<LayerId> {
        self.layers.iter().position(|l| l.name == name).map(LayerId)
    }

    /// Copies the outputs of `layer` as left by the last evaluation.
    pub fn outputs(&self, layer: LayerId) -> Result<Vec<f64>> {
        Ok(self.layer(layer)?.outputs())
    }

    /// Clones the graph *and* its weight values into a brand new arena.
    ///
    /// The returned pair shares nothing with `self`, so it can be trained on
    /// another thread.
    pub fn clone_with_copied_weights(&self, weights: &WeightArena) -> Result<(Network, WeightArena)> {
        self.check_arena(weights)?;
        let copy = weights.duplicate();
        let network = Network { arena: copy.id(), layers: self.layers.clone() };
        Ok((network, copy))
    }

    /// Clones the graph while keeping every weight handle bound to the same
    /// arena. Updates made through either graph are visible to both; node
    /// outputs stay per graph.
    pub fn clone_with_shared_weights(&self) -> Network {
        self.clone()
    }

    pub(crate) fn check_arena(&self, weights: &WeightArena) -> Result<()> {
        if weights.id() != self.arena {
            return Err(NetworkError::InvariantViolation(format!(
                "network is bound to weight arena {:?} but {:?} was supplied",
                self.arena,
                weights.id()
            )));
        }
        Ok(())
    }

    pub(crate) fn check_previous(&self, name: &str, previous: &[LayerId]) -> Result<()> {
        for id in previous {
            if id.0 >= self.layers.len() {
                return Err(NetworkError::UnknownLayer(format!(
                    "#{} (previous layer of `{}`)",
                    id.0, name
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn push_layer(
        &mut self,
        name: &str,
        kind: LayerKind,
        shape: Option<Shape2D>,
        previous: Vec<LayerId>,
        nodes: Vec<Node>,
    ) -> Result<LayerId> {
        if nodes.is_empty() {
            return Err(NetworkError::EmptyLayer(name.to_string()));
        }
        self.check_previous(name, &previous)?;
        let id = LayerId(self.layers.len());
        debug!(layer = name, id = id.0, width = nodes.len(), previous = previous.len(), "added layer");
        self.layers.push(Layer { name: name.to_string(), kind, shape, previous, nodes });
        Ok(id)
    }

    /// Every layer `target` depends on (itself included), in topological order.
    pub fn reachable(&self, target: LayerId) -> Result<Vec<LayerId>> {
        self.layer(target)?;
        let mut seen = vec![false; self.layers.len()];
        let mut stack = vec![target];
        seen[target.0] = true;
        while let Some(id) = stack.pop() {
            for prev in &self.layers[id.0].previous {
                if prev.0 >= id.0 {
                    return Err(NetworkError::InvariantViolation(format!(
                        "layer `{}` refers forward to layer #{}",
                        self.layers[id.0].name, prev.0
                    )));
                }
                if !seen[prev.0] {
                    seen[prev.0] = true;
                    stack.push(*prev);
                }
            }
        }
        Ok(seen
            .iter()
            .enumerate()
            .filter(|(_, s)| **s)
            .map(|(i, _)| LayerId(i))
            .collect())
    }

    /// Input layers `target` depends on, in topological order.
    pub fn input_layers(&self, target: LayerId) -> Result<Vec<LayerId>> {
        Ok(self
            .reachable(target)?
            .into_iter()
            .filter(|id| self.layers[id.0].is_input())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;

    #[test]
    fn reachable_ignores_unrelated_branches() {
        let mut weights = WeightArena::new();
        let mut net = Network::new(&weights);
        let input = net.add_input("input", 2).unwrap();
        let left = net.add_dense(&mut weights, "left", 2, &[input], ActivationFunction::Logistic).unwrap();
        let right = net.add_dense(&mut weights, "right", 2, &[input], ActivationFunction::Logistic).unwrap();
        let out = net.add_dense(&mut weights, "out", 1, &[left], ActivationFunction::Logistic).unwrap();

        let reachable = net.reachable(out).unwrap();
        assert_eq!(reachable, vec![input, left, out]);
        assert!(!reachable.contains(&right));
    }

    #[test]
    fn rejects_unknown_previous_layers() {
        let mut weights = WeightArena::new();
        let mut net = Network::new(&weights);
        let err = net
            .add_dense(&mut weights, "orphan", 2, &[LayerId(7)], ActivationFunction::Logistic)
            .unwrap_err();
        assert!(matches!(err, NetworkError::UnknownLayer(_)));
    }

    #[test]
    fn wrong_arena_is_rejected() {
        let weights = WeightArena::new();
        let other = WeightArena::new();
        let net = Network::new(&weights);
        assert!(matches!(net.check_arena(&other), Err(NetworkError::InvariantViolation(_))));
    }
}
