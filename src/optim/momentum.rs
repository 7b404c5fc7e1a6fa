use std::collections::HashMap;

use tracing::debug;

use crate::error::{NetworkError, Result};
use crate::network::layer::{Layer, LayerId};
use crate::network::network::Network;
use crate::weights::arena::{ArenaId, WeightId};

/// Position of one parameter inside a layer's node structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// `edge`-th entry of `nodes[node].weights`.
    Weight { node: usize, edge: usize },
    /// `edge`-th entry of `nodes[node].bias_weights`.
    Bias { node: usize, edge: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeVelocity {
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl NodeVelocity {
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }
}

/// Velocities for one layer, shaped exactly like its nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerVelocity {
    layer: LayerId,
    previous: Vec<LayerId>,
    nodes: Vec<NodeVelocity>,
    /// Slot of each weight's first occurrence in the layer, over every node.
    owners: HashMap<WeightId, Slot>,
}

impl LayerVelocity {
    fn zeroed(id: LayerId, layer: &Layer) -> LayerVelocity {
        let mut owners = HashMap::new();
        for (n, node) in layer.nodes().iter().enumerate() {
            for (e, edge) in node.weights().iter().enumerate() {
                owners.entry(edge.weight).or_insert(Slot::Weight { node: n, edge: e });
            }
            for (e, bias) in node.bias_weights().iter().enumerate() {
                owners.entry(bias.weight).or_insert(Slot::Bias { node: n, edge: e });
            }
        }
        LayerVelocity {
            layer: id,
            previous: layer.previous().to_vec(),
            nodes: layer
                .nodes()
                .iter()
                .map(|n| NodeVelocity {
                    weights: vec![0.0; n.weights().len()],
                    biases: vec![0.0; n.bias_weights().len()],
                })
                .collect(),
            owners,
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn nodes(&self) -> &[NodeVelocity] {
        &self.nodes
    }

    fn slot_mut(&mut self, slot: Slot) -> Option<&mut f64> {
        match slot {
            Slot::Weight { node, edge } => self.nodes.get_mut(node)?.weights.get_mut(edge),
            Slot::Bias { node, edge } => self.nodes.get_mut(node)?.biases.get_mut(edge),
        }
    }

    fn slot(&self, slot: Slot) -> Option<f64> {
        match slot {
            Slot::Weight { node, edge } => self.nodes.get(node)?.weights.get(edge).copied(),
            Slot::Bias { node, edge } => self.nodes.get(node)?.biases.get(edge).copied(),
        }
    }

    fn check_against(&self, layer: &Layer) -> Result<()> {
        if self.nodes.len() != layer.width() {
            return Err(mismatch(format!(
                "layer `{}` has {} nodes, momentum holds {}",
                layer.name(),
                layer.width(),
                self.nodes.len()
            )));
        }
        for (i, (velocity, node)) in self.nodes.iter().zip(layer.nodes()).enumerate() {
            if velocity.weights.len() != node.weights().len()
                || velocity.biases.len() != node.bias_weights().len()
            {
                return Err(mismatch(format!(
                    "node {} of layer `{}` has a different number of weights",
                    i,
                    layer.name()
                )));
            }
        }
        Ok(())
    }
}

/// Heavy-ball momentum state for one output layer of one network.
///
/// The shadow mirrors every layer the output depends on. [`Momentum::verify`]
/// walks it in lockstep with the network through
/// [`MomentumCursor::step_backwards`]; once that walk has passed, updates
/// address a layer's velocities directly by its `LayerId` position. A weight
/// shared by several nodes of a layer has one velocity, kept in the slot of
/// its first occurrence. Build a new one whenever the topology changes.
#[derive(Debug, Clone)]
pub struct Momentum {
    factor: f64,
    arena: ArenaId,
    output: LayerId,
    shadows: Vec<Option<LayerVelocity>>,
}

impl Momentum {
    pub fn new(network: &Network, output: LayerId, factor: f64) -> Result<Momentum> {
        let mut shadows = vec![None; network.layers().len()];
        for id in network.reachable(output)? {
            shadows[id.index()] = Some(LayerVelocity::zeroed(id, network.layer(id)?));
        }
        debug!(output = output.index(), factor, layers = shadows.iter().flatten().count(), "built momentum");
        Ok(Momentum { factor, arena: network.arena_id(), output, shadows })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn output(&self) -> LayerId {
        self.output
    }

    /// Cursor on the output layer's shadow.
    pub fn root(&self) -> MomentumCursor<'_> {
        MomentumCursor { momentum: self, layer: self.output }
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerVelocity> {
        self.shadows.get(id.index()).and_then(|s| s.as_ref())
    }

    pub fn velocity(&self, layer: LayerId, slot: Slot) -> Option<f64> {
        self.layer(layer)?.slot(slot)
    }

    /// Slot holding the velocity of `weight` within `layer`.
    pub fn owner(&self, layer: LayerId, weight: WeightId) -> Result<Slot> {
        self.layer(layer)
            .and_then(|s| s.owners.get(&weight).copied())
            .ok_or_else(|| {
                mismatch(format!(
                    "weight {} has no velocity in layer #{}",
                    weight.index(),
                    layer.index()
                ))
            })
    }

    /// Walks `network` from `output` and this shadow from its root together,
    /// failing on the first disagreement.
    pub fn verify(&self, network: &Network, output: LayerId) -> Result<()> {
        if network.arena_id() != self.arena {
            return Err(mismatch("network is bound to a different weight arena".to_string()));
        }
        if output != self.output {
            return Err(mismatch(format!(
                "built for output layer #{}, used with #{}",
                self.output.index(),
                output.index()
            )));
        }

        let mut visited = vec![false; self.shadows.len()];
        let mut stack = vec![(output, self.root())];
        while let Some((id, cursor)) = stack.pop() {
            let layer = network.layer(id)?;
            let shadow = cursor.velocity().ok_or_else(|| {
                mismatch(format!("no velocities for layer `{}`", layer.name()))
            })?;
            if shadow.layer != id {
                return Err(mismatch(format!(
                    "layer `{}` is shadowed by layer #{}",
                    layer.name(),
                    shadow.layer.index()
                )));
            }
            shadow.check_against(layer)?;
            if shadow.previous.len() != layer.previous().len() {
                return Err(mismatch(format!(
                    "layer `{}` has {} previous layers, momentum holds {}",
                    layer.name(),
                    layer.previous().len(),
                    shadow.previous.len()
                )));
            }
            for (i, &prev) in layer.previous().iter().enumerate() {
                let next = cursor.step_backwards(i).ok_or_else(|| {
                    mismatch(format!("cannot step back from `{}` to branch {}", layer.name(), i))
                })?;
                if next.layer_id() != prev {
                    return Err(mismatch(format!(
                        "branch {} of `{}` leads to layer #{} in the network but #{} in momentum",
                        i,
                        layer.name(),
                        prev.index(),
                        next.layer_id().index()
                    )));
                }
                if !visited[prev.index()] {
                    visited[prev.index()] = true;
                    stack.push((prev, next));
                }
            }
        }
        Ok(())
    }

    /// Updates the velocity at `slot` for a step of size `change` and returns
    /// the momentum term to add to the weight (`factor × previous velocity`).
    pub fn apply_momentum(&mut self, layer: LayerId, slot: Slot, change: f64) -> Result<f64> {
        let factor = self.factor;
        let velocity = self
            .shadows
            .get_mut(layer.index())
            .and_then(|s| s.as_mut())
            .and_then(|s| s.slot_mut(slot))
            .ok_or_else(|| mismatch(format!("no velocity slot {:?} in layer #{}", slot, layer.index())))?;
        let carried = factor * *velocity;
        *velocity = change + carried;
        Ok(carried)
    }

    /// Forgets every accumulated velocity.
    pub fn reset(&mut self) {
        for shadow in self.shadows.iter_mut().flatten() {
            for node in &mut shadow.nodes {
                node.weights.iter_mut().for_each(|v| *v = 0.0);
                node.biases.iter_mut().for_each(|v| *v = 0.0);
            }
        }
    }
}

/// Read-only position inside a `Momentum` shadow.
#[derive(Debug, Clone, Copy)]
pub struct MomentumCursor<'m> {
    momentum: &'m Momentum,
    layer: LayerId,
}

impl<'m> MomentumCursor<'m> {
    pub fn layer_id(&self) -> LayerId {
        self.layer
    }

    pub fn velocity(&self) -> Option<&'m LayerVelocity> {
        self.momentum.layer(self.layer)
    }

    /// Shadow of this layer's `i`-th previous layer.
    pub fn step_backwards(&self, i: usize) -> Option<MomentumCursor<'m>> {
        let previous = *self.velocity()?.previous.get(i)?;
        self.momentum.layer(previous)?;
        Some(MomentumCursor { momentum: self.momentum, layer: previous })
    }
}

fn mismatch(reason: String) -> NetworkError {
    NetworkError::TopologyMismatch(reason)
}
