use std::collections::HashSet;
use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::network::layer::LayerId;
use crate::network::network::Network;
use crate::weights::arena::{WeightArena, WeightId};

/// Starting-value schemes. All of them are fan-in aware except `Uniform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initialiser {
    /// U(-1, 1).
    Uniform,
    /// U(-1/√n, 1/√n) for fan-in n.
    #[default]
    WeightedUniform,
    /// N(0, √(2/n)). Recommended before RELU layers.
    HeNormal,
    /// U(-√(6/n), √(6/n)).
    HeUniform,
    /// N(0, √(1/n)). Recommended before logistic layers.
    Xavier,
}

impl Initialiser {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, fan_in: usize) -> f64 {
        let n = fan_in.max(1) as f64;
        match self {
            Initialiser::Uniform => rng.gen::<f64>() * 2.0 - 1.0,
            Initialiser::WeightedUniform => (rng.gen::<f64>() * 2.0 - 1.0) / n.sqrt(),
            Initialiser::HeNormal => sample_standard_normal(rng) * (2.0 / n).sqrt(),
            Initialiser::HeUniform => (rng.gen::<f64>() * 2.0 - 1.0) * (6.0 / n).sqrt(),
            Initialiser::Xavier => sample_standard_normal(rng) * (1.0 / n).sqrt(),
        }
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Draw two independent uniform samples in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Initialises every weight `output` depends on.
pub fn initialise<R: Rng + ?Sized>(
    network: &Network,
    weights: &mut WeightArena,
    output: LayerId,
    initialiser: Initialiser,
    rng: &mut R,
) -> Result<()> {
    let mut seen = HashSet::new();
    for id in network.reachable(output)? {
        initialise_with(network, weights, id, initialiser, rng, &mut seen)?;
    }
    Ok(())
}

/// Initialises the weights owned by a single layer.
pub fn initialise_layer<R: Rng + ?Sized>(
    network: &Network,
    weights: &mut WeightArena,
    layer: LayerId,
    initialiser: Initialiser,
    rng: &mut R,
) -> Result<()> {
    initialise_with(network, weights, layer, initialiser, rng, &mut HashSet::new())
}

// Shared weights are drawn once: later occurrences would otherwise overwrite
// the first draw with a different fan-in.
fn initialise_with<R: Rng + ?Sized>(
    network: &Network,
    weights: &mut WeightArena,
    layer: LayerId,
    initialiser: Initialiser,
    rng: &mut R,
    seen: &mut HashSet<WeightId>,
) -> Result<()> {
    network.check_arena(weights)?;
    for node in network.layer(layer)?.nodes() {
        let fan_in = node.weights().len();
        let handles = node
            .weights()
            .iter()
            .map(|e| e.weight)
            .chain(node.bias_weights().iter().map(|b| b.weight));
        for handle in handles {
            if seen.insert(handle) {
                weights.set(handle, initialiser.sample(rng, fan_in))?;
            }
        }
    }
    Ok(())
}
