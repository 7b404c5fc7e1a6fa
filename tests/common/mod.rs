#![allow(dead_code)]

use dagnet::{LayerId, Network, WeightArena};

/// Routes crate logs through the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Overwrites one node's edge weights (in edge order) and biases.
pub fn set_node(
    network: &Network,
    weights: &mut WeightArena,
    layer: LayerId,
    node: usize,
    edges: &[f64],
    biases: &[f64],
) -> anyhow::Result<()> {
    let node = &network.layer(layer)?.nodes()[node];
    assert_eq!(node.weights().len(), edges.len(), "edge count");
    assert_eq!(node.bias_weights().len(), biases.len(), "bias count");
    for (edge, value) in node.weights().iter().zip(edges) {
        weights.set(edge.weight, *value)?;
    }
    for (bias, value) in node.bias_weights().iter().zip(biases) {
        weights.set(bias.weight, *value)?;
    }
    Ok(())
}

pub fn edge_value(network: &Network, weights: &WeightArena, layer: LayerId, node: usize, edge: usize) -> f64 {
    let handle = network.layer(layer).unwrap().nodes()[node].weights()[edge].weight;
    weights.get(handle).unwrap()
}

pub fn bias_value(network: &Network, weights: &WeightArena, layer: LayerId, node: usize, bias: usize) -> f64 {
    let handle = network.layer(layer).unwrap().nodes()[node].bias_weights()[bias].weight;
    weights.get(handle).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
