mod common;

use common::{assert_close, bias_value, edge_value, init_tracing, set_node};
use dagnet::optim::Slot;
use dagnet::{
    initialise, ActivationFunction, Initialiser, LayerId, Momentum, Network, NetworkError, WeightArena,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

struct Diamond {
    network: Network,
    weights: WeightArena,
    a: LayerId,
    b: LayerId,
    c: LayerId,
    d: LayerId,
}

// input -> a -> {b, c} -> d
fn diamond() -> anyhow::Result<Diamond> {
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("input", 1)?;
    let a = network.add_dense(&mut weights, "a", 1, &[input], ActivationFunction::Logistic)?;
    let b = network.add_dense(&mut weights, "b", 1, &[a], ActivationFunction::Logistic)?;
    let c = network.add_dense(&mut weights, "c", 1, &[a], ActivationFunction::Logistic)?;
    let d = network.add_dense(&mut weights, "d", 1, &[b, c], ActivationFunction::Logistic)?;
    set_node(&network, &mut weights, a, 0, &[0.3], &[0.1])?;
    set_node(&network, &mut weights, b, 0, &[0.8], &[-0.2])?;
    set_node(&network, &mut weights, c, 0, &[-0.5], &[0.4])?;
    set_node(&network, &mut weights, d, 0, &[0.6, 0.7], &[0.05, -0.1])?;
    Ok(Diamond { network, weights, a, b, c, d })
}

#[test]
fn diamond_sums_both_paths_before_updating() -> anyhow::Result<()> {
    init_tracing();
    let Diamond { mut network, mut weights, a, b, c, d } = diamond()?;

    network.backpropagate(&mut weights, d, &[0.5], &[Some(1.0)], 0.5, None)?;

    assert_close(network.outputs(d)?[0], 0.6588228303084022);
    assert_close(edge_value(&network, &weights, a, 0, 0), 0.3001460816347215);
    assert_close(bias_value(&network, &weights, a, 0, 0), 0.10029216326944305);
    assert_close(edge_value(&network, &weights, b, 0, 0), 0.8031835247639489);
    assert_close(bias_value(&network, &weights, b, 0, 0), -0.19433714365696056);
    assert_close(edge_value(&network, &weights, c, 0, 0), -0.49624097704414283);
    assert_close(bias_value(&network, &weights, c, 0, 0), 0.4066865529774621);
    assert_close(edge_value(&network, &weights, d, 0, 0), 0.6215537104455114);
    assert_close(edge_value(&network, &weights, d, 0, 1), 0.7203106006808542);
    assert_close(bias_value(&network, &weights, d, 0, 0), 0.0883441017977166);
    assert_close(bias_value(&network, &weights, d, 0, 1), -0.06165589820228342);
    Ok(())
}

#[test]
fn unset_targets_leave_their_weights_alone() -> anyhow::Result<()> {
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("input", 4)?;
    let hidden = network.add_dense(&mut weights, "hidden", 6, &[input], ActivationFunction::Logistic)?;
    let output = network.add_dense(&mut weights, "output", 3, &[hidden], ActivationFunction::Logistic)?;
    initialise(&network, &mut weights, output, Initialiser::WeightedUniform, &mut StdRng::seed_from_u64(3))?;

    let before: Vec<Vec<f64>> = (0..3)
        .map(|n| (0..6).map(|e| edge_value(&network, &weights, output, n, e)).collect())
        .collect();
    let bias_before: Vec<f64> = (0..3).map(|n| bias_value(&network, &weights, output, n, 0)).collect();

    network.backpropagate(&mut weights, output, &[0.2, 0.4, 0.6, 0.8], &[None, Some(1.0), None], 0.3, None)?;

    for n in [0, 2] {
        for (e, value) in before[n].iter().enumerate() {
            assert_eq!(edge_value(&network, &weights, output, n, e).to_bits(), value.to_bits());
        }
        assert_eq!(bias_value(&network, &weights, output, n, 0).to_bits(), bias_before[n].to_bits());
    }
    for (e, value) in before[1].iter().enumerate() {
        assert_ne!(edge_value(&network, &weights, output, 1, e), *value);
    }
    Ok(())
}

#[test]
fn no_targets_means_no_change() -> anyhow::Result<()> {
    let Diamond { mut network, mut weights, d, .. } = diamond()?;
    let before = weights.values().to_vec();
    network.backpropagate(&mut weights, d, &[0.5], &[None], 0.5, None)?;
    assert_eq!(weights.values(), before.as_slice());
    Ok(())
}

#[test]
fn targets_must_match_the_output_width() -> anyhow::Result<()> {
    let Diamond { mut network, mut weights, d, .. } = diamond()?;
    let err = network
        .backpropagate(&mut weights, d, &[0.5], &[Some(1.0), Some(0.0)], 0.5, None)
        .unwrap_err();
    assert!(matches!(err, NetworkError::ShapeMismatch { expected: 1, actual: 2, .. }));
    Ok(())
}

#[test]
fn momentum_carries_velocity_between_passes() -> anyhow::Result<()> {
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("input", 1)?;
    let output = network.add_dense(&mut weights, "output", 1, &[input], ActivationFunction::Logistic)?;
    set_node(&network, &mut weights, output, 0, &[0.5], &[0.0])?;
    let mut momentum = Momentum::new(&network, output, 0.9)?;

    network.backpropagate(&mut weights, output, &[1.0], &[Some(0.0)], 0.5, Some(&mut momentum))?;
    assert_close(edge_value(&network, &weights, output, 0, 0), 0.4268598732365212);
    assert_close(bias_value(&network, &weights, output, 0, 0), -0.07314012676347881);
    let velocity = momentum.velocity(output, Slot::Weight { node: 0, edge: 0 }).unwrap();
    assert_close(velocity, -0.07314012676347881);

    network.backpropagate(&mut weights, output, &[1.0], &[Some(0.0)], 0.5, Some(&mut momentum))?;
    assert_close(edge_value(&network, &weights, output, 0, 0), 0.28984393512434414);
    assert_close(bias_value(&network, &weights, output, 0, 0), -0.21015606487565583);
    let velocity = momentum.velocity(output, Slot::Bias { node: 0, edge: 0 }).unwrap();
    assert_close(velocity, -0.13701593811217705);
    Ok(())
}

#[test]
fn momentum_from_another_graph_is_rejected() -> anyhow::Result<()> {
    let Diamond { mut network, mut weights, d, .. } = diamond()?;
    let Diamond { network: other, d: other_d, .. } = diamond()?;
    let mut foreign = Momentum::new(&other, other_d, 0.5)?;

    let before = weights.values().to_vec();
    let err = network
        .backpropagate(&mut weights, d, &[0.5], &[Some(1.0)], 0.5, Some(&mut foreign))
        .unwrap_err();
    assert!(matches!(err, NetworkError::TopologyMismatch(_)));
    assert_eq!(weights.values(), before.as_slice());
    Ok(())
}

#[test]
fn momentum_cursor_walks_the_graph_backwards() -> anyhow::Result<()> {
    let Diamond { network, a, b, c, d, .. } = diamond()?;
    let momentum = Momentum::new(&network, d, 0.9)?;

    let root = momentum.root();
    assert_eq!(root.layer_id(), d);
    let left = root.step_backwards(0).unwrap();
    let right = root.step_backwards(1).unwrap();
    assert_eq!(left.layer_id(), b);
    assert_eq!(right.layer_id(), c);
    assert_eq!(left.step_backwards(0).unwrap().layer_id(), a);
    assert_eq!(right.step_backwards(0).unwrap().layer_id(), a);
    assert!(root.step_backwards(2).is_none());
    Ok(())
}
