mod common;

use common::{bias_value, edge_value, init_tracing};
use dagnet::{initialise, ActivationFunction, Initialiser, LayerId, NegativeSampler, Network, NetworkError, WeightArena};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded(network: &Network, weights: &mut WeightArena, output: LayerId, seed: u64) -> anyhow::Result<()> {
    initialise(network, weights, output, Initialiser::WeightedUniform, &mut StdRng::seed_from_u64(seed))?;
    Ok(())
}

#[test]
fn learns_a_single_positive_pair() -> anyhow::Result<()> {
    init_tracing();
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("input", 5)?;
    let hidden = network.add_dense(&mut weights, "hidden", 10, &[input], ActivationFunction::Logistic)?;
    let output = network.add_dense(&mut weights, "output", 5, &[hidden], ActivationFunction::Logistic)?;
    seeded(&network, &mut weights, output, 1)?;

    let mut sampler = NegativeSampler::new(output, 0.25);
    for _ in 0..2000 {
        for i in 0..5 {
            sampler.sample(&mut network, &mut weights, i, i, i == 2)?;
        }
    }

    for i in 0..5 {
        let result = network.result(&weights, output, i, i)?;
        if i == 2 {
            assert!(result > 0.95, "pair {i} scored {result}");
        } else {
            assert!(result < 0.05, "pair {i} scored {result}");
        }
    }
    Ok(())
}

#[test]
fn learns_through_parallel_hidden_layers() -> anyhow::Result<()> {
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("input", 5)?;
    let h1 = network.add_dense(&mut weights, "hidden1", 10, &[input], ActivationFunction::Logistic)?;
    let h2 = network.add_dense(&mut weights, "hidden2", 10, &[input], ActivationFunction::Logistic)?;
    let h3 = network.add_dense(&mut weights, "hidden3", 10, &[h1, h2], ActivationFunction::Logistic)?;
    let output = network.add_dense(&mut weights, "output", 5, &[h3], ActivationFunction::Logistic)?;
    seeded(&network, &mut weights, output, 2)?;

    for _ in 0..2000 {
        for i in 0..5 {
            network.negative_sample(&mut weights, output, i, i, 0.25, i == 2)?;
        }
    }

    for i in 0..5 {
        let result = network.result(&weights, output, i, i)?;
        assert_eq!(result > 0.95, i == 2, "pair {i} scored {result}");
        assert_eq!(result < 0.05, i != 2, "pair {i} scored {result}");
    }
    Ok(())
}

#[test]
fn separates_inputs_sharing_one_output() -> anyhow::Result<()> {
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("input", 100)?;
    let hidden = network.add_dense(&mut weights, "hidden", 50, &[input], ActivationFunction::Logistic)?;
    let output = network.add_dense(&mut weights, "output", 100, &[hidden], ActivationFunction::Logistic)?;
    seeded(&network, &mut weights, output, 3)?;

    let mut sampler = NegativeSampler::new(output, 0.25);
    for _ in 0..2000 {
        for i in 0..5 {
            sampler.sample(&mut network, &mut weights, i, 2, i == 1 || i == 3)?;
        }
    }

    for i in 0..5 {
        let result = network.result(&weights, output, i, 2)?;
        if i == 1 || i == 3 {
            assert!(result > 0.95, "input {i} scored {result}");
        } else {
            assert!(result < 0.05, "input {i} scored {result}");
        }
    }
    Ok(())
}

#[test]
fn only_weights_on_the_sampled_path_move() -> anyhow::Result<()> {
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("input", 100)?;
    let h1 = network.add_dense(&mut weights, "hidden1", 50, &[input], ActivationFunction::Logistic)?;
    let h2 = network.add_dense(&mut weights, "hidden2", 50, &[h1], ActivationFunction::Logistic)?;
    let h3 = network.add_dense(&mut weights, "hidden3", 50, &[h1], ActivationFunction::Logistic)?;
    let h4 = network.add_dense(&mut weights, "hidden4", 50, &[h2, h3], ActivationFunction::Logistic)?;
    let output = network.add_dense(&mut weights, "output", 100, &[h4], ActivationFunction::Logistic)?;
    seeded(&network, &mut weights, output, 4)?;

    let hidden_before: Vec<Vec<f64>> = (0..50)
        .map(|n| (0..100).map(|e| edge_value(&network, &weights, h1, n, e)).collect())
        .collect();
    let output_before: Vec<Vec<f64>> = (0..100)
        .map(|n| (0..50).map(|e| edge_value(&network, &weights, output, n, e)).collect())
        .collect();
    let bias_before: Vec<f64> = (0..100).map(|n| bias_value(&network, &weights, output, n, 0)).collect();

    let mut sampler = NegativeSampler::new(output, 0.25);
    for _ in 0..50 {
        sampler.sample(&mut network, &mut weights, 49, 49, true)?;
    }

    for (n, row) in hidden_before.iter().enumerate() {
        for (e, before) in row.iter().enumerate() {
            let after = edge_value(&network, &weights, h1, n, e);
            if e == 49 {
                assert_ne!(after, *before, "hidden1[{n}] weight from input {e}");
            } else {
                assert_eq!(after.to_bits(), before.to_bits(), "hidden1[{n}] weight from input {e}");
            }
        }
    }
    for (n, row) in output_before.iter().enumerate() {
        for (e, before) in row.iter().enumerate() {
            let after = edge_value(&network, &weights, output, n, e);
            if n == 49 {
                assert_ne!(after, *before, "output[{n}] weight from hidden4[{e}]");
            } else {
                assert_eq!(after.to_bits(), before.to_bits(), "output[{n}] weight from hidden4[{e}]");
            }
        }
        let bias = bias_value(&network, &weights, output, n, 0);
        assert_eq!(bias.to_bits() == bias_before[n].to_bits(), n != 49);
    }
    Ok(())
}

#[test]
fn many_negatives_train_in_one_pass() -> anyhow::Result<()> {
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("input", 6)?;
    let hidden = network.add_dense(&mut weights, "hidden", 8, &[input], ActivationFunction::Logistic)?;
    let output = network.add_dense(&mut weights, "output", 6, &[hidden], ActivationFunction::Logistic)?;
    seeded(&network, &mut weights, output, 5)?;

    let untouched_before = edge_value(&network, &weights, output, 5, 0);
    let mut sampler = NegativeSampler::new(output, 0.25);
    for _ in 0..1000 {
        // The duplicate of the positive index must not turn it negative.
        sampler.sample_many(&mut network, &mut weights, 0, 1, &[2, 3, 1])?;
    }

    assert!(network.result(&weights, output, 0, 1)? > 0.9);
    assert!(network.result(&weights, output, 0, 2)? < 0.1);
    assert!(network.result(&weights, output, 0, 3)? < 0.1);
    assert_eq!(edge_value(&network, &weights, output, 5, 0), untouched_before);
    Ok(())
}

#[test]
fn indices_outside_the_layers_are_rejected() -> anyhow::Result<()> {
    let mut weights = WeightArena::new();
    let mut network = Network::new(&weights);
    let input = network.add_input("input", 3)?;
    let output = network.add_dense(&mut weights, "output", 2, &[input], ActivationFunction::Logistic)?;

    let before = weights.values().to_vec();
    let err = network.negative_sample(&mut weights, output, 3, 0, 0.25, true).unwrap_err();
    assert!(matches!(err, NetworkError::IndexOutOfRange { index: 3, width: 3, .. }));
    let err = network.negative_sample(&mut weights, output, 0, 2, 0.25, true).unwrap_err();
    assert!(matches!(err, NetworkError::IndexOutOfRange { index: 2, width: 2, .. }));
    assert!(matches!(
        network.result(&weights, output, 0, 7),
        Err(NetworkError::IndexOutOfRange { index: 7, .. })
    ));
    assert_eq!(weights.values(), before.as_slice());
    Ok(())
}
