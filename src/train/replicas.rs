use std::thread;

use tracing::debug;

use crate::error::{NetworkError, Result};
use crate::network::network::Network;
use crate::weights::arena::WeightArena;

/// Trains `replicas` independent copies of `network` in parallel.
///
/// Each replica is a value clone (own graph, own arena), so the threads never
/// share a mutable weight. `train` receives the replica index and its pair;
/// the trained pairs come back in index order.
pub fn fan_out<F>(
    network: &Network,
    weights: &WeightArena,
    replicas: usize,
    train: F,
) -> Result<Vec<(Network, WeightArena)>>
where
    F: Fn(usize, &mut Network, &mut WeightArena) -> Result<()> + Sync,
{
    let copies = (0..replicas)
        .map(|_| network.clone_with_copied_weights(weights))
        .collect::<Result<Vec<_>>>()?;
    debug!(replicas, "fanning out");

    let train = &train;
    thread::scope(|scope| {
        let handles: Vec<_> = copies
            .into_iter()
            .enumerate()
            .map(|(i, (mut net, mut arena))| {
                scope.spawn(move || train(i, &mut net, &mut arena).map(|_| (net, arena)))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    Err(NetworkError::InvariantViolation("a training replica panicked".to_string()))
                })
            })
            .collect()
    })
}
