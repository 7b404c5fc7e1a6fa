use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::seq::SliceRandom;
use tracing::info;

use crate::error::{NetworkError, Result};
use crate::network::layer::LayerId;
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::{train_network, BackPropagator, Sample};
use crate::weights::arena::WeightArena;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Runs `samples` through `output` for up to `config.epochs` epochs and
/// returns the mean masked loss of the last epoch that completed (`0.0` if
/// none did).
///
/// # Arguments
/// - `network`: node outputs are refreshed on every pass
/// - `weights`: arena `network` is bound to; updated in place
/// - `output` : layer the sample targets refer to
/// - `samples`: inputs with (possibly partial) targets
/// - `config` : rates, momentum, shuffling, progress channel and stop flag
///
/// # Early termination
/// Training stops before the next epoch once `config.stop_flag` is raised,
/// and right after an epoch whose `EpochStats` could not be delivered
/// because the receiver is gone.
///
/// # Errors
/// Fails on an empty sample set or on any sample that disagrees with the
/// topology.
pub fn train_loop(
    network: &mut Network,
    weights: &mut WeightArena,
    output: LayerId,
    samples: &[Sample],
    config: &TrainConfig,
) -> Result<f64> {
    if samples.is_empty() {
        return Err(NetworkError::Config("no training samples supplied".to_string()));
    }

    let mut propagator = BackPropagator::new(output, config.learning_rate).with_schedule(config.schedule);
    if let Some(factor) = config.momentum {
        propagator = propagator.with_momentum(network, factor)?;
    }

    let mut order: Vec<Sample> = samples.to_vec();
    let mut rng = rand::thread_rng();
    let mut last_train_loss = 0.0;

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            break;
        }

        let t_start = Instant::now();

        if config.shuffle {
            order.shuffle(&mut rng);
        }
        let train_loss = train_network(network, weights, &mut propagator, &order)?;
        last_train_loss = train_loss;

        let elapsed_ms = t_start.elapsed().as_millis() as u64;
        info!(epoch, total = config.epochs, loss = train_loss, rate = propagator.learning_rate(), "epoch complete");

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            samples: order.len(),
            train_loss,
            learning_rate: propagator.learning_rate(),
            elapsed_ms,
        };

        if let Some(ref tx) = config.progress_tx {
            if tx.send(stats).is_err() {
                break;
            }
        }
    }

    Ok(last_train_loss)
}

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}
