use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::sync::{atomic::AtomicBool, Arc};

use crate::error::{NetworkError, Result};
use crate::optim::sgd::LearningRateSchedule;
use crate::train::epoch_stats::EpochStats;

/// The serialisable part of a training run, as stored in a `NetworkSpec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Momentum factor; `None` (or `0`) trains without momentum.
    #[serde(default)]
    pub momentum: Option<f64>,
    #[serde(default)]
    pub schedule: LearningRateSchedule,
}

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`: full passes over the samples
/// - `learning_rate`: starting step size
/// - `momentum`: heavy-ball factor, if any
/// - `schedule`: how the step size evolves after every sample
/// - `shuffle`: reorder the samples before each epoch
/// - `progress_tx`: receives one `EpochStats` per completed epoch. Dropping
///   the receiver ends training after the epoch in flight.
/// - `stop_flag`: raise from another thread to stop before the next epoch.
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub momentum: Option<f64>,
    pub schedule: LearningRateSchedule,
    pub shuffle: bool,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig`: no momentum, constant rate, shuffled
    /// samples, no progress channel and no stop flag.
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        TrainConfig {
            epochs,
            learning_rate,
            momentum: None,
            schedule: LearningRateSchedule::Constant,
            shuffle: true,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn from_hyperparameters(params: &Hyperparameters) -> Result<Self> {
        if params.epochs == 0 {
            return Err(NetworkError::Config("epochs must be at least 1".to_string()));
        }
        if !(params.learning_rate > 0.0) {
            return Err(NetworkError::Config(format!(
                "learning rate must be positive, got {}",
                params.learning_rate
            )));
        }
        if let Some(m) = params.momentum {
            if !(0.0..1.0).contains(&m) {
                return Err(NetworkError::Config(format!("momentum must be in [0, 1), got {}", m)));
            }
        }
        Ok(TrainConfig {
            momentum: params.momentum,
            schedule: params.schedule,
            ..TrainConfig::new(params.epochs, params.learning_rate)
        })
    }
}
