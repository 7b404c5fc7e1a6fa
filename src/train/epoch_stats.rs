use serde::{Deserialize, Serialize};

/// What one finished epoch of `train_loop` looked like. Sent on
/// `TrainConfig::progress_tx` when a channel is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// Counts from 1.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Samples run in this epoch.
    pub samples: usize,
    /// Mean masked loss; only outputs with a target contribute.
    pub train_loss: f64,
    /// Rate the schedule had reached when the epoch ended.
    pub learning_rate: f64,
    pub elapsed_ms: u64,
}
