pub mod backprop;
pub mod epoch_stats;
pub mod loop_fn;
pub mod negative_sampling;
pub mod replicas;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::EpochStats;
pub use loop_fn::train_loop;
pub use negative_sampling::NegativeSampler;
pub use replicas::fan_out;
pub use train_config::{Hyperparameters, TrainConfig};
pub use trainer::{train_network, BackPropagator, Sample};
