pub mod activation;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optim;
pub mod train;
pub mod weights;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use error::{NetworkError, Result};
pub use loss::mse::MseLoss;
pub use network::forward::{Activations, Inputs};
pub use network::layer::{LayerId, PoolingMode, Shape2D};
pub use network::network::Network;
pub use network::spec::{LayerSpec, NetworkSpec};
pub use optim::momentum::Momentum;
pub use optim::sgd::{LearningRateSchedule, Sgd};
pub use train::loop_fn::train_loop;
pub use train::negative_sampling::NegativeSampler;
pub use train::train_config::{Hyperparameters, TrainConfig};
pub use train::trainer::{train_network, BackPropagator, Sample};
pub use weights::arena::{WeightArena, WeightId};
pub use weights::init::{initialise, Initialiser};
