pub mod gradients;
pub mod momentum;
pub mod sgd;

pub use gradients::Gradients;
pub use momentum::{LayerVelocity, Momentum, MomentumCursor, Slot};
pub use sgd::{LearningRateSchedule, Sgd};
