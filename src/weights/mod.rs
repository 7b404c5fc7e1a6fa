pub mod arena;
pub mod init;

pub use arena::{ArenaId, WeightArena, WeightId};
pub use init::{initialise, initialise_layer, Initialiser};
