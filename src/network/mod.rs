pub mod forward;
pub mod layer;
pub mod network;
pub mod spec;

pub use forward::{Activations, Inputs};
pub use layer::{BiasEdge, Edge, Layer, LayerId, LayerKind, Node, NodeRef, PoolingMode, Shape2D};
pub use network::Network;
pub use spec::{LayerSpec, NetworkSpec};
