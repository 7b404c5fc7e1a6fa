use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Everything that can go wrong while building, evaluating or training a network.
///
/// All variants are configuration bugs (topology or data disagreeing with each
/// other). None of them are transient, so nothing in the crate retries.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A supplied input or target vector disagrees with the layer width.
    #[error("layer `{layer}` expects {expected} values but {actual} were supplied")]
    ShapeMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },

    /// A layer was declared with zero nodes.
    #[error("layer `{0}` has no nodes")]
    EmptyLayer(String),

    /// A momentum structure was used against a graph it was not built from.
    #[error("momentum does not match the network topology: {0}")]
    TopologyMismatch(String),

    /// The graph references something it should never be able to reference.
    #[error("network invariant violated: {0}")]
    InvariantViolation(String),

    #[error("no input vector supplied for input layer `{0}`")]
    MissingInput(String),

    #[error("unknown layer `{0}`")]
    UnknownLayer(String),

    #[error("index {index} is out of range for layer `{layer}` of width {width}")]
    IndexOutOfRange {
        layer: String,
        index: usize,
        width: usize,
    },

    /// Builder arguments that cannot describe a valid layer.
    #[error("invalid layer: {0}")]
    InvalidLayer(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
