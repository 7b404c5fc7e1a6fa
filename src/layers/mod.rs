pub mod conv;
pub mod dense;
pub mod pooling;
