//! End-to-end variational shape approximation
//!
//! [`ApproximationPipeline`] wires the topology builder, partitioner,
//! constraint classifier, approximation driver and output encoder into a
//! single operation driven by an [`ApproximationConfig`].

pub mod config;
pub mod pipeline;

pub use config::*;
pub use pipeline::*;
