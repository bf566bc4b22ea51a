//! # vsacrate
//!
//! Mesh topology, connected parts and variational shape approximation glue
//! for Rust.
//!
//! This is the umbrella crate that provides convenient access to all vsacrate
//! functionality. You can use this crate to get everything in one place, or
//! use individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Host mesh snapshots, triangulation, topology tables, parts
//! - **Approximation**: Edge constraints, per-part driver, cluster tables
//! - **Encoding**: Polygon tags, edge selection sets, proxy colors, geometry
//! - **Pipeline**: The whole operation behind one configuration record
//!
//! ## Quick Start
//!
//! ```rust
//! use vsacrate::prelude::*;
//!
//! let mut host = HostMesh::new();
//! let a = host.add_point(Point3f::new(0.0, 0.0, 0.0));
//! let b = host.add_point(Point3f::new(1.0, 0.0, 0.0));
//! let c = host.add_point(Point3f::new(0.0, 1.0, 0.0));
//! host.add_polygon(&[a, b, c], Some("default"));
//!
//! let mut topology = MeshTopology::from_host(&host).unwrap();
//! let summary = partition(&mut topology);
//! assert_eq!(summary.part_count, 1);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables approximation, encoding and pipeline
//! - `approximation`: Constraint classification and the approximation driver
//! - `encoding`: Host editing and output encoding
//! - `pipeline`: End-to-end pipeline
//! - `all`: Enables all features

// Re-export core functionality
pub use vsacrate_core::*;

// Re-export sub-crates
#[cfg(feature = "approximation")]
pub use vsacrate_approximation as approximation;

#[cfg(feature = "encoding")]
pub use vsacrate_encoding as encoding;

#[cfg(feature = "pipeline")]
pub use vsacrate_pipeline as pipeline;

/// Convenient imports for common use cases
pub mod prelude {
    pub use vsacrate_core::*;

    #[cfg(feature = "approximation")]
    pub use vsacrate_approximation::*;

    #[cfg(feature = "encoding")]
    pub use vsacrate_encoding::*;

    #[cfg(feature = "pipeline")]
    pub use vsacrate_pipeline::*;
}
