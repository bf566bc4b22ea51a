//! Core data structures for vsacrate
//!
//! This crate turns a host polygon snapshot into flat topology tables
//! (vertices, triangles, edges, faces) and groups the triangles into
//! connected parts.

pub mod components;
pub mod error;
pub mod host;
pub mod mesh;
pub mod point;
pub mod topology;
pub mod triangulate;

pub use components::*;
pub use error::*;
pub use host::*;
pub use mesh::*;
pub use point::*;
pub use topology::*;
pub use triangulate::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
