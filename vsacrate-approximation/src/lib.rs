//! Per-part shape approximation
//!
//! This crate sits between the topology tables and an external variational
//! clustering routine:
//! - Edge constraint classification (locks, boundaries, material seams)
//! - Part sub-mesh extraction and the per-part driver loop
//! - Cluster id normalization and global tagging
//! - Orientation repair of simplified triangle soups
//!
//! The clustering routine itself is not implemented here. It is consumed
//! through the [`ShapeApproximator`] trait.

pub mod clusters;
pub mod constraints;
pub mod driver;
pub mod orientation;

pub use clusters::*;
pub use constraints::*;
pub use driver::*;
pub use orientation::*;

use serde::{Deserialize, Serialize};
use vsacrate_core::{Point3f, Result, TriangleMesh};

/// What the routine is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApproximationMode {
    /// Reduced mesh as anchor points and triangles
    #[default]
    Simplify,
    /// One proxy id per input triangle
    Segment,
}

/// Input handed to the routine for one part
#[derive(Debug, Clone, Copy)]
pub struct ApproximationRequest<'a> {
    pub mesh: &'a TriangleMesh,
    /// Edges that must not be collapsed, as local vertex index pairs
    pub constrained_edges: &'a [[usize; 2]],
    pub max_proxies: usize,
    pub iterations: usize,
    pub mode: ApproximationMode,
}

/// Result of one routine call
#[derive(Debug, Clone, PartialEq)]
pub enum ApproximationOutput {
    Simplified {
        anchors: Vec<Point3f>,
        triangles: Vec<[usize; 3]>,
        /// Routine's own manifold check on the result
        well_formed: bool,
    },
    Segmentation {
        /// Proxy id for each request triangle, in request order
        face_proxies: Vec<usize>,
        well_formed: bool,
    },
}

impl ApproximationOutput {
    pub fn is_well_formed(&self) -> bool {
        match self {
            ApproximationOutput::Simplified { well_formed, .. }
            | ApproximationOutput::Segmentation { well_formed, .. } => *well_formed,
        }
    }

    pub fn mode(&self) -> ApproximationMode {
        match self {
            ApproximationOutput::Simplified { .. } => ApproximationMode::Simplify,
            ApproximationOutput::Segmentation { .. } => ApproximationMode::Segment,
        }
    }
}

/// External variational shape approximation routine
pub trait ShapeApproximator {
    /// Approximate one part. Called once per part with that part's sub-mesh.
    fn approximate(&self, request: &ApproximationRequest<'_>) -> Result<ApproximationOutput>;
}

impl<T: ShapeApproximator + ?Sized> ShapeApproximator for &T {
    fn approximate(&self, request: &ApproximationRequest<'_>) -> Result<ApproximationOutput> {
        (**self).approximate(request)
    }
}
