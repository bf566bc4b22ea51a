//! Edge constraint classification
//!
//! An edge is constrained when clustering must keep it in place. Rules are
//! checked in order and the first match wins:
//! 1. both endpoints carry the host lock mark
//! 2. boundary preservation is on and the edge has one adjacent triangle
//! 3. material preservation is on, the edge has two adjacent triangles and
//!    their faces carry different material tags

use std::fmt;
use tracing::debug;
use vsacrate_core::{MeshTopology, Part};

/// Preservation switches applied on top of explicit locks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintPolicy {
    pub preserve_boundary: bool,
    pub preserve_material: bool,
}

impl ConstraintPolicy {
    pub fn new(preserve_boundary: bool, preserve_material: bool) -> Self {
        Self {
            preserve_boundary,
            preserve_material,
        }
    }
}

/// Why an edge was constrained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintReason {
    Locked,
    Boundary,
    MaterialSeam,
}

/// Classify a single edge.
pub fn classify_edge(
    topology: &MeshTopology,
    edge: usize,
    policy: ConstraintPolicy,
) -> Option<ConstraintReason> {
    let e = &topology.edges[edge];

    if e.vertices.iter().all(|&v| topology.vertices[v].locked) {
        return Some(ConstraintReason::Locked);
    }

    match e.triangles.as_slice() {
        [_] if policy.preserve_boundary => Some(ConstraintReason::Boundary),
        [a, b] if policy.preserve_material => {
            // Untagged faces compare equal to each other
            if topology.triangle_material(*a) != topology.triangle_material(*b) {
                Some(ConstraintReason::MaterialSeam)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Constrained flag for each of the part's edges, in `part.edges` order.
pub fn classify_part(topology: &MeshTopology, part: &Part, policy: ConstraintPolicy) -> Vec<bool> {
    part.edges
        .iter()
        .map(|&e| classify_edge(topology, e, policy).is_some())
        .collect()
}

/// Counts of constrained edges by reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintSummary {
    pub locked: usize,
    pub boundary: usize,
    pub material_seam: usize,
}

impl ConstraintSummary {
    pub fn total(&self) -> usize {
        self.locked + self.boundary + self.material_seam
    }

    fn count(&mut self, reason: ConstraintReason) {
        match reason {
            ConstraintReason::Locked => self.locked += 1,
            ConstraintReason::Boundary => self.boundary += 1,
            ConstraintReason::MaterialSeam => self.material_seam += 1,
        }
    }
}

impl fmt::Display for ConstraintSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Edge Constraints:")?;
        writeln!(f, "  Locked: {}", self.locked)?;
        writeln!(f, "  Boundary: {}", self.boundary)?;
        writeln!(f, "  Material seams: {}", self.material_seam)?;
        writeln!(f, "  Total: {}", self.total())
    }
}

/// Set the `constrained` flag on every edge of the topology.
///
/// Flags are overwritten, so running this twice with different policies
/// leaves only the second policy's result.
pub fn apply_constraints(topology: &mut MeshTopology, policy: ConstraintPolicy) -> ConstraintSummary {
    let mut summary = ConstraintSummary::default();

    for edge in 0..topology.edges.len() {
        let reason = classify_edge(topology, edge, policy);
        if let Some(reason) = reason {
            summary.count(reason);
        }
        topology.edges[edge].constrained = reason.is_some();
    }

    debug!(
        "Constrained {} of {} edges ({:?})",
        summary.total(),
        topology.edges.len(),
        policy
    );
    summary
}
