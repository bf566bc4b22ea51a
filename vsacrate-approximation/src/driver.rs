//! Per-part approximation loop

use crate::clusters::{ClusterMap, ClusterTable};
use crate::orientation::repair_orientation;
use crate::{ApproximationMode, ApproximationOutput, ApproximationRequest, ShapeApproximator};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};
use vsacrate_core::{partition, MeshTopology, Part, TriangleMesh};

// ============================================================
// Part Sub-Mesh
// ============================================================

/// A part copied out as a standalone triangle mesh
#[derive(Debug, Clone, Default)]
pub struct PartMesh {
    pub mesh: TriangleMesh,
    /// Global vertex index for each local vertex
    pub vertex_map: Vec<usize>,
    /// Global triangle index for each local face
    pub triangle_map: Vec<usize>,
    /// Constrained edges in local vertex indices
    pub constrained_edges: Vec<[usize; 2]>,
}

/// Build the sub-mesh of one part from the global tables.
///
/// Local vertices follow `part.vertices` and local faces follow
/// `part.triangles`, keeping each triangle's winding.
pub fn extract_part_mesh(topology: &MeshTopology, part: &Part) -> PartMesh {
    let local: HashMap<usize, usize> = part
        .vertices
        .iter()
        .enumerate()
        .map(|(l, &g)| (g, l))
        .collect();

    let vertices = part
        .vertices
        .iter()
        .map(|&v| topology.vertices[v].position)
        .collect();
    let faces = part
        .triangles
        .iter()
        .map(|&t| topology.triangles[t].vertices.map(|v| local[&v]))
        .collect();
    let constrained_edges = part
        .edges
        .iter()
        .map(|&e| &topology.edges[e])
        .filter(|edge| edge.constrained)
        .map(|edge| edge.vertices.map(|v| local[&v]))
        .collect();

    PartMesh {
        mesh: TriangleMesh::from_vertices_and_faces(vertices, faces),
        vertex_map: part.vertices.clone(),
        triangle_map: part.triangles.clone(),
        constrained_edges,
    }
}

// ============================================================
// Outcomes
// ============================================================

/// Why a part produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Zero proxies or zero iterations were requested
    ZeroBudget,
    /// The routine flagged its own result as not well formed
    NotWellFormed,
    /// The routine answered with something unusable
    Rejected(String),
    /// The routine returned an error
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ZeroBudget => write!(f, "zero proxy or iteration budget"),
            SkipReason::NotWellFormed => write!(f, "result is not well formed"),
            SkipReason::Rejected(why) => write!(f, "result rejected: {}", why),
            SkipReason::Failed(why) => write!(f, "routine failed: {}", why),
        }
    }
}

/// Result for one part
#[derive(Debug, Clone, PartialEq)]
pub enum PartOutcome {
    Simplified(TriangleMesh),
    Segmented(ClusterTable),
    Skipped(SkipReason),
}

impl PartOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, PartOutcome::Skipped(_))
    }
}

/// Outcomes of one driver run, indexed by part
#[derive(Debug, Clone, PartialEq)]
pub struct DriverRun {
    pub mode: ApproximationMode,
    pub outcomes: Vec<PartOutcome>,
}

impl DriverRun {
    pub fn part_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn simplified_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PartOutcome::Simplified(_)))
            .count()
    }

    pub fn segmented_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PartOutcome::Segmented(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    /// Simplified meshes in part order
    pub fn meshes(&self) -> impl Iterator<Item = &TriangleMesh> {
        self.outcomes.iter().filter_map(|o| match o {
            PartOutcome::Simplified(mesh) => Some(mesh),
            _ => None,
        })
    }

    /// Cluster tables of all segmented parts
    pub fn cluster_map(&self) -> ClusterMap {
        let mut map = ClusterMap::new(self.outcomes.len());
        for outcome in &self.outcomes {
            if let PartOutcome::Segmented(table) = outcome {
                map.insert(table.clone());
            }
        }
        map
    }
}

impl fmt::Display for DriverRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Approximation ({:?}):", self.mode)?;
        writeln!(f, "  Parts: {}", self.part_count())?;
        writeln!(f, "  Simplified: {}", self.simplified_count())?;
        writeln!(f, "  Segmented: {}", self.segmented_count())?;
        writeln!(f, "  Skipped: {}", self.skipped_count())?;
        for (part, outcome) in self.outcomes.iter().enumerate() {
            if let PartOutcome::Skipped(reason) = outcome {
                writeln!(f, "    part {}: {}", part, reason)?;
            }
        }
        Ok(())
    }
}

// ============================================================
// Driver
// ============================================================

/// Budgets and mode shared by every part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub mode: ApproximationMode,
    pub max_proxies: usize,
    pub iterations: usize,
    /// Approximate parts on the rayon pool
    pub parallel: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            mode: ApproximationMode::Simplify,
            max_proxies: 0,
            iterations: 0,
            parallel: false,
        }
    }
}

impl DriverConfig {
    pub fn new(mode: ApproximationMode, max_proxies: usize, iterations: usize) -> Self {
        Self {
            mode,
            max_proxies,
            iterations,
            ..Default::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn has_budget(&self) -> bool {
        self.max_proxies > 0 && self.iterations > 0
    }
}

/// Runs a [`ShapeApproximator`] once per part
pub struct ApproximationDriver<A> {
    approximator: A,
    config: DriverConfig,
}

impl<A: ShapeApproximator + Sync> ApproximationDriver<A> {
    pub fn new(approximator: A, config: DriverConfig) -> Self {
        Self {
            approximator,
            config,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Approximate every part of the topology.
    ///
    /// Partitions first if that has not happened yet. In segment mode the
    /// dense cluster ids are written onto the triangles of each successful
    /// part; triangles of skipped parts have their cluster cleared.
    pub fn run(&self, topology: &mut MeshTopology) -> DriverRun {
        if topology.parts.is_empty() && !topology.triangles.is_empty() {
            partition(topology);
        }

        let shared: &MeshTopology = topology;
        let outcomes: Vec<PartOutcome> = if self.config.parallel {
            shared
                .parts
                .par_iter()
                .map(|part| self.approximate_part(shared, part))
                .collect()
        } else {
            shared
                .parts
                .iter()
                .map(|part| self.approximate_part(shared, part))
                .collect()
        };

        topology.clear_clusters();
        for outcome in &outcomes {
            if let PartOutcome::Segmented(table) = outcome {
                for (t, cluster) in table.iter() {
                    topology.triangles[t].cluster = Some(cluster);
                }
            }
        }

        let run = DriverRun {
            mode: self.config.mode,
            outcomes,
        };
        info!(
            "Approximated {} parts: {} simplified, {} segmented, {} skipped",
            run.part_count(),
            run.simplified_count(),
            run.segmented_count(),
            run.skipped_count()
        );
        run
    }

    /// Approximate a single part without touching the topology.
    pub fn approximate_part(&self, topology: &MeshTopology, part: &Part) -> PartOutcome {
        let outcome = self.try_part(topology, part);
        match &outcome {
            PartOutcome::Skipped(reason) => {
                warn!("Skipping part {}: {}", part.index, reason);
            }
            _ => debug!("Part {} approximated", part.index),
        }
        outcome
    }

    fn try_part(&self, topology: &MeshTopology, part: &Part) -> PartOutcome {
        if !self.config.has_budget() {
            return PartOutcome::Skipped(SkipReason::ZeroBudget);
        }

        let sub = extract_part_mesh(topology, part);
        let request = ApproximationRequest {
            mesh: &sub.mesh,
            constrained_edges: &sub.constrained_edges,
            max_proxies: self.config.max_proxies,
            iterations: self.config.iterations,
            mode: self.config.mode,
        };

        let output = match self.approximator.approximate(&request) {
            Ok(output) => output,
            Err(e) => return PartOutcome::Skipped(SkipReason::Failed(e.to_string())),
        };
        if output.mode() != self.config.mode {
            return PartOutcome::Skipped(SkipReason::Rejected(format!(
                "expected {:?} output, got {:?}",
                self.config.mode,
                output.mode()
            )));
        }
        if !output.is_well_formed() {
            return PartOutcome::Skipped(SkipReason::NotWellFormed);
        }

        match output {
            ApproximationOutput::Simplified {
                anchors, triangles, ..
            } => {
                let (mesh, repair) = repair_orientation(anchors, &triangles);
                if mesh.faces.is_empty() {
                    return PartOutcome::Skipped(SkipReason::Rejected(
                        "no usable triangles".to_string(),
                    ));
                }
                debug!(
                    "Part {}: {} anchors, {} triangles ({:?})",
                    part.index,
                    mesh.vertex_count(),
                    mesh.face_count(),
                    repair
                );
                PartOutcome::Simplified(mesh)
            }
            ApproximationOutput::Segmentation { face_proxies, .. } => {
                if let Some(&bad) = face_proxies.iter().find(|&&id| id >= self.config.max_proxies) {
                    return PartOutcome::Skipped(SkipReason::Rejected(format!(
                        "proxy id {} exceeds budget {}",
                        bad, self.config.max_proxies
                    )));
                }
                match ClusterTable::from_assignments(part.index, &sub.triangle_map, &face_proxies) {
                    Ok(table) => PartOutcome::Segmented(table),
                    Err(e) => PartOutcome::Skipped(SkipReason::Rejected(e.to_string())),
                }
            }
        }
    }
}
