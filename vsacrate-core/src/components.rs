//! Connected part detection over the edge table

use crate::topology::MeshTopology;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info};

/// A maximal edge-connected set of triangles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Position in discovery order
    pub index: usize,
    /// Triangle indices in traversal order
    pub triangles: Vec<usize>,
    /// Vertices touched by the part, in first-use order
    pub vertices: Vec<usize>,
    /// Edges linked to the part's triangles
    pub edges: Vec<usize>,
}

impl Part {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.triangles.len() == 1
    }
}

/// Summary of a partition run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionSummary {
    pub part_count: usize,
    pub largest_part: usize,
    pub smallest_part: usize,
    pub singleton_parts: usize,
}

impl fmt::Display for PartitionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partition:")?;
        writeln!(f, "  Parts: {}", self.part_count)?;
        writeln!(f, "  Largest part: {} triangles", self.largest_part)?;
        writeln!(f, "  Smallest part: {} triangles", self.smallest_part)?;
        writeln!(f, "  Singleton parts: {}", self.singleton_parts)
    }
}

/// Group triangles into connected parts.
///
/// Adjacency comes only from linked edges, so triangles touching at a single
/// vertex end up in different parts. Traversal seeds are taken in triangle
/// table order, which makes part numbering deterministic. Any previous parts
/// are discarded.
pub fn partition(topology: &mut MeshTopology) -> PartitionSummary {
    let triangle_count = topology.triangles.len();
    let mut assigned: Vec<Option<usize>> = vec![None; triangle_count];
    let mut vertex_mark: Vec<Option<usize>> = vec![None; topology.vertices.len()];
    let mut edge_seen = vec![false; topology.edges.len()];
    let mut parts: Vec<Part> = Vec::new();

    for seed in 0..triangle_count {
        if assigned[seed].is_some() {
            continue;
        }

        let index = parts.len();
        let mut part = Part {
            index,
            ..Default::default()
        };
        let mut queue = VecDeque::new();
        assigned[seed] = Some(index);
        queue.push_back(seed);

        while let Some(t) = queue.pop_front() {
            part.triangles.push(t);

            for &v in &topology.triangles[t].vertices {
                if vertex_mark[v] != Some(index) {
                    vertex_mark[v] = Some(index);
                    part.vertices.push(v);
                }
            }

            for &e in topology.triangles[t].edges.iter().flatten() {
                if !edge_seen[e] {
                    edge_seen[e] = true;
                    part.edges.push(e);
                }
                if let Some(n) = topology.edges[e].opposite(t) {
                    if assigned[n].is_none() {
                        assigned[n] = Some(index);
                        queue.push_back(n);
                    }
                }
            }
        }

        debug!(
            "Part {}: {} triangles, {} vertices, {} edges",
            index,
            part.triangles.len(),
            part.vertices.len(),
            part.edges.len()
        );
        parts.push(part);
    }

    for (triangle, part) in topology.triangles.iter_mut().zip(&assigned) {
        triangle.part = *part;
    }
    for face in &mut topology.faces {
        face.part = assigned[face.representative()];
    }

    let summary = PartitionSummary {
        part_count: parts.len(),
        largest_part: parts.iter().map(Part::triangle_count).max().unwrap_or(0),
        smallest_part: parts.iter().map(Part::triangle_count).min().unwrap_or(0),
        singleton_parts: parts.iter().filter(|p| p.is_singleton()).count(),
    };
    info!(
        "Found {} connected parts ({} singletons)",
        summary.part_count, summary.singleton_parts
    );

    topology.parts = parts;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostMesh;
    use crate::point::*;

    fn make_two_triangles() -> HostMesh {
        let mut host = HostMesh::new();
        let a = host.add_point(Point3f::new(0.0, 0.0, 0.0));
        let b = host.add_point(Point3f::new(1.0, 0.0, 0.0));
        let c = host.add_point(Point3f::new(0.0, 1.0, 0.0));
        let d = host.add_point(Point3f::new(5.0, 0.0, 0.0));
        let e = host.add_point(Point3f::new(6.0, 0.0, 0.0));
        let f = host.add_point(Point3f::new(5.0, 1.0, 0.0));
        host.add_polygon(&[a, b, c], None);
        host.add_polygon(&[d, e, f], None);
        host
    }

    #[test]
    fn test_disjoint_triangles_are_separate_parts() {
        let mut topology = MeshTopology::from_host(&make_two_triangles()).unwrap();
        let summary = partition(&mut topology);

        assert_eq!(summary.part_count, 2);
        assert_eq!(summary.singleton_parts, 2);
        assert_eq!(topology.parts[0].triangles, vec![0]);
        assert_eq!(topology.parts[1].triangles, vec![1]);
        assert_eq!(topology.triangles[1].part, Some(1));
        assert_eq!(topology.faces[1].part, Some(1));
        assert_eq!(topology.parts[0].edges.len(), 3);
    }

    #[test]
    fn test_vertex_contact_does_not_connect() {
        // Bow-tie: two triangles sharing only vertex b
        let mut host = HostMesh::new();
        let a = host.add_point(Point3f::new(0.0, 0.0, 0.0));
        let b = host.add_point(Point3f::new(1.0, 0.0, 0.0));
        let c = host.add_point(Point3f::new(0.0, 1.0, 0.0));
        let d = host.add_point(Point3f::new(2.0, 0.0, 0.0));
        let e = host.add_point(Point3f::new(2.0, 1.0, 0.0));
        host.add_polygon(&[a, b, c], None);
        host.add_polygon(&[b, d, e], None);

        let mut topology = MeshTopology::from_host(&host).unwrap();
        let summary = partition(&mut topology);
        assert_eq!(summary.part_count, 2);
        // The shared vertex appears in both part views
        assert!(topology.parts[0].vertices.contains(&1));
        assert!(topology.parts[1].vertices.contains(&1));
    }

    #[test]
    fn test_connected_strip_is_one_part() {
        let mut host = HostMesh::new();
        let p: Vec<_> = (0..6)
            .map(|i| host.add_point(Point3f::new((i / 2) as f32, (i % 2) as f32, 0.0)))
            .collect();
        host.add_polygon(&[p[0], p[2], p[3], p[1]], None);
        host.add_polygon(&[p[2], p[4], p[5], p[3]], None);

        let mut topology = MeshTopology::from_host(&host).unwrap();
        let summary = partition(&mut topology);
        assert_eq!(summary.part_count, 1);
        assert_eq!(summary.largest_part, 4);
        assert_eq!(topology.parts[0].vertices.len(), 6);
        assert_eq!(topology.parts[0].edges.len(), topology.edge_count());
        assert_eq!(topology.parts[0].triangles[0], 0);
    }

    #[test]
    fn test_partition_of_empty_topology() {
        let mut topology = MeshTopology::default();
        let summary = partition(&mut topology);
        assert_eq!(summary, PartitionSummary::default());
        assert!(topology.parts.is_empty());
    }

    #[test]
    fn test_repartition_replaces_parts() {
        let mut topology = MeshTopology::from_host(&make_two_triangles()).unwrap();
        partition(&mut topology);
        let summary = partition(&mut topology);
        assert_eq!(summary.part_count, 2);
        assert_eq!(topology.parts.len(), 2);
    }
}
