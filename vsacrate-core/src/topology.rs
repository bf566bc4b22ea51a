//! Vertex, triangle, edge and face tables built from a host snapshot
//!
//! All entities live in flat arrays owned by [`MeshTopology`] and refer to
//! each other by index. Triangles link to the edges they were attached to;
//! edges list their one or two adjacent triangles. Connected parts are filled
//! in afterwards by [`crate::components::partition`].

use crate::components::Part;
use crate::error::{Error, Result};
use crate::host::HostMesh;
use crate::point::*;
use crate::triangulate::{EarClipTriangulator, Triangulator};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// A vertex, deduplicated by host point identity
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Point3f,
    /// Host point this vertex was created from
    pub source: PointId,
    /// Host lock mark
    pub locked: bool,
}

/// A triangle produced by triangulating a host polygon
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    /// Ordered vertex indices; the order defines facing
    pub vertices: [usize; 3],
    /// Edge linked for each side `(vertices[i], vertices[(i + 1) % 3])`.
    /// `None` when that side would have been a third incidence on its edge.
    pub edges: [Option<usize>; 3],
    /// Index into the face table
    pub face: usize,
    pub part: Option<usize>,
    /// Dense per-part cluster id, set by a segmentation run
    pub cluster: Option<usize>,
    /// Set when at least one side could not be linked to its edge
    pub non_manifold: bool,
}

/// An undirected edge with its adjacent triangles
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Endpoint vertex indices, ascending
    pub vertices: [usize; 2],
    /// One (boundary) or two (interior) adjacent triangles
    pub triangles: Vec<usize>,
    /// Must stay fixed during clustering
    pub constrained: bool,
}

impl Edge {
    pub fn is_boundary(&self) -> bool {
        self.triangles.len() == 1
    }

    pub fn is_interior(&self) -> bool {
        self.triangles.len() == 2
    }

    /// The triangle on the other side of `triangle`, if any.
    pub fn opposite(&self, triangle: usize) -> Option<usize> {
        self.triangles.iter().copied().find(|&t| t != triangle)
    }
}

/// An original host polygon and the triangles it was split into
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub source: PolygonId,
    /// Triangle indices in triangulation order; never empty
    pub triangles: Vec<usize>,
    pub part: Option<usize>,
    pub material: Option<String>,
}

impl Face {
    /// The triangle whose cluster stands for the whole face.
    pub fn representative(&self) -> usize {
        self.triangles[0]
    }
}

/// An input problem that was skipped during the build
#[derive(Debug, Clone, PartialEq)]
pub enum Defect {
    /// The polygon references a point that is not in the snapshot
    UnknownPoint { polygon: PolygonId, point: PointId },
    /// The triangulator rejected the polygon
    UntriangulableFace { polygon: PolygonId },
    /// A triangle of the polygon repeats a point
    DegenerateTriangle { polygon: PolygonId },
    /// A triangle of the polygon would be the third one on an edge
    NonManifoldEdge {
        polygon: PolygonId,
        endpoints: [PointId; 2],
    },
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::UnknownPoint { polygon, point } => {
                write!(f, "polygon {} references unknown point {}", polygon, point)
            }
            Defect::UntriangulableFace { polygon } => {
                write!(f, "polygon {} could not be triangulated", polygon)
            }
            Defect::DegenerateTriangle { polygon } => {
                write!(f, "polygon {} produced a degenerate triangle", polygon)
            }
            Defect::NonManifoldEdge { polygon, endpoints } => write!(
                f,
                "polygon {} adds a third triangle to edge {}-{}",
                polygon, endpoints[0], endpoints[1]
            ),
        }
    }
}

/// Counts of everything the build skipped or flagged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Polygons that contributed no triangle
    pub skipped_faces: usize,
    /// Triangles dropped because they repeat a vertex
    pub degenerate_triangles: usize,
    /// Triangles kept but not linked to an overfull edge
    pub non_manifold_triangles: usize,
    pub defects: Vec<Defect>,
}

impl BuildReport {
    /// True when nothing was skipped or flagged
    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }

    fn record(&mut self, defect: Defect) {
        warn!("Skipping input: {}", defect);
        self.defects.push(defect);
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Topology Build:")?;
        writeln!(f, "  Skipped faces: {}", self.skipped_faces)?;
        writeln!(f, "  Degenerate triangles: {}", self.degenerate_triangles)?;
        writeln!(f, "  Non-manifold triangles: {}", self.non_manifold_triangles)?;
        for defect in &self.defects {
            writeln!(f, "    {}", defect)?;
        }
        Ok(())
    }
}

/// Topological tables for one host mesh
#[derive(Debug, Clone, Default)]
pub struct MeshTopology {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub edges: Vec<Edge>,
    pub faces: Vec<Face>,
    /// Connected parts; empty until partitioned
    pub parts: Vec<Part>,
    pub report: BuildReport,
    edge_lookup: HashMap<(usize, usize), usize>,
}

impl MeshTopology {
    /// Build with the default (ear clipping) triangulator
    pub fn from_host(host: &HostMesh) -> Result<Self> {
        TopologyBuilder::new().build(host)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Check if the topology has no triangles
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Edge index between two vertices, in either order
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&(a.min(b), a.max(b))).copied()
    }

    /// Triangles sharing a linked edge with `triangle`
    pub fn triangle_neighbors(&self, triangle: usize) -> impl Iterator<Item = usize> + '_ {
        self.triangles[triangle]
            .edges
            .iter()
            .flatten()
            .filter_map(move |&e| self.edges[e].opposite(triangle))
    }

    /// Cluster reported for a face: the cluster of its first triangle
    pub fn face_cluster(&self, face: usize) -> Option<usize> {
        self.triangles[self.faces[face].representative()].cluster
    }

    /// Host material tag of the face a triangle came from
    pub fn triangle_material(&self, triangle: usize) -> Option<&str> {
        self.faces[self.triangles[triangle].face].material.as_deref()
    }

    /// Host point ids of an edge's endpoints
    pub fn edge_endpoints(&self, edge: usize) -> [PointId; 2] {
        let [a, b] = self.edges[edge].vertices;
        [self.vertices[a].source, self.vertices[b].source]
    }

    /// Forget every cluster assignment
    pub fn clear_clusters(&mut self) {
        for triangle in &mut self.triangles {
            triangle.cluster = None;
        }
    }

    /// Attach a triangle's sides to the edge table.
    fn link_triangle(&mut self, t: usize, polygon: PolygonId) {
        let corners = self.triangles[t].vertices;
        for side in 0..3 {
            let a = corners[side];
            let b = corners[(side + 1) % 3];
            let key = (a.min(b), a.max(b));

            match self.edge_lookup.get(&key).copied() {
                Some(e) if self.edges[e].triangles.len() < 2 => {
                    self.edges[e].triangles.push(t);
                    self.triangles[t].edges[side] = Some(e);
                }
                Some(_) => {
                    if !self.triangles[t].non_manifold {
                        self.triangles[t].non_manifold = true;
                        self.report.non_manifold_triangles += 1;
                    }
                    let endpoints = [self.vertices[key.0].source, self.vertices[key.1].source];
                    self.report
                        .record(Defect::NonManifoldEdge { polygon, endpoints });
                }
                None => {
                    let e = self.edges.len();
                    self.edges.push(Edge {
                        vertices: [key.0, key.1],
                        triangles: vec![t],
                        constrained: false,
                    });
                    self.edge_lookup.insert(key, e);
                    self.triangles[t].edges[side] = Some(e);
                }
            }
        }
    }
}

/// Builds [`MeshTopology`] tables from a [`HostMesh`]
pub struct TopologyBuilder {
    triangulator: Box<dyn Triangulator + Send + Sync>,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self {
            triangulator: Box::new(EarClipTriangulator),
        }
    }
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different triangulator for non-triangular polygons
    pub fn with_triangulator<T>(mut self, triangulator: T) -> Self
    where
        T: Triangulator + Send + Sync + 'static,
    {
        self.triangulator = Box::new(triangulator);
        self
    }

    /// Build vertex, triangle, edge and face tables.
    ///
    /// Input defects are skipped and recorded in [`MeshTopology::report`];
    /// only a snapshot with duplicate point ids is rejected.
    pub fn build(&self, host: &HostMesh) -> Result<MeshTopology> {
        let mut point_lookup: HashMap<PointId, usize> = HashMap::with_capacity(host.points.len());
        for (i, point) in host.points.iter().enumerate() {
            if point_lookup.insert(point.id, i).is_some() {
                return Err(Error::InvalidData(format!(
                    "Duplicate host point id {}",
                    point.id
                )));
            }
        }

        let mut topology = MeshTopology::default();
        let mut vertex_lookup: HashMap<PointId, usize> = HashMap::with_capacity(host.points.len());

        for polygon in &host.polygons {
            let resolved: std::result::Result<Vec<usize>, PointId> = polygon
                .points
                .iter()
                .map(|id| point_lookup.get(id).copied().ok_or(*id))
                .collect();
            let corners = match resolved {
                Ok(corners) => corners,
                Err(point) => {
                    topology.report.skipped_faces += 1;
                    topology.report.record(Defect::UnknownPoint {
                        polygon: polygon.id,
                        point,
                    });
                    continue;
                }
            };

            let positions: Vec<Point3f> = corners.iter().map(|&i| host.points[i].position).collect();
            let local = match self.triangulator.triangulate(&positions) {
                Some(local) if local.iter().flatten().all(|&i| i < corners.len()) => local,
                _ => {
                    topology.report.skipped_faces += 1;
                    topology
                        .report
                        .record(Defect::UntriangulableFace { polygon: polygon.id });
                    continue;
                }
            };

            let face_index = topology.faces.len();
            let mut face_triangles = Vec::with_capacity(local.len());

            for tri in local {
                let ids = tri.map(|i| polygon.points[i]);
                if !ids.iter().all_unique() {
                    topology.report.degenerate_triangles += 1;
                    topology
                        .report
                        .record(Defect::DegenerateTriangle { polygon: polygon.id });
                    continue;
                }

                let vertices = tri.map(|i| {
                    let point = &host.points[corners[i]];
                    *vertex_lookup.entry(point.id).or_insert_with(|| {
                        topology.vertices.push(Vertex {
                            position: point.position,
                            source: point.id,
                            locked: point.locked,
                        });
                        topology.vertices.len() - 1
                    })
                });

                let t = topology.triangles.len();
                topology.triangles.push(Triangle {
                    vertices,
                    edges: [None; 3],
                    face: face_index,
                    part: None,
                    cluster: None,
                    non_manifold: false,
                });
                topology.link_triangle(t, polygon.id);
                face_triangles.push(t);
            }

            if face_triangles.is_empty() {
                topology.report.skipped_faces += 1;
                debug!("Polygon {} contributed no triangles", polygon.id);
                continue;
            }

            topology.faces.push(Face {
                source: polygon.id,
                triangles: face_triangles,
                part: None,
                material: polygon.material.clone(),
            });
        }

        info!(
            "Built topology: {} vertices, {} triangles, {} edges, {} faces ({} skipped)",
            topology.vertices.len(),
            topology.triangles.len(),
            topology.edges.len(),
            topology.faces.len(),
            topology.report.skipped_faces
        );

        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostPoint;
    use crate::triangulate::FanTriangulator;

    fn make_quad_pair() -> HostMesh {
        // Two quads sharing the edge 1-4
        let mut host = HostMesh::new();
        let p: Vec<PointId> = [
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (2.0, 1.0),
        ]
        .iter()
        .map(|&(x, y)| host.add_point(Point3f::new(x, y, 0.0)))
        .collect();
        host.add_polygon(&[p[0], p[1], p[4], p[3]], Some("a"));
        host.add_polygon(&[p[1], p[2], p[5], p[4]], Some("b"));
        host
    }

    #[test]
    fn test_quad_pair_tables() {
        let topology = MeshTopology::from_host(&make_quad_pair()).unwrap();
        assert_eq!(topology.vertex_count(), 6);
        assert_eq!(topology.triangle_count(), 4);
        assert_eq!(topology.face_count(), 2);
        // 7 grid edges + 2 diagonals
        assert_eq!(topology.edge_count(), 9);
        assert!(topology.report.is_clean());

        for edge in &topology.edges {
            assert!((1..=2).contains(&edge.triangles.len()));
            assert!(edge.vertices[0] < edge.vertices[1]);
        }
        assert_eq!(topology.faces[0].triangles, vec![0, 1]);
        assert_eq!(topology.faces[1].material.as_deref(), Some("b"));
    }

    #[test]
    fn test_shared_edge_links_both_triangles() {
        let topology = MeshTopology::from_host(&make_quad_pair()).unwrap();
        // Host points 1 and 4 are the shared quad side
        let v1 = topology.vertices.iter().position(|v| v.source == PointId(1)).unwrap();
        let v4 = topology.vertices.iter().position(|v| v.source == PointId(4)).unwrap();
        let e = topology.edge_between(v4, v1).unwrap();
        assert!(topology.edges[e].is_interior());

        let [t0, t1] = [topology.edges[e].triangles[0], topology.edges[e].triangles[1]];
        assert_ne!(topology.triangles[t0].face, topology.triangles[t1].face);
        assert!(topology.triangle_neighbors(t0).any(|n| n == t1));
    }

    #[test]
    fn test_vertices_dedup_by_identity_not_position() {
        let mut host = HostMesh::new();
        let a = host.add_point(Point3f::new(0.0, 0.0, 0.0));
        let b = host.add_point(Point3f::new(1.0, 0.0, 0.0));
        let c = host.add_point(Point3f::new(0.0, 1.0, 0.0));
        // Coincident with `b` but a different host point
        let d = host.add_point(Point3f::new(1.0, 0.0, 0.0));
        let e = host.add_point(Point3f::new(1.0, 1.0, 0.0));
        host.add_polygon(&[a, b, c], None);
        host.add_polygon(&[d, e, c], None);

        let topology = MeshTopology::from_host(&host).unwrap();
        assert_eq!(topology.vertex_count(), 5);
        // No shared edge between the triangles: b and d are distinct
        assert!(topology.edges.iter().all(|edge| edge.is_boundary()));
    }

    #[test]
    fn test_degenerate_triangle_skipped() {
        let mut host = HostMesh::new();
        let a = host.add_point(Point3f::new(0.0, 0.0, 0.0));
        let b = host.add_point(Point3f::new(1.0, 0.0, 0.0));
        let c = host.add_point(Point3f::new(0.0, 1.0, 0.0));
        host.add_polygon(&[a, b, b], None);
        host.add_polygon(&[a, b, c], None);

        let topology = TopologyBuilder::new()
            .with_triangulator(FanTriangulator)
            .build(&host)
            .unwrap();
        assert_eq!(topology.triangle_count(), 1);
        assert_eq!(topology.face_count(), 1);
        assert_eq!(topology.report.degenerate_triangles, 1);
        assert_eq!(topology.report.skipped_faces, 1);
        assert_eq!(topology.triangles[0].face, 0);
    }

    #[test]
    fn test_untriangulable_and_unknown_faces_skipped() {
        let mut host = HostMesh::new();
        let a = host.add_point(Point3f::new(0.0, 0.0, 0.0));
        let b = host.add_point(Point3f::new(1.0, 0.0, 0.0));
        let c = host.add_point(Point3f::new(0.0, 1.0, 0.0));
        host.add_polygon(&[a, b], None);
        host.add_polygon(&[a, b, PointId(99)], None);
        host.add_polygon(&[a, b, c], None);

        let topology = MeshTopology::from_host(&host).unwrap();
        assert_eq!(topology.face_count(), 1);
        assert_eq!(topology.report.skipped_faces, 2);
        assert!(matches!(
            topology.report.defects[0],
            Defect::UntriangulableFace { .. }
        ));
        assert!(matches!(
            topology.report.defects[1],
            Defect::UnknownPoint { point: PointId(99), .. }
        ));
    }

    #[test]
    fn test_non_manifold_edge_flagged() {
        // Three triangles fanning around edge a-b
        let mut host = HostMesh::new();
        let a = host.add_point(Point3f::new(0.0, 0.0, 0.0));
        let b = host.add_point(Point3f::new(1.0, 0.0, 0.0));
        let c = host.add_point(Point3f::new(0.5, 1.0, 0.0));
        let d = host.add_point(Point3f::new(0.5, -1.0, 0.0));
        let e = host.add_point(Point3f::new(0.5, 0.0, 1.0));
        host.add_polygon(&[a, b, c], None);
        host.add_polygon(&[b, a, d], None);
        host.add_polygon(&[a, b, e], None);

        let topology = MeshTopology::from_host(&host).unwrap();
        assert_eq!(topology.triangle_count(), 3);
        assert_eq!(topology.report.non_manifold_triangles, 1);
        assert!(topology.triangles[2].non_manifold);
        assert!(topology.triangles[2].edges[0].is_none());
        for edge in &topology.edges {
            assert!((1..=2).contains(&edge.triangles.len()));
        }
    }

    #[test]
    fn test_duplicate_point_ids_rejected() {
        let mut host = HostMesh::new();
        host.points.push(HostPoint {
            id: PointId(1),
            position: Point3f::new(0.0, 0.0, 0.0),
            locked: false,
        });
        host.points.push(HostPoint {
            id: PointId(1),
            position: Point3f::new(1.0, 0.0, 0.0),
            locked: false,
        });
        assert!(MeshTopology::from_host(&host).is_err());
    }

    #[test]
    fn test_lock_mark_copied() {
        let mut host = make_quad_pair();
        host.set_locked(PointId(0), true);
        let topology = MeshTopology::from_host(&host).unwrap();
        let v0 = topology.vertices.iter().find(|v| v.source == PointId(0)).unwrap();
        assert!(v0.locked);
        assert_eq!(topology.vertices.iter().filter(|v| v.locked).count(), 1);
    }
}
