//! Writes cluster results back through a [`MeshEditor`]
//!
//! Segmentation output never changes topology: it tags polygons, selects
//! edges between clusters or colors polygon corners. A face reports the
//! cluster of its first triangle. Simplified output is written as new
//! points and triangles.

use crate::colors::ProxyColorTable;
use crate::editor::{MeshEditor, TagKind};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use vsacrate_approximation::ClusterMap;
use vsacrate_core::{Error, MeshTopology, PointId, Result, TriangleMesh};

/// Name of the per-face-vertex RGB map written by [`color_faces`]
pub const SEGMENT_COLOR_MAP: &str = "Segment";

/// Default name of the edge selection set
pub const DEFAULT_SELECTION_SET: &str = "Segment";

/// Where a segmentation is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SegmentTarget {
    /// Material polygon tags
    #[default]
    Material,
    /// Part polygon tags
    Part,
    /// Weight 1.0 on every edge between two clusters
    EdgeSelection,
}

/// Counts of what a segmentation encode touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    pub tagged_polygons: usize,
    pub selected_edges: usize,
    pub colored_polygons: usize,
}

impl fmt::Display for EncodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Segmentation Output:")?;
        writeln!(f, "  Tagged polygons: {}", self.tagged_polygons)?;
        writeln!(f, "  Selected edges: {}", self.selected_edges)?;
        writeln!(f, "  Colored polygons: {}", self.colored_polygons)
    }
}

/// Counts of geometry written by [`write_geometry`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometrySummary {
    pub points: usize,
    pub polygons: usize,
}

/// Faces that have a cluster, with their part and cluster ids
fn clustered_faces(topology: &MeshTopology) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
    (0..topology.face_count()).filter_map(move |f| {
        let part = topology.faces[f].part?;
        let cluster = topology.face_cluster(f)?;
        Some((f, part, cluster))
    })
}

/// Host points at the corners of a face, in triangle order
fn face_points(topology: &MeshTopology, face: usize) -> Vec<PointId> {
    topology.faces[face]
        .triangles
        .iter()
        .flat_map(|&t| topology.triangles[t].vertices)
        .unique()
        .map(|v| topology.vertices[v].source)
        .collect()
}

/// Write each clustered face's global tag as a polygon tag.
pub fn tag_polygons<E: MeshEditor + ?Sized>(
    editor: &mut E,
    topology: &MeshTopology,
    clusters: &ClusterMap,
    kind: TagKind,
) -> Result<usize> {
    let mut tagged = 0;
    for (f, part, cluster) in clustered_faces(topology) {
        let tag = clusters.global_tag(part, cluster);
        editor.set_polygon_tag(topology.faces[f].source, kind, &tag)?;
        tagged += 1;
    }
    debug!("Tagged {} polygons ({:?})", tagged, kind);
    Ok(tagged)
}

/// Select every interior edge whose two triangles are in different clusters.
///
/// The named set is created if it is missing. Boundary edges and edges
/// inside one cluster are not touched.
pub fn select_cluster_edges<E: MeshEditor + ?Sized>(
    editor: &mut E,
    topology: &MeshTopology,
    set_name: &str,
) -> Result<usize> {
    editor.ensure_edge_map(set_name)?;

    let mut selected = 0;
    for (e, edge) in topology.edges.iter().enumerate() {
        let [a, b] = match edge.triangles.as_slice() {
            [a, b] => [*a, *b],
            _ => continue,
        };
        match (topology.triangles[a].cluster, topology.triangles[b].cluster) {
            (Some(ca), Some(cb)) if ca != cb => {
                editor.set_edge_weight(set_name, topology.edge_endpoints(e), 1.0)?;
                selected += 1;
            }
            _ => {}
        }
    }
    debug!("Selected {} edges in '{}'", selected, set_name);
    Ok(selected)
}

/// Color every corner of each clustered face with its cluster's color.
///
/// The color table is grown once to the largest cluster count of any part.
/// A point shared by faces of different clusters keeps the color of the
/// face written last.
pub fn color_faces<E: MeshEditor + ?Sized>(
    editor: &mut E,
    topology: &MeshTopology,
    clusters: &ClusterMap,
    colors: &mut ProxyColorTable,
) -> Result<usize> {
    let palette = colors.ensure(clusters.max_cluster_count());
    editor.ensure_color_map(SEGMENT_COLOR_MAP)?;

    let mut colored = 0;
    for (f, _, cluster) in clustered_faces(topology) {
        let Some(&color) = palette.get(cluster) else {
            continue;
        };
        let polygon = topology.faces[f].source;
        for point in face_points(topology, f) {
            editor.set_face_vertex_color(SEGMENT_COLOR_MAP, polygon, point, color)?;
        }
        colored += 1;
    }
    Ok(colored)
}

/// Encode a segmentation into the chosen target, plus colors when a table
/// is given.
pub fn encode_segmentation<E: MeshEditor + ?Sized>(
    editor: &mut E,
    topology: &MeshTopology,
    clusters: &ClusterMap,
    target: SegmentTarget,
    set_name: &str,
    colors: Option<&mut ProxyColorTable>,
) -> Result<EncodeSummary> {
    let mut summary = EncodeSummary::default();

    match target {
        SegmentTarget::Material => {
            summary.tagged_polygons = tag_polygons(editor, topology, clusters, TagKind::Material)?
        }
        SegmentTarget::Part => {
            summary.tagged_polygons = tag_polygons(editor, topology, clusters, TagKind::Part)?
        }
        SegmentTarget::EdgeSelection => {
            summary.selected_edges = select_cluster_edges(editor, topology, set_name)?
        }
    }
    if let Some(colors) = colors {
        summary.colored_polygons = color_faces(editor, topology, clusters, colors)?;
    }

    info!(
        "Encoded segmentation: {} tags, {} edges, {} colored",
        summary.tagged_polygons, summary.selected_edges, summary.colored_polygons
    );
    Ok(summary)
}

/// Write meshes as new points and triangle polygons.
///
/// A mesh with a face referencing a missing vertex is rejected before any
/// of its points are written.
pub fn write_geometry<'a, E, I>(editor: &mut E, meshes: I) -> Result<GeometrySummary>
where
    E: MeshEditor + ?Sized,
    I: IntoIterator<Item = &'a TriangleMesh>,
{
    let mut summary = GeometrySummary::default();

    for mesh in meshes {
        if let Some(face) = mesh
            .faces
            .iter()
            .find(|face| face.iter().any(|&i| i >= mesh.vertices.len()))
        {
            return Err(Error::InvalidData(format!(
                "Face {:?} references a vertex outside 0..{}",
                face,
                mesh.vertices.len()
            )));
        }
        let ids = mesh
            .vertices
            .iter()
            .map(|&p| editor.add_point(p))
            .collect::<Result<Vec<PointId>>>()?;
        for face in &mesh.faces {
            editor.add_polygon(&face.map(|i| ids[i]))?;
        }
        summary.points += ids.len();
        summary.polygons += mesh.faces.len();
    }

    info!(
        "Wrote {} points and {} polygons",
        summary.points, summary.polygons
    );
    Ok(summary)
}
