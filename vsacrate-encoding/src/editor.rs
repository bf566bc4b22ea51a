//! Host mesh mutation interface and an in-memory implementation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use vsacrate_core::{
    Error, HostMesh, HostPolygon, Point3f, PointId, PolygonId, Result, TriangleMesh,
};

/// Which polygon tag a segmentation writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    Material,
    Part,
}

/// Mutations the output encoder needs from a host mesh.
///
/// Points and polygons are addressed by host identity.
pub trait MeshEditor {
    /// Create a point and return its id
    fn add_point(&mut self, position: Point3f) -> Result<PointId>;

    /// Create an untagged polygon over existing points
    fn add_polygon(&mut self, points: &[PointId]) -> Result<PolygonId>;

    /// Remove all points and polygons
    fn clear(&mut self) -> Result<()>;

    fn set_polygon_tag(&mut self, polygon: PolygonId, kind: TagKind, tag: &str) -> Result<()>;

    /// Create the named edge weight map if it does not exist yet
    fn ensure_edge_map(&mut self, name: &str) -> Result<()>;

    /// Set the weight of the edge between two points in a named map
    fn set_edge_weight(&mut self, map: &str, endpoints: [PointId; 2], weight: f32) -> Result<()>;

    /// Create the named per-face-vertex color map if it does not exist yet
    fn ensure_color_map(&mut self, name: &str) -> Result<()>;

    /// Set the color of one polygon corner in a named map
    fn set_face_vertex_color(
        &mut self,
        map: &str,
        polygon: PolygonId,
        point: PointId,
        color: [f32; 3],
    ) -> Result<()>;
}

/// A [`MeshEditor`] that keeps everything in memory.
///
/// Point and polygon ids are indexed, so every edit is a hash lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "EditableMeshRecord")]
pub struct EditableMesh {
    mesh: HostMesh,
    part_tags: HashMap<PolygonId, String>,
    edge_maps: BTreeMap<String, HashMap<(PointId, PointId), f32>>,
    color_maps: BTreeMap<String, HashMap<(PolygonId, PointId), [f32; 3]>>,
    #[serde(skip)]
    point_index: HashMap<PointId, usize>,
    #[serde(skip)]
    polygon_index: HashMap<PolygonId, usize>,
}

/// Serialized form of [`EditableMesh`]; the id indices are rebuilt on load
#[derive(Deserialize)]
struct EditableMeshRecord {
    mesh: HostMesh,
    part_tags: HashMap<PolygonId, String>,
    edge_maps: BTreeMap<String, HashMap<(PointId, PointId), f32>>,
    color_maps: BTreeMap<String, HashMap<(PolygonId, PointId), [f32; 3]>>,
}

impl From<EditableMeshRecord> for EditableMesh {
    fn from(record: EditableMeshRecord) -> Self {
        let mut editor = Self {
            mesh: record.mesh,
            part_tags: record.part_tags,
            edge_maps: record.edge_maps,
            color_maps: record.color_maps,
            ..Default::default()
        };
        editor.reindex();
        editor
    }
}

impl EditableMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing a copy of a host snapshot. Material tags are kept.
    pub fn from_host(mesh: HostMesh) -> Self {
        let mut editor = Self {
            mesh,
            ..Default::default()
        };
        editor.reindex();
        editor
    }

    /// The points and polygons as currently edited
    pub fn host(&self) -> &HostMesh {
        &self.mesh
    }

    pub fn point_count(&self) -> usize {
        self.mesh.point_count()
    }

    pub fn polygon_count(&self) -> usize {
        self.mesh.polygon_count()
    }

    pub fn polygon_tag(&self, polygon: PolygonId, kind: TagKind) -> Option<&str> {
        match kind {
            TagKind::Material => self
                .polygon(polygon)
                .and_then(|p| p.material.as_deref()),
            TagKind::Part => self.part_tags.get(&polygon).map(String::as_str),
        }
    }

    pub fn has_edge_map(&self, name: &str) -> bool {
        self.edge_maps.contains_key(name)
    }

    /// Weight of an edge in a named map, in either endpoint order
    pub fn edge_weight(&self, map: &str, a: PointId, b: PointId) -> Option<f32> {
        self.edge_maps.get(map)?.get(&(a.min(b), a.max(b))).copied()
    }

    /// Number of edges carrying a weight in a named map
    pub fn edge_map_len(&self, map: &str) -> usize {
        self.edge_maps.get(map).map_or(0, HashMap::len)
    }

    pub fn has_color_map(&self, name: &str) -> bool {
        self.color_maps.contains_key(name)
    }

    pub fn face_vertex_color(&self, map: &str, polygon: PolygonId, point: PointId) -> Option<[f32; 3]> {
        self.color_maps.get(map)?.get(&(polygon, point)).copied()
    }

    /// Triangle mesh of all triangular polygons, for inspecting written geometry
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        let index: HashMap<PointId, usize> = self
            .mesh
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        let mut mesh = TriangleMesh::new();
        mesh.vertices = self.mesh.points.iter().map(|p| p.position).collect();
        for polygon in &self.mesh.polygons {
            if let [a, b, c] = polygon.points[..] {
                if let (Some(&a), Some(&b), Some(&c)) = (index.get(&a), index.get(&b), index.get(&c)) {
                    mesh.add_face([a, b, c]);
                }
            }
        }
        mesh
    }

    fn reindex(&mut self) {
        self.point_index = self
            .mesh
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        self.polygon_index = self
            .mesh
            .polygons
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
    }

    fn polygon(&self, id: PolygonId) -> Option<&HostPolygon> {
        self.polygon_index.get(&id).map(|&i| &self.mesh.polygons[i])
    }

    fn has_point(&self, id: PointId) -> bool {
        self.point_index.contains_key(&id)
    }

    fn require_polygon(&self, id: PolygonId) -> Result<usize> {
        self.polygon_index
            .get(&id)
            .copied()
            .ok_or_else(|| Error::Host(format!("Unknown polygon {}", id)))
    }
}

impl MeshEditor for EditableMesh {
    fn add_point(&mut self, position: Point3f) -> Result<PointId> {
        let id = self.mesh.add_point(position);
        self.point_index.insert(id, self.mesh.points.len() - 1);
        Ok(id)
    }

    fn add_polygon(&mut self, points: &[PointId]) -> Result<PolygonId> {
        if let Some(missing) = points.iter().find(|&&p| !self.has_point(p)) {
            return Err(Error::Host(format!("Unknown point {}", missing)));
        }
        let id = self.mesh.add_polygon(points, None);
        self.polygon_index.insert(id, self.mesh.polygons.len() - 1);
        Ok(id)
    }

    fn clear(&mut self) -> Result<()> {
        *self = Self::default();
        Ok(())
    }

    fn set_polygon_tag(&mut self, polygon: PolygonId, kind: TagKind, tag: &str) -> Result<()> {
        match kind {
            TagKind::Material => {
                let index = self.require_polygon(polygon)?;
                self.mesh.polygons[index].material = Some(tag.to_string());
            }
            TagKind::Part => {
                self.require_polygon(polygon)?;
                self.part_tags.insert(polygon, tag.to_string());
            }
        }
        Ok(())
    }

    fn ensure_edge_map(&mut self, name: &str) -> Result<()> {
        self.edge_maps.entry(name.to_string()).or_default();
        Ok(())
    }

    fn set_edge_weight(&mut self, map: &str, endpoints: [PointId; 2], weight: f32) -> Result<()> {
        let [a, b] = endpoints;
        if !self.has_point(a) || !self.has_point(b) {
            return Err(Error::Host(format!("No edge between {} and {}", a, b)));
        }
        let weights = self
            .edge_maps
            .get_mut(map)
            .ok_or_else(|| Error::Host(format!("Unknown edge map '{}'", map)))?;
        weights.insert((a.min(b), a.max(b)), weight);
        Ok(())
    }

    fn ensure_color_map(&mut self, name: &str) -> Result<()> {
        self.color_maps.entry(name.to_string()).or_default();
        Ok(())
    }

    fn set_face_vertex_color(
        &mut self,
        map: &str,
        polygon: PolygonId,
        point: PointId,
        color: [f32; 3],
    ) -> Result<()> {
        self.require_polygon(polygon)?;
        let colors = self
            .color_maps
            .get_mut(map)
            .ok_or_else(|| Error::Host(format!("Unknown color map '{}'", map)))?;
        colors.insert((polygon, point), color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_triangle() -> (EditableMesh, [PointId; 3], PolygonId) {
        let mut editor = EditableMesh::new();
        let a = editor.add_point(Point3f::new(0.0, 0.0, 0.0)).unwrap();
        let b = editor.add_point(Point3f::new(1.0, 0.0, 0.0)).unwrap();
        let c = editor.add_point(Point3f::new(0.0, 1.0, 0.0)).unwrap();
        let f = editor.add_polygon(&[a, b, c]).unwrap();
        (editor, [a, b, c], f)
    }

    #[test]
    fn test_tags() {
        let (mut editor, _, f) = make_triangle();
        editor.set_polygon_tag(f, TagKind::Material, "0").unwrap();
        editor.set_polygon_tag(f, TagKind::Part, "1-2").unwrap();

        assert_eq!(editor.polygon_tag(f, TagKind::Material), Some("0"));
        assert_eq!(editor.polygon_tag(f, TagKind::Part), Some("1-2"));
        assert!(editor
            .set_polygon_tag(PolygonId(9), TagKind::Part, "x")
            .is_err());
    }

    #[test]
    fn test_edge_weights_ignore_endpoint_order() {
        let (mut editor, [a, b, _], _) = make_triangle();
        assert!(editor.set_edge_weight("Segment", [a, b], 1.0).is_err());

        editor.ensure_edge_map("Segment").unwrap();
        editor.set_edge_weight("Segment", [b, a], 1.0).unwrap();
        assert_eq!(editor.edge_weight("Segment", a, b), Some(1.0));
        assert_eq!(editor.edge_map_len("Segment"), 1);
        assert!(editor.set_edge_weight("Segment", [a, PointId(40)], 1.0).is_err());
    }

    #[test]
    fn test_face_vertex_colors() {
        let (mut editor, [a, ..], f) = make_triangle();
        editor.ensure_color_map("Segment").unwrap();
        editor
            .set_face_vertex_color("Segment", f, a, [0.1, 0.2, 0.3])
            .unwrap();
        assert!(editor.has_color_map("Segment"));
        assert_eq!(editor.face_vertex_color("Segment", f, a), Some([0.1, 0.2, 0.3]));
    }

    #[test]
    fn test_clear_and_triangle_mesh() {
        let (mut editor, _, _) = make_triangle();
        let mesh = editor.to_triangle_mesh();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);

        editor.clear().unwrap();
        assert_eq!(editor.point_count(), 0);
        assert_eq!(editor.polygon_count(), 0);
    }

    #[test]
    fn test_from_host_indexes_existing_ids() {
        let mut host = HostMesh::new();
        let p: Vec<PointId> = (0..4)
            .map(|i| host.add_point(Point3f::new(i as f32, (i % 2) as f32, 0.0)))
            .collect();
        host.add_polygon(&[p[0], p[1], p[2]], Some("wood"));
        let g = host.add_polygon(&[p[1], p[3], p[2]], None);

        let mut editor = EditableMesh::from_host(host);
        assert_eq!(editor.polygon_tag(PolygonId(0), TagKind::Material), Some("wood"));
        editor.set_polygon_tag(g, TagKind::Material, "3").unwrap();
        assert_eq!(editor.polygon_tag(g, TagKind::Material), Some("3"));

        // New geometry continues the snapshot's ids and is addressable at once
        let q = editor.add_point(Point3f::new(5.0, 5.0, 0.0)).unwrap();
        assert_eq!(q, PointId(4));
        let h = editor.add_polygon(&[p[2], p[3], q]).unwrap();
        assert_eq!(h, PolygonId(2));
        editor.set_polygon_tag(h, TagKind::Part, "0-1").unwrap();
        assert_eq!(editor.polygon_tag(h, TagKind::Part), Some("0-1"));
    }

    #[test]
    fn test_clear_drops_indices() {
        let (mut editor, [a, ..], f) = make_triangle();
        editor.clear().unwrap();
        assert!(editor.set_polygon_tag(f, TagKind::Part, "0").is_err());
        assert!(editor.add_polygon(&[a]).is_err());
    }

    #[test]
    fn test_add_polygon_requires_points() {
        let mut editor = EditableMesh::new();
        assert!(editor.add_polygon(&[PointId(0), PointId(1), PointId(2)]).is_err());
    }
}
