//! Indexed triangle mesh used for part sub-meshes and simplified output

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A triangle mesh with vertices and faces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Calculate face normals
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                edge1.cross(&edge2).normalize()
            })
            .collect()
    }

    /// Number of faces incident to each undirected edge, keyed by ascending vertex pair.
    pub fn edge_face_counts(&self) -> HashMap<(usize, usize), usize> {
        let mut counts: HashMap<(usize, usize), usize> = HashMap::with_capacity(self.faces.len() * 3);
        for face in &self.faces {
            for i in 0..3 {
                let a = face[i];
                let b = face[(i + 1) % 3];
                *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        counts
    }

    /// A mesh is closed when every edge is shared by exactly two faces.
    pub fn is_closed(&self) -> bool {
        if self.faces.is_empty() {
            return false;
        }
        self.edge_face_counts().values().all(|&count| count == 2)
    }

    /// Signed volume enclosed by the faces (divergence theorem).
    ///
    /// Positive when the faces of a closed mesh wind counter-clockwise seen
    /// from outside. Accumulated in double precision.
    pub fn signed_volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|face| {
                let a = self.vertices[face[0]].cast::<f64>().coords;
                let b = self.vertices[face[1]].cast::<f64>().coords;
                let c = self.vertices[face[2]].cast::<f64>().coords;
                a.dot(&b.cross(&c))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Whether the faces point away from the enclosed volume.
    pub fn is_outward_oriented(&self) -> bool {
        self.signed_volume() > 0.0
    }

    /// Flip the winding of every face
    pub fn reverse_face_orientations(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_tetrahedron() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
    }

    #[test]
    fn test_tetrahedron_is_closed_and_outward() {
        let mesh = make_tetrahedron();
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-9);
        assert!(mesh.is_outward_oriented());
    }

    #[test]
    fn test_reverse_flips_volume_sign() {
        let mut mesh = make_tetrahedron();
        mesh.reverse_face_orientations();
        assert!(!mesh.is_outward_oriented());
        assert_relative_eq!(mesh.signed_volume(), -1.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_open_mesh_is_not_closed() {
        let mut mesh = make_tetrahedron();
        mesh.faces.pop();
        assert!(!mesh.is_closed());
        assert!(!TriangleMesh::new().is_closed());
    }

    #[test]
    fn test_face_normals() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let normals = mesh.calculate_face_normals();
        assert_relative_eq!(normals[0].z, 1.0, epsilon = 1e-6);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
    }
}
