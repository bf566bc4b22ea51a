//! Orientation repair for simplified triangle soups
//!
//! The routine's anchor/triangle output is not guaranteed to be consistently
//! wound. Before handing it back we drop unusable triangles, propagate a
//! single winding across each connected piece, and flip the whole mesh if it
//! is closed but faces inward.

use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};
use vsacrate_core::{Point3f, TriangleMesh};

/// What [`repair_orientation`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrientationRepair {
    /// Triangles dropped for bad or repeated anchor indices
    pub dropped: usize,
    /// Triangles flipped to agree with their neighbours
    pub flipped: usize,
    /// Whether every face was reversed to point outward
    pub reversed: bool,
}

/// Build a consistently wound mesh from an anchor/triangle soup.
pub fn repair_orientation(
    anchors: Vec<Point3f>,
    triangles: &[[usize; 3]],
) -> (TriangleMesh, OrientationRepair) {
    let anchor_count = anchors.len();
    let faces: Vec<[usize; 3]> = triangles
        .iter()
        .copied()
        .filter(|t| {
            t.iter().all(|&i| i < anchor_count) && t[0] != t[1] && t[1] != t[2] && t[0] != t[2]
        })
        .collect();

    let mut repair = OrientationRepair {
        dropped: triangles.len() - faces.len(),
        ..Default::default()
    };
    if repair.dropped > 0 {
        debug!("Dropped {} unusable triangles from routine output", repair.dropped);
    }

    let mut mesh = TriangleMesh::from_vertices_and_faces(anchors, faces);
    repair.flipped = orient_consistently(&mut mesh);
    repair.reversed = orient_outward(&mut mesh);
    (mesh, repair)
}

/// Propagate one winding across each edge-connected piece of the mesh.
///
/// Breadth-first from the lowest unvisited face; a neighbour that runs the
/// shared edge in the same direction as the current face is flipped.
/// Returns the number of flipped faces.
pub fn orient_consistently(mesh: &mut TriangleMesh) -> usize {
    let mut edge_faces: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (f, face) in mesh.faces.iter().enumerate() {
        for i in 0..3 {
            let (a, b) = (face[i], face[(i + 1) % 3]);
            edge_faces.entry((a.min(b), a.max(b))).or_default().push(f);
        }
    }

    let mut visited = vec![false; mesh.faces.len()];
    let mut flipped = 0;

    for start in 0..mesh.faces.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut queue = VecDeque::from([start]);

        while let Some(f) = queue.pop_front() {
            let face = mesh.faces[f];
            for i in 0..3 {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                let Some(neighbors) = edge_faces.get(&(a.min(b), a.max(b))) else {
                    continue;
                };
                for &n in neighbors {
                    if visited[n] {
                        continue;
                    }
                    visited[n] = true;
                    if runs_forward(&mesh.faces[n], a, b) {
                        mesh.faces[n].swap(1, 2);
                        flipped += 1;
                    }
                    queue.push_back(n);
                }
            }
        }
    }

    if flipped > 0 {
        info!("Fixed winding order: flipped {} faces", flipped);
    }
    flipped
}

/// Reverse every face of a closed mesh whose signed volume is not positive.
/// Open meshes are left alone. Returns true if the mesh was reversed.
pub fn orient_outward(mesh: &mut TriangleMesh) -> bool {
    if !mesh.is_closed() || mesh.is_outward_oriented() {
        return false;
    }
    mesh.reverse_face_orientations();
    debug!("Reversed {} faces to point outward", mesh.face_count());
    true
}

/// True if `face` traverses the edge as `a -> b`.
fn runs_forward(face: &[usize; 3], a: usize, b: usize) -> bool {
    (0..3).any(|i| face[i] == a && face[(i + 1) % 3] == b)
}
