//! Read-only snapshot of a host application's polygon mesh

use crate::point::*;
use serde::{Deserialize, Serialize};

/// A point as the host exposes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostPoint {
    pub id: PointId,
    pub position: Point3f,
    /// Lock mark from the host selection state
    pub locked: bool,
}

/// A polygon of arbitrary arity as the host exposes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostPolygon {
    pub id: PolygonId,
    /// Ordered point references; the order defines facing
    pub points: Vec<PointId>,
    /// Material or grouping tag
    pub material: Option<String>,
}

/// Points and polygons captured once per invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostMesh {
    pub points: Vec<HostPoint>,
    pub polygons: Vec<HostPolygon>,
    #[serde(skip)]
    next_point: u64,
    #[serde(skip)]
    next_polygon: u64,
}

impl HostMesh {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point with the next free id and return that id.
    ///
    /// Ids continue after the larger of the last issued id and the id of the
    /// last point in the list, so points pushed directly with ascending ids
    /// are not reissued.
    pub fn add_point(&mut self, position: Point3f) -> PointId {
        let last = self.points.last().map_or(0, |p| p.id.0 + 1);
        let id = PointId(self.next_point.max(last));
        self.next_point = id.0 + 1;
        self.points.push(HostPoint {
            id,
            position,
            locked: false,
        });
        id
    }

    /// Append a polygon with the next free id and return that id
    pub fn add_polygon(&mut self, points: &[PointId], material: Option<&str>) -> PolygonId {
        let last = self.polygons.last().map_or(0, |p| p.id.0 + 1);
        let id = PolygonId(self.next_polygon.max(last));
        self.next_polygon = id.0 + 1;
        self.polygons.push(HostPolygon {
            id,
            points: points.to_vec(),
            material: material.map(str::to_owned),
        });
        id
    }

    /// Set the lock mark on a point. Returns false if the point is unknown.
    pub fn set_locked(&mut self, id: PointId, locked: bool) -> bool {
        match self.points.iter_mut().find(|p| p.id == id) {
            Some(point) => {
                point.locked = locked;
                true
            }
            None => false,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Check if the snapshot has nothing to process
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut host = HostMesh::new();
        let a = host.add_point(Point3f::new(0.0, 0.0, 0.0));
        let b = host.add_point(Point3f::new(1.0, 0.0, 0.0));
        let c = host.add_point(Point3f::new(0.0, 1.0, 0.0));
        assert_eq!((a, b, c), (PointId(0), PointId(1), PointId(2)));

        let f = host.add_polygon(&[a, b, c], Some("wood"));
        assert_eq!(f, PolygonId(0));
        assert_eq!(host.polygons[0].material.as_deref(), Some("wood"));
        assert_eq!(host.point_count(), 3);
        assert_eq!(host.polygon_count(), 1);
    }

    #[test]
    fn test_ids_continue_after_pushed_points() {
        let mut host = HostMesh::new();
        host.points.push(HostPoint {
            id: PointId(7),
            position: Point3f::new(0.0, 0.0, 0.0),
            locked: false,
        });
        assert_eq!(host.add_point(Point3f::new(1.0, 0.0, 0.0)), PointId(8));
        assert_eq!(host.add_point(Point3f::new(2.0, 0.0, 0.0)), PointId(9));
    }

    #[test]
    fn test_large_snapshot_ids_stay_dense() {
        let mut host = HostMesh::new();
        let ids: Vec<PointId> = (0..50_000)
            .map(|i| host.add_point(Point3f::new(i as f32, 0.0, 0.0)))
            .collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(id.0, i as u64);
        }
        let f = host.add_polygon(&ids[..3], None);
        assert_eq!(f, PolygonId(0));
    }

    #[test]
    fn test_set_locked() {
        let mut host = HostMesh::new();
        let a = host.add_point(Point3f::new(0.0, 0.0, 0.0));
        assert!(host.set_locked(a, true));
        assert!(host.points[0].locked);
        assert!(!host.set_locked(PointId(42), true));
    }
}
