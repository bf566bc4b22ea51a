//! Per-part cluster tables and global tags

use itertools::Itertools;
use std::collections::HashMap;
use vsacrate_core::{Error, Result};

/// Dense cluster assignment for one part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterTable {
    pub part: usize,
    /// Global triangle indices, in part order
    pub triangles: Vec<usize>,
    /// Cluster id for each entry of `triangles`, in `0..cluster_count()`
    pub assignments: Vec<usize>,
    /// A representative triangle for each cluster id
    pub proxy_sources: Vec<usize>,
}

impl ClusterTable {
    /// Normalize a raw per-triangle id map into a dense table.
    ///
    /// Distinct raw ids are ranked in ascending order, so a map that is
    /// already dense keeps its ids. The representative of a cluster is the
    /// last triangle assigned to it. Fails unless there is exactly one id
    /// per triangle.
    pub fn from_assignments(part: usize, triangles: &[usize], raw_ids: &[usize]) -> Result<Self> {
        if raw_ids.len() != triangles.len() {
            return Err(Error::InvalidData(format!(
                "{} proxy ids for {} triangles",
                raw_ids.len(),
                triangles.len()
            )));
        }

        let rank: HashMap<usize, usize> = raw_ids
            .iter()
            .copied()
            .sorted_unstable()
            .dedup()
            .enumerate()
            .map(|(dense, raw)| (raw, dense))
            .collect();

        let assignments: Vec<usize> = raw_ids.iter().map(|raw| rank[raw]).collect();
        let mut proxy_sources = vec![0; rank.len()];
        for (&t, &cluster) in triangles.iter().zip(&assignments) {
            proxy_sources[cluster] = t;
        }

        Ok(Self {
            part,
            triangles: triangles.to_vec(),
            assignments,
            proxy_sources,
        })
    }

    /// Number of distinct clusters
    pub fn cluster_count(&self) -> usize {
        self.proxy_sources.len()
    }

    /// Pairs of (global triangle, cluster id)
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.triangles.iter().copied().zip(self.assignments.iter().copied())
    }
}

/// Tag for a cluster that is unique across all parts.
///
/// `"part-cluster"` when the mesh has more than one part, the bare cluster
/// id otherwise.
pub fn global_tag(part_count: usize, part: usize, cluster: usize) -> String {
    if part_count > 1 {
        format!("{}-{}", part, cluster)
    } else {
        cluster.to_string()
    }
}

/// Cluster tables of every part of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMap {
    tables: Vec<Option<ClusterTable>>,
}

impl ClusterMap {
    pub fn new(part_count: usize) -> Self {
        Self {
            tables: vec![None; part_count],
        }
    }

    /// Store a part's table, replacing any previous one
    pub fn insert(&mut self, table: ClusterTable) {
        let part = table.part;
        if part >= self.tables.len() {
            self.tables.resize(part + 1, None);
        }
        self.tables[part] = Some(table);
    }

    pub fn table(&self, part: usize) -> Option<&ClusterTable> {
        self.tables.get(part).and_then(Option::as_ref)
    }

    pub fn tables(&self) -> impl Iterator<Item = &ClusterTable> {
        self.tables.iter().flatten()
    }

    /// Total number of parts, including parts without a table
    pub fn part_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of parts that produced a table
    pub fn segmented_parts(&self) -> usize {
        self.tables().count()
    }

    pub fn is_empty(&self) -> bool {
        self.segmented_parts() == 0
    }

    pub fn global_tag(&self, part: usize, cluster: usize) -> String {
        global_tag(self.part_count(), part, cluster)
    }

    /// Largest cluster count of any part; sizes the color table
    pub fn max_cluster_count(&self) -> usize {
        self.tables()
            .map(ClusterTable::cluster_count)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_map_unchanged() {
        let table = ClusterTable::from_assignments(0, &[10, 11, 12, 13], &[1, 0, 1, 2]).unwrap();
        assert_eq!(table.assignments, vec![1, 0, 1, 2]);
        assert_eq!(table.cluster_count(), 3);
        assert_eq!(table.proxy_sources, vec![11, 12, 13]);
    }

    #[test]
    fn test_sparse_ids_are_ranked() {
        let table = ClusterTable::from_assignments(2, &[0, 1, 2, 3], &[7, 3, 7, 9]).unwrap();
        assert_eq!(table.assignments, vec![1, 0, 1, 2]);
        assert_eq!(table.cluster_count(), 3);

        let mut seen: Vec<usize> = table.assignments.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, (0..table.cluster_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_iter_pairs_triangles_with_clusters() {
        let table = ClusterTable::from_assignments(0, &[4, 5], &[0, 1]).unwrap();
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![(4, 0), (5, 1)]);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        // More ids than triangles would invent clusters with no triangle
        assert!(ClusterTable::from_assignments(0, &[4, 5], &[0, 1, 2]).is_err());
        assert!(ClusterTable::from_assignments(0, &[4, 5, 6], &[0, 1]).is_err());
        assert!(ClusterTable::from_assignments(0, &[], &[]).unwrap().cluster_count() == 0);
    }

    #[test]
    fn test_global_tag() {
        assert_eq!(global_tag(1, 0, 3), "3");
        assert_eq!(global_tag(2, 0, 0), "0-0");
        assert_eq!(global_tag(3, 2, 5), "2-5");
    }

    #[test]
    fn test_cluster_map() {
        let mut map = ClusterMap::new(3);
        map.insert(ClusterTable::from_assignments(0, &[0, 1, 2], &[0, 1, 2]).unwrap());
        map.insert(ClusterTable::from_assignments(2, &[5, 6], &[0, 0]).unwrap());

        assert_eq!(map.part_count(), 3);
        assert_eq!(map.segmented_parts(), 2);
        assert!(map.table(1).is_none());
        assert_eq!(map.max_cluster_count(), 3);
        assert_eq!(map.global_tag(2, 0), "2-0");
    }

    #[test]
    fn test_empty_map() {
        let map = ClusterMap::new(1);
        assert!(map.is_empty());
        assert_eq!(map.max_cluster_count(), 0);
        assert_eq!(map.global_tag(0, 4), "4");
    }
}
