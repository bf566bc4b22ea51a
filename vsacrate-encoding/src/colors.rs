//! Per-cluster colors that stay stable across runs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Random RGB color for each cluster id.
///
/// The table only grows: asking for more clusters appends new colors and
/// never changes the ones already handed out. Keep one table alive across
/// runs to get the same color for the same id every time.
#[derive(Debug, Clone)]
pub struct ProxyColorTable {
    rng: StdRng,
    colors: Vec<[f32; 3]>,
}

impl Default for ProxyColorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyColorTable {
    /// Table seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            colors: Vec::new(),
        }
    }

    /// Table with a reproducible color sequence
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            colors: Vec::new(),
        }
    }

    /// Grow the table to at least `count` colors.
    pub fn ensure(&mut self, count: usize) -> &[[f32; 3]] {
        if self.colors.len() < count {
            debug!("Growing proxy colors {} -> {}", self.colors.len(), count);
            let start = self.colors.len();
            let rng = &mut self.rng;
            self.colors
                .extend((start..count).map(|_| [rng.gen(), rng.gen(), rng.gen()]));
        }
        &self.colors
    }

    pub fn color(&self, cluster: usize) -> Option<[f32; 3]> {
        self.colors.get(cluster).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_keeps_existing_colors() {
        let mut table = ProxyColorTable::new();
        let first = table.ensure(3).to_vec();
        let second = table.ensure(8).to_vec();

        assert_eq!(second.len(), 8);
        assert_eq!(&second[..3], &first[..]);
    }

    #[test]
    fn test_never_shrinks() {
        let mut table = ProxyColorTable::with_seed(7);
        table.ensure(5);
        let before = table.ensure(2).to_vec();
        assert_eq!(before.len(), 5);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_colors_in_unit_range() {
        let mut table = ProxyColorTable::with_seed(1);
        for color in table.ensure(64) {
            assert!(color.iter().all(|c| (0.0..1.0).contains(c)));
        }
    }

    #[test]
    fn test_seeded_tables_agree() {
        let mut a = ProxyColorTable::with_seed(42);
        let mut b = ProxyColorTable::with_seed(42);
        a.ensure(2);
        a.ensure(4);
        assert_eq!(a.ensure(4), b.ensure(4));
        assert_eq!(a.color(3), b.color(3));
        assert!(ProxyColorTable::new().color(0).is_none());
    }
}
