//! Operator parameters for one approximation run

use serde::{Deserialize, Serialize};
use vsacrate_approximation::{ApproximationMode, ConstraintPolicy, DriverConfig};
use vsacrate_encoding::{SegmentTarget, DEFAULT_SELECTION_SET};

/// Configuration record for [`crate::ApproximationPipeline`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproximationConfig {
    /// Simplify geometry or segment it into clusters
    pub mode: ApproximationMode,
    /// Maximum proxy count per part
    pub max_proxies: usize,
    /// Clustering iterations per part
    pub iterations: usize,
    /// Keep open-border edges fixed
    pub preserve_boundary: bool,
    /// Keep edges between differently tagged polygons fixed
    pub preserve_material: bool,
    /// Where segment mode records its result
    pub segment_target: SegmentTarget,
    /// Edge selection set name for [`SegmentTarget::EdgeSelection`]
    pub selection_set: String,
    /// Write per-face-vertex cluster colors in segment mode
    pub set_color: bool,
    /// Simplify mode: write into a new mesh instead of replacing the edit mesh
    pub new_mesh: bool,
    /// Approximate parts in parallel
    pub parallel: bool,
}

impl Default for ApproximationConfig {
    fn default() -> Self {
        Self {
            mode: ApproximationMode::Simplify,
            max_proxies: 0,
            iterations: 0,
            preserve_boundary: false,
            preserve_material: false,
            segment_target: SegmentTarget::Material,
            selection_set: DEFAULT_SELECTION_SET.to_string(),
            set_color: true,
            new_mesh: true,
            parallel: false,
        }
    }
}

impl ApproximationConfig {
    /// Simplify mode with the given budgets
    pub fn simplify(max_proxies: usize, iterations: usize) -> Self {
        Self {
            mode: ApproximationMode::Simplify,
            max_proxies,
            iterations,
            ..Default::default()
        }
    }

    /// Segment mode with the given budgets and target
    pub fn segment(max_proxies: usize, iterations: usize, target: SegmentTarget) -> Self {
        Self {
            mode: ApproximationMode::Segment,
            max_proxies,
            iterations,
            segment_target: target,
            ..Default::default()
        }
    }

    pub fn with_preservation(mut self, boundary: bool, material: bool) -> Self {
        self.preserve_boundary = boundary;
        self.preserve_material = material;
        self
    }

    pub fn with_selection_set(mut self, name: impl Into<String>) -> Self {
        self.selection_set = name.into();
        self
    }

    pub fn with_color(mut self, set_color: bool) -> Self {
        self.set_color = set_color;
        self
    }

    pub fn with_new_mesh(mut self, new_mesh: bool) -> Self {
        self.new_mesh = new_mesh;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Zero proxies or zero iterations make the whole run a no-op
    pub fn has_budget(&self) -> bool {
        self.max_proxies > 0 && self.iterations > 0
    }

    pub fn policy(&self) -> ConstraintPolicy {
        ConstraintPolicy::new(self.preserve_boundary, self.preserve_material)
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig::new(self.mode, self.max_proxies, self.iterations).with_parallel(self.parallel)
    }
}
