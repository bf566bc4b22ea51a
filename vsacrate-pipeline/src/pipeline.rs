//! Whole-operation pipeline
//!
//! One run takes a host snapshot through topology building, partitioning,
//! constraint classification and per-part approximation, then writes the
//! result back through a [`MeshEditor`]. All editing happens after every part
//! has been approximated.

use crate::config::ApproximationConfig;
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};
use vsacrate_approximation::{
    apply_constraints, ApproximationDriver, ApproximationMode, ConstraintSummary, DriverRun,
    ShapeApproximator,
};
use vsacrate_core::{
    partition, BuildReport, HostMesh, MeshTopology, PartitionSummary, Result, TopologyBuilder,
};
use vsacrate_encoding::{
    encode_segmentation, write_geometry, EditableMesh, EncodeSummary, GeometrySummary,
    MeshEditor, ProxyColorTable,
};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The pipeline ran; individual parts may still have been skipped
    Completed,
    /// Zero proxies or iterations were requested; nothing was touched
    NoOp,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    pub build: BuildReport,
    pub partition: PartitionSummary,
    pub constraints: ConstraintSummary,
    pub approximation: Option<DriverRun>,
    /// Simplify mode: geometry written
    pub geometry: Option<GeometrySummary>,
    /// Segment mode: tags, selections and colors written
    pub segmentation: Option<EncodeSummary>,
    /// Simplify mode with `new_mesh`: the freshly created mesh
    pub new_mesh: Option<EditableMesh>,
    /// Tables the run worked on
    pub topology: Option<MeshTopology>,
    /// Processing time in seconds
    pub processing_time: f32,
}

impl RunReport {
    fn no_op() -> Self {
        Self {
            status: RunStatus::NoOp,
            build: BuildReport::default(),
            partition: PartitionSummary::default(),
            constraints: ConstraintSummary::default(),
            approximation: None,
            geometry: None,
            segmentation: None,
            new_mesh: None,
            topology: None,
            processing_time: 0.0,
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.status == RunStatus::NoOp
    }

    /// Parts that produced no output
    pub fn skipped_parts(&self) -> usize {
        self.approximation
            .as_ref()
            .map_or(0, DriverRun::skipped_count)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Approximation Run: {:?}", self.status)?;
        if self.is_no_op() {
            return writeln!(f, "  Nothing to do: zero proxies or iterations");
        }
        write!(f, "{}", self.build)?;
        write!(f, "{}", self.partition)?;
        write!(f, "{}", self.constraints)?;
        if let Some(run) = &self.approximation {
            write!(f, "{}", run)?;
        }
        if let Some(geometry) = &self.geometry {
            writeln!(
                f,
                "Geometry Output:\n  Points: {}\n  Polygons: {}",
                geometry.points, geometry.polygons
            )?;
        }
        if let Some(segmentation) = &self.segmentation {
            write!(f, "{}", segmentation)?;
        }
        writeln!(f, "Processing time: {:.3}s", self.processing_time)
    }
}

/// Runs the full approximation operation with one external routine
pub struct ApproximationPipeline<A> {
    config: ApproximationConfig,
    approximator: A,
    builder: TopologyBuilder,
    colors: ProxyColorTable,
}

impl<A: ShapeApproximator + Sync> ApproximationPipeline<A> {
    /// Create a pipeline with an entropy-seeded color table
    pub fn new(config: ApproximationConfig, approximator: A) -> Self {
        Self {
            config,
            approximator,
            builder: TopologyBuilder::new(),
            colors: ProxyColorTable::new(),
        }
    }

    /// Use an existing color table, e.g. one kept from earlier runs
    pub fn with_colors(mut self, colors: ProxyColorTable) -> Self {
        self.colors = colors;
        self
    }

    /// Use a differently configured topology builder
    pub fn with_topology_builder(mut self, builder: TopologyBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn config(&self) -> &ApproximationConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ApproximationConfig) {
        self.config = config;
    }

    pub fn colors(&self) -> &ProxyColorTable {
        &self.colors
    }

    /// Run on a host snapshot and write the result through `editor`.
    ///
    /// Simplify mode writes the new geometry into a fresh mesh returned in
    /// the report, or clears `editor` and writes into it when `new_mesh` is
    /// off. Segment mode only adds tags, selections and colors to `editor`,
    /// which is expected to hold the same points and polygons as `host`.
    pub fn run<E: MeshEditor + ?Sized>(&mut self, host: &HostMesh, editor: &mut E) -> Result<RunReport> {
        if !self.config.has_budget() {
            info!(
                "Nothing to do: {} proxies, {} iterations",
                self.config.max_proxies, self.config.iterations
            );
            return Ok(RunReport::no_op());
        }

        let start_time = Instant::now();

        let mut topology = self.builder.build(host)?;
        let partition = partition(&mut topology);
        let constraints = apply_constraints(&mut topology, self.config.policy());

        let driver = ApproximationDriver::new(&self.approximator, self.config.driver_config());
        let run = driver.run(&mut topology);

        let mut report = RunReport {
            status: RunStatus::Completed,
            build: topology.report.clone(),
            partition,
            constraints,
            ..RunReport::no_op()
        };

        match self.config.mode {
            ApproximationMode::Simplify => {
                if self.config.new_mesh {
                    let mut fresh = EditableMesh::new();
                    report.geometry = Some(write_geometry(&mut fresh, run.meshes())?);
                    report.new_mesh = Some(fresh);
                } else {
                    editor.clear()?;
                    report.geometry = Some(write_geometry(editor, run.meshes())?);
                }
            }
            ApproximationMode::Segment => {
                let clusters = run.cluster_map();
                if clusters.is_empty() {
                    warn!("No part produced a segmentation; nothing written");
                } else {
                    let colors = self.config.set_color.then_some(&mut self.colors);
                    report.segmentation = Some(encode_segmentation(
                        editor,
                        &topology,
                        &clusters,
                        self.config.segment_target,
                        &self.config.selection_set,
                        colors,
                    )?);
                }
            }
        }

        report.processing_time = start_time.elapsed().as_secs_f32();
        info!(
            "Approximation finished in {:.3}s ({} of {} parts skipped)",
            report.processing_time,
            run.skipped_count(),
            run.part_count()
        );
        report.approximation = Some(run);
        report.topology = Some(topology);
        Ok(report)
    }
}
