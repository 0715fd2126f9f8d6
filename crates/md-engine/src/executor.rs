use std::io::Write;

use md_core::error::MdResult;
use md_core::md::{MdTrajectory, Segment};

use crate::config::AnalysisConfig;
use crate::finite_diff::VelocityEstimator;
use crate::interpolate::FrameInterpolator;
use crate::merge::{MergeReport, SegmentMerger};
use crate::reconcile::AtomMatcher;
use crate::report::{self, DerivedSeries, Quantity};
use crate::spectral::SpectralBackend;

/// An analysis over a trajectory window.
pub trait Analysis {
    type Output;

    fn name(&self) -> &'static str;

    fn run(&self, traj: &MdTrajectory, backend: &SpectralBackend) -> MdResult<Self::Output>;
}

/// Runs analyses and trajectory edits with one configuration and backend.
pub struct Executor {
    config: AnalysisConfig,
    backend: SpectralBackend,
}

impl Executor {
    pub fn new(config: &AnalysisConfig) -> MdResult<Self> {
        let config = config.normalized()?;
        let backend = SpectralBackend::from_spec(config.backend.as_deref().unwrap_or("auto"))?;
        Ok(Self { config, backend })
    }

    pub fn with_backend(mut self, backend: SpectralBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn backend(&self) -> &SpectralBackend {
        &self.backend
    }

    pub fn run<A: Analysis>(&self, analysis: &A, traj: &MdTrajectory) -> MdResult<A::Output> {
        log::debug!("running {} on {} frames", analysis.name(), traj.n_time());
        analysis.run(traj, &self.backend)
    }

    pub fn merge(&self, base: &mut MdTrajectory, segment: &Segment) -> MdResult<MergeReport> {
        SegmentMerger::new(self.config.merge_options()).merge(base, segment)
    }

    pub fn merge_with<M: AtomMatcher>(
        &self,
        base: &mut MdTrajectory,
        segment: &Segment,
        matcher: M,
    ) -> MdResult<MergeReport> {
        SegmentMerger::with_matcher(self.config.merge_options(), matcher).merge(base, segment)
    }

    pub fn interpolate(&self, traj: &mut MdTrajectory, ninter: usize, amplitude: f64) -> MdResult<usize> {
        FrameInterpolator::new(ninter, amplitude)?.apply(traj)
    }

    /// Fill velocities, temperature and pressure from positions.
    pub fn estimate_velocities(&self, traj: &mut MdTrajectory) -> MdResult<()> {
        VelocityEstimator::from_trajectory(traj)?.update_all(traj)
    }

    pub fn derived_series(
        &self,
        traj: &MdTrajectory,
        tbegin: usize,
        tend: usize,
        quantity: Quantity,
    ) -> MdResult<DerivedSeries> {
        report::derived_series(traj, tbegin, tend, quantity, &self.config, &self.backend)
    }

    pub fn thermo_summary<W: Write>(
        &self,
        traj: &MdTrajectory,
        tbegin: usize,
        tend: usize,
        out: &mut W,
    ) -> MdResult<()> {
        report::write_thermo_summary(traj, tbegin, tend, out)
    }
}
