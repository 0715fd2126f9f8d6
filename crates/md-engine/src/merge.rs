//! Temporal concatenation of trajectory segments.

use std::fmt;

use md_core::error::{MdError, MdResult, ResultExt};
use md_core::md::{MdSeries, MdTrajectory, Segment};
use md_core::stats;

use crate::reconcile::{is_identity, AtomMatcher, NearestImageMatcher};

#[derive(Clone, Debug, PartialEq)]
pub struct MergeOptions {
    pub reconcile_atoms: bool,
    /// Relative frame-spacing mismatch tolerated silently.
    pub dt_tolerance: f64,
    /// Relative change of mean temperature or pressure tolerated silently.
    pub thermal_tolerance: f64,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            reconcile_atoms: true,
            dt_tolerance: 1e-6,
            thermal_tolerance: 0.5,
        }
    }
}

/// Non-fatal discrepancy between merged segments.
#[derive(Clone, Debug, PartialEq)]
pub enum ConsistencyWarning {
    TimestepMismatch { base: f64, appended: f64 },
    TemperatureMismatch { base: f64, appended: f64 },
    PressureMismatch { base: f64, appended: f64 },
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyWarning::TimestepMismatch { base, appended } => write!(
                f,
                "time steps differ: {base} atu vs {appended} atu; the merged trajectory has an irregular time axis"
            ),
            ConsistencyWarning::TemperatureMismatch { base, appended } => write!(
                f,
                "mean temperatures differ by more than the tolerance: {base:.2} K vs {appended:.2} K"
            ),
            ConsistencyWarning::PressureMismatch { base, appended } => write!(
                f,
                "mean pressures differ by more than the tolerance: {base:.4} GPa vs {appended:.4} GPa"
            ),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MergeReport {
    /// First frame of the appended data in the merged trajectory.
    pub offset: usize,
    pub appended_frames: usize,
    /// Atom permutation applied to the appended data, if not the identity.
    pub permutation: Option<Vec<usize>>,
    pub warnings: Vec<ConsistencyWarning>,
}

pub struct SegmentMerger<M: AtomMatcher = NearestImageMatcher> {
    options: MergeOptions,
    matcher: M,
}

impl SegmentMerger<NearestImageMatcher> {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            matcher: NearestImageMatcher::new(),
        }
    }
}

impl Default for SegmentMerger<NearestImageMatcher> {
    fn default() -> Self {
        Self::new(MergeOptions::default())
    }
}

impl<M: AtomMatcher> SegmentMerger<M> {
    pub fn with_matcher(options: MergeOptions, matcher: M) -> Self {
        Self { options, matcher }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Append `segment` after the filled frames of `base`.
    ///
    /// Every check runs before the first write, so a failed merge leaves
    /// `base` untouched.
    pub fn merge(&self, base: &mut MdTrajectory, segment: &Segment) -> MdResult<MergeReport> {
        base.check_consistency()?;
        if let Segment::Md(traj) = segment {
            traj.check_consistency()?;
        }
        let appended = segment.store();
        base.store.check_identity(appended)?;

        let mut report = MergeReport {
            offset: base.n_time(),
            appended_frames: appended.n_time(),
            ..MergeReport::default()
        };
        if appended.n_time() == 0 {
            log::debug!("merge: appended segment holds no frames");
            return Ok(report);
        }

        report.warnings = self.consistency_warnings(base, segment);

        let order = if self.options.reconcile_atoms && base.n_time() > 0 {
            let order = self
                .matcher
                .match_atoms(&base.store, appended)
                .context("unable to map structures")?;
            log::debug!(
                "merge: {} matcher mapped {} atoms",
                self.matcher.name(),
                order.len()
            );
            (!is_identity(&order)).then_some(order)
        } else {
            None
        };
        check_species_order(base, segment, order.as_deref())?;

        for warning in &report.warnings {
            log::warn!("{warning}");
        }

        base.store.append_store(appended, order.as_deref())?;
        append_series(&mut base.md, segment, report.offset, base.store.n_atoms(), order.as_deref());
        log::debug!(
            "merge: {} + {} frames -> {}",
            report.offset,
            report.appended_frames,
            base.n_time()
        );
        report.permutation = order;
        Ok(report)
    }

    fn consistency_warnings(&self, base: &MdTrajectory, segment: &Segment) -> Vec<ConsistencyWarning> {
        let mut warnings = Vec::new();
        let appended = segment.store();
        if base.n_time() > 1 && appended.n_time() > 1 {
            let dt_base = base.store.timestep_atu();
            let dt_appended = appended.timestep_atu();
            if let Some(rel) = stats::relative_difference(dt_base, dt_appended, dt_base) {
                if rel > self.options.dt_tolerance {
                    warnings.push(ConsistencyWarning::TimestepMismatch {
                        base: dt_base,
                        appended: dt_appended,
                    });
                }
            }
        }
        let Some(md) = segment.md() else {
            return warnings;
        };
        if base.n_time() == 0 {
            return warnings;
        }
        let t_base = stats::mean(&base.md.temperature);
        let t_appended = stats::mean(&md.temperature);
        if let Some(rel) = stats::relative_difference(t_base, t_appended, t_base) {
            if rel > self.options.thermal_tolerance {
                warnings.push(ConsistencyWarning::TemperatureMismatch {
                    base: t_base,
                    appended: t_appended,
                });
            }
        }
        let p_base = stats::mean(&base.md.pressure);
        let p_appended = stats::mean(&md.pressure);
        if let Some(rel) = stats::relative_difference(p_base, p_appended, p_base) {
            if rel > self.options.thermal_tolerance {
                warnings.push(ConsistencyWarning::PressureMismatch {
                    base: p_base,
                    appended: p_appended,
                });
            }
        }
        warnings
    }
}

/// Without a permutation both segments must list species in the same order.
fn check_species_order(base: &MdTrajectory, segment: &Segment, order: Option<&[usize]>) -> MdResult<()> {
    let ours = base.store.species_of_atom();
    let theirs = segment.store().species_of_atom();
    for (atom, &species) in ours.iter().enumerate() {
        let src = order.map_or(atom, |o| o[atom]);
        if theirs[src] != species {
            return Err(MdError::Mismatch(format!(
                "atom {atom} has species {species} but its appended counterpart {src} has species {}",
                theirs[src]
            )));
        }
    }
    Ok(())
}

fn append_series(md: &mut MdSeries, segment: &Segment, offset: usize, n_atoms: usize, order: Option<&[usize]>) {
    let n_new = segment.n_time();
    let Some(other) = segment.md() else {
        let zeros = std::iter::repeat(0.0).take(n_new);
        md.kinetic_energy.extend(zeros.clone());
        md.temperature.extend(zeros.clone());
        md.pressure.extend(zeros.clone());
        md.entropy.extend(zeros);
        if let Some(vel) = md.velocities.as_mut() {
            vel.extend(std::iter::repeat([0.0; 3]).take(n_new * n_atoms));
        }
        return;
    };
    md.kinetic_energy.extend_from_slice(&other.kinetic_energy);
    md.temperature.extend_from_slice(&other.temperature);
    md.pressure.extend_from_slice(&other.pressure);
    md.entropy.extend_from_slice(&other.entropy);

    match (md.velocities.as_mut(), other.velocities.as_ref()) {
        (Some(vel), Some(src)) => extend_permuted(vel, src, n_atoms, order),
        (Some(vel), None) => vel.extend(std::iter::repeat([0.0; 3]).take(n_new * n_atoms)),
        (None, Some(src)) => {
            let mut vel = vec![[0.0; 3]; offset * n_atoms];
            extend_permuted(&mut vel, src, n_atoms, order);
            md.velocities = Some(vel);
        }
        (None, None) => {}
    }
}

fn extend_permuted(dst: &mut Vec<[f64; 3]>, src: &[[f64; 3]], n_atoms: usize, order: Option<&[usize]>) {
    match order {
        None => dst.extend_from_slice(src),
        Some(order) => {
            for frame in src.chunks_exact(n_atoms) {
                dst.extend(order.iter().map(|&atom| frame[atom]));
            }
        }
    }
}

/// Merge with the default matcher.
pub fn merge_segment(base: &mut MdTrajectory, segment: &Segment, options: &MergeOptions) -> MdResult<MergeReport> {
    SegmentMerger::new(options.clone()).merge(base, segment)
}
