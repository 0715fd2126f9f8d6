use md_core::blend::InterpolationScheme;
use md_core::error::MdResult;
use md_core::md::MdTrajectory;

/// Densifies a trajectory by blending consecutive frames.
#[derive(Clone, Copy, Debug)]
pub struct FrameInterpolator {
    scheme: InterpolationScheme,
}

impl FrameInterpolator {
    pub fn new(ninter: usize, amplitude: f64) -> MdResult<Self> {
        Ok(Self {
            scheme: InterpolationScheme::new(ninter, amplitude)?,
        })
    }

    pub fn scheme(&self) -> &InterpolationScheme {
        &self.scheme
    }

    /// Interpolate every series in place; returns the new frame count.
    pub fn apply(&self, traj: &mut MdTrajectory) -> MdResult<usize> {
        let n_time = traj.n_time();
        self.scheme.check_frames(n_time)?;
        traj.check_consistency()?;

        let n_atoms = traj.n_atoms();
        let md = &mut traj.md;
        if let Some(vel) = md.velocities.as_mut() {
            self.scheme.apply(vel, n_atoms, n_time)?;
        }
        self.scheme.apply(&mut md.kinetic_energy, 1, n_time)?;
        self.scheme.apply(&mut md.temperature, 1, n_time)?;
        self.scheme.apply(&mut md.pressure, 1, n_time)?;
        self.scheme.apply(&mut md.entropy, 1, n_time)?;
        traj.store.interpolate(&self.scheme)?;

        log::debug!(
            "interpolated {n_time} frames into {} (ninter {}, amplitude {})",
            traj.n_time(),
            self.scheme.ninter,
            self.scheme.amplitude
        );
        Ok(traj.n_time())
    }
}
