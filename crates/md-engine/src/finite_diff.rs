//! Velocities, temperature and pressure recovered from positions.

use md_core::cell;
use md_core::error::{MdError, MdResult};
use md_core::md::MdTrajectory;
use md_core::units;

pub struct VelocityEstimator {
    dtion: f64,
    masses: Vec<f64>,
}

impl VelocityEstimator {
    /// `dtion` is the spacing between frames in atu.
    pub fn new(traj: &MdTrajectory, dtion: f64) -> MdResult<Self> {
        if !(dtion.is_finite() && dtion > 0.0) {
            return Err(MdError::Invalid(format!(
                "time step must be positive (got {dtion})"
            )));
        }
        Ok(Self {
            dtion,
            masses: traj.store.atom_masses()?,
        })
    }

    /// Estimator using the trajectory's own frame spacing.
    pub fn from_trajectory(traj: &MdTrajectory) -> MdResult<Self> {
        Self::new(traj, traj.store.timestep_atu())
    }

    pub fn dtion(&self) -> f64 {
        self.dtion
    }

    /// Called once frame `itime` is available.
    ///
    /// Fills frame `itime - 1` by central difference, the last frame by
    /// backward difference and frame 0 by forward difference when `itime == 1`.
    pub fn update(&self, traj: &mut MdTrajectory, itime: usize) -> MdResult<()> {
        traj.store.check_frame(itime, "finite differences")?;
        self.check_masses(traj)?;
        if itime == 0 {
            return Ok(());
        }
        let n = traj.n_atoms();
        let last = traj.n_time() - 1;
        let inv_2dt = 0.5 / self.dtion;
        let inv_dt = 1.0 / self.dtion;

        let mut targets: Vec<usize> = Vec::with_capacity(3);
        if itime >= 2 {
            targets.push(itime - 1);
        }
        if itime == 1 {
            targets.push(0);
        }
        if itime == last {
            targets.push(itime);
        }
        for &t in &targets {
            self.check_volume(traj, t)?;
        }

        let positions = traj.store.positions();
        let mut updates: Vec<(usize, Vec<[f64; 3]>)> = Vec::with_capacity(targets.len());
        for &t in &targets {
            let (hi, lo, scale) = if t == itime - 1 && itime >= 2 {
                (itime, itime - 2, inv_2dt)
            } else if t == itime {
                (itime, itime - 1, inv_dt)
            } else {
                (1, 0, inv_dt)
            };
            let xh = &positions[hi * n..(hi + 1) * n];
            let xl = &positions[lo * n..(lo + 1) * n];
            let vel = xh
                .iter()
                .zip(xl)
                .map(|(a, b)| {
                    [
                        (a[0] - b[0]) * scale,
                        (a[1] - b[1]) * scale,
                        (a[2] - b[2]) * scale,
                    ]
                })
                .collect();
            updates.push((t, vel));
        }

        for (t, vel) in updates {
            let all = traj.velocities_or_zero();
            all[t * n..(t + 1) * n].copy_from_slice(&vel);
            self.pressure_temperature(traj, t)?;
        }
        Ok(())
    }

    /// Streaming-equivalent pass over every recorded frame.
    pub fn update_all(&self, traj: &mut MdTrajectory) -> MdResult<()> {
        for itime in 1..traj.n_time() {
            self.update(traj, itime)?;
        }
        Ok(())
    }

    /// Temperature and pressure of frame `itime` from its velocities.
    pub fn pressure_temperature(&self, traj: &mut MdTrajectory, itime: usize) -> MdResult<()> {
        self.check_masses(traj)?;
        let volume = self.check_volume(traj, itime)?;
        let n = traj.n_atoms() as f64;
        let vel = traj.velocities_at(itime)?;
        let twice_kinetic: f64 = vel
            .iter()
            .zip(&self.masses)
            .map(|(v, m)| m * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]))
            .sum();
        let temperature = twice_kinetic * units::HARTREE_J / (3.0 * units::BOLTZMANN_J * n);

        let s = traj.store.stress_at(itime)?;
        let pressure = units::ha_per_bohr3_to_gpa()
            * (-(s[0] + s[1] + s[2]) / 3.0
                + n / volume * (units::BOLTZMANN_J / units::HARTREE_J) * temperature);

        traj.md.temperature[itime] = temperature;
        traj.md.pressure[itime] = pressure;
        Ok(())
    }

    fn check_masses(&self, traj: &MdTrajectory) -> MdResult<()> {
        if self.masses.len() != traj.n_atoms() {
            return Err(MdError::Mismatch(format!(
                "estimator built for {} atoms, trajectory holds {}",
                self.masses.len(),
                traj.n_atoms()
            )));
        }
        Ok(())
    }

    fn check_volume(&self, traj: &MdTrajectory, itime: usize) -> MdResult<f64> {
        let volume = cell::volume(traj.store.cell_at(itime)?);
        if !(volume.is_finite() && volume.abs() > 0.0) {
            return Err(MdError::Invalid(format!(
                "cell of frame {itime} has volume {volume}"
            )));
        }
        Ok(volume)
    }
}
