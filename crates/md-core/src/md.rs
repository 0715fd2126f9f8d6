//! Molecular-dynamics series layered on top of [`TrajectoryStore`].

use crate::error::{MdError, MdResult};
use crate::stats;
use crate::store::{Frame, TrajectoryStore};

/// Per-frame MD observables, parallel to the store's time axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MdSeries {
    /// Velocities (bohr/atu), frame-major; `None` when the source had none.
    pub velocities: Option<Vec<[f64; 3]>>,
    /// Kinetic energy (Ha).
    pub kinetic_energy: Vec<f64>,
    /// Temperature (K).
    pub temperature: Vec<f64>,
    /// Pressure (GPa).
    pub pressure: Vec<f64>,
    /// Electronic entropy.
    pub entropy: Vec<f64>,
}

impl MdSeries {
    pub fn zeros(n_time: usize, n_atoms: usize, with_velocities: bool) -> Self {
        Self {
            velocities: with_velocities.then(|| vec![[0.0; 3]; n_time * n_atoms]),
            kinetic_energy: vec![0.0; n_time],
            temperature: vec![0.0; n_time],
            pressure: vec![0.0; n_time],
            entropy: vec![0.0; n_time],
        }
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}

/// MD observables of a single frame.
#[derive(Clone, Debug, Default)]
pub struct MdFrame {
    pub velocities: Option<Vec<[f64; 3]>>,
    pub kinetic_energy: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub entropy: f64,
}

/// Trajectory store plus MD observables.
#[derive(Clone, Debug)]
pub struct MdTrajectory {
    pub store: TrajectoryStore,
    pub md: MdSeries,
}

/// A trajectory segment as produced by a reader.
///
/// The producer decides once whether MD observables exist.
#[derive(Clone, Debug)]
pub enum Segment {
    Plain(TrajectoryStore),
    Md(MdTrajectory),
}

impl Segment {
    pub fn store(&self) -> &TrajectoryStore {
        match self {
            Segment::Plain(store) => store,
            Segment::Md(traj) => &traj.store,
        }
    }

    pub fn md(&self) -> Option<&MdSeries> {
        match self {
            Segment::Plain(_) => None,
            Segment::Md(traj) => Some(&traj.md),
        }
    }

    pub fn n_time(&self) -> usize {
        self.store().n_time()
    }
}

impl From<TrajectoryStore> for Segment {
    fn from(store: TrajectoryStore) -> Self {
        Segment::Plain(store)
    }
}

impl From<MdTrajectory> for Segment {
    fn from(traj: MdTrajectory) -> Self {
        Segment::Md(traj)
    }
}

impl MdTrajectory {
    /// Promote a plain store; MD series are zero-filled, velocities absent.
    pub fn from_store(store: TrajectoryStore) -> Self {
        let md = MdSeries::zeros(store.n_time(), store.n_atoms(), false);
        Self { store, md }
    }

    pub fn new(species_of_atom: Vec<usize>, atomic_numbers: Vec<u32>) -> MdResult<Self> {
        Ok(Self::from_store(TrajectoryStore::new(
            species_of_atom,
            atomic_numbers,
        )?))
    }

    pub fn n_atoms(&self) -> usize {
        self.store.n_atoms()
    }

    pub fn n_species(&self) -> usize {
        self.store.n_species()
    }

    pub fn n_time(&self) -> usize {
        self.store.n_time()
    }

    pub fn check_times(&self, tbegin: usize, tend: usize) -> MdResult<()> {
        self.store.check_times(tbegin, tend)
    }

    pub fn timestep_ps(&self) -> f64 {
        self.store.timestep_ps()
    }

    pub fn reserve(&mut self, frames: usize) {
        self.store.reserve(frames);
        let n_atoms = self.n_atoms();
        if let Some(vel) = self.md.velocities.as_mut() {
            vel.reserve(frames * n_atoms);
        }
        self.md.kinetic_energy.reserve(frames);
        self.md.temperature.reserve(frames);
        self.md.pressure.reserve(frames);
        self.md.entropy.reserve(frames);
    }

    pub fn push_frame(&mut self, frame: Frame, md: MdFrame) -> MdResult<()> {
        let n_atoms = self.n_atoms();
        if let Some(vel) = &md.velocities {
            if vel.len() != n_atoms {
                return Err(MdError::Mismatch(format!(
                    "frame {} has {} velocities for {n_atoms} atoms",
                    self.n_time(),
                    vel.len()
                )));
            }
        }
        let prev = self.n_time();
        self.store.push_frame(frame)?;
        match (self.md.velocities.as_mut(), md.velocities) {
            (Some(all), Some(vel)) => all.extend_from_slice(&vel),
            (Some(all), None) => all.extend(std::iter::repeat([0.0; 3]).take(n_atoms)),
            (None, Some(vel)) => {
                let mut all = vec![[0.0; 3]; prev * n_atoms];
                all.extend_from_slice(&vel);
                self.md.velocities = Some(all);
            }
            (None, None) => {}
        }
        self.md.kinetic_energy.push(md.kinetic_energy);
        self.md.temperature.push(md.temperature);
        self.md.pressure.push(md.pressure);
        self.md.entropy.push(md.entropy);
        Ok(())
    }

    pub fn has_velocities(&self) -> bool {
        self.md.velocities.is_some()
    }

    /// Velocities of every frame, zero-filled on first access when absent.
    pub fn velocities_or_zero(&mut self) -> &mut Vec<[f64; 3]> {
        let len = self.n_time() * self.n_atoms();
        self.md.velocities.get_or_insert_with(|| vec![[0.0; 3]; len])
    }

    pub fn velocities_at(&self, itime: usize) -> MdResult<&[[f64; 3]]> {
        self.store.check_frame(itime, "velocities")?;
        let n = self.n_atoms();
        let vel = self
            .md
            .velocities
            .as_ref()
            .ok_or_else(|| MdError::Invalid("trajectory holds no velocities".into()))?;
        Ok(&vel[itime * n..(itime + 1) * n])
    }

    pub fn kinetic_energy(&self, itime: usize) -> MdResult<f64> {
        self.store.check_frame(itime, "kinetic energy")?;
        Ok(self.md.kinetic_energy[itime])
    }

    pub fn temperature(&self, itime: usize) -> MdResult<f64> {
        self.store.check_frame(itime, "temperature")?;
        Ok(self.md.temperature[itime])
    }

    pub fn pressure(&self, itime: usize) -> MdResult<f64> {
        self.store.check_frame(itime, "pressure")?;
        Ok(self.md.pressure[itime])
    }

    pub fn entropy(&self, itime: usize) -> MdResult<f64> {
        self.store.check_frame(itime, "entropy")?;
        Ok(self.md.entropy[itime])
    }

    pub fn mean_temperature(&self, tbegin: usize, tend: usize) -> MdResult<f64> {
        self.check_times(tbegin, tend)?;
        Ok(stats::mean(&self.md.temperature[tbegin..tend]))
    }

    /// Mean total energy per atom over the window (Ha).
    pub fn mean_energy_per_atom(&self, tbegin: usize, tend: usize) -> MdResult<f64> {
        self.check_times(tbegin, tend)?;
        Ok(stats::mean(&self.store.total_energies()[tbegin..tend]) / self.n_atoms() as f64)
    }

    /// Every per-frame series must have one entry per recorded frame.
    pub fn check_consistency(&self) -> MdResult<()> {
        let n_time = self.n_time();
        let series = [
            ("kinetic energy", self.md.kinetic_energy.len()),
            ("temperature", self.md.temperature.len()),
            ("pressure", self.md.pressure.len()),
            ("entropy", self.md.entropy.len()),
        ];
        for (name, len) in series {
            if len != n_time {
                return Err(MdError::Mismatch(format!(
                    "{name} holds {len} frames, store holds {n_time}"
                )));
            }
        }
        if let Some(vel) = &self.md.velocities {
            if vel.len() != n_time * self.n_atoms() {
                return Err(MdError::Mismatch(format!(
                    "velocities hold {} vectors, expected {} frames x {} atoms",
                    vel.len(),
                    n_time,
                    self.n_atoms()
                )));
            }
        }
        Ok(())
    }

    /// Single-frame trajectory averaging every series over `[tbegin, tend)`.
    pub fn average(&self, tbegin: usize, tend: usize) -> MdResult<MdTrajectory> {
        let store = self.store.average(tbegin, tend)?;
        let n = self.n_atoms();
        let inv = 1.0 / (tend - tbegin) as f64;
        let velocities = self.md.velocities.as_ref().map(|vel| {
            let mut avg = vec![[0.0f64; 3]; n];
            for itime in tbegin..tend {
                for (acc, v) in avg.iter_mut().zip(&vel[itime * n..(itime + 1) * n]) {
                    for c in 0..3 {
                        acc[c] += v[c] * inv;
                    }
                }
            }
            avg
        });
        let md = MdSeries {
            velocities,
            kinetic_energy: vec![stats::mean(&self.md.kinetic_energy[tbegin..tend])],
            temperature: vec![stats::mean(&self.md.temperature[tbegin..tend])],
            pressure: vec![stats::mean(&self.md.pressure[tbegin..tend])],
            entropy: vec![stats::mean(&self.md.entropy[tbegin..tend])],
        };
        Ok(MdTrajectory { store, md })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell;

    fn frame(t: f64) -> Frame {
        Frame {
            time: t,
            cell: cell::orthorhombic(8.0, 8.0, 8.0),
            stress: [0.0; 6],
            total_energy: -1.0,
            positions: vec![[0.0; 3], [1.0; 3]],
        }
    }

    fn md(temp: f64, vel: Option<Vec<[f64; 3]>>) -> MdFrame {
        MdFrame {
            velocities: vel,
            kinetic_energy: 0.1,
            temperature: temp,
            pressure: 1.0,
            entropy: 0.0,
        }
    }

    #[test]
    fn late_velocities_backfill_zeros() {
        let mut traj = MdTrajectory::new(vec![0, 0], vec![1]).unwrap();
        traj.push_frame(frame(0.0), md(300.0, None)).unwrap();
        assert!(!traj.has_velocities());
        traj.push_frame(frame(1.0), md(310.0, Some(vec![[1.0; 3], [2.0; 3]])))
            .unwrap();
        assert_eq!(traj.velocities_at(0).unwrap(), &[[0.0; 3], [0.0; 3]]);
        assert_eq!(traj.velocities_at(1).unwrap()[1], [2.0; 3]);
        traj.check_consistency().unwrap();
    }

    #[test]
    fn lookups_fail_past_the_end() {
        let mut traj = MdTrajectory::new(vec![0, 0], vec![1]).unwrap();
        traj.push_frame(frame(0.0), md(300.0, None)).unwrap();
        let err = traj.temperature(1).unwrap_err();
        assert!(matches!(err, MdError::OutOfRange(_)));
        assert!(err.to_string().contains("temperature"));
        assert!(traj.velocities_at(0).is_err());
    }

    #[test]
    fn average_collapses_window() {
        let mut traj = MdTrajectory::new(vec![0, 0], vec![1]).unwrap();
        traj.push_frame(frame(0.0), md(300.0, Some(vec![[1.0; 3], [0.0; 3]])))
            .unwrap();
        traj.push_frame(frame(1.0), md(500.0, Some(vec![[3.0; 3], [0.0; 3]])))
            .unwrap();
        let avg = traj.average(0, 2).unwrap();
        assert_eq!(avg.n_time(), 1);
        assert!((avg.temperature(0).unwrap() - 400.0).abs() < 1e-12);
        assert_eq!(avg.velocities_at(0).unwrap()[0], [2.0; 3]);
    }
}
