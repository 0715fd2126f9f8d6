use crate::blend::InterpolationScheme;
use crate::cell::{self, Cell};
use crate::elements;
use crate::error::{MdError, MdResult};
use crate::stats;
use crate::units;
use serde::{Deserialize, Serialize};

/// One recorded step as delivered by a trajectory reader.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Frame {
    /// Simulation time (atu).
    pub time: f64,
    pub cell: Cell,
    /// Voigt stress (Ha/bohr^3): xx, yy, zz, yz, xz, xy.
    pub stress: [f64; 6],
    /// Total energy (Ha).
    pub total_energy: f64,
    /// Cartesian positions (bohr), one per atom.
    pub positions: Vec<[f64; 3]>,
}

/// Per-frame series common to every trajectory source.
#[derive(Clone, Debug)]
pub struct TrajectoryStore {
    species_of_atom: Vec<usize>,
    atomic_numbers: Vec<u32>,
    n_time_available: usize,
    time: Vec<f64>,
    cell: Vec<Cell>,
    stress: Vec<[f64; 6]>,
    total_energy: Vec<f64>,
    positions: Vec<[f64; 3]>,
}

impl TrajectoryStore {
    /// `species_of_atom` holds 0-based indices into `atomic_numbers`.
    pub fn new(species_of_atom: Vec<usize>, atomic_numbers: Vec<u32>) -> MdResult<Self> {
        if species_of_atom.is_empty() {
            return Err(MdError::Invalid("trajectory needs at least one atom".into()));
        }
        for &z in &atomic_numbers {
            elements::mass_amu(z)?;
        }
        if let Some(atom) = species_of_atom
            .iter()
            .position(|&s| s >= atomic_numbers.len())
        {
            return Err(MdError::Invalid(format!(
                "atom {atom} has species {} but only {} species are defined",
                species_of_atom[atom],
                atomic_numbers.len()
            )));
        }
        Ok(Self {
            species_of_atom,
            atomic_numbers,
            n_time_available: 0,
            time: Vec::new(),
            cell: Vec::new(),
            stress: Vec::new(),
            total_energy: Vec::new(),
            positions: Vec::new(),
        })
    }

    pub fn n_atoms(&self) -> usize {
        self.species_of_atom.len()
    }

    pub fn n_species(&self) -> usize {
        self.atomic_numbers.len()
    }

    pub fn n_time(&self) -> usize {
        self.time.len()
    }

    pub fn n_time_available(&self) -> usize {
        self.n_time_available.max(self.n_time())
    }

    pub fn species_of_atom(&self) -> &[usize] {
        &self.species_of_atom
    }

    pub fn atomic_numbers(&self) -> &[u32] {
        &self.atomic_numbers
    }

    pub fn species_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_species()];
        for &s in &self.species_of_atom {
            counts[s] += 1;
        }
        counts
    }

    /// Element symbol of every species.
    pub fn species_labels(&self) -> MdResult<Vec<String>> {
        self.atomic_numbers
            .iter()
            .map(|&z| elements::symbol(z).map(str::to_string))
            .collect()
    }

    /// Mass of every atom in electron masses.
    pub fn atom_masses(&self) -> MdResult<Vec<f64>> {
        self.species_of_atom
            .iter()
            .map(|&s| elements::mass_amu(self.atomic_numbers[s]).map(|m| m * units::AMU_EMASS))
            .collect()
    }

    /// Announce `frames` upcoming frames.
    pub fn reserve(&mut self, frames: usize) {
        self.n_time_available = self.n_time() + frames;
        self.time.reserve(frames);
        self.cell.reserve(frames);
        self.stress.reserve(frames);
        self.total_energy.reserve(frames);
        self.positions.reserve(frames * self.n_atoms());
    }

    pub fn push_frame(&mut self, frame: Frame) -> MdResult<()> {
        if frame.positions.len() != self.n_atoms() {
            return Err(MdError::Mismatch(format!(
                "frame {} has {} positions for {} atoms",
                self.n_time(),
                frame.positions.len(),
                self.n_atoms()
            )));
        }
        self.time.push(frame.time);
        self.cell.push(frame.cell);
        self.stress.push(frame.stress);
        self.total_energy.push(frame.total_energy);
        self.positions.extend_from_slice(&frame.positions);
        Ok(())
    }

    pub fn times(&self) -> &[f64] {
        &self.time
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cell
    }

    pub fn stresses(&self) -> &[[f64; 6]] {
        &self.stress
    }

    pub fn total_energies(&self) -> &[f64] {
        &self.total_energy
    }

    /// All positions, frame-major.
    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    pub fn positions_at(&self, itime: usize) -> MdResult<&[[f64; 3]]> {
        self.check_frame(itime, "positions")?;
        let n = self.n_atoms();
        Ok(&self.positions[itime * n..(itime + 1) * n])
    }

    pub fn cell_at(&self, itime: usize) -> MdResult<&Cell> {
        self.check_frame(itime, "cell")?;
        Ok(&self.cell[itime])
    }

    pub fn stress_at(&self, itime: usize) -> MdResult<&[f64; 6]> {
        self.check_frame(itime, "stress")?;
        Ok(&self.stress[itime])
    }

    pub fn check_frame(&self, itime: usize, quantity: &str) -> MdResult<()> {
        if itime >= self.n_time() {
            return Err(MdError::OutOfRange(format!(
                "frame {itime} requested for {quantity} but only {} frames are recorded",
                self.n_time()
            )));
        }
        Ok(())
    }

    /// Validate a half-open frame window.
    pub fn check_times(&self, tbegin: usize, tend: usize) -> MdResult<()> {
        if tbegin >= tend || tend > self.n_time() {
            return Err(MdError::OutOfRange(format!(
                "frame window [{tbegin}, {tend}) is invalid for {} recorded frames",
                self.n_time()
            )));
        }
        Ok(())
    }

    /// Spacing of the first two frames (atu).
    pub fn timestep_atu(&self) -> f64 {
        if self.time.len() > 1 {
            self.time[1] - self.time[0]
        } else {
            units::DEFAULT_DTION_ATU
        }
    }

    pub fn timestep_ps(&self) -> f64 {
        units::atu_to_ps(self.timestep_atu())
    }

    pub fn volumes(&self, tbegin: usize, tend: usize) -> MdResult<Vec<f64>> {
        self.check_times(tbegin, tend)?;
        Ok(self.cell[tbegin..tend].iter().map(cell::volume).collect())
    }

    /// Same atoms in the same species, possibly in another order.
    pub fn check_identity(&self, other: &TrajectoryStore) -> MdResult<()> {
        if self.n_atoms() != other.n_atoms() {
            return Err(MdError::Mismatch(format!(
                "cannot combine {} atoms with {} atoms",
                self.n_atoms(),
                other.n_atoms()
            )));
        }
        if self.atomic_numbers != other.atomic_numbers {
            return Err(MdError::Mismatch(format!(
                "species tables differ: {:?} vs {:?}",
                self.atomic_numbers, other.atomic_numbers
            )));
        }
        if self.species_counts() != other.species_counts() {
            return Err(MdError::Mismatch(
                "species populations differ between segments".into(),
            ));
        }
        Ok(())
    }

    /// Concatenate `other` after the filled frames.
    ///
    /// With `order`, atom `i` of the result is atom `order[i]` of `other`.
    pub fn append_store(&mut self, other: &TrajectoryStore, order: Option<&[usize]>) -> MdResult<()> {
        self.check_identity(other)?;
        let n = self.n_atoms();
        if let Some(order) = order {
            if order.len() != n {
                return Err(MdError::Mismatch(format!(
                    "atom permutation has {} entries for {n} atoms",
                    order.len()
                )));
            }
        }
        self.time.extend_from_slice(&other.time);
        self.cell.extend_from_slice(&other.cell);
        self.stress.extend_from_slice(&other.stress);
        self.total_energy.extend_from_slice(&other.total_energy);
        match order {
            None => self.positions.extend_from_slice(&other.positions),
            Some(order) => {
                for itime in 0..other.n_time() {
                    let frame = &other.positions[itime * n..(itime + 1) * n];
                    self.positions.extend(order.iter().map(|&src| frame[src]));
                }
            }
        }
        self.n_time_available = self.n_time_available.max(self.n_time());
        log::debug!(
            "appended {} frames ({} total, reordered: {})",
            other.n_time(),
            self.n_time(),
            order.is_some()
        );
        Ok(())
    }

    /// Replace every series by its interpolated counterpart.
    pub fn interpolate(&mut self, scheme: &InterpolationScheme) -> MdResult<()> {
        let n_time = self.n_time();
        scheme.check_frames(n_time)?;
        scheme.apply(&mut self.time, 1, n_time)?;
        scheme.apply(&mut self.cell, 1, n_time)?;
        scheme.apply(&mut self.stress, 1, n_time)?;
        scheme.apply(&mut self.total_energy, 1, n_time)?;
        scheme.apply(&mut self.positions, self.species_of_atom.len(), n_time)?;
        self.n_time_available = self.n_time();
        log::debug!("interpolated {n_time} frames into {}", self.n_time());
        Ok(())
    }

    /// Single-frame store averaging every series over `[tbegin, tend)`.
    pub fn average(&self, tbegin: usize, tend: usize) -> MdResult<TrajectoryStore> {
        self.check_times(tbegin, tend)?;
        let n = self.n_atoms();
        let inv = 1.0 / (tend - tbegin) as f64;
        let mut frame = Frame {
            time: stats::mean(&self.time[tbegin..tend]),
            cell: [[0.0; 3]; 3],
            stress: [0.0; 6],
            total_energy: stats::mean(&self.total_energy[tbegin..tend]),
            positions: vec![[0.0; 3]; n],
        };
        for itime in tbegin..tend {
            for i in 0..3 {
                for j in 0..3 {
                    frame.cell[i][j] += self.cell[itime][i][j] * inv;
                }
            }
            for (s, acc) in frame.stress.iter_mut().enumerate() {
                *acc += self.stress[itime][s] * inv;
            }
            for (acc, p) in frame
                .positions
                .iter_mut()
                .zip(&self.positions[itime * n..(itime + 1) * n])
            {
                for c in 0..3 {
                    acc[c] += p[c] * inv;
                }
            }
        }
        let mut out = TrajectoryStore::new(self.species_of_atom.clone(), self.atomic_numbers.clone())?;
        out.push_frame(frame)?;
        Ok(out)
    }
}
