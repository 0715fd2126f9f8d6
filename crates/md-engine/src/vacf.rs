use md_core::correlation::autocorrelation;
use md_core::error::{MdError, MdResult, ResultExt};
use md_core::md::MdTrajectory;
use md_core::units;
use rayon::prelude::*;

use crate::executor::Analysis;
use crate::spectral::SpectralBackend;

/// Per-species series: index 0 aggregates every atom, index `1 + s` is species `s`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeciesSeries {
    pub labels: Vec<String>,
    pub data: Vec<Vec<f64>>,
}

impl SpeciesSeries {
    pub fn all(&self) -> &[f64] {
        &self.data[0]
    }

    pub fn species(&self, species: usize) -> Option<&[f64]> {
        self.data.get(species + 1).map(Vec::as_slice)
    }

    pub fn n_points(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }
}

#[derive(Clone, Debug)]
pub struct VacfOutput {
    /// Lag axis (ps).
    pub time_ps: Vec<f64>,
    /// Velocity autocorrelation (nm^2/ps^2).
    pub series: SpeciesSeries,
}

#[derive(Clone, Debug)]
pub struct VacfPlan {
    tbegin: usize,
    tend: usize,
    max_lag: Option<usize>,
}

impl VacfPlan {
    pub fn new(tbegin: usize, tend: usize) -> Self {
        Self {
            tbegin,
            tend,
            max_lag: None,
        }
    }

    pub fn with_max_lag(mut self, max_lag: Option<usize>) -> Self {
        self.max_lag = max_lag;
        self
    }

    fn compute(&self, traj: &MdTrajectory) -> MdResult<VacfOutput> {
        traj.check_times(self.tbegin, self.tend)?;
        let vel = traj
            .md
            .velocities
            .as_ref()
            .ok_or_else(|| MdError::Invalid("trajectory holds no velocities".into()))?;
        let n_atoms = traj.n_atoms();
        let n_channels = 3 * n_atoms;
        let flat: Vec<f64> = vel[self.tbegin * n_atoms..self.tend * n_atoms]
            .iter()
            .flat_map(|v| v.iter().copied())
            .collect();
        let acf = autocorrelation(&flat, n_channels, self.max_lag)?;
        let n_lags = acf.len() / n_channels;

        let species_of_atom = traj.store.species_of_atom();
        let n_species = traj.n_species();
        let mut counts = vec![n_atoms];
        counts.extend(traj.store.species_counts());
        let factor = units::velocity_sq_to_nm2_ps2();

        let rows: Vec<Vec<f64>> = acf
            .par_chunks(n_channels)
            .map(|row| {
                let mut acc = vec![0.0f64; n_species + 1];
                for (atom, &species) in species_of_atom.iter().enumerate() {
                    let sum = row[3 * atom] + row[3 * atom + 1] + row[3 * atom + 2];
                    acc[0] += sum;
                    acc[species + 1] += sum;
                }
                for (value, &count) in acc.iter_mut().zip(&counts) {
                    *value = if count == 0 {
                        0.0
                    } else {
                        *value / (3 * count) as f64 * factor
                    };
                }
                acc
            })
            .collect();

        let mut data = vec![Vec::with_capacity(n_lags); n_species + 1];
        for row in &rows {
            for (series, &value) in data.iter_mut().zip(row) {
                series.push(value);
            }
        }
        let mut labels = vec!["All".to_string()];
        labels.extend(traj.store.species_labels()?);

        let dt = traj.timestep_ps();
        let time_ps = (0..n_lags).map(|lag| lag as f64 * dt).collect();
        log::debug!("vacf: {n_lags} lags over frames [{}, {})", self.tbegin, self.tend);
        Ok(VacfOutput {
            time_ps,
            series: SpeciesSeries { labels, data },
        })
    }
}

impl Analysis for VacfPlan {
    type Output = VacfOutput;

    fn name(&self) -> &'static str {
        "vacf"
    }

    fn run(&self, traj: &MdTrajectory, _backend: &SpectralBackend) -> MdResult<VacfOutput> {
        self.compute(traj).context("VACF calculation failed")
    }
}
