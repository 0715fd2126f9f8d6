//! Phonon density of states from the velocity autocorrelation.

use md_core::error::{MdError, MdResult};
use md_core::md::MdTrajectory;
use md_core::units;

use crate::executor::Analysis;
use crate::spectral::{spectral_density, SpectralBackend};
use crate::vacf::{SpeciesSeries, VacfPlan};

/// Fraction of the mean temperature used as smearing when none is given.
pub const DEFAULT_SMEARING_RATIO: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Smearing {
    /// `DEFAULT_SMEARING_RATIO` times the mean temperature of the window.
    Default,
    /// Gaussian width given as a temperature (K).
    Kelvin(f64),
    /// Gaussian width on the normalized frequency axis `i / n`.
    Normalized(f64),
    None,
}

impl Smearing {
    pub fn from_kelvin(tsmear: Option<f64>) -> Self {
        tsmear.map_or(Smearing::Default, Smearing::Kelvin)
    }

    fn validate(&self) -> MdResult<()> {
        match *self {
            Smearing::Kelvin(t) if !(t >= 0.0) => Err(MdError::Invalid(format!(
                "tsmear must be positive (got {t} K)"
            ))),
            Smearing::Normalized(s) if !(s >= 0.0) => Err(MdError::Invalid(format!(
                "tsmear must be positive (got {s})"
            ))),
            _ => Ok(()),
        }
    }
}

/// Smearing temperature (K) expressed on the normalized axis of a transform
/// sampled every `dtion_ps`.
pub fn kelvin_to_normalized(tsmear: f64, dtion_ps: f64) -> f64 {
    tsmear * units::kbt_ev(1.0) * 1.0e3 / units::thz_to_mev(1.0) * (2.0 * dtion_ps)
}

/// Energy (meV) of every bin of an `n`-point spectrum.
pub fn frequency_axis_mev(n: usize, dtion_ps: f64) -> Vec<f64> {
    let scale = 1.0 / (2.0 * dtion_ps * n as f64);
    (0..n).map(|i| units::thz_to_mev(i as f64 * scale)).collect()
}

#[derive(Clone, Debug)]
pub struct PdosOutput {
    pub frequency_mev: Vec<f64>,
    pub series: SpeciesSeries,
    /// Smearing actually applied, in K (`None` when given on the normalized axis).
    pub tsmear_kelvin: Option<f64>,
    pub sigma: f64,
}

#[derive(Clone, Debug)]
pub struct PdosPlan {
    tbegin: usize,
    tend: usize,
    smearing: Smearing,
    max_lag: Option<usize>,
}

impl PdosPlan {
    pub fn new(tbegin: usize, tend: usize) -> Self {
        Self {
            tbegin,
            tend,
            smearing: Smearing::Default,
            max_lag: None,
        }
    }

    pub fn with_smearing(mut self, smearing: Smearing) -> Self {
        self.smearing = smearing;
        self
    }

    pub fn with_max_lag(mut self, max_lag: Option<usize>) -> Self {
        self.max_lag = max_lag;
        self
    }
}

impl Analysis for PdosPlan {
    type Output = PdosOutput;

    fn name(&self) -> &'static str {
        "pdos"
    }

    fn run(&self, traj: &MdTrajectory, backend: &SpectralBackend) -> MdResult<PdosOutput> {
        self.smearing.validate()?;
        if !backend.is_available() {
            return Err(MdError::Unsupported(
                "a Fourier transform backend is needed to compute the PDOS".into(),
            ));
        }
        let vacf = VacfPlan::new(self.tbegin, self.tend)
            .with_max_lag(self.max_lag)
            .run(traj, backend)?;
        let dtion_ps = traj.timestep_ps();

        let tsmear_kelvin = match self.smearing {
            Smearing::Default => {
                Some(DEFAULT_SMEARING_RATIO * traj.mean_temperature(self.tbegin, self.tend)?)
            }
            Smearing::Kelvin(t) => Some(t),
            Smearing::Normalized(_) => None,
            Smearing::None => Some(0.0),
        };
        let sigma = match (self.smearing, tsmear_kelvin) {
            (Smearing::Normalized(s), _) => s,
            (_, Some(t)) => kelvin_to_normalized(t, dtion_ps),
            (_, None) => 0.0,
        };
        if let Some(t) = tsmear_kelvin {
            log::debug!("pdos: smearing {t:.3} K (sigma {sigma:.3e})");
        }

        let data = spectral_density(&vacf.series.data, sigma, backend)?;
        let series = SpeciesSeries {
            labels: vacf.series.labels,
            data,
        };
        let frequency_mev = frequency_axis_mev(series.n_points(), dtion_ps);
        Ok(PdosOutput {
            frequency_mev,
            series,
            tsmear_kelvin,
            sigma,
        })
    }
}
