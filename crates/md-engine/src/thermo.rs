//! Vibrational thermodynamics in the harmonic approximation.
//!
//! A normalized PDOS `g(w)` is treated as a set of independent quantum
//! oscillators; with `x = w / 2kT`:
//!
//! ```text
//! F = 3kT  int g ln(2 sinh x) dw
//! E = 3/2  int g w coth x dw
//! Cv = 3   int g x^2 / sinh^2 x dw
//! S = 3    int g (x coth x - ln(2 sinh x)) dw
//! ```
//!
//! Energies are in eV/atom, heat capacity and entropy in kB/atom.

use md_core::error::{MdError, MdResult, ResultExt};
use md_core::md::MdTrajectory;
use md_core::units;

use crate::executor::Analysis;
use crate::pdos::{PdosPlan, Smearing};
use crate::spectral::SpectralBackend;

/// Number of temperatures in a sweep.
pub const SWEEP_POINTS: usize = 1000;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThermoFunctions {
    pub free_energy: f64,
    pub internal_energy: f64,
    pub heat_capacity: f64,
    pub entropy: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThermoSweep {
    pub temperatures: Vec<f64>,
    pub free_energy: Vec<f64>,
    pub internal_energy: Vec<f64>,
    pub heat_capacity: Vec<f64>,
    pub entropy: Vec<f64>,
}

/// `(ln(2 sinh x), coth x, x^2 / sinh^2 x)` without overflow for large `x`.
fn kernels(x: f64) -> (f64, f64, f64) {
    let e = (-2.0 * x).exp();
    let one_minus = -(-2.0 * x).exp_m1();
    let ln_2sinh = x + one_minus.ln();
    let coth = (1.0 + e) / one_minus;
    let x2_sinh2 = 4.0 * x * x * e / (one_minus * one_minus);
    (ln_2sinh, coth, x2_sinh2)
}

#[derive(Clone, Copy, Debug)]
pub struct HarmonicModel {
    dtion_ps: f64,
    omega_max: Option<f64>,
}

impl HarmonicModel {
    /// `dtion_ps` is the sampling step of the PDOS source; `omega_max` is a
    /// cutoff in THz.
    pub fn new(dtion_ps: f64, omega_max: Option<f64>) -> MdResult<Self> {
        if !(dtion_ps.is_finite() && dtion_ps > 0.0) {
            return Err(MdError::Invalid(format!(
                "time step must be positive (got {dtion_ps} ps)"
            )));
        }
        if let Some(w) = omega_max {
            if !(w > 0.0) {
                return Err(MdError::Invalid(format!(
                    "frequency cutoff must be positive (got {w} THz)"
                )));
            }
        }
        Ok(Self { dtion_ps, omega_max })
    }

    /// Bin width (THz) of an `n`-point spectrum.
    pub fn domega(&self, n: usize) -> f64 {
        1.0 / (2.0 * self.dtion_ps * n as f64)
    }

    /// PDOS restricted to the cutoff and scaled to unit trapezoid integral,
    /// with its bin width (THz).
    pub fn normalize(&self, pdos: &[f64]) -> MdResult<(Vec<f64>, f64)> {
        let n = pdos.len();
        if n == 0 {
            return Err(MdError::Invalid("empty PDOS".into()));
        }
        let domega = self.domega(n);
        let nmax = match self.omega_max {
            Some(w) => ((w / domega).floor() as usize).min(n),
            None => n,
        };
        if nmax < 2 {
            return Err(MdError::Invalid(format!(
                "frequency cutoff keeps {nmax} bins of {n}; at least 2 are needed"
            )));
        }
        let norm: f64 = pdos[..nmax]
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]) * domega)
            .sum();
        if !(norm.is_finite() && norm != 0.0) {
            return Err(MdError::Invalid(format!(
                "PDOS cannot be normalized (integral {norm})"
            )));
        }
        Ok((pdos[..nmax].iter().map(|g| g / norm).collect(), domega))
    }

    pub fn compute(&self, pdos: &[f64], temperature: f64) -> MdResult<ThermoFunctions> {
        let (g, domega) = self.normalize(pdos)?;
        self.evaluate(&g, domega, temperature)
    }

    /// Functions at `SWEEP_POINTS` temperatures spread over `(0, 2T]`.
    pub fn sweep(&self, pdos: &[f64], temperature: f64) -> MdResult<ThermoSweep> {
        check_temperature(temperature)?;
        let (g, domega) = self.normalize(pdos)?;
        let mut out = ThermoSweep::default();
        for i in 0..SWEEP_POINTS {
            let t = (i + 1) as f64 * 2.0 * temperature / SWEEP_POINTS as f64;
            let f = self.evaluate(&g, domega, t)?;
            out.temperatures.push(t);
            out.free_energy.push(f.free_energy);
            out.internal_energy.push(f.internal_energy);
            out.heat_capacity.push(f.heat_capacity);
            out.entropy.push(f.entropy);
        }
        Ok(out)
    }

    fn evaluate(&self, g: &[f64], domega: f64, temperature: f64) -> MdResult<ThermoFunctions> {
        check_temperature(temperature)?;
        let kt = units::kbt_ev(temperature);
        let bin_ev = units::thz_to_mev(domega) * 1.0e-3;
        let inv_2kt = 0.5 / kt;

        // kernels at the centre of [i, i + 1], weighted by the trapezoid of g there
        let mut acc = [0.0f64; 4];
        for (i, pair) in g.windows(2).enumerate() {
            let weight = 0.5 * (pair[0] + pair[1]) * domega;
            let omega = (i as f64 + 0.5) * bin_ev;
            let x = omega * inv_2kt;
            let (ln_2sinh, coth, x2_sinh2) = kernels(x);
            acc[0] += ln_2sinh * weight;
            acc[1] += omega * coth * weight;
            acc[2] += x2_sinh2 * weight;
            acc[3] += (x * coth - ln_2sinh) * weight;
        }
        Ok(ThermoFunctions {
            free_energy: acc[0] * 3.0 * kt,
            internal_energy: acc[1] * 1.5,
            heat_capacity: acc[2] * 3.0,
            entropy: acc[3] * 3.0,
        })
    }
}

fn check_temperature(temperature: f64) -> MdResult<()> {
    if !(temperature.is_finite() && temperature > 0.0) {
        return Err(MdError::Invalid(format!(
            "temperature must be positive (got {temperature} K)"
        )));
    }
    Ok(())
}

/// Harmonic functions of a trajectory window at its mean temperature.
#[derive(Clone, Debug)]
pub struct ThermoPlan {
    tbegin: usize,
    tend: usize,
    omega_max: Option<f64>,
    max_lag: Option<usize>,
}

impl ThermoPlan {
    pub fn new(tbegin: usize, tend: usize) -> Self {
        Self {
            tbegin,
            tend,
            omega_max: None,
            max_lag: None,
        }
    }

    pub fn with_omega_max(mut self, omega_max: Option<f64>) -> Self {
        self.omega_max = omega_max;
        self
    }

    pub fn with_max_lag(mut self, max_lag: Option<usize>) -> Self {
        self.max_lag = max_lag;
        self
    }

    fn compute(&self, traj: &MdTrajectory, backend: &SpectralBackend) -> MdResult<ThermoFunctions> {
        let pdos = PdosPlan::new(self.tbegin, self.tend)
            .with_smearing(Smearing::None)
            .with_max_lag(self.max_lag)
            .run(traj, backend)?;
        let temperature = traj.mean_temperature(self.tbegin, self.tend)?;
        HarmonicModel::new(traj.timestep_ps(), self.omega_max)?
            .compute(pdos.series.all(), temperature)
    }
}

impl Analysis for ThermoPlan {
    type Output = ThermoFunctions;

    fn name(&self) -> &'static str {
        "thermo"
    }

    fn run(&self, traj: &MdTrajectory, backend: &SpectralBackend) -> MdResult<ThermoFunctions> {
        self.compute(traj, backend)
            .context("unable to compute thermodynamic functions")
    }
}
