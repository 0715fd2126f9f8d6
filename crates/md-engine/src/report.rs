//! Plottable series and textual summaries derived from a trajectory.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use md_core::error::{MdError, MdResult, ResultExt};
use md_core::md::MdTrajectory;
use md_core::{cell, stats, units};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::executor::Analysis;
use crate::pdos::{PdosPlan, Smearing};
use crate::spectral::SpectralBackend;
use crate::thermo::{HarmonicModel, ThermoFunctions};
use crate::vacf::VacfPlan;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    Pressure,
    KineticEnergy,
    Entropy,
    Vacf,
    Pdos,
    Thermo,
}

impl Quantity {
    pub fn keyword(&self) -> &'static str {
        match self {
            Quantity::Temperature => "T",
            Quantity::Pressure => "P",
            Quantity::KineticEnergy => "ekin",
            Quantity::Entropy => "entropy",
            Quantity::Vacf => "vacf",
            Quantity::Pdos => "pdos",
            Quantity::Thermo => "thermo",
        }
    }
}

impl FromStr for Quantity {
    type Err = MdError;

    fn from_str(s: &str) -> MdResult<Self> {
        match s.trim() {
            "T" => Ok(Quantity::Temperature),
            "P" => Ok(Quantity::Pressure),
            "ekin" => Ok(Quantity::KineticEnergy),
            "entropy" => Ok(Quantity::Entropy),
            "vacf" => Ok(Quantity::Vacf),
            "pdos" => Ok(Quantity::Pdos),
            "thermo" => Ok(Quantity::Thermo),
            other => Err(MdError::Parse(format!("function {other} not available yet"))),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Fs,
    #[default]
    Step,
}

impl FromStr for TimeUnit {
    type Err = MdError;

    fn from_str(s: &str) -> MdResult<Self> {
        match s.trim() {
            "fs" => Ok(TimeUnit::Fs),
            "step" => Ok(TimeUnit::Step),
            other => Err(MdError::Parse(format!(
                "unknown time unit '{other}', allowed values are fs and step"
            ))),
        }
    }
}

/// Harmonic thermodynamics printed alongside a PDOS.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarmonicSummary {
    /// Mean total energy per atom (eV).
    pub e0: f64,
    pub functions: ThermoFunctions,
}

impl HarmonicSummary {
    pub fn total_free_energy(&self) -> f64 {
        self.e0 + self.functions.free_energy
    }
}

impl fmt::Display for HarmonicSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Thermodynamic functions in the Harmonic Approximation")?;
        writeln!(f, "E_0   = {} eV/atom", self.e0)?;
        writeln!(f, "F_vib = {} eV/atom", self.functions.free_energy)?;
        writeln!(f, "E_vib = {} eV/atom", self.functions.internal_energy)?;
        writeln!(f, "C_v   = {} kB/atom", self.functions.heat_capacity)?;
        writeln!(f, "S_vib = {} kB/atom", self.functions.entropy)?;
        writeln!(f, "F_tot = {} eV/atom", self.total_free_energy())
    }
}

/// A plottable result: one x axis shared by one or more labelled curves.
#[derive(Clone, Debug, Default)]
pub struct DerivedSeries {
    /// Suggested output name.
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub y: Vec<Vec<f64>>,
    pub labels: Vec<String>,
    pub harmonic: Option<HarmonicSummary>,
}

/// Build the series selected by `quantity` over `[tbegin, tend)`.
pub fn derived_series(
    traj: &MdTrajectory,
    tbegin: usize,
    tend: usize,
    quantity: Quantity,
    config: &AnalysisConfig,
    backend: &SpectralBackend,
) -> MdResult<DerivedSeries> {
    traj.check_times(tbegin, tend)?;
    let unit = config.time_unit.unwrap_or_default();
    let mut out = DerivedSeries {
        x_label: match unit {
            TimeUnit::Fs => "Time [fs]".into(),
            TimeUnit::Step => "Time [step]".into(),
        },
        x: time_axis(traj, tbegin, tend, unit),
        ..DerivedSeries::default()
    };

    let window = |values: &[f64]| values[tbegin..tend].to_vec();
    match quantity {
        Quantity::Temperature => {
            section("Temperature");
            fill(&mut out, "temperature", "Temperature", "Temperature [K]");
            out.y.push(window(&traj.md.temperature));
        }
        Quantity::Pressure => {
            section("Pressure");
            fill(&mut out, "pressure", "Pressure", "Pressure [GPa]");
            out.y.push(window(&traj.md.pressure));
        }
        Quantity::KineticEnergy => {
            section("Kinetic energy");
            fill(&mut out, "ekin", "Kinetic energy", "Ekin [Ha]");
            out.y.push(window(&traj.md.kinetic_energy));
        }
        Quantity::Entropy => {
            section("Electronic entropy");
            fill(&mut out, "entropy", "Electronic entropy", "Entropy");
            out.y.push(window(&traj.md.entropy));
        }
        Quantity::Vacf => {
            section("VACF");
            fill(&mut out, "VACF", "VACF", "VACF [nm^2/ps^2/atom]");
            let vacf = VacfPlan::new(tbegin, tend)
                .with_max_lag(config.max_lag)
                .run(traj, backend)?;
            out.x_label = "Time [ps]".into();
            out.x = vacf.time_ps;
            out.labels = vacf.series.labels;
            out.y = vacf.series.data;
        }
        Quantity::Pdos => {
            section("PDOS");
            fill(&mut out, "PDOS", "PDOS", "PDOS [arbitrary units/atom]");
            let pdos = PdosPlan::new(tbegin, tend)
                .with_smearing(Smearing::from_kelvin(config.tsmear))
                .with_max_lag(config.max_lag)
                .run(traj, backend)
                .context("PDOS calculation failed")?;
            if let Some(t) = pdos.tsmear_kelvin {
                log::info!("Smearing [K]: {t}");
            }
            let temperature = traj.mean_temperature(tbegin, tend)?;
            let functions = HarmonicModel::new(traj.timestep_ps(), config.omega_max)
                .and_then(|model| model.compute(pdos.series.all(), temperature))
                .context("unable to compute thermodynamic functions")?;
            let summary = HarmonicSummary {
                e0: traj.mean_energy_per_atom(tbegin, tend)? * units::HARTREE_EV,
                functions,
            };
            log::info!("{}", summary.to_string().trim_end());
            out.x_label = "Frequency [meV]".into();
            out.x = pdos.frequency_mev;
            out.labels = pdos.series.labels;
            out.y = pdos.series.data;
            out.harmonic = Some(summary);
        }
        Quantity::Thermo => {
            section("Thermodynamical Functions");
            fill(
                &mut out,
                "thermoFunctions",
                "Thermodynamical Functions",
                "Thermodynamical Functions",
            );
            let temperature = traj.mean_temperature(tbegin, tend)?;
            log::info!(
                "E_0   = {} eV/atom",
                traj.mean_energy_per_atom(tbegin, tend)? * units::HARTREE_EV
            );
            let sweep = PdosPlan::new(tbegin, tend)
                .with_smearing(Smearing::from_kelvin(config.tsmear))
                .with_max_lag(config.max_lag)
                .run(traj, backend)
                .and_then(|pdos| {
                    HarmonicModel::new(traj.timestep_ps(), config.omega_max)?
                        .sweep(pdos.series.all(), temperature)
                })
                .context("unable to compute thermodynamic functions")?;
            out.x_label = "Temperature [K]".into();
            out.x = sweep.temperatures;
            out.y = vec![
                sweep.free_energy,
                sweep.internal_energy,
                sweep.heat_capacity,
                sweep.entropy,
            ];
            out.labels = vec![
                "F_vib [eV/atom]".into(),
                "E_vib [eV/atom]".into(),
                "C_v   [kB/atom]".into(),
                "S_vib [kB/atom]".into(),
            ];
        }
    }
    if let Some(name) = &config.output {
        out.name = name.clone();
    }
    Ok(out)
}

fn section(title: &str) {
    log::info!(" -- {title} --");
}

fn fill(out: &mut DerivedSeries, name: &str, title: &str, y_label: &str) {
    out.name = name.into();
    out.title = title.into();
    out.y_label = y_label.into();
}

fn time_axis(traj: &MdTrajectory, tbegin: usize, tend: usize, unit: TimeUnit) -> Vec<f64> {
    match unit {
        TimeUnit::Fs => traj.store.times()[tbegin..tend]
            .iter()
            .map(|&t| units::atu_to_fs(t))
            .collect(),
        TimeUnit::Step => (tbegin..tend).map(|i| i as f64).collect(),
    }
}

/// Mean and deviation of the bulk observables of a window.
#[derive(Clone, Debug, PartialEq)]
pub struct ThermoSummary {
    /// Total energy (Ha).
    pub total_energy: (f64, f64),
    /// Cell volume (bohr^3).
    pub volume: (f64, f64),
    /// Temperature (K).
    pub temperature: (f64, f64),
    /// Pressure (GPa).
    pub pressure: (f64, f64),
    /// Voigt stress components (GPa).
    pub stress: [(f64, f64); 6],
}

impl ThermoSummary {
    pub fn from_window(traj: &MdTrajectory, tbegin: usize, tend: usize) -> MdResult<Self> {
        traj.check_times(tbegin, tend)?;
        let store = &traj.store;
        let volumes: Vec<f64> = store.cells()[tbegin..tend].iter().map(cell::volume).collect();
        let gpa = units::ha_per_bohr3_to_gpa();
        let mut stress = [(0.0, 0.0); 6];
        for (s, slot) in stress.iter_mut().enumerate() {
            let values: Vec<f64> = store.stresses()[tbegin..tend]
                .iter()
                .map(|v| v[s] * gpa)
                .collect();
            *slot = stats::mean_deviation(&values);
        }
        Ok(Self {
            total_energy: stats::mean_deviation(&store.total_energies()[tbegin..tend]),
            volume: stats::mean_deviation(&volumes),
            temperature: stats::mean_deviation(&traj.md.temperature[tbegin..tend]),
            pressure: stats::mean_deviation(&traj.md.pressure[tbegin..tend]),
            stress,
        })
    }
}

impl fmt::Display for ThermoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn row(f: &mut fmt::Formatter<'_>, label: &str, (mean, dev): (f64, f64)) -> fmt::Result {
            writeln!(f, "{label:<25}{mean:>12.5e} +/- {dev:>12.5e}")
        }
        writeln!(f, " -- Thermodynamics information --")?;
        writeln!(f, "    ^^^^^^^^^^^^^^^^^^^^^^^^^^   ")?;
        row(f, " Total energy [Ha]:", self.total_energy)?;
        row(f, " Volume [Bohr^3]: ", self.volume)?;
        row(f, " Temperature [K]: ", self.temperature)?;
        row(f, " Pressure [GPa]: ", self.pressure)?;
        for (s, value) in self.stress.iter().enumerate() {
            row(f, &format!(" Stress {} [GPa]: ", s + 1), *value)?;
        }
        Ok(())
    }
}

pub fn write_thermo_summary<W: Write>(
    traj: &MdTrajectory,
    tbegin: usize,
    tend: usize,
    out: &mut W,
) -> MdResult<()> {
    let summary = ThermoSummary::from_window(traj, tbegin, tend)?;
    write!(out, "{summary}")?;
    Ok(())
}
