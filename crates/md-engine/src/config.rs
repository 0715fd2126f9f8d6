use std::fs;
use std::path::Path;

use md_core::error::{MdError, MdResult};
use serde::{Deserialize, Serialize};

use crate::merge::MergeOptions;
use crate::report::TimeUnit;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// PDOS smearing (K); 5% of the mean temperature when absent.
    #[serde(default)]
    pub tsmear: Option<f64>,
    #[serde(default)]
    pub time_unit: Option<TimeUnit>,
    /// Harmonic integration cutoff (THz).
    #[serde(default)]
    pub omega_max: Option<f64>,
    #[serde(default = "default_true")]
    pub reconcile_atoms: bool,
    #[serde(default)]
    pub max_lag: Option<usize>,
    /// `auto`, `rustfft` or `none`.
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub dt_tolerance: Option<f64>,
    #[serde(default)]
    pub thermal_tolerance: Option<f64>,
    /// Overrides the suggested name of derived series.
    #[serde(default)]
    pub output: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tsmear: None,
            time_unit: None,
            omega_max: None,
            reconcile_atoms: true,
            max_lag: None,
            backend: None,
            dt_tolerance: None,
            thermal_tolerance: None,
            output: None,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> MdResult<()> {
        if let Some(t) = self.tsmear {
            if !(t >= 0.0) {
                return Err(MdError::Invalid(format!(
                    "tsmear needs to be positive (got {t})"
                )));
            }
        }
        if let Some(w) = self.omega_max {
            if !(w > 0.0) {
                return Err(MdError::Invalid(format!(
                    "omega_max must be positive (got {w})"
                )));
            }
        }
        if self.max_lag == Some(0) {
            return Err(MdError::Invalid("max_lag must be at least 1".into()));
        }
        for (name, value) in [
            ("dt_tolerance", self.dt_tolerance),
            ("thermal_tolerance", self.thermal_tolerance),
        ] {
            if let Some(v) = value {
                if !(v >= 0.0) {
                    return Err(MdError::Invalid(format!(
                        "{name} must be non-negative (got {v})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validated copy with every defaultable field filled in.
    pub fn normalized(&self) -> MdResult<AnalysisConfig> {
        let mut cfg = self.clone();
        cfg.validate()?;
        let defaults = MergeOptions::default();
        if cfg.time_unit.is_none() {
            cfg.time_unit = Some(TimeUnit::Step);
        }
        if cfg.backend.is_none() {
            cfg.backend = Some("auto".into());
        }
        if cfg.dt_tolerance.is_none() {
            cfg.dt_tolerance = Some(defaults.dt_tolerance);
        }
        if cfg.thermal_tolerance.is_none() {
            cfg.thermal_tolerance = Some(defaults.thermal_tolerance);
        }
        Ok(cfg)
    }

    pub fn merge_options(&self) -> MergeOptions {
        let defaults = MergeOptions::default();
        MergeOptions {
            reconcile_atoms: self.reconcile_atoms,
            dt_tolerance: self.dt_tolerance.unwrap_or(defaults.dt_tolerance),
            thermal_tolerance: self.thermal_tolerance.unwrap_or(defaults.thermal_tolerance),
        }
    }
}

/// Read a JSON or YAML config, chosen by file extension.
pub fn load_config(path: &Path) -> MdResult<AnalysisConfig> {
    let content = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let cfg: AnalysisConfig = if ext == "yaml" || ext == "yml" {
        serde_yaml::from_str(&content)
            .map_err(|e| MdError::Parse(format!("yaml parse error: {e}")))?
    } else {
        serde_json::from_str(&content)
            .map_err(|e| MdError::Parse(format!("json parse error: {e}")))?
    };
    cfg.normalized()
}
