pub mod config;
pub mod executor;
pub mod finite_diff;
pub mod interpolate;
pub mod merge;
pub mod pdos;
pub mod reconcile;
pub mod report;
pub mod spectral;
pub mod thermo;
pub mod vacf;

pub use config::{load_config, AnalysisConfig};
pub use executor::{Analysis, Executor};
pub use finite_diff::VelocityEstimator;
pub use interpolate::FrameInterpolator;
pub use merge::{merge_segment, ConsistencyWarning, MergeOptions, MergeReport, SegmentMerger};
pub use pdos::{PdosOutput, PdosPlan, Smearing};
pub use reconcile::{AtomMatcher, NearestImageMatcher};
pub use report::{derived_series, DerivedSeries, HarmonicSummary, Quantity, ThermoSummary, TimeUnit};
pub use spectral::SpectralBackend;
pub use thermo::{HarmonicModel, ThermoFunctions, ThermoPlan, ThermoSweep};
pub use vacf::{SpeciesSeries, VacfOutput, VacfPlan};

#[cfg(test)]
mod tests;
