#![forbid(unsafe_code)]

pub mod blend;
pub mod cell;
pub mod correlation;
pub mod elements;
pub mod error;
pub mod md;
pub mod stats;
pub mod store;
pub mod units;

pub use blend::{Blend, InterpolationScheme};
pub use cell::Cell;
pub use correlation::autocorrelation;
pub use error::{MdError, MdResult, ResultExt};
pub use md::{MdFrame, MdSeries, MdTrajectory, Segment};
pub use stats::{deviation, mean, mean_deviation};
pub use store::{Frame, TrajectoryStore};
