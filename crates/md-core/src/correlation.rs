use rayon::prelude::*;

use crate::error::{MdError, MdResult};

/// Autocorrelation of `n_channels` interleaved series.
///
/// `series` is laid out frame-major (`series[t * n_channels + c]`). The output
/// uses the same layout with the lag in place of the frame:
/// `out[lag * n_channels + c] = sum_t x_c(t) x_c(t + lag) / (n - lag)`.
/// At most `max_lag` lags are produced (all of them when `None`).
pub fn autocorrelation(
    series: &[f64],
    n_channels: usize,
    max_lag: Option<usize>,
) -> MdResult<Vec<f64>> {
    if n_channels == 0 {
        return Err(MdError::Invalid("autocorrelation needs at least one channel".into()));
    }
    if series.is_empty() {
        return Err(MdError::Invalid("autocorrelation over an empty window".into()));
    }
    if series.len() % n_channels != 0 {
        return Err(MdError::Mismatch(format!(
            "series length {} is not a multiple of {} channels",
            series.len(),
            n_channels
        )));
    }
    let n_time = series.len() / n_channels;
    let n_lags = match max_lag {
        Some(0) => {
            return Err(MdError::Invalid("max_lag must be at least 1".into()));
        }
        Some(lag) => lag.min(n_time),
        None => n_time,
    };

    let mut out = vec![0.0f64; n_lags * n_channels];
    out.par_chunks_mut(n_channels)
        .enumerate()
        .for_each(|(lag, row)| {
            let count = (n_time - lag) as f64;
            for t in 0..n_time - lag {
                let a = &series[t * n_channels..(t + 1) * n_channels];
                let b = &series[(t + lag) * n_channels..(t + lag + 1) * n_channels];
                for c in 0..n_channels {
                    row[c] += a[c] * b[c];
                }
            }
            for v in row.iter_mut() {
                *v /= count;
            }
        });
    Ok(out)
}
