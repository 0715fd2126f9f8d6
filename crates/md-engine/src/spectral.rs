//! Cosine transform and Gaussian broadening of per-species series.
//!
//! The transform is a DCT-II, `Y_k = 2 sum_j x_j cos(pi (j + 1/2) k / n)`,
//! evaluated through an FFT of the even extension of the input.

use md_core::error::{MdError, MdResult};
use rayon::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpectralBackend {
    /// No Fourier transform capability; spectral operations fail.
    None,
    #[cfg(feature = "fft")]
    RustFft,
}

impl SpectralBackend {
    pub fn detect() -> Self {
        #[cfg(feature = "fft")]
        {
            SpectralBackend::RustFft
        }
        #[cfg(not(feature = "fft"))]
        {
            SpectralBackend::None
        }
    }

    pub fn from_spec(spec: &str) -> MdResult<Self> {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("auto") {
            return Ok(Self::detect());
        }
        if spec.eq_ignore_ascii_case("none") {
            return Ok(SpectralBackend::None);
        }
        if spec.eq_ignore_ascii_case("rustfft") || spec.eq_ignore_ascii_case("fft") {
            #[cfg(feature = "fft")]
            {
                return Ok(SpectralBackend::RustFft);
            }
            #[cfg(not(feature = "fft"))]
            {
                return Err(MdError::Unsupported(
                    "fft feature disabled; rebuild with --features fft".into(),
                ));
            }
        }
        Err(MdError::Unsupported(format!(
            "unknown spectral backend '{spec}'"
        )))
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, SpectralBackend::None)
    }

    /// In-place DCT-II of every series; all series must share one length.
    pub fn dct2_many(&self, series: &mut [Vec<f64>]) -> MdResult<()> {
        let n = match series.first() {
            Some(first) => first.len(),
            None => return Ok(()),
        };
        if n == 0 {
            return Err(MdError::Invalid("cosine transform of an empty series".into()));
        }
        if let Some(bad) = series.iter().position(|s| s.len() != n) {
            return Err(MdError::Mismatch(format!(
                "series {bad} has {} points, expected {n}",
                series[bad].len()
            )));
        }
        match self {
            SpectralBackend::None => Err(MdError::Unsupported(
                "a Fourier transform backend is needed to compute the PDOS".into(),
            )),
            #[cfg(feature = "fft")]
            SpectralBackend::RustFft => {
                log::debug!("dct-ii: {} series of length {n}", series.len());
                let fft = fft_backend::plan(2 * n);
                series
                    .par_iter_mut()
                    .for_each(|s| fft_backend::dct2(fft.as_ref(), s));
                Ok(())
            }
        }
    }
}

impl Default for SpectralBackend {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(feature = "fft")]
mod fft_backend {
    use std::sync::{Arc, Mutex, OnceLock};

    use rustfft::num_complex::Complex;
    use rustfft::{Fft, FftPlanner};

    static PLANNER: OnceLock<Mutex<FftPlanner<f64>>> = OnceLock::new();

    pub(super) fn planner() -> &'static Mutex<FftPlanner<f64>> {
        PLANNER.get_or_init(|| Mutex::new(FftPlanner::new()))
    }

    /// Plans are built and cached under one lock; executing them is lock-free.
    /// A poisoned lock only guards the plan cache and is recovered.
    pub(super) fn plan(len: usize) -> Arc<dyn Fft<f64>> {
        let mut guard = planner()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let fft = guard.plan_fft_forward(len);
        drop(guard);
        fft
    }

    pub(super) fn dct2(fft: &dyn Fft<f64>, x: &mut [f64]) {
        let n = x.len();
        let mut buf: Vec<Complex<f64>> = Vec::with_capacity(2 * n);
        buf.extend(x.iter().map(|&v| Complex::new(v, 0.0)));
        buf.extend(x.iter().rev().map(|&v| Complex::new(v, 0.0)));
        fft.process(&mut buf);
        let step = -std::f64::consts::PI / (2.0 * n as f64);
        for (k, out) in x.iter_mut().enumerate() {
            let twiddle = Complex::from_polar(1.0, step * k as f64);
            *out = (buf[k] * twiddle).re;
        }
    }
}

/// Gaussian broadening on the normalized axis `i / n`.
///
/// Every sample becomes a Gaussian of standard deviation `sigma` centred on its
/// bin and is accumulated on every output bin.
pub fn smear(series: &mut [Vec<f64>], sigma: f64) -> MdResult<()> {
    if sigma < 0.0 || !sigma.is_finite() {
        return Err(MdError::Invalid(format!(
            "tsmear must be positive (got {sigma})"
        )));
    }
    if sigma == 0.0 {
        return Ok(());
    }
    let renorm = 1.0 / (sigma * (2.0 * std::f64::consts::PI).sqrt());
    let inv_2sigma2 = 1.0 / (2.0 * sigma * sigma);
    series.par_iter_mut().for_each(|fit| {
        let n = fit.len();
        let inv_n = 1.0 / n as f64;
        let raw = std::mem::replace(fit, vec![0.0; n]);
        for (i, &value) in raw.iter().enumerate() {
            let mean = i as f64 * inv_n;
            let amp = value * renorm;
            for (g, out) in fit.iter_mut().enumerate() {
                let d = g as f64 * inv_n - mean;
                *out += amp * (-d * d * inv_2sigma2).exp();
            }
        }
    });
    Ok(())
}

/// One-sided spectral density of every series, optionally smeared.
pub fn spectral_density(
    series: &[Vec<f64>],
    sigma: f64,
    backend: &SpectralBackend,
) -> MdResult<Vec<Vec<f64>>> {
    if sigma < 0.0 {
        return Err(MdError::Invalid(format!(
            "tsmear must be positive (got {sigma})"
        )));
    }
    if !backend.is_available() {
        return Err(MdError::Unsupported(
            "a Fourier transform backend is needed to compute the PDOS".into(),
        ));
    }
    let mut out = series.to_vec();
    backend.dct2_many(&mut out)?;
    smear(&mut out, sigma)?;
    Ok(out)
}
