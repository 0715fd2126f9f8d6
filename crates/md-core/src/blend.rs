//! Linear blending of consecutive frames used to synthesize intermediate steps.

use crate::error::{MdError, MdResult};
use serde::{Deserialize, Serialize};

const EXACT_TOL: f64 = 1e-10;

pub trait Blend: Copy {
    /// `gamma * last + beta * first`.
    fn blend(last: Self, gamma: f64, first: Self, beta: f64) -> Self;
}

impl Blend for f64 {
    fn blend(last: Self, gamma: f64, first: Self, beta: f64) -> Self {
        gamma * last + beta * first
    }
}

impl<const N: usize> Blend for [f64; N] {
    fn blend(last: Self, gamma: f64, first: Self, beta: f64) -> Self {
        let mut out = [0.0f64; N];
        for k in 0..N {
            out[k] = gamma * last[k] + beta * first[k];
        }
        out
    }
}

impl Blend for [[f64; 3]; 3] {
    fn blend(last: Self, gamma: f64, first: Self, beta: f64) -> Self {
        let mut out = [[0.0f64; 3]; 3];
        for i in 0..3 {
            out[i] = <[f64; 3]>::blend(last[i], gamma, first[i], beta);
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpolationScheme {
    pub ninter: usize,
    pub amplitude: f64,
}

impl InterpolationScheme {
    pub fn new(ninter: usize, amplitude: f64) -> MdResult<Self> {
        if ninter < 2 {
            return Err(MdError::Invalid(format!(
                "ninter must be at least 2 (got {ninter})"
            )));
        }
        if !(amplitude > 0.0 && amplitude <= 1.0 + EXACT_TOL) {
            return Err(MdError::Invalid(format!(
                "interpolation amplitude must lie in (0, 1] (got {amplitude})"
            )));
        }
        Ok(Self { ninter, amplitude })
    }

    /// Exact endpoint interpolation: boundary frames are shared by neighbours.
    pub fn elides_duplicates(&self) -> bool {
        (self.amplitude - 1.0).abs() < EXACT_TOL
    }

    pub fn output_frames(&self, n_time: usize) -> usize {
        if n_time < 2 {
            return n_time;
        }
        let mut n = self.ninter * (n_time - 1);
        if self.elides_duplicates() {
            n -= n_time - 2;
        }
        n
    }

    pub fn check_frames(&self, n_time: usize) -> MdResult<()> {
        if n_time < 2 {
            return Err(MdError::Invalid(format!(
                "interpolation needs at least 2 frames (got {n_time})"
            )));
        }
        Ok(())
    }

    /// Interpolate a frame-major series holding `stride` values per frame.
    pub fn apply<T: Blend>(&self, series: &mut Vec<T>, stride: usize, n_time: usize) -> MdResult<()> {
        self.check_frames(n_time)?;
        if series.len() != n_time * stride {
            return Err(MdError::Mismatch(format!(
                "series holds {} values, expected {} frames x {}",
                series.len(),
                n_time,
                stride
            )));
        }
        let new_len = self.output_frames(n_time);
        if stride == 0 {
            return Ok(());
        }
        let source = std::mem::take(series);
        let mut out = vec![source[0]; new_len * stride];
        let alpha = self.amplitude / (self.ninter - 1) as f64;
        let elide = self.elides_duplicates();

        let mut current = new_len as isize - 1;
        for last in (1..n_time).rev() {
            let first = last - 1;
            let last_frame = &source[last * stride..(last + 1) * stride];
            let first_frame = &source[first * stride..(first + 1) * stride];
            for tinter in 0..self.ninter {
                let beta = tinter as f64 * alpha;
                let gamma = 1.0 - beta;
                let base = current as usize * stride;
                for k in 0..stride {
                    out[base + k] = T::blend(last_frame[k], gamma, first_frame[k], beta);
                }
                current -= 1;
            }
            if elide {
                current += 1;
            }
        }
        *series = out;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_parameters() {
        assert!(InterpolationScheme::new(1, 1.0).is_err());
        assert!(InterpolationScheme::new(3, 0.0).is_err());
        assert!(InterpolationScheme::new(3, 1.5).is_err());
        let s = InterpolationScheme::new(3, 1.0).unwrap();
        let mut single = vec![1.0];
        assert!(s.apply(&mut single, 1, 1).is_err());
        assert_eq!(single, vec![1.0]);
    }

    #[test]
    fn exact_interpolation_elides_boundaries() {
        let s = InterpolationScheme::new(3, 1.0).unwrap();
        let mut series = vec![0.0, 2.0, 6.0];
        s.apply(&mut series, 1, 3).unwrap();
        assert_eq!(series, vec![0.0, 1.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn damped_interpolation_keeps_every_frame() {
        let s = InterpolationScheme::new(2, 0.5).unwrap();
        assert_eq!(s.output_frames(3), 4);
        let mut series = vec![[0.0, 0.0], [4.0, 8.0], [8.0, 16.0]];
        s.apply(&mut series, 1, 3).unwrap();
        assert_eq!(series.len(), 4);
        // segment (0, 1): [0.5*last + 0.5*first, last]
        assert_eq!(series[0], [2.0, 4.0]);
        assert_eq!(series[1], [4.0, 8.0]);
        assert_eq!(series[2], [6.0, 12.0]);
        assert_eq!(series[3], [8.0, 16.0]);
    }
}
