//! Running averages over frame windows.

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around `mean`.
pub fn deviation(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    var.sqrt()
}

/// Mean and deviation in one call.
pub fn mean_deviation(values: &[f64]) -> (f64, f64) {
    let m = mean(values);
    (m, deviation(values, m))
}

/// Relative difference `|a - b| / |reference|`, `None` when the reference is zero.
pub fn relative_difference(a: f64, b: f64, reference: f64) -> Option<f64> {
    if reference == 0.0 || !reference.is_finite() {
        return None;
    }
    Some((a - b).abs() / reference.abs())
}
