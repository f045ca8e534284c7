//! Feature normalisation helpers.

/// Min-max normalisation of a single value within [min_val, max_val].
/// A degenerate range maps every value to 0.0.
pub fn minmax_normalise(value: f64, min_val: f64, max_val: f64) -> f64 {
    if (max_val - min_val).abs() < 1e-12 {
        return 0.0;
    }
    (value - min_val) / (max_val - min_val)
}

/// Scale a whole column into [0, 1] using its own min and max.
pub fn minmax_scale_column(values: &mut [f64]) {
    if values.is_empty() {
        return;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    for v in values.iter_mut() {
        *v = minmax_normalise(*v, min, max);
    }
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
