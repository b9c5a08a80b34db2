/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Rounds to `places` decimals, sending exact ties to the even neighbour.
///
/// The tie test runs on the exact binary value: `60.035_f64` lies just below
/// 60.035 and rounds to 60.03 even though `60.035 * 100.0` is exactly 6003.5.
pub fn round_half_even(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    let scaled = value * scale;
    // exact product is scaled + error
    let error = value.mul_add(scale, -scaled);

    let floor = scaled.floor();
    let above_half = scaled - (floor + 0.5);
    let rounded = if above_half > 0.0 {
        floor + 1.0
    } else if above_half < 0.0 {
        floor
    } else if error > 0.0 {
        floor + 1.0
    } else if error < 0.0 {
        floor
    } else {
        scaled.round_ties_even()
    };

    rounded / scale
}
