//! Planar motion bearings for callers that need to fill `theta` before
//! running the pipeline. The pipeline itself never calls into this module.

use crate::math::angle::wrap_degrees;

/// Bearing of the displacement `(x0, y0) -> (x1, y1)` in degrees,
/// counter-clockwise from east, in `[0, 360)`.
pub fn theta(x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    wrap_degrees((y1 - y0).atan2(x1 - x0).to_degrees())
}

/// Bearings along one track. The last point repeats the previous bearing.
pub fn theta_track(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len().min(y.len());
    let mut bearings: Vec<f64> = (1..n)
        .map(|i| theta(x[i - 1], x[i], y[i - 1], y[i]))
        .collect();
    match bearings.last().copied() {
        Some(last) => bearings.push(last),
        None if n == 1 => bearings.push(0.0),
        None => {}
    }
    bearings
}

/// Bearings for several tracks stored back to back; consecutive rows with the
/// same id form one track.
pub fn theta_multitrack<K: PartialEq>(track_ids: &[K], x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = track_ids.len().min(x.len()).min(y.len());
    let mut bearings = Vec::with_capacity(n);
    let mut start = 0;
    while start < n {
        let end = (start..n)
            .find(|&i| track_ids[i] != track_ids[start])
            .unwrap_or(n);
        bearings.extend(theta_track(&x[start..end], &y[start..end]));
        start = end;
    }
    bearings
}
