use ndarray::ArrayView1;

/// Wraps an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest angular distance between two directions, in degrees.
pub fn circular_distance(a: f64, b: f64) -> f64 {
    let d = wrap_degrees(a - b);
    d.min(360.0 - d)
}

/// Returns the azimuth sample closest to `theta` on the circle.
///
/// Ties resolve to the first sample. `None` when there are no samples.
pub fn nearest_azimuth(azimuths: ArrayView1<f64>, theta: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for &az in azimuths.iter() {
        let distance = circular_distance(az, theta);
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((az, distance)),
        }
    }
    best.map(|(az, _)| az)
}
