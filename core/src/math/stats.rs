use ndarray::ArrayView2;

pub struct StatsHelper;

impl StatsHelper {
    /// Weighted mean of `(value, weight)` pairs, skipping NaN values.
    ///
    /// Returns NaN when no weight remains.
    pub fn weighted_mean<I>(pairs: I) -> f64
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (sum, total) = pairs
            .into_iter()
            .filter(|(value, _)| !value.is_nan())
            .fold((0.0, 0.0), |(sum, total), (value, weight)| {
                (sum + value * weight, total + weight)
            });
        if total == 0.0 {
            f64::NAN
        } else {
            sum / total
        }
    }

    /// `max - min` over a field, ignoring NaN samples. NaN if every sample is NaN.
    pub fn nan_range(field: ArrayView2<f64>) -> f64 {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &value in field.iter().filter(|v| !v.is_nan()) {
            lo = lo.min(value);
            hi = hi.max(value);
        }
        if lo > hi {
            f64::NAN
        } else {
            hi - lo
        }
    }

    /// Ordinary least-squares slope of `y` on `x` with an intercept.
    ///
    /// NaN when any input is NaN, fewer than two points are given, or `x`
    /// has no spread.
    pub fn ols_slope(x: &[f64], y: &[f64]) -> f64 {
        if x.len() != y.len() || x.len() < 2 {
            return f64::NAN;
        }
        if x.iter().chain(y).any(|v| v.is_nan()) {
            return f64::NAN;
        }
        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_y = y.iter().sum::<f64>() / n;
        let (cov, var) = x
            .iter()
            .zip(y)
            .fold((0.0, 0.0), |(cov, var), (&xi, &yi)| {
                let dx = xi - mean_x;
                (cov + dx * (yi - mean_y), var + dx * dx)
            });
        if var == 0.0 {
            f64::NAN
        } else {
            cov / var
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn weighted_mean_skips_nan_values() {
        let mean = StatsHelper::weighted_mean([(1.0, 1.0), (f64::NAN, 5.0), (3.0, 3.0)]);
        assert_relative_eq!(mean, 2.5);
    }

    #[test]
    fn weighted_mean_without_weight_is_nan() {
        assert!(StatsHelper::weighted_mean([(f64::NAN, 1.0)]).is_nan());
        assert!(StatsHelper::weighted_mean(std::iter::empty::<(f64, f64)>()).is_nan());
    }

    #[test]
    fn nan_range_ignores_missing_samples() {
        let field = array![[1.0, f64::NAN], [-2.0, 4.0]];
        assert_relative_eq!(StatsHelper::nan_range(field.view()), 6.0);
        let empty = array![[f64::NAN, f64::NAN]];
        assert!(StatsHelper::nan_range(empty.view()).is_nan());
    }

    #[test]
    fn ols_slope_recovers_line() {
        let x = [1.0, 2.0, 4.0, 7.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 - 2.5 * v).collect();
        assert_relative_eq!(StatsHelper::ols_slope(&x, &y), -2.5, epsilon = 1e-12);
    }

    #[test]
    fn ols_slope_degenerate_inputs_are_nan() {
        assert!(StatsHelper::ols_slope(&[1.0], &[2.0]).is_nan());
        assert!(StatsHelper::ols_slope(&[1.0, 1.0], &[2.0, 3.0]).is_nan());
        assert!(StatsHelper::ols_slope(&[1.0, 2.0], &[f64::NAN, 3.0]).is_nan());
    }
}
