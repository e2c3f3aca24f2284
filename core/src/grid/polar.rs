use ndarray::{Array1, ArrayView1};

use crate::prelude::{CpsError, CpsResult};

/// Radius and azimuth coordinates shared by every snapshot of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarAxes {
    radii: Array1<f64>,
    azimuths: Array1<f64>,
}

impl PolarAxes {
    pub fn new(radii: Array1<f64>, azimuths: Array1<f64>) -> CpsResult<Self> {
        if radii.is_empty() || azimuths.is_empty() {
            return Err(CpsError::InputShape(format!(
                "polar grid needs at least one radius and one azimuth, got {} x {}",
                radii.len(),
                azimuths.len()
            )));
        }
        if radii.iter().chain(azimuths.iter()).any(|v| !v.is_finite()) {
            return Err(CpsError::InputShape(
                "polar coordinates must be finite".into(),
            ));
        }
        if radii.windows(2).into_iter().any(|pair| pair[1] <= pair[0]) {
            return Err(CpsError::InputShape(
                "radii must be strictly increasing".into(),
            ));
        }
        Ok(Self { radii, azimuths })
    }

    pub fn radii(&self) -> ArrayView1<'_, f64> {
        self.radii.view()
    }

    pub fn azimuths(&self) -> ArrayView1<'_, f64> {
        self.azimuths.view()
    }

    pub fn radius_count(&self) -> usize {
        self.radii.len()
    }

    pub fn azimuth_count(&self) -> usize {
        self.azimuths.len()
    }

    pub fn area_weights(&self) -> Array1<f64> {
        area_weights(self.radii.view())
    }
}

/// Annulus area weight for each radius ring.
///
/// The half-width is taken from the first gap and applied to every ring, so
/// the weights are exact only on uniformly spaced radii. A lone ring gets a
/// unit weight.
pub fn area_weights(radii: ArrayView1<f64>) -> Array1<f64> {
    if radii.len() < 2 {
        return Array1::ones(radii.len());
    }
    let half_width = (radii[1] - radii[0]) / 2.0;
    radii.mapv(|r| (r + half_width).powi(2) - (r - half_width).powi(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn weights_follow_annulus_area() {
        let weights = area_weights(array![1.0, 3.0, 5.0].view());
        // (r + 1)^2 - (r - 1)^2 = 4r
        assert_relative_eq!(weights[0], 4.0);
        assert_relative_eq!(weights[1], 12.0);
        assert_relative_eq!(weights[2], 20.0);
    }

    #[test]
    fn weights_increase_on_uniform_radii() {
        let radii = Array1::linspace(0.5, 9.5, 10);
        let weights = area_weights(radii.view());
        assert!(weights.windows(2).into_iter().all(|w| w[1] > w[0]));
    }

    #[test]
    fn non_uniform_radii_stay_finite() {
        let weights = area_weights(array![0.5, 1.0, 3.0, 7.5].view());
        assert_eq!(weights.len(), 4);
        assert!(weights.iter().all(|w| w.is_finite() && *w > 0.0));
    }

    #[test]
    fn single_ring_gets_unit_weight() {
        assert_eq!(area_weights(array![2.0].view()), array![1.0]);
        assert!(area_weights(Array1::<f64>::zeros(0).view()).is_empty());
    }

    #[test]
    fn axes_reject_unsorted_radii() {
        let result = PolarAxes::new(array![1.0, 1.0, 2.0], array![0.0, 90.0]);
        assert!(matches!(result, Err(CpsError::InputShape(_))));
        assert!(PolarAxes::new(array![1.0], Array1::zeros(0)).is_err());
    }
}
