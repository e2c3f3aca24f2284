use ndarray::{Array2, Array3, ArrayView1, ArrayView3, Axis, Zip};

use crate::math::angle::{nearest_azimuth, wrap_degrees};
use crate::prelude::{CpsError, CpsResult};

/// Which half of the polar grid an azimuth sample falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Right,
    Left,
    /// Exactly on the direction line or its opposite.
    OnLine,
}

/// Classifies `azimuth` against the direction `theta` (both in degrees).
///
/// With `d = (azimuth - theta) mod 360`, right is `d` in (180, 360) and left
/// is `d` in (0, 180).
pub fn side_of(azimuth: f64, theta: f64) -> Side {
    let offset = wrap_degrees(azimuth - theta);
    if offset > 180.0 {
        Side::Right
    } else if offset > 0.0 && offset < 180.0 {
        Side::Left
    } else {
        Side::OnLine
    }
}

/// Right/left selections, `(azimuth, snapshot)`; the radius axis is implied.
#[derive(Debug, Clone, PartialEq)]
pub struct HemisphereMasks {
    pub right: Array2<bool>,
    pub left: Array2<bool>,
}

/// Splits polar fields into the halves right and left of a direction.
pub struct HemisphereSplit<'a> {
    azimuths: ArrayView1<'a, f64>,
}

impl<'a> HemisphereSplit<'a> {
    pub fn new(azimuths: ArrayView1<'a, f64>) -> Self {
        Self { azimuths }
    }

    /// Snaps `theta` to the nearest azimuth sample.
    pub fn snap(&self, theta: f64) -> f64 {
        nearest_azimuth(self.azimuths, theta).unwrap_or_else(|| wrap_degrees(theta))
    }

    /// One mask column per direction.
    pub fn masks(&self, thetas: &[f64]) -> HemisphereMasks {
        let shape = (self.azimuths.len(), thetas.len());
        let mut right = Array2::from_elem(shape, false);
        let mut left = Array2::from_elem(shape, false);
        for (snapshot, &theta) in thetas.iter().enumerate() {
            let snapped = self.snap(theta);
            for (idx, &az) in self.azimuths.iter().enumerate() {
                match side_of(az, snapped) {
                    Side::Right => right[[idx, snapshot]] = true,
                    Side::Left => left[[idx, snapshot]] = true,
                    Side::OnLine => {}
                }
            }
        }
        HemisphereMasks { right, left }
    }

    /// Returns `(right, left)` copies of `field` (`radius, azimuth, snapshot`)
    /// with unselected samples set to NaN.
    ///
    /// A single direction applies to every snapshot.
    pub fn split(
        &self,
        field: ArrayView3<f64>,
        thetas: &[f64],
    ) -> CpsResult<(Array3<f64>, Array3<f64>)> {
        let (_, azimuths, snapshots) = field.dim();
        if azimuths != self.azimuths.len() {
            return Err(CpsError::InputShape(format!(
                "field has {} azimuths, grid has {}",
                azimuths,
                self.azimuths.len()
            )));
        }
        let thetas = broadcast_directions(thetas, snapshots)?;
        let masks = self.masks(&thetas);

        let mut right = field.to_owned();
        let mut left = field.to_owned();
        for (mut right_ring, mut left_ring) in right
            .axis_iter_mut(Axis(0))
            .zip(left.axis_iter_mut(Axis(0)))
        {
            Zip::from(&mut right_ring)
                .and(&masks.right)
                .for_each(|value, &keep| {
                    if !keep {
                        *value = f64::NAN;
                    }
                });
            Zip::from(&mut left_ring)
                .and(&masks.left)
                .for_each(|value, &keep| {
                    if !keep {
                        *value = f64::NAN;
                    }
                });
        }
        Ok((right, left))
    }
}

/// Expands a scalar direction to every snapshot, or checks a per-snapshot one.
pub(crate) fn broadcast_directions(thetas: &[f64], snapshots: usize) -> CpsResult<Vec<f64>> {
    match thetas.len() {
        1 => Ok(vec![thetas[0]; snapshots]),
        n if n == snapshots => Ok(thetas.to_vec()),
        n => Err(CpsError::InputShape(format!(
            "{} directions for {} snapshots",
            n, snapshots
        ))),
    }
}
