use ndarray::{Array1, ArrayView1, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

use crate::grid::polar::PolarAxes;
use crate::math::stats::StatsHelper;
use crate::prelude::{
    CpsConfig, CpsError, CpsResult, Diagnostic, DiagnosticColumn, DiagnosticStage, StageInput,
    StageOutput,
};
use crate::processing::hemisphere::{broadcast_directions, HemisphereSplit};
use crate::telemetry::log::LogManager;

/// -1 in the southern hemisphere, +1 otherwise, NaN for a non-finite latitude.
pub fn hemisphere_sign(lat: f64) -> f64 {
    if !lat.is_finite() {
        f64::NAN
    } else if lat < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Thermal asymmetry B for one point.
///
/// `lower` and `upper` are `(radius, azimuth)` heights at the lower and upper
/// reference levels (900 and 600 hPa by convention).
pub fn b_parameter(
    theta: f64,
    lower: ArrayView2<f64>,
    upper: ArrayView2<f64>,
    axes: &PolarAxes,
    southern: bool,
) -> CpsResult<f64> {
    let lat = if southern { -1.0 } else { 1.0 };
    let values = b_parameter_batch(
        &[theta],
        lower.insert_axis(Axis(2)),
        upper.insert_axis(Axis(2)),
        axes,
        &[lat],
    )?;
    Ok(values[0])
}

/// B for every snapshot of `(radius, azimuth, snapshot)` fields.
///
/// `thetas` holds one direction per snapshot or a single shared one. Points
/// with a non-finite direction, or whose split leaves a half without
/// samples, come back as NaN.
pub fn b_parameter_batch(
    thetas: &[f64],
    lower: ArrayView3<f64>,
    upper: ArrayView3<f64>,
    axes: &PolarAxes,
    lats: &[f64],
) -> CpsResult<Array1<f64>> {
    if lower.shape() != upper.shape() {
        return Err(CpsError::InputShape(format!(
            "reference levels differ in shape: {:?} vs {:?}",
            lower.shape(),
            upper.shape()
        )));
    }
    let (radii, azimuths, snapshots) = lower.dim();
    if radii != axes.radius_count() || azimuths != axes.azimuth_count() {
        return Err(CpsError::InputShape(format!(
            "field is {} x {}, grid is {} radii x {} azimuths",
            radii,
            azimuths,
            axes.radius_count(),
            axes.azimuth_count()
        )));
    }
    if lats.len() != snapshots {
        return Err(CpsError::InputShape(format!(
            "{} latitudes for {} snapshots",
            lats.len(),
            snapshots
        )));
    }

    let thetas = broadcast_directions(thetas, snapshots)?;
    let masks = HemisphereSplit::new(axes.azimuths()).masks(&thetas);
    let weights = axes.area_weights();
    let thickness = &upper - &lower;

    let values: Vec<f64> = (0..snapshots)
        .into_par_iter()
        .map(|snapshot| {
            if !thetas[snapshot].is_finite() {
                return f64::NAN;
            }
            let field = thickness.index_axis(Axis(2), snapshot);
            let right = half_mean(field, masks.right.column(snapshot), weights.view());
            let left = half_mean(field, masks.left.column(snapshot), weights.view());
            hemisphere_sign(lats[snapshot]) * (right - left)
        })
        .collect();
    Ok(Array1::from(values))
}

fn half_mean(field: ArrayView2<f64>, selected: ArrayView1<bool>, weights: ArrayView1<f64>) -> f64 {
    StatsHelper::weighted_mean(field.indexed_iter().filter_map(|((r, az), &value)| {
        if selected[az] {
            Some((value, weights[r]))
        } else {
            None
        }
    }))
}

/// Stage computing B at the levels nearest the configured references.
pub struct AsymmetryStage {
    lower_pa: f64,
    upper_pa: f64,
    logger: LogManager,
}

impl AsymmetryStage {
    pub fn new(config: &CpsConfig, logger: LogManager) -> Self {
        let [lower_pa, upper_pa] = config.b_levels_pa;
        Self {
            lower_pa,
            upper_pa,
            logger,
        }
    }
}

impl DiagnosticStage for AsymmetryStage {
    fn name(&self) -> &'static str {
        "asymmetry"
    }

    fn execute(&self, input: &StageInput<'_>) -> CpsResult<StageOutput> {
        let stack = input.stack;
        let thetas = input.tracks.directions()?;
        let lats = input.tracks.latitudes();

        let mut notes = Vec::new();
        let mut resolve = |target: f64| {
            let (index, level) = stack.nearest_level(target);
            let note = format!("Level {} is taken for {}hPa", level, target / 100.0);
            self.logger.record(&note);
            notes.push(note);
            index
        };
        let lower = resolve(self.lower_pa);
        let upper = resolve(self.upper_pa);

        let values = b_parameter_batch(
            &thetas,
            stack.level_field(lower),
            stack.level_field(upper),
            stack.axes(),
            &lats,
        )?;

        Ok(StageOutput {
            columns: vec![DiagnosticColumn {
                kind: Diagnostic::B,
                values,
            }],
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1, Array2, Array3};

    fn axes() -> PolarAxes {
        PolarAxes::new(Array1::linspace(1.0, 5.0, 5), Array1::range(0.0, 360.0, 10.0)).unwrap()
    }

    /// 100 where the azimuth is within 90 degrees of east, 0 elsewhere.
    fn eastern_bump(axes: &PolarAxes) -> Array2<f64> {
        let az = axes.azimuths();
        Array2::from_shape_fn((axes.radius_count(), axes.azimuth_count()), |(_, j)| {
            if az[j] < 90.0 || az[j] > 270.0 {
                100.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn east_west_contrast_gives_plus_minus_hundred() {
        let axes = axes();
        let upper = eastern_bump(&axes);
        let lower = Array2::zeros(upper.dim());
        // theta 0: right is the southern semicircle, left the northern one
        let north = b_parameter(0.0, lower.view(), upper.view(), &axes, false).unwrap();
        let south = b_parameter(0.0, lower.view(), upper.view(), &axes, true).unwrap();
        assert_relative_eq!(north, 0.0, epsilon = 1e-9);
        assert_relative_eq!(south, 0.0, epsilon = 1e-9);

        // moving north puts the eastern half on the right
        let north = b_parameter(90.0, lower.view(), upper.view(), &axes, false).unwrap();
        let south = b_parameter(90.0, lower.view(), upper.view(), &axes, true).unwrap();
        assert_relative_eq!(north, 100.0, epsilon = 1e-9);
        assert_relative_eq!(south, -100.0, epsilon = 1e-9);
    }

    #[test]
    fn sign_flips_with_hemisphere() {
        let axes = axes();
        let upper = Array3::from_shape_fn((5, 36, 1), |(r, j, _)| (r * j) as f64 * 0.7);
        let lower = Array3::from_shape_fn((5, 36, 1), |(r, j, _)| (r + j) as f64);
        let b_north =
            b_parameter_batch(&[123.0], lower.view(), upper.view(), &axes, &[25.0]).unwrap();
        let b_south =
            b_parameter_batch(&[123.0], lower.view(), upper.view(), &axes, &[-25.0]).unwrap();
        assert!(b_north[0].abs() > 0.0);
        assert_relative_eq!(b_north[0], -b_south[0]);
    }

    #[test]
    fn weights_favour_outer_rings() {
        let axes = PolarAxes::new(array![1.0, 3.0], array![0.0, 90.0, 180.0, 270.0]).unwrap();
        // right of north-bound motion is az 0; inner ring 10, outer ring 30
        let upper = array![[[10.0], [0.0], [0.0], [0.0]], [[30.0], [0.0], [0.0], [0.0]]];
        let lower = Array3::zeros(upper.dim());
        let b = b_parameter_batch(&[90.0], lower.view(), upper.view(), &axes, &[10.0]).unwrap();
        // weights 4 and 12
        assert_relative_eq!(b[0], (10.0 * 4.0 + 30.0 * 12.0) / 16.0);
    }

    #[test]
    fn empty_half_is_missing_for_that_point_only() {
        let axes = PolarAxes::new(array![1.0, 2.0], array![0.0, 90.0, 180.0, 270.0]).unwrap();
        let mut upper = Array3::from_elem((2, 4, 2), 5.0);
        let lower = Array3::zeros((2, 4, 2));
        // snapshot 0 loses every sample of its left half (az 90 for theta 0)
        upper[[0, 1, 0]] = f64::NAN;
        upper[[1, 1, 0]] = f64::NAN;
        let b = b_parameter_batch(&[0.0, 0.0], lower.view(), upper.view(), &axes, &[10.0, 10.0])
            .unwrap();
        assert!(b[0].is_nan());
        assert_relative_eq!(b[1], 0.0);
    }

    #[test]
    fn non_finite_direction_or_latitude_is_missing() {
        let axes = axes();
        let single = eastern_bump(&axes);
        let upper = Array3::from_shape_fn((5, 36, 4), |(r, j, _)| single[[r, j]]);
        let lower = Array3::zeros((5, 36, 4));
        let thetas = [f64::NAN, f64::INFINITY, 90.0, 90.0];
        let lats = [20.0, 20.0, f64::NAN, 20.0];
        let b = b_parameter_batch(&thetas, lower.view(), upper.view(), &axes, &lats).unwrap();
        assert!(b[0].is_nan());
        assert!(b[1].is_nan());
        assert!(b[2].is_nan());
        assert_relative_eq!(b[3], 100.0, epsilon = 1e-9);
        assert!(hemisphere_sign(f64::NEG_INFINITY).is_nan());
    }

    #[test]
    fn identical_rows_give_identical_values() {
        let axes = axes();
        let single = eastern_bump(&axes);
        let upper = Array3::from_shape_fn((5, 36, 3), |(r, j, _)| single[[r, j]]);
        let lower = Array3::from_elem((5, 36, 3), 1.0);
        let b = b_parameter_batch(&[47.0; 3], lower.view(), upper.view(), &axes, &[15.0; 3])
            .unwrap();
        assert_eq!(b[0], b[1]);
        assert_eq!(b[1], b[2]);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let axes = axes();
        let lower = Array3::zeros((5, 36, 2));
        let upper = Array3::zeros((5, 36, 2));
        assert!(b_parameter_batch(&[0.0], lower.view(), upper.view(), &axes, &[1.0]).is_err());
        assert!(
            b_parameter_batch(&[0.0; 3], lower.view(), upper.view(), &axes, &[1.0, 1.0]).is_err()
        );
    }
}
