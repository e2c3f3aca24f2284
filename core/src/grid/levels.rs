use std::borrow::Cow;
use std::collections::BTreeMap;

use ndarray::{Array4, ArrayView3, Axis};

use crate::grid::polar::PolarAxes;
use crate::prelude::{CpsConfig, CpsError, CpsResult};

/// Name the vertical coordinate carries once a dataset has been normalized.
pub const CANONICAL_LEVEL_LABEL: &str = "plev";

/// Labeled snapshot dataset as handed over by the extraction step.
///
/// Every variable is shaped `(level, radius, azimuth, snapshot)`.
#[derive(Debug, Clone)]
pub struct GeopotentialSnapshots {
    vertical_label: String,
    levels: Vec<f64>,
    axes: PolarAxes,
    snapshot_count: usize,
    variables: BTreeMap<String, Array4<f64>>,
}

impl GeopotentialSnapshots {
    pub fn new(
        vertical_label: impl Into<String>,
        levels: Vec<f64>,
        axes: PolarAxes,
        snapshot_count: usize,
    ) -> Self {
        Self {
            vertical_label: vertical_label.into(),
            levels,
            axes,
            snapshot_count,
            variables: BTreeMap::new(),
        }
    }

    /// Adds a variable, checking it against the dataset coordinates.
    pub fn with_variable(mut self, name: impl Into<String>, data: Array4<f64>) -> CpsResult<Self> {
        let name = name.into();
        let expected = [
            self.levels.len(),
            self.axes.radius_count(),
            self.axes.azimuth_count(),
            self.snapshot_count,
        ];
        if data.shape() != expected {
            return Err(CpsError::InputShape(format!(
                "variable '{}' has shape {:?}, expected (level, r, az, snapshot) = {:?}",
                name,
                data.shape(),
                expected
            )));
        }
        self.variables.insert(name, data);
        Ok(self)
    }

    pub fn vertical_label(&self) -> &str {
        &self.vertical_label
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn axes(&self) -> &PolarAxes {
        &self.axes
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshot_count
    }

    pub fn variable(&self, name: &str) -> Option<&Array4<f64>> {
        self.variables.get(name)
    }
}

/// Geopotential heights on pressure levels, `(level, radius, azimuth, snapshot)`.
#[derive(Debug, Clone)]
pub struct PressureLevelStack {
    levels: Vec<f64>,
    axes: PolarAxes,
    heights: Array4<f64>,
}

impl PressureLevelStack {
    pub fn new(levels: Vec<f64>, axes: PolarAxes, heights: Array4<f64>) -> CpsResult<Self> {
        if levels.is_empty() {
            return Err(CpsError::InputShape("no pressure levels".into()));
        }
        if levels.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
            return Err(CpsError::InputShape(format!(
                "pressure levels must be positive Pa values, got {:?}",
                levels
            )));
        }
        let shape = heights.shape();
        if shape[0] != levels.len()
            || shape[1] != axes.radius_count()
            || shape[2] != axes.azimuth_count()
        {
            return Err(CpsError::InputShape(format!(
                "heights shape {:?} does not match {} levels x {} radii x {} azimuths",
                shape,
                levels.len(),
                axes.radius_count(),
                axes.azimuth_count()
            )));
        }
        Ok(Self {
            levels,
            axes,
            heights,
        })
    }

    /// Renames the vertical coordinate, selects the configured variable and
    /// masks fill values.
    pub fn from_snapshots(dataset: &GeopotentialSnapshots, config: &CpsConfig) -> CpsResult<Self> {
        let label = dataset.vertical_label();
        if label != config.plev_name && label != CANONICAL_LEVEL_LABEL {
            return Err(CpsError::InputShape(format!(
                "vertical coordinate '{}' not found (dataset uses '{}')",
                config.plev_name, label
            )));
        }
        let heights = dataset.variable(&config.geopt_name).ok_or_else(|| {
            CpsError::InputShape(format!(
                "geopotential variable '{}' not in dataset",
                config.geopt_name
            ))
        })?;

        let mut stack = Self::new(dataset.levels().to_vec(), dataset.axes().clone(), heights.clone())?;
        stack.mask_fill_values(config.missing_threshold);
        Ok(stack)
    }

    /// Replaces heights with `|z| >= threshold` by NaN. Returns how many were masked.
    pub fn mask_fill_values(&mut self, threshold: f64) -> usize {
        let mut masked = 0;
        self.heights.mapv_inplace(|z| {
            if z.abs() >= threshold {
                masked += 1;
                f64::NAN
            } else {
                z
            }
        });
        masked
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn axes(&self) -> &PolarAxes {
        &self.axes
    }

    pub fn heights(&self) -> &Array4<f64> {
        &self.heights
    }

    pub fn snapshot_count(&self) -> usize {
        self.heights.len_of(Axis(3))
    }

    /// Index and value of the level closest to `target_pa`; ties keep the first.
    pub fn nearest_level(&self, target_pa: f64) -> (usize, f64) {
        let mut best = 0;
        for (idx, level) in self.levels.iter().enumerate() {
            if (level - target_pa).abs() < (self.levels[best] - target_pa).abs() {
                best = idx;
            }
        }
        (best, self.levels[best])
    }

    /// Heights at one level, `(radius, azimuth, snapshot)`.
    pub fn level_field(&self, index: usize) -> ArrayView3<'_, f64> {
        self.heights.index_axis(Axis(0), index)
    }

    /// Indices of levels within `[top_pa, bottom_pa]`, in stack order.
    pub fn band_indices(&self, bottom_pa: f64, top_pa: f64) -> Vec<usize> {
        self.levels
            .iter()
            .enumerate()
            .filter(|(_, &p)| p <= bottom_pa && p >= top_pa)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn is_descending(&self) -> bool {
        self.levels.windows(2).all(|pair| pair[0] >= pair[1])
    }

    /// Copy of the stack ordered by decreasing pressure (stable).
    pub fn sorted_descending(&self) -> Self {
        let mut order: Vec<usize> = (0..self.levels.len()).collect();
        order.sort_by(|&a, &b| self.levels[b].total_cmp(&self.levels[a]));
        Self {
            levels: order.iter().map(|&idx| self.levels[idx]).collect(),
            axes: self.axes.clone(),
            heights: self.heights.select(Axis(0), &order),
        }
    }

    /// Borrows the stack when it is already descending, sorts a copy otherwise.
    pub fn descending(&self) -> Cow<'_, Self> {
        if self.is_descending() {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(self.sorted_descending())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn axes() -> PolarAxes {
        PolarAxes::new(array![1.0, 2.0], array![0.0, 180.0]).unwrap()
    }

    fn stack_with_levels(levels: Vec<f64>) -> PressureLevelStack {
        let n = levels.len();
        let heights = Array4::from_shape_fn((n, 2, 2, 1), |(l, _, _, _)| l as f64);
        PressureLevelStack::new(levels, axes(), heights).unwrap()
    }

    #[test]
    fn nearest_level_picks_closest_pressure() {
        let stack = stack_with_levels(vec![100000.0, 85000.0, 70000.0, 50000.0]);
        assert_eq!(stack.nearest_level(900e2), (1, 85000.0));
        assert_eq!(stack.nearest_level(600e2), (2, 70000.0));
    }

    #[test]
    fn sorting_reorders_heights_with_levels() {
        let stack = stack_with_levels(vec![50000.0, 90000.0, 70000.0]);
        assert!(!stack.is_descending());
        let sorted = stack.sorted_descending();
        assert_eq!(sorted.levels(), &[90000.0, 70000.0, 50000.0]);
        assert_eq!(sorted.heights()[[0, 0, 0, 0]], 1.0);
        assert_eq!(sorted.heights()[[2, 0, 0, 0]], 0.0);
        assert!(matches!(sorted.descending(), Cow::Borrowed(_)));
    }

    #[test]
    fn band_bounds_are_inclusive() {
        let stack = stack_with_levels(vec![95000.0, 90000.0, 60000.0, 50000.0, 25000.0]);
        assert_eq!(stack.band_indices(95000.0, 60000.0), vec![0, 1, 2]);
        assert_eq!(stack.band_indices(60000.0, 25000.0), vec![2, 3, 4]);
    }

    #[test]
    fn fill_values_become_nan() {
        let mut stack = stack_with_levels(vec![90000.0]);
        stack.heights[[0, 1, 1, 0]] = 1e20;
        stack.heights[[0, 0, 1, 0]] = -1e10;
        assert_eq!(stack.mask_fill_values(1e10), 2);
        assert!(stack.heights()[[0, 1, 1, 0]].is_nan());
        assert!(stack.heights()[[0, 0, 1, 0]].is_nan());
    }

    #[test]
    fn normalization_checks_label_and_variable() {
        let data = Array4::zeros((1, 2, 2, 3));
        let dataset = GeopotentialSnapshots::new("lev", vec![90000.0], axes(), 3)
            .with_variable("snap_zg", data)
            .unwrap();
        let config = CpsConfig::default();
        assert!(PressureLevelStack::from_snapshots(&dataset, &config).is_err());

        let config = CpsConfig {
            plev_name: "lev".into(),
            ..Default::default()
        };
        let stack = PressureLevelStack::from_snapshots(&dataset, &config).unwrap();
        assert_eq!(stack.snapshot_count(), 3);

        let config = CpsConfig {
            plev_name: "lev".into(),
            geopt_name: "zg".into(),
            ..Default::default()
        };
        assert!(matches!(
            PressureLevelStack::from_snapshots(&dataset, &config),
            Err(CpsError::InputShape(_))
        ));
    }

    #[test]
    fn variable_shape_is_checked() {
        let result = GeopotentialSnapshots::new("level", vec![90000.0], axes(), 3)
            .with_variable("snap_zg", Array4::zeros((1, 2, 2, 2)));
        assert!(matches!(result, Err(CpsError::InputShape(_))));
    }
}
