use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prelude::{CpsError, CpsResult, Diagnostic};

/// One track point, aligned by position with one snapshot.
///
/// Columns the pipeline does not know about are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    /// Motion direction in degrees, counter-clockwise from east.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta: Option<f64>,
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(rename = "VTL", default, skip_serializing_if = "Option::is_none")]
    pub vtl: Option<f64>,
    #[serde(rename = "VTU", default, skip_serializing_if = "Option::is_none")]
    pub vtu: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TrackPoint {
    pub fn new(lat: f64) -> Self {
        Self {
            lat,
            time: None,
            year: None,
            month: None,
            day: None,
            hour: None,
            theta: None,
            b: None,
            vtl: None,
            vtu: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = Some(theta);
        self
    }

    pub fn with_time(mut self, time: NaiveDateTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_time_components(mut self, year: i32, month: u32, day: u32, hour: u32) -> Self {
        self.year = Some(year);
        self.month = Some(month);
        self.day = Some(day);
        self.hour = Some(hour);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn diagnostic(&self, kind: Diagnostic) -> Option<f64> {
        match kind {
            Diagnostic::B => self.b,
            Diagnostic::Vtl => self.vtl,
            Diagnostic::Vtu => self.vtu,
        }
    }

    fn set_diagnostic(&mut self, kind: Diagnostic, value: f64) {
        let value = if value.is_nan() { None } else { Some(value) };
        match kind {
            Diagnostic::B => self.b = value,
            Diagnostic::Vtl => self.vtl = value,
            Diagnostic::Vtu => self.vtu = value,
        }
    }
}

/// Ordered track rows; row `i` belongs to snapshot `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackTable {
    rows: Vec<TrackPoint>,
}

impl TrackTable {
    pub fn new(rows: Vec<TrackPoint>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TrackPoint] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [TrackPoint] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<TrackPoint> {
        self.rows
    }

    pub fn latitudes(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.lat).collect()
    }

    /// Motion direction of every row; fails on the first row without one.
    pub fn directions(&self) -> CpsResult<Vec<f64>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row, point)| point.theta.ok_or(CpsError::MissingDirection { row }))
            .collect()
    }

    pub fn column(&self, kind: Diagnostic) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row.diagnostic(kind)).collect()
    }

    /// Writes a diagnostic column, overwriting previous values. NaN becomes `None`.
    pub fn assign(&mut self, kind: Diagnostic, values: ArrayView1<f64>) -> CpsResult<()> {
        if values.len() != self.rows.len() {
            return Err(CpsError::InputShape(format!(
                "column {} has {} values for {} rows",
                kind.column_name(),
                values.len(),
                self.rows.len()
            )));
        }
        for (row, &value) in self.rows.iter_mut().zip(values.iter()) {
            row.set_diagnostic(kind, value);
        }
        Ok(())
    }

    pub fn to_json(&self) -> CpsResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
