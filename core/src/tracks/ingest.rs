//! Single entry point turning caller-side track data into a [`TrackTable`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::prelude::{CpsError, CpsResult, TimeFields};
use crate::tracks::record::{TrackPoint, TrackTable};

/// Column-oriented track data, one equal-length vector per column.
#[derive(Debug, Clone, Default)]
pub struct TrackColumns {
    columns: BTreeMap<String, Vec<Value>>,
}

impl TrackColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column<V>(mut self, name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Value>,
    {
        self.columns
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    fn row_count(&self) -> CpsResult<usize> {
        let mut lengths = self.columns.iter().map(|(name, values)| (name, values.len()));
        let Some((_, expected)) = lengths.next() else {
            return Ok(0);
        };
        if let Some((name, len)) = lengths.find(|(_, len)| *len != expected) {
            return Err(CpsError::UnsupportedInput(format!(
                "column '{}' has {} values, expected {}; convert to rows or equal-length columns first",
                name, len, expected
            )));
        }
        Ok(expected)
    }

    fn into_rows(self) -> CpsResult<Vec<TrackPoint>> {
        let count = self.row_count()?;
        let mut rows: Vec<Map<String, Value>> = vec![Map::new(); count];
        for (name, values) in self.columns {
            for (row, value) in rows.iter_mut().zip(values) {
                row.insert(name.clone(), value);
            }
        }
        rows.into_iter()
            .enumerate()
            .map(|(idx, row)| parse_row(idx, Value::Object(row)))
            .collect()
    }
}

/// Track data in either supported layout.
#[derive(Debug, Clone)]
pub enum TrackInput {
    Rows(Vec<TrackPoint>),
    Columns(TrackColumns),
}

impl From<Vec<TrackPoint>> for TrackInput {
    fn from(rows: Vec<TrackPoint>) -> Self {
        TrackInput::Rows(rows)
    }
}

impl From<TrackColumns> for TrackInput {
    fn from(columns: TrackColumns) -> Self {
        TrackInput::Columns(columns)
    }
}

impl From<TrackTable> for TrackInput {
    fn from(table: TrackTable) -> Self {
        TrackInput::Rows(table.into_rows())
    }
}

impl TrackInput {
    /// Accepts an array of row objects or an object of column arrays.
    pub fn from_json(value: Value) -> CpsResult<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| match item {
                    Value::Object(_) => parse_row(idx, item),
                    other => Err(CpsError::UnsupportedInput(format!(
                        "row {} is {}, expected an object",
                        idx,
                        json_kind(&other)
                    ))),
                })
                .collect::<CpsResult<Vec<_>>>()
                .map(TrackInput::Rows),
            Value::Object(map) => {
                let mut columns = TrackColumns::new();
                for (name, values) in map {
                    match values {
                        Value::Array(values) => {
                            columns.columns.insert(name, values);
                        }
                        other => {
                            return Err(CpsError::UnsupportedInput(format!(
                                "column '{}' is {}, expected an array",
                                name,
                                json_kind(&other)
                            )))
                        }
                    }
                }
                Ok(TrackInput::Columns(columns))
            }
            other => Err(CpsError::UnsupportedInput(format!(
                "got {}; convert tracks to an array of rows or an object of columns",
                json_kind(&other)
            ))),
        }
    }
}

impl TrackTable {
    /// Normalizes either layout into rows and resolves the time column.
    pub fn ingest(input: TrackInput, time_fields: TimeFields) -> CpsResult<Self> {
        let rows = match input {
            TrackInput::Rows(rows) => rows,
            TrackInput::Columns(columns) => columns.into_rows()?,
        };
        let mut table = TrackTable::new(rows);
        for (idx, row) in table.rows_mut().iter_mut().enumerate() {
            resolve_time(idx, row, time_fields)?;
        }
        Ok(table)
    }
}

fn parse_row(idx: usize, row: Value) -> CpsResult<TrackPoint> {
    serde_json::from_value(row)
        .map_err(|err| CpsError::InputShape(format!("track row {}: {}", idx, err)))
}

fn resolve_time(idx: usize, row: &mut TrackPoint, time_fields: TimeFields) -> CpsResult<()> {
    match time_fields {
        TimeFields::Untimed => Ok(()),
        TimeFields::Timestamp => match row.time {
            Some(_) => Ok(()),
            None => Err(CpsError::InputShape(format!(
                "track row {} has no 'time' column",
                idx
            ))),
        },
        TimeFields::Components => {
            if row.time.is_some() {
                return Ok(());
            }
            let (Some(year), Some(month), Some(day), Some(hour)) =
                (row.year, row.month, row.day, row.hour)
            else {
                return Err(CpsError::InputShape(format!(
                    "track row {} needs 'year', 'month', 'day' and 'hour' to derive 'time'",
                    idx
                )));
            };
            let time = NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|date| date.and_hms_opt(hour, 0, 0))
                .ok_or_else(|| {
                    CpsError::InputShape(format!(
                        "track row {}: {}-{}-{} {}h is not a valid time",
                        idx, year, month, day, hour
                    ))
                })?;
            row.time = Some(time);
            Ok(())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_and_columns_ingest_identically() {
        let rows = json!([
            {"lat": 12.0, "theta": 90.0, "time": "2000-09-01T06:00:00", "track_id": 1},
            {"lat": 13.5, "theta": 80.0, "time": "2000-09-01T12:00:00", "track_id": 1},
        ]);
        let columns = json!({
            "lat": [12.0, 13.5],
            "theta": [90.0, 80.0],
            "time": ["2000-09-01T06:00:00", "2000-09-01T12:00:00"],
            "track_id": [1, 1],
        });
        let from_rows =
            TrackTable::ingest(TrackInput::from_json(rows).unwrap(), TimeFields::Timestamp).unwrap();
        let from_columns =
            TrackTable::ingest(TrackInput::from_json(columns).unwrap(), TimeFields::Timestamp)
                .unwrap();
        assert_eq!(from_rows, from_columns);
        assert_eq!(from_rows.rows()[1].extra["track_id"], 1);
    }

    #[test]
    fn time_is_derived_from_components() {
        let columns = TrackColumns::new()
            .with_column("lat", [10.0, 11.0])
            .with_column("year", [1999, 1999])
            .with_column("month", [12, 12])
            .with_column("day", [31, 31])
            .with_column("hour", [0, 18]);
        let table = TrackTable::ingest(columns.into(), TimeFields::Components).unwrap();
        let expected = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(table.rows()[1].time, Some(expected));
    }

    #[test]
    fn missing_time_fields_are_fatal() {
        let rows = vec![TrackPoint::new(10.0).with_time_components(2001, 2, 30, 0)];
        assert!(matches!(
            TrackTable::ingest(rows.into(), TimeFields::Components),
            Err(CpsError::InputShape(_))
        ));

        let rows = vec![TrackPoint::new(10.0)];
        assert!(TrackTable::ingest(rows.clone().into(), TimeFields::Timestamp).is_err());
        assert!(TrackTable::ingest(rows.into(), TimeFields::Untimed).is_ok());
    }

    #[test]
    fn missing_latitude_is_an_input_shape_error() {
        let rows = json!([{"theta": 10.0}]);
        let err = TrackInput::from_json(rows).unwrap_err();
        assert!(matches!(err, CpsError::InputShape(ref msg) if msg.contains("lat")));
    }

    #[test]
    fn unconvertible_inputs_are_rejected() {
        assert!(matches!(
            TrackInput::from_json(json!(42)),
            Err(CpsError::UnsupportedInput(_))
        ));
        assert!(matches!(
            TrackInput::from_json(json!({"lat": 3.0})),
            Err(CpsError::UnsupportedInput(_))
        ));
        let ragged = TrackColumns::new()
            .with_column("lat", [1.0, 2.0])
            .with_column("theta", [0.0]);
        assert!(matches!(
            TrackTable::ingest(ragged.into(), TimeFields::Untimed),
            Err(CpsError::UnsupportedInput(_))
        ));
    }
}
