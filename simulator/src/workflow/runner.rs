use crate::generator::profile::build_scenario;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use cpscore::telemetry::Metrics;
use cpscore::{CpsPipeline, Diagnostic, TrackTable};

pub struct WorkflowResult {
    pub table: TrackTable,
    pub metrics: Metrics,
    pub mean_b: Option<f64>,
    pub mean_vtl: Option<f64>,
    pub mean_vtu: Option<f64>,
}

impl WorkflowResult {
    pub fn summary(&self) -> String {
        let show = |value: Option<f64>| match value {
            Some(v) => format!("{:.2}", v),
            None => "n/a".to_string(),
        };
        format!(
            "points={} B={} VTL={} VTU={} missing(B/VTL/VTU)={}/{}/{}",
            self.metrics.processed,
            show(self.mean_b),
            show(self.mean_vtl),
            show(self.mean_vtu),
            self.metrics.missing_b,
            self.metrics.missing_vtl,
            self.metrics.missing_vtu
        )
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let scenario = build_scenario(&self.config.scenario).context("building scenario")?;
        let pipeline =
            CpsPipeline::new(self.config.cps.clone()).context("configuring pipeline")?;
        let table = pipeline
            .run(scenario.tracks, &scenario.snapshots)
            .context("computing CPS parameters")?;

        Ok(WorkflowResult {
            mean_b: column_mean(&table, Diagnostic::B),
            mean_vtl: column_mean(&table, Diagnostic::Vtl),
            mean_vtu: column_mean(&table, Diagnostic::Vtu),
            metrics: pipeline.metrics().snapshot(),
            table,
        })
    }
}

fn column_mean(table: &TrackTable, kind: Diagnostic) -> Option<f64> {
    let values: Vec<f64> = table.column(kind).into_iter().flatten().collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::ScenarioConfig;

    #[test]
    fn runner_executes_workflow() {
        let cfg = WorkflowConfig::from_args(6, 0, false);
        let result = Runner::new(cfg).execute().unwrap();
        assert_eq!(result.table.len(), 6);
        assert_eq!(result.metrics.processed, 6);
        assert!(result.table.rows().iter().all(|row| row.time.is_some()));
        // warmest right of motion in the northern hemisphere
        assert!(result
            .table
            .rows()
            .iter()
            .all(|row| row.b.map_or(false, |b| b > 0.0)));
        assert!(result.summary().starts_with("points=6"));
    }

    #[test]
    fn southern_track_flips_asymmetry() {
        let mut cfg = WorkflowConfig::from_args(4, 0, false);
        cfg.scenario = ScenarioConfig {
            start_lat: -20.0,
            step_lat: -0.4,
            points: 4,
            ..Default::default()
        };
        let result = Runner::new(cfg).execute().unwrap();
        assert!(result.mean_b.unwrap() < 0.0);
    }

    #[test]
    fn thermal_wind_available_for_every_point() {
        let result = Runner::new(WorkflowConfig::from_args(3, 0, false))
            .execute()
            .unwrap();
        assert!(result.mean_vtl.is_some());
        assert!(result.mean_vtu.is_some());
        assert_eq!(result.metrics.missing_vtl, 0);
    }
}
