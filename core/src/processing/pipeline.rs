use std::sync::Mutex;

use crate::grid::levels::{GeopotentialSnapshots, PressureLevelStack};
use crate::prelude::{CpsConfig, CpsError, CpsResult, DiagnosticStage, StageInput};
use crate::processing::asymmetry::AsymmetryStage;
use crate::processing::thermal_wind::ThermalWindStage;
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::MetricsRecorder;
use crate::tracks::ingest::TrackInput;
use crate::tracks::record::TrackTable;

/// Computes B, VTL and VTU for every track point of one batch.
pub struct CpsPipeline {
    config: CpsConfig,
    logger: LogManager,
    metrics: MetricsRecorder,
    notes: Mutex<Vec<String>>,
}

impl CpsPipeline {
    pub fn new(config: CpsConfig) -> CpsResult<Self> {
        config.validate()?;
        let logger = LogManager::with_verbosity(config.verbose);
        Ok(Self {
            config,
            logger,
            metrics: MetricsRecorder::new(),
            notes: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &CpsConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Stage notes of the last run, such as the levels actually used.
    pub fn notes(&self) -> Vec<String> {
        self.notes.lock().map(|notes| notes.clone()).unwrap_or_default()
    }

    /// Runs every stage and returns the track table with the diagnostic
    /// columns written. Row `i` of `tracks` must belong to snapshot `i`.
    pub fn run(
        &self,
        tracks: impl Into<TrackInput>,
        snapshots: &GeopotentialSnapshots,
    ) -> CpsResult<TrackTable> {
        let mut table = TrackTable::ingest(tracks.into(), self.config.time_fields)?;
        if table.len() != snapshots.snapshot_count() {
            return Err(CpsError::InputShape(format!(
                "{} track rows for {} snapshots",
                table.len(),
                snapshots.snapshot_count()
            )));
        }
        table.directions()?;

        let stack = PressureLevelStack::from_snapshots(snapshots, &self.config)?;
        // B is order-independent; the thermal wind needs decreasing pressure.
        let stack = stack.descending();
        self.logger.record(&format!(
            "Computing CPS parameters for {} points on {} levels",
            table.len(),
            stack.levels().len()
        ));

        let stages: [Box<dyn DiagnosticStage>; 2] = [
            Box::new(AsymmetryStage::new(&self.config, self.logger)),
            Box::new(ThermalWindStage::new(&self.config, self.logger)),
        ];
        let input = StageInput {
            stack: &stack,
            tracks: &table,
        };
        let mut outputs = Vec::with_capacity(stages.len());
        let mut notes = Vec::new();
        for stage in &stages {
            let output = stage.execute(&input)?;
            log::debug!("stage {} produced {} column(s)", stage.name(), output.columns.len());
            for note in &output.notes {
                log::debug!("{}: {}", stage.name(), note);
                notes.push(format!("{}: {}", stage.name(), note));
            }
            outputs.push(output);
        }
        if let Ok(mut last) = self.notes.lock() {
            *last = notes;
        }

        for column in outputs.into_iter().flat_map(|output| output.columns) {
            let missing = column.values.iter().filter(|v| v.is_nan()).count();
            if missing > 0 {
                self.logger.warn(&format!(
                    "{} not available for {} of {} points",
                    column.kind.column_name(),
                    missing,
                    table.len()
                ));
                self.metrics.record_missing(column.kind, missing);
            }
            table.assign(column.kind, column.values.view())?;
        }
        self.metrics.record_processed(table.len());
        Ok(table)
    }
}

/// One-shot form of [`CpsPipeline::run`].
pub fn compute_cps_parameters(
    tracks: impl Into<TrackInput>,
    snapshots: &GeopotentialSnapshots,
    config: CpsConfig,
) -> CpsResult<TrackTable> {
    CpsPipeline::new(config)?.run(tracks, snapshots)
}
