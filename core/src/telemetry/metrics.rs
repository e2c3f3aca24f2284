use std::sync::Mutex;

use crate::prelude::Diagnostic;

/// Counts processed rows and rows left without a value, per diagnostic.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub processed: usize,
    pub missing_b: usize,
    pub missing_vtl: usize,
    pub missing_vtu: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_processed(&self, rows: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.processed += rows;
        }
    }

    pub fn record_missing(&self, kind: Diagnostic, rows: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            match kind {
                Diagnostic::B => metrics.missing_b += rows,
                Diagnostic::Vtl => metrics.missing_vtl += rows,
                Diagnostic::Vtu => metrics.missing_vtu += rows,
            }
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_across_calls() {
        let recorder = MetricsRecorder::new();
        recorder.record_processed(3);
        recorder.record_processed(2);
        recorder.record_missing(Diagnostic::Vtl, 1);
        let metrics = recorder.snapshot();
        assert_eq!(metrics.processed, 5);
        assert_eq!(metrics.missing_vtl, 1);
        assert_eq!(metrics.missing_b, 0);
    }
}
