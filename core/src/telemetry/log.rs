use log::{info, warn};

/// Progress logger; informational messages are dropped when not verbose.
#[derive(Debug, Clone, Copy)]
pub struct LogManager {
    verbose: bool,
}

impl LogManager {
    pub fn new() -> Self {
        Self { verbose: true }
    }

    pub fn with_verbosity(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn record(&self, message: &str) {
        if self.verbose {
            info!("{}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
