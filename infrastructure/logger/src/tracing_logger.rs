use business::domain::logger::Logger;
use tracing::{debug, error, info, warn};

/// Forwards domain log lines to `tracing` under a single target so they can
/// be filtered with `RUST_LOG=identification=debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        info!(target: "identification", "{}", message);
    }
    fn warn(&self, message: &str) {
        warn!(target: "identification", "{}", message);
    }
    fn error(&self, message: &str) {
        error!(target: "identification", "{}", message);
    }
    fn debug(&self, message: &str) {
        debug!(target: "identification", "{}", message);
    }
}
