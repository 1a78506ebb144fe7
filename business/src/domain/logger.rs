/// Logging port injected into use cases and the identification pipeline.
///
/// Implementations must be cheap to call from background attempt tasks.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn debug(&self, message: &str);
}
