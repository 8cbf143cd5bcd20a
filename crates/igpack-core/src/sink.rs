/// Single-method diagnostic sink handed to the resolver by its caller.
///
/// Fire-and-forget delivery; no contract beyond that. Callers embedding
/// igpack in a host with its own logging pass their own implementation.
pub trait LogSink: Send + Sync {
    fn log_message(&self, msg: &str);
}

/// Default sink: forwards messages into the `tracing` pipeline at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log_message(&self, msg: &str) {
        tracing::info!("{msg}");
    }
}
