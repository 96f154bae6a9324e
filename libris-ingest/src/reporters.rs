//! Progress reporters
//!
//! Anything implementing [`ProgressReporter`] can observe an ingestion run, closures included.
use libris_core::ProgressReporter;
use tokio::sync::mpsc;

/// Forwards every message as an `info` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, message: &str) {
        tracing::info!(target: "libris::progress", "{}", message.trim());
    }
}

/// Prints every message on stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn report(&self, message: &str) {
        println!("{message}");
    }
}

/// Sends every message over an unbounded channel, e.g. to a log pane living on another task.
///
/// Messages sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelReporter {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }

    /// Creates a reporter together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, message: &str) {
        if self.sender.send(message.to_string()).is_err() {
            tracing::trace!("Progress receiver dropped");
        }
    }
}

/// Reports to several reporters in order
#[derive(Default)]
pub struct FanOutReporter {
    reporters: Vec<Box<dyn ProgressReporter>>,
}

impl FanOutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }
}

impl std::fmt::Debug for FanOutReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutReporter")
            .field("reporters", &self.reporters.len())
            .finish()
    }
}

impl ProgressReporter for FanOutReporter {
    fn report(&self, message: &str) {
        for reporter in &self.reporters {
            reporter.report(message);
        }
    }
}
