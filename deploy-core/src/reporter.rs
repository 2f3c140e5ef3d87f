//! Progress reporting from a delegate back to its caller.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

/// Narrow sink for human readable progress lines.
pub trait Reporter: Send + Sync {
    /// Report a new status line.
    fn update_status(&self, message: &str);
}

/// Reporter that writes every status line to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    environment: Option<String>,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every line with the environment being deployed.
    pub fn for_environment(environment: impl Into<String>) -> Self {
        Self {
            environment: Some(environment.into()),
        }
    }
}

impl Reporter for TracingReporter {
    fn update_status(&self, message: &str) {
        match &self.environment {
            Some(environment) => info!(environment = %environment, "{}", message),
            None => info!("{}", message),
        }
    }
}

/// Reporter that forwards status lines over a channel, e.g. to a progress UI.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: UnboundedSender<String>,
}

impl ChannelReporter {
    /// Create a reporter and the receiving end of its stream.
    pub fn channel() -> (Self, UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Reporter for ChannelReporter {
    fn update_status(&self, message: &str) {
        // A dropped receiver only means nobody is watching anymore
        let _ = self.sender.send(message.to_string());
    }
}
