//! Termination signal handling.
//!
//! The core only exposes [`Dispatcher::on_terminate`]; this module gives
//! the hosting process the plumbing to drive it. Chaining to handlers the
//! host had installed before is the host's responsibility.
//!
//! [`Dispatcher::on_terminate`]: crate::application::Dispatcher::on_terminate

use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::warn;

/// Listens for SIGINT and SIGTERM.
pub struct TerminationSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl TerminationSignals {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for either signal and return the conventional `128 + signal`
    /// exit code.
    pub async fn recv(&mut self) -> i32 {
        let kind = tokio::select! {
            _ = self.interrupt.recv() => SignalKind::interrupt(),
            _ = self.terminate.recv() => SignalKind::terminate(),
        };
        warn!(signal = kind.as_raw_value(), "termination signal received");
        128 + kind.as_raw_value()
    }
}
