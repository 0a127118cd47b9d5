//! Ctrl+C handling for polling loops.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use tracing::info;

/// Stop request delivered over a channel, so waiting on it doubles as the
/// poll interval sleep.
pub struct StopSignal {
    rx: Receiver<()>,
}

impl StopSignal {
    fn channel() -> (SyncSender<()>, Self) {
        let (tx, rx) = mpsc::sync_channel(1);
        (tx, Self { rx })
    }

    /// Route Ctrl+C into a new signal. Only one handler can be installed per
    /// process.
    pub fn ctrlc() -> anyhow::Result<Self> {
        let (tx, signal) = Self::channel();
        ctrlc::set_handler(move || {
            info!("Received Ctrl+C, stopping...");
            // A full buffer already holds a pending stop
            let _ = tx.try_send(());
        })?;
        Ok(signal)
    }

    /// Sleep for `interval` unless a stop arrives first.
    ///
    /// Returns `true` when the loop should stop.
    pub fn wait(&self, interval: Duration) -> bool {
        match self.rx.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}
