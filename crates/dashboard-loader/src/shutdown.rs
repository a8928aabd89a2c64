//! Shutdown signal plumbing.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::Result;

/// Builds the stop notifier and the receiver `main` blocks on.
///
/// Repeated notifications collapse into one pending stop.
pub fn stop_channel() -> (StopNotifier, Receiver<()>) {
    let (tx, rx) = bounded(1);
    (StopNotifier { tx }, rx)
}

#[derive(Clone)]
pub struct StopNotifier {
    tx: Sender<()>,
}

impl StopNotifier {
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Routes SIGINT/SIGTERM to the returned receiver.
///
/// Call this before starting any worker so an early signal still reaches
/// the graceful shutdown path.
pub fn install_stop_handler() -> Result<Receiver<()>> {
    let (notifier, rx) = stop_channel();
    ctrlc::set_handler(move || notifier.notify())?;
    Ok(rx)
}
