use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, error, info};

use crate::event::{dispatch, EventHandler, ResourceEvent};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Single worker that applies events strictly one at a time.
pub struct Dispatcher {
    worker: Option<JoinHandle<u64>>,
    shutdown: Arc<AtomicBool>,
}

impl Dispatcher {
    /// Starts the worker thread consuming `events` in FIFO order.
    pub fn start<H>(handler: H, events: Receiver<ResourceEvent>) -> Self
    where
        H: EventHandler + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);

        let worker = thread::spawn(move || run_dispatcher(handler, events, shutdown_flag));
        info!("Started event dispatcher");

        Self {
            worker: Some(worker),
            shutdown,
        }
    }

    /// Stops taking new events. The event being handled, if any, completes.
    pub fn stop(&self) {
        info!("Stopping event dispatcher...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Waits for the worker to exit and returns how many events it handled.
    pub fn wait(mut self) -> u64 {
        let Some(worker) = self.worker.take() else {
            return 0;
        };
        match worker.join() {
            Ok(handled) => {
                info!("Event dispatcher stopped after {} events", handled);
                handled
            }
            Err(e) => {
                error!("Event dispatcher panicked: {:?}", e);
                0
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

fn run_dispatcher<H: EventHandler>(
    handler: H,
    events: Receiver<ResourceEvent>,
    shutdown: Arc<AtomicBool>,
) -> u64 {
    let mut handled = 0;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Dispatcher received shutdown signal");
            break;
        }

        match events.recv_timeout(POLL_INTERVAL) {
            Ok(event) => {
                // Failures are already logged and counted by the handler.
                let _ = dispatch(&handler, &event);
                handled += 1;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Event channel disconnected");
                break;
            }
        }
    }

    handled
}
