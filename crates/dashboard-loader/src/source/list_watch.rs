//! Background loop that turns periodic and change-triggered listings into events.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::error::SourceError;
use crate::event::ResourceEvent;

use super::{EventSource, ResourceCache, ResourceFilter, ResourceLister, SyncReason};

/// Full resync period used unless configured otherwise.
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_secs(30);

const WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Sync(SyncReason),
    Stop,
}

/// Lists resources on a timer, and on filesystem changes when watching a path.
pub struct ListWatchSource<L: ResourceLister> {
    lister: L,
    filter: ResourceFilter,
    resync_interval: Duration,
    watch_path: Option<PathBuf>,
    cache: ResourceCache,
}

impl<L: ResourceLister> ListWatchSource<L> {
    pub fn new(lister: L, filter: ResourceFilter) -> Self {
        Self {
            lister,
            filter,
            resync_interval: DEFAULT_RESYNC_INTERVAL,
            watch_path: None,
            cache: ResourceCache::new(),
        }
    }

    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    /// Also sync shortly after anything below `path` changes.
    pub fn watching(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch_path = Some(path.into());
        self
    }

    /// Lists once, applies the filter and sends the resulting events.
    ///
    /// Returns the number of events sent.
    pub fn sync_once(
        &mut self,
        reason: SyncReason,
        events: &Sender<ResourceEvent>,
    ) -> Result<usize, SourceError> {
        let listing: Vec<_> = self
            .lister
            .list()?
            .into_iter()
            .filter(|r| self.filter.matches(r))
            .collect();

        let batch = self.cache.apply(listing, reason);
        let count = batch.len();
        for event in batch {
            events.send(event).map_err(|_| SourceError::ChannelClosed)?;
        }
        Ok(count)
    }

    async fn run(
        mut self,
        events: Sender<ResourceEvent>,
        mut signals: mpsc::UnboundedReceiver<Signal>,
    ) {
        let mut ticker = tokio::time::interval(self.resync_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // The first tick completes immediately and performs the initial listing.
            let reason = tokio::select! {
                _ = ticker.tick() => SyncReason::Resync,
                signal = signals.recv() => match signal {
                    Some(Signal::Sync(reason)) => reason,
                    Some(Signal::Stop) | None => break,
                },
            };

            match self.sync_once(reason, &events) {
                Ok(0) => log::trace!("{:?} sync: no changes", reason),
                Ok(count) => log::debug!("{:?} sync: {} event(s)", reason, count),
                Err(SourceError::ChannelClosed) => {
                    log::info!("Event channel closed, stopping source");
                    break;
                }
                Err(e) => log::error!("Listing resources failed: {}", e),
            }
        }
    }
}

impl<L: ResourceLister> EventSource for ListWatchSource<L> {
    fn start(self, events: Sender<ResourceEvent>) -> Result<SourceHandle, SourceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SourceError::Runtime)?;

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let watcher = match &self.watch_path {
            Some(path) => Some(watch_for_changes(path, signal_tx.clone())?),
            None => None,
        };

        let thread = std::thread::Builder::new()
            .name("event-source".to_string())
            .spawn(move || runtime.block_on(self.run(events, signal_rx)))
            .map_err(SourceError::Runtime)?;

        Ok(SourceHandle {
            signals: signal_tx,
            thread: Some(thread),
            _watcher: watcher,
        })
    }
}

fn watch_for_changes(
    path: &Path,
    signals: mpsc::UnboundedSender<Signal>,
) -> Result<Debouncer<RecommendedWatcher>, SourceError> {
    let mut debouncer = new_debouncer(WATCH_DEBOUNCE, move |result: DebounceEventResult| {
        match result {
            Ok(events) if !events.is_empty() => {
                let _ = signals.send(Signal::Sync(SyncReason::Change));
            }
            Ok(_) => {}
            Err(e) => log::warn!("Watch error: {:?}", e),
        }
    })
    .map_err(|e| SourceError::Watch(e.to_string()))?;

    debouncer
        .watcher()
        .watch(path, RecursiveMode::Recursive)
        .map_err(|e| SourceError::Watch(e.to_string()))?;

    log::info!("Watching {} for changes", path.display());
    Ok(debouncer)
}

/// Controls a running source. Dropping the handle stops the source.
pub struct SourceHandle {
    signals: mpsc::UnboundedSender<Signal>,
    thread: Option<JoinHandle<()>>,
    _watcher: Option<Debouncer<RecommendedWatcher>>,
}

impl SourceHandle {
    /// Requests an immediate full resync.
    pub fn trigger_resync(&self) {
        let _ = self.signals.send(Signal::Sync(SyncReason::Resync));
    }

    /// Returns true once the source thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Stops the source and waits for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.signals.send(Signal::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Event source thread panicked");
            }
        }
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
