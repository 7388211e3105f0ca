//! Polling loop driving the [`Tracker`]

use std::{future::Future, time::Duration};

use anyhow::{Context as _, Result};
use tokio::{
    select,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{
    status::{SongInfo, StatusFetcher},
    tracker::{StatusObserver, Tracker, TrackerState, Transition},
};

#[cfg(test)]
mod tests;

/// Anything that can produce the current [`SongInfo`]. Must not fail.
pub trait StatusSource {
    fn fetch(&self) -> impl Future<Output = SongInfo> + Send;
}

impl StatusSource for StatusFetcher {
    fn fetch(&self) -> impl Future<Output = SongInfo> + Send {
        Self::fetch(self)
    }
}

/// Couples a [`StatusSource`] with a [`Tracker`] and polls it on a fixed interval.
pub struct PlaybackStateTracker<S, O> {
    source: S,
    tracker: Tracker<O>,
    interval: Duration,
}

impl<S: StatusSource, O: StatusObserver> PlaybackStateTracker<S, O> {
    pub fn new(source: S, observer: O, interval: Duration) -> Self {
        Self {
            source,
            tracker: Tracker::new(observer),
            interval,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &TrackerState {
        self.tracker.state()
    }

    #[cfg(test)]
    pub const fn observer(&self) -> &O {
        self.tracker.observer()
    }

    /// Fetch once and apply the result.
    pub async fn tick(&mut self) -> Transition {
        let info = self.source.fetch().await;
        tracing::debug!(?info, "Polled station");
        self.tracker.apply(info)
    }

    /// Move the tracker onto its own task: tick immediately, then once per interval.
    ///
    /// The tracker is consumed, so polling can only be started once. It is handed back
    /// by [`Poller::join`].
    ///
    /// # Panics
    ///
    /// Panics if the interval is zero, or if called outside of a Tokio runtime.
    pub fn start(self) -> Poller<S, O>
    where
        S: Send + Sync + 'static,
        O: Send + 'static,
    {
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);
        // A single slot: refresh requests made while one is already pending are dropped
        let (refresh_sender, refresh_receiver) = mpsc::channel(1);
        let task = tokio::spawn(self.run(shutdown_receiver, refresh_receiver));
        Poller {
            shutdown: shutdown_sender,
            refresh: refresh_sender,
            task,
        }
    }

    async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
        mut refresh: mpsc::Receiver<()>,
    ) -> Self {
        tracing::info!(interval = ?self.interval, "Polling started");
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // Ticks run inline, so at most one fetch is ever in flight
            select! {
                biased;
                _ = shutdown.changed() => break,
                _ = timer.tick() => {}
                Some(()) = refresh.recv() => {
                    tracing::debug!("Manual refresh requested");
                    timer.reset();
                }
            }

            // Dropping the tick during its fetch discards the result before it is applied
            select! {
                biased;
                _ = shutdown.changed() => {
                    tracing::debug!("Polling stopped during fetch, discarding result");
                    break;
                }
                _ = self.tick() => {}
            }
        }

        tracing::info!("Polling stopped");
        self
    }
}

/// Handle to a running [`PlaybackStateTracker`].
///
/// Dropping the handle stops polling as well.
pub struct Poller<S, O> {
    shutdown: watch::Sender<bool>,
    refresh: mpsc::Sender<()>,
    task: JoinHandle<PlaybackStateTracker<S, O>>,
}

impl<S, O> Poller<S, O> {
    /// Request an immediate tick. Returns `false` if one is already pending or polling
    /// has stopped.
    pub fn refresh(&self) -> bool {
        match self.refresh.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(())) => {
                tracing::debug!("Refresh already pending");
                false
            }
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }

    /// Prevent any further tick from starting. A fetch in flight is abandoned and its
    /// result discarded.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Stop polling and wait for the loop to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the polling task panicked.
    pub async fn join(self) -> Result<PlaybackStateTracker<S, O>> {
        self.stop();
        self.task.await.context("Polling task failed")
    }
}
