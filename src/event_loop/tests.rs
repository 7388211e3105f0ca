use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use tokio::time::sleep;

use super::*;
use crate::tracker::tests::{Event, Recorder};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct Stats {
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Stats {
    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

/// Replays a fixed list of statuses, repeating the last one forever
struct ScriptedSource {
    script: Mutex<VecDeque<SongInfo>>,
    delay: Duration,
    stats: Arc<Stats>,
}

impl ScriptedSource {
    fn new(script: &[(&str, bool)], delay: Duration) -> (Self, Arc<Stats>) {
        let stats = Arc::new(Stats::default());
        let source = Self {
            script: Mutex::new(
                script
                    .iter()
                    .map(|&(title, is_live)| SongInfo::new(title, is_live))
                    .collect(),
            ),
            delay,
            stats: Arc::clone(&stats),
        };
        (source, stats)
    }
}

impl StatusSource for ScriptedSource {
    fn fetch(&self) -> impl Future<Output = SongInfo> + Send {
        async move {
            self.stats.fetches.fetch_add(1, Ordering::SeqCst);
            let in_flight = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.stats
                .max_in_flight
                .fetch_max(in_flight, Ordering::SeqCst);
            sleep(self.delay).await;
            self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);

            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap_or_else(SongInfo::offline)
            }
        }
    }
}

fn display(title: &str, is_live: bool) -> Event {
    Event::Display(title.to_owned(), is_live)
}

#[tokio::test]
async fn tick_applies_one_status() {
    let (source, stats) = ScriptedSource::new(&[("Jazz Hour", true)], Duration::ZERO);
    let mut tracker = PlaybackStateTracker::new(source, Recorder::default(), POLL_INTERVAL);

    assert_eq!(tracker.tick().await, Transition::LiveStarted);
    assert_eq!(tracker.tick().await, Transition::Unchanged);
    assert_eq!(stats.fetches(), 2);
    assert_eq!(tracker.observer().0.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn starts_with_immediate_tick() {
    let (source, stats) = ScriptedSource::new(&[("Jazz Hour", true)], Duration::ZERO);
    let poller = PlaybackStateTracker::new(source, Recorder::default(), POLL_INTERVAL).start();

    sleep(Duration::from_millis(10)).await;
    assert_eq!(stats.fetches(), 1);

    let tracker = poller.join().await.unwrap();
    assert_eq!(
        tracker.observer().0,
        vec![
            Event::VisualStart,
            Event::LiveStart("Jazz Hour".to_owned()),
            display("Jazz Hour", true),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn polls_every_interval() {
    let (source, stats) = ScriptedSource::new(
        &[
            ("Offline", false),
            ("Jazz Hour", false),
            ("Jazz Hour", true),
            ("Blues Night", true),
        ],
        Duration::ZERO,
    );
    let poller = PlaybackStateTracker::new(source, Recorder::default(), POLL_INTERVAL).start();

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(stats.fetches(), 4);

    let tracker = poller.join().await.unwrap();
    assert_eq!(
        tracker.observer().0,
        vec![
            display("Offline", false),
            display("Jazz Hour", false),
            Event::VisualStart,
            Event::LiveStart("Jazz Hour".to_owned()),
            display("Jazz Hour", true),
            Event::TrackChanged("Blues Night".to_owned()),
            display("Blues Night", true),
        ]
    );
    assert_eq!(tracker.state().current_title, "Blues Night");
    assert!(tracker.state().was_live);
}

#[tokio::test(start_paused = true)]
async fn slow_fetches_never_overlap() {
    let (source, stats) = ScriptedSource::new(&[("Jazz Hour", true)], Duration::from_millis(2500));
    let poller = PlaybackStateTracker::new(source, Recorder::default(), POLL_INTERVAL).start();

    sleep(Duration::from_secs(10)).await;
    poller.join().await.unwrap();

    assert_eq!(stats.max_in_flight.load(Ordering::SeqCst), 1);
    assert!(stats.fetches() < 10, "{} fetches", stats.fetches());
}

#[tokio::test(start_paused = true)]
async fn stop_discards_in_flight_result() {
    let (source, stats) = ScriptedSource::new(&[("Jazz Hour", true)], Duration::from_secs(2));
    let poller = PlaybackStateTracker::new(source, Recorder::default(), POLL_INTERVAL).start();

    sleep(Duration::from_millis(500)).await;
    assert_eq!(stats.in_flight.load(Ordering::SeqCst), 1);
    poller.stop();

    let tracker = poller.join().await.unwrap();
    assert!(tracker.observer().0.is_empty());
    assert_eq!(tracker.state(), &TrackerState::default());
    assert_eq!(stats.fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_tick_after_stop() {
    let (source, stats) = ScriptedSource::new(&[("Offline", false)], Duration::ZERO);
    let poller = PlaybackStateTracker::new(source, Recorder::default(), POLL_INTERVAL).start();

    sleep(Duration::from_millis(10)).await;
    poller.stop();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(stats.fetches(), 1);
    assert!(!poller.refresh());

    poller.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn dropping_poller_stops_polling() {
    let (source, stats) = ScriptedSource::new(&[("Offline", false)], Duration::ZERO);
    let poller = PlaybackStateTracker::new(source, Recorder::default(), POLL_INTERVAL).start();

    sleep(Duration::from_millis(10)).await;
    drop(poller);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(stats.fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn refresh_ticks_immediately() {
    let (source, stats) = ScriptedSource::new(
        &[("Offline", false), ("Jazz Hour", false)],
        Duration::ZERO,
    );
    let poller =
        PlaybackStateTracker::new(source, Recorder::default(), Duration::from_secs(60)).start();

    sleep(Duration::from_millis(10)).await;
    assert_eq!(stats.fetches(), 1);
    assert!(poller.refresh());
    sleep(Duration::from_millis(10)).await;
    assert_eq!(stats.fetches(), 2);

    let tracker = poller.join().await.unwrap();
    assert_eq!(tracker.state().current_title, "Jazz Hour");
}

#[tokio::test(start_paused = true)]
async fn pending_refreshes_collapse() {
    let (source, stats) = ScriptedSource::new(&[("Offline", false)], Duration::from_secs(1));
    let poller =
        PlaybackStateTracker::new(source, Recorder::default(), Duration::from_secs(60)).start();

    sleep(Duration::from_millis(10)).await;
    assert!(poller.refresh());
    assert!(!poller.refresh());
    assert!(!poller.refresh());

    sleep(Duration::from_secs(5)).await;
    assert_eq!(stats.fetches(), 2);
    assert_eq!(stats.max_in_flight.load(Ordering::SeqCst), 1);

    poller.join().await.unwrap();
}

#[tokio::test]
async fn fetch_errors_end_live_broadcast() {
    let mut server = mockito::Server::new_async().await;
    let live = server
        .mock("GET", "/stations/abc/status")
        .with_status(200)
        .with_body(r#"{"status": "online", "source": {"type": "live"}, "current_track": {"title": "Jazz Hour"}}"#)
        .create_async()
        .await;

    let fetcher = StatusFetcher::new(&server.url(), "abc", Duration::from_secs(5)).unwrap();
    let mut tracker = PlaybackStateTracker::new(fetcher, Recorder::default(), POLL_INTERVAL);
    assert_eq!(tracker.tick().await, Transition::LiveStarted);

    live.remove_async().await;
    let _failing = server
        .mock("GET", "/stations/abc/status")
        .with_status(500)
        .create_async()
        .await;
    assert_eq!(tracker.tick().await, Transition::LiveEnded);
    assert_eq!(
        tracker.observer().0[3..],
        [Event::VisualStop, Event::LiveEnd, display("Error", false)]
    );
}
