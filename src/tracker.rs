//! Live/track transition detection for the station status

use std::borrow::Cow;

use crate::status::SongInfo;


/// Title displayed before the first status arrives.
pub const LOADING_TITLE: &str = "Loading...";
/// Default maximum length of the displayed label, in characters.
pub const MAX_TITLE_LENGTH: usize = 40;
const ELLIPSIS: &str = "...";

/// Receiver of the side effects produced by the [`Tracker`].
///
/// Only [`on_display_update`](StatusObserver::on_display_update) is mandatory, the other
/// hooks default to doing nothing.
pub trait StatusObserver {
    /// The visible status changed.
    fn on_display_update(&mut self, title: &str, is_live: bool);
    /// The station went live.
    fn on_live_start(&mut self, _title: &str) {}
    /// A new track started while the station is live.
    fn on_track_changed(&mut self, _title: &str) {}
    /// The live broadcast ended.
    fn on_live_end(&mut self) {}
    /// Start a continuous "live" visual cue.
    fn on_live_visual_start(&mut self) {}
    /// Stop the "live" visual cue.
    fn on_live_visual_stop(&mut self) {}
}

impl<A: StatusObserver, B: StatusObserver> StatusObserver for (A, B) {
    fn on_display_update(&mut self, title: &str, is_live: bool) {
        self.0.on_display_update(title, is_live);
        self.1.on_display_update(title, is_live);
    }
    fn on_live_start(&mut self, title: &str) {
        self.0.on_live_start(title);
        self.1.on_live_start(title);
    }
    fn on_track_changed(&mut self, title: &str) {
        self.0.on_track_changed(title);
        self.1.on_track_changed(title);
    }
    fn on_live_end(&mut self) {
        self.0.on_live_end();
        self.1.on_live_end();
    }
    fn on_live_visual_start(&mut self) {
        self.0.on_live_visual_start();
        self.1.on_live_visual_start();
    }
    fn on_live_visual_stop(&mut self) {
        self.0.on_live_visual_stop();
        self.1.on_live_visual_stop();
    }
}

/// Last observed station state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    pub current_title: String,
    pub is_live: bool,
    /// `is_live` as of the end of the previous transition
    pub was_live: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            current_title: LOADING_TITLE.to_owned(),
            is_live: false,
            was_live: false,
        }
    }
}

/// Classification of one applied [`SongInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same title and live flag as before; nothing was emitted.
    Unchanged,
    /// Offline to live.
    LiveStarted,
    /// Live to offline (including fetch errors).
    LiveEnded,
    /// Live to live with a different title.
    TrackChanged,
    /// Offline title change; only the display was updated.
    Updated,
}

/// Owns the [`TrackerState`] and turns incoming snapshots into observer calls.
#[derive(Debug)]
pub struct Tracker<O> {
    state: TrackerState,
    observer: O,
}

impl<O: StatusObserver> Tracker<O> {
    pub fn new(observer: O) -> Self {
        Self {
            state: TrackerState::default(),
            observer,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &TrackerState {
        &self.state
    }

    #[cfg(test)]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Compare `info` against the stored state, emit the matching side effects and store it.
    pub fn apply(&mut self, info: SongInfo) -> Transition {
        let SongInfo { title, is_live } = info;
        if title == self.state.current_title && is_live == self.state.is_live {
            return Transition::Unchanged;
        }

        let transition = match (self.state.was_live, is_live) {
            (false, true) => Transition::LiveStarted,
            (true, false) => Transition::LiveEnded,
            (true, true) if title != self.state.current_title => Transition::TrackChanged,
            _ => Transition::Updated,
        };
        tracing::info!(?transition, %title, is_live, "Station state changed");

        match transition {
            Transition::LiveStarted => {
                self.observer.on_live_visual_start();
                self.observer.on_live_start(&title);
            }
            Transition::LiveEnded => {
                self.observer.on_live_visual_stop();
                self.observer.on_live_end();
            }
            Transition::TrackChanged => self.observer.on_track_changed(&title),
            Transition::Updated | Transition::Unchanged => {}
        }

        self.state.was_live = is_live;
        self.state.current_title = title;
        self.state.is_live = is_live;

        self.observer
            .on_display_update(&self.state.current_title, self.state.is_live);
        transition
    }
}

/// Shorten `title` to at most `max_length` characters, ending with `...` when cut.
///
/// `max_length` is expected to be larger than the ellipsis.
#[must_use]
pub fn truncate_title(title: &str, max_length: usize) -> Cow<'_, str> {
    if title.chars().count() <= max_length {
        return Cow::Borrowed(title);
    }
    let mut truncated: String = title
        .chars()
        .take(max_length.saturating_sub(ELLIPSIS.len()))
        .collect();
    truncated.push_str(ELLIPSIS);
    Cow::Owned(truncated)
}
