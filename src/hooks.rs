//! Shell commands run on station events

use std::process::Stdio;

use tokio::{process::Command, task::JoinHandle};

use crate::tracker::StatusObserver;

/// Commands bound to the live-start, track-change and live-end events.
///
/// Each command is run with `sh -c` in the background. Event details are passed through the
/// environment as `STATION_EVENT`, `STATION_SUMMARY` and `STATION_TITLE`. The command's
/// standard output is discarded, as stdout belongs to Waybar.
#[derive(Debug, Default, Clone)]
pub struct CommandHooks {
    pub station_name: String,
    pub on_live_start: Option<String>,
    pub on_track_change: Option<String>,
    pub on_live_end: Option<String>,
}

impl CommandHooks {
    fn run(
        &self,
        event: &'static str,
        command: Option<&str>,
        summary: &str,
        title: &str,
    ) -> Option<JoinHandle<()>> {
        let Some(command) = command else {
            tracing::info!(event, summary, title, "No command bound to station event");
            return None;
        };
        tracing::debug!(event, command, "Running station event command");

        let mut child = match Command::new("sh")
            .arg("-c")
            .arg(command)
            .env("STATION_EVENT", event)
            .env("STATION_SUMMARY", summary)
            .env("STATION_TITLE", title)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(event, command, %e, "Failed to spawn event command");
                return None;
            }
        };

        let command = command.to_owned();
        Some(tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => tracing::warn!(event, %command, %status, "Event command failed"),
                Err(e) => tracing::warn!(event, %command, %e, "Failed to wait for event command"),
            }
        }))
    }
}

impl StatusObserver for CommandHooks {
    fn on_display_update(&mut self, _title: &str, _is_live: bool) {}

    fn on_live_start(&mut self, title: &str) {
        let summary = format!("{} is LIVE!", self.station_name);
        self.run("live-start", self.on_live_start.as_deref(), &summary, title);
    }

    fn on_track_changed(&mut self, title: &str) {
        self.run("track-change", self.on_track_change.as_deref(), "Now Playing", title);
    }

    fn on_live_end(&mut self) {
        let summary = format!("{} broadcast ended", self.station_name);
        self.run("live-end", self.on_live_end.as_deref(), &summary, "");
    }
}
