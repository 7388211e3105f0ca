use anyhow::Result;
use clap::Parser as _;
use event_loop::{PlaybackStateTracker, Poller};
use hooks::CommandHooks;
use output::WaybarDisplay;
use status::StatusFetcher;
use tracker::{StatusObserver as _, LOADING_TITLE};

mod args;
mod event_loop;
mod hooks;
mod output;
mod status;
mod tracker;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = args::Args::parse();
    args.init_tracing_subscriber()?;

    let fetcher = StatusFetcher::new(&args.base_url, &args.station_id, args.timeout)?;
    tracing::info!(url = %fetcher.url(), "Following station status");

    let mut display = WaybarDisplay::stdout(args.max_length.into());
    display.on_display_update(LOADING_TITLE, false);
    let hooks = CommandHooks {
        station_name: args.station_name,
        on_live_start: args.on_live_start,
        on_track_change: args.on_track_change,
        on_live_end: args.on_live_end,
    };

    let poller = PlaybackStateTracker::new(fetcher, (display, hooks), args.interval).start();
    let signals = wait_for_shutdown(&poller).await;

    let tracker = poller.join().await?;
    tracing::info!(state = ?tracker.state(), "Exiting");
    signals
}

/// Serve refresh requests until asked to terminate
#[cfg(unix)]
async fn wait_for_shutdown<S, O>(poller: &Poller<S, O>) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut refresh = signal(SignalKind::user_defined1())?;
    let mut terminate = signal(SignalKind::terminate())?;
    loop {
        tokio::select! {
            r = tokio::signal::ctrl_c() => return Ok(r?),
            _ = terminate.recv() => return Ok(()),
            _ = refresh.recv() => {
                tracing::info!("SIGUSR1 received, refreshing");
                poller.refresh();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown<S, O>(_poller: &Poller<S, O>) -> Result<()> {
    Ok(tokio::signal::ctrl_c().await?)
}
