use std::{fs::File, io, sync::Mutex, time::Duration};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::tracker::MAX_TITLE_LENGTH;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Station identifier, as found in the status URL
    #[clap(long, short, default_value = "s3ab6bdcb9")]
    pub station_id: String,
    /// Station name used in notifications
    #[clap(long, short = 'n', default_value = "Radyo ÖzÜ")]
    pub station_name: String,
    /// Base URL of the status API. Polls `<BASE_URL>/stations/<STATION_ID>/status`.
    #[clap(long, default_value = "https://public.radio.co")]
    pub base_url: String,
    /// Seconds between two status polls
    #[clap(long, short, default_value = "1", value_parser = parse_seconds)]
    pub interval: Duration,
    /// Seconds to wait for the status endpoint before giving up on a poll
    #[clap(long, short, default_value = "10", value_parser = parse_seconds)]
    pub timeout: Duration,
    /// Maximum number of characters shown in the bar
    #[clap(long, short, default_value_t = MAX_TITLE_LENGTH as u16, value_parser = clap::value_parser!(u16).range(4..))]
    pub max_length: u16,
    /// Shell command run when the station goes live
    #[clap(long)]
    pub on_live_start: Option<String>,
    /// Shell command run when the track changes during a live broadcast
    #[clap(long)]
    pub on_track_change: Option<String>,
    /// Shell command run when a live broadcast ends
    #[clap(long)]
    pub on_live_end: Option<String>,
    /// File to write the log to. If not specified, logs will be written to stderr.
    #[clap(long, short)]
    log_file: Option<String>,
}

impl Args {
    /// Build the tracing subscriber using parameters from the command line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created.
    pub fn init_tracing_subscriber(&self) -> io::Result<()> {
        let builder = tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env());

        match self.log_file.as_ref() {
            None => builder.with_writer(io::stderr).init(),
            Some(f) => builder.with_writer(Mutex::new(File::create(f)?)).init(),
        }
        Ok(())
    }
}

/// Parse a strictly positive number of seconds
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs = s.parse::<f64>().map_err(|e| e.to_string())?;
    if secs <= 0.0 {
        return Err("must be greater than zero".to_owned());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}
