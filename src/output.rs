use serde::Serialize;
use std::io::{self, Stdout, Write};

use crate::tracker::{truncate_title, StatusObserver};

/// Prefixed to the label while the station is live. Not counted in the label length.
const LIVE_GLYPH: &str = "📻";

/// A structure that can be serialized to JSON and parsed by Waybar.
#[derive(Serialize, Debug, Default)]
pub struct WaybarCustomModule {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tooltip: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    class: Vec<String>,
}

impl WaybarCustomModule {
    /// Create a new module with the given contents.
    pub fn new(text: Option<&str>, alt: Option<&str>, tooltip: Option<&str>, class: &[&str]) -> Self {
        Self {
            text: text.map(html_escape::encode_text).map(String::from),
            alt: alt.map(html_escape::encode_text).map(String::from),
            tooltip: tooltip.map(html_escape::encode_text).map(String::from),
            class: class
                .iter()
                .map(|c| html_escape::encode_text(c).into_owned())
                .collect(),
        }
    }
    /// Format the module as JSON and write it to the given writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the given writer fails.
    pub fn format<T: Write>(&self, mut f: &mut T) -> io::Result<()> {
        serde_json::to_writer(&mut f, self)?;
        f.write_all(b"\n")?;
        f.flush()
    }
}

/// Displays the station status as a Waybar custom module.
///
/// `alt` and the first class are `live` or `offline`, so the bar can pick an icon
/// through `format-icons`. While the live cue is running a `pulse` class is added.
#[derive(Debug)]
pub struct WaybarDisplay<W> {
    writer: W,
    max_length: usize,
    pulsing: bool,
}

impl WaybarDisplay<Stdout> {
    pub fn stdout(max_length: usize) -> Self {
        Self::new(io::stdout(), max_length)
    }
}

impl<W: Write> WaybarDisplay<W> {
    pub const fn new(writer: W, max_length: usize) -> Self {
        Self {
            writer,
            max_length,
            pulsing: false,
        }
    }

    fn render(&self, title: &str, is_live: bool) -> WaybarCustomModule {
        let state = if is_live { "live" } else { "offline" };
        let tooltip = if is_live {
            format!("🔴 LIVE: {title}")
        } else {
            title.to_owned()
        };
        let mut class = vec![state];
        if self.pulsing {
            class.push("pulse");
        }
        let label = truncate_title(title, self.max_length);
        let text = if is_live {
            format!("{LIVE_GLYPH} {label}")
        } else {
            label.into_owned()
        };
        WaybarCustomModule::new(
            Some(&text),
            Some(state),
            Some(&tooltip),
            &class,
        )
    }
}

impl<W: Write> StatusObserver for WaybarDisplay<W> {
    fn on_display_update(&mut self, title: &str, is_live: bool) {
        let module = self.render(title, is_live);
        if let Err(e) = module.format(&mut self.writer) {
            tracing::error!(?e, "Failed to write Waybar output");
        }
    }

    fn on_live_visual_start(&mut self) {
        self.pulsing = true;
    }

    fn on_live_visual_stop(&mut self) {
        self.pulsing = false;
    }
}
