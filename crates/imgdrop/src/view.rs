//! Presentation seam for upload and listing results.
//!
//! Components never reach for global output; they are handed a [`View`] and
//! drive it through a small set of display operations. [`MemoryView`] keeps
//! the resulting state in memory and [`TerminalView`] renders it as text.

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

use crate::model::{ImageListing, StatsPanel};

/// Display regions an upload session writes to.
///
/// Methods take `&self` so one view can be shared by the upload client, the
/// recent-results lister, and the delayed refresh task.
pub trait View: Send + Sync {
    /// Show or hide the busy indicator.
    fn set_busy(&self, busy: bool);

    /// Replace the result text. An empty string clears it.
    fn set_result_text(&self, text: &str);

    /// Point the download link at `url` and reveal it.
    fn show_download_link(&self, url: &str);

    /// Hide the download link.
    fn hide_download_link(&self);

    /// Fill and reveal the statistics panel.
    fn show_stats(&self, panel: &StatsPanel);

    /// Hide the statistics panel.
    fn hide_stats(&self);

    /// Replace the recent results list.
    fn render_recent(&self, entries: &[ImageListing]);

    /// Show or hide the recent results section.
    fn set_recent_visible(&self, visible: bool);
}

/// Snapshot of everything a [`MemoryView`] displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    /// Busy indicator visibility.
    pub busy: bool,
    /// Every busy indicator change, in order.
    pub busy_changes: Vec<bool>,
    /// Result text.
    pub result_text: String,
    /// Target of the download link; kept when the link is hidden.
    pub download_link: Option<String>,
    /// Download link visibility.
    pub download_visible: bool,
    /// Statistics panel contents, `None` while hidden.
    pub stats: Option<StatsPanel>,
    /// Rendered recent results.
    pub recent: Vec<ImageListing>,
    /// Recent results section visibility.
    pub recent_visible: bool,
}

/// A [`View`] that records its state in memory.
#[derive(Debug, Default)]
pub struct MemoryView {
    state: Mutex<ViewState>,
}

impl MemoryView {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ViewState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl View for MemoryView {
    fn set_busy(&self, busy: bool) {
        let mut state = self.lock();
        state.busy = busy;
        state.busy_changes.push(busy);
    }

    fn set_result_text(&self, text: &str) {
        self.lock().result_text = text.to_string();
    }

    fn show_download_link(&self, url: &str) {
        let mut state = self.lock();
        state.download_link = Some(url.to_string());
        state.download_visible = true;
    }

    fn hide_download_link(&self) {
        self.lock().download_visible = false;
    }

    fn show_stats(&self, panel: &StatsPanel) {
        self.lock().stats = Some(panel.clone());
    }

    fn hide_stats(&self) {
        self.lock().stats = None;
    }

    fn render_recent(&self, entries: &[ImageListing]) {
        self.lock().recent = entries.to_vec();
    }

    fn set_recent_visible(&self, visible: bool) {
        self.lock().recent_visible = visible;
    }
}

/// A [`View`] that prints results as plain text.
///
/// Hide operations print nothing. The recent list is buffered by
/// [`View::render_recent`] and written once the section is made visible.
/// A quiet view prints nothing at all.
#[derive(Debug)]
pub struct TerminalView<W: Write + Send = std::io::Stdout> {
    inner: Mutex<TerminalInner<W>>,
    quiet: bool,
}

#[derive(Debug)]
struct TerminalInner<W> {
    out: W,
    recent: Vec<ImageListing>,
}

impl TerminalView {
    /// Create a view writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    /// Create a view writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            inner: Mutex::new(TerminalInner {
                out,
                recent: Vec::new(),
            }),
            quiet: false,
        }
    }

    /// Suppress all output when `quiet` is set.
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Consume the view and return its writer.
    pub fn into_inner(self) -> W {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .out
    }

    fn write(&self, render: impl FnOnce(&mut TerminalInner<W>) -> std::io::Result<()>) {
        if self.quiet {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = render(&mut *inner).and_then(|()| inner.out.flush()) {
            debug!("failed to write to terminal: {err}");
        }
    }
}

impl<W: Write + Send> View for TerminalView<W> {
    fn set_busy(&self, busy: bool) {
        if busy {
            self.write(|t| writeln!(t.out, "Uploading..."));
        }
    }

    fn set_result_text(&self, text: &str) {
        if !text.is_empty() {
            self.write(|t| writeln!(t.out, "{text}"));
        }
    }

    fn show_download_link(&self, url: &str) {
        self.write(|t| writeln!(t.out, "Download: {url}"));
    }

    fn hide_download_link(&self) {}

    fn show_stats(&self, panel: &StatsPanel) {
        self.write(|t| {
            writeln!(t.out)?;
            writeln!(t.out, "File Statistics")?;
            writeln!(t.out, "---------------")?;
            writeln!(t.out, "Original Size:    {}", panel.original_size)?;
            writeln!(t.out, "Compressed Size:  {}", panel.compressed_size)?;
            writeln!(t.out, "Compression:      {}", panel.compression)?;
            writeln!(t.out, "Quality:          {}", panel.quality)?;
            writeln!(t.out, "Format:           {}", panel.format)
        });
    }

    fn hide_stats(&self) {}

    fn render_recent(&self, entries: &[ImageListing]) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.recent = entries.to_vec();
    }

    fn set_recent_visible(&self, visible: bool) {
        if !visible {
            return;
        }
        self.write(|t| {
            writeln!(t.out)?;
            writeln!(t.out, "Previous Results")?;
            writeln!(t.out, "----------------")?;
            for entry in &t.recent {
                writeln!(t.out, "{}  {}", entry.name, entry.url)?;
            }
            Ok(())
        });
    }
}
