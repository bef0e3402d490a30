//! Upload client.
//!
//! Submits one file per call and renders the reply into the view. Each
//! submission takes a token; only the holder of the latest token may touch
//! the view, so an older request that resolves late is silently dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::model::{StatsPanel, UploadOutcome};
use crate::recent::RecentResults;
use crate::service::{ImageService, UploadFile};
use crate::view::View;

/// Result of one [`UploadClient::submit`] call.
#[derive(Debug)]
pub struct Submission {
    /// Token this submission ran under.
    pub token: u64,
    /// Typed reply, or the transport/decode error behind the fallback message.
    pub result: Result<UploadOutcome>,
    /// Text this submission shows, the fallback message for errors.
    pub message: String,
    /// Whether a newer submission took over the view before this one resolved.
    pub superseded: bool,
    /// Pending refresh of the recent results, if one was scheduled.
    pub refresh: Option<JoinHandle<Option<usize>>>,
}

impl Submission {
    /// Whether the server accepted the upload.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(&self.result, Ok(outcome) if outcome.is_completed())
    }

    /// Wait for the scheduled refresh, if any.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.refresh.take() {
            if let Err(err) = handle.await {
                warn!("recent results refresh did not finish: {err}");
            }
        }
    }
}

/// Hides the busy indicator when dropped, unless a newer submission owns it.
struct BusyGuard<'a> {
    view: &'a dyn View,
    generation: &'a AtomicU64,
    token: u64,
}

impl<'a> BusyGuard<'a> {
    fn engage(view: &'a dyn View, generation: &'a AtomicU64, token: u64) -> Self {
        view.set_busy(true);
        Self {
            view,
            generation,
            token,
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.generation.load(Ordering::SeqCst) == self.token {
            self.view.set_busy(false);
        }
    }
}

/// Uploads files and renders the outcome.
#[derive(Clone)]
pub struct UploadClient {
    service: Arc<dyn ImageService>,
    view: Arc<dyn View>,
    recent: RecentResults,
    generation: Arc<AtomicU64>,
    fallback_message: String,
    refresh_delay: Duration,
}

impl std::fmt::Debug for UploadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadClient")
            .field("recent", &self.recent)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("fallback_message", &self.fallback_message)
            .field("refresh_delay", &self.refresh_delay)
            .finish_non_exhaustive()
    }
}

impl UploadClient {
    /// Create a client sharing `view` with `recent`.
    #[must_use]
    pub fn new(
        service: Arc<dyn ImageService>,
        view: Arc<dyn View>,
        recent: RecentResults,
        config: &Config,
    ) -> Self {
        Self {
            service,
            view,
            recent,
            generation: Arc::new(AtomicU64::new(0)),
            fallback_message: config.upload.fallback_message.clone(),
            refresh_delay: config.refresh_delay(),
        }
    }

    /// The lister refreshed after successful uploads.
    #[must_use]
    pub fn recent(&self) -> &RecentResults {
        &self.recent
    }

    /// Upload `file` and render the reply.
    ///
    /// Never fails: every error ends up as text in the view and in
    /// [`Submission::result`]. The busy indicator is cleared on every exit
    /// path, including when this future is dropped before completion.
    pub async fn submit(&self, file: UploadFile) -> Submission {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("submission {token}: {file:?}");

        let guard = BusyGuard::engage(self.view.as_ref(), &self.generation, token);
        self.view.set_result_text("");
        self.view.hide_download_link();
        self.view.hide_stats();

        let result = match self.service.upload(&file).await {
            Ok(reply) => UploadOutcome::from_reply(reply.status, &reply.body, &self.fallback_message),
            Err(err) => Err(err),
        };

        let message = match &result {
            Ok(outcome) => outcome.message().to_string(),
            Err(_) => self.fallback_message.clone(),
        };

        let superseded = !self.is_current(token);
        let refresh = if superseded {
            debug!("submission {token} superseded, discarding its reply");
            None
        } else {
            self.render(&result)
        };
        drop(guard);

        Submission {
            token,
            result,
            message,
            superseded,
            refresh,
        }
    }

    fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    fn render(&self, result: &Result<UploadOutcome>) -> Option<JoinHandle<Option<usize>>> {
        match result {
            Ok(UploadOutcome::Completed {
                message,
                url,
                stats,
            }) => {
                self.view.set_result_text(message);
                let url = url.as_deref()?;
                info!("upload complete: {url}");
                self.view.show_download_link(url);
                if let Some(stats) = stats {
                    self.view.show_stats(&StatsPanel::from(stats));
                }
                Some(self.recent.schedule_refresh(self.refresh_delay))
            }
            Ok(UploadOutcome::Rejected { status, message }) => {
                warn!("upload rejected with status {status}: {message}");
                self.view.set_result_text(message);
                None
            }
            Err(err) => {
                warn!("upload failed: {err}");
                self.view.set_result_text(&self.fallback_message);
                None
            }
        }
    }
}
