//! Recent results lister.
//!
//! Fetches the server's list of processed images and renders the newest few
//! into the view. Failures are logged and never shown to the user.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::model::most_recent;
use crate::service::ImageService;
use crate::view::View;

/// Renders the tail of the server's image list.
#[derive(Clone)]
pub struct RecentResults {
    service: Arc<dyn ImageService>,
    view: Arc<dyn View>,
    limit: usize,
}

impl std::fmt::Debug for RecentResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentResults")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl RecentResults {
    /// Create a lister rendering at most `limit` entries.
    #[must_use]
    pub fn new(service: Arc<dyn ImageService>, view: Arc<dyn View>, limit: usize) -> Self {
        Self {
            service,
            view,
            limit,
        }
    }

    /// Maximum number of rendered entries.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Fetch the list and re-render it.
    ///
    /// Returns the number of rendered entries, or `None` if the fetch failed
    /// and the view was left untouched.
    pub async fn refresh(&self) -> Option<usize> {
        let listings = match self.service.list_images().await {
            Ok(listings) => listings,
            Err(err) => {
                error!("failed to fetch previous results: {err}");
                return None;
            }
        };

        let shown = most_recent(&listings, self.limit);
        debug!("rendering {} of {} previous results", shown.len(), listings.len());
        self.view.render_recent(shown);
        self.view.set_recent_visible(!shown.is_empty());
        Some(shown.len())
    }

    /// Refresh once `delay` has elapsed, on a spawned task.
    ///
    /// The delay is a guess at how long the server needs to index a new
    /// upload; it is not confirmed by the server.
    #[must_use = "dropping the handle detaches the refresh"]
    pub fn schedule_refresh(&self, delay: Duration) -> JoinHandle<Option<usize>> {
        let lister = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            lister.refresh().await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::ImageListing;
    use crate::testing::{listings, ScriptedService};
    use crate::view::MemoryView;

    fn lister(service: &Arc<ScriptedService>, view: &Arc<MemoryView>) -> RecentResults {
        RecentResults::new(service.clone(), view.clone(), 5)
    }

    #[tokio::test]
    async fn test_refresh_renders_last_five_in_order() {
        let service = ScriptedService::new();
        let view = Arc::new(MemoryView::new());
        service.push_listing(Ok(listings(8)));

        let count = lister(&service, &view).refresh().await;

        assert_eq!(count, Some(5));
        let state = view.snapshot();
        assert_eq!(state.recent, listings(8)[3..].to_vec());
        assert!(state.recent_visible);
    }

    #[tokio::test]
    async fn test_refresh_short_list() {
        let service = ScriptedService::new();
        let view = Arc::new(MemoryView::new());
        service.push_listing(Ok(listings(2)));

        assert_eq!(lister(&service, &view).refresh().await, Some(2));
        let state = view.snapshot();
        assert_eq!(state.recent, listings(2));
        assert!(state.recent_visible);
    }

    #[tokio::test]
    async fn test_refresh_empty_list_keeps_section_hidden() {
        let service = ScriptedService::new();
        let view = Arc::new(MemoryView::new());
        service.push_listing(Ok(Vec::new()));

        assert_eq!(lister(&service, &view).refresh().await, Some(0));
        let state = view.snapshot();
        assert!(state.recent.is_empty());
        assert!(!state.recent_visible);
    }

    #[tokio::test]
    async fn test_refresh_replaces_previous_render() {
        let service = ScriptedService::new();
        let view = Arc::new(MemoryView::new());
        service.push_listing(Ok(listings(3)));
        service.push_listing(Ok(vec![ImageListing::new("only.jpg", "/download/only.jpg")]));
        let lister = lister(&service, &view);

        lister.refresh().await;
        lister.refresh().await;

        let state = view.snapshot();
        assert_eq!(state.recent, vec![ImageListing::new("only.jpg", "/download/only.jpg")]);
        assert_eq!(service.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_view_unchanged() {
        crate::logging::init_test_logging();
        let service = ScriptedService::new();
        let view = Arc::new(MemoryView::new());
        service.push_listing(Ok(listings(2)));
        service.push_listing(Err(Error::status(500, "boom")));
        let lister = lister(&service, &view);

        lister.refresh().await;
        let before = view.snapshot();
        assert_eq!(lister.refresh().await, None);

        assert_eq!(view.snapshot(), before);
        assert!(view.snapshot().result_text.is_empty());
    }

    #[tokio::test]
    async fn test_custom_limit() {
        let service = ScriptedService::new();
        let view = Arc::new(MemoryView::new());
        service.push_listing(Ok(listings(4)));

        let lister = RecentResults::new(service.clone(), view.clone(), 1);
        assert_eq!(lister.limit(), 1);
        assert_eq!(lister.refresh().await, Some(1));
        assert_eq!(view.snapshot().recent, listings(4)[3..].to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_refresh_waits_for_delay() {
        let service = ScriptedService::new();
        let view = Arc::new(MemoryView::new());
        service.push_listing(Ok(listings(1)));
        let lister = lister(&service, &view);

        let start = tokio::time::Instant::now();
        let handle = lister.schedule_refresh(Duration::from_millis(2000));
        tokio::task::yield_now().await;
        assert_eq!(service.list_calls(), 0);

        assert_eq!(handle.await.unwrap(), Some(1));
        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert!(view.snapshot().recent_visible);
    }
}
