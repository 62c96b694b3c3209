//! Search orchestration.
//!
//! One conceptual in-flight search slot: a `search()` call that arrives
//! while another is loading is dropped, not queued, so the most recently
//! completed response wins. The only retry is the single CSRF
//! refresh-and-retry cycle on a 403 with a CSRF marker in the body.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::SearchError;
use crate::model::{SearchOutcome, SearchState};
use crate::request::build_search_request;
use crate::tokens::TokenStore;
use crate::transport::{ApiTransport, routes};
use crate::view::{PageControls, SearchView};

/// User-visible message for non-auth, non-CSRF failures.
const GENERIC_SEARCH_ERROR: &str = "An error occurred while searching. Please try again.";

/// How a controller entry point finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Outcome published to the view.
    Completed,
    /// Another operation was in flight (or inside a debounce window);
    /// nothing happened.
    Dropped,
    /// Navigation to the login route; terminal for this flow.
    Redirected,
    /// A user-visible error was surfaced.
    Failed,
}

/// Compute pagination controls. `None` when one page covers everything.
pub fn page_controls(total: u64, per_page: u32, current: u32) -> Option<PageControls> {
    if per_page == 0 {
        return None;
    }
    let total_pages = total.div_ceil(per_page as u64) as u32;
    if total_pages <= 1 {
        return None;
    }
    Some(PageControls {
        current,
        total_pages,
        prev_enabled: current > 1,
        next_enabled: current < total_pages,
    })
}

pub struct SearchController<T: ApiTransport, V: SearchView> {
    transport: Arc<T>,
    tokens: Arc<TokenStore<T>>,
    view: Arc<V>,
    per_page: u32,
    login_path: String,
    current_path: String,
    loading: AtomicBool,
}

impl<T: ApiTransport, V: SearchView> SearchController<T, V> {
    pub fn new(transport: Arc<T>, tokens: Arc<TokenStore<T>>, view: Arc<V>, cfg: &ClientConfig) -> Self {
        Self {
            transport,
            tokens,
            view,
            per_page: cfg.per_page,
            login_path: cfg.login_path.clone(),
            current_path: cfg.current_path.clone(),
            loading: AtomicBool::new(false),
        }
    }

    fn login_redirect(&self) -> String {
        format!(
            "{}?next={}",
            self.login_path,
            urlencoding::encode(&self.current_path)
        )
    }

    /// Run one search for the given state.
    ///
    /// Drops the call when another search is loading. Refreshes the CSRF
    /// token best-effort before the request; a refresh failure never
    /// blocks the search itself.
    pub async fn search(&self, state: &SearchState) -> Completion {
        if self.loading.swap(true, Ordering::SeqCst) {
            debug!("search dropped: another search is in flight");
            return Completion::Dropped;
        }
        self.view.loading_started();

        let mut csrf_retried = false;
        let completion = loop {
            if !self.tokens.refresh_csrf().await {
                debug!("pre-search csrf refresh failed; proceeding with cached token");
            }

            let payload = build_search_request(state, self.per_page);
            info!(
                query = %payload.query,
                collection_type = %payload.collection_type,
                page = payload.page,
                "search_start"
            );

            let body = match serde_json::to_value(&payload) {
                Ok(body) => body,
                Err(e) => {
                    warn!("search: payload serialization failed: {e}");
                    self.view.show_error(GENERIC_SEARCH_ERROR);
                    break Completion::Failed;
                }
            };

            let resp = match self
                .transport
                .post(routes::SEARCH, &body, &self.tokens.headers())
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("search request failed: {e}");
                    self.view.show_error(GENERIC_SEARCH_ERROR);
                    break Completion::Failed;
                }
            };

            if resp.is_success() {
                match SearchOutcome::from_json(&resp.body) {
                    Ok(outcome) => {
                        self.publish(state, &outcome);
                        break Completion::Completed;
                    }
                    Err(e) => {
                        warn!("search: response parse failed: {e}");
                        self.view.show_error(GENERIC_SEARCH_ERROR);
                        break Completion::Failed;
                    }
                }
            }

            match self.classify_failure(resp.status, resp.detail()) {
                SearchError::AuthRequired { next } => {
                    info!("search: authentication required, redirecting");
                    self.view.redirect(&next);
                    // Navigation is terminal: the loading placeholder
                    // stays up while the redirect is in flight.
                    self.loading.store(false, Ordering::SeqCst);
                    return Completion::Redirected;
                }
                SearchError::CsrfInvalid if !csrf_retried => {
                    info!("search: CSRF rejected, refreshing token for one retry");
                    csrf_retried = true;
                    if self.tokens.refresh_csrf().await {
                        continue;
                    }
                    self.view.show_error(&SearchError::CsrfInvalid.to_string());
                    break Completion::Failed;
                }
                SearchError::CsrfInvalid => {
                    warn!("search: CSRF rejected again after refresh");
                    self.view.show_error(&SearchError::CsrfInvalid.to_string());
                    break Completion::Failed;
                }
                err => {
                    warn!("search failed: {err}");
                    self.view.show_error(GENERIC_SEARCH_ERROR);
                    break Completion::Failed;
                }
            }
        };

        self.loading.store(false, Ordering::SeqCst);
        self.view.loading_finished();
        completion
    }

    fn classify_failure(&self, status: u16, detail: Option<String>) -> SearchError {
        match status {
            401 => SearchError::AuthRequired {
                next: self.login_redirect(),
            },
            403 if detail.as_deref().is_some_and(|d| d.contains("CSRF")) => {
                SearchError::CsrfInvalid
            }
            status => SearchError::Api {
                status,
                detail: detail.unwrap_or_default(),
            },
        }
    }

    fn publish(&self, state: &SearchState, outcome: &SearchOutcome) {
        if outcome.results.is_empty() {
            self.view.render_empty();
            self.view.render_pagination(None);
            return;
        }
        self.view.render_results(outcome);
        let controls = page_controls(outcome.total, outcome.per_page, state.page());
        self.view.render_pagination(controls.as_ref());
    }

    /// Pagination click: move to `page` and re-run the search. The page
    /// move survives even when the search itself is dropped.
    pub async fn go_to_page(&self, state: &mut SearchState, page: u32) -> Completion {
        state.set_page(page);
        self.search(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_controls_ceiling_division() {
        let controls = page_controls(25, 10, 1).unwrap();
        assert_eq!(controls.total_pages, 3);

        let controls = page_controls(30, 10, 2).unwrap();
        assert_eq!(controls.total_pages, 3);
    }

    #[test]
    fn no_controls_when_single_page() {
        assert!(page_controls(10, 10, 1).is_none());
        assert!(page_controls(3, 10, 1).is_none());
        assert!(page_controls(0, 10, 1).is_none());
    }

    #[test]
    fn prev_next_disabled_at_bounds() {
        let first = page_controls(50, 10, 1).unwrap();
        assert!(!first.prev_enabled);
        assert!(first.next_enabled);

        let middle = page_controls(50, 10, 3).unwrap();
        assert!(middle.prev_enabled);
        assert!(middle.next_enabled);

        let last = page_controls(50, 10, 5).unwrap();
        assert!(last.prev_enabled);
        assert!(!last.next_enabled);
    }
}
