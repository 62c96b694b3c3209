//! Saved searches.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::controller::Completion;
use crate::model::SearchState;
use crate::tokens::TokenStore;
use crate::transport::{ApiTransport, routes};
use crate::view::StatusView;

pub struct SavedSearches<T: ApiTransport, V: StatusView> {
    transport: Arc<T>,
    tokens: Arc<TokenStore<T>>,
    view: Arc<V>,
    login_path: String,
    current_path: String,
}

impl<T: ApiTransport, V: StatusView> SavedSearches<T, V> {
    pub fn new(transport: Arc<T>, tokens: Arc<TokenStore<T>>, view: Arc<V>, cfg: &ClientConfig) -> Self {
        Self {
            transport,
            tokens,
            view,
            login_path: cfg.login_path.clone(),
            current_path: cfg.current_path.clone(),
        }
    }

    fn login_redirect(&self) -> String {
        format!(
            "{}?next={}",
            self.login_path,
            urlencoding::encode(&self.current_path)
        )
    }

    /// Persist the current search to the user's history. Auth-gated.
    pub async fn save_current(&self, state: &SearchState, results_count: usize) -> Completion {
        if !self.tokens.is_authenticated() {
            self.view.redirect(&self.login_redirect());
            return Completion::Redirected;
        }

        let body = json!({
            "query": state.query_text(),
            "category": state.category().as_str(),
            "results_count": results_count,
            "is_saved": true,
        });

        let resp = match self
            .transport
            .post(routes::SEARCH_HISTORY, &body, &self.tokens.headers())
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("save search failed: {e}");
                self.view
                    .show_error("Failed to save search. Please try again.");
                return Completion::Failed;
            }
        };

        if resp.status == 401 {
            info!("save search: authentication required, redirecting");
            self.view.redirect(&self.login_redirect());
            return Completion::Redirected;
        }

        if !resp.is_success() {
            warn!(status = resp.status, "save search: non-OK status");
            self.view
                .show_error("Failed to save search. Please try again.");
            return Completion::Failed;
        }

        let saved = resp
            .json::<serde_json::Value>()
            .ok()
            .and_then(|v| v.get("success").and_then(|s| s.as_bool()))
            .unwrap_or(false);
        if saved {
            self.view.notify_success("Search saved successfully!");
            Completion::Completed
        } else {
            self.view
                .show_error("Failed to save search. Please try again.");
            Completion::Failed
        }
    }
}
