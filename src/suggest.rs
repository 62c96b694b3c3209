//! Debounced query suggestions.
//!
//! Cancel-and-replace semantics via a generation counter: each keystroke
//! bumps the generation, sleeps out the quiescence window, and only the
//! call still holding the newest generation fetches. In-flight fetches
//! are never cancelled; stale pending timers simply lose the generation
//! check. Timing is `tokio::time`, so tests run under a paused clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::model::{Category, SuggestResponse, Suggestion};
use crate::tokens::TokenStore;
use crate::transport::{ApiTransport, routes};
use crate::view::SuggestView;

/// Queries shorter than this never hit the network.
const MIN_QUERY_LEN: usize = 2;

pub struct SuggestionController<T: ApiTransport, V: SuggestView> {
    transport: Arc<T>,
    tokens: Arc<TokenStore<T>>,
    view: Arc<V>,
    window: Duration,
    generation: AtomicU64,
}

impl<T: ApiTransport, V: SuggestView> SuggestionController<T, V> {
    pub fn new(transport: Arc<T>, tokens: Arc<TokenStore<T>>, view: Arc<V>, cfg: &ClientConfig) -> Self {
        Self {
            transport,
            tokens,
            view,
            window: cfg.suggest_debounce,
            generation: AtomicU64::new(0),
        }
    }

    /// Handle one keystroke worth of input. Queries under two characters
    /// hide the suggestion display immediately; longer ones fetch after
    /// the quiescence window unless superseded by a newer keystroke.
    pub async fn on_input(&self, query: &str, category: Category) {
        let query = query.trim().to_string();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if query.chars().count() < MIN_QUERY_LEN {
            self.view.hide_suggestions();
            return;
        }

        tokio::time::sleep(self.window).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(query = %query, "suggestion fetch superseded");
            return;
        }

        self.fetch_suggestions(&query, category).await;
    }

    /// Fetch and publish suggestions for the query. Empty lists and all
    /// failures hide the display; failures are logged, never surfaced.
    pub async fn fetch_suggestions(&self, query: &str, category: Category) {
        // The catch-all tab has no concrete suggestion source.
        let collection_type = match category {
            Category::All => Category::ScientificPaper,
            other => other,
        };

        let path = format!(
            "{}?q={}&collection_type={}",
            routes::SUGGEST,
            urlencoding::encode(query),
            urlencoding::encode(collection_type.as_str()),
        );

        let resp = match self.transport.get(&path, &self.tokens.headers()).await {
            Ok(resp) if resp.is_success() => resp,
            Ok(resp) => {
                warn!(status = resp.status, "suggestion fetch: non-OK status");
                self.view.hide_suggestions();
                return;
            }
            Err(e) => {
                warn!("suggestion fetch failed: {e}");
                self.view.hide_suggestions();
                return;
            }
        };

        match resp.json::<SuggestResponse>() {
            Ok(SuggestResponse { suggestions }) if !suggestions.is_empty() => {
                debug!(count = suggestions.len(), "suggestions rendered");
                self.view.render_suggestions(&suggestions);
            }
            Ok(_) => self.view.hide_suggestions(),
            Err(e) => {
                warn!("suggestion fetch: parse failed: {e}");
                self.view.hide_suggestions();
            }
        }
    }

    /// Accept a suggestion: the display is hidden and the chosen text is
    /// returned for the caller to place in the input and search with.
    pub fn select(&self, suggestion: &Suggestion) -> String {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.view.hide_suggestions();
        suggestion.text.clone()
    }
}
