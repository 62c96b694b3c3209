//! Saved-collections flows: guarded list loading plus the add-to-collection
//! and create operations. All of them are auth-gated; an unauthenticated
//! call redirects to login and aborts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::controller::Completion;
use crate::model::Collection;
use crate::tokens::TokenStore;
use crate::transport::{ApiTransport, routes};
use crate::view::CollectionsView;

const LOAD_ERROR: &str = "Error loading collections. Please try again.";

pub struct CollectionLoader<T: ApiTransport, V: CollectionsView> {
    transport: Arc<T>,
    tokens: Arc<TokenStore<T>>,
    view: Arc<V>,
    min_interval: Duration,
    login_path: String,
    loading: AtomicBool,
    last_load: Mutex<Option<Instant>>,
}

impl<T: ApiTransport, V: CollectionsView> CollectionLoader<T, V> {
    pub fn new(transport: Arc<T>, tokens: Arc<TokenStore<T>>, view: Arc<V>, cfg: &ClientConfig) -> Self {
        Self {
            transport,
            tokens,
            view,
            min_interval: cfg.collections_min_interval,
            login_path: cfg.login_path.clone(),
            loading: AtomicBool::new(false),
            last_load: Mutex::new(None),
        }
    }

    fn login_redirect(&self) -> String {
        format!("{}?next=/collections", self.login_path)
    }

    /// Load the collection list. Calls within the minimum interval of the
    /// last actual load, or while one is in flight, are dropped.
    pub async fn load(&self) -> Completion {
        if self.loading.swap(true, Ordering::SeqCst) {
            debug!("collections load dropped: already in flight");
            return Completion::Dropped;
        }

        let now = Instant::now();
        let within_window = self
            .last_load
            .lock()
            .is_some_and(|last| now.duration_since(last) < self.min_interval);
        if within_window {
            debug!("collections load dropped: within debounce window");
            self.loading.store(false, Ordering::SeqCst);
            return Completion::Dropped;
        }

        if !self.tokens.is_authenticated() {
            self.loading.store(false, Ordering::SeqCst);
            self.view.redirect(&self.login_redirect());
            return Completion::Redirected;
        }

        *self.last_load.lock() = Some(now);

        let completion = self.fetch_and_publish().await;
        self.loading.store(false, Ordering::SeqCst);
        completion
    }

    async fn fetch_and_publish(&self) -> Completion {
        let resp = match self
            .transport
            .get(routes::COLLECTIONS, &self.tokens.headers())
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("collections load failed: {e}");
                self.view.collections_error(LOAD_ERROR);
                return Completion::Failed;
            }
        };

        if resp.status == 401 && !self.tokens.server_authenticated() {
            info!("collections load: authentication required, redirecting");
            self.view.redirect(&self.login_redirect());
            return Completion::Redirected;
        }

        if !resp.is_success() {
            warn!(status = resp.status, "collections load: non-OK status");
            self.view.collections_error(LOAD_ERROR);
            return Completion::Failed;
        }

        match resp.json::<Vec<Collection>>() {
            Ok(collections) if collections.is_empty() => {
                self.view.collections_empty();
                Completion::Completed
            }
            Ok(collections) => {
                debug!(count = collections.len(), "collections rendered");
                self.view.render_collections(&collections);
                Completion::Completed
            }
            Err(e) => {
                warn!("collections load: parse failed: {e}");
                self.view.collections_error(LOAD_ERROR);
                Completion::Failed
            }
        }
    }

    /// Add the selected items to a collection. An empty selection is a
    /// user error, not a request.
    pub async fn add_items(&self, collection_id: i64, item_ids: &[String]) -> Completion {
        if !self.tokens.is_authenticated() {
            self.view.redirect(&self.login_redirect());
            return Completion::Redirected;
        }
        if item_ids.is_empty() {
            self.view.show_error("No items selected to add to collection");
            return Completion::Failed;
        }

        let path = format!("{}/{}/items", routes::COLLECTIONS, collection_id);
        let body = json!({ "item_ids": item_ids });
        match self.transport.post(&path, &body, &self.tokens.headers()).await {
            Ok(resp) if resp.is_success() => {
                self.view
                    .notify_success("Items added to collection successfully");
                Completion::Completed
            }
            Ok(resp) => {
                warn!(status = resp.status, "add to collection: non-OK status");
                self.view.show_error("Failed to add items to collection");
                Completion::Failed
            }
            Err(e) => {
                warn!("add to collection failed: {e}");
                self.view.show_error("Failed to add items to collection");
                Completion::Failed
            }
        }
    }

    /// Create a new collection. A blank title is a user error, not a
    /// request.
    pub async fn create(&self, title: &str, description: Option<&str>) -> Completion {
        if !self.tokens.is_authenticated() {
            self.view.redirect(&self.login_redirect());
            return Completion::Redirected;
        }
        let title = title.trim();
        if title.is_empty() {
            self.view.show_error("Title is required");
            return Completion::Failed;
        }

        let body = json!({
            "title": title,
            "description": description.map(str::trim).filter(|d| !d.is_empty()),
        });
        match self
            .transport
            .post(routes::COLLECTIONS, &body, &self.tokens.headers())
            .await
        {
            Ok(resp) if resp.is_success() => {
                self.view.notify_success("Collection created successfully");
                Completion::Completed
            }
            Ok(resp) => {
                let message = resp
                    .detail()
                    .unwrap_or_else(|| "Failed to create collection. Please try again.".into());
                warn!(status = resp.status, "create collection: non-OK status");
                self.view.show_error(&message);
                Completion::Failed
            }
            Err(e) => {
                warn!("create collection failed: {e}");
                self.view
                    .show_error("Failed to create collection. Please try again.");
                Completion::Failed
            }
        }
    }
}
