//! Dynamic filter option population.
//!
//! The clinical-study page offers server-driven option lists (currently
//! the drug filter). Failures here are logged and otherwise ignored: a
//! missing option list degrades the form, it does not block searching.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::Category;
use crate::tokens::TokenStore;
use crate::transport::{ApiTransport, routes};
use crate::view::FilterView;

pub struct FilterCatalog<T: ApiTransport, V: FilterView> {
    transport: Arc<T>,
    tokens: Arc<TokenStore<T>>,
    view: Arc<V>,
}

impl<T: ApiTransport, V: FilterView> FilterCatalog<T, V> {
    pub fn new(transport: Arc<T>, tokens: Arc<TokenStore<T>>, view: Arc<V>) -> Self {
        Self {
            transport,
            tokens,
            view,
        }
    }

    /// Fetch and publish option lists for the category. Only the
    /// clinical-study page has dynamic filters.
    pub async fn populate(&self, category: Category) {
        if category != Category::ClinicalStudy {
            return;
        }

        let path = format!(
            "{}?collection_type={}",
            routes::FILTERS,
            urlencoding::encode(category.as_str())
        );
        let resp = match self.transport.get(&path, &self.tokens.headers()).await {
            Ok(resp) if resp.is_success() => resp,
            Ok(resp) => {
                warn!(status = resp.status, "filter fetch: non-OK status");
                return;
            }
            Err(e) => {
                warn!("filter fetch failed: {e}");
                return;
            }
        };

        let value: serde_json::Value = match resp.json() {
            Ok(value) => value,
            Err(e) => {
                warn!("filter fetch: parse failed: {e}");
                return;
            }
        };

        let Some(map) = value.as_object() else {
            warn!("filter fetch: unexpected shape");
            return;
        };

        for (key, options) in map {
            let Some(items) = options.as_array() else {
                continue;
            };
            let options: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if options.is_empty() {
                continue;
            }
            debug!(key = %key, count = options.len(), "filter options rendered");
            self.view.render_filter_options(key, &options);
        }
    }
}
