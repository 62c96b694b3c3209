//! CSRF and bearer token bookkeeping.
//!
//! The CSRF token has two sources: the value embedded in the served page
//! (authoritative) and a session-scoped cache that `refresh_csrf`
//! overwrites. The bearer token comes from persistent client storage, or
//! is replaced by a sentinel when the session is already authenticated
//! through a server-side cookie, in which case no Authorization header is
//! ever emitted.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::transport::{ApiTransport, RequestHeaders, routes};

/// Auth source for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthToken {
    /// Authenticated via server-side cookie; no bearer header needed.
    ServerSession,
    Bearer(String),
}

#[derive(Debug, Deserialize)]
struct CsrfTokenResponse {
    csrf_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BearerTokenResponse {
    token: Option<String>,
}

pub struct TokenStore<T: ApiTransport> {
    transport: Arc<T>,
    page_csrf: Option<String>,
    session_csrf: Mutex<Option<String>>,
    bearer: Mutex<Option<String>>,
    server_authenticated: bool,
}

impl<T: ApiTransport> TokenStore<T> {
    pub fn new(transport: Arc<T>, cfg: &ClientConfig) -> Self {
        Self {
            transport,
            page_csrf: cfg.page_csrf_token.clone(),
            session_csrf: Mutex::new(None),
            bearer: Mutex::new(cfg.bearer_token.clone()),
            server_authenticated: cfg.server_authenticated,
        }
    }

    /// Last known CSRF token, preferring the page-embedded value over the
    /// session cache.
    pub fn csrf(&self) -> Option<String> {
        self.page_csrf
            .clone()
            .or_else(|| self.session_csrf.lock().clone())
    }

    /// Fetch a fresh CSRF token. On success the session cache is
    /// overwritten; on any failure the cache is left untouched and the
    /// call reports false. Never propagates an error.
    pub async fn refresh_csrf(&self) -> bool {
        let resp = match self
            .transport
            .get(routes::CSRF_TOKEN, &RequestHeaders::default())
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("csrf refresh: request failed: {e}");
                return false;
            }
        };

        if !resp.is_success() {
            warn!(status = resp.status, "csrf refresh: non-OK status");
            return false;
        }

        match resp.json::<CsrfTokenResponse>() {
            Ok(CsrfTokenResponse {
                csrf_token: Some(token),
            }) => {
                debug!("csrf refresh: token updated");
                *self.session_csrf.lock() = Some(token);
                true
            }
            Ok(_) => {
                warn!("csrf refresh: no token in response");
                false
            }
            Err(e) => {
                warn!("csrf refresh: parse failed: {e}");
                false
            }
        }
    }

    /// Auth source: sentinel when server-authenticated, else the stored
    /// bearer token, else none.
    pub fn auth(&self) -> Option<AuthToken> {
        if self.server_authenticated {
            return Some(AuthToken::ServerSession);
        }
        self.bearer.lock().clone().map(AuthToken::Bearer)
    }

    /// True when any auth source is available.
    pub fn is_authenticated(&self) -> bool {
        self.auth().is_some()
    }

    pub fn server_authenticated(&self) -> bool {
        self.server_authenticated
    }

    /// Headers for an authenticated request. The Authorization header is
    /// only emitted for a real bearer token, never for the sentinel.
    pub fn headers(&self) -> RequestHeaders {
        let bearer = match self.auth() {
            Some(AuthToken::Bearer(token)) => Some(token),
            _ => None,
        };
        RequestHeaders {
            csrf: self.csrf(),
            bearer,
        }
    }

    /// Fetch a bearer token from the server and store it for future
    /// requests. Returns the token on success.
    pub async fn fetch_bearer(&self) -> Option<String> {
        let headers = RequestHeaders {
            csrf: self.csrf(),
            bearer: None,
        };
        let resp = match self.transport.get(routes::GET_TOKEN, &headers).await {
            Ok(resp) if resp.is_success() => resp,
            Ok(resp) => {
                debug!(status = resp.status, "token fetch: non-OK status");
                return None;
            }
            Err(e) => {
                warn!("token fetch failed: {e}");
                return None;
            }
        };

        match resp.json::<BearerTokenResponse>() {
            Ok(BearerTokenResponse { token: Some(token) }) => {
                debug!("bearer token fetched and stored");
                *self.bearer.lock() = Some(token.clone());
                Some(token)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::ApiResponse;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::future::Future;

    /// Transport returning a scripted queue of responses.
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<ApiResponse, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn next(&self, path: &str) -> Result<ApiResponse, TransportError> {
            self.calls.lock().push(path.to_string());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Unavailable("script exhausted".into())))
        }
    }

    impl ApiTransport for ScriptedTransport {
        fn get(
            &self,
            path_and_query: &str,
            _headers: &RequestHeaders,
        ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
            let reply = self.next(path_and_query);
            async move { reply }
        }

        fn post(
            &self,
            path: &str,
            _body: &serde_json::Value,
            _headers: &RequestHeaders,
        ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
            let reply = self.next(path);
            async move { reply }
        }
    }

    fn ok(body: &str) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn store_with(
        replies: Vec<Result<ApiResponse, TransportError>>,
        cfg: ClientConfig,
    ) -> TokenStore<ScriptedTransport> {
        TokenStore::new(Arc::new(ScriptedTransport::new(replies)), &cfg)
    }

    #[test]
    fn page_token_preferred_over_session_cache() {
        let cfg = ClientConfig {
            page_csrf_token: Some("page-token".into()),
            ..ClientConfig::default()
        };
        let store = store_with(vec![], cfg);
        *store.session_csrf.lock() = Some("session-token".into());
        assert_eq!(store.csrf().as_deref(), Some("page-token"));
    }

    #[tokio::test]
    async fn refresh_overwrites_session_cache() {
        let store = store_with(
            vec![ok(r#"{"csrf_token": "fresh"}"#)],
            ClientConfig::default(),
        );
        assert!(store.refresh_csrf().await);
        assert_eq!(store.csrf().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn failed_refresh_leaves_cache_untouched() {
        let store = store_with(
            vec![
                ok(r#"{"csrf_token": "first"}"#),
                Err(TransportError::Unavailable("offline".into())),
                ok(r#"{"nope": true}"#),
            ],
            ClientConfig::default(),
        );
        assert!(store.refresh_csrf().await);
        assert!(!store.refresh_csrf().await);
        assert!(!store.refresh_csrf().await);
        assert_eq!(store.csrf().as_deref(), Some("first"));
    }

    #[test]
    fn sentinel_suppresses_bearer_header() {
        let cfg = ClientConfig {
            server_authenticated: true,
            bearer_token: Some("should-not-be-sent".into()),
            page_csrf_token: Some("tok".into()),
            ..ClientConfig::default()
        };
        let store = store_with(vec![], cfg);
        assert_eq!(store.auth(), Some(AuthToken::ServerSession));
        let headers = store.headers();
        assert_eq!(headers.csrf.as_deref(), Some("tok"));
        assert!(headers.bearer.is_none());
    }

    #[test]
    fn real_bearer_token_is_emitted() {
        let cfg = ClientConfig {
            bearer_token: Some("jwt-123".into()),
            ..ClientConfig::default()
        };
        let store = store_with(vec![], cfg);
        assert_eq!(store.headers().bearer.as_deref(), Some("jwt-123"));
    }

    #[tokio::test]
    async fn fetch_bearer_stores_token() {
        let store = store_with(vec![ok(r#"{"token": "jwt-456"}"#)], ClientConfig::default());
        assert!(!store.is_authenticated());
        assert_eq!(store.fetch_bearer().await.as_deref(), Some("jwt-456"));
        assert!(store.is_authenticated());
        assert_eq!(store.headers().bearer.as_deref(), Some("jwt-456"));
    }
}
