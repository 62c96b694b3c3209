//! HTTP transport seam.
//!
//! Controllers talk to [`ApiTransport`] so the orchestration logic can be
//! exercised against a scripted transport in tests. [`HttpTransport`] is
//! the reqwest-backed implementation used by the binary.

use std::future::Future;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::TransportError;

/// API routes, relative to the configured base URL.
pub mod routes {
    pub const SEARCH: &str = "/api/search";
    pub const SUGGEST: &str = "/api/suggest";
    pub const CSRF_TOKEN: &str = "/api/auth/csrf-token";
    pub const GET_TOKEN: &str = "/auth/get-token";
    pub const COLLECTIONS: &str = "/api/collections";
    pub const SEARCH_HISTORY: &str = "/api/search-history";
    pub const FILTERS: &str = "/api/filters";
}

/// Auth bookkeeping attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    /// Sent as `X-CSRF-Token` when present.
    pub csrf: Option<String>,
    /// Sent as `Authorization: Bearer <token>` when present. Never set
    /// for server-cookie sessions.
    pub bearer: Option<String>,
}

/// Raw HTTP reply: status plus body text. Status interpretation (401,
/// 403+CSRF, ...) belongs to the controllers.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// The `detail` field of an error body, if the body is JSON and has one.
    pub fn detail(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        value.get("detail")?.as_str().map(str::to_string)
    }
}

pub trait ApiTransport: Send + Sync {
    fn get(
        &self,
        path_and_query: &str,
        headers: &RequestHeaders,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;

    fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
        headers: &RequestHeaders,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(cfg: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .user_agent(concat!("psearch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn apply_headers(
        &self,
        req: reqwest::RequestBuilder,
        headers: &RequestHeaders,
    ) -> reqwest::RequestBuilder {
        let mut req = req;
        if let Some(csrf) = &headers.csrf {
            req = req.header("X-CSRF-Token", csrf);
        }
        if let Some(bearer) = &headers.bearer {
            req = req.header("Authorization", format!("Bearer {bearer}"));
        }
        req
    }

    async fn finish(&self, req: reqwest::RequestBuilder) -> Result<ApiResponse, TransportError> {
        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status = status, body_len = body.len(), "api response");
        Ok(ApiResponse { status, body })
    }
}

impl ApiTransport for HttpTransport {
    fn get(
        &self,
        path_and_query: &str,
        headers: &RequestHeaders,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
        async move {
            let url = format!("{}{}", self.base_url, path_and_query);
            debug!(url = %url, "GET");
            let req = self.apply_headers(self.client.get(&url), headers);
            self.finish(req).await
        }
    }

    fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
        headers: &RequestHeaders,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
        async move {
            let url = format!("{}{}", self.base_url, path);
            debug!(url = %url, "POST");
            let req = self.apply_headers(self.client.post(&url).json(body), headers);
            self.finish(req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_window_is_2xx() {
        let ok = ApiResponse {
            status: 204,
            body: String::new(),
        };
        assert!(ok.is_success());
        let redirect = ApiResponse {
            status: 302,
            body: String::new(),
        };
        assert!(!redirect.is_success());
    }

    #[test]
    fn detail_extracts_json_field() {
        let resp = ApiResponse {
            status: 403,
            body: r#"{"detail": "CSRF token missing"}"#.into(),
        };
        assert_eq!(resp.detail().as_deref(), Some("CSRF token missing"));

        let not_json = ApiResponse {
            status: 500,
            body: "<html>oops</html>".into(),
        };
        assert_eq!(not_json.detail(), None);
    }

    #[test]
    fn transport_strips_trailing_slash() {
        let cfg = ClientConfig {
            base_url: "http://localhost:8000/".into(),
            ..ClientConfig::default()
        };
        let transport = HttpTransport::new(&cfg).unwrap();
        assert_eq!(transport.base_url, "http://localhost:8000");
    }
}
