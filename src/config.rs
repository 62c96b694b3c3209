//! Client configuration.
//!
//! Defaults mirror the portal's page-level settings; every knob can be
//! overridden through `PORTAL_*` environment variables (read via dotenvy,
//! so a local `.env` works too).

use std::time::Duration;

/// Configuration for the search client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the portal API.
    pub base_url: String,
    /// Results per page for search requests.
    pub per_page: u32,
    /// HTTP request timeout.
    pub request_timeout: Duration,
    /// Quiescence window for suggestion fetching.
    pub suggest_debounce: Duration,
    /// Minimum interval between collection list loads.
    pub collections_min_interval: Duration,
    /// Login route used for auth redirects.
    pub login_path: String,
    /// Path reported as the redirect return target.
    pub current_path: String,
    /// CSRF token embedded in the served page, if any.
    pub page_csrf_token: Option<String>,
    /// Persisted bearer token, if any.
    pub bearer_token: Option<String>,
    /// Whether the session is already authenticated via server-side cookie.
    pub server_authenticated: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            per_page: 10,
            request_timeout: Duration::from_secs(10),
            suggest_debounce: Duration::from_millis(300),
            collections_min_interval: Duration::from_secs(2),
            login_path: "/auth/login".to_string(),
            current_path: "/search".to_string(),
            page_csrf_token: None,
            bearer_token: None,
            server_authenticated: false,
        }
    }
}

impl ClientConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(url) = dotenvy::var("PORTAL_BASE_URL") {
            cfg.base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(val) = dotenvy::var("PORTAL_PER_PAGE")
            && let Ok(n) = val.parse::<u32>()
            && n > 0
        {
            cfg.per_page = n;
        }

        if let Ok(val) = dotenvy::var("PORTAL_TIMEOUT_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            cfg.request_timeout = Duration::from_millis(ms);
        }

        if let Ok(val) = dotenvy::var("PORTAL_SUGGEST_DEBOUNCE_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            cfg.suggest_debounce = Duration::from_millis(ms);
        }

        if let Ok(val) = dotenvy::var("PORTAL_COLLECTIONS_INTERVAL_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            cfg.collections_min_interval = Duration::from_millis(ms);
        }

        if let Ok(token) = dotenvy::var("PORTAL_CSRF_TOKEN") {
            cfg.page_csrf_token = Some(token);
        }

        if let Ok(token) = dotenvy::var("PORTAL_AUTH_TOKEN") {
            cfg.bearer_token = Some(token);
        }

        if let Ok(val) = dotenvy::var("PORTAL_SERVER_AUTH") {
            cfg.server_authenticated = val.eq_ignore_ascii_case("true") || val == "1";
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_match_portal_settings() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.per_page, 10);
        assert_eq!(cfg.suggest_debounce, Duration::from_millis(300));
        assert_eq!(cfg.collections_min_interval, Duration::from_secs(2));
        assert_eq!(cfg.login_path, "/auth/login");
        assert!(!cfg.server_authenticated);
    }

    #[test]
    #[serial]
    fn env_overrides_apply() {
        unsafe {
            std::env::set_var("PORTAL_BASE_URL", "https://portal.example.org/");
            std::env::set_var("PORTAL_PER_PAGE", "25");
            std::env::set_var("PORTAL_SERVER_AUTH", "true");
        }

        let cfg = ClientConfig::from_env();
        assert_eq!(cfg.base_url, "https://portal.example.org");
        assert_eq!(cfg.per_page, 25);
        assert!(cfg.server_authenticated);

        unsafe {
            std::env::remove_var("PORTAL_BASE_URL");
            std::env::remove_var("PORTAL_PER_PAGE");
            std::env::remove_var("PORTAL_SERVER_AUTH");
        }
    }

    #[test]
    #[serial]
    fn invalid_per_page_is_ignored() {
        unsafe {
            std::env::set_var("PORTAL_PER_PAGE", "0");
        }
        let cfg = ClientConfig::from_env();
        assert_eq!(cfg.per_page, 10);
        unsafe {
            std::env::remove_var("PORTAL_PER_PAGE");
        }
    }
}
