//! Redirect-target construction for the SSO round trip.
//!
//! The service URL sent at login must match the one sent at validation
//! byte-for-byte (the SSO server compares them), so the preserved-original
//! `redirect` parameter is folded into the service URL in exactly one place.

use url::Url;

use crate::config::{Config, ConfigError};

/// Query parameter on the callback URL preserving where the user was headed.
pub const REDIRECT_PARAMETER: &str = "redirect";

#[derive(Debug, Clone)]
pub struct SsoUrls {
    login_url: Url,
    service_callback: Url,
    login_failure: Url,
    logout: Url,
}

impl SsoUrls {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let base = config.sso_server_prefix.as_str().trim_end_matches('/');
        let login_url = Url::parse(&format!("{base}/login"))
            .map_err(|_| ConfigError::Invalid("SSO_SERVER_PREFIX"))?;

        Ok(Self {
            login_url,
            service_callback: config.service_callback_url.clone(),
            login_failure: config.login_failure_url.clone(),
            logout: config.logout_url.clone(),
        })
    }

    /// Callback URL the SSO server redirects the ticket to, carrying the
    /// preserved original path when there is one.
    pub fn service_url(&self, redirect: Option<&str>) -> Url {
        let mut url = self.service_callback.clone();
        if let Some(target) = redirect {
            url.query_pairs_mut().append_pair(REDIRECT_PARAMETER, target);
        }
        url
    }

    /// SSO login page with this application as the `service` target.
    pub fn login_redirect(&self, original: Option<&str>) -> Url {
        let service = self.service_url(original);
        let mut url = self.login_url.clone();
        url.query_pairs_mut().append_pair("service", service.as_str());
        url
    }

    pub fn login_failure(&self) -> &Url {
        &self.login_failure
    }

    pub fn logout(&self) -> &Url {
        &self.logout
    }
}

/// Only same-origin absolute paths may be used as post-login targets;
/// anything else would turn the callback into an open redirect.
pub fn safe_redirect_target(raw: &str) -> Option<&str> {
    if raw.starts_with('/') && !raw.starts_with("//") {
        Some(raw)
    } else {
        None
    }
}
