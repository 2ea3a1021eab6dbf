//! Connection configuration

use std::env;

/// How the client authenticates against the EWS endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No explicit credentials; requests carry the transport's default
    /// identity (no `Authorization` header).
    Default,
    /// Explicit user/password pair sent as HTTP basic auth.
    Basic { user: String, password: String },
}

/// Connection settings for one mailbox scan.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// SMTP address of the mailbox to scan.
    pub mailbox: String,
    /// Explicit EWS endpoint URL. `None` means autodiscovery.
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Act as the mailbox owner instead of the authenticated principal.
    pub impersonate: bool,
    /// Follow autodiscover redirects (secure targets only).
    pub allow_redirect: bool,
    /// Accept any TLS certificate.
    pub ignore_certificates: bool,
}

impl ConnectConfig {
    #[must_use]
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
            url: None,
            user: None,
            password: None,
            impersonate: false,
            allow_redirect: false,
            ignore_certificates: false,
        }
    }

    /// Fill in user and password from `EWS_USER` / `EWS_PASSWORD` when
    /// they were not given explicitly.
    ///
    /// Reads from a `.env` file if present.
    #[must_use]
    pub fn with_env_credentials(mut self) -> Self {
        dotenvy::dotenv().ok();

        if self.user.is_none() {
            self.user = env::var("EWS_USER").ok();
        }
        if self.password.is_none() {
            self.password = env::var("EWS_PASSWORD").ok();
        }
        self
    }

    /// Resolve the credentials to use for this connection.
    ///
    /// An explicit pair is used only when both user and password are
    /// present; otherwise the transport default applies.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Credentials::Basic {
                user: user.clone(),
                password: password.clone(),
            },
            _ => Credentials::Default,
        }
    }
}
