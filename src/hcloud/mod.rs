//! Hetzner Cloud implementation of the provider seam.

mod client;
mod error;
mod floating_ip;
mod image;
mod server;
mod types;

use std::time::Duration;

use crate::config::ActionConfig;
use crate::provider::{Provider, ProviderFuture, Server, ServerSpec};

pub use error::HcloudApiError;

const API_BASE: &str = "https://api.hetzner.cloud/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_SSH_PORT: u16 = 22;

/// Provider backed by the Hetzner Cloud REST API.
#[derive(Clone, Debug)]
pub struct HcloudApi {
    http: reqwest::Client,
    token: String,
    base_url: String,
    ssh_port: u16,
    poll_interval: Duration,
    assignment_timeout: Duration,
    startup_timeout: Duration,
}

impl HcloudApi {
    /// Constructs a provider from configuration. Token validation is left to
    /// the per-verb configuration checks so a skipped clean never demands
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns [`HcloudApiError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(config: &ActionConfig) -> Result<Self, HcloudApiError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| HcloudApiError::Transport {
                message: err.to_string(),
            })?;
        Ok(Self {
            http,
            token: config.token.clone(),
            base_url: API_BASE.to_owned(),
            ssh_port: DEFAULT_SSH_PORT,
            poll_interval: POLL_INTERVAL,
            assignment_timeout: Duration::from_millis(config.floating_ip_assignment_timeout),
            startup_timeout: Duration::from_millis(config.startup_timeout),
        })
    }

    /// Overrides the API base URL. Used by tests and self-hosted mirrors.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Overrides the fixed interval between polls.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the floating IP assignment timeout.
    #[must_use]
    pub const fn with_assignment_timeout(mut self, timeout: Duration) -> Self {
        self.assignment_timeout = timeout;
        self
    }
}

impl Provider for HcloudApi {
    type Error = HcloudApiError;

    fn create_server<'a>(
        &'a self,
        spec: &'a ServerSpec,
    ) -> ProviderFuture<'a, Server, Self::Error> {
        Box::pin(async move { self.create(spec).await })
    }

    fn wait_for_startup<'a>(
        &'a self,
        server: &'a Server,
    ) -> ProviderFuture<'a, (), Self::Error> {
        Box::pin(async move { self.wait_reachable(server).await })
    }

    fn assign_floating_ip<'a>(
        &'a self,
        floating_ip_id: Option<&'a str>,
        server: &'a Server,
    ) -> ProviderFuture<'a, Option<String>, Self::Error> {
        Box::pin(async move { self.assign_ip(floating_ip_id, server).await })
    }

    fn delete_server(&self, server_id: i64) -> ProviderFuture<'_, (), Self::Error> {
        Box::pin(async move { self.remove(server_id).await })
    }
}
