//! Orchestrates the deploy and clean verbs.
//!
//! The orchestrator is ordered composition with early exit on the first
//! fatal error: create, export, startup wait, floating IP assignment for
//! `deploy`; an optional delete for `clean`. There is no compensating
//! rollback; a failure after the server was created leaves it running.

use thiserror::Error;

use crate::config::{ActionConfig, ConfigError};
use crate::outputs::{
    CiOutput, ENV_SERVER_FLOATING_IPV4, ENV_SERVER_ID, ENV_SERVER_IPV4, OUTPUT_SERVER_ID,
    OutputError,
};
use crate::provider::{Provider, Server};

/// Errors surfaced while performing a deploy or clean.
#[derive(Debug, Error)]
pub enum ActionError<ProviderError>
where
    ProviderError: std::error::Error + 'static,
{
    /// Raised when configuration is missing or malformed. No request has
    /// been made when this is returned.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Raised when creating the server fails.
    #[error("failed to deploy server: {0}")]
    Provision(#[source] ProviderError),
    /// Raised when the created server does not become reachable.
    #[error("server did not become reachable: {0}")]
    Startup(#[source] ProviderError),
    /// Raised when the floating IP assignment fails or times out.
    #[error("floating IP assignment failed: {0}")]
    Assignment(#[source] ProviderError),
    /// Raised when deleting the server fails.
    #[error("failed to delete server: {0}")]
    Teardown(#[source] ProviderError),
    /// Raised when a result cannot be recorded for later pipeline steps.
    #[error("failed to record CI output: {0}")]
    Output(#[from] OutputError),
}

/// Result of a successful deploy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deployment {
    /// The created server.
    pub server: Server,
    /// Address of the assigned floating IP, when one was configured.
    pub floating_ip: Option<String>,
}

/// Result of a clean invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CleanOutcome {
    /// Deletion is disabled; no request was made.
    Skipped,
    /// The server was deleted.
    Deleted {
        /// Id of the deleted server.
        server_id: i64,
    },
}

/// Sequences provider calls and CI output exports for one invocation.
#[derive(Debug)]
pub struct Orchestrator<P, O> {
    provider: P,
    outputs: O,
}

impl<P, O> Orchestrator<P, O>
where
    P: Provider,
    O: CiOutput,
{
    /// Creates a new orchestrator.
    #[must_use]
    pub const fn new(provider: P, outputs: O) -> Self {
        Self { provider, outputs }
    }

    /// Runs the deploy flow: create the server, export its id and address,
    /// wait for startup, then assign the floating IP when one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when configuration validation, any provider
    /// call, or output recording fails. Exports happen immediately after a
    /// successful create, so a later failure still leaves `SERVER_ID` and
    /// `SERVER_IPV4` available to cleanup steps.
    pub async fn deploy(
        &mut self,
        config: &ActionConfig,
    ) -> Result<Deployment, ActionError<P::Error>> {
        let spec = config.server_spec()?;
        let server = self
            .provider
            .create_server(&spec)
            .await
            .map_err(ActionError::Provision)?;

        let server_id = server.id.to_string();
        self.outputs.set_output(OUTPUT_SERVER_ID, &server_id)?;
        self.outputs.export_variable(ENV_SERVER_ID, &server_id)?;
        self.outputs
            .export_variable(ENV_SERVER_IPV4, &server.public_ipv4)?;

        self.provider
            .wait_for_startup(&server)
            .await
            .map_err(ActionError::Startup)?;

        let floating_ip = self
            .provider
            .assign_floating_ip(config.floating_ip_id.as_deref(), &server)
            .await
            .map_err(ActionError::Assignment)?;
        if let Some(address) = &floating_ip {
            self.outputs
                .export_variable(ENV_SERVER_FLOATING_IPV4, address)?;
            tracing::info!(%address, "floating IP assigned");
        }

        Ok(Deployment {
            server,
            floating_ip,
        })
    }

    /// Runs the clean flow: delete the configured server, unless deletion is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when the server id is missing or not numeric,
    /// or when the delete call fails. A disabled delete skips validation
    /// entirely and makes no request.
    pub async fn clean(
        &self,
        config: &ActionConfig,
    ) -> Result<CleanOutcome, ActionError<P::Error>> {
        if !config.delete_server {
            tracing::info!("delete-server disabled; keeping server");
            return Ok(CleanOutcome::Skipped);
        }

        config.validate_clean()?;
        let server_id = config.parsed_server_id()?;
        self.provider
            .delete_server(server_id)
            .await
            .map_err(ActionError::Teardown)?;
        tracing::info!(server_id, "server deleted");
        Ok(CleanOutcome::Deleted { server_id })
    }
}
