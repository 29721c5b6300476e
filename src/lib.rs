//! Core library for the `hcloud-deploy` CI action.
//!
//! The crate provisions a Hetzner Cloud server for a pipeline run,
//! optionally resolving its boot image from a named snapshot and assigning a
//! pre-existing floating IP to it, and tears the server down again on
//! request. Results are exported through a CI output boundary so later
//! pipeline steps can pick them up.

pub mod action;
pub mod config;
pub mod hcloud;
pub mod outputs;
pub mod provider;
pub mod test_support;

pub use action::{ActionError, CleanOutcome, Deployment, Orchestrator};
pub use config::{ActionConfig, ConfigError};
pub use hcloud::{HcloudApi, HcloudApiError};
pub use outputs::{CiOutput, GithubOutput, OutputError};
pub use provider::{
    ImageRef, ImageSelector, ImageType, Provider, ProviderFuture, Server, ServerSpec, SpecError,
};
