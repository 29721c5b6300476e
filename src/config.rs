//! Configuration loading via `ortho-config`.

use crate::provider::{ImageRef, ImageSelector, ImageType, ServerSpec};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Action configuration derived from environment variables, configuration
/// files, and defaults.
///
/// All options map to `HCLOUD_*` environment variables; a CI pipeline sets
/// them once per job and invokes `deploy` or `clean`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "HCLOUD")]
pub struct ActionConfig {
    /// API token used for authentication against the Hetzner Cloud API.
    #[ortho_config(default = String::new())]
    pub token: String,
    /// Name for the server created by `deploy`.
    #[ortho_config(default = String::new())]
    pub server_name: String,
    /// Server type to request (for example `cx22`).
    #[ortho_config(default = String::new())]
    pub server_type: String,
    /// Optional location for the new server (for example `nbg1`).
    pub server_location: Option<String>,
    /// Name of the provider-registered SSH key installed on the server.
    #[ortho_config(default = String::new())]
    pub ssh_key_name: String,
    /// Image name to boot from, or the description to match when
    /// `image_type` selects a category.
    #[ortho_config(default = String::new())]
    pub image_identifier: String,
    /// Optional label key an image must carry to be considered.
    pub image_label: Option<String>,
    /// Image category to resolve from (`backup`, `system`, or `snapshot`).
    /// Empty means `image_identifier` is used verbatim.
    pub image_type: Option<String>,
    /// Id of the server to delete during `clean`.
    pub server_id: Option<String>,
    /// Whether `clean` actually deletes the server. Defaults to keeping it.
    #[ortho_config(default = false)]
    pub delete_server: bool,
    /// Id of a pre-existing floating IP to assign after deploy. Absent means
    /// the assignment is skipped.
    pub floating_ip_id: Option<String>,
    /// Upper bound in milliseconds for the floating IP assignment to reach a
    /// terminal state.
    #[ortho_config(default = 60_000)]
    pub floating_ip_assignment_timeout: u64,
    /// Upper bound in milliseconds for the new server to become reachable.
    /// Zero disables the startup wait.
    #[ortho_config(default = 0)]
    pub startup_timeout: u64,
}

/// Metadata for a configuration field, used to generate actionable error
/// messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str) -> Self {
        Self {
            description,
            env_var,
        }
    }
}

impl ActionConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {}",
                metadata.description, metadata.env_var
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("hcloud-deploy")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation of the fields the `deploy` verb needs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::InvalidValue`] when `image_type` is not a known
    /// category.
    pub fn validate_deploy(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.token,
            &FieldMetadata::new("Hetzner Cloud API token", "HCLOUD_TOKEN"),
        )?;
        Self::require_field(
            &self.server_name,
            &FieldMetadata::new("server name", "HCLOUD_SERVER_NAME"),
        )?;
        Self::require_field(
            &self.server_type,
            &FieldMetadata::new("server type", "HCLOUD_SERVER_TYPE"),
        )?;
        Self::require_field(
            &self.ssh_key_name,
            &FieldMetadata::new("SSH key name", "HCLOUD_SSH_KEY_NAME"),
        )?;
        Self::require_field(
            &self.image_identifier,
            &FieldMetadata::new("image identifier", "HCLOUD_IMAGE_IDENTIFIER"),
        )?;
        self.image_ref().map(|_| ())
    }

    /// Performs semantic validation of the fields a deleting `clean` needs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the API token is empty.
    pub fn validate_clean(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.token,
            &FieldMetadata::new("Hetzner Cloud API token", "HCLOUD_TOKEN"),
        )
    }

    /// Builds the boot image reference from `image_type`, `image_label`, and
    /// `image_identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `image_type` is set but is
    /// not a known category.
    pub fn image_ref(&self) -> Result<ImageRef, ConfigError> {
        let identifier = self.image_identifier.trim().to_owned();
        let configured_type = self
            .image_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match configured_type {
            None => Ok(ImageRef::Name(identifier)),
            Some(raw) => {
                let image_type = raw
                    .parse::<ImageType>()
                    .map_err(|err| ConfigError::InvalidValue(err.to_string()))?;
                Ok(ImageRef::Selector(ImageSelector {
                    image_type,
                    label: self
                        .image_label
                        .as_deref()
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                        .map(str::to_owned),
                    description: identifier,
                }))
            }
        }
    }

    /// Builds a [`ServerSpec`] from the deploy configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn server_spec(&self) -> Result<ServerSpec, ConfigError> {
        self.validate_deploy()?;
        ServerSpec::builder()
            .name(&self.server_name)
            .image(self.image_ref()?)
            .server_type(&self.server_type)
            .ssh_key_name(&self.ssh_key_name)
            .location(self.server_location.clone())
            .build()
            .map_err(|err| ConfigError::InvalidValue(err.to_string()))
    }

    /// Parses the configured server id for the `clean` verb.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when no id is configured and
    /// [`ConfigError::InvalidValue`] when the id is not numeric.
    pub fn parsed_server_id(&self) -> Result<i64, ConfigError> {
        let raw = self
            .server_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ConfigError::MissingField(String::from(
                    "missing server id: set HCLOUD_SERVER_ID",
                ))
            })?;
        raw.parse::<i64>()
            .map_err(|_| ConfigError::InvalidValue(format!("server id '{raw}' is not numeric")))
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configured value could not be interpreted.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
