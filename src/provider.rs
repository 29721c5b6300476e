//! Provider abstraction for the deploy/clean lifecycle.
//!
//! The orchestrator in [`crate::action`] is generic over this seam so tests
//! can drive it with scripted doubles instead of live HTTP calls.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Disk-image categories offered by the provider.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// Automated backup of an existing server.
    Backup,
    /// Provider-maintained base system image.
    System,
    /// User-created snapshot.
    Snapshot,
    /// Any category this tool does not select from. Present so listings that
    /// contain other categories still decode; never matches a configured
    /// filter.
    #[serde(other)]
    Other,
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Backup => "backup",
            Self::System => "system",
            Self::Snapshot => "snapshot",
            Self::Other => "unknown",
        };
        f.write_str(name)
    }
}

impl FromStr for ImageType {
    type Err = SpecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "backup" => Ok(Self::Backup),
            "system" => Ok(Self::System),
            "snapshot" => Ok(Self::Snapshot),
            other => Err(SpecError::UnknownImageType(other.to_owned())),
        }
    }
}

/// Filters used to resolve a boot image from the provider's image listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageSelector {
    /// Image category the candidate must belong to.
    pub image_type: ImageType,
    /// When set, the candidate must carry this label key (value ignored).
    pub label: Option<String>,
    /// Exact description the candidate must match, case-sensitively.
    pub description: String,
}

/// Boot image reference: either usable directly or requiring resolution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImageRef {
    /// Image name or id passed through to the create call verbatim.
    Name(String),
    /// Selector resolved against the provider's image listing before use.
    Selector(ImageSelector),
}

/// Parameters required to create a new server.
///
/// Built once from configuration at invocation start and consumed by a
/// single create call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerSpec {
    /// Name for the new server.
    pub name: String,
    /// Boot image reference.
    pub image: ImageRef,
    /// Provider server type (for example `cx22`).
    pub server_type: String,
    /// Name of a provider-registered SSH key installed on the server.
    pub ssh_key_name: String,
    /// Optional location or datacenter name.
    pub location: Option<String>,
}

impl ServerSpec {
    /// Starts a builder for a [`ServerSpec`].
    #[must_use]
    pub fn builder() -> ServerSpecBuilder {
        ServerSpecBuilder::default()
    }

    /// Validates the spec, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::MissingField`] when any required field is empty.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.name.is_empty() {
            return Err(SpecError::MissingField("name".to_owned()));
        }
        if self.server_type.is_empty() {
            return Err(SpecError::MissingField("server_type".to_owned()));
        }
        if self.ssh_key_name.is_empty() {
            return Err(SpecError::MissingField("ssh_key_name".to_owned()));
        }
        match &self.image {
            ImageRef::Name(name) if name.is_empty() => {
                Err(SpecError::MissingField("image".to_owned()))
            }
            ImageRef::Selector(selector) if selector.description.is_empty() => {
                Err(SpecError::MissingField("image description".to_owned()))
            }
            _ => Ok(()),
        }
    }
}

/// Builder for [`ServerSpec`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServerSpecBuilder {
    name: String,
    image: Option<ImageRef>,
    server_type: String,
    ssh_key_name: String,
    location: Option<String>,
}

impl ServerSpecBuilder {
    /// Sets the server name.
    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = value.into();
        self
    }

    /// Sets the boot image reference.
    #[must_use]
    pub fn image(mut self, value: ImageRef) -> Self {
        self.image = Some(value);
        self
    }

    /// Sets the server type.
    #[must_use]
    pub fn server_type(mut self, value: impl Into<String>) -> Self {
        self.server_type = value.into();
        self
    }

    /// Sets the SSH key name.
    #[must_use]
    pub fn ssh_key_name(mut self, value: impl Into<String>) -> Self {
        self.ssh_key_name = value.into();
        self
    }

    /// Sets the optional location.
    #[must_use]
    pub fn location(mut self, value: Option<String>) -> Self {
        self.location = value;
        self
    }

    /// Builds and validates the [`ServerSpec`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::MissingField`] when any required field is empty.
    pub fn build(self) -> Result<ServerSpec, SpecError> {
        let image = self
            .image
            .ok_or_else(|| SpecError::MissingField("image".to_owned()))?;
        let spec = ServerSpec {
            name: self.name.trim().to_owned(),
            image,
            server_type: self.server_type.trim().to_owned(),
            ssh_key_name: self.ssh_key_name.trim().to_owned(),
            location: self.location.map(|value| value.trim().to_owned()),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Server created by the provider on a successful deploy.
///
/// The id is the join key for floating-IP assignment and the later delete
/// call; this tool does not retain it beyond the invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Server {
    /// Provider-assigned numeric identifier.
    pub id: i64,
    /// Public IPv4 address assigned by the provider.
    pub public_ipv4: String,
}

/// Errors raised while building or validating provider inputs.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SpecError {
    /// Raised when a required field is empty.
    #[error("missing or empty field: {0}")]
    MissingField(String),
    /// Raised when the configured image type is not a known category.
    #[error("unknown image type '{0}' (expected backup, system, or snapshot)")]
    UnknownImageType(String),
}

/// Future returned by provider operations.
pub type ProviderFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by cloud providers.
pub trait Provider {
    /// Provider specific error type returned by the operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a new server, resolving the image reference when necessary.
    fn create_server<'a>(
        &'a self,
        spec: &'a ServerSpec,
    ) -> ProviderFuture<'a, Server, Self::Error>;

    /// Waits until the new server is reachable over the network. Providers
    /// may make this a no-op when no startup wait is configured.
    fn wait_for_startup<'a>(&'a self, server: &'a Server)
    -> ProviderFuture<'a, (), Self::Error>;

    /// Assigns a pre-existing floating IP to the server and returns its
    /// address. `floating_ip_id` is the raw configured value: `None` or
    /// blank skips the assignment entirely and resolves to `Ok(None)`.
    fn assign_floating_ip<'a>(
        &'a self,
        floating_ip_id: Option<&'a str>,
        server: &'a Server,
    ) -> ProviderFuture<'a, Option<String>, Self::Error>;

    /// Deletes a server by id.
    fn delete_server(&self, server_id: i64) -> ProviderFuture<'_, (), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> ImageSelector {
        ImageSelector {
            image_type: ImageType::Snapshot,
            label: None,
            description: "snapshot3".to_owned(),
        }
    }

    #[test]
    fn builder_trims_string_inputs() {
        let spec = ServerSpec::builder()
            .name("  ci-server ")
            .image(ImageRef::Name("ubuntu-24.04".to_owned()))
            .server_type(" cx22")
            .ssh_key_name("deploy-key ")
            .location(Some(" nbg1 ".to_owned()))
            .build()
            .expect("spec builds");

        assert_eq!(spec.name, "ci-server");
        assert_eq!(spec.server_type, "cx22");
        assert_eq!(spec.ssh_key_name, "deploy-key");
        assert_eq!(spec.location.as_deref(), Some("nbg1"));
    }

    #[test]
    fn builder_rejects_missing_image() {
        let err = ServerSpec::builder()
            .name("ci-server")
            .server_type("cx22")
            .ssh_key_name("deploy-key")
            .build()
            .expect_err("image is required");
        assert_eq!(err, SpecError::MissingField("image".to_owned()));
    }

    #[test]
    fn validate_rejects_empty_selector_description() {
        let mut selector = selector();
        selector.description = String::new();
        let spec = ServerSpec {
            name: "ci-server".to_owned(),
            image: ImageRef::Selector(selector),
            server_type: "cx22".to_owned(),
            ssh_key_name: "deploy-key".to_owned(),
            location: None,
        };
        assert!(matches!(spec.validate(), Err(SpecError::MissingField(_))));
    }

    #[test]
    fn image_type_parses_known_categories() {
        assert_eq!("snapshot".parse::<ImageType>(), Ok(ImageType::Snapshot));
        assert_eq!("backup".parse::<ImageType>(), Ok(ImageType::Backup));
        assert_eq!("system".parse::<ImageType>(), Ok(ImageType::System));
        assert!(matches!(
            "floppy".parse::<ImageType>(),
            Err(SpecError::UnknownImageType(_))
        ));
    }
}
