//! Wire payloads for the Hetzner Cloud API endpoints this tool uses.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::provider::ImageType;

/// Accepts image ids as either JSON strings or numbers. The API emits
/// numbers; snapshots created by older tooling are listed with string ids.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Number(u64),
        Text(String),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(value) => value.to_string(),
        IdRepr::Text(value) => value,
    })
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(in crate::hcloud) struct Image {
    #[serde(deserialize_with = "id_string")]
    pub(in crate::hcloud) id: String,
    #[serde(default)]
    pub(in crate::hcloud) description: String,
    #[serde(rename = "type")]
    pub(in crate::hcloud) image_type: ImageType,
    #[serde(default)]
    pub(in crate::hcloud) labels: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct ImagesResponse {
    pub(in crate::hcloud) images: Vec<Image>,
}

#[derive(Serialize)]
pub(in crate::hcloud) struct CreateServerRequest<'a> {
    pub(in crate::hcloud) name: &'a str,
    pub(in crate::hcloud) image: &'a str,
    pub(in crate::hcloud) server_type: &'a str,
    pub(in crate::hcloud) ssh_keys: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(in crate::hcloud) location: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct CreateServerResponse {
    pub(in crate::hcloud) server: ServerPayload,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct ServerPayload {
    pub(in crate::hcloud) id: i64,
    pub(in crate::hcloud) public_net: PublicNet,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct PublicNet {
    pub(in crate::hcloud) ipv4: PublicIpv4,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct PublicIpv4 {
    pub(in crate::hcloud) ip: String,
}

#[derive(Serialize)]
pub(in crate::hcloud) struct AssignRequest {
    pub(in crate::hcloud) server: i64,
}

/// Status of a provider-side asynchronous action. Any value other than
/// `running` or `success` is terminal and treated as a failure.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(in crate::hcloud) enum ActionStatus {
    Running,
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct ActionResponse {
    pub(in crate::hcloud) action: ActionPayload,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct ActionPayload {
    pub(in crate::hcloud) id: i64,
    // The assign response is only guaranteed to carry the action id.
    #[serde(default)]
    pub(in crate::hcloud) status: Option<ActionStatus>,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct FloatingIpResponse {
    pub(in crate::hcloud) floating_ip: FloatingIpPayload,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct FloatingIpPayload {
    pub(in crate::hcloud) ip: String,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct ApiErrorBody {
    pub(in crate::hcloud) error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(in crate::hcloud) struct ApiErrorDetail {
    pub(in crate::hcloud) message: String,
}
