//! Server creation, deletion, and the startup reachability wait.

use std::net::IpAddr;
use std::str::FromStr;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

use crate::provider::{ImageRef, Server, ServerSpec};

use super::client::ApiResponse;
use super::error::HcloudApiError;
use super::types::{CreateServerRequest, CreateServerResponse};
use super::HcloudApi;

const STARTUP_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

impl HcloudApi {
    /// Creates a server from the spec, resolving the image reference first
    /// when it is a selector.
    pub(in crate::hcloud) async fn create(
        &self,
        spec: &ServerSpec,
    ) -> Result<Server, HcloudApiError> {
        spec.validate()
            .map_err(|err| HcloudApiError::Config(err.to_string()))?;
        let image_id = match &spec.image {
            ImageRef::Name(name) => name.clone(),
            ImageRef::Selector(selector) => self.resolve_image(selector).await?,
        };

        let payload = CreateServerRequest {
            name: &spec.name,
            image: &image_id,
            server_type: &spec.server_type,
            ssh_keys: vec![&spec.ssh_key_name],
            location: spec.location.as_deref(),
        };
        let response = self.post("/servers", &payload).await?;
        let server = parse_create_response(&response)?;
        tracing::info!(server_id = server.id, ip = %server.public_ipv4, "server created");
        Ok(server)
    }

    /// Deletes a server by id.
    pub(in crate::hcloud) async fn remove(&self, server_id: i64) -> Result<(), HcloudApiError> {
        let response = self.delete(&format!("/servers/{server_id}")).await?;
        ensure_delete_status(&response)
    }

    /// Polls a TCP connect against the server's public address until it
    /// accepts, bounded by the configured startup timeout. A zero timeout
    /// disables the wait.
    pub(in crate::hcloud) async fn wait_reachable(
        &self,
        server: &Server,
    ) -> Result<(), HcloudApiError> {
        if self.startup_timeout.is_zero() {
            return Ok(());
        }

        let address =
            IpAddr::from_str(&server.public_ipv4).map_err(|_| HcloudApiError::InvalidResponse {
                message: format!(
                    "server {} reported malformed IPv4 address '{}'",
                    server.id, server.public_ipv4
                ),
            })?;

        let deadline = Instant::now() + self.startup_timeout;
        while Instant::now() <= deadline {
            let addr = (address, self.ssh_port);
            let connect = timeout(STARTUP_CONNECT_TIMEOUT, TcpStream::connect(addr)).await;
            if matches!(connect, Ok(Ok(_))) {
                return Ok(());
            }
            sleep(self.poll_interval).await;
        }

        Err(HcloudApiError::StartupTimeout {
            server_id: server.id,
            timeout: self.startup_timeout,
        })
    }
}

/// A create is only successful with 201; everything else carries the
/// provider's status text.
fn parse_create_response(response: &ApiResponse) -> Result<Server, HcloudApiError> {
    if response.status != StatusCode::CREATED {
        return Err(response.api_error());
    }
    let parsed: CreateServerResponse = response.json()?;
    Ok(Server {
        id: parsed.server.id,
        public_ipv4: parsed.server.public_net.ipv4.ip,
    })
}

// The API returns 200 for a successful delete; a 201 here would be a
// provider defect, not a success.
fn ensure_delete_status(response: &ApiResponse) -> Result<(), HcloudApiError> {
    if response.status == StatusCode::OK {
        return Ok(());
    }
    Err(response.api_error())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn create_response_parses_id_and_address() {
        let body = r#"{"server":{"id":124,"public_net":{"ipv4":{"ip":"192.0.2.10"}}}}"#;
        let response = ApiResponse::fake(StatusCode::CREATED, body);
        let server = parse_create_response(&response).expect("parses");
        assert_eq!(
            server,
            Server {
                id: 124,
                public_ipv4: "192.0.2.10".to_owned(),
            }
        );
    }

    #[test]
    fn create_response_rejects_other_statuses() {
        let response = ApiResponse::fake(StatusCode::UNPROCESSABLE_ENTITY, "");
        let err = parse_create_response(&response).expect_err("422 is fatal");
        assert!(matches!(err, HcloudApiError::Api { status: 422, .. }));
    }

    #[test]
    fn create_response_rejects_undecodable_body() {
        let response = ApiResponse::fake(StatusCode::CREATED, "{not json");
        let err = parse_create_response(&response).expect_err("body must decode");
        assert!(matches!(err, HcloudApiError::InvalidResponse { .. }));
    }

    #[test]
    fn delete_succeeds_only_with_200() {
        let ok = ApiResponse::fake(StatusCode::OK, "");
        assert!(ensure_delete_status(&ok).is_ok());

        // 201 on delete is flagged, not accepted.
        let created = ApiResponse::fake(StatusCode::CREATED, "");
        assert!(matches!(
            ensure_delete_status(&created),
            Err(HcloudApiError::Api { status: 201, .. })
        ));

        let missing = ApiResponse::fake(StatusCode::NOT_FOUND, "");
        assert!(matches!(
            ensure_delete_status(&missing),
            Err(HcloudApiError::Api { status: 404, .. })
        ));
    }

    #[test]
    fn create_request_omits_absent_location() {
        let payload = CreateServerRequest {
            name: "ci-server",
            image: "ubuntu-24.04",
            server_type: "cx22",
            ssh_keys: vec!["deploy-key"],
            location: None,
        };
        let value = serde_json::to_value(&payload).expect("serialises");
        assert_eq!(
            value,
            json!({
                "name": "ci-server",
                "image": "ubuntu-24.04",
                "server_type": "cx22",
                "ssh_keys": ["deploy-key"],
            })
        );
    }
}
