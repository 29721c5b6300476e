//! Thin authenticated request wrapper over the shared HTTP client.
//!
//! Callers interpret status codes themselves; this layer only attaches
//! authentication, serialises bodies, and separates transport failures from
//! HTTP-level errors.

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::HcloudApi;
use super::error::HcloudApiError;
use super::types::ApiErrorBody;

/// Response captured with its status and raw body so callers can branch on
/// the status before deciding how to decode.
pub(in crate::hcloud) struct ApiResponse {
    pub(in crate::hcloud) status: StatusCode,
    body: Vec<u8>,
}

impl ApiResponse {
    pub(in crate::hcloud) fn json<T: DeserializeOwned>(&self) -> Result<T, HcloudApiError> {
        serde_json::from_slice(&self.body).map_err(|err| HcloudApiError::InvalidResponse {
            message: err.to_string(),
        })
    }

    /// Builds the error for an unexpected status, folding in the provider's
    /// own error message when the body carries one.
    pub(in crate::hcloud) fn api_error(&self) -> HcloudApiError {
        let status_text = self.status.canonical_reason().unwrap_or("unknown status");
        let message = match serde_json::from_slice::<ApiErrorBody>(&self.body) {
            Ok(body) => format!("{status_text}: {}", body.error.message),
            Err(_) => status_text.to_owned(),
        };
        HcloudApiError::Api {
            status: self.status.as_u16(),
            message,
        }
    }

    #[cfg(test)]
    pub(in crate::hcloud) fn fake(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
        }
    }
}

impl HcloudApi {
    pub(in crate::hcloud) async fn get(&self, path: &str) -> Result<ApiResponse, HcloudApiError> {
        self.dispatch(self.http.get(self.url(path))).await
    }

    pub(in crate::hcloud) async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<ApiResponse, HcloudApiError> {
        self.dispatch(self.http.post(self.url(path)).json(payload))
            .await
    }

    pub(in crate::hcloud) async fn delete(
        &self,
        path: &str,
    ) -> Result<ApiResponse, HcloudApiError> {
        self.dispatch(self.http.delete(self.url(path))).await
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ApiResponse, HcloudApiError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport_error(err: reqwest::Error) -> HcloudApiError {
    HcloudApiError::Transport {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_includes_provider_message() {
        let response = ApiResponse::fake(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error":{"code":"invalid_input","message":"server name is already used"}}"#,
        );
        let err = response.api_error();
        let HcloudApiError::Api { status, message } = err else {
            panic!("expected Api error");
        };
        assert_eq!(status, 422);
        assert!(message.contains("server name is already used"), "{message}");
    }

    #[test]
    fn api_error_falls_back_to_status_text() {
        let response = ApiResponse::fake(StatusCode::NOT_FOUND, "");
        let HcloudApiError::Api { status, message } = response.api_error() else {
            panic!("expected Api error");
        };
        assert_eq!(status, 404);
        assert_eq!(message, "Not Found");
    }
}
