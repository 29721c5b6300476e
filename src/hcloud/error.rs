//! Error types for the Hetzner Cloud provider.

use std::time::Duration;

use crate::provider::ImageType;
use thiserror::Error;

/// Errors raised by the Hetzner Cloud provider.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HcloudApiError {
    /// Raised when a caller-supplied value is malformed. No network call is
    /// made once this is detected.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the API could not be reached at the transport level
    /// (DNS, connect, timeout). Distinct from an HTTP error status.
    #[error("transport error: {message}")]
    Transport {
        /// Message from the HTTP client, propagated verbatim.
        message: String,
    },
    /// Raised when the API responded with an unexpected status code.
    #[error("Hetzner Cloud API returned {status}: {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Status text, extended with the provider's error message when the
        /// body carried one.
        message: String,
    },
    /// Raised when a success response carried an undecodable body.
    #[error("malformed API response: {message}")]
    InvalidResponse {
        /// Decoder error message.
        message: String,
    },
    /// Raised when no listed image matches the configured filters.
    #[error("no {image_type} image matching '{description}' found")]
    ImageNotFound {
        /// Description the resolver was asked to match.
        description: String,
        /// Image category the resolver filtered on.
        image_type: ImageType,
    },
    /// Raised when the assignment action reached a terminal non-success
    /// status.
    #[error("floating IP assignment finished with status '{status}'")]
    AssignmentFailed {
        /// Terminal status reported by the provider.
        status: String,
    },
    /// Raised when the assignment action was still running when the
    /// configured timeout elapsed.
    #[error("floating IP {floating_ip_id} assignment did not finish within {} ms", .timeout.as_millis())]
    AssignmentTimeout {
        /// Floating IP being assigned.
        floating_ip_id: u64,
        /// Timeout that elapsed.
        timeout: Duration,
    },
    /// Raised when the new server did not become reachable before the
    /// configured startup timeout elapsed.
    #[error("server {server_id} did not become reachable within {} ms", .timeout.as_millis())]
    StartupTimeout {
        /// Server being waited on.
        server_id: i64,
        /// Timeout that elapsed.
        timeout: Duration,
    },
}
