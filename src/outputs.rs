//! CI output boundary: step outputs and exported environment variables.
//!
//! The orchestrator writes results through the [`CiOutput`] trait so tests
//! can record them without touching the filesystem. The production
//! implementation targets the GitHub Actions file-based protocol.

use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Step output carrying the created server's id.
pub const OUTPUT_SERVER_ID: &str = "server-id";
/// Exported variable carrying the created server's id.
pub const ENV_SERVER_ID: &str = "SERVER_ID";
/// Exported variable carrying the created server's public IPv4 address.
pub const ENV_SERVER_IPV4: &str = "SERVER_IPV4";
/// Exported variable carrying the assigned floating IP address.
pub const ENV_SERVER_FLOATING_IPV4: &str = "SERVER_FLOATING_IPV4";

/// Errors raised while recording CI outputs.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Raised when a name or value does not fit the line-oriented format.
    #[error("invalid output value for {name}: {reason}")]
    InvalidValue {
        /// Output or variable name being recorded.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// Raised when the output file cannot be written.
    #[error("failed to record {name}: {message}")]
    Io {
        /// Output or variable name being recorded.
        name: String,
        /// Underlying I/O error message.
        message: String,
    },
}

/// Sink for the results a deploy makes available to later pipeline steps.
pub trait CiOutput {
    /// Records a step output under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] when the value cannot be recorded.
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), OutputError>;

    /// Exports an environment variable for subsequent steps.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] when the value cannot be recorded.
    fn export_variable(&mut self, name: &str, value: &str) -> Result<(), OutputError>;
}

/// GitHub Actions implementation appending `name=value` lines to the files
/// named by `GITHUB_OUTPUT` and `GITHUB_ENV`.
///
/// When a file is not configured the line is written to stdout instead, so
/// local invocations still show what would have been exported.
#[derive(Clone, Debug, Default)]
pub struct GithubOutput {
    output_path: Option<PathBuf>,
    env_path: Option<PathBuf>,
}

impl GithubOutput {
    /// Builds a sink from the `GITHUB_OUTPUT` and `GITHUB_ENV` variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            output_path: env::var_os("GITHUB_OUTPUT").map(PathBuf::from),
            env_path: env::var_os("GITHUB_ENV").map(PathBuf::from),
        }
    }

    /// Builds a sink writing to explicit files. Used by tests and callers
    /// that manage the file locations themselves.
    #[must_use]
    pub const fn with_paths(output_path: Option<PathBuf>, env_path: Option<PathBuf>) -> Self {
        Self {
            output_path,
            env_path,
        }
    }

    fn append(path: Option<&Path>, name: &str, value: &str) -> Result<(), OutputError> {
        ensure_single_line(name, value)?;
        let io_error = |err: io::Error| OutputError::Io {
            name: name.to_owned(),
            message: err.to_string(),
        };
        match path {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(io_error)?;
                writeln!(file, "{name}={value}").map_err(io_error)
            }
            None => {
                let mut stdout = io::stdout();
                writeln!(stdout, "{name}={value}").map_err(io_error)
            }
        }
    }
}

impl CiOutput for GithubOutput {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), OutputError> {
        Self::append(self.output_path.as_deref(), name, value)
    }

    fn export_variable(&mut self, name: &str, value: &str) -> Result<(), OutputError> {
        Self::append(self.env_path.as_deref(), name, value)
    }
}

// The file protocol is line-oriented; a value with a line break would be
// read back as a second, unrelated entry.
fn ensure_single_line(name: &str, value: &str) -> Result<(), OutputError> {
    if name.is_empty() || name.contains('=') || name.contains('\n') || name.contains('\r') {
        return Err(OutputError::InvalidValue {
            name: name.to_owned(),
            reason: String::from("name must be non-empty and free of '=' and line breaks"),
        });
    }
    if value.contains('\n') || value.contains('\r') {
        return Err(OutputError::InvalidValue {
            name: name.to_owned(),
            reason: String::from("value must not contain line breaks"),
        });
    }
    Ok(())
}
