//! Command-line interface definitions for the `hcloud-deploy` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `hcloud-deploy` binary.
#[derive(Debug, Parser)]
#[command(
    name = "hcloud-deploy",
    about = "Provision and tear down Hetzner Cloud servers from a CI pipeline",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Create the configured server, resolving a snapshot image and
    /// attaching a floating IP when configured.
    #[command(
        name = "deploy",
        about = "Create the configured server and export its id and addresses"
    )]
    Deploy,
    /// Delete the configured server, unless deletion is disabled.
    #[command(
        name = "clean",
        about = "Delete the configured server when delete-server is enabled"
    )]
    Clean,
}
