//! File-append contract of the GitHub Actions output sink.

use std::fs;

use hcloud_deploy::{CiOutput, GithubOutput, OutputError};
use tempfile::TempDir;

#[test]
fn outputs_and_variables_append_to_their_files() {
    let dir = TempDir::new().expect("tempdir");
    let output_path = dir.path().join("github_output");
    let env_path = dir.path().join("github_env");

    let mut sink = GithubOutput::with_paths(Some(output_path.clone()), Some(env_path.clone()));
    sink.set_output("server-id", "124").expect("writes");
    sink.export_variable("SERVER_ID", "124").expect("writes");
    sink.export_variable("SERVER_IPV4", "192.0.2.10")
        .expect("writes");

    let outputs = fs::read_to_string(&output_path).expect("output file");
    assert_eq!(outputs, "server-id=124\n");

    let variables = fs::read_to_string(&env_path).expect("env file");
    assert_eq!(variables, "SERVER_ID=124\nSERVER_IPV4=192.0.2.10\n");
}

#[test]
fn values_with_line_breaks_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let env_path = dir.path().join("github_env");

    let mut sink = GithubOutput::with_paths(None, Some(env_path.clone()));
    let err = sink
        .export_variable("SERVER_IPV4", "192.0.2.10\nSERVER_ID=999")
        .expect_err("line break rejected");

    assert!(matches!(err, OutputError::InvalidValue { .. }));
    assert!(!env_path.exists(), "nothing may be written on rejection");
}
