//! Unit tests for configuration validation and typed accessors.

use hcloud_deploy::config::ConfigError;
use hcloud_deploy::{ActionConfig, ImageRef, ImageType};
use rstest::*;

#[fixture]
fn valid_config() -> ActionConfig {
    ActionConfig {
        token: String::from("hcloud-api-token"),
        server_name: String::from("ci-runner"),
        server_type: String::from("cx22"),
        server_location: Some(String::from("nbg1")),
        ssh_key_name: String::from("deploy-key"),
        image_identifier: String::from("ubuntu-24.04"),
        image_label: None,
        image_type: None,
        server_id: Some(String::from("123")),
        delete_server: true,
        floating_ip_id: None,
        floating_ip_assignment_timeout: 60_000,
        startup_timeout: 0,
    }
}

#[rstest]
#[case::token("token", "HCLOUD_TOKEN")]
#[case::server_name("server_name", "HCLOUD_SERVER_NAME")]
#[case::server_type("server_type", "HCLOUD_SERVER_TYPE")]
#[case::ssh_key_name("ssh_key_name", "HCLOUD_SSH_KEY_NAME")]
#[case::image_identifier("image_identifier", "HCLOUD_IMAGE_IDENTIFIER")]
fn deploy_validation_names_the_missing_env_var(#[case] field: &str, #[case] env_var: &str) {
    let mut config = valid_config();
    match field {
        "token" => config.token = String::new(),
        "server_name" => config.server_name = String::new(),
        "server_type" => config.server_type = String::new(),
        "ssh_key_name" => config.ssh_key_name = String::new(),
        "image_identifier" => config.image_identifier = String::new(),
        other => panic!("unexpected field {other}"),
    }

    let err = config.validate_deploy().expect_err("field is required");
    let ConfigError::MissingField(ref message) = err else {
        panic!("expected MissingField, got {err:?}");
    };
    assert!(
        message.contains(env_var),
        "error should mention env var: {message}"
    );
}

#[test]
fn deploy_validation_accepts_a_complete_configuration() {
    assert!(valid_config().validate_deploy().is_ok());
}

#[test]
fn image_ref_is_a_direct_name_without_a_type() {
    let config = valid_config();
    assert_eq!(
        config.image_ref().expect("builds"),
        ImageRef::Name(String::from("ubuntu-24.04"))
    );
}

#[test]
fn image_ref_becomes_a_selector_with_a_type() {
    let config = ActionConfig {
        image_type: Some(String::from("snapshot")),
        image_label: Some(String::from(" GITHUB ")),
        image_identifier: String::from("snapshot3"),
        ..valid_config()
    };

    let ImageRef::Selector(selector) = config.image_ref().expect("builds") else {
        panic!("expected a selector");
    };
    assert_eq!(selector.image_type, ImageType::Snapshot);
    assert_eq!(selector.label.as_deref(), Some("GITHUB"));
    assert_eq!(selector.description, "snapshot3");
}

#[test]
fn blank_image_type_means_direct_name() {
    let config = ActionConfig {
        image_type: Some(String::from("   ")),
        ..valid_config()
    };
    assert!(matches!(
        config.image_ref().expect("builds"),
        ImageRef::Name(_)
    ));
}

#[test]
fn unknown_image_type_is_rejected() {
    let config = ActionConfig {
        image_type: Some(String::from("floppy")),
        ..valid_config()
    };
    let err = config.image_ref().expect_err("unknown category");
    assert!(matches!(err, ConfigError::InvalidValue(_)));
}

#[test]
fn server_spec_carries_the_configured_fields() {
    let spec = valid_config().server_spec().expect("builds");
    assert_eq!(spec.name, "ci-runner");
    assert_eq!(spec.server_type, "cx22");
    assert_eq!(spec.ssh_key_name, "deploy-key");
    assert_eq!(spec.location.as_deref(), Some("nbg1"));
}

#[test]
fn server_id_parses_when_numeric() {
    assert_eq!(valid_config().parsed_server_id().expect("parses"), 123);
}

#[test]
fn server_id_is_required_for_clean() {
    let config = ActionConfig {
        server_id: None,
        ..valid_config()
    };
    let err = config.parsed_server_id().expect_err("missing id");
    assert!(matches!(err, ConfigError::MissingField(_)));
}

#[test]
fn non_numeric_server_id_is_rejected() {
    let config = ActionConfig {
        server_id: Some(String::from("not-a-number")),
        ..valid_config()
    };
    let err = config.parsed_server_id().expect_err("non-numeric id");
    assert!(matches!(err, ConfigError::InvalidValue(_)));
}
