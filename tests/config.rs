// ABOUTME: Tests for loading stagehand.yml.
// ABOUTME: Section parsing, strictness, discovery order, and env-backed values.

use std::path::Path;
use std::time::Duration;

use stagehand::config::{CONFIG_FILENAME, Config, EnvValue, ExitPolicy, init_config};
use stagehand::error::Error;
use stagehand::runtime::RuntimeType;

const FULL: &str = r#"
server:
  port: 8000
  bind: 127.0.0.1
  route_prefix: /v2
  max_body_bytes: 1048576
staging:
  root: /srv/functions
  host_path: /home/ec2-user/functions
  template_file: template.yaml
  default_function_name: handler.py
worker:
  image: registry.local:5000/tools/sam:1.98
  working_dir: /work
  container_port: 3000
  host_port: 8000
  tty: false
  remove_container: false
  exit_policy: ignore
  registry_auth:
    username: deployer
    password:
      env: STAGEHAND_TEST_REGISTRY_PASSWORD
      default: fallback
target:
  bucket: artifacts
  stack_name: hello
  region: eu-west-1
  capabilities: [CAPABILITY_IAM, CAPABILITY_AUTO_EXPAND]
runtime:
  runtime: podman
  socket: /run/podman/podman.sock
  timeout: 90s
credentials:
  env_file: /etc/stagehand/env
"#;

#[test]
fn every_section_parses() {
    let config = Config::from_yaml(FULL).unwrap();

    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.bind, "127.0.0.1");
    assert_eq!(config.server.deploy_route(), "/v2/lambda/deploy");
    assert_eq!(config.server.max_body_bytes, 1024 * 1024);

    assert_eq!(config.staging.root, Path::new("/srv/functions"));
    assert_eq!(
        config.staging.mount_source(),
        Path::new("/home/ec2-user/functions")
    );
    assert_eq!(config.staging.template_file, "template.yaml");
    assert_eq!(config.staging.default_function_name, "handler.py");

    assert_eq!(config.worker.image.registry(), Some("registry.local:5000"));
    assert_eq!(config.worker.working_dir, "/work");
    assert_eq!(config.worker.container_port, 3000);
    assert_eq!(config.worker.host_port, Some(8000));
    assert!(!config.worker.tty);
    assert!(!config.worker.remove_container);
    assert_eq!(config.worker.exit_policy, ExitPolicy::Ignore);

    assert_eq!(config.target.region, "eu-west-1");
    assert_eq!(config.target.capabilities.len(), 2);

    assert_eq!(config.runtime.runtime, Some(RuntimeType::Podman));
    assert_eq!(config.runtime.timeout, Duration::from_secs(90));
    assert_eq!(config.credentials.env_file, Path::new("/etc/stagehand/env"));

    config.validate().unwrap();
}

#[test]
fn registry_password_comes_from_env() {
    let config = Config::from_yaml(FULL).unwrap();
    let auth = config.worker.registry_auth.unwrap();
    assert_eq!(auth.username, "deployer");

    temp_env::with_var("STAGEHAND_TEST_REGISTRY_PASSWORD", Some("s3cret"), || {
        assert_eq!(auth.resolve().unwrap().password, "s3cret");
    });
    temp_env::with_var_unset("STAGEHAND_TEST_REGISTRY_PASSWORD", || {
        assert_eq!(auth.resolve().unwrap().password, "fallback");
    });
}

#[test]
fn env_value_without_default_names_the_variable() {
    let value: EnvValue = serde_yaml::from_str("env: STAGEHAND_TEST_UNSET_VAR").unwrap();
    temp_env::with_var_unset("STAGEHAND_TEST_UNSET_VAR", || match value.resolve() {
        Err(Error::MissingEnvVar(name)) => assert_eq!(name, "STAGEHAND_TEST_UNSET_VAR"),
        other => panic!("expected missing var, got {other:?}"),
    });
}

#[test]
fn empty_file_is_all_defaults() {
    let config = Config::from_yaml("{}").unwrap();
    assert_eq!(config.server.port, 80);
    assert_eq!(config.worker.image.to_string(), "dbwdev/aws-cli-sam:latest");
    assert_eq!(config.runtime.timeout, Duration::from_secs(3600));
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(Config::from_yaml("servers: {}").is_err());
    assert!(Config::from_yaml("worker:\n  imgae: alpine\n").is_err());
}

#[test]
fn invalid_names_fail_at_load() {
    let err = Config::from_yaml("staging:\n  template_file: ../template.yml\n").unwrap_err();
    assert!(err.to_string().contains("path separator"), "{err}");
    assert!(Config::from_yaml("worker:\n  exit_policy: sometimes\n").is_err());
}

#[test]
fn zero_body_limit_is_rejected() {
    let mut config = Config::template();
    config.server.max_body_bytes = 0;
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn packaged_template_cannot_overwrite_template() {
    let mut config = Config::template();
    config.target.packaged_template = "template.yml".to_string();
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

mod discovery {
    use super::*;

    #[test]
    fn primary_name_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stagehand.yml"), "server:\n  port: 1\n").unwrap();
        std::fs::write(dir.path().join("stagehand.yaml"), "server:\n  port: 2\n").unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap().server.port, 1);
    }

    #[test]
    fn falls_back_to_dot_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".stagehand")).unwrap();
        std::fs::write(
            dir.path().join(".stagehand/config.yml"),
            "server:\n  port: 3\n",
        )
        .unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap().server.port, 3);
    }

    #[test]
    fn missing_config_is_reported_by_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
    }

    #[test]
    fn resolve_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(config.server.port, 80);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yml");
        assert!(matches!(
            Config::resolve(Some(&missing), dir.path()),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn init_output_is_discoverable() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), Some("bucket-a"), Some("stack-a"), false).unwrap();
        assert!(dir.path().join(CONFIG_FILENAME).exists());

        let config = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(config.target.bucket, "bucket-a");
        assert_eq!(config.target.stack_name, "stack-a");
    }
}
