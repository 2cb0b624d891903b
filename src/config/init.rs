// ABOUTME: Config scaffolding for new installations.
// ABOUTME: Creates a stagehand.yml with the deployment target filled in.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(
    dir: &Path,
    bucket: Option<&str>,
    stack_name: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(b) = bucket {
        config.target.bucket = b.to_string();
    }

    if let Some(s) = stack_name {
        config.target.stack_name = s.to_string();
    }

    config.validate()?;

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"server:
  port: {port}
  route_prefix: {prefix}
  # max_body_bytes: 10485760
staging:
  root: {root}
  # Path of the same directory as the container runtime sees it.
  # host_path: /home/ec2-user/functions
worker:
  image: {image}
  working_dir: {workdir}
  container_port: {container_port}
  # Leave unset to let the runtime pick a free host port.
  # host_port: 8000
  exit_policy: enforce
target:
  bucket: {bucket}
  stack_name: {stack}
  region: {region}
  capabilities:
    - CAPABILITY_IAM
"#,
        port = config.server.port,
        prefix = config.server.route_prefix,
        root = config.staging.root.display(),
        image = config.worker.image,
        workdir = config.worker.working_dir,
        container_port = config.worker.container_port,
        bucket = config.target.bucket,
        stack = config.target.stack_name,
        region = config.target.region,
    )
}
