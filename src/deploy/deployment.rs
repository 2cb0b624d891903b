// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Also builds the worker container spec from configuration and credentials.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::{Config, Credentials};
use crate::runtime::{ContainerConfig, PortMapping, Protocol, VolumeMount};
use crate::types::{ContainerId, DeploymentId, ImageRef};

use super::command::WorkerCommand;
use super::state::{HasContainer, Idle};

pub const MANAGED_LABEL: &str = "stagehand.managed";
pub const DEPLOYMENT_LABEL: &str = "stagehand.deployment";

/// A deployment in progress, parameterized by its current state.
///
/// The state type parameter `S` carries state-specific data (like the
/// container ID) directly, so a container ID exists exactly in the states
/// where a container does.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) id: DeploymentId,
    pub(crate) spec: ContainerConfig,
    pub(crate) state: S,
}

impl Deployment<Idle> {
    pub fn new(id: DeploymentId, spec: ContainerConfig) -> Self {
        Deployment {
            id,
            spec,
            state: Idle,
        }
    }
}

impl<S> Deployment<S> {
    pub fn id(&self) -> &DeploymentId {
        &self.id
    }

    pub fn spec(&self) -> &ContainerConfig {
        &self.spec
    }

    pub fn image(&self) -> &ImageRef {
        &self.spec.image
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S: HasContainer> Deployment<S> {
    pub fn container_id(&self) -> &ContainerId {
        self.state.container_id()
    }
}

/// Everything about the worker container that does not change per request.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    image: ImageRef,
    working_dir: String,
    mount_source: PathBuf,
    shell: String,
    command: WorkerCommand,
    container_port: u16,
    host_port: Option<u16>,
    host_ip: String,
    tty: bool,
}

impl WorkerSpec {
    pub fn from_config(config: &Config) -> Self {
        Self {
            image: config.worker.image.clone(),
            working_dir: config.worker.working_dir.clone(),
            mount_source: config.staging.mount_source().to_path_buf(),
            shell: config.worker.shell.clone(),
            command: WorkerCommand::package_and_deploy(
                &config.target,
                config.staging.template_file.as_str(),
            ),
            container_port: config.worker.container_port,
            host_port: config.worker.host_port,
            host_ip: config.worker.host_ip.clone(),
            tty: config.worker.tty,
        }
    }

    pub fn command(&self) -> &WorkerCommand {
        &self.command
    }

    /// The container for one deployment. Its environment is exactly the credentials.
    pub fn container_config(&self, id: &DeploymentId, credentials: &Credentials) -> ContainerConfig {
        let labels = HashMap::from([
            (MANAGED_LABEL.to_string(), "true".to_string()),
            (DEPLOYMENT_LABEL.to_string(), id.to_string()),
        ]);

        ContainerConfig {
            name: format!("stagehand-{id}"),
            image: self.image.clone(),
            env: credentials.container_env(),
            labels,
            ports: vec![PortMapping {
                host_port: self.host_port,
                container_port: self.container_port,
                protocol: Protocol::Tcp,
                host_ip: Some(self.host_ip.clone()),
            }],
            volumes: vec![VolumeMount {
                source: self.mount_source.to_string_lossy().into_owned(),
                target: self.working_dir.clone(),
                read_only: false,
            }],
            command: self.command.to_container_command(&self.shell),
            working_dir: Some(self.working_dir.clone()),
            tty: self.tty,
        }
    }
}
