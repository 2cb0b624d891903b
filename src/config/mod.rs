// ABOUTME: Configuration types and parsing for stagehand.yml.
// ABOUTME: Handles YAML discovery, defaults, and environment overrides.

mod credentials;
mod env_value;
mod init;

pub use credentials::{
    ACCESS_KEY_VAR, CredentialSource, Credentials, EnvCredentials, REGION_VAR, SECRET_KEY_VAR,
    load_env_file,
};
pub use env_value::EnvValue;
pub use init::init_config;

use crate::error::{Error, Result};
use crate::runtime::{RegistryAuth, RuntimeConfig};
use crate::types::{FunctionName, ImageRef};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "stagehand.yml";
pub const CONFIG_FILENAME_ALT: &str = "stagehand.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stagehand/config.yml";

/// Environment variable overriding the listen port.
pub const PORT_VAR: &str = "PORT";
/// Environment variable naming the deployment environment.
pub const APP_ENV_VAR: &str = "APP_ENV";

const DEFAULT_WORKER_IMAGE: &str = "dbwdev/aws-cli-sam";
const DEFAULT_WORKDIR: &str = "/usr/app";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub staging: StagingConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind")]
    pub bind: String,

    /// Prefix for the deploy route; the full path is `{prefix}/lambda/deploy`.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Largest accepted deploy request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            route_prefix: default_route_prefix(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn deploy_route(&self) -> String {
        format!("{}/lambda/deploy", self.route_prefix.trim_end_matches('/'))
    }
}

fn default_port() -> u16 {
    80
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_route_prefix() -> String {
    "/api".to_string()
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingConfig {
    /// Directory the service writes staged files into.
    #[serde(default = "default_staging_root")]
    pub root: PathBuf,

    /// The same directory as the runtime daemon sees it. Defaults to `root`.
    #[serde(default)]
    pub host_path: Option<PathBuf>,

    #[serde(default = "default_template_file")]
    pub template_file: FunctionName,

    /// Name used when a single-function payload omits one.
    #[serde(default = "default_function_name")]
    pub default_function_name: FunctionName,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            root: default_staging_root(),
            host_path: None,
            template_file: default_template_file(),
            default_function_name: default_function_name(),
        }
    }
}

impl StagingConfig {
    pub fn mount_source(&self) -> &Path {
        self.host_path.as_deref().unwrap_or(&self.root)
    }
}

fn default_staging_root() -> PathBuf {
    PathBuf::from("/var/lib/stagehand/functions")
}

fn default_template_file() -> FunctionName {
    FunctionName::from_static("template.yml")
}

fn default_function_name() -> FunctionName {
    FunctionName::from_static("index.js")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_image")]
    pub image: ImageRef,

    /// Working directory inside the worker; the staging volume is mounted here.
    #[serde(default = "default_workdir")]
    pub working_dir: String,

    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default = "default_container_port")]
    pub container_port: u16,

    /// Published host port. Unset lets the runtime choose a free one.
    #[serde(default)]
    pub host_port: Option<u16>,

    #[serde(default = "default_bind")]
    pub host_ip: String,

    #[serde(default = "default_true")]
    pub tty: bool,

    #[serde(default = "default_true")]
    pub remove_container: bool,

    #[serde(default)]
    pub exit_policy: ExitPolicy,

    #[serde(default)]
    pub registry_auth: Option<RegistryAuthConfig>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            image: default_worker_image(),
            working_dir: default_workdir(),
            shell: default_shell(),
            container_port: default_container_port(),
            host_port: None,
            host_ip: default_bind(),
            tty: true,
            remove_container: true,
            exit_policy: ExitPolicy::default(),
            registry_auth: None,
        }
    }
}

fn default_worker_image() -> ImageRef {
    ImageRef::hub_latest(DEFAULT_WORKER_IMAGE)
}

fn default_workdir() -> String {
    DEFAULT_WORKDIR.to_string()
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_container_port() -> u16 {
    80
}

fn default_true() -> bool {
    true
}

/// What a non-zero worker exit code means for the deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// A non-zero exit fails the deployment.
    #[default]
    Enforce,
    /// The exit code is reported but never fails the deployment.
    Ignore,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryAuthConfig {
    pub username: String,
    pub password: EnvValue,
    #[serde(default)]
    pub server: Option<String>,
}

impl RegistryAuthConfig {
    pub fn resolve(&self) -> Result<RegistryAuth> {
        Ok(RegistryAuth {
            username: self.username.clone(),
            password: self.password.resolve()?,
            server: self.server.clone(),
        })
    }
}

/// Where the worker toolchain packages and deploys to.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    #[serde(default = "default_tool")]
    pub tool: String,

    #[serde(default)]
    pub bucket: String,

    #[serde(default)]
    pub stack_name: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,

    #[serde(default = "default_packaged_template")]
    pub packaged_template: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            bucket: String::new(),
            stack_name: String::new(),
            region: default_region(),
            capabilities: default_capabilities(),
            packaged_template: default_packaged_template(),
        }
    }
}

fn default_tool() -> String {
    "sam".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_capabilities() -> Vec<String> {
    vec!["CAPABILITY_IAM".to_string()]
}

fn default_packaged_template() -> String {
    "packaged-template.yaml".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Env file loaded at startup outside production.
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env_file: default_env_file(),
        }
    }
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Load an explicit file, or discover one in `dir`, or fall back to defaults.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::discover(dir) {
                Ok(config) => Ok(config),
                Err(Error::ConfigNotFound(_)) => {
                    tracing::debug!(dir = %dir.display(), "no config file found, using defaults");
                    Ok(Self::default())
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Apply `PORT` from the environment on top of the file.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var(PORT_VAR) {
            let port = port.trim();
            if !port.is_empty() {
                self.server.port = port.parse().map_err(|_| {
                    Error::InvalidConfig(format!("{PORT_VAR} must be a port number, got {port:?}"))
                })?;
            }
        }
        Ok(())
    }

    /// Check the fields that have no usable default.
    pub fn validate(&self) -> Result<()> {
        if self.target.bucket.trim().is_empty() {
            return Err(Error::InvalidConfig("target.bucket is required".to_string()));
        }
        if self.target.stack_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "target.stack_name is required".to_string(),
            ));
        }
        if self.target.tool.trim().is_empty() {
            return Err(Error::InvalidConfig("target.tool cannot be empty".to_string()));
        }
        if !self.server.route_prefix.is_empty() && !self.server.route_prefix.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "server.route_prefix must start with '/', got {:?}",
                self.server.route_prefix
            )));
        }
        if self.server.max_body_bytes == 0 {
            return Err(Error::InvalidConfig(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if !self.worker.working_dir.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "worker.working_dir must be absolute, got {:?}",
                self.worker.working_dir
            )));
        }
        if self.staging.template_file == self.target.packaged_template.as_str() {
            return Err(Error::InvalidConfig(
                "target.packaged_template must differ from staging.template_file".to_string(),
            ));
        }
        Ok(())
    }

    pub fn template() -> Self {
        let mut config = Self::default();
        config.target.bucket = "my-deploy-bucket".to_string();
        config.target.stack_name = "my-functions".to_string();
        config
    }
}

/// Whether `APP_ENV` names the production environment.
pub fn is_production(app_env: Option<&str>) -> bool {
    app_env.is_some_and(|env| env.trim() == "production")
}
