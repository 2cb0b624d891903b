// ABOUTME: Cloud credentials injected into the worker container.
// ABOUTME: Read fresh per deployment from the process environment; never printed.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const REGION_VAR: &str = "AWS_DEFAULT_REGION";

/// Access key, secret key and default region for the worker toolchain.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
    region: String,
}

impl Credentials {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// The worker's complete environment: exactly the three credential variables.
    pub fn container_env(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (ACCESS_KEY_VAR.to_string(), self.access_key.clone()),
            (SECRET_KEY_VAR.to_string(), self.secret_key.clone()),
            (REGION_VAR.to_string(), self.region.clone()),
        ])
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Supplies credentials for one deployment.
pub trait CredentialSource: Send + Sync {
    fn resolve(&self) -> Result<Credentials>;
}

/// Reads the credential variables from the process environment on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn resolve(&self) -> Result<Credentials> {
        Ok(Credentials {
            access_key: required_var(ACCESS_KEY_VAR)?,
            secret_key: required_var(SECRET_KEY_VAR)?,
            region: required_var(REGION_VAR)?,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::MissingEnvVar(name.to_string())),
    }
}

/// Load `path` into the process environment unless running in production.
///
/// Variables already set win over the file. A missing file is only logged,
/// since the variables may come from the service manager instead. Returns
/// whether a file was loaded.
pub fn load_env_file(app_env: Option<&str>, path: &Path) -> Result<bool> {
    if super::is_production(app_env) {
        tracing::debug!("production environment, skipping env file");
        return Ok(false);
    }

    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "loaded env file");
            Ok(true)
        }
        Err(e) if e.not_found() => {
            tracing::warn!(path = %path.display(), "env file not found");
            Ok(false)
        }
        Err(e) => Err(Error::EnvFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}
