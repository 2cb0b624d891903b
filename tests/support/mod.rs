// ABOUTME: Test support utilities.
// ABOUTME: An in-memory runtime with scripted timing, plus config and credential helpers.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use stagehand::config::{Config, CredentialSource, Credentials};
use stagehand::runtime::{
    ContainerConfig, ContainerError, ContainerOps, ExitStatus, ImageError, ImageOps, LogChunk,
    LogError, LogOps, LogOptions, LogStream, LogStreamKind, RegistryAuth, RuntimeInfo,
    RuntimeInfoError, RuntimeMetadata, WaitSignals,
};
use stagehand::types::{ContainerId, ImageRef};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("stagehand=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// How the fake answers a container wait.
#[derive(Debug, Clone)]
pub enum WaitScript {
    /// The container stops after `after` with `code`.
    Exit { code: i64, after: Duration },
    /// The runtime reports an error after `after`.
    Error { after: Duration },
    /// Both signals fire independently; whichever delay is shorter wins.
    Race {
        code: i64,
        exit_after: Duration,
        error_after: Duration,
    },
    /// Both channels close without a value.
    Hangup,
}

/// What the fake saw in the staging root when a container was created.
#[derive(Debug, Clone)]
pub struct StagingSnapshot {
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<String>,
    created: Vec<ContainerConfig>,
    removed: Vec<ContainerId>,
    snapshots: Vec<StagingSnapshot>,
    active: usize,
    max_active: usize,
}

/// Scripted in-memory container runtime.
pub struct FakeRuntime {
    ping_error: Option<String>,
    pull_error: Option<String>,
    create_error: Option<String>,
    start_error: Option<String>,
    wait: WaitScript,
    log_chunks: Vec<Bytes>,
    log_error: Option<String>,
    next_id: AtomicUsize,
    recorded: Mutex<Recorded>,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self {
            ping_error: None,
            pull_error: None,
            create_error: None,
            start_error: None,
            wait: WaitScript::Exit {
                code: 0,
                after: Duration::from_millis(5),
            },
            log_chunks: Vec::new(),
            log_error: None,
            next_id: AtomicUsize::new(1),
            recorded: Mutex::new(Recorded::default()),
        }
    }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ping_error(mut self, message: &str) -> Self {
        self.ping_error = Some(message.to_string());
        self
    }

    pub fn with_pull_error(mut self, message: &str) -> Self {
        self.pull_error = Some(message.to_string());
        self
    }

    pub fn with_create_error(mut self, message: &str) -> Self {
        self.create_error = Some(message.to_string());
        self
    }

    pub fn with_start_error(mut self, message: &str) -> Self {
        self.start_error = Some(message.to_string());
        self
    }

    pub fn with_wait(mut self, wait: WaitScript) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_exit_code(self, code: i64) -> Self {
        self.with_wait(WaitScript::Exit {
            code,
            after: Duration::from_millis(5),
        })
    }

    pub fn with_logs(mut self, chunks: &[&str]) -> Self {
        self.log_chunks = chunks.iter().map(|c| Bytes::from(c.to_string())).collect();
        self
    }

    pub fn with_log_error(mut self, message: &str) -> Self {
        self.log_error = Some(message.to_string());
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.recorded.lock().events.clone()
    }

    pub fn created(&self) -> Vec<ContainerConfig> {
        self.recorded.lock().created.clone()
    }

    pub fn removed(&self) -> Vec<ContainerId> {
        self.recorded.lock().removed.clone()
    }

    pub fn snapshots(&self) -> Vec<StagingSnapshot> {
        self.recorded.lock().snapshots.clone()
    }

    /// Most containers that existed at the same time.
    pub fn max_active(&self) -> usize {
        self.recorded.lock().max_active
    }

    fn record(&self, event: &str) {
        self.recorded.lock().events.push(event.to_string());
    }
}

fn snapshot(dir: &Path) -> StagingSnapshot {
    let mut files = BTreeMap::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let body = std::fs::read_to_string(entry.path()).unwrap_or_default();
            files.insert(name, body);
        }
    }
    StagingSnapshot { files }
}

#[async_trait]
impl RuntimeInfo for FakeRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        Ok(RuntimeMetadata {
            name: "Fake".to_string(),
            version: "0.0.0".to_string(),
            api_version: "1.43".to_string(),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.record("ping");
        match &self.ping_error {
            Some(message) => Err(RuntimeInfoError::ConnectionFailed(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        _auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        self.record("pull");
        match &self.pull_error {
            Some(message) => Err(ImageError::PullFailed(format!("{reference}: {message}"))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        self.record("create");
        if let Some(message) = &self.create_error {
            return Err(ContainerError::InvalidConfig(message.clone()));
        }

        let staged = config
            .volumes
            .first()
            .map(|v| snapshot(Path::new(&v.source)));

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut recorded = self.recorded.lock();
        recorded.created.push(config.clone());
        if let Some(staged) = staged {
            recorded.snapshots.push(staged);
        }
        recorded.active += 1;
        recorded.max_active = recorded.max_active.max(recorded.active);

        Ok(ContainerId::new(format!("{n:064x}")))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.record("start");
        match &self.start_error {
            Some(message) => Err(ContainerError::Runtime(format!("{}: {message}", id.short()))),
            None => Ok(()),
        }
    }

    async fn wait_container(&self, _id: &ContainerId) -> Result<WaitSignals, ContainerError> {
        self.record("wait");
        let (senders, signals) = WaitSignals::channel();

        match self.wait.clone() {
            WaitScript::Exit { code, after } => {
                tokio::spawn(async move {
                    drop(senders.error);
                    tokio::time::sleep(after).await;
                    let _ = senders.not_running.send(ExitStatus {
                        code,
                        message: None,
                    });
                });
            }
            WaitScript::Error { after } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = senders
                        .error
                        .send(ContainerError::Runtime("daemon connection reset".to_string()));
                    drop(senders.not_running);
                });
            }
            WaitScript::Race {
                code,
                exit_after,
                error_after,
            } => {
                let done = senders.not_running;
                let error = senders.error;
                tokio::spawn(async move {
                    tokio::time::sleep(exit_after).await;
                    let _ = done.send(ExitStatus {
                        code,
                        message: None,
                    });
                });
                tokio::spawn(async move {
                    tokio::time::sleep(error_after).await;
                    let _ = error.send(ContainerError::Runtime("wait failed".to_string()));
                });
            }
            WaitScript::Hangup => drop(senders),
        }

        Ok(signals)
    }

    async fn remove_container(&self, id: &ContainerId, _force: bool) -> Result<(), ContainerError> {
        self.record("remove");
        let mut recorded = self.recorded.lock();
        recorded.removed.push(id.clone());
        recorded.active = recorded.active.saturating_sub(1);
        Ok(())
    }
}

#[async_trait]
impl LogOps for FakeRuntime {
    async fn container_logs(
        &self,
        _id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogStream, LogError> {
        self.record("logs");
        assert!(opts.stdout && opts.stderr && opts.follow, "logs are combined and followed");

        let mut items: Vec<Result<LogChunk, LogError>> = self
            .log_chunks
            .iter()
            .map(|bytes| {
                Ok(LogChunk {
                    kind: LogStreamKind::Console,
                    bytes: bytes.clone(),
                })
            })
            .collect();
        if let Some(message) = &self.log_error {
            items.push(Err(LogError::StreamError(message.clone())));
        }

        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Fixed credentials for tests.
pub struct StaticCredentials(pub Credentials);

impl StaticCredentials {
    pub fn example() -> Self {
        Self(Credentials::new(
            "AKIAEXAMPLEKEY",
            "example-secret-key",
            "us-east-1",
        ))
    }
}

impl CredentialSource for StaticCredentials {
    fn resolve(&self) -> stagehand::error::Result<Credentials> {
        Ok(self.0.clone())
    }
}

/// Credentials that are never available.
pub struct MissingCredentials;

impl CredentialSource for MissingCredentials {
    fn resolve(&self) -> stagehand::error::Result<Credentials> {
        Err(stagehand::error::Error::MissingEnvVar(
            "AWS_ACCESS_KEY_ID".to_string(),
        ))
    }
}

/// A valid config staging into `root`.
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::template();
    config.staging.root = root.to_path_buf();
    config
}
