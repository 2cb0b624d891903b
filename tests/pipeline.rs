// ABOUTME: End-to-end pipeline tests against the scripted runtime.
// ABOUTME: Staging, credentials, cleanup on every path, exit policy, and slot serialization.

mod support;

use nonempty::NonEmpty;
use stagehand::config::{Config, ExitPolicy};
use stagehand::deploy::{DeployErrorKind, DeploymentRequest, FunctionDefinition, Pipeline};
use stagehand::diagnostics::WarningKind;
use stagehand::types::FunctionName;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use support::{FakeRuntime, MissingCredentials, StaticCredentials, WaitScript};

fn function(name: &str, body: &str) -> FunctionDefinition {
    FunctionDefinition::new(FunctionName::new(name).unwrap(), body)
}

fn two_function_request() -> DeploymentRequest {
    let functions = NonEmpty::from_vec(vec![
        function("hello.js", "exports.hello = async () => 'hi';"),
        function("bye.js", "exports.bye = async () => 'bye';"),
    ])
    .unwrap();
    DeploymentRequest::new("AWSTemplateFormatVersion: '2010-09-09'", functions).unwrap()
}

fn pipeline(config: &Config, runtime: &Arc<FakeRuntime>) -> Pipeline<FakeRuntime> {
    Pipeline::new(config, runtime.clone(), Arc::new(StaticCredentials::example()))
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).map(|mut d| d.next().is_none()).unwrap_or(true)
}

mod success {
    use super::*;

    #[tokio::test]
    async fn stages_runs_relays_and_cleans() {
        support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(FakeRuntime::new().with_logs(&["Successfully created stack\n"]));

        let mut output = Vec::new();
        let report = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut output)
            .await
            .unwrap();

        // The worker saw exactly the staged files.
        let snapshot = &runtime.snapshots()[0];
        let names: Vec<_> = snapshot.files.keys().map(String::as_str).collect();
        assert_eq!(names, ["bye.js", "hello.js", "template.yml"]);
        assert_eq!(
            snapshot.files["template.yml"],
            "AWSTemplateFormatVersion: '2010-09-09'"
        );

        // Environment is exactly the three credentials.
        let created = &runtime.created()[0];
        assert_eq!(created.env.len(), 3);
        assert_eq!(created.env["AWS_ACCESS_KEY_ID"], "AKIAEXAMPLEKEY");
        assert_eq!(created.env["AWS_SECRET_ACCESS_KEY"], "example-secret-key");
        assert_eq!(created.env["AWS_DEFAULT_REGION"], "us-east-1");

        assert_eq!(output, b"Successfully created stack\n");
        assert_eq!(report.exit_code, 0);
        assert_eq!(report.output_bytes, output.len() as u64);
        assert!(report.warnings.is_empty());
        assert_eq!(runtime.removed(), vec![report.container_id.clone()]);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn container_is_kept_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = support::test_config(dir.path());
        config.worker.remove_container = false;
        let runtime = Arc::new(FakeRuntime::new());

        pipeline(&config, &runtime)
            .run(&two_function_request(), &mut Vec::new())
            .await
            .unwrap();

        assert!(runtime.removed().is_empty());
    }

    #[tokio::test]
    async fn log_failure_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(FakeRuntime::new().with_log_error("stream reset"));

        let report = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::LogStream);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn credentials_never_appear_in_report_or_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(FakeRuntime::new().with_logs(&["done"]));

        let mut output = Vec::new();
        let report = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut output)
            .await
            .unwrap();

        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("example-secret-key"));
        assert!(!json.contains("AKIAEXAMPLEKEY"));
    }
}

mod failure {
    use super::*;

    #[tokio::test]
    async fn pull_failure_still_cleans_staging() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(FakeRuntime::new().with_pull_error("pull access denied"));

        let err = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::Pull);
        assert!(runtime.created().is_empty());
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn unreachable_runtime_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(FakeRuntime::new().with_ping_error("socket closed"));

        let err = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::Connection);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn missing_credentials_stop_before_staging() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(FakeRuntime::new());
        let pipeline = Pipeline::new(&config, runtime.clone(), Arc::new(MissingCredentials));

        let err = pipeline
            .run(&two_function_request(), &mut Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::Credentials);
        assert!(runtime.events().is_empty());
    }

    #[tokio::test]
    async fn start_failure_removes_container() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(FakeRuntime::new().with_start_error("no such image"));

        let err = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::Start);
        assert_eq!(runtime.removed().len(), 1);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn create_failure_is_creation_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(FakeRuntime::new().with_create_error("bad mount"));

        let err = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::Creation);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn wait_error_skips_logs() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(
            FakeRuntime::new()
                .with_wait(WaitScript::Error {
                    after: Duration::from_millis(5),
                })
                .with_logs(&["never relayed"]),
        );

        let mut output = Vec::new();
        let err = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut output)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::Wait);
        assert!(output.is_empty());
        assert!(!runtime.events().contains(&"logs".to_string()));
        assert_eq!(runtime.removed().len(), 1);
    }

    #[tokio::test]
    async fn non_zero_exit_fails_after_relaying_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(
            FakeRuntime::new()
                .with_exit_code(1)
                .with_logs(&["Error: Failed to create changeset\n"]),
        );

        let mut output = Vec::new();
        let err = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut output)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::WorkerExit);
        assert_eq!(output, b"Error: Failed to create changeset\n");
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn ignore_policy_reports_non_zero_exit_as_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = support::test_config(dir.path());
        config.worker.exit_policy = ExitPolicy::Ignore;
        let runtime = Arc::new(FakeRuntime::new().with_exit_code(3));

        let report = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(report.exit_code, 3);
    }

    #[tokio::test]
    async fn staging_failure_creates_no_container() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let config = support::test_config(&blocker.join("functions"));
        let runtime = Arc::new(FakeRuntime::new());

        let err = pipeline(&config, &runtime)
            .run(&two_function_request(), &mut Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::Staging);
        assert!(runtime.created().is_empty());
    }
}

mod serialization {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_never_share_the_staging_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = support::test_config(dir.path());
        let runtime = Arc::new(FakeRuntime::new().with_wait(WaitScript::Exit {
            code: 0,
            after: Duration::from_millis(40),
        }));
        let pipeline = Arc::new(pipeline(&config, &runtime));

        let mut handles = Vec::new();
        for i in 0..4 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                let request = DeploymentRequest::single(
                    format!("template-{i}"),
                    function(&format!("fn-{i}.js"), &format!("body-{i}")),
                );
                pipeline.run(&request, &mut Vec::new()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(runtime.max_active(), 1, "workers overlapped");

        let snapshots = runtime.snapshots();
        assert_eq!(snapshots.len(), 4);
        for snapshot in snapshots {
            assert_eq!(snapshot.files.len(), 2, "saw another request's files: {snapshot:?}");
            let function = snapshot
                .files
                .keys()
                .find(|k| k.starts_with("fn-"))
                .unwrap();
            let i = function.trim_start_matches("fn-").trim_end_matches(".js");
            assert_eq!(snapshot.files["template.yml"], format!("template-{i}"));
        }

        assert!(pipeline.slot().holder().is_none());
        assert!(is_empty_dir(dir.path()));
    }
}
