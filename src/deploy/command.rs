// ABOUTME: The package-then-deploy command run inside the worker.
// ABOUTME: Built as argv steps and rendered with every argument shell-quoted.

use crate::config::TargetConfig;

/// A sequence of commands, each run only if the previous one succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    steps: Vec<Vec<String>>,
}

impl WorkerCommand {
    pub fn new(steps: Vec<Vec<String>>) -> Self {
        Self { steps }
    }

    /// Package the staged template to the target bucket, then deploy the stack.
    pub fn package_and_deploy(target: &TargetConfig, template_file: &str) -> Self {
        let package = vec![
            target.tool.clone(),
            "package".to_string(),
            "--template-file".to_string(),
            template_file.to_string(),
            "--s3-bucket".to_string(),
            target.bucket.clone(),
            "--output-template-file".to_string(),
            target.packaged_template.clone(),
        ];

        let mut deploy = vec![
            target.tool.clone(),
            "deploy".to_string(),
            "--region".to_string(),
            target.region.clone(),
            "--template-file".to_string(),
            target.packaged_template.clone(),
            "--stack-name".to_string(),
            target.stack_name.clone(),
        ];
        if !target.capabilities.is_empty() {
            deploy.push("--capabilities".to_string());
            deploy.extend(target.capabilities.iter().cloned());
        }

        Self::new(vec![package, deploy])
    }

    pub fn steps(&self) -> &[Vec<String>] {
        &self.steps
    }

    /// Render as a single `&&`-joined script, every argument quoted.
    ///
    /// The steps share one container and the deploy step must not run when
    /// packaging fails. A container takes a single command, so the steps are
    /// sequenced by the shell's `&&`; quoting keeps each argv intact.
    pub fn script(&self) -> String {
        self.steps
            .iter()
            .map(|argv| {
                argv.iter()
                    .map(|arg| shell_quote(arg))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(" && ")
    }

    /// The container command: `<shell> -c <script>`.
    pub fn to_container_command(&self, shell: &str) -> Vec<String> {
        vec![shell.to_string(), "-c".to_string(), self.script()]
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,@%+".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetConfig {
        TargetConfig {
            bucket: "sam-test-bucket-aox".to_string(),
            stack_name: "l9-hello".to_string(),
            ..TargetConfig::default()
        }
    }

    #[test]
    fn renders_legacy_script() {
        let command = WorkerCommand::package_and_deploy(&target(), "template.yml");
        assert_eq!(
            command.script(),
            "sam package --template-file template.yml --s3-bucket sam-test-bucket-aox \
             --output-template-file packaged-template.yaml && sam deploy --region us-east-1 \
             --template-file packaged-template.yaml --stack-name l9-hello --capabilities CAPABILITY_IAM"
        );
    }

    #[test]
    fn hostile_values_are_quoted() {
        let mut target = target();
        target.stack_name = "x; rm -rf /".to_string();
        target.bucket = "it's".to_string();
        let script = WorkerCommand::package_and_deploy(&target, "template.yml").script();
        assert!(script.contains("--stack-name 'x; rm -rf /'"));
        assert!(script.contains("--s3-bucket 'it'\\''s'"));
    }

    #[test]
    fn no_capabilities_flag_when_empty() {
        let mut target = target();
        target.capabilities.clear();
        let command = WorkerCommand::package_and_deploy(&target, "template.yml");
        assert!(!command.steps()[1].contains(&"--capabilities".to_string()));
    }

    #[test]
    fn deploy_runs_only_after_package() {
        let command = WorkerCommand::package_and_deploy(&target(), "template.yml");
        let argv = command.to_container_command("/bin/sh");
        assert_eq!(argv.len(), 3);
        assert_eq!(argv[1], "-c");

        let (package, deploy) = argv[2].split_once(" && ").unwrap();
        assert!(package.starts_with("sam package "));
        assert!(deploy.starts_with("sam deploy "));
        assert!(!deploy.contains("&&"));
    }

    #[test]
    fn container_command_wraps_in_shell() {
        let command = WorkerCommand::new(vec![vec!["echo".to_string(), "".to_string()]]);
        assert_eq!(
            command.to_container_command("/bin/sh"),
            ["/bin/sh", "-c", "echo ''"]
        );
    }
}
