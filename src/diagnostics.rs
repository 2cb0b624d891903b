// ABOUTME: Diagnostics accumulator for non-fatal warnings during a deployment.
// ABOUTME: Warnings are logged as they happen and returned with the deployment report.

use serde::Serialize;

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = warning.kind.as_str(), "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The worker's output could not be relayed in full.
    pub fn log_stream(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::LogStream,
            message: message.into(),
        }
    }

    /// The finished worker container could not be removed.
    pub fn container_removal(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ContainerRemoval,
            message: message.into(),
        }
    }

    /// The staging root could not be emptied after another failure.
    pub fn cleanup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Cleanup,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Output relay failed after the worker finished.
    LogStream,
    /// Worker container left behind.
    ContainerRemoval,
    /// Staged files may remain.
    Cleanup,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::LogStream => "log_stream",
            WarningKind::ContainerRemoval => "container_removal",
            WarningKind::Cleanup => "cleanup",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings_in_order() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::log_stream("stream reset"));
        diag.warn(Warning::container_removal("no such container"));

        assert!(diag.has_warnings());
        let kinds: Vec<_> = diag.into_warnings().into_iter().map(|w| w.kind).collect();
        assert_eq!(kinds, [WarningKind::LogStream, WarningKind::ContainerRemoval]);
    }

    #[test]
    fn warning_serializes_with_snake_case_kind() {
        let json = serde_json::to_value(Warning::cleanup("permission denied")).unwrap();
        assert_eq!(json["kind"], "cleanup");
        assert_eq!(json["message"], "permission denied");
    }
}
