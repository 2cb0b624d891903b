// ABOUTME: Writes a deployment's template and function bodies into the staging root.
// ABOUTME: All names are checked before the first byte is written.

use std::path::{Path, PathBuf};

use crate::deploy::DeploymentRequest;
use crate::types::FunctionName;

use super::StagingError;

/// Files written for one deployment.
#[derive(Debug, Clone)]
pub struct StagedArtifacts {
    pub template: PathBuf,
    pub functions: Vec<PathBuf>,
}

impl StagedArtifacts {
    pub fn file_count(&self) -> usize {
        self.functions.len() + 1
    }
}

#[derive(Debug, Clone)]
pub struct Stager {
    root: PathBuf,
    template_file: FunctionName,
    /// Names the worker writes into the root itself.
    worker_outputs: Vec<String>,
}

impl Stager {
    pub fn new(root: impl Into<PathBuf>, template_file: FunctionName) -> Self {
        Self {
            root: root.into(),
            template_file,
            worker_outputs: Vec::new(),
        }
    }

    /// Also refuse functions named like a file the worker will write, such as
    /// the packaged template.
    pub fn with_worker_output(mut self, name: impl Into<String>) -> Self {
        self.worker_outputs.push(name.into());
        self
    }

    fn is_reserved(&self, name: &FunctionName) -> bool {
        *name == self.template_file || self.worker_outputs.iter().any(|o| name == o.as_str())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_file(&self) -> &FunctionName {
        &self.template_file
    }

    /// Write the template and every function, overwriting earlier content.
    ///
    /// The root is created if missing. A failure part way leaves earlier files
    /// in place for the cleaner to remove.
    pub async fn stage(&self, request: &DeploymentRequest) -> Result<StagedArtifacts, StagingError> {
        if let Some(clash) = request
            .functions()
            .iter()
            .find(|f| self.is_reserved(&f.name))
        {
            return Err(StagingError::ReservedName(clash.name.clone()));
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StagingError::CreateRoot {
                path: self.root.clone(),
                source,
            })?;

        let template = self.root.join(self.template_file.as_str());
        write_file(&template, request.template().as_bytes()).await?;
        tracing::debug!(path = %template.display(), "staged template");

        let mut functions = Vec::with_capacity(request.functions().len());
        for function in request.functions().iter() {
            let path = self.root.join(function.name.as_str());
            write_file(&path, function.body.as_bytes()).await?;
            tracing::debug!(path = %path.display(), bytes = function.body.len(), "staged function");
            functions.push(path);
        }

        Ok(StagedArtifacts {
            template,
            functions,
        })
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), StagingError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| StagingError::Write {
            path: path.to_path_buf(),
            source,
        })
}
