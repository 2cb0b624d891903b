// ABOUTME: The validated unit of work for one deployment.
// ABOUTME: An infrastructure template plus a non-empty list of uniquely named functions.

use std::collections::HashSet;

use nonempty::NonEmpty;

use crate::types::FunctionName;

/// One function body and the file name it is staged under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: FunctionName,
    pub body: String,
}

impl FunctionDefinition {
    pub fn new(name: FunctionName, body: impl Into<String>) -> Self {
        Self {
            name,
            body: body.into(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("duplicate function name: {0}")]
    DuplicateFunction(FunctionName),
}

/// A template and the functions it references.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    template: String,
    functions: NonEmpty<FunctionDefinition>,
}

impl DeploymentRequest {
    pub fn new(
        template: impl Into<String>,
        functions: NonEmpty<FunctionDefinition>,
    ) -> Result<Self, RequestError> {
        let mut seen = HashSet::with_capacity(functions.len());
        for function in functions.iter() {
            if !seen.insert(function.name.as_str()) {
                return Err(RequestError::DuplicateFunction(function.name.clone()));
            }
        }

        Ok(Self {
            template: template.into(),
            functions,
        })
    }

    pub fn single(template: impl Into<String>, function: FunctionDefinition) -> Self {
        Self {
            template: template.into(),
            functions: NonEmpty::new(function),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn functions(&self) -> &NonEmpty<FunctionDefinition> {
        &self.functions
    }
}
