// ABOUTME: Validated file name for a staged function body.
// ABOUTME: Rejects anything that could resolve outside the staging root.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest name most filesystems accept for a single path component.
const MAX_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FunctionNameError {
    #[error("function name cannot be empty")]
    Empty,

    #[error("function name exceeds maximum length of {MAX_LEN} bytes")]
    TooLong,

    #[error("function name cannot be '.' or '..'")]
    DotPath,

    #[error("function name cannot contain path separator {0:?}")]
    PathSeparator(char),

    #[error("function name cannot contain control character {0:?}")]
    ControlChar(char),
}

/// A function's file name within the staging root.
///
/// Always a single, relative path component, so joining it onto the staging
/// root can never escape the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionName(String);

impl FunctionName {
    pub fn new(value: &str) -> Result<Self, FunctionNameError> {
        if value.is_empty() {
            return Err(FunctionNameError::Empty);
        }

        if value.len() > MAX_LEN {
            return Err(FunctionNameError::TooLong);
        }

        if value == "." || value == ".." {
            return Err(FunctionNameError::DotPath);
        }

        for c in value.chars() {
            if c == '/' || c == '\\' {
                return Err(FunctionNameError::PathSeparator(c));
            }
            if c.is_control() {
                return Err(FunctionNameError::ControlChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    /// Built-in names that are known to be valid.
    pub(crate) fn from_static(value: &'static str) -> Self {
        debug_assert!(Self::new(value).is_ok(), "invalid built-in name {value:?}");
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for FunctionName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FunctionName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FunctionName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FunctionName::new(&raw).map_err(serde::de::Error::custom)
    }
}
