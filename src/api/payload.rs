// ABOUTME: JSON payload accepted by the deploy route.
// ABOUTME: Supports the multi-function FuncArr form and the single FuncDef form.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::deploy::{DeployError, DeploymentRequest, FunctionDefinition};
use crate::types::FunctionName;

/// Wire shape of a deploy request.
///
/// Either `FuncArr` or `FuncDef` must be present, never both. `YAML` is the
/// infrastructure template in both forms.
#[derive(Debug, Deserialize)]
pub struct DeployPayload {
    #[serde(rename = "FuncArr", default)]
    pub functions: Option<Vec<FunctionPayload>>,

    #[serde(rename = "FuncName", default)]
    pub name: Option<String>,

    #[serde(rename = "FuncDef", default)]
    pub body: Option<String>,

    #[serde(rename = "YAML")]
    pub template: String,
}

#[derive(Debug, Deserialize)]
pub struct FunctionPayload {
    #[serde(rename = "FuncName")]
    pub name: String,

    #[serde(rename = "FuncDef")]
    pub body: String,
}

impl DeployPayload {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DeployError> {
        serde_json::from_slice(bytes)
            .map_err(|e| DeployError::InvalidRequest(format!("malformed JSON body: {e}")))
    }

    /// Validate names and build the request. `default_name` is used when the
    /// single-function form omits `FuncName`.
    pub fn into_request(
        self,
        default_name: &FunctionName,
    ) -> Result<DeploymentRequest, DeployError> {
        match (self.functions, self.body) {
            (Some(_), Some(_)) => Err(DeployError::InvalidRequest(
                "use either FuncArr or FuncDef, not both".to_string(),
            )),
            (Some(functions), None) => {
                if self.name.is_some() {
                    return Err(DeployError::InvalidRequest(
                        "FuncName belongs inside FuncArr entries".to_string(),
                    ));
                }
                let functions = functions
                    .into_iter()
                    .map(|f| Ok(FunctionDefinition::new(parse_name(&f.name)?, f.body)))
                    .collect::<Result<Vec<_>, DeployError>>()?;
                let functions = NonEmpty::from_vec(functions).ok_or_else(|| {
                    DeployError::InvalidRequest("FuncArr must contain at least one function".to_string())
                })?;
                DeploymentRequest::new(self.template, functions)
                    .map_err(|e| DeployError::InvalidRequest(e.to_string()))
            }
            (None, Some(body)) => {
                let name = match self.name.as_deref() {
                    Some(raw) => parse_name(raw)?,
                    None => default_name.clone(),
                };
                Ok(DeploymentRequest::single(
                    self.template,
                    FunctionDefinition::new(name, body),
                ))
            }
            (None, None) => Err(DeployError::InvalidRequest(
                "request needs FuncArr or FuncDef".to_string(),
            )),
        }
    }
}

fn parse_name(raw: &str) -> Result<FunctionName, DeployError> {
    FunctionName::new(raw)
        .map_err(|e| DeployError::InvalidRequest(format!("invalid function name {raw:?}: {e}")))
}
