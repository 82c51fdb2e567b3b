use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CodemodError;

/// Options recognized by the transform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TransformOptions {
    /// Treat registrations as framework calls even without a visible import.
    #[serde(alias = "skip_import_detection")]
    pub skip_import_detection: bool,
    /// Registration name used when detection is bypassed; `test` when unset.
    #[serde(alias = "test_function_name", skip_serializing_if = "Option::is_none")]
    pub test_function_name: Option<String>,
}

impl TransformOptions {
    pub fn from_toml_str(path: &Path, text: &str) -> Result<Self, CodemodError> {
        let options: Self = toml::from_str(text).map_err(|error| CodemodError::Config {
            path: path.display().to_string(),
            message: error.message().to_string(),
        })?;
        options.validate(path)?;
        Ok(options)
    }

    pub fn load(path: &Path) -> Result<Self, CodemodError> {
        let text = std::fs::read_to_string(path).map_err(|error| CodemodError::io(path, error))?;
        Self::from_toml_str(path, &text)
    }

    fn validate(&self, path: &Path) -> Result<(), CodemodError> {
        if let Some(name) = &self.test_function_name
            && !is_identifier(name)
        {
            return Err(CodemodError::Config {
                path: path.display().to_string(),
                message: format!("testFunctionName '{name}' is not a valid identifier"),
            });
        }
        Ok(())
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
