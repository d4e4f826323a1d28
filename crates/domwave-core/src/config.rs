#![forbid(unsafe_code)]

//! Grid applier configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected [`GridConfig`] values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} {value:?} must start with a letter, '_' or '-' and contain only [A-Za-z0-9_-]")]
    InvalidName { field: &'static str, value: String },
}

/// Naming knobs for the nodes the applier creates and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Tag name used for lazily created row nodes.
    pub row_tag: String,
    /// Row nodes carry the class token `{row_class_prefix}{y}`.
    pub row_class_prefix: String,
    /// Cell nodes carry the class token `{column_class_prefix}{x}`.
    pub column_class_prefix: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_tag: "div".to_owned(),
            row_class_prefix: "row".to_owned(),
            column_class_prefix: "col".to_owned(),
        }
    }
}

impl GridConfig {
    /// Check that every name is a usable tag or class token prefix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name("rowTag", &self.row_tag)?;
        validate_name("rowClassPrefix", &self.row_class_prefix)?;
        validate_name("columnClassPrefix", &self.column_class_prefix)?;
        Ok(())
    }

    /// Parse a JSON options object. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn validate_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(ConfigError::Empty { field });
    };
    let valid_first = first.is_ascii_alphabetic() || first == '_' || first == '-';
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid_first && valid_rest {
        Ok(())
    } else {
        Err(ConfigError::InvalidName {
            field,
            value: value.to_owned(),
        })
    }
}
