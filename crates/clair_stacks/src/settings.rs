//! Loading and checking generator settings.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{StackError, StackResult};

/// Settings for one generator. Every field has a default, so a YAML file
/// only needs to name what it overrides.
pub trait StackSettings: Default + Serialize + DeserializeOwned {
    /// Reject settings the generator cannot turn into a usable template.
    fn validate(&self) -> StackResult<()>;

    /// Load settings from a YAML file.
    fn from_file(path: &Path) -> StackResult<Self> {
        debug!("Loading stack settings from {:?}", path);
        let content = fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file.
    fn to_file(&self, path: &Path) -> StackResult<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Settings from `path` if given, defaults otherwise.
    fn load(path: Option<&Path>) -> StackResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> StackResult<()> {
    if value.trim().is_empty() {
        return Err(StackError::InvalidSettings(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: u32) -> StackResult<()> {
    if value == 0 {
        return Err(StackError::InvalidSettings(format!("{} must be greater than zero", field)));
    }
    Ok(())
}
