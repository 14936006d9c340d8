use crate::config::StampConfig;
use crate::error::{ConfigError, Result};

impl StampConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maxNodes".to_string(),
                value: "0".to_string(),
                hint: "A bundle needs room for at least its entry; use 1 or more".to_string(),
            }
            .into());
        }

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency".to_string(),
                value: "0".to_string(),
                hint: "At least one file must be read at a time; use 1 or more".to_string(),
            }
            .into());
        }

        if self.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extensions".to_string(),
                value: "[]".to_string(),
                hint: "List at least one extension, for example [\"ts\", \"tsx\"]".to_string(),
            }
            .into());
        }

        if let Some(bad) = self.extensions.iter().find(|ext| ext.is_empty() || ext.starts_with('.')) {
            return Err(ConfigError::InvalidValue {
                field: "extensions".to_string(),
                value: format!("{bad:?}"),
                hint: "Write extensions without the leading dot, for example \"tsx\"".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
