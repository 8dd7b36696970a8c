//! Engine configuration
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! strict_step_refs = false
//! max_depth = 128
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Reject steps that reference names which are neither inputs nor
    /// earlier steps at validation time. When off, such references only
    /// surface as unknown-symbol errors while running.
    #[serde(default = "default_strict_step_refs")]
    pub strict_step_refs: bool,

    /// Deepest expression nesting accepted
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_step_refs: default_strict_step_refs(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_strict_step_refs() -> bool {
    true
}

fn default_max_depth() -> usize {
    256
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Same config with lazy step-reference checking
    pub fn lenient(self) -> Self {
        Self {
            strict_step_refs: false,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.strict_step_refs);
        assert_eq!(config.max_depth, 256);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str("strict_step_refs = false").unwrap();
        assert!(!config.strict_step_refs);
        assert_eq!(config.max_depth, 256);

        let config = EngineConfig::from_toml_str("max_depth = 16").unwrap();
        assert!(config.strict_step_refs);
        assert_eq!(config.max_depth, 16);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EngineConfig::from_toml_str("strict = true").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/calcprog.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read /nonexistent/calcprog.toml"));
    }

    #[test]
    fn test_lenient() {
        let config = EngineConfig::default().lenient();
        assert!(!config.strict_step_refs);
    }
}
