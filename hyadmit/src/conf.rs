use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AdmitError, AdmitResult},
    magic::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_CONFIG_PATH},
};

/// Switches controlling which admissibility checks the [`Verifier`](crate::driver::Verifier) runs.
///
/// Missing keys in a configuration file take their default value, so an empty file
/// enables every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissibilityOptions {
    /// Master switch. Nothing is checked when disabled.
    pub check_contract_admissibility: bool,

    /// Check the inferred read-effects of Confined and StateIndependent methods.
    pub check_read_effects: bool,
}

impl Default for AdmissibilityOptions {
    fn default() -> Self {
        Self {
            check_contract_admissibility: true,
            check_read_effects: true,
        }
    }
}

impl AdmissibilityOptions {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push(CONFIG_DIR_NAME);
        path.push(CONFIG_FILE_NAME);
        path
    }

    pub fn from_toml_str(toml_str: &str) -> AdmitResult<Self> {
        toml::from_str(toml_str).map_err(|source| AdmitError::ConfigParseError {
            source,
            file: "<string>".to_string(),
        })
    }

    pub fn load_from_toml(path: &Path) -> AdmitResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        toml::from_str(&toml_str).map_err(|source| AdmitError::ConfigParseError {
            source,
            file: path.display().to_string(),
        })
    }

    /// Load from [`AdmissibilityOptions::default_path`], falling back to the defaults
    /// when no file exists there.
    pub fn load_or_default() -> AdmitResult<Self> {
        let path = Self::default_path();
        if !path.exists() {
            debug!("No admissibility configuration at `{}`, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_toml(&path)
    }

    pub fn save_to_toml(&self, path: &Path) -> AdmitResult<()> {
        let toml_str = toml::to_string(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let options = AdmissibilityOptions::from_toml_str("check_read_effects = false\n").unwrap();
        assert!(options.check_contract_admissibility);
        assert!(!options.check_read_effects);

        let empty = AdmissibilityOptions::from_toml_str("").unwrap();
        assert_eq!(empty, AdmissibilityOptions::default());
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let err = AdmissibilityOptions::from_toml_str("check_read_effects = 3").unwrap_err();
        match &err {
            AdmitError::ConfigParseError { file, .. } => assert_eq!(file, "<string>"),
            other => panic!("expected a parse error, got {:?}", other),
        }
        assert!(err.to_string().starts_with("Failed to parse configuration file '<string>'"));
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("hyadmit-conf-{}", std::process::id()));
        let path = dir.join("nested").join(CONFIG_FILE_NAME);
        let options = AdmissibilityOptions {
            check_contract_admissibility: false,
            check_read_effects: true,
        };

        options.save_to_toml(&path).unwrap();
        assert_eq!(AdmissibilityOptions::load_from_toml(&path).unwrap(), options);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
