//! Configuration file support.
//!
//! Loads an [`crate::engine::EngineConfig`] from a YAML, TOML, or JSON file,
//! dispatching on the file extension the way the teacher's loader did,
//! adapted from flattening arbitrary JSON into CLI args to deserializing
//! straight into the engine's own config struct via `serde`.
//!
//! # Supported formats
//!
//! - YAML (.yaml, .yml)
//! - TOML (.toml)
//! - JSON (.json)

use crate::engine::EngineConfig;
use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Mirrors [`EngineConfig`] with every field optional, so a config file only
/// needs to set the values it wants to override.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub undo_cmd: Option<String>,
    pub manual_cmd: Option<String>,
    pub idle_timeout_secs: Option<u64>,
    pub default_view: Option<u32>,
    pub undo_view_mask: Option<u32>,
}

impl ConfigFile {
    /// Layer this file's overrides onto `base`, leaving unset fields alone.
    pub fn apply(&self, mut base: EngineConfig) -> EngineConfig {
        if let Some(v) = &self.undo_cmd {
            base.undo_cmd = v.clone();
        }
        if let Some(v) = &self.manual_cmd {
            base.manual_cmd = v.clone();
        }
        if let Some(v) = self.idle_timeout_secs {
            base.idle_timeout_secs = v;
        }
        if let Some(v) = self.default_view {
            base.default_view = v;
        }
        if let Some(v) = self.undo_view_mask {
            base.undo_view_mask = v;
        }
        base
    }
}

/// Locates and parses a config file, then layers it onto a base
/// [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    default_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            path: None,
            default_paths: vec![
                PathBuf::from("engine.yaml"),
                PathBuf::from("engine.yml"),
                PathBuf::from("engine.toml"),
                PathBuf::from("engine.json"),
            ],
        }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_default_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.default_paths.push(path.as_ref().to_path_buf());
        self
    }

    fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(p) = &self.path {
            return Ok(p.clone());
        }
        self.default_paths.iter().find(|p| p.exists()).cloned().ok_or(EngineError::ConfigNotFound)
    }

    /// Load and parse the resolved file into a [`ConfigFile`].
    pub fn load(&self) -> Result<ConfigFile> {
        let path = self.resolve_path()?;
        ConfigFile::from_file(&path)
    }

    /// Load, falling back to an all-default [`ConfigFile`] when no file is
    /// found at all — a missing config is not an error, an unparsable one
    /// still is.
    pub fn load_optional(&self) -> Result<ConfigFile> {
        match self.resolve_path() {
            Ok(path) => ConfigFile::from_file(&path),
            Err(EngineError::ConfigNotFound) => Ok(ConfigFile::default()),
            Err(e) => Err(e),
        }
    }

    /// Resolve, parse, and apply onto `base` in one call.
    pub fn load_onto(&self, base: EngineConfig) -> Result<EngineConfig> {
        Ok(self.load_optional()?.apply(base))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading engine config file");
        let content = std::fs::read_to_string(path).map_err(EngineError::ConfigRead)?;
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("json");
        let parsed = match extension {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(EngineError::ConfigYaml),
            "toml" => toml::from_str(&content).map_err(EngineError::ConfigToml),
            _ => serde_json::from_str(&content).map_err(EngineError::ConfigJson),
        };
        if let Err(ref err) = parsed {
            warn!(path = %path.display(), %err, "failed to parse engine config file");
        }
        parsed
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(EngineError::ConfigJson)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        serde_yaml::from_str(yaml_str).map_err(EngineError::ConfigYaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_parses_partial_overrides() {
        let cfg = ConfigFile::from_json(r#"{"undo_cmd": "undo", "idle_timeout_secs": 60}"#).unwrap();
        assert_eq!(cfg.undo_cmd.as_deref(), Some("undo"));
        assert_eq!(cfg.idle_timeout_secs, Some(60));
        assert_eq!(cfg.manual_cmd, None);
    }

    #[test]
    fn from_yaml_parses() {
        let cfg = ConfigFile::from_yaml("undo_cmd: no\nmanual_cmd: help\n").unwrap();
        assert_eq!(cfg.undo_cmd.as_deref(), Some("no"));
        assert_eq!(cfg.manual_cmd.as_deref(), Some("help"));
    }

    #[test]
    fn apply_only_overrides_set_fields() {
        let base = EngineConfig::default();
        let cfg = ConfigFile { undo_cmd: Some("undo".to_string()), ..Default::default() };
        let merged = cfg.apply(base.clone());
        assert_eq!(merged.undo_cmd, "undo");
        assert_eq!(merged.manual_cmd, base.manual_cmd);
    }

    #[test]
    fn explicit_missing_path_still_errors_even_for_load_optional() {
        let loader = ConfigLoader::new().with_path("/nonexistent/path/does-not-exist.yaml");
        assert!(loader.load_optional().is_err());
    }

    #[test]
    fn no_path_and_no_default_found_yields_default_config_via_load_optional() {
        let loader = ConfigLoader { path: None, default_paths: vec![PathBuf::from("/nonexistent/default.yaml")] };
        let cfg = loader.load_optional().unwrap();
        assert_eq!(cfg.undo_cmd, None);
    }

    #[test]
    fn loads_and_applies_a_real_yaml_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "undo_cmd: undo\nidle_timeout_secs: 45\n").unwrap();

        let loaded = ConfigLoader::new().with_path(&path).load_onto(EngineConfig::default()).unwrap();
        assert_eq!(loaded.undo_cmd, "undo");
        assert_eq!(loaded.idle_timeout_secs, 45);
        assert_eq!(loaded.manual_cmd, EngineConfig::default().manual_cmd);
    }

    #[test]
    fn a_default_path_that_exists_in_a_temp_dir_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "manual_cmd = \"help\"\n").unwrap();

        let loader = ConfigLoader { path: None, default_paths: vec![path] };
        let cfg = loader.load().unwrap();
        assert_eq!(cfg.manual_cmd.as_deref(), Some("help"));
    }
}
