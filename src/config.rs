use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub ai: AiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AiConfig {
    pub model: String,
    /// Chat-completion endpoint override; the OpenRouter default applies
    /// when unset.
    #[serde(default)]
    pub api_url: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            api_url: None,
        }
    }
}

impl Config {
    pub fn create_default(path: &Path) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn load_or_create() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            Self::create_default(&config_path)?;
            println!("Created default config file at {:?}", config_path);
        }
        Self::load(&config_path)
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "quill", "quill")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

pub fn favorites_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("favorites.json"))
}

pub fn profiles_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("profiles.json"))
}

pub fn credential_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("credential.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_model() {
        let config = Config::default();
        assert_eq!(config.ai.model, "openai/gpt-4o-mini");
        assert!(config.ai.api_url.is_none());
    }

    #[test]
    fn test_create_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::create_default(&path).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.ai.model, "openai/gpt-4o-mini");
    }

    #[test]
    fn test_api_url_is_optional_in_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ai]\nmodel = \"anthropic/claude-3-haiku\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.ai.model, "anthropic/claude-3-haiku");
        assert!(config.ai.api_url.is_none());
    }
}
