use super::{ConfigDocument, ConfigError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Loads and saves the config document at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document, falling back to the built-in config when the file
    /// does not exist. Any other failure is returned.
    pub async fn load(&self) -> Result<ConfigDocument, ConfigError> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|source| ConfigError::Read {
                path: self.path.clone(),
                source,
            })?;

        if !exists {
            info!(
                "No config file at {}, using built-in configuration",
                self.path.display()
            );
            return Ok(ConfigDocument::builtin());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ConfigError::Read {
                path: self.path.clone(),
                source,
            })?;

        let document = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        info!("Loaded config from {}", self.path.display());
        Ok(document)
    }

    pub async fn save(&self, document: &ConfigDocument) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisMapping;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_yields_builtin() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));

        let document = store.load().await.unwrap();
        assert_eq!(document, ConfigDocument::builtin());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[axes\nbroken = ").unwrap();

        let err = ConfigStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn saved_document_loads_back() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.toml"));

        let mut document = ConfigDocument::builtin();
        document.set_axis_mapping("throttle", AxisMapping::Direct(6));
        document.kill_switch.parsed_mut().unwrap().button = Some(11);
        store.save(&document).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, document);
        assert_eq!(loaded.axis_mapping("throttle"), Some(&AxisMapping::Direct(6)));
    }

    #[tokio::test]
    async fn combo_order_survives_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [bindings.combos.zeta]
            trigger = 1
            [bindings.combos.alpha]
            trigger = 2
            "#,
        )
        .unwrap();

        let store = ConfigStore::new(&path);
        let document = store.load().await.unwrap();
        store.save(&document).await.unwrap();
        let reloaded = store.load().await.unwrap();

        let names: Vec<&str> = reloaded
            .bindings
            .combos
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, ["zeta", "alpha"]);
    }
}
