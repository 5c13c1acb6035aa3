//! User configuration for the email agent
//!
//! A single JSON document holding the user's name, preferred email style and
//! the contact book. Every accessor re-reads the file and every mutator writes
//! the whole document back; nothing is cached between calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "EMAIL_AGENT_CONFIG";

/// File name used under the home directory
pub const CONFIG_FILE_NAME: &str = ".email_agent_config.json";

const DEFAULT_USER_NAME: &str = "Name";
const DEFAULT_EMAIL_STYLE: &str = "professional and semi-casual";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Could not determine home directory for the config file")]
    NoHomeDir,
}

/// The persisted user document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Display name used in the agent instructions
    pub user_name: String,

    /// Free-text style descriptor ("casual", "formal", ...)
    pub email_style: String,

    /// Lower-cased contact name -> email address
    pub contacts: BTreeMap<String, String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            user_name: DEFAULT_USER_NAME.to_string(),
            email_style: DEFAULT_EMAIL_STYLE.to_string(),
            contacts: BTreeMap::new(),
        }
    }
}

/// Contact names are case-insensitive
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Handle to the on-disk config document
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$EMAIL_AGENT_CONFIG`, or `~/.email_agent_config.json`
    pub fn default_location() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.is_empty() {
                return Ok(Self::new(path));
            }
        }

        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::new(home.join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document.
    ///
    /// A missing file is created with the defaults. A file that exists but
    /// does not parse is left untouched and the defaults are returned.
    pub fn load(&self) -> Result<UserConfig, ConfigError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Creating default config");
                let config = UserConfig::default();
                self.save(&config)?;
                return Ok(config);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Config file is not valid, using defaults"
                );
                Ok(UserConfig::default())
            }
        }
    }

    /// Overwrite the file with the full document (2-space pretty JSON)
    pub fn save(&self, config: &UserConfig) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, json).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }

    pub fn user_name(&self) -> Result<String, ConfigError> {
        Ok(self.load()?.user_name)
    }

    pub fn set_user_name(&self, name: &str) -> Result<UserConfig, ConfigError> {
        self.update(|config| config.user_name = name.to_string())
    }

    pub fn email_style(&self) -> Result<String, ConfigError> {
        Ok(self.load()?.email_style)
    }

    pub fn set_email_style(&self, style: &str) -> Result<UserConfig, ConfigError> {
        self.update(|config| config.email_style = style.to_string())
    }

    /// Look up a contact by name, ignoring case
    pub fn contact_email(&self, name: &str) -> Result<Option<String>, ConfigError> {
        let mut config = self.load()?;
        Ok(config.contacts.remove(&normalize_name(name)))
    }

    /// Insert or replace a contact. The address is stored as given.
    pub fn add_contact(&self, name: &str, email: &str) -> Result<UserConfig, ConfigError> {
        let key = normalize_name(name);
        tracing::debug!(contact = %key, "Saving contact");
        self.update(|config| {
            config.contacts.insert(key, email.to_string());
        })
    }

    pub fn all_contacts(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        Ok(self.load()?.contacts)
    }

    fn update(&self, apply: impl FnOnce(&mut UserConfig)) -> Result<UserConfig, ConfigError> {
        let mut config = self.load()?;
        apply(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, ConfigStore) {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.json"));
        (temp, store)
    }

    #[test]
    fn test_load_creates_missing_file() {
        let (_temp, store) = temp_store();
        assert!(!store.path().exists());

        let config = store.load().unwrap();
        assert_eq!(config, UserConfig::default());
        assert!(store.path().exists());

        let on_disk: UserConfig =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, UserConfig::default());
    }

    #[test]
    fn test_load_invalid_json_leaves_file_untouched() {
        let (_temp, store) = temp_store();
        let garbage = b"{ \"user_name\": \"Ann\", oops";
        std::fs::write(store.path(), garbage).unwrap();

        let config = store.load().unwrap();
        assert_eq!(config, UserConfig::default());
        assert_eq!(std::fs::read(store.path()).unwrap(), garbage);
    }

    #[test]
    fn test_load_missing_field_is_treated_as_corrupt() {
        let (_temp, store) = temp_store();
        let partial = br#"{"user_name": "Ann"}"#;
        std::fs::write(store.path(), partial).unwrap();

        assert_eq!(store.load().unwrap(), UserConfig::default());
        assert_eq!(std::fs::read(store.path()).unwrap(), partial);
    }

    #[test]
    fn test_save_is_pretty_printed() {
        let (_temp, store) = temp_store();
        store.add_contact("Mom", "mom@example.com").unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("\n  \"user_name\": \"Name\""));
        assert!(content.contains("\n    \"mom\": \"mom@example.com\""));
    }

    #[test]
    fn test_contact_lookup_ignores_case() {
        let (_temp, store) = temp_store();
        store.add_contact("Mom", "Mom.Smith@Example.com").unwrap();

        for name in ["Mom", "mom", "MOM", "mOm"] {
            assert_eq!(
                store.contact_email(name).unwrap().as_deref(),
                Some("Mom.Smith@Example.com")
            );
        }
    }

    #[test]
    fn test_add_contact_round_trips_exact_value() {
        let (_temp, store) = temp_store();
        let updated = store.add_contact("John Doe", "not even an address").unwrap();

        assert_eq!(
            updated.contacts.get("john doe").map(String::as_str),
            Some("not even an address")
        );
        assert_eq!(
            store.contact_email("John Doe").unwrap().as_deref(),
            Some("not even an address")
        );
    }

    #[test]
    fn test_add_contact_replaces_existing() {
        let (_temp, store) = temp_store();
        store.add_contact("dad", "old@example.com").unwrap();
        store.add_contact("DAD", "new@example.com").unwrap();

        let contacts = store.all_contacts().unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts["dad"], "new@example.com");
    }

    #[test]
    fn test_unknown_contact_is_none() {
        let (_temp, store) = temp_store();
        assert_eq!(store.contact_email("nobody").unwrap(), None);
    }

    #[test]
    fn test_field_setters_persist() {
        let (_temp, store) = temp_store();
        store.set_user_name("Ada").unwrap();
        store.set_email_style("formal").unwrap();

        let reopened = ConfigStore::new(store.path());
        assert_eq!(reopened.user_name().unwrap(), "Ada");
        assert_eq!(reopened.email_style().unwrap(), "formal");
    }

    #[test]
    fn test_mutation_over_corrupt_file_starts_from_defaults() {
        let (_temp, store) = temp_store();
        std::fs::write(store.path(), "not json").unwrap();

        let updated = store.add_contact("sam", "sam@example.com").unwrap();
        assert_eq!(updated.user_name, "Name");
        assert_eq!(store.contact_email("sam").unwrap().as_deref(), Some("sam@example.com"));
    }
}
