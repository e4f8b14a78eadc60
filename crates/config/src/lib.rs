use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Represents the full CLI configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Config {
    /// Load configuration from the provided path or the default config file.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Unable to read config file at {}", path.display()))?;

        serde_yaml::from_str(&raw)
            .with_context(|| format!("Malformed YAML in config file {}", path.display()))
    }

    /// Persist the configuration to disk, creating parent directories if needed.
    pub fn save<P: AsRef<Path>>(&self, path: Option<P>) -> Result<()> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Unable to create config directory {}", parent.display())
            })?;
        }

        let serialized = serde_yaml::to_string(self)?;
        fs::write(&path, serialized)
            .with_context(|| format!("Unable to write config file {}", path.display()))?;

        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Returns either the requested profile or falls back to the default one,
    /// then to any configured profile.
    pub fn resolve_profile<'a>(
        &'a self,
        requested: Option<&'a str>,
    ) -> Option<(&'a str, &'a Profile)> {
        if let Some(name) = requested {
            self.profiles.get(name).map(|profile| (name, profile))
        } else if let Some(default_name) = self.default_profile.as_deref() {
            self.profiles
                .get(default_name)
                .map(|profile| (default_name, profile))
        } else {
            self.profiles
                .iter()
                .min_by(|a, b| a.0.cmp(b.0))
                .map(|(name, profile)| (name.as_str(), profile))
        }
    }

    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".zendesk-cli");
        path.push("config.yaml");
        path
    }
}

/// One Zendesk account. Values are optional so that tokens can live in the
/// environment instead of the file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Profile {
    /// Account subdomain, as in `{subdomain}.zendesk.com`.
    #[serde(default)]
    pub subdomain: Option<String>,
    /// Full API base URL. Takes precedence over `subdomain`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Profile {
    pub fn api_base_url(&self) -> Option<String> {
        self.base_url.clone().or_else(|| {
            self.subdomain
                .as_deref()
                .map(|sub| format!("https://{sub}.zendesk.com/api/v2"))
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn profile_for(subdomain: &str) -> Profile {
        Profile {
            subdomain: Some(subdomain.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load(Some("/nonexistent/config.yaml")).unwrap();
        assert!(config.default_profile.is_none());
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = Config {
            default_profile: Some("support".to_string()),
            ..Default::default()
        };

        let profile = Profile {
            subdomain: Some("acme".to_string()),
            email: Some("agent@example.com".to_string()),
            timeout_secs: Some(10),
            ..Default::default()
        };
        config.profiles.insert("support".to_string(), profile);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        config.save(Some(&path)).unwrap();
        let loaded = Config::load(Some(&path)).unwrap();

        assert_eq!(loaded.default_profile, Some("support".to_string()));
        let support = loaded.profile("support").unwrap();
        assert_eq!(support.subdomain.as_deref(), Some("acme"));
        assert_eq!(support.email.as_deref(), Some("agent@example.com"));
        assert_eq!(support.timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_load_malformed_yaml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "profiles: [unclosed").unwrap();

        let result = Config::load(Some(temp_file.path()));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Malformed YAML"));
    }

    #[test]
    fn test_load_partial_profile() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "profiles:\n  work:\n    subdomain: acme\n").unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        let work = config.profile("work").unwrap();
        assert!(work.email.is_none());
        assert!(work.timeout().is_none());
    }

    #[test]
    fn test_resolve_profile_requested() {
        let mut config = Config {
            default_profile: Some("default".to_string()),
            ..Default::default()
        };
        config
            .profiles
            .insert("default".to_string(), profile_for("default"));
        config.profiles.insert("work".to_string(), profile_for("work"));

        let (name, profile) = config.resolve_profile(Some("work")).unwrap();
        assert_eq!(name, "work");
        assert_eq!(profile.subdomain.as_deref(), Some("work"));
    }

    #[test]
    fn test_resolve_profile_default() {
        let mut config = Config {
            default_profile: Some("default".to_string()),
            ..Default::default()
        };
        config
            .profiles
            .insert("default".to_string(), profile_for("default"));
        config.profiles.insert("other".to_string(), profile_for("other"));

        let (name, _) = config.resolve_profile(None).unwrap();
        assert_eq!(name, "default");
    }

    #[test]
    fn test_resolve_profile_first_available() {
        let mut config = Config::default();
        config.profiles.insert("beta".to_string(), profile_for("b"));
        config.profiles.insert("alpha".to_string(), profile_for("a"));

        let (name, _) = config.resolve_profile(None).unwrap();
        assert_eq!(name, "alpha");
    }

    #[test]
    fn test_resolve_profile_none_available() {
        let config = Config::default();
        assert!(config.resolve_profile(None).is_none());
        assert!(config.resolve_profile(Some("missing")).is_none());
    }

    #[test]
    fn test_api_base_url_from_subdomain() {
        assert_eq!(
            profile_for("acme").api_base_url().as_deref(),
            Some("https://acme.zendesk.com/api/v2")
        );
    }

    #[test]
    fn test_api_base_url_prefers_explicit_url() {
        let profile = Profile {
            subdomain: Some("acme".to_string()),
            base_url: Some("http://localhost:8080/api/v2".to_string()),
            ..Default::default()
        };
        assert_eq!(
            profile.api_base_url().as_deref(),
            Some("http://localhost:8080/api/v2")
        );
        assert!(Profile::default().api_base_url().is_none());
    }
}
