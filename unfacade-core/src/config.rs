use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::RuleRegistry;

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE: &str = "unfacade.toml";

/// Top-level unfacade configuration, matching `unfacade.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnfacadeConfig {
    #[serde(default)]
    pub unfacade: UnfacadeSection,
    #[serde(default)]
    pub rules: RulesSection,
    #[serde(default)]
    pub files: FilesSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnfacadeSection {
    pub version: String,
}

impl Default for UnfacadeSection {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesSection {
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,
}

impl Default for RulesSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

fn default_enabled() -> Vec<String> {
    RuleRegistry::new()
        .names()
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesSection {
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for FilesSection {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

fn default_include() -> Vec<String> {
    vec!["**/*.ts".into(), "**/*.tsx".into()]
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".into(), "**/dist/**".into()]
}

impl UnfacadeConfig {
    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, which must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        Self::from_toml(&text)
    }

    /// Load `unfacade.toml` from `root`, falling back to defaults when absent.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject unknown rule names and malformed globs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let registry = RuleRegistry::new();
        if let Some(unknown) = self
            .rules
            .enabled
            .iter()
            .find(|name| registry.get(name).is_none())
        {
            return Err(ConfigError::Invalid(format!(
                "unknown rule `{unknown}` (known: {})",
                registry.names().join(", ")
            )));
        }
        for pattern in self.files.include.iter().chain(&self.files.exclude) {
            glob::Pattern::new(pattern)
                .map_err(|e| ConfigError::Invalid(format!("bad glob `{pattern}`: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_rule() {
        let config = UnfacadeConfig::from_toml("").unwrap();
        assert_eq!(
            config.rules.enabled,
            vec!["is-blank", "is-present", "string-map-wrapper"]
        );
        assert_eq!(config.files.include, default_include());
        assert_eq!(config.unfacade.version, "0.1.0");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = UnfacadeConfig::from_toml(
            "[rules]\nenabled = [\"is-blank\"]\n\n[files]\nexclude = [\"legacy/**\"]\n",
        )
        .unwrap();
        assert_eq!(config.rules.enabled, vec!["is-blank"]);
        assert_eq!(config.files.include, default_include());
        assert_eq!(config.files.exclude, vec!["legacy/**"]);
    }

    #[test]
    fn unknown_rule_is_rejected() {
        let err = UnfacadeConfig::from_toml("[rules]\nenabled = [\"is-blank\", \"is-nothing\"]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("is-nothing")));
    }

    #[test]
    fn bad_glob_and_bad_toml_are_rejected() {
        assert!(matches!(
            UnfacadeConfig::from_toml("[files]\ninclude = [\"src/[\"]\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            UnfacadeConfig::from_toml("[rules\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = UnfacadeConfig::discover(dir.path()).unwrap();
        assert_eq!(config.rules.enabled.len(), 3);

        std::fs::write(dir.path().join(CONFIG_FILE), "[rules]\nenabled = []\n").unwrap();
        let config = UnfacadeConfig::discover(dir.path()).unwrap();
        assert!(config.rules.enabled.is_empty());
    }

    #[test]
    fn missing_explicit_file_is_not_found() {
        let err = UnfacadeConfig::load(Path::new("/nonexistent/unfacade.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
