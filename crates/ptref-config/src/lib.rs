//! Configuration management for ptref.
//!
//! Parses optional `ptref.toml` files with serde and discovers them in the
//! current directory or its parents. CLI flags are applied on top via
//! [`CliSettings`].
//!
//! ```toml
//! [references]
//! duplicates = "reuse"   # or "renumber"
//!
//! [input]
//! max_size = 10485760
//!
//! [output]
//! suffix = "_plaintext"
//! directory = "${HOME}/footnoted"
//!
//! [html]
//! start_marker = "Article"
//! ```
//!
//! `output.suffix`, `output.directory` and `html.start_marker` support
//! `${VAR}` and `${VAR:-default}` expansion.

mod expand;

use std::path::{Path, PathBuf};

use ptref_core::DuplicateMode;
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ptref.toml";

/// Default output filename suffix.
const DEFAULT_SUFFIX: &str = "_plaintext";

/// Default input size limit (10 MiB).
const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override duplicate citation handling.
    pub duplicates: Option<DuplicateMode>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override output filename suffix.
    pub suffix: Option<String>,
    /// Override HTML start marker.
    pub start_marker: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Footnote numbering.
    pub references: ReferencesConfig,
    /// Input limits.
    pub input: InputConfig,
    /// Output naming as written in TOML.
    output: OutputConfigRaw,
    /// HTML conversion.
    pub html: HtmlConfig,

    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Footnote numbering configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReferencesConfig {
    /// How repeat citations are numbered.
    pub duplicates: DuplicateMode,
}

/// Input configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Largest accepted input file, in bytes.
    pub max_size: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// Raw output configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    suffix: Option<String>,
    directory: Option<String>,
}

/// Resolved output configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Appended to the input file stem.
    pub suffix: String,
    /// Directory for output files; `None` writes next to the input.
    pub directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_owned(),
            directory: None,
        }
    }
}

/// HTML conversion configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// Text where the converted document starts.
    pub start_marker: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`output.directory`").
        field: String,
        /// Error message (e.g., "${`OUT_DIR`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// Uses `config_path` when given, otherwise searches for `ptref.toml`
    /// in the current directory and its parents, falling back to defaults.
    /// CLI settings win over file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(duplicates) = settings.duplicates {
            self.references.duplicates = duplicates;
        }
        if let Some(output_dir) = &settings.output_dir {
            self.output_resolved.directory = Some(output_dir.clone());
        }
        if let Some(suffix) = &settings.suffix {
            self.output_resolved.suffix.clone_from(suffix);
        }
        if let Some(start_marker) = &settings.start_marker {
            self.html.start_marker = Some(start_marker.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.max_size == 0 {
            return Err(ConfigError::Validation(
                "input.max_size must be greater than 0".to_owned(),
            ));
        }

        let suffix = &self.output_resolved.suffix;
        if suffix.is_empty() {
            return Err(ConfigError::Validation(
                "output.suffix cannot be empty".to_owned(),
            ));
        }
        if suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.suffix cannot contain path separators".to_owned(),
            ));
        }

        if self
            .html
            .start_marker
            .as_deref()
            .is_some_and(|marker| marker.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "html.start_marker cannot be blank".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref suffix) = self.output.suffix {
            self.output.suffix = Some(expand::expand_env(suffix, "output.suffix")?);
        }
        if let Some(ref directory) = self.output.directory {
            self.output.directory = Some(expand::expand_env(directory, "output.directory")?);
        }
        if let Some(ref marker) = self.html.start_marker {
            self.html.start_marker = Some(expand::expand_env(marker, "html.start_marker")?);
        }
        Ok(())
    }

    /// Resolve the output directory against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.output_resolved = OutputConfig {
            suffix: self
                .output
                .suffix
                .clone()
                .unwrap_or_else(|| DEFAULT_SUFFIX.to_owned()),
            directory: self.output.directory.as_deref().map(|d| config_dir.join(d)),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.references.duplicates, DuplicateMode::Reuse);
        assert_eq!(config.input.max_size, 10 * 1024 * 1024);
        assert_eq!(config.output_resolved.suffix, "_plaintext");
        assert!(config.output_resolved.directory.is_none());
        assert!(config.html.start_marker.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.references.duplicates, DuplicateMode::Reuse);
        assert_eq!(config.input.max_size, DEFAULT_MAX_SIZE);
    }

    #[test]
    fn test_parse_renumber_mode() {
        let toml = r#"
[references]
duplicates = "renumber"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.references.duplicates, DuplicateMode::Renumber);
    }

    #[test]
    fn test_parse_unknown_duplicate_mode_fails() {
        let toml = r#"
[references]
duplicates = "merge"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[output]
suffix = "_fn"
directory = "out"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.output_resolved,
            OutputConfig {
                suffix: "_fn".to_owned(),
                directory: Some(PathBuf::from("/project/out")),
            }
        );
    }

    #[test]
    fn test_absolute_output_directory_is_kept() {
        let toml = r#"
[output]
directory = "/var/footnotes"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(
            config.output_resolved.directory,
            Some(PathBuf::from("/var/footnotes"))
        );
        assert_eq!(config.output_resolved.suffix, "_plaintext");
    }

    #[test]
    fn test_validate_zero_max_size() {
        let mut config = Config::default();
        config.input.max_size = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("input.max_size"));
    }

    #[test]
    fn test_validate_empty_suffix() {
        let mut config = Config::default();
        config.output_resolved.suffix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_suffix_with_separator() {
        let mut config = Config::default();
        config.output_resolved.suffix = "../evil".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("path separators"));
    }

    #[test]
    fn test_validate_blank_start_marker() {
        let mut config = Config::default();
        config.html.start_marker = Some("   ".to_owned());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        let settings = CliSettings {
            duplicates: Some(DuplicateMode::Renumber),
            suffix: Some("_notes".to_owned()),
            start_marker: Some("Begin".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&settings);

        assert_eq!(config.references.duplicates, DuplicateMode::Renumber);
        assert_eq!(config.output_resolved.suffix, "_notes");
        assert_eq!(config.html.start_marker.as_deref(), Some("Begin"));
        assert!(config.output_resolved.directory.is_none()); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty_keeps_values() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.output_resolved, OutputConfig::default());
        assert_eq!(config.references.duplicates, DuplicateMode::Reuse);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/ptref.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ptref.toml");
        std::fs::write(
            &path,
            "[output]\ndirectory = \"converted\"\n\n[input]\nmax_size = 2048\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.input.max_size, 2048);
        assert_eq!(
            config.output_resolved.directory,
            Some(dir.path().join("converted"))
        );
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_invalid_file_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ptref.toml");
        std::fs::write(&path, "[output]\nsuffix = \"\"\n").unwrap();

        let result = Config::load(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ptref.toml");
        std::fs::write(&path, "[output\n").unwrap();

        let result = Config::load(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_cli_settings_are_validated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ptref.toml");
        std::fs::write(&path, "").unwrap();
        let settings = CliSettings {
            suffix: Some(String::new()),
            ..Default::default()
        };

        let result = Config::load(Some(&path), Some(&settings));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
