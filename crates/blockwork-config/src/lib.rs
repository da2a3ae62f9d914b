use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid theme fragment pattern \"{pattern}\": {source}")]
    FragmentPatternError {
        pattern: String,
        source: glob::PatternError,
    },
}

/// Block services and theme files of a blockwork setup.
///
/// ```toml
/// [theme]
/// fragments = ["~/themes/blockwork/*.html"]
///
/// [[services]]
/// id = "app.block.type.panel"
/// class = "panel"
/// tags = [{ name = "blockwork.type" }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Glob patterns of template fragment files. A file registers a fragment
    /// named after its stem, so `text_widget.html` overrides `text_widget`.
    #[serde(default)]
    pub fragments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub id: String,
    pub class: String,
    #[serde(default = "default_public")]
    pub public: bool,
    #[serde(default)]
    pub tags: Vec<TagConfig>,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagConfig {
    pub name: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

/// A theme file matched by one of the fragment patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentFile {
    pub name: String,
    pub path: PathBuf,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockwork");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Files matched by the theme fragment patterns, after `~` and
    /// environment expansion. Unreadable matches are skipped.
    pub fn fragment_files(&self) -> Result<Vec<FragmentFile>, ConfigError> {
        let mut files = Vec::new();
        for pattern in &self.theme.fragments {
            let expanded = Self::expand_pattern(pattern);
            let paths = glob::glob(&expanded).map_err(|source| ConfigError::FragmentPatternError {
                pattern: pattern.clone(),
                source,
            })?;

            for path in paths.flatten() {
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                files.push(FragmentFile {
                    name: name.to_string(),
                    path,
                });
            }
        }
        Ok(files)
    }

    fn expand_pattern(pattern: &str) -> String {
        match shellexpand::full(pattern) {
            Ok(expanded) => expanded.into_owned(),
            Err(_) => pattern.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/blockwork/config.toml"));
    }

    #[test]
    fn test_services_with_tag_attributes() {
        let config: Config = toml::from_str(
            r#"
[[services]]
id = "app.block.type.panel"
class = "panel"
tags = [{ name = "blockwork.type" }]

[[services]]
id = "app.block.ext.help"
class = "help"
public = false

[[services.tags]]
name = "blockwork.type_extension"
extended_type = "text"
"#,
        )
        .unwrap();

        assert_eq!(config.services.len(), 2);
        assert!(config.services[0].public);
        assert_eq!(config.services[0].tags[0].name, "blockwork.type");
        assert!(config.services[0].tags[0].attributes.is_empty());

        let extension = &config.services[1];
        assert!(!extension.public);
        assert_eq!(
            extension.tags[0].attributes,
            BTreeMap::from([("extended_type".to_string(), "text".to_string())])
        );
        assert!(config.theme.fragments.is_empty());
    }

    #[test]
    fn test_fragment_files_expand_env_vars_and_globs() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("text_widget.html"), "<input>").unwrap();
        std::fs::write(temp_dir.path().join("panel_row.html"), "<li></li>").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        unsafe {
            env::set_var("BLOCKWORK_TEST_THEME", temp_dir.path());
        }
        let config = Config {
            theme: ThemeConfig {
                fragments: vec!["$BLOCKWORK_TEST_THEME/*.html".to_string()],
            },
            services: vec![],
        };

        let mut names: Vec<String> = config
            .fragment_files()
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["panel_row", "text_widget"]);

        unsafe {
            env::remove_var("BLOCKWORK_TEST_THEME");
        }
    }

    #[test]
    fn test_invalid_fragment_pattern() {
        let config = Config {
            theme: ThemeConfig {
                fragments: vec!["/tmp/[".to_string()],
            },
            services: vec![],
        };

        assert!(matches!(
            config.fragment_files(),
            Err(ConfigError::FragmentPatternError { .. })
        ));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[[services]]\nid = 3\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            theme: ThemeConfig {
                fragments: vec!["~/themes/*.html".to_string()],
            },
            services: vec![ServiceConfig {
                id: "app.block.type.panel".to_string(),
                class: "panel".to_string(),
                public: true,
                tags: vec![TagConfig {
                    name: "blockwork.type".to_string(),
                    attributes: BTreeMap::new(),
                }],
            }],
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
