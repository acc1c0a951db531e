use crate::status::StatusFormat;
use derive_more::{Display, From};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, From, Display)]
pub enum ConfigError {
    #[display(fmt = "Unable to read config file: {}", _0)]
    IO(io::Error),
    #[display(fmt = "Config file is not valid: {}", _0)]
    Parse(serde_json::Error),
    #[display(fmt = "Unknown preset \"{}\"", _0)]
    #[from(ignore)]
    UnknownPreset(String),
    #[display(fmt = "Invalid config: {}", _0)]
    #[from(ignore)]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Placeholder replaced by the commit tag in the commit message
pub const TAG_PLACEHOLDER: &str = "{tag}";

const DEFAULT_COMMIT_MESSAGE: &str = "Automatic grapher update from commit {tag}";
const DEFAULT_TAG_COMMAND: &str = "./getCommitTag.pl";

const ENV_WIDGETS_REPO: &str = "WIDGET_SYNC_WIDGETS_REPO";
const ENV_DESTINATION_REPO: &str = "WIDGET_SYNC_DESTINATION_REPO";
const ENV_TAG_COMMAND: &str = "WIDGET_SYNC_TAG_COMMAND";

/// A source directory in the widgets repository and where it is
/// published inside the destination repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub source: String,
    pub destination: String,
}

/// Order in which the old published copy is cleared out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalOrder {
    /// Delete the directory from disk first, then record the removal
    /// with `git rm`
    #[default]
    DeleteThenUnstage,
    /// `git rm` the directory first, then delete whatever untracked
    /// files git left behind
    UnstageThenDelete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub widgets_repo: PathBuf,
    pub destination_repo: PathBuf,
    /// Command printing the commit tag. `None` asks git directly
    pub tag_command: Option<String>,
    pub mappings: Vec<Mapping>,
    pub removal_order: RemovalOrder,
    pub status_format: StatusFormat,
    pub commit_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::layout("../website", "public/grapher2", RemovalOrder::DeleteThenUnstage)
    }
}

/// Names accepted by [`Config::preset`]
pub const PRESETS: &[&str] = &["website", "fluxtream"];

impl Config {
    /// Built in layouts for the known destination repositories
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "website" => Some(Self::default()),
            "fluxtream" => Some(Self::layout(
                "../fluxtream-app",
                "fluxtream-web/src/main/webapp/static/grapher4",
                RemovalOrder::UnstageThenDelete,
            )),
            _ => None,
        }
    }

    fn layout(destination_repo: &str, destination: &str, removal_order: RemovalOrder) -> Self {
        Self {
            widgets_repo: PathBuf::from("."),
            destination_repo: PathBuf::from(destination_repo),
            tag_command: Some(DEFAULT_TAG_COMMAND.to_string()),
            mappings: vec![Mapping {
                source: "war/grapher2".to_string(),
                destination: destination.to_string(),
            }],
            removal_order,
            status_format: StatusFormat::default(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }

    pub fn from_preset(name: &str) -> ConfigResult<Self> {
        Self::preset(name).ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    /// Loads a JSON config file. Missing fields take the default
    /// (`website`) values
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Applies overrides from the environment, loading a `.env` file
    /// from the working directory if one exists
    pub fn apply_env(&mut self) {
        dotenv::dotenv().ok();
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var(ENV_WIDGETS_REPO) {
            self.widgets_repo = PathBuf::from(value);
        }
        if let Some(value) = var(ENV_DESTINATION_REPO) {
            self.destination_repo = PathBuf::from(value);
        }
        if let Some(value) = var(ENV_TAG_COMMAND) {
            self.tag_command = if value.trim().is_empty() {
                None
            } else {
                Some(value)
            };
        }
    }

    /// Rejects configs that would delete or copy outside of the two
    /// repositories
    pub fn validate(&self) -> ConfigResult<()> {
        if self.mappings.is_empty() {
            return Err(ConfigError::Invalid("no directory mappings configured".to_string()));
        }
        for mapping in &self.mappings {
            check_relative("source", &mapping.source)?;
            check_relative("destination", &mapping.destination)?;
        }
        if !self.commit_message.contains(TAG_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "commit message must contain {TAG_PLACEHOLDER}"
            )));
        }
        Ok(())
    }
}

fn check_relative(kind: &str, value: &str) -> ConfigResult<()> {
    let path = Path::new(value);
    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "{kind} path \"{value}\" must stay inside its repository"
                )))
            }
        }
    }
    if normal == 0 {
        return Err(ConfigError::Invalid(format!(
            "{kind} path \"{value}\" must name a directory inside its repository"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::config::{Config, ConfigError, Mapping, RemovalOrder, PRESETS};
    use crate::status::StatusFormat;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn presets_are_valid() {
        for name in PRESETS {
            let config = Config::from_preset(name).unwrap();
            config.validate().unwrap();
            assert_eq!(config.mappings[0].source, "war/grapher2");
        }
        assert!(matches!(
            Config::from_preset("nope"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn fluxtream_preset_layout() {
        let config = Config::from_preset("fluxtream").unwrap();
        assert_eq!(config.destination_repo, PathBuf::from("../fluxtream-app"));
        assert_eq!(
            config.mappings[0].destination,
            "fluxtream-web/src/main/webapp/static/grapher4"
        );
        assert_eq!(config.removal_order, RemovalOrder::UnstageThenDelete);
    }

    #[test]
    fn parse_fills_defaults() {
        let config = Config::parse(
            r#"{
                "destination_repo": "/srv/site",
                "mappings": [{"source": "war/app", "destination": "static/app"}],
                "status_format": "text",
                "removal_order": "unstage_then_delete"
            }"#,
        )
        .unwrap();
        assert_eq!(config.destination_repo, PathBuf::from("/srv/site"));
        assert_eq!(config.widgets_repo, PathBuf::from("."));
        assert_eq!(config.status_format, StatusFormat::Text);
        assert_eq!(config.removal_order, RemovalOrder::UnstageThenDelete);
        assert_eq!(
            config.mappings,
            vec![Mapping {
                source: "war/app".to_string(),
                destination: "static/app".to_string()
            }]
        );
        assert_eq!(config.commit_message, "Automatic grapher update from commit {tag}");
    }

    #[test]
    fn parse_rejects_bad_json() {
        assert!(matches!(Config::parse("{"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::parse(r#"{"removal_order": "sideways"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("WIDGET_SYNC_WIDGETS_REPO", "/work/widgets"),
            ("WIDGET_SYNC_DESTINATION_REPO", "/work/site"),
            ("WIDGET_SYNC_TAG_COMMAND", ""),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_vars(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(config.widgets_repo, PathBuf::from("/work/widgets"));
        assert_eq!(config.destination_repo, PathBuf::from("/work/site"));
        assert_eq!(config.tag_command, None);
    }

    #[test]
    fn validate_rejects_escaping_paths() {
        let mut config = Config::default();
        for bad in ["../other", "/etc", "", ".", "public/../../x"] {
            config.mappings = vec![Mapping {
                source: "war".to_string(),
                destination: bad.to_string(),
            }];
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{bad} should be rejected"
            );
        }

        config.mappings.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_tag_placeholder() {
        let mut config = Config::default();
        config.commit_message = "Update widgets".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
