use crate::{muted_error, weak_error};
use log::error;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;

/// Debug adapter related settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    /// Surface the development server terminal when a session starts.
    pub show_terminal_on_start: bool,
}

/// Build and deploy command lines.
///
/// Each argument may contain `{program}` and `{deviceId}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub command: Vec<String>,
    /// Optional deploy step, executed after a successful build.
    pub deploy: Vec<String>,
}

/// Application config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Runtime version required by the tooling.
    pub runtime_version: String,
    #[serde(default)]
    pub debugger: DebuggerConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

impl Default for Config {
    fn default() -> Self {
        let default_config = include_str!("preset/config.toml");
        toml::de::from_str(default_config).expect("should de")
    }
}

impl Config {
    const DEFAULT_PATH: &'static str = ".config/dslaunch/config.toml";

    /// Load config from file. Return [`None`] on errors.
    ///
    /// # Arguments
    ///
    /// * `path`: config file path, `~/.config/dslaunch/config.toml` if [`None`]
    pub fn from_file(path: Option<&Path>) -> Option<Self> {
        let data = match path {
            None => {
                let path = home::home_dir()?;
                let path = path.join(Self::DEFAULT_PATH);
                muted_error!(read_to_string(path))?
            }
            Some(path) => match read_to_string(path) {
                Ok(data) => data,
                Err(err) => {
                    error!(target: "config", "Error while load config file: {err}");
                    return None;
                }
            },
        };

        weak_error!(toml::de::from_str(&data), "config file:")
    }

    /// Load config from file, fallback to defaults on errors.
    pub fn load(path: Option<&Path>) -> Self {
        Self::from_file(path).unwrap_or_default()
    }
}
