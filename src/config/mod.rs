use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod catalog;
pub mod form;
pub mod validator;

pub use catalog::{ApiCatalog, EndpointConfig, FieldSchema, FieldType, HttpMethod};
pub use form::{
    ButtonType, Control, ControlKind, ControlOptions, FormConfig, FormGroup, InputType,
    OptionItem, ValidationBlock,
};

use crate::cli::Cli;
use validator::ValidationError;

/// Default settings file looked up next to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "formwire.toml";

const DEFAULT_USER_AGENT: &str = "formwire/0.1";

/// Errors raised while turning YAML text into a typed configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("YAML document is empty")]
    Empty,

    #[error("Configuration validation failed:\n{}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse raw YAML text into a generic tree.
///
/// A document that is empty or consists only of `null` is rejected, since
/// neither a form schema nor a catalog can be built from it.
pub fn parse_yaml(text: &str) -> Result<serde_yaml::Value, LoadError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    if value.is_null() {
        return Err(LoadError::Empty);
    }
    Ok(value)
}

/// Parse YAML text and deserialize the tree into `T`.
pub fn load_yaml<T: DeserializeOwned>(text: &str) -> Result<T, LoadError> {
    let tree = parse_yaml(text)?;
    Ok(serde_yaml::from_value(tree)?)
}

/// Read a YAML document from disk.
pub fn read_document(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Settings for the `formwire` developer binary.
///
/// Only the command-line harness loads these. Library users configure
/// [`crate::adapters::api_service::ApiService`] directly through its
/// builder methods; no file or environment variable is consulted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSettings {
    /// Prefix joined to relative endpoint URLs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Bearer token installed on the service at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: default_user_agent(),
            token: None,
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Settings {
    /// Load settings from `formwire.toml` in the working directory.
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_path(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load settings from a file (optional) plus `FORMWIRE__*` environment
    /// overrides, e.g. `FORMWIRE__HTTP__BASE_URL`.
    pub fn from_path(path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("FORMWIRE").separator("__"))
            .set_default("http.user_agent", DEFAULT_USER_AGENT)?
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        Ok(settings)
    }

    /// Create settings from CLI arguments (config file, env, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::from_path(&cli.config)?;
        settings.apply_cli_overrides(cli);
        Ok(settings)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.http.base_url = Some(base_url.clone());
        }
        if let Some(token) = &cli.token {
            self.http.token = Some(token.clone());
        }
    }
}
