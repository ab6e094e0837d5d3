//! Configuration loader and validator for the onboarding service.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::model::Realm;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub server: Server,
    pub locale: Locale,
    pub bots: Bots,
    pub realm: RealmDefaults,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

/// Server identity used to build realm URIs and bot emails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub uri_scheme: String,
    pub internal_bot_domain: String,
}

/// Translation catalog location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Locale {
    pub dir: String,
}

/// System bot identities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bots {
    pub welcome_bot: String,
    pub clinical_bot_prefix: String,
    pub office_bot_prefix: String,
    pub realm_internal_bots: Vec<InternalBot>,
}

/// One entry of the per-realm internal bot list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InternalBot {
    pub var_name: String,
    /// Email with a single `%s` standing for the internal bot domain.
    pub email_template: String,
    pub name: String,
}

/// Names of the streams every new realm starts with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealmDefaults {
    pub initial_private_stream_name: String,
    pub default_notification_stream_name: String,
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}/onboarding.db", self.app.data_dir)
    }

    /// Canonical emails of the configured internal bots.
    pub fn internal_bot_emails(&self) -> Vec<String> {
        self.bots
            .realm_internal_bots
            .iter()
            .map(|bot| bot.email(&self.server.internal_bot_domain))
            .collect()
    }

    pub fn realm_uri(&self, realm: &Realm) -> String {
        format!("{}{}", self.server.uri_scheme, realm.host)
    }

    pub fn clinical_bot_email(&self, realm: &Realm) -> String {
        format!("{}{}", self.bots.clinical_bot_prefix, realm.host)
    }

    pub fn office_bot_email(&self, realm: &Realm) -> String {
        format!("{}{}", self.bots.office_bot_prefix, realm.host)
    }
}

impl InternalBot {
    pub fn email(&self, domain: &str) -> String {
        self.email_template.replacen("%s", domain, 1)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }

    if cfg.server.uri_scheme.trim().is_empty() {
        return Err(ConfigError::Invalid("server.uri_scheme must be non-empty"));
    }
    if cfg.server.internal_bot_domain.trim().is_empty() {
        return Err(ConfigError::Invalid("server.internal_bot_domain must be non-empty"));
    }

    if cfg.bots.welcome_bot.trim().is_empty() {
        return Err(ConfigError::Invalid("bots.welcome_bot must be non-empty"));
    }
    if cfg.bots.clinical_bot_prefix.trim().is_empty() {
        return Err(ConfigError::Invalid("bots.clinical_bot_prefix must be non-empty"));
    }
    if cfg.bots.office_bot_prefix.trim().is_empty() {
        return Err(ConfigError::Invalid("bots.office_bot_prefix must be non-empty"));
    }
    for bot in &cfg.bots.realm_internal_bots {
        if bot.email_template.matches("%s").count() != 1 {
            return Err(ConfigError::Invalid(
                "bots.realm_internal_bots[].email_template must contain exactly one %s",
            ));
        }
        if bot.name.trim().is_empty() {
            return Err(ConfigError::Invalid("bots.realm_internal_bots[].name must be non-empty"));
        }
    }

    if cfg.realm.initial_private_stream_name.trim().is_empty() {
        return Err(ConfigError::Invalid("realm.initial_private_stream_name must be non-empty"));
    }
    if cfg.realm.default_notification_stream_name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "realm.default_notification_stream_name must be non-empty",
        ));
    }

    Ok(())
}

/// Returns the example YAML shipped as `config.example.yaml`.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

server:
  uri_scheme: "https://"
  internal_bot_domain: "zulip.com"

locale:
  dir: "./locale"

bots:
  welcome_bot: "welcome-bot@zulip.com"
  clinical_bot_prefix: "clinical-bot@"
  office_bot_prefix: "office-bot@"
  realm_internal_bots:
    - var_name: "WELCOME_BOT"
      email_template: "welcome-bot@%s"
      name: "Welcome Bot"
    - var_name: "NOTIFICATION_BOT"
      email_template: "notification-bot@%s"
      name: "Notification Bot"

realm:
  initial_private_stream_name: "core team"
  default_notification_stream_name: "general"
"#
}
