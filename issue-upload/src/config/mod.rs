//! Configuration file handling
//!
//! The configuration is a TOML file with a `[salesforce]` section holding
//! the login credentials (plus optional target object and field mapping)
//! and a `[logging]` section holding the log line template. It is read once
//! at startup; a missing file or section is fatal.

use anyhow::{Context, Result, bail};
use is_terminal::IsTerminal;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::LoginCredentials;
use crate::issues::FieldTag;

/// File name looked up in the working directory when `--config` is not given
pub const CONFIG_FILE_NAME: &str = "issue-upload.toml";

/// Environment variable consulted when the config carries no password
pub const PASSWORD_ENV: &str = "ISSUE_UPLOAD_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub salesforce: SalesforceConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize)]
pub struct SalesforceConfig {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub security_token: String,
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default = "default_api_version")]
    pub version: String,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub fields: FieldMapping,
}

/// The sObject the issues are written to, and how it is looked up
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// sObject API name
    pub object: String,
    /// Field holding the secondary key found in the spreadsheet's key column
    pub secondary_key: String,
    /// Creation timestamp field the lookup window is applied to
    pub created_field: String,
}

/// Remote field API name for every column tag
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub ad: String,
    pub bt: String,
    pub sw: String,
    pub date: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log line template, see [`crate::logging`]
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_api_version() -> String {
    "38.0".to_string()
}

fn default_log_format() -> String {
    "{asctime} - {target} - {level} - {message}".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            object: "Shopper_Inspection__c".to_string(),
            secondary_key: "Shopper_Contract__c".to_string(),
            created_field: "CreatedDate".to_string(),
        }
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            ad: "AD_Issue__c".to_string(),
            bt: "BT_Issue__c".to_string(),
            sw: "SW_Issue__c".to_string(),
            date: "Issue_Date__c".to_string(),
            status: "Status__c".to_string(),
        }
    }
}

impl FieldMapping {
    /// Remote field API name for a tag
    pub fn api_name(&self, tag: FieldTag) -> &str {
        match tag {
            FieldTag::Ad => &self.ad,
            FieldTag::Bt => &self.bt,
            FieldTag::Sw => &self.sw,
            FieldTag::Date => &self.date,
            FieldTag::Status => &self.status,
        }
    }
}

impl std::fmt::Debug for SalesforceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("sandbox", &self.sandbox)
            .field("version", &self.version)
            .field("target", &self.target)
            .field("fields", &self.fields)
            .finish()
    }
}

impl SalesforceConfig {
    /// Build login credentials, resolving the password if the file has none
    pub fn credentials(&self) -> Result<LoginCredentials> {
        Ok(LoginCredentials {
            username: self.username.clone(),
            password: self.resolve_password()?,
            security_token: self.security_token.clone(),
            sandbox: self.sandbox,
            version: self.version.clone(),
        })
    }

    fn resolve_password(&self) -> Result<String> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            log::debug!("password taken from {}", PASSWORD_ENV);
            return Ok(password);
        }

        if std::io::stdin().is_terminal() {
            return rpassword::prompt_password(format!("Password for {}: ", self.username))
                .context("Failed to read password");
        }

        bail!(
            "No password configured: set salesforce.password or {}",
            PASSWORD_ENV
        )
    }
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    /// Load the configuration from `path`, or from the default locations
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf)> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path().with_context(|| {
                format!(
                    "No configuration found: pass --config or create {}",
                    CONFIG_FILE_NAME
                )
            })?,
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;

        Ok((config, path))
    }
}

/// First existing file of `./issue-upload.toml` and `<config_dir>/issue-upload/config.toml`
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("issue-upload").join("config.toml"))
        .filter(|p| p.is_file())
}
