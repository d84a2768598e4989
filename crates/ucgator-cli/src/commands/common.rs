use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use ucgator_core::config::{ClientConfig, ConfigError};
use ucgator_core::connectivity::{Alert, AlertSink, Severity};
use ucgator_core::notifications::{BadgeSnapshot, BadgeSyncState, NotificationApiClient};

use crate::credentials::KeyringCredentials;
use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";

/// Loaded configuration plus the path it came from.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config_path: PathBuf,
    pub config: ClientConfig,
}

impl CliContext {
    /// Load the config file and apply environment overrides from `lookup`.
    pub fn load(
        config_override: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CliError> {
        let config_path = resolve_config_path(config_override)?;
        let mut config = ClientConfig::load_from_path(&config_path)?;
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(Self {
            config_path,
            config,
        })
    }

    pub fn api_client(&self) -> Result<NotificationApiClient, CliError> {
        let base_url = self.config.require_api_base_url()?;
        Ok(NotificationApiClient::new(
            base_url,
            Arc::new(KeyringCredentials::from_env()),
        )?)
    }
}

pub fn resolve_config_path(config_override: Option<&Path>) -> Result<PathBuf, CliError> {
    if let Some(path) = config_override {
        return Ok(path.to_path_buf());
    }
    dirs::config_dir()
        .map(|dir| dir.join("ucgator").join(CONFIG_FILE_NAME))
        .ok_or_else(|| {
            CliError::Config(ConfigError::Invalid(
                "could not resolve the user config directory; pass --config".to_string(),
            ))
        })
}

/// Prints connectivity alerts with a local timestamp.
pub struct TerminalAlertSink;

impl AlertSink for TerminalAlertSink {
    fn deliver(&self, alert: &Alert) {
        println!("{}", format_alert_line(alert, Local::now()));
    }
}

pub fn format_alert_line(alert: &Alert, at: DateTime<Local>) -> String {
    let label = match alert.severity() {
        Severity::Success => "ONLINE ",
        Severity::Error => "OFFLINE",
    };
    format!("[{}] {label} {}", at.format("%H:%M:%S"), alert.message)
}

#[derive(Debug, Serialize)]
pub struct BadgeItem {
    pub user_id: Option<String>,
    pub unread_count: u64,
    pub sync: BadgeSyncState,
}

impl From<&BadgeSnapshot> for BadgeItem {
    fn from(snapshot: &BadgeSnapshot) -> Self {
        Self {
            user_id: snapshot.user_id.clone(),
            unread_count: snapshot.unread_count,
            sync: snapshot.sync,
        }
    }
}

pub fn format_badge_line(snapshot: &BadgeSnapshot) -> String {
    let state = match snapshot.sync {
        BadgeSyncState::Uninitialized => "signed out",
        BadgeSyncState::Syncing => "syncing",
        BadgeSyncState::Synced => "synced",
        BadgeSyncState::Stale => "stale",
    };
    let user = snapshot.user_id.as_deref().unwrap_or("-");
    format!("{user}: {} unread ({state})", snapshot.unread_count)
}

pub fn print_badge(snapshot: &BadgeSnapshot, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string(&BadgeItem::from(snapshot))?);
    } else {
        println!("{}", format_badge_line(snapshot));
    }
    Ok(())
}
