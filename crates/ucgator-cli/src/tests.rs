use std::collections::HashMap;

use chrono::{Local, TimeZone};
use pretty_assertions::assert_eq;
use serde_json::json;
use ucgator_core::config::{ClientConfig, API_BASE_URL_ENV, PROBE_URL_ENV};
use ucgator_core::connectivity::{Alert, AlertKind};
use ucgator_core::notifications::{BadgeSnapshot, BadgeSyncState};

use crate::cli::{CompletionShell, ConfigCommands};
use crate::commands::auth_cmd::describe_token_source;
use crate::commands::badge::{parse_push_line, PushLine};
use crate::commands::common::{format_alert_line, format_badge_line, BadgeItem, CliContext};
use crate::commands::completions::run_completions;
use crate::commands::config::{run_config, update_config};
use crate::commands::network::resolve_probe_url;
use crate::commands::notifications::run_unread;
use crate::credentials::{KeyringCredentials, TokenSource};
use crate::error::CliError;

fn no_env(_: &str) -> Option<String> {
    None
}

fn context_with(config: ClientConfig) -> CliContext {
    CliContext {
        config_path: "config.json".into(),
        config,
    }
}

#[test]
fn alert_line_shows_time_state_and_message() {
    let at = Local
        .with_ymd_and_hms(2026, 3, 1, 9, 5, 7)
        .single()
        .expect("unambiguous local time");

    assert_eq!(
        format_alert_line(&Alert::for_kind(AlertKind::Offline), at),
        "[09:05:07] OFFLINE No internet connection. Some features may be unavailable."
    );
    assert_eq!(
        format_alert_line(&Alert::new(AlertKind::BackOnline, "ok"), at),
        "[09:05:07] ONLINE  ok"
    );
}

#[test]
fn badge_line_reports_sync_state() {
    let snapshot = BadgeSnapshot {
        user_id: Some("user-1".to_string()),
        unread_count: 4,
        sync: BadgeSyncState::Stale,
    };
    assert_eq!(format_badge_line(&snapshot), "user-1: 4 unread (stale)");
    assert_eq!(
        format_badge_line(&BadgeSnapshot::default()),
        "-: 0 unread (signed out)"
    );
}

#[test]
fn badge_item_serializes_snake_case_state() {
    let snapshot = BadgeSnapshot {
        user_id: Some("user-1".to_string()),
        unread_count: 2,
        sync: BadgeSyncState::Synced,
    };
    let value = serde_json::to_value(BadgeItem::from(&snapshot)).expect("serialize");
    assert_eq!(
        value,
        json!({ "user_id": "user-1", "unread_count": 2, "sync": "synced" })
    );
}

#[test]
fn push_lines_parse_into_commands() {
    assert_eq!(parse_push_line("  refresh "), PushLine::Refresh);
    assert_eq!(parse_push_line(""), PushLine::Skip);
    assert_eq!(parse_push_line("{not json"), PushLine::Skip);
    assert_eq!(
        parse_push_line(r#"{"type":"NEW","notificationId":"n1"}"#),
        PushLine::Event(json!({ "type": "NEW", "notificationId": "n1" }))
    );
}

#[test]
fn context_load_applies_environment_overrides() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "version": 1, "api_base_url": "https://api.ucgator.app/" }"#,
    )
    .expect("write config");
    let env = HashMap::from([(PROBE_URL_ENV, "https://status.ucgator.app/health")]);

    let context = CliContext::load(Some(&path), |key| env.get(key).map(ToString::to_string))
        .expect("load context");

    assert_eq!(context.config_path, path);
    assert_eq!(
        context.config.api_base_url.as_deref(),
        Some("https://api.ucgator.app")
    );
    assert_eq!(
        context.config.probe_url.as_deref(),
        Some("https://status.ucgator.app/health")
    );
}

#[test]
fn context_load_rejects_invalid_override() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.json");
    let env = HashMap::from([(API_BASE_URL_ENV, "api.ucgator.app")]);

    let error = CliContext::load(Some(&path), |key| env.get(key).map(ToString::to_string))
        .unwrap_err();
    assert!(matches!(error, CliError::Config(_)));
}

#[test]
fn probe_url_prefers_explicit_flag() {
    let context = context_with(ClientConfig {
        api_base_url: Some("https://api.ucgator.app".to_string()),
        probe_url: Some("https://status.ucgator.app".to_string()),
        ..Default::default()
    });

    assert_eq!(
        resolve_probe_url(&context, Some(" https://flag.ucgator.app ".to_string()))
            .expect("explicit"),
        "https://flag.ucgator.app"
    );
    assert_eq!(
        resolve_probe_url(&context, Some("   ".to_string())).expect("configured"),
        "https://status.ucgator.app"
    );
}

#[test]
fn probe_url_falls_back_to_api_url_then_errors() {
    let context = context_with(ClientConfig {
        api_base_url: Some("https://api.ucgator.app".to_string()),
        ..Default::default()
    });
    assert_eq!(
        resolve_probe_url(&context, None).expect("api fallback"),
        "https://api.ucgator.app"
    );

    let error = resolve_probe_url(&context_with(ClientConfig::default()), None).unwrap_err();
    assert!(matches!(error, CliError::ProbeUrlNotConfigured));
}

#[test]
fn set_api_url_writes_normalized_config() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("config.json");

    run_config(
        ConfigCommands::SetApiUrl {
            url: " https://api.ucgator.app/ ".to_string(),
        },
        Some(&path),
        no_env,
    )
    .expect("set api url");

    let saved = ClientConfig::load_from_path(&path).expect("reload");
    assert_eq!(saved.api_base_url.as_deref(), Some("https://api.ucgator.app"));
    assert_eq!(saved.probe_url, None);
}

#[test]
fn update_config_refuses_invalid_url_and_leaves_file_alone() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.json");

    let error = update_config(&path, |config| {
        config.probe_url = Some("status.ucgator.app".to_string());
    })
    .unwrap_err();

    assert!(error.to_string().contains("probe_url"));
    assert!(!path.exists());
}

#[tokio::test]
async fn unread_requires_configured_api_url() {
    let context = context_with(ClientConfig::default());
    let error = run_unread(&context, false).await.unwrap_err();
    assert!(error.to_string().contains("API base URL is not configured"));
}

#[test]
fn keyring_token_lifecycle() {
    let credentials = KeyringCredentials::with_override(None);
    credentials.clear().expect("clear");
    assert_eq!(credentials.source().expect("source"), TokenSource::Missing);

    assert!(matches!(
        credentials.store_token("   "),
        Err(CliError::EmptyToken)
    ));
    credentials.store_token(" token-1 \n").expect("store");
    assert_eq!(
        credentials.stored_token().expect("read").as_deref(),
        Some("token-1")
    );
    assert_eq!(credentials.source().expect("source"), TokenSource::Keyring);

    let overridden = KeyringCredentials::with_override(Some("env-token".to_string()));
    assert_eq!(overridden.source().expect("source"), TokenSource::Environment);
    assert!(describe_token_source(TokenSource::Environment).contains("UCGATOR_ACCESS_TOKEN"));

    credentials.clear().expect("clear");
    credentials.clear().expect("clear twice");
    assert_eq!(credentials.stored_token().expect("read"), None);
}

#[test]
fn completions_write_to_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ucgator.bash");

    run_completions(CompletionShell::Bash, Some(&path)).expect("generate");

    let script = std::fs::read_to_string(&path).expect("read script");
    assert!(script.contains("ucgator"));
    assert!(script.contains("watch-network"));
}
