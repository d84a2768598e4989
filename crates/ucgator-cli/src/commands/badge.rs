use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use ucgator_core::notifications::{
    NotificationApiClient, NotificationBadgeReconciler, NotificationHub,
};

use crate::commands::common::{print_badge, CliContext};
use crate::error::CliError;

/// One line of `badge --watch` input.
#[derive(Debug, PartialEq)]
pub enum PushLine {
    Refresh,
    Event(serde_json::Value),
    Skip,
}

pub fn parse_push_line(line: &str) -> PushLine {
    let line = line.trim();
    if line.is_empty() {
        return PushLine::Skip;
    }
    if line.eq_ignore_ascii_case("refresh") {
        return PushLine::Refresh;
    }
    match serde_json::from_str(line) {
        Ok(value) => PushLine::Event(value),
        Err(error) => {
            tracing::warn!("Skipping push line that is not JSON: {}", error);
            PushLine::Skip
        }
    }
}

pub async fn run_badge(
    context: &CliContext,
    user: &str,
    watch: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let hub = Arc::new(NotificationHub::new());
    let reconciler = NotificationBadgeReconciler::new(Arc::new(context.api_client()?));
    reconciler.attach(&hub);

    reconciler.set_user(Some(user)).await;
    print_badge(&reconciler.snapshot(), as_json)?;
    if !watch {
        return Ok(());
    }

    watch_push_events(&reconciler, &hub, as_json).await?;
    reconciler.detach();
    Ok(())
}

async fn watch_push_events(
    reconciler: &NotificationBadgeReconciler<NotificationApiClient>,
    hub: &NotificationHub,
    as_json: bool,
) -> Result<(), CliError> {
    let mut updates = reconciler.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_push_line(&line) {
                    PushLine::Refresh => reconciler.fetch_unread_count().await,
                    PushLine::Event(payload) => hub.emit_raw(&payload),
                    PushLine::Skip => {}
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_badge(&snapshot, as_json)?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
