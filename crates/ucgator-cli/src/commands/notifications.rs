use std::sync::Arc;

use serde::Serialize;
use ucgator_core::notifications::{NotificationHub, NotificationService};

use crate::commands::common::CliContext;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct UnreadCountItem {
    count: u64,
}

pub async fn run_unread(context: &CliContext, as_json: bool) -> Result<(), CliError> {
    let count = context.api_client()?.unread_count().await?;
    if as_json {
        println!("{}", serde_json::to_string(&UnreadCountItem { count })?);
    } else {
        println!("{count} unread");
    }
    Ok(())
}

pub async fn run_read(context: &CliContext, id: &str) -> Result<(), CliError> {
    service(context)?.mark_read(id).await?;
    println!("Marked {} as read", id.trim());
    Ok(())
}

pub async fn run_read_all(context: &CliContext) -> Result<(), CliError> {
    service(context)?.mark_all_read().await?;
    println!("Marked all notifications as read");
    Ok(())
}

fn service(context: &CliContext) -> Result<NotificationService, CliError> {
    Ok(NotificationService::new(
        context.api_client()?,
        Arc::new(NotificationHub::new()),
    ))
}
