use std::sync::Arc;

use ucgator_core::connectivity::{ConnectivityMonitor, HttpReachabilityProbe};
use ucgator_core::util::normalize_text_option;

use crate::commands::common::{CliContext, TerminalAlertSink};
use crate::error::CliError;

/// Resolve the probe URL: explicit flag, then config/env.
pub fn resolve_probe_url(
    context: &CliContext,
    explicit: Option<String>,
) -> Result<String, CliError> {
    normalize_text_option(explicit)
        .or_else(|| context.config.resolved_probe_url())
        .ok_or(CliError::ProbeUrlNotConfigured)
}

pub async fn run_watch_network(
    context: &CliContext,
    probe_url: Option<String>,
) -> Result<(), CliError> {
    let url = resolve_probe_url(context, probe_url)?;
    let settings = context.config.connectivity;
    let probe = Arc::new(HttpReachabilityProbe::new(&url, settings.probe_timeout())?);

    let mut monitor = ConnectivityMonitor::new(probe, TerminalAlertSink, settings);
    monitor.initialize().await?;

    let state = monitor.state();
    let status = match state.is_internet_reachable {
        Some(true) => "online",
        Some(false) => "offline",
        None => "unknown",
    };
    println!(
        "Watching {url} every {}s (currently {status}). Press Ctrl-C to stop.",
        settings.poll_interval().as_secs()
    );

    tokio::signal::ctrl_c().await?;
    monitor.teardown();
    println!("Stopped watching {url}");
    Ok(())
}
