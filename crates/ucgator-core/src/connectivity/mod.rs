//! Network connectivity tracking and connectivity alerts.
//!
//! The [`ConnectivityMonitor`] consumes snapshots from a
//! [`NetworkStatusProvider`], detects edges in aggregate connectivity and
//! hands "offline" / "back online" alerts to an [`AlertSink`] through the
//! debouncing [`AlertGate`].

mod gate;
mod monitor;
mod probe;

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::util::lock;

pub use gate::{AlertGate, GateOutcome, GatePhase};
pub use monitor::ConnectivityMonitor;
pub use probe::HttpReachabilityProbe;

const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
const DEFAULT_DEBOUNCE_MS: u64 = 500;
const DEFAULT_COOLDOWN_MS: u64 = 5_000;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 4_000;

/// Active network transport as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Wifi,
    Cellular,
    Ethernet,
    None,
    #[default]
    Unknown,
    Other,
}

/// One snapshot from a network status provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    pub is_connected: bool,
    /// `None` while the platform has not finished its reachability check.
    pub is_internet_reachable: Option<bool>,
    #[serde(default)]
    pub transport: Transport,
}

impl NetworkState {
    pub const fn online(transport: Transport) -> Self {
        Self {
            is_connected: true,
            is_internet_reachable: Some(true),
            transport,
        }
    }

    pub const fn offline() -> Self {
        Self {
            is_connected: false,
            is_internet_reachable: Some(false),
            transport: Transport::None,
        }
    }

    /// Aggregate connectivity: transport present and internet reachable.
    ///
    /// Returns `None` when a transport is up but reachability is still unknown.
    pub const fn aggregate(&self) -> Option<bool> {
        if !self.is_connected {
            return Some(false);
        }
        self.is_internet_reachable
    }
}

/// Cached connectivity as seen by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub is_wifi_connected: bool,
    pub is_internet_reachable: Option<bool>,
    /// Last known aggregate connectivity, used for edge detection.
    pub was_connected: bool,
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self {
            is_wifi_connected: true,
            is_internet_reachable: Some(true),
            was_connected: true,
        }
    }
}

impl ConnectivityState {
    /// Record a snapshot and return the new aggregate if it flipped.
    pub fn observe(&mut self, state: &NetworkState) -> Option<bool> {
        self.is_wifi_connected = state.is_connected && state.transport == Transport::Wifi;
        self.is_internet_reachable = state.is_internet_reachable;

        let connected = state.aggregate()?;
        if connected == self.was_connected {
            return None;
        }
        self.was_connected = connected;
        Some(connected)
    }

    pub fn mark_unknown(&mut self) {
        self.is_internet_reachable = None;
    }
}

/// Which connectivity edge an alert announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Offline,
    BackOnline,
}

impl AlertKind {
    /// Aggregate connectivity this alert reports.
    pub const fn connected(self) -> bool {
        matches!(self, Self::BackOnline)
    }

    pub const fn severity(self) -> Severity {
        match self {
            Self::Offline => Severity::Error,
            Self::BackOnline => Severity::Success,
        }
    }

    pub const fn default_message(self) -> &'static str {
        match self {
            Self::Offline => "No internet connection. Some features may be unavailable.",
            Self::BackOnline => "Back online. Your internet connection has been restored.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
}

/// A user-facing connectivity alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn for_kind(kind: AlertKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    pub const fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

/// Presentation channel for connectivity alerts (dialog, toast, terminal).
pub trait AlertSink: Send + Sync + 'static {
    fn deliver(&self, alert: &Alert);
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid probe configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Reachability request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Network status unavailable: {0}")]
    Unavailable(String),
}

/// Source of network snapshots.
///
/// `subscribe` failures are treated as a misconfigured host and propagate out
/// of [`ConnectivityMonitor::initialize`].
pub trait NetworkStatusProvider: Send + Sync + 'static {
    fn fetch_current_state(&self)
        -> impl Future<Output = Result<NetworkState, ProbeError>> + Send;

    fn subscribe(&self) -> crate::Result<NetworkSubscription>;
}

/// Stream of pushed network snapshots. Dropping it unsubscribes.
#[derive(Debug)]
pub struct NetworkSubscription {
    receiver: mpsc::UnboundedReceiver<NetworkState>,
}

impl NetworkSubscription {
    pub const fn new(receiver: mpsc::UnboundedReceiver<NetworkState>) -> Self {
        Self { receiver }
    }

    pub async fn next(&mut self) -> Option<NetworkState> {
        self.receiver.recv().await
    }
}

/// Fan-out list of subscription senders for provider implementations.
#[derive(Debug, Default)]
pub struct NetworkSubscribers {
    senders: Mutex<Vec<mpsc::UnboundedSender<NetworkState>>>,
}

impl NetworkSubscribers {
    pub fn subscribe(&self) -> NetworkSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        lock(&self.senders).push(sender);
        NetworkSubscription::new(receiver)
    }

    /// Push a snapshot to every live subscriber, pruning dropped ones.
    pub fn publish(&self, state: &NetworkState) -> usize {
        let mut senders = lock(&self.senders);
        senders.retain(|sender| sender.send(*state).is_ok());
        senders.len()
    }
}

/// Timing knobs for the monitor and the reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectivitySettings {
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub cooldown_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for ConnectivitySettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl ConnectivitySettings {
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than zero".to_string());
        }
        if self.probe_timeout_ms == 0 {
            return Err("probe_timeout_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_requires_transport_and_reachability() {
        assert_eq!(NetworkState::online(Transport::Wifi).aggregate(), Some(true));
        assert_eq!(NetworkState::offline().aggregate(), Some(false));

        let unknown = NetworkState {
            is_connected: true,
            is_internet_reachable: None,
            transport: Transport::Cellular,
        };
        assert_eq!(unknown.aggregate(), None);

        let captive = NetworkState {
            is_connected: true,
            is_internet_reachable: Some(false),
            transport: Transport::Wifi,
        };
        assert_eq!(captive.aggregate(), Some(false));
    }

    #[test]
    fn observe_reports_only_edges() {
        let mut state = ConnectivityState::default();
        assert_eq!(state.observe(&NetworkState::online(Transport::Wifi)), None);
        assert_eq!(state.observe(&NetworkState::offline()), Some(false));
        assert_eq!(state.observe(&NetworkState::offline()), None);
        assert!(!state.is_wifi_connected);
        assert_eq!(
            state.observe(&NetworkState::online(Transport::Cellular)),
            Some(true)
        );
        assert!(!state.is_wifi_connected);
    }

    #[test]
    fn observe_with_unknown_reachability_keeps_edge_state() {
        let mut state = ConnectivityState::default();
        let unknown = NetworkState {
            is_connected: true,
            is_internet_reachable: None,
            transport: Transport::Wifi,
        };
        assert_eq!(state.observe(&unknown), None);
        assert!(state.was_connected);
        assert_eq!(state.is_internet_reachable, None);
    }

    #[test]
    fn publish_prunes_dropped_subscriptions() {
        let subscribers = NetworkSubscribers::default();
        let kept = subscribers.subscribe();
        let dropped = subscribers.subscribe();
        drop(dropped);

        assert_eq!(subscribers.publish(&NetworkState::offline()), 1);
        drop(kept);
        assert_eq!(subscribers.publish(&NetworkState::offline()), 0);
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: ConnectivitySettings =
            serde_json::from_str(r#"{ "debounce_ms": 250 }"#).expect("settings parse");
        assert_eq!(settings.debounce(), Duration::from_millis(250));
        assert_eq!(settings.cooldown(), Duration::from_secs(5));
        assert_eq!(settings.poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn settings_reject_zero_poll_interval() {
        let settings = ConnectivitySettings {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn alert_kinds_map_to_severity() {
        assert_eq!(Alert::for_kind(AlertKind::Offline).severity(), Severity::Error);
        assert_eq!(
            Alert::for_kind(AlertKind::BackOnline).severity(),
            Severity::Success
        );
        assert!(AlertKind::BackOnline.connected());
        assert!(!AlertKind::Offline.connected());
    }
}
