//! Connectivity monitor: edge detection plus debounced alert delivery.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{
    Alert, AlertGate, AlertKind, AlertSink, ConnectivitySettings, ConnectivityState,
    GateOutcome, GatePhase, NetworkState, NetworkStatusProvider, ProbeError, Transport,
};
use crate::util::lock;

/// Tracks network reachability and raises at most one alert per transition.
///
/// Owns three pieces of background work once initialized: the provider
/// listener, the fallback poll and the debounce timer. [`Self::teardown`]
/// stops all of them and also runs on drop.
pub struct ConnectivityMonitor<P: NetworkStatusProvider, S: AlertSink> {
    provider: Arc<P>,
    settings: ConnectivitySettings,
    shared: Arc<Shared<S>>,
    listener: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

struct Shared<S> {
    sink: S,
    tracker: Mutex<Tracker>,
}

struct Tracker {
    state: ConnectivityState,
    gate: AlertGate,
    debounce_timer: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl<P: NetworkStatusProvider, S: AlertSink> ConnectivityMonitor<P, S> {
    pub fn new(provider: Arc<P>, sink: S, settings: ConnectivitySettings) -> Self {
        let tracker = Tracker {
            state: ConnectivityState::default(),
            gate: AlertGate::new(settings.debounce(), settings.cooldown()),
            debounce_timer: None,
            torn_down: false,
        };
        Self {
            provider,
            settings,
            shared: Arc::new(Shared {
                sink,
                tracker: Mutex::new(tracker),
            }),
            listener: None,
            poller: None,
        }
    }

    /// Probe once, subscribe to the provider and start the fallback poll.
    /// Must run inside a Tokio runtime.
    ///
    /// A failed probe keeps the optimistic defaults. A failed subscription is
    /// returned to the caller. Calling this again restarts the background work.
    pub async fn initialize(&mut self) -> crate::Result<()> {
        self.stop_background_tasks();

        let initial = self.provider.fetch_current_state().await;
        {
            let mut tracker = lock(&self.shared.tracker);
            tracker.torn_down = false;
            match initial {
                Ok(state) => tracker.seed(&state),
                Err(error) => {
                    tracing::debug!("Initial network probe failed: {}", error);
                    tracker.state.mark_unknown();
                }
            }
        }

        let mut subscription = self.provider.subscribe()?;
        let shared = Arc::clone(&self.shared);
        self.listener = Some(tokio::spawn(async move {
            while let Some(state) = subscription.next().await {
                shared.on_network_event(&state);
            }
            tracing::debug!("Network status subscription closed");
        }));

        let provider = Arc::clone(&self.provider);
        let shared = Arc::clone(&self.shared);
        let period = self.settings.poll_interval();
        self.poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match provider.fetch_current_state().await {
                    Ok(state) => shared.on_network_event(&state),
                    Err(error) => shared.on_probe_failure(&error),
                }
            }
        }));

        let state = self.state();
        tracing::debug!(
            connected = state.was_connected,
            wifi = state.is_wifi_connected,
            "Connectivity monitor started"
        );
        Ok(())
    }

    /// Feed one provider snapshot through edge detection.
    ///
    /// Must be called inside a Tokio runtime: an edge arms the debounce timer
    /// with `tokio::spawn`.
    pub fn on_network_event(&self, state: &NetworkState) {
        self.shared.on_network_event(state);
    }

    /// Queue `alert` behind the debounce window and cooldown.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn schedule_alert(&self, alert: Alert) {
        let mut tracker = lock(&self.shared.tracker);
        if tracker.torn_down {
            return;
        }
        self.shared.schedule_locked(&mut tracker, alert);
    }

    pub fn state(&self) -> ConnectivityState {
        lock(&self.shared.tracker).state
    }

    pub fn gate_phase(&self) -> GatePhase {
        lock(&self.shared.tracker).gate.phase(Instant::now())
    }

    pub const fn is_running(&self) -> bool {
        self.listener.is_some() || self.poller.is_some()
    }

    /// Stop listening, polling and any pending alert. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.stop_background_tasks();

        let mut tracker = lock(&self.shared.tracker);
        tracker.torn_down = true;
        if let Some(timer) = tracker.debounce_timer.take() {
            timer.abort();
        }
        tracker.gate.cancel();
    }

    fn stop_background_tasks(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

impl<P: NetworkStatusProvider, S: AlertSink> Drop for ConnectivityMonitor<P, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Tracker {
    fn seed(&mut self, state: &NetworkState) {
        self.state.is_wifi_connected =
            state.is_connected && state.transport == Transport::Wifi;
        self.state.is_internet_reachable = state.is_internet_reachable;
        if let Some(connected) = state.aggregate() {
            self.state.was_connected = connected;
            self.gate.seed(connected);
        }
    }
}

impl<S: AlertSink> Shared<S> {
    fn on_network_event(self: &Arc<Self>, state: &NetworkState) {
        let mut tracker = lock(&self.tracker);
        if tracker.torn_down {
            return;
        }
        let Some(connected) = tracker.state.observe(state) else {
            return;
        };

        let kind = if connected {
            AlertKind::BackOnline
        } else {
            AlertKind::Offline
        };
        tracing::debug!(?kind, transport = ?state.transport, "Connectivity changed");
        self.schedule_locked(&mut tracker, Alert::for_kind(kind));
    }

    fn on_probe_failure(&self, error: &ProbeError) {
        tracing::debug!("Network probe failed: {}", error);
        lock(&self.tracker).state.mark_unknown();
    }

    fn schedule_locked(self: &Arc<Self>, tracker: &mut Tracker, alert: Alert) {
        let due = tracker.gate.schedule(alert, Instant::now());
        if let Some(timer) = tracker.debounce_timer.take() {
            timer.abort();
        }

        let shared = Arc::clone(self);
        tracker.debounce_timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(due).await;
            shared.fire_pending();
        }));
    }

    fn fire_pending(&self) {
        let outcome = {
            let mut tracker = lock(&self.tracker);
            if tracker.torn_down {
                return;
            }
            let outcome = tracker.gate.fire(Instant::now());
            if outcome != GateOutcome::NotDue {
                tracker.debounce_timer = None;
            }
            outcome
        };

        match outcome {
            GateOutcome::Delivered(alert) => {
                tracing::info!(kind = ?alert.kind, "{}", alert.message);
                self.sink.deliver(&alert);
            }
            GateOutcome::SuppressedByCooldown(alert) => {
                tracing::debug!(kind = ?alert.kind, "Alert suppressed by cooldown");
            }
            GateOutcome::SuppressedUnchanged(alert) => {
                tracing::debug!(kind = ?alert.kind, "Connectivity settled back; alert dropped");
            }
            GateOutcome::NotDue | GateOutcome::Empty => {}
        }
    }
}
