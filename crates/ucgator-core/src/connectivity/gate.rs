//! Debounce and cooldown state machine for connectivity alerts.

use std::time::Duration;

use tokio::time::Instant;

use super::Alert;

/// Observable phase of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatePhase {
    Idle,
    /// An alert is waiting for its debounce window to elapse.
    Pending { alert: Alert, due: Instant },
    /// An alert was delivered recently; new ones are suppressed until `until`.
    Cooldown { until: Instant },
}

/// Result of firing the debounce timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Delivered(Alert),
    /// Another alert was delivered less than one cooldown ago.
    SuppressedByCooldown(Alert),
    /// The alert matches the aggregate the gate last settled on.
    SuppressedUnchanged(Alert),
    /// A newer alert replaced the one this timer was armed for.
    NotDue,
    Empty,
}

/// Coalesces bursts of alerts and enforces a global delivery cooldown.
///
/// Time is passed in explicitly so the gate can be driven without a runtime.
#[derive(Debug, Clone)]
pub struct AlertGate {
    debounce: Duration,
    cooldown: Duration,
    pending: Option<(Alert, Instant)>,
    last_delivered_at: Option<Instant>,
    settled_connected: bool,
}

impl AlertGate {
    pub const fn new(debounce: Duration, cooldown: Duration) -> Self {
        Self {
            debounce,
            cooldown,
            pending: None,
            last_delivered_at: None,
            settled_connected: true,
        }
    }

    /// Aggregate connectivity the last settled alert reported, whether it was
    /// delivered or dropped by the cooldown.
    pub const fn settled_connected(&self) -> bool {
        self.settled_connected
    }

    /// Seed the baseline aggregate from the initial probe.
    pub fn seed(&mut self, connected: bool) {
        self.settled_connected = connected;
    }

    pub fn phase(&self, now: Instant) -> GatePhase {
        if let Some((alert, due)) = &self.pending {
            return GatePhase::Pending {
                alert: alert.clone(),
                due: *due,
            };
        }
        match self.last_delivered_at {
            Some(at) if now.saturating_duration_since(at) < self.cooldown => GatePhase::Cooldown {
                until: at + self.cooldown,
            },
            _ => GatePhase::Idle,
        }
    }

    /// Arm the debounce window for `alert`, replacing any pending alert.
    ///
    /// Returns the instant at which [`AlertGate::fire`] should be called.
    pub fn schedule(&mut self, alert: Alert, now: Instant) -> Instant {
        let due = now + self.debounce;
        self.pending = Some((alert, due));
        due
    }

    pub fn fire(&mut self, now: Instant) -> GateOutcome {
        let Some((alert, due)) = self.pending.take() else {
            return GateOutcome::Empty;
        };
        if now < due {
            self.pending = Some((alert, due));
            return GateOutcome::NotDue;
        }

        if alert.kind.connected() == self.settled_connected {
            return GateOutcome::SuppressedUnchanged(alert);
        }
        // A dropped alert still moves the baseline, so the next genuine edge
        // is compared against the current aggregate.
        self.settled_connected = alert.kind.connected();
        if let Some(at) = self.last_delivered_at {
            if now.saturating_duration_since(at) < self.cooldown {
                return GateOutcome::SuppressedByCooldown(alert);
            }
        }

        self.last_delivered_at = Some(now);
        GateOutcome::Delivered(alert)
    }

    /// Drop any pending alert. Cooldown bookkeeping is kept.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
