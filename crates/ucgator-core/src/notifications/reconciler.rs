//! Client-side unread count kept consistent with the notification API.

use std::future::Future;
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{HandlerId, NotificationApiResult, NotificationEvent, NotificationHub};
use crate::session::AuthUser;
use crate::util::{lock, normalize_text_option};

/// Authoritative source of the unread count.
pub trait UnreadCountSource: Send + Sync + 'static {
    fn fetch_unread_count(&self) -> impl Future<Output = NotificationApiResult<u64>> + Send;
}

/// Where the cached count stands relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeSyncState {
    /// No authenticated user.
    #[default]
    Uninitialized,
    /// A fetch is in flight.
    Syncing,
    Synced,
    /// The last fetch failed; the count is the last known value.
    Stale,
}

/// Foreground status of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    #[default]
    Active,
    Background,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BadgeSnapshot {
    pub user_id: Option<String>,
    pub unread_count: u64,
    pub sync: BadgeSyncState,
}

/// Caches the unread count for the signed-in user.
///
/// The count moves with hub events between fetches and is overwritten by the
/// server value when a fetch completes. Only the most recently issued fetch of
/// the current session may apply its result, and a failed fetch leaves the
/// count alone.
pub struct NotificationBadgeReconciler<C: UnreadCountSource> {
    source: Arc<C>,
    core: Arc<BadgeCore>,
    attachment: Mutex<Option<(Arc<NotificationHub>, HandlerId)>>,
}

struct BadgeCore {
    inner: Mutex<BadgeInner>,
    updates: watch::Sender<BadgeSnapshot>,
}

#[derive(Default)]
struct BadgeInner {
    user_id: Option<String>,
    unread_count: u64,
    sync: BadgeSyncState,
    app_state: AppState,
    session: u64,
    latest_fetch: u64,
}

#[derive(Clone, Copy)]
struct FetchTicket {
    session: u64,
    fetch: u64,
}

impl<C: UnreadCountSource> NotificationBadgeReconciler<C> {
    pub fn new(source: Arc<C>) -> Self {
        let (updates, _) = watch::channel(BadgeSnapshot::default());
        Self {
            source,
            core: Arc::new(BadgeCore {
                inner: Mutex::new(BadgeInner::default()),
                updates,
            }),
            attachment: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> BadgeSnapshot {
        lock(&self.core.inner).snapshot()
    }

    pub fn unread_count(&self) -> u64 {
        lock(&self.core.inner).unread_count
    }

    pub fn sync_state(&self) -> BadgeSyncState {
        lock(&self.core.inner).sync
    }

    pub fn app_state(&self) -> AppState {
        lock(&self.core.inner).app_state
    }

    /// Observe every change to the badge.
    pub fn subscribe(&self) -> watch::Receiver<BadgeSnapshot> {
        self.core.updates.subscribe()
    }

    /// React to a login, logout or account switch.
    ///
    /// A new identity resets the count to zero and fetches the server value.
    pub async fn set_user(&self, user_id: Option<&str>) {
        if self.core.switch_user(user_id) {
            self.fetch_unread_count().await;
        }
    }

    /// Track foreground changes; returning to the foreground re-syncs.
    pub async fn on_app_state_change(&self, next: AppState) {
        if self.core.enter_app_state(next) {
            self.fetch_unread_count().await;
        }
    }

    /// Fetch the authoritative count for the current user.
    ///
    /// Does nothing without a signed-in user. Errors are logged and leave the
    /// cached count in place.
    pub async fn fetch_unread_count(&self) {
        let Some(ticket) = self.core.begin_fetch() else {
            return;
        };
        let result = self.source.fetch_unread_count().await;
        self.core.finish_fetch(ticket, result);
    }

    pub fn on_event(&self, event: &NotificationEvent) {
        self.core.apply_event(event);
    }

    /// Apply a loosely typed push payload; unknown types are ignored.
    pub fn on_raw_event(&self, payload: &serde_json::Value) {
        if let Some(event) = NotificationEvent::from_value(payload) {
            self.core.apply_event(&event);
        }
    }

    /// Receive events from `hub` until [`Self::detach`] or drop.
    pub fn attach(&self, hub: &Arc<NotificationHub>) {
        self.detach();
        let core: Weak<BadgeCore> = Arc::downgrade(&self.core);
        let id = hub.register_callback(move |event| {
            if let Some(core) = core.upgrade() {
                core.apply_event(event);
            }
        });
        *lock(&self.attachment) = Some((Arc::clone(hub), id));
    }

    /// Stop receiving hub events. Safe to call when not attached.
    pub fn detach(&self) {
        if let Some((hub, id)) = lock(&self.attachment).take() {
            hub.unregister_callback(id);
        }
    }
}

impl<C: UnreadCountSource> NotificationBadgeReconciler<C> {
    /// Drive the reconciler from session and app-state channels.
    ///
    /// The current values are applied first. Identity and foreground changes
    /// take effect as soon as they arrive; fetches run in their own task so a
    /// hung request never holds up a later logout. Issuing a fetch aborts the
    /// one before it. The loop ends when both channels close.
    pub fn spawn_sync_loop(
        self: Arc<Self>,
        mut session: watch::Receiver<Option<AuthUser>>,
        mut app_state: watch::Receiver<AppState>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut in_flight: Option<JoinHandle<()>> = None;

            let initial_user = session.borrow_and_update().as_ref().map(|user| user.id.clone());
            let initial_state = *app_state.borrow_and_update();
            let mut refetch = self.core.enter_app_state(initial_state);
            refetch |= self.core.switch_user(initial_user.as_deref());
            if refetch {
                self.issue_fetch(&mut in_flight);
            }

            let mut session_open = true;
            let mut app_state_open = true;
            while session_open || app_state_open {
                let refetch = tokio::select! {
                    changed = session.changed(), if session_open => {
                        if changed.is_err() {
                            session_open = false;
                            continue;
                        }
                        let user_id = session.borrow_and_update().as_ref().map(|user| user.id.clone());
                        self.core.switch_user(user_id.as_deref())
                    }
                    changed = app_state.changed(), if app_state_open => {
                        if changed.is_err() {
                            app_state_open = false;
                            continue;
                        }
                        let next = *app_state.borrow_and_update();
                        self.core.enter_app_state(next)
                    }
                };
                if refetch {
                    self.issue_fetch(&mut in_flight);
                }
            }
            tracing::debug!("Badge sync loop finished");
        })
    }

    fn issue_fetch(self: &Arc<Self>, in_flight: &mut Option<JoinHandle<()>>) {
        if let Some(previous) = in_flight.take() {
            previous.abort();
        }
        let reconciler = Arc::clone(self);
        *in_flight = Some(tokio::spawn(async move {
            reconciler.fetch_unread_count().await;
        }));
    }
}

impl<C: UnreadCountSource> Drop for NotificationBadgeReconciler<C> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl BadgeInner {
    fn snapshot(&self) -> BadgeSnapshot {
        BadgeSnapshot {
            user_id: self.user_id.clone(),
            unread_count: self.unread_count,
            sync: self.sync,
        }
    }
}

impl BadgeCore {
    /// Apply an identity change. Returns `true` when the user changed.
    fn switch_user(&self, user_id: Option<&str>) -> bool {
        let user_id = normalize_text_option(user_id.map(str::to_string));
        let mut inner = lock(&self.inner);
        if inner.user_id == user_id {
            return false;
        }
        inner.session += 1;
        inner.user_id = user_id;
        inner.unread_count = 0;
        inner.sync = BadgeSyncState::Uninitialized;
        self.publish(&inner);
        true
    }

    /// Record the new app state. Returns `true` on a return to the foreground.
    fn enter_app_state(&self, next: AppState) -> bool {
        let mut inner = lock(&self.inner);
        let previous = std::mem::replace(&mut inner.app_state, next);
        let resync = previous != AppState::Active && next == AppState::Active;
        if resync {
            tracing::debug!("App returned to foreground; refreshing unread count");
        }
        resync
    }

    fn publish(&self, inner: &BadgeInner) {
        self.updates.send_replace(inner.snapshot());
    }

    fn begin_fetch(&self) -> Option<FetchTicket> {
        let mut inner = lock(&self.inner);
        inner.user_id.as_ref()?;
        inner.latest_fetch += 1;
        inner.sync = BadgeSyncState::Syncing;
        self.publish(&inner);
        Some(FetchTicket {
            session: inner.session,
            fetch: inner.latest_fetch,
        })
    }

    fn finish_fetch(&self, ticket: FetchTicket, result: NotificationApiResult<u64>) {
        let mut inner = lock(&self.inner);
        if inner.session != ticket.session || inner.latest_fetch != ticket.fetch {
            tracing::debug!("Discarding superseded unread count response");
            return;
        }

        match result {
            Ok(count) => {
                tracing::debug!(count, "Unread count synced");
                inner.unread_count = count;
                inner.sync = BadgeSyncState::Synced;
            }
            Err(error) => {
                tracing::warn!("Failed to fetch unread notification count: {}", error);
                inner.sync = BadgeSyncState::Stale;
            }
        }
        self.publish(&inner);
    }

    fn apply_event(&self, event: &NotificationEvent) {
        let mut inner = lock(&self.inner);
        if inner.user_id.is_none() {
            tracing::debug!(event = event.name(), "Ignoring notification event without a session");
            return;
        }

        inner.unread_count = match event {
            NotificationEvent::New { .. } => inner.unread_count.saturating_add(1),
            NotificationEvent::Read { .. } => inner.unread_count.saturating_sub(1),
            NotificationEvent::ReadAll => 0,
        };
        self.publish(&inner);
    }
}
