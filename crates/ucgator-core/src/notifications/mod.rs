//! Unread-notification badge: typed events, the event hub, the reconciler
//! that caches the unread count, and the HTTP client for the notification API.

mod api;
mod events;
mod hub;
mod reconciler;

pub use api::{
    CredentialStore, NotificationApiClient, NotificationApiError, NotificationApiResult,
    NotificationService, StaticToken,
};
pub use events::NotificationEvent;
pub use hub::{HandlerId, NotificationHandler, NotificationHub};
pub use reconciler::{
    AppState, BadgeSnapshot, BadgeSyncState, NotificationBadgeReconciler, UnreadCountSource,
};
