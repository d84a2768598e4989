//! Signed-in user identity shared with the components that depend on it.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::util::normalize_text_option;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Publishes login and logout transitions.
///
/// Consumers hold a [`watch::Receiver`] and only see identity changes, never
/// credentials.
#[derive(Debug)]
pub struct SessionHandle {
    sender: watch::Sender<Option<AuthUser>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Sign in `user`. Re-announcing the current user is a no-op.
    pub fn login(&self, user: AuthUser) -> Result<()> {
        let id = normalize_text_option(Some(user.id)).ok_or_else(|| {
            Error::InvalidInput("user id must not be empty".to_string())
        })?;
        let user = AuthUser { id, ..user };

        self.sender.send_if_modified(|current| {
            if current.as_ref() == Some(&user) {
                return false;
            }
            tracing::info!(user_id = %user.id, "User signed in");
            *current = Some(user);
            true
        });
        Ok(())
    }

    pub fn logout(&self) {
        self.sender.send_if_modified(|current| {
            if current.is_none() {
                return false;
            }
            tracing::info!("User signed out");
            *current = None;
            true
        });
    }

    pub fn current(&self) -> Option<AuthUser> {
        self.sender.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.sender.borrow().as_ref().map(|user| user.id.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: Some(format!("{id}@ucgator.app")),
        }
    }

    #[test]
    fn login_rejects_blank_user_id() {
        let session = SessionHandle::new();
        let error = session.login(user("  ")).unwrap_err();
        assert!(error.to_string().contains("user id must not be empty"));
        assert_eq!(session.current(), None);
    }

    #[test]
    fn login_trims_user_id() {
        let session = SessionHandle::new();
        session.login(user(" gator ")).expect("login");
        assert_eq!(session.user_id().as_deref(), Some("gator"));
    }

    #[tokio::test]
    async fn subscribers_see_identity_changes_only() {
        let session = SessionHandle::new();
        let mut receiver = session.subscribe();

        session.login(user("gator")).expect("login");
        assert!(receiver.has_changed().expect("sender alive"));
        receiver.borrow_and_update();

        session.login(user("gator")).expect("repeat login");
        assert!(!receiver.has_changed().expect("sender alive"));

        session.logout();
        assert!(receiver.has_changed().expect("sender alive"));
        assert_eq!(*receiver.borrow_and_update(), None);

        session.logout();
        assert!(!receiver.has_changed().expect("sender alive"));
    }
}
