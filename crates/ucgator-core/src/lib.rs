//! ucgator-core - Core library for UCGator
//!
//! This crate contains the client-side reconciliation logic shared by every
//! UCGator front end: the connectivity monitor that turns raw network events
//! into user-facing alerts, and the notification badge reconciler that keeps
//! the unread count in sync with the remote API.

pub mod config;
pub mod connectivity;
pub mod error;
pub mod notifications;
pub mod session;
pub mod util;

pub use error::{Error, Result};
