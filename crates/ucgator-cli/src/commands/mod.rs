pub mod auth_cmd;
pub mod badge;
pub mod common;
pub mod completions;
pub mod config;
pub mod network;
pub mod notifications;
