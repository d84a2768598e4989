//! Access token storage backed by the system keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;
use ucgator_core::notifications::CredentialStore;
use ucgator_core::util::normalize_text_option;

use crate::error::CliError;

pub const ACCESS_TOKEN_ENV: &str = "UCGATOR_ACCESS_TOKEN";

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "ucgator-cli";
const KEYRING_USERNAME: &str = "api_access_token";

/// Where the active token comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Keyring,
    Missing,
}

/// Token lookup: environment override first, then the keyring entry.
#[derive(Clone, Default)]
pub struct KeyringCredentials {
    env_override: Option<String>,
}

impl std::fmt::Debug for KeyringCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("KeyringCredentials")
            .field("env_override", &self.env_override.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl KeyringCredentials {
    pub fn from_env() -> Self {
        Self::with_override(std::env::var(ACCESS_TOKEN_ENV).ok())
    }

    pub fn with_override(token: Option<String>) -> Self {
        Self {
            env_override: normalize_text_option(token),
        }
    }

    pub fn source(&self) -> Result<TokenSource, CliError> {
        if self.env_override.is_some() {
            return Ok(TokenSource::Environment);
        }
        Ok(if self.stored_token()?.is_some() {
            TokenSource::Keyring
        } else {
            TokenSource::Missing
        })
    }

    pub fn store_token(&self, token: &str) -> Result<(), CliError> {
        let token = normalize_text_option(Some(token.to_string())).ok_or(CliError::EmptyToken)?;
        write_entry(&token)
    }

    pub fn stored_token(&self) -> Result<Option<String>, CliError> {
        read_entry()
    }

    pub fn clear(&self) -> Result<(), CliError> {
        delete_entry()
    }
}

impl CredentialStore for KeyringCredentials {
    fn access_token(&self) -> Option<String> {
        if let Some(token) = &self.env_override {
            return Some(token.clone());
        }
        match self.stored_token() {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!("Failed to read access token from keyring: {}", error);
                None
            }
        }
    }
}

#[cfg(not(test))]
fn entry() -> Result<Entry, CliError> {
    Entry::new(KEYRING_SERVICE_NAME, KEYRING_USERNAME)
        .map_err(|error| CliError::Credentials(error.to_string()))
}

#[cfg(not(test))]
fn read_entry() -> Result<Option<String>, CliError> {
    match entry()?.get_password() {
        Ok(token) => Ok(normalize_text_option(Some(token))),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(error) => Err(CliError::Credentials(error.to_string())),
    }
}

#[cfg(not(test))]
fn write_entry(token: &str) -> Result<(), CliError> {
    entry()?
        .set_password(token)
        .map_err(|error| CliError::Credentials(error.to_string()))
}

#[cfg(not(test))]
fn delete_entry() -> Result<(), CliError> {
    match entry()?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(error) => Err(CliError::Credentials(error.to_string())),
    }
}

#[cfg(test)]
fn test_store() -> &'static Mutex<HashMap<String, String>> {
    static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(HashMap::new()))
}

#[cfg(test)]
fn read_entry() -> Result<Option<String>, CliError> {
    let guard = test_store()
        .lock()
        .map_err(|error| CliError::Credentials(error.to_string()))?;
    Ok(guard.get(KEYRING_USERNAME).cloned())
}

#[cfg(test)]
fn write_entry(token: &str) -> Result<(), CliError> {
    let mut guard = test_store()
        .lock()
        .map_err(|error| CliError::Credentials(error.to_string()))?;
    guard.insert(KEYRING_USERNAME.to_string(), token.to_string());
    Ok(())
}

#[cfg(test)]
fn delete_entry() -> Result<(), CliError> {
    let mut guard = test_store()
        .lock()
        .map_err(|error| CliError::Credentials(error.to_string()))?;
    guard.remove(KEYRING_USERNAME);
    Ok(())
}
