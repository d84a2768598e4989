//! HTTP reachability probe for hosts without a platform connectivity API.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;

use super::{
    NetworkState, NetworkStatusProvider, NetworkSubscribers, NetworkSubscription, ProbeError,
    Transport,
};
use crate::util::{lock, normalize_base_url};

/// Probes a URL with `HEAD` requests and reports the result as a
/// [`NetworkState`].
///
/// Any HTTP response counts as online. Subscribers are notified whenever a
/// probe result differs from the previous one, so the monitor's fallback poll
/// doubles as the push source.
pub struct HttpReachabilityProbe {
    url: String,
    client: Client,
    subscribers: NetworkSubscribers,
    last: Mutex<Option<NetworkState>>,
}

impl HttpReachabilityProbe {
    pub fn new(url: impl AsRef<str>, timeout: Duration) -> Result<Self, ProbeError> {
        let url = normalize_base_url(url.as_ref()).ok_or_else(|| {
            ProbeError::InvalidConfiguration(
                "probe URL must include http:// or https://".to_string(),
            )
        })?;

        Ok(Self {
            url,
            client: Client::builder().timeout(timeout).build()?,
            subscribers: NetworkSubscribers::default(),
            last: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn probe(&self) -> Result<NetworkState, ProbeError> {
        match self.client.head(&self.url).send().await {
            Ok(response) => {
                tracing::trace!(status = response.status().as_u16(), "Reachability probe answered");
                Ok(NetworkState::online(Transport::Unknown))
            }
            Err(error) if error.is_connect() => {
                tracing::trace!("Reachability probe could not connect: {}", error);
                Ok(NetworkState::offline())
            }
            Err(error) if error.is_timeout() => Ok(NetworkState {
                is_connected: true,
                is_internet_reachable: Some(false),
                transport: Transport::Unknown,
            }),
            Err(error) => Err(ProbeError::Http(error)),
        }
    }

    fn record(&self, state: NetworkState) {
        let changed = {
            let mut last = lock(&self.last);
            let changed = last.as_ref() != Some(&state);
            *last = Some(state);
            changed
        };
        if changed {
            self.subscribers.publish(&state);
        }
    }
}

impl NetworkStatusProvider for HttpReachabilityProbe {
    async fn fetch_current_state(&self) -> Result<NetworkState, ProbeError> {
        let state = self.probe().await?;
        self.record(state);
        Ok(state)
    }

    fn subscribe(&self) -> crate::Result<NetworkSubscription> {
        Ok(self.subscribers.subscribe())
    }
}
