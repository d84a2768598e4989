//! HTTP client for the notification endpoints of the UCGator API.

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{NotificationEvent, NotificationHub, UnreadCountSource};
use crate::util::{compact_text, normalize_base_url, normalize_text_option};

#[derive(Debug, Error)]
pub enum NotificationApiError {
    #[error("Not signed in: no access token available")]
    NotAuthenticated,
    #[error("Invalid notification API configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Notification API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Notification API error: {0}")]
    Api(String),
    #[error("Invalid notification API payload: {0}")]
    InvalidPayload(String),
}

pub type NotificationApiResult<T> = Result<T, NotificationApiError>;

/// Supplies the bearer token for API calls.
pub trait CredentialStore: Send + Sync + 'static {
    fn access_token(&self) -> Option<String>;
}

/// Fixed token, mostly for tests and environment overrides.
#[derive(Clone)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self(normalize_text_option(token))
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("StaticToken")
            .field(&self.0.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CredentialStore for StaticToken {
    fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Clone)]
pub struct NotificationApiClient {
    base_url: String,
    client: Client,
    credentials: Arc<dyn CredentialStore>,
}

impl fmt::Debug for NotificationApiClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("NotificationApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl NotificationApiClient {
    pub fn new(
        base_url: impl AsRef<str>,
        credentials: Arc<dyn CredentialStore>,
    ) -> NotificationApiResult<Self> {
        let base_url = normalize_base_url(base_url.as_ref()).ok_or_else(|| {
            NotificationApiError::InvalidConfiguration(
                "API base URL must include http:// or https://".to_string(),
            )
        })?;

        Ok(Self {
            base_url,
            client: Client::builder().build()?,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /notifications/unread-count`
    pub async fn unread_count(&self) -> NotificationApiResult<u64> {
        let request = self
            .client
            .get(format!("{}/notifications/unread-count", self.base_url));
        let response = self.send(request).await?;
        let payload = response.json::<UnreadCountResponse>().await?;
        u64::try_from(payload.count).map_err(|_| {
            NotificationApiError::InvalidPayload(format!(
                "unread count must not be negative (got {})",
                payload.count
            ))
        })
    }

    /// `PUT /notifications/{id}/read`
    pub async fn mark_read(&self, notification_id: &str) -> NotificationApiResult<()> {
        let notification_id = notification_id.trim();
        if notification_id.is_empty() {
            return Err(NotificationApiError::InvalidConfiguration(
                "notification id must not be empty".to_string(),
            ));
        }

        let request = self.client.put(format!(
            "{}/notifications/{}/read",
            self.base_url,
            urlencoding::encode(notification_id)
        ));
        self.send(request).await?;
        Ok(())
    }

    /// `PUT /notifications/read-all`
    pub async fn mark_all_read(&self) -> NotificationApiResult<()> {
        let request = self
            .client
            .put(format!("{}/notifications/read-all", self.base_url));
        self.send(request).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> NotificationApiResult<Response> {
        let token = self
            .credentials
            .access_token()
            .ok_or(NotificationApiError::NotAuthenticated)?;

        let response = request
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationApiError::Api(parse_api_error(status, &body)));
        }
        Ok(response)
    }
}

impl UnreadCountSource for NotificationApiClient {
    async fn fetch_unread_count(&self) -> NotificationApiResult<u64> {
        self.unread_count().await
    }
}

/// Marks notifications read on the server and tells local listeners.
///
/// Local events are only emitted after the server accepted the change.
#[derive(Debug, Clone)]
pub struct NotificationService {
    client: NotificationApiClient,
    hub: Arc<NotificationHub>,
}

impl NotificationService {
    pub const fn new(client: NotificationApiClient, hub: Arc<NotificationHub>) -> Self {
        Self { client, hub }
    }

    pub const fn client(&self) -> &NotificationApiClient {
        &self.client
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    pub async fn mark_read(&self, notification_id: &str) -> NotificationApiResult<()> {
        self.client.mark_read(notification_id).await?;
        self.hub.emit(&NotificationEvent::Read {
            notification_id: Some(notification_id.trim().to_string()),
        });
        Ok(())
    }

    pub async fn mark_all_read(&self) -> NotificationApiResult<()> {
        self.client.mark_all_read().await?;
        self.hub.emit(&NotificationEvent::ReadAll);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UnreadCountResponse {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    use super::*;

    /// Serve one response and hand back the raw request head.
    async fn spawn_one_shot_server(
        status_line: &str,
        body: &str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let address = listener.local_addr().expect("local address");
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (request_sender, request_receiver) = oneshot::channel();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut chunk = [0_u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&chunk[..read]),
                    }
                }
                let _ = request_sender.send(String::from_utf8_lossy(&request).into_owned());
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{address}/"), request_receiver)
    }

    fn client(base_url: &str) -> NotificationApiClient {
        NotificationApiClient::new(
            base_url,
            Arc::new(StaticToken::new(Some("gator-token".to_string()))),
        )
        .expect("client")
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        let error = NotificationApiClient::new("api.ucgator.app", Arc::new(StaticToken::new(None)))
            .unwrap_err();
        assert!(error.to_string().contains("http:// or https://"));
    }

    #[test]
    fn static_token_debug_redacts_value() {
        let debug = format!("{:?}", StaticToken::new(Some("secret".to_string())));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(StaticToken::new(Some("  ".to_string())).access_token(), None);
    }

    #[test]
    fn parse_api_error_prefers_message_field() {
        assert_eq!(
            parse_api_error(StatusCode::UNAUTHORIZED, r#"{"message":" token expired "}"#),
            "token expired (401)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            "boom (500)"
        );
    }

    #[tokio::test]
    async fn unread_count_sends_bearer_token() {
        let (url, request) = spawn_one_shot_server("200 OK", r#"{"count":4}"#).await;

        let count = client(&url).unread_count().await.expect("unread count");
        assert_eq!(count, 4);

        let request = request.await.expect("captured request").to_lowercase();
        assert!(request.starts_with("get /notifications/unread-count "));
        assert!(request.contains("authorization: bearer gator-token"));
    }

    #[tokio::test]
    async fn unread_count_rejects_negative_values() {
        let (url, _request) = spawn_one_shot_server("200 OK", r#"{"count":-1}"#).await;
        let error = client(&url).unread_count().await.unwrap_err();
        assert!(matches!(error, NotificationApiError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn unread_count_surfaces_http_failure() {
        let (url, _request) =
            spawn_one_shot_server("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let error = client(&url).unread_count().await.unwrap_err();
        assert!(error.to_string().contains("boom (500)"));
    }

    #[tokio::test]
    async fn missing_token_fails_before_request() {
        let client = NotificationApiClient::new(
            "http://127.0.0.1:9",
            Arc::new(StaticToken::new(None)),
        )
        .expect("client");
        let error = client.unread_count().await.unwrap_err();
        assert!(matches!(error, NotificationApiError::NotAuthenticated));
    }

    #[tokio::test]
    async fn mark_read_encodes_notification_id() {
        let (url, request) = spawn_one_shot_server("204 No Content", "").await;

        client(&url).mark_read("n 1/2").await.expect("mark read");

        let request = request.await.expect("captured request");
        assert!(request.starts_with("PUT /notifications/n%201%2F2/read "));
    }

    #[tokio::test]
    async fn mark_read_rejects_blank_id() {
        let error = client("http://127.0.0.1:9").mark_read("  ").await.unwrap_err();
        assert!(error.to_string().contains("notification id must not be empty"));
    }

    #[tokio::test]
    async fn service_emits_read_all_after_success() {
        let (url, request) = spawn_one_shot_server("200 OK", "{}").await;
        let hub = Arc::new(NotificationHub::new());
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        hub.register_callback(move |event| {
            if *event == NotificationEvent::ReadAll {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let service = NotificationService::new(client(&url), Arc::clone(&hub));
        service.mark_all_read().await.expect("mark all read");

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        let request = request.await.expect("captured request");
        assert!(request.starts_with("PUT /notifications/read-all "));
    }

    #[tokio::test]
    async fn service_does_not_emit_when_server_rejects() {
        let (url, _request) = spawn_one_shot_server("404 Not Found", "").await;
        let hub = Arc::new(NotificationHub::new());
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        hub.register_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let service = NotificationService::new(client(&url), hub);
        let error = service.mark_read("n-1").await.unwrap_err();

        assert!(error.to_string().contains("HTTP 404"));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
