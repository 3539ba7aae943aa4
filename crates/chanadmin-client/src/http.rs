//! Authenticated JSON transport.
//!
//! Every request is built against the configured base URL, carries the session
//! token as a bearer credential when one is present, and is tagged with the
//! caller's `x-request-id`. A 401 purges the session before the error is
//! returned so the shell can route back to sign-in.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::session::SessionContext;

/// Trace header attached to every request.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Bearer-authenticated JSON client for the admin API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    session: SessionContext,
}

impl ApiClient {
    /// Build a client from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] when the HTTP client cannot be
    /// constructed (for example when `request_id` is not a valid header value).
    pub fn new(config: &ClientConfig, session: SessionContext, request_id: &str) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(request_id) {
            headers.insert(HEADER_REQUEST_ID, value);
        } else {
            warn!(request_id, "request id is not a valid header value; omitting it");
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|source| ApiError::ClientBuild { source })?;
        Ok(Self::with_client(http, config.base_url.clone(), session))
    }

    /// Wrap an existing reqwest client.
    #[must_use]
    pub const fn with_client(http: Client, base_url: Url, session: SessionContext) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    /// Session shared with this client.
    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// `GET` and decode a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        segments: &[&str],
    ) -> ApiResult<T> {
        let bytes = self
            .send(operation, Method::GET, segments, None::<&()>)
            .await?;
        decode(operation, &bytes)
    }

    /// `POST` a JSON body and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post<B, T>(
        &self,
        operation: &'static str,
        segments: &[&str],
        body: &B,
    ) -> ApiResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self
            .send(operation, Method::POST, segments, Some(body))
            .await?;
        decode(operation, &bytes)
    }

    /// `PUT` a JSON body and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn put<B, T>(&self, operation: &'static str, segments: &[&str], body: &B) -> ApiResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self
            .send(operation, Method::PUT, segments, Some(body))
            .await?;
        decode(operation, &bytes)
    }

    /// `PATCH` a JSON body and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn patch<B, T>(
        &self,
        operation: &'static str,
        segments: &[&str],
        body: &B,
    ) -> ApiResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self
            .send(operation, Method::PATCH, segments, Some(body))
            .await?;
        decode(operation, &bytes)
    }

    /// `DELETE`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn delete(&self, operation: &'static str, segments: &[&str]) -> ApiResult<()> {
        self.send(operation, Method::DELETE, segments, None::<&()>)
            .await
            .map(|_| ())
    }

    /// Resolve path segments against the base URL, percent-encoding each one.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] when the base URL cannot carry a path.
    pub fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl {
                base: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<B>(
        &self,
        operation: &'static str,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> ApiResult<Vec<u8>>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(segments)?;
        debug!(operation, %method, %url, "sending request");
        let mut request = self.http.request(method, url);
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(operation, "server rejected credentials; clearing session");
            self.session.expire();
            return Err(ApiError::Unauthorized { operation });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        if !status.is_success() {
            let message = problem_message(status, &bytes);
            warn!(operation, status = status.as_u16(), %message, "request rejected");
            return Err(ApiError::Status {
                operation,
                status: status.as_u16(),
                message,
            });
        }
        Ok(bytes.to_vec())
    }
}

fn decode<T: DeserializeOwned>(operation: &'static str, bytes: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(bytes).map_err(|source| ApiError::Decode { operation, source })
}

/// Best-effort human message for an error body.
///
/// Prefers a JSON `message`, `detail`, `error` or `title` string, then the
/// trimmed body text, then a generic status line.
#[must_use]
pub fn problem_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) {
        for key in ["message", "detail", "error", "title"] {
            if let Some(text) = fields.get(key).and_then(Value::as_str) {
                let text = text.trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        format!("request failed with status {status}")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocaleCode;
    use crate::session::SessionEvent;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer, session: SessionContext) -> ApiClient {
        let config = ClientConfig::new(&server.base_url(), 5, None, LocaleCode::En)
            .expect("config");
        ApiClient::new(&config, session, "trace-123").expect("client")
    }

    #[tokio::test]
    async fn attaches_bearer_and_request_id() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/admin/system/config")
                .header("authorization", "Bearer secret")
                .header("x-request-id", "trace-123");
            then.status(200).json_body(json!({"webhook_domain": []}));
        });
        let session = SessionContext::in_memory();
        session.sign_in("secret").expect("sign in");

        let value: Value = client_for(&server, session)
            .get("system.config", &["api", "admin", "system", "config"])
            .await
            .expect("request succeeds");

        mock.assert();
        assert_eq!(value, json!({"webhook_domain": []}));
    }

    #[tokio::test]
    async fn unauthorized_purges_session() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/channels");
            then.status(401).json_body(json!({"message": "Unauthenticated."}));
        });
        let session = SessionContext::in_memory();
        session.sign_in("stale").expect("sign in");
        let client = client_for(&server, session.clone());

        let err = client
            .get::<Value>("channels.list", &["api", "admin", "channels"])
            .await
            .expect_err("401 must fail");

        assert!(err.is_unauthorized());
        assert_eq!(session.token(), None);
        assert_eq!(session.last_event(), SessionEvent::SignInRequired);
    }

    #[tokio::test]
    async fn error_status_surfaces_body_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/admin/channels/C1/days");
            then.status(422).json_body(json!({"message": "days must be positive"}));
        });
        let client = client_for(&server, SessionContext::in_memory());

        let err = client
            .post::<_, Value>(
                "channels.add_days",
                &["api", "admin", "channels", "C1", "days"],
                &json!({"days": 0, "comment": "no"}),
            )
            .await
            .expect_err("422 must fail");

        match err {
            ApiError::Status {
                status, message, ..
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "days must be positive");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/channels/C1");
            then.status(200).body("<html>");
        });
        let client = client_for(&server, SessionContext::in_memory());

        let err = client
            .get::<Value>("channels.get", &["api", "admin", "channels", "C1"])
            .await
            .expect_err("html is not json");
        assert!(matches!(err, ApiError::Decode { operation: "channels.get", .. }));
    }

    #[test]
    fn url_encodes_segments_and_keeps_prefix() {
        let config =
            ClientConfig::new("https://admin.example/prefix/", 5, None, LocaleCode::En)
                .expect("config");
        let client =
            ApiClient::new(&config, SessionContext::in_memory(), "trace").expect("client");
        let url = client
            .url(&["api", "admin", "channels", "a b/c"])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://admin.example/prefix/api/admin/channels/a%20b%2Fc"
        );
    }

    #[test]
    fn problem_message_prefers_json_fields() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(problem_message(status, br#"{"detail":"boom"}"#), "boom");
        assert_eq!(problem_message(status, br#"{"error":" bad "}"#), "bad");
        assert_eq!(problem_message(status, b" plain text "), "plain text");
        assert_eq!(
            problem_message(status, b""),
            "request failed with status 500 Internal Server Error"
        );
    }
}
