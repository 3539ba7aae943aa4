#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the channel admin API.
//!
//! The client library and the CLI both encode/decode through these types so the
//! wire contract lives in one place. Decoding is lenient: optional fields default
//! when the backend omits them or sends `null`, and unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Status string reported for a connected channel.
pub const STATUS_ONLINE: &str = "online";
/// Status string reported for a channel waiting for its QR/login step.
pub const STATUS_WAITING_LOGIN: &str = "waiting_login";

/// Messaging channel as returned by `/api/admin/channels`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    /// Database primary key.
    pub primary_key_id: i64,
    /// External channel identifier used in every per-channel route.
    pub id: String,
    /// Owning user identifier.
    #[serde(default)]
    pub user_id: i64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Phone number bound to the channel, when known.
    #[serde(default)]
    pub phone: Option<String>,
    /// Provider auth token.
    #[serde(default)]
    pub token: Option<String>,
    /// Channel tier (`premium`, `basic`, ...).
    #[serde(default)]
    pub mode: String,
    /// Subscription expiry timestamp as sent by the backend.
    pub active_till: String,
    /// Provider project identifier.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Link entry inside a [`Paginated`] envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageLink {
    /// Target URL, absent for disabled links.
    #[serde(default)]
    pub url: Option<String>,
    /// Rendered label.
    #[serde(default)]
    pub label: String,
    /// Whether the link points at the current page.
    #[serde(default)]
    pub active: bool,
}

/// Paginated list envelope. Only `data` is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Paginated<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// One-based page index.
    #[serde(default)]
    pub current_page: Option<u32>,
    /// Last page index.
    #[serde(default)]
    pub last_page: Option<u32>,
    /// Page size.
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Total item count across pages.
    #[serde(default)]
    pub total: Option<u64>,
    /// Index of the first item on this page.
    #[serde(default)]
    pub from: Option<u64>,
    /// Index of the last item on this page.
    #[serde(default)]
    pub to: Option<u64>,
    /// Base path of the listing.
    #[serde(default)]
    pub path: Option<String>,
    /// URL of the first page.
    #[serde(default)]
    pub first_page_url: Option<String>,
    /// URL of the last page.
    #[serde(default)]
    pub last_page_url: Option<String>,
    /// URL of the next page, if any.
    #[serde(default)]
    pub next_page_url: Option<String>,
    /// URL of the previous page, if any.
    #[serde(default)]
    pub prev_page_url: Option<String>,
    /// Navigation links.
    #[serde(default)]
    pub links: Vec<PageLink>,
}

/// Account logged into a connected channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ChannelUser {
    /// Provider user identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Push name advertised by the account.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pushname: String,
    /// Whether the account is a business account.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_business: bool,
    /// Avatar URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
}

/// Response of `GET /api/admin/channels/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelStatusResponse {
    /// Echoed channel identifier.
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Connectivity status; unknown values are passed through verbatim.
    pub status: String,
    /// Logged-in account, when connected.
    #[serde(default)]
    pub user: Option<ChannelUser>,
}

/// Webhook configuration for a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelWebhook {
    /// Echoed channel identifier.
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Configured webhook URL; empty when unset or `null`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub webhook_url: String,
}

/// Body of `POST /api/admin/channels/{id}/webhook`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetWebhookRequest {
    /// New webhook target.
    pub webhook_url: String,
}

/// Body of `POST /api/admin/channels/{id}/days`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddDaysRequest {
    /// Number of days to extend the subscription by.
    pub days: i64,
    /// Audit comment stored with the extension.
    pub comment: String,
}

/// Response of `POST /api/admin/channels/{id}/days`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddDaysResponse {
    /// Echoed channel identifier.
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Days applied.
    pub days: i64,
    /// Comment stored.
    #[serde(default)]
    pub comment: String,
    /// New expiry timestamp.
    pub active_till: String,
}

/// Body of `POST /api/admin/channels`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CreateChannelRequest {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

/// Body of `PUT`/`PATCH /api/admin/channels/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UpdateChannelRequest {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateChannelRequest {
    /// Whether the request carries no changes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Candidate webhook target from the global system configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookDomain {
    /// Domain or URL used as the webhook address.
    pub domain: String,
    /// Priority weight; values above 1 are surfaced to operators.
    #[serde(default)]
    pub weight: i64,
}

/// Response of `GET /api/admin/system/config`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SystemConfig {
    /// Webhook domains offered for every channel.
    #[serde(default, deserialize_with = "null_as_default")]
    pub webhook_domain: Vec<WebhookDomain>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_decodes_with_nulls_and_extra_fields() {
        let channel: Channel = serde_json::from_value(json!({
            "primary_key_id": 3,
            "id": "ch-3",
            "user_id": 9,
            "name": "support",
            "phone": null,
            "token": "tok",
            "mode": "premium",
            "active_till": "2026-01-01T00:00:00Z",
            "project_id": null,
            "unexpected": true
        }))
        .expect("channel should decode");
        assert_eq!(channel.id, "ch-3");
        assert_eq!(channel.phone, None);
        assert_eq!(channel.token.as_deref(), Some("tok"));
        assert_eq!(channel.created_at, None);
    }

    #[test]
    fn paginated_envelope_only_requires_data() {
        let page: Paginated<WebhookDomain> = serde_json::from_value(json!({
            "data": [{"domain": "https://a.example", "weight": 2}],
            "current_page": 1,
            "next_page_url": null
        }))
        .expect("page should decode");
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.current_page, Some(1));
        assert!(page.links.is_empty());
    }

    #[test]
    fn status_response_tolerates_null_user_fields() {
        let reply: ChannelStatusResponse = serde_json::from_value(json!({
            "channel_id": "C1",
            "status": "online",
            "user": {
                "id": "42",
                "name": null,
                "pushname": null,
                "is_business": null,
                "avatar": null
            }
        }))
        .expect("status should decode");
        assert_eq!(reply.status, STATUS_ONLINE);
        let user = reply.user.expect("user");
        assert_eq!(user.id, "42");
        assert!(user.avatar.is_empty());
        assert!(!user.is_business);
    }

    #[test]
    fn webhook_url_null_means_unset() {
        let webhook: ChannelWebhook =
            serde_json::from_value(json!({"channel_id": "C1", "webhook_url": null}))
                .expect("webhook should decode");
        assert!(webhook.webhook_url.is_empty());
        let webhook: ChannelWebhook =
            serde_json::from_value(json!({"channel_id": "C1"})).expect("webhook should decode");
        assert!(webhook.webhook_url.is_empty());
    }

    #[test]
    fn system_config_tolerates_null_domains() {
        let config: SystemConfig =
            serde_json::from_value(json!({"webhook_domain": null})).expect("config");
        assert!(config.webhook_domain.is_empty());
        let config: SystemConfig = serde_json::from_value(json!({})).expect("config");
        assert!(config.webhook_domain.is_empty());
    }

    #[test]
    fn update_request_skips_absent_fields() {
        let request = UpdateChannelRequest {
            name: Some("renamed".into()),
            description: None,
        };
        assert_eq!(
            serde_json::to_value(&request).expect("encode"),
            json!({"name": "renamed"})
        );
        assert!(UpdateChannelRequest::default().is_empty());
    }
}
