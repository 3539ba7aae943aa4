//! Presentation of cached channel state as table cells.

use chrono::TimeZone;

use super::logic::{format_date, is_premium};
use super::state::{ChannelStatus, ChannelsState, StatusEntry, WebhookEntry};
use crate::i18n::TranslationBundle;

const PLACEHOLDER: &str = "-";

/// Colour hint for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Positive state.
    Success,
    /// Needs attention.
    Warning,
    /// Failure or lapsed.
    Danger,
    /// Neutral or unknown.
    Muted,
}

/// Status column content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCell {
    /// No lookup has started yet.
    Unknown,
    /// Spinner.
    Loading,
    /// Error badge with a retry affordance.
    Error,
    /// Expired badge.
    Expired,
    /// Online badge.
    Online,
    /// Waiting-login badge.
    WaitingLogin,
    /// Raw backend status.
    Other(String),
}

impl StatusCell {
    /// Derive the cell from a cache entry.
    #[must_use]
    pub fn from_entry(entry: Option<&StatusEntry>) -> Self {
        let Some(entry) = entry else {
            return Self::Unknown;
        };
        if entry.loading {
            return Self::Loading;
        }
        if entry.error {
            return Self::Error;
        }
        match &entry.status {
            ChannelStatus::Loading => Self::Loading,
            ChannelStatus::Error => Self::Error,
            ChannelStatus::Expired => Self::Expired,
            ChannelStatus::Online => Self::Online,
            ChannelStatus::WaitingLogin => Self::WaitingLogin,
            ChannelStatus::Other(raw) => Self::Other(raw.clone()),
        }
    }

    /// Localized label.
    #[must_use]
    pub fn label(&self, bundle: &TranslationBundle) -> String {
        match self {
            Self::Unknown => PLACEHOLDER.to_string(),
            Self::Loading => bundle.text("channels.status.loading"),
            Self::Error => bundle.text("channels.status.error"),
            Self::Expired => bundle.text("channels.status.expired"),
            Self::Online => bundle.text("channels.status.online"),
            Self::WaitingLogin => bundle.text("channels.status.waitingLogin"),
            Self::Other(raw) => raw.clone(),
        }
    }

    /// Badge colour.
    #[must_use]
    pub const fn tone(&self) -> Tone {
        match self {
            Self::Online => Tone::Success,
            Self::WaitingLogin => Tone::Warning,
            Self::Error | Self::Expired => Tone::Danger,
            Self::Unknown | Self::Loading | Self::Other(_) => Tone::Muted,
        }
    }

    /// Whether the retry control is offered.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Whether the channel is connected enough to show its webhook.
    #[must_use]
    pub const fn shows_webhook(&self) -> bool {
        matches!(self, Self::Online | Self::WaitingLogin)
    }
}

/// Webhook column content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookCell {
    /// Channel not connected; nothing to show.
    Hidden,
    /// Request in flight; the previous URL stays visible when known.
    Loading {
        /// Last known URL, possibly empty.
        previous: String,
    },
    /// Last request failed; the previous URL stays visible when known.
    Error {
        /// Last known URL, possibly empty.
        previous: String,
    },
    /// No webhook configured.
    Empty,
    /// Configured URL.
    Url(String),
}

impl WebhookCell {
    /// Derive the cell from the status and webhook cache entries.
    #[must_use]
    pub fn from_entries(status: &StatusCell, entry: Option<&WebhookEntry>) -> Self {
        if !status.shows_webhook() {
            return Self::Hidden;
        }
        match entry {
            None => Self::Loading {
                previous: String::new(),
            },
            Some(entry) if entry.loading => Self::Loading {
                previous: entry.url.clone(),
            },
            Some(entry) if entry.error => Self::Error {
                previous: entry.url.clone(),
            },
            Some(entry) if entry.url.is_empty() => Self::Empty,
            Some(entry) => Self::Url(entry.url.clone()),
        }
    }

    /// Localized label.
    #[must_use]
    pub fn label(&self, bundle: &TranslationBundle) -> String {
        match self {
            Self::Hidden => PLACEHOLDER.to_string(),
            Self::Loading { previous } if previous.is_empty() => {
                bundle.text("channels.status.loading")
            }
            Self::Error { previous } if previous.is_empty() => {
                bundle.text("channels.status.webhookError")
            }
            Self::Loading { previous } | Self::Error { previous } => previous.clone(),
            Self::Empty => bundle.text("channels.status.noWebhook"),
            Self::Url(url) => url.clone(),
        }
    }

    /// Whether the retry control is offered.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRow {
    /// Database key.
    pub primary_key_id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Channel id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Phone or placeholder.
    pub phone: String,
    /// Token or placeholder.
    pub token: String,
    /// Project id or placeholder.
    pub project_id: String,
    /// Tier name.
    pub mode: String,
    /// Whether the premium badge is shown.
    pub premium: bool,
    /// Expiry as `YYYY-MM-DD`.
    pub active_till: String,
    /// Status column.
    pub status: StatusCell,
    /// Webhook column.
    pub webhook: WebhookCell,
    /// Whether the set-webhook action is available.
    pub can_set_webhook: bool,
    /// Whether the add-days action is available.
    pub can_add_days: bool,
}

/// Build table rows in list order.
#[must_use]
pub fn rows<Tz: TimeZone>(state: &ChannelsState, tz: &Tz) -> Vec<ChannelRow> {
    state
        .channels
        .iter()
        .map(|channel| {
            let status = StatusCell::from_entry(state.statuses.get(&channel.id));
            let webhook = WebhookCell::from_entries(&status, state.webhooks.get(&channel.id));
            ChannelRow {
                primary_key_id: channel.primary_key_id,
                user_id: channel.user_id,
                id: channel.id.clone(),
                name: channel.name.clone(),
                phone: or_placeholder(channel.phone.as_deref()),
                token: or_placeholder(channel.token.as_deref()),
                project_id: or_placeholder(channel.project_id.as_deref()),
                mode: channel.mode.clone(),
                premium: is_premium(&channel.mode),
                active_till: format_date(&channel.active_till, tz),
                can_set_webhook: !state.domains.is_empty(),
                can_add_days: !state.submitting_days.contains(&channel.id),
                status,
                webhook,
            }
        })
        .collect()
}

fn or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocaleCode;
    use chanadmin_api_models::{Channel, WebhookDomain};
    use chrono::Utc;

    fn sample_state() -> ChannelsState {
        let mut state = ChannelsState::default();
        state.channels = vec![Channel {
            primary_key_id: 7,
            id: "C1".into(),
            user_id: 2,
            name: "support".into(),
            phone: Some(String::new()),
            token: Some("tok".into()),
            mode: "premium".into(),
            active_till: "2030-05-01T10:00:00Z".into(),
            project_id: None,
            created_at: None,
            updated_at: None,
        }];
        state.domains = vec![WebhookDomain {
            domain: "https://a.example".into(),
            weight: 1,
        }];
        state
    }

    #[test]
    fn unknown_status_renders_raw_text() {
        let bundle = TranslationBundle::new(LocaleCode::En);
        let cell = StatusCell::from_entry(Some(&StatusEntry::resolved(ChannelStatus::Other(
            "banned".into(),
        ))));
        assert_eq!(cell, StatusCell::Other("banned".into()));
        assert_eq!(cell.label(&bundle), "banned");
        assert_eq!(cell.tone(), Tone::Muted);
    }

    #[test]
    fn error_entry_offers_retry() {
        let cell = StatusCell::from_entry(Some(&StatusEntry::failed()));
        assert!(cell.can_retry());
        assert_eq!(cell.tone(), Tone::Danger);
        assert!(!StatusCell::Online.can_retry());
    }

    #[test]
    fn webhook_cell_keeps_previous_url_while_updating() {
        let bundle = TranslationBundle::new(LocaleCode::En);
        let entry = WebhookEntry {
            url: "https://old.example".into(),
            loading: true,
            error: false,
        };
        let cell = WebhookCell::from_entries(&StatusCell::Online, Some(&entry));
        assert_eq!(cell.label(&bundle), "https://old.example");

        let cell = WebhookCell::from_entries(&StatusCell::Online, Some(&WebhookEntry::failed()));
        assert!(cell.can_retry());
        assert_eq!(cell.label(&bundle), "Webhook error");

        let cell = WebhookCell::from_entries(&StatusCell::Expired, Some(&entry));
        assert_eq!(cell, WebhookCell::Hidden);
    }

    #[test]
    fn rows_format_fields() {
        let mut state = sample_state();
        state
            .statuses
            .insert("C1".into(), StatusEntry::resolved(ChannelStatus::Online));
        state
            .webhooks
            .insert("C1".into(), WebhookEntry::resolved(String::new()));

        let rows = rows(&state, &Utc);
        let row = &rows[0];
        assert_eq!(row.active_till, "2030-05-01");
        assert_eq!(row.phone, "-");
        assert_eq!(row.token, "tok");
        assert_eq!(row.project_id, "-");
        assert!(row.premium);
        assert_eq!(row.webhook, WebhookCell::Empty);
        assert!(row.can_set_webhook);
        assert!(row.can_add_days);
    }

    #[test]
    fn add_days_disabled_while_submitting() {
        let mut state = sample_state();
        state.submitting_days.insert("C1".into());
        let rows = rows(&state, &Utc);
        assert!(!rows[0].can_add_days);
        assert_eq!(rows[0].status, StatusCell::Unknown);
        assert_eq!(rows[0].webhook, WebhookCell::Hidden);
        assert!(rows[0].can_set_webhook);
    }
}
