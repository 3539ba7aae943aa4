//! Channel list state and its pure transitions.
//!
//! The async board owns a [`ChannelsState`] behind a mutex and only mutates it
//! through the methods here, so every transition can be tested without a
//! runtime.

use std::collections::{HashMap, HashSet};

use chanadmin_api_models::{Channel, STATUS_ONLINE, STATUS_WAITING_LOGIN, WebhookDomain};
use chrono::{DateTime, TimeZone};

use super::dialogs::{AddDaysDialog, CreateChannelForm, WebhookDomainDialog};
use super::logic::is_before_yesterday;
use crate::toast::ToastQueue;

const STATUS_EXPIRED: &str = "expired";

/// Connectivity status shown for a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Fetch in flight.
    Loading,
    /// Fetch failed.
    Error,
    /// Subscription lapsed; no fetch performed.
    Expired,
    /// Connected.
    Online,
    /// Waiting for the login step.
    WaitingLogin,
    /// Any other backend value, kept verbatim.
    Other(String),
}

impl ChannelStatus {
    /// Map a backend status string.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            STATUS_ONLINE => Self::Online,
            STATUS_WAITING_LOGIN => Self::WaitingLogin,
            STATUS_EXPIRED => Self::Expired,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire-style name of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Loading => "loading",
            Self::Error => "error",
            Self::Expired => STATUS_EXPIRED,
            Self::Online => STATUS_ONLINE,
            Self::WaitingLogin => STATUS_WAITING_LOGIN,
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Whether the status warrants a webhook lookup.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Online | Self::WaitingLogin)
    }
}

/// Cached status for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Current status.
    pub status: ChannelStatus,
    /// Fetch in flight.
    pub loading: bool,
    /// Last fetch failed.
    pub error: bool,
}

impl StatusEntry {
    /// Fetch in flight.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            status: ChannelStatus::Loading,
            loading: true,
            error: false,
        }
    }

    /// Expired channel; terminal until the list is reloaded.
    #[must_use]
    pub const fn expired() -> Self {
        Self {
            status: ChannelStatus::Expired,
            loading: false,
            error: false,
        }
    }

    /// Successful fetch.
    #[must_use]
    pub const fn resolved(status: ChannelStatus) -> Self {
        Self {
            status,
            loading: false,
            error: false,
        }
    }

    /// Failed fetch.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            status: ChannelStatus::Error,
            loading: false,
            error: true,
        }
    }

    /// Whether the entry holds a final, successful value.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.loading && !self.error
    }
}

/// Cached webhook URL for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WebhookEntry {
    /// Last known URL (may be empty).
    pub url: String,
    /// Request in flight.
    pub loading: bool,
    /// Last request failed.
    pub error: bool,
}

impl WebhookEntry {
    /// Fetch in flight with no known URL.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            url: String::new(),
            loading: true,
            error: false,
        }
    }

    /// Successful fetch or update.
    #[must_use]
    pub const fn resolved(url: String) -> Self {
        Self {
            url,
            loading: false,
            error: false,
        }
    }

    /// Failed fetch with no known URL.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            url: String::new(),
            loading: false,
            error: true,
        }
    }

    /// Whether the entry holds a final, successful value.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.loading && !self.error
    }
}

/// Everything the channel list renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelsState {
    /// Channels in server order.
    pub channels: Vec<Channel>,
    /// Status cache keyed by channel id.
    pub statuses: HashMap<String, StatusEntry>,
    /// Webhook cache keyed by channel id.
    pub webhooks: HashMap<String, WebhookEntry>,
    /// Webhook domains from the system configuration.
    pub domains: Vec<WebhookDomain>,
    /// List request in flight.
    pub list_loading: bool,
    /// System configuration request in flight.
    pub config_loading: bool,
    /// Set-webhook dialog.
    pub webhook_dialog: WebhookDomainDialog,
    /// Add-days dialog.
    pub add_days_dialog: AddDaysDialog,
    /// Create-channel form.
    pub create_form: CreateChannelForm,
    /// Channels with an add-days request in flight.
    pub submitting_days: HashSet<String>,
    /// Pending notifications.
    pub toasts: ToastQueue,
}

impl ChannelsState {
    /// Replace the list, rebuilding both caches from scratch.
    ///
    /// Expired channels get a terminal entry; every other channel starts
    /// loading. Returns the ids whose status must be fetched.
    pub fn replace_channels<Tz: TimeZone>(
        &mut self,
        channels: Vec<Channel>,
        now: &DateTime<Tz>,
    ) -> Vec<String> {
        self.statuses.clear();
        self.webhooks.clear();
        let mut pending = Vec::new();
        for channel in &channels {
            if is_before_yesterday(&channel.active_till, now) {
                self.statuses
                    .insert(channel.id.clone(), StatusEntry::expired());
            } else {
                self.statuses
                    .insert(channel.id.clone(), StatusEntry::loading());
                pending.push(channel.id.clone());
            }
        }
        self.channels = channels;
        pending
    }

    /// Look up a channel.
    #[must_use]
    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|channel| channel.id == id)
    }

    /// Prepare an automatic status fetch.
    ///
    /// Returns `false` when the channel is unknown, already settled, in flight,
    /// or expired (in which case the entry becomes expired without a request).
    pub fn begin_status<Tz: TimeZone>(&mut self, id: &str, now: &DateTime<Tz>) -> bool {
        let Some(active_till) = self.channel(id).map(|channel| channel.active_till.clone()) else {
            return false;
        };
        if self
            .statuses
            .get(id)
            .is_some_and(|entry| entry.is_settled() || entry.loading)
        {
            return false;
        }
        if is_before_yesterday(&active_till, now) {
            self.statuses.insert(id.to_string(), StatusEntry::expired());
            return false;
        }
        self.statuses.insert(id.to_string(), StatusEntry::loading());
        true
    }

    /// Prepare a manual status retry regardless of the cached value.
    pub fn force_status(&mut self, id: &str) -> bool {
        if self.channel(id).is_none() {
            return false;
        }
        self.statuses.insert(id.to_string(), StatusEntry::loading());
        true
    }

    /// Record a status reply. Ignored when the channel is gone.
    pub fn resolve_status(&mut self, id: &str, status: ChannelStatus) {
        if let Some(entry) = self.statuses.get_mut(id) {
            *entry = StatusEntry::resolved(status);
        }
    }

    /// Record a status failure. Ignored when the channel is gone.
    pub fn fail_status(&mut self, id: &str) {
        if let Some(entry) = self.statuses.get_mut(id) {
            *entry = StatusEntry::failed();
        }
    }

    /// Prepare an automatic webhook fetch; `false` when settled, in flight or unknown.
    pub fn begin_webhook(&mut self, id: &str) -> bool {
        if self.channel(id).is_none()
            || self
                .webhooks
                .get(id)
                .is_some_and(|entry| entry.is_settled() || entry.loading)
        {
            return false;
        }
        self.webhooks.insert(id.to_string(), WebhookEntry::loading());
        true
    }

    /// Prepare a manual webhook retry regardless of the cached value.
    pub fn force_webhook(&mut self, id: &str) -> bool {
        if self.channel(id).is_none() {
            return false;
        }
        self.webhooks.insert(id.to_string(), WebhookEntry::loading());
        true
    }

    /// Record a webhook reply. Ignored when the channel is gone.
    pub fn resolve_webhook(&mut self, id: &str, url: String) {
        if self.channel(id).is_some() {
            self.webhooks
                .insert(id.to_string(), WebhookEntry::resolved(url));
        }
    }

    /// Record a webhook fetch failure, dropping any known URL.
    pub fn fail_webhook(&mut self, id: &str) {
        if let Some(entry) = self.webhooks.get_mut(id) {
            *entry = WebhookEntry::failed();
        }
    }

    /// Mark a webhook update in flight, keeping the previous URL visible.
    pub fn begin_set_webhook(&mut self, id: &str) {
        let entry = self.webhooks.entry(id.to_string()).or_default();
        entry.loading = true;
        entry.error = false;
    }

    /// Record a webhook update failure, keeping the previous URL.
    pub fn fail_set_webhook(&mut self, id: &str) {
        if let Some(entry) = self.webhooks.get_mut(id) {
            entry.loading = false;
            entry.error = true;
        }
    }

    /// URL currently cached for `id`, if any.
    #[must_use]
    pub fn webhook_url(&self, id: &str) -> Option<&str> {
        self.webhooks.get(id).map(|entry| entry.url.as_str())
    }

    /// Replace a channel's expiry after days were added.
    pub fn update_active_till(&mut self, id: &str, active_till: &str) {
        if let Some(channel) = self.channels.iter_mut().find(|channel| channel.id == id) {
            channel.active_till = active_till.to_string();
        }
    }

    /// Append a newly created channel.
    pub fn append_channel(&mut self, channel: Channel) {
        self.channels.push(channel);
    }

    /// Swap in an updated channel record, keeping its position.
    pub fn replace_channel(&mut self, channel: Channel) {
        if let Some(slot) = self
            .channels
            .iter_mut()
            .find(|existing| existing.id == channel.id)
        {
            *slot = channel;
        }
    }

    /// Drop a channel and everything cached for it. Returns whether it existed.
    pub fn remove_channel(&mut self, id: &str) -> bool {
        let before = self.channels.len();
        self.channels.retain(|channel| channel.id != id);
        self.statuses.remove(id);
        self.webhooks.remove(id);
        self.submitting_days.remove(id);
        if self.webhook_dialog.channel_id.as_deref() == Some(id) {
            self.webhook_dialog.close();
        }
        if self.add_days_dialog.channel_id.as_deref() == Some(id) {
            self.add_days_dialog.close();
        }
        self.channels.len() != before
    }
}
