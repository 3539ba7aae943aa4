//! Async view-model for the channel list.
//!
//! # Design
//! - State lives in one [`ChannelsState`] behind a mutex; the lock is never held
//!   across an await.
//! - Status and webhook lookups run as one tokio task per channel id. Starting a
//!   new lookup for an id aborts the previous one. Deleting a channel aborts its
//!   lookups; a successful reload aborts all of them, a failed one none.
//! - Automatic lookups are skipped for entries that are settled or in flight;
//!   explicit retries always issue a request.
//! - Mutations report through the returned `Result` and through the toast queue.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chanadmin_api_models::{
    AddDaysResponse, Channel, ChannelWebhook, CreateChannelRequest, SetWebhookRequest,
    SystemConfig, UpdateChannelRequest,
};
use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::dialogs::{
    AddDaysForm, CreateChannelForm, DomainOption, FormError, domain_options,
    validate_domain_choice,
};
use super::state::{ChannelStatus, ChannelsState};
use super::view::{self, ChannelRow};
use crate::error::ApiError;
use crate::i18n::TranslationBundle;
use crate::services::AdminApi;
use crate::toast::Toast;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Failures reported by board actions.
#[derive(Debug, Error)]
pub enum BoardError {
    /// The API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Input was rejected before any request was made.
    #[error(transparent)]
    Form(#[from] FormError),
    /// The channel is not on the board.
    #[error("unknown channel")]
    UnknownChannel {
        /// Requested id.
        id: String,
    },
    /// An add-days request for the channel is already in flight.
    #[error("add days already in progress")]
    Busy {
        /// Channel id.
        id: String,
    },
    /// No webhook domains are configured.
    #[error("no webhook domains configured")]
    NoDomains,
}

impl BoardError {
    /// Whether the user must sign in again.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_unauthorized())
    }
}

/// Per-key task registry with single-flight replacement.
#[derive(Default)]
struct TaskSet {
    handles: Mutex<HashMap<String, (u64, AbortHandle)>>,
    generation: AtomicU64,
    idle: Notify,
}

impl TaskSet {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, (u64, AbortHandle)>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn<F>(self: &Arc<Self>, key: &str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Registered under the lock so `finish` cannot run before the insert.
        let mut handles = self.lock();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let tasks = Arc::clone(self);
        let owned_key = key.to_string();
        let handle = tokio::spawn(async move {
            task.await;
            tasks.finish(&owned_key, generation);
        });
        if let Some((_, previous)) =
            handles.insert(key.to_string(), (generation, handle.abort_handle()))
        {
            previous.abort();
        }
    }

    fn finish(&self, key: &str, generation: u64) {
        {
            let mut handles = self.lock();
            if handles
                .get(key)
                .is_some_and(|(current, _)| *current == generation)
            {
                handles.remove(key);
            }
        }
        self.idle.notify_waiters();
    }

    fn abort(&self, key: &str) {
        let removed = self.lock().remove(key);
        if let Some((_, handle)) = removed {
            handle.abort();
            self.idle.notify_waiters();
        }
    }

    fn abort_all(&self) {
        let drained: Vec<_> = self.lock().drain().collect();
        for (_, (_, handle)) in drained {
            handle.abort();
        }
        self.idle.notify_waiters();
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    async fn settle(&self) {
        loop {
            let notified = self.idle.notified();
            let idle = self.lock().is_empty();
            if idle {
                return;
            }
            notified.await;
        }
    }
}

struct BoardInner {
    api: Arc<dyn AdminApi>,
    clock: Arc<dyn Clock>,
    bundle: TranslationBundle,
    state: Mutex<ChannelsState>,
    status_tasks: Arc<TaskSet>,
    webhook_tasks: Arc<TaskSet>,
}

/// Shared handle to the channel list view-model.
#[derive(Clone)]
pub struct ChannelBoard {
    inner: Arc<BoardInner>,
}

impl std::fmt::Debug for ChannelBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelBoard")
            .field("locale", &self.inner.bundle.locale())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl ChannelBoard {
    /// Board backed by `api`, using the wall clock.
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, bundle: TranslationBundle) -> Self {
        Self::with_clock(api, bundle, Arc::new(SystemClock))
    }

    /// Board with an injected clock.
    #[must_use]
    pub fn with_clock(
        api: Arc<dyn AdminApi>,
        bundle: TranslationBundle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(BoardInner {
                api,
                clock,
                bundle,
                state: Mutex::new(ChannelsState::default()),
                status_tasks: Arc::new(TaskSet::default()),
                webhook_tasks: Arc::new(TaskSet::default()),
            }),
        }
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ChannelsState {
        self.state().clone()
    }

    /// Rendered table rows.
    #[must_use]
    pub fn rows(&self) -> Vec<ChannelRow> {
        view::rows(&self.state(), &Local)
    }

    /// Take pending toasts.
    #[must_use]
    pub fn drain_toasts(&self) -> Vec<Toast> {
        self.state().toasts.drain()
    }

    /// Dictionary used for toasts and labels.
    #[must_use]
    pub fn bundle(&self) -> &TranslationBundle {
        &self.inner.bundle
    }

    /// Number of status and webhook lookups still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.status_tasks.len() + self.inner.webhook_tasks.len()
    }

    /// Wait until no lookup is running, including webhook lookups chained
    /// from status replies.
    pub async fn settle(&self) {
        loop {
            self.inner.status_tasks.settle().await;
            self.inner.webhook_tasks.settle().await;
            if self.in_flight() == 0 {
                return;
            }
        }
    }

    /// Load the channel list and system configuration from scratch, then start
    /// a status lookup for every channel that has not expired.
    ///
    /// Returns the number of channels loaded.
    ///
    /// # Errors
    ///
    /// Returns the list failure; a configuration failure only raises a toast.
    pub async fn load(&self) -> Result<usize, BoardError> {
        {
            let mut state = self.state();
            state.list_loading = true;
            state.config_loading = true;
        }
        debug!("loading channels and system configuration");
        let (channels, config) = tokio::join!(
            self.inner.api.list_channels(),
            self.inner.api.system_config()
        );
        if let Err(err) = self.apply_config(config) {
            debug!(error = %err, "continuing without webhook domains");
        }

        let channels = match channels {
            Ok(channels) => channels,
            Err(err) => {
                warn!(error = %err, "failed to load channels");
                let message = self.failure_text(&err, "toast.channelsFailed");
                let mut state = self.state();
                state.list_loading = false;
                state.toasts.error(message);
                return Err(err.into());
            }
        };
        self.inner.status_tasks.abort_all();
        self.inner.webhook_tasks.abort_all();
        let now = self.inner.clock.now();
        let (count, pending) = {
            let mut state = self.state();
            state.list_loading = false;
            let pending = state.replace_channels(channels, &now);
            (state.channels.len(), pending)
        };
        info!(count, pending = pending.len(), "channels loaded");
        for id in pending {
            self.spawn_status(id);
        }
        Ok(count)
    }

    /// Load a single channel (plus the system configuration) as the board's
    /// only entry and start its status lookup.
    ///
    /// # Errors
    ///
    /// Returns the channel lookup failure.
    pub async fn load_channel(&self, id: &str) -> Result<Channel, BoardError> {
        self.state().config_loading = true;
        let (channel, config) = tokio::join!(
            self.inner.api.get_channel(id),
            self.inner.api.system_config()
        );
        if let Err(err) = self.apply_config(config) {
            debug!(error = %err, "continuing without webhook domains");
        }
        let channel = channel.map_err(|err| {
            warn!(channel_id = id, error = %err, "failed to load channel");
            let message = self.failure_text(&err, "errors.somethingWentWrong");
            self.state().toasts.error(message);
            BoardError::from(err)
        })?;
        self.inner.status_tasks.abort_all();
        self.inner.webhook_tasks.abort_all();
        let now = self.inner.clock.now();
        let pending = self.state().replace_channels(vec![channel.clone()], &now);
        for id in pending {
            self.spawn_status(id);
        }
        Ok(channel)
    }

    /// Reload the webhook domains.
    ///
    /// # Errors
    ///
    /// Returns the API failure after raising a toast.
    pub async fn load_system_config(&self) -> Result<SystemConfig, BoardError> {
        self.state().config_loading = true;
        let config = self.inner.api.system_config().await;
        self.apply_config(config)
    }

    fn apply_config(
        &self,
        config: Result<SystemConfig, ApiError>,
    ) -> Result<SystemConfig, BoardError> {
        let mut state = self.state();
        state.config_loading = false;
        match config {
            Ok(config) => {
                debug!(domains = config.webhook_domain.len(), "system configuration loaded");
                state.domains.clone_from(&config.webhook_domain);
                Ok(config)
            }
            Err(err) => {
                warn!(error = %err, "failed to load system configuration");
                let message = self.failure_text(&err, "toast.configFailed");
                state.toasts.error(message);
                Err(err.into())
            }
        }
    }

    /// Start an automatic status lookup unless the entry is settled, in
    /// flight, or the channel has expired. Returns whether a request was issued.
    pub fn refresh_status(&self, id: &str) -> bool {
        let now = self.inner.clock.now();
        let start = self.state().begin_status(id, &now);
        if start {
            self.spawn_status(id.to_string());
        }
        start
    }

    /// Re-issue a status lookup regardless of the cached entry, cancelling any
    /// lookup already running for the channel.
    pub fn retry_status(&self, id: &str) -> bool {
        let start = self.state().force_status(id);
        if start {
            self.spawn_status(id.to_string());
        }
        start
    }

    /// Start an automatic webhook lookup unless the entry is settled or in flight.
    pub fn refresh_webhook(&self, id: &str) -> bool {
        let start = self.state().begin_webhook(id);
        if start {
            self.spawn_webhook(id.to_string());
        }
        start
    }

    /// Re-issue a webhook lookup regardless of the cached entry.
    pub fn retry_webhook(&self, id: &str) -> bool {
        let start = self.state().force_webhook(id);
        if start {
            self.spawn_webhook(id.to_string());
        }
        start
    }

    fn spawn_status(&self, id: String) {
        let board = self.clone();
        let key = id.clone();
        self.inner
            .status_tasks
            .spawn(&key, async move { board.run_status(&id).await });
    }

    fn spawn_webhook(&self, id: String) {
        let board = self.clone();
        let key = id.clone();
        self.inner
            .webhook_tasks
            .spawn(&key, async move { board.run_webhook(&id).await });
    }

    async fn run_status(&self, id: &str) {
        debug!(channel_id = id, "fetching channel status");
        let result = self.inner.api.channel_status(id).await;
        let connected = {
            let mut state = self.state();
            match result {
                Ok(reply) => {
                    let status = ChannelStatus::from_wire(&reply.status);
                    let connected = status.is_connected();
                    state.resolve_status(id, status);
                    connected && state.channel(id).is_some()
                }
                Err(err) => {
                    warn!(channel_id = id, error = %err, "channel status lookup failed");
                    state.fail_status(id);
                    false
                }
            }
        };
        if connected {
            self.refresh_webhook(id);
        }
    }

    async fn run_webhook(&self, id: &str) {
        debug!(channel_id = id, "fetching channel webhook");
        let result = self.inner.api.channel_webhook(id).await;
        let mut state = self.state();
        match result {
            Ok(reply) => state.resolve_webhook(id, reply.webhook_url),
            Err(err) => {
                warn!(channel_id = id, error = %err, "channel webhook lookup failed");
                state.fail_webhook(id);
            }
        }
    }

    /// Open the set-webhook dialog and return the picker rows.
    ///
    /// # Errors
    ///
    /// Fails for unknown channels or when no domains are configured.
    pub fn open_webhook_dialog(&self, id: &str) -> Result<Vec<DomainOption>, BoardError> {
        let mut state = self.state();
        if state.channel(id).is_none() {
            return Err(BoardError::UnknownChannel { id: id.to_string() });
        }
        if state.domains.is_empty() {
            return Err(BoardError::NoDomains);
        }
        state.webhook_dialog.open_for(id);
        Ok(domain_options(&state.domains, state.webhook_url(id)))
    }

    /// Close the set-webhook dialog without submitting.
    pub fn close_webhook_dialog(&self) {
        self.state().webhook_dialog.close();
    }

    /// Submit a picker choice for the channel targeted by the open dialog.
    ///
    /// The current domain and unconfigured domains are rejected without a
    /// request, leaving the dialog open.
    ///
    /// # Errors
    ///
    /// Returns the validation or API failure.
    pub async fn choose_webhook_domain(&self, domain: &str) -> Result<ChannelWebhook, BoardError> {
        let id = {
            let state = self.state();
            let id = state
                .webhook_dialog
                .channel_id
                .clone()
                .ok_or(FormError::NoChannel)?;
            validate_domain_choice(domain, &state.domains, state.webhook_url(&id))?;
            id
        };
        self.set_webhook(&id, domain).await
    }

    /// Point the channel's webhook at `domain`.
    ///
    /// Closes the dialog first. While the request runs the previous URL stays
    /// visible; on failure it is kept and the entry is flagged.
    ///
    /// # Errors
    ///
    /// Returns the validation or API failure.
    pub async fn set_webhook(&self, id: &str, domain: &str) -> Result<ChannelWebhook, BoardError> {
        {
            let mut state = self.state();
            state.webhook_dialog.close();
            if id.is_empty() {
                return Err(FormError::NoChannel.into());
            }
            if domain.is_empty() {
                return Err(FormError::UnknownDomain {
                    domain: String::new(),
                }
                .into());
            }
            if state.channel(id).is_none() {
                return Err(BoardError::UnknownChannel { id: id.to_string() });
            }
            self.inner.webhook_tasks.abort(id);
            state.begin_set_webhook(id);
        }
        info!(channel_id = id, domain, "setting channel webhook");
        let request = SetWebhookRequest {
            webhook_url: domain.to_string(),
        };
        let result = self.inner.api.set_channel_webhook(id, &request).await;
        let mut state = self.state();
        match result {
            Ok(reply) => {
                state.resolve_webhook(id, reply.webhook_url.clone());
                let message = self.inner.bundle.format("toast.webhookSet", &[("channel", id)]);
                state.toasts.success(message);
                Ok(reply)
            }
            Err(err) => {
                warn!(channel_id = id, error = %err, "failed to set channel webhook");
                state.fail_set_webhook(id);
                let message = if err.is_unauthorized() {
                    self.inner.bundle.text("auth.signInRequired")
                } else {
                    self.inner
                        .bundle
                        .format("toast.webhookFailed", &[("channel", id)])
                };
                state.toasts.error(message);
                Err(err.into())
            }
        }
    }

    /// Open the add-days dialog with a fresh form.
    ///
    /// # Errors
    ///
    /// Fails for unknown channels.
    pub fn open_add_days(&self, id: &str) -> Result<(), BoardError> {
        let mut state = self.state();
        if state.channel(id).is_none() {
            return Err(BoardError::UnknownChannel { id: id.to_string() });
        }
        state.add_days_dialog.open_for(id);
        Ok(())
    }

    /// Edit the add-days form in place.
    pub fn edit_add_days(&self, edit: impl FnOnce(&mut AddDaysForm)) {
        edit(&mut self.state().add_days_dialog.form);
    }

    /// Close the add-days dialog and reset its form.
    pub fn close_add_days(&self) {
        self.state().add_days_dialog.close();
    }

    /// Submit the add-days dialog.
    ///
    /// # Errors
    ///
    /// Returns the validation or API failure.
    pub async fn submit_add_days(&self) -> Result<AddDaysResponse, BoardError> {
        let (id, form) = {
            let state = self.state();
            let id = state
                .add_days_dialog
                .channel_id
                .clone()
                .ok_or(FormError::NoChannel)?;
            (id, state.add_days_dialog.form.clone())
        };
        self.add_days(&id, &form).await
    }

    /// Extend a channel's subscription.
    ///
    /// Days below one are rejected without a request and a blank comment is
    /// sent as `"no"`. On success the channel's expiry is replaced by the
    /// server's value and the dialog closes with a reset form.
    ///
    /// # Errors
    ///
    /// Returns the validation or API failure, or [`BoardError::Busy`] while a
    /// previous request for the channel is running.
    pub async fn add_days(&self, id: &str, form: &AddDaysForm) -> Result<AddDaysResponse, BoardError> {
        let request = form.to_request()?;
        {
            let mut state = self.state();
            if state.channel(id).is_none() {
                return Err(BoardError::UnknownChannel { id: id.to_string() });
            }
            if !state.submitting_days.insert(id.to_string()) {
                return Err(BoardError::Busy { id: id.to_string() });
            }
        }
        info!(channel_id = id, days = request.days, "adding subscription days");
        let result = self.inner.api.add_days(id, &request).await;
        let mut state = self.state();
        state.submitting_days.remove(id);
        match result {
            Ok(reply) => {
                state.update_active_till(id, &reply.active_till);
                state.add_days_dialog.close();
                let days = request.days.to_string();
                let message = self
                    .inner
                    .bundle
                    .format("toast.daysAdded", &[("days", days.as_str()), ("channel", id)]);
                state.toasts.success(message);
                Ok(reply)
            }
            Err(err) => {
                warn!(channel_id = id, error = %err, "failed to add subscription days");
                let message = if err.is_unauthorized() {
                    self.inner.bundle.text("auth.signInRequired")
                } else {
                    self.inner
                        .bundle
                        .format("toast.daysFailed", &[("channel", id)])
                };
                state.toasts.error(message);
                Err(err.into())
            }
        }
    }

    /// Edit the create-channel form in place.
    pub fn edit_create(&self, edit: impl FnOnce(&mut CreateChannelForm)) {
        edit(&mut self.state().create_form);
    }

    /// Submit the create-channel form.
    ///
    /// # Errors
    ///
    /// Returns the API failure.
    pub async fn submit_create(&self) -> Result<Channel, BoardError> {
        let request = self.state().create_form.to_request();
        self.create_channel(&request).await
    }

    /// Create a channel and append it to the list.
    ///
    /// # Errors
    ///
    /// Returns the API failure after raising a toast.
    pub async fn create_channel(&self, request: &CreateChannelRequest) -> Result<Channel, BoardError> {
        info!(name = %request.name, "creating channel");
        match self.inner.api.create_channel(request).await {
            Ok(channel) => {
                {
                    let mut state = self.state();
                    state.append_channel(channel.clone());
                    state.create_form.reset();
                    let message = self.inner.bundle.text("channels.channelCreated");
                    state.toasts.success(message);
                }
                self.refresh_status(&channel.id);
                Ok(channel)
            }
            Err(err) => Err(self.report_failure(err, "failed to create channel")),
        }
    }

    /// Replace (`PUT`) or patch (`PATCH`) a channel's editable fields.
    ///
    /// # Errors
    ///
    /// Rejects empty updates; otherwise returns the API failure.
    pub async fn update_channel(
        &self,
        id: &str,
        request: &UpdateChannelRequest,
        partial: bool,
    ) -> Result<Channel, BoardError> {
        if request.is_empty() {
            return Err(FormError::NothingToUpdate.into());
        }
        info!(channel_id = id, partial, "updating channel");
        let result = if partial {
            self.inner.api.patch_channel(id, request).await
        } else {
            self.inner.api.update_channel(id, request).await
        };
        match result {
            Ok(channel) => {
                let mut state = self.state();
                state.replace_channel(channel.clone());
                let message = self.inner.bundle.text("channels.channelUpdated");
                state.toasts.success(message);
                Ok(channel)
            }
            Err(err) => Err(self.report_failure(err, "failed to update channel")),
        }
    }

    /// Delete a channel, dropping its cached state and cancelling its lookups.
    ///
    /// # Errors
    ///
    /// Returns the API failure after raising a toast.
    pub async fn delete_channel(&self, id: &str) -> Result<(), BoardError> {
        info!(channel_id = id, "deleting channel");
        match self.inner.api.delete_channel(id).await {
            Ok(()) => {
                self.inner.status_tasks.abort(id);
                self.inner.webhook_tasks.abort(id);
                let mut state = self.state();
                state.remove_channel(id);
                let message = self.inner.bundle.text("channels.channelDeleted");
                state.toasts.success(message);
                Ok(())
            }
            Err(err) => Err(self.report_failure(err, "failed to delete channel")),
        }
    }

    fn report_failure(&self, err: ApiError, context: &'static str) -> BoardError {
        warn!(error = %err, "{context}");
        let message = self.failure_text(&err, "errors.somethingWentWrong");
        self.state().toasts.error(message);
        err.into()
    }

    fn failure_text(&self, err: &ApiError, key: &str) -> String {
        if err.is_unauthorized() {
            self.inner.bundle.text("auth.signInRequired")
        } else {
            self.inner.bundle.text(key)
        }
    }

    fn state(&self) -> MutexGuard<'_, ChannelsState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
