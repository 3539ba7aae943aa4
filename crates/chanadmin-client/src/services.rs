//! Typed REST operations for the admin API.
//!
//! The view-model depends on the [`ChannelApi`] and [`SystemApi`] traits rather
//! than on [`ApiClient`] directly so it can be driven by scripted fakes.

use async_trait::async_trait;
use chanadmin_api_models::{
    AddDaysRequest, AddDaysResponse, Channel, ChannelStatusResponse, ChannelWebhook,
    CreateChannelRequest, Paginated, SetWebhookRequest, SystemConfig, UpdateChannelRequest,
};

use crate::error::ApiResult;
use crate::http::ApiClient;

const CHANNELS: [&str; 3] = ["api", "admin", "channels"];
const SYSTEM_CONFIG: [&str; 4] = ["api", "admin", "system", "config"];

/// Channel endpoints.
#[async_trait]
pub trait ChannelApi: Send + Sync {
    /// `GET /api/admin/channels`, returning the first page's items.
    async fn list_channels(&self) -> ApiResult<Vec<Channel>>;
    /// `GET /api/admin/channels/{id}`.
    async fn get_channel(&self, id: &str) -> ApiResult<Channel>;
    /// `GET /api/admin/channels/{id}/status`.
    async fn channel_status(&self, id: &str) -> ApiResult<ChannelStatusResponse>;
    /// `GET /api/admin/channels/{id}/webhook`.
    async fn channel_webhook(&self, id: &str) -> ApiResult<ChannelWebhook>;
    /// `POST /api/admin/channels/{id}/webhook`.
    async fn set_channel_webhook(
        &self,
        id: &str,
        request: &SetWebhookRequest,
    ) -> ApiResult<ChannelWebhook>;
    /// `POST /api/admin/channels/{id}/days`.
    async fn add_days(&self, id: &str, request: &AddDaysRequest) -> ApiResult<AddDaysResponse>;
    /// `POST /api/admin/channels`.
    async fn create_channel(&self, request: &CreateChannelRequest) -> ApiResult<Channel>;
    /// `PUT /api/admin/channels/{id}`.
    async fn update_channel(&self, id: &str, request: &UpdateChannelRequest)
    -> ApiResult<Channel>;
    /// `PATCH /api/admin/channels/{id}`.
    async fn patch_channel(&self, id: &str, request: &UpdateChannelRequest) -> ApiResult<Channel>;
    /// `DELETE /api/admin/channels/{id}`.
    async fn delete_channel(&self, id: &str) -> ApiResult<()>;
}

/// System endpoints.
#[async_trait]
pub trait SystemApi: Send + Sync {
    /// `GET /api/admin/system/config`.
    async fn system_config(&self) -> ApiResult<SystemConfig>;
}

/// Everything the channel list needs.
pub trait AdminApi: ChannelApi + SystemApi {}

impl<T: ChannelApi + SystemApi + ?Sized> AdminApi for T {}

fn channel_path<'a>(id: &'a str, tail: Option<&'a str>) -> Vec<&'a str> {
    let mut segments = CHANNELS.to_vec();
    segments.push(id);
    segments.extend(tail);
    segments
}

#[async_trait]
impl ChannelApi for ApiClient {
    async fn list_channels(&self) -> ApiResult<Vec<Channel>> {
        let page: Paginated<Channel> = self.get("channels.list", &CHANNELS).await?;
        Ok(page.data)
    }

    async fn get_channel(&self, id: &str) -> ApiResult<Channel> {
        self.get("channels.get", &channel_path(id, None)).await
    }

    async fn channel_status(&self, id: &str) -> ApiResult<ChannelStatusResponse> {
        self.get("channels.status", &channel_path(id, Some("status")))
            .await
    }

    async fn channel_webhook(&self, id: &str) -> ApiResult<ChannelWebhook> {
        self.get("channels.webhook", &channel_path(id, Some("webhook")))
            .await
    }

    async fn set_channel_webhook(
        &self,
        id: &str,
        request: &SetWebhookRequest,
    ) -> ApiResult<ChannelWebhook> {
        self.post(
            "channels.set_webhook",
            &channel_path(id, Some("webhook")),
            request,
        )
        .await
    }

    async fn add_days(&self, id: &str, request: &AddDaysRequest) -> ApiResult<AddDaysResponse> {
        self.post("channels.add_days", &channel_path(id, Some("days")), request)
            .await
    }

    async fn create_channel(&self, request: &CreateChannelRequest) -> ApiResult<Channel> {
        self.post("channels.create", &CHANNELS, request).await
    }

    async fn update_channel(
        &self,
        id: &str,
        request: &UpdateChannelRequest,
    ) -> ApiResult<Channel> {
        self.put("channels.update", &channel_path(id, None), request)
            .await
    }

    async fn patch_channel(&self, id: &str, request: &UpdateChannelRequest) -> ApiResult<Channel> {
        self.patch("channels.patch", &channel_path(id, None), request)
            .await
    }

    async fn delete_channel(&self, id: &str) -> ApiResult<()> {
        self.delete("channels.delete", &channel_path(id, None)).await
    }
}

#[async_trait]
impl SystemApi for ApiClient {
    async fn system_config(&self) -> ApiResult<SystemConfig> {
        self.get("system.config", &SYSTEM_CONFIG).await
    }
}
