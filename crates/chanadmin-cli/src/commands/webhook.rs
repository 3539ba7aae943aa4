use chanadmin_client::ChannelApi;
use chanadmin_client::features::channels::dialogs::domain_options;
use chanadmin_client::session::Route;

use crate::cli::{ChannelIdArgs, WebhookDomainsArgs, WebhookSetArgs};
use crate::client::{AppContext, CliResult, api_failure, board_failure};
use crate::output::{render_domain_options, render_toasts, render_webhook};

pub(crate) async fn handle_webhook_get(ctx: &AppContext, args: ChannelIdArgs) -> CliResult<()> {
    ctx.require_session(Route::Channels)?;
    let webhook = ctx
        .api
        .channel_webhook(&args.id)
        .await
        .map_err(|err| api_failure(err, &ctx.bundle))?;
    render_webhook(&webhook, &ctx.bundle, ctx.output)
}

pub(crate) async fn handle_webhook_domains(
    ctx: &AppContext,
    args: WebhookDomainsArgs,
) -> CliResult<()> {
    ctx.require_session(Route::Channels)?;
    let board = ctx.board();
    let options = if let Some(id) = args.id {
        board
            .load_channel(&id)
            .await
            .map_err(|err| board_failure(err, &ctx.bundle))?;
        board.settle().await;
        let options = board
            .open_webhook_dialog(&id)
            .map_err(|err| board_failure(err, &ctx.bundle))?;
        board.close_webhook_dialog();
        options
    } else {
        let config = board
            .load_system_config()
            .await
            .map_err(|err| board_failure(err, &ctx.bundle))?;
        domain_options(&config.webhook_domain, None)
    };
    render_domain_options(&options, &ctx.bundle, ctx.output)
}

pub(crate) async fn handle_webhook_set(ctx: &AppContext, args: WebhookSetArgs) -> CliResult<()> {
    ctx.require_session(Route::Channels)?;
    let board = ctx.board();
    board
        .load_channel(&args.id)
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    // The current address is only known once the status/webhook chain settles.
    board.settle().await;

    board
        .open_webhook_dialog(&args.id)
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    let webhook = board
        .choose_webhook_domain(&args.domain)
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;

    render_webhook(&webhook, &ctx.bundle, ctx.output)?;
    render_toasts(board.drain_toasts(), ctx.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{channel_json, domains_json, signed_in};
    use anyhow::Result;
    use httpmock::prelude::*;
    use serde_json::json;

    fn mock_online_channel(server: &MockServer, current_url: &str) {
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/channels/C1");
            then.status(200)
                .json_body(channel_json("C1", "2999-01-01T00:00:00Z"));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/system/config");
            then.status(200).json_body(domains_json());
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/channels/C1/status");
            then.status(200).json_body(json!({"status": "online"}));
        });
        let current_url = current_url.to_string();
        server.mock(move |when, then| {
            when.method(GET).path("/api/admin/channels/C1/webhook");
            then.status(200)
                .json_body(json!({"channel_id": "C1", "webhook_url": current_url}));
        });
    }

    #[tokio::test]
    async fn set_posts_chosen_domain() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_online_channel(&server, "https://a.example");
        let set = server.mock(|when, then| {
            when.method(POST)
                .path("/api/admin/channels/C1/webhook")
                .json_body(json!({"webhook_url": "https://b.example"}));
            then.status(200)
                .json_body(json!({"channel_id": "C1", "webhook_url": "https://b.example"}));
        });

        let ctx = signed_in(&server)?;
        handle_webhook_set(
            &ctx,
            WebhookSetArgs {
                id: "C1".into(),
                domain: "https://b.example".into(),
            },
        )
        .await?;
        set.assert();
        Ok(())
    }

    #[tokio::test]
    async fn current_domain_is_rejected_locally() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_online_channel(&server, "https://a.example");

        let ctx = signed_in(&server)?;
        let err = handle_webhook_set(
            &ctx,
            WebhookSetArgs {
                id: "C1".into(),
                domain: "https://a.example".into(),
            },
        )
        .await
        .expect_err("current domain");
        assert_eq!(err.exit_code(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_domain_is_rejected() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_online_channel(&server, "");

        let ctx = signed_in(&server)?;
        let err = handle_webhook_set(
            &ctx,
            WebhookSetArgs {
                id: "C1".into(),
                domain: "https://elsewhere.example".into(),
            },
        )
        .await
        .expect_err("unknown domain");
        assert_eq!(err.exit_code(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn domains_for_channel_mark_current() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_online_channel(&server, "https://b.example");

        let ctx = signed_in(&server)?;
        handle_webhook_domains(
            &ctx,
            WebhookDomainsArgs {
                id: Some("C1".into()),
            },
        )
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn get_reads_webhook() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/admin/channels/C1/webhook");
            then.status(200).json_body(json!({"webhook_url": ""}));
        });

        let ctx = signed_in(&server)?;
        handle_webhook_get(&ctx, ChannelIdArgs { id: "C1".into() }).await?;
        mock.assert();
        Ok(())
    }
}
