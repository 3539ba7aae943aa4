use chanadmin_client::session::Route;

use crate::client::{AppContext, CliResult, board_failure};
use crate::output::render_system_config;

pub(crate) async fn handle_system_config(ctx: &AppContext) -> CliResult<()> {
    ctx.require_session(Route::SystemConfig)?;
    let config = ctx
        .board()
        .load_system_config()
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    render_system_config(&config, &ctx.bundle, ctx.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::signed_in;
    use anyhow::Result;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn null_domain_list_renders_empty() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/admin/system/config");
            then.status(200).json_body(json!({"webhook_domain": null}));
        });

        let ctx = signed_in(&server)?;
        handle_system_config(&ctx).await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn forbidden_is_a_failure() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/system/config");
            then.status(403).json_body(json!({"message": "admins only"}));
        });

        let ctx = signed_in(&server)?;
        let err = handle_system_config(&ctx).await.expect_err("forbidden");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("admins only"));
        Ok(())
    }
}
