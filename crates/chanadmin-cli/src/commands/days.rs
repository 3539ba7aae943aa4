use chanadmin_client::features::channels::dialogs::AddDaysForm;
use chanadmin_client::session::Route;

use crate::cli::DaysAddArgs;
use crate::client::{AppContext, CliResult, board_failure};
use crate::output::{render_add_days, render_toasts};

pub(crate) async fn handle_days_add(ctx: &AppContext, args: DaysAddArgs) -> CliResult<()> {
    ctx.require_session(Route::Channels)?;

    let mut form = AddDaysForm::default();
    form.set_days_input(&args.days);
    form.comment = args.comment;
    // Reject bad input before touching the network.
    form.to_request()
        .map_err(|err| board_failure(err.into(), &ctx.bundle))?;

    let board = ctx.board();
    board
        .load_channel(&args.id)
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    board
        .open_add_days(&args.id)
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    board.edit_add_days(|fields| *fields = form);
    let response = board
        .submit_add_days()
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;

    let rows = board.rows();
    let row = rows.iter().find(|row| row.id == args.id);
    render_add_days(&response, row, &ctx.bundle, ctx.output)?;
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

    fn mock_channel(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/channels/C1");
            then.status(200)
                .json_body(channel_json("C1", "2001-01-01T00:00:00Z"));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/system/config");
            then.status(200).json_body(domains_json());
        });
    }

    #[tokio::test]
    async fn blank_comment_is_sent_as_no() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_channel(&server);
        let days = server.mock(|when, then| {
            when.method(POST)
                .path("/api/admin/channels/C1/days")
                .json_body(json!({"days": 7, "comment": "no"}));
            then.status(200).json_body(json!({
                "channel_id": "C1",
                "days": 7,
                "comment": "no",
                "active_till": "2031-02-03T04:05:06Z"
            }));
        });

        let ctx = signed_in(&server)?;
        handle_days_add(
            &ctx,
            DaysAddArgs {
                id: "C1".into(),
                days: "7".into(),
                comment: "   ".into(),
            },
        )
        .await?;
        days.assert();
        Ok(())
    }

    #[tokio::test]
    async fn leading_digits_are_used() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_channel(&server);
        let days = server.mock(|when, then| {
            when.method(POST)
                .path("/api/admin/channels/C1/days")
                .json_body(json!({"days": 30, "comment": "renewal"}));
            then.status(200).json_body(json!({
                "days": 30,
                "comment": "renewal",
                "active_till": "2031-02-03T04:05:06Z"
            }));
        });

        let ctx = signed_in(&server)?;
        handle_days_add(
            &ctx,
            DaysAddArgs {
                id: "C1".into(),
                days: "30d".into(),
                comment: "renewal".into(),
            },
        )
        .await?;
        days.assert();
        Ok(())
    }

    #[tokio::test]
    async fn zero_days_fail_validation_without_requests() -> Result<()> {
        let server = MockServer::start_async().await;
        let ctx = signed_in(&server)?;
        for input in ["0", "-3", "abc"] {
            let err = handle_days_add(
                &ctx,
                DaysAddArgs {
                    id: "C1".into(),
                    days: input.into(),
                    comment: String::new(),
                },
            )
            .await
            .expect_err("invalid days");
            assert_eq!(err.exit_code(), 2);
        }
        Ok(())
    }

    #[tokio::test]
    async fn server_failure_is_reported() -> Result<()> {
        let server = MockServer::start_async().await;
        mock_channel(&server);
        server.mock(|when, then| {
            when.method(POST).path("/api/admin/channels/C1/days");
            then.status(500).body("database unavailable");
        });

        let ctx = signed_in(&server)?;
        let err = handle_days_add(
            &ctx,
            DaysAddArgs {
                id: "C1".into(),
                days: "7".into(),
                comment: String::new(),
            },
        )
        .await
        .expect_err("server failure");
        assert_eq!(err.exit_code(), 3);
        Ok(())
    }
}
