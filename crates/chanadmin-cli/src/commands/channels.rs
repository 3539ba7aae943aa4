use chanadmin_api_models::UpdateChannelRequest;
use chanadmin_client::features::channels::dialogs::CreateChannelForm;
use chanadmin_client::session::Route;

use crate::cli::{ChannelCreateArgs, ChannelIdArgs, ChannelUpdateArgs};
use crate::client::{AppContext, CliResult, board_failure};
use crate::output::{render_channel, render_channel_rows, render_toasts};

pub(crate) async fn handle_channel_list(ctx: &AppContext) -> CliResult<()> {
    ctx.require_session(Route::Channels)?;
    let board = ctx.board();
    let count = board
        .load()
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    tracing::debug!(count, "waiting for channel lookups");
    board.settle().await;

    render_channel_rows(&board.rows(), &ctx.bundle, ctx.output)?;
    render_toasts(board.drain_toasts(), ctx.output);
    Ok(())
}

pub(crate) async fn handle_channel_show(ctx: &AppContext, args: ChannelIdArgs) -> CliResult<()> {
    ctx.require_session(Route::Channels)?;
    let board = ctx.board();
    let channel = board
        .load_channel(&args.id)
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    board.settle().await;

    let rows = board.rows();
    let row = rows.iter().find(|row| row.id == channel.id);
    render_channel(&channel, row, &ctx.bundle, ctx.output)?;
    render_toasts(board.drain_toasts(), ctx.output);
    Ok(())
}

pub(crate) async fn handle_channel_create(
    ctx: &AppContext,
    args: ChannelCreateArgs,
) -> CliResult<()> {
    ctx.require_session(Route::Channels)?;
    let board = ctx.board();
    board.edit_create(|form| {
        *form = CreateChannelForm {
            name: args.name,
            description: args.description,
        };
    });
    let channel = board
        .submit_create()
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    board.settle().await;

    let rows = board.rows();
    let row = rows.iter().find(|row| row.id == channel.id);
    render_channel(&channel, row, &ctx.bundle, ctx.output)?;
    render_toasts(board.drain_toasts(), ctx.output);
    Ok(())
}

pub(crate) async fn handle_channel_update(
    ctx: &AppContext,
    args: ChannelUpdateArgs,
) -> CliResult<()> {
    ctx.require_session(Route::Channels)?;
    let request = UpdateChannelRequest {
        name: args.name.map(|name| name.trim().to_string()),
        description: args.description.map(|text| text.trim().to_string()),
    };

    let board = ctx.board();
    let channel = board
        .update_channel(&args.id, &request, args.patch)
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    render_channel(&channel, None, &ctx.bundle, ctx.output)?;
    render_toasts(board.drain_toasts(), ctx.output);
    Ok(())
}

pub(crate) async fn handle_channel_delete(ctx: &AppContext, args: ChannelIdArgs) -> CliResult<()> {
    ctx.require_session(Route::Channels)?;
    let board = ctx.board();
    board
        .delete_channel(&args.id)
        .await
        .map_err(|err| board_failure(err, &ctx.bundle))?;
    render_toasts(board.drain_toasts(), ctx.output);
    Ok(())
}
