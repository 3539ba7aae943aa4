//! Argument parsing and command dispatch.

use std::path::PathBuf;

use chanadmin_client::config::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use chanadmin_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, command_span, init_logging};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{AppContext, CliDependencies, CliResult};
use crate::commands::channels::{
    handle_channel_create, handle_channel_delete, handle_channel_list, handle_channel_show,
    handle_channel_update,
};
use crate::commands::days::handle_days_add;
use crate::commands::session::{handle_login, handle_logout, handle_whoami};
use crate::commands::system::handle_system_config;
use crate::commands::webhook::{handle_webhook_domains, handle_webhook_get, handle_webhook_set};

/// Parses CLI arguments, executes the requested command inside a traced span,
/// and returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format,
        build_sha: option_env!("CHANADMIN_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging unavailable: {err}");
    }

    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();
    let span = command_span(command_name, &trace_id);

    let result = async {
        let deps = CliDependencies::from_cli(&cli, &trace_id)?;
        dispatch(cli, deps).await
    }
    .instrument(span)
    .await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            let exit_code = err.exit_code();
            tracing::debug!(exit_code, trace_id = %trace_id, "command failed");
            eprintln!("error: {}", err.display_message());
            exit_code
        }
    }
}

async fn dispatch(cli: Cli, deps: CliDependencies) -> CliResult<()> {
    let ctx = AppContext::new(deps, cli.output);

    match cli.command {
        Command::Login(args) => handle_login(&ctx, args).await,
        Command::Logout => handle_logout(&ctx),
        Command::Whoami => handle_whoami(&ctx),
        Command::Channels(channels) => match channels {
            ChannelsCommand::Ls => handle_channel_list(&ctx).await,
            ChannelsCommand::Show(args) => handle_channel_show(&ctx, args).await,
            ChannelsCommand::Create(args) => handle_channel_create(&ctx, args).await,
            ChannelsCommand::Update(args) => handle_channel_update(&ctx, args).await,
            ChannelsCommand::Delete(args) => handle_channel_delete(&ctx, args).await,
        },
        Command::Webhook(webhook) => match webhook {
            WebhookCommand::Get(args) => handle_webhook_get(&ctx, args).await,
            WebhookCommand::Domains(args) => handle_webhook_domains(&ctx, args).await,
            WebhookCommand::Set(args) => handle_webhook_set(&ctx, args).await,
        },
        Command::Days(days) => match days {
            DaysCommand::Add(args) => handle_days_add(&ctx, args).await,
        },
        Command::System(system) => match system {
            SystemCommand::Config => handle_system_config(&ctx).await,
        },
    }
}

#[derive(Parser)]
#[command(name = "chanadmin", about = "Administrative CLI for messaging channels")]
pub(crate) struct Cli {
    #[arg(long, global = true, env = "CHANADMIN_API_URL", default_value = DEFAULT_API_URL)]
    pub(crate) api_url: String,
    #[arg(
        long,
        global = true,
        env = "CHANADMIN_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "CHANADMIN_TOKEN_FILE",
        help = "Where the bearer token is persisted (defaults to the user config dir)"
    )]
    pub(crate) token_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "CHANADMIN_LANG",
        help = "Interface language (en, zh); falls back to LANG"
    )]
    pub(crate) lang: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, env = "CHANADMIN_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "CHANADMIN_LOG_FORMAT",
        value_parser = parse_log_format,
        default_value = "compact"
    )]
    pub(crate) log_format: LogFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Store a bearer token for subsequent commands.
    Login(LoginArgs),
    /// Forget the stored token.
    Logout,
    /// Show whether a token is stored.
    Whoami,
    #[command(subcommand)]
    Channels(ChannelsCommand),
    #[command(subcommand)]
    Webhook(WebhookCommand),
    #[command(subcommand)]
    Days(DaysCommand),
    #[command(subcommand)]
    System(SystemCommand),
}

#[derive(Subcommand)]
pub(crate) enum ChannelsCommand {
    /// List channels with their live status and webhook.
    Ls,
    Show(ChannelIdArgs),
    Create(ChannelCreateArgs),
    Update(ChannelUpdateArgs),
    Delete(ChannelIdArgs),
}

#[derive(Subcommand)]
pub(crate) enum WebhookCommand {
    Get(ChannelIdArgs),
    /// List configured webhook domains, marking the channel's current one.
    Domains(WebhookDomainsArgs),
    Set(WebhookSetArgs),
}

#[derive(Subcommand)]
pub(crate) enum DaysCommand {
    /// Extend a channel's subscription.
    Add(DaysAddArgs),
}

#[derive(Subcommand)]
pub(crate) enum SystemCommand {
    Config,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LoginArgs {
    #[arg(long, env = "CHANADMIN_TOKEN", hide_env_values = true)]
    pub(crate) token: String,
    #[arg(long, help = "Store the token without probing the API")]
    pub(crate) skip_verify: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ChannelIdArgs {
    pub(crate) id: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ChannelCreateArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long, default_value = "")]
    pub(crate) description: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ChannelUpdateArgs {
    pub(crate) id: String,
    #[arg(long)]
    pub(crate) name: Option<String>,
    #[arg(long)]
    pub(crate) description: Option<String>,
    #[arg(long, help = "Send a partial update (PATCH) instead of a replacement (PUT)")]
    pub(crate) patch: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct WebhookDomainsArgs {
    pub(crate) id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct WebhookSetArgs {
    pub(crate) id: String,
    pub(crate) domain: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct DaysAddArgs {
    pub(crate) id: String,
    #[arg(long, default_value = "7", allow_hyphen_values = true)]
    pub(crate) days: String,
    #[arg(long, default_value = "")]
    pub(crate) comment: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse::<LogFormat>().map_err(|err| err.to_string())
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Logout => "logout",
        Command::Whoami => "whoami",
        Command::Channels(ChannelsCommand::Ls) => "channels_ls",
        Command::Channels(ChannelsCommand::Show(_)) => "channels_show",
        Command::Channels(ChannelsCommand::Create(_)) => "channels_create",
        Command::Channels(ChannelsCommand::Update(_)) => "channels_update",
        Command::Channels(ChannelsCommand::Delete(_)) => "channels_delete",
        Command::Webhook(WebhookCommand::Get(_)) => "webhook_get",
        Command::Webhook(WebhookCommand::Domains(_)) => "webhook_domains",
        Command::Webhook(WebhookCommand::Set(_)) => "webhook_set",
        Command::Days(DaysCommand::Add(_)) => "days_add",
        Command::System(SystemCommand::Config) => "system_config",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let cli = Cli::try_parse_from(["chanadmin", "channels", "ls"]).expect("parse");
        assert_eq!(cli.output, OutputFormat::Table);
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(command_label(&cli.command), "channels_ls");
    }

    #[test]
    fn days_add_keeps_raw_input() {
        let cli = Cli::try_parse_from([
            "chanadmin", "days", "add", "C1", "--days", "-2", "--output", "json",
        ])
        .expect("parse");
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Command::Days(DaysCommand::Add(args)) => {
                assert_eq!(args.id, "C1");
                assert_eq!(args.days, "-2");
                assert!(args.comment.is_empty());
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let parsed = Cli::try_parse_from(["chanadmin", "--log-format", "xml", "whoami"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn update_accepts_patch_flag() {
        let cli = Cli::try_parse_from([
            "chanadmin", "channels", "update", "C1", "--name", "ops", "--patch",
        ])
        .expect("parse");
        assert_eq!(command_label(&cli.command), "channels_update");
        match cli.command {
            Command::Channels(ChannelsCommand::Update(args)) => {
                assert!(args.patch);
                assert_eq!(args.name.as_deref(), Some("ops"));
                assert!(args.description.is_none());
            }
            _ => panic!("unexpected command"),
        }
    }
}
