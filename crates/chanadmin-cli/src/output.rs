//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use chanadmin_api_models::{AddDaysResponse, Channel, ChannelWebhook, SystemConfig};
use chanadmin_client::features::channels::dialogs::{DomainOption, domain_options};
use chanadmin_client::features::channels::view::{ChannelRow, StatusCell, WebhookCell};
use chanadmin_client::i18n::TranslationBundle;
use chanadmin_client::toast::{Toast, ToastKind};
use serde::Serialize;
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_channel_rows(
    rows: &[ChannelRow],
    bundle: &TranslationBundle,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let values: Vec<Value> = rows.iter().map(|row| row_json(row, bundle)).collect();
            print_json(&values)?;
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", bundle.text("common.noData"));
                return Ok(());
            }
            println!(
                "{:<6} {:<20} {:<24} {:<10} {:<12} {:<16} WEBHOOK",
                bundle.text("channels.columns.primaryKey"),
                bundle.text("channels.columns.id"),
                bundle.text("channels.columns.name"),
                bundle.text("channels.columns.mode"),
                bundle.text("channels.columns.activeTill"),
                bundle.text("channels.columns.status"),
            );
            for row in rows {
                let mode = if row.premium {
                    bundle.text("channels.premium")
                } else {
                    row.mode.clone()
                };
                let mut status = row.status.label(bundle);
                if row.status.can_retry() {
                    status.push_str(" (!)");
                }
                println!(
                    "{:<6} {:<20} {:<24} {:<10} {:<12} {:<16} {}",
                    row.primary_key_id,
                    row.id,
                    row.name,
                    mode,
                    row.active_till,
                    status,
                    row.webhook.label(bundle)
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_channel(
    channel: &Channel,
    row: Option<&ChannelRow>,
    bundle: &TranslationBundle,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let mut value = to_value(channel)?;
            if let (Some(row), Value::Object(map)) = (row, &mut value) {
                map.insert("status".into(), Value::String(status_key(&row.status)));
                map.insert("webhook_url".into(), webhook_value(&row.webhook));
            }
            print_json(&value)?;
        }
        OutputFormat::Table => {
            println!("{}: {}", bundle.text("channels.columns.id"), channel.id);
            println!("{}: {}", bundle.text("channels.columns.name"), channel.name);
            println!("{}: {}", bundle.text("channels.columns.userId"), channel.user_id);
            println!("{}: {}", bundle.text("channels.columns.mode"), channel.mode);
            if let Some(row) = row {
                println!("{}: {}", bundle.text("channels.columns.phone"), row.phone);
                println!("{}: {}", bundle.text("channels.columns.projectId"), row.project_id);
                println!(
                    "{}: {}",
                    bundle.text("channels.columns.activeTill"),
                    row.active_till
                );
                println!(
                    "{}: {}",
                    bundle.text("channels.columns.status"),
                    row.status.label(bundle)
                );
                println!(
                    "{}: {}",
                    bundle.text("channels.columns.webhook"),
                    row.webhook.label(bundle)
                );
            } else {
                println!(
                    "{}: {}",
                    bundle.text("channels.columns.activeTill"),
                    channel.active_till
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_webhook(
    webhook: &ChannelWebhook,
    bundle: &TranslationBundle,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(webhook)?,
        OutputFormat::Table => {
            if webhook.webhook_url.is_empty() {
                println!("{}", bundle.text("channels.status.noWebhook"));
            } else {
                println!("{}", webhook.webhook_url);
            }
        }
    }
    Ok(())
}

pub(crate) fn render_domain_options(
    options: &[DomainOption],
    bundle: &TranslationBundle,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let values: Vec<Value> = options
                .iter()
                .map(|option| {
                    json!({
                        "domain": option.domain,
                        "weight": option.weight,
                        "current": option.is_current,
                    })
                })
                .collect();
            print_json(&values)?;
        }
        OutputFormat::Table => {
            if options.is_empty() {
                println!("{}", bundle.text("channels.noDomains"));
                return Ok(());
            }
            for option in options {
                let mut tags = Vec::new();
                if option.is_current {
                    tags.push(bundle.text("channels.current"));
                }
                if option.shows_priority() {
                    let weight = option.weight.to_string();
                    tags.push(bundle.format("channels.priority", &[("weight", weight.as_str())]));
                }
                if tags.is_empty() {
                    println!("{}", option.domain);
                } else {
                    println!("{}  [{}]", option.domain, tags.join(", "));
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn render_system_config(
    config: &SystemConfig,
    bundle: &TranslationBundle,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(config),
        OutputFormat::Table => {
            render_domain_options(&domain_options(&config.webhook_domain, None), bundle, format)
        }
    }
}

pub(crate) fn render_add_days(
    response: &AddDaysResponse,
    row: Option<&ChannelRow>,
    bundle: &TranslationBundle,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(response)?,
        OutputFormat::Table => {
            println!("{}: {}", bundle.text("channels.days"), response.days);
            println!("{}: {}", bundle.text("channels.comment"), response.comment);
            let active_till = row.map_or(response.active_till.as_str(), |row| row.active_till.as_str());
            println!("{}: {active_till}", bundle.text("channels.columns.activeTill"));
        }
    }
    Ok(())
}

/// Print queued notifications: successes to stdout, failures to stderr.
pub(crate) fn render_toasts(toasts: Vec<Toast>, format: OutputFormat) {
    for toast in toasts {
        match toast.kind {
            ToastKind::Success if format == OutputFormat::Table => println!("{}", toast.message),
            ToastKind::Success => tracing::info!(message = %toast.message, "notice"),
            ToastKind::Error => eprintln!("warning: {}", toast.message),
        }
    }
}

fn row_json(row: &ChannelRow, bundle: &TranslationBundle) -> Value {
    json!({
        "primary_key_id": row.primary_key_id,
        "user_id": row.user_id,
        "id": row.id,
        "name": row.name,
        "phone": row.phone,
        "token": row.token,
        "project_id": row.project_id,
        "mode": row.mode,
        "premium": row.premium,
        "active_till": row.active_till,
        "status": status_key(&row.status),
        "status_label": row.status.label(bundle),
        "webhook_url": webhook_value(&row.webhook),
        "webhook_error": row.webhook.can_retry(),
    })
}

fn status_key(cell: &StatusCell) -> String {
    match cell {
        StatusCell::Unknown => "unknown".into(),
        StatusCell::Loading => "loading".into(),
        StatusCell::Error => "error".into(),
        StatusCell::Expired => "expired".into(),
        StatusCell::Online => "online".into(),
        StatusCell::WaitingLogin => "waiting_login".into(),
        StatusCell::Other(raw) => raw.clone(),
    }
}

fn webhook_value(cell: &WebhookCell) -> Value {
    match cell {
        WebhookCell::Hidden => Value::Null,
        WebhookCell::Empty => Value::String(String::new()),
        WebhookCell::Url(url) => Value::String(url.clone()),
        WebhookCell::Loading { previous } | WebhookCell::Error { previous } => {
            if previous.is_empty() {
                Value::Null
            } else {
                Value::String(previous.clone())
            }
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> CliResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}
