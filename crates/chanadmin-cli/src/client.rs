//! Shared client wiring, error types, and error mapping for the CLI.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use chanadmin_client::config::ConfigError;
use chanadmin_client::features::channels::dialogs::FormError;
use chanadmin_client::i18n::{LocaleCode, TranslationBundle};
use chanadmin_client::session::{FileTokenStore, Route, RouteDecision, SessionError, guard};
use chanadmin_client::{ApiClient, ApiError, BoardError, ChannelBoard, ClientConfig, SessionContext};

use crate::cli::{Cli, OutputFormat};

/// CLI-level error type to distinguish validation, sign-in, and operational
/// failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    SignInRequired(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::SignInRequired(_) => 4,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::SignInRequired(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Dependencies constructed from environment flags and CLI options.
#[derive(Clone, Debug)]
pub(crate) struct CliDependencies {
    pub(crate) api: ApiClient,
    pub(crate) session: SessionContext,
    pub(crate) bundle: TranslationBundle,
}

impl CliDependencies {
    /// Resolve settings, load the persisted session, and build the HTTP client.
    pub(crate) fn from_cli(cli: &Cli, trace_id: &str) -> CliResult<Self> {
        let locale = resolve_locale(cli.lang.as_deref(), std::env::var("LANG").ok().as_deref());
        let bundle = TranslationBundle::new(locale);
        let token_path = cli.token_file.clone().or_else(FileTokenStore::default_path);
        let config = ClientConfig::new(&cli.api_url, cli.timeout, token_path, locale)
            .map_err(|err| match err {
                err @ ConfigError::ZeroTimeout => CliError::validation(err.to_string()),
                other => CliError::validation(format!("{other}: {}", cli.api_url)),
            })?;

        let session = match &config.token_path {
            Some(path) => SessionContext::new(FileTokenStore::new(path.clone()))
                .map_err(|err| session_failure(err, &bundle))?,
            None => {
                tracing::warn!("no config directory available; token kept in memory");
                SessionContext::in_memory()
            }
        };
        let api = ApiClient::new(&config, session.clone(), trace_id).map_err(CliError::failure)?;

        Ok(Self {
            api,
            session,
            bundle,
        })
    }
}

/// Application context passed to command handlers.
#[derive(Clone, Debug)]
pub(crate) struct AppContext {
    pub(crate) api: ApiClient,
    pub(crate) session: SessionContext,
    pub(crate) bundle: TranslationBundle,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    pub(crate) fn new(deps: CliDependencies, output: OutputFormat) -> Self {
        Self {
            api: deps.api,
            session: deps.session,
            bundle: deps.bundle,
            output,
        }
    }

    /// Fresh view-model bound to this context's API client.
    pub(crate) fn board(&self) -> ChannelBoard {
        ChannelBoard::new(Arc::new(self.api.clone()), self.bundle.clone())
    }

    /// Refuse commands for protected routes when no token is stored.
    pub(crate) fn require_session(&self, route: Route) -> CliResult<()> {
        match guard(route, &self.session) {
            RouteDecision::Redirect(Route::SignIn) => Err(CliError::SignInRequired(format!(
                "{} (chanadmin login --token <TOKEN>)",
                self.bundle.text("auth.signInRequired")
            ))),
            _ => Ok(()),
        }
    }
}

/// Pick the interface language from `--lang`, then `LANG`, then English.
pub(crate) fn resolve_locale(flag: Option<&str>, env_lang: Option<&str>) -> LocaleCode {
    flag.and_then(LocaleCode::from_lang_tag)
        .or_else(|| env_lang.and_then(LocaleCode::from_lang_tag))
        .unwrap_or_default()
}

/// Map a view-model failure onto the CLI exit-code contract.
pub(crate) fn board_failure(error: BoardError, bundle: &TranslationBundle) -> CliError {
    match error {
        BoardError::Api(api) => api_failure(api, bundle),
        BoardError::Form(form) => CliError::validation(form_message(&form, bundle)),
        BoardError::UnknownChannel { id } => {
            CliError::validation(format!("{}: {id}", bundle.text("errors.notFound")))
        }
        BoardError::NoDomains => CliError::validation(bundle.text("channels.noDomains")),
        other @ BoardError::Busy { .. } => CliError::failure(other),
    }
}

/// Map an API failure onto the CLI exit-code contract.
pub(crate) fn api_failure(error: ApiError, bundle: &TranslationBundle) -> CliError {
    match error {
        ApiError::Unauthorized { .. } => {
            CliError::SignInRequired(bundle.text("auth.signInRequired"))
        }
        ApiError::Status {
            status: 400 | 409 | 422,
            message,
            ..
        } => CliError::validation(message),
        ApiError::Status {
            status: 403,
            message,
            ..
        } => CliError::failure(anyhow!("{}: {message}", bundle.text("errors.forbidden"))),
        ApiError::Status {
            status: 404,
            message,
            ..
        } => CliError::failure(anyhow!("{}: {message}", bundle.text("errors.notFound"))),
        other => CliError::failure(other),
    }
}

/// Map a session store failure onto the CLI exit-code contract.
pub(crate) fn session_failure(error: SessionError, bundle: &TranslationBundle) -> CliError {
    match error {
        SessionError::EmptyToken => CliError::validation(bundle.text("auth.tokenRequired")),
        other => CliError::failure(other),
    }
}

fn form_message(error: &FormError, bundle: &TranslationBundle) -> String {
    match error {
        FormError::InvalidDays { .. } => bundle.text("errors.invalidDays"),
        FormError::DomainIsCurrent { domain } => {
            format!("{}: {domain}", bundle.text("errors.currentDomain"))
        }
        FormError::UnknownDomain { domain } => format!("{error}: {domain}"),
        FormError::NoChannel | FormError::NothingToUpdate => error.to_string(),
    }
}
