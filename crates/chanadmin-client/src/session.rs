//! Bearer token ownership, persistence and route gating.
//!
//! A single [`SessionContext`] is shared by the HTTP layer and the front end.
//! It owns the token, writes it through a [`TokenStore`], and publishes the
//! latest [`SessionEvent`] on a watch channel so a shell can react to a forced
//! sign-out (HTTP 401) without polling.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Errors raised by token persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the token file failed.
    #[error("token file io failure")]
    Io {
        /// Operation that failed.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The token file exists but is not valid JSON.
    #[error("token file is malformed")]
    Malformed {
        /// Path involved.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// A blank token was supplied to sign in.
    #[error("token must not be empty")]
    EmptyToken,
}

/// Persistence backend for the bearer token.
pub trait TokenStore: Send + Sync {
    /// Load the persisted token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be read.
    fn load(&self) -> Result<Option<String>, SessionError>;

    /// Persist `token`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be written.
    fn save(&self, token: &str) -> Result<(), SessionError>;

    /// Remove the persisted token.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be modified.
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: String,
}

/// Token store writing `{"token": "..."}` to a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform config location (e.g. `~/.config/chanadmin/session.json`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "chanadmin").map(|dirs| dirs.config_dir().join("session.json"))
    }

    /// File backing this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, operation: &'static str, source: io::Error) -> SessionError {
        SessionError::Io {
            operation,
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error("read", err)),
        };
        let stored: StoredSession =
            serde_json::from_str(&raw).map_err(|source| SessionError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        let token = stored.token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.io_error("create_dir", err))?;
        }
        let body = serde_json::to_string_pretty(&StoredSession {
            token: token.to_string(),
        })
        .map_err(|source| SessionError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, body).map_err(|err| self.io_error("write", err))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error("remove", err)),
        }
    }
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Store seeded with `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Latest session transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A token is present.
    SignedIn,
    /// The user signed out (or never signed in).
    SignedOut,
    /// The server rejected the token; the user must sign in again.
    SignInRequired,
}

struct SessionInner {
    store: Box<dyn TokenStore>,
    token: RwLock<Option<String>>,
    events: watch::Sender<SessionEvent>,
}

/// Shared owner of the bearer token.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Build a context over `store`, loading any persisted token.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub fn new(store: impl TokenStore + 'static) -> Result<Self, SessionError> {
        let token = store.load()?;
        let initial = if token.is_some() {
            SessionEvent::SignedIn
        } else {
            SessionEvent::SignedOut
        };
        let (events, _) = watch::channel(initial);
        Ok(Self {
            inner: Arc::new(SessionInner {
                store: Box::new(store),
                token: RwLock::new(token),
                events,
            }),
        })
    }

    /// Context without persistence, starting signed out.
    #[must_use]
    pub fn in_memory() -> Self {
        let (events, _) = watch::channel(SessionEvent::SignedOut);
        Self {
            inner: Arc::new(SessionInner {
                store: Box::new(MemoryTokenStore::default()),
                token: RwLock::new(None),
                events,
            }),
        }
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Store a new token (trimmed) and emit [`SessionEvent::SignedIn`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyToken`] for blank input, or a store error.
    pub fn sign_in(&self, token: &str) -> Result<(), SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        self.inner.store.save(token)?;
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        self.inner.events.send_replace(SessionEvent::SignedIn);
        debug!("session token stored");
        Ok(())
    }

    /// Drop the token and emit [`SessionEvent::SignedOut`].
    ///
    /// # Errors
    ///
    /// Returns an error when the persisted token cannot be removed.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.forget();
        self.inner.events.send_replace(SessionEvent::SignedOut);
        self.inner.store.clear()
    }

    /// Drop the token after the server rejected it and emit
    /// [`SessionEvent::SignInRequired`].
    ///
    /// Store failures are logged; the in-memory token is cleared regardless.
    pub fn expire(&self) {
        self.forget();
        self.inner.events.send_replace(SessionEvent::SignInRequired);
        if let Err(err) = self.inner.store.clear() {
            warn!(error = %err, "failed to remove persisted token after 401");
        }
    }

    /// Subscribe to session transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Most recent session transition.
    #[must_use]
    pub fn last_event(&self) -> SessionEvent {
        *self.inner.events.borrow()
    }

    fn forget(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Front-end destinations subject to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Sign-in page.
    SignIn,
    /// Channel list.
    Channels,
    /// System configuration view.
    SystemConfig,
}

impl Route {
    /// Whether the route needs a token.
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        !matches!(self, Self::SignIn)
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the requested route.
    Proceed,
    /// Navigate elsewhere instead.
    Redirect(Route),
}

/// Redirect anonymous users to sign-in and signed-in users away from it.
#[must_use]
pub fn guard(route: Route, session: &SessionContext) -> RouteDecision {
    match (route.requires_auth(), session.is_authenticated()) {
        (true, false) => RouteDecision::Redirect(Route::SignIn),
        (false, true) => RouteDecision::Redirect(Route::Channels),
        _ => RouteDecision::Proceed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = TempDir::new().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("nested").join("session.json"));
        assert_eq!(store.load().expect("load"), None);

        store.save("abc").expect("save");
        assert_eq!(store.load().expect("load").as_deref(), Some("abc"));

        store.clear().expect("clear");
        store.clear().expect("clear is idempotent");
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn file_store_reports_malformed_json() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").expect("write");
        assert!(matches!(
            FileTokenStore::new(&path).load(),
            Err(SessionError::Malformed { .. })
        ));
    }

    #[test]
    fn context_loads_persisted_token() {
        let session = SessionContext::new(MemoryTokenStore::with_token("persisted"))
            .expect("session");
        assert_eq!(session.token().as_deref(), Some("persisted"));
        assert_eq!(session.last_event(), SessionEvent::SignedIn);
    }

    #[test]
    fn sign_in_trims_and_rejects_blank_tokens() {
        let session = SessionContext::in_memory();
        assert!(matches!(
            session.sign_in("   "),
            Err(SessionError::EmptyToken)
        ));
        assert!(!session.is_authenticated());

        session.sign_in("  tok  ").expect("sign in");
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(session.last_event(), SessionEvent::SignedIn);
    }

    #[tokio::test]
    async fn expire_clears_token_and_notifies_subscribers() {
        let session = SessionContext::in_memory();
        session.sign_in("tok").expect("sign in");
        let mut events = session.subscribe();

        session.expire();

        events.changed().await.expect("event");
        assert_eq!(*events.borrow(), SessionEvent::SignInRequired);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn sign_out_clears_persisted_token() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("session.json");
        let session = SessionContext::new(FileTokenStore::new(&path)).expect("session");
        session.sign_in("tok").expect("sign in");
        assert!(path.exists());

        session.sign_out().expect("sign out");
        assert!(!path.exists());
        assert_eq!(session.last_event(), SessionEvent::SignedOut);
    }

    #[test]
    fn guard_redirects_by_authentication_state() {
        let session = SessionContext::in_memory();
        assert_eq!(
            guard(Route::Channels, &session),
            RouteDecision::Redirect(Route::SignIn)
        );
        assert_eq!(guard(Route::SignIn, &session), RouteDecision::Proceed);

        session.sign_in("tok").expect("sign in");
        assert_eq!(guard(Route::Channels, &session), RouteDecision::Proceed);
        assert_eq!(guard(Route::SystemConfig, &session), RouteDecision::Proceed);
        assert_eq!(
            guard(Route::SignIn, &session),
            RouteDecision::Redirect(Route::Channels)
        );
    }
}
