//! Session store: login, registration, logout and the persisted identity.
//!
//! The authenticated identity (plus the bearer token, when the backend
//! issues one) is serialized as one [`StoredSession`] record under a single
//! storage key. The store is the only writer of that slot and of the
//! [`ApiClient`]'s credentials.
//!
//! Login, registration and logout are crate-private: applications go
//! through [`AuthContext`](crate::AuthContext), which publishes every
//! change, so the persisted slot and the context never disagree.

use crate::api::{segment, ApiClient};
use crate::config::{ClientConfig, LoginMode, DEFAULT_SESSION_KEY};
use crate::error::{Error, Result};
use crate::model::{Identity, NewUser};
use crate::storage::SessionStorage;
use crate::transport::Transport;
use crate::validators;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Record persisted under the session key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    user: Identity,
    token: String,
}

/// Login, registration and logout over one storage slot.
///
/// # Example
///
/// ```ignore
/// use appointment_client::{ApiClient, AuthContext, SessionStore};
/// use appointment_client::storage::InMemoryStorage;
/// use appointment_client::transport::InMemoryTransport;
///
/// let store = SessionStore::new(ApiClient::new(InMemoryTransport::new()), InMemoryStorage::new());
/// let ctx = AuthContext::init(store);
/// let me = ctx.login("carol@example.com", "secret1").await?;
/// assert_eq!(ctx.store().current_identity(), Some(me));
/// ctx.logout()?;
/// ```
#[derive(Clone)]
pub struct SessionStore<T: Transport, S: SessionStorage> {
    api: ApiClient<T>,
    storage: S,
    key: Arc<str>,
    login_mode: LoginMode,
}

impl<T: Transport, S: SessionStorage> SessionStore<T, S> {
    /// Store using the default session key and verified login.
    pub fn new(api: ApiClient<T>, storage: S) -> Self {
        SessionStore {
            api,
            storage,
            key: Arc::from(DEFAULT_SESSION_KEY),
            login_mode: LoginMode::default(),
        }
    }

    /// Store using the session key and login mode from `config`.
    pub fn from_config(api: ApiClient<T>, storage: S, config: &ClientConfig) -> Self {
        Self::new(api, storage)
            .with_key(config.session_key.as_str())
            .with_login_mode(config.login_mode)
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Arc::from(key);
        self
    }

    pub fn with_login_mode(mut self, mode: LoginMode) -> Self {
        if mode == LoginMode::EmailLookup {
            warn!("⚠ Session store configured for email lookup login; passwords are NOT verified");
        }
        self.login_mode = mode;
        self
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn login_mode(&self) -> LoginMode {
        self.login_mode
    }

    /// Authenticate and persist the identity.
    ///
    /// Email and password are validated locally first; an invalid pair never
    /// reaches the network.
    ///
    /// # Errors
    ///
    /// - `Error::Validation`: malformed email or short password
    /// - `Error::InvalidCredentials`: no matching account, or wrong password
    /// - `Error::Unauthorized`: the account is inactive
    /// - `Error::Config`: the backend has no endpoint for this login mode
    /// - `Error::Transport` / `Error::Timeout`: backend unreachable
    /// - `Error::Storage`: the session could not be persisted
    pub(crate) async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        let email = email.trim().to_lowercase();
        if !validators::validate_email(&email) {
            return Err(Error::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }
        if !validators::validate_password(password) {
            return Err(Error::Validation(format!(
                "Password must be at least {} characters",
                validators::MIN_PASSWORD_LEN
            )));
        }

        let session = match self.login_mode {
            LoginMode::Verified => self.verified_login(&email, password).await?,
            LoginMode::EmailLookup => self.lookup_login(&email).await?,
        };

        if !session.user.active {
            warn!("✗ Login refused for inactive account {}", session.user.id);
            return Err(Error::Unauthorized("Account is inactive".to_string()));
        }

        self.persist(&session)?;
        info!(
            "✓ Logged in user {} as {}",
            session.user.id, session.user.role
        );
        Ok(session.user)
    }

    async fn verified_login(&self, email: &str, password: &str) -> Result<StoredSession> {
        let body = LoginBody { email, password };
        match self.api.post::<_, LoginResponse>("/auth/login", &body).await {
            Ok(response) => Ok(StoredSession {
                user: response.user,
                token: Some(response.token),
            }),
            Err(e) => Err(login_error(e, self.login_mode)),
        }
    }

    async fn lookup_login(&self, email: &str) -> Result<StoredSession> {
        warn!("⚠ Email lookup login for {}: credentials were not verified", email);
        let path = format!("/users/email/{}", segment(email));
        match self.api.get::<Identity>(path).await {
            Ok(user) => Ok(StoredSession { user, token: None }),
            Err(e) => Err(login_error(e, self.login_mode)),
        }
    }

    /// Create an account and log it in.
    ///
    /// In verified mode a token is requested right after creation; if that
    /// fails the identity is still persisted, without a token.
    ///
    /// # Errors
    ///
    /// - `Error::Validation`: a field fails the registration checks; nothing
    ///   is sent
    /// - `Error::Server`: the backend refused the account (e.g. email taken)
    /// - `Error::Transport` / `Error::Timeout`: backend unreachable
    /// - `Error::Storage`: the session could not be persisted
    pub(crate) async fn register(&self, new_user: NewUser) -> Result<Identity> {
        validators::validate_new_user(&new_user)?;
        let password = new_user.password.clone();
        let created: Identity = self.api.post("/users", &new_user).await?;
        info!("✓ Registered user {} as {}", created.id, created.role);

        let mut session = StoredSession {
            user: created,
            token: None,
        };
        if self.login_mode == LoginMode::Verified {
            match self.verified_login(&session.user.email, &password).await {
                Ok(verified) => session.token = verified.token,
                Err(e) => warn!(
                    "⚠ Registered user {} but token request failed: {}",
                    session.user.id, e
                ),
            }
        }

        self.persist(&session)?;
        Ok(session.user)
    }

    /// Forget the persisted identity and bearer credentials. Idempotent.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the slot exists but cannot be removed.
    pub(crate) fn logout(&self) -> Result<()> {
        self.api.set_credentials(None);
        self.storage.remove(&self.key)?;
        info!("✓ Logged out");
        Ok(())
    }

    /// Identity persisted by the last login or registration, if any.
    ///
    /// Also restores the stored bearer token onto the API client, so a
    /// process that starts with a persisted session is authenticated
    /// without another login. A slot that cannot be decoded is cleared.
    pub fn current_identity(&self) -> Option<Identity> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("⚠ Could not read session slot {}: {}", self.key, e);
                return None;
            }
        };

        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(session) => {
                self.api.set_credentials(session.token);
                Some(session.user)
            }
            Err(e) => {
                warn!("⚠ Corrupted session under {}, clearing: {}", self.key, e);
                if let Err(e) = self.storage.remove(&self.key) {
                    error!("✗ Failed to clear corrupted session: {}", e);
                }
                self.api.set_credentials(None);
                None
            }
        }
    }

    fn persist(&self, session: &StoredSession) -> Result<()> {
        let raw = serde_json::to_string(session)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        self.storage.set(&self.key, &raw)?;
        self.api.set_credentials(session.token.clone());
        debug!("✓ Session persisted under {}", self.key);
        Ok(())
    }
}

/// Map a failed login call onto session errors.
///
/// Only answers carrying an envelope speak about the credentials; a bare 404
/// means the endpoint itself is missing.
fn login_error(e: Error, mode: LoginMode) -> Error {
    match e {
        Error::Server {
            status: Some(401) | Some(404),
            ..
        } => Error::InvalidCredentials,
        Error::Server {
            status: Some(403),
            message,
        } => Error::Unauthorized(message),
        Error::NotFound(endpoint) => {
            error!("✗ Login endpoint missing: {}", endpoint);
            Error::Config(match mode {
                LoginMode::Verified => {
                    "backend has no /auth/login; use LoginMode::EmailLookup".to_string()
                }
                LoginMode::EmailLookup => {
                    "backend has no /users/email/{email}; check base_url".to_string()
                }
            })
        }
        other => other,
    }
}
