//! Application-wide authorization context.
//!
//! Holds the current identity and derives role flags from it on every call,
//! so flags can never drift from the identity. Views either read the flags
//! directly or `subscribe()` and re-render on change.

use crate::error::{Error, Result};
use crate::model::{Identity, NewUser, Role};
use crate::session::SessionStore;
use crate::storage::SessionStorage;
use crate::transport::Transport;
use std::sync::Arc;
use tokio::sync::watch;

/// Current identity plus the session entry points that change it.
///
/// Clones share the same identity; a login through one clone is seen by all.
///
/// # Example
///
/// ```ignore
/// let ctx = AuthContext::init(store);
/// let mut changes = ctx.subscribe();
///
/// ctx.login("pat@clinic.test", "secret1").await?;
/// changes.changed().await?;
/// assert!(ctx.is_service_provider());
/// ```
#[derive(Clone)]
pub struct AuthContext<T: Transport, S: SessionStorage> {
    store: SessionStore<T, S>,
    current: Arc<watch::Sender<Option<Identity>>>,
}

impl<T: Transport, S: SessionStorage> AuthContext<T, S> {
    /// Build the context from whatever session the store has persisted.
    pub fn init(store: SessionStore<T, S>) -> Self {
        let restored = store.current_identity();
        match &restored {
            Some(identity) => info!(
                "✓ Restored session for user {} ({})",
                identity.id, identity.role
            ),
            None => debug!("No persisted session"),
        }
        let (current, _) = watch::channel(restored);
        AuthContext {
            store,
            current: Arc::new(current),
        }
    }

    /// Read access to the underlying store. Its mutators are crate-private;
    /// log in and out through the context.
    pub fn store(&self) -> &SessionStore<T, S> {
        &self.store
    }

    /// Snapshot of the current identity.
    pub fn identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.has(Identity::is_admin)
    }

    pub fn is_service_provider(&self) -> bool {
        self.has(Identity::is_service_provider)
    }

    pub fn is_customer(&self) -> bool {
        self.has(Identity::is_customer)
    }

    fn has(&self, flag: fn(&Identity) -> bool) -> bool {
        self.current.borrow().as_ref().is_some_and(flag)
    }

    /// Receiver notified whenever the identity changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    /// The current identity, or `Error::Unauthorized` when logged out.
    pub fn require_authenticated(&self) -> Result<Identity> {
        self.identity()
            .ok_or_else(|| Error::Unauthorized("Please log in to continue".to_string()))
    }

    /// The current identity if it holds `role`.
    ///
    /// # Errors
    /// - `Error::Unauthorized`: nobody is logged in
    /// - `Error::Forbidden`: logged in with another role
    pub fn require_role(&self, role: Role) -> Result<Identity> {
        let identity = self.require_authenticated()?;
        if identity.role != role {
            warn!(
                "✗ User {} ({}) refused: requires {}",
                identity.id, identity.role, role
            );
            return Err(Error::Forbidden(format!(
                "This page requires the {} role",
                role.display_name()
            )));
        }
        Ok(identity)
    }

    /// Log in and publish the new identity.
    ///
    /// On failure the previous identity (if any) is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.store.login(email, password).await?;
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Register, log in and publish the new identity.
    pub async fn register(&self, new_user: NewUser) -> Result<Identity> {
        let identity = self.store.register(new_user).await?;
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Log out and publish `None`. Idempotent.
    pub fn logout(&self) -> Result<()> {
        self.store.logout()?;
        self.current.send_replace(None);
        Ok(())
    }
}
