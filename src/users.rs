//! User directory endpoints.

use crate::api::{segment, ApiClient};
use crate::error::Result;
use crate::model::{Identity, NewUser};
use crate::transport::Transport;

/// Client for `/users`.
#[derive(Clone)]
pub struct UserClient<T: Transport> {
    api: ApiClient<T>,
}

impl<T: Transport> UserClient<T> {
    pub fn new(api: ApiClient<T>) -> Self {
        UserClient { api }
    }

    /// `GET /users`
    pub async fn list(&self) -> Result<Vec<Identity>> {
        self.api.get("/users").await
    }

    /// Active service providers, for the booking form's provider picker.
    pub async fn list_providers(&self) -> Result<Vec<Identity>> {
        self.api.get("/users/providers").await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Identity> {
        self.api
            .get(format!("/users/email/{}", segment(email.trim())))
            .await
    }

    /// Create an account without touching the session.
    ///
    /// Use [`AuthContext::register`](crate::AuthContext::register) to
    /// register and log in at once.
    pub async fn create(&self, new_user: &NewUser) -> Result<Identity> {
        self.api.post("/users", new_user).await
    }

    /// `DELETE /users/{id}`. On success the caller must refresh its user list.
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.api.delete(format!("/users/{}", id)).await
    }
}
