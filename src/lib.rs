//! # appointment-client
//!
//! A typed, async client for an appointment-booking REST backend.
//!
//! ## Features
//!
//! - **Sessions:** login, registration and logout persisted to a pluggable storage slot
//! - **Authorization:** role flags derived from the current identity, with change notifications
//! - **Appointment Lifecycle:** book, edit, search and move appointments through their statuses
//! - **Validation:** form checks that run before any request is issued
//! - **Transport Agnostic:** HTTP via `reqwest`, or an in-memory backend for tests and demos
//! - **Production Ready:** Built-in logging, metrics hooks and error handling
//!
//! ## Quick Start
//!
//! ```ignore
//! use appointment_client::{
//!     ApiClient, AppointmentClient, AuthContext, ClientConfig, SessionStore,
//!     storage::FileStorage,
//!     transport::HttpTransport,
//!     validators::AppointmentForm,
//! };
//!
//! // 1. Configure (defaults, overridden by APPOINTMENT_* variables)
//! let config = ClientConfig::from_env()?;
//!
//! // 2. One API client, shared by everything below (Clone is an Arc increment)
//! let api = ApiClient::new(HttpTransport::new(&config)?);
//!
//! // 3. Session and authorization context
//! let store = SessionStore::from_config(api.clone(), FileStorage::new(".session")?, &config);
//! let ctx = AuthContext::init(store);
//! ctx.login("carol@example.com", "secret1").await?;
//!
//! // 4. Book an appointment
//! let me = ctx.require_authenticated()?;
//! let appointments = AppointmentClient::new(api);
//! let booked = appointments.book(&form, me.id, chrono::Local::now().naive_local()).await?;
//! ```
//!
//! ### Role Dashboards
//!
//! [`dashboard`] bundles the per-role views. Each refuses to load for the
//! wrong role and re-fetches after every action:
//!
//! ```ignore
//! let mut provider = ProviderDashboard::load(&ctx, appointments.clone()).await?;
//! provider.confirm(booked.id).await?;
//! ```

#[macro_use]
extern crate log;

pub mod api;
pub mod appointments;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod datefmt;
pub mod error;
pub mod model;
pub mod observability;
pub mod session;
pub mod storage;
pub mod transport;
pub mod users;
pub mod validators;

// Re-exports for convenience
pub use api::ApiClient;
pub use appointments::AppointmentClient;
pub use config::{ClientConfig, LoginMode};
pub use context::AuthContext;
pub use dashboard::{AdminDashboard, CustomerDashboard, CustomerTab, ProviderDashboard};
pub use error::{Error, Result};
pub use model::{
    available_actions, Appointment, AppointmentAction, AppointmentRequest, AppointmentStats,
    AppointmentStatus, Identity, NewUser, Role, ServiceType,
};
pub use session::SessionStore;
pub use storage::SessionStorage;
pub use transport::Transport;
pub use users::UserClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
