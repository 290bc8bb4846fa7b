//! In-memory backend implementing the REST contract (default, thread-safe, async).
//!
//! Uses DashMap for concurrent access to users, appointments and issued
//! tokens. Answers every endpoint the client consumes with the same
//! `{ success, message, data }` envelope and status codes as the real
//! backend, enforces the appointment status graph, and verifies passwords
//! against argon2 hashes.
//!
//! Writes to appointments need a bearer token issued by `POST /auth/login`
//! (401 otherwise); deletes additionally need an admin (403). Reads and
//! registration are open.

use super::{ApiRequest, Method, RawResponse, Transport};
use crate::error::{Error, Result};
use crate::model::{
    Appointment, AppointmentRequest, AppointmentStats, AppointmentStatus, Identity, NewUser, Role,
};
use crate::validators;
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{Local, NaiveDateTime};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use password_hash::rand_core::{OsRng, RngCore};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Handler failure, rendered as a `success: false` envelope.
struct Failure {
    status: u16,
    message: String,
}

impl Failure {
    fn bad_request(message: impl Into<String>) -> Self {
        Failure {
            status: 400,
            message: message.into(),
        }
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Failure {
            status: 401,
            message: message.into(),
        }
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Failure {
            status: 403,
            message: message.into(),
        }
    }

    fn not_found(resource: &str, field: &str, value: impl std::fmt::Display) -> Self {
        Failure {
            status: 404,
            message: format!("{} not found with {}: '{}'", resource, field, value),
        }
    }

    fn into_response(self) -> RawResponse {
        RawResponse::new(
            self.status,
            json!({
                "success": false,
                "message": self.message,
                "statusCode": self.status,
            }),
        )
    }
}

type Handled = std::result::Result<RawResponse, Failure>;

fn ok(status: u16, message: &str, data: Value) -> Handled {
    Ok(RawResponse::new(
        status,
        json!({ "success": true, "message": message, "data": data }),
    ))
}

fn to_value<T: serde::Serialize>(value: &T) -> std::result::Result<Value, Failure> {
    serde_json::to_value(value).map_err(|e| Failure {
        status: 500,
        message: format!("Failed to encode response: {}", e),
    })
}

fn parse_body<T: for<'de> Deserialize<'de>>(request: &ApiRequest) -> std::result::Result<T, Failure> {
    let body = request
        .body
        .clone()
        .ok_or_else(|| Failure::bad_request("Request body is required"))?;
    serde_json::from_value(body).map_err(|e| Failure::bad_request(format!("Malformed request: {}", e)))
}

fn parse_id(raw: &str) -> std::result::Result<i64, Failure> {
    raw.parse::<i64>()
        .map_err(|_| Failure::bad_request(format!("Invalid id: {}", raw)))
}

/// Hash with deliberately small argon2 parameters; this backend is a test double.
fn hash_password(raw: &str) -> std::result::Result<String, Failure> {
    let internal = |e: String| Failure {
        status: 500,
        message: format!("Password hashing failed: {}", e),
    };
    let params = Params::new(8, 1, 1, None).map_err(|e| internal(e.to_string()))?;
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| internal(e.to_string()))
}

fn verify_password(raw: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; 24];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn sorted(mut list: Vec<Appointment>) -> Vec<Appointment> {
    list.sort_by(|a, b| {
        a.appointment_date_time
            .cmp(&b.appointment_date_time)
            .then(a.id.cmp(&b.id))
    });
    list
}

struct UserRecord {
    identity: Identity,
    password_hash: String,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

struct State {
    users: DashMap<i64, UserRecord>,
    appointments: DashMap<i64, Appointment>,
    tokens: DashMap<String, i64>,
    next_user_id: AtomicI64,
    next_appointment_id: AtomicI64,
    offline: AtomicBool,
    requests: AtomicU64,
    clock: RwLock<Option<NaiveDateTime>>,
    last_bearer: Mutex<Option<String>>,
    /// Serializes check-then-insert for unique emails and provider slots.
    writes: Mutex<()>,
}

/// Thread-safe in-memory stand-in for the booking backend.
///
/// Clones share the same state, so a test can keep one handle for setup and
/// inspection while the client owns another.
///
/// # Example
///
/// ```no_run
/// use appointment_client::model::{NewUser, Role};
/// use appointment_client::transport::InMemoryTransport;
///
/// let backend = InMemoryTransport::new();
/// let provider = backend
///     .seed_user(NewUser {
///         name: "Dr. Pat".into(),
///         email: "pat@clinic.test".into(),
///         password: "secret1".into(),
///         phone: None,
///         role: Role::ServiceProvider,
///     })
///     .expect("seeded");
/// assert_eq!(provider.role, Role::ServiceProvider);
/// ```
#[derive(Clone)]
pub struct InMemoryTransport {
    state: Arc<State>,
}

impl InMemoryTransport {
    /// Create an empty backend using the wall clock.
    pub fn new() -> Self {
        InMemoryTransport {
            state: Arc::new(State {
                users: DashMap::new(),
                appointments: DashMap::new(),
                tokens: DashMap::new(),
                next_user_id: AtomicI64::new(1),
                next_appointment_id: AtomicI64::new(1),
                offline: AtomicBool::new(false),
                requests: AtomicU64::new(0),
                clock: RwLock::new(None),
                last_bearer: Mutex::new(None),
                writes: Mutex::new(()),
            }),
        }
    }

    /// Pin the backend's notion of "now" (`None` restores the wall clock).
    pub fn set_clock(&self, now: Option<NaiveDateTime>) {
        *self.state.clock.write() = now;
    }

    /// Simulate the backend being unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::SeqCst);
        if offline {
            warn!("⚠ InMemory backend set OFFLINE");
        }
    }

    /// Number of requests received so far, including ones refused while offline.
    pub fn request_count(&self) -> u64 {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Bearer token carried by the most recent request.
    pub fn last_bearer(&self) -> Option<String> {
        self.state.last_bearer.lock().clone()
    }

    pub fn user_count(&self) -> usize {
        self.state.users.len()
    }

    pub fn appointment_count(&self) -> usize {
        self.state.appointments.len()
    }

    /// Register a user directly, bypassing the transport.
    ///
    /// # Errors
    /// Returns `Error::Server` with the same message `POST /users` would give.
    pub fn seed_user(&self, new_user: NewUser) -> Result<Identity> {
        self.insert_user(new_user)
            .map_err(|f| Error::Server {
                status: Some(f.status),
                message: f.message,
            })
    }

    /// Book an appointment directly, bypassing the transport.
    ///
    /// # Errors
    /// Returns `Error::Server` with the same message `POST /appointments` would give.
    pub fn seed_appointment(&self, request: AppointmentRequest) -> Result<Appointment> {
        self.insert_appointment(request)
            .map_err(|f| Error::Server {
                status: Some(f.status),
                message: f.message,
            })
    }

    /// Issue a bearer token for an existing user, as a login would.
    pub fn issue_token(&self, user_id: i64) -> Option<String> {
        if !self.state.users.contains_key(&user_id) {
            return None;
        }
        let token = new_token();
        self.state.tokens.insert(token.clone(), user_id);
        Some(token)
    }

    /// Mark an account inactive.
    pub fn deactivate_user(&self, id: i64) -> bool {
        match self.state.users.get_mut(&id) {
            Some(mut record) => {
                record.identity.active = false;
                true
            }
            None => false,
        }
    }

    fn now(&self) -> NaiveDateTime {
        let pinned = *self.state.clock.read();
        pinned.unwrap_or_else(|| Local::now().naive_local())
    }

    fn identity(&self, id: i64) -> std::result::Result<Identity, Failure> {
        self.state
            .users
            .get(&id)
            .map(|record| record.identity.clone())
            .ok_or_else(|| Failure::not_found("User", "id", id))
    }

    /// Resolve the request's bearer token to an active account.
    fn authenticate(&self, request: &ApiRequest) -> std::result::Result<Identity, Failure> {
        let token = request
            .bearer
            .as_deref()
            .ok_or_else(|| Failure::unauthorized("Authentication required"))?;
        let user_id = self
            .state
            .tokens
            .get(token)
            .map(|entry| *entry.value())
            .ok_or_else(|| Failure::unauthorized("Invalid or expired token"))?;
        let identity = self
            .identity(user_id)
            .map_err(|_| Failure::unauthorized("Invalid or expired token"))?;
        if !identity.active {
            return Err(Failure::forbidden("Account is inactive"));
        }
        Ok(identity)
    }

    fn require_admin(&self, request: &ApiRequest, what: &str) -> std::result::Result<(), Failure> {
        let caller = self.authenticate(request)?;
        if !caller.is_admin() {
            return Err(Failure::forbidden(format!(
                "Only administrators can delete {}",
                what
            )));
        }
        Ok(())
    }

    fn appointments_where(&self, keep: impl Fn(&Appointment) -> bool) -> Vec<Appointment> {
        sorted(
            self.state
                .appointments
                .iter()
                .filter(|entry| keep(entry.value()))
                .map(|entry| entry.value().clone())
                .collect(),
        )
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    fn insert_user(&self, new_user: NewUser) -> std::result::Result<Identity, Failure> {
        let email = new_user.email.trim().to_lowercase();

        if !validators::validate_name(new_user.name.trim()) {
            return Err(Failure::bad_request(
                "Name must be between 2 and 100 characters",
            ));
        }
        if !validators::validate_email(&email) {
            return Err(Failure::bad_request(
                "Email should be valid (e.g., user@example.com)",
            ));
        }
        if !validators::validate_password(&new_user.password) {
            return Err(Failure::bad_request(
                "Password must be at least 6 characters",
            ));
        }
        if let Some(phone) = &new_user.phone {
            if !validators::validate_phone(phone) {
                return Err(Failure::bad_request("Phone number must be 10-15 digits"));
            }
        }
        let password_hash = hash_password(&new_user.password)?;

        let _writes = self.state.writes.lock();
        if self
            .state
            .users
            .iter()
            .any(|record| record.identity.email == email)
        {
            return Err(Failure::bad_request(format!(
                "Email already registered: {}",
                email
            )));
        }
        let id = self.state.next_user_id.fetch_add(1, Ordering::SeqCst);
        let identity = Identity {
            id,
            name: new_user.name.trim().to_string(),
            email,
            phone: new_user.phone,
            role: new_user.role,
            active: true,
        };

        self.state.users.insert(
            id,
            UserRecord {
                identity: identity.clone(),
                password_hash,
            },
        );
        debug!("✓ InMemory user {} registered as {}", id, identity.role);
        Ok(identity)
    }

    fn find_by_email(&self, email: &str) -> Option<(Identity, String)> {
        let email = email.trim().to_lowercase();
        self.state
            .users
            .iter()
            .find(|record| record.identity.email == email)
            .map(|record| (record.identity.clone(), record.password_hash.clone()))
    }

    fn handle_login(&self, request: &ApiRequest) -> Handled {
        let body: LoginBody = parse_body(request)?;

        let (identity, hash) = self
            .find_by_email(&body.email)
            .ok_or_else(|| Failure::unauthorized("Invalid credentials"))?;

        if !verify_password(&body.password, &hash) {
            return Err(Failure::unauthorized("Invalid credentials"));
        }
        if !identity.active {
            return Err(Failure::forbidden("Account is inactive"));
        }

        let token = new_token();
        self.state.tokens.insert(token.clone(), identity.id);
        ok(
            200,
            "Login successful",
            json!({ "user": to_value(&identity)?, "token": token }),
        )
    }

    fn handle_user_by_email(&self, email: &str) -> Handled {
        let (identity, _) = self
            .find_by_email(email)
            .ok_or_else(|| Failure::not_found("User", "email", email))?;
        ok(200, "User retrieved successfully", to_value(&identity)?)
    }

    fn handle_list_users(&self, providers_only: bool) -> Handled {
        let mut users: Vec<Identity> = self
            .state
            .users
            .iter()
            .map(|record| record.identity.clone())
            .filter(|identity| {
                !providers_only || (identity.role == Role::ServiceProvider && identity.active)
            })
            .collect();
        users.sort_by_key(|identity| identity.id);
        ok(200, "Users retrieved successfully", to_value(&users)?)
    }

    fn handle_delete_user(&self, id: i64) -> Handled {
        self.state
            .users
            .remove(&id)
            .ok_or_else(|| Failure::not_found("User", "id", id))?;
        self.state.tokens.retain(|_, owner| *owner != id);
        ok(200, "User deleted successfully", Value::Null)
    }

    // ------------------------------------------------------------------
    // Appointments
    // ------------------------------------------------------------------

    fn check_slot(
        &self,
        provider_id: i64,
        when: NaiveDateTime,
        exclude: Option<i64>,
    ) -> std::result::Result<(), Failure> {
        let taken = self.state.appointments.iter().any(|entry| {
            let apt = entry.value();
            Some(apt.id) != exclude
                && apt.service_provider_id == provider_id
                && apt.appointment_date_time == when
                && apt.status != AppointmentStatus::Cancelled
        });
        if taken {
            return Err(Failure::bad_request(format!(
                "Service provider (ID: {}) already has an appointment at {}",
                provider_id, when
            )));
        }
        Ok(())
    }

    /// Resolve both parties and check the request against backend rules.
    fn resolve_parties(
        &self,
        request: &AppointmentRequest,
    ) -> std::result::Result<(Identity, Identity), Failure> {
        let customer = self.identity(request.customer_id)?;
        let provider = self.identity(request.service_provider_id)?;

        if provider.role != Role::ServiceProvider {
            return Err(Failure::bad_request(format!(
                "User with ID {} is not registered as a service provider",
                provider.id
            )));
        }
        if request.appointment_date_time <= self.now() {
            return Err(Failure::bad_request(
                "Appointment cannot be scheduled in the past. Please select a future date and time.",
            ));
        }
        Ok((customer, provider))
    }

    fn insert_appointment(
        &self,
        request: AppointmentRequest,
    ) -> std::result::Result<Appointment, Failure> {
        let (customer, provider) = self.resolve_parties(&request)?;

        let _writes = self.state.writes.lock();
        self.check_slot(provider.id, request.appointment_date_time, None)?;

        let id = self.state.next_appointment_id.fetch_add(1, Ordering::SeqCst);
        let appointment = Appointment {
            id,
            customer_id: customer.id,
            customer_name: customer.name,
            service_provider_id: provider.id,
            service_provider_name: provider.name,
            service_type: request.service_type,
            service_type_display_name: request.service_type.display_name().to_string(),
            appointment_date_time: request.appointment_date_time,
            notes: request.notes,
            status: AppointmentStatus::Pending,
        };
        self.state.appointments.insert(id, appointment.clone());
        debug!("✓ InMemory appointment {} booked", id);
        Ok(appointment)
    }

    fn handle_get_appointment(&self, id: i64) -> Handled {
        let apt = self
            .state
            .appointments
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Failure::not_found("Appointment", "id", id))?;
        ok(200, "Appointment retrieved successfully", to_value(&apt)?)
    }

    fn handle_update_appointment(&self, id: i64, request: &ApiRequest) -> Handled {
        let body: AppointmentRequest = parse_body(request)?;

        let current = self
            .state
            .appointments
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Failure::not_found("Appointment", "id", id))?;

        if current.status == AppointmentStatus::Cancelled {
            return Err(Failure::bad_request(format!(
                "Cannot modify cancelled appointment (ID: {})",
                id
            )));
        }

        let (customer, provider) = self.resolve_parties(&body)?;

        let _writes = self.state.writes.lock();
        self.check_slot(provider.id, body.appointment_date_time, Some(id))?;

        let updated = Appointment {
            customer_id: customer.id,
            customer_name: customer.name,
            service_provider_id: provider.id,
            service_provider_name: provider.name,
            service_type: body.service_type,
            service_type_display_name: body.service_type.display_name().to_string(),
            appointment_date_time: body.appointment_date_time,
            notes: body.notes,
            ..current
        };
        self.state.appointments.insert(id, updated.clone());
        ok(200, "Appointment updated successfully", to_value(&updated)?)
    }

    fn handle_set_status(&self, id: i64, request: &ApiRequest) -> Handled {
        let raw = request
            .query_param("status")
            .ok_or_else(|| Failure::bad_request("Query parameter 'status' is required"))?;
        let next: AppointmentStatus = raw
            .parse()
            .map_err(|_| Failure::bad_request(format!("Invalid status: {}", raw)))?;

        let mut entry = self
            .state
            .appointments
            .get_mut(&id)
            .ok_or_else(|| Failure::not_found("Appointment", "id", id))?;

        if !entry.status.can_transition_to(next) {
            return Err(Failure::bad_request(format!(
                "Cannot change appointment status from {} to {}",
                entry.status, next
            )));
        }

        entry.status = next;
        let updated = entry.value().clone();
        drop(entry);

        debug!("✓ InMemory appointment {} -> {}", id, next);
        ok(200, "Appointment status updated successfully", to_value(&updated)?)
    }

    fn handle_delete_appointment(&self, id: i64) -> Handled {
        self.state
            .appointments
            .remove(&id)
            .ok_or_else(|| Failure::not_found("Appointment", "id", id))?;
        ok(200, "Appointment deleted successfully", Value::Null)
    }

    fn handle_search(&self, request: &ApiRequest) -> Handled {
        let keyword = request
            .query_param("keyword")
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Failure::bad_request("Query parameter 'keyword' is required"))?;

        let found = self.appointments_where(|apt| {
            apt.customer_name.to_lowercase().contains(&keyword)
                || apt.service_provider_name.to_lowercase().contains(&keyword)
                || apt.service_type_display_name.to_lowercase().contains(&keyword)
                || apt
                    .notes
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&keyword))
        });
        ok(200, "Search completed", to_value(&found)?)
    }

    fn handle_stats(&self) -> Handled {
        let all = self.appointments_where(|_| true);
        ok(
            200,
            "Statistics retrieved successfully",
            to_value(&AppointmentStats::from_appointments(&all))?,
        )
    }

    fn list(&self, list: Vec<Appointment>) -> Handled {
        ok(200, "Appointments retrieved successfully", to_value(&list)?)
    }

    fn route(&self, request: &ApiRequest) -> Handled {
        let segments: Vec<String> = request
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .collect();
        let parts: Vec<&str> = segments.iter().map(String::as_str).collect();

        match (request.method, parts.as_slice()) {
            (Method::Post, ["auth", "login"]) => self.handle_login(request),

            (Method::Post, ["users"]) => {
                let identity = self.insert_user(parse_body(request)?)?;
                ok(201, "User created successfully", to_value(&identity)?)
            }
            (Method::Get, ["users"]) => self.handle_list_users(false),
            (Method::Get, ["users", "providers"]) => self.handle_list_users(true),
            (Method::Get, ["users", "email", email]) => self.handle_user_by_email(email),
            (Method::Delete, ["users", id]) => {
                self.require_admin(request, "users")?;
                self.handle_delete_user(parse_id(id)?)
            }

            (Method::Get, ["appointments"]) => self.list(self.appointments_where(|_| true)),
            (Method::Post, ["appointments"]) => {
                self.authenticate(request)?;
                let apt = self.insert_appointment(parse_body(request)?)?;
                ok(201, "Appointment created successfully", to_value(&apt)?)
            }
            (Method::Get, ["appointments", "stats"]) => self.handle_stats(),
            (Method::Get, ["appointments", "search"]) => self.handle_search(request),
            (Method::Get, ["appointments", "customer", id]) => {
                let id = parse_id(id)?;
                self.list(self.appointments_where(|apt| apt.customer_id == id))
            }
            (Method::Get, ["appointments", "customer", id, "upcoming"]) => {
                let id = parse_id(id)?;
                let now = self.now();
                self.list(
                    self.appointments_where(|apt| apt.customer_id == id && apt.is_upcoming(now)),
                )
            }
            (Method::Get, ["appointments", "provider", id]) => {
                let id = parse_id(id)?;
                self.list(self.appointments_where(|apt| apt.service_provider_id == id))
            }
            (Method::Get, ["appointments", "status", raw]) => {
                let status: AppointmentStatus = raw
                    .parse()
                    .map_err(|_| Failure::bad_request(format!("Invalid status: {}", raw)))?;
                self.list(self.appointments_where(|apt| apt.status == status))
            }
            (Method::Patch, ["appointments", id, "status"]) => {
                self.authenticate(request)?;
                self.handle_set_status(parse_id(id)?, request)
            }
            (Method::Get, ["appointments", id]) => self.handle_get_appointment(parse_id(id)?),
            (Method::Put, ["appointments", id]) => {
                self.authenticate(request)?;
                self.handle_update_appointment(parse_id(id)?, request)
            }
            (Method::Delete, ["appointments", id]) => {
                self.require_admin(request, "appointments")?;
                self.handle_delete_appointment(parse_id(id)?)
            }

            _ => Err(Failure {
                status: 404,
                message: format!("No handler for {} {}", request.method, request.path),
            }),
        }
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for InMemoryTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        self.state.requests.fetch_add(1, Ordering::SeqCst);

        if self.state.offline.load(Ordering::SeqCst) {
            debug!("✗ InMemory {} {} -> OFFLINE", request.method, request.path);
            return Err(Error::Transport(
                "in-memory backend is offline".to_string(),
            ));
        }

        *self.state.last_bearer.lock() = request.bearer.clone();

        let response = self
            .route(&request)
            .unwrap_or_else(Failure::into_response);

        debug!(
            "✓ InMemory {} {} -> {}",
            request.method, request.path, response.status
        );
        Ok(response)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.state.offline.load(Ordering::SeqCst))
    }
}
