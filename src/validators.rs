//! Form validators.
//!
//! Pure predicates used to gate form submission before a request is issued,
//! plus the two forms the client submits: registration and booking.

use crate::error::{Error, Result};
use crate::model::{Appointment, AppointmentRequest, NewUser, Role, ServiceType};
use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// Minimum lead time between submission and the appointment itself.
pub const MIN_LEAD_TIME_HOURS: i64 = 24;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{10,15}$").expect("static phone pattern"))
}

/// `local@domain.tld` shape, no whitespace.
pub fn validate_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// 10 to 15 ASCII digits, nothing else.
pub fn validate_phone(phone: &str) -> bool {
    phone_regex().is_match(phone)
}

pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub fn validate_name(name: &str) -> bool {
    let len = name.chars().count();
    (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len)
}

/// Earliest selectable appointment time for a form opened at `now`.
pub fn min_appointment_datetime(now: NaiveDateTime) -> NaiveDateTime {
    now + Duration::hours(MIN_LEAD_TIME_HOURS)
}

/// Raw registration form state.
#[derive(Clone, Debug, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub role: Role,
}

impl RegistrationForm {
    /// Check every field and build the registration payload.
    ///
    /// # Errors
    /// Returns `Error::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<NewUser> {
        let phone = self.phone.trim();
        let user = NewUser {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password.clone(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            role: self.role,
        };

        validate_new_user(&user)?;

        if self.password != self.confirm_password {
            return Err(Error::Validation("Passwords do not match".to_string()));
        }

        Ok(user)
    }
}

/// Field checks for a registration payload, however it was built.
///
/// Name and email are judged after trimming (email also lowercased), the
/// way the backend stores them.
///
/// # Errors
/// Returns `Error::Validation` naming the first offending field.
pub fn validate_new_user(user: &NewUser) -> Result<()> {
    if !validate_name(user.name.trim()) {
        return Err(Error::Validation(format!(
            "Name must be between {} and {} characters",
            MIN_NAME_LEN, MAX_NAME_LEN
        )));
    }

    if !validate_email(&user.email.trim().to_lowercase()) {
        return Err(Error::Validation(
            "Email should be valid (e.g., user@example.com)".to_string(),
        ));
    }

    if !validate_password(&user.password) {
        return Err(Error::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    match user.phone.as_deref().map(str::trim) {
        Some(phone) if !phone.is_empty() && !validate_phone(phone) => Err(Error::Validation(
            "Phone number must be 10-15 digits".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Raw booking form state, for both create and edit.
#[derive(Clone, Debug, Default)]
pub struct AppointmentForm {
    pub service_provider_id: Option<i64>,
    pub service_type: ServiceType,
    pub appointment_date_time: Option<NaiveDateTime>,
    pub notes: String,
}

impl AppointmentForm {
    /// Check the form against the minimum lead time and build the payload.
    ///
    /// `now` is the submission instant; the appointment must fall at or after
    /// [`min_appointment_datetime`]`(now)`.
    ///
    /// # Errors
    /// Returns `Error::Validation`; nothing is sent to the backend.
    pub fn validate(&self, customer_id: i64, now: NaiveDateTime) -> Result<AppointmentRequest> {
        let provider_id = self
            .service_provider_id
            .ok_or_else(|| Error::Validation("Please select a service provider".to_string()))?;

        let when = self
            .appointment_date_time
            .ok_or_else(|| Error::Validation("Please choose a date and time".to_string()))?;

        if when < min_appointment_datetime(now) {
            return Err(Error::Validation(format!(
                "Appointment must be at least {} hours in advance",
                MIN_LEAD_TIME_HOURS
            )));
        }

        let notes = self.notes.trim();
        Ok(AppointmentRequest {
            customer_id,
            service_provider_id: provider_id,
            service_type: self.service_type,
            appointment_date_time: when,
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

/// Prefill the edit form from a loaded appointment.
impl From<&Appointment> for AppointmentForm {
    fn from(apt: &Appointment) -> Self {
        AppointmentForm {
            service_provider_id: Some(apt.service_provider_id),
            service_type: apt.service_type,
            appointment_date_time: Some(apt.appointment_date_time),
            notes: apt.notes.clone().unwrap_or_default(),
        }
    }
}
