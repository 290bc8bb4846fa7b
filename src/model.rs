//! Wire types shared by the session store and the appointment client.
//!
//! All types serialize to the camelCase JSON the backend speaks; enums use
//! the backend's SCREAMING_SNAKE_CASE tags.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role. Fixed for the lifetime of a client session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Customer,
    ServiceProvider,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::ServiceProvider => "SERVICE_PROVIDER",
            Role::Admin => "ADMIN",
        }
    }

    /// "SERVICE PROVIDER" style label used in admin tables.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::ServiceProvider => "SERVICE PROVIDER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CUSTOMER" => Ok(Role::Customer),
            "SERVICE_PROVIDER" => Ok(Role::ServiceProvider),
            "ADMIN" => Ok(Role::Admin),
            other => Err(Error::Validation(format!("unknown role: {}", other))),
        }
    }
}

fn default_active() -> bool {
    true
}

/// The authenticated user record held by the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_service_provider(&self) -> bool {
        self.role == Role::ServiceProvider
    }

    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }

    /// `j***@example.com`; returns the address unchanged when it has no `@`.
    pub fn masked_email(&self) -> String {
        match self.email.split_once('@') {
            Some((local, domain)) => {
                let first: String = local.chars().take(1).collect();
                format!("{}***@{}", first, domain)
            }
            None => self.email.clone(),
        }
    }
}

/// Registration payload for `POST /users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Kind of service an appointment books.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    #[default]
    Doctor,
    Dentist,
    Barber,
    Salon,
    Consultant,
    Therapist,
    Lawyer,
    Mechanic,
    Other,
}

impl ServiceType {
    pub const ALL: [ServiceType; 9] = [
        ServiceType::Doctor,
        ServiceType::Dentist,
        ServiceType::Barber,
        ServiceType::Salon,
        ServiceType::Consultant,
        ServiceType::Therapist,
        ServiceType::Lawyer,
        ServiceType::Mechanic,
        ServiceType::Other,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceType::Doctor => "Medical Consultation",
            ServiceType::Dentist => "Dental Check-up",
            ServiceType::Barber => "Haircut & Styling",
            ServiceType::Salon => "Beauty Services",
            ServiceType::Consultant => "Business Consultation",
            ServiceType::Therapist => "Therapy Session",
            ServiceType::Lawyer => "Legal Consultation",
            ServiceType::Mechanic => "Vehicle Service",
            ServiceType::Other => "Other Services",
        }
    }
}

/// Appointment lifecycle state.
///
/// ```text
/// PENDING ──► CONFIRMED ──► COMPLETED
///    │            │
///    └────────────┴──────► CANCELLED
/// ```
///
/// COMPLETED and CANCELLED are terminal. The backend owns enforcement; the
/// client only uses the graph to decide which actions to offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending Confirmation",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unknown appointment status: {}", s)))
    }
}

/// Appointment as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub customer_id: i64,
    #[serde(default)]
    pub customer_name: String,
    pub service_provider_id: i64,
    #[serde(default)]
    pub service_provider_name: String,
    pub service_type: ServiceType,
    #[serde(default)]
    pub service_type_display_name: String,
    pub appointment_date_time: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Still in the future and not yet finished or cancelled.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.appointment_date_time > now
            && matches!(
                self.status,
                AppointmentStatus::Pending | AppointmentStatus::Confirmed
            )
    }

    /// Full updates are only meaningful before the provider confirms.
    pub fn is_editable(&self) -> bool {
        self.status == AppointmentStatus::Pending
    }

    pub fn can_be_cancelled(&self) -> bool {
        self.status.can_transition_to(AppointmentStatus::Cancelled)
    }
}

/// Create/update payload for `POST /appointments` and `PUT /appointments/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub customer_id: i64,
    pub service_provider_id: i64,
    pub service_type: ServiceType,
    pub appointment_date_time: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Per-status appointment counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub confirmed: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub cancelled: u64,
}

impl AppointmentStats {
    /// Aggregate a list locally, same shape as `GET /appointments/stats`.
    pub fn from_appointments<'a, I>(appointments: I) -> Self
    where
        I: IntoIterator<Item = &'a Appointment>,
    {
        appointments
            .into_iter()
            .fold(AppointmentStats::default(), |mut stats, apt| {
                stats.record(apt.status);
                stats
            })
    }

    fn record(&mut self, status: AppointmentStatus) {
        self.total += 1;
        match status {
            AppointmentStatus::Pending => self.pending += 1,
            AppointmentStatus::Confirmed => self.confirmed += 1,
            AppointmentStatus::Completed => self.completed += 1,
            AppointmentStatus::Cancelled => self.cancelled += 1,
        }
    }
}

/// Something a viewer may do to an appointment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AppointmentAction {
    /// Provider accepts a pending booking.
    Confirm,
    /// Provider refuses a pending booking.
    Decline,
    /// Provider marks a confirmed booking as done.
    Complete,
    /// Customer withdraws a pending or confirmed booking.
    Cancel,
    /// Admin removes the record entirely.
    Delete,
}

impl AppointmentAction {
    /// Status the action moves to; `None` for `Delete`.
    pub fn target_status(&self) -> Option<AppointmentStatus> {
        match self {
            AppointmentAction::Confirm => Some(AppointmentStatus::Confirmed),
            AppointmentAction::Decline | AppointmentAction::Cancel => {
                Some(AppointmentStatus::Cancelled)
            }
            AppointmentAction::Complete => Some(AppointmentStatus::Completed),
            AppointmentAction::Delete => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentAction::Confirm => "Confirm",
            AppointmentAction::Decline => "Decline",
            AppointmentAction::Complete => "Mark Complete",
            AppointmentAction::Cancel => "Cancel Appointment",
            AppointmentAction::Delete => "Delete",
        }
    }
}

/// Actions offered to a viewer of `role` on an appointment in `status`.
pub fn available_actions(role: Role, status: AppointmentStatus) -> Vec<AppointmentAction> {
    use AppointmentAction::*;
    use AppointmentStatus::*;

    match (role, status) {
        (Role::ServiceProvider, Pending) => vec![Confirm, Decline],
        (Role::ServiceProvider, Confirmed) => vec![Complete],
        (Role::Customer, Pending | Confirmed) => vec![Cancel],
        (Role::Admin, _) => vec![Delete],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: 1,
            customer_id: 2,
            customer_name: "Carol".into(),
            service_provider_id: 3,
            service_provider_name: "Dr. Pat".into(),
            service_type: ServiceType::Doctor,
            service_type_display_name: "Medical Consultation".into(),
            appointment_date_time: "2026-11-01T09:00:00".parse().unwrap(),
            notes: None,
            status,
        }
    }

    #[test]
    fn test_identity_from_backend_json() {
        let identity: Identity = serde_json::from_value(json!({
            "id": 5,
            "name": "Alice",
            "email": "alice@example.com",
            "role": "SERVICE_PROVIDER",
            "roleDisplayName": "SERVICE PROVIDER",
            "active": true,
            "createdAt": "2026-01-01T00:00:00"
        }))
        .unwrap();

        assert_eq!(identity.role, Role::ServiceProvider);
        assert!(identity.is_service_provider());
        assert!(!identity.is_admin());
        assert_eq!(identity.phone, None);
        assert_eq!(identity.masked_email(), "a***@example.com");
    }

    #[test]
    fn test_appointment_from_backend_json() {
        let apt: Appointment = serde_json::from_value(json!({
            "id": 9,
            "customerId": 2,
            "customerName": "Carol",
            "serviceProviderId": 3,
            "serviceProviderName": "Dr. Pat",
            "serviceType": "DENTIST",
            "serviceTypeDisplayName": "Dental Check-up",
            "appointmentDateTime": "2026-11-01T09:30:00",
            "status": "CONFIRMED",
            "statusDisplayName": "Confirmed"
        }))
        .unwrap();

        assert_eq!(apt.service_type, ServiceType::Dentist);
        assert_eq!(apt.status, AppointmentStatus::Confirmed);
        assert!(apt.can_be_cancelled());
        assert!(!apt.is_editable());
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = AppointmentRequest {
            customer_id: 1,
            service_provider_id: 2,
            service_type: ServiceType::Barber,
            appointment_date_time: "2026-11-01T09:00:00".parse().unwrap(),
            notes: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["serviceProviderId"], 2);
        assert_eq!(value["serviceType"], "BARBER");
        assert_eq!(value["appointmentDateTime"], "2026-11-01T09:00:00");
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn test_transition_graph() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        for terminal in [Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in AppointmentStatus::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "confirmed".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::Confirmed
        );
        assert!("NO_SHOW".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_local_statistics() {
        use AppointmentStatus::*;
        let list: Vec<Appointment> = [Pending, Confirmed, Completed, Cancelled, Pending]
            .into_iter()
            .map(appointment)
            .collect();

        let stats = AppointmentStats::from_appointments(&list);
        assert_eq!(
            stats,
            AppointmentStats {
                total: 5,
                pending: 2,
                confirmed: 1,
                completed: 1,
                cancelled: 1,
            }
        );
    }

    #[test]
    fn test_available_actions_follow_graph() {
        use AppointmentStatus::*;
        assert_eq!(
            available_actions(Role::ServiceProvider, Pending),
            vec![AppointmentAction::Confirm, AppointmentAction::Decline]
        );
        assert_eq!(
            available_actions(Role::ServiceProvider, Confirmed),
            vec![AppointmentAction::Complete]
        );
        assert_eq!(
            available_actions(Role::Customer, Confirmed),
            vec![AppointmentAction::Cancel]
        );
        assert!(available_actions(Role::Customer, Completed).is_empty());
        assert!(available_actions(Role::ServiceProvider, Cancelled).is_empty());

        for role in [Role::Customer, Role::ServiceProvider] {
            for status in AppointmentStatus::ALL {
                for action in available_actions(role, status) {
                    let target = action.target_status().unwrap();
                    assert!(status.can_transition_to(target));
                }
            }
        }
    }

    #[test]
    fn test_service_type_picker() {
        let names: std::collections::HashSet<_> =
            ServiceType::ALL.iter().map(ServiceType::display_name).collect();
        assert_eq!(names.len(), ServiceType::ALL.len());

        for service in ServiceType::ALL {
            let wire = serde_json::to_value(service).unwrap();
            assert_eq!(serde_json::from_value::<ServiceType>(wire).unwrap(), service);
        }
        assert_eq!(ServiceType::ALL[0], ServiceType::default());
    }
}
