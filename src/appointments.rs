//! Appointment lifecycle client.
//!
//! Thin, typed wrappers over the `/appointments` endpoints. Nothing is
//! cached: every call goes to the backend, and every mutation leaves the
//! caller responsible for re-fetching whatever list it displays.

use crate::api::{segment, ApiClient};
use crate::error::{Error, Result};
use crate::model::{Appointment, AppointmentRequest, AppointmentStats, AppointmentStatus};
use crate::transport::{ApiRequest, Method, Transport};
use crate::validators::AppointmentForm;
use chrono::NaiveDateTime;

/// Client for `/appointments`.
///
/// # Example
///
/// ```ignore
/// let appointments = AppointmentClient::new(api.clone());
///
/// let booked = appointments.book(&form, me.id, Local::now().naive_local()).await?;
/// appointments.set_status(booked.id, AppointmentStatus::Cancelled).await?;
/// let mine = appointments.list_by_customer(me.id).await?;
/// ```
#[derive(Clone)]
pub struct AppointmentClient<T: Transport> {
    api: ApiClient<T>,
}

impl<T: Transport> AppointmentClient<T> {
    pub fn new(api: ApiClient<T>) -> Self {
        AppointmentClient { api }
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub async fn list(&self) -> Result<Vec<Appointment>> {
        self.api.get("/appointments").await
    }

    pub async fn get(&self, id: i64) -> Result<Appointment> {
        self.api.get(format!("/appointments/{}", id)).await
    }

    /// Book an appointment. The backend starts it as PENDING.
    ///
    /// On success the caller must refresh the associated list view.
    pub async fn create(&self, request: &AppointmentRequest) -> Result<Appointment> {
        self.api.post("/appointments", request).await
    }

    /// Validate a booking form, then create the appointment.
    ///
    /// # Errors
    /// Returns `Error::Validation` without issuing any request when the form
    /// is incomplete or less than 24 hours ahead of `now`.
    pub async fn book(
        &self,
        form: &AppointmentForm,
        customer_id: i64,
        now: NaiveDateTime,
    ) -> Result<Appointment> {
        let request = form.validate(customer_id, now)?;
        let booked = self.create(&request).await?;
        info!(
            "✓ Booked appointment {} with provider {}",
            booked.id, booked.service_provider_id
        );
        Ok(booked)
    }

    /// Replace an appointment's details. Cancelled appointments are refused
    /// by the backend.
    ///
    /// On success the caller must refresh the associated list view.
    pub async fn update(&self, id: i64, request: &AppointmentRequest) -> Result<Appointment> {
        self.api.put(format!("/appointments/{}", id), request).await
    }

    /// Validate an edited form and save it over appointment `id`.
    ///
    /// The form is checked before anything is sent, then the current record
    /// is loaded and only PENDING appointments are updated.
    ///
    /// On success the caller must refresh the associated list view.
    ///
    /// # Errors
    /// - `Error::Validation`: the form is invalid or less than 24 hours ahead
    ///   of `now` (no request issued), or the appointment is no longer pending
    /// - any fetch or update error
    pub async fn edit(
        &self,
        id: i64,
        form: &AppointmentForm,
        customer_id: i64,
        now: NaiveDateTime,
    ) -> Result<Appointment> {
        let request = form.validate(customer_id, now)?;

        let current = self.get(id).await?;
        if !current.is_editable() {
            return Err(Error::Validation(format!(
                "Only pending appointments can be edited; this one is {}",
                current.status.display_name().to_lowercase()
            )));
        }

        let updated = self.update(id, &request).await?;
        info!("✓ Rescheduled appointment {} to {}", id, updated.appointment_date_time);
        Ok(updated)
    }

    /// On success the caller must refresh the associated list view.
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.api.delete(format!("/appointments/{}", id)).await
    }

    pub async fn list_by_customer(&self, customer_id: i64) -> Result<Vec<Appointment>> {
        self.api
            .get(format!("/appointments/customer/{}", customer_id))
            .await
    }

    pub async fn list_by_provider(&self, provider_id: i64) -> Result<Vec<Appointment>> {
        self.api
            .get(format!("/appointments/provider/{}", provider_id))
            .await
    }

    /// Future, non-cancelled appointments of a customer, as judged by the
    /// backend's clock.
    pub async fn list_upcoming(&self, customer_id: i64) -> Result<Vec<Appointment>> {
        self.api
            .get(format!("/appointments/customer/{}/upcoming", customer_id))
            .await
    }

    pub async fn list_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>> {
        self.api
            .get(format!("/appointments/status/{}", segment(status.as_str())))
            .await
    }

    /// Free-text search over names, service type and notes.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Appointment>> {
        self.api
            .call(ApiRequest::new(Method::Get, "/appointments/search").with_query("keyword", keyword))
            .await
    }

    pub async fn statistics(&self) -> Result<AppointmentStats> {
        self.api.get("/appointments/stats").await
    }

    /// Move an appointment along the status graph.
    ///
    /// This is the only way statuses change: confirm, decline, complete and
    /// cancel all go through here. Illegal transitions are refused by the
    /// backend with its own message.
    ///
    /// On success the caller must refresh the associated list view.
    pub async fn set_status(&self, id: i64, status: AppointmentStatus) -> Result<Appointment> {
        debug!("Appointment {} -> {}", id, status);
        self.api
            .call(
                ApiRequest::new(Method::Patch, format!("/appointments/{}/status", id))
                    .with_query("status", status.as_str()),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, NewUser, Role, ServiceType};
    use crate::transport::InMemoryTransport;

    fn at(value: &str) -> NaiveDateTime {
        value.parse().expect("valid datetime")
    }

    struct Fixture {
        backend: InMemoryTransport,
        client: AppointmentClient<InMemoryTransport>,
        customer: Identity,
        provider: Identity,
    }

    fn fixture() -> Fixture {
        let backend = InMemoryTransport::new();
        backend.set_clock(Some(at("2026-10-19T08:00:00")));
        let seed = |name: &str, email: &str, role| {
            backend
                .seed_user(NewUser {
                    name: name.into(),
                    email: email.into(),
                    password: "secret1".into(),
                    phone: None,
                    role,
                })
                .expect("seed")
        };
        let customer = seed("Carol", "carol@example.com", Role::Customer);
        let provider = seed("Dr. Pat", "pat@example.com", Role::ServiceProvider);
        let api = ApiClient::new(backend.clone());
        api.set_credentials(backend.issue_token(customer.id));
        Fixture {
            client: AppointmentClient::new(api),
            backend,
            customer,
            provider,
        }
    }

    fn request(f: &Fixture, when: &str) -> AppointmentRequest {
        AppointmentRequest {
            customer_id: f.customer.id,
            service_provider_id: f.provider.id,
            service_type: ServiceType::Dentist,
            appointment_date_time: at(when),
            notes: Some("Wisdom tooth".into()),
        }
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let f = fixture();
        let apt = f
            .client
            .create(&request(&f, "2026-10-21T10:00:00"))
            .await
            .expect("create");
        assert_eq!(apt.status, AppointmentStatus::Pending);
        assert_eq!(apt.customer_name, "Carol");
        assert_eq!(f.client.get(apt.id).await.expect("get"), apt);
    }

    #[tokio::test]
    async fn test_set_status_then_refetch() {
        let f = fixture();
        let apt = f
            .client
            .create(&request(&f, "2026-10-21T10:00:00"))
            .await
            .expect("create");

        f.client
            .set_status(apt.id, AppointmentStatus::Confirmed)
            .await
            .expect("confirm");

        let mine = f.client.list_by_customer(f.customer.id).await.expect("list");
        assert_eq!(mine[0].status, AppointmentStatus::Confirmed);
        let confirmed = f
            .client
            .list_by_status(AppointmentStatus::Confirmed)
            .await
            .expect("by status");
        assert_eq!(confirmed.len(), 1);
    }

    #[tokio::test]
    async fn test_illegal_transition_surfaces_message() {
        let f = fixture();
        let apt = f
            .client
            .create(&request(&f, "2026-10-21T10:00:00"))
            .await
            .expect("create");
        f.client
            .set_status(apt.id, AppointmentStatus::Cancelled)
            .await
            .expect("cancel");

        let err = f
            .client
            .update(apt.id, &request(&f, "2026-10-22T10:00:00"))
            .await
            .expect_err("cancelled is final");
        assert_eq!(
            err.user_message(),
            format!("Cannot modify cancelled appointment (ID: {})", apt.id)
        );
    }

    #[tokio::test]
    async fn test_search_and_statistics() {
        let f = fixture();
        f.client
            .create(&request(&f, "2026-10-21T10:00:00"))
            .await
            .expect("create");
        f.client
            .create(&request(&f, "2026-10-21T11:00:00"))
            .await
            .expect("create");

        assert_eq!(f.client.search("wisdom").await.expect("search").len(), 2);
        assert!(f.client.search("cardio").await.expect("search").is_empty());

        let stats = f.client.statistics().await.expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 2);
        assert_eq!(
            f.client.list_upcoming(f.customer.id).await.expect("upcoming").len(),
            2
        );
    }

    #[tokio::test]
    async fn test_book_rejects_short_lead_time_offline() {
        let f = fixture();
        let now = at("2026-10-19T08:00:00");
        let form = AppointmentForm {
            service_provider_id: Some(f.provider.id),
            service_type: ServiceType::Dentist,
            appointment_date_time: Some(at("2026-10-20T07:59:00")),
            notes: String::new(),
        };

        let err = f
            .client
            .book(&form, f.customer.id, now)
            .await
            .expect_err("too soon");
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(f.backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_reschedules_pending() {
        let f = fixture();
        let apt = f
            .client
            .create(&request(&f, "2026-10-21T10:00:00"))
            .await
            .expect("create");

        let mut form = AppointmentForm::from(&apt);
        form.appointment_date_time = Some(at("2026-10-23T14:00:00"));
        let updated = f
            .client
            .edit(apt.id, &form, f.customer.id, at("2026-10-19T08:00:00"))
            .await
            .expect("edit");
        assert_eq!(updated.appointment_date_time, at("2026-10-23T14:00:00"));
        assert_eq!(updated.notes.as_deref(), Some("Wisdom tooth"));
    }

    #[tokio::test]
    async fn test_edit_under_lead_time_issues_no_request() {
        let f = fixture();
        let apt = f
            .client
            .create(&request(&f, "2026-10-21T10:00:00"))
            .await
            .expect("create");
        let before = f.backend.request_count();

        let mut form = AppointmentForm::from(&apt);
        form.appointment_date_time = Some(at("2026-10-20T06:00:00"));
        let err = f
            .client
            .edit(apt.id, &form, f.customer.id, at("2026-10-19T08:00:00"))
            .await
            .expect_err("too soon");

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(f.backend.request_count(), before);
        assert_eq!(
            f.client.get(apt.id).await.expect("get").appointment_date_time,
            at("2026-10-21T10:00:00")
        );
    }

    #[tokio::test]
    async fn test_edit_refuses_confirmed() {
        let f = fixture();
        let apt = f
            .client
            .create(&request(&f, "2026-10-21T10:00:00"))
            .await
            .expect("create");
        f.client
            .set_status(apt.id, AppointmentStatus::Confirmed)
            .await
            .expect("confirm");

        let err = f
            .client
            .edit(apt.id, &AppointmentForm::from(&apt), f.customer.id, at("2026-10-19T08:00:00"))
            .await
            .expect_err("confirmed is not editable");
        assert!(matches!(err, Error::Validation(_)));
    }
}
