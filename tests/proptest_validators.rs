//! Property-based tests for the form validators and local aggregation.
//!
//! # Properties Tested
//!
//! 1. **Email**: `local@domain.tld` shapes pass, anything without `@` or with
//!    whitespace fails
//! 2. **Phone**: exactly 10-15 digits pass
//! 3. **Password / Name**: length bounds, counted in characters
//! 4. **Lead time**: a booking form passes iff it is at least 24h ahead
//! 5. **Stats**: counts always sum to the total

use appointment_client::validators::{
    validate_email, validate_name, validate_password, validate_phone, AppointmentForm,
};
use appointment_client::{Appointment, AppointmentStats, AppointmentStatus, ServiceType};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("valid datetime")
}

fn status_strategy() -> impl Strategy<Value = AppointmentStatus> {
    prop::sample::select(AppointmentStatus::ALL.to_vec())
}

fn appointment(id: i64, status: AppointmentStatus) -> Appointment {
    Appointment {
        id,
        customer_id: 1,
        customer_name: "Carol".to_string(),
        service_provider_id: 2,
        service_provider_name: "Dr. Pat".to_string(),
        service_type: ServiceType::Doctor,
        service_type_display_name: ServiceType::Doctor.display_name().to_string(),
        appointment_date_time: now(),
        notes: None,
        status,
    }
}

proptest! {
    #[test]
    fn prop_well_formed_emails_pass(
        local in "[a-z0-9._+-]{1,20}",
        domain in "[a-z0-9-]{1,20}",
        tld in "[a-z]{2,6}",
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        prop_assert!(validate_email(&email));
    }

    #[test]
    fn prop_emails_without_at_fail(s in "[a-z0-9.]{0,40}") {
        prop_assert!(!validate_email(&s));
    }

    #[test]
    fn prop_emails_with_whitespace_fail(
        local in "[a-z]{1,10}",
        domain in "[a-z]{1,10}",
        ws in prop::sample::select(vec![" ", "\t", "\n"]),
    ) {
        let email = format!("{}{}x@{}.com", local, ws, domain);
        prop_assert!(!validate_email(&email));
    }

    #[test]
    fn prop_phone_length_bounds(digits in "[0-9]{1,25}") {
        let expected = (10..=15).contains(&digits.len());
        prop_assert_eq!(validate_phone(&digits), expected);
    }

    #[test]
    fn prop_phone_rejects_non_digits(
        digits in "[0-9]{10,14}",
        junk in prop::sample::select(vec!["-", " ", "+", "a", "("]),
    ) {
        let phone = format!("{}{}", junk, digits);
        prop_assert!(!validate_phone(&phone));
    }

    #[test]
    fn prop_password_length(password in "\\PC{0,30}") {
        prop_assert_eq!(validate_password(&password), password.chars().count() >= 6);
    }

    #[test]
    fn prop_name_length(name in "\\PC{0,120}") {
        let len = name.chars().count();
        prop_assert_eq!(validate_name(&name), (2..=100).contains(&len));
    }

    #[test]
    fn prop_lead_time_boundary(offset_minutes in -600i64..4000) {
        let form = AppointmentForm {
            service_provider_id: Some(2),
            service_type: ServiceType::Barber,
            appointment_date_time: Some(now() + Duration::minutes(offset_minutes)),
            notes: String::new(),
        };
        let accepted = form.validate(1, now()).is_ok();
        prop_assert_eq!(accepted, offset_minutes >= 24 * 60);
    }

    #[test]
    fn prop_stats_sum_to_total(statuses in prop::collection::vec(status_strategy(), 0..50)) {
        let list: Vec<Appointment> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| appointment(i as i64, *status))
            .collect();
        let stats = AppointmentStats::from_appointments(&list);

        prop_assert_eq!(stats.total, list.len() as u64);
        prop_assert_eq!(
            stats.pending + stats.confirmed + stats.completed + stats.cancelled,
            stats.total
        );
    }
}
