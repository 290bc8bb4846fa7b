//! HTTP transport tests against a local axum server.
//!
//! The server forwards every request to an in-memory backend, so these
//! tests exercise real HTTP encoding (paths, query strings, bearer headers,
//! JSON bodies and status codes) with the same backend rules as the other
//! integration tests.

use appointment_client::storage::InMemoryStorage;
use appointment_client::transport::{
    ApiRequest, HttpTransport, InMemoryTransport, Method, Transport,
};
use appointment_client::validators::AppointmentForm;
use appointment_client::{
    ApiClient, AppointmentClient, AppointmentStatus, AuthContext, ClientConfig, Error, NewUser,
    Role, ServiceType, SessionStore, UserClient,
};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::NaiveDateTime;
use std::time::Duration;

const NOW: &str = "2026-10-19T08:00:00";

fn at(value: &str) -> NaiveDateTime {
    value.parse().expect("valid datetime")
}

async fn forward(
    State(backend): State<InMemoryTransport>,
    method: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Response {
    let method = match method.as_str() {
        "GET" => Method::Get,
        "POST" => Method::Post,
        "PUT" => Method::Put,
        "PATCH" => Method::Patch,
        "DELETE" => Method::Delete,
        _ => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };

    let path = uri.path().strip_prefix("/api").unwrap_or(uri.path());
    let mut request = ApiRequest::new(method, path).with_bearer(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string),
    );
    request.query = query;
    if !body.is_empty() {
        match serde_json::from_slice(&body) {
            Ok(json) => request = request.with_body(json),
            Err(_) => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
        }
    }

    match backend.send(request).await {
        Ok(raw) => {
            let status = StatusCode::from_u16(raw.status).unwrap_or(StatusCode::OK);
            match raw.body {
                Some(body) => (status, Json(body)).into_response(),
                None => status.into_response(),
            }
        }
        Err(_) => (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response(),
    }
}

/// Start a server on an ephemeral port and return a config pointing at it.
async fn serve(backend: InMemoryTransport) -> ClientConfig {
    let app = Router::new().fallback(forward).with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    ClientConfig::default()
        .with_base_url(format!("http://{}/api/", addr))
        .with_timeout(Duration::from_secs(5))
}

fn seeded() -> InMemoryTransport {
    let _ = env_logger::builder().is_test(true).try_init();

    let backend = InMemoryTransport::new();
    backend.set_clock(Some(at(NOW)));
    for (name, email, role) in [
        ("Carol Customer", "carol@example.com", Role::Customer),
        ("Dr. Pat", "pat@clinic.test", Role::ServiceProvider),
    ] {
        backend
            .seed_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password: "secret1".to_string(),
                phone: None,
                role,
            })
            .expect("seed");
    }
    backend
}

#[tokio::test]
async fn test_http_lifecycle() {
    let backend = seeded();
    let config = serve(backend.clone()).await;

    let api = ApiClient::new(HttpTransport::new(&config).expect("transport"));
    assert!(api.transport().health_check().await.expect("health"));

    let ctx = AuthContext::init(SessionStore::from_config(
        api.clone(),
        InMemoryStorage::new(),
        &config,
    ));
    let me = ctx.login("carol@example.com", "secret1").await.expect("login");
    assert!(ctx.is_customer());

    let providers = UserClient::new(api.clone())
        .list_providers()
        .await
        .expect("providers");
    assert_eq!(providers.len(), 1);

    let appointments = AppointmentClient::new(api.clone());
    let form = AppointmentForm {
        service_provider_id: Some(providers[0].id),
        service_type: ServiceType::Therapist,
        appointment_date_time: Some(at("2026-10-25T15:00:00")),
        notes: "first visit & intake".to_string(),
    };
    let booked = appointments
        .book(&form, me.id, at(NOW))
        .await
        .expect("book");
    assert!(backend.last_bearer().is_some());

    appointments
        .set_status(booked.id, AppointmentStatus::Confirmed)
        .await
        .expect("confirm");
    let refetched = appointments.get(booked.id).await.expect("get");
    assert_eq!(refetched.status, AppointmentStatus::Confirmed);

    // query string and path segment encoding survive the round trip
    let found = appointments.search("visit & intake").await.expect("search");
    assert_eq!(found.len(), 1);
    let by_email = UserClient::new(api.clone())
        .find_by_email("pat@clinic.test")
        .await
        .expect("by email");
    assert_eq!(by_email.id, providers[0].id);

    let stats = appointments.statistics().await.expect("stats");
    assert_eq!(stats.confirmed, 1);
}

#[tokio::test]
async fn test_http_server_errors_and_not_found() {
    let backend = seeded();
    let config = serve(backend).await;
    let api = ApiClient::new(HttpTransport::new(&config).expect("transport"));
    let appointments = AppointmentClient::new(api.clone());

    let err = appointments.get(999).await.expect_err("missing");
    match err {
        Error::Server { status, message } => {
            assert_eq!(status, Some(404));
            assert_eq!(message, "Appointment not found with id: '999'");
        }
        other => panic!("unexpected error: {}", other),
    }

    let ctx = AuthContext::init(SessionStore::new(api, InMemoryStorage::new()));
    let err = ctx
        .login("carol@example.com", "nope-nope")
        .await
        .expect_err("wrong password");
    assert_eq!(err, Error::InvalidCredentials);
}

#[tokio::test]
async fn test_http_upstream_failure_is_transport() {
    let backend = seeded();
    let config = serve(backend.clone()).await;
    let api = ApiClient::new(HttpTransport::new(&config).expect("transport"));

    backend.set_offline(true);
    let err = AppointmentClient::new(api)
        .list()
        .await
        .expect_err("bad gateway");
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_unreachable_server() {
    let config = ClientConfig::default()
        .with_base_url("http://127.0.0.1:9/api")
        .with_timeout(Duration::from_secs(2));
    let transport = HttpTransport::new(&config).expect("transport");

    let err = transport
        .send(ApiRequest::new(Method::Get, "/appointments"))
        .await
        .expect_err("nothing listens on the discard port");
    assert!(err.is_transport());
}
