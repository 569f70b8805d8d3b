//! Route table.
//!
//! Every `/api` route passes the admission gate; all of them except login
//! additionally require a session token. `/health` is public.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{auth, checkin, checkout, employees, field_tasks, health, reports},
    middleware::{admission::admission_middleware, session::session_middleware},
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    // Routes that need a signed-in employee
    let session_routes = Router::new()
        .route("/api/auth/change-password", put(auth::change_password))
        // Check-in
        .route("/api/checkin", post(checkin::check_in))
        .route("/api/checkin/morning-checkin", get(checkin::morning_check_in))
        .route("/api/checkin/{employee_code}", get(checkin::history))
        .route(
            "/api/checkin/{employee_code}/{scan_date}",
            get(checkin::events_on_date),
        )
        // Check-out
        .route("/api/checkout", post(checkout::check_out))
        .route("/api/checkout/{employee_code}", get(checkout::history))
        // Roster
        .route("/api/employees", get(employees::list_employees))
        .route("/api/employees/device-check", get(employees::device_check))
        .route("/api/employees/{pin}", get(employees::get_employee))
        // Reports
        .route("/api/leave/employee/{id}", get(reports::employee_leave))
        .route("/api/monthly-recap", get(reports::monthly_recap))
        .route("/api/monitor/devices", get(reports::monitor_devices))
        // Field tasks
        .route(
            "/api/field-tasks",
            get(field_tasks::list_tasks).post(field_tasks::submit_task),
        )
        .route("/api/field-tasks/{id}", put(field_tasks::edit_task))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    // Admission runs first for login and for every session route
    let api_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .merge(session_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            admission_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{net::SocketAddr, sync::Arc, time::Duration};

    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode},
        response::Response,
    };
    use chrono::NaiveDate;
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::{
        clock::ManualClock,
        models::api_client::ApiClient,
        services::{
            attendance_service::AttendanceService,
            auth_service::{AuthService, LOGIN_BLOCKED},
            brute_force::BruteForceGuard,
            counter_store::MemoryCounterStore,
            monitor_service::DeviceMonitor,
            rate_limiter::RateLimiter,
            session_token::TokenIssuer,
        },
        testing::{
            MemoryAccountStore, MemoryCredentialStore, MemoryEmployeeDirectory, MemoryLedger,
            test_account, test_client, test_employee,
        },
    };

    const API_KEY: &str = "tenant-key-1";
    const EMAIL: &str = "employee@example.id";
    const PASSWORD: &str = "s3cret-pass";

    struct Harness {
        app: Router,
        clock: Arc<ManualClock>,
        ledger: Arc<MemoryLedger>,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 8).unwrap()
    }

    fn harness_with(client: ApiClient) -> Harness {
        let clock = Arc::new(ManualClock::at(today(), 8, 45, 0));
        let counters = Arc::new(MemoryCounterStore::new(clock.clone()));

        let credentials = Arc::new(MemoryCredentialStore::default());
        credentials.insert(client);

        let accounts = Arc::new(MemoryAccountStore::default());
        accounts.insert(test_account(1, 1813, EMAIL, PASSWORD));

        let employees = Arc::new(MemoryEmployeeDirectory::default());
        employees.insert(test_employee(11, 1813, Some("device-1813")));
        employees.insert(test_employee(12, 1900, None));

        let ledger = Arc::new(MemoryLedger::default());

        // Never connected: these tests only reach in-memory stores.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/attendance_test")
            .unwrap();

        let state = AppState {
            pool,
            clock: clock.clone(),
            credentials,
            rate_limiter: Arc::new(RateLimiter::new(counters.clone(), clock.clone(), 10)),
            auth: Arc::new(AuthService::new(
                accounts,
                BruteForceGuard::new(counters),
                TokenIssuer::new("test-secret", "attendance-api", "attendance-clients"),
            )),
            attendance: Arc::new(AttendanceService::new(
                employees,
                ledger.clone(),
                clock.clone(),
            )),
            monitor: DeviceMonitor::new(4, Duration::from_millis(100)).unwrap(),
        };

        Harness {
            app: build_router(state),
            clock,
            ledger,
        }
    }

    fn harness() -> Harness {
        harness_with(test_client(API_KEY))
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Api-Key", API_KEY);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let mut request = builder.body(body).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 5], 40000))));
        request
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn login_body(identifier: &str, secret: &str) -> Value {
        json!({ "identifier": identifier, "secret": secret })
    }

    async fn login(app: &Router) -> String {
        let response = send(
            app,
            request("POST", "/api/auth/login", None, Some(login_body(EMAIL, PASSWORD))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn missing_api_key_is_rejected() {
        let h = harness();
        let request = Request::builder()
            .uri("/api/employees")
            .body(Body::empty())
            .unwrap();

        let response = send(&h.app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "API key is missing");
    }

    #[tokio::test]
    async fn unknown_api_key_is_rejected() {
        let h = harness();
        let request = Request::builder()
            .uri("/api/employees")
            .header("X-Api-Key", "not-a-key")
            .body(Body::empty())
            .unwrap();

        let response = send(&h.app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn disallowed_origin_is_forbidden() {
        let mut client = test_client(API_KEY);
        client.allowed_origins = Some(r#"["https://hr.example.id"]"#.to_string());
        let h = harness_with(client);

        let mut req = request("GET", "/api/employees", None, None);
        req.headers_mut()
            .insert("Origin", "https://evil.example".parse().unwrap());

        let response = send(&h.app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn source_outside_ip_allowlist_is_forbidden() {
        let mut client = test_client(API_KEY);
        client.allowed_ips = Some("10.0.1.0/24".to_string());
        let h = harness_with(client);

        let response = send(&h.app, request("GET", "/api/employees", None, None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn client_quota_rejects_the_request_over_the_limit() {
        let mut client = test_client(API_KEY);
        client.rate_limit = 2;
        let h = harness_with(client);

        // Admitted, then refused by the session layer.
        for _ in 0..2 {
            let response = send(&h.app, request("GET", "/api/employees", None, None)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        let response = send(&h.app, request("GET", "/api/employees", None, None)).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        // Next minute bucket starts fresh.
        h.clock.advance(chrono::TimeDelta::minutes(1));
        let response = send(&h.app, request("GET", "/api/employees", None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_route_has_its_own_limit() {
        let h = harness();

        for i in 0..10 {
            let body = login_body(&format!("nobody{i}@example.id"), "wrong");
            let response = send(&h.app, request("POST", "/api/auth/login", None, Some(body))).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        let body = login_body("nobody-else@example.id", "wrong");
        let response = send(&h.app, request("POST", "/api/auth/login", None, Some(body))).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn fifth_failure_blocks_even_correct_credentials() {
        let h = harness();

        for _ in 0..5 {
            let body = login_body(EMAIL, "wrong-password");
            let response = send(&h.app, request("POST", "/api/auth/login", None, Some(body))).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        let body = login_body(EMAIL, PASSWORD);
        let response = send(&h.app, request("POST", "/api/auth/login", None, Some(body))).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_json(response).await["message"], LOGIN_BLOCKED);
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_session() {
        let h = harness();

        let response = send(&h.app, request("GET", "/api/employees", None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&h.app, request("GET", "/api/employees", Some("garbage"), None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn check_in_then_check_out_flow() {
        let h = harness();
        let token = login(&h.app).await;
        let check_in = json!({ "pin": 1813, "device_serial": "A8N5230560263" });

        let mut req = request("POST", "/api/checkin", Some(&token), Some(check_in.clone()));
        req.headers_mut()
            .insert("X-Device-Id", "device-1813".parse().unwrap());
        let response = send(&h.app, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["result"], 1);
        assert_eq!(body["data"]["late"], false);

        h.clock.set(today(), 8, 50, 0);
        let response = send(&h.app, request("POST", "/api/checkin", Some(&token), Some(check_in))).await;
        let body = body_json(response).await;
        assert_eq!(body["result"], 7);
        assert_eq!(h.ledger.record_count(), 1);

        let uri = "/api/checkin/morning-checkin?pin=1813&date=2026-01-08";
        let body = body_json(send(&h.app, request("GET", uri, Some(&token), None)).await).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["checkin_time"], "2026-01-08 08:45:00");

        h.clock.set(today(), 16, 30, 0);
        let response = send(&h.app, request("POST", "/api/checkout", Some(&token), None)).await;
        let body = body_json(response).await;
        assert_eq!(body["result"], 1);
        assert_eq!(body["message"], "Check-out updated");

        let response = send(&h.app, request("POST", "/api/checkout", Some(&token), None)).await;
        assert_eq!(body_json(response).await["result"], 7);

        let record = h.ledger.record(11, today()).unwrap();
        assert_eq!(record.worked_minutes, 465);

        let response = send(&h.app, request("GET", "/api/checkin/1813", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn check_in_outside_hours_returns_code_without_mutation() {
        let h = harness();
        let token = login(&h.app).await;
        h.clock.set(today(), 10, 30, 0);

        let body = json!({ "pin": 1813 });
        let response = send(&h.app, request("POST", "/api/checkin", Some(&token), Some(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["result"], 2);
        assert_eq!(h.ledger.commits(), 0);
    }

    #[tokio::test]
    async fn check_in_for_another_pin_is_forbidden() {
        let h = harness();
        let token = login(&h.app).await;

        let body = json!({ "pin": 1900 });
        let response = send(&h.app, request("POST", "/api/checkin", Some(&token), Some(body))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn device_mismatch_is_a_business_rejection() {
        let h = harness();
        let token = login(&h.app).await;

        let mut req = request("POST", "/api/checkin", Some(&token), Some(json!({ "pin": 1813 })));
        req.headers_mut()
            .insert("X-Device-Id", "someone-elses-phone".parse().unwrap());
        let response = send(&h.app, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["result"], 10);
    }

    #[tokio::test]
    async fn unknown_shift_history_is_not_found_with_result_zero() {
        let h = harness();
        let token = login(&h.app).await;

        let response = send(&h.app, request("GET", "/api/checkin/1813", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["result"], 0);

        let response =
            send(&h.app, request("GET", "/api/checkin/1813/2026-01-08", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn regular_employee_reads_only_own_profile() {
        let h = harness();
        let token = login(&h.app).await;

        let response = send(&h.app, request("GET", "/api/employees/1900", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn report_parameters_are_validated() {
        let h = harness();
        let token = login(&h.app).await;

        for uri in [
            "/api/leave/employee/0",
            "/api/monitor/devices?tenant_id=0",
            "/api/monthly-recap?start=2026-02-01&end=2026-01-01",
        ] {
            let response = send(&h.app, request("GET", uri, Some(&token), None)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn field_task_outside_window_echoes_server_time() {
        let h = harness();
        let token = login(&h.app).await;
        h.clock.set(today(), 10, 30, 0);

        let body = json!({
            "destination": "Regional office",
            "photo": {
                "file_name": "visit.jpg",
                "file_extension": ".jpg",
                "file_size": 2048,
                "file_path": "/uploads/field-tasks/visit.jpg"
            }
        });
        let response = send(&h.app, request("POST", "/api/field-tasks", Some(&token), Some(body))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["server_time"], "2026-01-08 10:30:00");
    }
}
