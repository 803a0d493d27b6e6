//! Integration tests for the HTTP client.
//!
//! Each test starts a small axum app on a random local port that plays the
//! portal backend, then drives a real `ApiClient` against it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use kura_protocol::{
    ApplicationFormRequest, ApplicationStatus, KuraFilter, KuraOrder, LoginRequest,
    PreferenceStatus, RecordId,
};
use kura_transport::{
    ApiClient, ClientConfig, CredentialProvider, LOGIN_PATH, NoCredentials, RecordingNavigator,
    StaticCredentials, TransportError,
};
use serde_json::{Value, json};

/// What the fake backend saw.
#[derive(Clone, Default)]
struct Seen {
    authorization: Arc<Mutex<Vec<Option<String>>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Seen {
    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.authorization.lock().unwrap().push(value);
    }
}

async fn profile(State(seen): State<Seen>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    seen.record_auth(&headers);
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer good") => (
            StatusCode::OK,
            Json(json!({"user": {"id": 1, "ad": "Ayşe", "role": "admin"}})),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Geçersiz token"})),
        ),
    }
}

async fn login(State(seen): State<Seen>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    seen.bodies.lock().unwrap().push(body.clone());
    if body["password"] == "123456" {
        (
            StatusCode::OK,
            Json(json!({"success": true, "token": "abc", "user": {"id": 7}})),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Giriş başarısız"})),
        )
    }
}

async fn kura_list(
    State(seen): State<Seen>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.queries.lock().unwrap().push(query);
    Json(json!({
        "success": true,
        "count": 1,
        "data": [{
            "_id": "k1",
            "ilce": "Merkez",
            "hizmet_puani": 812.5,
            "tercih_durumu": "beklemede"
        }]
    }))
}

async fn mark_read(Path(id): Path<String>) -> Json<Value> {
    Json(json!({"success": true, "message": format!("{id} okundu")}))
}

async fn apply_empty_position(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["pozisyon_id"] == "taken" {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Bu pozisyon artık boş değil"})),
        )
    } else {
        (StatusCode::OK, Json(json!({"success": true})))
    }
}

async fn preference(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"success": true, "message": body["tercih_durumu"]}))
}

async fn application_form(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    seen.record_auth(&headers);
    seen.bodies.lock().unwrap().push(body);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "PDF başarıyla oluşturuldu",
            "pdfPath": "/exports/basvuru-7-1.pdf"
        })),
    )
}

async fn applications() -> Json<Value> {
    Json(json!({
        "success": true,
        "applications": [
            {
                "_id": "a2",
                "status": "pending",
                "form_data": {"ad": "Ayşe"},
                "pdf_path": "/exports/basvuru-7-2.pdf"
            },
            {"_id": "a1", "status": "rejected"}
        ]
    }))
}

fn backend(seen: Seen) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/user/profile", get(profile))
        .route("/api/auth/login", post(login))
        .route("/api/kura/liste", get(kura_list))
        .route(
            "/api/kura/ilce-listesi",
            get(|| async { Json(json!({"ilceler": ["Merkez", "Yeşilyurt"]})) }),
        )
        .route(
            "/api/kura/siram",
            get(|| async { Json(json!({"success": false, "message": "Kayıt bulunamadı"})) }),
        )
        .route("/api/kura/tercih", post(preference))
        .route("/api/kura/bos-pozisyon-basvuru", post(apply_empty_position))
        .route("/api/user/bildirimler/{id}/okundu", put(mark_read))
        .route("/api/pdf/basvuru-formu", post(application_form))
        .route("/api/pdf/list", get(applications))
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "not json") }),
        )
        .with_state(seen)
}

/// Serves the fake backend and returns a config pointing at it.
async fn serve(seen: Seen) -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have an address");
    tokio::spawn(async move {
        axum::serve(listener, backend(seen))
            .await
            .expect("server failed");
    });
    ClientConfig::default().with_api_url(format!("http://{addr}"))
}

#[tokio::test]
async fn test_request_attaches_bearer_token() {
    let seen = Seen::default();
    let config = serve(seen.clone()).await;
    let navigator = Arc::new(RecordingNavigator::new());
    let client = ApiClient::new(&config, StaticCredentials::new("good"), Arc::clone(&navigator))
        .expect("client should build");

    let user = client.fetch_profile().await.expect("profile should load");

    assert_eq!(user.id, RecordId::Number(1));
    assert!(user.is_admin());
    assert_eq!(
        seen.authorization.lock().unwrap().clone(),
        vec![Some("Bearer good".to_string())]
    );
    assert!(navigator.visits().is_empty());
}

#[tokio::test]
async fn test_request_without_token_sends_no_header() {
    let seen = Seen::default();
    let config = serve(seen.clone()).await;
    let client = ApiClient::new(&config, NoCredentials, RecordingNavigator::new())
        .expect("client should build");

    let err = client.fetch_profile().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(seen.authorization.lock().unwrap().clone(), vec![None]);
}

#[tokio::test]
async fn test_unauthorized_revokes_and_navigates_once() {
    let seen = Seen::default();
    let config = serve(seen).await;
    let credentials = Arc::new(StaticCredentials::new("expired"));
    let navigator = Arc::new(RecordingNavigator::new());
    let client = ApiClient::new(&config, Arc::clone(&credentials), Arc::clone(&navigator))
        .expect("client should build");

    let err = client.fetch_profile().await.unwrap_err();

    assert!(matches!(err, TransportError::Status { status: 401, .. }));
    assert_eq!(err.server_message(), Some("Geçersiz token"));
    assert_eq!(credentials.bearer_token().await, None);
    assert_eq!(navigator.visits(), vec![LOGIN_PATH.to_string()]);
}

#[tokio::test]
async fn test_login_decodes_token_and_user() {
    let seen = Seen::default();
    let config = serve(seen.clone()).await;
    let client = ApiClient::new(&config, NoCredentials, RecordingNavigator::new())
        .expect("client should build");

    let response = client
        .login(&LoginRequest::new("12345678901", "123456"))
        .await
        .expect("login should succeed");

    assert_eq!(response.token, "abc");
    assert_eq!(response.user.id, RecordId::Number(7));
    assert_eq!(
        seen.bodies.lock().unwrap()[0],
        json!({"username": "12345678901", "password": "123456"})
    );
}

#[tokio::test]
async fn test_login_rejection_carries_server_message() {
    let config = serve(Seen::default()).await;
    let navigator = Arc::new(RecordingNavigator::new());
    let client = ApiClient::new(&config, NoCredentials, Arc::clone(&navigator))
        .expect("client should build");

    let err = client
        .login(&LoginRequest::new("12345678901", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.server_message(), Some("Giriş başarısız"));
    assert!(navigator.visits().is_empty());
}

#[tokio::test]
async fn test_error_without_json_body_has_no_message() {
    let config = serve(Seen::default()).await;
    let client = ApiClient::new(&config, NoCredentials, RecordingNavigator::new())
        .expect("client should build");

    let err = client.get::<Value>("/broken").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.server_message(), None);
}

#[tokio::test]
async fn test_kura_list_sends_filter_as_query() {
    let seen = Seen::default();
    let config = serve(seen.clone()).await;
    let client = ApiClient::new(&config, NoCredentials, RecordingNavigator::new())
        .expect("client should build");
    let filter = KuraFilter {
        district: Some("Merkez".into()),
        title: None,
        order: KuraOrder::RankNumber,
    };

    let rows = client.kura_list(&filter).await.expect("list should load");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id.as_deref(), Some("k1"));
    assert_eq!(rows[0].status, Some(PreferenceStatus::Pending));
    let query = seen.queries.lock().unwrap()[0].clone();
    assert_eq!(query.get("ilce").map(String::as_str), Some("Merkez"));
    assert_eq!(query.get("orderBy").map(String::as_str), Some("sira_no"));
    assert!(!query.contains_key("unvan"));
}

#[tokio::test]
async fn test_lottery_endpoints_round_trip() {
    let config = serve(Seen::default()).await;
    let client = ApiClient::new(&config, StaticCredentials::new("good"), RecordingNavigator::new())
        .expect("client should build");

    assert_eq!(client.districts().await.unwrap(), vec!["Merkez", "Yeşilyurt"]);
    assert_eq!(client.my_rank().await.unwrap(), None);

    let ack = client
        .submit_preference("k1", PreferenceStatus::Accept)
        .await
        .unwrap();
    assert!(ack.success);
    assert_eq!(ack.message.as_deref(), Some("kabul"));

    let ack = client.mark_notification_read(&RecordId::from(3_u64)).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("3 okundu"));
}

#[tokio::test]
async fn test_apply_empty_position_taken_reports_message() {
    let config = serve(Seen::default()).await;
    let client = ApiClient::new(&config, StaticCredentials::new("good"), RecordingNavigator::new())
        .expect("client should build");

    assert!(client.apply_empty_position("free").await.unwrap().success);

    let err = client.apply_empty_position("taken").await.unwrap_err();
    assert_eq!(err.server_message(), Some("Bu pozisyon artık boş değil"));
}

#[tokio::test]
async fn test_submit_application_form_posts_fields_with_token() {
    let seen = Seen::default();
    let config = serve(seen.clone()).await;
    let client = ApiClient::new(&config, StaticCredentials::new("good"), RecordingNavigator::new())
        .expect("client should build");
    let form = ApplicationFormRequest {
        first_name: "Ayşe".into(),
        last_name: "Yılmaz".into(),
        title: "Pratisyen".into(),
        preferred_districts: vec!["Merkez".into(), "Battalgazi".into()],
        note: Some("Acil".into()),
        ..ApplicationFormRequest::default()
    };

    let response = client.submit_application_form(&form).await.unwrap();

    assert!(response.success);
    assert_eq!(response.pdf_path.as_deref(), Some("/exports/basvuru-7-1.pdf"));
    assert_eq!(
        seen.authorization.lock().unwrap().clone(),
        vec![Some("Bearer good".to_string())]
    );
    assert_eq!(
        seen.bodies.lock().unwrap()[0],
        json!({
            "ad": "Ayşe",
            "soyad": "Yılmaz",
            "unvan": "Pratisyen",
            "tercih_ilceler": "Merkez, Battalgazi",
            "aciklama": "Acil"
        })
    );
}

#[tokio::test]
async fn test_my_applications_lists_newest_first() {
    let config = serve(Seen::default()).await;
    let client = ApiClient::new(&config, StaticCredentials::new("good"), RecordingNavigator::new())
        .expect("client should build");

    let applications = client.my_applications().await.unwrap();

    assert_eq!(applications.len(), 2);
    assert_eq!(applications[0].id, RecordId::from("a2"));
    assert_eq!(applications[0].status, ApplicationStatus::Pending);
    assert_eq!(applications[0].form.get("ad"), Some(&json!("Ayşe")));
    assert_eq!(applications[1].status, ApplicationStatus::Rejected);
    assert_eq!(applications[1].pdf_path, None);
}

#[tokio::test]
async fn test_health_reports_reachability() {
    let config = serve(Seen::default()).await;
    let client = ApiClient::new(&config, NoCredentials, RecordingNavigator::new())
        .expect("client should build");
    assert!(client.health().await);

    // Nothing listens on port 9 of the loopback interface.
    let dead = ClientConfig::default().with_api_url("http://127.0.0.1:9");
    let client = ApiClient::new(&dead, NoCredentials, RecordingNavigator::new())
        .expect("client should build");
    assert!(!client.health().await);
}

#[tokio::test]
async fn test_network_failure_is_not_a_status() {
    let dead = ClientConfig::default().with_api_url("http://127.0.0.1:9");
    let navigator = Arc::new(RecordingNavigator::new());
    let client = ApiClient::new(&dead, StaticCredentials::new("good"), Arc::clone(&navigator))
        .expect("client should build");

    let err = client.fetch_profile().await.unwrap_err();

    assert!(matches!(err, TransportError::Network(_)));
    assert_eq!(err.status(), None);
    assert!(navigator.visits().is_empty());
}
