use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode as AxumStatus,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use aurora_api::config::ApiConfig;
use aurora_auth::{JwtClaims, Role};
use aurora_core::UserId;

const JWT_SECRET: &str = "test-secret";

const CATALOG_CSV: &str = "\
Product,Targets,Suitable for,When to apply,Price,Stock
Salicylic Acid Cleanser,\"Breakouts & blemishes, Excess oil\",Oily skin,AM,12.99,10
Ceramide Barrier Cream,\"Dry skin, Redness\",\"Dry skin, Sensitive skin\",PM,24.50,5
Vitamin C Serum,\"Dull skin, Uneven skin tone\",All skin types,AM,30,3
Mineral Sunscreen,Sun protection,All skin types,AM,15,8
";

// -------------------------
// Mock classifier
// -------------------------

#[derive(Clone)]
enum Mode {
    Respond(Value),
    Status(u16),
    Hang,
    Garbage,
}

async fn predict(State(mode): State<Mode>, mut multipart: Multipart) -> Response {
    let mut saw_file = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            saw_file = !field.bytes().await.unwrap_or_default().is_empty();
        }
    }
    if !saw_file {
        return (AxumStatus::BAD_REQUEST, "no file part").into_response();
    }

    match mode {
        Mode::Respond(body) => Json(body).into_response(),
        Mode::Status(code) => AxumStatus::from_u16(code).unwrap().into_response(),
        Mode::Hang => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            AxumStatus::OK.into_response()
        }
        Mode::Garbage => (AxumStatus::OK, "<html>not json</html>").into_response(),
    }
}

struct MockClassifier {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl MockClassifier {
    async fn spawn(mode: Mode) -> Self {
        let app = Router::new().route("/predict", post(predict)).with_state(mode);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base_url, handle }
    }
}

impl Drop for MockClassifier {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// -------------------------
// API under test
// -------------------------

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    _classifier: Option<MockClassifier>,
}

impl TestServer {
    async fn spawn(classifier: Option<MockClassifier>, tweak: impl FnOnce(&mut ApiConfig)) -> Self {
        let catalog = std::env::temp_dir().join(format!("aurora-catalog-{}.csv", UserId::new()));
        std::fs::write(&catalog, CATALOG_CSV).unwrap();

        let mut config = ApiConfig {
            jwt_secret: JWT_SECRET.to_string(),
            catalog_csv: Some(catalog.clone()),
            classifier_timeout: Duration::from_secs(5),
            ..ApiConfig::default()
        };
        if let Some(c) = &classifier {
            config.classifier_url = c.base_url.clone();
        }
        tweak(&mut config);

        // Build app (same router as prod), but bind to an ephemeral port.
        let app = aurora_api::app::build_app(&config).await.expect("app should build");
        let _ = std::fs::remove_file(&catalog);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handle,
            _classifier: classifier,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user_id: UserId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn user_token() -> String {
    mint_jwt(UserId::new(), vec![Role::USER])
}

fn admin_token() -> String {
    mint_jwt(UserId::new(), vec![Role::ADMIN])
}

fn image_form(bytes: Vec<u8>) -> Form {
    Form::new().part(
        "image",
        Part::bytes(bytes).file_name("face.jpg").mime_str("image/jpeg").unwrap(),
    )
}

async fn upload(client: &reqwest::Client, srv: &TestServer, token: &str) -> String {
    let res = client
        .post(srv.url("/images"))
        .bearer_auth(token)
        .multipart(image_form(vec![0xff, 0xd8, 0xff, 0xe0, 1, 2, 3]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn analyses_count(client: &reqwest::Client, srv: &TestServer, token: &str) -> usize {
    let res = client.get(srv.url("/analyses")).bearer_auth(token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    body["items"].as_array().unwrap().len()
}

// -------------------------
// Tests
// -------------------------

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn(None, |_| {}).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn(None, |_| {}).await;
    let user_id = UserId::new();
    let token = mint_jwt(user_id, vec![Role::ADMIN]);

    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());
    assert_eq!(body["is_admin"], true);
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
}

#[tokio::test]
async fn catalog_is_public_but_writes_need_admin() {
    let srv = TestServer::spawn(None, |_| {}).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/products")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["name"], "Salicylic Acid Cleanser");
    assert_eq!(items[0]["price"], "12.99");

    let draft = json!({
        "name": "Azelaic Gel",
        "brand": "Aurora Beauty",
        "category": "Treatment",
        "price": "19.00",
        "stock": 2,
        "targets": "Redness, Irritation"
    });

    let res = client.post(srv.url("/products")).json(&draft).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/products"))
        .bearer_auth(user_token())
        .json(&draft)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin = admin_token();
    let res = client
        .post(srv.url("/products"))
        .bearer_auth(&admin)
        .json(&draft)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["id"], 5);

    let res = client
        .patch(srv.url("/products/5"))
        .bearer_auth(&admin)
        .json(&json!({ "stock": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["in_stock"], false);

    let res = client
        .post(srv.url("/products"))
        .bearer_auth(&admin)
        .json(&json!({ "name": " ", "brand": "B", "category": "C" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .delete(srv.url("/products/5"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(srv.url("/products/5")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn triage_endpoint_applies_policy() {
    let srv = TestServer::spawn(None, |_| {}).await;
    let client = reqwest::Client::new();
    let token = user_token();

    let res = client
        .post(srv.url("/triage"))
        .bearer_auth(&token)
        .json(&json!({ "condition": "Carcinoma", "confidence": 0.85 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["category"], "refer");
    assert!(body["message"].as_str().unwrap().contains("dermatologist"));
    // Carcinoma falls back to the default tags, matched by the serum.
    assert_eq!(body["recommendations"][0]["name"], "Vitamin C Serum");

    let res = client
        .post(srv.url("/triage"))
        .bearer_auth(&token)
        .json(&json!({ "condition": "Rosacea", "confidence": 0.95, "top_k": -1 }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["category"], "cautious_products");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 0);

    let res = client
        .post(srv.url("/triage"))
        .bearer_auth(&token)
        .json(&json!({ "condition": "Acne", "confidence": 1.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn malformed_requests_get_json_400() {
    let srv = TestServer::spawn(None, |_| {}).await;
    let client = reqwest::Client::new();
    let token = user_token();

    let res = client
        .post(srv.url("/triage"))
        .bearer_auth(&token)
        .json(&json!({ "condition": "Acne" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("confidence"));

    let res = client
        .post(srv.url("/triage"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");

    let res = client
        .put(srv.url("/profile"))
        .bearer_auth(&token)
        .json(&json!({ "age": "thirty" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");

    let image_id = upload(&client, &srv, &token).await;
    let res = client
        .post(srv.url(&format!("/images/{image_id}/analyze?top_k=abc")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");
    assert_eq!(analyses_count(&client, &srv, &token).await, 0);
}

#[tokio::test]
async fn upload_then_analyze_persists_history() {
    let classifier = MockClassifier::spawn(Mode::Respond(json!({
        "condition": "Acne",
        "confidence": 0.995,
        "alternative_predictions": [{ "condition": "Oily Skin", "confidence": 0.003 }],
        "recommendation_type": "products"
    })))
    .await;
    let srv = TestServer::spawn(Some(classifier), |_| {}).await;
    let client = reqwest::Client::new();
    let token = user_token();

    let image_id = upload(&client, &srv, &token).await;

    let res = client
        .post(srv.url(&format!("/images/{image_id}/analyze")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let analysis: Value = res.json().await.unwrap();
    assert_eq!(analysis["condition"], "Acne");
    assert_eq!(analysis["category"], "products");
    assert!(analysis["message"].is_null());
    assert_eq!(analysis["alternatives"][0]["label"], "Oily Skin");
    let recs = analysis["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["name"], "Salicylic Acid Cleanser");

    let id = analysis["id"].as_str().unwrap();
    let res = client
        .get(srv.url(&format!("/analyses/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(analyses_count(&client, &srv, &token).await, 1);

    // Another user sees neither the image nor the analysis.
    let stranger = user_token();
    let res = client
        .post(srv.url(&format!("/images/{image_id}/analyze")))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client
        .get(srv.url(&format!("/analyses/{id}")))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn classifier_timeout_is_504_and_persists_nothing() {
    let classifier = MockClassifier::spawn(Mode::Hang).await;
    let srv = TestServer::spawn(Some(classifier), |c| {
        c.classifier_timeout = Duration::from_millis(300);
    })
    .await;
    let client = reqwest::Client::new();
    let token = user_token();

    let image_id = upload(&client, &srv, &token).await;
    let res = client
        .post(srv.url(&format!("/images/{image_id}/analyze")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "classifier_timeout");
    assert_eq!(analyses_count(&client, &srv, &token).await, 0);
}

#[tokio::test]
async fn classifier_failures_map_to_gateway_errors() {
    let cases = [
        (Mode::Status(500), StatusCode::SERVICE_UNAVAILABLE),
        (Mode::Garbage, StatusCode::BAD_GATEWAY),
        (
            Mode::Respond(json!({ "condition": "Sunburn", "confidence": 0.7 })),
            StatusCode::BAD_GATEWAY,
        ),
    ];

    for (mode, expected) in cases {
        let classifier = MockClassifier::spawn(mode).await;
        let srv = TestServer::spawn(Some(classifier), |_| {}).await;
        let client = reqwest::Client::new();
        let token = user_token();

        let image_id = upload(&client, &srv, &token).await;
        let res = client
            .post(srv.url(&format!("/images/{image_id}/analyze")))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), expected);
        assert_eq!(analyses_count(&client, &srv, &token).await, 0);
    }
}

#[tokio::test]
async fn unreachable_classifier_is_503() {
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}", dead.local_addr().unwrap());
    drop(dead);

    let srv = TestServer::spawn(None, |c| c.classifier_url = dead_url).await;
    let client = reqwest::Client::new();
    let token = user_token();

    let image_id = upload(&client, &srv, &token).await;
    let res = client
        .post(srv.url(&format!("/images/{image_id}/analyze")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn uploads_are_validated() {
    let srv = TestServer::spawn(None, |c| c.max_upload_bytes = 1024).await;
    let client = reqwest::Client::new();
    let token = user_token();

    let res = client
        .post(srv.url("/images"))
        .bearer_auth(&token)
        .multipart(image_form(vec![7u8; 4096]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let form = Form::new().part("image", Part::bytes(vec![1, 2, 3]).file_name("notes.txt"));
    let res = client
        .post(srv.url("/images"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let form = Form::new().part("photo", Part::bytes(vec![1, 2, 3]).file_name("face.png"));
    let res = client
        .post(srv.url("/images"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(srv.url("/images")).bearer_auth(&token).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn appointment_lifecycle_is_enforced() {
    let srv = TestServer::spawn(None, |_| {}).await;
    let client = reqwest::Client::new();
    let user = user_token();
    let admin = admin_token();

    let res = client
        .post(srv.url("/appointments"))
        .bearer_auth(&user)
        .json(&json!({
            "appointment_date": (Utc::now() + ChronoDuration::days(2)).to_rfc3339(),
            "message": "Persistent redness"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let appt: Value = res.json().await.unwrap();
    assert_eq!(appt["status"], "pending");
    let id = appt["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url(&format!("/appointments/{id}/confirm")))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(srv.url(&format!("/appointments/{id}/cancel")))
        .bearer_auth(user_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url(&format!("/appointments/{id}/confirm")))
        .bearer_auth(&admin)
        .json(&json!({ "assigned_dermatologist": "Dr. Okafor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let appt: Value = res.json().await.unwrap();
    assert_eq!(appt["status"], "confirmed");
    assert_eq!(appt["assigned_dermatologist"], "Dr. Okafor");

    let res = client
        .post(srv.url(&format!("/appointments/{id}/complete")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url(&format!("/appointments/{id}/cancel")))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client.get(srv.url("/appointments")).bearer_auth(&admin).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let res = client
        .post(srv.url("/appointments"))
        .bearer_auth(&user)
        .json(&json!({
            "appointment_date": (Utc::now() - ChronoDuration::days(1)).to_rfc3339(),
            "message": "Yesterday"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_terminal_moves_have_one_winner() {
    let srv = TestServer::spawn(None, |_| {}).await;
    let client = reqwest::Client::new();
    let user = user_token();
    let admin = admin_token();

    for _ in 0..20 {
        let res = client
            .post(srv.url("/appointments"))
            .bearer_auth(&user)
            .json(&json!({
                "appointment_date": (Utc::now() + ChronoDuration::days(2)).to_rfc3339(),
                "message": "Follow-up"
            }))
            .send()
            .await
            .unwrap();
        let appt: Value = res.json().await.unwrap();
        let id = appt["id"].as_str().unwrap().to_string();

        let res = client
            .post(srv.url(&format!("/appointments/{id}/confirm")))
            .bearer_auth(&admin)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let complete = client
            .post(srv.url(&format!("/appointments/{id}/complete")))
            .bearer_auth(&admin)
            .send();
        let cancel = client
            .post(srv.url(&format!("/appointments/{id}/cancel")))
            .bearer_auth(&user)
            .send();
        let (a, b) = tokio::join!(complete, cancel);
        let statuses = [a.unwrap().status(), b.unwrap().status()];

        let ok = statuses.iter().filter(|s| **s == StatusCode::OK).count();
        let conflict = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
        assert_eq!((ok, conflict), (1, 1), "{statuses:?}");
    }
}

#[tokio::test]
async fn admin_user_listing_shows_last_condition() {
    let srv = TestServer::spawn(None, |_| {}).await;
    let client = reqwest::Client::new();
    let user_id = UserId::new();
    let user = mint_jwt(user_id, vec![Role::USER]);

    let res = client
        .put(srv.url("/profile"))
        .bearer_auth(&user)
        .json(&json!({ "age": 29, "skin_type": "Oily", "concerns": ["Acne"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .put(srv.url("/profile"))
        .bearer_auth(&user)
        .json(&json!({ "age": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(srv.url("/admin/users")).bearer_auth(&user).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/admin/users"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["user_id"].as_str().unwrap(), user_id.to_string());
    assert_eq!(items[0]["profile"]["skin_type"], "Oily");
    assert_eq!(items[0]["last_condition"], "No analysis yet");
}
