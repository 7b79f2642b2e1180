use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<String> {
    json_request("GET", uri, token, "")
}

async fn call(app: &Router, request: Request<String>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let body = format!(r#"{{"email":"{email}","password":"{password}"}}"#);
    let (status, json) = call(app, json_request("POST", "/api/auth/login", None, &body)).await;
    assert_eq!(status, StatusCode::OK);
    json["result"]["accessToken"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn login_returns_tokens_and_role() {
    let app = app();
    let (status, json) = call(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            r#"{"email":"council@hby.test","password":"password2"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["isSuccess"], true);
    assert_eq!(json["result"]["memberId"], 2);
    assert_eq!(json["result"]["role"], "COUNCIL");
    assert!(json["result"]["accessToken"].as_str().unwrap().starts_with("at-"));
}

#[tokio::test]
async fn wrong_password_is_401_envelope() {
    let app = app();
    let (status, json) = call(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            r#"{"email":"student@hby.test","password":"nope"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["isSuccess"], false);
    assert!(json["result"].is_null());
}

#[tokio::test]
async fn malformed_login_body_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/auth/login", None, r#"{"email":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = app();
    let token = login(&app, "student@hby.test", "password1").await;

    let (status, _) = call(&app, json_request("POST", "/api/auth/logout", Some(&token), "")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, get("/members/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_up_then_login() {
    let app = app();
    let body = r#"{"email":"new@hby.test","password":"pw","passwordConfirm":"pw","studentId":"20245555","studentName":"정신입","phoneNumber":"010"}"#;
    let (status, json) = call(&app, json_request("POST", "/api/auth/sign-in", None, body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["result"]["memberId"].as_i64().unwrap() > 0);

    login(&app, "new@hby.test", "pw").await;
}

#[tokio::test]
async fn verify_code_rejects_wrong_code() {
    let app = app();
    let (_, sent) = call(&app, json_request("POST", "/api/auth/send-code", None, r#"{"email":"a@b"}"#)).await;
    assert_eq!(sent["result"]["code"], "123456");

    let (status, _) = call(
        &app,
        json_request("POST", "/api/auth/verify-code", None, r#"{"email":"a@b","code":"000000"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- members ---

#[tokio::test]
async fn blacklist_is_null_unless_blacklisted() {
    let app = app();
    let student = login(&app, "student@hby.test", "password1").await;
    let (_, json) = call(&app, get("/members/blacklist/me", Some(&student))).await;
    assert!(json["result"].is_null());

    let banned = login(&app, "banned@hby.test", "password4").await;
    let (_, json) = call(&app, get("/members/blacklist/me", Some(&banned))).await;
    assert_eq!(json["result"]["blacklisted"], true);
    assert_eq!(json["result"]["blacklistUntil"], "2025-12-31");
}

#[tokio::test]
async fn missing_bearer_is_401() {
    let (status, json) = call(&app(), get("/members/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["isSuccess"], false);
}

// --- rentals ---

#[tokio::test]
async fn rent_and_return_by_qr() {
    let app = app();
    let student = login(&app, "student@hby.test", "password1").await;
    let council = login(&app, "council@hby.test", "password2").await;

    let (_, json) = call(&app, get("/rentals/1/qr-tokens", Some(&student))).await;
    assert_eq!(json["result"]["studentFeePaid"], true);
    let qr = json["result"]["qrToken"].as_str().unwrap().to_string();

    let body = format!(r#"{{"qrToken":"{qr}"}}"#);
    let (status, json) = call(&app, json_request("POST", "/admin/rentals/qr", Some(&council), &body)).await;
    assert_eq!(status, StatusCode::OK);
    let rental_id = json["result"]["rentalHistoryId"].as_i64().unwrap();

    let (_, json) = call(&app, get("/rentals/me", Some(&student))).await;
    assert_eq!(json["result"]["items"][0]["rentalStatus"], "RENTED");
    assert_eq!(json["result"]["items"][0]["itemName"], "우산");

    let (_, json) = call(&app, get(&format!("/rentals/{rental_id}/return/qr-tokens"), Some(&student))).await;
    let return_qr = json["result"]["qrToken"].as_str().unwrap().to_string();
    let body = format!(r#"{{"qrToken":"{return_qr}"}}"#);
    let (status, _) = call(&app, json_request("POST", "/admin/rentals/return", Some(&council), &body)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = call(&app, json_request("POST", "/admin/rentals/return", Some(&council), &body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_RETURN");
}

#[tokio::test]
async fn unpaid_member_rent_is_rejected_with_code() {
    let app = app();
    let unpaid = login(&app, "unpaid@hby.test", "password3").await;
    let council = login(&app, "council@hby.test", "password2").await;

    let (_, json) = call(&app, get("/rentals/2/qr-tokens", Some(&unpaid))).await;
    assert_eq!(json["result"]["studentFeePaid"], false);
    let qr = json["result"]["qrToken"].as_str().unwrap().to_string();

    let body = format!(r#"{{"qrToken":"{qr}"}}"#);
    let (status, json) = call(&app, json_request("POST", "/admin/rentals/qr", Some(&council), &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MEMBER_NOT_PAID");
}

#[tokio::test]
async fn admin_routes_reject_students() {
    let app = app();
    let student = login(&app, "student@hby.test", "password1").await;
    let (status, _) = call(&app, get("/admin/rentals", Some(&student))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// --- council ---

#[tokio::test]
async fn council_add_and_remove() {
    let app = app();
    let council = login(&app, "council@hby.test", "password2").await;

    let (_, json) = call(&app, get("/admin/students/20201234", Some(&council))).await;
    assert_eq!(json["result"]["memberId"], 1);
    let (status, _) = call(&app, get("/admin/students/99999999", Some(&council))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, json_request("POST", "/admin/council/members/1", Some(&council), "")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, json) = call(&app, get("/admin/council/members", Some(&council))).await;
    assert_eq!(json["result"]["studentCouncilMembers"].as_array().unwrap().len(), 2);

    let (status, _) = call(&app, json_request("DELETE", "/admin/council/members/1", Some(&council), "")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, json_request("DELETE", "/admin/council/members/1", Some(&council), "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- items, events, lockers ---

#[tokio::test]
async fn item_categories_listing() {
    let app = app();
    let student = login(&app, "student@hby.test", "password1").await;
    let (_, json) = call(&app, get("/items", Some(&student))).await;
    let infos = json["result"]["itemCategoryInfos"].as_array().unwrap();
    assert_eq!(infos.len(), 3);
    assert_eq!(infos[2]["availableCount"], 0);
}

#[tokio::test]
async fn events_filter_by_range() {
    let app = app();
    let (_, json) = call(&app, get("/events?from=2025-03-01&to=2025-03-31", None)).await;
    assert_eq!(json["result"].as_array().unwrap().len(), 1);
    let (_, json) = call(&app, get("/events?from=2025-04-01", None)).await;
    assert!(json["result"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn lockers_mark_the_callers_own() {
    let app = app();
    let student = login(&app, "student@hby.test", "password1").await;
    let (_, json) = call(&app, get("/lockers?lockerSection=A", Some(&student))).await;
    let lockers = json["result"].as_array().unwrap();
    assert_eq!(lockers.len(), 4);
    assert_eq!(lockers[0]["lockerStatus"], "MY");
    assert_eq!(lockers[1]["lockerStatus"], "AVAILABLE");
}
