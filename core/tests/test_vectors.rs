//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use hoebiyoung_core::api::member::MemberBlacklistInfo;
use hoebiyoung_core::api::rental::RentalQrToken;
use hoebiyoung_core::{
    normalize_rental_qr_payload, ApiError, CouncilClient, HttpMethod, HttpRequest, HttpResponse, RentalErrorCode,
    RentalQrPayload,
};

const BASE_URL: &str = "http://localhost:3000";

fn client() -> CouncilClient {
    CouncilClient::new(BASE_URL)
}

fn load(raw: &str) -> Vec<serde_json::Value> {
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated(case: &serde_json::Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(sim["status"].as_u64().unwrap() as u16, sim["body"].as_str().unwrap())
}

fn assert_request(name: &str, req: &HttpRequest, expected: &serde_json::Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");
    if let Some(expected_body) = expected.get("body") {
        let body: serde_json::Value = serde_json::from_str(req.json_body().unwrap()).unwrap();
        assert_eq!(&body, expected_body, "{name}: body");
    }
}

// ---------------------------------------------------------------------------
// QR payload
// ---------------------------------------------------------------------------

#[test]
fn qr_payload_test_vectors() {
    for case in load(include_str!("../../test-vectors/qr_payload.json")) {
        let name = case["name"].as_str().unwrap();
        let payload = normalize_rental_qr_payload(case["input"].as_str().unwrap());
        let expected: RentalQrPayload = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(payload, expected, "{name}");
    }
}

// ---------------------------------------------------------------------------
// Rental QR generation
// ---------------------------------------------------------------------------

#[test]
fn rental_qr_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/rental_qr.json")) {
        let name = case["name"].as_str().unwrap();
        let category_id = case["input"]["itemCategoryId"].as_i64().unwrap();

        let req = c.build_generate_rental_qr_token(category_id);
        assert_request(name, &req, &case["expected_request"]);

        let parsed = c.parse_generate_rental_qr_token(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            let err = parsed.unwrap_err();
            match expected_error["kind"].as_str().unwrap() {
                "not_found" => assert_eq!(err, ApiError::NotFound, "{name}"),
                "envelope" => assert_eq!(
                    err.user_message(),
                    expected_error["message"].as_str().unwrap(),
                    "{name}"
                ),
                other => panic!("unknown error kind: {other}"),
            }
        } else {
            let expected: RentalQrToken = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(parsed.unwrap(), expected, "{name}");
        }
    }
}

// ---------------------------------------------------------------------------
// Return by QR
// ---------------------------------------------------------------------------

#[test]
fn return_by_qr_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/return_by_qr.json")) {
        let name = case["name"].as_str().unwrap();
        let req = c.build_return_item_by_qr(case["input"].as_str().unwrap()).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let expected = &case["expected_result"];
        match c.parse_return_item_by_qr(simulated(&case)) {
            Ok(()) => assert_eq!(expected["ok"], true, "{name}: unexpected success"),
            Err(err) => {
                assert_eq!(expected["ok"], false, "{name}: unexpected failure {err}");
                let code = expected["code"].as_str().and_then(RentalErrorCode::parse);
                assert_eq!(err.code, code, "{name}: code");
                assert_eq!(err.status, expected["status"].as_u64().map(|s| s as u16), "{name}: status");
                assert_eq!(err.message, expected["message"].as_str().unwrap(), "{name}: message");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Blacklist
// ---------------------------------------------------------------------------

#[test]
fn blacklist_test_vectors() {
    let c = client();
    assert_eq!(c.build_member_blacklist().url, format!("{BASE_URL}/members/blacklist/me"));
    for case in load(include_str!("../../test-vectors/blacklist.json")) {
        let name = case["name"].as_str().unwrap();
        let info = c.parse_member_blacklist(simulated(&case)).unwrap();
        let expected: MemberBlacklistInfo = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(info, expected, "{name}");
    }
}
