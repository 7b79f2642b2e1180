//! In-memory stand-in for the student-council backend.
//!
//! Every response uses the `{ isSuccess, code, message, result }` envelope.
//! Sessions are opaque bearer tokens handed out by `/api/auth/login`.

pub mod error;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

pub use error::Error;
use store::{Db, Member, QrGrant, Rental, Store, EMAIL_CODE, RENTAL_DUE_AT, RENTAL_STARTED_AT};

type ApiResult = Result<Json<Value>, Error>;

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/send-code", post(send_code))
        .route("/api/auth/verify-code", post(verify_code))
        .route("/api/auth/tmp-password", post(tmp_password))
        .route("/members/me", get(my_profile))
        .route("/members/blacklist/me", get(my_blacklist))
        .route("/members/fee/qr-tokens", get(fee_qr_token))
        .route("/admin/fee/qr-tokens", post(verify_fee))
        .route("/items", get(list_categories))
        .route("/admin/items", get(admin_list_categories).patch(increase_quantity))
        .route("/admin/items/{category_id}", get(admin_items_by_category))
        .route("/admin/item-categories", post(create_category))
        .route("/rentals/{category_id}/qr-tokens", get(rental_qr_token))
        .route("/rentals/{rental_id}/return/qr-tokens", get(return_qr_token))
        .route("/rentals/me", get(my_rentals))
        .route("/rentals/me/history", get(my_rental_history))
        .route("/admin/rentals", get(admin_rental_histories))
        .route("/admin/rentals/qr", post(rent_by_qr))
        .route("/admin/rentals/return", post(return_by_qr))
        .route("/admin/rentals/{rental_id}/return", post(manual_return))
        .route("/admin/council/members", get(council_members))
        .route(
            "/admin/council/members/{member_id}",
            post(add_council_member).delete(remove_council_member),
        )
        .route("/admin/students/{student_id}", get(lookup_student))
        .route("/chat", post(chat))
        .route("/events", get(list_events))
        .route("/events/{event_id}", get(get_event))
        .route("/admin/events/{event_id}", patch(update_event).put(update_event).delete(delete_event))
        .route("/lockers", get(list_lockers))
        .route("/lockers/me", get(my_locker))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn ok(result: Value) -> Json<Value> {
    Json(json!({
        "isSuccess": true,
        "code": "COMMON200",
        "message": "성공입니다.",
        "result": result,
    }))
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

// --- auth ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInBody {
    email: String,
    password: String,
    password_confirm: String,
    student_id: String,
    student_name: String,
}

async fn sign_in(State(db): State<Db>, Json(body): Json<SignInBody>) -> ApiResult {
    if body.password != body.password_confirm {
        return Err(Error::BadRequest("비밀번호가 일치하지 않습니다.".to_string()));
    }
    let mut store = db.write().await;
    if store.members.values().any(|m| m.email == body.email) {
        return Err(Error::BadRequest("이미 가입된 이메일입니다.".to_string()));
    }
    let id = store.next_id();
    store.members.insert(
        id,
        Member {
            id,
            email: body.email,
            password: body.password,
            student_id: body.student_id,
            name: body.student_name,
            role: "STUDENT".to_string(),
            fee_paid: false,
            blacklist_until: None,
        },
    );
    tracing::info!(member_id = id, "member signed up");
    Ok(ok(json!({ "memberId": id })))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(db): State<Db>, Json(body): Json<LoginBody>) -> ApiResult {
    let (member, token) = db.write().await.login(&body.email, &body.password)?;
    Ok(ok(json!({
        "memberId": member.id,
        "role": member.role,
        "studentId": member.student_id,
        "memberStatus": "ACTIVE",
        "accessToken": token,
        "refreshToken": format!("rt-{}", member.id),
        "expiresIn": 3600,
        "refreshExpiresIn": 1_209_600,
    })))
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let token = bearer(&headers).ok_or(Error::NotLoggedIn)?;
    let mut store = db.write().await;
    store.sessions.remove(token).ok_or(Error::NotLoggedIn)?;
    Ok(ok(Value::Null))
}

#[derive(Deserialize)]
struct EmailBody {
    email: String,
}

async fn send_code(Json(body): Json<EmailBody>) -> ApiResult {
    tracing::debug!(email = %body.email, "verification code sent");
    Ok(ok(json!({ "code": EMAIL_CODE })))
}

#[derive(Deserialize)]
struct VerifyCodeBody {
    email: String,
    code: String,
}

async fn verify_code(Json(body): Json<VerifyCodeBody>) -> ApiResult {
    if body.code != EMAIL_CODE {
        return Err(Error::BadRequest("인증번호가 일치하지 않습니다.".to_string()));
    }
    Ok(ok(json!({ "email": body.email, "message": "인증이 완료되었습니다." })))
}

async fn tmp_password(State(db): State<Db>, Query(query): Query<EmailBody>) -> ApiResult {
    let store = db.read().await;
    if !store.members.values().any(|m| m.email == query.email) {
        return Err(Error::NotFound("가입되지 않은 이메일입니다."));
    }
    Ok(ok(json!({ "email": query.email, "message": "임시 비밀번호를 발송했습니다." })))
}

// --- members ---

async fn my_profile(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    let member = store.member_by_token(bearer(&headers))?;
    Ok(ok(json!({
        "memberId": member.id,
        "email": member.email,
        "studentId": member.student_id,
        "name": member.name,
        "role": member.role,
        "memberStatus": "ACTIVE",
    })))
}

async fn my_blacklist(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    let member = store.member_by_token(bearer(&headers))?;
    let result = match &member.blacklist_until {
        Some(until) => json!({ "blacklisted": true, "blacklistUntil": until }),
        None => Value::Null,
    };
    Ok(ok(result))
}

async fn fee_qr_token(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let mut store = db.write().await;
    let member = store.member_by_token(bearer(&headers))?.clone();
    let token = store.issue_grant(QrGrant::Fee { member_id: member.id });
    Ok(ok(json!({ "qrToken": token, "feePaid": member.fee_paid })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QrTokenBody {
    qr_token: String,
}

async fn verify_fee(State(db): State<Db>, headers: HeaderMap, Json(body): Json<QrTokenBody>) -> ApiResult {
    let store = db.read().await;
    store.council_by_token(bearer(&headers))?;
    let Some(QrGrant::Fee { member_id }) = store.grants.get(&body.qr_token).copied() else {
        return Err(Error::BadRequest("유효하지 않은 QR 토큰입니다.".to_string()));
    };
    let approved = store.members.get(&member_id).is_some_and(|m| m.fee_paid);
    Ok(ok(json!({ "approved": approved })))
}

// --- items ---

fn category_infos(store: &Store) -> Value {
    let infos: Vec<Value> = store
        .categories
        .values()
        .map(|c| {
            json!({
                "itemCategoryId": c.id,
                "itemCategoryName": c.name,
                "totalCount": c.total,
                "availableCount": c.available,
            })
        })
        .collect();
    json!({ "itemCategoryInfos": infos })
}

async fn list_categories(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    store.member_by_token(bearer(&headers))?;
    Ok(ok(category_infos(&store)))
}

async fn admin_list_categories(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    store.council_by_token(bearer(&headers))?;
    Ok(ok(category_infos(&store)))
}

async fn admin_items_by_category(State(db): State<Db>, headers: HeaderMap, Path(category_id): Path<i64>) -> ApiResult {
    let store = db.read().await;
    store.council_by_token(bearer(&headers))?;
    let category = store
        .categories
        .get(&category_id)
        .ok_or(Error::NotFound("물품 종류가 없습니다."))?;
    let rented = category.total - category.available;
    let items: Vec<Value> = (1..=category.total)
        .map(|n| {
            json!({
                "ItemId": category.id * 100 + n,
                "rented": n <= rented,
                "categoryName": category.name,
            })
        })
        .collect();
    Ok(ok(json!({ "items": items })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncreaseQuantityBody {
    category_id: i64,
}

async fn increase_quantity(State(db): State<Db>, headers: HeaderMap, Json(body): Json<IncreaseQuantityBody>) -> ApiResult {
    let mut store = db.write().await;
    store.council_by_token(bearer(&headers))?;
    let category = store
        .categories
        .get_mut(&body.category_id)
        .ok_or(Error::NotFound("물품 종류가 없습니다."))?;
    category.total += 1;
    category.available += 1;
    Ok(ok(Value::Null))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewCategoryBody {
    category_name: String,
}

async fn create_category(State(db): State<Db>, headers: HeaderMap, Json(body): Json<NewCategoryBody>) -> ApiResult {
    let mut store = db.write().await;
    store.council_by_token(bearer(&headers))?;
    let id = store.next_id();
    store.categories.insert(
        id,
        store::Category {
            id,
            name: body.category_name,
            total: 0,
            available: 0,
        },
    );
    Ok(ok(json!({ "categoryId": id })))
}

// --- rentals ---

fn rental_json(store: &Store, rental: &Rental) -> Value {
    let item_name = store.categories.get(&rental.category_id).map(|c| c.name.as_str());
    let status = if rental.returned_at.is_some() { "RETURNED" } else { "RENTED" };
    json!({
        "rentalHistoryId": rental.id,
        "itemCategoryId": rental.category_id,
        "itemName": item_name,
        "rentalStartedAt": RENTAL_STARTED_AT,
        "expectedReturnAt": RENTAL_DUE_AT,
        "returnedAt": rental.returned_at,
        "rentalStatus": status,
    })
}

async fn rental_qr_token(State(db): State<Db>, headers: HeaderMap, Path(category_id): Path<i64>) -> ApiResult {
    let mut store = db.write().await;
    let member = store.member_by_token(bearer(&headers))?.clone();
    if !store.categories.contains_key(&category_id) {
        return Err(Error::rental("ITEM_CATEGORY_NOT_FOUND"));
    }
    let token = store.issue_grant(QrGrant::Rent {
        member_id: member.id,
        category_id,
    });
    Ok(ok(json!({ "qrToken": token, "studentFeePaid": member.fee_paid })))
}

async fn return_qr_token(State(db): State<Db>, headers: HeaderMap, Path(rental_id): Path<i64>) -> ApiResult {
    let mut store = db.write().await;
    let member_id = store.member_by_token(bearer(&headers))?.id;
    let owned = store
        .rentals
        .get(&rental_id)
        .is_some_and(|r| r.member_id == member_id);
    if !owned {
        return Err(Error::NotFound("대여 이력이 없습니다."));
    }
    let token = store.issue_grant(QrGrant::Return { rental_id });
    Ok(ok(json!({ "qrToken": token })))
}

async fn my_rentals(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    let member = store.member_by_token(bearer(&headers))?;
    let items: Vec<Value> = store
        .rentals
        .values()
        .filter(|r| r.member_id == member.id && r.returned_at.is_none())
        .map(|r| rental_json(&store, r))
        .collect();
    Ok(ok(json!({
        "expectedBlacklistUntil": member.blacklist_until,
        "items": items,
    })))
}

async fn my_rental_history(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    let member_id = store.member_by_token(bearer(&headers))?.id;
    let items: Vec<Value> = store
        .rentals
        .values()
        .filter(|r| r.member_id == member_id)
        .map(|r| rental_json(&store, r))
        .collect();
    Ok(ok(json!({ "items": items })))
}

async fn admin_rental_histories(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    store.council_by_token(bearer(&headers))?;
    let items: Vec<Value> = store
        .rentals
        .values()
        .map(|r| {
            let mut entry = rental_json(&store, r);
            if let (Some(member), Value::Object(map)) = (store.members.get(&r.member_id), &mut entry) {
                map.insert("memberName".to_string(), json!(member.name));
                map.insert("memberStudentId".to_string(), json!(member.student_id));
            }
            entry
        })
        .collect();
    Ok(ok(json!({ "items": items })))
}

async fn rent_by_qr(State(db): State<Db>, headers: HeaderMap, Json(body): Json<QrTokenBody>) -> ApiResult {
    let mut store = db.write().await;
    store.council_by_token(bearer(&headers))?;
    let rental_id = store.rent(&body.qr_token)?;
    Ok(ok(json!({ "rentalHistoryId": rental_id })))
}

async fn return_by_qr(State(db): State<Db>, headers: HeaderMap, Json(body): Json<QrTokenBody>) -> ApiResult {
    let mut store = db.write().await;
    store.council_by_token(bearer(&headers))?;
    store.return_by_token(&body.qr_token)?;
    Ok(ok(Value::Null))
}

async fn manual_return(State(db): State<Db>, headers: HeaderMap, Path(rental_id): Path<i64>) -> ApiResult {
    let mut store = db.write().await;
    store.council_by_token(bearer(&headers))?;
    store.return_rental(rental_id)?;
    Ok(ok(Value::Null))
}

// --- council ---

async fn council_members(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    store.council_by_token(bearer(&headers))?;
    let members: Vec<Value> = store
        .council
        .iter()
        .filter_map(|id| store.members.get(id))
        .map(|m| json!({ "memberId": m.id, "studentId": m.student_id, "studentName": m.name }))
        .collect();
    Ok(ok(json!({ "studentCouncilMembers": members })))
}

async fn lookup_student(State(db): State<Db>, headers: HeaderMap, Path(student_id): Path<String>) -> ApiResult {
    let store = db.read().await;
    store.council_by_token(bearer(&headers))?;
    let member = store
        .members
        .values()
        .find(|m| m.student_id == student_id)
        .ok_or(Error::NotFound("학생을 찾을 수 없습니다."))?;
    Ok(ok(json!({
        "memberId": member.id,
        "studentId": member.student_id,
        "studentName": member.name,
    })))
}

async fn add_council_member(State(db): State<Db>, headers: HeaderMap, Path(member_id): Path<i64>) -> ApiResult {
    let mut store = db.write().await;
    store.council_by_token(bearer(&headers))?;
    let member = store
        .members
        .get_mut(&member_id)
        .ok_or(Error::NotFound("회원을 찾을 수 없습니다."))?;
    member.role = "COUNCIL".to_string();
    store.council.insert(member_id);
    Ok(ok(Value::Null))
}

async fn remove_council_member(State(db): State<Db>, headers: HeaderMap, Path(member_id): Path<i64>) -> ApiResult {
    let mut store = db.write().await;
    store.council_by_token(bearer(&headers))?;
    if !store.council.remove(&member_id) {
        return Err(Error::NotFound("학생회 구성원이 아닙니다."));
    }
    if let Some(member) = store.members.get_mut(&member_id) {
        member.role = "STUDENT".to_string();
    }
    Ok(ok(Value::Null))
}

// --- chat ---

#[derive(Deserialize)]
struct ChatBody {
    content: String,
}

async fn chat(State(db): State<Db>, headers: HeaderMap, Json(body): Json<ChatBody>) -> ApiResult {
    db.read().await.member_by_token(bearer(&headers))?;
    Ok(ok(json!({ "content": format!("\"{}\"에 대한 안내입니다.", body.content) })))
}

// --- events ---

#[derive(Deserialize)]
struct EventRangeQuery {
    from: Option<String>,
    to: Option<String>,
}

async fn list_events(State(db): State<Db>, Query(range): Query<EventRangeQuery>) -> ApiResult {
    let store = db.read().await;
    let events: Vec<Value> = store
        .events
        .iter()
        .filter(|e| range.from.as_deref().map_or(true, |from| e.end.as_str() >= from))
        .filter(|e| range.to.as_deref().map_or(true, |to| e.start.as_str() <= to))
        .map(|e| {
            json!({
                "eventId": e.id,
                "title": e.title,
                "eventCreatedAt": "2025-02-20T09:00:00",
                "eventStartDate": e.start,
                "eventEndDate": e.end,
            })
        })
        .collect();
    Ok(ok(json!(events)))
}

async fn get_event(State(db): State<Db>, Path(event_id): Path<i64>) -> ApiResult {
    let store = db.read().await;
    let event = store
        .events
        .iter()
        .find(|e| e.id == event_id)
        .ok_or(Error::NotFound("행사를 찾을 수 없습니다."))?;
    Ok(ok(json!({
        "eventId": event.id,
        "title": event.title,
        "content": event.content,
        "eventStartDate": event.start,
        "eventEndDate": event.end,
        "eventCreatedAt": "2025-02-20T09:00:00",
        "imageUrls": [],
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventUpdateBody {
    title: String,
    content: String,
    event_start_date: Option<String>,
    event_end_date: Option<String>,
}

async fn update_event(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(event_id): Path<i64>,
    Json(body): Json<EventUpdateBody>,
) -> ApiResult {
    let mut store = db.write().await;
    store.council_by_token(bearer(&headers))?;
    let event = store
        .events
        .iter_mut()
        .find(|e| e.id == event_id)
        .ok_or(Error::NotFound("행사를 찾을 수 없습니다."))?;
    event.title = body.title;
    event.content = body.content;
    if let Some(start) = body.event_start_date {
        event.start = start;
    }
    if let Some(end) = body.event_end_date {
        event.end = end;
    }
    Ok(ok(json!({ "eventId": event_id })))
}

async fn delete_event(State(db): State<Db>, headers: HeaderMap, Path(event_id): Path<i64>) -> ApiResult {
    let mut store = db.write().await;
    store.council_by_token(bearer(&headers))?;
    let before = store.events.len();
    store.events.retain(|e| e.id != event_id);
    if store.events.len() == before {
        return Err(Error::NotFound("행사를 찾을 수 없습니다."));
    }
    Ok(ok(Value::Null))
}

// --- lockers ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockerQuery {
    locker_section: String,
}

async fn list_lockers(State(db): State<Db>, headers: HeaderMap, Query(query): Query<LockerQuery>) -> ApiResult {
    let store = db.read().await;
    let me = store.member_by_token(bearer(&headers))?.id;
    let lockers: Vec<Value> = store
        .lockers
        .iter()
        .filter(|l| query.locker_section.starts_with(l.section))
        .map(|l| {
            let status = match l.holder {
                _ if l.broken => "BROKEN",
                Some(holder) if holder == me => "MY",
                Some(_) => "IN_USE",
                None => "AVAILABLE",
            };
            json!({
                "lockerId": l.id(),
                "lockerNumber": l.number,
                "lockerSection": l.section.to_string(),
                "lockerStatus": status,
            })
        })
        .collect();
    Ok(ok(json!(lockers)))
}

async fn my_locker(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    let me = store.member_by_token(bearer(&headers))?.id;
    let result = match store.lockers.iter().find(|l| l.holder == Some(me)) {
        Some(l) => json!({
            "lockerId": l.id(),
            "lockerNumber": format!("{}-{}", l.section, l.number),
            "lockerSection": l.section.to_string(),
            "lockerRentalStatus": "RENTING",
            "assignedAt": "2025-03-02T09:00:00",
        }),
        None => json!({ "lockerRentalStatus": "NO_RENTAL" }),
    };
    Ok(ok(result))
}
