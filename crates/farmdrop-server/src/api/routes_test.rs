use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use farmdrop_core::{default_farm_origin, Coordinate, DeliveryEngine};
use farmdrop_geocode::{GeocodeError, GeocodedAddress, Geocoder};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;

const KM_PER_DEGREE_LATITUDE: f64 = 111.194_926_644_558_73;

/// A point `km` due north of the farm.
fn north_of_farm(km: f64) -> (f64, f64) {
    let origin = default_farm_origin();
    (
        origin.latitude() + km / KM_PER_DEGREE_LATITUDE,
        origin.longitude(),
    )
}

struct FixedGeocoder(HashMap<&'static str, (f64, f64)>);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn forward(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        let (lat, lon) = self
            .0
            .get(address)
            .copied()
            .ok_or_else(|| GeocodeError::NoMatch(address.to_owned()))?;
        Ok(GeocodedAddress {
            coordinate: Coordinate::new(lat, lon)?,
            place_name: format!("{address}, California"),
            relevance: Some(1.0),
        })
    }
}

fn fixed_geocoder() -> Arc<dyn Geocoder> {
    let mut known = HashMap::new();
    known.insert("1 Nearby Lane", north_of_farm(5.0));
    known.insert("99 Far Away Road", north_of_farm(40.0));
    Arc::new(FixedGeocoder(known))
}

fn test_app(pool: sqlx::PgPool, geocoder: Option<Arc<dyn Geocoder>>) -> Router {
    let state = AppState {
        pool,
        engine: DeliveryEngine::default(),
        geocoder,
        sessions: SessionStore::new("test-secret", Duration::from_secs(3600), false),
    };
    build_app(state, default_rate_limit_state())
}

fn request(method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    json: Value,
}

async fn send(app: &Router, req: Request<Body>) -> Reply {
    let response = app.clone().oneshot(req).await.expect("response");
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToOwned::to_owned);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json parse")
    };
    Reply {
        status,
        cookie,
        json,
    }
}

/// Signs up `email` and returns the session cookie.
async fn signup(app: &Router, email: &str) -> String {
    let reply = send(
        app,
        request(
            Method::POST,
            "/auth/signup",
            Some(json!({ "name": "Test Customer", "email": email, "password": "hunter2hunter2" })),
            None,
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.json);
    reply.cookie.expect("session cookie")
}

async fn owner_session(app: &Router, pool: &sqlx::PgPool) -> String {
    let cookie = signup(app, "owner@farm.example").await;
    farmdrop_db::set_user_owner(pool, "owner@farm.example", true)
        .await
        .expect("promote owner");
    cookie
}

async fn seed_food(pool: &sqlx::PgPool, name: &str, slug: &str, cents: i64) {
    farmdrop_db::create_food(
        pool,
        &farmdrop_db::NewFood {
            name,
            slug,
            description: None,
            price: Decimal::new(cents, 2),
            unit: "each",
            image_url: None,
        },
    )
    .await
    .expect("seed food");
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal string")).expect("decimal parse")
}

// ---------------------------------------------------------------------------
// Envelope and plumbing
// ---------------------------------------------------------------------------

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("geocode_failed", StatusCode::BAD_REQUEST),
        ("forbidden", StatusCode::FORBIDDEN),
        ("delivery_unavailable", StatusCode::UNPROCESSABLE_ENTITY),
        ("geocoding_unavailable", StatusCode::SERVICE_UNAVAILABLE),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), expected, "{code}");
    }
}

#[test]
fn response_meta_omits_empty_alerts() {
    let json = serde_json::to_value(ResponseMeta::new("r".to_owned())).expect("serialize");
    assert!(json.get("alerts").is_none());

    let json = serde_json::to_value(ResponseMeta::with_alerts(
        "r".to_owned(),
        vec!["hello".to_owned()],
    ))
    .expect("serialize");
    assert_eq!(json["alerts"], json!(["hello"]));
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_database_and_geocoding(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let reply = send(&app, request(Method::GET, "/api/v1/health", None, None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["data"]["database"], "ok");
    assert_eq!(reply.json["data"]["geocoding"], "disabled");
    assert!(reply.json["meta"]["request_id"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_route_is_json_404(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let reply = send(&app, request(Method::GET, "/no/such/page", None, None)).await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json["error"]["code"], "not_found");
}

// ---------------------------------------------------------------------------
// Accounts and sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn signup_logs_in_and_profile_drains_welcome_alert(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let cookie = signup(&app, "Ada@Example.com").await;

    let first = send(&app, request(Method::GET, "/api/v1/profile", None, Some(&cookie))).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json["data"]["email"], "ada@example.com");
    assert_eq!(first.json["data"]["is_owner"], false);
    assert_eq!(first.json["meta"]["alerts"][0], "Welcome to the farm, Test Customer!");

    let second = send(&app, request(Method::GET, "/api/v1/profile", None, Some(&cookie))).await;
    assert!(second.json["meta"].get("alerts").is_none(), "alerts are one-shot");
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_signup_conflicts(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    signup(&app, "dup@example.com").await;

    let reply = send(
        &app,
        request(
            Method::POST,
            "/auth/signup",
            Some(json!({ "name": "Again", "email": "DUP@example.com", "password": "longenough" })),
            None,
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.json["error"]["code"], "conflict");
}

#[sqlx::test(migrations = "../../migrations")]
async fn login_checks_password(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    signup(&app, "login@example.com").await;

    let bad = send(
        &app,
        request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "login@example.com", "password": "wrong-password" })),
            None,
        ),
    )
    .await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
    assert!(bad.cookie.is_none());

    let unknown = send(
        &app,
        request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": "hunter2hunter2" })),
            None,
        ),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let good = send(
        &app,
        request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "login@example.com", "password": "hunter2hunter2" })),
            None,
        ),
    )
    .await;
    assert_eq!(good.status, StatusCode::OK);
    assert!(good.cookie.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn profile_requires_login(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let reply = send(&app, request(Method::GET, "/api/v1/profile", None, None)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let forged = send(
        &app,
        request(
            Method::GET,
            "/api/v1/profile",
            None,
            Some("farmdrop_session=abc.def"),
        ),
    )
    .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../migrations")]
async fn logout_ends_session(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let cookie = signup(&app, "bye@example.com").await;

    let reply = send(&app, request(Method::POST, "/auth/logout", None, Some(&cookie))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.cookie.as_deref(), Some("farmdrop_session="));

    let after = send(&app, request(Method::GET, "/api/v1/profile", None, Some(&cookie))).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleting_profile_removes_account(pool: sqlx::PgPool) {
    let app = test_app(pool.clone(), None);
    let cookie = signup(&app, "gone@example.com").await;

    let reply = send(&app, request(Method::DELETE, "/api/v1/profile", None, Some(&cookie))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["data"]["deleted"], true);

    let user = farmdrop_db::get_user_by_email(&pool, "gone@example.com")
        .await
        .expect("query");
    assert!(user.is_none());

    let after = send(&app, request(Method::GET, "/api/v1/profile", None, Some(&cookie))).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn quote_by_coordinates_classifies_tiers(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let cases = [
        (10.0, "free", Some("0")),
        (20.0, "fee_low", Some("5.00")),
        (25.0, "fee_high", Some("10.00")),
        (30.0, "unavailable", None),
    ];

    for (km, tier, fee) in cases {
        let (lat, lon) = north_of_farm(km);
        let reply = send(
            &app,
            request(
                Method::POST,
                "/api/v1/delivery/quote",
                Some(json!({ "latitude": lat, "longitude": lon })),
                None,
            ),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK, "{km} km");
        let data = &reply.json["data"];
        assert_eq!(data["tier"], tier, "{km} km");
        assert!((data["distance_km"].as_f64().expect("distance") - km).abs() < 1e-6);
        match fee {
            Some(expected) => assert_eq!(decimal(&data["fee"]), Decimal::from_str(expected).expect("fee")),
            None => assert!(data["fee"].is_null()),
        }
        assert_eq!(data["deliverable"], fee.is_some());
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn quote_rejects_out_of_range_coordinates(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let reply = send(
        &app,
        request(
            Method::POST,
            "/api/v1/delivery/quote",
            Some(json!({ "latitude": 91.0, "longitude": 0.0 })),
            None,
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["error"]["code"], "validation_error");

    let half = send(
        &app,
        request(
            Method::POST,
            "/api/v1/delivery/quote",
            Some(json!({ "latitude": 33.9 })),
            None,
        ),
    )
    .await;
    assert_eq!(half.status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../migrations")]
async fn quote_by_address_uses_geocoder(pool: sqlx::PgPool) {
    let app = test_app(pool, Some(fixed_geocoder()));
    let reply = send(
        &app,
        request(
            Method::POST,
            "/api/v1/delivery/quote",
            Some(json!({ "address": "1 Nearby Lane" })),
            None,
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["data"]["tier"], "free");
    assert_eq!(reply.json["data"]["place_name"], "1 Nearby Lane, California");

    let unknown = send(
        &app,
        request(
            Method::POST,
            "/api/v1/delivery/quote",
            Some(json!({ "address": "Atlantis" })),
            None,
        ),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.json["error"]["code"], "geocode_failed");
}

#[sqlx::test(migrations = "../../migrations")]
async fn quote_by_address_without_geocoder_is_unavailable(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let reply = send(
        &app,
        request(
            Method::POST,
            "/api/v1/delivery/quote",
            Some(json!({ "address": "1 Nearby Lane" })),
            None,
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply.json["error"]["code"], "geocoding_unavailable");
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn placing_order_snapshots_prices_and_totals(pool: sqlx::PgPool) {
    seed_food(&pool, "Farm Fresh Eggs", "farm-fresh-eggs", 600).await;
    seed_food(&pool, "Strawberries", "strawberries", 500).await;
    let app = test_app(pool.clone(), None);
    let cookie = signup(&app, "buyer@example.com").await;
    let (lat, lon) = north_of_farm(20.0);

    let reply = send(
        &app,
        request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [
                    { "food_slug": "farm-fresh-eggs", "quantity": 2 },
                    { "food_slug": "strawberries", "quantity": 1 }
                ],
                "latitude": lat,
                "longitude": lon,
                "notes": "leave by the gate"
            })),
            Some(&cookie),
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.json);
    let data = &reply.json["data"];
    assert_eq!(data["status"], "received");
    assert_eq!(data["delivery_tier"], "fee_low");
    assert_eq!(decimal(&data["subtotal"]), Decimal::new(1700, 2));
    assert_eq!(decimal(&data["delivery_fee"]), Decimal::new(500, 2));
    assert_eq!(decimal(&data["total"]), Decimal::new(2200, 2));
    assert!(data["message"].as_str().expect("message").contains("$5"));
    assert_eq!(data["items"].as_array().map(Vec::len), Some(2));

    // A later price change must not rewrite the stored order.
    sqlx::query("UPDATE foods SET price = 99.00 WHERE slug = 'farm-fresh-eggs'")
        .execute(&pool)
        .await
        .expect("reprice");

    let mine = send(&app, request(Method::GET, "/api/v1/orders", None, Some(&cookie))).await;
    assert_eq!(mine.status, StatusCode::OK);
    let orders = mine.json["data"].as_array().expect("orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(decimal(&orders[0]["subtotal"]), Decimal::new(1700, 2));
    assert_eq!(orders[0]["order_id"], data["order_id"]);

    let profile = send(&app, request(Method::GET, "/api/v1/profile", None, Some(&cookie))).await;
    let alerts = profile.json["meta"]["alerts"].as_array().expect("alerts");
    assert!(alerts.iter().any(|a| a.as_str().is_some_and(|s| s.contains("$5"))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn order_outside_delivery_area_is_rejected(pool: sqlx::PgPool) {
    seed_food(&pool, "Raw Wildflower Honey", "raw-wildflower-honey", 1200).await;
    let app = test_app(pool.clone(), Some(fixed_geocoder()));
    let cookie = signup(&app, "faraway@example.com").await;

    let reply = send(
        &app,
        request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "food_slug": "raw-wildflower-honey", "quantity": 1 }],
                "address": "99 Far Away Road"
            })),
            Some(&cookie),
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.json["error"]["code"], "delivery_unavailable");
    assert!(reply.json["error"]["message"]
        .as_str()
        .expect("message")
        .contains("don't currently deliver"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn order_by_address_stores_typed_address(pool: sqlx::PgPool) {
    seed_food(&pool, "Rainbow Chard", "rainbow-chard", 325).await;
    let app = test_app(pool, Some(fixed_geocoder()));
    let cookie = signup(&app, "near@example.com").await;

    let reply = send(
        &app,
        request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "food_slug": "rainbow-chard", "quantity": 4 }],
                "address": "  1 Nearby Lane "
            })),
            Some(&cookie),
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.json);
    assert_eq!(reply.json["data"]["address"], "1 Nearby Lane");
    assert_eq!(reply.json["data"]["delivery_tier"], "free");
    assert_eq!(decimal(&reply.json["data"]["total"]), Decimal::new(1300, 2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn order_with_unknown_food_is_rejected(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let cookie = signup(&app, "typo@example.com").await;
    let (lat, lon) = north_of_farm(1.0);

    let reply = send(
        &app,
        request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "food_slug": "truffles", "quantity": 1 }],
                "latitude": lat,
                "longitude": lon
            })),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.json["error"]["message"]
        .as_str()
        .expect("message")
        .contains("truffles"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn orders_require_login(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let reply = send(
        &app,
        request(Method::POST, "/api/v1/orders", Some(json!({ "items": [] })), None),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Owner routes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn owner_routes_forbid_customers(pool: sqlx::PgPool) {
    let app = test_app(pool, None);
    let cookie = signup(&app, "customer@example.com").await;

    let dashboard =
        send(&app, request(Method::GET, "/api/v1/owner/orders", None, Some(&cookie))).await;
    assert_eq!(dashboard.status, StatusCode::FORBIDDEN);

    let create = send(
        &app,
        request(
            Method::POST,
            "/api/v1/foods",
            Some(json!({ "name": "Kale", "price": "3.00" })),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../migrations")]
async fn owner_manages_catalog(pool: sqlx::PgPool) {
    let app = test_app(pool.clone(), None);
    let cookie = owner_session(&app, &pool).await;

    let created = send(
        &app,
        request(
            Method::POST,
            "/api/v1/foods",
            Some(json!({ "name": "Purple Carrots", "price": "3.50", "unit": "bunch" })),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.json);
    assert_eq!(created.json["data"]["slug"], "purple-carrots");

    let duplicate = send(
        &app,
        request(
            Method::POST,
            "/api/v1/foods",
            Some(json!({ "name": "Purple carrots", "price": "4.00" })),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let listed = send(&app, request(Method::GET, "/api/v1/foods", None, None)).await;
    assert_eq!(listed.json["data"].as_array().map(Vec::len), Some(1));

    let sold_out = send(
        &app,
        request(
            Method::PATCH,
            "/api/v1/foods/purple-carrots/availability",
            Some(json!({ "available": false })),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(sold_out.status, StatusCode::OK);
    assert_eq!(sold_out.json["data"]["is_available"], false);

    let listed = send(&app, request(Method::GET, "/api/v1/foods", None, None)).await;
    assert_eq!(listed.json["data"].as_array().map(Vec::len), Some(0));

    let detail = send(&app, request(Method::GET, "/api/v1/foods/purple-carrots", None, None)).await;
    assert_eq!(detail.status, StatusCode::OK);

    let missing = send(
        &app,
        request(
            Method::PATCH,
            "/api/v1/foods/unknown/availability",
            Some(json!({ "available": true })),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn owner_dashboard_filters_and_updates_status(pool: sqlx::PgPool) {
    seed_food(&pool, "Heirloom Tomatoes", "heirloom-tomatoes", 450).await;
    let app = test_app(pool.clone(), None);
    let customer = signup(&app, "regular@example.com").await;
    let owner = owner_session(&app, &pool).await;
    let (lat, lon) = north_of_farm(25.0);

    let placed = send(
        &app,
        request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "food_slug": "heirloom-tomatoes", "quantity": 2 }],
                "latitude": lat,
                "longitude": lon
            })),
            Some(&customer),
        ),
    )
    .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.json);
    let order_id = placed.json["data"]["order_id"]
        .as_str()
        .expect("order id")
        .to_owned();

    let dashboard = send(&app, request(Method::GET, "/api/v1/owner/orders", None, Some(&owner))).await;
    assert_eq!(dashboard.status, StatusCode::OK);
    let rows = dashboard.json["data"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["customer_email"], "regular@example.com");
    assert_eq!(rows[0]["delivery_tier"], "fee_high");
    assert_eq!(decimal(&rows[0]["total"]), Decimal::new(1900, 2));

    let bad_status = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/v1/owner/orders/{order_id}/status"),
            Some(json!({ "status": "shipped" })),
            Some(&owner),
        ),
    )
    .await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);

    let confirmed = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/v1/owner/orders/{order_id}/status"),
            Some(json!({ "status": "confirmed" })),
            Some(&owner),
        ),
    )
    .await;
    assert_eq!(confirmed.status, StatusCode::OK);
    assert_eq!(confirmed.json["data"]["status"], "confirmed");

    let received = send(
        &app,
        request(
            Method::GET,
            "/api/v1/owner/orders?status=received",
            None,
            Some(&owner),
        ),
    )
    .await;
    assert_eq!(received.json["data"].as_array().map(Vec::len), Some(0));

    let unknown = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/v1/owner/orders/{}/status", uuid::Uuid::new_v4()),
            Some(json!({ "status": "cancelled" })),
            Some(&owner),
        ),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
