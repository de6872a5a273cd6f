use super::*;
use axum::body::{to_bytes, Body};
use axum::http::{header::SET_COOKIE, Request};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::middleware::AuthState;

const MATRIX: &str = r#"[
    {"product_id_numeric": 1, "product_id": "B01", "product_name": "Trail Running Shoes",
     "Brand": "Nike", "rating": 4.5, "actual_price": "3999", "discounted_price": "2999"},
    {"product_id_numeric": 2, "product_id": "B02", "product_name": "Court Shoes",
     "Brand": "Adidas", "rating": 4.1, "actual_price": "4599"},
    {"product_id_numeric": 3, "product_id": "B03", "product_name": "Desk Lamp",
     "Brand": "Philips", "rating": 3.9, "actual_price": 899}
]"#;

struct TestApp {
    router: Router,
    _data: TempDir,
}

async fn test_app(api_keys: &str) -> TestApp {
    test_app_with_limit(api_keys, default_rate_limit_state()).await
}

async fn test_app_with_limit(api_keys: &str, rate_limit: RateLimitState) -> TestApp {
    let data = TempDir::new().expect("tempdir");
    std::fs::write(data.path().join("product_matrix.json"), MATRIX).expect("write matrix");

    let pool = lumina_db::connect_in_memory().await.expect("pool");
    lumina_db::run_migrations(&pool).await.expect("migrations");
    let (catalog, _) = CatalogHandle::load(data.path().to_path_buf())
        .await
        .expect("catalog");

    let state = AppState {
        pool,
        catalog,
        sessions: SessionStore::new("lumina_session", Duration::from_secs(300), false),
        password_rounds: 1_000,
    };
    let auth = AuthState::from_keys(api_keys, true).expect("auth");

    TestApp {
        router: build_app(state, auth, rate_limit, None),
        _data: data,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, cookie, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn with_cookie(mut request: Request<Body>, set_cookie: &str) -> Request<Body> {
    let pair = set_cookie.split(';').next().expect("cookie pair");
    request.headers_mut().insert(
        header::COOKIE,
        pair.parse().expect("cookie header value"),
    );
    request
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("unauthorized", StatusCode::UNAUTHORIZED),
        ("conflict", StatusCode::CONFLICT),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[tokio::test]
async fn health_reports_database_and_catalog_size() {
    let app = test_app("").await;
    let (status, _, json) = send(&app, get("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["database"], "ok");
    assert_eq!(json["data"]["products"], 3);
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let app = test_app("").await;
    let request = Request::builder()
        .uri("/api/v1/health")
        .header("x-request-id", "trace-42")
        .body(Body::empty())
        .expect("request");

    let response = app.router.clone().oneshot(request).await.expect("response");
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("trace-42")
    );
}

#[tokio::test]
async fn top_products_returns_catalog_in_order() {
    let app = test_app("").await;
    let (status, _, json) = send(&app, get("/api/v1/products/top")).await;

    assert_eq!(status, StatusCode::OK);
    let products = json["data"].as_array().expect("data array");
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["p_id"], "1");
    assert_eq!(products[0]["name"], "Trail Running Shoes");
    assert_eq!(products[0]["prices"], 3999.0);
    assert_eq!(products[0]["discounted_price"], 2999.0);
    assert_eq!(products[2]["p_id"], "3");
}

#[tokio::test]
async fn search_matches_brand_then_substring() {
    let app = test_app("").await;

    let (status, _, json) = send(&app, get("/api/v1/search?q=%20ADIDAS%20")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|p| p["name"].as_str().expect("name").to_owned())
        .collect();
    assert_eq!(names, ["Court Shoes"]);

    let (_, _, json) = send(&app, get("/api/v1/search?q=shoes")).await;
    assert_eq!(json["data"].as_array().expect("data array").len(), 2);
}

#[tokio::test]
async fn search_with_blank_or_missing_query_is_empty() {
    let app = test_app("").await;
    for uri in ["/api/v1/search", "/api/v1/search?q=", "/api/v1/search?q=%20%20"] {
        let (status, _, json) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(json["data"], json!([]), "{uri}");
    }
}

#[tokio::test]
async fn signup_starts_session_visible_to_me() {
    let app = test_app("").await;
    let (status, cookie, json) = send(
        &app,
        post_json(
            "/api/v1/auth/signup",
            &json!({"name": " Asha ", "email": "Asha@Example.com", "password": "pw"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["user"], "Asha");
    let cookie = cookie.expect("set-cookie");
    assert!(cookie.starts_with("lumina_session="));
    assert!(cookie.contains("HttpOnly"));

    let (status, _, json) = send(&app, with_cookie(get("/api/v1/auth/me"), &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["user"], "Asha");
}

#[tokio::test]
async fn me_without_session_is_null() {
    let app = test_app("").await;
    let (status, _, json) = send(&app, get("/api/v1/auth/me")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["user"].is_null());
}

#[tokio::test]
async fn signup_validates_input() {
    let app = test_app("").await;
    let bad = [
        json!({"name": "", "email": "a@example.com", "password": "pw"}),
        json!({"name": "A", "email": "not-an-email", "password": "pw"}),
        json!({"name": "A", "email": "a@example.com", "password": ""}),
    ];
    for body in bad {
        let (status, cookie, json) = send(&app, post_json("/api/v1/auth/signup", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(cookie.is_none());
        assert_eq!(json["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = test_app("").await;
    let body = json!({"name": "Asha", "email": "asha@example.com", "password": "pw"});
    let (status, _, _) = send(&app, post_json("/api/v1/auth/signup", &body)).await;
    assert_eq!(status, StatusCode::OK);

    let again = json!({"name": "Other", "email": "ASHA@example.com ", "password": "x"});
    let (status, _, json) = send(&app, post_json("/api/v1/auth/signup", &again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["message"], "Email already registered");
}

#[tokio::test]
async fn login_checks_password() {
    let app = test_app("").await;
    let signup = json!({"name": "Asha", "email": "asha@example.com", "password": "secret"});
    send(&app, post_json("/api/v1/auth/signup", &signup)).await;

    let wrong = json!({"email": "asha@example.com", "password": "nope"});
    let (status, cookie, json) = send(&app, post_json("/api/v1/auth/login", &wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
    assert_eq!(json["error"]["message"], "Invalid email or password");

    let unknown = json!({"email": "nobody@example.com", "password": "secret"});
    let (status, _, _) = send(&app, post_json("/api/v1/auth/login", &unknown)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let right = json!({"email": " Asha@Example.com", "password": "secret"});
    let (status, cookie, json) = send(&app, post_json("/api/v1/auth/login", &right)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cookie.is_some());
    assert_eq!(json["data"]["user"], "Asha");
}

#[tokio::test]
async fn logout_ends_session() {
    let app = test_app("").await;
    let body = json!({"name": "Asha", "email": "asha@example.com", "password": "pw"});
    let (_, cookie, _) = send(&app, post_json("/api/v1/auth/signup", &body)).await;
    let cookie = cookie.expect("set-cookie");

    let logout = with_cookie(post_json("/api/v1/auth/logout", &json!({})), &cookie);
    let (status, cleared, json) = send(&app, logout).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["logged_out"], true);
    assert!(cleared.expect("cleared cookie").contains("Max-Age=0"));

    let (_, _, json) = send(&app, with_cookie(get("/api/v1/auth/me"), &cookie)).await;
    assert!(json["data"]["user"].is_null());
}

#[tokio::test]
async fn catalog_reload_requires_bearer_token_when_keys_set() {
    let app = test_app("admin-key").await;
    let reload = || {
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/catalog/reload")
    };

    let (status, _, _) = send(&app, reload().body(Body::empty()).expect("request")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let authed = reload()
        .header(header::AUTHORIZATION, "Bearer admin-key")
        .body(Body::empty())
        .expect("request");
    let (status, _, json) = send(&app, authed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["products"], 3);
    assert_eq!(json["data"]["report"]["products"]["status"], "loaded");
    assert_eq!(json["data"]["report"]["recommendations"]["status"], "absent");
}

#[tokio::test]
async fn catalog_reload_is_open_in_development_without_keys() {
    let app = test_app("").await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/catalog/reload")
        .body(Body::empty())
        .expect("request");
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn storefront_burst_leaves_admin_reload_available() {
    let app = test_app_with_limit("admin-key", RateLimitState::new(2, Duration::from_secs(60))).await;

    for _ in 0..2 {
        let (status, _, _) = send(&app, get("/api/v1/products/top")).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _, json) = send(&app, get("/api/v1/products/top")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");

    let reload = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/catalog/reload")
        .header(header::AUTHORIZATION, "Bearer admin-key")
        .body(Body::empty())
        .expect("request");
    let (status, _, _) = send(&app, reload).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn storefront_limit_is_tracked_per_client() {
    let app = test_app_with_limit("", RateLimitState::new(1, Duration::from_secs(60))).await;
    let from = |ip: [u8; 4]| {
        let mut request = get("/api/v1/products/top");
        request
            .extensions_mut()
            .insert(axum::extract::ConnectInfo(std::net::SocketAddr::from((ip, 5000))));
        request
    };

    let (status, _, _) = send(&app, from([192, 0, 2, 1])).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, from([192, 0, 2, 1])).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _, _) = send(&app, from([192, 0, 2, 2])).await;
    assert_eq!(status, StatusCode::OK);
}
