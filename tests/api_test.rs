mod common;

use axum::http::StatusCode;
use common::{date, TestApp};
use rust_decimal_macros::dec;

async fn seeded() -> TestApp {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let other = app.supplier("Papelera").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(1000.00), date(2024, 3, 5), 1, &["compra de insumos médicos"])
        .await;
    app.purchase(&acme, &health, dec!(500.00), date(2024, 3, 20), 2, &["guantes"])
        .await;
    app.purchase(&other, &health, dec!(20.00), date(2024, 3, 21), 3, &["resmas"])
        .await;
    app
}

#[tokio::test]
async fn status_and_health() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["search_engine"], "in-process");
    assert_eq!(body["data"]["search_language"], "spanish");

    let (status, body) = app.get("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn supplier_ranking_endpoint() {
    let app = seeded().await;
    let (status, body) = app
        .get("/api/v1/suppliers/ranking?desde=2024-03-01&hasta=2024-03-31")
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "ACME");
    assert_eq!(rows[0]["slug"], "acme");
    assert_eq!(rows[0]["total"], "1500.00");
    assert_eq!(rows[1]["name"], "Papelera");

    let (_, body) = app
        .get("/api/v1/departments/ranking?desde=2024-03-01&hasta=2024-03-31&supplier=papelera")
        .await;
    assert_eq!(body["data"][0]["name"], "Health");
    assert_eq!(body["data"][0]["total"], "20.00");
}

#[tokio::test]
async fn total_endpoint_defaults_and_validates_dates() {
    let app = seeded().await;
    let (status, body) = app
        .get("/api/v1/purchases/total?desde=2024-03-01&hasta=2024-03-31")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], "1520.00");
    assert_eq!(body["data"]["period"]["start"], "2024-03-01");

    // seeded data is in 2024, the current month has nothing
    let (status, body) = app.get("/api/v1/purchases/total").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], "0.00");

    let (status, body) = app.get("/api/v1/purchases/total?desde=marzo").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("desde"));
}

#[tokio::test]
async fn search_endpoint() {
    let app = seeded().await;
    let (status, body) = app.get("/api/v1/purchases/search?q=insumos").await;
    assert_eq!(status, StatusCode::OK);
    let hits = body["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["order_number"], 1);
    assert!(hits[0]["rank"].as_f64().unwrap() > 0.0);

    let (status, body) = app.get("/api/v1/purchases/search?q=insumos%20%26").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("syntax error in tsquery"));
}

#[tokio::test]
async fn empty_search_text_is_a_syntax_error() {
    let app = seeded().await;
    for uri in [
        "/api/v1/purchases/search?q=",
        "/api/v1/purchases/search?q=%20%20",
        "/api/v1/purchases/search",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(
            body["message"].as_str().unwrap().starts_with("Query syntax error"),
            "{uri}: {body}"
        );
    }
}

#[tokio::test]
async fn detail_endpoints() {
    let app = seeded().await;
    let (status, body) = app.get("/api/v1/purchases/2024/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order_code"], "1/2024");
    assert_eq!(body["data"]["supplier"]["name"], "ACME");
    assert_eq!(body["data"]["line_items"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/v1/purchases/2024/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/v1/purchases/2024/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/v1/suppliers/acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "ACME");

    let (status, body) = app
        .get("/api/v1/suppliers/acme/purchases?desde=2024-03-01&hasta=2024-03-31")
        .await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["order_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, [2, 1]);

    let (status, _) = app.get("/api/v1/departments/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_ids_are_echoed() {
    let app = TestApp::new().await;
    let ((status, body), headers) = app
        .get_with_headers("/api/v1/status", &[("x-request-id", "req-123")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-request-id"], "req-123");
    assert_eq!(body["meta"]["request_id"], "req-123");

    let ((status, body), _) = app
        .get_with_headers("/api/v1/suppliers/ghost", &[("x-request-id", "req-404")])
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["request_id"], "req-404");
}
