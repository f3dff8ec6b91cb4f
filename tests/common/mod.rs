use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use gasto_publico::{
    commands::{
        departments::CreateDepartmentCommand,
        purchases::{CreatePurchaseCommand, NewLineItem},
        suppliers::CreateSupplierCommand,
    },
    config::AppConfig,
    db,
    entities::{department, purchase, supplier},
    services::{CatalogService, ReportService},
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Application state over a fresh SQLite file, migrated, plus the full router.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_file = dir.path().join("gasto_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.search_default_limit = 20;
        cfg.search_max_limit = 100;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = gasto_publico::app_router(state.clone());

        Self {
            router,
            state,
            _dir: dir,
        }
    }

    pub fn catalog(&self) -> Arc<CatalogService> {
        self.state.services.catalog.clone()
    }

    pub fn reports(&self) -> Arc<ReportService> {
        self.state.services.reports.clone()
    }

    pub async fn supplier(&self, name: &str) -> supplier::Model {
        self.catalog()
            .create_supplier(CreateSupplierCommand::named(name))
            .await
            .expect("seed supplier")
    }

    pub async fn department(&self, name: &str) -> department::Model {
        self.catalog()
            .create_department(CreateDepartmentCommand::named(name))
            .await
            .expect("seed department")
    }

    /// Creates a purchase numbered `number` on `date` with one line item per detail.
    pub async fn purchase(
        &self,
        supplier: &supplier::Model,
        department: &department::Model,
        amount: Decimal,
        date: NaiveDate,
        number: i32,
        details: &[&str],
    ) -> purchase::Model {
        let mut command = CreatePurchaseCommand::new(supplier.id, department.id, amount)
            .with_order(number, date);
        for detail in details {
            command = command.with_line_item(NewLineItem::new(*detail, Decimal::ONE));
        }
        self.catalog()
            .create_purchase(command)
            .await
            .expect("seed purchase")
    }

    /// GET `uri` and decode the JSON body.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.get_with_headers(uri, &[]).await.0
    }

    pub async fn get_with_headers(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> ((StatusCode, Value), axum::http::HeaderMap) {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");
        let status = response.status();
        let response_headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        ((status, body), response_headers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
