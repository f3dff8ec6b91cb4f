mod common;

use assert_matches::assert_matches;
use common::{date, TestApp};
use gasto_publico::{
    commands::{
        departments::{CreateDepartmentCommand, UpdateDepartmentCommand},
        purchases::{CreatePurchaseCommand, NewLineItem, UpdateLineItemCommand},
        MAX_REAL_AMOUNT,
        suppliers::{CreateSupplierCommand, UpdateSupplierCommand},
    },
    entities::purchase_line_item,
    errors::ServiceError,
};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};

#[tokio::test]
async fn slugs_derive_from_names_and_avoid_collisions() {
    let app = TestApp::new().await;
    let first = app.supplier("ACME S.A.").await;
    let second = app
        .catalog()
        .create_supplier(CreateSupplierCommand {
            slug: Some("ACME SA".into()),
            ..CreateSupplierCommand::named("Acme Sociedad Anónima")
        })
        .await
        .unwrap();
    let third = app
        .catalog()
        .create_supplier(CreateSupplierCommand {
            slug: Some("acme-sa".into()),
            ..CreateSupplierCommand::named("ACME (Rosario)")
        })
        .await
        .unwrap();

    assert_eq!(first.slug, "acme-sa");
    assert_eq!(second.slug, "acme-sa-2");
    assert_eq!(third.slug, "acme-sa-3");
    assert_eq!(first.url_path(), "/proveedores/acme-sa");
}

#[tokio::test]
async fn renaming_recomputes_the_slug() {
    let app = TestApp::new().await;
    let dept = app.department("Secretaría de Salud").await;
    assert_eq!(dept.slug, "secretaria-de-salud");

    let renamed = app
        .catalog()
        .update_department(UpdateDepartmentCommand {
            id: dept.id,
            name: "Ministerio de Salud".into(),
        })
        .await
        .unwrap();
    assert_eq!(renamed.slug, "ministerio-de-salud");
    assert_eq!(renamed.url_path(), "/reparticiones/ministerio-de-salud");

    // same name: nothing changes
    let again = app
        .catalog()
        .update_department(UpdateDepartmentCommand {
            id: dept.id,
            name: "Ministerio de Salud".into(),
        })
        .await
        .unwrap();
    assert_eq!(again.slug, "ministerio-de-salud");
}

#[tokio::test]
async fn supplier_updates_keep_the_slug_unless_renamed() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;

    let moved = app
        .catalog()
        .update_supplier(UpdateSupplierCommand {
            id: acme.id,
            locality: Some("Santa Fe".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(moved.slug, "acme");
    assert_eq!(moved.locality.as_deref(), Some("Santa Fe"));

    let missing = app
        .catalog()
        .update_supplier(UpdateSupplierCommand {
            id: 9_999,
            name: Some("Ghost".into()),
            ..Default::default()
        })
        .await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_names_conflict_and_blank_names_fail_validation() {
    let app = TestApp::new().await;
    app.department("Salud").await;

    let duplicate = app
        .catalog()
        .create_department(CreateDepartmentCommand {
            name: "Salud".into(),
            slug: Some("otra-salud".into()),
        })
        .await;
    assert_matches!(duplicate, Err(ServiceError::Conflict(_)));

    let blank = app
        .catalog()
        .create_department(CreateDepartmentCommand::named("   "))
        .await;
    assert_matches!(blank, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn purchases_require_existing_parties_and_non_negative_amounts() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;

    let orphan = app
        .catalog()
        .create_purchase(CreatePurchaseCommand::new(acme.id, 4_242, dec!(1)))
        .await;
    assert_matches!(orphan, Err(ServiceError::InvalidInput(_)));

    let negative = app
        .catalog()
        .create_purchase(CreatePurchaseCommand::new(acme.id, health.id, dec!(-1)))
        .await;
    assert_matches!(negative, Err(ServiceError::ValidationError(_)));

    let negative_line = app
        .catalog()
        .create_purchase(
            CreatePurchaseCommand::new(acme.id, health.id, dec!(1))
                .with_line_item(NewLineItem::new("x", dec!(-0.01))),
        )
        .await;
    assert_matches!(negative_line, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn amounts_must_fit_numeric_19_2_and_the_storage_backend() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;

    let fractions_of_a_cent = app
        .catalog()
        .create_purchase(CreatePurchaseCommand::new(acme.id, health.id, dec!(10.001)))
        .await;
    assert_matches!(fractions_of_a_cent, Err(ServiceError::ValidationError(_)));

    let eighteen_digits = app
        .catalog()
        .create_purchase(CreatePurchaseCommand::new(
            acme.id,
            health.id,
            dec!(123456789012345678.00),
        ))
        .await;
    assert_matches!(eighteen_digits, Err(ServiceError::ValidationError(_)));

    // valid numeric(19, 2), but past what SQLite's REAL keeps to the cent
    let too_large_for_real = app
        .catalog()
        .create_purchase(CreatePurchaseCommand::new(
            acme.id,
            health.id,
            dec!(12345678901234567.89),
        ))
        .await;
    assert_matches!(too_large_for_real, Err(ServiceError::InvalidInput(_)));

    let largest = app
        .catalog()
        .create_purchase(CreatePurchaseCommand::new(acme.id, health.id, MAX_REAL_AMOUNT))
        .await
        .unwrap();
    assert_eq!(largest.amount.round_dp(2), MAX_REAL_AMOUNT);

    let line = app
        .catalog()
        .create_purchase(
            CreatePurchaseCommand::new(acme.id, health.id, dec!(1))
                .with_line_item(NewLineItem::new("gasas", dec!(1))),
        )
        .await
        .unwrap();
    let line_item = purchase_line_item::Entity::find()
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line_item.purchase_id, line.id);
    let oversized_line = app
        .catalog()
        .update_line_item(UpdateLineItemCommand {
            id: line_item.id,
            unit_amount: Some(dec!(12345678901234567.89)),
            ..Default::default()
        })
        .await;
    assert_matches!(oversized_line, Err(ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn purchase_detail_by_order_code() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    let saved = app
        .purchase(&acme, &health, dec!(1500.00), date(2024, 3, 5), 1234, &["uno", "dos"])
        .await;

    assert_eq!(saved.order_code().as_deref(), Some("1234/2024"));
    assert_eq!(saved.describe(&health, &acme), "Health compra a ACME por $1500.00");

    let detail = app.catalog().purchase_by_order_code(2024, 1234).await.unwrap();
    assert_eq!(detail.purchase.id, saved.id);
    assert_eq!(detail.order_code.as_deref(), Some("1234/2024"));
    assert_eq!(detail.supplier.id, acme.id);
    assert_eq!(detail.department.id, health.id);
    let details: Vec<_> = detail.line_items.iter().map(|l| l.detail.as_deref()).collect();
    assert_eq!(details, [Some("uno"), Some("dos")]);

    assert_matches!(
        app.catalog().purchase_by_order_code(2023, 1234).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn deleting_a_purchase_removes_its_line_items() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    let saved = app
        .purchase(&acme, &health, dec!(1), date(2024, 3, 5), 1, &["uno", "dos"])
        .await;

    app.catalog().delete_purchase(saved.id).await.unwrap();
    let remaining = purchase_line_item::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    assert_matches!(
        app.catalog().delete_purchase(saved.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn lookups_by_slug() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    assert_eq!(app.catalog().supplier_by_slug("acme").await.unwrap(), acme);
    assert_matches!(
        app.catalog().department_by_slug("nope").await,
        Err(ServiceError::NotFound(_))
    );
}
