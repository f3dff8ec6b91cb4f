mod common;

use assert_matches::assert_matches;
use common::{date, TestApp};
use gasto_publico::{
    commands::{
        suppliers::{CreateSupplierCommand, UpdateSupplierCommand},
        purchases::UpdateLineItemCommand,
    },
    entities::purchase_line_item,
    errors::ServiceError,
};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[tokio::test]
async fn finds_the_purchase_owning_a_matching_line_item() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    let wanted = app
        .purchase(&acme, &health, dec!(100), date(2024, 3, 5), 1, &["compra de insumos médicos"])
        .await;
    app.purchase(&acme, &health, dec!(100), date(2024, 3, 6), 2, &["cemento portland"])
        .await;

    let hits = app.reports().search("insumos", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].purchase.id, wanted.id);
    assert!(hits[0].rank > 0.0 && hits[0].rank < 1.0);

    // accents and case are folded on both sides
    let hits = app.reports().search("MEDICOS", None).await.unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn conjunction_without_matches_is_empty_not_an_error() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(100), date(2024, 3, 5), 1, &["compra de insumos médicos"])
        .await;

    let hits = app
        .reports()
        .search("insumos & quirúrgicos", None)
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn purchases_matched_through_several_line_items_appear_once() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    let purchase = app
        .purchase(
            &acme,
            &health,
            dec!(100),
            date(2024, 3, 5),
            1,
            &["guantes de látex", "guantes de nitrilo", "barbijos"],
        )
        .await;

    let hits = app.reports().search("guantes", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].purchase.id, purchase.id);
}

#[tokio::test]
async fn more_occurrences_rank_first() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    let once = app
        .purchase(&acme, &health, dec!(1), date(2024, 3, 5), 1, &["papel higiénico"])
        .await;
    let twice = app
        .purchase(&acme, &health, dec!(1), date(2024, 3, 6), 2, &["papel obra y papel kraft"])
        .await;

    let hits = app.reports().search("papel", None).await.unwrap();
    let ids: Vec<i64> = hits.iter().map(|h| h.purchase.id).collect();
    assert_eq!(ids, [twice.id, once.id]);
    assert!(hits[0].rank > hits[1].rank);
}

#[tokio::test]
async fn supplier_and_department_text_match_with_zero_rank() {
    let app = TestApp::new().await;
    let acme = app
        .catalog()
        .create_supplier(CreateSupplierCommand {
            locality: Some("Rosario".into()),
            ..CreateSupplierCommand::named("Droguería del Sur")
        })
        .await
        .unwrap();
    let hospital = app.department("Hospital Centenario").await;
    let purchase = app
        .purchase(&acme, &hospital, dec!(1), date(2024, 3, 5), 1, &["vendas"])
        .await;

    for query in ["drogueria", "rosario", "centenario"] {
        let hits = app.reports().search(query, None).await.unwrap();
        assert_eq!(hits.len(), 1, "query {query}");
        assert_eq!(hits[0].purchase.id, purchase.id);
        assert_eq!(hits[0].rank, 0.0);
    }
}

#[tokio::test]
async fn syntax_errors_are_reported() {
    let app = TestApp::new().await;
    for bad in ["insumos &", "(insumos", "insumos medicos", "", "& insumos"] {
        assert_matches!(
            app.reports().search(bad, None).await,
            Err(ServiceError::QuerySyntax(_)),
            "query {bad:?}"
        );
    }
}

#[tokio::test]
async fn stop_word_only_queries_match_nothing() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(1), date(2024, 3, 5), 1, &["compra de insumos"])
        .await;

    assert!(app.reports().search("de & la", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn limit_is_clamped_and_applied() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    for n in 1..=3 {
        app.purchase(&acme, &health, dec!(1), date(2024, 3, n as u32), n, &["toner"])
            .await;
    }

    assert_eq!(app.reports().search("toner", Some(2)).await.unwrap().len(), 2);
    assert_eq!(app.reports().search("toner", Some(0)).await.unwrap().len(), 1);
    assert_eq!(app.reports().search_limit(Some(10_000)), 100);
    assert_eq!(app.reports().search_limit(None), 20);
}

#[tokio::test]
async fn changing_a_detail_reindexes_the_line_item() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    let purchase = app
        .purchase(&acme, &health, dec!(1), date(2024, 3, 5), 1, &["resmas de papel"])
        .await;
    let line = purchase_line_item::Entity::find()
        .filter(purchase_line_item::Column::PurchaseId.eq(purchase.id))
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();

    app.catalog()
        .update_line_item(UpdateLineItemCommand {
            id: line.id,
            detail: Some("cartuchos de tinta".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(app.reports().search("resmas", None).await.unwrap().is_empty());
    assert_eq!(app.reports().search("cartuchos", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn renaming_a_supplier_reindexes_it() {
    let app = TestApp::new().await;
    let acme = app.supplier("Ferretería Central").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(1), date(2024, 3, 5), 1, &["tornillos"])
        .await;

    app.catalog()
        .update_supplier(UpdateSupplierCommand {
            id: acme.id,
            name: Some("Bulonera Norte".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(app.reports().search("ferreteria", None).await.unwrap().is_empty());
    assert_eq!(app.reports().search("bulonera", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reindex_rebuilds_every_vector() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(1), date(2024, 3, 5), 1, &["a", "b"])
        .await;

    let report = app.catalog().reindex().await.unwrap();
    assert_eq!(report.suppliers, 1);
    assert_eq!(report.departments, 1);
    assert_eq!(report.line_items, 2);
    assert_eq!(app.reports().search("acme", None).await.unwrap().len(), 1);
}
