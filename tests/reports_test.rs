mod common;

use common::{date, TestApp};
use gasto_publico::{
    commands::MAX_REAL_AMOUNT,
    queries::{Period, PurchaseFilter},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn march_2024() -> Period {
    Period::new(date(2024, 3, 1), date(2024, 3, 31))
}

#[tokio::test]
async fn total_sums_amounts_inside_the_period() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(1000.00), date(2024, 3, 5), 1, &[]).await;
    app.purchase(&acme, &health, dec!(500.00), date(2024, 3, 20), 2, &[]).await;
    app.purchase(&acme, &health, dec!(99.99), date(2024, 4, 1), 3, &[]).await;

    let total = app
        .reports()
        .total_for_period(march_2024(), PurchaseFilter::new())
        .await
        .unwrap();
    assert_eq!(total, dec!(1500.00));

    let ranking = app
        .reports()
        .supplier_ranking(march_2024(), PurchaseFilter::new(), None)
        .await
        .unwrap();
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].supplier.name, "ACME");
    assert_eq!(ranking[0].total, dec!(1500.00));
}

#[tokio::test]
async fn bounds_are_inclusive() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(10), date(2024, 3, 1), 1, &[]).await;
    app.purchase(&acme, &health, dec!(20), date(2024, 3, 31), 2, &[]).await;

    let total = app
        .reports()
        .total_for_period(march_2024(), PurchaseFilter::new())
        .await
        .unwrap();
    assert_eq!(total, dec!(30));
}

#[tokio::test]
async fn empty_and_inverted_periods_total_zero() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(10), date(2024, 3, 10), 1, &[]).await;

    let reports = app.reports();
    let empty = Period::new(date(2023, 1, 1), date(2023, 1, 31));
    assert_eq!(
        reports.total_for_period(empty, PurchaseFilter::new()).await.unwrap(),
        Decimal::ZERO
    );

    let inverted = Period::new(date(2024, 3, 31), date(2024, 3, 1));
    assert_eq!(
        reports.total_for_period(inverted, PurchaseFilter::new()).await.unwrap(),
        Decimal::ZERO
    );
    assert!(reports
        .supplier_ranking(inverted, PurchaseFilter::new(), None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn supplier_ranking_is_sorted_and_excludes_idle_suppliers() {
    let app = TestApp::new().await;
    let health = app.department("Health").await;
    let small = app.supplier("Small Co").await;
    let big = app.supplier("Big Co").await;
    let _idle = app.supplier("Idle Co").await;
    let tied = app.supplier("Another Small Co").await;

    app.purchase(&small, &health, dec!(100), date(2024, 3, 2), 1, &[]).await;
    app.purchase(&big, &health, dec!(700), date(2024, 3, 3), 2, &[]).await;
    app.purchase(&big, &health, dec!(300), date(2024, 3, 4), 3, &[]).await;
    app.purchase(&tied, &health, dec!(100), date(2024, 3, 5), 4, &[]).await;

    let ranking = app
        .reports()
        .supplier_ranking(march_2024(), PurchaseFilter::new(), None)
        .await
        .unwrap();
    let names: Vec<&str> = ranking.iter().map(|r| r.supplier.name.as_str()).collect();
    assert_eq!(names, ["Big Co", "Another Small Co", "Small Co"]);
    assert!(ranking.windows(2).all(|w| w[0].total >= w[1].total));
    assert_eq!(ranking[0].total, dec!(1000));

    let top = app
        .reports()
        .supplier_ranking(march_2024(), PurchaseFilter::new(), Some(1))
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
}

#[tokio::test]
async fn department_ranking_honours_supplier_filter() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let other = app.supplier("Other").await;
    let health = app.department("Health").await;
    let works = app.department("Public Works").await;

    app.purchase(&acme, &health, dec!(50), date(2024, 3, 2), 1, &[]).await;
    app.purchase(&acme, &works, dec!(80), date(2024, 3, 3), 2, &[]).await;
    app.purchase(&other, &health, dec!(500), date(2024, 3, 4), 3, &[]).await;

    let all = app
        .reports()
        .department_ranking(march_2024(), PurchaseFilter::new(), None)
        .await
        .unwrap();
    assert_eq!(all[0].department.name, "Health");
    assert_eq!(all[0].total, dec!(550));

    let only_acme = app
        .reports()
        .department_ranking(march_2024(), PurchaseFilter::new().supplier(acme.slug.clone()), None)
        .await
        .unwrap();
    let names: Vec<&str> = only_acme.iter().map(|r| r.department.name.as_str()).collect();
    assert_eq!(names, ["Public Works", "Health"]);
    assert_eq!(only_acme[1].total, dec!(50));
}

#[tokio::test]
async fn amount_filters_restrict_the_total() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(10), date(2024, 3, 2), 1, &[]).await;
    app.purchase(&acme, &health, dec!(200), date(2024, 3, 3), 2, &[]).await;

    let total = app
        .reports()
        .total_for_period(march_2024(), PurchaseFilter::new().min_amount(dec!(100)))
        .await
        .unwrap();
    assert_eq!(total, dec!(200));
}

#[tokio::test]
async fn purchases_in_period_are_newest_first() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    app.purchase(&acme, &health, dec!(1), date(2024, 3, 2), 1, &[]).await;
    app.purchase(&acme, &health, dec!(1), date(2024, 3, 9), 2, &[]).await;
    app.purchase(&acme, &health, dec!(1), date(2024, 2, 9), 3, &[]).await;

    let listed = app
        .reports()
        .purchases_in_period(march_2024(), PurchaseFilter::new().supplier_id(acme.id), None)
        .await
        .unwrap();
    let numbers: Vec<Option<i32>> = listed.iter().map(|p| p.order_number).collect();
    assert_eq!(numbers, [Some(2), Some(1)]);
}

#[tokio::test]
async fn large_totals_keep_their_cents() {
    let app = TestApp::new().await;
    let acme = app.supplier("ACME").await;
    let health = app.department("Health").await;
    // 101 x 9999999999999.99 has 18 significant digits, past what an f64 sum keeps
    for number in 1..=101 {
        app.purchase(&acme, &health, MAX_REAL_AMOUNT, date(2024, 3, 10), number, &[])
            .await;
    }
    let expected = dec!(1009999999999998.99);

    let total = app
        .reports()
        .total_for_period(march_2024(), PurchaseFilter::new())
        .await
        .unwrap();
    assert_eq!(total, expected);

    let suppliers = app
        .reports()
        .supplier_ranking(march_2024(), PurchaseFilter::new(), None)
        .await
        .unwrap();
    assert_eq!(suppliers[0].total, expected);

    let departments = app
        .reports()
        .department_ranking(march_2024(), PurchaseFilter::new(), None)
        .await
        .unwrap();
    assert_eq!(departments[0].total, expected);
    assert_eq!(departments[0].total.to_string(), "1009999999999998.99");
}
