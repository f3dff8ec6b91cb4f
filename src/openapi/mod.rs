use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gasto Público API",
        version = "0.3.0",
        description = r#"
# Gasto Público

Read-only access to the purchase orders (compras) placed by government
departments (reparticiones) with suppliers (proveedores).

## Periods

Ranking, total and listing endpoints take `desde` and `hasta` as
`YYYY-MM-DD`, both inclusive. A missing `desde` is the first day of the
current month; a missing `hasta` is today.

## Search

`/purchases/search?q=` accepts PostgreSQL `to_tsquery` syntax:
`insumos & medicos`, `papel | toner`, `!obra`, `'cinta adhesiva'`,
`comput:*`. A malformed query answers 400.

## Error Handling

```json
{
  "error": "Bad Request",
  "message": "syntax error in tsquery at offset 7: expected operand",
  "request_id": "2b1f…",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    tags(
        (name = "Suppliers", description = "Supplier rankings and detail"),
        (name = "Departments", description = "Department rankings and detail"),
        (name = "Purchases", description = "Totals, search and purchase detail"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::health::api_status,
        crate::handlers::health::health_check,
        crate::handlers::suppliers::supplier_ranking,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::supplier_purchases,
        crate::handlers::departments::department_ranking,
        crate::handlers::departments::get_department,
        crate::handlers::departments::department_purchases,
        crate::handlers::purchases::total_for_period,
        crate::handlers::purchases::search_purchases,
        crate::handlers::purchases::get_purchase,
    ),
    components(
        schemas(
            crate::entities::supplier::Model,
            crate::entities::department::Model,
            crate::entities::purchase::Model,
            crate::entities::purchase_line_item::Model,
            crate::queries::SupplierTotal,
            crate::queries::DepartmentTotal,
            crate::queries::PurchaseDetail,
            crate::queries::Period,
            crate::search::ScoredPurchase,
            crate::handlers::purchases::PeriodTotal,
            crate::handlers::health::StatusInfo,
            crate::handlers::health::HealthStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}
