use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_suppliers_and_departments::Migration),
            Box::new(m20240101_000002_create_purchases_tables::Migration),
            Box::new(m20240101_000003_create_search_indexes::Migration),
        ]
    }
}

/// `tsvector` on PostgreSQL; elsewhere the textual form kept by the
/// in-process engine.
fn search_index_column<T: IntoIden>(manager: &SchemaManager, name: T) -> ColumnDef {
    let mut column = ColumnDef::new(name);
    match manager.get_database_backend() {
        sea_orm::DbBackend::Postgres => column.custom(Alias::new("tsvector")),
        _ => column.text(),
    };
    column.null();
    column
}

/// `numeric(19, 2)` on PostgreSQL. SQLite has no fixed-point type and
/// sea-query caps its `real(p, s)` at 16 digits, so there the column is a
/// plain `real`.
fn amount_column<T: IntoIden>(manager: &SchemaManager, name: T) -> ColumnDef {
    let mut column = ColumnDef::new(name);
    match manager.get_database_backend() {
        sea_orm::DbBackend::Postgres => column.decimal_len(19, 2),
        _ => column.decimal(),
    };
    column.not_null();
    column
}

// Migration implementations

mod m20240101_000001_create_suppliers_and_departments {

    use super::search_index_column;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_suppliers_and_departments"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).text().not_null().unique_key())
                        .col(ColumnDef::new(Suppliers::TaxId).string_len(32).null())
                        .col(ColumnDef::new(Suppliers::Address).string_len(128).null())
                        .col(ColumnDef::new(Suppliers::Locality).string_len(128).null())
                        .col(
                            ColumnDef::new(Suppliers::Slug)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(&mut search_index_column(manager, Suppliers::SearchIndex))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Departments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Departments::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Departments::Name)
                                .string_len(128)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Departments::Slug)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(&mut search_index_column(manager, Departments::SearchIndex))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Departments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(crate) enum Suppliers {
        Table,
        Id,
        Name,
        TaxId,
        Address,
        Locality,
        Slug,
        SearchIndex,
    }

    #[derive(DeriveIden)]
    pub(crate) enum Departments {
        Table,
        Id,
        Name,
        Slug,
        SearchIndex,
    }
}

mod m20240101_000002_create_purchases_tables {

    use super::m20240101_000001_create_suppliers_and_departments::{Departments, Suppliers};
    use super::{amount_column, search_index_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_purchases_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Purchases::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Purchases::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Purchases::OrderNumber).integer().null())
                        .col(ColumnDef::new(Purchases::Date).date().null())
                        .col(&mut amount_column(manager, Purchases::Amount))
                        .col(ColumnDef::new(Purchases::SupplyReference).string_len(32).null())
                        .col(ColumnDef::new(Purchases::SupplierId).big_integer().not_null())
                        .col(ColumnDef::new(Purchases::DepartmentId).big_integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchases_supplier")
                                .from(Purchases::Table, Purchases::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchases_department")
                                .from(Purchases::Table, Purchases::DepartmentId)
                                .to(Departments::Table, Departments::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, column) in [
                ("idx_purchases_date", Purchases::Date),
                ("idx_purchases_supplier_id", Purchases::SupplierId),
                ("idx_purchases_department_id", Purchases::DepartmentId),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Purchases::Table)
                            .col(column)
                            .to_owned(),
                    )
                    .await?;
            }

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseLineItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseLineItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLineItems::PurchaseId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(&mut amount_column(manager, PurchaseLineItems::UnitAmount))
                        .col(
                            ColumnDef::new(PurchaseLineItems::Quantity)
                                .string_len(128)
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseLineItems::Detail).text().null())
                        .col(&mut search_index_column(manager, PurchaseLineItems::SearchIndex))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_line_items_purchase")
                                .from(PurchaseLineItems::Table, PurchaseLineItems::PurchaseId)
                                .to(Purchases::Table, Purchases::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_line_items_purchase_id")
                        .table(PurchaseLineItems::Table)
                        .col(PurchaseLineItems::PurchaseId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseLineItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Purchases::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Purchases {
        Table,
        Id,
        OrderNumber,
        Date,
        Amount,
        SupplyReference,
        SupplierId,
        DepartmentId,
    }

    #[derive(DeriveIden)]
    enum PurchaseLineItems {
        Table,
        Id,
        PurchaseId,
        UnitAmount,
        Quantity,
        Detail,
        SearchIndex,
    }
}

/// GIN indexes over the `tsvector` columns. PostgreSQL only.
mod m20240101_000003_create_search_indexes {

    use sea_orm::{ConnectionTrait, DbBackend};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    const INDEXES: [(&str, &str); 3] = [
        ("idx_suppliers_search_index", "suppliers"),
        ("idx_departments_search_index", "departments"),
        ("idx_purchase_line_items_search_index", "purchase_line_items"),
    ];

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_search_indexes"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            if manager.get_database_backend() != DbBackend::Postgres {
                return Ok(());
            }
            let db = manager.get_connection();
            for (index, table) in INDEXES {
                db.execute_unprepared(&format!(
                    r#"CREATE INDEX IF NOT EXISTS "{}" ON "{}" USING GIN ("search_index")"#,
                    index, table
                ))
                .await?;
            }
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            if manager.get_database_backend() != DbBackend::Postgres {
                return Ok(());
            }
            let db = manager.get_connection();
            for (index, _) in INDEXES {
                db.execute_unprepared(&format!(r#"DROP INDEX IF EXISTS "{}""#, index))
                    .await?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbBackend, Statement};

    async fn column_type(db: &sea_orm::DatabaseConnection, table: &str, column: &str) -> String {
        let rows = db
            .query_all(Statement::from_string(
                DbBackend::Sqlite,
                format!("SELECT name, type FROM pragma_table_info('{}')", table),
            ))
            .await
            .unwrap();
        rows.iter()
            .find(|row| row.try_get::<String>("", "name").unwrap() == column)
            .map(|row| row.try_get::<String>("", "type").unwrap())
            .unwrap_or_else(|| panic!("{table}.{column} missing"))
    }

    #[tokio::test]
    async fn migrates_a_fresh_sqlite_database_up_and_down() {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();

        Migrator::up(&db, None).await.unwrap();
        for (table, column) in [("purchases", "amount"), ("purchase_line_items", "unit_amount")] {
            let ty = column_type(&db, table, column).await;
            assert!(ty.to_ascii_lowercase().starts_with("real"), "{table}.{column}: {ty}");
        }

        Migrator::down(&db, None).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        assert_eq!(Migrator::get_pending_migrations(&db).await.unwrap().len(), 0);
    }
}
