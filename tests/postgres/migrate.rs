use std::sync::Arc;

use sqlx_dialect::{DataType, Error, Field, Index, Table};

mod common;

use common::{connect, open_with_pool, RecordingPool};

fn accounts() -> Table {
    Table::new("accounts")
        .field(Field::new("id", DataType::Uint).size(64).auto_increment().primary_key())
        .field(Field::new("email", DataType::String).size(255).not_null())
        .field(Field::new("balance", DataType::Float).precision(12).scale(2).default_value("0"))
        .field(Field::new("created_at", DataType::Time).precision(6))
        .index(Index::new("idx_accounts_email", ["email"]).unique())
}

#[test]
fn it_creates_indexes_after_the_table() {
    let pool = Arc::new(RecordingPool::default());
    let db = open_with_pool(&pool);

    let migrator = db.migrator();
    assert!(migrator.config().create_index_after_create_table);

    assert_eq!(
        migrator.create_table_statements(&accounts()),
        [
            r#"CREATE TABLE "accounts" ("id" bigserial NOT NULL, "email" varchar(255) NOT NULL, "balance" numeric(12, 2) DEFAULT 0, "created_at" timestamptz(6), PRIMARY KEY ("id"))"#,
            r#"CREATE UNIQUE INDEX "idx_accounts_email" ON "accounts" ("email")"#,
        ]
    );
}

#[test]
fn it_quotes_schema_qualified_tables() {
    let pool = Arc::new(RecordingPool::default());
    let db = open_with_pool(&pool);

    let table = Table::new("billing.invoices")
        .field(Field::new("id", DataType::Int).size(32).auto_increment().primary_key());

    assert_eq!(
        db.migrator().create_table_statements(&table),
        [r#"CREATE TABLE "billing"."invoices" ("id" serial NOT NULL, PRIMARY KEY ("id"))"#]
    );
}

#[tokio::test]
async fn it_applies_the_statements() -> anyhow::Result<()> {
    let Some(db) = connect()? else {
        return Ok(());
    };

    let tx = db.begin().await?;

    tx.exec(r#"DROP TABLE IF EXISTS "accounts""#, &[]).await?;

    for sql in db.migrator().create_table_statements(&accounts()) {
        tx.exec(&sql, &[]).await?;
    }

    tx.exec(
        r#"INSERT INTO "accounts" ("email") VALUES ($1)"#,
        &["ana@example.com".into()],
    )
    .await?;

    let err = tx
        .exec(
            r#"INSERT INTO "accounts" ("email") VALUES ($1)"#,
            &["ana@example.com".into()],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    tx.rollback().await?;

    Ok(())
}
