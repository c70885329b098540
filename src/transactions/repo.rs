use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::repo_types::{NewTransaction, Transaction, TransactionChanges, TransactionPoint};
use crate::db::UpdateBuilder;

const TRANSACTION_COLUMNS: &str = "id, name_transaction, price, type_transaction, transaction_date, \
                                   image, created_by_id, created_at, updated_at";

pub async fn list_by_owner(db: &PgPool, owner_id: i32) -> anyhow::Result<Vec<Transaction>> {
    let rows = sqlx::query_as::<_, Transaction>(&format!(
        r#"
        SELECT {TRANSACTION_COLUMNS}
        FROM transactions
        WHERE created_by_id = $1
        ORDER BY transaction_date DESC, id DESC
        "#
    ))
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("list transactions")?;
    Ok(rows)
}

/// Transactions of `owner_id` dated in `[from, until)`.
pub async fn list_points_between(
    db: &PgPool,
    owner_id: i32,
    from: OffsetDateTime,
    until: OffsetDateTime,
) -> anyhow::Result<Vec<TransactionPoint>> {
    let rows = sqlx::query_as::<_, TransactionPoint>(
        r#"
        SELECT price, type_transaction, transaction_date
        FROM transactions
        WHERE created_by_id = $1
          AND transaction_date >= $2
          AND transaction_date < $3
        "#,
    )
    .bind(owner_id)
    .bind(from)
    .bind(until)
    .fetch_all(db)
    .await
    .context("list transactions in range")?;
    Ok(rows)
}

pub async fn find_owned(
    db: &PgPool,
    id: i32,
    owner_id: i32,
) -> anyhow::Result<Option<Transaction>> {
    let row = sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1 AND created_by_id = $2"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(db)
    .await
    .context("find transaction")?;
    Ok(row)
}

pub async fn create(db: &PgPool, new: &NewTransaction) -> anyhow::Result<Transaction> {
    let row = sqlx::query_as::<_, Transaction>(&format!(
        r#"
        INSERT INTO transactions
            (name_transaction, price, type_transaction, transaction_date, image, created_by_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(&new.name_transaction)
    .bind(new.price)
    .bind(new.type_transaction)
    .bind(new.transaction_date)
    .bind(&new.image)
    .bind(new.created_by_id)
    .fetch_one(db)
    .await
    .context("insert transaction")?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: i32,
    owner_id: i32,
    changes: TransactionChanges,
) -> anyhow::Result<Option<Transaction>> {
    let mut update = UpdateBuilder::new("transactions");
    update
        .set("name_transaction", changes.name_transaction)
        .set("price", changes.price)
        .set("type_transaction", changes.type_transaction)
        .set("transaction_date", changes.transaction_date)
        .set("image", changes.image);
    let row = update
        .finish_owned(id, Some(owner_id), TRANSACTION_COLUMNS)
        .build_query_as::<Transaction>()
        .fetch_optional(db)
        .await
        .context("update transaction")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: i32, owner_id: i32) -> anyhow::Result<Option<Transaction>> {
    let row = sqlx::query_as::<_, Transaction>(&format!(
        "DELETE FROM transactions WHERE id = $1 AND created_by_id = $2 RETURNING {TRANSACTION_COLUMNS}"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(db)
    .await
    .context("delete transaction")?;
    Ok(row)
}
