use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::validation::Patch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i32,
    pub name_transaction: String,
    pub price: i32,
    pub type_transaction: TransactionType,
    #[serde(with = "time::serde::rfc3339")]
    pub transaction_date: OffsetDateTime,
    pub image: Option<String>,
    pub created_by_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The columns the dashboard needs from a transaction.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionPoint {
    pub price: i32,
    pub type_transaction: TransactionType,
    pub transaction_date: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub name_transaction: String,
    pub price: i32,
    pub type_transaction: TransactionType,
    pub transaction_date: OffsetDateTime,
    pub image: Option<String>,
    pub created_by_id: i32,
}

#[derive(Debug, Default)]
pub struct TransactionChanges {
    pub name_transaction: Patch<String>,
    pub price: Patch<i32>,
    pub type_transaction: Patch<TransactionType>,
    pub transaction_date: Patch<OffsetDateTime>,
    pub image: Patch<String>,
}
