use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, Encode, PgPool, Postgres, QueryBuilder, Type};

use crate::validation::Patch;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

/// Builds `UPDATE <table> SET ...` from patch fields.
///
/// Undefined fields are skipped, `Null` writes SQL `NULL`, and `updated_at`
/// is always bumped so the statement is never empty.
pub struct UpdateBuilder<'args> {
    qb: QueryBuilder<'args, Postgres>,
    columns: Vec<&'static str>,
}

impl<'args> UpdateBuilder<'args> {
    pub fn new(table: &str) -> Self {
        let mut qb = QueryBuilder::new("UPDATE ");
        qb.push(table).push(" SET updated_at = now()");
        Self {
            qb,
            columns: Vec::new(),
        }
    }

    pub fn set<T>(&mut self, column: &'static str, value: Patch<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        match value {
            Patch::Undefined => {}
            Patch::Null => {
                self.qb.push(", ").push(column).push(" = NULL");
                self.columns.push(column);
            }
            Patch::Set(v) => {
                self.qb.push(", ").push(column).push(" = ").push_bind(v);
                self.columns.push(column);
            }
        }
        self
    }

    /// Columns touched so far, in order.
    #[cfg(test)]
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Appends `WHERE id = $n AND created_by_id = $m` and a `RETURNING` list.
    pub fn finish_owned(
        mut self,
        id: i32,
        owner_id: Option<i32>,
        returning: &str,
    ) -> QueryBuilder<'args, Postgres> {
        self.qb.push(" WHERE id = ").push_bind(id);
        if let Some(owner) = owner_id {
            self.qb.push(" AND created_by_id = ").push_bind(owner);
        }
        self.qb.push(" RETURNING ").push(returning);
        self.qb
    }
}
