//! Statement executor trait for running rendered SQL.
//!
//! Every statement entorm produces has its values rendered inline, so an
//! executor only ever receives a complete SQL string with zero bind
//! parameters.

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use tokio_postgres::SimpleQueryMessage;

/// A trait that unifies anything able to run a SQL string and return rows.
///
/// Implemented for `tokio_postgres::Client` and `tokio_postgres::Transaction`
/// (and `deadpool_postgres::Client` with the `pool` feature), so a session can
/// run either on a direct connection or inside a transaction managed by the
/// caller.
pub trait StatementExecutor: Send + Sync {
    /// Execute a statement and return all rows it produced.
    ///
    /// Statements that produce no rows (`UPDATE`, `DELETE`) return an empty
    /// vector.
    fn execute(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;
}

impl<T: StatementExecutor + ?Sized> StatementExecutor for &T {
    fn execute(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).execute(sql)
    }
}

/// Convert simple-query messages into rows.
///
/// The simple-query protocol returns every column as text; SQL NULL maps to
/// [`Value::Null`].
fn collect_rows(messages: Vec<SimpleQueryMessage>) -> Vec<Row> {
    messages
        .into_iter()
        .filter_map(|message| match message {
            SimpleQueryMessage::Row(row) => Some(
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| {
                        let value = match row.get(idx) {
                            Some(text) => Value::Text(text.to_string()),
                            None => Value::Null,
                        };
                        (column.name().to_string(), value)
                    })
                    .collect(),
            ),
            _ => None,
        })
        .collect()
}

impl StatementExecutor for tokio_postgres::Client {
    async fn execute(&self, sql: &str) -> OrmResult<Vec<Row>> {
        let messages = tokio_postgres::Client::simple_query(self, sql)
            .await
            .map_err(OrmError::from)?;
        Ok(collect_rows(messages))
    }
}

impl StatementExecutor for tokio_postgres::Transaction<'_> {
    async fn execute(&self, sql: &str) -> OrmResult<Vec<Row>> {
        let messages = tokio_postgres::Transaction::simple_query(self, sql)
            .await
            .map_err(OrmError::from)?;
        Ok(collect_rows(messages))
    }
}

#[cfg(feature = "pool")]
impl StatementExecutor for deadpool_postgres::Client {
    async fn execute(&self, sql: &str) -> OrmResult<Vec<Row>> {
        let client: &tokio_postgres::Client = self;
        StatementExecutor::execute(client, sql).await
    }
}

#[cfg(feature = "pool")]
impl StatementExecutor for deadpool_postgres::Transaction<'_> {
    async fn execute(&self, sql: &str) -> OrmResult<Vec<Row>> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        StatementExecutor::execute(tx, sql).await
    }
}
