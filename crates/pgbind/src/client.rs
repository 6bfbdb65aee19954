//! Generic client trait for unified database access.

use crate::error::{BindError, BindResult};
use tokio_postgres::Row;
use tokio_postgres::Statement;
use tokio_postgres::types::ToSql;

/// A trait that unifies database clients and transactions.
///
/// Statements reach this trait already rendered with `$1, $2, ...` placeholders; see
/// [`crate::Statement`] for the named-marker front end.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = BindResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = BindResult<u64>> + Send;

    /// Whether this client supports prepared statement APIs.
    ///
    /// The default implementation returns `false`, and prepared APIs will error if called.
    fn supports_prepared_statements(&self) -> bool {
        false
    }

    /// Prepare a statement on this connection.
    ///
    /// Prepared statements are **per-connection** and must not be used across connections.
    fn prepare_statement(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = BindResult<Statement>> + Send {
        let _ = sql;
        async {
            Err(BindError::Other(
                "prepared statements are not supported by this client".to_string(),
            ))
        }
    }

    /// Execute a prepared statement and return all rows.
    fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = BindResult<Vec<Row>>> + Send {
        let _ = stmt;
        let _ = params;
        async {
            Err(BindError::Other(
                "prepared statements are not supported by this client".to_string(),
            ))
        }
    }

    /// Execute a prepared statement and return affected row count.
    fn execute_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = BindResult<u64>> + Send {
        let _ = stmt;
        let _ = params;
        async {
            Err(BindError::Other(
                "prepared statements are not supported by this client".to_string(),
            ))
        }
    }
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> BindResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(BindError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> BindResult<u64> {
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(BindError::from_db_error)
    }

    fn supports_prepared_statements(&self) -> bool {
        true
    }

    async fn prepare_statement(&self, sql: &str) -> BindResult<Statement> {
        tokio_postgres::Client::prepare(self, sql)
            .await
            .map_err(BindError::from_prepare_error)
    }

    async fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> BindResult<Vec<Row>> {
        tokio_postgres::Client::query(self, stmt, params)
            .await
            .map_err(BindError::from_db_error)
    }

    async fn execute_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> BindResult<u64> {
        tokio_postgres::Client::execute(self, stmt, params)
            .await
            .map_err(BindError::from_db_error)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> BindResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(BindError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> BindResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, params)
            .await
            .map_err(BindError::from_db_error)
    }

    fn supports_prepared_statements(&self) -> bool {
        true
    }

    async fn prepare_statement(&self, sql: &str) -> BindResult<Statement> {
        tokio_postgres::Transaction::prepare(self, sql)
            .await
            .map_err(BindError::from_prepare_error)
    }

    async fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> BindResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, stmt, params)
            .await
            .map_err(BindError::from_db_error)
    }

    async fn execute_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> BindResult<u64> {
        tokio_postgres::Transaction::execute(self, stmt, params)
            .await
            .map_err(BindError::from_db_error)
    }
}

impl<C: GenericClient> GenericClient for &C {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> BindResult<Vec<Row>> {
        (*self).query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> BindResult<u64> {
        (*self).execute(sql, params).await
    }

    fn supports_prepared_statements(&self) -> bool {
        (*self).supports_prepared_statements()
    }

    fn prepare_statement(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = BindResult<Statement>> + Send {
        (*self).prepare_statement(sql)
    }

    fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = BindResult<Vec<Row>>> + Send {
        (*self).query_prepared(stmt, params)
    }

    fn execute_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = BindResult<u64>> + Send {
        (*self).execute_prepared(stmt, params)
    }
}
