//! Statement executor.
//!
//! A [`Statement`] holds SQL with `:name` markers and the matching [`Params`]. Before
//! it reaches the driver, any list bindings are expanded and the named markers are
//! rendered to PostgreSQL's `$1, $2, ...`:
//!
//! - numbering follows first appearance, and a repeated name reuses its number;
//! - a marker with no matching parameter is left as written, as is any `?`, so the
//!   server rejects the statement instead of running something unintended;
//! - parameters no marker refers to are not sent.
//!
//! # Example
//!
//! ```ignore
//! use pgbind::{bindings, Statement};
//!
//! let n = Statement::new("DELETE FROM users WHERE id IN (:ids)", bindings! { "ids" => vec![1, 2] })
//!     .execute(&client)
//!     .await?;
//! ```

use crate::client::GenericClient;
use crate::compile::Compiler;
use crate::error::{BindError, BindResult};
use crate::marker::{Token, tokenize};
use crate::params::{Fragment, Params};
use crate::row::{FromRow, RowExt};
use crate::value::{SqlParam, Value};
use std::fmt::Write as _;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, ToSql};

/// SQL with named markers plus its parameters, ready to execute.
#[derive(Debug, Clone)]
pub struct Statement {
    sql: String,
    params: Params,
    debug_dump: bool,
}

/// A statement rendered for the driver: numbered placeholders and ordered params.
#[derive(Debug, Clone)]
pub struct Rendered {
    sql: String,
    names: Vec<String>,
    params: Vec<SqlParam>,
}

impl Rendered {
    /// SQL with `$n` placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Marker names in placeholder order (`names()[0]` is `$1`).
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name).map(|i| i + 1)
    }
}

impl Statement {
    /// Build a statement, expanding list bindings with default compiler options.
    pub fn new(sql: impl Into<String>, params: impl Into<Params>) -> Self {
        Self::with_compiler(sql, params, &Compiler::default())
    }

    /// Build a statement, expanding list bindings with `compiler`.
    pub fn with_compiler(
        sql: impl Into<String>,
        params: impl Into<Params>,
        compiler: &Compiler,
    ) -> Self {
        let sql = sql.into();
        let params = params.into();
        let (sql, params) = if params.has_list() {
            compiler.expand_arrays(&sql, &params).into_parts()
        } else {
            (sql, params)
        };
        Self {
            sql,
            params,
            debug_dump: false,
        }
    }

    /// Log [`Statement::debug_dump`] at `error` level when the driver rejects the statement.
    pub fn debug_dump_on_error(mut self, enabled: bool) -> Self {
        self.debug_dump = enabled;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Render named markers to `$n` placeholders.
    pub fn render(&self) -> Rendered {
        let mut sql = String::with_capacity(self.sql.len());
        let mut names: Vec<String> = Vec::new();
        let mut params: Vec<SqlParam> = Vec::new();

        for token in tokenize(&self.sql) {
            let Token::Named(name) = token else {
                token.write_to(&mut sql);
                continue;
            };
            if let Some(i) = names.iter().position(|n| n == name) {
                let _ = write!(sql, "${}", i + 1);
                continue;
            }
            match self.params.get(name).and_then(Value::as_param) {
                Some(param) => {
                    names.push(name.to_string());
                    params.push(param);
                    let _ = write!(sql, "${}", names.len());
                }
                None => token.write_to(&mut sql),
            }
        }

        Rendered { sql, names, params }
    }

    /// A multi-line description of the statement and its parameters, for diagnostics.
    pub fn debug_dump(&self) -> String {
        self.dump_with(&self.render())
    }

    fn dump_with(&self, rendered: &Rendered) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "SQL: [{}] {}", self.sql.len(), self.sql);
        let _ = writeln!(out, "Sent SQL: [{}] {}", rendered.sql.len(), rendered.sql);
        let _ = writeln!(out, "Params: {}", self.params.len());
        for (key, value) in self.params.iter() {
            let position = key
                .as_name()
                .and_then(|n| rendered.position(n))
                .map(|p| format!("${p}"))
                .unwrap_or_else(|| "unused".to_string());
            let _ = writeln!(out, "Key: {} Position: {} Value: {}", key, position, value.render());
        }

        let unresolved: Vec<String> = tokenize(&rendered.sql)
            .into_iter()
            .filter_map(|t| match t {
                Token::Named(n) => Some(format!(":{n}")),
                Token::Positional => Some("?".to_string()),
                Token::Text(_) => None,
            })
            .collect();
        if !unresolved.is_empty() {
            let _ = writeln!(out, "Unresolved markers: {}", unresolved.join(", "));
        }
        out
    }

    fn trace(&self, rendered: &Rendered) {
        tracing::debug!(
            target: "pgbind.sql",
            sql = %rendered.sql,
            param_count = rendered.params.len(),
            "executing statement"
        );
    }

    fn report(&self, err: &BindError, rendered: &Rendered) {
        if self.debug_dump {
            tracing::error!(
                target: "pgbind.sql",
                error = %err,
                dump = %self.dump_with(rendered),
                "statement failed"
            );
        }
    }

    /// Prepare and run the statement, returning all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> BindResult<Vec<Row>> {
        let rendered = self.render();
        let params = rendered.params_ref();
        self.trace(&rendered);

        let result = if conn.supports_prepared_statements() {
            match conn.prepare_statement(rendered.sql()).await {
                Ok(stmt) => conn.query_prepared(&stmt, &params).await,
                Err(e) => Err(e),
            }
        } else {
            conn.query(rendered.sql(), &params).await
        };
        result.inspect_err(|e| self.report(e, &rendered))
    }

    /// Run the statement and return all rows mapped to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> BindResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Run the statement and return the **first** row.
    ///
    /// Returns [`BindError::NotFound`] when there are no rows.
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> BindResult<Row> {
        self.fetch_all(conn)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BindError::not_found("Expected one row, got none"))
    }

    /// Run the statement and return the first row mapped to `T`.
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> BindResult<T> {
        let row = self.fetch_one(conn).await?;
        T::from_row(&row)
    }

    /// Run the statement and return the first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> BindResult<Option<Row>> {
        Ok(self.fetch_all(conn).await?.into_iter().next())
    }

    /// Run the statement and return at most one row mapped to `T`.
    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> BindResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Run the statement and return the first column of the first row.
    pub async fn fetch_scalar<T>(&self, conn: &impl GenericClient) -> BindResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        let row = self.fetch_one(conn).await?;
        row.try_get_first()
    }

    /// Prepare and run the statement, returning the number of affected rows.
    pub async fn execute(&self, conn: &impl GenericClient) -> BindResult<u64> {
        let rendered = self.render();
        let params = rendered.params_ref();
        self.trace(&rendered);

        let result = if conn.supports_prepared_statements() {
            match conn.prepare_statement(rendered.sql()).await {
                Ok(stmt) => conn.execute_prepared(&stmt, &params).await,
                Err(e) => Err(e),
            }
        } else {
            conn.execute(rendered.sql(), &params).await
        };
        result.inspect_err(|e| self.report(e, &rendered))
    }
}

impl From<Fragment> for Statement {
    fn from(fragment: Fragment) -> Self {
        let (sql, params) = fragment.into_parts();
        Statement::new(sql, params)
    }
}

/// Execute `sql` with `params` on `conn`, returning the number of affected rows.
pub async fn execute(
    conn: &impl GenericClient,
    sql: impl Into<String>,
    params: impl Into<Params>,
) -> BindResult<u64> {
    Statement::new(sql, params).execute(conn).await
}
