//! Table-level CRUD helpers on top of the condition compiler.
//!
//! [`Db`] wraps any [`GenericClient`] and builds `INSERT`, `UPDATE`, `DELETE` and
//! `SELECT` statements from [`Clauses`] and [`Where`] input. Write payloads are
//! filtered against the table's real columns first, so a map decoded from a request
//! body cannot name a column the table lacks.
//!
//! The SQL itself comes from the pure `build_*` functions, which need no connection.

use crate::client::GenericClient;
use crate::column_cache::ColumnCache;
use crate::compile::{Clauses, Compiler, Entry, Where};
use crate::config::ExecConfig;
use crate::error::{BindError, BindResult};
use crate::params::{Fragment, Params};
use crate::row::{FromRow, RowExt};
use crate::statement::Statement;
use std::sync::Arc;
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

const INSERT_PREFIX: &str = "insert_";
const SET_PREFIX: &str = "set_";

const COLUMNS_SQL: &str = "SELECT column_name::text FROM information_schema.columns \
     WHERE table_schema::text = current_schema() AND table_name::text = :table \
     ORDER BY ordinal_position";
const SCHEMA_COLUMNS_SQL: &str = "SELECT column_name::text FROM information_schema.columns \
     WHERE table_schema::text = :schema AND table_name::text = :table \
     ORDER BY ordinal_position";

/// `INSERT INTO table (cols) VALUES (:insert_col, ...)`.
///
/// Only column entries are accepted. An empty payload inserts `DEFAULT VALUES`.
pub fn build_insert(compiler: &Compiler, table: &str, data: &Clauses) -> BindResult<Fragment> {
    let quote = compiler.options().quote;
    let table = quote.quote_path(table);
    if data.is_empty() {
        return Ok(Fragment::new(
            format!("INSERT INTO {table} DEFAULT VALUES"),
            Params::new(),
        ));
    }

    let mut columns = Vec::with_capacity(data.len());
    let mut markers = Vec::with_capacity(data.len());
    let mut params = Params::new();
    for entry in data {
        let Entry::Column { column, value } = entry else {
            return Err(BindError::validation(
                "insert accepts column/value pairs only",
            ));
        };
        if value.is_list() {
            return Err(BindError::validation(format!(
                "insert value for column {column} is a list; bind arrays with Value::scalar"
            )));
        }
        let name = format!("{INSERT_PREFIX}{column}");
        columns.push(quote.quote(column));
        markers.push(format!(":{name}"));
        params.insert(name, value.clone());
    }

    Ok(Fragment::new(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            markers.join(", ")
        ),
        params,
    ))
}

/// `UPDATE table SET ... WHERE ...`.
///
/// An empty condition is not special-cased: the statement ends in ` WHERE ` and the
/// server rejects it.
pub fn build_update(
    compiler: &Compiler,
    table: &str,
    set: &Clauses,
    where_: impl Into<Where>,
    bindings: impl Into<Params>,
) -> BindResult<Fragment> {
    if set.is_empty() {
        return Err(BindError::validation("update needs at least one column"));
    }
    if let Some(column) = set.iter().find_map(|e| match e {
        Entry::Column { column, value } if value.is_list() => Some(column),
        _ => None,
    }) {
        return Err(BindError::validation(format!(
            "update value for column {column} is a list; bind arrays with Value::scalar"
        )));
    }
    let table = compiler.options().quote.quote_path(table);
    let (set_sql, mut params) = compiler
        .compile_clause(set, SET_PREFIX, ", ", &Params::new())
        .into_parts();
    let (where_sql, where_params) = compiler.compile_condition(where_, bindings).into_parts();
    params.merge(where_params);

    Ok(Fragment::new(
        format!("UPDATE {table} SET {set_sql} WHERE {where_sql}"),
        params,
    ))
}

/// `DELETE FROM table WHERE ...`, with the same empty-condition rule as [`build_update`].
pub fn build_delete(
    compiler: &Compiler,
    table: &str,
    where_: impl Into<Where>,
    bindings: impl Into<Params>,
) -> Fragment {
    let table = compiler.options().quote.quote_path(table);
    let (where_sql, params) = compiler.compile_condition(where_, bindings).into_parts();
    Fragment::new(format!("DELETE FROM {table} WHERE {where_sql}"), params)
}

/// `SELECT cols FROM table [WHERE ...] [tail]`.
///
/// No columns means `*`. `tail` is trusted SQL such as `ORDER BY id LIMIT 10`.
pub fn build_select(
    compiler: &Compiler,
    table: &str,
    columns: &[&str],
    where_: impl Into<Where>,
    bindings: impl Into<Params>,
    tail: &str,
) -> Fragment {
    let quote = compiler.options().quote;
    let list = if columns.is_empty() {
        "*".to_string()
    } else {
        columns
            .iter()
            .map(|c| if *c == "*" { "*".to_string() } else { quote.quote(c) })
            .collect::<Vec<_>>()
            .join(", ")
    };
    let from = format!("SELECT {} FROM {}", list, quote.quote_path(table));
    finish_select(compiler, from, where_.into(), bindings.into(), tail)
}

/// `SELECT COUNT(*) FROM table [WHERE ...]`.
pub fn build_count(
    compiler: &Compiler,
    table: &str,
    where_: impl Into<Where>,
    bindings: impl Into<Params>,
) -> Fragment {
    let from = format!(
        "SELECT COUNT(*) FROM {}",
        compiler.options().quote.quote_path(table)
    );
    finish_select(compiler, from, where_.into(), bindings.into(), "")
}

fn finish_select(
    compiler: &Compiler,
    mut sql: String,
    where_: Where,
    bindings: Params,
    tail: &str,
) -> Fragment {
    let (where_sql, params) = compiler.compile_condition(where_, bindings).into_parts();
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    if !tail.is_empty() {
        sql.push(' ');
        sql.push_str(tail);
    }
    Fragment::new(sql, params)
}

/// A client plus its column cache and execution settings.
///
/// # Example
///
/// ```ignore
/// use pgbind::{bindings, Clauses, Db};
///
/// let db = Db::new(client);
/// db.insert("users", Clauses::new().push("email", "a@b.c")).await?;
/// let n = db
///     .update("users", Clauses::new().push("status", "active"), "id IN (?)", bindings![[1, 2]])
///     .await?;
/// ```
pub struct Db<C> {
    client: C,
    columns: ColumnCache,
    config: ExecConfig,
    compiler: Compiler,
}

impl<C: GenericClient> Db<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, ExecConfig::default())
    }

    pub fn with_config(client: C, config: ExecConfig) -> Self {
        Self {
            client,
            columns: ColumnCache::new(config.column_cache_capacity),
            compiler: Compiler::new(config.compile.clone()),
            config,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn column_cache(&self) -> &ColumnCache {
        &self.columns
    }

    /// A statement using this connection's compiler and debug settings.
    pub fn statement(&self, sql: impl Into<String>, params: impl Into<Params>) -> Statement {
        Statement::with_compiler(sql, params, &self.compiler)
            .debug_dump_on_error(self.config.debug_dump)
    }

    fn fragment(&self, fragment: Fragment) -> Statement {
        let (sql, params) = fragment.into_parts();
        self.statement(sql, params)
    }

    pub async fn execute(&self, sql: impl Into<String>, params: impl Into<Params>) -> BindResult<u64> {
        self.statement(sql, params).execute(&self.client).await
    }

    pub async fn query(
        &self,
        sql: impl Into<String>,
        params: impl Into<Params>,
    ) -> BindResult<Vec<Row>> {
        self.statement(sql, params).fetch_all(&self.client).await
    }

    pub async fn query_as<T: FromRow>(
        &self,
        sql: impl Into<String>,
        params: impl Into<Params>,
    ) -> BindResult<Vec<T>> {
        self.statement(sql, params).fetch_all_as(&self.client).await
    }

    /// Column names of `table` (`schema.table` accepted), in ordinal order.
    ///
    /// Unknown tables yield an empty list. Results are cached.
    pub async fn columns(&self, table: &str) -> BindResult<Arc<[String]>> {
        if let Some(columns) = self.columns.get(table) {
            return Ok(columns);
        }

        let mut params = Params::new();
        let sql = match table.split_once('.') {
            Some((schema, name)) => {
                params.insert("schema", schema.to_string());
                params.insert("table", name.to_string());
                SCHEMA_COLUMNS_SQL
            }
            None => {
                params.insert("table", table.to_string());
                COLUMNS_SQL
            }
        };

        let rows = self.statement(sql, params).fetch_all(&self.client).await?;
        let names = rows
            .iter()
            .map(|row| row.try_get_first::<String>())
            .collect::<BindResult<Vec<_>>>()?;
        Ok(self.columns.insert(table, names))
    }

    /// Drop column entries naming a column `table` does not have.
    ///
    /// Raw and bound entries pass through. When the table's columns are unknown the
    /// input is returned as is.
    pub async fn filter_columns(&self, table: &str, data: Clauses) -> BindResult<Clauses> {
        let known = self.columns(table).await?;
        if known.is_empty() {
            return Ok(data);
        }
        Ok(data.retain(|entry| match entry {
            Entry::Column { column, .. } => {
                let keep = known.iter().any(|c| c == column);
                if !keep {
                    tracing::debug!(
                        target: "pgbind.sql",
                        table,
                        column = %column,
                        "dropping unknown column"
                    );
                }
                keep
            }
            Entry::Raw(_) | Entry::Bound { .. } => true,
        }))
    }

    /// Insert one row, returning the number of affected rows.
    pub async fn insert(&self, table: &str, data: Clauses) -> BindResult<u64> {
        let data = self.filter_columns(table, data).await?;
        let fragment = build_insert(&self.compiler, table, &data)?;
        self.fragment(fragment).execute(&self.client).await
    }

    /// Insert one row and return `column` of the inserted row (typically its id).
    pub async fn insert_returning<T>(&self, table: &str, data: Clauses, column: &str) -> BindResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        let data = self.filter_columns(table, data).await?;
        let (mut sql, params) = build_insert(&self.compiler, table, &data)?.into_parts();
        sql.push_str(" RETURNING ");
        sql.push_str(&self.compiler.options().quote.quote(column));
        self.statement(sql, params).fetch_scalar(&self.client).await
    }

    pub async fn update(
        &self,
        table: &str,
        set: Clauses,
        where_: impl Into<Where>,
        bindings: impl Into<Params>,
    ) -> BindResult<u64> {
        let set = self.filter_columns(table, set).await?;
        let fragment = build_update(&self.compiler, table, &set, where_, bindings)?;
        self.fragment(fragment).execute(&self.client).await
    }

    pub async fn delete(
        &self,
        table: &str,
        where_: impl Into<Where>,
        bindings: impl Into<Params>,
    ) -> BindResult<u64> {
        let fragment = build_delete(&self.compiler, table, where_, bindings);
        self.fragment(fragment).execute(&self.client).await
    }

    pub async fn select(
        &self,
        table: &str,
        columns: &[&str],
        where_: impl Into<Where>,
        bindings: impl Into<Params>,
        tail: &str,
    ) -> BindResult<Vec<Row>> {
        let fragment = build_select(&self.compiler, table, columns, where_, bindings, tail);
        self.fragment(fragment).fetch_all(&self.client).await
    }

    pub async fn select_as<T: FromRow>(
        &self,
        table: &str,
        columns: &[&str],
        where_: impl Into<Where>,
        bindings: impl Into<Params>,
        tail: &str,
    ) -> BindResult<Vec<T>> {
        let fragment = build_select(&self.compiler, table, columns, where_, bindings, tail);
        self.fragment(fragment).fetch_all_as(&self.client).await
    }

    /// First matching row mapped to `T`, if any.
    pub async fn find_one<T: FromRow>(
        &self,
        table: &str,
        where_: impl Into<Where>,
        bindings: impl Into<Params>,
    ) -> BindResult<Option<T>> {
        let fragment = build_select(&self.compiler, table, &[], where_, bindings, "LIMIT 1");
        self.fragment(fragment).fetch_opt_as(&self.client).await
    }

    pub async fn count(
        &self,
        table: &str,
        where_: impl Into<Where>,
        bindings: impl Into<Params>,
    ) -> BindResult<i64> {
        let fragment = build_count(&self.compiler, table, where_, bindings);
        self.fragment(fragment).fetch_scalar(&self.client).await
    }
}
