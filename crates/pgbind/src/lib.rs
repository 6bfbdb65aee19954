//! # pgbind
//!
//! Injection-safe query conditions for PostgreSQL.
//!
//! ## Features
//!
//! - **Values never touch SQL text**: every caller value becomes a named marker plus a binding
//! - **Mixed input**: column/value pairs, raw fragments, `?` markers and `:name` markers
//! - **`IN` lists**: list bindings expand to one marker per element
//! - **Named markers on PostgreSQL**: rendered to `$1, $2, ...` right before execution
//! - **CRUD helpers**: `insert`/`update`/`delete`/`select` with column filtering
//!
//! ## Compiling conditions
//!
//! ```ignore
//! use pgbind::{bindings, compile_condition, Clauses, Params};
//!
//! let f = compile_condition(
//!     Clauses::new().push("status", "active").push("age > ?", 18),
//!     Params::new(),
//! );
//! assert_eq!(f.sql(), "`status` = :where_status AND age > :where__0");
//!
//! let f = compile_condition("id IN (:ids)", bindings! { "ids" => vec![1, 2, 3] });
//! assert_eq!(f.sql(), "id IN (:ids0,:ids1,:ids2)");
//! ```
//!
//! ## Executing
//!
//! ```ignore
//! use pgbind::{bindings, Db, ExecConfig};
//!
//! let db = Db::with_config(client, ExecConfig::from_env());
//! let rows = db
//!     .select("users", &["id", "email"], "status = ?", bindings!["active"], "ORDER BY id")
//!     .await?;
//! ```

pub mod client;
pub mod column_cache;
pub mod compile;
pub mod config;
pub mod db;
pub mod error;
pub mod marker;
pub mod params;
pub mod row;
pub mod statement;
pub mod value;

#[cfg(test)]
mod test_support;

pub use client::GenericClient;
pub use column_cache::ColumnCache;
pub use compile::{
    Clauses, Compiler, Entry, WHERE_PREFIX, Where, compile_clause, compile_condition,
    expand_arrays, normalize_positional,
};
pub use config::{CompileOptions, DEBUG_ENV, ExecConfig, IdentQuote};
pub use db::{Db, build_count, build_delete, build_insert, build_select, build_update};
pub use error::{BindError, BindResult};
pub use params::{BindKey, Fragment, Params};
pub use row::{FromRow, RowExt};
pub use statement::{Rendered, Statement, execute};
pub use value::{SqlNull, SqlParam, Value};
