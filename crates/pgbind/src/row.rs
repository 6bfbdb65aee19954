//! Row mapping traits and utilities

use crate::error::{BindError, BindResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for types that can be constructed from a database row.
///
/// # Example
///
/// ```ignore
/// use pgbind::{FromRow, RowExt, BindResult};
///
/// struct User {
///     id: i64,
///     status: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &tokio_postgres::Row) -> BindResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             status: row.try_get_column("status")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> BindResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning BindError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> BindResult<T>
    where
        T: for<'a> FromSql<'a>;

    /// Try to get the value of the first column.
    fn try_get_first<T>(&self) -> BindResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> BindResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| BindError::decode(column, e.to_string()))
    }

    fn try_get_first<T>(&self) -> BindResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        let column = self
            .columns()
            .first()
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| "0".to_string());
        self.try_get(0)
            .map_err(|e| BindError::decode(column, e.to_string()))
    }
}
