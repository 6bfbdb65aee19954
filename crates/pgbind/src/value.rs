//! Bound values.
//!
//! A [`Value`] is what a caller binds to a marker: SQL `NULL`, a single scalar, or a
//! list that the array expander turns into an `IN (...)` list. Raw SQL is never a
//! value; it is a separate clause entry (see [`crate::Entry::Raw`]).

use bytes::BytesMut;
use std::error::Error;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio_postgres::types::{IsNull, ToSql, Type};

/// A type-erased driver parameter.
pub type SqlParam = Arc<dyn ToSql + Send + Sync>;

/// A `NULL` that can be bound to a parameter of any type.
///
/// `Option::<T>::None` only type-checks against the types `T` accepts; this one is
/// accepted everywhere and always encodes as SQL `NULL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlNull;

impl ToSql for SqlNull {
    fn to_sql(
        &self,
        _ty: &Type,
        _out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

/// A value bound to a marker.
#[derive(Debug, Clone)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// A single parameter.
    Scalar(SqlParam),
    /// A list to expand into one marker per element.
    List(Vec<SqlParam>),
}

impl Value {
    /// SQL `NULL`.
    pub fn null() -> Self {
        Value::Null
    }

    /// Wrap any driver-encodable value as a scalar.
    ///
    /// Note that a `Vec<T>` passed here is bound as a single PostgreSQL array
    /// parameter (e.g. for `= ANY(:ids)`), not expanded.
    pub fn scalar<T>(value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        Value::Scalar(Arc::new(value))
    }

    /// Build a list to expand into an `IN (...)` list.
    pub fn list<T, I>(values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        Value::List(
            values
                .into_iter()
                .map(|v| Arc::new(v) as SqlParam)
                .collect(),
        )
    }

    /// Convert a JSON document into a value.
    ///
    /// `null` maps to [`Value::Null`], arrays to [`Value::List`] (each element converted
    /// on its own), objects to a `jsonb` scalar, and numbers to `i64` when they fit,
    /// `f64` otherwise.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(json_param).collect())
            }
            other => Value::Scalar(json_param(other)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// The driver parameter for this value, or `None` for a list.
    pub fn as_param(&self) -> Option<SqlParam> {
        match self {
            Value::Null => Some(Arc::new(SqlNull)),
            Value::Scalar(p) => Some(Arc::clone(p)),
            Value::List(_) => None,
        }
    }

    /// Human-readable rendering used by debug dumps.
    pub fn render(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Scalar(p) => format!("{:?}", p),
            Value::List(items) => {
                let mut out = String::from("[");
                for (i, p) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{:?}", p);
                }
                out.push(']');
                out
            }
        }
    }
}

fn json_param(json: serde_json::Value) -> SqlParam {
    match json {
        serde_json::Value::Null => Arc::new(SqlNull),
        serde_json::Value::Bool(b) => Arc::new(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Arc::new(i)
            } else if let Some(f) = n.as_f64() {
                Arc::new(f)
            } else {
                Arc::new(n.to_string())
            }
        }
        serde_json::Value::String(s) => Arc::new(s),
        nested => Arc::new(nested),
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

macro_rules! impl_value_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::scalar(v)
                }
            }

            impl From<Option<$t>> for Value {
                fn from(v: Option<$t>) -> Self {
                    match v {
                        Some(v) => Value::scalar(v),
                        None => Value::Null,
                    }
                }
            }

            impl From<Vec<$t>> for Value {
                fn from(v: Vec<$t>) -> Self {
                    Value::list(v)
                }
            }

            impl<const N: usize> From<[$t; N]> for Value {
                fn from(v: [$t; N]) -> Self {
                    Value::list(v)
                }
            }
        )*
    };
}

impl_value_from!(bool, i8, i16, i32, i64, u32, f32, f64, String, &'static str);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_conversions_render_inner_value() {
        assert_eq!(Value::from(7).render(), "7");
        assert_eq!(Value::from("active").render(), "\"active\"");
        assert_eq!(Value::from(None::<i64>).render(), "NULL");
    }

    #[test]
    fn vec_and_array_become_lists() {
        let v = Value::from(vec![1, 2, 3]);
        assert!(v.is_list());
        assert_eq!(v.render(), "[1, 2, 3]");
        assert!(Value::from(["a", "b"]).is_list());
    }

    #[test]
    fn explicit_scalar_vec_stays_scalar() {
        let v = Value::scalar(vec![1_i64, 2]);
        assert!(!v.is_list());
        assert!(v.as_param().is_some());
    }

    #[test]
    fn json_mapping() {
        assert!(Value::from(json!(null)).is_null());
        assert_eq!(Value::from(json!([1, "x", null])).render(), "[1, \"x\", SqlNull]");
        assert_eq!(Value::from(json!(2.5)).render(), "2.5");
        assert!(!Value::from(json!({"a": 1})).is_list());
    }

    #[test]
    fn list_has_no_single_param() {
        assert!(Value::from(vec![1]).as_param().is_none());
        assert!(Value::Null.as_param().is_some());
    }
}
