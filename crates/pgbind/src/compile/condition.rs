use super::clause::{Clauses, compile_clause};
use super::expand::expand_arrays;
use super::normalize::normalize_positional;
use crate::config::CompileOptions;
use crate::marker::{count_positional, has_named};
use crate::params::{Fragment, Params};

/// Prefix for every parameter the condition builder synthesizes.
pub const WHERE_PREFIX: &str = "where_";

/// The caller's "where" input.
#[derive(Debug, Clone, Default)]
pub enum Where {
    /// No condition.
    #[default]
    None,
    /// A SQL string, possibly with `?` or `:name` markers, or a bare column name.
    Raw(String),
    /// Column/value pairs and raw fragments joined with `AND`.
    Clauses(Clauses),
}

impl Where {
    /// Whether this input produces no SQL at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Where::None => true,
            Where::Raw(sql) => sql.is_empty(),
            Where::Clauses(c) => c.is_empty(),
        }
    }
}

impl From<&str> for Where {
    fn from(sql: &str) -> Self {
        Where::Raw(sql.to_string())
    }
}

impl From<String> for Where {
    fn from(sql: String) -> Self {
        Where::Raw(sql)
    }
}

impl From<Clauses> for Where {
    fn from(clauses: Clauses) -> Self {
        Where::Clauses(clauses)
    }
}

impl<T: Into<Where>> From<Option<T>> for Where {
    fn from(w: Option<T>) -> Self {
        w.map(Into::into).unwrap_or_default()
    }
}

pub(crate) fn compile_condition(
    where_: Where,
    bindings: Params,
    options: &CompileOptions,
) -> Fragment {
    let (fragment, bare) = match where_ {
        Where::None => return Fragment::new("", bindings),
        Where::Raw(sql) if sql.is_empty() => return Fragment::new("", bindings),
        Where::Clauses(clauses) if clauses.is_empty() => return Fragment::new("", bindings),
        Where::Clauses(clauses) => (
            compile_clause(&clauses, WHERE_PREFIX, " AND ", &bindings, options),
            None,
        ),
        Where::Raw(sql) if count_positional(&sql) > 0 => (
            normalize_positional(&sql, &bindings, WHERE_PREFIX),
            None,
        ),
        Where::Raw(sql) => (Fragment::new(sql.as_str(), bindings), Some(sql)),
    };

    let fragment = if fragment.params().has_list() {
        expand_arrays(fragment.sql(), fragment.params(), options)
    } else {
        fragment
    };

    if has_named(fragment.sql()) {
        return fragment;
    }

    if let Some(column) = bare {
        if let Some(value) = fragment.params().single_scalar() {
            let name = format!("{WHERE_PREFIX}{column}");
            let sql = format!("{} = :{}", options.quote.quote(&column), name);
            let mut params = Params::new();
            params.insert(name, value.clone());
            return Fragment::new(sql, params);
        }
    }

    fragment
}
