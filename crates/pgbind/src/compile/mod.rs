//! Query-condition compiler.
//!
//! Turns caller input (column/value pairs, raw fragments, `?` markers, `:name`
//! markers, list bindings for `IN`) into one SQL fragment with named markers plus
//! the matching [`Params`]. Values never end up in the SQL text.
//!
//! The pipeline for [`compile_condition`] runs in a fixed order:
//!
//! 1. empty input: empty SQL, bindings passed through;
//! 2. [`Clauses`]: compiled with prefix `where_` joined by ` AND `;
//! 3. a string with `?`: markers renamed to `:where_0`, `:where_1`, ...;
//! 4. list bindings: expanded into `IN` lists;
//! 5. if the SQL now holds a named marker it is returned;
//! 6. a bare column name with a single scalar binding becomes `` `col` = :where_col ``;
//! 7. otherwise the input is returned unchanged.
//!
//! # Example
//!
//! ```ignore
//! use pgbind::{bindings, compile_condition};
//!
//! let f = compile_condition("status = ? AND id IN (?)", bindings!["active", [1, 2]]);
//! assert_eq!(f.sql(), "status = :where_0 AND id IN (:where_10,:where_11)");
//! ```

mod clause;
mod condition;
mod expand;
mod normalize;


pub use clause::{Clauses, Entry};
pub use condition::{WHERE_PREFIX, Where};

use crate::config::CompileOptions;
use crate::params::{Fragment, Params};

/// The compiler with explicit options.
///
/// The free functions in this module use [`Compiler::default`] (backtick quoting).
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// A compiler emitting double-quoted identifiers.
    pub fn postgres() -> Self {
        Self::new(CompileOptions::postgres())
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a WHERE condition. See the [module docs](self) for the pipeline.
    pub fn compile_condition(
        &self,
        where_: impl Into<Where>,
        bindings: impl Into<Params>,
    ) -> Fragment {
        condition::compile_condition(where_.into(), bindings.into(), &self.options)
    }

    /// Compile clause entries joined with `joiner`, naming column markers
    /// `{prefix}{column}`.
    ///
    /// `?` markers in raw entries are bound from `extra` (positional values in scan
    /// order) and renamed under a sub-prefix that cannot collide with column names.
    /// Named entries of `extra` are carried over.
    pub fn compile_clause(
        &self,
        data: &Clauses,
        prefix: &str,
        joiner: &str,
        extra: &Params,
    ) -> Fragment {
        clause::compile_clause(data, prefix, joiner, extra, &self.options)
    }

    /// Expand named list bindings into indexed `IN` markers.
    pub fn expand_arrays(&self, sql: &str, params: &Params) -> Fragment {
        expand::expand_arrays(sql, params, &self.options)
    }

    /// Rename `?` markers to `:{prefix}{i}` and move positional bindings accordingly.
    pub fn normalize_positional(&self, sql: &str, bindings: &Params, prefix: &str) -> Fragment {
        normalize::normalize_positional(sql, bindings, prefix)
    }
}

/// Compile a WHERE condition with default options.
pub fn compile_condition(where_: impl Into<Where>, bindings: impl Into<Params>) -> Fragment {
    Compiler::default().compile_condition(where_, bindings)
}

/// Compile a clause list with default options.
pub fn compile_clause(data: &Clauses, prefix: &str, joiner: &str, extra: &Params) -> Fragment {
    Compiler::default().compile_clause(data, prefix, joiner, extra)
}

/// Expand named list bindings with default options.
pub fn expand_arrays(sql: &str, params: &Params) -> Fragment {
    Compiler::default().expand_arrays(sql, params)
}

/// Rename positional markers.
pub fn normalize_positional(sql: &str, bindings: &Params, prefix: &str) -> Fragment {
    normalize::normalize_positional(sql, bindings, prefix)
}
