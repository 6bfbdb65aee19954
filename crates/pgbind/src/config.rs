use serde::Deserialize;

/// How column and table identifiers are quoted in generated SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentQuote {
    /// `` `name` ``
    #[default]
    Backtick,
    /// `"name"` (PostgreSQL, ANSI)
    Double,
}

impl IdentQuote {
    /// Quote `ident` verbatim, doubling any embedded quote character.
    ///
    /// No allow-listing happens here; filter untrusted column names before they reach
    /// the compiler.
    pub fn quote(self, ident: &str) -> String {
        let q = match self {
            IdentQuote::Backtick => '`',
            IdentQuote::Double => '"',
        };
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(q);
        for c in ident.chars() {
            if c == q {
                out.push(q);
            }
            out.push(c);
        }
        out.push(q);
        out
    }

    /// Quote each `.`-separated segment (`schema.table`).
    pub fn quote_path(self, path: &str) -> String {
        path.split('.')
            .map(|seg| self.quote(seg))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Options for the condition compiler.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Identifier quote style for `column = :marker` clauses.
    pub quote: IdentQuote,
    /// Emit a `tracing` debug event whenever an array binding is dropped instead of
    /// expanded (numeric key or empty list).
    pub log_skipped_expansions: bool,
}

impl CompileOptions {
    /// Defaults: backtick quoting, no skip logging.
    pub fn new() -> Self {
        Self::default()
    }

    /// Double-quoted identifiers, as PostgreSQL expects.
    pub fn postgres() -> Self {
        Self::default().with_quote(IdentQuote::Double)
    }

    pub fn with_quote(mut self, quote: IdentQuote) -> Self {
        self.quote = quote;
        self
    }

    pub fn log_skipped_expansions(mut self, enabled: bool) -> Self {
        self.log_skipped_expansions = enabled;
        self
    }
}

/// Default capacity of the per-connection column cache.
pub const DEFAULT_COLUMN_CACHE_CAPACITY: usize = 64;

/// Environment variable read by [`ExecConfig::from_env`].
pub const DEBUG_ENV: &str = "PGBIND_DEBUG";

/// Execution settings for [`crate::Db`] and [`crate::Statement`].
///
/// Debug output is off by default and must be explicitly enabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// On driver failure, log a dump of the statement and its parameters.
    pub debug_dump: bool,
    /// Number of tables whose column lists are cached per connection.
    pub column_cache_capacity: usize,
    /// Compiler options used for generated SQL.
    pub compile: CompileOptions,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            debug_dump: false,
            column_cache_capacity: DEFAULT_COLUMN_CACHE_CAPACITY,
            compile: CompileOptions::postgres(),
        }
    }
}

impl ExecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with debug output switched on when `PGBIND_DEBUG` is `1` or `true`.
    pub fn from_env() -> Self {
        let debug = std::env::var(DEBUG_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self::default().debug(debug)
    }

    /// Toggle debug dumps and skipped-expansion logging together.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug_dump = enabled;
        self.compile.log_skipped_expansions = enabled;
        self
    }

    pub fn with_column_cache_capacity(mut self, capacity: usize) -> Self {
        self.column_cache_capacity = capacity;
        self
    }

    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.compile = options;
        self
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(IdentQuote::Backtick.quote("status"), "`status`");
        assert_eq!(IdentQuote::Backtick.quote("a`b"), "`a``b`");
        assert_eq!(IdentQuote::Double.quote("a\"b"), "\"a\"\"b\"");
        assert_eq!(
            IdentQuote::Double.quote_path("public.users"),
            "\"public\".\"users\""
        );
    }

    #[test]
    fn exec_defaults() {
        let cfg = ExecConfig::default();
        assert!(!cfg.debug_dump);
        assert_eq!(cfg.column_cache_capacity, DEFAULT_COLUMN_CACHE_CAPACITY);
        assert_eq!(cfg.compile.quote, IdentQuote::Double);
    }

    #[test]
    fn debug_toggles_both_flags() {
        let cfg = ExecConfig::new().debug(true);
        assert!(cfg.debug_dump);
        assert!(cfg.compile.log_skipped_expansions);
    }

    #[test]
    fn deserializes_partial_config() {
        let cfg: ExecConfig =
            serde_json::from_str(r#"{"debug_dump": true, "compile": {"quote": "backtick"}}"#)
                .unwrap();
        assert!(cfg.debug_dump);
        assert_eq!(cfg.column_cache_capacity, DEFAULT_COLUMN_CACHE_CAPACITY);
        assert_eq!(cfg.compile.quote, IdentQuote::Backtick);
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
