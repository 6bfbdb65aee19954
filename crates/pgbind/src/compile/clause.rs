use super::normalize::normalize_positional;
use crate::config::CompileOptions;
use crate::marker::count_positional;
use crate::params::{Fragment, Params};
use crate::value::Value;

/// One element of a WHERE predicate or SET list.
#[derive(Debug, Clone)]
pub enum Entry {
    /// Trusted SQL appended verbatim (`NOW()`, `deleted_at IS NULL`, ...).
    ///
    /// Any `?` it contains is bound from the caller's extra bindings.
    Raw(String),
    /// `column = :{prefix}column`, or `column IN (:{prefix}column)` for a list value.
    Column { column: String, value: Value },
    /// SQL with a `?` whose first occurrence is bound to `value`.
    Bound { sql: String, value: Value },
}

/// An ordered collection of clause entries.
///
/// # Example
/// ```ignore
/// use pgbind::Clauses;
///
/// let clauses = Clauses::new()
///     .push("status", "active")        // `status` = :where_status
///     .push("age > ?", 18)             // age > :where__0
///     .raw("deleted_at IS NULL");      // verbatim
/// ```
#[derive(Debug, Clone, Default)]
pub struct Clauses {
    entries: Vec<Entry>,
}

impl Clauses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `key => value` pair.
    ///
    /// A key containing a `?` marker is raw SQL bound to `value`; any other key is a
    /// column name compared for equality. A list value turns the comparison into
    /// `IN (...)`.
    pub fn push(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        let entry = if count_positional(&key) > 0 {
            Entry::Bound { sql: key, value }
        } else {
            Entry::Column { column: key, value }
        };
        self.entries.push(entry);
        self
    }

    /// Add a column equality without inspecting the key.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push(Entry::Column {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Add a raw SQL fragment.
    pub fn raw(mut self, sql: impl Into<String>) -> Self {
        self.entries.push(Entry::Raw(sql.into()));
        self
    }

    /// Add raw SQL whose first `?` is bound to `value`.
    pub fn bind(mut self, sql: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push(Entry::Bound {
            sql: sql.into(),
            value: value.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Keep only entries for which `keep` returns `true`.
    pub fn retain(mut self, keep: impl FnMut(&Entry) -> bool) -> Self {
        self.entries.retain(keep);
        self
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Clauses {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Clauses::new(), |clauses, (k, v)| clauses.push(k, v))
    }
}

impl IntoIterator for Clauses {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Clauses {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

pub(crate) fn compile_clause(
    data: &Clauses,
    prefix: &str,
    joiner: &str,
    extra: &Params,
    options: &CompileOptions,
) -> Fragment {
    let mut parts: Vec<String> = Vec::with_capacity(data.len());
    let mut named = Params::new();
    let mut raw = Params::new();

    let mut extra_positional = extra
        .iter()
        .filter(|(k, _)| k.is_index())
        .map(|(_, v)| v.clone());
    let mut slot = 0usize;

    for entry in data {
        match entry {
            Entry::Raw(sql) => {
                for _ in 0..count_positional(sql) {
                    if let Some(v) = extra_positional.next() {
                        raw.insert(slot, v);
                    }
                    slot += 1;
                }
                parts.push(sql.clone());
            }
            Entry::Bound { sql, value } => {
                let markers = count_positional(sql);
                if markers > 0 {
                    raw.insert(slot, value.clone());
                    slot += 1;
                }
                for _ in 1..markers {
                    if let Some(v) = extra_positional.next() {
                        raw.insert(slot, v);
                    }
                    slot += 1;
                }
                parts.push(sql.clone());
            }
            Entry::Column { column, value } => {
                let quoted = options.quote.quote(column);
                parts.push(if value.is_list() {
                    format!("{quoted} IN (:{prefix}{column})")
                } else {
                    format!("{quoted} = :{prefix}{column}")
                });
                named.insert(format!("{prefix}{column}"), value.clone());
            }
        }
    }

    // Extra positional values no marker asked for ride along after the used slots.
    for v in extra_positional {
        raw.insert(slot, v);
        slot += 1;
    }
    for (k, v) in extra.iter().filter(|(k, _)| !k.is_index()) {
        raw.insert(k.clone(), v.clone());
    }

    let sql = parts.join(joiner);
    let sub_prefix = raw_prefix(prefix, &named, &raw);
    let (sql, raw) = normalize_positional(&sql, &raw, &sub_prefix).into_parts();

    named.merge(raw);
    Fragment::new(sql, named)
}

/// Pick the prefix for renamed `?` markers: `{prefix}_`, with more `_` appended until
/// no existing name starts with it.
fn raw_prefix(prefix: &str, named: &Params, raw: &Params) -> String {
    let mut sub = format!("{prefix}_");
    while named
        .names()
        .chain(raw.names())
        .any(|n| n.starts_with(&sub))
    {
        sub.push('_');
    }
    sub
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_classifies_by_marker() {
        let c = Clauses::new().push("a", 1).push("b > ?", 2).raw("c IS NULL");
        assert!(matches!(c.entries()[0], Entry::Column { .. }));
        assert!(matches!(c.entries()[1], Entry::Bound { .. }));
        assert!(matches!(c.entries()[2], Entry::Raw(_)));
    }

    #[test]
    fn marker_inside_quotes_is_a_column() {
        let c = Clauses::new().push("note = 'huh?'", 1);
        assert!(matches!(c.entries()[0], Entry::Column { .. }));
    }

    #[test]
    fn raw_prefix_avoids_column_names() {
        let named: Params = [("where__0", 1)].into_iter().collect();
        assert_eq!(raw_prefix("where_", &named, &Params::new()), "where___");
        assert_eq!(raw_prefix("where_", &Params::new(), &Params::new()), "where__");
    }

    #[test]
    fn from_iterator_keeps_order() {
        let c: Clauses = [("b", 1), ("a", 2)].into_iter().collect();
        let cols: Vec<_> = c
            .iter()
            .filter_map(|e| match e {
                Entry::Column { column, .. } => Some(column.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(cols, vec!["b", "a"]);
    }
}
