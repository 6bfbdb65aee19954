//! Parameter maps and compiled fragments.

use crate::value::Value;
use std::fmt;

/// The key of a binding: a position (for `?` markers) or a name (for `:name` markers).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindKey {
    /// 0-based position, matched against the n-th `?` marker.
    Index(usize),
    /// Marker name without the leading `:`.
    Name(String),
}

impl BindKey {
    /// Build a named key, stripping one leading `:` if present.
    pub fn name(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_prefix(':') {
            Some(stripped) => BindKey::Name(stripped.to_string()),
            None => BindKey::Name(name),
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            BindKey::Name(n) => Some(n),
            BindKey::Index(_) => None,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, BindKey::Index(_))
    }
}

impl fmt::Display for BindKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindKey::Index(i) => write!(f, "{}", i),
            BindKey::Name(n) => write!(f, ":{}", n),
        }
    }
}

impl From<usize> for BindKey {
    fn from(i: usize) -> Self {
        BindKey::Index(i)
    }
}

impl From<&str> for BindKey {
    fn from(name: &str) -> Self {
        BindKey::name(name)
    }
}

impl From<String> for BindKey {
    fn from(name: String) -> Self {
        BindKey::name(name)
    }
}

impl From<&String> for BindKey {
    fn from(name: &String) -> Self {
        BindKey::name(name.as_str())
    }
}

/// An insertion-ordered map from [`BindKey`] to [`Value`].
///
/// Used both for caller bindings (which may mix positional and named keys) and for
/// compiled parameters (named keys only once compilation has run).
#[derive(Debug, Clone, Default)]
pub struct Params {
    entries: Vec<(BindKey, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BindKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &BindKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Iterate over named entries only.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(k, _)| k.as_name())
    }

    pub fn get(&self, key: impl Into<BindKey>) -> Option<&Value> {
        let key = key.into();
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: impl Into<BindKey>) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace. A replaced entry keeps its position.
    pub fn insert(&mut self, key: impl Into<BindKey>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Append a positional value after the highest existing index.
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        let next = self
            .entries
            .iter()
            .filter_map(|(k, _)| match k {
                BindKey::Index(i) => Some(i + 1),
                BindKey::Name(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.entries.push((BindKey::Index(next), value.into()));
        self
    }

    pub fn remove(&mut self, key: impl Into<BindKey>) -> Option<Value> {
        let key = key.into();
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Insert every entry of `other`, replacing existing keys.
    pub fn merge(&mut self, other: Params) -> &mut Self {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
        self
    }

    /// Whether any entry holds a list.
    pub fn has_list(&self) -> bool {
        self.entries.iter().any(|(_, v)| v.is_list())
    }

    /// The only value, if there is exactly one and it is not a list.
    pub fn single_scalar(&self) -> Option<&Value> {
        match self.entries.as_slice() {
            [(_, v)] if !v.is_list() => Some(v),
            _ => None,
        }
    }
}

impl IntoIterator for Params {
    type Item = (BindKey, Value);
    type IntoIter = std::vec::IntoIter<(BindKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<BindKey>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        let mut params = Params::new();
        params.push(value);
        params
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        let mut params = Params::new();
        for v in values {
            params.push(v);
        }
        params
    }
}

impl From<Option<Params>> for Params {
    fn from(params: Option<Params>) -> Self {
        params.unwrap_or_default()
    }
}

/// A compiled `(sql, params)` pair.
///
/// Each compilation stage consumes references and returns a new `Fragment`; nothing
/// is rewritten in place.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    sql: String,
    params: Params,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Whether the SQL text is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn into_parts(self) -> (String, Params) {
        (self.sql, self.params)
    }
}

/// Build [`Params`] from positional values or `name => value` pairs.
///
/// ```ignore
/// let positional = bindings!["active", [1, 2]];
/// let named = bindings! { "ids" => vec![1, 2, 3], "status" => "active" };
/// ```
#[macro_export]
macro_rules! bindings {
    () => {
        $crate::Params::new()
    };
    ($($name:literal => $value:expr),+ $(,)?) => {{
        let mut params = $crate::Params::new();
        $( params.insert($name, $crate::Value::from($value)); )+
        params
    }};
    ($($value:expr),+ $(,)?) => {{
        let mut params = $crate::Params::new();
        $( params.push($crate::Value::from($value)); )+
        params
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_strip_leading_colon() {
        assert_eq!(BindKey::from(":ids"), BindKey::Name("ids".into()));
        assert_eq!(BindKey::from("ids"), BindKey::Name("ids".into()));
        assert_eq!(BindKey::from(":ids").to_string(), ":ids");
    }

    #[test]
    fn push_continues_after_highest_index() {
        let mut p = Params::new();
        p.insert(3usize, 1);
        p.insert("x", 2);
        p.push(3);
        let keys: Vec<_> = p.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![BindKey::Index(3), BindKey::name("x"), BindKey::Index(4)]
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut p = bindings! { "a" => 1, "b" => 2 };
        assert!(p.insert(":a", 10).is_some());
        let rendered: Vec<_> = p.iter().map(|(k, v)| format!("{k}={}", v.render())).collect();
        assert_eq!(rendered, vec![":a=10", ":b=2"]);
    }

    #[test]
    fn single_scalar_detection() {
        assert!(bindings![5].single_scalar().is_some());
        assert!(bindings![vec![1, 2]].single_scalar().is_none());
        assert!(bindings![1, 2].single_scalar().is_none());
        assert!(Params::new().single_scalar().is_none());
    }

    #[test]
    fn macro_builds_positional_and_named() {
        let p = bindings!["active", [1, 2]];
        assert!(p.get(0usize).is_some());
        assert!(p.get(1usize).is_some_and(Value::is_list));

        let n = bindings! { "ids" => vec![1, 2, 3] };
        assert!(n.get("ids").is_some_and(Value::is_list));
    }
}
