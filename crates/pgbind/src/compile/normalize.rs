use crate::marker::{Token, tokenize};
use crate::params::{BindKey, Fragment, Params};

/// Rewrite every `?` in `sql` into `:{prefix}{i}` (0-based, scan order).
///
/// A positional binding at index `i` moves to the new name. When no binding exists
/// for an index the renamed marker is left unresolved so the driver reports it.
/// Named bindings, and positional bindings past the last marker, are carried over
/// unchanged in their original order.
pub(crate) fn normalize_positional(sql: &str, bindings: &Params, prefix: &str) -> Fragment {
    let tokens = tokenize(sql);
    if !tokens.iter().any(|t| matches!(t, Token::Positional)) {
        return Fragment::new(sql, bindings.clone());
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut markers = 0usize;
    for token in &tokens {
        match token {
            Token::Positional => {
                out.push(':');
                out.push_str(prefix);
                out.push_str(&markers.to_string());
                markers += 1;
            }
            other => other.write_to(&mut out),
        }
    }

    let params = bindings
        .iter()
        .map(|(key, value)| match key {
            BindKey::Index(i) if *i < markers => {
                (BindKey::Name(format!("{prefix}{i}")), value.clone())
            }
            _ => (key.clone(), value.clone()),
        })
        .collect::<Params>();

    Fragment::new(out, params)
}
