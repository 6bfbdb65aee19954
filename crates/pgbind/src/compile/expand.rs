use crate::config::CompileOptions;
use crate::marker::{Token, tokenize};
use crate::params::{BindKey, Fragment, Params};
use crate::value::Value;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

/// Expand each named list binding into one indexed marker per element.
///
/// `:ids` bound to `[a, b, c]` becomes `:ids0,:ids1,:ids2` wherever `:ids` occurs as a
/// whole marker, and the `ids` entry is replaced by `ids0`, `ids1`, `ids2`. If one of
/// those names is already taken by another binding, a `_` separator is inserted
/// (`ids_0`, ...) until the set is free.
///
/// Names already used as markers in `sql` count as taken too, bound or not.
///
/// List bindings under a positional or all-digit key (`:0`), and empty lists, are
/// dropped.
pub(crate) fn expand_arrays(sql: &str, params: &Params, options: &CompileOptions) -> Fragment {
    if !params.has_list() {
        return Fragment::new(sql, params.clone());
    }

    let tokens = tokenize(sql);
    let mut taken: HashSet<String> = params.names().map(str::to_string).collect();
    taken.extend(tokens.iter().filter_map(|t| match t {
        Token::Named(name) => Some(name.to_string()),
        _ => None,
    }));
    let mut expansions: HashMap<String, Vec<String>> = HashMap::new();
    let mut out_params = Params::new();

    for (key, value) in params.iter() {
        let items = match value {
            Value::List(items) => items,
            _ => {
                out_params.insert(key.clone(), value.clone());
                continue;
            }
        };
        match key {
            BindKey::Name(name) if !items.is_empty() && !is_numeric(name) => {
                let names = expanded_names(name, items.len(), &taken);
                for (n, item) in names.iter().zip(items) {
                    taken.insert(n.clone());
                    out_params.insert(BindKey::Name(n.clone()), Value::Scalar(Arc::clone(item)));
                }
                expansions.insert(name.clone(), names);
            }
            _ => {
                if options.log_skipped_expansions {
                    tracing::debug!(
                        target: "pgbind.compile",
                        key = %key,
                        len = items.len(),
                        "array binding skipped: only non-empty lists under a non-numeric name are expanded"
                    );
                }
            }
        }
    }

    if expansions.is_empty() {
        return Fragment::new(sql, out_params);
    }

    let mut out = String::with_capacity(sql.len() * 2);
    for token in tokens {
        match token {
            Token::Named(name) => match expansions.get(name) {
                Some(names) => {
                    for (i, n) in names.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        let _ = write!(out, ":{}", n);
                    }
                }
                None => token.write_to(&mut out),
            },
            other => other.write_to(&mut out),
        }
    }

    Fragment::new(out, out_params)
}

fn expanded_names(base: &str, len: usize, taken: &HashSet<String>) -> Vec<String> {
    let mut sep = String::new();
    loop {
        let names: Vec<String> = (0..len).map(|i| format!("{base}{sep}{i}")).collect();
        if names.iter().all(|n| !taken.contains(n)) {
            return names;
        }
        sep.push('_');
    }
}

fn is_numeric(name: &str) -> bool {
    name.bytes().all(|b| b.is_ascii_digit())
}
