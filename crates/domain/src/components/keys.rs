//! Key rewriting for copied components.
//!
//! Keys are property-bag path segments, so two nodes of one layout must not
//! share a key. Pasted or newly dropped components get their colliding keys
//! rewritten to `<key>_copy`, `<key>_copy2`, ... before insertion.

use std::collections::HashSet;

use serde_json::Value;

use super::ComponentDoc;

fn fresh_key(base: &str, taken: &HashSet<String>) -> String {
    let first = format!("{}_copy", base);
    if !taken.contains(&first) {
        return first;
    }
    (2..)
        .map(|n| format!("{}_copy{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(first)
}

fn rename_in_value(value: &mut Value, taken: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            if map.get("type").is_some_and(Value::is_string) {
                if let Some(Value::String(key)) = map.get_mut("key") {
                    if taken.contains(key.as_str()) {
                        *key = fresh_key(key, taken);
                    }
                    taken.insert(key.clone());
                }
            }
            for (name, child) in map.iter_mut() {
                if name != "key" {
                    rename_in_value(child, taken);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rename_in_value(item, taken);
            }
        }
        _ => {}
    }
}

fn rename_in_doc(doc: &mut ComponentDoc, taken: &mut HashSet<String>) {
    if let Some(key) = doc.key.as_mut() {
        if taken.contains(key.as_str()) {
            *key = fresh_key(key, taken);
        }
        taken.insert(key.clone());
    }
    for child in doc.fields.values_mut() {
        rename_in_value(child, taken);
    }
}

/// Rewrites every key in `docs` (recursively, through nested contents) that
/// collides with `existing` or with a key assigned earlier in the batch.
pub fn update_keys_on_copy<'a>(
    docs: Vec<ComponentDoc>,
    existing: impl IntoIterator<Item = &'a str>,
) -> Vec<ComponentDoc> {
    let mut taken: HashSet<String> = existing.into_iter().map(str::to_string).collect();
    docs.into_iter()
        .map(|mut doc| {
            rename_in_doc(&mut doc, &mut taken);
            doc
        })
        .collect()
}
