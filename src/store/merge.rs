use serde_json::Value;

use super::{Document, WriteMode};

/// Resulting document after writing `incoming` over `existing`.
pub fn apply_write(existing: Option<Document>, incoming: Document, mode: WriteMode) -> Document {
    match (mode, existing) {
        (WriteMode::Overwrite | WriteMode::Create, _) | (_, None) => incoming,
        (WriteMode::Merge, Some(mut doc)) => {
            merge_into(&mut doc, incoming);
            doc
        }
        (WriteMode::FillMissing, Some(mut doc)) => {
            fill_missing(&mut doc, incoming);
            doc
        }
    }
}

/// Nested objects merge field by field; anything else is replaced.
fn merge_into(target: &mut Document, incoming: Document) {
    for (key, value) in incoming {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(old)), Value::Object(new)) => merge_into(old, new),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

fn fill_missing(target: &mut Document, incoming: Document) {
    for (key, value) in incoming {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(old)), Value::Object(new)) => fill_missing(old, new),
            (Some(_), _) => {}
            (None, value) => {
                target.insert(key, value);
            }
        }
    }
}
