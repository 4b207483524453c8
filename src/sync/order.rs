use std::cmp::Ordering;

use crate::store::DocEntry;

use super::OrderPolicy;

fn key(entry: &DocEntry, field: &str) -> Option<f64> {
    entry.data.get(field).and_then(|v| v.as_f64())
}

/// Client-side stand-in for a server ordered, limited query. Entries
/// without a numeric key sort lowest, ties fall back to the document id.
pub fn order_and_truncate(mut entries: Vec<DocEntry>, policy: &OrderPolicy) -> Vec<DocEntry> {
    entries.sort_by(|a, b| {
        let by_key = match (key(a, policy.field), key(b, policy.field)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ord = by_key.then_with(|| a.id.cmp(&b.id));
        if policy.descending { ord.reverse() } else { ord }
    });
    if let Some(limit) = policy.limit {
        entries.truncate(limit);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, ts: Option<i64>) -> DocEntry {
        let data = match ts {
            Some(t) => json!({ "timestamp": t }),
            None => json!({}),
        };
        DocEntry {
            id: id.to_string(),
            data: data.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn newest_first_and_truncated() {
        let entries = (0..15).map(|i| entry(&format!("e{i:02}"), Some(i * 10))).collect();
        let out = order_and_truncate(entries, &OrderPolicy::newest_first("timestamp", 10));
        let ids: Vec<_> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids[0], "e14");
        assert_eq!(ids[9], "e05");
    }

    #[test]
    fn entries_without_key_go_last() {
        let out = order_and_truncate(
            vec![entry("a", None), entry("b", Some(1)), entry("c", Some(2))],
            &OrderPolicy::newest_first("timestamp", 10),
        );
        let ids: Vec<_> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }
}
