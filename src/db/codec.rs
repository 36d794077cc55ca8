//! JSON-in-column adapter used for every list-valued column.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Parses a JSON array column; an unreadable column decodes as empty.
pub fn decode_list<T: DeserializeOwned>(column: &str, raw: &str) -> Vec<T> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<T>>(raw) {
        Ok(items) => items,
        Err(e) => {
            warn!("unreadable {} column {:?}: {}", column, raw, e);
            Vec::new()
        }
    }
}

/// Like [`decode_list`], but keeps every element that parses and drops the rest.
pub fn decode_list_lossy<T: DeserializeOwned>(column: &str, raw: &str) -> Vec<T> {
    let values: Vec<Value> = decode_list(column, raw);
    let total = values.len();
    let items: Vec<T> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if items.len() != total {
        warn!(
            "dropped {} unreadable entries from {} column",
            total - items.len(),
            column
        );
    }
    items
}

pub fn encode_list<T: Serialize>(items: &[T]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentRestriction, RestrictionLevel, Weekday};

    #[test]
    fn test_decode_falls_back_to_empty() {
        assert_eq!(decode_list::<u8>("grades", "[1,2,3]"), vec![1, 2, 3]);
        assert!(decode_list::<u8>("grades", "").is_empty());
        assert!(decode_list::<u8>("grades", "1,2").is_empty());
        assert!(decode_list::<u8>("grades", "{\"a\":1}").is_empty());
    }

    #[test]
    fn test_lossy_decode_keeps_good_restrictions() {
        let raw = r#"[
            {"restrictedDay":"火曜","restrictedPeriods":[2],"restrictionLevel":"recommended"},
            {"restrictedDay":"日曜","restrictedPeriods":[1],"restrictionLevel":"required"},
            {"restrictedDay":"水曜","restrictedPeriods":[5,6],"restrictionLevel":"必須","reason":"部活"}
        ]"#;
        let items: Vec<AssignmentRestriction> = decode_list_lossy("assignment_restrictions", raw);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].restricted_day, Weekday::Tuesday);
        assert_eq!(items[1].restriction_level, RestrictionLevel::Required);
        assert_eq!(items[1].reason.as_deref(), Some("部活"));
    }

    #[test]
    fn test_encode_round_trips() {
        let encoded = encode_list(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(encoded, r#"["a","b"]"#);
        assert_eq!(decode_list::<String>("subjects", &encoded), vec!["a", "b"]);
    }
}
