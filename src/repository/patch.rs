//! Serde support for changeset fields.
//!
//! Changeset fields are declared as
//! `#[serde(default, deserialize_with = "provided")] field: Option<T>`.
//! A missing key falls back to `None` ("not provided"), a present key is
//! wrapped in `Some`. With `T = String` an explicit `null` fails to
//! deserialize; with `T = Option<U>` it becomes `Some(None)` and clears the
//! column.

use serde::{Deserialize, Deserializer};

pub fn provided<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Changes {
        #[serde(default, deserialize_with = "provided")]
        title: Option<String>,
        #[serde(default, deserialize_with = "provided")]
        owner: Option<Option<i64>>,
    }

    #[test]
    fn missing_keys_are_not_provided() {
        let c: Changes = serde_json::from_value(json!({})).unwrap();
        assert_eq!(c.title, None);
        assert_eq!(c.owner, None);
    }

    #[test]
    fn present_keys_are_provided() {
        let c: Changes = serde_json::from_value(json!({"title": "x", "owner": 3})).unwrap();
        assert_eq!(c.title.as_deref(), Some("x"));
        assert_eq!(c.owner, Some(Some(3)));
    }

    #[test]
    fn null_clears_nullable_fields() {
        let c: Changes = serde_json::from_value(json!({"owner": null})).unwrap();
        assert_eq!(c.owner, Some(None));
    }

    #[test]
    fn null_is_rejected_for_required_fields() {
        let err = serde_json::from_value::<Changes>(json!({"title": null})).unwrap_err();
        assert!(err.to_string().contains("invalid type: null"));
    }
}
