//! Accumulating key/value context threaded through the pipeline
//!
//! Each stage reads the fields written by earlier stages and contributes its
//! own. Merging is insert-only: a field written by one stage stays present
//! and unchanged through every later stage, so the terminal record sees the
//! full accumulated context.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Well-known payload keys written by the pipeline stages.
pub mod keys {
    /// Written at seed time; survives to the terminal record
    pub const KEYWORD: &str = "keyword";

    /// Product identifier, written by the search stage
    pub const ASIN: &str = "asin";

    /// Canonical detail-page URL, written by the search stage
    pub const ITEM_URL: &str = "itemUrl";

    /// Product title, written by the search stage
    pub const TITLE: &str = "title";

    /// Description text, written by the description stage; null when the
    /// listing has no description container
    pub const DESCRIPTION: &str = "productDescription";
}

/// Ordered key/value bag carried by a work item across stage transitions.
///
/// The ordered map makes serialization deterministic, so dispatching the
/// same page with the same payload produces byte-identical work items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, Value>);

impl Payload {
    /// Creates an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the seed payload: exactly the search keyword, nothing else
    pub fn seed(keyword: &str) -> Self {
        let mut payload = Self::new();
        payload.insert(keys::KEYWORD, keyword);
        payload
    }

    /// Gets a field by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Gets a field as a string slice, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Inserts a field, keeping any existing value for the key
    ///
    /// Returns true if the field was inserted, false if the key was already
    /// present (the earlier write wins).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, value.into());
        true
    }

    /// Returns a copy of this payload extended with the given fields
    ///
    /// Existing keys win over the new fields, preserving everything earlier
    /// stages wrote.
    pub fn merged(&self, fields: Vec<(&str, Value)>) -> Self {
        let mut payload = self.clone();
        for (key, value) in fields {
            payload.insert(key, value);
        }
        payload
    }

    /// The search keyword, present from seed time onward
    pub fn keyword(&self) -> Option<&str> {
        self.get_str(keys::KEYWORD)
    }

    /// The product identifier, present from the search stage onward
    pub fn asin(&self) -> Option<&str> {
        self.get_str(keys::ASIN)
    }

    /// The detail-page URL, present from the search stage onward
    pub fn item_url(&self) -> Option<&str> {
        self.get_str(keys::ITEM_URL)
    }

    /// The product title, present from the search stage onward
    pub fn title(&self) -> Option<&str> {
        self.get_str(keys::TITLE)
    }

    /// The product description text
    ///
    /// Returns None both when the key is absent and when it was recorded as
    /// an explicit null (listing without a description container).
    pub fn description(&self) -> Option<&str> {
        self.get_str(keys::DESCRIPTION)
    }

    /// Number of fields in the payload
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the payload has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes the payload for queue persistence
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    /// Deserializes a payload from its queue representation
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s).map(Payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_contains_exactly_keyword() {
        let payload = Payload::seed("asus zenbook");
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.keyword(), Some("asus zenbook"));
    }

    #[test]
    fn test_insert_keeps_first_write() {
        let mut payload = Payload::seed("laptop");
        assert!(payload.insert(keys::ASIN, "B08X1"));
        assert!(!payload.insert(keys::ASIN, "B99Z9"));
        assert_eq!(payload.asin(), Some("B08X1"));
    }

    #[test]
    fn test_merged_preserves_existing_fields() {
        let payload = Payload::seed("laptop");
        let merged = payload.merged(vec![
            (keys::ASIN, Value::from("B08X1")),
            (keys::KEYWORD, Value::from("overwritten")),
        ]);

        // New field lands, the seed keyword is untouched
        assert_eq!(merged.asin(), Some("B08X1"));
        assert_eq!(merged.keyword(), Some("laptop"));

        // The original payload is unchanged
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_null_description_reads_as_none() {
        let payload = Payload::new().merged(vec![(keys::DESCRIPTION, Value::Null)]);
        assert!(payload.get(keys::DESCRIPTION).is_some());
        assert_eq!(payload.description(), None);
    }

    #[test]
    fn test_json_roundtrip() {
        let payload = Payload::seed("laptop").merged(vec![
            (keys::ASIN, Value::from("B08X1")),
            (keys::DESCRIPTION, Value::Null),
        ]);

        let json = payload.to_json().unwrap();
        let parsed = Payload::from_json(&json).unwrap();
        assert_eq!(payload, parsed);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let mut a = Payload::new();
        a.insert("zeta", "1");
        a.insert("alpha", "2");

        let mut b = Payload::new();
        b.insert("alpha", "2");
        b.insert("zeta", "1");

        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }
}
