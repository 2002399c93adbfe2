//! Archival Unit item metadata.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Well-known keys in [`ItemMetadata::scalar_map`].
pub mod keys {
    /// Identifier of the Archival Unit owning the item.
    pub const AU_ID: &str = "au_id";
    pub const DOI: &str = "doi";
    pub const ISSN: &str = "issn";
    pub const EISSN: &str = "eissn";
    pub const ISBN: &str = "isbn";
    pub const VOLUME: &str = "volume";
    pub const ISSUE: &str = "issue";
    pub const START_PAGE: &str = "start_page";
    /// URL at which the item's content is served.
    pub const ACCESS_URL: &str = "access_url";
}

/// One metadata record of an AU.
///
/// The field maps are opaque to the service apart from the keys in [`keys`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    /// Store-assigned sequence. Items of one AU are totally ordered by it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub scalar_map: BTreeMap<String, String>,
    #[serde(default)]
    pub set_map: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub list_map: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub map_map: BTreeMap<String, BTreeMap<String, String>>,
}

impl ItemMetadata {
    /// Create an empty item belonging to an AU.
    pub fn for_au(au_id: impl Into<String>) -> Self {
        let mut item = Self::default();
        item.scalar_map.insert(keys::AU_ID.to_string(), au_id.into());
        item
    }

    /// Builder-style scalar setter.
    pub fn with_scalar(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.scalar_map.insert(key.into(), value.into());
        self
    }

    /// Look up a scalar field.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.scalar_map.get(key).map(String::as_str)
    }

    /// The owning AU, if present.
    pub fn au_id(&self) -> Option<&str> {
        self.scalar(keys::AU_ID)
    }

    /// Validate an item submitted for insertion and return its AU id.
    pub fn validate_for_insert(&self) -> crate::Result<&str> {
        if self.id.is_some() {
            return Err(crate::Error::InvalidItem(
                "id is assigned by the store and must not be supplied".to_string(),
            ));
        }
        match self.au_id() {
            Some(au_id) if !au_id.trim().is_empty() => Ok(au_id),
            _ => Err(crate::Error::InvalidItem(format!(
                "scalarMap.{} is required",
                keys::AU_ID
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let item = ItemMetadata::for_au("org|lockss|plugin|X")
            .with_scalar(keys::DOI, "10.1000/xyz");
        let json = serde_json::to_value(&item).unwrap();

        assert!(json.get("id").is_none());
        assert_eq!(json["scalarMap"]["au_id"], "org|lockss|plugin|X");
        assert_eq!(json["scalarMap"]["doi"], "10.1000/xyz");
        assert!(json["setMap"].as_object().unwrap().is_empty());
        assert!(json["listMap"].as_object().unwrap().is_empty());
        assert!(json["mapMap"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_partial_body() {
        let json = r#"{"scalarMap": {"au_id": "X"}, "listMap": {"author": ["A", "B"]}}"#;
        let item: ItemMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(item.au_id(), Some("X"));
        assert_eq!(item.list_map["author"], vec!["A", "B"]);
        assert!(item.set_map.is_empty());
    }

    #[test]
    fn test_validate_for_insert() {
        assert_eq!(
            ItemMetadata::for_au("X").validate_for_insert().unwrap(),
            "X"
        );
        assert!(ItemMetadata::default().validate_for_insert().is_err());
        assert!(ItemMetadata::for_au("   ").validate_for_insert().is_err());

        let mut with_id = ItemMetadata::for_au("X");
        with_id.id = Some(7);
        assert!(with_id.validate_for_insert().is_err());
    }
}
