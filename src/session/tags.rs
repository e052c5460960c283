//! Tags describing the request that opened a session.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::PagerError;
use crate::Result;

/// A single (key, value) tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered tag list in which every key appears at most once.
///
/// Insertion order is preserved. Construction fails with
/// [`PagerError::InvalidRequest`] when a key is repeated; duplicates are
/// never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tags(Vec<Tag>);

impl Tags {
    /// An empty tag list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a tag list from (key, value) pairs, rejecting repeated keys.
    pub fn try_from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut tags = Vec::new();

        for (key, value) in pairs {
            let tag = Tag::new(key, value);
            if !seen.insert(tag.key.clone()) {
                return Err(PagerError::InvalidRequest(format!(
                    "duplicate tag key '{}'",
                    tag.key
                )));
            }
            tags.push(tag);
        }

        Ok(Self(tags))
    }

    /// Look up the value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_order() {
        let tags = Tags::try_from_pairs([("task", "cpu"), ("node", "n1"), ("level", "debug")])
            .unwrap();
        let keys: Vec<_> = tags.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["task", "node", "level"]);
        assert_eq!(tags.get("node"), Some("n1"));
        assert_eq!(tags.get("missing"), None);
    }

    #[test]
    fn test_rejects_duplicate_key() {
        let err = Tags::try_from_pairs([("task", "a"), ("node", "n1"), ("task", "b")])
            .unwrap_err();
        assert!(matches!(err, PagerError::InvalidRequest(_)));
        assert!(err.to_string().contains("task"));
    }

    #[test]
    fn test_same_value_different_keys_ok() {
        let tags = Tags::try_from_pairs([("a", "x"), ("b", "x")]).unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_empty() {
        let tags = Tags::try_from_pairs(Vec::<(String, String)>::new()).unwrap();
        assert!(tags.is_empty());
        assert_eq!(tags, Tags::empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let tags = Tags::try_from_pairs([("k", "v")]).unwrap();
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"[{"key":"k","value":"v"}]"#);
    }
}
