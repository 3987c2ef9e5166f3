//! Tag Index Module
//!
//! Bidirectional tag ↔ key mapping used for group invalidation.

use std::collections::{HashMap, HashSet};

// == Tag Index ==
/// Tracks which keys carry which tags.
///
/// Invariant: `key` is in `tag_keys[tag]` iff `tag` is in `key_tags[key]`.
#[derive(Debug, Default)]
pub struct TagIndex {
    /// tag -> keys carrying it
    tag_keys: HashMap<String, HashSet<String>>,
    /// key -> its tags, in association order
    key_tags: HashMap<String, Vec<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // == Associate ==
    /// Replaces the tag set of `key` with `tags`.
    pub fn associate(&mut self, key: &str, tags: &[String]) {
        self.dissociate(key);

        let mut seen = HashSet::new();
        let tags: Vec<String> = tags
            .iter()
            .filter(|tag| seen.insert(*tag))
            .cloned()
            .collect();
        if tags.is_empty() {
            return;
        }

        for tag in &tags {
            self.tag_keys
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.key_tags.insert(key.to_string(), tags);
    }

    // == Dissociate ==
    /// Drops every association of `key`, pruning tags left without keys.
    pub fn dissociate(&mut self, key: &str) {
        let Some(tags) = self.key_tags.remove(key) else {
            return;
        };

        for tag in tags {
            if let Some(keys) = self.tag_keys.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_keys.remove(&tag);
                }
            }
        }
    }

    // == Keys For ==
    /// Union of the keys carrying any of `tags`.
    pub fn keys_for(&self, tags: &[String]) -> HashSet<String> {
        tags.iter()
            .filter_map(|tag| self.tag_keys.get(tag))
            .flat_map(|keys| keys.iter().cloned())
            .collect()
    }

    pub fn tags_for(&self, key: &str) -> Option<&[String]> {
        self.key_tags.get(key).map(Vec::as_slice)
    }

    /// Number of tags with at least one key.
    pub fn tag_count(&self) -> usize {
        self.tag_keys.len()
    }

    /// Number of keys with at least one tag.
    #[cfg(test)]
    pub(crate) fn tagged_key_count(&self) -> usize {
        self.key_tags.len()
    }

    pub fn clear(&mut self) {
        self.tag_keys.clear();
        self.key_tags.clear();
    }

    /// Checks the bidirectional invariant.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let forward = self.key_tags.iter().all(|(key, tags)| {
            !tags.is_empty()
                && tags
                    .iter()
                    .all(|tag| self.tag_keys.get(tag).is_some_and(|keys| keys.contains(key)))
        });
        let backward = self.tag_keys.iter().all(|(tag, keys)| {
            !keys.is_empty()
                && keys
                    .iter()
                    .all(|key| self.key_tags.get(key).is_some_and(|tags| tags.contains(tag)))
        });
        forward && backward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_associate_and_lookup() {
        let mut index = TagIndex::new();

        index.associate("k1", &tags(&["t1"]));
        index.associate("k2", &tags(&["t2"]));
        index.associate("k3", &tags(&["t1", "t2"]));

        let keys = index.keys_for(&tags(&["t1"]));
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("k1"));
        assert!(keys.contains("k3"));

        let keys = index.keys_for(&tags(&["t1", "t2"]));
        assert_eq!(keys.len(), 3);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_associate_replaces_previous_tags() {
        let mut index = TagIndex::new();

        index.associate("k1", &tags(&["old"]));
        index.associate("k1", &tags(&["new"]));

        assert_eq!(index.tags_for("k1"), Some(&tags(&["new"])[..]));
        assert!(index.keys_for(&tags(&["old"])).is_empty());
        assert_eq!(index.tag_count(), 1);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_associate_collapses_duplicates() {
        let mut index = TagIndex::new();

        index.associate("k1", &tags(&["a", "b", "a"]));

        assert_eq!(index.tags_for("k1"), Some(&tags(&["a", "b"])[..]));
        index.dissociate("k1");
        assert_eq!(index.tag_count(), 0);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_associate_empty_untags_key() {
        let mut index = TagIndex::new();

        index.associate("k1", &tags(&["a"]));
        index.associate("k1", &[]);

        assert!(index.tags_for("k1").is_none());
        assert_eq!(index.tag_count(), 0);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_dissociate_prunes_empty_tags() {
        let mut index = TagIndex::new();

        index.associate("k1", &tags(&["shared", "solo"]));
        index.associate("k2", &tags(&["shared"]));
        index.dissociate("k1");

        assert_eq!(index.tag_count(), 1);
        assert_eq!(index.tagged_key_count(), 1);
        assert!(index.keys_for(&tags(&["solo"])).is_empty());
        assert!(index.is_consistent());
    }

    #[test]
    fn test_dissociate_unknown_key_is_noop() {
        let mut index = TagIndex::new();
        index.associate("k1", &tags(&["a"]));

        index.dissociate("missing");

        assert_eq!(index.tagged_key_count(), 1);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_clear() {
        let mut index = TagIndex::new();
        index.associate("k1", &tags(&["a"]));
        index.clear();

        assert_eq!(index.tag_count(), 0);
        assert!(index.tags_for("k1").is_none());
    }
}
