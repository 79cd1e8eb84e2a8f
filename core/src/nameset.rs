//! The NameSet overlay: a secondary, Name-only dictionary scoped to a
//! user-selected set, plus the registry of available sets.

use crate::priority::Priority;
use crate::trie::Dictionary;

/// Sentinel meaning "no overlay active".
pub const NO_NAME_SET: i64 = -1;

/// A single name-translation overlay. Internally a [`Dictionary`], but the
/// overlay only ever carries `Name` payloads, so `find`/`find_exact` here
/// only ever report `Priority::Name` hits.
#[derive(Debug, Default)]
pub struct NameSet {
    dict: Dictionary,
}

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &[char], value: &str) {
        self.dict.insert(key, value, Priority::Name);
    }

    pub fn insert_bulk(&mut self, key: &[char], value: &str) {
        self.dict.insert_bulk(key, Priority::Name, value);
    }

    pub fn remove(&mut self, key: &[char]) {
        self.dict.remove(key, Priority::Name);
    }

    /// Longest Name match at `text[start..]`. Length 0 means no match; the
    /// overlay never reports a Phrase hit.
    pub fn find(&self, text: &[char], start: usize) -> (usize, Option<String>) {
        let m = self.dict.find(text, start);
        match m.priority {
            Priority::Name => (m.length, m.translation),
            _ => (0, None),
        }
    }

    pub fn find_exact(&self, key: &[char]) -> Option<String> {
        self.dict.find_exact(key).name_translation
    }
}

/// Metadata entry for one selectable name set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSetInfo {
    pub id: i64,
    pub title: String,
}

/// Owns the list of available name sets and whichever one is currently
/// active (or none, per [`NO_NAME_SET`]).
#[derive(Debug, Default)]
pub struct NameSetRegistry {
    metadata: Vec<NameSetInfo>,
    active_id: i64,
    active: Option<NameSet>,
}

impl NameSetRegistry {
    pub fn new() -> Self {
        Self {
            metadata: Vec::new(),
            active_id: NO_NAME_SET,
            active: None,
        }
    }

    pub fn with_metadata(metadata: Vec<NameSetInfo>) -> Self {
        Self {
            metadata,
            active_id: NO_NAME_SET,
            active: None,
        }
    }

    pub fn metadata(&self) -> &[NameSetInfo] {
        &self.metadata
    }

    pub fn active_id(&self) -> i64 {
        self.active_id
    }

    pub fn active(&self) -> Option<&NameSet> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut NameSet> {
        self.active.as_mut()
    }

    /// Replace the active overlay wholesale. `id == NO_NAME_SET` disables it.
    pub fn switch_to(&mut self, id: i64, entries: NameSet) {
        self.active_id = id;
        self.active = if id == NO_NAME_SET { None } else { Some(entries) };
    }

    pub fn disable(&mut self) {
        self.active_id = NO_NAME_SET;
        self.active = None;
    }

    /// Resolve a set title case-insensitively, mirroring the CLI's nameset
    /// lookup by display name.
    pub fn find_by_title(&self, title: &str) -> Option<&NameSetInfo> {
        self.metadata
            .iter()
            .find(|m| m.title.eq_ignore_ascii_case(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_reports_name_only() {
        let mut ns = NameSet::new();
        let key: Vec<char> = "阮".chars().collect();
        ns.insert(&key, "Nguyen");
        let (len, translation) = ns.find(&key, 0);
        assert_eq!(len, 1);
        assert_eq!(translation.as_deref(), Some("Nguyen"));
    }

    #[test]
    fn sentinel_disables_overlay() {
        let mut registry = NameSetRegistry::new();
        registry.switch_to(NO_NAME_SET, NameSet::new());
        assert!(registry.active().is_none());
        assert_eq!(registry.active_id(), NO_NAME_SET);
    }

    #[test]
    fn find_by_title_is_case_insensitive() {
        let registry = NameSetRegistry::with_metadata(vec![NameSetInfo {
            id: 1,
            title: "Tang Dynasty".into(),
        }]);
        assert_eq!(registry.find_by_title("tang dynasty").unwrap().id, 1);
        assert!(registry.find_by_title("song dynasty").is_none());
    }
}
