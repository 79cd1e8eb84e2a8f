//! The primary trie-indexed dictionary: names, phrases, and grammar rules,
//! queried by longest match.

use crate::priority::Priority;
use crate::rule::Rule;

const FIELD_SEP: char = '\u{1F}';

#[derive(Debug, Default)]
struct TrieNode {
    children: Vec<(char, Box<TrieNode>)>,
    name_translation: Option<String>,
    phrase_translations: Vec<String>,
    rules: Vec<Rule>,
}

impl TrieNode {
    fn child(&self, ch: char) -> Option<&TrieNode> {
        self.children
            .binary_search_by_key(&ch, |(c, _)| *c)
            .ok()
            .map(|i| self.children[i].1.as_ref())
    }

    fn child_mut_or_insert(&mut self, ch: char) -> &mut TrieNode {
        match self.children.binary_search_by_key(&ch, |(c, _)| *c) {
            Ok(i) => self.children[i].1.as_mut(),
            Err(i) => {
                self.children.insert(i, (ch, Box::new(TrieNode::default())));
                self.children[i].1.as_mut()
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.children.is_empty()
            && self.name_translation.is_none()
            && self.phrase_translations.is_empty()
            && self.rules.is_empty()
    }

    fn sort_rules(&mut self) {
        self.rules.sort_by_key(|r| std::cmp::Reverse(r.end_len()));
    }
}

/// The result of [`Dictionary::find`]: the longest match reached along a walk,
/// plus any rules keyed at that walk's starting node (independent of the
/// match length/priority).
#[derive(Debug, Clone, Default)]
pub struct Match {
    pub length: usize,
    pub priority: Priority,
    pub translation: Option<String>,
    pub rules: Option<Vec<Rule>>,
}

impl Match {
    pub fn is_hit(&self) -> bool {
        self.length > 0
    }
}

/// The result of [`Dictionary::find_exact`]: the payloads sitting exactly at
/// `key`, if the key is present in the trie at all.
#[derive(Debug, Clone, Default)]
pub struct ExactMatch {
    pub name_translation: Option<String>,
    pub phrase_translations: Vec<String>,
}

/// Prefix-indexed store of name translations, phrase translation lists, and
/// bracketed grammar rules, queried by longest match.
#[derive(Debug, Default)]
pub struct Dictionary {
    root: TrieNode,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    fn walk(&self, key: &[char]) -> Option<&TrieNode> {
        let mut node = &self.root;
        for &ch in key {
            node = node.child(ch)?;
        }
        Some(node)
    }

    /// Insert `value` under `key` with the given priority. A `Name` insert
    /// overwrites the node's single name translation. A `Phrase` insert
    /// removes any equal existing entry and prepends `value`, promoting it
    /// to the preferred (head) position.
    pub fn insert(&mut self, key: &[char], value: &str, priority: Priority) {
        let mut node = &mut self.root;
        for &ch in key {
            node = node.child_mut_or_insert(ch);
        }
        match priority {
            Priority::Name => node.name_translation = Some(value.to_string()),
            Priority::Phrase => {
                node.phrase_translations.retain(|v| v != value);
                node.phrase_translations.insert(0, value.to_string());
            }
            Priority::None => {}
        }
    }

    /// Bulk insert used by cold load: `value` is a record-separator-joined
    /// list of entries, appended in order without reordering.
    pub fn insert_bulk(&mut self, key: &[char], priority: Priority, value: &str) {
        let mut node = &mut self.root;
        for &ch in key {
            node = node.child_mut_or_insert(ch);
        }
        match priority {
            Priority::Name => {
                node.name_translation = value.split(FIELD_SEP).next().map(|s| s.to_string());
            }
            Priority::Phrase => {
                node.phrase_translations
                    .extend(value.split(FIELD_SEP).map(|s| s.to_string()));
            }
            Priority::None => {}
        }
    }

    /// Longest-match walk starting at `text[start..]`. Returns the best span
    /// reached, along with any rules keyed at the deepest prefix carrying a
    /// non-empty rule list.
    pub fn find(&self, text: &[char], start: usize) -> Match {
        let mut node = &self.root;
        let mut best_len = 0;
        let mut translation = None;
        let mut priority = Priority::None;
        let mut rules: Option<Vec<Rule>> = None;

        for (offset, &ch) in text[start..].iter().enumerate() {
            let Some(next) = node.child(ch) else { break };
            node = next;

            if !node.rules.is_empty() {
                rules = Some(node.rules.clone());
            }

            if let Some(name) = &node.name_translation {
                best_len = offset + 1;
                translation = Some(name.clone());
                priority = Priority::Name;
            } else if let Some(head) = node.phrase_translations.first() {
                if offset + 1 > best_len {
                    best_len = offset + 1;
                    translation = Some(head.clone());
                    priority = Priority::Phrase;
                }
            }
        }

        Match {
            length: best_len,
            priority,
            translation,
            rules,
        }
    }

    /// Payloads sitting exactly at `key`, or an empty result if `key` is not
    /// present in the trie.
    pub fn find_exact(&self, key: &[char]) -> ExactMatch {
        match self.walk(key) {
            Some(node) => ExactMatch {
                name_translation: node.name_translation.clone(),
                phrase_translations: node.phrase_translations.clone(),
            },
            None => ExactMatch::default(),
        }
    }

    /// Replace the phrase list at `key` wholesale with `new_order`.
    pub fn reorder(&mut self, key: &[char], new_order: Vec<String>) {
        let Some(node) = self.walk_mut(key) else { return };
        node.phrase_translations = new_order;
    }

    /// Clear the payload field for `priority` at `key`. Does not prune nodes.
    pub fn remove(&mut self, key: &[char], priority: Priority) {
        let Some(node) = self.walk_mut(key) else { return };
        match priority {
            Priority::Name => node.name_translation = None,
            Priority::Phrase => node.phrase_translations.clear(),
            Priority::None => {}
        }
    }

    /// Remove all entries equal to `value` from the phrase list at `key`.
    pub fn remove_meaning(&mut self, key: &[char], value: &str) {
        let Some(node) = self.walk_mut(key) else { return };
        node.phrase_translations.retain(|v| v != value);
    }

    pub fn insert_rule(&mut self, start: &[char], end: &str, t_start: &str, t_end: &str) {
        let mut node = &mut self.root;
        for &ch in start {
            node = node.child_mut_or_insert(ch);
        }
        let start_str: String = start.iter().collect();
        node.rules.retain(|r| r.original_end != end);
        node.rules.push(Rule::new(start_str, end, t_start, t_end));
        node.sort_rules();
    }

    pub fn find_exact_rule(&self, start: &[char], end: &str) -> Option<Rule> {
        self.walk(start)?
            .rules
            .iter()
            .find(|r| r.original_end == end)
            .cloned()
    }

    pub fn edit_rule(&mut self, start: &[char], end: &str, t_start: &str, t_end: &str) {
        let Some(node) = self.walk_mut(start) else { return };
        if let Some(rule) = node.rules.iter_mut().find(|r| r.original_end == end) {
            rule.translation_start = t_start.to_string();
            rule.translation_end = t_end.to_string();
        }
    }

    pub fn remove_rule(&mut self, start: &[char], end: &str) {
        let Some(node) = self.walk_mut(start) else { return };
        node.rules.retain(|r| r.original_end != end);
    }

    fn walk_mut(&mut self, key: &[char]) -> Option<&mut TrieNode> {
        let mut node = &mut self.root;
        for &ch in key {
            let i = node.children.binary_search_by_key(&ch, |(c, _)| *c).ok()?;
            node = node.children[i].1.as_mut();
        }
        Some(node)
    }

    /// True if `key` carries no payload and has no children reachable below it.
    #[cfg(test)]
    fn node_is_empty(&self, key: &[char]) -> bool {
        self.walk(key).map(TrieNode::is_empty).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn phrase_insert_promotes_to_head() {
        let mut dict = Dictionary::new();
        dict.insert(&chars("你好"), "hi", Priority::Phrase);
        dict.insert(&chars("你好"), "hello", Priority::Phrase);
        dict.insert(&chars("你好"), "hi", Priority::Phrase);
        let exact = dict.find_exact(&chars("你好"));
        assert_eq!(exact.phrase_translations, vec!["hi", "hello"]);
    }

    #[test]
    fn name_insert_overwrites() {
        let mut dict = Dictionary::new();
        dict.insert(&chars("你好"), "Bob", Priority::Name);
        dict.insert(&chars("你好"), "Alice", Priority::Name);
        let exact = dict.find_exact(&chars("你好"));
        assert_eq!(exact.name_translation.as_deref(), Some("Alice"));
    }

    #[test]
    fn name_beats_phrase_at_equal_length() {
        let mut dict = Dictionary::new();
        dict.insert(&chars("你好"), "hi", Priority::Phrase);
        dict.insert(&chars("你好"), "Bob", Priority::Name);
        let text = chars("你好");
        let m = dict.find(&text, 0);
        assert_eq!(m.length, 2);
        assert_eq!(m.priority, Priority::Name);
        assert_eq!(m.translation.as_deref(), Some("Bob"));
    }

    #[test]
    fn longer_phrase_beats_shorter() {
        let mut dict = Dictionary::new();
        dict.insert(&chars("你"), "A", Priority::Phrase);
        dict.insert(&chars("你好"), "B", Priority::Phrase);
        let text = chars("你好");
        let m = dict.find(&text, 0);
        assert_eq!(m.length, 2);
        assert_eq!(m.translation.as_deref(), Some("B"));
    }

    #[test]
    fn reorder_round_trips() {
        let mut dict = Dictionary::new();
        dict.insert(&chars("你好"), "a", Priority::Phrase);
        dict.insert(&chars("你好"), "b", Priority::Phrase);
        dict.reorder(&chars("你好"), vec!["z".into(), "y".into()]);
        let exact = dict.find_exact(&chars("你好"));
        assert_eq!(exact.phrase_translations, vec!["z", "y"]);
    }

    #[test]
    fn remove_meaning_is_idempotent() {
        let mut dict = Dictionary::new();
        dict.insert(&chars("你好"), "a", Priority::Phrase);
        dict.insert(&chars("你好"), "b", Priority::Phrase);
        dict.remove_meaning(&chars("你好"), "a");
        let once = dict.find_exact(&chars("你好")).phrase_translations;
        dict.remove_meaning(&chars("你好"), "a");
        let twice = dict.find_exact(&chars("你好")).phrase_translations;
        assert_eq!(once, twice);
        assert_eq!(once, vec!["b"]);
    }

    #[test]
    fn rules_sorted_by_end_length_descending() {
        let mut dict = Dictionary::new();
        dict.insert_rule(&chars("「"), "」", "\"", "\"");
        dict.insert_rule(&chars("「"), "」」", "open", "close");
        let node_rules = dict.find(&chars("「"), 0).rules.unwrap();
        assert_eq!(node_rules[0].original_end, "」」");
        assert_eq!(node_rules[1].original_end, "」");
    }

    #[test]
    fn insert_bulk_splits_on_unit_separator_without_reordering() {
        let mut dict = Dictionary::new();
        dict.insert_bulk(&chars("你好"), Priority::Phrase, "hi\u{1F}hello\u{1F}greetings");
        let exact = dict.find_exact(&chars("你好"));
        assert_eq!(exact.phrase_translations, vec!["hi", "hello", "greetings"]);
    }

    #[test]
    fn remove_clears_payload_without_pruning_node() {
        let mut dict = Dictionary::new();
        dict.insert(&chars("你好"), "a", Priority::Phrase);
        dict.remove(&chars("你好"), Priority::Phrase);
        assert!(dict.find_exact(&chars("你好")).phrase_translations.is_empty());
        assert!(!dict.node_is_empty(&chars("你")));
    }
}
