//! Durable, redb-backed mirror of the in-memory dictionary: seven tables
//! covering character maps, names, phrases, grammar rules, and name-set
//! overlays.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;

const FIELD_SEP: char = '\u{1F}';

const SV_READINGS: TableDefinition<&str, &str> = TableDefinition::new("sv_readings");
const PUNCTUATIONS: TableDefinition<&str, &str> = TableDefinition::new("punctuations");
const NAMES: TableDefinition<&str, &str> = TableDefinition::new("names");
const PHRASES: TableDefinition<&str, &str> = TableDefinition::new("phrases");
const GRAMMAR_RULES: TableDefinition<&str, &str> = TableDefinition::new("grammar_rules");
const NAME_SETS: TableDefinition<i64, &str> = TableDefinition::new("name_sets");
const NAME_SET_ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("name_set_entries");

fn rule_key(start: &str, end: &str) -> String {
    format!("{start}{FIELD_SEP}{end}")
}

fn rule_value(t_start: &str, t_end: &str) -> String {
    format!("{t_start}{FIELD_SEP}{t_end}")
}

fn split_rule_value(value: &str) -> (String, String) {
    let mut parts = value.splitn(2, FIELD_SEP);
    let start = parts.next().unwrap_or_default().to_string();
    let end = parts.next().unwrap_or_default().to_string();
    (start, end)
}

fn name_set_entry_key(set_id: i64, original: &str) -> String {
    format!("{set_id}{FIELD_SEP}{original}")
}

/// Persistent mirror of the dictionary. Cheaply cloneable: the underlying
/// `redb::Database` is reference-counted, matching `UserDict`'s shape.
#[derive(Clone, Debug)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(dir) = path.as_ref().parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let db = Database::create(path.as_ref())?;
        Ok(Store { db: Arc::new(db) })
    }

    fn read_joined(&self, table: TableDefinition<&str, &str>, key: &str) -> Result<Option<String>, StoreError> {
        let r = self.db.begin_read()?;
        match r.open_table(table) {
            Ok(t) => Ok(t.get(key)?.map(|v| v.value().to_string())),
            Err(redb::TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_value(&self, table: TableDefinition<&str, &str>, key: &str, value: &str) -> Result<(), StoreError> {
        let w = self.db.begin_write()?;
        {
            let mut t = w.open_table(table)?;
            t.insert(key, value)?;
        }
        w.commit()?;
        Ok(())
    }

    fn delete_row(&self, table: TableDefinition<&str, &str>, key: &str) -> Result<(), StoreError> {
        let w = self.db.begin_write()?;
        {
            let mut t = w.open_table(table)?;
            t.remove(key)?;
        }
        w.commit()?;
        Ok(())
    }

    fn iter_all(&self, table: TableDefinition<&str, &str>) -> Result<Vec<(String, String)>, StoreError> {
        let mut out = Vec::new();
        let r = self.db.begin_read()?;
        match r.open_table(table) {
            Ok(t) => {
                for item in t.iter()? {
                    let (k, v) = item?;
                    out.push((k.value().to_string(), v.value().to_string()));
                }
            }
            Err(redb::TableError::TableDoesNotExist(_)) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(out)
    }

    // ---- sv_readings / punctuations ----

    pub fn sv_reading_insert(&self, original: char, translated: &str) -> Result<(), StoreError> {
        self.write_value(SV_READINGS, &original.to_string(), translated)
    }

    pub fn all_sv_readings(&self) -> Result<Vec<(char, String)>, StoreError> {
        Ok(self
            .iter_all(SV_READINGS)?
            .into_iter()
            .filter_map(|(k, v)| k.chars().next().map(|c| (c, v)))
            .collect())
    }

    pub fn punctuation_insert(&self, original: char, normalized: char) -> Result<(), StoreError> {
        self.write_value(PUNCTUATIONS, &original.to_string(), &normalized.to_string())
    }

    pub fn all_punctuations(&self) -> Result<Vec<(char, char)>, StoreError> {
        Ok(self
            .iter_all(PUNCTUATIONS)?
            .into_iter()
            .filter_map(|(k, v)| Some((k.chars().next()?, v.chars().next()?)))
            .collect())
    }

    // ---- names ----

    /// Read-modify-write: move `value` to the head of the U+001F-joined
    /// history, matching the promote-to-preferred contract on the in-memory
    /// Dictionary.
    pub fn name_insert(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries: Vec<String> = self
            .read_joined(NAMES, key)?
            .map(|s| s.split(FIELD_SEP).map(str::to_string).collect())
            .unwrap_or_default();
        entries.retain(|v| v != value);
        entries.insert(0, value.to_string());
        self.write_value(NAMES, key, &entries.join(&FIELD_SEP.to_string()))
    }

    pub fn name_remove(&self, key: &str) -> Result<(), StoreError> {
        self.delete_row(NAMES, key)
    }

    pub fn all_names(&self) -> Result<Vec<(String, String)>, StoreError> {
        self.iter_all(NAMES)
    }

    // ---- phrases ----

    pub fn phrase_insert(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries: Vec<String> = self
            .read_joined(PHRASES, key)?
            .map(|s| s.split(FIELD_SEP).map(str::to_string).collect())
            .unwrap_or_default();
        entries.retain(|v| v != value);
        entries.insert(0, value.to_string());
        self.write_value(PHRASES, key, &entries.join(&FIELD_SEP.to_string()))
    }

    pub fn phrase_reorder(&self, key: &str, new_order: &[String]) -> Result<(), StoreError> {
        self.write_value(PHRASES, key, &new_order.join(&FIELD_SEP.to_string()))
    }

    pub fn phrase_remove(&self, key: &str) -> Result<(), StoreError> {
        self.delete_row(PHRASES, key)
    }

    pub fn phrase_remove_meaning(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let Some(joined) = self.read_joined(PHRASES, key)? else {
            return Ok(());
        };
        let remaining: Vec<&str> = joined.split(FIELD_SEP).filter(|v| *v != value).collect();
        if remaining.is_empty() {
            self.delete_row(PHRASES, key)
        } else {
            self.write_value(PHRASES, key, &remaining.join(&FIELD_SEP.to_string()))
        }
    }

    pub fn all_phrases(&self) -> Result<Vec<(String, String)>, StoreError> {
        self.iter_all(PHRASES)
    }

    // ---- grammar rules ----

    pub fn rule_insert(
        &self,
        start: &str,
        end: &str,
        t_start: &str,
        t_end: &str,
    ) -> Result<(), StoreError> {
        self.write_value(
            GRAMMAR_RULES,
            &rule_key(start, end),
            &rule_value(t_start, t_end),
        )
    }

    pub fn rule_remove(&self, start: &str, end: &str) -> Result<(), StoreError> {
        self.delete_row(GRAMMAR_RULES, &rule_key(start, end))
    }

    /// Every rule as `(original_start, original_end, translation_start, translation_end)`.
    pub fn all_rules(&self) -> Result<Vec<(String, String, String, String)>, StoreError> {
        Ok(self
            .iter_all(GRAMMAR_RULES)?
            .into_iter()
            .filter_map(|(k, v)| {
                let mut key_parts = k.splitn(2, FIELD_SEP);
                let start = key_parts.next()?.to_string();
                let end = key_parts.next()?.to_string();
                let (t_start, t_end) = split_rule_value(&v);
                Some((start, end, t_start, t_end))
            })
            .collect())
    }

    // ---- name sets ----

    pub fn name_set_upsert(&self, id: i64, title: &str) -> Result<(), StoreError> {
        let w = self.db.begin_write()?;
        {
            let mut t = w.open_table(NAME_SETS)?;
            t.insert(id, title)?;
        }
        w.commit()?;
        Ok(())
    }

    pub fn name_sets(&self) -> Result<Vec<(i64, String)>, StoreError> {
        let mut out = Vec::new();
        let r = self.db.begin_read()?;
        match r.open_table(NAME_SETS) {
            Ok(t) => {
                for item in t.iter()? {
                    let (k, v) = item?;
                    out.push((k.value(), v.value().to_string()));
                }
            }
            Err(redb::TableError::TableDoesNotExist(_)) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(out)
    }

    pub fn name_set_entry_insert(&self, set_id: i64, key: &str, value: &str) -> Result<(), StoreError> {
        let entry_key = name_set_entry_key(set_id, key);
        let mut entries: Vec<String> = self
            .read_joined(NAME_SET_ENTRIES, &entry_key)?
            .map(|s| s.split(FIELD_SEP).map(str::to_string).collect())
            .unwrap_or_default();
        entries.retain(|v| v != value);
        entries.insert(0, value.to_string());
        self.write_value(NAME_SET_ENTRIES, &entry_key, &entries.join(&FIELD_SEP.to_string()))
    }

    pub fn name_set_entry_remove(&self, set_id: i64, key: &str) -> Result<(), StoreError> {
        self.delete_row(NAME_SET_ENTRIES, &name_set_entry_key(set_id, key))
    }

    /// All `(original, translated)` entries scoped to `set_id`, found by
    /// prefix scan over the full table, mirroring `UserDict::get_bigrams_after`.
    pub fn name_set_entries(&self, set_id: i64) -> Result<Vec<(String, String)>, StoreError> {
        let prefix = format!("{set_id}{FIELD_SEP}");
        Ok(self
            .iter_all(NAME_SET_ENTRIES)?
            .into_iter()
            .filter_map(|(k, v)| {
                let original = k.strip_prefix(&prefix)?.to_string();
                Some((original, v))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> Store {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "hanviet_store_test_{}_{}.redb",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        Store::open(&path).expect("open store")
    }

    #[test]
    fn name_insert_promotes_to_head() {
        let store = temp_store();
        store.name_insert("你好", "hi").unwrap();
        store.name_insert("你好", "hello").unwrap();
        store.name_insert("你好", "hi").unwrap();
        let (_, joined) = store
            .all_names()
            .unwrap()
            .into_iter()
            .find(|(k, _)| k == "你好")
            .unwrap();
        assert_eq!(joined, "hi\u{1F}hello");
    }

    #[test]
    fn phrase_remove_meaning_deletes_row_when_empty() {
        let store = temp_store();
        store.phrase_insert("你好", "hi").unwrap();
        store.phrase_remove_meaning("你好", "hi").unwrap();
        assert!(store.all_phrases().unwrap().is_empty());
    }

    #[test]
    fn rule_round_trips_through_composite_key() {
        let store = temp_store();
        store.rule_insert("「", "」", "\"", "\"").unwrap();
        let rules = store.all_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0], ("「".into(), "」".into(), "\"".into(), "\"".into()));
    }

    #[test]
    fn name_set_entries_scoped_by_set_id() {
        let store = temp_store();
        store.name_set_entry_insert(1, "阮", "Nguyen").unwrap();
        store.name_set_entry_insert(2, "阮", "Ruan").unwrap();
        let set1 = store.name_set_entries(1).unwrap();
        assert_eq!(set1, vec![("阮".to_string(), "Nguyen".to_string())]);
        let set2 = store.name_set_entries(2).unwrap();
        assert_eq!(set2, vec![("阮".to_string(), "Ruan".to_string())]);
    }

    #[test]
    fn name_set_metadata_upsert_and_list() {
        let store = temp_store();
        store.name_set_upsert(1, "Tang Dynasty").unwrap();
        store.name_set_upsert(1, "Tang Dynasty (renamed)").unwrap();
        let sets = store.name_sets().unwrap();
        assert_eq!(sets, vec![(1, "Tang Dynasty (renamed)".to_string())]);
    }
}
