//! The owning facade: composes [`CharMaps`], the primary [`Dictionary`], the
//! [`NameSetRegistry`] overlay, and the [`Store`], and exposes conversion
//! plus the narrow IO Facade that keeps in-memory state and the store in
//! sync.

use crate::charmaps::CharMaps;
use crate::converter::{Conversion, Converter};
use crate::error::{LoaderError, StoreError};
use crate::loader;
use crate::nameset::{NameSetInfo, NameSetRegistry, NO_NAME_SET};
use crate::priority::Priority;
use crate::store::Store;
use crate::trie::Dictionary;

/// Owns every piece of mutable state the converter and the editing surface
/// touch. A caller typically constructs one at startup via [`Engine::load`]
/// and keeps it alive for the process lifetime.
pub struct Engine {
    store: Store,
    char_maps: CharMaps,
    dictionary: Dictionary,
    name_sets: NameSetRegistry,
}

impl Engine {
    /// Open the store at `path` and run the parallel cold-start load.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, LoaderError> {
        tracing::info!(path = %path.as_ref().display(), "loading dictionary");
        let store = Store::open(path).map_err(LoaderError::Store)?;
        let loaded = loader::cold_start(&store)?;
        tracing::info!(
            name_sets = loaded.name_set_metadata.len(),
            "dictionary loaded"
        );
        Ok(Self {
            store,
            char_maps: loaded.char_maps,
            dictionary: loaded.dictionary,
            name_sets: NameSetRegistry::with_metadata(loaded.name_set_metadata),
        })
    }

    pub fn name_set_metadata(&self) -> &[NameSetInfo] {
        self.name_sets.metadata()
    }

    pub fn active_name_set_id(&self) -> i64 {
        self.name_sets.active_id()
    }

    /// Replace the active overlay. `id == NO_NAME_SET` disables it.
    pub fn switch_name_set(&mut self, id: i64) -> Result<(), StoreError> {
        tracing::debug!(id, "switching name set");
        let overlay = loader::load_name_set(&self.store, id).map_err(|e| match e {
            LoaderError::Store(e) => e,
            LoaderError::WorkerPanicked => unreachable!("load_name_set does not spawn workers"),
        })?;
        self.name_sets.switch_to(id, overlay);
        Ok(())
    }

    pub fn convert(&self, text: &str, progress: Option<&mut dyn FnMut(usize)>) -> Conversion {
        tracing::debug!(len = text.chars().count(), "converting");
        let converter = Converter::new(&self.dictionary, self.name_sets.active(), &self.char_maps);
        converter.convert(text, progress)
    }

    pub fn convert_plain(&self, text: &str, progress: Option<&mut dyn FnMut(usize)>) -> String {
        tracing::debug!(len = text.chars().count(), "converting (plain)");
        let converter = Converter::new(&self.dictionary, self.name_sets.active(), &self.char_maps);
        converter.convert_plain(text, progress)
    }

    // ---- IO Facade ----
    //
    // Every mutation writes to the store first; if that fails, the in-memory
    // structure is left untouched and the error propagates, which is what
    // gives "leaves both unchanged on failure" without an in-memory rollback
    // path. This deliberately reverses the in-memory-then-store ordering of
    // the original this engine is ported from.

    pub fn io_insert(
        &mut self,
        set_id: i64,
        key: &str,
        value: &str,
        priority: Priority,
    ) -> Result<(), StoreError> {
        let key_chars: Vec<char> = key.chars().collect();
        // Phrase edits only ever target the primary dictionary; set_id is
        // meaningless for them and is ignored rather than routed to an overlay.
        if set_id == NO_NAME_SET || priority == Priority::Phrase {
            match priority {
                Priority::Name => self.store.name_insert(key, value)?,
                Priority::Phrase => self.store.phrase_insert(key, value)?,
                Priority::None => return Ok(()),
            }
            self.dictionary.insert(&key_chars, value, priority);
        } else {
            self.store.name_set_entry_insert(set_id, key, value)?;
            if self.name_sets.active_id() == set_id {
                if let Some(overlay) = self.name_sets.active_mut() {
                    overlay.insert(&key_chars, value);
                }
            }
        }
        Ok(())
    }

    pub fn io_reorder(&mut self, key: &str, new_order: Vec<String>) -> Result<(), StoreError> {
        self.store.phrase_reorder(key, &new_order)?;
        let key_chars: Vec<char> = key.chars().collect();
        self.dictionary.reorder(&key_chars, new_order);
        Ok(())
    }

    pub fn io_remove(&mut self, set_id: i64, key: &str, priority: Priority) -> Result<(), StoreError> {
        let key_chars: Vec<char> = key.chars().collect();
        if set_id == NO_NAME_SET || priority == Priority::Phrase {
            match priority {
                Priority::Name => self.store.name_remove(key)?,
                Priority::Phrase => self.store.phrase_remove(key)?,
                Priority::None => return Ok(()),
            }
            self.dictionary.remove(&key_chars, priority);
        } else {
            self.store.name_set_entry_remove(set_id, key)?;
            if self.name_sets.active_id() == set_id {
                if let Some(overlay) = self.name_sets.active_mut() {
                    overlay.remove(&key_chars);
                }
            }
        }
        Ok(())
    }

    pub fn io_remove_meaning(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.store.phrase_remove_meaning(key, value)?;
        let key_chars: Vec<char> = key.chars().collect();
        self.dictionary.remove_meaning(&key_chars, value);
        Ok(())
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn char_maps(&self) -> &CharMaps {
        &self.char_maps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_engine() -> Engine {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "hanviet_engine_test_{}_{}.redb",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        Engine::load(&path).expect("load engine")
    }

    #[test]
    fn io_insert_updates_store_and_dictionary_together() {
        let mut engine = temp_engine();
        engine
            .io_insert(NO_NAME_SET, "你好", "hello", Priority::Phrase)
            .unwrap();

        let key: Vec<char> = "你好".chars().collect();
        assert_eq!(
            engine.dictionary().find(&key, 0).translation.as_deref(),
            Some("hello")
        );
        let stored = engine.store().all_phrases().unwrap();
        assert_eq!(stored, vec![("你好".to_string(), "hello".to_string())]);
    }

    #[test]
    fn io_remove_clears_both_layers() {
        let mut engine = temp_engine();
        engine
            .io_insert(NO_NAME_SET, "你好", "hello", Priority::Phrase)
            .unwrap();
        engine
            .io_remove(NO_NAME_SET, "你好", Priority::Phrase)
            .unwrap();

        let key: Vec<char> = "你好".chars().collect();
        assert_eq!(engine.dictionary().find(&key, 0).length, 0);
        assert!(engine.store().all_phrases().unwrap().is_empty());
    }

    #[test]
    fn switch_name_set_to_sentinel_disables_overlay() {
        let mut engine = temp_engine();
        engine.switch_name_set(NO_NAME_SET).unwrap();
        assert_eq!(engine.active_name_set_id(), NO_NAME_SET);
    }

    #[test]
    fn phrase_insert_ignores_non_primary_set_id() {
        let mut engine = temp_engine();
        engine.io_insert(7, "你好", "hello", Priority::Phrase).unwrap();

        let key: Vec<char> = "你好".chars().collect();
        assert_eq!(
            engine.dictionary().find(&key, 0).translation.as_deref(),
            Some("hello")
        );
        let stored = engine.store().all_phrases().unwrap();
        assert_eq!(stored, vec![("你好".to_string(), "hello".to_string())]);
        assert!(engine.store().name_set_entries(7).unwrap().is_empty());
    }
}
