//! Parallel cold-start: populates CharMaps and the primary Dictionary from
//! the Store in three concurrent readers, joining on a single blocking call.

use std::thread;

use crate::charmaps::CharMaps;
use crate::error::LoaderError;
use crate::nameset::NameSetInfo;
use crate::priority::Priority;
use crate::store::Store;
use crate::trie::Dictionary;

/// Everything a cold start produces, ready to hand to an [`crate::engine::Engine`].
pub struct LoadedState {
    pub char_maps: CharMaps,
    pub dictionary: Dictionary,
    pub name_set_metadata: Vec<NameSetInfo>,
}

/// Fans out three readers against the store (character maps, punctuation,
/// and the primary dictionary) and blocks until all three finish. The join
/// point of `thread::scope` *is* the completion signal: by the time this
/// function returns, every target is fully populated and safe to read
/// concurrently with no further synchronization.
pub fn cold_start(store: &Store) -> Result<LoadedState, LoaderError> {
    tracing::debug!("cold start: spawning sv_readings/punctuations/dictionary readers");
    let name_set_metadata = store
        .name_sets()?
        .into_iter()
        .map(|(id, title)| NameSetInfo { id, title })
        .collect();

    let mut char_maps = CharMaps::new();
    let mut dictionary = Dictionary::new();

    thread::scope(|scope| -> Result<(), LoaderError> {
        let sv_handle = scope.spawn(|| store.all_sv_readings());
        let punc_handle = scope.spawn(|| store.all_punctuations());
        let dict_handle = scope.spawn(|| load_dictionary(store));

        let sv_readings = sv_handle.join().map_err(|_| LoaderError::WorkerPanicked)??;
        let punctuations = punc_handle.join().map_err(|_| LoaderError::WorkerPanicked)??;
        let loaded_dict = dict_handle.join().map_err(|_| LoaderError::WorkerPanicked)??;

        for (ch, reading) in sv_readings {
            char_maps.insert_reading(ch, reading);
        }
        for (ch, normalized) in punctuations {
            char_maps.insert_punctuation(ch, normalized);
        }
        dictionary = loaded_dict;
        Ok(())
    })?;

    Ok(LoadedState {
        char_maps,
        dictionary,
        name_set_metadata,
    })
}

fn load_dictionary(store: &Store) -> Result<Dictionary, LoaderError> {
    let mut dictionary = Dictionary::new();

    for (key, value) in store.all_names()? {
        let key_chars: Vec<char> = key.chars().collect();
        dictionary.insert_bulk(&key_chars, Priority::Name, &value);
    }
    for (key, value) in store.all_phrases()? {
        let key_chars: Vec<char> = key.chars().collect();
        dictionary.insert_bulk(&key_chars, Priority::Phrase, &value);
    }
    for (start, end, t_start, t_end) in store.all_rules()? {
        let start_chars: Vec<char> = start.chars().collect();
        dictionary.insert_rule(&start_chars, &end, &t_start, &t_end);
    }

    Ok(dictionary)
}

/// Loads the overlay for a single name set id (or an empty overlay for the
/// disabled sentinel). Mirrors the original's `load_name_set`.
pub fn load_name_set(
    store: &Store,
    id: i64,
) -> Result<crate::nameset::NameSet, LoaderError> {
    let mut overlay = crate::nameset::NameSet::new();
    if id == crate::nameset::NO_NAME_SET {
        return Ok(overlay);
    }
    for (key, value) in store.name_set_entries(id)? {
        let key_chars: Vec<char> = key.chars().collect();
        overlay.insert_bulk(&key_chars, &value);
    }
    Ok(overlay)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> Store {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "hanviet_loader_test_{}_{}.redb",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        Store::open(&path).expect("open store")
    }

    #[test]
    fn cold_start_populates_all_targets() {
        let store = temp_store();
        store.sv_reading_insert('你', "nǐ").unwrap();
        store.punctuation_insert('。', '.').unwrap();
        store.name_insert("阮", "Nguyen").unwrap();
        store.phrase_insert("你好", "hello").unwrap();
        store.rule_insert("「", "」", "\"", "\"").unwrap();

        let loaded = cold_start(&store).expect("cold start");

        assert_eq!(loaded.char_maps.reading('你'), Some("nǐ"));
        assert_eq!(loaded.char_maps.punctuation('。'), Some('.'));

        let key: Vec<char> = "你好".chars().collect();
        let m = loaded.dictionary.find(&key, 0);
        assert_eq!(m.translation.as_deref(), Some("hello"));

        let rule_key: Vec<char> = "「".chars().collect();
        assert!(loaded.dictionary.find_exact_rule(&rule_key, "」").is_some());
    }

    #[test]
    fn load_name_set_sentinel_is_empty() {
        let store = temp_store();
        let overlay = load_name_set(&store, crate::nameset::NO_NAME_SET).unwrap();
        let key: Vec<char> = "阮".chars().collect();
        assert_eq!(overlay.find(&key, 0), (0, None));
    }
}
