//! hanviet-core
//!
//! Chinese-to-Sino-Vietnamese dictionary, trie, persistent store, and
//! conversion engine.
//!
//! Public API:
//! - `Engine` - owning facade: load, convert, convert_plain, IO Facade
//! - `Dictionary` - trie-indexed names, phrases, and grammar rules
//! - `NameSet` / `NameSetRegistry` - swappable name overlay
//! - `Store` - redb-backed persistence mirroring the dictionary
//! - `Converter` - recursive longest-match tokenizer
//! - `Config` - TOML-backed configuration

pub mod charmaps;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod loader;
pub mod nameset;
pub mod priority;
pub mod rule;
pub mod store;
pub mod trie;

pub use charmaps::CharMaps;
pub use config::Config;
pub use converter::{Conversion, Converter};
pub use engine::Engine;
pub use error::{IoError, LoaderError, StoreError};
pub use loader::LoadedState;
pub use nameset::{NameSet, NameSetInfo, NameSetRegistry, NO_NAME_SET};
pub use priority::Priority;
pub use rule::Rule;
pub use store::Store;
pub use trie::{Dictionary, ExactMatch, Match};

/// Split `input_text` into pages, each at least `min_length` characters
/// long, breaking on the first newline at or after that length. The last
/// page takes whatever remains. Mirrors the original pagination helper used
/// to chunk large documents before conversion.
pub fn paginate(input_text: &str, min_length: usize) -> Vec<String> {
    let chars: Vec<char> = input_text.chars().collect();
    let length = chars.len();
    let mut pages = Vec::new();
    let mut cursor = 0usize;

    while cursor < length {
        let target_end = cursor + min_length;
        if target_end >= length {
            pages.push(chars[cursor..].iter().collect());
            break;
        }
        match chars[target_end..].iter().position(|&c| c == '\n') {
            None => {
                pages.push(chars[cursor..].iter().collect());
                break;
            }
            Some(offset) => {
                let cutoff = target_end + offset;
                let chunk_end = cutoff + 1;
                pages.push(chars[cursor..chunk_end].iter().collect());
                cursor = chunk_end;
            }
        }
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_splits_on_first_newline_past_min_length() {
        let text = "aaaa\nbbbb\ncccc\n";
        let pages = paginate(text, 3);
        assert_eq!(pages, vec!["aaaa\n", "bbbb\n", "cccc\n"]);
    }

    #[test]
    fn paginate_keeps_remainder_when_no_newline_found() {
        let text = "aaaaaaaaaa";
        let pages = paginate(text, 3);
        assert_eq!(pages, vec!["aaaaaaaaaa"]);
    }

    #[test]
    fn paginate_handles_empty_input() {
        assert!(paginate("", 10).is_empty());
    }

    #[test]
    fn paginate_single_page_when_target_end_reaches_length() {
        let text = "abc";
        let pages = paginate(text, 10);
        assert_eq!(pages, vec!["abc"]);
    }
}
