//! Process-wide character maps: Sino-Vietnamese readings and punctuation
//! normalization, populated once at load and treated as immutable after.

use ahash::AHashMap;

/// Closing punctuation after which the converter does not insert a space.
/// Shared by the converter's post-span spacing rule.
pub const CLOSER_PUNCTUATION: &str = ".,，;:!?)]}>\"'\u{2019}\u{201D}\u{3002}\u{FF1A}\u{FF1B}";

/// Punctuation marks that trigger capitalization of the following token.
pub const SENTENCE_ENDERS: &str = ".!?\u{2026}:;\"";

#[derive(Debug, Default)]
pub struct CharMaps {
    sv_readings: AHashMap<char, String>,
    punctuations: AHashMap<char, char>,
}

impl CharMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_reading(&mut self, ch: char, reading: String) {
        self.sv_readings.insert(ch, reading);
    }

    pub fn insert_punctuation(&mut self, ch: char, normalized: char) {
        self.punctuations.insert(ch, normalized);
    }

    pub fn reading(&self, ch: char) -> Option<&str> {
        self.sv_readings.get(&ch).map(|s| s.as_str())
    }

    pub fn punctuation(&self, ch: char) -> Option<char> {
        self.punctuations.get(&ch).copied()
    }

    /// Single-character fallback translation: the SV reading if known, else
    /// the normalized punctuation, else the character itself.
    pub fn translate_char(&self, ch: char) -> String {
        if let Some(reading) = self.reading(ch) {
            reading.to_string()
        } else if let Some(normalized) = self.punctuation(ch) {
            normalized.to_string()
        } else {
            ch.to_string()
        }
    }

    /// Sino-Vietnamese reading for each character of `s`, space-joined, with
    /// punctuation substituted and unknown characters echoed verbatim.
    pub fn sv_reading_of(&self, s: &str) -> String {
        let mut out = String::new();
        for ch in s.chars() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&self.translate_char(ch));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.sv_readings.is_empty() && self.punctuations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_through_reading_then_punctuation_then_echo() {
        let mut maps = CharMaps::new();
        maps.insert_reading('你', "nǐ".into());
        maps.insert_punctuation('。', '.');
        assert_eq!(maps.translate_char('你'), "nǐ");
        assert_eq!(maps.translate_char('。'), ".");
        assert_eq!(maps.translate_char('?'), "?");
    }

    #[test]
    fn sv_reading_of_joins_with_single_spaces() {
        let mut maps = CharMaps::new();
        maps.insert_reading('你', "nǐ".into());
        maps.insert_reading('好', "hǎo".into());
        assert_eq!(maps.sv_reading_of("你好"), "nǐ hǎo");
    }
}
