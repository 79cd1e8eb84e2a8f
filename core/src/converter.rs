//! Single-pass, left-to-right, longest-match converter. Produces three
//! aligned annotated HTML-ish streams (`convert`) or one plain Vietnamese
//! string (`convert_plain`).

use crate::charmaps::CharMaps;
use crate::nameset::NameSet;
use crate::priority::Priority;
use crate::rule::Rule;
use crate::trie::Dictionary;

const OPENERS: &str = "\u{201C}\u{2018}([<{";
const CLOSERS: &str = ".,\u{FF0C};:!?)]}>\"'\u{201D}\u{2019}\u{3002}\u{FF1A}\u{FF1B}";
const RULE_STOPPERS: &str = "\u{FF0C}\u{3002}\u{FF1A}\u{FF1B}\u{FF01}\u{FF1F}\u{201C}\u{201D}\u{2019}.,\u{FF0C};:!?)]}>\"'";
const SENTENCE_ENDERS: &str = ".!?\u{2026}:;\"";

fn is_sentence_ender(s: &str) -> bool {
    s.chars().count() == 1 && SENTENCE_ENDERS.contains(s)
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn append_escaped(buffer: &mut String, s: &[char]) {
    for &ch in s {
        match ch {
            '<' => buffer.push_str("&lt;"),
            '>' => buffer.push_str("&gt;"),
            '&' => buffer.push_str("&amp;"),
            '"' => buffer.push_str("&quot;"),
            _ => buffer.push(ch),
        }
    }
}

/// Uppercases the first character of `s` per the resolved capitalization
/// rule: apply `char::to_uppercase`, but leave the string untouched if that
/// produces no change (digits, combining marks, already-uppercase).
fn capitalize_first(s: &mut String) {
    let Some(first) = s.chars().next() else { return };
    let upper: String = first.to_uppercase().collect();
    if upper.chars().next() == Some(first) {
        return;
    }
    let rest = s[first.len_utf8()..].to_string();
    s.clear();
    s.push_str(&upper);
    s.push_str(&rest);
}

fn get_sv(char_maps: &CharMaps, span: &[char]) -> String {
    let s: String = span.iter().collect();
    char_maps.sv_reading_of(&s)
}

fn should_append_space(text: &[char], current_end_idx: usize, current_char_source: Option<char>) -> bool {
    if let Some(ch) = current_char_source {
        if OPENERS.contains(ch) {
            return false;
        }
    }
    if let Some(&next) = text.get(current_end_idx) {
        if CLOSERS.contains(next) {
            return false;
        }
    }
    true
}

struct RuleMatch {
    rule: Rule,
    abs_start_of_end_token: usize,
    total_end_pos: usize,
}

fn find_matching_rule(text: &[char], current_pos: usize, rules: &[Rule]) -> Option<RuleMatch> {
    let mut limit = text.len().min(current_pos + 25);
    for (offset, &ch) in text[current_pos..limit].iter().enumerate() {
        if RULE_STOPPERS.contains(ch) {
            limit = current_pos + offset;
            break;
        }
    }
    let search_area = &text[current_pos..limit];

    let mut best: Option<RuleMatch> = None;
    for rule in rules {
        let start_len = rule.original_start.chars().count();
        if search_area.len() <= start_len {
            continue;
        }
        let end_chars: Vec<char> = rule.original_end.chars().collect();
        if let Some(relative_end_idx) = find_subslice(&search_area[start_len..], &end_chars) {
            let abs_start_of_end = current_pos + start_len + relative_end_idx;
            let total_end = abs_start_of_end + end_chars.len();

            let better = match &best {
                None => true,
                Some(b) => {
                    total_end > b.total_end_pos
                        || (total_end == b.total_end_pos && end_chars.len() > b.rule.end_len())
                }
            };
            if better {
                best = Some(RuleMatch {
                    rule: rule.clone(),
                    abs_start_of_end_token: abs_start_of_end,
                    total_end_pos: total_end,
                });
            }
        }
    }
    best
}

fn find_subslice(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// `conflict_start` position if the phrase at `[current_pos, current_pos+current_len)`
/// is not optimal, or `None` if it is.
fn is_optimal_phrase(
    dictionary: &Dictionary,
    overlay: Option<&NameSet>,
    text: &[char],
    current_pos: usize,
    current_len: usize,
) -> Option<usize> {
    let threshold = current_len.max(3);
    let limit = current_pos + current_len;

    for next_start in (current_pos + 1)..limit {
        if let Some(overlay) = overlay {
            let (len, _) = overlay.find(text, next_start);
            if len > 0 {
                return Some(next_start);
            }
        }
        let m = dictionary.find(text, next_start);
        if m.priority == Priority::Name || m.length > threshold {
            return Some(next_start);
        }
    }
    None
}

struct Progress<'a> {
    callback: Option<&'a mut dyn FnMut(usize)>,
    next_val: usize,
    current: usize,
}

impl<'a> Progress<'a> {
    fn new(callback: Option<&'a mut dyn FnMut(usize)>) -> Self {
        Self {
            callback,
            next_val: 2500,
            current: 0,
        }
    }

    fn update(&mut self, n: usize) {
        self.current += n;
        if let Some(cb) = self.callback.as_mut() {
            if self.current >= self.next_val {
                cb(self.current);
                self.next_val += 2500;
            }
        }
    }
}

struct ConvertState<'a> {
    dictionary: &'a Dictionary,
    overlay: Option<&'a NameSet>,
    char_maps: &'a CharMaps,
    token_counter: usize,
    cap_next: bool,
    progress: Progress<'a>,
}

#[derive(Default)]
struct AnnotatedResult {
    cn: String,
    sv: String,
    vn: String,
}

#[derive(Default)]
struct PlainResult {
    text: String,
}

/// Shrinks a conflicting phrase match to the longest exact hit strictly
/// shorter than the conflict point. Returns `None` if nothing shorter hits.
fn shrink_phrase(
    state: &ConvertState,
    text: &[char],
    i: usize,
    max_allowed_len: usize,
) -> Option<(usize, String)> {
    for try_len in (1..=max_allowed_len).rev() {
        let candidate = &text[i..i + try_len];
        if let Some(overlay) = state.overlay {
            if let Some(name) = overlay.find_exact(candidate) {
                return Some((try_len, name));
            }
        }
        let exact = state.dictionary.find_exact(candidate);
        if let Some(name) = exact.name_translation {
            return Some((try_len, name));
        }
        if let Some(head) = exact.phrase_translations.into_iter().next() {
            return Some((try_len, head));
        }
    }
    None
}

fn convert_recursive(state: &mut ConvertState, input: &[char]) -> AnnotatedResult {
    let mut out = AnnotatedResult::default();
    let mut i = 0;

    while i < input.len() {
        let ch = input[i];

        if ch == '\n' {
            out.cn.push_str("<br>");
            out.sv.push_str("<br>");
            out.vn.push_str("<br>");
            state.cap_next = true;
            i += 1;
            state.progress.update(1);
            continue;
        }
        if ch.is_whitespace() {
            out.cn.push_str("&nbsp;");
            out.sv.push_str("&nbsp;");
            out.vn.push_str("&nbsp;");
            i += 1;
            state.progress.update(1);
            continue;
        }

        if let Some(overlay) = state.overlay {
            let (len, translation) = overlay.find(input, i);
            if len > 0 {
                let uid = (state.token_counter).to_string();
                state.token_counter += 1;
                let mut sv = get_sv(state.char_maps, &input[i..i + len]);
                if state.cap_next {
                    capitalize_first(&mut sv);
                    state.cap_next = false;
                }
                let trans = translation.unwrap_or_default();

                out.cn.push_str(&format!("<a href='{uid}'>"));
                append_escaped(&mut out.cn, &input[i..i + len]);
                out.cn.push_str("</a>");
                out.sv
                    .push_str(&format!("<a href='{uid}'>{}</a>", html_escape(&sv)));
                out.vn
                    .push_str(&format!("<a href='{uid}'>{}</a>", html_escape(&trans)));

                i += len;
                state.progress.update(len);

                if should_append_space(input, i, None) && !out.vn.ends_with(' ') {
                    out.vn.push(' ');
                    out.sv.push(' ');
                }
                continue;
            }
        }

        let m = state.dictionary.find(input, i);
        let mut length = m.length;
        let mut translation = m.translation.clone();
        let priority = m.priority;

        if length > 0 && priority == Priority::Name {
            let uid = state.token_counter.to_string();
            state.token_counter += 1;
            let mut sv = get_sv(state.char_maps, &input[i..i + length]);
            if state.cap_next {
                capitalize_first(&mut sv);
                state.cap_next = false;
            }
            let trans = translation.unwrap_or_default();

            out.cn.push_str(&format!("<a href='{uid}'>"));
            append_escaped(&mut out.cn, &input[i..i + length]);
            out.cn.push_str("</a>");
            out.sv
                .push_str(&format!("<a href='{uid}'>{}</a>", html_escape(&sv)));
            out.vn
                .push_str(&format!("<a href='{uid}'>{}</a>", html_escape(&trans)));

            i += length;
            state.progress.update(length);

            if should_append_space(input, i, None) && !out.vn.ends_with(' ') {
                out.vn.push(' ');
                out.sv.push(' ');
            }
            continue;
        }

        if let Some(rules) = &m.rules {
            if let Some(rule_match) = find_matching_rule(input, i, rules) {
                let rule = &rule_match.rule;
                let start_len = rule.original_start.chars().count();
                let phrase_overrides_rule =
                    length > 0 && priority == Priority::Phrase && length > start_len;

                if !phrase_overrides_rule {
                    let inner_start = i + start_len;
                    let inner_len = rule_match.abs_start_of_end_token - inner_start;
                    let end_len = rule.original_end.chars().count();

                    state.progress.update(start_len);

                    let uid = format!("r{}", state.token_counter);
                    state.token_counter += 1;

                    let mut t_start = rule.translation_start.clone();
                    if state.cap_next && !t_start.is_empty() {
                        capitalize_first(&mut t_start);
                        state.cap_next = false;
                    }

                    let inner = convert_recursive(state, &input[inner_start..inner_start + inner_len]);

                    state.progress.update(end_len);

                    let start_chars: Vec<char> = rule.original_start.chars().collect();
                    let end_chars: Vec<char> = rule.original_end.chars().collect();

                    out.cn.push_str(&format!("<a href='{uid}'>"));
                    append_escaped(&mut out.cn, &start_chars);
                    out.cn.push_str("</a>");
                    out.cn.push_str(&inner.cn);
                    out.cn.push_str(&format!("<a href='{uid}'>"));
                    append_escaped(&mut out.cn, &end_chars);
                    out.cn.push_str("</a>");

                    let sv_start = get_sv(state.char_maps, &start_chars);
                    let sv_end = get_sv(state.char_maps, &end_chars);

                    out.sv.push_str(&format!(
                        "<a href='{uid}'>{} </a>",
                        html_escape(&sv_start)
                    ));
                    out.sv.push_str(&inner.sv);
                    out.sv
                        .push_str(&format!("<a href='{uid}'>{}</a> ", html_escape(&sv_end)));

                    if !t_start.is_empty() {
                        out.vn.push_str(&format!(
                            "<a href='{uid}'>{} </a>",
                            html_escape(&t_start)
                        ));
                    }
                    out.vn.push_str(&inner.vn);
                    if !rule.translation_end.is_empty() {
                        out.vn.push_str(&format!(
                            "<a href='{uid}'>{}</a>",
                            html_escape(&rule.translation_end)
                        ));
                    }

                    i += start_len + inner_len + end_len;

                    if should_append_space(input, i, None) && !out.vn.ends_with(' ') {
                        out.vn.push(' ');
                    }
                    continue;
                }
            }
        }

        if length > 0 && priority == Priority::Phrase {
            if let Some(conflict_start) =
                is_optimal_phrase(state.dictionary, state.overlay, input, i, length)
            {
                let max_allowed_len = conflict_start - i;
                match shrink_phrase(state, input, i, max_allowed_len) {
                    Some((try_len, value)) => {
                        length = try_len;
                        translation = Some(value);
                    }
                    None => {
                        length = 0;
                        translation = None;
                    }
                }
            }

            if length == 0 {
                process_single_char(state, input, &mut i, &mut out);
                continue;
            }

            let uid = state.token_counter.to_string();
            state.token_counter += 1;
            let mut sv = get_sv(state.char_maps, &input[i..i + length]);
            let mut trans = translation.unwrap_or_default();

            if state.cap_next {
                capitalize_first(&mut trans);
                capitalize_first(&mut sv);
                state.cap_next = false;
            }

            out.cn.push_str(&format!("<a href='{uid}'>"));
            append_escaped(&mut out.cn, &input[i..i + length]);
            out.cn.push_str("</a>");
            out.sv
                .push_str(&format!("<a href='{uid}'>{}</a>", html_escape(&sv)));
            out.vn
                .push_str(&format!("<a href='{uid}'>{}</a>", html_escape(&trans)));

            i += length;
            state.progress.update(length);

            if should_append_space(input, i, None) && !out.vn.ends_with(' ') {
                out.vn.push(' ');
                out.sv.push(' ');
            }
            continue;
        }

        process_single_char(state, input, &mut i, &mut out);
    }

    out
}

fn process_single_char(state: &mut ConvertState, input: &[char], i: &mut usize, out: &mut AnnotatedResult) {
    let ch = input[*i];
    let mut translated_text;
    let mut sv_text;
    let mut is_punct = false;

    if let Some(reading) = state.char_maps.reading(ch) {
        translated_text = reading.to_string();
        sv_text = translated_text.clone();
    } else {
        let mapped = state.char_maps.punctuation(ch);
        translated_text = mapped.map(|c| c.to_string()).unwrap_or_else(|| ch.to_string());
        sv_text = translated_text.clone();

        if is_sentence_ender(&translated_text) {
            state.cap_next = true;
            is_punct = true;
        } else if translated_text == "," {
            is_punct = true;
        }
    }

    if !is_punct && state.cap_next && !translated_text.is_empty() {
        capitalize_first(&mut translated_text);
        capitalize_first(&mut sv_text);
        state.cap_next = false;
    }

    let uid = state.token_counter.to_string();
    state.token_counter += 1;

    out.cn.push_str(&format!("<a href='{uid}'>"));
    append_escaped(&mut out.cn, &[ch]);
    out.cn.push_str("</a>");
    out.sv
        .push_str(&format!("<a href='{uid}'>{}</a>", html_escape(&sv_text)));
    out.vn
        .push_str(&format!("<a href='{uid}'>{}</a>", html_escape(&translated_text)));

    *i += 1;
    state.progress.update(1);

    if !translated_text.is_empty()
        && should_append_space(input, *i, Some(ch))
        && !out.vn.ends_with(' ')
    {
        out.vn.push(' ');
        out.sv.push(' ');
    }
}

fn convert_recursive_plain(state: &mut ConvertState, input: &[char]) -> PlainResult {
    let mut out = PlainResult::default();
    let mut i = 0;

    while i < input.len() {
        let ch = input[i];

        if ch == '\n' {
            out.text.push('\n');
            state.cap_next = true;
            i += 1;
            state.progress.update(1);
            continue;
        }
        if ch.is_whitespace() {
            out.text.push(' ');
            i += 1;
            state.progress.update(1);
            continue;
        }

        if let Some(overlay) = state.overlay {
            let (len, translation) = overlay.find(input, i);
            if len > 0 {
                let trans = translation.unwrap_or_default();
                state.cap_next = false;
                out.text.push_str(&trans);
                i += len;
                state.progress.update(len);
                if should_append_space(input, i, None) && !out.text.ends_with(' ') {
                    out.text.push(' ');
                }
                continue;
            }
        }

        let m = state.dictionary.find(input, i);
        let mut length = m.length;
        let mut translation = m.translation.clone();
        let priority = m.priority;

        if length > 0 && priority == Priority::Name {
            let trans = translation.unwrap_or_default();
            state.cap_next = false;
            out.text.push_str(&trans);
            i += length;
            if should_append_space(input, i, None) && !out.text.ends_with(' ') {
                out.text.push(' ');
            }
            state.progress.update(length);
            continue;
        }

        if let Some(rules) = &m.rules {
            if let Some(rule_match) = find_matching_rule(input, i, rules) {
                let rule = &rule_match.rule;
                let start_len = rule.original_start.chars().count();
                let phrase_overrides_rule =
                    length > 0 && priority == Priority::Phrase && length > start_len;

                if !phrase_overrides_rule {
                    let inner_start = i + start_len;
                    let inner_len = rule_match.abs_start_of_end_token - inner_start;
                    let end_len = rule.original_end.chars().count();

                    state.progress.update(start_len);

                    let mut t_start = rule.translation_start.clone();
                    if state.cap_next && !t_start.is_empty() {
                        capitalize_first(&mut t_start);
                        state.cap_next = false;
                    }

                    let inner = convert_recursive_plain(state, &input[inner_start..inner_start + inner_len]);

                    state.progress.update(end_len);

                    if !t_start.is_empty() {
                        out.text.push_str(&t_start);
                        out.text.push(' ');
                    }
                    out.text.push_str(&inner.text);
                    if !rule.translation_end.is_empty() {
                        if !out.text.ends_with(' ') {
                            out.text.push(' ');
                        }
                        out.text.push_str(&rule.translation_end);
                    }

                    i += start_len + inner_len + end_len;

                    if should_append_space(input, i, None) && !out.text.ends_with(' ') {
                        out.text.push(' ');
                    }
                    continue;
                }
            }
        }

        if length > 0 && priority == Priority::Phrase {
            if let Some(conflict_start) =
                is_optimal_phrase(state.dictionary, state.overlay, input, i, length)
            {
                let max_allowed_len = conflict_start - i;
                match shrink_phrase(state, input, i, max_allowed_len) {
                    Some((try_len, value)) => {
                        length = try_len;
                        translation = Some(value);
                    }
                    None => {
                        length = 0;
                        translation = None;
                    }
                }
            }

            if length == 0 {
                process_single_char_plain(state, input, &mut i, &mut out);
                continue;
            }

            let mut trans = translation.unwrap_or_default();
            if state.cap_next {
                capitalize_first(&mut trans);
                state.cap_next = false;
            }
            out.text.push_str(&trans);
            i += length;
            if should_append_space(input, i, None) && !out.text.ends_with(' ') {
                out.text.push(' ');
            }
            state.progress.update(length);
            continue;
        }

        process_single_char_plain(state, input, &mut i, &mut out);
    }

    out
}

fn process_single_char_plain(state: &mut ConvertState, input: &[char], i: &mut usize, out: &mut PlainResult) {
    let ch = input[*i];
    let mut translated_text;
    let mut is_punct = false;

    if let Some(reading) = state.char_maps.reading(ch) {
        translated_text = reading.to_string();
    } else {
        let mapped = state.char_maps.punctuation(ch);
        translated_text = mapped.map(|c| c.to_string()).unwrap_or_else(|| ch.to_string());

        if is_sentence_ender(&translated_text) {
            state.cap_next = true;
            is_punct = true;
        } else if translated_text == "," {
            is_punct = true;
        }
    }

    if !is_punct && state.cap_next && !translated_text.is_empty() {
        capitalize_first(&mut translated_text);
        state.cap_next = false;
    }

    out.text.push_str(&translated_text);
    *i += 1;

    if !translated_text.is_empty()
        && should_append_space(input, *i, Some(ch))
        && !out.text.ends_with(' ')
    {
        out.text.push(' ');
    }

    state.progress.update(1);
}

const CN_STYLE: &str =
    "<style>a{text-decoration:none;color:white;font-family:\"Noto Sans SC\";font-size:18px}</style>";
const SV_STYLE: &str =
    "<style>a{text-decoration:none;color:white;font-family:\"Tahoma\";font-size:16px}</style>";
const VN_STYLE: &str =
    "<style>a{text-decoration:none;color:white;font-family:\"Tahoma\";font-size:16px}</style>";

/// Three aligned output streams: Chinese annotated, Sino-Vietnamese
/// annotated, Vietnamese annotated.
pub struct Conversion {
    pub cn: String,
    pub sv: String,
    pub vn: String,
}

/// Recursive longest-match converter over a primary [`Dictionary`], an
/// optional active [`NameSet`] overlay, and [`CharMaps`] for single-character
/// fallback.
pub struct Converter<'a> {
    dictionary: &'a Dictionary,
    overlay: Option<&'a NameSet>,
    char_maps: &'a CharMaps,
}

impl<'a> Converter<'a> {
    pub fn new(dictionary: &'a Dictionary, overlay: Option<&'a NameSet>, char_maps: &'a CharMaps) -> Self {
        Self {
            dictionary,
            overlay,
            char_maps,
        }
    }

    /// Convert `text`, producing three annotated HTML-ish streams. Calls
    /// `progress_callback` (if given) whenever consumption first crosses
    /// each multiple of 2500 characters.
    pub fn convert(&self, text: &str, mut progress_callback: Option<&mut dyn FnMut(usize)>) -> Conversion {
        tracing::trace!(chars = text.chars().count(), "convert_recursive starting");
        let input: Vec<char> = text.chars().collect();
        let mut state = ConvertState {
            dictionary: self.dictionary,
            overlay: self.overlay,
            char_maps: self.char_maps,
            token_counter: 0,
            cap_next: true,
            progress: Progress::new(progress_callback.take()),
        };
        let res = convert_recursive(&mut state, &input);

        Conversion {
            cn: format!("{CN_STYLE}{}", res.cn),
            sv: format!("{SV_STYLE}{}", res.sv),
            vn: format!("{VN_STYLE}{}", res.vn),
        }
    }

    /// Convert `text`, producing only the plain Vietnamese text, trimmed of
    /// leading/trailing whitespace.
    pub fn convert_plain(&self, text: &str, mut progress_callback: Option<&mut dyn FnMut(usize)>) -> String {
        tracing::trace!(chars = text.chars().count(), "convert_recursive_plain starting");
        let input: Vec<char> = text.chars().collect();
        let mut state = ConvertState {
            dictionary: self.dictionary,
            overlay: self.overlay,
            char_maps: self.char_maps,
            token_counter: 0,
            cap_next: true,
            progress: Progress::new(progress_callback.take()),
        };
        let res = convert_recursive_plain(&mut state, &input);
        res.text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nameset::NameSet;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn base_maps() -> CharMaps {
        let mut maps = CharMaps::new();
        maps.insert_reading('你', "nǐ".into());
        maps.insert_reading('好', "hǎo".into());
        maps.insert_reading('世', "shì".into());
        maps.insert_reading('界', "jiè".into());
        maps.insert_punctuation('。', '.');
        maps
    }

    #[test]
    fn scenario_plain_syllabic_echo() {
        let maps = base_maps();
        let dict = Dictionary::new();
        let conv = Converter::new(&dict, None, &maps);
        assert_eq!(conv.convert_plain("你好", None), "Nǐ hǎo");
    }

    #[test]
    fn scenario_phrase_beats_char_by_char() {
        let maps = base_maps();
        let mut dict = Dictionary::new();
        dict.insert(&chars("你好"), "hello", Priority::Phrase);
        let conv = Converter::new(&dict, None, &maps);
        assert_eq!(conv.convert_plain("你好世界", None), "Hello shì jiè");
    }

    #[test]
    fn scenario_name_beats_phrase_at_equal_length() {
        let maps = base_maps();
        let mut dict = Dictionary::new();
        dict.insert(&chars("你好"), "hi", Priority::Phrase);
        dict.insert(&chars("你好"), "Bob", Priority::Name);
        let conv = Converter::new(&dict, None, &maps);
        assert_eq!(conv.convert_plain("你好", None), "Bob");
    }

    #[test]
    fn scenario_longer_phrase_beats_shorter() {
        let maps = base_maps();
        let mut dict = Dictionary::new();
        dict.insert(&chars("你"), "A", Priority::Phrase);
        dict.insert(&chars("你好"), "B", Priority::Phrase);
        let conv = Converter::new(&dict, None, &maps);
        assert_eq!(conv.convert_plain("你好", None), "B");
    }

    #[test]
    fn scenario_rule_descent_shares_uid_across_streams() {
        let maps = base_maps();
        let mut dict = Dictionary::new();
        dict.insert_rule(&chars("「"), "」", "\"", "\"");
        let conv = Converter::new(&dict, None, &maps);
        let result = conv.convert("「你」", None);
        assert!(result.vn.contains("r0"));
        assert!(result.cn.contains("r0"));
        assert!(result.sv.contains("r0"));
    }

    #[test]
    fn scenario_capitalization_after_sentence_punctuation() {
        let mut maps = CharMaps::new();
        maps.insert_reading('你', "nǐ".into());
        maps.insert_punctuation('。', '.');
        let dict = Dictionary::new();
        let conv = Converter::new(&dict, None, &maps);
        assert_eq!(conv.convert_plain("你。你", None), "Nǐ. Nǐ");
    }

    #[test]
    fn scenario_phrase_shrinks_on_conflict() {
        let mut maps = CharMaps::new();
        maps.insert_reading('A', "a".into());
        maps.insert_reading('B', "b".into());
        maps.insert_reading('C', "c".into());
        let mut dict = Dictionary::new();
        dict.insert(&chars("AB"), "x", Priority::Phrase);
        dict.insert(&chars("BC"), "Y", Priority::Name);
        let conv = Converter::new(&dict, None, &maps);
        assert_eq!(conv.convert_plain("ABC", None), "A Y");
    }

    #[test]
    fn html_escaping_is_applied_to_source_and_translation() {
        let maps = CharMaps::new();
        let mut dict = Dictionary::new();
        dict.insert(&chars("<"), "<tag>", Priority::Phrase);
        let conv = Converter::new(&dict, None, &maps);
        let result = conv.convert("<", None);
        assert!(result.vn.contains("&lt;tag&gt;"));
        assert!(result.cn.contains("&lt;"));
    }

    #[test]
    fn name_set_overlay_overrides_primary_dictionary() {
        let maps = base_maps();
        let mut dict = Dictionary::new();
        dict.insert(&chars("你好"), "hi", Priority::Phrase);
        let mut overlay = NameSet::new();
        overlay.insert(&chars("你"), "You");
        let conv = Converter::new(&dict, Some(&overlay), &maps);
        assert_eq!(conv.convert_plain("你好", None), "You hǎo");
    }

    #[test]
    fn progress_callback_fires_past_threshold() {
        let maps = base_maps();
        let dict = Dictionary::new();
        let long_text: String = "你好".repeat(2000);
        let mut calls = Vec::new();
        let mut cb = |n: usize| calls.push(n);
        let conv = Converter::new(&dict, None, &maps);
        conv.convert_plain(&long_text, Some(&mut cb));
        assert!(!calls.is_empty());
        assert!(calls.iter().all(|&n| n >= 2500));
    }
}
