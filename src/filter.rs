//! Completion filter: decides whether partially-typed input is a
//! complete-enough unit to translate.
//!
//! A debounce heuristic standing in for real sentence-boundary detection:
//! it suppresses backend calls while the user is still mid-sentence, at the
//! cost of occasionally suppressing a real short sentence.

/// Minimum trimmed input length before translation is considered.
pub const MIN_INPUT_CHARS: usize = 3;
/// Minimum characters left after stripping punctuation and whitespace.
pub const MIN_CONTENT_CHARS: usize = 3;
/// Minimum stripped characters required after a lone full-width comma.
pub const MIN_CHARS_AFTER_COMMA: usize = 2;

/// Clause-boundary marks: input ending in one of these expects more text.
const CLAUSE_PUNCTUATION: [char; 4] = ['，', '、', '；', '：'];

/// Full-width and CJK punctuation treated as non-content, alongside ASCII
/// punctuation.
const FULLWIDTH_PUNCTUATION: &str = "，。！？；：“”‘’（）【】《》、";

/// True if `c` falls in the CJK Unified Ideographs block (U+4E00–U+9FFF).
fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || FULLWIDTH_PUNCTUATION.contains(c)
}

/// Number of characters that are neither punctuation nor whitespace.
fn content_chars(text: &str) -> usize {
    text.chars()
        .filter(|c| !is_punctuation(*c) && !c.is_whitespace())
        .count()
}

/// Whether `text` should be sent to the translation backend.
///
/// Rejects input that is too short, contains no Chinese script, ends on a
/// clause boundary, or looks like a second clause still being typed.
/// Multiple commas and other clause separators fall through to accept.
pub fn should_translate(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_INPUT_CHARS {
        return false;
    }

    if !trimmed.chars().any(is_cjk) {
        return false;
    }

    if let Some(last) = trimmed.chars().last() {
        if CLAUSE_PUNCTUATION.contains(&last) {
            return false;
        }
    }

    if content_chars(trimmed) < MIN_CONTENT_CHARS {
        return false;
    }

    // A single full-width comma with a near-empty tail usually means the
    // second clause is still being typed: "你好，世" on the way to "你好，世界".
    let comma_count = trimmed.chars().filter(|&c| c == '，').count();
    if comma_count == 1 {
        let tail = trimmed.split('，').nth(1).unwrap_or("");
        if content_chars(tail) < MIN_CHARS_AFTER_COMMA {
            return false;
        }
    }

    true
}
