//! Shared text shaping and truncation policies for compact UI surfaces.

use alloc::string::String;
use core::fmt::Write;

use heapless::String as LabelString;

pub const EXCERPT_MAX_WORDS: usize = 9;
pub const EXCERPT_MAX_CHARS: usize = 48;
pub const PROGRESS_LABEL_BYTES: usize = 24;

/// First words of `source`, bounded by word and character count, with a
/// trailing `...` when anything was cut.
pub fn excerpt(source: &str, max_words: usize, max_chars: usize) -> String {
    let mut out = String::new();
    let mut char_count = 0usize;
    let mut truncated = false;

    for (word_count, word) in source.split_whitespace().enumerate() {
        if word_count >= max_words {
            truncated = true;
            break;
        }

        if word_count > 0 {
            if char_count >= max_chars {
                truncated = true;
                break;
            }
            out.push(' ');
            char_count += 1;
        }

        for ch in word.chars() {
            if char_count >= max_chars {
                truncated = true;
                break;
            }
            out.push(ch);
            char_count += 1;
        }

        if truncated {
            break;
        }
    }

    if out.is_empty() {
        return out;
    }

    if truncated {
        let kept = out.trim_end().len();
        out.truncate(kept);
        out.push_str("...");
    }

    out
}

pub fn excerpt_compact(source: &str) -> String {
    excerpt(source, EXCERPT_MAX_WORDS, EXCERPT_MAX_CHARS)
}

/// `"6 / 12"` style progress label for a 0-based position.
pub fn progress_label(position: usize, total: usize) -> LabelString<PROGRESS_LABEL_BYTES> {
    let mut out = LabelString::new();
    if total == 0 {
        let _ = out.push_str("0 / 0");
        return out;
    }

    let shown = position.saturating_add(1).min(total);
    // Only absurd counts overflow the label; keep the position alone then.
    if write!(out, "{shown} / {total}").is_err() {
        out.clear();
        let _ = write!(out, "{shown}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_keeps_short_text_whole() {
        assert_eq!(excerpt("A keeper had   no one.", 9, 48), "A keeper had no one.");
        assert_eq!(excerpt("   ", 9, 48), "");
    }

    #[test]
    fn excerpt_truncates_by_words() {
        assert_eq!(excerpt("one two three four", 2, 48), "one two...");
    }

    #[test]
    fn excerpt_truncates_by_characters() {
        assert_eq!(excerpt("lighthouse keepers", 9, 6), "lighth...");
        assert_eq!(excerpt("ab cd", 9, 3), "ab...");
    }

    #[test]
    fn progress_label_is_one_based() {
        assert_eq!(progress_label(5, 12).as_str(), "6 / 12");
        assert_eq!(progress_label(40, 12).as_str(), "12 / 12");
        assert_eq!(progress_label(0, 0).as_str(), "0 / 0");
    }
}
