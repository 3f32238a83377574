pub(super) fn next_paragraph_at(text: &str, mut cursor: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    let len = bytes.len();

    while cursor < len && bytes[cursor].is_ascii_whitespace() {
        cursor += 1;
    }
    if cursor >= len {
        return None;
    }

    let start = cursor;
    while cursor < len {
        if bytes[cursor] == b'\n' && line_is_blank(bytes, cursor + 1) {
            return Some((text[start..cursor].trim_end(), cursor + 1));
        }
        cursor += 1;
    }

    Some((text[start..].trim_end(), len))
}

pub(super) fn next_sentence_at(text: &str, mut cursor: usize) -> Option<(&str, usize)> {
    let len = text.len();

    while let Some(ch) = text[cursor..].chars().next() {
        if !ch.is_whitespace() {
            break;
        }
        cursor += ch.len_utf8();
    }
    if cursor >= len {
        return None;
    }

    let start = cursor;
    let mut chars = text[start..].char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        if is_terminator(ch) && chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            let end = start + offset + ch.len_utf8();
            return Some((&text[start..end], end));
        }
    }

    Some((text[start..].trim_end(), len))
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

// A line made only of spaces, tabs or carriage returns counts as a paragraph break.
fn line_is_blank(bytes: &[u8], mut cursor: usize) -> bool {
    while cursor < bytes.len() {
        match bytes[cursor] {
            b'\n' => return true,
            b' ' | b'\t' | b'\r' => cursor += 1,
            _ => return false,
        }
    }
    true
}
