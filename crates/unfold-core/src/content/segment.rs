use alloc::vec::Vec;

use super::{
    Sentence,
    text_utils::{next_paragraph_at, next_sentence_at},
};

/// Splits passage text into ordered sentences.
///
/// Paragraphs are separated by blank lines; sentences end at `.`, `!` or `?`
/// followed by whitespace and keep their terminator. The first sentence of
/// every paragraph but the first is flagged as starting a new paragraph.
pub fn segment(passage_text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut paragraph_cursor = 0usize;

    while let Some((paragraph, next_paragraph)) = next_paragraph_at(passage_text, paragraph_cursor)
    {
        paragraph_cursor = next_paragraph;

        let mut cursor = 0usize;
        let mut first_in_paragraph = true;
        while let Some((text, next_cursor)) = next_sentence_at(paragraph, cursor) {
            cursor = next_cursor;
            let starts_new_paragraph = first_in_paragraph && !sentences.is_empty();
            sentences.push(Sentence::new(text, starts_new_paragraph));
            first_in_paragraph = false;
        }
    }

    sentences
}
