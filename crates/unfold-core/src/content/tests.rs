use super::sample::{SAMPLE_PASSAGE_TEXT, sample_passage};
use super::*;

#[test]
fn empty_input_yields_no_sentences() {
    assert!(segment("").is_empty());
    assert!(segment("  \n\n \t\n").is_empty());
}

#[test]
fn sentences_keep_their_terminators() {
    let sentences = segment("Hello there. How are you? Fine!");
    let texts: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["Hello there.", "How are you?", "Fine!"]);
    assert!(sentences.iter().all(|s| !s.starts_new_paragraph));
}

#[test]
fn terminator_without_whitespace_does_not_split() {
    let sentences = segment("Version 2.5 shipped.Next came \"quotes.\" Then more.");
    let texts: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(
        texts,
        ["Version 2.5 shipped.Next came \"quotes.\" Then more."]
    );
}

#[test]
fn repeated_terminators_split_once() {
    let sentences = segment("Wow!! Really?! Yes.");
    let texts: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["Wow!!", "Really?!", "Yes."]);
}

#[test]
fn blank_lines_mark_paragraph_starts() {
    let sentences = segment("One. Two.\n\n\nThree.\r\n  \r\nFour. Five.");
    let flags: Vec<(&str, bool)> = sentences
        .iter()
        .map(|s| (s.text.as_str(), s.starts_new_paragraph))
        .collect();
    assert_eq!(
        flags,
        [
            ("One.", false),
            ("Two.", false),
            ("Three.", true),
            ("Four.", true),
            ("Five.", false),
        ]
    );
}

#[test]
fn leading_blank_paragraph_does_not_flag_opening_sentence() {
    let sentences = segment("\n\nOpening line. Second line.");
    assert_eq!(sentences.len(), 2);
    assert!(!sentences[0].starts_new_paragraph);
}

#[test]
fn single_newline_stays_inside_paragraph() {
    let sentences = segment("First half\nof a sentence. Next.");
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0].text, "First half\nof a sentence.");
    assert!(!sentences[1].starts_new_paragraph);
}

#[test]
fn sample_passage_has_twelve_sentences_in_three_paragraphs() {
    let passage = sample_passage();
    assert_eq!(passage.sentence_count(), 12);

    let paragraph_starts: Vec<usize> = passage
        .sentences()
        .iter()
        .enumerate()
        .filter(|(_, s)| s.starts_new_paragraph)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(paragraph_starts, [4, 8]);
}

#[test]
fn passage_text_round_trips_paragraph_structure() {
    let passage = Passage::new("p", "Title", "One. Two.\n\nThree.");
    assert_eq!(passage.text(), "One. Two.\n\nThree.");
    assert_eq!(segment(&passage.text()), passage.sentences());
    assert!(!segment(SAMPLE_PASSAGE_TEXT).is_empty());
}

#[test]
fn char_count_counts_characters_not_bytes() {
    let sentence = Sentence::new("Añejo café.", false);
    assert_eq!(sentence.char_count(), 11);
}
