//! Passage content for sentence-by-sentence disclosure.

pub mod sample;
mod segment;
mod text_utils;

#[cfg(test)]
mod tests;

use alloc::{string::String, vec::Vec};

use serde::Serialize;

pub use segment::segment;

/// One disclosure unit of a passage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Sentence {
    pub text: String,
    pub starts_new_paragraph: bool,
}

impl Sentence {
    pub fn new(text: impl Into<String>, starts_new_paragraph: bool) -> Self {
        Self {
            text: text.into(),
            starts_new_paragraph,
        }
    }

    /// Character count used for reveal pacing.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// A segmented passage plus the identity callers use for store keys.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Passage {
    id: String,
    title: String,
    sentences: Vec<Sentence>,
}

impl Passage {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: &str) -> Self {
        Self::from_sentences(id, title, segment(text))
    }

    pub fn from_sentences(
        id: impl Into<String>,
        title: impl Into<String>,
        sentences: Vec<Sentence>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sentences,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentence(&self, position: usize) -> Option<&Sentence> {
        self.sentences.get(position)
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Reassembles the passage text, paragraphs separated by a blank line.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (index, sentence) in self.sentences.iter().enumerate() {
            if index > 0 {
                out.push_str(if sentence.starts_new_paragraph {
                    "\n\n"
                } else {
                    " "
                });
            }
            out.push_str(&sentence.text);
        }
        out
    }
}
