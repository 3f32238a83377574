//! Comprehension questions: typed variants, anchor validation and decoding of
//! the question service payload.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    string::String,
    vec::Vec,
};
use core::fmt;

use log::warn;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor},
};
use serde_json::Value;

/// Question shown while reading, anchored to a 1-based sentence number.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct WhileReadingQuestion {
    pub key: String,
    pub sentence_number: usize,
    pub prompt: String,
}

/// Summary-correction task handed out once the passage is fully revealed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PostReadingTask {
    pub key: String,
    pub summary_text: String,
    pub flagged_phrases: BTreeSet<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Question {
    WhileReading(WhileReadingQuestion),
    PostReading(PostReadingTask),
}

impl Question {
    pub fn while_reading(
        key: impl Into<String>,
        sentence_number: usize,
        prompt: impl Into<String>,
    ) -> Self {
        Self::WhileReading(WhileReadingQuestion {
            key: key.into(),
            sentence_number,
            prompt: prompt.into(),
        })
    }

    pub fn key(&self) -> &str {
        match self {
            Self::WhileReading(question) => &question.key,
            Self::PostReading(task) => &task.key,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DropReason {
    /// Anchor outside `[2, sentence_count - 1]`.
    OutOfRange,
    /// Another question already claimed the sentence.
    DuplicateAnchor,
    /// Another question already uses the key.
    DuplicateKey,
    /// Only one post-reading task is honoured.
    DuplicatePostReading,
    /// Payload entry did not decode into a known question type.
    Malformed,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DroppedQuestion {
    pub key: String,
    pub reason: DropReason,
}

/// Validated questions for one passage.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QuestionSet {
    anchored: BTreeMap<usize, WhileReadingQuestion>,
    post_reading: Option<PostReadingTask>,
    dropped: Vec<DroppedQuestion>,
}

impl QuestionSet {
    /// Builds the set, keeping the first valid question at each anchor.
    pub fn new<I>(sentence_count: usize, questions: I) -> Self
    where
        I: IntoIterator<Item = Question>,
    {
        let mut set = Self::default();
        for question in questions {
            set.insert(sentence_count, question);
        }
        set
    }

    pub fn empty() -> Self {
        Self::default()
    }

    fn insert(&mut self, sentence_count: usize, question: Question) {
        let key_taken = self.contains_key(question.key());
        match question {
            Question::WhileReading(question) => {
                let last_allowed = sentence_count.saturating_sub(1);
                let reason = if question.sentence_number < 2
                    || question.sentence_number > last_allowed
                {
                    Some(DropReason::OutOfRange)
                } else if self.anchored.contains_key(&question.sentence_number) {
                    Some(DropReason::DuplicateAnchor)
                } else if key_taken {
                    Some(DropReason::DuplicateKey)
                } else {
                    None
                };

                match reason {
                    Some(reason) => {
                        warn!(
                            "questions: dropping key={} sentence={} of {} reason={:?}",
                            question.key, question.sentence_number, sentence_count, reason
                        );
                        self.dropped.push(DroppedQuestion {
                            key: question.key,
                            reason,
                        });
                    }
                    None => {
                        self.anchored.insert(question.sentence_number, question);
                    }
                }
            }
            Question::PostReading(task) => {
                let reason = if self.post_reading.is_some() {
                    Some(DropReason::DuplicatePostReading)
                } else if key_taken {
                    Some(DropReason::DuplicateKey)
                } else {
                    None
                };

                match reason {
                    Some(reason) => {
                        warn!("questions: dropping key={} reason={:?}", task.key, reason);
                        self.dropped.push(DroppedQuestion {
                            key: task.key,
                            reason,
                        });
                    }
                    None => self.post_reading = Some(task),
                }
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.anchored.values().any(|question| question.key == key)
            || self.post_reading.as_ref().is_some_and(|task| task.key == key)
    }

    /// Anchored questions ordered by sentence number.
    pub fn anchored(&self) -> impl Iterator<Item = &WhileReadingQuestion> {
        self.anchored.values()
    }

    pub fn at_sentence(&self, sentence_number: usize) -> Option<&WhileReadingQuestion> {
        self.anchored.get(&sentence_number)
    }

    pub fn post_reading(&self) -> Option<&PostReadingTask> {
        self.post_reading.as_ref()
    }

    /// Questions rejected while building the set, in encounter order.
    pub fn dropped(&self) -> &[DroppedQuestion] {
        &self.dropped
    }

    pub fn anchored_len(&self) -> usize {
        self.anchored.len()
    }
}

#[derive(Debug)]
pub enum PayloadError {
    Json(serde_json::Error),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid question payload: {err}"),
        }
    }
}

impl core::error::Error for PayloadError {}

impl From<serde_json::Error> for PayloadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum WireQuestion {
    WhileReading {
        #[serde(rename = "sentence-number")]
        sentence_number: i64,
        question: String,
    },
    PostReading {
        summary: String,
        #[serde(default)]
        errors: BTreeMap<String, String>,
    },
}

/// Decoded question service response, in document order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QuestionPayload {
    questions: Vec<Question>,
    malformed: Vec<DroppedQuestion>,
}

impl QuestionPayload {
    /// Decodes `{"question1": {"type": "while-reading", ...}, ...}`.
    ///
    /// Entries with an unknown shape are skipped and reported as
    /// [`DropReason::Malformed`]; only a document that is not a JSON object
    /// fails outright.
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        let entries: OrderedEntries = serde_json::from_str(json)?;
        let mut payload = Self::default();

        for (key, value) in entries.0 {
            match WireQuestion::deserialize(value) {
                Ok(WireQuestion::WhileReading {
                    sentence_number,
                    question,
                }) => {
                    // Negative anchors can never be valid; usize::MAX keeps them out of range.
                    let sentence_number = usize::try_from(sentence_number).unwrap_or(usize::MAX);
                    payload.questions.push(Question::WhileReading(WhileReadingQuestion {
                        key,
                        sentence_number,
                        prompt: question,
                    }));
                }
                Ok(WireQuestion::PostReading { summary, errors }) => {
                    payload.questions.push(Question::PostReading(PostReadingTask {
                        key,
                        summary_text: summary,
                        flagged_phrases: errors.into_values().collect(),
                    }));
                }
                Err(err) => {
                    warn!("questions: malformed entry key={} err={}", key, err);
                    payload.malformed.push(DroppedQuestion {
                        key,
                        reason: DropReason::Malformed,
                    });
                }
            }
        }

        Ok(payload)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Validates anchors against the passage length.
    pub fn into_question_set(self, sentence_count: usize) -> QuestionSet {
        let mut set = QuestionSet::new(sentence_count, self.questions);
        let mut dropped = self.malformed;
        dropped.append(&mut set.dropped);
        set.dropped = dropped;
        set
    }
}

struct OrderedEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of question keys to questions")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::sample::SAMPLE_QUESTIONS_JSON;

    #[test]
    fn out_of_range_anchors_are_dropped() {
        let set = QuestionSet::new(
            12,
            [
                Question::while_reading("first", 1, "On the first sentence?"),
                Question::while_reading("last", 12, "On the last sentence?"),
                Question::while_reading("zero", 0, "Before the passage?"),
                Question::while_reading("ok", 6, "In the middle?"),
            ],
        );

        assert_eq!(set.anchored_len(), 1);
        assert!(set.at_sentence(6).is_some());
        assert!(set.at_sentence(1).is_none());
        assert!(set.at_sentence(12).is_none());
        let reasons: Vec<(&str, DropReason)> = set
            .dropped()
            .iter()
            .map(|d| (d.key.as_str(), d.reason))
            .collect();
        assert_eq!(
            reasons,
            [
                ("first", DropReason::OutOfRange),
                ("last", DropReason::OutOfRange),
                ("zero", DropReason::OutOfRange),
            ]
        );
    }

    #[test]
    fn first_question_wins_a_shared_anchor() {
        let set = QuestionSet::new(
            10,
            [
                Question::while_reading("a", 4, "First?"),
                Question::while_reading("b", 4, "Second?"),
                Question::while_reading("a", 5, "Reused key?"),
            ],
        );

        assert_eq!(set.at_sentence(4).map(|q| q.key.as_str()), Some("a"));
        assert!(set.at_sentence(5).is_none());
        assert_eq!(set.dropped()[0].reason, DropReason::DuplicateAnchor);
        assert_eq!(set.dropped()[1].reason, DropReason::DuplicateKey);
    }

    #[test]
    fn tiny_passages_accept_no_anchors() {
        let set = QuestionSet::new(2, [Question::while_reading("q", 2, "?")]);
        assert_eq!(set.anchored_len(), 0);
        assert_eq!(set.dropped().len(), 1);
    }

    #[test]
    fn payload_decodes_in_document_order() {
        let json = r#"{
            "question10": {"type": "while-reading", "sentence-number": 3, "question": "Later key first?"},
            "question2": {"type": "while-reading", "sentence-number": 3, "question": "Earlier key second?"},
            "question3": {"type": "post-reading", "summary": "A summary.", "errors": {"error1": "wrong bit"}}
        }"#;

        let set = QuestionPayload::from_json(json)
            .expect("payload decodes")
            .into_question_set(8);

        assert_eq!(set.at_sentence(3).map(|q| q.key.as_str()), Some("question10"));
        assert_eq!(set.dropped()[0].key, "question2");
        let task = set.post_reading().expect("post-reading task");
        assert!(task.flagged_phrases.contains("wrong bit"));
    }

    #[test]
    fn malformed_entries_are_reported_not_fatal() {
        let json = r#"{
            "q1": {"type": "multiple-choice", "question": "?"},
            "q2": {"type": "while-reading", "question": "Missing anchor?"},
            "q3": {"type": "while-reading", "sentence-number": -4, "question": "Negative?"},
            "q4": {"type": "while-reading", "sentence-number": 2, "question": "Fine?"}
        }"#;

        let set = QuestionPayload::from_json(json)
            .expect("payload decodes")
            .into_question_set(5);

        assert_eq!(set.anchored_len(), 1);
        let reasons: Vec<DropReason> = set.dropped().iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            [
                DropReason::Malformed,
                DropReason::Malformed,
                DropReason::OutOfRange
            ]
        );
    }

    #[test]
    fn non_object_payload_is_an_error() {
        assert!(QuestionPayload::from_json("[1, 2, 3]").is_err());
        assert!(QuestionPayload::from_json("not json").is_err());
    }

    #[test]
    fn sample_payload_matches_sample_passage() {
        let set = QuestionPayload::from_json(SAMPLE_QUESTIONS_JSON)
            .expect("sample decodes")
            .into_question_set(12);

        assert_eq!(set.anchored_len(), 2);
        assert!(set.dropped().is_empty());
        assert_eq!(set.post_reading().map(|t| t.flagged_phrases.len()), Some(2));
    }
}
