//! Submitted answers, keyed by question.

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
};

use serde::{Deserialize, Serialize};

/// Answers submitted during a session. Upsert only.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AnswerLedger {
    answers: BTreeMap<String, String>,
}

impl AnswerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from previously stored answers.
    pub fn seeded<I, K, V>(answers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            answers: answers
                .into_iter()
                .map(|(key, text)| (key.into(), text.into()))
                .collect(),
        }
    }

    /// Last write wins; writing the same text twice is a no-op.
    pub fn upsert(&mut self, key: &str, text: &str) {
        match self.answers.get_mut(key) {
            Some(existing) if existing == text => {}
            Some(existing) => *existing = text.to_string(),
            None => {
                self.answers.insert(key.to_string(), text.to_string());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.answers.get(key).map(String::as_str)
    }

    pub fn is_answered(&self, key: &str) -> bool {
        self.get(key).is_some_and(|text| !text.trim().is_empty())
    }

    pub fn is_complete<'a, I>(&self, required_keys: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        required_keys.into_iter().all(|key| self.is_answered(key))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn snapshot(&self) -> AnswerSnapshot {
        AnswerSnapshot {
            answers: self.answers.clone(),
        }
    }
}

impl From<AnswerSnapshot> for AnswerLedger {
    fn from(snapshot: AnswerSnapshot) -> Self {
        Self {
            answers: snapshot.answers,
        }
    }
}

/// Immutable copy of the ledger, serialised as a flat JSON object.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSnapshot {
    answers: BTreeMap<String, String>,
}

impl AnswerSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.answers.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers
            .iter()
            .map(|(key, text)| (key.as_str(), text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
