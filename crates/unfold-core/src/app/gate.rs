use alloc::string::String;

use log::debug;

use crate::{
    ledger::AnswerLedger,
    questions::{QuestionSet, WhileReadingQuestion},
};

/// Question currently holding the gate shut.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActiveQuestion {
    pub key: String,
    pub sentence_number: usize,
    pub prompt_visible_at_ms: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GateState<'a> {
    pub suspended: bool,
    pub active_question_key: Option<&'a str>,
}

/// Suspends forward progress on anchored questions that have no answer yet.
///
/// The gate holds at most one [`ActiveQuestion`]; being suspended and having
/// an active key are the same fact.
#[derive(Debug)]
pub struct QuestionGate {
    questions: QuestionSet,
    active: Option<ActiveQuestion>,
    prompt_delay_ms: u32,
}

impl QuestionGate {
    pub fn new(questions: QuestionSet, prompt_delay_ms: u32) -> Self {
        Self {
            questions,
            active: None,
            prompt_delay_ms,
        }
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn state(&self) -> GateState<'_> {
        GateState {
            suspended: self.active.is_some(),
            active_question_key: self.active.as_ref().map(|active| active.key.as_str()),
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveQuestion> {
        self.active.as_ref()
    }

    pub fn active_question(&self) -> Option<&WhileReadingQuestion> {
        self.active
            .as_ref()
            .and_then(|active| self.questions.at_sentence(active.sentence_number))
    }

    /// Called after the reveal position moved onto `position` (0-based).
    /// Returns `true` when the gate closed.
    pub fn on_advance(&mut self, position: usize, ledger: &AnswerLedger, now_ms: u64) -> bool {
        if self.active.is_some() {
            return false;
        }

        let sentence_number = position + 1;
        let Some(question) = self.questions.at_sentence(sentence_number) else {
            return false;
        };
        if ledger.is_answered(&question.key) {
            return false;
        }

        debug!(
            "gate: suspend key={} sentence={} at_ms={}",
            question.key, sentence_number, now_ms
        );
        self.active = Some(ActiveQuestion {
            key: question.key.clone(),
            sentence_number,
            prompt_visible_at_ms: now_ms.saturating_add(self.prompt_delay_ms as u64),
        });
        true
    }

    /// Opens the gate when `key` is the active question.
    pub fn release(&mut self, key: &str) -> bool {
        if self.active.as_ref().is_some_and(|active| active.key == key) {
            debug!("gate: release key={}", key);
            self.active = None;
            return true;
        }
        false
    }

    /// Drops the pending question without answering it.
    pub fn dismiss(&mut self) -> Option<ActiveQuestion> {
        let dismissed = self.active.take();
        if let Some(active) = dismissed.as_ref() {
            debug!("gate: dismiss key={}", active.key);
        }
        dismissed
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.questions
            .anchored()
            .map(|question| question.key.as_str())
    }

    pub fn outstanding(&self, ledger: &AnswerLedger) -> usize {
        self.required_keys()
            .filter(|key| !ledger.is_answered(key))
            .count()
    }

    /// Earliest anchored question without an answer.
    pub fn first_unanswered(&self, ledger: &AnswerLedger) -> Option<&WhileReadingQuestion> {
        self.questions
            .anchored()
            .find(|question| !ledger.is_answered(&question.key))
    }
}
