//! Reading session state machine: reveal position, question gate and answers.

mod gate;
mod reveal;


use alloc::{string::String, vec::Vec};

use log::{debug, warn};

use crate::{
    content::Passage,
    input::{
        InputProvider, Intent, RawInput,
        gesture::{GestureConfig, GestureNormalizer, NormalizedIntent},
    },
    ledger::{AnswerLedger, AnswerSnapshot},
    questions::{PostReadingTask, QuestionSet},
    render::{AnimationKind, AnimationSpec, PromptView, ReadingView},
    store::ResumeState,
    text_policy::excerpt_compact,
};

pub use gate::{ActiveQuestion, GateState, QuestionGate};
pub use reveal::{Direction, Rejection, RevealMachine, RevealState, Transition};

const PROMPT_FADE_MS: u32 = 200;
const LETTER_DELAY_MS: u32 = 4;
const LETTER_TAIL_MS: u32 = 200;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}

/// Default reveal pacing: a fixed per-letter delay plus a short tail.
pub fn letter_pacing(char_count: usize) -> u32 {
    let letters = u32::try_from(char_count).unwrap_or(u32::MAX);
    letters
        .saturating_mul(LETTER_DELAY_MS)
        .saturating_add(LETTER_TAIL_MS)
}

#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    pub gesture: GestureConfig,
    /// Intents closer than this to the previous step are dropped.
    pub transition_lock_ms: u32,
    /// Delay between revealing an anchor sentence and showing its prompt.
    pub question_delay_ms: u32,
    /// Character count to animation duration in milliseconds.
    pub pacing: fn(usize) -> u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            transition_lock_ms: 50,
            question_delay_ms: 350,
            pacing: letter_pacing,
        }
    }
}

impl SessionConfig {
    pub const fn with_gesture(mut self, gesture: GestureConfig) -> Self {
        self.gesture = gesture;
        self
    }

    pub const fn with_transition_lock_ms(mut self, transition_lock_ms: u32) -> Self {
        self.transition_lock_ms = transition_lock_ms;
        self
    }

    pub const fn with_question_delay_ms(mut self, question_delay_ms: u32) -> Self {
        self.question_delay_ms = question_delay_ms;
        self
    }

    pub const fn with_pacing(mut self, pacing: fn(usize) -> u32) -> Self {
        self.pacing = pacing;
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitError {
    /// Answer text is empty after trimming.
    Empty,
    UnknownQuestion,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FinishError {
    QuestionsOutstanding { remaining: usize },
    PassageUnfinished,
}

impl core::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => f.write_str("answer is empty"),
            Self::UnknownQuestion => f.write_str("no question with that key"),
        }
    }
}

impl core::error::Error for SubmitError {}

impl core::fmt::Display for FinishError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::QuestionsOutstanding { remaining } => {
                write!(f, "{remaining} question(s) still need an answer")
            }
            Self::PassageUnfinished => f.write_str("passage has not been read to the end"),
        }
    }
}

impl core::error::Error for FinishError {}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub excerpt: String,
}

pub struct ReadingSession<IN>
where
    IN: InputProvider,
{
    passage: Passage,
    input: IN,
    config: SessionConfig,
    normalizer: GestureNormalizer,
    reveal: RevealMachine,
    gate: QuestionGate,
    ledger: AnswerLedger,
    review_mode: bool,
    pending_redraw: bool,
    prompt_shown: bool,
    input_faults: u32,
}

include!("input.rs");
include!("runtime.rs");
include!("view.rs");
