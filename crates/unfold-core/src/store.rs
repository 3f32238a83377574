//! Persistence port. Implemented by callers; the engine never touches it.

use alloc::string::String;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Reading location used to resume a passage.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResumeState {
    pub position: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum StoreSlot {
    /// Answer snapshot for the passage.
    Answers,
    /// Last reading position.
    Resume,
    /// Grading results returned by the grading collaborator.
    Results,
}

impl StoreSlot {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Answers => "answers",
            Self::Resume => "resume",
            Self::Results => "results",
        }
    }
}

/// Composite store key: one record per passage and slot.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StoreKey {
    pub passage_id: String,
    pub slot: StoreSlot,
}

impl StoreKey {
    pub fn new(passage_id: impl Into<String>, slot: StoreSlot) -> Self {
        Self {
            passage_id: passage_id.into(),
            slot,
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.passage_id, self.slot.as_str())
    }
}

/// Abstract key-value persistence backend.
pub trait KeyValueStore {
    type Error;

    fn load(&mut self, key: &StoreKey) -> Result<Option<String>, Self::Error>;
    fn save(&mut self, key: &StoreKey, value: &str) -> Result<(), Self::Error>;
}
