use std::fmt::Display;

use log::warn;
use unfold_core::{
    ledger::AnswerSnapshot,
    store::{KeyValueStore, ResumeState, StoreKey, StoreSlot},
};

/// Everything the driver persists between runs for one passage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct ProgressRecord {
    pub(super) answers: AnswerSnapshot,
    pub(super) resume: ResumeState,
}

/// Debounces progress writes so a burst of navigation costs one save.
pub(super) struct ProgressSyncState {
    passage_id: String,
    debounce_ms: u64,
    last_saved: ProgressRecord,
    pending: Option<(ProgressRecord, u64)>,
}

impl ProgressSyncState {
    pub(super) fn new(passage_id: &str, initial: ProgressRecord, debounce_ms: u64) -> Self {
        Self {
            passage_id: passage_id.to_string(),
            debounce_ms,
            last_saved: initial,
            pending: None,
        }
    }

    pub(super) fn track_current(&mut self, current: ProgressRecord, now_ms: u64) {
        if current == self.last_saved {
            self.pending = None;
            return;
        }

        match self.pending.as_mut() {
            Some((pending, changed_at_ms)) => {
                if *pending != current {
                    *pending = current;
                    *changed_at_ms = now_ms;
                }
            }
            None => {
                self.pending = Some((current, now_ms));
            }
        }
    }

    pub(super) fn flush_if_due<S>(&mut self, store: Option<&mut S>, now_ms: u64)
    where
        S: KeyValueStore,
        S::Error: Display,
    {
        let Some((_, changed_at_ms)) = self.pending.as_ref() else {
            return;
        };

        if now_ms.saturating_sub(*changed_at_ms) < self.debounce_ms {
            return;
        }

        self.flush_now(store, now_ms);
    }

    /// Writes any pending change regardless of the debounce window.
    pub(super) fn flush_now<S>(&mut self, store: Option<&mut S>, now_ms: u64)
    where
        S: KeyValueStore,
        S::Error: Display,
    {
        let Some((candidate, _)) = self.pending.take() else {
            return;
        };

        match store {
            Some(store) => match self.save(store, &candidate) {
                Ok(()) => self.last_saved = candidate,
                Err(err) => {
                    warn!("progress: save failed, retrying later: {err}");
                    self.pending = Some((candidate, now_ms));
                }
            },
            None => self.last_saved = candidate,
        }
    }

    pub(super) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn save<S>(&self, store: &mut S, record: &ProgressRecord) -> Result<(), String>
    where
        S: KeyValueStore,
        S::Error: Display,
    {
        if record.answers != self.last_saved.answers {
            let key = StoreKey::new(self.passage_id.as_str(), StoreSlot::Answers);
            let json = serde_json::to_string(&record.answers).map_err(|err| err.to_string())?;
            store
                .save(&key, &json)
                .map_err(|err| format!("{key}: {err}"))?;
        }

        if record.resume != self.last_saved.resume {
            let key = StoreKey::new(self.passage_id.as_str(), StoreSlot::Resume);
            let json = serde_json::to_string(&record.resume).map_err(|err| err.to_string())?;
            store
                .save(&key, &json)
                .map_err(|err| format!("{key}: {err}"))?;
        }

        Ok(())
    }
}
