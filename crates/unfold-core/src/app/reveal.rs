use alloc::vec::Vec;

use log::debug;

use crate::{
    content::Sentence,
    render::{AnimationKind, AnimationSpec},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Advance,
    Retreat,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RevealState {
    pub current_position: usize,
    /// Sentence still playing its exit animation after a retreat.
    pub fading_out: Option<usize>,
    pub direction: Direction,
}

/// Why an intent did not move the reveal position.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rejection {
    /// Arrived inside the transition lock of the previous step.
    Locked,
    /// A question is waiting for an answer.
    Blocked,
    AtEnd,
    AtStart,
    /// Passage has no sentences.
    Empty,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
    pub animation: AnimationSpec,
}

/// Position bookkeeping for sentence-by-sentence disclosure.
#[derive(Debug)]
pub struct RevealMachine {
    durations: Vec<u32>,
    state: RevealState,
    lock_ms: u32,
    last_transition_ms: Option<u64>,
    entrance: Option<AnimationSpec>,
    exit: Option<AnimationSpec>,
}

impl RevealMachine {
    /// Precomputes each sentence's animation duration with `pacing`.
    pub fn new(sentences: &[Sentence], pacing: fn(usize) -> u32, lock_ms: u32) -> Self {
        Self {
            durations: sentences
                .iter()
                .map(|sentence| pacing(sentence.char_count()))
                .collect(),
            state: RevealState {
                current_position: 0,
                fading_out: None,
                direction: Direction::Advance,
            },
            lock_ms,
            last_transition_ms: None,
            entrance: None,
            exit: None,
        }
    }

    pub const fn state(&self) -> RevealState {
        self.state
    }

    pub fn sentence_count(&self) -> usize {
        self.durations.len()
    }

    pub fn is_at_end(&self) -> bool {
        !self.durations.is_empty() && self.state.current_position + 1 == self.durations.len()
    }

    pub const fn entrance(&self) -> Option<AnimationSpec> {
        self.entrance
    }

    pub const fn exit(&self) -> Option<AnimationSpec> {
        self.exit
    }

    pub fn duration_ms(&self, position: usize) -> u32 {
        self.durations.get(position).copied().unwrap_or(0)
    }

    pub fn advance(&mut self, suspended: bool, now_ms: u64) -> Result<Transition, Rejection> {
        self.check_ready(now_ms)?;
        if suspended {
            return Err(Rejection::Blocked);
        }

        let from = self.state.current_position;
        if from + 1 >= self.durations.len() {
            return Err(Rejection::AtEnd);
        }

        let to = from + 1;
        let animation = AnimationSpec::new(AnimationKind::Reveal, now_ms, self.duration_ms(to));
        self.state = RevealState {
            current_position: to,
            fading_out: None,
            direction: Direction::Advance,
        };
        self.entrance = Some(animation);
        self.exit = None;
        self.last_transition_ms = Some(now_ms);

        debug!("reveal: advance {} -> {} at_ms={}", from, to, now_ms);
        Ok(Transition {
            from,
            to,
            direction: Direction::Advance,
            animation,
        })
    }

    pub fn retreat(&mut self, now_ms: u64) -> Result<Transition, Rejection> {
        self.check_ready(now_ms)?;

        let from = self.state.current_position;
        if from == 0 {
            return Err(Rejection::AtStart);
        }

        let to = from - 1;
        let animation = AnimationSpec::new(AnimationKind::Hide, now_ms, self.duration_ms(from));
        self.state = RevealState {
            current_position: to,
            fading_out: Some(from),
            direction: Direction::Retreat,
        };
        self.entrance = None;
        self.exit = Some(animation);
        self.last_transition_ms = Some(now_ms);

        debug!("reveal: retreat {} -> {} at_ms={}", from, to, now_ms);
        Ok(Transition {
            from,
            to,
            direction: Direction::Retreat,
            animation,
        })
    }

    /// Drops finished animations. Returns `true` when a fading sentence left
    /// the view.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        if self.entrance.is_some_and(|anim| now_ms >= anim.end_ms()) {
            self.entrance = None;
        }

        if self.exit.is_some_and(|anim| now_ms >= anim.end_ms()) {
            self.exit = None;
            self.state.fading_out = None;
            return true;
        }

        false
    }

    /// Moves straight to `position` without animation or lock.
    pub fn jump_to(&mut self, position: usize) -> usize {
        let position = position.min(self.durations.len().saturating_sub(1));
        self.state = RevealState {
            current_position: position,
            fading_out: None,
            direction: Direction::Advance,
        };
        self.entrance = None;
        self.exit = None;
        self.last_transition_ms = None;
        position
    }

    fn check_ready(&self, now_ms: u64) -> Result<(), Rejection> {
        if self.durations.is_empty() {
            return Err(Rejection::Empty);
        }

        if let Some(last) = self.last_transition_ms
            && now_ms < last.saturating_add(self.lock_ms as u64)
        {
            debug!(
                "reveal: locked at_ms={} last_transition_ms={}",
                now_ms, last
            );
            return Err(Rejection::Locked);
        }

        Ok(())
    }
}
