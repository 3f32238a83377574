//! View models and animation metadata for the reading surface.

use crate::{
    app::Direction,
    content::Sentence,
    questions::WhileReadingQuestion,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnimationKind {
    /// Letter-by-letter entrance of the newly revealed sentence.
    Reveal,
    /// Reverse letter wipe of a sentence being taken back.
    Hide,
    /// Question prompt fading in next to its anchor sentence.
    Prompt,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AnimationFrame {
    pub kind: AnimationKind,
    /// 0..=100
    pub progress_pct: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AnimationSpec {
    pub kind: AnimationKind,
    pub start_ms: u64,
    pub duration_ms: u32,
}

impl AnimationSpec {
    pub const fn new(kind: AnimationKind, start_ms: u64, duration_ms: u32) -> Self {
        Self {
            kind,
            start_ms,
            duration_ms,
        }
    }

    pub const fn end_ms(self) -> u64 {
        self.start_ms + self.duration_ms as u64
    }

    pub fn frame(self, now_ms: u64) -> Option<AnimationFrame> {
        let duration = self.duration_ms.max(1) as u64;
        let elapsed = now_ms.saturating_sub(self.start_ms);
        if elapsed >= duration {
            return None;
        }

        let progress = ((elapsed * 100) / duration).min(100) as u8;
        Some(AnimationFrame {
            kind: self.kind,
            progress_pct: progress,
        })
    }
}

/// Emphasis ladder for revealed sentences by distance from the current one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Emphasis {
    Current,
    Recent,
    Faded,
    Dim,
    Background,
}

impl Emphasis {
    pub const fn for_distance(distance: usize) -> Self {
        match distance {
            0 => Self::Current,
            1 => Self::Recent,
            2 => Self::Faded,
            3 => Self::Dim,
            _ => Self::Background,
        }
    }
}

/// Question prompt currently blocking forward progress.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PromptView<'a> {
    pub question: &'a WhileReadingQuestion,
    /// When the prompt should appear; the anchor sentence finishes first.
    pub visible_at_ms: u64,
    pub animation: AnimationSpec,
}

impl PromptView<'_> {
    pub fn is_visible(&self, now_ms: u64) -> bool {
        now_ms >= self.visible_at_ms
    }
}

/// Read-only projection of a reading session for renderers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReadingView<'a> {
    pub title: &'a str,
    /// Sentences to draw, including one that is still fading out.
    pub revealed: &'a [Sentence],
    pub current_position: usize,
    pub fading_out: Option<usize>,
    pub direction: Direction,
    pub active_question: Option<PromptView<'a>>,
    pub entrance: Option<AnimationSpec>,
    pub exit: Option<AnimationSpec>,
    pub sentence_count: usize,
    pub review_mode: bool,
    /// Last sentence reached with nothing outstanding.
    pub finished: bool,
}

impl ReadingView<'_> {
    pub fn emphasis(&self, position: usize) -> Emphasis {
        Emphasis::for_distance(self.current_position.abs_diff(position))
    }

    /// Entrance frame for the current sentence, `None` once it has settled.
    pub fn entrance_frame(&self, now_ms: u64) -> Option<AnimationFrame> {
        self.entrance.and_then(|anim| anim.frame(now_ms))
    }

    pub fn exit_frame(&self, now_ms: u64) -> Option<AnimationFrame> {
        self.exit.and_then(|anim| anim.frame(now_ms))
    }

    pub fn is_animating(&self, now_ms: u64) -> bool {
        self.entrance_frame(now_ms).is_some()
            || self.exit_frame(now_ms).is_some()
            || self
                .active_question
                .is_some_and(|prompt| prompt.animation.frame(now_ms).is_some())
    }
}
