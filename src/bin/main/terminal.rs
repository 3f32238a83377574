use std::io::{self, Write};

use unfold_core::{
    app::Direction,
    render::{Emphasis, ReadingView},
    text_policy::{excerpt_compact, progress_label},
};

/// What a printed frame showed; identical frames are not printed twice.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct FrameKey {
    position: usize,
    fading_out: Option<usize>,
    prompt_visible: bool,
    finished: bool,
    review_mode: bool,
}

/// Plain-text renderer for the reading view.
pub(super) struct TerminalRenderer {
    full: bool,
    last: Option<FrameKey>,
}

impl TerminalRenderer {
    pub(super) fn new(full: bool) -> Self {
        Self { full, last: None }
    }

    /// Prints the view when it differs from the last printed frame. Returns
    /// whether anything was written.
    pub(super) fn render(
        &mut self,
        view: &ReadingView<'_>,
        now_ms: u64,
        out: &mut impl Write,
    ) -> io::Result<bool> {
        let key = FrameKey {
            position: view.current_position,
            fading_out: view.fading_out,
            prompt_visible: view
                .active_question
                .is_some_and(|prompt| prompt.is_visible(now_ms)),
            finished: view.finished,
            review_mode: view.review_mode,
        };
        if self.last == Some(key) {
            return Ok(false);
        }
        self.last = Some(key);

        if view.revealed.is_empty() {
            writeln!(out, "[{now_ms:>6} ms] {} (empty passage)", view.title)?;
            return Ok(true);
        }

        let label = progress_label(view.current_position, view.sentence_count);
        if self.full {
            writeln!(out, "[{now_ms:>6} ms] {} {label}", view.title)?;
            for (position, sentence) in view.revealed.iter().enumerate() {
                if sentence.starts_new_paragraph {
                    writeln!(out)?;
                }
                writeln!(out, "  {} {}", marker(view, position), sentence.text)?;
            }
        } else {
            let arrow = match view.direction {
                Direction::Advance => '+',
                Direction::Retreat => '-',
            };
            let current = view
                .revealed
                .get(view.current_position)
                .map(|sentence| sentence.text.as_str())
                .unwrap_or_default();
            writeln!(out, "[{now_ms:>6} ms] {label} {arrow} {current}")?;
            if let Some(fading) = view.fading_out.and_then(|pos| view.revealed.get(pos)) {
                writeln!(out, "           hiding: {}", excerpt_compact(&fading.text))?;
            }
        }

        if let Some(prompt) = view.active_question.filter(|prompt| prompt.is_visible(now_ms)) {
            writeln!(out, "           ? {}: {}", prompt.question.key, prompt.question.prompt)?;
        }
        if view.finished {
            writeln!(out, "           end of passage")?;
        }

        Ok(true)
    }
}

fn marker(view: &ReadingView<'_>, position: usize) -> &'static str {
    if view.fading_out == Some(position) {
        return "<<";
    }
    match view.emphasis(position) {
        Emphasis::Current => ">>",
        Emphasis::Recent => " >",
        Emphasis::Faded => " .",
        Emphasis::Dim | Emphasis::Background => "  ",
    }
}
