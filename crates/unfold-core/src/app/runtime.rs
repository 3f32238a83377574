impl<IN> ReadingSession<IN>
where
    IN: InputProvider,
{
    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        self.process_inputs();
        self.drain_intents(now_ms);

        if self.reveal.expire(now_ms) {
            self.pending_redraw = true;
        }

        if !self.prompt_shown
            && let Some(active) = self.gate.active()
            && now_ms >= active.prompt_visible_at_ms
        {
            debug!("gate: prompt visible key={} at_ms={}", active.key, now_ms);
            self.prompt_shown = true;
            self.pending_redraw = true;
        }

        if self.pending_redraw {
            self.pending_redraw = false;
            return TickResult::RenderRequested;
        }

        if self.current_view().is_animating(now_ms) {
            return TickResult::RenderRequested;
        }

        TickResult::NoRender
    }

    pub fn is_session_complete(&self) -> bool {
        if self.passage.is_empty() {
            return true;
        }

        self.reveal.is_at_end()
            && !self.gate.is_suspended()
            && self.ledger.is_complete(self.gate.required_keys())
    }

    /// Hands out the answers once the passage is read and every question is
    /// answered.
    pub fn finish(&self) -> Result<AnswerSnapshot, FinishError> {
        let remaining = self.gate.outstanding(&self.ledger);
        if remaining > 0 {
            return Err(FinishError::QuestionsOutstanding { remaining });
        }
        if !self.passage.is_empty() && !self.reveal.is_at_end() {
            return Err(FinishError::PassageUnfinished);
        }

        debug!(
            "session: finished passage={} answers={}",
            self.passage.id(),
            self.ledger.len()
        );
        Ok(self.ledger.snapshot())
    }

    /// Back to the first sentence. Answers are kept.
    pub fn reset_to_start(&mut self, now_ms: u64) {
        self.normalizer.reset();
        self.gate.dismiss();
        self.reveal.jump_to(0);
        self.prompt_shown = false;
        self.pending_redraw = true;
        debug!("session: reset to start at_ms={}", now_ms);
    }

    /// Review mode shows the whole passage and never suspends. Leaving it
    /// away from the first sentence starts the reading over.
    pub fn set_review_mode(&mut self, enabled: bool, now_ms: u64) {
        if self.review_mode == enabled {
            return;
        }

        self.review_mode = enabled;
        self.pending_redraw = true;
        if enabled {
            self.gate.dismiss();
            self.prompt_shown = false;
        } else if self.reveal.state().current_position > 0 {
            self.reset_to_start(now_ms);
        }
        debug!("session: review_mode={} at_ms={}", enabled, now_ms);
    }

    pub fn export_resume_state(&self) -> ResumeState {
        ResumeState {
            position: self.reveal.state().current_position,
        }
    }

    /// Jumps to a saved position. The position is clamped to the passage and
    /// to the first unanswered question, which then blocks again. Returns the
    /// position actually applied.
    pub fn import_resume_state(&mut self, resume: ResumeState, now_ms: u64) -> usize {
        let mut target = resume.position;
        if !self.review_mode
            && let Some(question) = self.gate.first_unanswered(&self.ledger)
        {
            target = target.min(question.sentence_number - 1);
        }

        self.normalizer.reset();
        self.gate.dismiss();
        self.prompt_shown = false;
        let applied = self.reveal.jump_to(target);
        if !self.review_mode {
            let _ = self.gate.on_advance(applied, &self.ledger, now_ms);
        }
        self.pending_redraw = true;

        if applied != resume.position {
            debug!(
                "session: resume clamped requested={} applied={}",
                resume.position, applied
            );
        }
        applied
    }
}
