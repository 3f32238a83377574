impl<IN> ReadingSession<IN>
where
    IN: InputProvider,
{
    pub fn current_view(&self) -> ReadingView<'_> {
        let sentences = self.passage.sentences();
        let state = self.reveal.state();

        let revealed = if sentences.is_empty() {
            &sentences[..0]
        } else if self.review_mode {
            sentences
        } else {
            let last = state
                .current_position
                .max(state.fading_out.unwrap_or(0))
                .min(sentences.len() - 1);
            &sentences[..=last]
        };

        let active_question = self.gate.active().and_then(|active| {
            self.gate.active_question().map(|question| PromptView {
                question,
                visible_at_ms: active.prompt_visible_at_ms,
                animation: AnimationSpec::new(
                    AnimationKind::Prompt,
                    active.prompt_visible_at_ms,
                    PROMPT_FADE_MS,
                ),
            })
        });

        ReadingView {
            title: self.passage.title(),
            revealed,
            current_position: state.current_position,
            fading_out: state.fading_out,
            direction: state.direction,
            active_question,
            entrance: self.reveal.entrance(),
            exit: self.reveal.exit(),
            sentence_count: sentences.len(),
            review_mode: self.review_mode,
            finished: !sentences.is_empty() && self.is_session_complete(),
        }
    }

    /// Case-insensitive search over the sentences the reader can see.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let sentences = self.passage.sentences();
        let visible = if self.review_mode || sentences.is_empty() {
            sentences.len()
        } else {
            self.reveal.state().current_position + 1
        };

        sentences[..visible]
            .iter()
            .enumerate()
            .filter(|(_, sentence)| sentence.text.to_lowercase().contains(&needle))
            .map(|(position, sentence)| SearchHit {
                position,
                excerpt: excerpt_compact(&sentence.text),
            })
            .collect()
    }

    pub fn passage(&self) -> &Passage {
        &self.passage
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn reveal_state(&self) -> RevealState {
        self.reveal.state()
    }

    pub fn gate_state(&self) -> GateState<'_> {
        self.gate.state()
    }

    pub fn questions(&self) -> &QuestionSet {
        self.gate.questions()
    }

    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    pub fn post_reading(&self) -> Option<&PostReadingTask> {
        self.gate.questions().post_reading()
    }

    pub const fn review_mode(&self) -> bool {
        self.review_mode
    }

    pub const fn input_faults(&self) -> u32 {
        self.input_faults
    }
}
