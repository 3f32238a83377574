impl<IN> ReadingSession<IN>
where
    IN: InputProvider,
{
    pub fn new(
        passage: Passage,
        questions: QuestionSet,
        seed_answers: AnswerLedger,
        input: IN,
        config: SessionConfig,
    ) -> Self {
        let reveal = RevealMachine::new(
            passage.sentences(),
            config.pacing,
            config.transition_lock_ms,
        );
        debug!(
            "session: start passage={} sentences={} questions={} seeded_answers={}",
            passage.id(),
            passage.sentence_count(),
            questions.anchored_len(),
            seed_answers.len()
        );

        Self {
            passage,
            input,
            config,
            normalizer: GestureNormalizer::new(config.gesture),
            reveal,
            gate: QuestionGate::new(questions, config.question_delay_ms),
            ledger: seed_answers,
            review_mode: false,
            pending_redraw: true,
            prompt_shown: false,
            input_faults: 0,
        }
    }

    /// Feeds one raw event and applies every intent it completes.
    ///
    /// A lone wheel click is only known to be complete once the continuous
    /// gap has passed, so it stays pending until a later event or a
    /// [`tick`](Self::tick) at or after that point.
    pub fn handle_input(&mut self, raw: RawInput) {
        self.normalizer.push(raw);
        self.drain_intents(raw.at_ms);
    }

    /// Stores an answer and, when it belongs to the blocking question, opens
    /// the gate in the same step.
    pub fn submit_answer(&mut self, key: &str, text: &str) -> Result<(), SubmitError> {
        if text.trim().is_empty() {
            return Err(SubmitError::Empty);
        }
        if !self.gate.questions().contains_key(key) {
            warn!("session: answer for unknown question key={}", key);
            return Err(SubmitError::UnknownQuestion);
        }

        self.ledger.upsert(key, text);
        if self.gate.release(key) {
            self.prompt_shown = false;
            self.pending_redraw = true;
        }
        debug!("session: answer stored key={}", key);
        Ok(())
    }

    fn process_inputs(&mut self) {
        loop {
            match self.input.poll_event() {
                Ok(Some(event)) => self.handle_input(event),
                Ok(None) => break,
                Err(_) => {
                    self.input_faults = self.input_faults.saturating_add(1);
                    warn!("session: input provider fault count={}", self.input_faults);
                    break;
                }
            }
        }
    }

    fn drain_intents(&mut self, now_ms: u64) {
        while let Some(intent) = self.normalizer.poll(now_ms) {
            let _ = self.apply_intent(intent);
        }
    }

    fn apply_intent(&mut self, intent: NormalizedIntent) -> Result<Transition, Rejection> {
        let at_ms = intent.at_ms;
        let result = match intent.intent {
            Intent::Advance => {
                let suspended = self.gate.is_suspended();
                self.reveal.advance(suspended, at_ms)
            }
            Intent::Retreat => self.reveal.retreat(at_ms),
        };

        match result {
            Ok(transition) => {
                match transition.direction {
                    Direction::Advance => {
                        if !self.review_mode
                            && self.gate.on_advance(transition.to, &self.ledger, at_ms)
                        {
                            self.prompt_shown = false;
                        }
                    }
                    Direction::Retreat => {
                        if self.gate.dismiss().is_some() {
                            self.prompt_shown = false;
                        }
                    }
                }
                self.pending_redraw = true;
            }
            Err(rejection) => {
                debug!(
                    "session: {:?} rejected {:?} at_ms={}",
                    intent.intent, rejection, at_ms
                );
            }
        }

        result
    }
}
