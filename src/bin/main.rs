use std::{
    cell::Cell,
    fs,
    io::{self, Read, Write},
    iter::Peekable,
    path::{Path, PathBuf},
    rc::Rc,
    vec,
};

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use unfold_core::{
    app::{ReadingSession, SessionConfig, TickResult},
    content::{
        Passage,
        sample::{SAMPLE_QUESTIONS_JSON, sample_passage},
    },
    ledger::{AnswerLedger, AnswerSnapshot},
    questions::{QuestionPayload, QuestionSet},
    store::{KeyValueStore, ResumeState, StoreKey, StoreSlot},
    text_policy::progress_label,
};

use file_store::FileStore;
use grading_flow::GradingFiles;
use progress_sync::{ProgressRecord, ProgressSyncState};
use script::{ScriptCommand, ScriptInput};
use terminal::TerminalRenderer;

#[path = "main/file_store.rs"]
mod file_store;
#[path = "main/grading_flow.rs"]
mod grading_flow;
#[path = "main/progress_sync.rs"]
mod progress_sync;
#[path = "main/script.rs"]
mod script;
#[path = "main/terminal.rs"]
mod terminal;

const FRAME_MS: u64 = 16;
const PROGRESS_SAVE_DEBOUNCE_MS: u64 = 500;
const SETTLE_MS: u64 = 1_500;

/// Replays a scripted reading session against a passage.
#[derive(Debug, Parser)]
#[command(name = "unfold", version, about = "Sentence-by-sentence guided reading")]
struct Cli {
    /// Passage text file (defaults to the built-in sample)
    #[arg(long)]
    passage: Option<PathBuf>,

    /// Question payload JSON
    #[arg(long)]
    questions: Option<PathBuf>,

    /// Input script (reads stdin when omitted)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Directory for saved answers and reading progress
    #[arg(long)]
    store: Option<PathBuf>,

    /// Store key for this passage (defaults to the passage file name)
    #[arg(long)]
    passage_id: Option<String>,

    /// Print every revealed sentence instead of only the current one
    #[arg(long)]
    full: bool,

    /// Directory where grading and try-again requests are written on finish
    #[arg(long)]
    outbox: Option<PathBuf>,

    /// Grading service response to score and save on finish
    #[arg(long)]
    results: Option<PathBuf>,

    /// JSON object of question key to edited answer, sent for re-grading
    #[arg(long, requires = "results")]
    revise: Option<PathBuf>,

    /// JSON object of question key to re-grade, merged into the results
    #[arg(long, requires = "results")]
    retry_results: Option<PathBuf>,

    /// Verbose mode (debug logging)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("unfold error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let passage = load_passage(&cli)?;
    let questions = load_questions(&cli, &passage)?;
    for dropped in questions.dropped() {
        warn!(
            "question {} ignored: {:?}",
            dropped.key, dropped.reason
        );
    }

    let script_text = read_script(cli.script.as_deref())?;
    let commands = script::parse_script(&script_text)?;

    let mut store = cli
        .store
        .as_deref()
        .map(FileStore::open)
        .transpose()?;
    let seed = load_answers(store.as_mut(), passage.id())?;
    let resume = load_resume(store.as_mut(), passage.id())?;

    let clock = Rc::new(Cell::new(0u64));
    let (input, actions) = ScriptInput::split(commands, Rc::clone(&clock));
    let end_ms = actions
        .iter()
        .map(ScriptCommand::at_ms)
        .chain(input.last_at_ms())
        .max()
        .unwrap_or(0)
        .saturating_add(SETTLE_MS);

    let mut session = ReadingSession::new(
        passage,
        questions,
        seed,
        input,
        SessionConfig::default(),
    );
    if let Some(resume) = resume {
        let applied = session.import_resume_state(resume, 0);
        info!("resumed at position {applied}");
    }

    let mut sync = ProgressSyncState::new(
        session.passage().id(),
        progress_record(&session),
        PROGRESS_SAVE_DEBOUNCE_MS,
    );
    let mut renderer = TerminalRenderer::new(cli.full);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let grading = GradingFiles {
        outbox: cli.outbox.as_deref(),
        results: cli.results.as_deref(),
        revisions: cli.revise.as_deref(),
        retry_results: cli.retry_results.as_deref(),
    };

    let mut actions = actions.into_iter().peekable();
    let mut finished = false;
    let mut now_ms = 0u64;
    while now_ms <= end_ms && !finished {
        let mut replay = Replay {
            session: &mut session,
            clock: &clock,
            renderer: &mut renderer,
            grading,
        };
        finished = replay.run_due_actions(&mut actions, now_ms, store.as_mut(), &mut out)?;
        if !finished {
            replay.frame(now_ms, &mut out)?;
        }

        sync.track_current(progress_record(&session), now_ms);
        sync.flush_if_due(store.as_mut(), now_ms);
        now_ms += FRAME_MS;
    }

    sync.flush_now(store.as_mut(), now_ms);
    if sync.has_pending() {
        warn!("progress could not be saved");
    }
    if !finished {
        let view = session.current_view();
        writeln!(
            out,
            "stopped at {} ({} unanswered)",
            progress_label(view.current_position, view.sentence_count),
            session
                .questions()
                .anchored()
                .filter(|question| !session.ledger().is_answered(&question.key))
                .count()
        )?;
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn load_passage(cli: &Cli) -> anyhow::Result<Passage> {
    let Some(path) = cli.passage.as_deref() else {
        let passage = sample_passage();
        return Ok(match cli.passage_id.as_deref() {
            Some(id) => {
                Passage::from_sentences(id, passage.title(), passage.sentences().to_vec())
            }
            None => passage,
        });
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read passage {}", path.display()))?;
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("passage"));
    let id = cli.passage_id.clone().unwrap_or_else(|| stem.clone());

    let passage = Passage::new(id, stem, &text);
    if passage.is_empty() {
        warn!("passage {} has no sentences", path.display());
    }
    Ok(passage)
}

fn load_questions(cli: &Cli, passage: &Passage) -> anyhow::Result<QuestionSet> {
    let json = match cli.questions.as_deref() {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read questions {}", path.display()))?,
        None if cli.passage.is_none() => String::from(SAMPLE_QUESTIONS_JSON),
        None => return Ok(QuestionSet::empty()),
    };

    let payload = QuestionPayload::from_json(&json).context("failed to decode question payload")?;
    Ok(payload.into_question_set(passage.sentence_count()))
}

fn read_script(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read script from stdin")?;
            Ok(text)
        }
    }
}

fn load_answers(store: Option<&mut FileStore>, passage_id: &str) -> anyhow::Result<AnswerLedger> {
    let Some(store) = store else {
        return Ok(AnswerLedger::new());
    };

    let key = StoreKey::new(passage_id, StoreSlot::Answers);
    let Some(json) = store
        .load(&key)
        .with_context(|| format!("failed to load {key}"))?
    else {
        return Ok(AnswerLedger::new());
    };

    let snapshot: AnswerSnapshot =
        serde_json::from_str(&json).with_context(|| format!("corrupt record {key}"))?;
    info!("loaded {} saved answers", snapshot.len());
    Ok(AnswerLedger::from(snapshot))
}

fn load_resume(
    store: Option<&mut FileStore>,
    passage_id: &str,
) -> anyhow::Result<Option<ResumeState>> {
    let Some(store) = store else {
        return Ok(None);
    };

    let key = StoreKey::new(passage_id, StoreSlot::Resume);
    let Some(json) = store
        .load(&key)
        .with_context(|| format!("failed to load {key}"))?
    else {
        return Ok(None);
    };

    match serde_json::from_str(&json) {
        Ok(resume) => Ok(Some(resume)),
        Err(err) => {
            warn!("ignoring unreadable resume record {key}: {err}");
            Ok(None)
        }
    }
}

fn progress_record(session: &ReadingSession<ScriptInput>) -> ProgressRecord {
    ProgressRecord {
        answers: session.ledger().snapshot(),
        resume: session.export_resume_state(),
    }
}

/// Borrowed driver state for one frame of the replay loop.
struct Replay<'a> {
    session: &'a mut ReadingSession<ScriptInput>,
    clock: &'a Cell<u64>,
    renderer: &'a mut TerminalRenderer,
    grading: GradingFiles<'a>,
}

impl Replay<'_> {
    /// Moves the clock to `now_ms`, applies the input that is due and prints
    /// the view when the session asks for it.
    fn frame(&mut self, now_ms: u64, out: &mut impl Write) -> anyhow::Result<()> {
        self.clock.set(now_ms);
        if self.session.tick(now_ms) == TickResult::RenderRequested {
            self.renderer.render(&self.session.current_view(), now_ms, out)?;
        }
        Ok(())
    }

    /// Applies every action due by `now_ms` in time order. Input events up to
    /// an action's own timestamp are ticked in first, so an answer lands
    /// before any later key in the same frame. Returns `true` once finished.
    fn run_due_actions(
        &mut self,
        actions: &mut Peekable<vec::IntoIter<ScriptCommand>>,
        now_ms: u64,
        mut store: Option<&mut FileStore>,
        out: &mut impl Write,
    ) -> anyhow::Result<bool> {
        while let Some(action) = actions.next_if(|action| action.at_ms() <= now_ms) {
            self.frame(action.at_ms(), out)?;
            if apply_action(self.session, action, store.as_deref_mut(), self.grading, out)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Applies a non-input script command. Returns `true` once the session has
/// been finished.
fn apply_action(
    session: &mut ReadingSession<ScriptInput>,
    action: ScriptCommand,
    mut store: Option<&mut FileStore>,
    grading: GradingFiles<'_>,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    match action {
        ScriptCommand::Input(_) | ScriptCommand::Tick(_) => Ok(false),
        ScriptCommand::Answer { at_ms, key, text } => {
            match session.submit_answer(&key, &text) {
                Ok(()) => writeln!(out, "[{at_ms:>6} ms] answered {key}")?,
                Err(err) => writeln!(out, "[{at_ms:>6} ms] answer {key} rejected: {err}")?,
            }
            Ok(false)
        }
        ScriptCommand::Finish(at_ms) => match session.finish() {
            Ok(snapshot) => {
                if let Some(store) = store.as_deref_mut() {
                    let key = StoreKey::new(session.passage().id(), StoreSlot::Answers);
                    let json = serde_json::to_string(&snapshot)?;
                    store
                        .save(&key, &json)
                        .with_context(|| format!("failed to save {key}"))?;
                }
                writeln!(
                    out,
                    "[{at_ms:>6} ms] finished with {} answer(s)",
                    snapshot.len()
                )?;
                for (key, text) in snapshot.iter() {
                    writeln!(out, "  {key}: {text}")?;
                }
                if let Some(task) = session.post_reading() {
                    writeln!(out, "summary to correct ({}):", task.key)?;
                    writeln!(out, "  {}", task.summary_text)?;
                }
                let revised = grading_flow::exchange(
                    grading,
                    session.passage(),
                    session.questions(),
                    &snapshot,
                    store,
                    out,
                )?;
                for (key, text) in revised {
                    if let Err(err) = session.submit_answer(&key, &text) {
                        warn!("revised answer for {key} not kept: {err}");
                    }
                }
                Ok(true)
            }
            Err(err) => {
                writeln!(out, "[{at_ms:>6} ms] cannot finish: {err}")?;
                Ok(false)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use unfold_core::questions::Question;

    use super::*;

    fn replay_session(
        script: &str,
    ) -> (ReadingSession<ScriptInput>, Rc<Cell<u64>>, Vec<ScriptCommand>) {
        let commands = script::parse_script(script).expect("script parses");
        let clock = Rc::new(Cell::new(0u64));
        let (input, actions) = ScriptInput::split(commands, Rc::clone(&clock));
        let session = ReadingSession::new(
            Passage::new("p", "P", "One. Two. Three. Four."),
            QuestionSet::new(4, [Question::while_reading("q1", 2, "Why?")]),
            AnswerLedger::new(),
            input,
            SessionConfig::default(),
        );
        (session, clock, actions)
    }

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "unfold",
            "--passage",
            "p.txt",
            "--store",
            "state",
            "--passage-id",
            "p1",
            "--full",
            "-v",
        ])
        .expect("cli should parse");

        assert_eq!(cli.passage_id.as_deref(), Some("p1"));
        assert!(cli.full);
        assert!(cli.verbose);
        assert!(cli.script.is_none());
    }

    #[test]
    fn grading_flags_need_results() {
        assert!(Cli::try_parse_from(["unfold", "--revise", "edits.json"]).is_err());

        let cli = Cli::try_parse_from([
            "unfold",
            "--outbox",
            "out",
            "--results",
            "graded.json",
            "--revise",
            "edits.json",
            "--retry-results",
            "regraded.json",
        ])
        .expect("cli should parse");
        assert_eq!(cli.outbox.as_deref(), Some(Path::new("out")));
        assert_eq!(cli.retry_results.as_deref(), Some(Path::new("regraded.json")));
    }

    #[test]
    fn answer_lands_before_a_later_key_in_the_same_frame() {
        let (mut session, clock, actions) = replay_session(
            "key 0 forward\nanswer 600 q1 Because.\nkey 605 forward\n",
        );
        let mut renderer = TerminalRenderer::new(false);
        let mut actions = actions.into_iter().peekable();
        let mut out = Vec::new();

        let mut replay = Replay {
            session: &mut session,
            clock: &clock,
            renderer: &mut renderer,
            grading: GradingFiles::default(),
        };
        replay.frame(0, &mut out).expect("frame");
        let finished = replay
            .run_due_actions(&mut actions, 608, None, &mut out)
            .expect("actions");
        replay.frame(608, &mut out).expect("frame");

        assert!(!finished);
        assert_eq!(session.reveal_state().current_position, 2);
        assert!(!session.gate_state().suspended);
        let printed = String::from_utf8(out).expect("utf-8");
        assert!(printed.contains("[   600 ms] answered q1"));
    }
}
