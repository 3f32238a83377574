use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::{info, warn};
use serde::{Serialize, de::DeserializeOwned};
use unfold_core::{
    content::Passage,
    grading::{GradeRequest, GradeResponse, MAX_RATING, RatingBand, RetryCheck, ScoreCard},
    ledger::AnswerSnapshot,
    questions::QuestionSet,
    store::{KeyValueStore, StoreKey, StoreSlot},
};

use super::file_store::{FileStore, file_safe};

/// Files traded with the grading service once a session is finished.
///
/// Requests land in `outbox`. `results` is the service's answer to the grade
/// request. `revisions` maps question keys to edited answers, each of which
/// becomes a try-again request; `retry_results` holds the re-grades that came
/// back for them.
///
/// A revision whose re-grade came back replaces the stored answer, so
/// [`exchange`] returns those edits for the caller to apply.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct GradingFiles<'a> {
    pub(super) outbox: Option<&'a Path>,
    pub(super) results: Option<&'a Path>,
    pub(super) revisions: Option<&'a Path>,
    pub(super) retry_results: Option<&'a Path>,
}

pub(super) fn exchange(
    files: GradingFiles<'_>,
    passage: &Passage,
    questions: &QuestionSet,
    snapshot: &AnswerSnapshot,
    store: Option<&mut FileStore>,
    out: &mut impl Write,
) -> anyhow::Result<BTreeMap<String, String>> {
    if let Some(outbox) = files.outbox {
        let summary = questions
            .post_reading()
            .and_then(|task| snapshot.get(&task.key))
            .unwrap_or_default();
        let request = GradeRequest::new(passage, questions, snapshot.clone(), summary);
        let path = write_json(outbox, "grade-request.json", &request)?;
        writeln!(out, "grade request written to {}", path.display())?;
    }

    let Some(results_path) = files.results else {
        return Ok(BTreeMap::new());
    };
    let json = read(results_path, "grading results")?;
    let mut response = GradeResponse::from_json(&json).context("failed to decode grading results")?;
    let revisions: BTreeMap<String, String> = match files.revisions {
        Some(path) => read_json(path, "revisions")?,
        None => BTreeMap::new(),
    };

    if let Some(outbox) = files.outbox {
        for (key, edited) in &revisions {
            let original = snapshot.get(key).unwrap_or_default();
            let Some(request) = response.try_again(key, questions, original, edited) else {
                warn!("no try-again request for {key}: not graded or empty edit");
                continue;
            };
            let name = format!("try-again.{}.json", file_safe(key));
            let path = write_json(outbox, &name, &request)?;
            writeln!(out, "try-again request for {key} written to {}", path.display())?;
        }
    }

    let mut accepted = BTreeMap::new();
    if let Some(path) = files.retry_results {
        let retries: BTreeMap<String, RetryCheck> = read_json(path, "retry results")?;
        for (key, retry) in retries {
            if !response.apply_retry(&key, retry) {
                warn!("retry result for ungraded question {key} ignored");
                continue;
            }
            if let Some(edited) = revisions.get(&key) {
                accepted.insert(key, edited.clone());
            }
        }
    }

    if let Some(store) = store {
        save(store, passage.id(), StoreSlot::Results, &response)?;
        info!("saved {} graded answer(s)", response.checks.len());
    }

    print_score_card(out, &response.score_card())?;
    Ok(accepted)
}

fn print_score_card(out: &mut impl Write, card: &ScoreCard) -> anyhow::Result<()> {
    writeln!(out, "score {}/{} ({}%)", card.total, card.max, card.percentage)?;
    for answer in &card.answers {
        let band = match answer.band {
            RatingBand::Strong => "strong",
            RatingBand::Partial => "partial",
            RatingBand::Weak => "weak",
        };
        writeln!(
            out,
            "  {}: {}/{MAX_RATING} {band}",
            answer.key, answer.rating
        )?;
    }
    Ok(())
}

fn save(
    store: &mut FileStore,
    passage_id: &str,
    slot: StoreSlot,
    value: &impl Serialize,
) -> anyhow::Result<()> {
    let key = StoreKey::new(passage_id, slot);
    let json = serde_json::to_string(value)?;
    store
        .save(&key, &json)
        .with_context(|| format!("failed to save {key}"))
}

fn read(path: &Path, what: &str) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {what} {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let json = read(path, what)?;
    serde_json::from_str(&json).with_context(|| format!("failed to decode {what}"))
}

fn write_json(dir: &Path, name: &str, value: &impl Serialize) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create outbox {}", dir.display()))?;
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use unfold_core::{
        content::sample::{SAMPLE_QUESTIONS_JSON, sample_passage},
        ledger::AnswerLedger,
        questions::QuestionPayload,
    };

    use super::*;

    const RESULTS: &str = r#"{
        "question1": {"question": "Why?", "answer-rating": 4, "explanation": "Say who was missing."},
        "question2": {"question": "Duty?", "answer-rating": 9, "explanation": "Clear."}
    }"#;

    fn setup() -> (Passage, QuestionSet, AnswerSnapshot) {
        let passage = sample_passage();
        let questions = QuestionPayload::from_json(SAMPLE_QUESTIONS_JSON)
            .expect("sample payload")
            .into_question_set(passage.sentence_count());
        let answers = AnswerLedger::seeded([
            ("question1", "Oil ran out."),
            ("question2", "They were proud."),
            ("question3", "Keepers lived far from villages."),
        ])
        .snapshot();
        (passage, questions, answers)
    }

    #[test]
    fn finish_without_results_only_writes_the_grade_request() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outbox = dir.path().join("outbox");
        let (passage, questions, answers) = setup();
        let files = GradingFiles {
            outbox: Some(&outbox),
            ..GradingFiles::default()
        };

        let mut out = Vec::new();
        exchange(files, &passage, &questions, &answers, None, &mut out).expect("exchange");

        let request: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(outbox.join("grade-request.json")).expect("request written"),
        )
        .expect("request is json");
        assert_eq!(request["correctedSummary"], "Keepers lived far from villages.");
        assert_eq!(request["answers"]["question1"], "Oil ran out.");
        assert!(String::from_utf8(out).expect("utf-8").starts_with("grade request written"));
    }

    #[test]
    fn results_and_retries_are_merged_saved_and_scored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outbox = dir.path().join("outbox");
        let results = dir.path().join("results.json");
        let revisions = dir.path().join("revisions.json");
        let retries = dir.path().join("retries.json");
        fs::write(&results, RESULTS).expect("write results");
        fs::write(&revisions, r#"{"question1": "No neighbours to ask."}"#).expect("write revisions");
        fs::write(
            &retries,
            r#"{"question1": {"answer-rating": 10, "explanation": "Much better."}}"#,
        )
        .expect("write retries");

        let (passage, questions, answers) = setup();
        let mut store = FileStore::open(&dir.path().join("store")).expect("open store");
        let files = GradingFiles {
            outbox: Some(&outbox),
            results: Some(&results),
            revisions: Some(&revisions),
            retry_results: Some(&retries),
        };

        let mut out = Vec::new();
        let accepted = exchange(files, &passage, &questions, &answers, Some(&mut store), &mut out)
            .expect("exchange");

        let try_again: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(outbox.join("try-again.question1.json")).expect("request written"),
        )
        .expect("request is json");
        assert_eq!(try_again["originalAnswer"], "Oil ran out.");
        assert_eq!(try_again["editedAnswer"], "No neighbours to ask.");
        assert_eq!(try_again["originalRating"], 4);

        let saved = store
            .load(&StoreKey::new(passage.id(), StoreSlot::Results))
            .expect("load")
            .expect("results saved");
        let saved = GradeResponse::from_json(&saved).expect("saved results decode");
        assert_eq!(saved.checks["question1"].rating, 10);
        assert_eq!(saved.checks["question1"].question, "Why?");

        assert_eq!(
            accepted.get("question1").map(String::as_str),
            Some("No neighbours to ask.")
        );
        assert_eq!(accepted.len(), 1);

        let printed = String::from_utf8(out).expect("utf-8");
        assert!(printed.contains("score 19/20 (95%)"));
        assert!(printed.contains("  question1: 10/10 strong"));
    }

    #[test]
    fn revision_for_an_ungraded_question_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outbox = dir.path().join("outbox");
        let results = dir.path().join("results.json");
        let revisions = dir.path().join("revisions.json");
        fs::write(&results, RESULTS).expect("write results");
        fs::write(&revisions, r#"{"question3": "A new summary."}"#).expect("write revisions");

        let (passage, questions, answers) = setup();
        let files = GradingFiles {
            outbox: Some(&outbox),
            results: Some(&results),
            revisions: Some(&revisions),
            retry_results: None,
        };

        let mut out = Vec::new();
        let accepted =
            exchange(files, &passage, &questions, &answers, None, &mut out).expect("exchange");

        assert!(accepted.is_empty());
        assert!(!outbox.join("try-again.question3.json").exists());
        assert!(String::from_utf8(out).expect("utf-8").contains("score 13/20 (65%)"));
    }
}
