//! Request and response shapes exchanged with the grading service, plus the
//! score summary shown once results come back. No I/O happens here.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use serde::{Deserialize, Serialize};

use crate::{content::Passage, ledger::AnswerSnapshot, questions::QuestionSet};

pub const MAX_RATING: u8 = 10;
pub const DEFAULT_GRADE_LEVEL: u8 = 10;

/// Question as the grading service expects it, keyed like the payload.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GradedQuestion {
    WhileReading {
        #[serde(rename = "sentence-number")]
        sentence_number: usize,
        question: String,
    },
    PostReading {
        summary: String,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    pub passage_title: String,
    pub passage_content: String,
    pub questions: BTreeMap<String, GradedQuestion>,
    pub answers: AnswerSnapshot,
    pub corrected_summary: String,
    pub grade: u8,
}

impl GradeRequest {
    pub fn new(
        passage: &Passage,
        questions: &QuestionSet,
        answers: AnswerSnapshot,
        corrected_summary: impl Into<String>,
    ) -> Self {
        let mut graded = BTreeMap::new();
        for question in questions.anchored() {
            graded.insert(
                question.key.clone(),
                GradedQuestion::WhileReading {
                    sentence_number: question.sentence_number,
                    question: question.prompt.clone(),
                },
            );
        }
        if let Some(task) = questions.post_reading() {
            graded.insert(
                task.key.clone(),
                GradedQuestion::PostReading {
                    summary: task.summary_text.clone(),
                },
            );
        }

        Self {
            passage_title: String::from(passage.title()),
            passage_content: passage.text(),
            questions: graded,
            answers,
            corrected_summary: corrected_summary.into(),
            grade: DEFAULT_GRADE_LEVEL,
        }
    }

    pub fn with_grade(mut self, grade: u8) -> Self {
        self.grade = grade;
        self
    }
}

/// One graded answer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AnswerCheck {
    pub question: String,
    #[serde(rename = "answer-rating")]
    pub rating: u8,
    pub explanation: String,
}

/// Grading service response: question key to check.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeResponse {
    pub checks: BTreeMap<String, AnswerCheck>,
}

impl GradeResponse {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn score_card(&self) -> ScoreCard {
        ScoreCard::from_checks(self.checks.iter().map(|(key, check)| (key.as_str(), check)))
    }

    /// Builds the re-grade request for one edited answer. `None` when the
    /// key was never graded, carries no feedback, or the edit is blank.
    pub fn try_again(
        &self,
        key: &str,
        questions: &QuestionSet,
        original_answer: &str,
        edited_answer: &str,
    ) -> Option<TryAgainRequest> {
        let check = self.checks.get(key)?;
        if edited_answer.trim().is_empty() || check.explanation.trim().is_empty() {
            return None;
        }

        let task = questions.post_reading().filter(|task| task.key == key);
        Some(TryAgainRequest {
            question: check.question.clone(),
            question_type: if task.is_some() {
                QuestionKind::PostReading
            } else {
                QuestionKind::WhileReading
            },
            original_answer: String::from(original_answer),
            edited_answer: String::from(edited_answer),
            original_rating: check.rating,
            original_feedback: check.explanation.clone(),
            grade: DEFAULT_GRADE_LEVEL,
            original_summary: task.map(|task| task.summary_text.clone()),
            errors: task
                .map(|task| task.flagged_phrases.iter().cloned().collect())
                .unwrap_or_default(),
        })
    }

    /// Swaps in a re-graded rating and explanation. The question text is
    /// kept. Returns `false` when the key was never graded.
    pub fn apply_retry(&mut self, key: &str, retry: RetryCheck) -> bool {
        let Some(check) = self.checks.get_mut(key) else {
            return false;
        };
        check.rating = retry.rating;
        check.explanation = retry.explanation;
        true
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    WhileReading,
    PostReading,
}

/// Asks the grading service whether an edited answer applied its feedback.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TryAgainRequest {
    pub question: String,
    pub question_type: QuestionKind,
    pub original_answer: String,
    pub edited_answer: String,
    pub original_rating: u8,
    pub original_feedback: String,
    pub grade: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl TryAgainRequest {
    pub fn with_grade(mut self, grade: u8) -> Self {
        self.grade = grade;
        self
    }
}

/// Re-grade returned for one edited answer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RetryCheck {
    #[serde(rename = "answer-rating")]
    pub rating: u8,
    pub explanation: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RatingBand {
    Strong,
    Partial,
    Weak,
}

impl RatingBand {
    pub const fn for_rating(rating: u8) -> Self {
        if rating >= 8 {
            Self::Strong
        } else if rating >= 5 {
            Self::Partial
        } else {
            Self::Weak
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScoredAnswer {
    pub key: String,
    pub rating: u8,
    pub band: RatingBand,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScoreCard {
    pub total: u32,
    pub max: u32,
    /// Total over max, rounded to the nearest whole percent.
    pub percentage: u8,
    pub answers: Vec<ScoredAnswer>,
}

impl ScoreCard {
    pub fn from_checks<'a, I>(checks: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a AnswerCheck)>,
    {
        let mut card = Self::default();
        for (key, check) in checks {
            let rating = check.rating.min(MAX_RATING);
            card.total += rating as u32;
            card.max += MAX_RATING as u32;
            card.answers.push(ScoredAnswer {
                key: String::from(key),
                rating,
                band: RatingBand::for_rating(rating),
            });
        }

        if card.max > 0 {
            let rounded = (card.total * 200 + card.max) / (card.max * 2);
            card.percentage = rounded.min(100) as u8;
        }
        card
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        content::sample::{SAMPLE_QUESTIONS_JSON, sample_passage},
        ledger::AnswerLedger,
        questions::QuestionPayload,
    };

    #[test]
    fn request_uses_service_field_names() {
        let passage = sample_passage();
        let questions = QuestionPayload::from_json(SAMPLE_QUESTIONS_JSON)
            .expect("sample payload")
            .into_question_set(passage.sentence_count());
        let answers = AnswerLedger::seeded([("question1", "No one to borrow from.")]).snapshot();

        let request = GradeRequest::new(&passage, &questions, answers, "Fixed summary.").with_grade(7);
        let json = serde_json::to_value(&request).expect("serialise");

        assert_eq!(json["passageTitle"], "The Lighthouse Keepers");
        assert_eq!(json["correctedSummary"], "Fixed summary.");
        assert_eq!(json["grade"], 7);
        assert_eq!(json["answers"]["question1"], "No one to borrow from.");
        assert_eq!(json["questions"]["question1"]["type"], "while-reading");
        assert_eq!(json["questions"]["question1"]["sentence-number"], 4);
        assert_eq!(json["questions"]["question3"]["type"], "post-reading");
        assert!(
            json["passageContent"]
                .as_str()
                .is_some_and(|text| text.contains("\n\n"))
        );
    }

    #[test]
    fn response_decodes_answer_rating() {
        let response = GradeResponse::from_json(
            r#"{"question1": {"question": "Why?", "answer-rating": 9, "explanation": "Good."}}"#,
        )
        .expect("response decodes");

        assert_eq!(response.checks["question1"].rating, 9);
    }

    #[test]
    fn score_card_rounds_to_nearest_percent() {
        let response = GradeResponse::from_json(
            r#"{
                "a": {"question": "A?", "answer-rating": 8, "explanation": ""},
                "b": {"question": "B?", "answer-rating": 5, "explanation": ""},
                "c": {"question": "C?", "answer-rating": 4, "explanation": ""}
            }"#,
        )
        .expect("response decodes");

        let card = response.score_card();
        assert_eq!((card.total, card.max), (17, 30));
        // 56.67 rounds up
        assert_eq!(card.percentage, 57);
        let bands: Vec<RatingBand> = card.answers.iter().map(|a| a.band).collect();
        assert_eq!(
            bands,
            [RatingBand::Strong, RatingBand::Partial, RatingBand::Weak]
        );
    }

    fn sample_questions() -> QuestionSet {
        QuestionPayload::from_json(SAMPLE_QUESTIONS_JSON)
            .expect("sample payload")
            .into_question_set(sample_passage().sentence_count())
    }

    fn graded() -> GradeResponse {
        GradeResponse::from_json(
            r#"{
                "question1": {"question": "Why?", "answer-rating": 4, "explanation": "Say who was missing."},
                "question3": {"question": "Fix the summary.", "answer-rating": 6, "explanation": "Two errors remain."}
            }"#,
        )
        .expect("response decodes")
    }

    #[test]
    fn try_again_request_carries_the_original_check() {
        let request = graded()
            .try_again("question1", &sample_questions(), "Oil ran out.", "No neighbours to ask.")
            .expect("graded key")
            .with_grade(6);
        let json = serde_json::to_value(&request).expect("serialise");

        assert_eq!(json["questionType"], "while-reading");
        assert_eq!(json["originalAnswer"], "Oil ran out.");
        assert_eq!(json["editedAnswer"], "No neighbours to ask.");
        assert_eq!(json["originalRating"], 4);
        assert_eq!(json["originalFeedback"], "Say who was missing.");
        assert_eq!(json["grade"], 6);
        assert!(json.get("originalSummary").is_none());
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn try_again_on_the_summary_sends_its_errors() {
        let questions = sample_questions();
        let request = graded()
            .try_again("question3", &questions, "old", "new summary")
            .expect("graded key");

        assert_eq!(request.question_type, QuestionKind::PostReading);
        let task = questions.post_reading().expect("sample has a summary task");
        assert_eq!(request.original_summary.as_deref(), Some(task.summary_text.as_str()));
        assert_eq!(request.errors.len(), task.flagged_phrases.len());
    }

    #[test]
    fn try_again_needs_a_graded_key_and_an_edit() {
        let response = graded();
        let questions = sample_questions();

        assert!(response.try_again("question2", &questions, "a", "b").is_none());
        assert!(response.try_again("question1", &questions, "a", "   ").is_none());
    }

    #[test]
    fn retry_replaces_one_check_and_rescores() {
        let mut response = graded();
        assert_eq!(response.score_card().total, 10);

        let retry: RetryCheck =
            serde_json::from_str(r#"{"answer-rating": 10, "explanation": "Much better."}"#)
                .expect("retry decodes");
        assert!(response.apply_retry("question1", retry.clone()));
        assert!(!response.apply_retry("missing", retry));

        let check = &response.checks["question1"];
        assert_eq!(check.question, "Why?");
        assert_eq!(check.rating, 10);
        assert_eq!(check.explanation, "Much better.");
        assert_eq!(response.score_card().total, 16);
        assert_eq!(response.checks.len(), 2);
    }

    #[test]
    fn out_of_scale_ratings_are_capped() {
        let check = AnswerCheck {
            question: String::from("?"),
            rating: 14,
            explanation: String::new(),
        };
        let card = ScoreCard::from_checks([("k", &check)]);
        assert_eq!(card.total, 10);
        assert_eq!(card.percentage, 100);
        assert_eq!(ScoreCard::from_checks([]).percentage, 0);
    }
}
