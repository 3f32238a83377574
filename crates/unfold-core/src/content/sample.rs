use super::Passage;

pub const SAMPLE_PASSAGE_ID: &str = "lighthouse-keepers";
pub const SAMPLE_PASSAGE_TITLE: &str = "The Lighthouse Keepers";

/// Built-in passage used until a passage file is supplied. Twelve sentences in
/// three paragraphs.
pub const SAMPLE_PASSAGE_TEXT: &str = "For most of the nineteenth century, lighthouse keepers \
lived at the edge of the map. Their towers stood on bare rock, often miles from the nearest \
village. Supplies came by boat when the weather allowed, which in winter was rarely. A keeper \
who ran out of lamp oil had no one to borrow from.

The lamp itself demanded constant attention. Wicks had to be trimmed every few hours, or the \
flame would smoke and blacken the lens. A dirty lens could cut the beam's reach by half, and a \
ship that saw the light too late might already be on the rocks. Keepers therefore cleaned the \
glass each morning, long before any passing captain could thank them.

When electric lamps arrived, the work changed almost overnight. Machines that never tired \
replaced the careful hands of the keepers. Within a few decades most towers were automated and \
their cottages stood empty. Yet many coastal towns still tell stories about the families who \
kept the lights burning.";

/// Question payload for [`SAMPLE_PASSAGE_TEXT`] in the question service format.
pub const SAMPLE_QUESTIONS_JSON: &str = r#"{
  "question1": {
    "type": "while-reading",
    "sentence-number": 4,
    "question": "Why would running out of lamp oil be such a serious problem for a keeper?"
  },
  "question2": {
    "type": "while-reading",
    "sentence-number": 8,
    "question": "What does the daily cleaning tell you about how keepers saw their duty?"
  },
  "question3": {
    "type": "post-reading",
    "summary": "Lighthouse keepers lived close to busy villages and rarely lacked supplies. Their lamps needed constant care because a dirty lens weakened the beam. Electric lamps made keepers more important than ever.",
    "errors": {
      "error1": "lived close to busy villages and rarely lacked supplies",
      "error2": "Electric lamps made keepers more important than ever"
    }
  }
}"#;

pub fn sample_passage() -> Passage {
    Passage::new(SAMPLE_PASSAGE_ID, SAMPLE_PASSAGE_TITLE, SAMPLE_PASSAGE_TEXT)
}
