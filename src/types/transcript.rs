//! Transcript types
//!
//! In-memory question/answer record and the history rendering built from it.

/// Ordered record of every answered question for this process
///
/// Questions and answers are parallel lists kept index-aligned; entries are
/// only ever appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    questions: Vec<String>,
    answers: Vec<String>,
}

/// Styling class of a history segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// "Question N: " label
    Label,
    /// Formatted answer text
    Answer,
    /// Blank line between entries
    Separator,
}

/// One styled run of text in the history display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySegment {
    pub kind: SegmentKind,
    pub text: String,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// (question, answer) pairs in recording order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.questions
            .iter()
            .zip(self.answers.iter())
            .map(|(q, a)| (q.as_str(), a.as_str()))
    }

    /// Append one exchange; both lists grow together
    pub(crate) fn push(&mut self, question: String, answer: String) {
        self.questions.push(question);
        self.answers.push(answer);
    }

    /// Rebuild the full history display from scratch
    pub fn render_history(&self) -> Vec<HistorySegment> {
        let mut segments = Vec::with_capacity(self.len() * 3);
        for (i, (_question, answer)) in self.entries().enumerate() {
            segments.push(HistorySegment {
                kind: SegmentKind::Label,
                text: format!("Question {}: ", i + 1),
            });
            segments.push(HistorySegment {
                kind: SegmentKind::Answer,
                text: format!("{answer}\n"),
            });
            segments.push(HistorySegment {
                kind: SegmentKind::Separator,
                text: "\n".to_string(),
            });
        }
        segments
    }

    /// Plain text of the history display
    pub fn history_text(&self) -> String {
        self.render_history()
            .into_iter()
            .map(|segment| segment.text)
            .collect()
    }
}
