// src/grading/engine.rs
//
// Per-question scoring.

use std::sync::Arc;

use async_trait::async_trait;

use crate::grading::error::GradingError;
use crate::models::question::{Question, QuestionKind, split_tokens};

/// Scores free-text answers against a mark scheme.
#[async_trait]
pub trait TextGrader: Send + Sync {
    /// Returns the raw score for `answer`. The engine enforces `0..=max_marks`.
    async fn mark(&self, answer: &str, answer_key: &str, max_marks: i32)
        -> Result<i64, GradingError>;
}

/// Outcome of grading one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub awarded: i32,
    pub is_correct: bool,
}

impl Score {
    fn new(awarded: i32, max: i32) -> Self {
        Self {
            awarded,
            is_correct: awarded == max,
        }
    }
}

/// Grades a single question according to its type.
#[derive(Clone)]
pub struct GradingEngine {
    text_grader: Arc<dyn TextGrader>,
}

impl GradingEngine {
    pub fn new(text_grader: Arc<dyn TextGrader>) -> Self {
        Self { text_grader }
    }

    pub async fn grade(&self, question: &Question, submitted: &str) -> Result<Score, GradingError> {
        let max = question.marks;

        let awarded = match question.kind() {
            QuestionKind::MultipleChoice => {
                let key = question.answer_key.as_text();
                if submitted.trim().to_lowercase() == key.trim().to_lowercase() {
                    max
                } else {
                    0
                }
            }
            QuestionKind::MultipleSelect => multi_select_score(question, submitted),
            QuestionKind::FreeText => {
                if submitted.trim().is_empty() {
                    0
                } else {
                    let raw = self
                        .text_grader
                        .mark(submitted, &question.answer_key.as_text(), max)
                        .await?;
                    if !(0..=i64::from(max)).contains(&raw) {
                        return Err(GradingError::OutOfRange { score: raw, max });
                    }
                    raw as i32
                }
            }
        };

        Ok(Score::new(awarded, max))
    }
}

/// One mark per picked option in the key, minus one per picked option not in it,
/// clamped to `0..=marks`.
fn multi_select_score(question: &Question, submitted: &str) -> i32 {
    let key = question.answer_key.tokens();
    let picked = split_tokens(submitted);

    let hits = picked.iter().filter(|t| key.contains(*t)).count() as i64;
    let misses = picked.len() as i64 - hits;

    (hits - misses).clamp(0, i64::from(question.marks)) as i32
}
