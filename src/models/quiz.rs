// src/models/quiz.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One question's scored outcome within a quiz.
/// Stored in the 'completed_quiz_questions' table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct GradedAnswer {
    pub question_text: String,
    #[serde(rename = "correct_answer")]
    pub answer_key: String,
    pub submitted_answer: String,
    /// Marks awarded.
    pub marks: i32,
    /// Maximum marks available.
    pub total_marks: i32,
    pub is_correct: bool,
}

/// A finalized, persisted quiz attempt.
#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    pub topic: String,
    pub difficulty: Option<String>,
    pub number_of_questions: i32,
    pub grade: String,
    pub percentage: f64,
    pub created_at: DateTime<Utc>,
    /// Graded answers in the order the questions were submitted.
    pub questions: Vec<GradedAnswer>,
}

/// Represents the 'completed_quizzes' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct CompletedQuizRow {
    pub id: i64,
    pub user_id: i64,
    pub topic: String,
    pub difficulty: Option<String>,
    pub number_of_questions: i32,
    pub grade: String,
    pub percentage: f64,
    pub created_at: DateTime<Utc>,
}

impl CompletedQuizRow {
    pub fn into_result(self, questions: Vec<GradedAnswer>) -> QuizResult {
        QuizResult {
            id: self.id,
            user_id: self.user_id,
            topic: self.topic,
            difficulty: self.difficulty,
            number_of_questions: self.number_of_questions,
            grade: self.grade,
            percentage: self.percentage,
            created_at: self.created_at,
            questions,
        }
    }
}

/// A graded answer joined with the quiz it belongs to.
#[derive(Debug, FromRow)]
pub struct GradedAnswerRow {
    pub quiz_id: i64,
    #[sqlx(flatten)]
    pub answer: GradedAnswer,
}

/// A submitted answer: plain text, or a list of picked options.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Text(String),
    Choices(Vec<String>),
}

impl SubmittedAnswer {
    /// Comma-joined text form, as multi-select answers are graded and stored.
    pub fn into_text(self) -> String {
        match self {
            SubmittedAnswer::Text(s) => s,
            SubmittedAnswer::Choices(items) => items.join(","),
        }
    }
}

/// DTO for submitting a quiz.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub topic: Option<String>,
    pub difficulty: Option<String>,

    /// Key: question id (as a string). Value: the submitted answer.
    #[serde(default)]
    pub submitted_answers: HashMap<String, SubmittedAnswer>,
}

/// Response body for a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub message: &'static str,
    pub quiz_id: i64,
    pub grade: String,
    pub percentage: f64,
    pub submitted_questions: Vec<GradedAnswer>,
    pub created_at: DateTime<Utc>,
}

impl From<QuizResult> for SubmitQuizResponse {
    fn from(result: QuizResult) -> Self {
        Self {
            message: "Quiz submitted successfully.",
            quiz_id: result.id,
            grade: result.grade,
            percentage: result.percentage,
            submitted_questions: result.questions,
            created_at: result.created_at,
        }
    }
}

/// Quiz summary without the per-question breakdown, for admin reports.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub topic: String,
    pub number_of_questions: i32,
    pub difficulty: Option<String>,
    pub grade: String,
    pub percentage: f64,
    pub created_at: DateTime<Utc>,
}

impl From<CompletedQuizRow> for QuizSummary {
    fn from(row: CompletedQuizRow) -> Self {
        Self {
            topic: row.topic,
            number_of_questions: row.number_of_questions,
            difficulty: row.difficulty,
            grade: row.grade,
            percentage: row.percentage,
            created_at: row.created_at,
        }
    }
}
