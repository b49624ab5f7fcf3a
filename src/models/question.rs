// src/models/question.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// How a question is scored, derived from its type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
    MultipleSelect,
    /// Anything not recognized as choice-based, e.g. `long_answer`.
    FreeText,
}

impl QuestionKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "multiple_choice" => QuestionKind::MultipleChoice,
            "multiple_select" | "multi_select" => QuestionKind::MultipleSelect,
            _ => QuestionKind::FreeText,
        }
    }
}

/// The expected answer: one string, or a set of options for multi-select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    Single(String),
    Multiple(Vec<String>),
}

impl AnswerKey {
    /// Text form used for display, persistence and free-text grading.
    pub fn as_text(&self) -> String {
        match self {
            AnswerKey::Single(s) => s.clone(),
            AnswerKey::Multiple(items) => items.join(", "),
        }
    }

    /// Normalized option tokens. A single string key is split on commas.
    pub fn tokens(&self) -> BTreeSet<String> {
        match self {
            AnswerKey::Single(s) => split_tokens(s),
            AnswerKey::Multiple(items) => items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// Splits a comma-joined answer into trimmed, lowercased, non-empty tokens.
pub fn split_tokens(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A question from the bank, including its answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub topic: String,
    pub difficulty: String,
    /// Raw type tag: 'multiple_choice', 'multiple_select' or a free-text tag.
    pub question_type: String,
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer_key: AnswerKey,
    /// Maximum marks; the bank may spell it as a number or a numeric string.
    #[serde(deserialize_with = "deserialize_marks")]
    pub marks: i32,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        QuestionKind::from_tag(&self.question_type)
    }
}

fn deserialize_marks<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Marks {
        Number(i32),
        Text(String),
    }

    let marks = match Marks::deserialize(deserializer)? {
        Marks::Number(n) => n,
        Marks::Text(s) => s.trim().parse().map_err(serde::de::Error::custom)?,
    };
    if marks <= 0 {
        return Err(serde::de::Error::custom("marks must be positive"));
    }
    Ok(marks)
}

/// Represents the 'questions' table in the database.
#[derive(Debug, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub topic: String,
    pub difficulty: String,
    pub question_type: String,
    pub question_text: String,
    pub options: Json<Vec<String>>,
    pub answer_key: Json<AnswerKey>,
    pub marks: i32,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            topic: row.topic,
            difficulty: row.difficulty,
            question_type: row.question_type,
            question_text: row.question_text,
            options: row.options.0,
            answer_key: row.answer_key.0,
            marks: row.marks,
        }
    }
}

/// DTO for sending a question to the client (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub topic: String,
    pub difficulty: String,
    pub question_type: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub marks: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            topic: q.topic,
            difficulty: q.difficulty,
            question_type: q.question_type,
            question_text: q.question_text,
            options: q.options,
            marks: q.marks,
        }
    }
}

/// Query parameters for listing questions.
#[derive(Debug, Deserialize)]
pub struct QuestionListParams {
    pub topic: Option<String>,
    pub difficulty: Option<String>,
}

/// Number of questions served per quiz for a difficulty level.
pub fn questions_for_difficulty(difficulty: &str) -> i64 {
    match difficulty {
        "easy" => 3,
        "medium" => 4,
        "hard" => 6,
        _ => 0,
    }
}
