// src/handlers/questions.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::question::{
        PublicQuestion, Question, QuestionListParams, QuestionRow, questions_for_difficulty,
    },
};

/// Draws a random set of questions for a topic and difficulty.
///
/// The set size depends on the difficulty (easy 3, medium 4, hard 6).
/// Answer keys are never sent to the client.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(topic), Some(difficulty)) = (
        params.topic.filter(|s| !s.trim().is_empty()),
        params.difficulty.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Both topic and difficulty are required.".to_string(),
        ));
    };

    let questions = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, topic, difficulty, question_type, question_text, options, answer_key, marks
        FROM questions
        WHERE topic = $1 AND difficulty = $2
        ORDER BY RANDOM()
        LIMIT $3
        "#,
    )
    .bind(&topic)
    .bind(&difficulty)
    .bind(questions_for_difficulty(&difficulty))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let public_questions: Vec<PublicQuestion> = questions
        .into_iter()
        .map(|row| PublicQuestion::from(Question::from(row)))
        .collect();

    Ok(Json(public_questions))
}
