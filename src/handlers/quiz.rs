// src/handlers/quiz.rs

use std::{collections::HashMap, sync::Arc};

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    grading::QuizRecorder,
    models::{
        question::{Question, QuestionRow},
        quiz::{
            CompletedQuizRow, GradedAnswerRow, QuizResult, SubmitQuizRequest, SubmitQuizResponse,
        },
    },
    utils::jwt::Claims,
};

/// Submits a user's quiz answers, grades them and stores the result.
///
/// * Requires a topic and at least one answer.
/// * Grades only questions of that topic whose ids were answered.
/// * Returns 201 with the grade, percentage and per-question breakdown.
/// * A grading failure stores nothing and returns 502.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    State(recorder): State<Arc<QuizRecorder>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let topic = req
        .topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let Some(topic) = topic.filter(|_| !req.submitted_answers.is_empty()) else {
        return Err(AppError::BadRequest(
            "Topic and submitted answers are required.".to_string(),
        ));
    };

    let difficulty = req.difficulty.filter(|d| !d.trim().is_empty());
    let user_id = claims.user_id()?;

    let submitted_answers: HashMap<String, String> = req
        .submitted_answers
        .into_iter()
        .map(|(id, answer)| (id.trim().to_string(), answer.into_text()))
        .collect();

    let question_ids: Vec<i64> = submitted_answers
        .keys()
        .filter_map(|id| id.parse::<i64>().ok())
        .collect();

    if question_ids.is_empty() {
        return Err(AppError::BadRequest(
            "No questions found for the specified topic.".to_string(),
        ));
    }

    let questions: Vec<Question> = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, topic, difficulty, question_type, question_text, options, answer_key, marks
        FROM questions
        WHERE id = ANY($1) AND topic = $2
        ORDER BY id
        "#,
    )
    .bind(&question_ids)
    .bind(&topic)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch answer keys: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .into_iter()
    .map(Question::from)
    .collect();

    if questions.is_empty() {
        return Err(AppError::BadRequest(
            "No questions found for the specified topic.".to_string(),
        ));
    }

    let result = recorder
        .record(
            &pool,
            user_id,
            &topic,
            difficulty.as_deref(),
            &questions,
            &submitted_answers,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(SubmitQuizResponse::from(result))))
}

/// Loads quizzes with their graded answers, in stored question order.
pub(crate) async fn load_results(
    pool: &PgPool,
    quizzes: Vec<CompletedQuizRow>,
) -> Result<Vec<QuizResult>, AppError> {
    let quiz_ids: Vec<i64> = quizzes.iter().map(|q| q.id).collect();

    let rows = sqlx::query_as::<_, GradedAnswerRow>(
        r#"
        SELECT quiz_id, question_text, answer_key, submitted_answer, marks, total_marks, is_correct
        FROM completed_quiz_questions
        WHERE quiz_id = ANY($1)
        ORDER BY quiz_id, position
        "#,
    )
    .bind(&quiz_ids)
    .fetch_all(pool)
    .await?;

    let mut by_quiz: HashMap<i64, Vec<_>> = HashMap::new();
    for row in rows {
        by_quiz.entry(row.quiz_id).or_default().push(row.answer);
    }

    Ok(quizzes
        .into_iter()
        .map(|quiz| {
            let answers = by_quiz.remove(&quiz.id).unwrap_or_default();
            quiz.into_result(answers)
        })
        .collect())
}

/// Lists the current user's completed quizzes, newest first.
pub async fn completed_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let quizzes = sqlx::query_as::<_, CompletedQuizRow>(
        r#"
        SELECT id, user_id, topic, difficulty, number_of_questions, grade, percentage, created_at
        FROM completed_quizzes
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch completed quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(load_results(&pool, quizzes).await?))
}
