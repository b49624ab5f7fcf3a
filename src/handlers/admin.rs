// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::{
    error::AppError,
    grading::bands::round2,
    models::{
        quiz::{CompletedQuizRow, QuizSummary},
        user::UserSummary,
    },
};

#[derive(Debug, Deserialize)]
pub struct UserSearchParams {
    #[serde(default)]
    pub query: String,
}

/// Searches users by username (case-insensitive substring, at most 10).
/// Staff only.
pub async fn search_users(
    State(pool): State<PgPool>,
    Query(params): Query<UserSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT username, first_name, last_name
        FROM users
        WHERE username ILIKE '%' || $1 || '%'
        ORDER BY username
        LIMIT 10
        "#,
    )
    .bind(params.query.trim())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to search users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct UserQuizzesReportRequest {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserQuizzesReport {
    pub user: String,
    pub quizzes: Vec<QuizSummary>,
}

/// All quizzes taken by one user, newest first.
/// Staff only.
pub async fn user_quizzes_report(
    State(pool): State<PgPool>,
    Json(req): Json<UserQuizzesReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(username) = req.username.filter(|u| !u.trim().is_empty()) else {
        return Err(AppError::BadRequest(
            "Username is required in the payload.".to_string(),
        ));
    };

    let (user_id, canonical): (i64, String) =
        sqlx::query_as("SELECT id, username FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username.trim())
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found.", username)))?;

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
        tracing::error!("Failed to fetch quizzes for report: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(UserQuizzesReport {
        user: canonical,
        quizzes: quizzes.into_iter().map(QuizSummary::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TopicDifficultyReportRequest {
    pub topic: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, FromRow)]
struct TopScoreRow {
    percentage: f64,
    #[sqlx(flatten)]
    user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct TopicDifficultyReport {
    pub topic: String,
    pub difficulty: String,
    pub average_score: f64,
    pub highest_score: f64,
    pub top_user: UserSummary,
}

/// Average and best percentage for a topic and difficulty, with the top scorer.
/// Ties on the best score go to whoever reached it first.
/// Staff only.
pub async fn topic_difficulty_report(
    State(pool): State<PgPool>,
    Json(req): Json<TopicDifficultyReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(topic), Some(difficulty)) = (
        req.topic.filter(|s| !s.trim().is_empty()),
        req.difficulty.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Both topic and difficulty are required.".to_string(),
        ));
    };

    let (average,): (Option<f64>,) = sqlx::query_as(
        "SELECT AVG(percentage) FROM completed_quizzes WHERE topic = $1 AND difficulty = $2",
    )
    .bind(&topic)
    .bind(&difficulty)
    .fetch_one(&pool)
    .await?;

    let Some(average) = average else {
        return Err(AppError::NotFound(
            "No quizzes found for the selected filters.".to_string(),
        ));
    };

    let top = sqlx::query_as::<_, TopScoreRow>(
        r#"
        SELECT q.percentage, u.username, u.first_name, u.last_name
        FROM completed_quizzes q
        JOIN users u ON q.user_id = u.id
        WHERE q.topic = $1 AND q.difficulty = $2
        ORDER BY q.percentage DESC, q.created_at ASC, q.id ASC
        LIMIT 1
        "#,
    )
    .bind(&topic)
    .bind(&difficulty)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No quizzes found for the selected filters.".to_string()))?;

    Ok(Json(TopicDifficultyReport {
        topic,
        difficulty,
        average_score: round2(average),
        highest_score: top.percentage,
        top_user: top.user,
    }))
}
