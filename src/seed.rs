// src/seed.rs

use std::path::Path;

use chrono::NaiveDate;
use sqlx::{PgPool, types::Json};

use crate::{
    config::Config, error::AppError, models::question::Question, utils::hash::hash_password,
};

/// Creates the staff account named in the config, if it does not exist yet.
pub async fn seed_admin_user(pool: &PgPool, config: &Config) -> Result<(), AppError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    if exists.is_none() {
        tracing::info!("Seeding admin user: {}", username);
        let hashed_password = hash_password(password)?;
        let placeholder_dob = NaiveDate::from_ymd_opt(1970, 1, 1)
            .ok_or_else(|| AppError::InternalServerError("invalid seed date".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO users (username, first_name, last_name, date_of_birth, year_group, password, is_staff)
            VALUES ($1, 'Admin', 'Admin', $2, 13, $3, TRUE)
            "#,
        )
        .bind(username)
        .bind(placeholder_dob)
        .bind(hashed_password)
        .execute(pool)
        .await?;
        tracing::info!("Admin user created successfully.");
    }
    Ok(())
}

/// Parses a JSON question bank (an array of question records).
pub fn parse_question_bank(raw: &str) -> Result<Vec<Question>, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::InternalServerError(format!("invalid question bank: {}", e)))
}

/// Upserts the bank's questions into the 'questions' table in one transaction.
pub async fn upsert_questions(pool: &PgPool, questions: &[Question]) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    for q in questions {
        sqlx::query(
            r#"
            INSERT INTO questions (id, topic, difficulty, question_type, question_text, options, answer_key, marks)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                topic = EXCLUDED.topic,
                difficulty = EXCLUDED.difficulty,
                question_type = EXCLUDED.question_type,
                question_text = EXCLUDED.question_text,
                options = EXCLUDED.options,
                answer_key = EXCLUDED.answer_key,
                marks = EXCLUDED.marks
            "#,
        )
        .bind(q.id)
        .bind(&q.topic)
        .bind(&q.difficulty)
        .bind(&q.question_type)
        .bind(&q.question_text)
        .bind(Json(&q.options))
        .bind(Json(&q.answer_key))
        .bind(q.marks)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Loads the bank file into the database. A missing file is skipped.
pub async fn seed_questions(pool: &PgPool, path: impl AsRef<Path>) -> Result<usize, AppError> {
    let path = path.as_ref();
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Question bank {} not found, skipping seed", path.display());
            return Ok(0);
        }
        Err(e) => return Err(AppError::InternalServerError(e.to_string())),
    };

    let questions = parse_question_bank(&raw)?;
    upsert_questions(pool, &questions).await?;
    tracing::info!("Loaded {} questions from {}", questions.len(), path.display());

    Ok(questions.len())
}
