// src/grading/recorder.rs
//
// Turns a set of questions and submitted answers into a persisted quiz result.

use std::collections::HashMap;

use futures::future::try_join_all;
use sqlx::PgPool;

use crate::{
    error::AppError,
    grading::{
        bands::{GradeBands, percentage},
        engine::GradingEngine,
        error::GradingError,
    },
    models::{
        question::Question,
        quiz::{CompletedQuizRow, GradedAnswer, QuizResult},
    },
};

/// Fully graded quiz, not yet persisted.
#[derive(Debug, Clone)]
pub struct GradedQuiz {
    /// In input question order.
    pub answers: Vec<GradedAnswer>,
    pub total_awarded: i64,
    pub total_max: i64,
    pub percentage: f64,
    pub grade: String,
}

pub struct QuizRecorder {
    engine: GradingEngine,
    bands: GradeBands,
}

impl QuizRecorder {
    pub fn new(engine: GradingEngine, bands: GradeBands) -> Self {
        Self { engine, bands }
    }

    /// Grades every question and aggregates the outcome.
    ///
    /// Questions are graded concurrently; the result keeps input order.
    /// The first grading failure aborts the whole quiz.
    pub async fn grade(
        &self,
        questions: &[Question],
        submitted_answers: &HashMap<String, String>,
    ) -> Result<GradedQuiz, GradingError> {
        let total_max: i64 = questions.iter().map(|q| i64::from(q.marks)).sum();

        let answers = try_join_all(questions.iter().map(|question| async move {
            let submitted = submitted_answers
                .get(&question.id.to_string())
                .cloned()
                .unwrap_or_default();
            let score = self.engine.grade(question, &submitted).await?;

            Ok::<_, GradingError>(GradedAnswer {
                question_text: question.question_text.clone(),
                answer_key: question.answer_key.as_text(),
                submitted_answer: submitted,
                marks: score.awarded,
                total_marks: question.marks,
                is_correct: score.is_correct,
            })
        }))
        .await?;

        let total_awarded: i64 = answers.iter().map(|a| i64::from(a.marks)).sum();
        let percentage = percentage(total_awarded, total_max);
        let grade = self.bands.grade_for(percentage).to_string();

        Ok(GradedQuiz {
            answers,
            total_awarded,
            total_max,
            percentage,
            grade,
        })
    }

    /// Grades the submission and stores it.
    ///
    /// Nothing is written unless every question was graded; the quiz row and
    /// its answers are inserted in a single transaction.
    pub async fn record(
        &self,
        pool: &PgPool,
        user_id: i64,
        topic: &str,
        difficulty: Option<&str>,
        questions: &[Question],
        submitted_answers: &HashMap<String, String>,
    ) -> Result<QuizResult, AppError> {
        if questions.is_empty() {
            return Err(AppError::BadRequest("No questions to grade".to_string()));
        }

        let graded = self.grade(questions, submitted_answers).await.map_err(|e| {
            tracing::warn!("Grading failed for user {} on '{}': {}", user_id, topic, e);
            AppError::from(e)
        })?;

        let mut tx = pool.begin().await?;

        let quiz = sqlx::query_as::<_, CompletedQuizRow>(
            r#"
            INSERT INTO completed_quizzes
                (user_id, topic, difficulty, number_of_questions, grade, percentage)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, topic, difficulty, number_of_questions, grade, percentage, created_at
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .bind(difficulty)
        .bind(graded.answers.len() as i32)
        .bind(&graded.grade)
        .bind(graded.percentage)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert completed quiz: {:?}", e);
            AppError::from(e)
        })?;

        for (position, answer) in graded.answers.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO completed_quiz_questions
                    (quiz_id, position, question_text, answer_key, submitted_answer, marks, total_marks, is_correct)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(quiz.id)
            .bind(position as i32)
            .bind(&answer.question_text)
            .bind(&answer.answer_key)
            .bind(&answer.submitted_answer)
            .bind(answer.marks)
            .bind(answer.total_marks)
            .bind(answer.is_correct)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert graded answer: {:?}", e);
                AppError::from(e)
            })?;
        }

        tx.commit().await?;

        tracing::info!(
            "Recorded quiz {} for user {}: {}/{} ({}%, {})",
            quiz.id,
            user_id,
            graded.total_awarded,
            graded.total_max,
            graded.percentage,
            graded.grade
        );

        Ok(quiz.into_result(graded.answers))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::grading::engine::TextGrader;
    use crate::grading::engine::tests::{CannedGrader, question};
    use crate::models::question::AnswerKey;

    fn recorder(grader: impl TextGrader + 'static) -> QuizRecorder {
        QuizRecorder::new(GradingEngine::new(Arc::new(grader)), GradeBands::default())
    }

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn perfect_single_question() {
        let questions = vec![question(1, "multiple_choice", AnswerKey::Single("4".into()), 1)];
        let graded = recorder(CannedGrader::scoring(0))
            .grade(&questions, &answers(&[("1", "4")]))
            .await
            .unwrap();

        assert_eq!(graded.percentage, 100.0);
        assert_eq!(graded.grade, "A+");
        assert_eq!(graded.answers.len(), 1);
        assert_eq!(graded.answers[0].marks, 1);
        assert_eq!(graded.answers[0].total_marks, 1);
    }

    #[tokio::test]
    async fn wrong_single_question() {
        let questions = vec![question(1, "multiple_choice", AnswerKey::Single("4".into()), 1)];
        let graded = recorder(CannedGrader::scoring(0))
            .grade(&questions, &answers(&[("1", "3")]))
            .await
            .unwrap();

        assert_eq!(graded.percentage, 0.0);
        assert_eq!(graded.grade, "F");
        assert!(!graded.answers[0].is_correct);
    }

    #[tokio::test]
    async fn mixed_quiz_keeps_order_and_totals() {
        let questions = vec![
            question(1, "multiple_choice", AnswerKey::Single("4".into()), 1),
            question(3, "multiple_select", AnswerKey::Multiple(vec!["3".into(), "6".into()]), 2),
        ];
        let graded = recorder(CannedGrader::scoring(0))
            .grade(&questions, &answers(&[("1", "4"), ("3", "3,6")]))
            .await
            .unwrap();

        assert_eq!(graded.percentage, 100.0);
        assert_eq!(graded.grade, "A+");
        assert_eq!(graded.answers[0].marks, 1);
        assert_eq!(graded.answers[1].marks, 2);
        assert_eq!(graded.answers[1].answer_key, "3, 6");
        assert_eq!(graded.total_awarded, 3);
        assert_eq!(graded.total_max, 3);
    }

    #[tokio::test]
    async fn missing_answers_score_zero() {
        let questions = vec![
            question(1, "multiple_choice", AnswerKey::Single("4".into()), 1),
            question(2, "multiple_choice", AnswerKey::Single("6".into()), 1),
        ];
        let graded = recorder(CannedGrader::scoring(0))
            .grade(&questions, &answers(&[("1", "4")]))
            .await
            .unwrap();

        assert_eq!(graded.answers[1].submitted_answer, "");
        assert_eq!(graded.answers[1].marks, 0);
        assert_eq!(graded.percentage, 50.0);
        assert_eq!(graded.grade, "E");
    }

    #[tokio::test]
    async fn partial_free_text_credit() {
        let questions = vec![question(
            4,
            "long_answer",
            AnswerKey::Single("Gravity is a force that attracts two bodies towards each other.".into()),
            5,
        )];
        let graded = recorder(CannedGrader::scoring(4))
            .grade(
                &questions,
                &answers(&[("4", "Gravity is a force that pulls objects towards the Earth.")]),
            )
            .await
            .unwrap();

        let answer = &graded.answers[0];
        assert!(answer.marks >= 3 && answer.marks <= 5);
        assert_eq!(answer.total_marks, 5);
        assert_eq!(graded.percentage, 80.0);
        assert_eq!(graded.grade, "B");
    }

    #[tokio::test]
    async fn one_failure_fails_the_quiz() {
        let questions = vec![
            question(1, "multiple_choice", AnswerKey::Single("4".into()), 1),
            question(2, "long_answer", AnswerKey::Single("key".into()), 5),
        ];
        let res = recorder(CannedGrader::failing(|| GradingError::Malformed("n/a".into())))
            .grade(&questions, &answers(&[("1", "4"), ("2", "an answer")]))
            .await;

        assert!(matches!(res, Err(GradingError::Malformed(_))));
    }

    /// Answers faster for later questions so completion order is reversed.
    struct SlowFirst;

    #[async_trait]
    impl TextGrader for SlowFirst {
        async fn mark(&self, answer: &str, _key: &str, _max: i32) -> Result<i64, GradingError> {
            let delay = if answer == "first" { 50 } else { 1 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(if answer == "first" { 1 } else { 2 })
        }
    }

    #[tokio::test]
    async fn order_is_independent_of_completion_order() {
        let mut first = question(10, "long_answer", AnswerKey::Single("k".into()), 2);
        first.question_text = "First".into();
        let mut second = question(20, "long_answer", AnswerKey::Single("k".into()), 2);
        second.question_text = "Second".into();

        let graded = recorder(SlowFirst)
            .grade(&[first, second], &answers(&[("10", "first"), ("20", "second")]))
            .await
            .unwrap();

        assert_eq!(graded.answers[0].question_text, "First");
        assert_eq!(graded.answers[0].marks, 1);
        assert_eq!(graded.answers[1].question_text, "Second");
        assert_eq!(graded.answers[1].marks, 2);
    }

    #[tokio::test]
    async fn awarded_marks_always_within_bounds() {
        let questions = vec![
            question(1, "multiple_choice", AnswerKey::Single("a".into()), 3),
            question(2, "multiple_select", AnswerKey::Multiple(vec!["x".into(), "y".into()]), 2),
            question(3, "long_answer", AnswerKey::Single("k".into()), 4),
        ];
        let submissions = [
            answers(&[("1", "A"), ("2", "x,y"), ("3", "yes")]),
            answers(&[("1", "b"), ("2", "x,z,w"), ("3", "")]),
            answers(&[("2", "y")]),
        ];

        for submitted in &submissions {
            let graded = recorder(CannedGrader::scoring(2))
                .grade(&questions, submitted)
                .await
                .unwrap();

            assert_eq!(graded.answers.len(), questions.len());
            for a in &graded.answers {
                assert!(a.marks >= 0 && a.marks <= a.total_marks);
                assert_eq!(a.is_correct, a.marks == a.total_marks);
            }
            let sum: i64 = graded.answers.iter().map(|a| i64::from(a.marks)).sum();
            assert_eq!(sum, graded.total_awarded);
            assert!((graded.percentage - sum as f64 / 9.0 * 100.0).abs() < 0.01);
        }
    }
}
