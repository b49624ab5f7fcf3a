use std::sync::Arc;

use crate::config::Config;
use crate::grading::QuizRecorder;
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub recorder: Arc<QuizRecorder>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<QuizRecorder> {
    fn from_ref(state: &AppState) -> Self {
        state.recorder.clone()
    }
}
