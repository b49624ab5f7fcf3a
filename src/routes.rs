// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, questions, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, questions, quizzes, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, recorder).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/generate-username", get(auth::generate_username));

    let question_routes = Router::new()
        .route("/", get(questions::list_questions))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let quiz_routes = Router::new()
        .route("/submit", post(quiz::submit_quiz))
        .route("/completed", get(quiz::completed_quizzes))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/users/search", get(admin::search_users))
        .route("/reports/user-quizzes", post(admin::user_quizzes_report))
        .route("/reports/topic-difficulty", post(admin::topic_difficulty_report))
        // Double middleware protection: Auth first, then staff check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
