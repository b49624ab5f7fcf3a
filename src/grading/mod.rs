// src/grading/mod.rs
//
// Answer scoring and quiz completion.

pub mod bands;
pub mod engine;
pub mod error;
pub mod llm;
pub mod recorder;

pub use bands::GradeBands;
pub use engine::{GradingEngine, Score, TextGrader};
pub use error::GradingError;
pub use llm::OpenAiGrader;
pub use recorder::{GradedQuiz, QuizRecorder};
