pub mod condition;
pub mod engine;
pub mod reward;
pub mod types;

pub use engine::EvaluationEngine;
pub use types::{EngineError, EvaluationOutput, EvaluationResult};
