use thiserror::Error;

/// Errors callers are expected to match on.
///
/// Everything else (I/O, serialization) travels as `anyhow::Error` with context.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("skill '{0}' not found")]
    SkillNotFound(String),

    #[error("plan '{0}' not found")]
    PlanNotFound(String),

    #[error("invalid constitution: {0}")]
    InvalidConstitution(String),
}
