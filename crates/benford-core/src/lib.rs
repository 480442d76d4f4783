pub mod benford;
pub mod error;
pub mod types;

pub use error::{AnalysisStage, BenfordError};
pub use types::*;

/// Standard result type for all Benford analysis operations
pub type AnalysisResult<T> = Result<T, BenfordError>;
