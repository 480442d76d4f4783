use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage in which an analysis failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Validation,
    TheoreticalDistribution,
    FirstOrder,
    SecondOrder,
    ConformityTests,
    Summation,
    Mantissa,
    DistortionFactor,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::Validation => "validation",
            AnalysisStage::TheoreticalDistribution => "theoretical distribution",
            AnalysisStage::FirstOrder => "first-order distribution",
            AnalysisStage::SecondOrder => "second-order distribution",
            AnalysisStage::ConformityTests => "conformity tests",
            AnalysisStage::Summation => "summation",
            AnalysisStage::Mantissa => "mantissa statistics",
            AnalysisStage::DistortionFactor => "distortion factor",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum BenfordError {
    #[error("Invalid configuration: {field} — {reason}")]
    Configuration { field: String, reason: String },

    #[error("Insufficient data in {stage}: {reason}")]
    InsufficientData { stage: AnalysisStage, reason: String },

    #[error("Degenerate distribution in {stage}: {context}")]
    DegenerateDistribution {
        stage: AnalysisStage,
        context: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BenfordError {
    /// Stage that raised the error, if it came from the pipeline.
    pub fn stage(&self) -> Option<AnalysisStage> {
        match self {
            BenfordError::Configuration { .. } => Some(AnalysisStage::Validation),
            BenfordError::InsufficientData { stage, .. }
            | BenfordError::DegenerateDistribution { stage, .. } => Some(*stage),
            BenfordError::SerializationError(_) => None,
        }
    }
}

impl From<serde_json::Error> for BenfordError {
    fn from(e: serde_json::Error) -> Self {
        BenfordError::SerializationError(e.to_string())
    }
}
