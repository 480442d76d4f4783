pub mod analysis;
pub mod conformity;
pub mod digits;
pub mod distribution;
pub mod empirical;
pub mod mantissa;
pub mod screening;
pub mod summation;

pub use analysis::{
    analyze_benford, analyze_benford_with_metadata, BenfordInput, BenfordResult, DigitRow,
    Observation, SampleInfo, SecondOrderObservation, SecondOrderRow,
};
pub use conformity::{DistortionFactor, HypothesisTest, MadConformity};
pub use empirical::SignFilter;
pub use screening::{DuplicateValue, RankingCriterion};
