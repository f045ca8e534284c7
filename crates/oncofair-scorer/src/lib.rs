//! oncofair-scorer — Fairness-aware scoring of cancer-label classifiers.
//!
//! Turns an uploaded record table into per-ancestry accuracy, a disparity
//! index and a risk score (binary tasks) or predicted subtype distribution
//! (multiclass tasks), with the biased-mode adjustments applied.

pub mod error;
pub mod task;
pub mod dataset;
pub mod normalise;
pub mod classifier;
pub mod fairness;
pub mod scorer;

pub use classifier::{Classifier, LinearModel};
pub use dataset::{PreparedTable, RecordTable};
pub use error::ScoreError;
pub use fairness::{FairnessMetrics, GroupMetrics};
pub use scorer::{FairnessScorer, Prediction, RiskLabel, ScoreReport};
pub use task::{FeaturePrep, TaskDescriptor, TaskKind};
