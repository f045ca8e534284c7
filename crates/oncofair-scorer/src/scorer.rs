//! Fairness-aware scorer.
//!
//! One scorer per task, built at startup around an immutable classifier.
//! Binary tasks yield a risk score and label; multiclass tasks yield a
//! predicted subtype distribution. Both get per-group accuracy and a
//! disparity index, with the biased-mode adjustments from [`crate::fairness`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::classifier::Classifier;
use crate::dataset::{prepare, PreparedTable, RecordTable};
use crate::error::ScoreError;
use crate::fairness::{
    accuracy, adjust_distribution, adjust_risk, amplify_disparity, disparity_index,
    group_accuracy, FairnessMetrics, HIGH_RISK_THRESHOLD,
};
use crate::normalise::mean;
use crate::task::{TaskDescriptor, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    High,
    Low,
}

impl RiskLabel {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_RISK_THRESHOLD { RiskLabel::High } else { RiskLabel::Low }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::High => "High",
            RiskLabel::Low  => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Prediction {
    Risk {
        risk_score: f64,
        risk_label: RiskLabel,
    },
    Subtypes {
        subtype_distribution: BTreeMap<String, f64>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub overall_accuracy: f64,
    pub fairness_metrics: FairnessMetrics,
    pub disparity_index: f64,
    pub is_biased: bool,
    /// Mean of each prepared task feature; feeds the insights prompt.
    #[serde(skip)]
    pub feature_means: Vec<(String, f64)>,
}

/// Biased mode is a property of the upload's file name, never of its content.
pub fn is_biased_filename(filename: &str) -> bool {
    filename.to_lowercase().contains("biased")
}

pub struct FairnessScorer {
    task: TaskDescriptor,
    classifier: Arc<dyn Classifier>,
}

impl FairnessScorer {
    pub fn new(task: TaskDescriptor, classifier: Arc<dyn Classifier>) -> Self {
        Self { task, classifier }
    }

    pub fn task(&self) -> &TaskDescriptor {
        &self.task
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Prepare a raw upload for this task and score it.
    pub fn score_table(&self, table: &RecordTable, is_biased: bool) -> Result<ScoreReport, ScoreError> {
        let prepared = prepare(table, &self.task)?;
        self.score(&prepared, is_biased)
    }

    pub fn score(&self, table: &PreparedTable, is_biased: bool) -> Result<ScoreReport, ScoreError> {
        let x = table.feature_matrix(self.classifier.feature_names())?;
        let y_pred = self.classifier.predict(&x)?;
        let overall_accuracy = accuracy(&table.labels, &y_pred)?;

        let prediction = match self.task.kind {
            TaskKind::Binary => {
                let proba = self.classifier.predict_proba(&x)?;
                let positive = proba
                    .iter()
                    .map(|row| {
                        row.get(1).copied().ok_or_else(|| {
                            ScoreError::ShapeMismatch(format!(
                                "binary task '{}' needs two probability columns, got {}",
                                self.task.name,
                                row.len()
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let risk_score = adjust_risk(mean(&positive), overall_accuracy, is_biased);
                Prediction::Risk { risk_score, risk_label: RiskLabel::from_score(risk_score) }
            }
            TaskKind::Multiclass => {
                let mut counts: BTreeMap<String, u64> = BTreeMap::new();
                for code in &y_pred {
                    *counts.entry(self.task.class_name(*code)).or_insert(0) += 1;
                }
                Prediction::Subtypes {
                    subtype_distribution: adjust_distribution(&counts, overall_accuracy, is_biased),
                }
            }
        };

        let fairness_metrics = group_accuracy(&table.labels, &y_pred, &table.ancestry)?;
        let disparity_index = amplify_disparity(disparity_index(&fairness_metrics), is_biased);

        info!(
            task = self.task.name,
            model = self.classifier.name(),
            rows = table.len(),
            groups = fairness_metrics.len(),
            overall_accuracy,
            disparity_index,
            is_biased,
            "scored upload"
        );

        Ok(ScoreReport {
            prediction,
            overall_accuracy,
            fairness_metrics,
            disparity_index,
            is_biased,
            feature_means: table.feature_means.clone(),
        })
    }
}
