//! Pre-trained classifiers.
//!
//! A classifier is loaded once at startup and shared read-only between
//! requests behind an `Arc<dyn Classifier>`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ScoreError;

/// A fitted model over a fixed-order numeric feature matrix.
pub trait Classifier: Send + Sync {
    /// Model identifier used in logs.
    fn name(&self) -> &str;

    /// Column names, in the order `predict` expects them.
    fn feature_names(&self) -> &[String];

    /// Class codes, in probability-column order.
    fn classes(&self) -> &[i64];

    /// Predicted class code per row.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<i64>, ScoreError>;

    /// Per-row class probabilities, columns ordered as [`Classifier::classes`].
    fn predict_proba(&self, _x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ScoreError> {
        Err(ScoreError::Unsupported(format!(
            "classifier '{}' does not expose class probabilities",
            self.name()
        )))
    }
}

/// Logistic / softmax regression stored as JSON.
///
/// With two classes and a single coefficient row the model is a logistic
/// regression whose row scores the second class; otherwise each row scores
/// one class and probabilities come from a softmax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub name: String,
    pub features: Vec<String>,
    pub classes: Vec<i64>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let model = Self::from_json(&content)?;
        info!(
            model = %model.name,
            path = %path.display(),
            classes = model.classes.len(),
            features = ?model.features,
            "classifier loaded"
        );
        Ok(model)
    }

    pub fn from_json(content: &str) -> Result<Self, ScoreError> {
        let model: LinearModel = serde_json::from_str(content)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.classes.len() < 2 {
            return Err(ScoreError::Model(format!(
                "'{}' needs at least two classes, found {}",
                self.name,
                self.classes.len()
            )));
        }
        let expected_rows = if self.is_logistic() { 1 } else { self.classes.len() };
        if self.coefficients.len() != expected_rows {
            return Err(ScoreError::Model(format!(
                "'{}' has {} coefficient rows, expected {}",
                self.name,
                self.coefficients.len(),
                expected_rows
            )));
        }
        if self.intercepts.len() != self.coefficients.len() {
            return Err(ScoreError::Model(format!(
                "'{}' has {} intercepts for {} coefficient rows",
                self.name,
                self.intercepts.len(),
                self.coefficients.len()
            )));
        }
        if let Some(row) = self.coefficients.iter().find(|r| r.len() != self.features.len()) {
            return Err(ScoreError::Model(format!(
                "'{}' coefficient row has {} weights for {} features",
                self.name,
                row.len(),
                self.features.len()
            )));
        }
        Ok(())
    }

    fn is_logistic(&self) -> bool {
        self.classes.len() == 2 && self.coefficients.len() <= 1
    }

    fn check_width(&self, x: &[Vec<f64>]) -> Result<(), ScoreError> {
        match x.iter().position(|row| row.len() != self.features.len()) {
            Some(i) => Err(ScoreError::ShapeMismatch(format!(
                "row {} has {} values, model '{}' expects {}",
                i + 1,
                x[i].len(),
                self.name,
                self.features.len()
            ))),
            None => Ok(()),
        }
    }

    fn row_probabilities(&self, row: &[f64]) -> Vec<f64> {
        let scores: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        if self.is_logistic() {
            let p = sigmoid(scores[0]);
            return vec![1.0 - p, p];
        }
        softmax(&scores)
    }
}

impl Classifier for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<i64>, ScoreError> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .iter()
            .map(|p| self.classes[argmax(p)])
            .collect())
    }

    fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ScoreError> {
        self.check_width(x)?;
        Ok(x.iter().map(|row| self.row_probabilities(row)).collect())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

/// Index of the largest value; ties resolve to the first.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

// ── Fixed-output classifier for testing ─────────────────────────────────────

/// Returns canned predictions regardless of input. Row count must match.
pub struct MockClassifier {
    features: Vec<String>,
    classes: Vec<i64>,
    predictions: Vec<i64>,
    probabilities: Option<Vec<Vec<f64>>>,
}

impl MockClassifier {
    pub fn new(features: &[&str], classes: &[i64], predictions: Vec<i64>) -> Self {
        Self {
            features: features.iter().map(|s| s.to_string()).collect(),
            classes: classes.to_vec(),
            predictions,
            probabilities: None,
        }
    }

    pub fn with_probabilities(mut self, probabilities: Vec<Vec<f64>>) -> Self {
        self.probabilities = Some(probabilities);
        self
    }

    fn check_rows(&self, x: &[Vec<f64>]) -> Result<(), ScoreError> {
        if x.len() != self.predictions.len() {
            return Err(ScoreError::ShapeMismatch(format!(
                "mock expects {} rows, got {}",
                self.predictions.len(),
                x.len()
            )));
        }
        Ok(())
    }
}

impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<i64>, ScoreError> {
        self.check_rows(x)?;
        Ok(self.predictions.clone())
    }

    fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ScoreError> {
        self.check_rows(x)?;
        match &self.probabilities {
            Some(p) => Ok(p.clone()),
            None => Err(ScoreError::Unsupported("mock has no probabilities".to_string())),
        }
    }
}
