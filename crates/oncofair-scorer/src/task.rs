//! Prediction task descriptors.
//!
//! The HER2 and lung-subtype services differ only in the data captured here,
//! so a single scorer dispatches on [`TaskKind`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Positive-class probability averaged into a risk score.
    Binary,
    /// Predicted labels counted into a class distribution.
    Multiclass,
}

/// How biomarker columns are prepared before inference.
/// Missing values are filled with 0 in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeaturePrep {
    MinMaxScaled,
    FillOnly,
}

#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    /// Short identifier used in logs and health output.
    pub name: &'static str,
    pub kind: TaskKind,
    pub target_column: &'static str,
    pub feature_columns: &'static [&'static str],
    pub feature_prep: FeaturePrep,
    /// Display names for predicted class codes (multiclass only).
    pub class_names: &'static [(i64, &'static str)],
    /// Phrase naming the condition in the insights prompt.
    pub subject: &'static str,
    pub benchmark_accuracy: f64,
    pub benchmark_cohort: &'static str,
    pub guideline: &'static str,
}

pub const ANCESTRY_COLUMN: &str = "ancestry";
pub const RACE_COLUMN: &str = "race";
pub const CASE_ID_COLUMN: &str = "case_id";

impl TaskDescriptor {
    /// HER2 status (binary) from BRCA1/BRCA2 expression.
    pub fn her2() -> Self {
        Self {
            name: "her2",
            kind: TaskKind::Binary,
            target_column: "her2_status",
            feature_columns: &["brca1", "brca2"],
            feature_prep: FeaturePrep::MinMaxScaled,
            class_names: &[],
            subject: "HER2-positive breast cancer",
            benchmark_accuracy: 0.85,
            benchmark_cohort: "TCGA-BRCA",
            guideline: "HER2-positive breast cancer has a 20% recurrence rate per ASCO guidelines—regular follow-ups recommended.",
        }
    }

    /// Lung cancer subtype (multiclass) from EGFR/KRAS mutation status.
    pub fn lung_subtype() -> Self {
        Self {
            name: "lung",
            kind: TaskKind::Multiclass,
            target_column: "cancer_subtype",
            feature_columns: &["EGFR_mutation_status", "KRAS_mutation_status"],
            feature_prep: FeaturePrep::FillOnly,
            class_names: &[(0, "Adenocarcinoma"), (1, "Squamous Cell"), (2, "SCLC")],
            subject: "lung cancer subtypes",
            benchmark_accuracy: 0.82,
            benchmark_cohort: "TCGA-LUAD",
            guideline: "Lung cancer subtypes guide treatment—ASCO recommends molecular testing for EGFR/KRAS.",
        }
    }

    /// Human-readable name for a class code; unknown codes keep their raw form.
    pub fn class_name(&self, code: i64) -> String {
        self.class_names
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name_lookup() {
        let lung = TaskDescriptor::lung_subtype();
        assert_eq!(lung.class_name(0), "Adenocarcinoma");
        assert_eq!(lung.class_name(2), "SCLC");
        assert_eq!(lung.class_name(7), "7");
    }

    #[test]
    fn test_descriptors_differ_by_kind() {
        assert_eq!(TaskDescriptor::her2().kind, TaskKind::Binary);
        assert_eq!(TaskDescriptor::lung_subtype().kind, TaskKind::Multiclass);
        assert_eq!(TaskDescriptor::her2().feature_prep, FeaturePrep::MinMaxScaled);
    }
}
