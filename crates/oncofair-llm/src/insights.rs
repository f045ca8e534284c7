//! Natural-language insights for a scored upload.
//!
//! The backend is an opaque text generator. Any failure degrades to
//! [`INSIGHTS_FALLBACK`]; the scoring response is never aborted.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use oncofair_scorer::{Prediction, ScoreReport, TaskDescriptor, TaskKind};
use tracing::{error, info, warn};

use crate::audit::InsightAuditEntry;
use crate::backend::{LlmBackend, LlmError, LlmRequest, Message};

pub const INSIGHTS_FALLBACK: &str = "Error generating insights. Please try again later.";

pub const SYSTEM_PROMPT: &str = "You are Grok, an expert AI assistant from xAI, providing personalized healthcare insights with a focus on equity.";

const INSTRUCTIONS: &str = "\
Generate **actionable insights and recommendations** tailored to this data, highlighting any biases if present. Compare to the benchmark and reference the guideline. Focus on health equity and next steps.
Use Markdown: bold **headings**, bullet points for lists.
If biased, emphasize the specific issues (e.g., underrepresentation, label noise) and mitigation strategies.";

/// Render the user prompt summarising a report.
pub fn build_prompt(
    task: &TaskDescriptor,
    report: &ScoreReport,
    demographics: &BTreeMap<String, u64>,
) -> String {
    let prediction = match &report.prediction {
        Prediction::Risk { risk_score, risk_label } => format!(
            "- Risk Score: {risk_score}\n- Risk Label: {}\n",
            risk_label.as_str()
        ),
        Prediction::Subtypes { subtype_distribution } => format!(
            "- Predicted Subtype Distribution: {}\n",
            to_json(subtype_distribution)
        ),
    };

    let means: String = match task.kind {
        TaskKind::Binary => report
            .feature_means
            .iter()
            .map(|(name, mean)| format!("- Mean {} Expression: {mean:.3}\n", name.to_uppercase()))
            .collect(),
        TaskKind::Multiclass => String::new(),
    };

    format!(
        "Given the following genetic risk analysis data for {subject}:\n\n\
         {prediction}\
         - Disparity Index: {disparity}\n\
         - Fairness Metrics: {fairness}\n\
         - Demographic Distribution: {demographics}\n\
         {means}\
         - Benchmark Accuracy ({cohort}): {benchmark}\n\
         - Medical Guideline: {guideline}\n\
         - Is Biased Dataset: {biased}\n\n\
         {INSTRUCTIONS}",
        subject = task.subject,
        disparity = report.disparity_index,
        fairness = to_json(&report.fairness_metrics),
        demographics = to_json(demographics),
        cohort = task.benchmark_cohort,
        benchmark = task.benchmark_accuracy,
        guideline = task.guideline,
        biased = report.is_biased,
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

pub struct InsightGenerator {
    backend: Option<Arc<dyn LlmBackend>>,
    max_tokens: u32,
    temperature: f32,
}

impl InsightGenerator {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>) -> Self {
        Self { backend, max_tokens: 1000, temperature: 0.7 }
    }

    /// Generator that always answers with the fallback text.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn backend(&self) -> Option<&dyn LlmBackend> {
        self.backend.as_deref()
    }

    /// Insights text for a report, or the fallback on any failure.
    pub async fn generate(
        &self,
        task: &TaskDescriptor,
        report: &ScoreReport,
        demographics: &BTreeMap<String, u64>,
    ) -> String {
        match self.try_generate(task, report, demographics).await {
            Ok(text) => text,
            Err(e) => {
                error!(task = task.name, error = %e, "insight generation failed");
                INSIGHTS_FALLBACK.to_string()
            }
        }
    }

    async fn try_generate(
        &self,
        task: &TaskDescriptor,
        report: &ScoreReport,
        demographics: &BTreeMap<String, u64>,
    ) -> Result<String, LlmError> {
        let Some(backend) = &self.backend else {
            warn!(task = task.name, "no insight backend configured");
            return Err(LlmError::Unavailable("no insight backend configured".to_string()));
        };

        let req = LlmRequest {
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(build_prompt(task, report, demographics)),
            ],
            model: None,
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let started = Instant::now();
        let resp = backend.complete(req).await?;
        let text = resp.content.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let audit = InsightAuditEntry::new(
            task.name,
            resp.model.clone(),
            backend.backend_name().to_string(),
            resp.prompt_tokens,
            resp.completion_tokens,
            report.is_biased,
            text,
            started.elapsed().as_millis() as u64,
        );
        info!(
            audit_id = %audit.id,
            task = %audit.task,
            model = %audit.model,
            backend = %audit.backend,
            prompt_tokens = audit.prompt_tokens,
            completion_tokens = audit.completion_tokens,
            output_hash = %audit.output_hash,
            latency_ms = audit.latency_ms,
            "insights generated"
        );

        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockLlmBackend;
    use oncofair_scorer::{FairnessMetrics, GroupMetrics, RiskLabel};

    fn binary_report(is_biased: bool) -> ScoreReport {
        let mut fairness = FairnessMetrics::new();
        fairness.insert("0".into(), GroupMetrics { accuracy: 1.0, count: 2 });
        fairness.insert("1".into(), GroupMetrics { accuracy: 0.5, count: 2 });
        ScoreReport {
            prediction: Prediction::Risk { risk_score: 0.65, risk_label: RiskLabel::High },
            overall_accuracy: 0.75,
            fairness_metrics: fairness,
            disparity_index: 0.5,
            is_biased,
            feature_means: vec![("brca1".into(), 0.41234), ("brca2".into(), 0.5)],
        }
    }

    fn lung_report() -> ScoreReport {
        let mut dist = BTreeMap::new();
        dist.insert("Adenocarcinoma".to_string(), 3.0);
        ScoreReport {
            prediction: Prediction::Subtypes { subtype_distribution: dist },
            overall_accuracy: 0.6,
            fairness_metrics: FairnessMetrics::new(),
            disparity_index: 0.0,
            is_biased: false,
            feature_means: vec![("EGFR_mutation_status".into(), 0.4)],
        }
    }

    fn demographics() -> BTreeMap<String, u64> {
        let mut d = BTreeMap::new();
        d.insert("White".to_string(), 3);
        d.insert("Asian".to_string(), 1);
        d
    }

    #[test]
    fn test_binary_prompt_contents() {
        let prompt = build_prompt(&TaskDescriptor::her2(), &binary_report(true), &demographics());
        assert!(prompt.starts_with("Given the following genetic risk analysis data for HER2-positive breast cancer:"));
        assert!(prompt.contains("- Risk Score: 0.65"));
        assert!(prompt.contains("- Risk Label: High"));
        assert!(prompt.contains(r#"- Fairness Metrics: {"0":{"accuracy":1.0,"count":2},"1":{"accuracy":0.5,"count":2}}"#));
        assert!(prompt.contains(r#"- Demographic Distribution: {"Asian":1,"White":3}"#));
        assert!(prompt.contains("- Mean BRCA1 Expression: 0.412"));
        assert!(prompt.contains("- Mean BRCA2 Expression: 0.500"));
        assert!(prompt.contains("- Benchmark Accuracy (TCGA-BRCA): 0.85"));
        assert!(prompt.contains("- Is Biased Dataset: true"));
        assert!(prompt.ends_with("mitigation strategies."));
    }

    #[test]
    fn test_binary_prompt_line_order() {
        let prompt = build_prompt(&TaskDescriptor::her2(), &binary_report(false), &demographics());
        let lines: Vec<&str> = prompt
            .lines()
            .filter(|l| l.starts_with("- "))
            .map(|l| l.split(':').next().unwrap_or(""))
            .collect();
        assert_eq!(
            lines,
            vec![
                "- Risk Score",
                "- Risk Label",
                "- Disparity Index",
                "- Fairness Metrics",
                "- Demographic Distribution",
                "- Mean BRCA1 Expression",
                "- Mean BRCA2 Expression",
                "- Benchmark Accuracy (TCGA-BRCA)",
                "- Medical Guideline",
                "- Is Biased Dataset",
            ]
        );
        assert!(prompt.contains("- Is Biased Dataset: false\n\nGenerate **actionable insights"));
    }

    #[test]
    fn test_multiclass_prompt_has_distribution_and_no_means() {
        let prompt = build_prompt(&TaskDescriptor::lung_subtype(), &lung_report(), &BTreeMap::new());
        assert!(prompt.contains("data for lung cancer subtypes:"));
        assert!(prompt.contains(r#"- Predicted Subtype Distribution: {"Adenocarcinoma":3.0}"#));
        assert!(prompt.contains("- Benchmark Accuracy (TCGA-LUAD): 0.82"));
        assert!(!prompt.contains("Risk Score"));
        assert!(!prompt.contains("Mean EGFR"));
    }

    #[tokio::test]
    async fn test_generate_trims_backend_text() {
        let mock = Arc::new(MockLlmBackend::replying("\n  **Summary**\n- item\n "));
        let generator = InsightGenerator::new(Some(mock.clone())).with_sampling(1000, 0.7);
        let text = generator
            .generate(&TaskDescriptor::her2(), &binary_report(false), &demographics())
            .await;
        assert_eq!(text, "**Summary**\n- item");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0], Message::system(SYSTEM_PROMPT));
        assert_eq!(requests[0].max_tokens, Some(1000));
        assert_eq!(requests[0].temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back() {
        let generator = InsightGenerator::new(Some(Arc::new(MockLlmBackend::failing("boom"))));
        let text = generator
            .generate(&TaskDescriptor::her2(), &binary_report(false), &demographics())
            .await;
        assert_eq!(text, INSIGHTS_FALLBACK);
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let generator = InsightGenerator::new(Some(Arc::new(MockLlmBackend::replying("   "))));
        let text = generator
            .generate(&TaskDescriptor::lung_subtype(), &lung_report(), &demographics())
            .await;
        assert_eq!(text, INSIGHTS_FALLBACK);
    }

    #[tokio::test]
    async fn test_disabled_generator_falls_back() {
        let generator = InsightGenerator::disabled();
        assert!(generator.backend().is_none());
        let text = generator
            .generate(&TaskDescriptor::her2(), &binary_report(true), &demographics())
            .await;
        assert_eq!(text, INSIGHTS_FALLBACK);
    }
}
