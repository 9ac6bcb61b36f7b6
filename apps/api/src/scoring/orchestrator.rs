//! Per-resume scoring: fuses similarity, skill gap and feedback into one result.
//!
//! Flow: parse check → (similarity ‖ feedback) → score → verdict → skill gap.
//! Each signal degrades on its own; only unreadable documents short-circuit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::scoring::feedback::{FeedbackGenerator, FEEDBACK_FALLBACK};
use crate::scoring::similarity::{Signal, SimilarityEstimator};
use crate::scoring::skills::{missing_skills, SkillVocabulary};
use crate::scoring::verdict::{Verdict, VerdictPolicy};

pub const PARSE_FAILURE_FEEDBACK: &str = "Could not parse one or both documents.";

/// An uploaded document after text extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    /// `None` when extraction failed or the format is unsupported.
    pub raw_text: Option<String>,
}

impl Document {
    pub fn parsed(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            raw_text: Some(text.into()),
        }
    }

    pub fn unreadable(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            raw_text: None,
        }
    }

    /// Usable text, treating whitespace-only content as unreadable.
    pub fn text(&self) -> Option<&str> {
        self.raw_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// Scored outcome for one resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_name: String,
    pub relevance_score: u8, // 0 – 100
    pub verdict: Verdict,
    pub missing_skills: Vec<String>,
    pub feedback: String,
}

impl AnalysisResult {
    pub fn parse_failure(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            relevance_score: 0,
            verdict: Verdict::Error,
            missing_skills: vec![],
            feedback: PARSE_FAILURE_FEEDBACK.to_string(),
        }
    }
}

/// Rounded percentage of the signal, with `Unavailable` counted as 0.
pub fn relevance_score(signal: Signal) -> u8 {
    (signal.or_zero() * 100.0).round().clamp(0.0, 100.0) as u8
}

/// The scoring hub. Holds only shared read-only handles, so one instance serves
/// concurrent analyses.
pub struct ResumeScorer {
    similarity: SimilarityEstimator,
    feedback: Arc<dyn FeedbackGenerator>,
    policy: VerdictPolicy,
}

impl ResumeScorer {
    pub fn new(
        similarity: SimilarityEstimator,
        feedback: Arc<dyn FeedbackGenerator>,
        policy: VerdictPolicy,
    ) -> Self {
        Self {
            similarity,
            feedback,
            policy,
        }
    }

    pub async fn analyze(
        &self,
        resume: &Document,
        jd: &Document,
        vocabulary: &SkillVocabulary,
    ) -> AnalysisResult {
        let (Some(resume_text), Some(jd_text)) = (resume.text(), jd.text()) else {
            warn!(
                file_name = %resume.filename,
                jd_file_name = %jd.filename,
                resume_parsed = resume.text().is_some(),
                jd_parsed = jd.text().is_some(),
                "Skipping analysis: document could not be parsed"
            );
            return AnalysisResult::parse_failure(&resume.filename);
        };

        // Feedback runs alongside similarity; a slow model only delays its own field.
        let (signal, feedback) = tokio::join!(
            self.similarity.similarity(resume_text, jd_text),
            self.feedback.feedback(resume_text, jd_text),
        );

        if !signal.is_available() {
            warn!(file_name = %resume.filename, "Similarity unavailable; scoring as 0");
        }

        let relevance_score = relevance_score(signal);
        let verdict = self.policy.tier(relevance_score);
        let missing_skills = missing_skills(resume_text, vocabulary);

        let feedback = if feedback.trim().is_empty() {
            FEEDBACK_FALLBACK.to_string()
        } else {
            feedback
        };

        debug!(
            file_name = %resume.filename,
            relevance_score,
            verdict = verdict.as_str(),
            missing = missing_skills.len(),
            "Resume analyzed"
        );

        AnalysisResult {
            file_name: resume.filename.clone(),
            relevance_score,
            verdict,
            missing_skills,
            feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::{FailingEmbedder, FixedEmbedder};
    use crate::embedding::{Embedder, StubEmbedder};
    use crate::scoring::feedback::UnavailableFeedback;
    use async_trait::async_trait;
    use std::time::Duration;

    struct EchoFeedback;

    #[async_trait]
    impl FeedbackGenerator for EchoFeedback {
        async fn feedback(&self, resume_text: &str, _jd_text: &str) -> String {
            format!("Reviewed {} chars.", resume_text.len())
        }
    }

    struct SlowFeedback(Duration);

    #[async_trait]
    impl FeedbackGenerator for SlowFeedback {
        async fn feedback(&self, _resume_text: &str, _jd_text: &str) -> String {
            match tokio::time::timeout(Duration::from_secs(1), tokio::time::sleep(self.0)).await {
                Ok(()) => "late".to_string(),
                Err(_) => FEEDBACK_FALLBACK.to_string(),
            }
        }
    }

    struct BlankFeedback;

    #[async_trait]
    impl FeedbackGenerator for BlankFeedback {
        async fn feedback(&self, _resume_text: &str, _jd_text: &str) -> String {
            "  ".to_string()
        }
    }

    fn scorer_with(
        embedder: impl Embedder + 'static,
        feedback: impl FeedbackGenerator + 'static,
    ) -> ResumeScorer {
        ResumeScorer::new(
            SimilarityEstimator::new(Arc::new(embedder)),
            Arc::new(feedback),
            VerdictPolicy::default(),
        )
    }

    fn vocabulary() -> SkillVocabulary {
        SkillVocabulary::new(["python", "spark", "sql"])
    }

    #[test]
    fn test_relevance_score_rounding() {
        assert_eq!(relevance_score(Signal::Value(0.8)), 80);
        assert_eq!(relevance_score(Signal::Value(0.745)), 75);
        assert_eq!(relevance_score(Signal::Value(0.494)), 49);
        assert_eq!(relevance_score(Signal::Value(1.0)), 100);
        assert_eq!(relevance_score(Signal::Value(0.0)), 0);
        assert_eq!(relevance_score(Signal::Unavailable), 0);
    }

    #[test]
    fn test_relevance_score_clamps_out_of_range() {
        assert_eq!(relevance_score(Signal::Value(1.7)), 100);
        assert_eq!(relevance_score(Signal::Value(-0.3)), 0);
    }

    #[test]
    fn test_blank_text_counts_as_unreadable() {
        assert_eq!(Document::parsed("a.pdf", " \n\t").text(), None);
        assert_eq!(Document::unreadable("a.pdf").text(), None);
        assert_eq!(Document::parsed("a.pdf", "text").text(), Some("text"));
    }

    #[tokio::test]
    async fn test_similarity_point_eight_is_high() {
        let embedder = FixedEmbedder::new(
            &[
                ("python and sql", vec![0.8, 0.6]),
                ("need python spark sql", vec![1.0, 0.0]),
            ],
            vec![0.0, 1.0],
        );
        let scorer = scorer_with(embedder, EchoFeedback);

        let result = scorer
            .analyze(
                &Document::parsed("cv.pdf", "python and sql"),
                &Document::parsed("jd.pdf", "need python spark sql"),
                &vocabulary(),
            )
            .await;

        assert_eq!(result.file_name, "cv.pdf");
        assert_eq!(result.relevance_score, 80);
        assert_eq!(result.verdict, Verdict::High);
        assert_eq!(result.missing_skills, vec!["spark"]);
        assert_eq!(result.feedback, "Reviewed 14 chars.");
    }

    #[tokio::test]
    async fn test_unparsed_resume_is_exact_error_result() {
        let scorer = scorer_with(StubEmbedder::default(), EchoFeedback);
        let result = scorer
            .analyze(
                &Document::unreadable("cv.exe"),
                &Document::parsed("jd.pdf", "python"),
                &vocabulary(),
            )
            .await;

        assert_eq!(
            result,
            AnalysisResult {
                file_name: "cv.exe".to_string(),
                relevance_score: 0,
                verdict: Verdict::Error,
                missing_skills: vec![],
                feedback: "Could not parse one or both documents.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unparsed_jd_is_error_result() {
        let scorer = scorer_with(StubEmbedder::default(), EchoFeedback);
        let result = scorer
            .analyze(
                &Document::parsed("cv.pdf", "python"),
                &Document::unreadable("jd.doc"),
                &vocabulary(),
            )
            .await;
        assert_eq!(result, AnalysisResult::parse_failure("cv.pdf"));
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_zero_low() {
        let embedder = FailingEmbedder {
            inner: StubEmbedder::default(),
            trigger: "python",
            panic: false,
        };
        let scorer = scorer_with(embedder, EchoFeedback);

        let result = scorer
            .analyze(
                &Document::parsed("cv.pdf", "python developer"),
                &Document::parsed("jd.pdf", "python developer"),
                &vocabulary(),
            )
            .await;

        assert_eq!(result.relevance_score, 0);
        assert_eq!(result.verdict, Verdict::Low);
        // Skill extraction does not depend on the similarity outcome.
        assert_eq!(result.missing_skills, vec!["spark", "sql"]);
        assert_eq!(result.feedback, "Reviewed 16 chars.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_timeout_only_affects_feedback() {
        let embedder = FixedEmbedder::new(&[], vec![1.0, 0.0]);
        let scorer = scorer_with(embedder, SlowFeedback(Duration::from_secs(30)));

        let result = scorer
            .analyze(
                &Document::parsed("cv.pdf", "python sql spark"),
                &Document::parsed("jd.pdf", "python sql spark"),
                &vocabulary(),
            )
            .await;

        assert_eq!(result.feedback, FEEDBACK_FALLBACK);
        assert_eq!(result.relevance_score, 100);
        assert_eq!(result.verdict, Verdict::High);
        assert!(result.missing_skills.is_empty());
    }

    #[tokio::test]
    async fn test_blank_feedback_is_replaced_with_fallback() {
        let scorer = scorer_with(StubEmbedder::default(), BlankFeedback);
        let result = scorer
            .analyze(
                &Document::parsed("cv.pdf", "python"),
                &Document::parsed("jd.pdf", "python"),
                &vocabulary(),
            )
            .await;
        assert_eq!(result.feedback, FEEDBACK_FALLBACK);
    }

    #[tokio::test]
    async fn test_analyze_is_idempotent_with_deterministic_embedder() {
        let scorer = scorer_with(StubEmbedder::default(), UnavailableFeedback);
        let resume = Document::parsed("cv.pdf", "Data engineer: Python, Airflow, SQL warehouses");
        let jd = Document::parsed("jd.pdf", "Hiring a data engineer with Python, Spark and SQL");

        let first = scorer.analyze(&resume, &jd, &vocabulary()).await;
        let second = scorer.analyze(&resume, &jd, &vocabulary()).await;

        assert_eq!(first.relevance_score, second.relevance_score);
        assert_eq!(first.verdict, second.verdict);
        assert_eq!(first.missing_skills, second.missing_skills);
        assert!(!first.feedback.is_empty());
        assert!(first.relevance_score <= 100);
        assert_eq!(first.verdict, VerdictPolicy::default().tier(first.relevance_score));
    }
}
