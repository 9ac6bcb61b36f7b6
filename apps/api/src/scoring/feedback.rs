//! Narrative feedback: a short recruiter-facing summary from the generative model.
//!
//! Best-effort. Every failure path (timeout, HTTP error, empty or malformed output)
//! collapses to [`FEEDBACK_FALLBACK`], so this step can never fail an analysis.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm_client::prompts::PLAIN_TEXT_SYSTEM;
use crate::llm_client::{strip_json_fences, LlmClient};
use crate::scoring::prompts::render_feedback_prompt;

pub const FEEDBACK_FALLBACK: &str = "Failed to get a response from the AI service.";

#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    /// Never empty: implementations return [`FEEDBACK_FALLBACK`] on any failure.
    async fn feedback(&self, resume_text: &str, jd_text: &str) -> String;
}

/// Feedback backed by the shared [`LlmClient`], bounded by `timeout`.
pub struct LlmFeedback {
    llm: LlmClient,
    timeout: Duration,
}

impl LlmFeedback {
    pub fn new(llm: LlmClient, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

#[async_trait]
impl FeedbackGenerator for LlmFeedback {
    async fn feedback(&self, resume_text: &str, jd_text: &str) -> String {
        let prompt = render_feedback_prompt(resume_text, jd_text);

        let raw = match tokio::time::timeout(
            self.timeout,
            self.llm.generate(&prompt, PLAIN_TEXT_SYSTEM),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, model = self.llm.model(), "Feedback generation failed");
                return FEEDBACK_FALLBACK.to_string();
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Feedback generation timed out"
                );
                return FEEDBACK_FALLBACK.to_string();
            }
        };

        parse_feedback(&raw).unwrap_or_else(|| {
            warn!(output_len = raw.len(), "Feedback output was malformed");
            FEEDBACK_FALLBACK.to_string()
        })
    }
}

/// Used when no generative backend is configured.
pub struct UnavailableFeedback;

#[async_trait]
impl FeedbackGenerator for UnavailableFeedback {
    async fn feedback(&self, _resume_text: &str, _jd_text: &str) -> String {
        FEEDBACK_FALLBACK.to_string()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredFeedback {
    feedback: String,
}

/// Turns raw model output into feedback text.
///
/// When the output contains a `{`..`}` span (first `{` to last `}`) that parses strictly
/// as `{"feedback": "..."}`, that field is used, even after a preamble. Output that
/// starts with `{` but does not parse is rejected. Anything else is prose, returned
/// trimmed. A blank result is `None`.
pub fn parse_feedback(raw: &str) -> Option<String> {
    let text = strip_json_fences(raw);

    let feedback = match structured_feedback(text) {
        Some(parsed) => {
            debug!("Extracted structured feedback");
            parsed.feedback.trim().to_string()
        }
        None if text.starts_with('{') => return None,
        None => text.to_string(),
    };

    (!feedback.is_empty()).then_some(feedback)
}

fn structured_feedback(text: &str) -> Option<StructuredFeedback> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}
