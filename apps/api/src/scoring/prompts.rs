// Prompts used by the narrative feedback step.

pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"You are an expert assistant for a resume screening system. Your sole task is to provide a concise, 1-2 sentence professional feedback summary for a recruiter after analyzing a resume against a job description.

CRITICAL INSTRUCTIONS:
- Provide only the feedback text.
- Do NOT add any introductory text, conversational remarks, or any other content.

Job Description:
---
{jd_text}
---

Resume:
---
{resume_text}
---
"#;

/// Fills the template placeholders only; braces inside the documents are left alone.
pub fn render_feedback_prompt(resume_text: &str, jd_text: &str) -> String {
    FEEDBACK_PROMPT_TEMPLATE
        .split("{resume_text}")
        .map(|part| part.replace("{jd_text}", jd_text))
        .collect::<Vec<_>>()
        .join(resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_places_both_documents() {
        let prompt = render_feedback_prompt("RESUME BODY", "JD BODY");
        let jd_at = prompt.find("JD BODY").unwrap();
        let resume_at = prompt.find("RESUME BODY").unwrap();
        assert!(jd_at < resume_at);
        assert!(!prompt.contains("{jd_text}"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_placeholders_inside_documents_are_not_expanded() {
        let prompt = render_feedback_prompt("uses {jd_text} literally", "mentions {resume_text}");
        assert!(prompt.contains("uses {jd_text} literally"));
        assert!(prompt.contains("mentions {resume_text}"));
    }
}
