//! Skill-gap extraction: which configured skills a resume never mentions.
//!
//! Matching is plain case-insensitive substring containment. Multi-word skills are
//! matched as exact phrases, so "pipelines of data" does not satisfy "data pipelines".
//! Reordered or inflected mentions are a known miss.

use std::collections::BTreeSet;

/// Configured set of lower-cased skill tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillVocabulary(BTreeSet<String>);

impl SkillVocabulary {
    /// Lower-cases and trims every entry, dropping blanks and duplicates.
    pub fn new<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            skills
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.0.contains(&skill.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Returns the vocabulary skills absent from `resume_text`, sorted ascending.
pub fn missing_skills(resume_text: &str, vocabulary: &SkillVocabulary) -> Vec<String> {
    let resume_lower = resume_text.to_lowercase();

    // BTreeSet iteration keeps the output sorted and duplicate-free.
    vocabulary
        .iter()
        .filter(|skill| !resume_lower.contains(*skill))
        .map(str::to_string)
        .collect()
}
