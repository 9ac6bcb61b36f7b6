use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::scoring::skills::SkillVocabulary;
use crate::scoring::verdict::VerdictPolicy;

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Skills checked when neither `SKILL_VOCABULARY` nor `SKILL_VOCABULARY_FILE` is set.
const DEFAULT_SKILLS: &[&str] = &[
    "python",
    "java",
    "sql",
    "spark",
    "aws",
    "docker",
    "kubernetes",
    "git",
    "linux",
    "machine learning",
    "deep learning",
    "data pipelines",
    "pandas",
    "tableau",
    "rest api",
];

/// Which embedding backend `ModelHandles::init` should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Bert,
    Stub,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bert" => Ok(Self::Bert),
            "stub" => Ok(Self::Stub),
            other => bail!("unknown embedding backend '{other}' (expected 'bert' or 'stub')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails on malformed values; optional integrations degrade when unset.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset disables persistence: every response carries `job_id: null`.
    pub database_url: Option<String>,
    /// Unset makes every feedback field the fallback string.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub feedback_timeout: Duration,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_model: String,
    pub embedding_model_dir: Option<PathBuf>,
    pub embedding_max_seq_len: usize,
    pub vocabulary: SkillVocabulary,
    pub verdict_policy: VerdictPolicy,
    pub batch_concurrency: usize,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let vocabulary = match get("SKILL_VOCABULARY_FILE") {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read skill vocabulary file '{path}'"))?;
                SkillVocabulary::new(content.lines())
            }
            None => match get("SKILL_VOCABULARY") {
                Some(list) => SkillVocabulary::new(list.split(',')),
                None => SkillVocabulary::new(DEFAULT_SKILLS.iter().copied()),
            },
        };

        let verdict_policy = VerdictPolicy::new(
            parse_or(&get, "VERDICT_HIGH_THRESHOLD", VerdictPolicy::DEFAULT_HIGH)?,
            parse_or(&get, "VERDICT_MEDIUM_THRESHOLD", VerdictPolicy::DEFAULT_MEDIUM)?,
        )
        .context("Invalid verdict thresholds")?;

        let batch_concurrency: usize = parse_or(&get, "BATCH_CONCURRENCY", 4)?;
        if batch_concurrency == 0 {
            bail!("BATCH_CONCURRENCY must be at least 1");
        }

        let max_upload_mb: usize = parse_or(&get, "MAX_UPLOAD_MB", 20)?;

        Ok(Config {
            database_url: get("DATABASE_URL"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            feedback_timeout: Duration::from_secs(parse_or(&get, "FEEDBACK_TIMEOUT_SECS", 60)?),
            embedding_backend: parse_or(&get, "EMBEDDING_BACKEND", EmbeddingBackend::Bert)?,
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_model_dir: get("EMBEDDING_MODEL_DIR").map(PathBuf::from),
            embedding_max_seq_len: parse_or(&get, "EMBEDDING_MAX_SEQ_LEN", 256)?,
            vocabulary,
            verdict_policy,
            batch_concurrency,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}
