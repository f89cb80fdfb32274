use crate::document::DocumentFormat;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "archive_qa.toml";

/// Allow-list entry selecting every speaker that is not in `named_speakers`.
pub const ALL_OTHER_SPEAKERS: &str = "All other speakers";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub archive: ArchiveConfig,
    pub filters: FilterConfig,
    pub parser: ParserConfig,
    pub completion: CompletionConfig,
    pub generation: GenerationSettings,
    pub output: OutputConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Listing page the article links are discovered from.
    pub index_url: String,
    pub article_limit: usize,
    pub request_timeout_secs: u64,
    pub index_timeout_secs: u64,
    /// Pause before each article request.
    pub request_delay_ms: u64,
    pub user_agent: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            index_url: "https://chomsky.info/articles/".to_string(),
            article_limit: 3,
            request_timeout_secs: 15,
            index_timeout_secs: 10,
            request_delay_ms: 1000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct FilterConfig {
    /// Articles with more than one distinct speaker.
    pub include_interviews: bool,
    /// Articles with exactly one speaker.
    pub include_solo_articles: bool,
    /// Speakers to generate for. May contain [`ALL_OTHER_SPEAKERS`].
    pub speakers: Vec<String>,
    /// Speakers the sentinel does not cover.
    pub named_speakers: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            include_interviews: true,
            include_solo_articles: true,
            speakers: vec!["Noam Chomsky".to_string()],
            named_speakers: vec!["Noam Chomsky".to_string(), "Vijay Prashad".to_string()],
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SpeakerPattern {
    pub name: String,
    /// Regexes matching a speaker prefix such as `NC:`.
    pub patterns: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ParserConfig {
    /// Speaker of solo articles and of untagged text before the first turn.
    pub default_speaker: String,
    pub speakers: Vec<SpeakerPattern>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let pattern = |name: &str, patterns: &[&str]| SpeakerPattern {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        };
        ParserConfig {
            default_speaker: "Noam Chomsky".to_string(),
            speakers: vec![
                pattern(
                    "Noam Chomsky",
                    &[
                        r"(?:^|\W)(?:Chomsky|NC|Noam):",
                        r"(?:^|\W)Noam Chomsky:",
                        r"(?:^|\W)Professor Chomsky:",
                    ],
                ),
                pattern(
                    "Vijay Prashad",
                    &[r"(?:^|\W)(?:Vijay|VP|Prashad):", r"(?:^|\W)Vijay Prashad:"],
                ),
                pattern(
                    "Interviewer",
                    &[
                        r"(?:^|\W)(?:Question|Q|Interviewer):",
                        r"(?:^|\W)(?:Journalist|Reporter|Host):",
                    ],
                ),
            ],
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct CompletionConfig {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub top_p: Option<f32>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        CompletionConfig {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama3-70b-8192".to_string(),
            api_key: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 30,
            top_p: Some(0.95),
        }
    }
}

/// Knobs of one orchestrator run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationSettings {
    /// Accepted records per (article, speaker).
    pub target_count: usize,
    /// Reject a question scoring above this against any accepted question.
    pub question_similarity_threshold: f64,
    /// Segment stage only: reject an answer scoring above this against any accepted answer.
    pub answer_similarity_threshold: f64,
    pub min_segment_words: usize,
    pub max_segment_words: usize,
    /// Segments shorter than this are not sent to the model.
    pub min_generation_segment_words: usize,
    pub direct_pairs: usize,
    pub segment_pairs: usize,
    pub direct_char_limit: usize,
    pub themed_char_limit: usize,
    pub base_temperature: f32,
    pub temperature_step: f32,
    pub max_temperature: f32,
    /// How many used questions the segment prompt shows the model.
    pub used_question_sample: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            target_count: 10,
            question_similarity_threshold: 0.4,
            answer_similarity_threshold: 0.6,
            min_segment_words: 150,
            max_segment_words: 600,
            min_generation_segment_words: 100,
            direct_pairs: 5,
            segment_pairs: 2,
            direct_char_limit: 4000,
            themed_char_limit: 3000,
            base_temperature: 0.7,
            temperature_step: 0.05,
            max_temperature: 0.9,
            used_question_sample: 5,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub format: DocumentFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            path: PathBuf::from("archive_qa.pdf"),
            format: DocumentFormat::Pdf,
        }
    }
}

impl Config {
    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };
        let g = &self.generation;

        if self.archive.article_limit < 1 {
            return invalid("archive.article_limit must be at least 1".to_string());
        }
        if g.target_count < 1 {
            return invalid("generation.target_count must be at least 1".to_string());
        }
        for (name, value) in [
            ("question_similarity_threshold", g.question_similarity_threshold),
            ("answer_similarity_threshold", g.answer_similarity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("generation.{} must be within [0, 1], got {}", name, value));
            }
        }
        for (name, value) in [
            ("direct_pairs", g.direct_pairs),
            ("segment_pairs", g.segment_pairs),
            ("used_question_sample", g.used_question_sample),
        ] {
            if value < 1 {
                return invalid(format!("generation.{} must be at least 1", name));
            }
        }
        if g.base_temperature > g.max_temperature {
            return invalid(format!(
                "generation.base_temperature ({}) exceeds max_temperature ({})",
                g.base_temperature, g.max_temperature
            ));
        }
        if g.min_segment_words > g.max_segment_words {
            return invalid(format!(
                "generation.min_segment_words ({}) exceeds max_segment_words ({})",
                g.min_segment_words, g.max_segment_words
            ));
        }
        if self.parser.default_speaker.trim().is_empty() {
            return invalid("parser.default_speaker must not be empty".to_string());
        }
        Ok(())
    }
}

pub fn load_config_from_file(file_path: &Path) -> Result<Config, ConfigError> {
    match fs::read_to_string(file_path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(loaded_config) => {
                loaded_config.validate()?;
                Ok(loaded_config)
            }
            Err(e) => Err(ConfigError::Parse {
                path: file_path.to_path_buf(),
                source: e,
            }),
        },
        Err(e) => Err(ConfigError::Read {
            path: file_path.to_path_buf(),
            source: e,
        }),
    }
}

/// Explicit paths must exist; the default file is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => load_config_from_file(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.is_file() {
                load_config_from_file(default_path)
            } else {
                tracing::debug!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                Ok(Config::default())
            }
        }
    }
}
