//! The three prompting strategies.
//!
//! Each one formats a single completion request and turns the reply into records. A failed
//! call is logged and produces nothing; it never reaches the orchestrator as an error.

use crate::completion::CompletionService;
use crate::parsing::reply_parser::{parse_first_qa_pair, parse_qa_pairs, ParsedPair};
use crate::types::article_data::{QaRecord, SpeakerContext};

const DIRECT_TEMPERATURE: f32 = 0.8;
const DIRECT_MAX_TOKENS: u32 = 1500;
const THEMED_TEMPERATURE: f32 = 0.7;
const THEMED_MAX_TOKENS: u32 = 800;
const SEGMENT_MAX_TOKENS: u32 = 1000;

/// Fixed angles the themed strategy asks about, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    HistoricalContext,
    Methodology,
    Criticism,
    Implications,
    Alternatives,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::HistoricalContext,
        Theme::Methodology,
        Theme::Criticism,
        Theme::Implications,
        Theme::Alternatives,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Theme::HistoricalContext => "historical",
            Theme::Methodology => "methodology",
            Theme::Criticism => "criticism",
            Theme::Implications => "implications",
            Theme::Alternatives => "alternatives",
        }
    }

    pub fn question(&self, speaker: &str) -> String {
        match self {
            Theme::HistoricalContext => format!(
                "What historical context or background does {} provide in this article? Explain in detail.",
                speaker
            ),
            Theme::Methodology => format!(
                "What methodology or analytical approach does {} employ in this analysis? Explain thoroughly.",
                speaker
            ),
            Theme::Criticism => format!(
                "What criticisms or counter-arguments does {} address in this text? Provide a comprehensive answer.",
                speaker
            ),
            Theme::Implications => format!(
                "What broader implications or consequences does {} suggest will result from these events or policies?",
                speaker
            ),
            Theme::Alternatives => format!(
                "What alternatives or solutions does {} propose in this article? Explain fully.",
                speaker
            ),
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn direct_prompt(text: &str, ctx: &SpeakerContext, num_pairs: usize) -> String {
    format!(
        "Based on the following excerpt from {speaker}'s article \"{title}\", generate {n} unique Q&A pairs.\n\n\
         EXCERPT:\n```\n{text}\n```\n\n\
         For each pair:\n\
         1. Ask a specific question about a different aspect of the content\n\
         2. Give a detailed answer (at least 3-5 sentences) drawn directly from the text\n\
         3. Cover a different theme or angle each time (historical context, methodology, criticisms, implications, ...)\n\n\
         Format each pair as:\nQ: [Question]\nA: [Answer]\n\n\
         Generate EXACTLY {n} pairs, separated by blank lines.\n",
        speaker = ctx.speaker,
        title = ctx.article_title,
        n = num_pairs,
        text = text,
    )
}

pub fn themed_prompt(text: &str, ctx: &SpeakerContext, theme: Theme) -> String {
    format!(
        "Based on this excerpt from {speaker}'s article \"{title}\":\n\n```\n{text}\n```\n\n\
         Question: {question}\n\n\
         Write a detailed, comprehensive answer (at least 3-5 sentences) using ONLY information in the text.\n\
         Format your response as:\n\n\
         Q: [Restate the question in your own words]\nA: [Your detailed answer]\n",
        speaker = ctx.speaker,
        title = ctx.article_title,
        text = text,
        question = theme.question(&ctx.speaker),
    )
}

pub fn segment_prompt(segment: &str, ctx: &SpeakerContext, used_questions: &[&str], num_pairs: usize) -> String {
    let used = if used_questions.is_empty() {
        "None yet.".to_string()
    } else {
        used_questions
            .iter()
            .map(|q| format!("- {}", q))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "This is a specific segment from {speaker}'s article \"{title}\":\n\n```\n{segment}\n```\n\n\
         Generate {n} unique Q&A pairs about THIS SPECIFIC SEGMENT that differ from these previously generated questions:\n\
         {used}\n\n\
         Requirements:\n\
         1. Each question must focus on content UNIQUE to this segment\n\
         2. Questions must be specific and detailed\n\
         3. Answers must be comprehensive (3-5 sentences minimum)\n\
         4. Different questions should cover different themes or aspects\n\n\
         Format each pair as:\nQ: [Question]\nA: [Answer]\n",
        speaker = ctx.speaker,
        title = ctx.article_title,
        segment = segment,
        n = num_pairs,
        used = used,
    )
}

fn to_records(ctx: &SpeakerContext, pairs: Vec<ParsedPair>) -> Vec<QaRecord> {
    pairs
        .into_iter()
        .map(|p| ctx.record(&p.question, &p.answer))
        .collect()
}

/// Several pairs from the opening `char_limit` characters of the speaker's text.
pub fn generate_direct(
    service: &dyn CompletionService,
    text: &str,
    ctx: &SpeakerContext,
    num_pairs: usize,
    char_limit: usize,
) -> Vec<QaRecord> {
    let prompt = direct_prompt(truncate_chars(text, char_limit), ctx, num_pairs);
    match service.complete(&prompt, DIRECT_TEMPERATURE, DIRECT_MAX_TOKENS) {
        Ok(reply) => {
            let records = to_records(ctx, parse_qa_pairs(&reply));
            tracing::debug!(speaker = %ctx.speaker, reply_chars = reply.len(), parsed = records.len(), "direct reply parsed");
            records
        }
        Err(e) => {
            tracing::warn!(strategy = "direct", speaker = %ctx.speaker, error = %e, "completion call failed");
            Vec::new()
        }
    }
}

/// At most one pair answering the theme question.
pub fn generate_themed(
    service: &dyn CompletionService,
    text: &str,
    ctx: &SpeakerContext,
    theme: Theme,
    char_limit: usize,
) -> Option<QaRecord> {
    let prompt = themed_prompt(truncate_chars(text, char_limit), ctx, theme);
    match service.complete(&prompt, THEMED_TEMPERATURE, THEMED_MAX_TOKENS) {
        Ok(reply) => parse_first_qa_pair(&reply).map(|p| ctx.record(&p.question, &p.answer)),
        Err(e) => {
            tracing::warn!(strategy = "themed", theme = theme.label(), speaker = %ctx.speaker, error = %e, "completion call failed");
            None
        }
    }
}

/// Pairs unique to one segment, steered away from `used_questions`.
pub fn generate_segment(
    service: &dyn CompletionService,
    segment: &str,
    ctx: &SpeakerContext,
    used_questions: &[&str],
    temperature: f32,
    num_pairs: usize,
) -> Vec<QaRecord> {
    let prompt = segment_prompt(segment, ctx, used_questions, num_pairs);
    match service.complete(&prompt, temperature, SEGMENT_MAX_TOKENS) {
        Ok(reply) => to_records(ctx, parse_qa_pairs(&reply)),
        Err(e) => {
            tracing::warn!(strategy = "segment", speaker = %ctx.speaker, error = %e, "completion call failed");
            Vec::new()
        }
    }
}
