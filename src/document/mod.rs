//! Rendering accepted records into an output document.
//!
//! Every format sees the same grouping: one section per article (keyed by title and date,
//! in first-seen order) holding that article's records in the order they were accepted.

pub mod markdown;
pub mod pdf;

use crate::error::DocumentError;
use crate::records_io::save_records;
use crate::types::article_data::QaRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use markdown::MarkdownDocument;
pub use pdf::PdfDocument;

pub const DOCUMENT_TITLE: &str = "Archive Q&A Analysis";

/// Single answer paragraphs longer than this are broken at sentence ends.
const LONG_PARAGRAPH_CHARS: usize = 1000;

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence end regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Markdown,
    Json,
}

impl DocumentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Markdown => "md",
            DocumentFormat::Json => "json",
        }
    }
}

/// Writes a collection of records to `path`.
pub trait DocumentBuilder {
    fn build(&self, records: &[QaRecord], path: &Path) -> Result<(), DocumentError>;
}

/// Plain JSON dump, readable again by the `render` command.
pub struct JsonDocument;

impl DocumentBuilder for JsonDocument {
    fn build(&self, records: &[QaRecord], path: &Path) -> Result<(), DocumentError> {
        if records.is_empty() {
            return Err(DocumentError::Empty);
        }
        save_records(records, path)
    }
}

pub fn builder_for(format: DocumentFormat) -> Box<dyn DocumentBuilder> {
    match format {
        DocumentFormat::Pdf => Box::new(PdfDocument::default()),
        DocumentFormat::Markdown => Box::new(MarkdownDocument),
        DocumentFormat::Json => Box::new(JsonDocument),
    }
}

/// One article's records.
#[derive(Debug)]
pub struct ArticleSection<'a> {
    pub title: &'a str,
    pub date: &'a str,
    pub url: &'a str,
    pub records: Vec<&'a QaRecord>,
}

pub fn group_by_article(records: &[QaRecord]) -> Vec<ArticleSection<'_>> {
    let mut sections: Vec<ArticleSection<'_>> = Vec::new();
    for record in records {
        let existing = sections
            .iter_mut()
            .find(|s| s.title == record.article_title && s.date == record.article_date);
        match existing {
            Some(section) => section.records.push(record),
            None => sections.push(ArticleSection {
                title: &record.article_title,
                date: &record.article_date,
                url: &record.article_url,
                records: vec![record],
            }),
        }
    }
    sections
}

/// ASCII rendition of `text`: typographic dashes, quotes and ellipses are spelled out and
/// any other non-ASCII character is dropped.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2014}' | '\u{2013}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            c if c.is_ascii() => out.push(c),
            _ => {}
        }
    }
    out
}

/// Answer paragraphs for display. A single very long paragraph is regrouped into chunks of
/// whole sentences.
pub fn answer_paragraphs(answer: &str) -> Vec<String> {
    let paragraphs: Vec<&str> = answer.split("\n\n").map(str::trim).filter(|p| !p.is_empty()).collect();
    if paragraphs.len() != 1 || paragraphs[0].chars().count() <= LONG_PARAGRAPH_CHARS {
        return paragraphs.into_iter().map(String::from).collect();
    }

    let text = paragraphs[0];
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in sentences {
        if current.chars().count() + sentence.chars().count() < LONG_PARAGRAPH_CHARS {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(sentence);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Greedy word wrap at `width` columns. Whitespace runs collapse; words longer than a line
/// are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let split = word.char_indices().nth(width).map_or(word.len(), |(i, _)| i);
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        let needed = line.chars().count() + 1 + word.chars().count();
        if needed > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
