use super::{answer_paragraphs, group_by_article, DocumentBuilder, DOCUMENT_TITLE};
use crate::error::DocumentError;
use crate::types::article_data::QaRecord;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub struct MarkdownDocument;

impl MarkdownDocument {
    pub fn render(&self, records: &[QaRecord]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", DOCUMENT_TITLE);

        for section in group_by_article(records) {
            let _ = writeln!(out, "## {}\n", section.title);
            let _ = writeln!(out, "*Date: {}*  ", section.date);
            let _ = writeln!(out, "Source: <{}>\n", section.url);

            for record in &section.records {
                let _ = writeln!(out, "**Q: {}**\n", record.question.trim());
                let _ = writeln!(out, "**{}:**\n", record.speaker);
                for paragraph in answer_paragraphs(&record.answer) {
                    let _ = writeln!(out, "{}\n", paragraph);
                }
                out.push_str("---\n\n");
            }
        }
        out
    }
}

impl DocumentBuilder for MarkdownDocument {
    fn build(&self, records: &[QaRecord], path: &Path) -> Result<(), DocumentError> {
        if records.is_empty() {
            return Err(DocumentError::Empty);
        }
        fs::write(path, self.render(records))?;
        tracing::info!(path = %path.display(), records = records.len(), "wrote markdown document");
        Ok(())
    }
}
