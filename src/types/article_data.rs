//*** START FILE: src/types/article_data.rs ***//
use serde::{Deserialize, Serialize};

/// Title, date, content block and source of one fetched article page.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ArticleContent {
    pub title: String,
    pub date: String,
    /// Visible text of the content block, one text run per line.
    pub text: String,
    /// Outer HTML of the content block, handed to the dialogue parser.
    pub html: String,
    pub url: String,
}

/// One speaker-attributed block of article text.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub speaker: String,
    pub content: String,
    pub article_title: String,
    pub article_date: String,
    pub article_url: String,
}

/// Who said it and where, copied onto every record generated from an article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakerContext {
    pub speaker: String,
    pub article_title: String,
    pub article_date: String,
    pub article_url: String,
}

impl SpeakerContext {
    pub fn from_paragraph(paragraph: &Paragraph) -> Self {
        SpeakerContext {
            speaker: paragraph.speaker.clone(),
            article_title: paragraph.article_title.clone(),
            article_date: paragraph.article_date.clone(),
            article_url: paragraph.article_url.clone(),
        }
    }

    pub fn record(&self, question: &str, answer: &str) -> QaRecord {
        QaRecord {
            question: question.to_string(),
            answer: answer.to_string(),
            speaker: self.speaker.clone(),
            article_title: self.article_title.clone(),
            article_date: self.article_date.clone(),
            article_url: self.article_url.clone(),
        }
    }
}

/// One generated question/answer pair tied to a speaker and article.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
    pub speaker: String,
    pub article_title: String,
    pub article_date: String,
    pub article_url: String,
}
//*** END FILE: src/types/article_data.rs ***//
