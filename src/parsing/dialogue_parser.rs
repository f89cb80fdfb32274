//*** START FILE: src/parsing/dialogue_parser.rs ***//
//! Speaker attribution for article content blocks.
//!
//! Blocks (`p`, `h2`, `h3`, `h4`) are read in document order. A block opening with a known
//! speaker prefix such as `NC:` switches the current speaker and loses the prefix. Articles
//! in which no prefix occurs at all are solo pieces and belong to the default speaker.
use crate::config::ParserConfig;
use crate::error::ConfigError;
use crate::types::article_data::{ArticleContent, Paragraph};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static BLOCKS: Lazy<Selector> = Lazy::new(|| Selector::parse("p, h2, h3, h4").expect("block selector"));

/// Turns a fetched article into speaker-attributed paragraphs.
pub trait DialogueParser {
    fn parse(&self, article: &ArticleContent) -> Vec<Paragraph>;
}

struct SpeakerMatcher {
    name: String,
    patterns: Vec<Regex>,
}

pub struct HtmlDialogueParser {
    default_speaker: String,
    speakers: Vec<SpeakerMatcher>,
}

fn block_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

impl HtmlDialogueParser {
    /// Compiles the speaker catalog. A bad pattern is a configuration error.
    pub fn new(config: &ParserConfig) -> Result<Self, ConfigError> {
        let mut speakers = Vec::with_capacity(config.speakers.len());
        for speaker in &config.speakers {
            let mut patterns = Vec::with_capacity(speaker.patterns.len());
            for pattern in &speaker.patterns {
                let re = Regex::new(pattern).map_err(|e| {
                    ConfigError::Invalid(format!("speaker pattern {:?} for {}: {}", pattern, speaker.name, e))
                })?;
                patterns.push(re);
            }
            speakers.push(SpeakerMatcher {
                name: speaker.name.clone(),
                patterns,
            });
        }
        Ok(HtmlDialogueParser {
            default_speaker: config.default_speaker.clone(),
            speakers,
        })
    }

    pub fn is_interview(&self, text: &str) -> bool {
        self.speakers
            .iter()
            .flat_map(|s| s.patterns.iter())
            .any(|re| re.is_match(text))
    }

    /// First catalog entry whose pattern matches, with that prefix removed from `text`.
    fn detect_speaker(&self, text: &str) -> Option<(&str, String)> {
        for speaker in &self.speakers {
            for re in &speaker.patterns {
                if re.is_match(text) {
                    let stripped = re.replacen(text, 1, "").trim().to_string();
                    return Some((speaker.name.as_str(), stripped));
                }
            }
        }
        None
    }

    fn paragraph(&self, article: &ArticleContent, speaker: &str, content: String) -> Paragraph {
        Paragraph {
            speaker: speaker.to_string(),
            content,
            article_title: article.title.clone(),
            article_date: article.date.clone(),
            article_url: article.url.clone(),
        }
    }
}

impl DialogueParser for HtmlDialogueParser {
    fn parse(&self, article: &ArticleContent) -> Vec<Paragraph> {
        let fragment = Html::parse_fragment(&article.html);
        let blocks: Vec<String> = fragment
            .select(&BLOCKS)
            .map(block_text)
            .filter(|t| !t.is_empty())
            .collect();

        let interview = self.is_interview(&blocks.join(" "));
        let mut current = self.default_speaker.as_str();
        let mut paragraphs = Vec::with_capacity(blocks.len());

        for text in blocks {
            let content = match self.detect_speaker(&text) {
                Some((speaker, stripped)) => {
                    current = speaker;
                    stripped
                }
                None => {
                    if !interview {
                        current = self.default_speaker.as_str();
                    }
                    text
                }
            };
            if content.is_empty() {
                continue;
            }
            paragraphs.push(self.paragraph(article, current, content));
        }

        if paragraphs.is_empty() {
            let text = article.text.trim();
            if !text.is_empty() {
                tracing::debug!(url = %article.url, "no content blocks, using whole article text");
                paragraphs.push(self.paragraph(article, &self.default_speaker, text.to_string()));
            }
        }

        tracing::debug!(url = %article.url, interview, paragraphs = paragraphs.len(), "parsed dialogue");
        paragraphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeakerPattern;

    fn parser() -> HtmlDialogueParser {
        HtmlDialogueParser::new(&ParserConfig::default()).unwrap()
    }

    fn article(html: &str, text: &str) -> ArticleContent {
        ArticleContent {
            title: "Interview on Empire".to_string(),
            date: "2021-03-04".to_string(),
            text: text.to_string(),
            html: html.to_string(),
            url: "https://chomsky.info/20210304/".to_string(),
        }
    }

    #[test]
    fn interview_turns_are_attributed_and_prefixes_removed() {
        let html = r#"<div class="post-content">
            <p>Interviewer: What is the state of the empire?</p>
            <p>Chomsky: Declining, in some respects.</p>
            <p>But still dominant militarily.</p>
            <h3>VP: I would add the economic dimension.</h3>
        </div>"#;
        let paragraphs = parser().parse(&article(html, ""));

        let turns: Vec<(&str, &str)> = paragraphs
            .iter()
            .map(|p| (p.speaker.as_str(), p.content.as_str()))
            .collect();
        assert_eq!(
            turns,
            vec![
                ("Interviewer", "What is the state of the empire?"),
                ("Noam Chomsky", "Declining, in some respects."),
                ("Noam Chomsky", "But still dominant militarily."),
                ("Vijay Prashad", "I would add the economic dimension."),
            ]
        );
        assert_eq!(paragraphs[0].article_title, "Interview on Empire");
        assert_eq!(paragraphs[0].article_url, "https://chomsky.info/20210304/");
    }

    #[test]
    fn solo_article_belongs_to_default_speaker() {
        let html = "<article><h2>Part one</h2><p>First   paragraph\n text.</p><p></p><p>Second.</p></article>";
        let paragraphs = parser().parse(&article(html, ""));
        assert_eq!(paragraphs.len(), 3);
        assert!(paragraphs.iter().all(|p| p.speaker == "Noam Chomsky"));
        assert_eq!(paragraphs[1].content, "First paragraph text.");
    }

    #[test]
    fn untagged_text_before_first_turn_uses_default_speaker() {
        let html = "<div><p>Introduction by the editors.</p><p>Q: Why now?</p><p>NC: Because.</p></div>";
        let speakers: Vec<String> = parser().parse(&article(html, "")).into_iter().map(|p| p.speaker).collect();
        assert_eq!(speakers, vec!["Noam Chomsky", "Interviewer", "Noam Chomsky"]);
    }

    #[test]
    fn falls_back_to_whole_text() {
        let paragraphs = parser().parse(&article("<div>no blocks here</div>", "  Plain text body.  "));
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].speaker, "Noam Chomsky");
        assert_eq!(paragraphs[0].content, "Plain text body.");

        assert!(parser().parse(&article("", "")).is_empty());
    }

    #[test]
    fn custom_catalog_and_bad_patterns() {
        let config = ParserConfig {
            default_speaker: "Host".to_string(),
            speakers: vec![SpeakerPattern {
                name: "Guest".to_string(),
                patterns: vec![r"(?:^|\W)G:".to_string()],
            }],
        };
        let parser = HtmlDialogueParser::new(&config).unwrap();
        let paragraphs = parser.parse(&article("<p>Welcome.</p><p>G: Thanks.</p>", ""));
        assert_eq!(paragraphs[0].speaker, "Host");
        assert_eq!(paragraphs[1].speaker, "Guest");
        assert_eq!(paragraphs[1].content, "Thanks.");

        let broken = ParserConfig {
            speakers: vec![SpeakerPattern {
                name: "Broken".to_string(),
                patterns: vec!["(unclosed".to_string()],
            }],
            ..ParserConfig::default()
        };
        assert!(matches!(HtmlDialogueParser::new(&broken), Err(ConfigError::Invalid(_))));
    }
}
//*** END FILE: src/parsing/dialogue_parser.rs ***//
