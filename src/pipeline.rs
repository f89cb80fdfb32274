//*** START FILE: src/pipeline.rs ***//
use crate::archive::ContentFetcher;
use crate::completion::CompletionService;
use crate::config::{Config, FilterConfig, OutputConfig, ALL_OTHER_SPEAKERS};
use crate::document::builder_for;
use crate::error::{Error, FetchError, Result};
use crate::generation::GenerationOrchestrator;
use crate::parsing::DialogueParser;
use crate::types::article_data::{Paragraph, QaRecord};

/// Speaker allow-list with the "all other speakers" sentinel resolved.
#[derive(Debug, Clone)]
pub struct SpeakerFilter {
    speakers: Vec<String>,
    named_speakers: Vec<String>,
    include_others: bool,
}

impl SpeakerFilter {
    pub fn from_config(filters: &FilterConfig) -> Self {
        SpeakerFilter {
            speakers: filters
                .speakers
                .iter()
                .filter(|s| s.as_str() != ALL_OTHER_SPEAKERS)
                .cloned()
                .collect(),
            named_speakers: filters.named_speakers.clone(),
            include_others: filters.speakers.iter().any(|s| s == ALL_OTHER_SPEAKERS),
        }
    }

    pub fn allows(&self, speaker: &str) -> bool {
        self.speakers.iter().any(|s| s == speaker)
            || (self.include_others && !self.named_speakers.iter().any(|s| s == speaker))
    }
}

/// Non-empty paragraphs grouped by speaker, speakers in order of first appearance.
pub fn group_by_speaker(paragraphs: Vec<Paragraph>) -> Vec<(String, Vec<Paragraph>)> {
    let mut groups: Vec<(String, Vec<Paragraph>)> = Vec::new();
    for paragraph in paragraphs {
        if paragraph.content.trim().is_empty() {
            continue;
        }
        match groups.iter_mut().find(|(speaker, _)| *speaker == paragraph.speaker) {
            Some((_, group)) => group.push(paragraph),
            None => groups.push((paragraph.speaker.clone(), vec![paragraph])),
        }
    }
    groups
}

/// Number of distinct speakers in an article.
pub fn distinct_speakers(paragraphs: &[Paragraph]) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for p in paragraphs {
        if !seen.contains(&p.speaker.as_str()) {
            seen.push(&p.speaker);
        }
    }
    seen.len()
}

/// Why an article contributed nothing.
#[derive(thiserror::Error, Debug)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("no paragraphs found")]
    NoParagraphs,

    #[error("interviews are excluded")]
    InterviewExcluded,

    #[error("solo articles are excluded")]
    SoloExcluded,

    #[error("no selected speaker appears in the article")]
    NoSelectedSpeakers,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub records: Vec<QaRecord>,
    pub articles_processed: usize,
    pub articles_skipped: usize,
}

/// Runs articles through fetch, dialogue parsing, filtering and generation, one at a time.
pub struct PipelineDriver<'a> {
    fetcher: &'a dyn ContentFetcher,
    parser: &'a dyn DialogueParser,
    config: &'a Config,
    filter: SpeakerFilter,
    orchestrator: GenerationOrchestrator<'a>,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(
        fetcher: &'a dyn ContentFetcher,
        parser: &'a dyn DialogueParser,
        service: &'a dyn CompletionService,
        config: &'a Config,
    ) -> Self {
        PipelineDriver {
            fetcher,
            parser,
            config,
            filter: SpeakerFilter::from_config(&config.filters),
            orchestrator: GenerationOrchestrator::new(service, config.generation.clone()),
        }
    }

    /// Article URLs from the configured index page.
    pub fn discover(&self) -> std::result::Result<Vec<String>, FetchError> {
        self.fetcher.discover_articles(&self.config.archive.index_url)
    }

    /// Records for one article, or the reason it was skipped.
    pub fn process_article(&self, url: &str) -> std::result::Result<Vec<QaRecord>, SkipReason> {
        let article = self.fetcher.fetch_article(url)?;
        let paragraphs = self.parser.parse(&article);
        if paragraphs.is_empty() {
            return Err(SkipReason::NoParagraphs);
        }

        let filters = &self.config.filters;
        let speaker_count = distinct_speakers(&paragraphs);
        if speaker_count > 1 && !filters.include_interviews {
            return Err(SkipReason::InterviewExcluded);
        }
        if speaker_count == 1 && !filters.include_solo_articles {
            return Err(SkipReason::SoloExcluded);
        }

        let selected: Vec<Paragraph> = paragraphs
            .into_iter()
            .filter(|p| self.filter.allows(&p.speaker))
            .collect();
        let groups = group_by_speaker(selected);
        if groups.is_empty() {
            return Err(SkipReason::NoSelectedSpeakers);
        }

        let speakers: Vec<&str> = groups.iter().map(|(s, _)| s.as_str()).collect();
        tracing::info!(url, title = %article.title, ?speakers, "processing article");

        let mut records = Vec::new();
        for (speaker, group) in &groups {
            let generated = self.orchestrator.generate(group);
            tracing::info!(url, speaker = %speaker, records = generated.len(), "speaker done");
            records.extend(generated);
        }
        Ok(records)
    }

    /// Processes up to `article_limit` of `urls` in order. Skipped articles are logged and
    /// do not stop the run.
    pub fn run(&self, urls: &[String]) -> PipelineReport {
        let limit = self.config.archive.article_limit.min(urls.len());
        let mut report = PipelineReport::default();

        for (i, url) in urls.iter().take(limit).enumerate() {
            tracing::info!("article {}/{}: {}", i + 1, limit, url);
            match self.process_article(url) {
                Ok(records) => {
                    report.articles_processed += 1;
                    report.records.extend(records);
                }
                Err(reason) => {
                    report.articles_skipped += 1;
                    tracing::warn!(url = %url, reason = %reason, "skipping article");
                }
            }
        }

        tracing::info!(
            processed = report.articles_processed,
            skipped = report.articles_skipped,
            records = report.records.len(),
            "pipeline finished"
        );
        report
    }

    /// Discovers articles on the index page, then runs them.
    pub fn run_from_index(&self) -> Result<PipelineReport> {
        let urls = self.discover()?;
        Ok(self.run(&urls))
    }
}

/// Writes the document, treating an empty collection as a failed run.
pub fn write_output(records: &[QaRecord], output: &OutputConfig) -> Result<()> {
    if records.is_empty() {
        return Err(Error::NothingProduced);
    }
    builder_for(output.format).build(records, &output.path)?;
    Ok(())
}

//*** END FILE: src/pipeline.rs ***//
