use crate::completion::CompletionService;
use crate::config::GenerationSettings;
use crate::types::article_data::{Paragraph, QaRecord, SpeakerContext};
use super::segmenter::{word_count, Segmenter, PARAGRAPH_BREAK};
use super::similarity::similarity;
use super::strategies::{generate_direct, generate_segment, generate_themed, Theme};
use std::collections::HashSet;

/// Records accepted so far in one (article, speaker) run.
///
/// Never shared between runs. The duplicate checks compare every candidate against every
/// accepted record, which is fine for targets in the tens.
#[derive(Debug)]
pub struct AcceptanceState {
    accepted: Vec<QaRecord>,
    seen_questions: HashSet<String>,
    target: usize,
}

impl AcceptanceState {
    pub fn new(target: usize) -> Self {
        AcceptanceState {
            accepted: Vec::with_capacity(target),
            seen_questions: HashSet::new(),
            target,
        }
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.accepted.len() >= self.target
    }

    /// Up to `n` accepted questions, oldest first.
    pub fn sample_questions(&self, n: usize) -> Vec<&str> {
        self.accepted.iter().take(n).map(|r| r.question.as_str()).collect()
    }

    /// Accepts `candidate` unless the run is full, its question repeats or resembles an
    /// accepted one, or (when `answer_threshold` is given) its answer resembles one.
    pub fn offer(&mut self, candidate: QaRecord, question_threshold: f64, answer_threshold: Option<f64>) -> bool {
        if self.is_full() || self.seen_questions.contains(&candidate.question) {
            return false;
        }
        if self
            .accepted
            .iter()
            .any(|r| similarity(&candidate.question, &r.question) > question_threshold)
        {
            return false;
        }
        if let Some(threshold) = answer_threshold {
            if self
                .accepted
                .iter()
                .any(|r| similarity(&candidate.answer, &r.answer) > threshold)
            {
                return false;
            }
        }
        self.seen_questions.insert(candidate.question.clone());
        self.accepted.push(candidate);
        true
    }

    pub fn into_records(self) -> Vec<QaRecord> {
        self.accepted
    }
}

/// Records contributed by each stage of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageYield {
    pub direct: usize,
    pub themed: usize,
    pub segment: usize,
}

pub struct GenerationOutput {
    pub records: Vec<QaRecord>,
    pub stage_yield: StageYield,
}

/// Drives the direct, themed and segment strategies for one speaker of one article.
pub struct GenerationOrchestrator<'a> {
    service: &'a dyn CompletionService,
    settings: GenerationSettings,
}

impl<'a> GenerationOrchestrator<'a> {
    pub fn new(service: &'a dyn CompletionService, settings: GenerationSettings) -> Self {
        GenerationOrchestrator { service, settings }
    }

    /// Accepted records in acceptance order.
    pub fn generate(&self, paragraphs: &[Paragraph]) -> Vec<QaRecord> {
        self.generate_with_report(paragraphs).records
    }

    /// Temperature for the next segment call, rising with the number of accepted records.
    pub fn segment_temperature(&self, accepted: usize) -> f32 {
        let s = &self.settings;
        (s.base_temperature + s.temperature_step * accepted as f32).min(s.max_temperature)
    }

    pub fn generate_with_report(&self, paragraphs: &[Paragraph]) -> GenerationOutput {
        let s = &self.settings;
        let mut stage_yield = StageYield::default();

        let ctx = match paragraphs.first() {
            Some(first) => SpeakerContext::from_paragraph(first),
            None => return GenerationOutput { records: Vec::new(), stage_yield },
        };
        let full_text = paragraphs
            .iter()
            .map(|p| p.content.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_BREAK);
        if full_text.is_empty() {
            return GenerationOutput { records: Vec::new(), stage_yield };
        }

        tracing::info!(speaker = %ctx.speaker, words = word_count(&full_text), "generating Q&A pairs");
        let mut state = AcceptanceState::new(s.target_count);

        // --- Stage A: Direct ---
        for candidate in generate_direct(self.service, &full_text, &ctx, s.direct_pairs, s.direct_char_limit) {
            if state.is_full() {
                break;
            }
            if state.offer(candidate, s.question_similarity_threshold, None) {
                stage_yield.direct += 1;
            }
        }
        tracing::debug!(accepted = state.len(), "after direct stage");

        // --- Stage B: Themed ---
        if !state.is_full() {
            for theme in Theme::ALL {
                if state.is_full() {
                    break;
                }
                if let Some(candidate) = generate_themed(self.service, &full_text, &ctx, theme, s.themed_char_limit) {
                    if state.offer(candidate, s.question_similarity_threshold, None) {
                        stage_yield.themed += 1;
                    }
                }
            }
            tracing::debug!(accepted = state.len(), "after themed stage");
        }

        // --- Stage C: Segment-scoped ---
        if !state.is_full() {
            let segments = Segmenter::new(s.min_segment_words, s.max_segment_words).segment(&full_text);
            tracing::debug!(segments = segments.len(), "segmented speaker text");

            for segment in &segments {
                if state.is_full() {
                    break;
                }
                if word_count(segment) < s.min_generation_segment_words {
                    continue;
                }

                let temperature = self.segment_temperature(state.len());
                let candidates = {
                    let used = state.sample_questions(s.used_question_sample);
                    generate_segment(self.service, segment, &ctx, &used, temperature, s.segment_pairs)
                };
                for candidate in candidates {
                    if state.is_full() {
                        break;
                    }
                    if state.offer(
                        candidate,
                        s.question_similarity_threshold,
                        Some(s.answer_similarity_threshold),
                    ) {
                        stage_yield.segment += 1;
                    }
                }
            }
        }

        tracing::info!(
            speaker = %ctx.speaker,
            direct = stage_yield.direct,
            themed = stage_yield.themed,
            segment = stage_yield.segment,
            total = state.len(),
            "generation finished"
        );
        GenerationOutput {
            records: state.into_records(),
            stage_yield,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Kind {
        Direct,
        Themed,
        Segment,
    }

    fn kind_of(prompt: &str) -> Kind {
        if prompt.starts_with("Based on the following excerpt") {
            Kind::Direct
        } else if prompt.starts_with("Based on this excerpt") {
            Kind::Themed
        } else {
            Kind::Segment
        }
    }

    struct Call {
        kind: Kind,
        temperature: f32,
        prompt: String,
    }

    /// Answers each call with `reply(kind, call_index)`; `None` simulates a failed call.
    struct Scripted<F: Fn(Kind, usize) -> Option<String>> {
        reply: F,
        calls: RefCell<Vec<Call>>,
    }

    impl<F: Fn(Kind, usize) -> Option<String>> Scripted<F> {
        fn new(reply: F) -> Self {
            Scripted { reply, calls: RefCell::new(Vec::new()) }
        }

        fn kinds(&self) -> Vec<Kind> {
            self.calls.borrow().iter().map(|c| c.kind).collect()
        }
    }

    impl<F: Fn(Kind, usize) -> Option<String>> CompletionService for Scripted<F> {
        fn complete(&self, prompt: &str, temperature: f32, _max_tokens: u32) -> Result<String, ServiceError> {
            let kind = kind_of(prompt);
            let index = self.calls.borrow().len();
            self.calls.borrow_mut().push(Call { kind, temperature, prompt: prompt.to_string() });
            (self.reply)(kind, index).ok_or(ServiceError::Malformed("scripted failure".to_string()))
        }
    }

    /// Pairs whose questions and answers share no significant words with any other pair.
    fn unique_pairs(start: usize, count: usize) -> String {
        (start..start + count)
            .map(|i| format!("Q: Topic{i}alpha topic{i}beta?\nA: Answer{i}gamma detail{i}delta.\n\n"))
            .collect()
    }

    fn paragraphs(sizes: &[usize]) -> Vec<Paragraph> {
        sizes
            .iter()
            .enumerate()
            .map(|(p, n)| Paragraph {
                speaker: "Noam Chomsky".to_string(),
                content: (0..*n).map(|w| format!("word{}x{}", p, w)).collect::<Vec<_>>().join(" "),
                article_title: "Title".to_string(),
                article_date: "2020-01-01".to_string(),
                article_url: "https://example.org/20200101/".to_string(),
            })
            .collect()
    }

    fn settings(target: usize) -> GenerationSettings {
        GenerationSettings { target_count: target, ..GenerationSettings::default() }
    }

    fn assert_questions_distinct(records: &[QaRecord]) {
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                assert!(similarity(&a.question, &b.question) <= 0.4, "{:?} vs {:?}", a.question, b.question);
            }
        }
    }

    #[test]
    fn empty_input_makes_no_calls() {
        let service = Scripted::new(|_, _| Some(unique_pairs(0, 5)));
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        assert!(orchestrator.generate(&[]).is_empty());

        let mut blank = paragraphs(&[3]);
        blank[0].content = "   ".to_string();
        assert!(orchestrator.generate(&blank).is_empty());
        assert!(service.calls.borrow().is_empty());
    }

    #[test]
    fn target_reached_in_direct_stage_skips_the_rest() {
        let service = Scripted::new(|_, i| Some(unique_pairs(i * 10, 5)));
        let orchestrator = GenerationOrchestrator::new(&service, settings(5));
        let output = orchestrator.generate_with_report(&paragraphs(&[200, 200, 200, 200, 200]));

        assert_eq!(output.records.len(), 5);
        assert_eq!(output.stage_yield, StageYield { direct: 5, themed: 0, segment: 0 });
        assert_eq!(service.kinds(), vec![Kind::Direct]);
    }

    #[test]
    fn never_exceeds_target() {
        let service = Scripted::new(|_, i| Some(unique_pairs(i * 100, 12)));
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        let records = orchestrator.generate(&paragraphs(&[300, 300, 300, 300]));
        assert_eq!(records.len(), 10);
        assert_eq!(service.kinds(), vec![Kind::Direct]);
    }

    #[test]
    fn similar_questions_are_rejected() {
        let reply = "Q: How does propaganda shape media coverage of wars?\nA: One.\n\n\
                     Q: How does propaganda shape media coverage of elections?\nA: Two.\n\n\
                     Q: What role do labor unions play in democracy?\nA: Three.\n\n\
                     Q: How does propaganda shape media coverage of wars?\nA: Four.";
        let service = Scripted::new(move |kind, _| match kind {
            Kind::Direct => Some(reply.to_string()),
            _ => None,
        });
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        let records = orchestrator.generate(&paragraphs(&[20]));

        let answers: Vec<&str> = records.iter().map(|r| r.answer.as_str()).collect();
        assert_eq!(answers, vec!["One.", "Three."]);
        assert_questions_distinct(&records);
    }

    const WARS: &str = "How does propaganda shape media coverage of wars?";
    const ELECTIONS: &str = "How does propaganda shape media coverage of elections?";

    #[test]
    fn themed_stage_rejects_questions_close_to_accepted_ones() {
        let service = Scripted::new(|kind, i| match kind {
            Kind::Direct => Some(format!("Q: {}\nA: One.", WARS)),
            // first themed call is call 1
            Kind::Themed if i == 1 => Some(format!("Q: {}\nA: Two.", ELECTIONS)),
            Kind::Themed => Some(unique_pairs(100 + i, 1)),
            Kind::Segment => None,
        });
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        let output = orchestrator.generate_with_report(&paragraphs(&[20]));

        assert!(similarity(WARS, ELECTIONS) > 0.4);
        assert_eq!(output.stage_yield, StageYield { direct: 1, themed: 4, segment: 0 });
        assert!(output.records.iter().all(|r| r.question != ELECTIONS));
        assert_questions_distinct(&output.records);
    }

    #[test]
    fn segment_stage_rejects_questions_close_to_accepted_ones() {
        let service = Scripted::new(|kind, _| match kind {
            Kind::Direct => Some(format!("Q: {}\nA: One.", WARS)),
            Kind::Themed => None,
            Kind::Segment => Some(format!(
                "Q: {}\nA: Newspapers echoed official narratives uncritically.\n\n\
                 Q: What role do labor unions play in democracy?\nA: Organized workers resist concentrated private power.",
                ELECTIONS
            )),
        });
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        // one 240-word segment
        let output = orchestrator.generate_with_report(&paragraphs(&[120, 120]));

        assert_eq!(output.stage_yield, StageYield { direct: 1, themed: 0, segment: 1 });
        let questions: Vec<&str> = output.records.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec![WARS, "What role do labor unions play in democracy?"]);
        assert_questions_distinct(&output.records);
    }

    #[test]
    fn exact_repeats_are_rejected_even_without_significant_words() {
        let service = Scripted::new(|kind, _| match kind {
            Kind::Direct => Some("Q: Why?\nA: First.\n\nQ: Why?\nA: Second.".to_string()),
            _ => None,
        });
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        let records = orchestrator.generate(&paragraphs(&[20]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer, "First.");
    }

    #[test]
    fn total_service_failure_yields_nothing() {
        let service = Scripted::new(|_, _| None);
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        // segments of 600, 600 and 110 words: three segment calls
        let records = orchestrator.generate(&paragraphs(&[300, 300, 300, 300, 110]));
        assert!(records.is_empty());

        let kinds = service.kinds();
        assert_eq!(kinds.iter().filter(|k| **k == Kind::Direct).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == Kind::Themed).count(), 5);
        assert_eq!(kinds.iter().filter(|k| **k == Kind::Segment).count(), 3);
    }

    #[test]
    fn short_segments_are_skipped() {
        let service = Scripted::new(|_, _| None);
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        // 500 | 200 | 550 | 90: the 90-word remainder is below the generation minimum
        orchestrator.generate(&paragraphs(&[500, 200, 550, 90]));
        let segment_calls = service.kinds().into_iter().filter(|k| *k == Kind::Segment).count();
        assert_eq!(segment_calls, 3);
    }

    #[test]
    fn answer_similarity_only_gates_segment_stage() {
        let service = Scripted::new(|kind, _| match kind {
            Kind::Direct => Some(
                "Q: Sanctions history?\nA: Sanctions embargo policy against Cuba hurt civilians.\n\n\
                 Q: Civilian harm?\nA: Sanctions embargo policy against Cuba hurt civilians."
                    .to_string(),
            ),
            Kind::Themed => None,
            Kind::Segment => Some(
                "Q: Blockade legality?\nA: Sanctions embargo policy against Cuba hurt civilians badly.\n\n\
                 Q: Media framing?\nA: Newspapers echoed official narratives uncritically."
                    .to_string(),
            ),
        });
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        let output = orchestrator.generate_with_report(&paragraphs(&[120, 120, 120, 120]));

        // identical answers pass in stage A; the near-copy answer is rejected in stage C
        assert_eq!(output.stage_yield, StageYield { direct: 2, themed: 0, segment: 1 });
        assert_eq!(output.records[2].question, "Media framing?");
    }

    #[test]
    fn stages_run_in_order_and_records_keep_acceptance_order() {
        let service = Scripted::new(|kind, i| match kind {
            Kind::Direct => Some(unique_pairs(0, 2)),
            Kind::Themed => Some(unique_pairs(100 + i, 1)),
            Kind::Segment => Some(unique_pairs(200 + i * 10, 2)),
        });
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        let output = orchestrator.generate_with_report(&paragraphs(&[200, 200, 200, 200, 200]));

        let kinds = service.kinds();
        let first_themed = kinds.iter().position(|k| *k == Kind::Themed).unwrap();
        let first_segment = kinds.iter().position(|k| *k == Kind::Segment).unwrap();
        assert!(kinds[..first_themed].iter().all(|k| *k == Kind::Direct));
        assert!(kinds[first_themed..first_segment].iter().all(|k| *k == Kind::Themed));
        assert!(kinds[first_segment..].iter().all(|k| *k == Kind::Segment));

        assert_eq!(output.stage_yield, StageYield { direct: 2, themed: 5, segment: 3 });
        assert_eq!(output.records[0].question, "Topic0alpha topic0beta?");
        assert_eq!(output.records[2].question, "Topic101alpha topic101beta?");
        assert_questions_distinct(&output.records);
    }

    #[test]
    fn segment_temperature_escalates_and_caps() {
        let service = Scripted::new(|kind, i| match kind {
            Kind::Segment => Some(unique_pairs(i * 10, 2)),
            _ => None,
        });
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        // seven segments of 400 words
        orchestrator.generate(&paragraphs(&[400, 400, 400, 400, 400, 400, 400]));

        let temperatures: Vec<f32> = service
            .calls
            .borrow()
            .iter()
            .filter(|c| c.kind == Kind::Segment)
            .map(|c| c.temperature)
            .collect();
        let expected = [0.7, 0.8, 0.9, 0.9, 0.9];
        assert_eq!(temperatures.len(), expected.len());
        for (got, want) in temperatures.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{} vs {}", got, want);
        }
        assert!((orchestrator.segment_temperature(100) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn segment_prompt_shows_at_most_five_used_questions() {
        let service = Scripted::new(|kind, _| match kind {
            Kind::Direct => Some(unique_pairs(0, 5)),
            Kind::Themed => Some(unique_pairs(50, 1)),
            Kind::Segment => None,
        });
        let orchestrator = GenerationOrchestrator::new(&service, settings(20));
        orchestrator.generate(&paragraphs(&[200, 200, 200, 200]));

        let calls = service.calls.borrow();
        let prompt = &calls.iter().find(|c| c.kind == Kind::Segment).unwrap().prompt;
        assert!(prompt.contains("- Topic0alpha topic0beta?"));
        assert!(prompt.contains("- Topic4alpha topic4beta?"));
        assert!(!prompt.contains("- Topic50alpha topic50beta?"));
    }

    #[test]
    fn small_article_with_two_pairs_per_call() {
        let service = Scripted::new(|_, i| Some(unique_pairs(i * 10, 2)));
        let orchestrator = GenerationOrchestrator::new(&service, settings(10));
        let output = orchestrator.generate_with_report(&paragraphs(&[50, 50, 50, 50]));

        // direct 2, one per theme, then the single 200-word segment adds 2
        assert_eq!(output.stage_yield, StageYield { direct: 2, themed: 5, segment: 2 });
        assert!(output.records.len() <= 10);
        assert_questions_distinct(&output.records);
        assert_eq!(service.kinds()[0], Kind::Direct);
    }
}
