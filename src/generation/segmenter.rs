/// Paragraph-break marker used to join and split speaker text.
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Splits one speaker's text into word-count-bounded thematic chunks.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Segmenter { min_words: 150, max_words: 600 }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

impl Segmenter {
    pub fn new(min_words: usize, max_words: usize) -> Self {
        Segmenter { min_words, max_words }
    }

    /// Segments in original order. Text with three or fewer paragraphs comes back whole.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let paragraphs: Vec<&str> = text
            .split(PARAGRAPH_BREAK)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if paragraphs.len() <= 3 {
            return vec![text.to_string()];
        }

        let mut segments = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_words = 0;

        for para in paragraphs {
            let para_words = word_count(para);
            if current_words + para_words > self.max_words && current_words >= self.min_words {
                segments.push(current.join(PARAGRAPH_BREAK));
                current.clear();
                current_words = 0;
            }
            current.push(para);
            current_words += para_words;
        }

        if !current.is_empty() {
            segments.push(current.join(PARAGRAPH_BREAK));
        }
        segments
    }
}
