//*** START FILE: src/parsing/reply_parser.rs ***//
//! Grammar for model replies.
//!
//! ```text
//! reply    := noise? block*
//! block    := Q-MARKER question A-MARKER answer
//! answer   := text up to the next Q-MARKER or end of input
//! Q-MARKER := line start, indent?, ("1." | "1)")?, "**"?, ("Q" | "Question"), "**"?, ":", "**"?
//! A-MARKER := same shape with ("A" | "Answer")
//! ```
//!
//! Question and answer are trimmed. A block without an answer marker, or with an empty
//! question or answer, is dropped. Nothing here returns an error: a reply with no usable
//! block is just an empty list.
use once_cell::sync::Lazy;
use regex::Regex;

static QUESTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:\d+[.)][ \t]*)?(?:\*\*)?(?:Question|Q)(?:\*\*)?:(?:\*\*)?")
        .expect("question marker regex")
});

static ANSWER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:\d+[.)][ \t]*)?(?:\*\*)?(?:Answer|A)(?:\*\*)?:(?:\*\*)?")
        .expect("answer marker regex")
});

/// A question/answer pair lifted out of a model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPair {
    pub question: String,
    pub answer: String,
}

/// Every well-formed block, in reply order.
pub fn parse_qa_pairs(reply: &str) -> Vec<ParsedPair> {
    let starts: Vec<(usize, usize)> = QUESTION_MARKER
        .find_iter(reply)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut pairs = Vec::with_capacity(starts.len());
    for (index, &(_, body_start)) in starts.iter().enumerate() {
        let body_end = starts.get(index + 1).map_or(reply.len(), |&(next, _)| next);
        if let Some(pair) = parse_block(&reply[body_start..body_end]) {
            pairs.push(pair);
        }
    }
    pairs
}

/// The first well-formed block, if any.
pub fn parse_first_qa_pair(reply: &str) -> Option<ParsedPair> {
    parse_qa_pairs(reply).into_iter().next()
}

fn parse_block(body: &str) -> Option<ParsedPair> {
    let marker = ANSWER_MARKER.find(body)?;
    let question = body[..marker.start()].trim();
    let answer = body[marker.end()..].trim();
    if question.is_empty() || answer.is_empty() {
        return None;
    }
    Some(ParsedPair {
        question: question.to_string(),
        answer: answer.to_string(),
    })
}

//*** END FILE: src/parsing/reply_parser.rs ***//
