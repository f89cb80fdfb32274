//*** START FILE: src/parsing/mod.rs ***//
pub mod dialogue_parser;
pub mod reply_parser;

// Re-export the main parsing entry points for convenience
pub use dialogue_parser::{DialogueParser, HtmlDialogueParser};
pub use reply_parser::{parse_first_qa_pair, parse_qa_pairs, ParsedPair};
//*** END FILE: src/parsing/mod.rs ***//
