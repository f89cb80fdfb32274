//*** START FILE: src/generation/mod.rs ***//
pub mod orchestrator;
pub mod segmenter;
pub mod similarity;
pub mod strategies;

pub use orchestrator::{AcceptanceState, GenerationOrchestrator, GenerationOutput, StageYield};
pub use segmenter::Segmenter;
pub use similarity::similarity;
pub use strategies::Theme;
//*** END FILE: src/generation/mod.rs ***//
