//*** START FILE: src/lib.rs ***//

// Declare all modules that are part of this library
pub mod archive;
pub mod completion;
pub mod config;
pub mod document;
pub mod error;
pub mod generation;
pub mod parsing;
pub mod pipeline;
pub mod records_io;
#[cfg(test)]
mod test_support;
pub mod types {
    pub mod article_data;
}

pub use config::Config;
pub use error::{Error, Result};
pub use types::article_data::{ArticleContent, Paragraph, QaRecord};

//*** END FILE: src/lib.rs ***//
