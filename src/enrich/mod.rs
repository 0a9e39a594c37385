//! Summary and interpretation of page text via a completion service.

pub mod enricher;
pub mod prompt;

pub use enricher::{Enricher, Enrichment};
pub use prompt::Prompt;
