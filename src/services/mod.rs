pub mod enrichment;
pub mod normalizer;
pub mod progress;
pub mod prompt;
pub mod providers;
pub mod recommendations;
pub mod response_parser;
pub mod similarity;
pub mod suggestion_filter;

pub use progress::ProgressObserver;
pub use recommendations::{RecommendationEngine, RunInput, RunOutcome};
