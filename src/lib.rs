pub mod anonymize;
pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod types;
pub mod writer;

pub use anonymize::{participant_id, Anonymizer};
pub use config::{MergeConfig, PrivacyPolicy};
pub use error::{MergeError, Result};
pub use pipeline::{Pipeline, PipelineResult};
pub use types::{Dataset, Row};
