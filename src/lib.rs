// Newsletter Optimizer - daily futures newsletter ingestion
// Cleans the newsletter email, segments it into level / recap / trade plan
// sections, extracts price levels and stores one record per trading session.

#![deny(clippy::unwrap_used)]

pub mod config;
pub mod db;
pub mod newsletter;
pub mod optimizer;
pub mod orchestrator;
pub mod session;
pub mod store;

// Re-export commonly used items
pub use config::Config;
pub use newsletter::{is_duplicate, NewsletterError, NewsletterResult, RawDocument, ReceivedAt};
pub use optimizer::{optimize, OptimizedNewsletter, SectionTag, Template};
pub use session::{resolve, SessionId};
