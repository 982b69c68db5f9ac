//! Storage collaborator: raw newsletter archive plus the analysis and
//! optimized-content records keyed by `newsletter_id`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgNewsletterStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::newsletter::{NewsletterResult, RawDocument};
use crate::optimizer::{OptimizedNewsletter, SectionTag};

/// Whether an upsert created the row or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Optimized newsletter content, one row per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRecord {
    pub newsletter_id: String,
    pub key_levels: String,
    pub key_levels_raw: String,
    pub trade_plan: Option<String>,
    pub core_levels: Option<String>,
    pub trade_recap: Option<String>,
    pub optimized_content: String,
    pub timestamp: DateTime<Utc>,
}

impl OptimizedRecord {
    pub fn from_optimized(optimized: &OptimizedNewsletter, timestamp: DateTime<Utc>) -> Self {
        let section = |tag| optimized.section(tag).map(str::to_string);

        Self {
            newsletter_id: optimized.newsletter_id().to_string(),
            key_levels: optimized.extraction.formatted_levels.clone(),
            key_levels_raw: optimized.extraction.raw_levels.clone(),
            trade_plan: section(SectionTag::TradePlan),
            core_levels: section(SectionTag::CoreLevels),
            trade_recap: section(SectionTag::TradeRecap),
            optimized_content: optimized.cleaned_body.clone(),
            timestamp,
        }
    }
}

/// Analysis row, one per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub newsletter_id: String,
    pub original_levels: Option<String>,
    pub trade_plan: Option<String>,
    /// Filled by the market calendar job, never by this pipeline
    pub market_events: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn from_optimized(optimized: &OptimizedNewsletter, timestamp: DateTime<Utc>) -> Self {
        Self {
            newsletter_id: optimized.newsletter_id().to_string(),
            original_levels: optimized.section(SectionTag::CoreLevels).map(str::to_string),
            trade_plan: optimized.section(SectionTag::TradePlan).map(str::to_string),
            market_events: None,
            timestamp,
        }
    }
}

/// Archived raw newsletter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNewsletter {
    pub subject: String,
    pub body: String,
    pub received_at: Option<DateTime<Utc>>,
    pub received_at_raw: String,
    pub timestamp: DateTime<Utc>,
}

impl StoredNewsletter {
    pub fn from_document(doc: &RawDocument, timestamp: DateTime<Utc>) -> Self {
        Self {
            subject: doc.subject.clone(),
            body: doc.body.clone(),
            received_at: doc.received_at.as_datetime(),
            received_at_raw: doc.received_at.as_text(),
            timestamp,
        }
    }
}

#[async_trait]
pub trait NewsletterStore: Send + Sync {
    /// Subject of the most recently timestamped archived newsletter
    async fn latest_subject(&self) -> NewsletterResult<Option<String>>;

    async fn save_newsletter(&self, newsletter: &StoredNewsletter) -> NewsletterResult<()>;

    async fn upsert_optimized(&self, record: &OptimizedRecord) -> NewsletterResult<UpsertOutcome>;

    async fn upsert_analysis(&self, record: &AnalysisRecord) -> NewsletterResult<UpsertOutcome>;

    async fn get_optimized(&self, newsletter_id: &str) -> NewsletterResult<Option<OptimizedRecord>>;

    async fn get_analysis(&self, newsletter_id: &str) -> NewsletterResult<Option<AnalysisRecord>>;
}
