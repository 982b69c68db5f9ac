//! In-process store for tests and dry runs

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{AnalysisRecord, NewsletterStore, OptimizedRecord, StoredNewsletter, UpsertOutcome};
use crate::newsletter::NewsletterResult;
use crate::session::parse_newsletter_id;

#[derive(Debug, Default)]
pub struct MemoryStore {
    newsletters: RwLock<Vec<StoredNewsletter>>,
    optimized: RwLock<HashMap<String, OptimizedRecord>>,
    analysis: RwLock<HashMap<String, AnalysisRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn newsletter_count(&self) -> usize {
        self.newsletters.read().await.len()
    }

    pub async fn optimized_count(&self) -> usize {
        self.optimized.read().await.len()
    }

    pub async fn analysis_count(&self) -> usize {
        self.analysis.read().await.len()
    }
}

fn upsert<V>(map: &mut HashMap<String, V>, key: &str, value: V) -> UpsertOutcome {
    match map.insert(key.to_string(), value) {
        Some(_) => UpsertOutcome::Updated,
        None => UpsertOutcome::Inserted,
    }
}

#[async_trait]
impl NewsletterStore for MemoryStore {
    async fn latest_subject(&self) -> NewsletterResult<Option<String>> {
        let newsletters = self.newsletters.read().await;
        // later inserts win timestamp ties, like an append-only table
        Ok(newsletters
            .iter()
            .enumerate()
            .max_by_key(|(i, n)| (n.timestamp, *i))
            .map(|(_, n)| n.subject.clone()))
    }

    async fn save_newsletter(&self, newsletter: &StoredNewsletter) -> NewsletterResult<()> {
        self.newsletters.write().await.push(newsletter.clone());
        Ok(())
    }

    async fn upsert_optimized(&self, record: &OptimizedRecord) -> NewsletterResult<UpsertOutcome> {
        parse_newsletter_id(&record.newsletter_id)?;

        let mut optimized = self.optimized.write().await;
        Ok(upsert(&mut optimized, &record.newsletter_id, record.clone()))
    }

    async fn upsert_analysis(&self, record: &AnalysisRecord) -> NewsletterResult<UpsertOutcome> {
        parse_newsletter_id(&record.newsletter_id)?;

        let mut analysis = self.analysis.write().await;
        let mut merged = record.clone();
        // same as COALESCE in the Postgres store: never clear calendar data
        if merged.market_events.is_none() {
            merged.market_events = analysis
                .get(&record.newsletter_id)
                .and_then(|existing| existing.market_events.clone());
        }
        Ok(upsert(&mut analysis, &record.newsletter_id, merged))
    }

    async fn get_optimized(&self, newsletter_id: &str) -> NewsletterResult<Option<OptimizedRecord>> {
        parse_newsletter_id(newsletter_id)?;

        Ok(self.optimized.read().await.get(newsletter_id).cloned())
    }

    async fn get_analysis(&self, newsletter_id: &str) -> NewsletterResult<Option<AnalysisRecord>> {
        parse_newsletter_id(newsletter_id)?;

        Ok(self.analysis.read().await.get(newsletter_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newsletter::NewsletterError;
    use chrono::{Duration, Utc};

    fn newsletter(subject: &str, timestamp: chrono::DateTime<Utc>) -> StoredNewsletter {
        StoredNewsletter {
            subject: subject.to_string(),
            body: String::new(),
            received_at: None,
            received_at_raw: String::new(),
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_latest_subject_by_timestamp() {
        let store = MemoryStore::new();
        assert_eq!(store.latest_subject().await.unwrap(), None);

        let now = Utc::now();
        store.save_newsletter(&newsletter("newer", now)).await.unwrap();
        store
            .save_newsletter(&newsletter("older", now - Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(store.latest_subject().await.unwrap().as_deref(), Some("newer"));
    }

    #[tokio::test]
    async fn test_upsert_reports_outcome() {
        let store = MemoryStore::new();
        let mut record = AnalysisRecord {
            newsletter_id: "20250113".to_string(),
            original_levels: Some("6050.00: support".to_string()),
            trade_plan: None,
            market_events: None,
            timestamp: Utc::now(),
        };

        assert_eq!(store.upsert_analysis(&record).await.unwrap(), UpsertOutcome::Inserted);
        record.trade_plan = Some("Trade Plan Monday".to_string());
        assert_eq!(store.upsert_analysis(&record).await.unwrap(), UpsertOutcome::Updated);

        assert_eq!(store.analysis_count().await, 1);
        let stored = store.get_analysis("20250113").await.unwrap().unwrap();
        assert_eq!(stored.trade_plan.as_deref(), Some("Trade Plan Monday"));
    }

    #[tokio::test]
    async fn test_upsert_keeps_market_events() {
        let store = MemoryStore::new();
        let mut record = AnalysisRecord {
            newsletter_id: "20250113".to_string(),
            original_levels: None,
            trade_plan: None,
            market_events: Some("08:30 CPI".to_string()),
            timestamp: Utc::now(),
        };
        store.upsert_analysis(&record).await.unwrap();

        record.market_events = None;
        record.trade_plan = Some("Trade Plan Monday".to_string());
        assert_eq!(store.upsert_analysis(&record).await.unwrap(), UpsertOutcome::Updated);

        let stored = store.get_analysis("20250113").await.unwrap().unwrap();
        assert_eq!(stored.market_events.as_deref(), Some("08:30 CPI"));
        assert_eq!(stored.trade_plan.as_deref(), Some("Trade Plan Monday"));
    }

    #[tokio::test]
    async fn test_malformed_newsletter_id_rejected() {
        let store = MemoryStore::new();
        let record = AnalysisRecord {
            newsletter_id: "garbage".to_string(),
            original_levels: None,
            trade_plan: None,
            market_events: None,
            timestamp: Utc::now(),
        };

        assert!(matches!(
            store.upsert_analysis(&record).await,
            Err(NewsletterError::Validation { .. })
        ));
        assert!(matches!(
            store.get_optimized("2025-01-13").await,
            Err(NewsletterError::Validation { .. })
        ));
        assert!(matches!(
            store.get_analysis("20250230").await,
            Err(NewsletterError::Validation { .. })
        ));
        assert_eq!(store.analysis_count().await, 0);
    }
}
