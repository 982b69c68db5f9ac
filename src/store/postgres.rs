//! PostgreSQL store
//! Upserts are keyed on `newsletter_id`, so re-running a session overwrites its rows

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::info;

use super::{AnalysisRecord, NewsletterStore, OptimizedRecord, StoredNewsletter, UpsertOutcome};
use crate::newsletter::NewsletterResult;
use crate::session::parse_newsletter_id;

#[derive(Debug, Clone)]
pub struct PgNewsletterStore {
    pool: PgPool,
}

impl PgNewsletterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn outcome(inserted: bool) -> UpsertOutcome {
    if inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    }
}

#[async_trait]
impl NewsletterStore for PgNewsletterStore {
    async fn latest_subject(&self) -> NewsletterResult<Option<String>> {
        // Use persistent(false) to avoid prepared statements (required for pgBouncer)
        let subject: Option<String> = sqlx::query_scalar(
            r#"
            SELECT subject
            FROM newsletters
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .persistent(false)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subject)
    }

    async fn save_newsletter(&self, newsletter: &StoredNewsletter) -> NewsletterResult<()> {
        sqlx::query(
            r#"
            INSERT INTO newsletters (subject, body, received_at, received_at_raw, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&newsletter.subject)
        .bind(&newsletter.body)
        .bind(newsletter.received_at)
        .bind(&newsletter.received_at_raw)
        .bind(newsletter.timestamp)
        .persistent(false)
        .execute(&self.pool)
        .await?;

        info!(subject = %newsletter.subject, "Archived newsletter");
        Ok(())
    }

    async fn upsert_optimized(&self, record: &OptimizedRecord) -> NewsletterResult<UpsertOutcome> {
        parse_newsletter_id(&record.newsletter_id)?;

        // xmax is 0 only for freshly inserted tuples
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO optimized_newsletters
            (newsletter_id, key_levels, key_levels_raw, trade_plan, core_levels,
             trade_recap, optimized_content, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (newsletter_id) DO UPDATE SET
                key_levels = EXCLUDED.key_levels,
                key_levels_raw = EXCLUDED.key_levels_raw,
                trade_plan = EXCLUDED.trade_plan,
                core_levels = EXCLUDED.core_levels,
                trade_recap = EXCLUDED.trade_recap,
                optimized_content = EXCLUDED.optimized_content,
                timestamp = EXCLUDED.timestamp
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&record.newsletter_id)
        .bind(&record.key_levels)
        .bind(&record.key_levels_raw)
        .bind(&record.trade_plan)
        .bind(&record.core_levels)
        .bind(&record.trade_recap)
        .bind(&record.optimized_content)
        .bind(record.timestamp)
        .persistent(false)
        .fetch_one(&self.pool)
        .await?;

        let result = outcome(inserted);
        info!(newsletter_id = %record.newsletter_id, outcome = ?result, "Upserted optimized newsletter");
        Ok(result)
    }

    async fn upsert_analysis(&self, record: &AnalysisRecord) -> NewsletterResult<UpsertOutcome> {
        parse_newsletter_id(&record.newsletter_id)?;

        // market_events belongs to the calendar job; keep whatever it wrote
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO newsletter_analysis
            (newsletter_id, original_levels, trade_plan, market_events, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (newsletter_id) DO UPDATE SET
                original_levels = EXCLUDED.original_levels,
                trade_plan = EXCLUDED.trade_plan,
                market_events = COALESCE(EXCLUDED.market_events, newsletter_analysis.market_events),
                timestamp = EXCLUDED.timestamp
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&record.newsletter_id)
        .bind(&record.original_levels)
        .bind(&record.trade_plan)
        .bind(&record.market_events)
        .bind(record.timestamp)
        .persistent(false)
        .fetch_one(&self.pool)
        .await?;

        let result = outcome(inserted);
        info!(newsletter_id = %record.newsletter_id, outcome = ?result, "Upserted newsletter analysis");
        Ok(result)
    }

    async fn get_optimized(&self, newsletter_id: &str) -> NewsletterResult<Option<OptimizedRecord>> {
        parse_newsletter_id(newsletter_id)?;

        let row = sqlx::query(
            r#"
            SELECT newsletter_id, key_levels, key_levels_raw, trade_plan, core_levels,
                   trade_recap, optimized_content, timestamp
            FROM optimized_newsletters
            WHERE newsletter_id = $1
            "#,
        )
        .bind(newsletter_id)
        .persistent(false)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(OptimizedRecord {
            newsletter_id: row.try_get("newsletter_id")?,
            key_levels: row.try_get("key_levels")?,
            key_levels_raw: row.try_get("key_levels_raw")?,
            trade_plan: row.try_get("trade_plan")?,
            core_levels: row.try_get("core_levels")?,
            trade_recap: row.try_get("trade_recap")?,
            optimized_content: row.try_get("optimized_content")?,
            timestamp: row.try_get("timestamp")?,
        }))
    }

    async fn get_analysis(&self, newsletter_id: &str) -> NewsletterResult<Option<AnalysisRecord>> {
        parse_newsletter_id(newsletter_id)?;

        let row = sqlx::query(
            r#"
            SELECT newsletter_id, original_levels, trade_plan, market_events, timestamp
            FROM newsletter_analysis
            WHERE newsletter_id = $1
            "#,
        )
        .bind(newsletter_id)
        .persistent(false)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(AnalysisRecord {
            newsletter_id: row.try_get("newsletter_id")?,
            original_levels: row.try_get("original_levels")?,
            trade_plan: row.try_get("trade_plan")?,
            market_events: row.try_get("market_events")?,
            timestamp: row.try_get("timestamp")?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newsletter::NewsletterError;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;

    // Lazy pool never connects, so these only pass if ids are rejected up front
    fn unreachable_store() -> PgNewsletterStore {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://newsletter@127.0.0.1:1/unused")
            .unwrap();
        PgNewsletterStore::new(pool)
    }

    #[tokio::test]
    async fn test_malformed_newsletter_id_rejected_before_query() {
        let store = unreachable_store();
        let record = OptimizedRecord {
            newsletter_id: "20250230".to_string(),
            key_levels: String::new(),
            key_levels_raw: String::new(),
            trade_plan: None,
            core_levels: None,
            trade_recap: None,
            optimized_content: String::new(),
            timestamp: Utc::now(),
        };

        assert!(matches!(
            store.upsert_optimized(&record).await,
            Err(NewsletterError::Validation { .. })
        ));
        assert!(matches!(
            store.get_optimized("2025-01-13").await,
            Err(NewsletterError::Validation { .. })
        ));
        assert!(matches!(
            store.get_analysis("garbage").await,
            Err(NewsletterError::Validation { .. })
        ));
    }
}
