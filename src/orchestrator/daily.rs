//! Daily newsletter orchestrator
//! Coordinates one run: duplicate check first, then extraction, upserts, and the archive

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    newsletter::{is_duplicate, MailSource, RawDocument},
    optimizer::{optimize, OptimizedNewsletter, SectionTag, Template},
    session,
    store::{AnalysisRecord, NewsletterStore, OptimizedRecord, StoredNewsletter, UpsertOutcome},
};

/// What a single run did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RunOutcome {
    /// The mail source had nothing to offer
    NoNewsletter,
    /// Same subject as the latest archived newsletter; nothing extracted
    Duplicate { subject: String },
    Processed {
        newsletter_id: String,
        optimized: UpsertOutcome,
        analysis: UpsertOutcome,
        level_lines: usize,
        has_trade_plan: bool,
    },
}

pub struct DailyOrchestrator<S: NewsletterStore> {
    store: S,
    template: Template,
    timezone: Tz,
}

impl<S: NewsletterStore> DailyOrchestrator<S> {
    pub fn new(store: S, template: Template, timezone: Tz) -> Self {
        Self {
            store,
            template,
            timezone,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch the latest newsletter from `source` and process it
    pub async fn run_from_source(&self, source: &dyn MailSource, now: DateTime<Utc>) -> Result<RunOutcome> {
        info!("Starting newsletter run");

        let doc = source
            .latest()
            .await
            .context("Failed to fetch the latest newsletter")?;

        match doc {
            Some(doc) => self.process(doc, now).await,
            None => {
                warn!("No newsletter available from mail source");
                Ok(RunOutcome::NoNewsletter)
            }
        }
    }

    /// Process one fetched newsletter. Storage errors propagate unchanged.
    pub async fn process(&self, doc: RawDocument, now: DateTime<Utc>) -> Result<RunOutcome> {
        // Step 1: duplicate gate, before any body work
        let last_subject = self
            .store
            .latest_subject()
            .await
            .context("Failed to read latest newsletter subject")?;

        if is_duplicate(&doc.subject, last_subject.as_deref()) {
            info!(subject = %doc.subject, "Newsletter already processed, skipping");
            return Ok(RunOutcome::Duplicate { subject: doc.subject });
        }

        // Step 2: resolve the session and extract
        let session = session::resolve_in(now, self.timezone);
        info!(
            newsletter_id = %session.date_key,
            weekday = %session.weekday_name,
            subject = %doc.subject,
            "Optimizing newsletter"
        );
        let optimized = optimize(&doc.body, &session, &self.template);
        self.log_extraction(&optimized);

        // Step 3: upsert both records for the session
        let optimized_outcome = self
            .store
            .upsert_optimized(&OptimizedRecord::from_optimized(&optimized, now))
            .await
            .context("Failed to store optimized newsletter")?;
        let analysis_outcome = self
            .store
            .upsert_analysis(&AnalysisRecord::from_optimized(&optimized, now))
            .await
            .context("Failed to store newsletter analysis")?;

        // Step 4: archive last; the archived subject is what marks a duplicate
        self.store
            .save_newsletter(&StoredNewsletter::from_document(&doc, now))
            .await
            .context("Failed to archive newsletter")?;

        info!(newsletter_id = %session.date_key, "Newsletter run complete");

        Ok(RunOutcome::Processed {
            newsletter_id: session.date_key,
            optimized: optimized_outcome,
            analysis: analysis_outcome,
            level_lines: optimized.extraction.formatted_levels.lines().count(),
            has_trade_plan: optimized.sections.contains(SectionTag::TradePlan),
        })
    }

    fn log_extraction(&self, optimized: &OptimizedNewsletter) {
        let extraction = &optimized.extraction;
        info!(
            newsletter_id = %optimized.newsletter_id(),
            sections = optimized.sections.len(),
            price_levels = extraction.price_levels.len(),
            trade_setups = extraction.trade_setups.len(),
            risk_score = extraction.risk_score,
            "Extraction summary"
        );

        if !optimized.sections.contains(SectionTag::TradePlan) {
            warn!(
                weekday = %optimized.session.weekday_name,
                "No trade plan header found for session weekday"
            );
        }
    }
}
