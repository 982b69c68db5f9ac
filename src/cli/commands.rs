use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use newsletter_optimizer::{
    config::Config,
    db::Database,
    newsletter::{JsonFileSource, MailSource, NewsletterError},
    optimizer::{optimize as run_optimizer, SectionTag},
    orchestrator::{DailyOrchestrator, RunOutcome},
    session::{self, SessionId},
    store::{NewsletterStore, OptimizedRecord, PgNewsletterStore},
};

/// Process an exported newsletter against the database
pub async fn process(config: &Config, file: PathBuf, at: Option<DateTime<Utc>>) -> Result<()> {
    let tz = config.session.tz()?;
    let db = Database::connect_ready(&config.database).await?;
    let store = PgNewsletterStore::new(db.pool.clone());
    let orchestrator = DailyOrchestrator::new(store, config.template.clone(), tz);

    let source = JsonFileSource::new(&file);
    let result = orchestrator
        .run_from_source(&source, at.unwrap_or_else(Utc::now))
        .await;
    db.close().await;
    let outcome = result?;

    match &outcome {
        RunOutcome::NoNewsletter => println!("No newsletter found at {}", file.display()),
        RunOutcome::Duplicate { subject } => {
            println!("Skipped duplicate newsletter: {}", subject)
        }
        RunOutcome::Processed {
            newsletter_id,
            optimized,
            analysis,
            level_lines,
            has_trade_plan,
        } => {
            println!("Processed newsletter {}", newsletter_id);
            println!("   Optimized record: {:?}", optimized);
            println!("   Analysis record:  {:?}", analysis);
            println!("   Key level lines:  {}", level_lines);
            println!("   Trade plan found: {}", has_trade_plan);
        }
    }

    Ok(())
}

/// Pure extraction, printed as JSON
pub async fn optimize(
    config: &Config,
    file: PathBuf,
    weekday: Option<String>,
    at: Option<DateTime<Utc>>,
) -> Result<()> {
    let doc = JsonFileSource::new(&file)
        .latest()
        .await?
        .with_context(|| format!("No newsletter export at {}", file.display()))?;

    let mut session = session::resolve_in(at.unwrap_or_else(Utc::now), config.session.tz()?);
    if let Some(weekday) = weekday {
        info!(weekday = %weekday, "Overriding trade plan weekday");
        session.weekday_name = weekday;
    }

    let optimized = run_optimizer(&doc.body, &session, &config.template);
    if !optimized.sections.contains(SectionTag::TradePlan) {
        warn!("No 'Trade Plan {}' header found", session.weekday_name);
    }

    let output = serde_json::json!({
        "subject": doc.subject,
        "record": OptimizedRecord::from_optimized(&optimized, Utc::now()),
        "extraction": optimized.extraction,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print the session a reference instant resolves to
pub fn session(config: &Config, at: Option<DateTime<Utc>>) -> Result<()> {
    let session: SessionId = session::resolve_in(at.unwrap_or_else(Utc::now), config.session.tz()?);
    println!("{} {}", session.date_key, session.weekday_name);
    Ok(())
}

/// Print the stored optimized record for a session
pub async fn show(config: &Config, id: String) -> Result<()> {
    // reject malformed ids before opening a connection
    session::parse_newsletter_id(&id)?;

    let db = Database::connect_ready(&config.database).await?;
    let store = PgNewsletterStore::new(db.pool.clone());

    let found = find_optimized(&store, &id).await;
    db.close().await;

    println!("{}", serde_json::to_string_pretty(&found?)?);
    Ok(())
}

/// Stored optimized record for `id`, or `NotFound`
async fn find_optimized<S: NewsletterStore>(store: &S, id: &str) -> Result<OptimizedRecord, NewsletterError> {
    store
        .get_optimized(id)
        .await?
        .ok_or_else(|| NewsletterError::NotFound(id.to_string()))
}
