use anyhow::Result;

use newsletter_optimizer::{config::Config, db::Database};

pub async fn execute(config: &Config) -> Result<()> {
    let db = Database::new(&config.database).await?;
    db.health_check().await?;
    db.run_migrations().await?;

    let ready = db.schema_ready().await?;
    db.close().await;
    if !ready {
        anyhow::bail!("Migrations ran but the newsletter tables are still missing");
    }

    println!("Database migrations completed successfully");
    Ok(())
}
