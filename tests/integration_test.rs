use anyhow::Result;
use newsletter_optimizer::{config::Config, db::Database, optimizer::Template};

#[test]
fn test_config_missing_database_url() {
    std::env::remove_var("DATABASE_URL");
    let config = Config::load().expect("config loads without a database");
    let err = config.database.require_url().unwrap_err();
    assert!(err.to_string().to_lowercase().contains("database_url"));
}

#[test]
fn test_template_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("template.json");
    std::fs::write(
        &path,
        r#"{"catalog": [{"tag": "core_levels", "variants": ["levels for tomorrow"]}], "context_window": 12}"#,
    )?;

    let template = Template::load(&path)?;
    assert_eq!(template.context_window, 12);
    assert_eq!(template.catalog.entries.len(), 1);
    assert_eq!(template.catalog.entries[0].variants, vec!["levels for tomorrow".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_database_health_check() -> Result<()> {
    if std::env::var("DATABASE_URL").is_err() {
        // Skip test if no database configured
        return Ok(());
    }

    let config = Config::load()?;
    let db = Database::new(&config.database).await?;
    db.health_check().await?;
    Ok(())
}
