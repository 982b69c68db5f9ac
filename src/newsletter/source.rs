//! Mail collaborator boundary.
//!
//! Provider authentication and inbox search live outside this crate; a source
//! only has to hand back the latest newsletter as subject, body and date header.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{NewsletterError, NewsletterResult, RawDocument};

#[async_trait]
pub trait MailSource: Send + Sync {
    /// Fetch the most recent newsletter, if any.
    async fn latest(&self) -> NewsletterResult<Option<RawDocument>>;
}

/// Wire shape of an exported email
#[derive(Debug, Deserialize)]
struct ExportedEmail {
    subject: String,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    date: String,
}

/// Reads a single exported email from a JSON file.
///
/// Accepted keys: `subject`, `date`, and the body as `html`, `text` or `body`.
/// The HTML part is preferred when present, like the upstream mailbox export.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn parse(contents: &str) -> NewsletterResult<RawDocument> {
        let email: ExportedEmail = serde_json::from_str(contents)?;

        let body = email
            .html
            .filter(|h| !h.trim().is_empty())
            .or(email.text)
            .or(email.body)
            .ok_or_else(|| NewsletterError::parse_error("email export has no html, text or body field"))?;

        Ok(RawDocument::new(email.subject, body, &email.date))
    }
}

#[async_trait]
impl MailSource for JsonFileSource {
    async fn latest(&self) -> NewsletterResult<Option<RawDocument>> {
        if !tokio::fs::try_exists(&self.path).await? {
            info!(path = %self.path.display(), "No exported newsletter found");
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&self.path).await?;
        let doc = Self::parse(&contents)?;
        info!(subject = %doc.subject, "Loaded newsletter from export");
        Ok(Some(doc))
    }
}
