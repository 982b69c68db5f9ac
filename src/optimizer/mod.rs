//! Newsletter optimizer: cleanup, section segmentation and field extraction.
//!
//! A fixed, ordered list of stages runs over an [`OptimizeContext`]. Each
//! stage takes the context by value and returns the next one; nothing is
//! shared between runs.

pub mod anchors;
pub mod chunker;
pub mod extract;
pub mod html;
pub mod normalize;
pub mod template;

pub use anchors::{find_anchors, Anchor};
pub use chunker::{chunk, SectionSpan, Sections};
pub use extract::{
    extract, format_keylevels, format_keylevels_raw, ExtractedLevel, ExtractionResult, LevelKind,
    LevelMention,
};
pub use html::html_to_text;
pub use normalize::normalize;
pub use template::{AnchorCatalog, CatalogEntry, SectionTag, Template};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::session::SessionId;

/// Per-run state handed from stage to stage
#[derive(Debug, Clone, Default)]
pub struct OptimizeContext {
    pub weekday_name: String,
    /// Body as received, or its text rendering once the HTML stage ran
    pub text: String,
    pub cleaned: String,
    pub anchors: Vec<Anchor>,
    pub sections: Sections,
    pub extraction: ExtractionResult,
}

impl OptimizeContext {
    pub fn new(body: &str, weekday_name: &str) -> Self {
        Self {
            weekday_name: weekday_name.to_string(),
            text: body.to_string(),
            ..Self::default()
        }
    }
}

pub type Stage = fn(OptimizeContext, &Template) -> OptimizeContext;

fn html_stage(ctx: OptimizeContext, _template: &Template) -> OptimizeContext {
    let text = html_to_text(&ctx.text);
    OptimizeContext { text, ..ctx }
}

fn normalize_stage(ctx: OptimizeContext, _template: &Template) -> OptimizeContext {
    let cleaned = normalize(&ctx.text);
    OptimizeContext { cleaned, ..ctx }
}

fn anchor_stage(ctx: OptimizeContext, template: &Template) -> OptimizeContext {
    let anchors = find_anchors(&ctx.cleaned, &template.catalog);
    OptimizeContext { anchors, ..ctx }
}

fn chunk_stage(ctx: OptimizeContext, template: &Template) -> OptimizeContext {
    let sections = chunk(&ctx.cleaned, &ctx.anchors, &ctx.weekday_name, template);
    OptimizeContext { sections, ..ctx }
}

fn extract_stage(ctx: OptimizeContext, template: &Template) -> OptimizeContext {
    let extraction = extract(&ctx.sections, &ctx.cleaned, template);
    OptimizeContext { extraction, ..ctx }
}

/// Pipeline stages in execution order
pub const STAGES: [(&str, Stage); 5] = [
    ("html_to_text", html_stage),
    ("normalize", normalize_stage),
    ("find_anchors", anchor_stage),
    ("chunk", chunk_stage),
    ("extract", extract_stage),
];

/// Result of optimizing one newsletter body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedNewsletter {
    pub session: SessionId,
    pub cleaned_body: String,
    pub sections: Sections,
    pub extraction: ExtractionResult,
}

impl OptimizedNewsletter {
    pub fn newsletter_id(&self) -> &str {
        &self.session.date_key
    }

    pub fn section(&self, tag: SectionTag) -> Option<&str> {
        self.sections.text(tag)
    }
}

/// Run every stage over `body` for the given session. Pure and infallible.
pub fn optimize(body: &str, session: &SessionId, template: &Template) -> OptimizedNewsletter {
    let mut ctx = OptimizeContext::new(body, &session.weekday_name);

    for (name, stage) in STAGES.iter() {
        ctx = stage(ctx, template);
        debug!(stage = name, "Optimizer stage complete");
    }

    OptimizedNewsletter {
        session: session.clone(),
        cleaned_body: ctx.cleaned,
        sections: ctx.sections,
        extraction: ctx.extraction,
    }
}
