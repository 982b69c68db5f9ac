//! Extraction template: the static configuration describing one newsletter
//! layout. Loadable from JSON so a new template needs no code change.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::newsletter::{NewsletterError, NewsletterResult};

/// Logical newsletter sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    CoreLevels,
    TradeRecap,
    TradePlan,
}

impl SectionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionTag::CoreLevels => "core_levels",
            SectionTag::TradeRecap => "trade_recap",
            SectionTag::TradePlan => "trade_plan",
        }
    }
}

/// Header phrase variants for one section tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub tag: SectionTag,
    pub variants: Vec<String>,
}

/// Ordered catalog of section header phrases. Declaration order is the
/// tie-break when two anchors share an offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorCatalog {
    pub entries: Vec<CatalogEntry>,
}

impl AnchorCatalog {
    /// Position of `tag` in declaration order
    pub fn rank(&self, tag: SectionTag) -> usize {
        self.entries
            .iter()
            .position(|e| e.tag == tag)
            .unwrap_or(self.entries.len())
    }
}

impl Default for AnchorCatalog {
    fn default() -> Self {
        let entry = |tag, variants: &[&str]| CatalogEntry {
            tag,
            variants: variants.iter().map(|v| v.to_string()).collect(),
        };

        Self {
            entries: vec![
                entry(
                    SectionTag::CoreLevels,
                    &["core structures", "key levels", "levels to engage"],
                ),
                entry(
                    SectionTag::TradeRecap,
                    &["trade recap", "trading recap", "trade education"],
                ),
            ],
        }
    }
}

/// Keywords classifying a price by its surrounding text.
/// Checked in order: support, resistance, target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelKeywords {
    pub support: Vec<String>,
    pub resistance: Vec<String>,
    pub target: Vec<String>,
}

impl Default for LevelKeywords {
    fn default() -> Self {
        Self {
            support: vec!["support".to_string()],
            resistance: vec!["resistance".to_string()],
            target: vec!["target".to_string()],
        }
    }
}

/// Shape of a price token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricePattern {
    pub min_integer_digits: usize,
    pub max_integer_digits: usize,
    pub max_decimals: usize,
}

impl Default for PricePattern {
    fn default() -> Self {
        // ES/NQ style four-digit prices with cents
        Self {
            min_integer_digits: 4,
            max_integer_digits: 4,
            max_decimals: 2,
        }
    }
}

impl PricePattern {
    /// Regex source for this pattern, anchored on word boundaries
    pub fn regex_source(&self) -> String {
        let min = self.min_integer_digits.max(1);
        let max = self.max_integer_digits.max(min);
        if self.max_decimals == 0 {
            format!(r"\b\d{{{},{}}}\b", min, max)
        } else {
            format!(r"\b\d{{{},{}}}(?:\.\d{{1,{}}})?\b", min, max, self.max_decimals)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub catalog: AnchorCatalog,
    pub level_keywords: LevelKeywords,
    pub price_pattern: PricePattern,
    /// Characters of context kept on each side of a price
    pub context_window: usize,
    /// Trade plan header, completed with the session weekday name
    pub trade_plan_prefix: String,
    /// Opening of the closing trade plan paragraph
    pub summary_marker: String,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            catalog: AnchorCatalog::default(),
            level_keywords: LevelKeywords::default(),
            price_pattern: PricePattern::default(),
            context_window: 20,
            trade_plan_prefix: "Trade Plan ".to_string(),
            summary_marker: "In summary for tomorrow:".to_string(),
        }
    }
}

impl Template {
    pub fn from_json(json: &str) -> NewsletterResult<Self> {
        let template: Template = serde_json::from_str(json)?;
        template.validate()?;
        Ok(template)
    }

    pub fn load(path: impl AsRef<Path>) -> NewsletterResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> NewsletterResult<()> {
        for entry in &self.catalog.entries {
            if entry.tag == SectionTag::TradePlan {
                return Err(NewsletterError::validation_error(
                    "catalog",
                    "trade_plan is located by its weekday header, not by catalog anchors",
                ));
            }
            if entry.variants.iter().any(|v| v.trim().is_empty()) {
                return Err(NewsletterError::validation_error(
                    "catalog",
                    "header variants cannot be empty",
                ));
            }
        }

        let p = &self.price_pattern;
        if p.min_integer_digits == 0 || p.min_integer_digits > p.max_integer_digits {
            return Err(NewsletterError::validation_error(
                "price_pattern",
                "integer digit range must be non-empty and start at 1 or more",
            ));
        }

        if self.summary_marker.trim().is_empty() {
            return Err(NewsletterError::validation_error(
                "summary_marker",
                "summary marker cannot be empty",
            ));
        }

        Ok(())
    }

    /// Header line that opens the trade plan for `weekday_name`
    pub fn trade_plan_header(&self, weekday_name: &str) -> String {
        format!("{}{}", self.trade_plan_prefix, weekday_name)
    }
}
