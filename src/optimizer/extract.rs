//! Field extraction from chunked sections and the full cleaned text.
//!
//! Every extractor is independent and reads immutable text only.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::chunker::Sections;
use super::template::{LevelKeywords, SectionTag, Template};

lazy_static! {
    static ref TRADE_SETUP: Regex = Regex::new(r"(?im)Trade Setup:[ \t]*([^\n]*)")
        .expect("Failed to compile TRADE_SETUP regex - this is a bug in the hardcoded pattern");

    static ref RISK_WORD: Regex = Regex::new(r"(?i)\brisk\b")
        .expect("Failed to compile RISK_WORD regex - this is a bug in the hardcoded pattern");

    /// Legacy signal: a number directly followed by support/resistance
    static ref LEVEL_MENTION: Regex = Regex::new(
        r"(?i)\b(\d+(?:\.\d+)?)\s*(support|resistance)"
    ).expect("Failed to compile LEVEL_MENTION regex - this is a bug in the hardcoded pattern");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
    Target,
    Unknown,
}

impl LevelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelKind::Support => "support",
            LevelKind::Resistance => "resistance",
            LevelKind::Target => "target",
            LevelKind::Unknown => "unknown",
        }
    }
}

/// A price token found in the text, classified by nearby keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLevel {
    /// Price as written, e.g. "6050.25"
    pub price: String,
    pub kind: LevelKind,
    pub context: String,
}

/// "<number> support|resistance" mention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelMention {
    pub value: String,
    pub kind: LevelKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Level lines of the core levels section, one per line
    pub formatted_levels: String,
    /// `formatted_levels` reduced to the text before each colon
    pub raw_levels: String,
    pub price_levels: Vec<ExtractedLevel>,
    pub trade_setups: Vec<String>,
    pub risk_score: usize,
    pub level_mentions: Vec<LevelMention>,
}

/// Keep the lines that start with a digit
pub fn format_keylevels(core_levels: &str) -> String {
    core_levels
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce each formatted level line to its part before the first colon
pub fn format_keylevels_raw(formatted_levels: &str) -> String {
    formatted_levels
        .lines()
        .map(|line| line.split(':').next().unwrap_or(line).trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classify by context; support wins over resistance, resistance over target
pub fn classify(context: &str, keywords: &LevelKeywords) -> LevelKind {
    let lowered = context.to_lowercase();
    let hit = |words: &[String]| words.iter().any(|w| !w.is_empty() && lowered.contains(&w.to_lowercase()));

    if hit(&keywords.support) {
        LevelKind::Support
    } else if hit(&keywords.resistance) {
        LevelKind::Resistance
    } else if hit(&keywords.target) {
        LevelKind::Target
    } else {
        LevelKind::Unknown
    }
}

/// `width` characters either side of `start..end`, the match included
fn context_window(text: &str, start: usize, end: usize, width: usize) -> &str {
    let left = if width == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(width - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let right = text[end..]
        .char_indices()
        .nth(width)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    &text[left..right]
}

/// Scan the whole text for price tokens
pub fn extract_price_levels(text: &str, template: &Template) -> Vec<ExtractedLevel> {
    let pattern = match RegexBuilder::new(&template.price_pattern.regex_source()).build() {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Invalid price pattern, skipping price extraction");
            return Vec::new();
        }
    };

    pattern
        .find_iter(text)
        .map(|m| {
            let context = context_window(text, m.start(), m.end(), template.context_window);
            ExtractedLevel {
                price: m.as_str().to_string(),
                kind: classify(context, &template.level_keywords),
                context: context.to_string(),
            }
        })
        .collect()
}

/// Text following every "Trade Setup:" label
pub fn extract_trade_setups(text: &str) -> Vec<String> {
    TRADE_SETUP
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whole-word, case-insensitive count of "risk"
pub fn risk_score(text: &str) -> usize {
    RISK_WORD.find_iter(text).count()
}

pub fn extract_level_mentions(text: &str) -> Vec<LevelMention> {
    LEVEL_MENTION
        .captures_iter(text)
        .map(|caps| {
            let kind = if caps[2].eq_ignore_ascii_case("support") {
                LevelKind::Support
            } else {
                LevelKind::Resistance
            };
            LevelMention {
                value: caps[1].to_string(),
                kind,
            }
        })
        .collect()
}

/// Run every extractor
pub fn extract(sections: &Sections, full_cleaned_text: &str, template: &Template) -> ExtractionResult {
    let formatted_levels = sections
        .text(SectionTag::CoreLevels)
        .map(format_keylevels)
        .unwrap_or_default();
    let raw_levels = format_keylevels_raw(&formatted_levels);

    ExtractionResult {
        formatted_levels,
        raw_levels,
        price_levels: extract_price_levels(full_cleaned_text, template),
        trade_setups: extract_trade_setups(full_cleaned_text),
        risk_score: risk_score(full_cleaned_text),
        level_mentions: extract_level_mentions(full_cleaned_text),
    }
}
