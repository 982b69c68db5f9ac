//! Section chunking
//!
//! Turns the sorted anchor list into section spans. The trade plan is located
//! on its own from the session weekday header and is a hard upper bound for
//! every other span.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::anchors::Anchor;
use super::template::{SectionTag, Template};

lazy_static! {
    /// Paragraph break: two or more newlines
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n[ \t]*\n")
        .expect("Failed to compile PARAGRAPH_BREAK regex - this is a bug in the hardcoded pattern");
}

/// A contiguous range of the cleaned text attributed to one section.
/// `text == cleaned_text[start..end]`, already trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpan {
    pub tag: SectionTag,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl SectionSpan {
    fn from_range(tag: SectionTag, text: &str, start: usize, end: usize) -> Self {
        let end = end.max(start);
        let slice = &text[start..end];
        let trimmed_start = start + (slice.len() - slice.trim_start().len());
        let trimmed_end = start + slice.trim_end().len();
        let (start, end) = if trimmed_start >= trimmed_end {
            (start, start)
        } else {
            (trimmed_start, trimmed_end)
        };

        Self {
            tag,
            start,
            end,
            text: text[start..end].to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Chunked sections keyed by tag. A tag with no anchor is absent, which is
/// distinct from a present but empty span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    spans: BTreeMap<SectionTag, SectionSpan>,
}

impl Sections {
    pub fn get(&self, tag: SectionTag) -> Option<&SectionSpan> {
        self.spans.get(&tag)
    }

    pub fn text(&self, tag: SectionTag) -> Option<&str> {
        self.spans.get(&tag).map(|s| s.text.as_str())
    }

    pub fn contains(&self, tag: SectionTag) -> bool {
        self.spans.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Spans other than the trade plan, ordered by start offset
    pub fn anchored_spans(&self) -> Vec<&SectionSpan> {
        let mut spans: Vec<&SectionSpan> = self
            .spans
            .values()
            .filter(|s| s.tag != SectionTag::TradePlan)
            .collect();
        spans.sort_by_key(|s| (s.start, s.end));
        spans
    }
}

/// Byte offset of the start of the line holding `offset`
fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Locate the trade plan for `weekday_name`: from a line reading exactly
/// "Trade Plan <weekday>" through the end of the paragraph that opens with
/// the summary marker. No header, no trade plan; other weekdays never match.
/// Without a summary paragraph the plan runs to the end of the document.
pub fn locate_trade_plan(cleaned_text: &str, weekday_name: &str, template: &Template) -> Option<(usize, usize)> {
    let header = template.trade_plan_header(weekday_name);

    let mut offset = 0;
    let mut header_start = None;
    for line in cleaned_text.split('\n') {
        if line == header {
            header_start = Some(offset);
            break;
        }
        offset += line.len() + 1;
    }
    let header_start = header_start?;

    let summary = RegexBuilder::new(&format!(r"^[ \t]*{}", regex::escape(&template.summary_marker)))
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .ok()?;

    let after_header = &cleaned_text[header_start..];
    let end = match summary.find(after_header) {
        Some(m) => {
            let paragraph_start = header_start + m.start();
            match PARAGRAPH_BREAK.find(&cleaned_text[paragraph_start..]) {
                Some(brk) => paragraph_start + brk.start(),
                None => cleaned_text.len(),
            }
        }
        None => {
            debug!(header = %header, "Trade plan has no summary paragraph, running to end of document");
            cleaned_text.len()
        }
    };

    Some((header_start, end))
}

/// Split cleaned text into sections.
///
/// Anchors sharing a header line collapse into the first one on that line.
/// Each span runs from the line after its header to the next anchor (or the
/// end of the document), clipped at the trade plan start. When a tag has
/// several anchors the earliest span is kept.
pub fn chunk(cleaned_text: &str, anchors: &[Anchor], weekday_name: &str, template: &Template) -> Sections {
    let mut spans = BTreeMap::new();

    let trade_plan = locate_trade_plan(cleaned_text, weekday_name, template);
    let plan_start = trade_plan.map(|(start, _)| start);

    let mut sorted: Vec<Anchor> = anchors.to_vec();
    sorted.sort_by_key(|a| (a.offset, template.catalog.rank(a.section_tag)));

    let mut headers: Vec<Anchor> = Vec::with_capacity(sorted.len());
    for anchor in sorted {
        if anchor.offset > cleaned_text.len() {
            continue;
        }
        let same_line = headers
            .last()
            .map(|prev| line_start(cleaned_text, prev.offset) == line_start(cleaned_text, anchor.offset))
            .unwrap_or(false);
        if !same_line {
            headers.push(anchor);
        }
    }

    for (i, anchor) in headers.iter().enumerate() {
        let mut end = headers
            .get(i + 1)
            .map(|next| next.offset)
            .unwrap_or(cleaned_text.len());
        if let Some(limit) = plan_start {
            end = end.min(limit);
        }

        let span = match cleaned_text[anchor.offset..].find('\n') {
            Some(nl) if anchor.offset + nl + 1 < end => {
                SectionSpan::from_range(anchor.section_tag, cleaned_text, anchor.offset + nl + 1, end)
            }
            _ => SectionSpan::from_range(anchor.section_tag, cleaned_text, end, end),
        };

        spans.entry(anchor.section_tag).or_insert(span);
    }

    if let Some((start, end)) = trade_plan {
        spans.insert(
            SectionTag::TradePlan,
            SectionSpan::from_range(SectionTag::TradePlan, cleaned_text, start, end),
        );
    }

    debug!(sections = spans.len(), anchors = anchors.len(), "Chunked newsletter sections");
    Sections { spans }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::anchors::find_anchors;

    const NEWSLETTER: &str = "Core Structures/Levels To Engage\n6050.00: support\n6100.00: resistance\nTrade Recap/Education\nWe bought the dip.\nTrade Plan Monday\nLongs above 6050.\nIn summary for tomorrow: stay flat.\n\nAs always, manage risk.";

    fn chunk_default(text: &str, weekday: &str) -> Sections {
        let template = Template::default();
        let anchors = find_anchors(text, &template.catalog);
        chunk(text, &anchors, weekday, &template)
    }

    #[test]
    fn test_full_newsletter_sections() {
        let sections = chunk_default(NEWSLETTER, "Monday");

        assert_eq!(
            sections.text(SectionTag::CoreLevels),
            Some("6050.00: support\n6100.00: resistance")
        );
        assert_eq!(sections.text(SectionTag::TradeRecap), Some("We bought the dip."));
        assert_eq!(
            sections.text(SectionTag::TradePlan),
            Some("Trade Plan Monday\nLongs above 6050.\nIn summary for tomorrow: stay flat.")
        );

        let recap = sections.get(SectionTag::TradeRecap).unwrap();
        let plan = sections.get(SectionTag::TradePlan).unwrap();
        assert!(recap.end <= plan.start);
    }

    #[test]
    fn test_span_text_matches_offsets() {
        let sections = chunk_default(NEWSLETTER, "Monday");
        for tag in [SectionTag::CoreLevels, SectionTag::TradeRecap, SectionTag::TradePlan] {
            let span = sections.get(tag).unwrap();
            assert_eq!(&NEWSLETTER[span.start..span.end], span.text);
        }
    }

    #[test]
    fn test_wrong_weekday_has_no_trade_plan() {
        let sections = chunk_default(NEWSLETTER, "Tuesday");
        assert!(!sections.contains(SectionTag::TradePlan));
        // without the plan the recap runs to the end of the document
        let recap = sections.text(SectionTag::TradeRecap).unwrap();
        assert!(recap.contains("Trade Plan Monday"));
        assert!(recap.ends_with("As always, manage risk."));
    }

    #[test]
    fn test_missing_tag_is_absent() {
        let text = "Trade Recap\nQuiet day.";
        let sections = chunk_default(text, "Monday");
        assert!(!sections.contains(SectionTag::CoreLevels));
        assert_eq!(sections.text(SectionTag::TradeRecap), Some("Quiet day."));
    }

    #[test]
    fn test_header_without_newline_is_present_but_empty() {
        let sections = chunk_default("Intro\nKey Levels", "Monday");
        let span = sections.get(SectionTag::CoreLevels).unwrap();
        assert!(span.is_empty());
    }

    #[test]
    fn test_trade_plan_without_summary_runs_to_end() {
        let text = "Trade Recap\nRecap body\nTrade Plan Friday\nLongs only.\n\nSee you Monday.";
        let sections = chunk_default(text, "Friday");
        assert_eq!(
            sections.text(SectionTag::TradePlan),
            Some("Trade Plan Friday\nLongs only.\n\nSee you Monday.")
        );
        assert_eq!(sections.text(SectionTag::TradeRecap), Some("Recap body"));
    }

    #[test]
    fn test_summary_paragraph_to_document_end() {
        let text = "Trade Plan Monday\nIn summary for tomorrow: buy dips.\nNothing else.";
        let sections = chunk_default(text, "Monday");
        assert_eq!(sections.text(SectionTag::TradePlan), Some(text));
    }

    #[test]
    fn test_trade_plan_header_is_exact() {
        for text in [
            "Trade Recap\nx\n  Trade Plan Monday\nIn summary for tomorrow: flat.",
            "Trade Recap\nx\nTrade Plan Monday \nIn summary for tomorrow: flat.",
            "Trade Recap\nx\ntrade plan monday\nIn summary for tomorrow: flat.",
        ] {
            let sections = chunk_default(text, "Monday");
            assert!(!sections.contains(SectionTag::TradePlan), "matched {:?}", text);
        }
    }

    #[test]
    fn test_trade_plan_header_must_be_whole_line() {
        let text = "Trade Recap\nOur Trade Plan Monday worked.\nMore.";
        let sections = chunk_default(text, "Monday");
        assert!(!sections.contains(SectionTag::TradePlan));
    }

    #[test]
    fn test_first_span_per_tag_wins() {
        let text = "Key Levels\n6050.00\nTrade Recap\nHeld key levels all day\nnot a header";
        let sections = chunk_default(text, "Monday");
        assert_eq!(sections.text(SectionTag::CoreLevels), Some("6050.00"));
        // the mention inside the recap still bounds it
        assert_eq!(sections.text(SectionTag::TradeRecap), Some("Held"));
    }

    #[test]
    fn test_anchor_after_trade_plan_start_is_emptied() {
        let text = "Trade Plan Monday\nIn summary for tomorrow: flat.\n\nTrade Recap\nlate recap";
        let sections = chunk_default(text, "Monday");
        let recap = sections.get(SectionTag::TradeRecap).unwrap();
        let plan = sections.get(SectionTag::TradePlan).unwrap();
        assert!(recap.is_empty());
        assert!(recap.end <= plan.start);
    }

    #[test]
    fn test_anchored_spans_do_not_overlap() {
        let sections = chunk_default(NEWSLETTER, "Monday");
        let spans = sections.anchored_spans();
        assert_eq!(spans.len(), 2);
        assert!(spans.windows(2).all(|w| w[0].end <= w[1].start));
    }
}
