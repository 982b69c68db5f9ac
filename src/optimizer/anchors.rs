//! Section header detection over cleaned newsletter text

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::template::{AnchorCatalog, SectionTag};

/// A located section header phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Byte offset of the phrase in the cleaned text
    pub offset: usize,
    pub section_tag: SectionTag,
}

/// Find every occurrence of every catalog variant (case-insensitive).
///
/// Sorted by offset. Ties go to the tag declared first in the catalog, then
/// to the variant declared first. Exact duplicates are dropped.
pub fn find_anchors(cleaned_text: &str, catalog: &AnchorCatalog) -> Vec<Anchor> {
    // (offset, tag rank, variant rank)
    let mut found: Vec<(usize, usize, usize, SectionTag)> = Vec::new();

    for (tag_rank, entry) in catalog.entries.iter().enumerate() {
        for (variant_rank, variant) in entry.variants.iter().enumerate() {
            if variant.is_empty() {
                continue;
            }

            let pattern = match RegexBuilder::new(&regex::escape(variant))
                .case_insensitive(true)
                .build()
            {
                Ok(p) => p,
                Err(e) => {
                    warn!(variant = %variant, error = %e, "Skipping unusable header variant");
                    continue;
                }
            };

            for m in pattern.find_iter(cleaned_text) {
                found.push((m.start(), tag_rank, variant_rank, entry.tag));
            }
        }
    }

    found.sort_by_key(|&(offset, tag_rank, variant_rank, _)| (offset, tag_rank, variant_rank));
    found.dedup_by_key(|&mut (offset, _, _, tag)| (offset, tag));

    found
        .into_iter()
        .map(|(offset, _, _, section_tag)| Anchor { offset, section_tag })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::template::CatalogEntry;

    #[test]
    fn test_finds_all_variants_case_insensitive() {
        let text = "CORE STRUCTURES/Levels To Engage\n6050\nTrade Recap\nrecap text\nKey levels again";
        let anchors = find_anchors(text, &AnchorCatalog::default());

        let summary: Vec<(usize, SectionTag)> =
            anchors.iter().map(|a| (a.offset, a.section_tag)).collect();
        assert_eq!(
            summary,
            vec![
                (0, SectionTag::CoreLevels),
                (16, SectionTag::CoreLevels),
                (38, SectionTag::TradeRecap),
                (61, SectionTag::CoreLevels),
            ]
        );
    }

    #[test]
    fn test_no_anchors_in_plain_text() {
        assert!(find_anchors("Nothing to see here", &AnchorCatalog::default()).is_empty());
        assert!(find_anchors("", &AnchorCatalog::default()).is_empty());
    }

    #[test]
    fn test_output_sorted_by_offset() {
        let text = "trade education first, then key levels, then trading recap, then core structures";
        let anchors = find_anchors(text, &AnchorCatalog::default());
        assert_eq!(anchors.len(), 4);
        assert!(anchors.windows(2).all(|w| w[0].offset <= w[1].offset));
    }

    #[test]
    fn test_tie_break_follows_catalog_order() {
        // Misconfigured catalog: the same phrase under two tags
        let catalog = AnchorCatalog {
            entries: vec![
                CatalogEntry {
                    tag: SectionTag::TradeRecap,
                    variants: vec!["review".to_string()],
                },
                CatalogEntry {
                    tag: SectionTag::CoreLevels,
                    variants: vec!["review".to_string()],
                },
            ],
        };

        let anchors = find_anchors("Review", &catalog);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].section_tag, SectionTag::TradeRecap);
        assert_eq!(anchors[1].section_tag, SectionTag::CoreLevels);
        assert_eq!(anchors[0].offset, anchors[1].offset);
    }

    #[test]
    fn test_variant_punctuation_is_literal() {
        let catalog = AnchorCatalog {
            entries: vec![CatalogEntry {
                tag: SectionTag::CoreLevels,
                variants: vec!["levels (es)".to_string()],
            }],
        };
        let anchors = find_anchors("Levels (ES)\n6050", &catalog);
        assert_eq!(anchors.len(), 1);
        assert!(find_anchors("Levels ES", &catalog).is_empty());
    }
}
