//! HTML to text pre-pass for mail bodies delivered as HTML

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HTML_MARKER: Regex = Regex::new(
        r"(?i)<(?:html|body|div|p|br|table|span|td|h[1-6])[\s/>]"
    ).expect("Failed to compile HTML_MARKER regex - this is a bug in the hardcoded pattern");

    static ref SCRIPT_STYLE: Regex = Regex::new(
        r"(?is)<(script|style|head)\b[^>]*>.*?</(?:script|style|head)\s*>"
    ).expect("Failed to compile SCRIPT_STYLE regex - this is a bug in the hardcoded pattern");

    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->")
        .expect("Failed to compile COMMENT regex - this is a bug in the hardcoded pattern");

    static ref LINE_BREAK: Regex = Regex::new(r"(?i)<br\s*/?>")
        .expect("Failed to compile LINE_BREAK regex - this is a bug in the hardcoded pattern");

    static ref BLOCK_END: Regex = Regex::new(
        r"(?i)</(?:p|div|h[1-6]|li|tr|table|ul|ol|blockquote)\s*>"
    ).expect("Failed to compile BLOCK_END regex - this is a bug in the hardcoded pattern");

    static ref TAG: Regex = Regex::new(r"(?s)<[^>]*>")
        .expect("Failed to compile TAG regex - this is a bug in the hardcoded pattern");

    static ref NUMERIC_ENTITY: Regex = Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);")
        .expect("Failed to compile NUMERIC_ENTITY regex - this is a bug in the hardcoded pattern");
}

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&rsquo;", "\u{2019}"),
    ("&lsquo;", "\u{2018}"),
    ("&ldquo;", "\u{201c}"),
    ("&rdquo;", "\u{201d}"),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
    ("&hellip;", "\u{2026}"),
    // last, so "&amp;lt;" decodes to "&lt;" and not "<"
    ("&amp;", "&"),
];

pub fn looks_like_html(body: &str) -> bool {
    HTML_MARKER.is_match(body)
}

/// Convert an HTML body to plain text. Plaintext passes through unchanged.
pub fn html_to_text(body: &str) -> String {
    if !looks_like_html(body) {
        return body.to_string();
    }

    let text = SCRIPT_STYLE.replace_all(body, "");
    let text = COMMENT.replace_all(&text, "");
    // source newlines carry no meaning inside HTML
    let text = text.replace(['\r', '\n'], " ");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = BLOCK_END.replace_all(&text, "\n\n");
    let text = TAG.replace_all(&text, "");

    let text = NUMERIC_ENTITY.replace_all(&text, |caps: &regex::Captures| {
        let code = &caps[1];
        let parsed = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        parsed
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    let mut decoded = text.into_owned();
    for (entity, replacement) in NAMED_ENTITIES {
        decoded = decoded.replace(entity, replacement);
    }

    decoded
        .lines()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
}
