use harvester_types::{HarvestError, Result};

use crate::blocked::detect_blocked;
use crate::markdown::{extract_and_convert, html_to_markdown};

/// Output shorter than this is treated as extraction failure rather than a
/// thin-but-real article — several dozen characters, per the length floor.
const MIN_CONTENT_CHARS: usize = 40;

/// Candidate "main content" containers, tried in priority order. The first
/// selector that matches and clears the length floor wins; otherwise the
/// full document is converted as a fallback.
const CONTENT_SELECTORS: &[&str] =
    &["article", "main", "[role=\"main\"]", ".post-content", ".entry-content", "#content"];

/// Readability-style extraction: prefer a recognizable main-content region,
/// fall back to the whole document, and reject anything that converts to
/// next to nothing. A candidate that clears the length floor but reads as
/// an anti-bot interstitial fails with `BlockedContent` instead of being
/// handed back as if it were the real article.
pub fn extract_main_content(html: &str) -> Result<String> {
    for selector in CONTENT_SELECTORS {
        if let Some(markdown) = extract_and_convert(html, selector) {
            if markdown.trim().chars().count() >= MIN_CONTENT_CHARS {
                return guard_against_blocked(markdown);
            }
        }
    }
    let fallback = html_to_markdown(html);
    if fallback.trim().chars().count() >= MIN_CONTENT_CHARS {
        guard_against_blocked(fallback)
    } else {
        Err(HarvestError::Extract("empty".to_string()))
    }
}

fn guard_against_blocked(markdown: String) -> Result<String> {
    match detect_blocked(&markdown) {
        Some(pattern) => Err(HarvestError::BlockedContent(pattern)),
        None => Ok(markdown),
    }
}
