use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // `.{0,3}` in place of the apostrophe covers the plain ASCII form,
        // a curly-quote apostrophe (1 char), and the classic UTF-8-as-Latin-1
        // mojibake rendering of one (3 chars: â€™).
        r"(?i)you can.{0,3}t perform that action at this time",
        r"(?i)attention required",
        r"(?i)checking your browser before accessing",
        r"(?i)enable javascript and cookies to continue",
        r"(?i)please enable javascript",
        r"(?i)access denied",
        r"(?i)verify you are human",
        r"(?i)just a moment",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Sniffs anti-bot / interstitial pages that slipped through as a "successful"
/// fetch. Only fires on short bodies — a 120-word page titled "Access Denied"
/// is almost certainly a block page, a 5,000-word article that happens to
/// mention "access denied" in a quote is not.
pub fn detect_blocked(markdown: &str) -> Option<String> {
    if markdown.trim().is_empty() {
        return None;
    }
    let collapsed: String = markdown.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    let word_count = collapsed.split_whitespace().count();
    if word_count > 120 || collapsed.len() > 1200 {
        return None;
    }
    for pattern in BLOCK_PATTERNS.iter() {
        if let Some(m) = pattern.find(&collapsed) {
            return Some(m.as_str().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_short_interstitial() {
        let text = "Please enable JavaScript and cookies to continue.";
        assert!(detect_blocked(text).is_some());
    }

    #[test]
    fn ignores_long_articles_mentioning_similar_words() {
        let mut text = "Access denied ".repeat(200);
        text.push_str(" the rest of a very long article goes on and on");
        assert!(detect_blocked(&text).is_none());
    }

    #[test]
    fn ignores_empty_body() {
        assert!(detect_blocked("   ").is_none());
    }

    #[test]
    fn flags_curly_quote_and_mojibake_forms() {
        assert!(detect_blocked("You can\u{2019}t perform that action at this time.").is_some());
        assert!(detect_blocked("You canâ€™t perform that action at this time.").is_some());
        assert!(detect_blocked("You can't perform that action at this time.").is_some());
    }

    #[test]
    fn ignores_long_article_mentioning_phrase_once() {
        let mut text = "You can't perform that action at this time. ".to_string();
        text.push_str(&"Lorem ipsum dolor sit amet consectetur adipiscing elit. ".repeat(90));
        assert!(text.len() > 5000);
        assert!(detect_blocked(&text).is_none());
    }

    #[test]
    fn ignores_clean_short_body() {
        assert!(detect_blocked("A short note about nothing in particular.").is_none());
    }
}
