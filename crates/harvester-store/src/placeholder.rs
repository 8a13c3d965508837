/// Detects content that's a known "blocked by paywall/signup" stand-in
/// rather than real article text, so a re-fetch can repair it in place
/// without minting a duplicate manifest row. Only looks at the first 800
/// characters, matching the window a previous bad fetch would have filled.
pub fn looks_like_placeholder(content: &str) -> bool {
    let preview: String = content.chars().take(800).collect();
    if preview.contains("|  |") {
        return true;
    }
    if preview.trim_start().starts_with("[Signup]") {
        return true;
    }
    preview.lines().any(|line| line.trim() == "|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pipe_table_marker() {
        assert!(looks_like_placeholder("some text |  | more text"));
    }

    #[test]
    fn flags_signup_prefix() {
        assert!(looks_like_placeholder("[Signup] to read this premium content"));
    }

    #[test]
    fn flags_bare_pipe_line() {
        assert!(looks_like_placeholder("para one\n|\npara two"));
    }

    #[test]
    fn ignores_normal_article_text() {
        assert!(!looks_like_placeholder("# Title\n\nA normal article body."));
    }

    #[test]
    fn only_inspects_first_800_chars() {
        let mut content = "a".repeat(900);
        content.push_str("[Signup]");
        assert!(!looks_like_placeholder(&content));
    }
}
