use scraper::{ElementRef, Html, Node, Selector};

/// Normalizes line endings and trailing whitespace so content hashes and
/// diffs are stable regardless of the source's line-ending quirks.
pub fn normalize(markdown: &str) -> String {
    let unified = markdown.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed: String = unified
        .split('\n')
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    let mut out = trimmed.trim().to_string();
    out.push('\n');
    out
}

const SKIP_TAGS: &[&str] =
    &["script", "style", "nav", "header", "footer", "aside", "noscript", "svg", "form"];

/// Best-effort HTML -> Markdown conversion for the handful of block/inline
/// elements article bodies actually use. Not a general-purpose renderer:
/// adapters that need more reach for their own embeds override this per
/// source rather than growing this function to handle everything.
pub fn html_to_markdown(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut out = String::new();
    for node in document.tree.root().children() {
        if let Some(el) = ElementRef::wrap(node) {
            render_element(&el, &mut out);
        }
    }
    normalize(&out)
}

/// Extracts the first element matching `selector` from an HTML document and
/// converts just that subtree, for adapters that only want the `<article>`
/// or `.post-body` region rather than the whole page.
pub fn extract_and_convert(html: &str, selector: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(selector).ok()?;
    let el = document.select(&sel).next()?;
    let mut out = String::new();
    render_element(&el, &mut out);
    Some(normalize(&out))
}

fn render_element(el: &ElementRef, out: &mut String) {
    let tag = el.value().name();
    if SKIP_TAGS.contains(&tag) {
        return;
    }
    match tag {
        "h1" => block(out, "# ", el),
        "h2" => block(out, "## ", el),
        "h3" => block(out, "### ", el),
        "h4" => block(out, "#### ", el),
        "h5" => block(out, "##### ", el),
        "h6" => block(out, "###### ", el),
        "p" | "div" | "section" | "article" | "figure" | "figcaption" => {
            render_children(el, out);
            out.push_str("\n\n");
        }
        "br" => out.push('\n'),
        "hr" => out.push_str("\n---\n\n"),
        "strong" | "b" => inline(out, "**", "**", el),
        "em" | "i" => inline(out, "_", "_", el),
        "code" => inline(out, "`", "`", el),
        "pre" => {
            out.push_str("```\n");
            out.push_str(&text_content(el));
            out.push_str("\n```\n\n");
        }
        "blockquote" => {
            let inner = render_to_string(el);
            for line in inner.lines() {
                out.push_str("> ");
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        "a" => {
            let href = el.value().attr("href").unwrap_or("");
            let text = text_content(el);
            if href.is_empty() {
                out.push_str(&text);
            } else {
                out.push_str(&format!("[{text}]({href})"));
            }
        }
        "img" => {
            let alt = el.value().attr("alt").unwrap_or("");
            let src = el.value().attr("src").unwrap_or("");
            out.push_str(&format!("![{alt}]({src})"));
        }
        "ul" => {
            for li in el.children().filter_map(ElementRef::wrap) {
                if li.value().name() == "li" {
                    out.push_str("- ");
                    render_children(&li, out);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        "ol" => {
            for (i, li) in el.children().filter_map(ElementRef::wrap).enumerate() {
                if li.value().name() == "li" {
                    out.push_str(&format!("{}. ", i + 1));
                    render_children(&li, out);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        _ => render_children(el, out),
    }
}

fn block(out: &mut String, prefix: &str, el: &ElementRef) {
    out.push_str(prefix);
    out.push_str(text_content(el).trim());
    out.push_str("\n\n");
}

fn inline(out: &mut String, open: &str, close: &str, el: &ElementRef) {
    let text = text_content(el);
    if text.trim().is_empty() {
        return;
    }
    out.push_str(open);
    out.push_str(text.trim());
    out.push_str(close);
}

fn render_children(el: &ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    render_element(&child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn render_to_string(el: &ElementRef) -> String {
    let mut out = String::new();
    render_children(el, &mut out);
    out
}

fn text_content(el: &ElementRef) -> String {
    el.text().collect::<Vec<_>>().join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_crlf_and_trailing_space() {
        let input = "line one   \r\nline two\r\n\r\n";
        assert_eq!(normalize(input), "line one\n\nline two\n");
    }

    #[test]
    fn converts_heading_and_paragraph() {
        let html = "<h1>Title</h1><p>Body text</p>";
        let md = html_to_markdown(html);
        assert!(md.contains("# Title"));
        assert!(md.contains("Body text"));
    }

    #[test]
    fn converts_link() {
        let html = "<p>See <a href=\"https://example.com\">here</a></p>";
        let md = html_to_markdown(html);
        assert!(md.contains("[here](https://example.com)"));
    }

    #[test]
    fn strips_script_and_nav() {
        let html = "<nav>menu</nav><p>content</p><script>evil()</script>";
        let md = html_to_markdown(html);
        assert!(!md.contains("menu"));
        assert!(!md.contains("evil"));
        assert!(md.contains("content"));
    }

    #[test]
    fn converts_unordered_list() {
        let html = "<ul><li>one</li><li>two</li></ul>";
        let md = html_to_markdown(html);
        assert!(md.contains("- one"));
        assert!(md.contains("- two"));
    }

    #[test]
    fn extract_and_convert_scopes_to_selector() {
        let html = "<html><body><nav>skip</nav><article><p>keep</p></article></body></html>";
        let md = extract_and_convert(html, "article").unwrap();
        assert!(md.contains("keep"));
        assert!(!md.contains("skip"));
    }
}
