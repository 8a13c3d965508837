use url::Url;

/// Canonical form used for de-duplication: lowercased scheme/host, query
/// params sorted, trailing slash stripped from non-root paths, fragment
/// dropped.
pub fn canonicalize(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw).ok()?;
    parsed.set_fragment(None);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &pairs {
            serializer.append_pair(k, v);
        }
        parsed.set_query(Some(&serializer.finish()));
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    Some(parsed.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_query_params() {
        let a = canonicalize("https://Example.com/a/?b=2&a=1").unwrap();
        let b = canonicalize("https://example.com/a?a=1&b=2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn drops_fragment() {
        let a = canonicalize("https://example.com/a#section").unwrap();
        assert_eq!(a, "https://example.com/a");
    }

    #[test]
    fn preserves_root_path() {
        let a = canonicalize("https://example.com/").unwrap();
        assert_eq!(a, "https://example.com/");
    }

    #[test]
    fn rejects_unparseable_urls() {
        assert!(canonicalize("not a url").is_none());
    }

    #[test]
    fn re_encodes_reserved_characters_inside_query_values() {
        // `%26` decodes to a literal `&`; naive `"{k}={v}"` reassembly would
        // let it masquerade as a second query param separator on re-parse.
        let canonical = canonicalize("https://example.com/a?x=foo%26bar").unwrap();
        let reparsed = Url::parse(&canonical).unwrap();
        let pairs: Vec<(String, String)> =
            reparsed.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(pairs, vec![("x".to_string(), "foo&bar".to_string())]);
    }
}
