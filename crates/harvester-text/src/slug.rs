use sha1::{Digest, Sha1};

/// Lowercase ascii-alnum slug, `-`-joined, truncated without chopping a
/// trailing separator in half.
pub fn slugify(value: &str, max_length: usize) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_was_dash = true; // swallow leading dashes
    for ch in value.trim().chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            slug.push(lower);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.len() > max_length {
        slug.truncate(max_length);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// Deterministic item id: a slug of the title (falling back to the url)
/// followed by the first 8 hex characters of `sha1(url)`.
///
/// Stable across runs so re-ingesting a source never creates duplicate
/// item directories for the same url.
pub fn item_id(title: &str, url: &str) -> String {
    let basis = if title.trim().is_empty() { url } else { title };
    let slug = slugify(basis, 80);
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    let hex = hex_prefix(&digest, 4);
    format!("{slug}-{hex}")
}

/// `sha1(source_id|archived_at|url)`, used as the primary key of a `Record`.
pub fn record_id(source_id: &str, archived_at: &str, url: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(source_id.as_bytes());
    hasher.update(b"|");
    hasher.update(archived_at.as_bytes());
    hasher.update(b"|");
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, digest.len())
}

fn hex_prefix(bytes: &[u8], n_bytes: usize) -> String {
    bytes
        .iter()
        .take(n_bytes)
        .map(|b| format!("{b:02x}"))
        .collect()
}
