//! Client-side slug derivation.
//!
//! Produces the instant-feedback candidate slug written into a draft while
//! the server-side uniqueness check is still pending. The server may still
//! rewrite the result (e.g. `my-photo` -> `my-photo-2` on conflict).

/// Derive a URL slug from a title: lowercase, runs of non-alphanumeric
/// characters collapsed to a single hyphen, leading/trailing hyphens
/// stripped. Non-ASCII characters are treated as separators.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
