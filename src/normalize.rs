//! URL normalization for identity comparison
//!
//! Two references denote the same physical asset when their URLs normalize to
//! the same key. Normalization is used only for dedup — the original URL is
//! always what gets fetched, since signed query parameters are often required
//! for the request to succeed.

/// Produce the canonical dedup key for a URL
///
/// Trims surrounding whitespace, then strips everything from the first `?` or
/// `#` onward. Pure and deterministic, no I/O.
///
/// # Examples
///
/// ```
/// use storyboard_export::normalize::normalize_url;
///
/// assert_eq!(normalize_url("https://x/a.mp4?sig=1"), "https://x/a.mp4");
/// assert_eq!(normalize_url("https://x/a.mp4?sig=2"), "https://x/a.mp4");
/// assert_eq!(normalize_url("  https://x/a.png#frame "), "https://x/a.png");
/// ```
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    trimmed[..end].to_string()
}

/// Collapse a free-text name into a file-system-safe component
///
/// Alphanumeric characters (including non-Latin scripts) pass through; every
/// run of anything else becomes a single `_`. Leading and trailing separators
/// are dropped, so the result never starts or ends with `_`.
///
/// # Examples
///
/// ```
/// use storyboard_export::normalize::sanitize_component;
///
/// assert_eq!(sanitize_component("My Film: Act I!"), "My_Film_Act_I");
/// assert_eq!(sanitize_component("夜の街 (v2)"), "夜の街_v2");
/// ```
pub fn sanitize_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;
    for c in input.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}
