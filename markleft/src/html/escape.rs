/// Append `text` to `out` with `& < > " '` replaced by entities.
pub fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Whether `url` may be emitted into an `href` or `src` attribute: an
/// `http`, `https` or `mailto` URL, or one with no scheme at all.
pub fn is_safe_url(url: &str) -> bool {
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    match scheme(url) {
        Some(scheme) => ALLOWED_SCHEMES
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(scheme)),
        None => true,
    }
}

/// Everything before the first `:`, unless a `/`, `?` or `#` comes first.
fn scheme(url: &str) -> Option<&str> {
    let end = url.find([':', '/', '?', '#'])?;
    url[end..].starts_with(':').then(|| &url[..end])
}
