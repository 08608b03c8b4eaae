//! Fields derived from user-supplied text: slugs, reading time, excerpts.

use chrono::NaiveDateTime;

const WORDS_PER_MINUTE: usize = 200;
pub const EXCERPT_LENGTH: usize = 160;

/// Lowercase ASCII letters and digits of `title`, runs of whitespace,
/// underscores and hyphens collapsed to one hyphen. Everything else is dropped.
pub fn slug_base(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_hyphen = true;
        }
    }

    slug
}

/// URL slug for a post or thread title, suffixed with the creation time in
/// unix milliseconds. A title with no ASCII word characters yields the bare
/// timestamp.
pub fn slugify(title: &str, now: NaiveDateTime) -> String {
    let base = slug_base(title);
    let stamp = now.and_utc().timestamp_millis();
    if base.is_empty() {
        stamp.to_string()
    } else {
        format!("{base}-{stamp}")
    }
}

/// Minutes to read `body` at 200 words per minute, rounded up, at least 1.
pub fn reading_time(body: &str) -> i32 {
    let words = body.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i32
}

/// Plain text of an HTML fragment with entities decoded and whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    html_escape::decode_html_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `max_chars` characters of the text, with "..." when cut.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = strip_html(html);
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Lowercased file or folder name restricted to `[a-z0-9.-]`.
pub fn sanitize_filename(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect()
}

/// Percent-encode a path for use as a query value. Unreserved characters and
/// `/` pass through.
pub fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
