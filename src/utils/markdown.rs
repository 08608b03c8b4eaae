use ammonia::Builder;
use comrak::{markdown_to_html, Options};
use std::collections::HashSet;

/// Render a forum body (Markdown) to sanitized HTML.
///
/// comrak handles GFM extensions, ammonia strips anything unsafe afterwards.
pub fn render_markdown(raw: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.render.unsafe_ = true; // ammonia sanitizes below

    let html = markdown_to_html(raw, &options);
    sanitize_html(&html)
}

/// Allow-list used for both rendered Markdown and rich-text article bodies.
pub fn sanitize_html(html: &str) -> String {
    let extra_tags: HashSet<&str> = [
        "h1", "h2", "h3", "h4", "h5", "h6", "pre", "code", "blockquote", "hr", "table", "thead",
        "tbody", "tr", "th", "td", "img", "input", "del", "s", "figure", "figcaption", "sup",
        "sub",
    ]
    .iter()
    .copied()
    .collect();

    let url_schemes: HashSet<&str> = ["http", "https", "mailto"].iter().copied().collect();

    let mut builder = Builder::default();
    builder.add_tags(&extra_tags);

    builder.add_tag_attributes("a", &["href", "title"]);
    builder.add_tag_attributes("img", &["src", "alt", "title"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tag_attributes("td", &["align"]);
    builder.add_tag_attributes("th", &["align"]);

    builder.url_schemes(url_schemes);
    builder.link_rel(Some("noopener noreferrer"));

    builder.clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_markdown_rendering() {
        let html = render_markdown("# Hello\n\nThis is **bold** and *italic*.");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn gfm_table() {
        let html = render_markdown("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn script_tag_removed() {
        let html = render_markdown("<script>alert('xss')</script>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("alert"));
    }

    #[test]
    fn javascript_url_removed() {
        let html = render_markdown("[click](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn rich_text_keeps_figure_and_drops_handlers() {
        let html = sanitize_html(
            r#"<figure><img src="https://x.test/a.png" onerror="alert(1)"><figcaption>cap</figcaption></figure>"#,
        );
        assert!(html.contains("<figure>"));
        assert!(html.contains("<figcaption>cap</figcaption>"));
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn empty_input() {
        assert!(render_markdown("").trim().is_empty());
    }
}
