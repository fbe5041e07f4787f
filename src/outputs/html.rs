//! HTML document assembly.
//!
//! Every entry becomes, in input order:
//!
//! ```text
//! <h2>📰 {title}</h2>
//! <p>{body line}</p>      one per non-blank body line
//! <p>🔗 {url}</p>
//! ```
//!
//! Only elements the PDF layout engine has components for are emitted, so
//! there is no `<a>` or `<br>`: the link is the plain URL text, which PDF
//! viewers pick up as a link. All text is HTML-escaped. An entry without a
//! URL still gets its link paragraph, with nothing after the marker.
//!
//! The layout engine renders `h*` and `p` as bare text nodes, which do not
//! pick up stylesheet rules for `body`. A requested font family is therefore
//! set inline on every text element.

use crate::models::DigestEntry;
use htmlescape::encode_minimal;
use std::fmt::Write;

/// Page title and top-level heading of the document.
pub const DOCUMENT_TITLE: &str = "今日のニュース要約";

/// Render the per-article fragments only.
pub fn render_entries(entries: &[DigestEntry], font_family: Option<&str>) -> String {
    let style = style_attr(font_family);
    let mut html = String::new();
    for entry in entries {
        let _ = write!(
            html,
            "<h2{style}>📰 {}</h2>",
            encode_minimal(&entry.summary.title_ja)
        );
        for line in entry.summary.body_ja.lines().filter(|l| !l.trim().is_empty()) {
            let _ = write!(html, "<p{style}>{}</p>", encode_minimal(line.trim()));
        }
        let _ = write!(html, "<p{style}>🔗 {}</p>", encode_minimal(&entry.url));
    }
    html
}

/// Wrap the rendered entries in a complete UTF-8 HTML document.
///
/// `font_family`, when given, is applied to every heading and paragraph.
pub fn render_document(entries: &[DigestEntry], font_family: Option<&str>) -> String {
    let style = style_attr(font_family);
    format!(
        "<html><head><meta charset='UTF-8'><title>{DOCUMENT_TITLE}</title></head>\
         <body><h1{style}>📰 {DOCUMENT_TITLE}</h1>{}</body></html>",
        render_entries(entries, font_family)
    )
}

fn style_attr(font_family: Option<&str>) -> String {
    font_family
        .map(|f| format!(" style='font-family: {}'", encode_minimal(f)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummaryResult;

    fn entry(title: &str, body: &str, url: &str) -> DigestEntry {
        DigestEntry {
            summary: SummaryResult {
                title_ja: title.to_string(),
                body_ja: body.to_string(),
            },
            url: url.to_string(),
        }
    }

    #[test]
    fn one_h2_per_entry_in_order() {
        let entries: Vec<_> = (1..=4)
            .map(|n| entry(&format!("見出し{n}"), "本文", "https://example.com"))
            .collect();
        let html = render_document(&entries, None);

        assert_eq!(html.matches("<h2").count(), 4);
        let positions: Vec<usize> = (1..=4)
            .map(|n| html.find(&format!("<h2>📰 見出し{n}</h2>")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn document_has_charset_and_title() {
        let html = render_document(&[], None);
        assert!(html.starts_with("<html><head><meta charset='UTF-8'>"));
        assert!(!html.contains("style="));
        assert!(html.contains("<title>今日のニュース要約</title>"));
        assert!(html.contains("<h1>📰 今日のニュース要約</h1>"));
        assert_eq!(html.matches("<h2").count(), 0);
    }

    #[test]
    fn font_family_is_set_on_every_text_element() {
        let html = render_document(
            &[entry("見出し", "一行目\n二行目", "https://example.com/1")],
            Some("DigestFont"),
        );

        let styled = " style='font-family: DigestFont'>";
        assert!(html.contains(&format!("<h1{styled}📰 今日のニュース要約</h1>")));
        assert!(html.contains(&format!("<h2{styled}📰 見出し</h2>")));
        // two body lines plus the link paragraph
        assert_eq!(html.matches(&format!("<p{styled}")).count(), 3);
        assert!(!html.contains("<p>"));
        assert!(!html.contains("<style>"));
    }

    #[test]
    fn url_is_plain_text_paragraph() {
        let html = render_entries(&[entry("見出し", "本文", "https://example.com/a?b=1&c=2")], None);
        assert!(html.contains("<p>🔗 https://example.com/a?b=1&amp;c=2</p>"));
        assert!(!html.contains("<a"));
    }

    #[test]
    fn missing_url_renders_empty_link_paragraph() {
        let html = render_entries(&[entry("見出し", "本文", "")], None);
        assert!(html.ends_with("<p>🔗 </p>"));
    }

    #[test]
    fn text_is_escaped() {
        let html = render_entries(
            &[entry("<script>alert(1)</script>", "A & B", "https://example.com/?a=1&b=2")],
            None,
        );

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("A &amp; B"));
        assert_eq!(html.matches("<h2").count(), 1);
    }

    #[test]
    fn body_lines_become_paragraphs() {
        let html = render_entries(&[entry("見出し", "一行目\n\n二行目", "")], None);
        assert!(html.contains("<p>一行目</p><p>二行目</p>"));
        assert!(!html.contains("<br"));
    }
}
