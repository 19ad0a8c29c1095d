// ABOUTME: Paragraph repair for content laid out with runs of <br> instead of <p>.
// ABOUTME: Also rewrites stray top-level html/body wrappers into plain divs.

use once_cell::sync::Lazy;
use regex::Regex;

static DOUBLE_BR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:<br\s*/?>\s*){2,}").unwrap());
static BLOCK_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^<(p|div|article|section|h[1-6]|ul|ol|blockquote|pre|table|figure)[\s>/]")
        .unwrap()
});
static TOP_LEVEL_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(html|body)(\s|>)").unwrap());
static TOP_LEVEL_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</(html|body)>").unwrap());

/// Split on runs of two or more `<br>` and wrap each inline segment in `<p>`.
///
/// Segments that already start with a block element are left unwrapped.
/// Input without a double break is returned unchanged.
pub fn brs_to_ps(html: &str) -> String {
    if !DOUBLE_BR_RE.is_match(html) {
        return html.to_string();
    }

    DOUBLE_BR_RE
        .split(html)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if BLOCK_START_RE.is_match(segment) {
                segment.to_string()
            } else {
                format!("<p>{}</p>", segment)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace `<html>`/`<body>` wrappers left in a fragment with `<div>`.
pub fn rewrite_top_level(html: &str) -> String {
    let opened = TOP_LEVEL_OPEN_RE.replace_all(html, "<div$2");
    TOP_LEVEL_CLOSE_RE.replace_all(&opened, "</div>").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn brs_to_ps_wraps_segments() {
        let output = brs_to_ps("First paragraph<br><br>Second paragraph");
        assert_eq!(output, "<p>First paragraph</p>\n<p>Second paragraph</p>");
    }

    #[test]
    fn brs_to_ps_accepts_variants_and_whitespace() {
        let output = brs_to_ps("One<BR />\n <br/>Two");
        assert_eq!(output, "<p>One</p>\n<p>Two</p>");
    }

    #[test]
    fn brs_to_ps_preserves_blocks() {
        let output = brs_to_ps("<div>Already block</div><br><br><p>Paragraph</p>");
        assert_eq!(output, "<div>Already block</div>\n<p>Paragraph</p>");
    }

    #[test]
    fn brs_to_ps_leaves_single_breaks() {
        let input = "Single<br>break only";
        assert_eq!(brs_to_ps(input), input);
    }

    #[test]
    fn rewrite_top_level_turns_wrappers_into_divs() {
        assert_eq!(
            rewrite_top_level(r#"<body class="x"><p>Content</p></body>"#),
            r#"<div class="x"><p>Content</p></div>"#
        );
        assert_eq!(
            rewrite_top_level("<html><div>C</div></html>"),
            "<div><div>C</div></div>"
        );
        assert_eq!(rewrite_top_level("<bodyguard>"), "<bodyguard>");
    }
}
