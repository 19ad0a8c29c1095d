// ABOUTME: Article cleaning applied to a chosen content fragment before normalization.
// ABOUTME: Drops unlikely blocks, link farms, stray headers, spacer images and empty paragraphs.

use std::collections::HashSet;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::scoring::class_weight;
use super::{brs, element_text, link_density, normalize_spaces, serialize_children, Rewrite};

const KEEP_ATTRS: &[&str] = &[
    "src", "srcset", "sizes", "type", "href", "class", "id", "alt", "width", "height",
];

static EMBED_KEEP_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(concat!(
        r#"iframe[src^="https://www.youtube.com"], "#,
        r#"iframe[src^="https://www.youtube-nocookie.com"], "#,
        r#"iframe[src^="https://player.vimeo.com"]"#,
    ))
    .unwrap()
});

static STRIP_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title, script, noscript, link, style, hr, embed, object, form, button, iframe")
        .unwrap()
});
static CONDITIONAL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul, ol, table, div, section").unwrap());
static HEADER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2, h3, h4, h5, h6").unwrap());
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static P_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static DIV_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div").unwrap());
static ALL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("*").unwrap());
static INPUT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, textarea, select, button").unwrap());
static SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());
static BLOCK_CHILD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a, blockquote, dl, div, img, p, pre, table, ul, ol").unwrap());

static SPACER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)transparent|spacer|blank").unwrap());
static UNLIKELY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ad-break|ad-banner|adbox|advert|addthis|agegate|aux|blogger-labels|combx|comment|conversation|disqus|entry-unrelated|extra|foot|header|hidden|loader|login|menu|meta|nav|outbrain|pager|pagination|popup|printfriendly|related|remove|remark|rss|share|shoutbox|sidebar|sociable|sponsor|taboola|tools").unwrap()
});
static LIKELY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)and|article|body|blogindex|column|content|entry-content-asset|format|hfeed|hentry|hatom|main|page|posts|shadow").unwrap()
});

/// Whether an element's class/id marks it as boilerplate rather than content.
pub fn is_unlikely_candidate(element: &ElementRef) -> bool {
    if element.value().name().eq_ignore_ascii_case("a") {
        return false;
    }

    let class = element.value().attr("class").unwrap_or("");
    let id = element.value().attr("id").unwrap_or("");
    if class.is_empty() && id.is_empty() {
        return false;
    }

    let hints = format!("{} {}", class, id);
    !LIKELY_RE.is_match(&hints) && UNLIKELY_RE.is_match(&hints)
}

/// Decide whether a container is boilerplate judged by its content mix.
fn lacks_content(element: &ElementRef, weight: i32) -> bool {
    if element
        .value()
        .classes()
        .any(|c| c == "entry-content-asset")
    {
        return false;
    }

    let text = element_text(element);
    if text.matches(',').count() >= 10 {
        return false;
    }

    let paragraphs = element.select(&P_SELECTOR).count();
    let inputs = element.select(&INPUT_SELECTOR).count();
    if inputs as f64 > paragraphs as f64 / 3.0 {
        return true;
    }

    let images = element.select(&IMG_SELECTOR).count();
    if text.len() < 25 && images == 0 {
        return true;
    }

    let density = link_density(element);
    if weight < 25 && density > 0.2 && text.len() > 75 {
        return true;
    }
    if weight >= 25 && density > 0.5 {
        // a link list introduced by "...:" is usually content
        let is_list = matches!(element.value().name(), "ul" | "ol");
        let introduced = element
            .prev_siblings()
            .find_map(ElementRef::wrap)
            .map(|prev| element_text(&prev).ends_with(':'))
            .unwrap_or(false);
        return !(is_list && introduced);
    }

    element.select(&SCRIPT_SELECTOR).next().is_some() && text.len() < 150
}

fn is_spacer_image(element: &ElementRef) -> bool {
    let Some(src) = element.value().attr("src") else {
        return true;
    };
    if SPACER_RE.is_match(src) {
        return true;
    }
    let dimension = |name: &str| {
        element
            .value()
            .attr(name)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(20)
    };
    dimension("height") < 10 || dimension("width") < 10
}

fn is_empty_paragraph(element: &ElementRef) -> bool {
    element.text().all(|t| t.trim().is_empty()) && element.select(&IMG_SELECTOR).next().is_none()
}

fn keep_ids(fragment: &Html) -> HashSet<NodeId> {
    let mut keep = HashSet::new();
    for embed in fragment.select(&EMBED_KEEP_SELECTOR) {
        keep.insert(embed.id());
        keep.extend(embed.ancestors().map(|a| a.id()));
    }
    keep
}

/// Clean an article fragment.
///
/// `title` is used to drop headers that merely repeat the page title.
pub fn clean_article(html: &str, title: &str) -> String {
    let fragment = Html::parse_fragment(&brs::rewrite_top_level(html));
    let keep = keep_ids(&fragment);
    let mut rewrite = Rewrite {
        keep_attrs: Some(KEEP_ATTRS),
        ..Default::default()
    };

    for element in fragment.select(&STRIP_SELECTOR) {
        if !keep.contains(&element.id()) {
            rewrite.skip.insert(element.id());
        }
    }

    for element in fragment.select(&ALL_SELECTOR) {
        if is_unlikely_candidate(&element) && !keep.contains(&element.id()) {
            rewrite.skip.insert(element.id());
        }
    }

    for element in fragment.select(&CONDITIONAL_SELECTOR) {
        if keep.contains(&element.id()) {
            continue;
        }
        let weight = class_weight(&element);
        if weight < 0 || lacks_content(&element, weight) {
            rewrite.skip.insert(element.id());
        }
    }

    mark_headers(&fragment, title, &mut rewrite);

    for image in fragment.select(&IMG_SELECTOR) {
        if is_spacer_image(&image) {
            rewrite.skip.insert(image.id());
        }
    }
    for paragraph in fragment.select(&P_SELECTOR) {
        if is_empty_paragraph(&paragraph) {
            rewrite.skip.insert(paragraph.id());
        }
    }

    // shallow divs read as paragraphs
    for div in fragment.select(&DIV_SELECTOR) {
        let has_block_child = div
            .children()
            .filter_map(ElementRef::wrap)
            .any(|child| BLOCK_CHILD_SELECTOR.matches(&child));
        if !has_block_child {
            rewrite.rename.insert(div.id(), "p");
        }
    }

    let mut out = String::new();
    serialize_children(*fragment.root_element(), &rewrite, &mut out);
    brs::brs_to_ps(&out)
}

/// h1s inside a body are either repeated titles (few) or section headings
/// (many); h2-h6 are dropped when they precede all text, repeat the title,
/// carry a negative weight or are too short to mean anything.
fn mark_headers(fragment: &Html, title: &str, rewrite: &mut Rewrite) {
    let h1s: Vec<_> = fragment.select(&H1_SELECTOR).collect();
    for h1 in &h1s {
        if h1s.len() < 3 {
            rewrite.skip.insert(h1.id());
        } else {
            rewrite.rename.insert(h1.id(), "h2");
        }
    }

    let title = normalize_spaces(title);
    let mut seen_paragraph = false;
    for node in fragment.tree.root().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if element.value().name() == "p" {
            seen_paragraph = true;
        }
        if !HEADER_SELECTOR.matches(&element) {
            continue;
        }
        let text = element_text(&element);
        let remove = !seen_paragraph
            || (!title.is_empty() && text == title)
            || class_weight(&element) < 0
            || text.len() < 3;
        if remove {
            rewrite.skip.insert(element.id());
        }
    }
}
