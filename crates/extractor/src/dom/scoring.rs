// ABOUTME: Readability-style content scoring: per-node scores, top candidate and sibling merge.
// ABOUTME: Scores are stored by NodeId since scraper trees cannot carry extra attributes.

use std::collections::HashMap;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{element_text, has_sentence_end, link_density};

static PARAGRAPH_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(p|li|span|pre)$").unwrap());
static CONTAINER_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(td|blockquote|ol|ul|dl)$").unwrap());
static BAD_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(address|form)$").unwrap());
pub static NON_CANDIDATE_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(br|b|i|label|hr|area|base|basefont|input|img|link|meta)$").unwrap()
});
static POSITIVE_HINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)article|articlecontent|instapaper_body|blog|body|content|entry-content-asset|entry|hentry|main|normal|page|pagination|permalink|post|story|text|[-_]copy").unwrap()
});
static NEGATIVE_HINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)adbox|advert|author|bio|bookmark|bottom|byline|clear|com-|combx|comment|contact|credit|crumb|date|deck|excerpt|featured|foot|footer|footnote|graf|head|info|infotext|instapaper_ignore|jump|linebreak|link|masthead|media|meta|modal|outbrain|promo|pr_|related|respond|roundcontent|scroll|secondary|share|shopping|shoutbox|side|sidebar|sponsor|stamp|sub|summary|tags|tools|widget").unwrap()
});
static PHOTO_HINTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)figure|photo|image|caption").unwrap());
static CONTENT_ASSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)entry-content-asset").unwrap());

static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p, pre").unwrap());
static ALL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("*").unwrap());
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// hNews (container, body) pairs whose container gets a strong boost.
const HNEWS_PAIRS: &[(&str, &str)] = &[
    (".hentry", ".entry-content"),
    (".entry", ".entry_content"),
    (".post", ".postbody"),
    (".post", ".post_body"),
    (".post", ".post-body"),
];

const HNEWS_BOOST: i32 = 80;

/// Content scores keyed by node.
pub type NodeScores = HashMap<NodeId, i32>;

/// Score a run of paragraph text: commas, 50-char chunks, short-text penalty.
fn paragraph_score(text: &str) -> i32 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    let mut score = text.matches(',').count() as i32;
    score += (text.len() / 50) as i32;

    if text.len() < 20 {
        score -= 10;
    }
    if (50..=200).contains(&text.len()) {
        score += 5;
    }
    score
}

/// Base score for an element by tag.
fn tag_score(element: &ElementRef) -> i32 {
    let tag = element.value().name();

    if PARAGRAPH_TAGS.is_match(tag) {
        return paragraph_score(&element.text().collect::<String>());
    }
    if tag.eq_ignore_ascii_case("div") {
        return 5;
    }
    if CONTAINER_TAGS.is_match(tag) {
        return 3;
    }
    if BAD_TAGS.is_match(tag) {
        return -3;
    }
    if tag.eq_ignore_ascii_case("th") {
        return -5;
    }
    0
}

/// Weight derived from class and id hints.
pub fn class_weight(element: &ElementRef) -> i32 {
    let class = element.value().attr("class").unwrap_or("");
    let id = element.value().attr("id").unwrap_or("");
    let mut weight = 0;

    if !id.is_empty() {
        if POSITIVE_HINTS.is_match(id) {
            weight += 25;
        }
        if NEGATIVE_HINTS.is_match(id) {
            weight -= 25;
        }
    }

    if !class.is_empty() {
        // id hints win over class hints
        if weight == 0 {
            if POSITIVE_HINTS.is_match(class) {
                weight += 25;
            }
            if NEGATIVE_HINTS.is_match(class) {
                weight -= 25;
            }
        }
        if PHOTO_HINTS.is_match(class) {
            weight += 10;
        }
        if CONTENT_ASSET.is_match(class) {
            weight += 25;
        }
    }

    weight
}

struct Scorer {
    scores: NodeScores,
}

impl Scorer {
    fn get(&self, id: NodeId) -> i32 {
        self.scores.get(&id).copied().unwrap_or(0)
    }

    /// First touch of a node seeds it with tag + class weight and gives a
    /// quarter of that to its parent.
    fn seed(&mut self, element: &ElementRef) -> i32 {
        let existing = self.get(element.id());
        if existing != 0 {
            return existing;
        }
        let score = tag_score(element) + class_weight(element);
        if let Some(parent) = element.parent().and_then(ElementRef::wrap) {
            let bumped = self.get(parent.id()) + score / 4;
            self.scores.insert(parent.id(), bumped);
        }
        score
    }

    fn add(&mut self, element: &ElementRef, amount: i32) {
        let base = self.seed(element);
        self.scores.insert(element.id(), base + amount);
    }
}

/// Score every paragraph-bearing node of the document.
///
/// hNews containers are boosted first, then each `p`/`pre` is scored and its
/// score propagated in full to the parent and in half to the grandparent.
pub fn score_document(doc: &Html) -> NodeScores {
    let mut scorer = Scorer {
        scores: HashMap::new(),
    };

    for (container, body) in HNEWS_PAIRS {
        let (Ok(pair_sel), Ok(container_sel)) = (
            Selector::parse(&format!("{} {}", container, body)),
            Selector::parse(container),
        ) else {
            continue;
        };
        for element in doc.select(&pair_sel) {
            let owner = element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| container_sel.matches(a));
            if let Some(owner) = owner {
                scorer.add(&owner, HNEWS_BOOST);
            }
        }
    }

    for paragraph in doc.select(&PARAGRAPH_SELECTOR) {
        if scorer.scores.contains_key(&paragraph.id()) {
            continue;
        }
        let own = scorer.seed(&paragraph);
        scorer.scores.insert(paragraph.id(), own);

        let raw = tag_score(&paragraph);
        if let Some(parent) = paragraph.parent().and_then(ElementRef::wrap) {
            scorer.add(&parent, raw);
            if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
                scorer.add(&grandparent, raw / 2);
            }
        }
    }

    scorer.scores
}

/// Pick the highest scoring element, discounting link-heavy nodes.
///
/// `<body>` is only chosen when nothing else scored above zero.
pub fn top_candidate<'a>(doc: &'a Html, scores: &NodeScores) -> Option<(ElementRef<'a>, i32)> {
    let mut best: Option<(ElementRef<'a>, i32)> = None;

    for element in doc.select(&ALL_SELECTOR) {
        let Some(&score) = scores.get(&element.id()) else {
            continue;
        };
        let tag = element.value().name();
        if NON_CANDIDATE_TAGS.is_match(tag) || tag.eq_ignore_ascii_case("body") {
            continue;
        }
        if super::cleaners::is_unlikely_candidate(&element) {
            continue;
        }

        let density = link_density(&element);
        let adjusted = if density > 0.5 {
            (score as f64 * (1.0 - density)).round() as i32
        } else {
            score
        };

        if adjusted > best.as_ref().map_or(0, |(_, s)| *s) {
            best = Some((element, adjusted));
        }
    }

    best.or_else(|| doc.select(&BODY_SELECTOR).next().map(|body| (body, 0)))
}

/// Gather the candidate and any siblings that look like part of the same
/// article, returning their HTML in document order.
pub fn merge_siblings(candidate: ElementRef, top_score: i32, scores: &NodeScores) -> String {
    let Some(parent) = candidate.parent() else {
        return candidate.html();
    };

    let threshold = 10.max(top_score / 4);
    let candidate_class = candidate.value().attr("class").unwrap_or("");
    let mut included: Vec<ElementRef> = Vec::new();

    for sibling in parent.children().filter_map(ElementRef::wrap) {
        if sibling.id() == candidate.id() {
            included.push(sibling);
            continue;
        }
        if NON_CANDIDATE_TAGS.is_match(sibling.value().name()) {
            continue;
        }

        let score = scores.get(&sibling.id()).copied().unwrap_or(0);
        if score <= 0 {
            continue;
        }

        let density = link_density(&sibling);
        if density >= 0.5 {
            continue;
        }

        let mut bonus = 0;
        if density < 0.05 {
            bonus += 20;
        }
        let class = sibling.value().attr("class").unwrap_or("");
        if !class.is_empty() && class == candidate_class {
            bonus += top_score / 5;
        }

        if score + bonus >= threshold {
            included.push(sibling);
            continue;
        }

        if sibling.value().name().eq_ignore_ascii_case("p") {
            let text = element_text(&sibling);
            let long_and_clean = text.len() > 80 && density < 0.25;
            let short_sentence = text.len() <= 80 && density == 0.0 && has_sentence_end(&text);
            if long_and_clean || short_sentence {
                included.push(sibling);
            }
        }
    }

    if included.len() <= 1 {
        return candidate.html();
    }

    let mut out = String::from("<div>");
    for element in included {
        out.push_str(&element.html());
    }
    out.push_str("</div>");
    out
}

/// Score the document and return the merged HTML of the best candidate.
pub fn best_content(doc: &Html) -> Option<String> {
    let scores = score_document(doc);
    let (candidate, top_score) = top_candidate(doc, &scores)?;
    Some(merge_siblings(candidate, top_score, &scores))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_score_rewards_commas_and_length() {
        assert!(paragraph_score("Hi") < 0);
        let medium = "This is a medium length paragraph with some commas, and more text.";
        assert!(paragraph_score(medium) > 0);
        assert_eq!(paragraph_score("   "), 0);
    }

    #[test]
    fn class_weight_prefers_id_hints() {
        let doc = Html::parse_fragment(r#"<div class="sidebar" id="main">x</div>"#);
        let el = doc.select(&Selector::parse("div").unwrap()).next().unwrap();
        assert_eq!(class_weight(&el), 25);

        let doc = Html::parse_fragment(r#"<div class="comment-widget">x</div>"#);
        let el = doc.select(&Selector::parse("div").unwrap()).next().unwrap();
        assert!(class_weight(&el) < 0);
    }

    #[test]
    fn hnews_container_is_boosted() {
        let html = r#"<html><body>
            <div class="hentry" id="h"><div class="entry-content"><p>Short.</p></div></div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let scores = score_document(&doc);
        let hentry = doc.select(&Selector::parse("#h").unwrap()).next().unwrap();
        assert!(scores.get(&hentry.id()).copied().unwrap_or(0) >= HNEWS_BOOST);
    }

    #[test]
    fn best_content_picks_article_over_navigation() {
        let html = r#"
            <html><body>
                <div class="menu"><a href="/a">Home</a> <a href="/b">About</a></div>
                <div class="story">
                    <p>This is the main article content with multiple paragraphs, commas, and detail.</p>
                    <p>The second paragraph has more information, details, and context for readers.</p>
                    <p>A third paragraph rounds out the article nicely, with a final thought.</p>
                </div>
                <div class="sidebar">Sidebar content</div>
            </body></html>
        "#;
        let doc = Html::parse_document(html);
        let content = best_content(&doc).unwrap();
        assert!(content.contains("main article content"));
        assert!(!content.contains("Sidebar content"));
        assert!(!content.contains("Home"));
    }

    #[test]
    fn top_candidate_falls_back_to_body() {
        let doc = Html::parse_document("<html><body>bare text</body></html>");
        let scores = score_document(&doc);
        let (el, score) = top_candidate(&doc, &scores).unwrap();
        assert_eq!(el.value().name(), "body");
        assert_eq!(score, 0);
    }
}
