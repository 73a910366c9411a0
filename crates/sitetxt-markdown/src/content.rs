//! Main content detection and boilerplate removal.
//!
//! A page is reduced to the region most likely to hold its readable content:
//! semantic tags first, then conventional class/id names, then the block with
//! the most visible text, then `<body>`. Navigation and other noise inside the
//! chosen region is removed before conversion.

use scraper::{ElementRef, Html, Node, Selector};
use std::fmt;
use std::sync::LazyLock;

use crate::cleanup::normalize_markdown;
use crate::html_to_markdown::converter::convert_nodes_to_markdown;
use crate::html_to_markdown::node::{HtmlElement, HtmlNode};
use crate::html_to_markdown::{BODY_SELECTOR, ConversionOptions, HtmlToMarkdownError, parser};

/// Conventional class/id names, in priority order.
pub const CONTENT_NAMES: &[&str] = &[
    "main-content",
    "post-content",
    "article-content",
    "content",
    "entry-content",
    "post",
    "article-body",
    "page-content",
    "document-content",
];

/// Tags removed from the selected region.
pub const NOISE_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "meta", "noscript",
];

/// Class substrings (case-insensitive) marking an element inside the region as noise.
pub const NOISE_CLASS_KEYWORDS: &[&str] = &[
    "nav",
    "menu",
    "header",
    "footer",
    "sidebar",
    "ad",
    "social",
    "comments",
    "related",
    "share",
    "meta",
    "tags",
    "toolbar",
    "cookie",
    "popup",
    "overlay",
    "newsletter",
    "banner",
];

/// Class substrings that disqualify a block from the largest-text heuristic.
const LAYOUT_CLASS_KEYWORDS: &[&str] = &["nav", "footer", "header", "sidebar", "menu"];

/// Ancestors that disqualify a block from the largest-text heuristic.
const LAYOUT_TAGS: &[&str] = &["nav", "header", "footer", "aside"];

const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// The rule that picked the main content region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStrategy {
    MainTag,
    ArticleTag,
    MainRole,
    ClassName(&'static str),
    IdName(&'static str),
    LargestTextBlock,
    Body,
}

impl fmt::Display for ContentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentStrategy::MainTag => write!(f, "<main>"),
            ContentStrategy::ArticleTag => write!(f, "<article>"),
            ContentStrategy::MainRole => write!(f, "[role=\"main\"]"),
            ContentStrategy::ClassName(name) => write!(f, ".{}", name),
            ContentStrategy::IdName(name) => write!(f, "#{}", name),
            ContentStrategy::LargestTextBlock => write!(f, "largest text block"),
            ContentStrategy::Body => write!(f, "<body>"),
        }
    }
}

static SELECTOR_CHAIN: LazyLock<Vec<(ContentStrategy, Selector)>> = LazyLock::new(|| {
    let mut chain = vec![
        (ContentStrategy::MainTag, "main".to_string()),
        (ContentStrategy::ArticleTag, "article".to_string()),
        (ContentStrategy::MainRole, r#"[role="main"]"#.to_string()),
    ];
    for name in CONTENT_NAMES {
        chain.push((ContentStrategy::ClassName(*name), format!(".{}", name)));
        chain.push((ContentStrategy::IdName(*name), format!("#{}", name)));
    }
    chain
        .into_iter()
        .map(|(strategy, css)| {
            let selector = Selector::parse(&css)
                .unwrap_or_else(|e| panic!("Failed to parse selector '{}': {:?}", css, e));
            (strategy, selector)
        })
        .collect()
});

static CANDIDATE_BLOCK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div, section, article").expect("Failed to parse block selector")
});

fn class_mentions(class_attr: Option<&str>, keywords: &[&str]) -> bool {
    class_attr
        .map(str::to_lowercase)
        .is_some_and(|class| keywords.iter().any(|keyword| class.contains(keyword)))
}

fn is_layout_block(element: ElementRef<'_>) -> bool {
    class_mentions(element.value().attr("class"), LAYOUT_CLASS_KEYWORDS)
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| {
                LAYOUT_TAGS.contains(&ancestor.value().name())
                    || class_mentions(ancestor.value().attr("class"), LAYOUT_CLASS_KEYWORDS)
            })
}

/// Number of characters of trimmed, rendered text below `element`.
fn visible_text_len(element: ElementRef<'_>) -> usize {
    element
        .children()
        .map(|child| match child.value() {
            Node::Text(text) => text.trim().chars().count(),
            Node::Element(el) if INVISIBLE_TAGS.contains(&el.name()) => 0,
            Node::Element(_) => ElementRef::wrap(child).map_or(0, visible_text_len),
            _ => 0,
        })
        .sum()
}

/// Picks the `div`/`section`/`article` with the most visible text, skipping
/// layout blocks. The first block wins a tie.
fn largest_text_block(document: &Html) -> Option<ElementRef<'_>> {
    let mut best: Option<(usize, ElementRef<'_>)> = None;
    for candidate in document.select(&CANDIDATE_BLOCK_SELECTOR) {
        if is_layout_block(candidate) {
            continue;
        }
        let text_len = visible_text_len(candidate);
        if text_len > 0 && best.is_none_or(|(best_len, _)| text_len > best_len) {
            best = Some((text_len, candidate));
        }
    }
    best.map(|(_, element)| element)
}

/// Locates the main content region of a parsed page.
pub fn find_main_content(document: &Html) -> Option<(ElementRef<'_>, ContentStrategy)> {
    SELECTOR_CHAIN
        .iter()
        .find_map(|(strategy, selector)| {
            document
                .select(selector)
                .next()
                .map(|element| (element, *strategy))
        })
        .or_else(|| {
            largest_text_block(document).map(|element| (element, ContentStrategy::LargestTextBlock))
        })
        .or_else(|| {
            document
                .select(&BODY_SELECTOR)
                .next()
                .map(|element| (element, ContentStrategy::Body))
        })
}

fn is_noise(node: &HtmlNode) -> bool {
    match node {
        HtmlNode::Element(element) => {
            NOISE_TAGS.contains(&element.tag_name.as_str())
                || class_mentions(element.attr("class"), NOISE_CLASS_KEYWORDS)
        }
        _ => false,
    }
}

/// Removes noise descendants of `element` in place. `element` itself is kept.
pub fn strip_noise(element: &mut HtmlElement) {
    element.children.retain(|node| !is_noise(node));
    for child in element.children.iter_mut() {
        if let HtmlNode::Element(child_element) = child {
            strip_noise(child_element);
        }
    }
}

/// Normalized Markdown of a page's main content region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainContent {
    pub strategy: ContentStrategy,
    pub markdown: String,
}

/// Runs the full per-page pipeline: region selection, noise removal,
/// conversion and cleanup.
///
/// Returns [`HtmlToMarkdownError::NoContentFound`] when the page has no usable
/// region or the region is empty once cleaned.
pub fn extract_main_markdown(
    html: &str,
    options: &ConversionOptions,
) -> Result<MainContent, HtmlToMarkdownError> {
    let document = Html::parse_document(html);
    let (region, strategy) =
        find_main_content(&document).ok_or(HtmlToMarkdownError::NoContentFound)?;
    tracing::debug!("Main content selected by {}", strategy);

    let mut root = parser::map_element(region);
    strip_noise(&mut root);

    let markdown = normalize_markdown(&convert_nodes_to_markdown(
        &[HtmlNode::Element(root)],
        options,
    )?);
    if markdown.trim().is_empty() {
        return Err(HtmlToMarkdownError::NoContentFound);
    }

    Ok(MainContent { strategy, markdown })
}
