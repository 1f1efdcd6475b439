//! Content root selection.
//!
//! Chrome elements are deleted from the parsed tree first, then an ordered
//! list of strategies is tried until one yields an element. `<body>` is the
//! always-last fallback. The chosen root is swept once more for
//! navigation-like descendants.

use std::sync::LazyLock;

use pagemark_shared::{ExtractProfile, PagemarkError, Result};
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

/// Elements deleted from the whole document before a root is chosen.
const CHROME_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside", "button"];

/// Class/id substrings that suggest a main-content container.
static ROOT_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(content|article|post|main)").expect("valid regex"));

/// Class/id/role substrings that mark navigation inside the chosen root.
static NAVIGATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(nav|menu|sidebar|toc|header|footer)").expect("valid regex")
});

static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// One step of the root fallback chain.
#[derive(Debug, Clone, Copy)]
enum Strategy {
    /// First element matching a CSS selector.
    Css(&'static str),
    /// First element under `<body>` whose class or id matches [`ROOT_HINT_RE`].
    ClassOrIdHint,
}

use Strategy::{ClassOrIdHint, Css};

const STANDARD_STRATEGIES: &[Strategy] = &[
    Css("main"),
    Css("article"),
    ClassOrIdHint,
    Css(r#"[role="main"]"#),
];

const STRICT_STRATEGIES: &[Strategy] = &[
    Css("main"),
    Css("article"),
    Css(".content"),
    Css(".article"),
    Css(".post"),
    Css(".main"),
    Css("#content"),
    Css("#main"),
    Css(".container"),
    Css(".doc-content"),
    Css(".documentation"),
    Css(r#"[role="main"]"#),
];

impl Strategy {
    fn label(self) -> &'static str {
        match self {
            Css(css) => css,
            ClassOrIdHint => "class/id hint",
        }
    }

    fn find(self, doc: &Html) -> Option<ElementRef<'_>> {
        match self {
            Css(css) => {
                let Ok(selector) = Selector::parse(css) else {
                    warn!(css, "unparseable root selector");
                    return None;
                };
                doc.root_element().select(&selector).next()
            }
            ClassOrIdHint => doc
                .root_element()
                .select(&BODY_SEL)
                .next()?
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .find(|el| has_root_hint(el.value())),
        }
    }
}

fn strategies_for(profile: ExtractProfile) -> &'static [Strategy] {
    match profile {
        ExtractProfile::Standard => STANDARD_STRATEGIES,
        ExtractProfile::Strict => STRICT_STRATEGIES,
    }
}

fn has_root_hint(el: &Element) -> bool {
    el.attr("class").is_some_and(|c| ROOT_HINT_RE.is_match(c))
        || el.id().is_some_and(|id| ROOT_HINT_RE.is_match(id))
}

fn is_navigation_like(el: &Element) -> bool {
    ["class", "id", "role"]
        .iter()
        .filter_map(|attr| el.attr(attr))
        .any(|value| NAVIGATION_RE.is_match(value))
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// The subtree chosen as main content.
#[derive(Debug, Clone, Copy)]
pub struct ContentRoot<'a> {
    pub element: ElementRef<'a>,
    /// Label of the strategy that produced the root (a selector, or `"body"`).
    pub strategy: &'static str,
}

/// Prune chrome from `doc` and return its main content root.
///
/// The tree is modified in place: [`CHROME_TAGS`] subtrees anywhere in the
/// document and navigation-like descendants of the chosen root are detached.
/// Detached nodes stay in the arena, so every lookup after pruning starts
/// from [`Html::root_element`] rather than [`Html::select`].
pub fn locate_content_root(doc: &mut Html, profile: ExtractProfile) -> Result<ContentRoot<'_>> {
    let removed = detach_where(doc, |el| CHROME_TAGS.contains(&el.name()));
    debug!(removed, "removed chrome elements");

    let found = {
        let view: &Html = doc;
        strategies_for(profile)
            .iter()
            .find_map(|s| s.find(view).map(|el| (el.id(), s.label())))
            .or_else(|| {
                view.root_element()
                    .select(&BODY_SEL)
                    .next()
                    .map(|el| (el.id(), "body"))
            })
    };

    let Some((root_id, strategy)) = found else {
        return Err(PagemarkError::NoContentRoot);
    };
    debug!(strategy, "found content root");

    let nav_ids: Vec<_> = doc
        .tree
        .get(root_id)
        .map(|root| {
            root.descendants()
                .skip(1)
                .filter(|n| matches!(n.value(), Node::Element(el) if is_navigation_like(el)))
                .map(|n| n.id())
                .collect()
        })
        .unwrap_or_default();
    let swept = nav_ids.len();
    for id in nav_ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
    debug!(swept, "removed navigation-like descendants");

    let element = doc
        .tree
        .get(root_id)
        .and_then(ElementRef::wrap)
        .ok_or(PagemarkError::NoContentRoot)?;

    Ok(ContentRoot { element, strategy })
}

/// Detach every element matching `pred`; returns how many were detached.
fn detach_where(doc: &mut Html, pred: impl Fn(&Element) -> bool) -> usize {
    let ids: Vec<_> = doc
        .tree
        .root()
        .descendants()
        .filter(|n| matches!(n.value(), Node::Element(el) if pred(el)))
        .map(|n| n.id())
        .collect();

    let count = ids.len();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
    count
}
