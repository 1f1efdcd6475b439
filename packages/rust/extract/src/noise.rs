//! Per-node noise predicate consulted by the structural walk.
//!
//! Unlike the root locator's sweeps, nothing here deletes nodes: a node that
//! matches is simply not processed, and neither is its subtree.

use pagemark_shared::ExtractProfile;
use scraper::Node;
use scraper::node::Element;

/// Class tokens that mark an element as chrome under the standard profile.
const STANDARD_NOISE_CLASSES: &[&str] = &["hidden", "nav", "menu", "sidebar", "footer"];

/// Class tokens that mark an element as chrome under the strict profile.
const STRICT_NOISE_CLASSES: &[&str] = &[
    "nav",
    "menu",
    "sidebar",
    "toc",
    "header",
    "footer",
    "navigation",
];

/// ARIA landmark roles that never hold page content.
const NOISE_ROLES: &[&str] = &["navigation", "banner", "complementary"];

/// Element ids (compared lower-cased) that never hold page content.
const NOISE_IDS: &[&str] = &["nav", "menu", "sidebar", "toc", "header", "footer"];

/// Returns `true` if the node (and therefore its subtree) should be ignored.
///
/// Rules, first match wins:
/// 1. whitespace-only text
/// 2. inline style hiding the element
/// 3. a class token in the profile's noise set
/// 4. a landmark role in [`NOISE_ROLES`]
/// 5. an id in [`NOISE_IDS`]
pub fn should_skip(node: &Node, profile: ExtractProfile) -> bool {
    match node {
        Node::Text(text) => text.trim().is_empty(),
        Node::Element(el) => should_skip_element(el, profile),
        _ => false,
    }
}

/// Element-only form of [`should_skip`].
pub fn should_skip_element(el: &Element, profile: ExtractProfile) -> bool {
    if el.attr("style").is_some_and(is_hidden_style) {
        return true;
    }

    let noise_classes = if profile.is_strict() {
        STRICT_NOISE_CLASSES
    } else {
        STANDARD_NOISE_CLASSES
    };
    if el.classes().any(|c| noise_classes.contains(&c)) {
        return true;
    }

    if el
        .attr("role")
        .is_some_and(|role| NOISE_ROLES.contains(&role.trim().to_ascii_lowercase().as_str()))
    {
        return true;
    }

    el.id()
        .is_some_and(|id| NOISE_IDS.contains(&id.to_ascii_lowercase().as_str()))
}

/// Inline `display: none` / `visibility: hidden`, tolerant of spacing and case.
fn is_hidden_style(style: &str) -> bool {
    let compact: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.contains("display:none") || compact.contains("visibility:hidden")
}
