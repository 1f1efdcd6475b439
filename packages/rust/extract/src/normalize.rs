//! Structural walk over the content root.
//!
//! Produces an ordered list of Markdown fragments. Headings, code blocks,
//! links and lists are terminal: they render their own subtree and the walk
//! does not descend into them. `p`, `div` and `section` only contribute
//! blank-line guards around their children; every other element is
//! transparent.

use std::sync::LazyLock;

use pagemark_shared::ExtractProfile;
use scraper::{ElementRef, Node, Selector};
use tracing::trace;

use crate::noise::{should_skip, should_skip_element};

/// Bare class names accepted as a code language without a prefix.
const KNOWN_LANGUAGES: &[&str] = &["javascript", "python", "bash", "json"];

static CODE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("code").expect("valid selector"));

/// Mutable state threaded through one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionContext {
    /// Deepest heading level seen so far. Only ever raised, never lowered.
    pub heading_level: u8,
    /// True only while a list's items are being emitted.
    pub in_list: bool,
}

/// Converts a DOM subtree into Markdown fragments.
///
/// Each fragment is a content line, a rendered block (heading, fenced code,
/// list item), or an empty string standing for a blank line.
#[derive(Debug)]
pub struct Normalizer {
    profile: ExtractProfile,
    ctx: ExtractionContext,
    fragments: Vec<String>,
}

impl Normalizer {
    pub fn new(profile: ExtractProfile) -> Self {
        Self {
            profile,
            ctx: ExtractionContext::default(),
            fragments: Vec::new(),
        }
    }

    pub fn context(&self) -> &ExtractionContext {
        &self.ctx
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Join the fragments into newline-separated text.
    pub fn into_markdown(self) -> String {
        self.fragments.join("\n")
    }

    /// Walk `root` and everything under it, appending fragments in document order.
    pub fn walk(&mut self, root: ElementRef<'_>) {
        self.visit_element(root);
    }

    fn visit_element(&mut self, el: ElementRef<'_>) {
        if should_skip_element(el.value(), self.profile) {
            return;
        }

        let name = el.value().name();
        if let Some(level) = heading_level(name) {
            self.emit_heading(el, level);
            return;
        }

        match name {
            "pre" | "code" => self.emit_code_block(el),
            "a" => self.emit_link(el),
            "ul" | "ol" => self.emit_list(el, name == "ol"),
            "p" | "div" | "section" => {
                self.blank_guard();
                self.visit_children(el);
                self.blank_guard();
            }
            _ => self.visit_children(el),
        }
    }

    fn visit_children(&mut self, el: ElementRef<'_>) {
        for child in el.children() {
            let node = child.value();
            if should_skip(node, self.profile) {
                continue;
            }
            match node {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.visit_element(child_el);
                    }
                }
                _ => {}
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.fragments.push(text.to_string());
        }
    }

    /// Append a blank line unless the buffer is empty or already ends in one.
    fn blank_guard(&mut self) {
        if self.fragments.last().is_some_and(|f| !f.is_empty()) {
            self.fragments.push(String::new());
        }
    }

    fn emit_heading(&mut self, el: ElementRef<'_>, level: u8) {
        if level > self.ctx.heading_level {
            trace!(from = self.ctx.heading_level, to = level, "heading level raised");
            self.ctx.heading_level = level;
        }

        let text = element_text(el);
        if text.is_empty() {
            return;
        }
        self.fragments.push(String::new());
        self.fragments
            .push(format!("{} {text}", "#".repeat(usize::from(level))));
        self.fragments.push(String::new());
    }

    fn emit_code_block(&mut self, el: ElementRef<'_>) {
        let raw: String = el.text().collect();
        let code = normalize_code(&raw);
        if code.is_empty() {
            return;
        }

        let language = code_language(el).unwrap_or_default();
        self.blank_guard();
        self.fragments.push(format!("```{language}\n{code}\n```"));
        self.blank_guard();
    }

    fn emit_link(&mut self, el: ElementRef<'_>) {
        let text = element_text(el);
        if text.is_empty() {
            return;
        }
        let href = el.value().attr("href").map(str::trim).unwrap_or_default();

        let internal = href.starts_with('/') || href.starts_with('#');
        if href.is_empty() || (self.profile.is_strict() && internal) {
            self.fragments.push(text);
        } else {
            self.fragments.push(format!("[{text}]({href})"));
        }
    }

    fn emit_list(&mut self, el: ElementRef<'_>, ordered: bool) {
        self.ctx.in_list = true;
        self.blank_guard();

        let items = el
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "li");
        for (i, li) in items.enumerate() {
            if should_skip_element(li.value(), self.profile) {
                continue;
            }
            let text = element_text(li);
            if text.is_empty() {
                continue;
            }
            let item = if ordered {
                format!("{}. {text}", i + 1)
            } else {
                format!("- {text}")
            };
            self.fragments.push(item);
        }

        self.ctx.in_list = false;
        self.blank_guard();
    }
}

/// `h1`..`h6` → 1..6.
fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Concatenated descendant text, trimmed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Language hint from class names: `language-x`, `lang-x`, or a bare known name.
///
/// For `pre`, the nested `code` element's classes are collected before the
/// element's own; the last matching class wins, so `pre` overrides `code`.
fn code_language(el: ElementRef<'_>) -> Option<String> {
    let mut classes: Vec<&str> = Vec::new();
    if el.value().name() == "pre" {
        if let Some(code) = el.select(&CODE_SEL).next() {
            classes.extend(code.value().classes());
        }
    }
    classes.extend(el.value().classes());

    classes.into_iter().rev().find_map(|class| {
        let lang = class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
            .or_else(|| KNOWN_LANGUAGES.contains(&class).then_some(class))?;
        (!lang.is_empty()).then(|| lang.to_string())
    })
}

/// Drop surrounding blank lines and squeeze interior blank runs to one.
fn normalize_code(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut pending_blank = false;

    for line in raw.trim_end().lines() {
        if line.trim().is_empty() {
            pending_blank = !lines.is_empty();
            continue;
        }
        if pending_blank {
            lines.push("");
            pending_blank = false;
        }
        lines.push(line.trim_end());
    }

    lines.join("\n")
}
