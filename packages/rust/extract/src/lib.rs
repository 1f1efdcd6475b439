//! HTML-to-Markdown content extraction.
//!
//! Parses a page, picks its main content region, walks that region in
//! document order emitting Markdown fragments, and cleans the joined text:
//!
//! raw markup → [`locator`] (chrome removal + root selection) →
//! [`normalize`] (structural walk, consulting [`noise`]) → [`cleanup`] →
//! final Markdown, or [`PagemarkError::NoContent`].

pub mod cleanup;
pub mod locator;
pub mod noise;
pub mod normalize;

use std::sync::LazyLock;

use pagemark_shared::{ExtractProfile, PagemarkError, Result};
use scraper::{Html, Selector};
use tracing::{debug, instrument};

pub use cleanup::cleanup_lines;
pub use locator::{ContentRoot, locate_content_root};
pub use noise::{should_skip, should_skip_element};
pub use normalize::{ExtractionContext, Normalizer};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for one extraction call.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Where the markup came from. Only used for diagnostics.
    pub source_url: Option<String>,
    /// Rule set to apply.
    pub profile: ExtractProfile,
}

/// A successfully extracted document.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The cleaned Markdown.
    pub markdown: String,
    /// Text of the page's `<title>`, if any.
    pub title: Option<String>,
    /// Which root strategy matched (a selector, `"class/id hint"`, or `"body"`).
    pub strategy: &'static str,
    /// Character count of the joined fragments before cleanup.
    pub raw_chars: usize,
    /// Character count of [`Extraction::markdown`].
    pub final_chars: usize,
    /// Final value of the heading-level ratchet.
    pub max_heading_level: u8,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Extract the main content of `html` as Markdown.
///
/// Returns [`PagemarkError::NoContent`] when nothing survives cleanup, e.g.
/// for a page made only of navigation.
#[instrument(
    skip_all,
    fields(url = opts.source_url.as_deref().unwrap_or("-"), profile = %opts.profile)
)]
pub fn extract(html: &str, opts: &ExtractOptions) -> Result<Extraction> {
    let mut doc = Html::parse_document(html);
    if !doc.errors.is_empty() {
        debug!(errors = doc.errors.len(), "parser recovered from markup errors");
    }

    let title = page_title(&doc);
    debug!(title = title.as_deref().unwrap_or("No title"), "parsed document");

    let root = locate_content_root(&mut doc, opts.profile)?;
    let strategy = root.strategy;

    let mut normalizer = Normalizer::new(opts.profile);
    normalizer.walk(root.element);
    let max_heading_level = normalizer.context().heading_level;

    let raw = normalizer.into_markdown();
    let raw_chars = raw.chars().count();
    debug!(raw_chars, "raw content length");

    let markdown = cleanup_lines(&raw, opts.profile);
    let final_chars = markdown.chars().count();
    debug!(final_chars, "final content length");

    if markdown.trim().is_empty() {
        return Err(PagemarkError::NoContent);
    }

    Ok(Extraction {
        markdown,
        title,
        strategy,
        raw_chars,
        final_chars,
        max_heading_level,
    })
}

/// Like [`extract`], for undecoded bytes. The input must be UTF-8.
pub fn extract_bytes(bytes: &[u8], opts: &ExtractOptions) -> Result<Extraction> {
    let html = std::str::from_utf8(bytes)
        .map_err(|e| PagemarkError::malformed(format!("input is not valid UTF-8: {e}")))?;
    extract(html.trim_start_matches('\u{feff}'), opts)
}

/// Build a YAML frontmatter block a host may prepend to the Markdown.
pub fn render_frontmatter(source_url: &str, title: Option<&str>) -> String {
    let mut fm = String::from("---\n");
    fm.push_str(&format!("source_url: \"{}\"\n", escape_yaml_string(source_url)));
    if let Some(title) = title {
        fm.push_str(&format!("title: \"{}\"\n", escape_yaml_string(title)));
    }
    fm.push_str("---\n");
    fm
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn page_title(doc: &Html) -> Option<String> {
    static TITLE_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("title").expect("valid selector"));

    doc.select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Escape special characters in a YAML string value.
fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_fixture(name: &str) -> String {
        fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    fn standard() -> ExtractOptions {
        ExtractOptions::default()
    }

    fn strict() -> ExtractOptions {
        ExtractOptions {
            source_url: None,
            profile: ExtractProfile::Strict,
        }
    }

    // --- Core pipeline tests ---

    #[test]
    fn extract_simple_page() {
        let html = "<html><head><title>Guide</title></head><body><main>\
            <h1>Getting started with pagemark</h1>\
            <p>Pagemark turns a web page into readable Markdown text.</p>\
            </main></body></html>";
        let result = extract(html, &standard()).unwrap();

        assert_eq!(
            result.markdown,
            "# Getting started with pagemark\nPagemark turns a web page into readable Markdown text."
        );
        assert_eq!(result.title.as_deref(), Some("Guide"));
        assert_eq!(result.strategy, "main");
        assert_eq!(result.max_heading_level, 1);
        assert_eq!(result.final_chars, result.markdown.chars().count());
        assert!(result.raw_chars >= result.final_chars);
    }

    #[test]
    fn extract_python_code_block() {
        let html = r#"<main>
            <p>Install the client library and then call it like this:</p>
            <pre><code class="language-python">import client

client.run()</code></pre>
            <p>The call blocks until the remote job has completed.</p>
        </main>"#;
        let result = extract(html, &standard()).unwrap();
        assert!(
            result
                .markdown
                .contains("```python\nimport client\n\nclient.run()\n```"),
            "{}",
            result.markdown
        );
    }

    #[test]
    fn extract_lists_in_order() {
        let html = r#"<article>
            <p>Follow these steps to configure the service:</p>
            <ol><li>Download the release</li><li>Unpack it</li><li>Run the installer</li></ol>
            <ul><li>Works offline</li><li>No telemetry</li></ul>
            <p>That is everything needed for a basic installation.</p>
        </article>"#;
        let result = extract(html, &standard()).unwrap();
        let lines: Vec<&str> = result.markdown.lines().collect();

        let one = lines.iter().position(|l| *l == "1. Download the release").unwrap();
        assert_eq!(lines[one + 1], "2. Unpack it");
        assert_eq!(lines[one + 2], "3. Run the installer");
        assert!(lines.contains(&"- Works offline"));
        assert!(lines.contains(&"- No telemetry"));
    }

    #[test]
    fn extract_navigation_only_page_is_no_content() {
        let html = r#"<html><body>
            <nav><a href="/">Home</a><a href="/docs">Docs</a></nav>
            <script>console.log("tracking everything on this page");</script>
            <footer><p>Copyright 2024 Example Corporation, all rights reserved.</p></footer>
        </body></html>"#;
        let err = extract(html, &standard()).unwrap_err();
        assert!(err.is_no_content(), "unexpected error: {err}");
    }

    #[test]
    fn extract_empty_document_is_no_content() {
        let err = extract("", &standard()).unwrap_err();
        assert!(matches!(err, PagemarkError::NoContent));
    }

    #[test]
    fn extract_strips_home_line() {
        let html = r#"<main>
            <p>This page explains how the synchronisation engine works.</p>
            <p>Home</p>
            <p>Changes are batched and replayed in order on every peer.</p>
        </main>"#;
        let result = extract(html, &standard()).unwrap();
        assert!(!result.markdown.lines().any(|l| l.eq_ignore_ascii_case("home")));
    }

    #[test]
    fn extract_drops_short_top_line() {
        let html = r#"<main><p>Top</p>
            <p>The first real paragraph of the document body.</p>
            <p>The second real paragraph of the document body.</p></main>"#;
        let result = extract(html, &standard()).unwrap();
        assert!(
            result
                .markdown
                .starts_with("The first real paragraph of the document body.")
        );
    }

    #[test]
    fn strict_profile_flattens_internal_links() {
        let html = r#"<main>
            <p>Read the overview before continuing with this chapter.</p>
            <p><a href="/guide/setup">Setup instructions for every platform</a></p>
            <p><a href="https://example.org/reference">External reference document</a></p>
        </main>"#;

        let standard_md = extract(html, &standard()).unwrap().markdown;
        assert!(standard_md.contains("[Setup instructions for every platform](/guide/setup)"));

        let strict_md = extract(html, &strict()).unwrap().markdown;
        assert!(strict_md.contains("Setup instructions for every platform"));
        assert!(!strict_md.contains("](/guide/setup)"));
        assert!(
            strict_md
                .contains("[External reference document](https://example.org/reference)")
        );
    }

    #[test]
    fn strict_root_skips_container_in_removed_header() {
        let html = r#"<html><body>
            <header><div class="container"><p>Site banner text with subscribe links everywhere</p></div></header>
            <div class="container"><p>The real documentation paragraph lives in this container.</p></div>
        </body></html>"#;
        let result = extract(html, &strict()).unwrap();

        assert_eq!(result.strategy, ".container");
        assert_eq!(
            result.markdown,
            "The real documentation paragraph lives in this container."
        );
    }

    #[test]
    fn leading_code_block_keeps_later_indentation() {
        let html = r#"<main>
            <pre><code class="language-bash">ls -la /some/long/path/here</code></pre>
            <p>Some real paragraph of text that explains the listing.</p>
            <pre><code class="language-python">def f():
    return 1</code></pre>
            <p>A closing paragraph that is long enough to be kept.</p>
        </main>"#;
        let md = extract(html, &standard()).unwrap().markdown;

        assert!(md.starts_with("```bash\nls -la /some/long/path/here\n```"), "{md}");
        assert!(md.contains("```python\ndef f():\n    return 1\n```"), "{md}");
    }

    #[test]
    fn extract_bytes_rejects_invalid_utf8() {
        let err = extract_bytes(&[0x3c, 0x70, 0x3e, 0xff, 0xfe], &standard()).unwrap_err();
        assert!(matches!(err, PagemarkError::MalformedMarkup { .. }));
    }

    #[test]
    fn extract_bytes_accepts_bom() {
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(
            b"<main><p>A paragraph long enough to survive edge trimming.</p></main>",
        );
        let result = extract_bytes(&bytes, &standard()).unwrap();
        assert_eq!(
            result.markdown,
            "A paragraph long enough to survive edge trimming."
        );
    }

    #[test]
    fn frontmatter_escapes_quotes() {
        let fm = render_frontmatter("https://example.com/a", Some(r#"Say "hi""#));
        assert_eq!(
            fm,
            "---\nsource_url: \"https://example.com/a\"\ntitle: \"Say \\\"hi\\\"\"\n---\n"
        );
    }

    #[test]
    fn frontmatter_without_title() {
        let fm = render_frontmatter("https://example.com/a", None);
        assert!(!fm.contains("title:"));
    }

    // --- Fixture-based tests ---

    #[test]
    fn docs_page_fixture() {
        let html = load_fixture("html/docs_page.html");
        let result = extract(&html, &standard()).unwrap();
        let md = &result.markdown;

        assert_eq!(result.strategy, "main");
        assert_eq!(result.title.as_deref(), Some("Configuration | Example Docs"));
        assert!(md.starts_with("# Configuring the example service"), "{md}");
        assert!(md.contains("## Configuration file"));
        assert!(md.contains("```toml\n[server]\nport = 8080\n```"));
        assert!(md.contains("```bash\nexample-service --config ./service.toml\n```"));
        assert!(md.contains("- port controls the listening port"));
        assert!(md.contains("[reference manual](https://example.com/reference)"));
        // chrome and in-content navigation are gone
        assert!(!md.contains("Edit this page"));
        assert!(!md.contains("On this page"));
        assert!(!md.contains("Copyright"));
        assert!(!md.contains("analytics"));
        assert!(!md.lines().any(|l| l == "Next"));
    }

    #[test]
    fn blog_post_fixture_uses_class_hint() {
        let html = load_fixture("html/blog_post.html");
        let result = extract(&html, &standard()).unwrap();

        assert_eq!(result.strategy, "class/id hint");
        assert!(result.markdown.contains("## Why we rewrote the scheduler"));
        assert!(!result.markdown.contains("Subscribe to our newsletter"));
    }

    #[test]
    fn blog_post_fixture_strict_uses_allow_list() {
        let html = load_fixture("html/blog_post.html");
        let result = extract(&html, &strict()).unwrap();

        assert_eq!(result.strategy, ".post");
        assert!(result.markdown.contains("## Why we rewrote the scheduler"));
    }

    #[test]
    fn fixture_output_is_stable_under_recleaning() {
        for name in ["html/docs_page.html", "html/blog_post.html"] {
            let html = load_fixture(name);
            for opts in [standard(), strict()] {
                let md = extract(&html, &opts).unwrap().markdown;
                assert_eq!(cleanup_lines(&md, opts.profile), md, "{name}");
            }
        }
    }
}
