//! Script/markup separation and whitespace minification
//!
//! Inline `<script>` blocks are pulled out of each bundled document into a
//! sibling `.js` file referenced externally; scripts that already point at
//! an external source are left alone. Minification is conservative:
//! markup comments, inter-tag whitespace and run-on whitespace only.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Inline script collected from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedScript {
    /// Sibling file name, e.g. `a-scene.js` for `a-scene.html`.
    pub file_name: String,
    pub code: String,
}

/// A document after script extraction.
#[derive(Debug, Clone)]
pub struct SplitDocument {
    pub html: String,
    pub script: Option<ExtractedScript>,
}

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<script([^>]*)>(.*?)</script>").unwrap())
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn intertag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r">\s+<").unwrap())
}

/// Move every inline script block out of `html` into one sibling script
/// file named after the document, replacing them with a single external
/// reference appended at the end of the body.
pub fn extract_scripts(doc_path: &Path, html: &str) -> SplitDocument {
    let mut collected = Vec::new();
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for caps in script_re().captures_iter(html) {
        let whole = caps.get(0).unwrap();
        let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let code = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        if attrs.contains("src=") {
            continue;
        }
        out.push_str(&html[last..whole.start()]);
        last = whole.end();
        let trimmed = code.trim();
        if !trimmed.is_empty() {
            collected.push(trimmed.to_string());
        }
    }
    out.push_str(&html[last..]);

    if collected.is_empty() {
        return SplitDocument {
            html: out,
            script: None,
        };
    }

    let stem = doc_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bundle");
    let file_name = format!("{}.js", stem);
    let reference = format!("<script src=\"{}\"></script>", file_name);

    // The reference goes where the page's body ends so extracted code runs
    // after the markup it touches.
    if let Some(idx) = out.find("</body>") {
        out.insert_str(idx, &reference);
    } else {
        out.push_str(&reference);
    }

    let mut code = collected.join("\n;\n");
    code.push('\n');

    SplitDocument {
        html: out,
        script: Some(ExtractedScript { file_name, code }),
    }
}

/// Collapse markup whitespace. Inline scripts must already be extracted;
/// nothing here is safe to run over script bodies.
pub fn minify(html: &str) -> String {
    let stripped = comment_re().replace_all(html, "");
    let collapsed = whitespace_re().replace_all(&stripped, " ");
    let tight = intertag_re().replace_all(&collapsed, "><");
    tight.trim().to_string()
}
