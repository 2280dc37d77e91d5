//! HTML merge engine.
//!
//! Splits a user-supplied document into the prologue and epilogue that
//! surround merged fragments, and recognises complete documents that must
//! never be merged into another one.

/// Explicit insertion marker, as an HTML comment.
pub const PLACEHOLDER_COMMENT: &str = "<!-- MODULES_PLACEHOLDER -->";

/// Explicit insertion marker, as a template variable.
pub const PLACEHOLDER_TEMPLATE: &str = "{{.Modules}}";

/// Split `document` at the point where fragments are inserted.
///
/// Priority: comment marker, template marker, before `</main>` (when a
/// `<main>` element opens first), before the first `<script>`, before
/// `</body>`. Without any of these the whole document is the prologue.
/// Markers are consumed; tag boundaries keep the tag in the epilogue.
pub fn split(document: &str) -> (String, String) {
    for marker in [PLACEHOLDER_COMMENT, PLACEHOLDER_TEMPLATE] {
        if let Some((open, close)) = document.split_once(marker) {
            return (open.to_string(), close.to_string());
        }
    }

    // ASCII lowercasing keeps byte offsets aligned with `document`.
    let lower = document.to_ascii_lowercase();
    let point = main_close(&lower)
        .or_else(|| find_tag(&lower, "<script"))
        .or_else(|| lower.find("</body>"));

    match point {
        Some(index) => {
            let at = boundary(document, index);
            let open = &document[..at];
            let open = open.strip_suffix('\n').unwrap_or(open);
            let open = open.strip_suffix('\r').unwrap_or(open);
            (open.to_string(), document[at..].to_string())
        }
        None => (document.to_string(), String::new()),
    }
}

/// Whether `fragment` is a complete document (doctype through `</html>`).
pub fn is_full_document(fragment: &str) -> bool {
    let trimmed = fragment.trim();
    let lower = trimmed.to_ascii_lowercase();
    lower.starts_with("<!doctype") && lower.ends_with("</html>")
}

/// The prologue and epilogue used when no template document is loaded.
pub fn default_shell(title: &str, stylesheet_url: &str, script_url: &str) -> (String, String) {
    let open = format!(
        "<!doctype html>\n<html>\n<head>\n\t<meta charset=\"utf-8\">\n\t<title>{}</title>\n\t<link rel=\"stylesheet\" href=\"{}\" type=\"text/css\" />\n</head>\n<body>",
        escape(title),
        escape(stylesheet_url),
    );
    let close = format!(
        "<script src=\"{}\" type=\"text/javascript\"></script>\n</body>\n</html>",
        escape(script_url)
    );
    (open, close)
}

/// Escape text for use inside a double-quoted attribute or element body.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn main_close(lower: &str) -> Option<usize> {
    let open = find_tag(lower, "<main")?;
    lower[open..].find("</main>").map(|i| open + i)
}

/// Find an opening tag by name, rejecting longer names such as `<mainframe`.
pub(crate) fn find_tag(lower: &str, prefix: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = lower[from..].find(prefix) {
        let at = from + i;
        match lower[at + prefix.len()..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => return Some(at),
            None => return Some(at),
            _ => from = at + prefix.len(),
        }
    }
    None
}

/// Move a split point back to the start of its line when only indentation
/// precedes it.
fn boundary(document: &str, index: usize) -> usize {
    let line_start = document[..index].rfind('\n').map_or(0, |i| i + 1);
    if document[line_start..index].trim().is_empty() {
        line_start
    } else {
        index
    }
}
