//! Sprite engine.
//!
//! Icons are stored in the sprite bundle as `<symbol>` elements. Raw icon
//! markup may arrive bare (only drawing primitives) or wrapped in its own
//! `<svg>` element; the wrapper is removed so the sprite keeps a single
//! root `<svg>`, and its `viewBox` is carried over to the symbol.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SpriteError;
use crate::html::escape;
use crate::minify::tag_end;

/// Coordinate box used when the icon does not declare one.
pub const DEFAULT_VIEW_BOX: &str = "0 0 16 16";

/// Opening markup of the sprite bundle.
pub const SPRITE_OPEN: &str = "<svg class=\"sprite-icons\" xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-hidden=\"true\" focusable=\"false\">\n<defs>";

/// Closing markup of the sprite bundle.
pub const SPRITE_CLOSE: &str = "</defs>\n</svg>";

static VIEW_BOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bviewBox\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Icon identifiers registered with one registry. Grows monotonically
/// until the sprite bundle is reset as a whole.
#[derive(Debug, Default)]
pub struct IconRegistry {
    ids: HashSet<String>,
}

impl IconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`, failing if it was claimed before.
    pub fn register(&mut self, id: &str) -> Result<(), SpriteError> {
        if self.ids.contains(id) {
            return Err(SpriteError::AlreadyRegistered(id.to_string()));
        }
        self.ids.insert(id.to_string());
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.ids.clear();
    }
}

/// Raw icon markup split into its coordinate box and inner primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconParts<'a> {
    pub view_box: &'a str,
    pub inner: &'a str,
}

/// Separate an optional outer `<svg>` wrapper from the drawing primitives.
pub fn parse_icon(raw: &str) -> IconParts<'_> {
    let trimmed = raw.trim();
    let bare = IconParts {
        view_box: DEFAULT_VIEW_BOX,
        inner: trimmed,
    };

    if !is_svg_open(trimmed) {
        return bare;
    }
    let Some(end) = tag_end(trimmed) else {
        return bare;
    };

    let open_tag = &trimmed[..=end];
    let view_box = VIEW_BOX
        .captures(open_tag)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_VIEW_BOX);

    if open_tag.ends_with("/>") {
        return IconParts { view_box, inner: "" };
    }

    let rest = &trimmed[end + 1..];
    let close = rest.len().checked_sub("</svg>".len());
    match close {
        Some(at) if rest[at..].eq_ignore_ascii_case("</svg>") => IconParts {
            view_box,
            inner: rest[..at].trim(),
        },
        _ => bare,
    }
}

/// Wrap raw icon markup in a uniquely identified `<symbol>`.
pub fn symbol(id: &str, raw: &str) -> String {
    let parts = parse_icon(raw);
    format!(
        "<symbol id=\"{}\" viewBox=\"{}\">{}</symbol>",
        escape(id),
        escape(parts.view_box),
        parts.inner
    )
}

fn is_svg_open(text: &str) -> bool {
    let Some(head) = text.get(..4) else {
        return false;
    };
    head.eq_ignore_ascii_case("<svg")
        && text[4..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
}
