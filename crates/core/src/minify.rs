//! Minification seam.
//!
//! The core treats minification as a black box keyed by media type. Any
//! `Minifier` can be plugged into a registry; `BasicMinifier` is the
//! built-in implementation used by the CLI.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::MinifyError;
use crate::html::find_tag;
use crate::media::MediaType;

/// Turns raw bundle bytes into served bytes, or rejects malformed input.
pub trait Minifier: Send + Sync {
    fn minify(&self, media_type: MediaType, input: &[u8]) -> Result<Vec<u8>, MinifyError>;
}

impl<F> Minifier for F
where
    F: Fn(MediaType, &[u8]) -> Result<Vec<u8>, MinifyError> + Send + Sync,
{
    fn minify(&self, media_type: MediaType, input: &[u8]) -> Result<Vec<u8>, MinifyError> {
        self(media_type, input)
    }
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Minifier for Passthrough {
    fn minify(&self, _media_type: MediaType, input: &[u8]) -> Result<Vec<u8>, MinifyError> {
        Ok(input.to_vec())
    }
}

/// Conservative whitespace and comment minifier.
///
/// CSS and SVG input is validated structurally (balanced braces, balanced
/// tags); HTML and JavaScript are only tidied.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicMinifier;

impl Minifier for BasicMinifier {
    fn minify(&self, media_type: MediaType, input: &[u8]) -> Result<Vec<u8>, MinifyError> {
        let text = String::from_utf8_lossy(input);
        let out = match media_type {
            MediaType::Css => css(&text)?,
            MediaType::JavaScript => javascript(&text),
            MediaType::Svg => svg(&text)?,
            MediaType::Html => html(&text),
        };
        Ok(out.into_bytes())
    }
}

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").unwrap());

fn css(input: &str) -> Result<String, MinifyError> {
    let err = |reason: &str| MinifyError::syntax(MediaType::Css, reason);
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut depth = 0usize;
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut prev = '\0';
            let mut closed = false;
            for c in chars.by_ref() {
                if prev == '*' && c == '/' {
                    closed = true;
                    break;
                }
                prev = c;
            }
            if !closed {
                return Err(err("unterminated comment"));
            }
            pending_space = true;
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        if pending_space {
            let after_punct = out.ends_with(['{', '}', ';', ',', '>', ':']);
            if !out.is_empty() && !after_punct && !matches!(c, '{' | '}' | ';' | ',' | '>') {
                out.push(' ');
            }
            pending_space = false;
        }

        match c {
            '"' | '\'' => {
                out.push(c);
                let mut closed = false;
                while let Some(s) = chars.next() {
                    out.push(s);
                    if s == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if s == c {
                        closed = true;
                        break;
                    } else if s == '\n' {
                        break;
                    }
                }
                if !closed {
                    return Err(err("unterminated string"));
                }
            }
            '{' => {
                depth += 1;
                out.push(c);
            }
            '}' => {
                if depth == 0 {
                    return Err(err("unexpected '}'"));
                }
                depth -= 1;
                if out.ends_with(';') {
                    out.pop();
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if depth != 0 {
        return Err(err("unclosed '{'"));
    }
    Ok(out)
}

fn javascript(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn svg(input: &str) -> Result<String, MinifyError> {
    let stripped = COMMENT.replace_all(input, "");
    check_tag_balance(&stripped).map_err(|reason| MinifyError::syntax(MediaType::Svg, reason))?;
    Ok(BETWEEN_TAGS.replace_all(&stripped, "><").trim().to_string())
}

fn html(input: &str) -> String {
    let stripped = COMMENT.replace_all(input, |caps: &regex::Captures<'_>| {
        let comment = &caps[0];
        if comment.starts_with("<!--[if") || comment.starts_with("<!--<![endif]") {
            Cow::Owned(comment.to_string())
        } else {
            Cow::Borrowed("")
        }
    });

    let mut out = Vec::new();
    let mut preformatted = false;
    for line in stripped.lines() {
        let lower = line.to_ascii_lowercase();
        if find_tag(&lower, "<pre").is_some() || find_tag(&lower, "<textarea").is_some() {
            preformatted = true;
        }
        if preformatted || !line.trim().is_empty() {
            out.push(if preformatted { line } else { line.trim_end() });
        }
        if lower.contains("</pre>") || lower.contains("</textarea>") {
            preformatted = false;
        }
    }
    out.join("\n")
}

/// Verify every opened element is closed in order.
fn check_tag_balance(text: &str) -> Result<(), String> {
    let mut stack: Vec<&str> = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('<') {
        let start = cursor + offset;
        let rest = &text[start..];

        let skip_to = |terminator: &str| {
            rest.find(terminator)
                .map(|i| start + i + terminator.len())
                .ok_or_else(|| format!("unterminated markup at byte {start}"))
        };

        if rest.starts_with("<![CDATA[") {
            cursor = skip_to("]]>")?;
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            cursor = skip_to(">")?;
            continue;
        }

        let end = tag_end(rest).ok_or_else(|| format!("unterminated tag at byte {start}"))?;
        let tag = &rest[1..end];

        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim();
            match stack.pop() {
                Some(open) if open == name => {}
                Some(open) => return Err(format!("expected </{open}>, found </{name}>")),
                None => return Err(format!("unexpected </{name}>")),
            }
        } else if !tag.trim_end().ends_with('/') {
            let name = tag
                .split(|c: char| c.is_whitespace() || c == '/')
                .next()
                .unwrap_or_default();
            if name.is_empty() {
                return Err(format!("empty tag name at byte {start}"));
            }
            stack.push(name);
        }

        cursor = start + end + 1;
    }

    match stack.pop() {
        Some(open) => Err(format!("unclosed <{open}>")),
        None => Ok(()),
    }
}

/// Byte offset of the `>` closing the tag that starts `rest`, skipping quoted
/// attribute values.
pub(crate) fn tag_end(rest: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in rest.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min(media_type: MediaType, input: &str) -> Result<String, MinifyError> {
        BasicMinifier
            .minify(media_type, input.as_bytes())
            .map(|b| String::from_utf8(b).unwrap())
    }

    #[test]
    fn css_collapses_whitespace_and_comments() {
        let out = min(
            MediaType::Css,
            "/* theme */\nbody {\n  color: red;\n  margin: 0 auto;\n}\n\na > b , c { x: 1 }\n",
        )
        .unwrap();
        assert_eq!(out, "body{color:red;margin:0 auto}a>b,c{x:1}");
    }

    #[test]
    fn css_keeps_strings_verbatim() {
        let out = min(MediaType::Css, r#"a::after { content: "  {  } "; }"#).unwrap();
        assert_eq!(out, r#"a::after{content:"  {  } "}"#);
    }

    #[test]
    fn css_rejects_unbalanced_braces() {
        assert!(matches!(
            min(MediaType::Css, "body { color: red;"),
            Err(MinifyError::Syntax { .. })
        ));
        assert!(min(MediaType::Css, "}").is_err());
        assert!(min(MediaType::Css, "/* open").is_err());
    }

    #[test]
    fn javascript_trims_trailing_whitespace() {
        let out = min(MediaType::JavaScript, "  'use strict';   \nlet a = 1;  \n\n").unwrap();
        assert_eq!(out, "'use strict';\nlet a = 1;");
    }

    #[test]
    fn svg_removes_comments_and_inter_tag_space() {
        let out = min(
            MediaType::Svg,
            "<svg>\n  <!-- icon -->\n  <defs>\n    <symbol id=\"a\"><path d=\"M0 0\"/></symbol>\n  </defs>\n</svg>\n",
        )
        .unwrap();
        assert_eq!(out, r#"<svg><defs><symbol id="a"><path d="M0 0"/></symbol></defs></svg>"#);
    }

    #[test]
    fn svg_rejects_mismatched_tags() {
        let err = min(MediaType::Svg, "<svg><g></svg>").unwrap_err();
        assert!(err.to_string().contains("expected </g>"));
        assert!(min(MediaType::Svg, "<svg><path d=\"M0 0\">").is_err());
    }

    #[test]
    fn svg_accepts_quoted_angle_brackets() {
        assert!(min(MediaType::Svg, r#"<svg><text data-x="a>b">hi</text></svg>"#).is_ok());
    }

    #[test]
    fn html_strips_comments_and_blank_lines() {
        let out = min(
            MediaType::Html,
            "<body>\n\n  <!-- nav -->\n  <p>hi</p>   \n<pre>\n\n  keep\n</pre>\n</body>",
        )
        .unwrap();
        assert_eq!(out, "<body>\n  <p>hi</p>\n<pre>\n\n  keep\n</pre>\n</body>");
    }

    #[test]
    fn html_custom_elements_are_not_preformatted() {
        let out = min(
            MediaType::Html,
            "<preview-card>\n\n  <p>a</p>   \n\n</preview-card>\n<pre>\n\n x\n</pre>\n\n<p>b</p>",
        )
        .unwrap();
        assert_eq!(
            out,
            "<preview-card>\n  <p>a</p>\n</preview-card>\n<pre>\n\n x\n</pre>\n<p>b</p>"
        );
    }

    #[test]
    fn closures_are_minifiers() {
        let upper = |_: MediaType, input: &[u8]| Ok(input.to_ascii_uppercase());
        assert_eq!(upper.minify(MediaType::Css, b"a{}").unwrap(), b"A{}");
    }
}
