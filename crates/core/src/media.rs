//! Media types and bundle kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The media type a bundle is minified and served as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Css,
    JavaScript,
    Svg,
    Html,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "text/css",
            Self::JavaScript => "text/javascript",
            Self::Svg => "image/svg+xml",
            Self::Html => "text/html",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five generated artifacts owned by a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleKind {
    Script,
    Style,
    Sprite,
    Favicon,
    Index,
}

impl BundleKind {
    /// All kinds, in the order they are built on startup.
    pub const ALL: [BundleKind; 5] = [
        BundleKind::Style,
        BundleKind::Script,
        BundleKind::Sprite,
        BundleKind::Favicon,
        BundleKind::Index,
    ];

    /// File name of the generated artifact.
    pub fn output_name(&self) -> &'static str {
        match self {
            Self::Script => "script.js",
            Self::Style => "style.css",
            Self::Sprite => "sprite.svg",
            Self::Favicon => "favicon.svg",
            Self::Index => "index.html",
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Script => MediaType::JavaScript,
            Self::Style => MediaType::Css,
            Self::Sprite | Self::Favicon => MediaType::Svg,
            Self::Index => MediaType::Html,
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.output_name())
    }
}
