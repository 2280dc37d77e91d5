//! # assetmill Core
//!
//! Content reconciliation and bundle caching for the assetmill asset pipeline.
//! This crate performs **no I/O**; file watching, disk writes and HTTP
//! serving live in their own crates and drive the registry defined here.
//!
//! ## Model
//!
//! Every generated artifact (script, stylesheet, sprite, favicon, index page)
//! is a [`Bundle`]: an ordered list of content units wrapped by a fixed
//! prologue and epilogue, plus a lazily rebuilt minified snapshot.
//! - File events are reconciled by identity first, then by content
//! - Structural changes invalidate the snapshot; reads rebuild it on demand
//! - Minification is a trait seam so callers can plug in their own engine

pub mod bundle;
pub mod component;
pub mod error;
pub mod html;
pub mod media;
pub mod minify;
pub mod reconcile;
pub mod registry;
pub mod script;
pub mod sprite;
pub mod unit;

// Re-export key types at crate root for ergonomics
pub use bundle::{Bundle, Snapshot};
pub use component::{Component, Icon};
pub use error::{Error, MinifyError, Result, SpriteError};
pub use media::{BundleKind, MediaType};
pub use minify::{BasicMinifier, Minifier, Passthrough};
pub use reconcile::{EventKind, Outcome, UnknownEventKind};
pub use registry::{BundleRegistry, Dispatch, RegistryOptions, SkipReason};
pub use sprite::IconRegistry;
pub use unit::{ContentUnit, Initializer, SegmentedStore};
