//! Bundle registry. Owns the five bundles and routes content into them.
//!
//! File events are dispatched by extension; components and direct injection
//! calls go through the same reconciliation path. Each registry is an
//! independent context: its icon ids and bundles are not shared with any
//! other registry in the process.

use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::bundle::{Bundle, Snapshot};
use crate::component::Component;
use crate::error::{Error, Result};
use crate::html;
use crate::media::BundleKind;
use crate::minify::Minifier;
use crate::reconcile::{EventKind, Outcome};
use crate::script;
use crate::sprite::{self, IconRegistry};
use crate::unit::{ContentUnit, Initializer};

/// Extensions routed to a bundle.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".js", ".css", ".svg", ".html"];

/// Settings fixed when a registry is built.
#[derive(Clone)]
pub struct RegistryOptions {
    /// Used as the `<title>` of the default index document.
    pub app_name: String,
    /// Directory the generated artifacts are written to.
    pub output_dir: PathBuf,
    /// URL prefix for every bundle except the index, which is served at `/`.
    pub assets_url_prefix: String,
    /// Extra script emitted after the strict-mode directive.
    pub runtime_initializer: Option<Initializer>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            app_name: "MyApp".into(),
            output_dir: PathBuf::from("web/public"),
            assets_url_prefix: String::new(),
            runtime_initializer: None,
        }
    }
}

impl std::fmt::Debug for RegistryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryOptions")
            .field("app_name", &self.app_name)
            .field("output_dir", &self.output_dir)
            .field("assets_url_prefix", &self.assets_url_prefix)
            .field("runtime_initializer", &self.runtime_initializer.is_some())
            .finish()
    }
}

/// Result of routing one piece of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Applied { bundle: BundleKind, outcome: Outcome },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The path is one of the registry's own output files.
    OutputFile,
    /// A complete HTML document, which would nest `<html>` inside `<html>`.
    FullDocument,
    /// Injected content was empty.
    Empty,
}

pub struct BundleRegistry {
    app_name: String,
    output_dir: PathBuf,
    script: Bundle,
    style: Bundle,
    sprite: Bundle,
    favicon: Bundle,
    index: Bundle,
    icons: Mutex<IconRegistry>,
    dispatch: Mutex<()>,
    minifier: Arc<dyn Minifier>,
}

impl BundleRegistry {
    pub fn new(options: RegistryOptions, minifier: Arc<dyn Minifier>) -> Self {
        let bundle = |kind: BundleKind| {
            let url = match kind {
                BundleKind::Index => "/".to_string(),
                _ => asset_url(&options.assets_url_prefix, kind.output_name()),
            };
            Bundle::new(kind, url, options.output_dir.join(kind.output_name()))
        };

        let registry = Self {
            app_name: options.app_name.clone(),
            output_dir: options.output_dir.clone(),
            script: bundle(BundleKind::Script),
            style: bundle(BundleKind::Style),
            sprite: bundle(BundleKind::Sprite),
            favicon: bundle(BundleKind::Favicon),
            index: bundle(BundleKind::Index),
            icons: Mutex::new(IconRegistry::new()),
            dispatch: Mutex::new(()),
            minifier,
        };

        registry
            .script
            .set_initializer(Some(script::prelude(options.runtime_initializer)));
        registry
            .sprite
            .set_prologue(vec![ContentUnit::new("sprite-open.svg", sprite::SPRITE_OPEN)]);
        registry
            .sprite
            .set_epilogue(vec![ContentUnit::new("sprite-close.svg", sprite::SPRITE_CLOSE)]);
        registry.use_default_shell();

        registry
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn bundle(&self, kind: BundleKind) -> &Bundle {
        match kind {
            BundleKind::Script => &self.script,
            BundleKind::Style => &self.style,
            BundleKind::Sprite => &self.sprite,
            BundleKind::Favicon => &self.favicon,
            BundleKind::Index => &self.index,
        }
    }

    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        BundleKind::ALL.into_iter().map(|kind| self.bundle(kind))
    }

    pub fn minifier(&self) -> &dyn Minifier {
        self.minifier.as_ref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn url_path(&self, kind: BundleKind) -> &str {
        self.bundle(kind).url_path()
    }

    pub fn supported_extensions(&self) -> &'static [&'static str] {
        &SUPPORTED_EXTENSIONS
    }

    /// Outputs that are purely generated and must not be watched.
    pub fn unobserved_files(&self) -> Vec<PathBuf> {
        [BundleKind::Style, BundleKind::Script, BundleKind::Sprite]
            .into_iter()
            .map(|kind| self.bundle(kind).output_path().to_path_buf())
            .collect()
    }

    /// Whether `path` names one of this registry's output files.
    ///
    /// Relative paths on either side resolve against the working directory,
    /// so a relative identity matches an absolute output directory.
    pub fn is_output_path(&self, path: &str) -> bool {
        let candidate = resolve(Path::new(path));
        let candidate_lower = candidate.to_string_lossy().to_lowercase();
        self.bundles().any(|bundle| {
            let output = resolve(bundle.output_path());
            output == candidate || output.to_string_lossy().to_lowercase() == candidate_lower
        })
    }

    // ── Snapshots ─────────────────────────────────────────────────────

    pub fn snapshot(&self, kind: BundleKind) -> Result<Snapshot> {
        Ok(self.bundle(kind).get(self.minifier())?)
    }

    pub fn regenerate(&self, kind: BundleKind) -> Result<Snapshot> {
        Ok(self.bundle(kind).regenerate(self.minifier())?)
    }

    /// Rebuild every bundle. All bundles are attempted; the first failure is returned.
    pub fn regenerate_all(&self) -> Result<()> {
        let mut first_error = None;
        for kind in BundleKind::ALL {
            if let Err(e) = self.regenerate(kind) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // ── File events ───────────────────────────────────────────────────

    /// Route a file event to its bundle by extension and reconcile it.
    ///
    /// `content` is ignored for removals and renames.
    pub fn apply_file_event(&self, path: &str, event: EventKind, content: Vec<u8>) -> Result<Dispatch> {
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        if self.is_output_path(path) {
            debug!(path = %path, "Skipping output file");
            return Ok(Dispatch::Skipped(SkipReason::OutputFile));
        }

        let target = route(path)?;
        let content = match target {
            BundleKind::Script => script::strip_leading_use_strict(&content).to_vec(),
            BundleKind::Index
                if event.carries_content()
                    && html::is_full_document(&String::from_utf8_lossy(&content)) =>
            {
                info!(path = %path, "Ignoring complete HTML document");
                return Ok(Dispatch::Skipped(SkipReason::FullDocument));
            }
            _ => content,
        };

        let _guard = self.dispatch.lock();
        let outcome = self.bundle(target).apply(event, ContentUnit::new(path, content));
        Ok(Dispatch::Applied {
            bundle: target,
            outcome,
        })
    }

    // ── Direct injection ──────────────────────────────────────────────

    pub fn inject_css(&self, name: &str, css: &str) -> Dispatch {
        self.inject(BundleKind::Style, format!("{name}.css"), css.as_bytes().to_vec())
    }

    pub fn inject_js(&self, name: &str, js: &str) -> Dispatch {
        let code = script::strip_leading_use_strict(js.as_bytes()).to_vec();
        self.inject(BundleKind::Script, format!("{name}.js"), code)
    }

    pub fn inject_html(&self, name: &str, fragment: &str) -> Dispatch {
        if html::is_full_document(fragment) {
            return Dispatch::Skipped(SkipReason::FullDocument);
        }
        self.inject(BundleKind::Index, format!("{name}.html"), fragment.as_bytes().to_vec())
    }

    fn inject(&self, kind: BundleKind, identity: String, content: Vec<u8>) -> Dispatch {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Dispatch::Skipped(SkipReason::Empty);
        }
        let _guard = self.dispatch.lock();
        let outcome = self
            .bundle(kind)
            .apply(EventKind::Create, ContentUnit::new(identity, content));
        Dispatch::Applied {
            bundle: kind,
            outcome,
        }
    }

    /// Register an icon as a `<symbol>` in the sprite bundle.
    ///
    /// Fails without touching the sprite if `id` is already registered.
    pub fn register_icon(&self, id: &str, svg: &str) -> Result<()> {
        let mut icons = self.icons.lock();
        icons.register(id)?;
        self.sprite.apply(
            EventKind::Create,
            ContentUnit::new(icon_identity(id), sprite::symbol(id, svg)),
        );
        debug!(icon = %id, "Registered icon");
        Ok(())
    }

    pub fn has_icon(&self, id: &str) -> bool {
        self.icons.lock().contains(id)
    }

    pub fn icon_count(&self) -> usize {
        self.icons.lock().len()
    }

    /// Empty the sprite body and forget every icon id.
    pub fn reset_sprite(&self) {
        let mut icons = self.icons.lock();
        icons.clear();
        self.sprite.clear_body();
        info!("Sprite bundle reset");
    }

    /// Route everything a component renders into the bundles.
    pub fn register_component(&self, component: &dyn Component) -> Result<()> {
        let name = component.name();
        if let Some(css) = component.css() {
            self.inject_css(name, &css);
        }
        if let Some(js) = component.js() {
            self.inject_js(name, &js);
        }
        if let Some(fragment) = component.html() {
            self.inject_html(name, &fragment);
        }
        for icon in component.icons() {
            self.register_icon(&icon.id, &icon.svg)?;
        }
        Ok(())
    }

    // ── Index document ────────────────────────────────────────────────

    /// Use `document` as the index shell, merging fragments at its split point.
    pub fn load_html_template(&self, document: &str) {
        let (open, close) = html::split(document);
        self.index
            .set_prologue(vec![ContentUnit::new("index-open.html", open)]);
        self.index
            .set_epilogue(vec![ContentUnit::new("index-close.html", close)]);
        info!("Loaded HTML template");
    }

    /// Restore the generated index shell.
    pub fn use_default_shell(&self) {
        let (open, close) = html::default_shell(
            &self.app_name,
            self.url_path(BundleKind::Style),
            self.url_path(BundleKind::Script),
        );
        self.index
            .set_prologue(vec![ContentUnit::new("index-open.html", open)]);
        self.index
            .set_epilogue(vec![ContentUnit::new("index-close.html", close)]);
    }
}

impl std::fmt::Debug for BundleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleRegistry")
            .field("app_name", &self.app_name)
            .field("output_dir", &self.output_dir)
            .field("icons", &self.icon_count())
            .finish_non_exhaustive()
    }
}

/// Pick the bundle for a source path.
fn route(path: &str) -> Result<BundleKind> {
    let file = Path::new(path);
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    match extension.as_str() {
        ".css" => Ok(BundleKind::Style),
        ".js" => Ok(BundleKind::Script),
        ".html" => Ok(BundleKind::Index),
        ".svg" => {
            let is_favicon = file
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.eq_ignore_ascii_case(BundleKind::Favicon.output_name()));
            Ok(if is_favicon {
                BundleKind::Favicon
            } else {
                BundleKind::Sprite
            })
        }
        _ => Err(Error::UnsupportedExtension {
            extension,
            path: path.to_string(),
        }),
    }
}

fn asset_url(prefix: &str, name: &str) -> String {
    let mut url = String::from("/");
    for segment in prefix.split('/').filter(|s| !s.is_empty()) {
        url.push_str(segment);
        url.push('/');
    }
    url.push_str(name);
    url
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            PathComponent::CurDir => {}
            PathComponent::ParentDir
                if matches!(out.components().next_back(), Some(PathComponent::Normal(_))) =>
            {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Sprite entries for registered icons live outside the file identity namespace.
fn icon_identity(id: &str) -> String {
    format!("icon:{id}")
}

fn resolve(path: &Path) -> PathBuf {
    match std::path::absolute(path) {
        Ok(absolute) => normalize(&absolute),
        Err(_) => normalize(path),
    }
}
