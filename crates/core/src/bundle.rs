//! Cache coordinator for one bundle.
//!
//! A `Bundle` owns its segmented store and the minified snapshot behind a
//! single read/write lock, so body mutation and snapshot production exclude
//! each other. Reads take the shared lock while the snapshot is valid and
//! fall back to the exclusive lock, re-checking validity, to regenerate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::MinifyError;
use crate::media::{BundleKind, MediaType};
use crate::minify::Minifier;
use crate::reconcile::{EventKind, Outcome, reconcile};
use crate::unit::{ContentUnit, Initializer, SegmentedStore};

/// Minified bytes shared with readers without copying.
pub type Snapshot = Arc<[u8]>;

struct BundleState {
    store: SegmentedStore,
    snapshot: Snapshot,
    valid: bool,
}

/// One generated artifact: its content store plus a lazily rebuilt snapshot.
pub struct Bundle {
    kind: BundleKind,
    url_path: String,
    output_path: PathBuf,
    state: RwLock<BundleState>,
}

impl Bundle {
    pub fn new(kind: BundleKind, url_path: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            url_path: url_path.into(),
            output_path: output_path.into(),
            state: RwLock::new(BundleState {
                store: SegmentedStore::new(),
                snapshot: Arc::from(Vec::new()),
                valid: false,
            }),
        }
    }

    pub fn kind(&self) -> BundleKind {
        self.kind
    }

    pub fn media_type(&self) -> MediaType {
        self.kind.media_type()
    }

    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    // ── Store mutation ────────────────────────────────────────────────

    /// Reconcile one event against the body. Structural changes invalidate
    /// the snapshot before the lock is released.
    pub fn apply(&self, event: EventKind, unit: ContentUnit) -> Outcome {
        let identity = unit.identity.clone();
        let mut state = self.state.write();
        let outcome = reconcile(&mut state.store.body, event, unit);
        if outcome.is_structural() {
            state.valid = false;
        }
        drop(state);

        debug!(bundle = %self.kind, identity = %identity, event = %event, ?outcome, "Reconciled");
        outcome
    }

    pub fn set_prologue(&self, units: Vec<ContentUnit>) {
        let mut state = self.state.write();
        state.store.prologue = units;
        state.valid = false;
    }

    pub fn set_epilogue(&self, units: Vec<ContentUnit>) {
        let mut state = self.state.write();
        state.store.epilogue = units;
        state.valid = false;
    }

    pub fn set_initializer(&self, initializer: Option<Initializer>) {
        let mut state = self.state.write();
        state.store.initializer = initializer;
        state.valid = false;
    }

    /// Drop every body entry, keeping prologue and epilogue.
    pub fn clear_body(&self) {
        let mut state = self.state.write();
        state.store.body.clear();
        state.valid = false;
    }

    /// Identities of the body entries, in order.
    pub fn identities(&self) -> Vec<String> {
        self.state
            .read()
            .store
            .body
            .iter()
            .map(|u| u.identity.clone())
            .collect()
    }

    pub fn body_len(&self) -> usize {
        self.state.read().store.body.len()
    }

    /// The unminified concatenation of the current content.
    pub fn raw(&self) -> Vec<u8> {
        self.state.read().store.assemble()
    }

    // ── Snapshot ──────────────────────────────────────────────────────

    pub fn invalidate(&self) {
        self.state.write().valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.state.read().valid
    }

    /// The current snapshot if it is valid. Never regenerates.
    pub fn cached(&self) -> Option<Snapshot> {
        let state = self.state.read();
        state.valid.then(|| state.snapshot.clone())
    }

    /// Return the snapshot, regenerating it first if it is stale.
    pub fn get(&self, minifier: &dyn Minifier) -> Result<Snapshot, MinifyError> {
        {
            let state = self.state.read();
            if state.valid {
                return Ok(state.snapshot.clone());
            }
        }

        let mut state = self.state.write();
        // Another writer may have rebuilt it while we waited.
        if state.valid {
            return Ok(state.snapshot.clone());
        }
        self.rebuild(&mut state, minifier)
    }

    /// Rebuild the snapshot unconditionally.
    pub fn regenerate(&self, minifier: &dyn Minifier) -> Result<Snapshot, MinifyError> {
        let mut state = self.state.write();
        self.rebuild(&mut state, minifier)
    }

    fn rebuild(&self, state: &mut BundleState, minifier: &dyn Minifier) -> Result<Snapshot, MinifyError> {
        let raw = state.store.assemble();
        match minifier.minify(self.media_type(), &raw) {
            Ok(minified) => {
                state.snapshot = Arc::from(minified);
                state.valid = true;
                debug!(
                    bundle = %self.kind,
                    raw_bytes = raw.len(),
                    minified_bytes = state.snapshot.len(),
                    "Regenerated snapshot"
                );
                Ok(state.snapshot.clone())
            }
            Err(e) => {
                state.valid = false;
                warn!(bundle = %self.kind, error = %e, "Snapshot regeneration failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Bundle")
            .field("kind", &self.kind)
            .field("url_path", &self.url_path)
            .field("output_path", &self.output_path)
            .field("store", &state.store)
            .field("valid", &state.valid)
            .finish()
    }
}
