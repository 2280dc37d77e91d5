//! Content units and the segmented store that concatenates them.

use std::sync::Arc;

use tracing::warn;

/// One fragment contributed to a bundle: a logical identity plus raw bytes.
///
/// The identity is usually a source file path, but injected content uses
/// virtual names such as `button.css` or `card.html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUnit {
    pub identity: String,
    pub bytes: Vec<u8>,
}

impl ContentUnit {
    pub fn new(identity: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            identity: identity.into(),
            bytes: bytes.into(),
        }
    }

    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Produces leading content for a bundle. Invoked on every regeneration,
/// never cached, so external state changes are picked up automatically.
pub type Initializer = Arc<dyn Fn() -> crate::Result<String> + Send + Sync>;

/// Three ordered sequences of content units, concatenated as
/// initializer, prologue, body, epilogue.
#[derive(Default)]
pub struct SegmentedStore {
    pub prologue: Vec<ContentUnit>,
    pub body: Vec<ContentUnit>,
    pub epilogue: Vec<ContentUnit>,
    pub initializer: Option<Initializer>,
}

impl SegmentedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the raw (unminified) bundle text into `buf`.
    ///
    /// Every unit is followed by a newline. A failing initializer is logged
    /// and skipped for this pass.
    pub fn assemble_into(&self, buf: &mut Vec<u8>) {
        if let Some(init) = &self.initializer {
            match init() {
                Ok(code) => buf.extend_from_slice(code.as_bytes()),
                Err(e) => warn!(error = %e, "Initializer failed, skipping its output"),
            }
        }

        for unit in self
            .prologue
            .iter()
            .chain(self.body.iter())
            .chain(self.epilogue.iter())
        {
            buf.extend_from_slice(&unit.bytes);
            buf.push(b'\n');
        }
    }

    pub fn assemble(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len_hint());
        self.assemble_into(&mut buf);
        buf
    }

    fn len_hint(&self) -> usize {
        self.prologue
            .iter()
            .chain(self.body.iter())
            .chain(self.epilogue.iter())
            .map(|u| u.bytes.len() + 1)
            .sum()
    }
}

impl std::fmt::Debug for SegmentedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentedStore")
            .field("prologue", &self.prologue.len())
            .field("body", &self.body.len())
            .field("epilogue", &self.epilogue.len())
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}
