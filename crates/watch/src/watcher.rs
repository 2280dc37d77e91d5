//! Source watcher.
//!
//! `notify` delivers events on its own thread; they are translated to
//! reconciliation events and funnelled through one channel into a single
//! task, so events for a file are applied in the order they were observed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetmill_core::{BundleRegistry, Dispatch, EventKind};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind as FsEventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::disk::DiskSync;
use crate::stability::{StabilityPolicy, read_stable};
use crate::{WatchError, is_supported, source_identity};

const EVENT_BUFFER: usize = 256;

/// Map a file-system event to reconciliation events, in application order.
///
/// `exists` resolves renames the platform reports without a direction.
pub fn translate(event: &Event, exists: impl Fn(&Path) -> bool) -> Vec<(PathBuf, EventKind)> {
    let each = |kind: EventKind| {
        event
            .paths
            .iter()
            .map(|p| (p.clone(), kind))
            .collect::<Vec<_>>()
    };

    match &event.kind {
        FsEventKind::Create(_) => each(EventKind::Create),
        FsEventKind::Remove(_) => each(EventKind::Remove),
        FsEventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => each(EventKind::Write),
        FsEventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => each(EventKind::Rename),
            RenameMode::To => each(EventKind::Create),
            RenameMode::Both => match event.paths.as_slice() {
                [from, to] => vec![
                    (from.clone(), EventKind::Rename),
                    (to.clone(), EventKind::Create),
                ],
                _ => Vec::new(),
            },
            _ => event
                .paths
                .iter()
                .map(|p| {
                    let kind = if exists(p) {
                        EventKind::Create
                    } else {
                        EventKind::Rename
                    };
                    (p.clone(), kind)
                })
                .collect(),
        },
        _ => Vec::new(),
    }
}

/// Applies translated events to a registry, optionally writing touched
/// bundles to disk.
#[derive(Debug, Clone)]
pub struct EventPump {
    registry: Arc<BundleRegistry>,
    disk: Option<DiskSync>,
    policy: StabilityPolicy,
    root: PathBuf,
}

impl EventPump {
    /// `root` is the directory identities are made relative to.
    pub fn new(registry: Arc<BundleRegistry>, policy: StabilityPolicy, root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            disk: None,
            policy,
            root: root.into(),
        }
    }

    pub fn with_disk_sync(mut self, disk: DiskSync) -> Self {
        self.disk = Some(disk);
        self
    }

    /// Apply one event. Returns `None` when the event was ignored before
    /// reaching the registry.
    pub async fn handle(&self, path: &Path, kind: EventKind) -> Result<Option<Dispatch>, WatchError> {
        if !is_supported(path, self.registry.supported_extensions()) {
            return Ok(None);
        }
        let identity = source_identity(path, &self.root);
        if self.registry.is_output_path(&identity) || self.registry.is_output_path(&path.to_string_lossy()) {
            return Ok(None);
        }

        let content = if kind.carries_content() {
            match read_stable(path, self.policy).await {
                Ok(content) => content,
                Err(WatchError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %identity, "File vanished before it could be read");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        } else {
            Vec::new()
        };

        let dispatch = self.registry.apply_file_event(&identity, kind, content)?;
        if let (Dispatch::Applied { bundle, outcome }, Some(disk)) = (&dispatch, &self.disk) {
            if outcome.is_structural() {
                disk.sync(*bundle).await?;
            }
        }
        Ok(Some(dispatch))
    }

    /// Drain `events` until every sender is gone. Failures are logged and
    /// do not stop the loop.
    pub async fn run(self, mut events: mpsc::Receiver<(PathBuf, EventKind)>) {
        while let Some((path, kind)) = events.recv().await {
            if let Err(e) = self.handle(&path, kind).await {
                warn!(path = %path.display(), event = %kind, error = %e, "Failed to apply file event");
            }
        }
        debug!("Event channel closed");
    }
}

/// A running watcher over a set of source directories.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl SourceWatcher {
    /// Watch `sources` recursively and feed their events to `pump`.
    ///
    /// Must be called from within a tokio runtime. Missing directories are
    /// skipped with a warning.
    pub fn start(pump: EventPump, sources: &[PathBuf]) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for item in translate(&event, Path::exists) {
                    if tx.blocking_send(item).is_err() {
                        return;
                    }
                }
            }
            Err(e) => warn!(error = %e, "File watcher error"),
        })?;

        for source in sources {
            if !source.is_dir() {
                warn!(dir = %source.display(), "Source directory does not exist, not watching");
                continue;
            }
            watcher.watch(source, RecursiveMode::Recursive)?;
            info!(dir = %source.display(), "Watching");
        }

        let task = tokio::spawn(pump.run(rx));
        Ok(Self {
            _watcher: watcher,
            task,
        })
    }

    /// Stop watching and abandon any queued events.
    pub fn stop(self) {
        self.task.abort();
    }
}
