//! Content-stability reads.
//!
//! Editors and build tools often write a file in several steps. A file is
//! only accepted once two consecutive reads, `interval` apart, agree.

use std::path::Path;
use std::time::Duration;

use assetmill_config::WatchConfig;

use crate::WatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityPolicy {
    pub interval: Duration,
    /// Total reads allowed, including the first.
    pub attempts: u32,
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self::from(&WatchConfig::default())
    }
}

impl From<&WatchConfig> for StabilityPolicy {
    fn from(config: &WatchConfig) -> Self {
        Self {
            interval: config.stability_interval(),
            attempts: config.stability_attempts,
        }
    }
}

/// Read `path` until two consecutive reads return the same bytes.
pub async fn read_stable(path: &Path, policy: StabilityPolicy) -> Result<Vec<u8>, WatchError> {
    let read = move || async move { tokio::fs::read(path).await.map_err(|e| WatchError::io(path, e)) };

    let mut previous = read().await?;
    for _ in 1..policy.attempts {
        tokio::time::sleep(policy.interval).await;
        let current = read().await?;
        if current == previous {
            return Ok(current);
        }
        previous = current;
    }

    Err(WatchError::Unstable {
        path: path.to_path_buf(),
        attempts: policy.attempts,
    })
}
