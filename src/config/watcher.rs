//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so configs
//! replaced by rename (as most editors and config managers do) keep being
//! picked up.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{parse_config, ConfigError};
use crate::config::schema::BalancerConfig;

/// Watches a node configuration file and emits validated reloads.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<BalancerConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<BalancerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            poll_interval: Duration::from_secs(2),
            update_tx,
        };
        (watcher, update_rx)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start watching in a background thread. Dropping the returned handle
    /// stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let path = self.path.clone();
        let tx = self.update_tx;
        // Editors fire several events per save; only forward real changes.
        let mut last_applied = fs::read_to_string(&path).ok();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }
                if !event.paths.iter().any(|p| p.file_name() == file_name.as_deref()) {
                    return;
                }

                match reload(&path, &mut last_applied) {
                    Ok(Some(config)) => {
                        tracing::info!(path = ?path, nodes = config.nodes.len(), "Configuration reloaded");
                        if tx.send(config).is_err() {
                            tracing::debug!("Config update receiver dropped");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                    }
                }
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Re-read the file; `Ok(None)` when its content did not change.
fn reload(path: &Path, last_applied: &mut Option<String>) -> Result<Option<BalancerConfig>, ConfigError> {
    let content = fs::read_to_string(path)?;
    if last_applied.as_deref() == Some(content.as_str()) {
        return Ok(None);
    }
    let config = parse_config(&content)?;
    *last_applied = Some(content);
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_skips_unchanged_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.toml");
        fs::write(&path, "[[nodes]]\nid = \"a\"\n").unwrap();
        let mut last = None;

        assert_eq!(reload(&path, &mut last).unwrap().unwrap().nodes.len(), 1);
        assert!(reload(&path, &mut last).unwrap().is_none());

        fs::write(&path, "[[nodes]]\nid = \"a\"\n[[nodes]]\nid = \"b\"\n").unwrap();
        assert_eq!(reload(&path, &mut last).unwrap().unwrap().nodes.len(), 2);
    }

    #[test]
    fn test_invalid_reload_keeps_last_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.toml");
        fs::write(&path, "[[nodes]]\nid = \"a\"\n").unwrap();
        let mut last = None;
        reload(&path, &mut last).unwrap();

        fs::write(&path, "[[nodes]]\nid = \"\"\n").unwrap();
        assert!(matches!(reload(&path, &mut last), Err(ConfigError::Validation(_))));
        assert_eq!(last.as_deref(), Some("[[nodes]]\nid = \"a\"\n"));
    }
}
