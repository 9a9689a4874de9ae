//! Config file watcher.
//!
//! Watches the config YAML file and turns edits into `ConfigChange` lists.
//! Events arrive on the notify backend thread and are queued; the host drains
//! them on its own update thread via [`ConfigWatcher::poll_changes`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use crate::settings::{Config, ConfigChange};

/// Event indicating the config file has changed and needs reloading.
#[derive(Debug, Clone)]
pub struct ConfigReloadEvent {
    /// Path to the config file that changed.
    pub path: PathBuf,
}

/// Watches the config file for changes and queues reload events.
pub struct ConfigWatcher {
    /// Kept alive to keep watching.
    _watcher: Box<dyn Watcher + Send>,
    path: PathBuf,
    event_receiver: Receiver<ConfigReloadEvent>,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Shared state for the event-handler closure.
#[derive(Clone)]
struct HandlerState {
    filename: OsString,
    path: PathBuf,
    debounce: Duration,
    tx: Sender<ConfigReloadEvent>,
    last_sent: Arc<Mutex<Option<Instant>>>,
}

impl HandlerState {
    fn handle(&self, result: notify::Result<Event>) {
        let Ok(event) = result else {
            return;
        };

        // Create covers editors that save by replacing the file
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }

        let touches_config = event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|f| f == self.filename));
        if !touches_config {
            return;
        }

        {
            let now = Instant::now();
            let mut last = self.last_sent.lock();
            if last.is_some_and(|t| now.duration_since(t) < self.debounce) {
                log::trace!("Debouncing config reload event");
                return;
            }
            *last = Some(now);
        }

        log::info!("Config file changed: {}", self.path.display());
        if let Err(e) = self.tx.send(ConfigReloadEvent {
            path: self.path.clone(),
        }) {
            log::error!("Failed to queue config reload event: {}", e);
        }
    }
}

impl ConfigWatcher {
    /// Start watching `config_path`.
    ///
    /// Uses the platform's native watcher and falls back to a 500 ms
    /// `PollWatcher` when the native backend cannot be created.
    ///
    /// # Errors
    /// Fails if the file does not exist or neither backend can watch it.
    pub fn new(config_path: &Path, debounce_delay_ms: u64) -> Result<Self> {
        if !config_path.exists() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        }

        let canonical = config_path
            .canonicalize()
            .unwrap_or_else(|_| config_path.to_path_buf());
        let filename = canonical
            .file_name()
            .context("Config path has no filename")?
            .to_os_string();
        let parent_dir = canonical
            .parent()
            .context("Config path has no parent directory")?
            .to_path_buf();

        let (tx, rx) = channel();
        let state = HandlerState {
            filename,
            path: canonical.clone(),
            debounce: Duration::from_millis(debounce_delay_ms),
            tx,
            last_sent: Arc::new(Mutex::new(None)),
        };

        let mut watcher = Self::create_watcher(state)?;
        watcher
            .watch(&parent_dir, RecursiveMode::NonRecursive)
            .with_context(|| {
                format!("Failed to watch config directory: {}", parent_dir.display())
            })?;

        log::info!("Config hot reload: watching {}", canonical.display());

        Ok(Self {
            _watcher: watcher,
            path: canonical,
            event_receiver: rx,
        })
    }

    fn create_watcher(state: HandlerState) -> Result<Box<dyn Watcher + Send>> {
        let native_state = state.clone();
        match notify::recommended_watcher(move |res: notify::Result<Event>| {
            native_state.handle(res)
        }) {
            Ok(w) => {
                log::debug!("Config watcher: using native backend");
                Ok(Box::new(w))
            }
            Err(e) => {
                log::warn!(
                    "Config watcher: native backend unavailable ({}); falling back to PollWatcher",
                    e
                );
                let poll_watcher = PollWatcher::new(
                    move |res: notify::Result<Event>| state.handle(res),
                    NotifyConfig::default().with_poll_interval(Duration::from_millis(500)),
                )
                .context("Failed to create fallback PollWatcher")?;
                Ok(Box::new(poll_watcher))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next pending reload event, if any (non-blocking).
    pub fn try_recv(&self) -> Option<ConfigReloadEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Drain pending reload events and, if there were any, reload the file
    /// and return what changed relative to `current` (which is updated).
    ///
    /// A file that fails to load or validate is logged and ignored; `current`
    /// keeps its previous values.
    pub fn poll_changes(&self, current: &mut Config) -> Vec<ConfigChange> {
        let mut pending = false;
        while self.try_recv().is_some() {
            pending = true;
        }
        if !pending {
            return Vec::new();
        }

        match Config::load_from(&self.path) {
            Ok(reloaded) => {
                let changes = Config::diff(current, &reloaded);
                *current = reloaded;
                changes
            }
            Err(e) => {
                log::warn!("Ignoring invalid config reload: {:#}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, config: &Config) -> PathBuf {
        let path = dir.path().join("fontswap.yaml");
        config.save_to(&path).expect("Failed to write config");
        path
    }

    #[test]
    fn test_watcher_creation_with_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(&temp_dir, &Config::default());
        assert!(ConfigWatcher::new(&path, 100).is_ok());
    }

    #[test]
    fn test_watcher_creation_with_nonexistent_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing.yaml");
        assert!(ConfigWatcher::new(&path, 100).is_err());
    }

    #[test]
    fn test_no_initial_changes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(&temp_dir, &Config::default());
        let watcher = ConfigWatcher::new(&path, 100).expect("Failed to create watcher");

        let mut current = Config::default();
        assert!(watcher.poll_changes(&mut current).is_empty());
        assert_eq!(current, Config::default());
    }

    #[test]
    fn test_file_change_detection() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(&temp_dir, &Config::default());
        let watcher = ConfigWatcher::new(&path, 50).expect("Failed to create watcher");

        std::thread::sleep(Duration::from_millis(100));
        fs::write(&path, "enabled: false\n").expect("Failed to write config");
        std::thread::sleep(Duration::from_millis(700));

        // Delivery is platform-dependent; only check the result when it arrived
        let mut current = Config::default();
        let changes = watcher.poll_changes(&mut current);
        if !changes.is_empty() {
            assert_eq!(changes, vec![ConfigChange::Enabled(false)]);
            assert!(!current.enabled);
        }
    }

    #[test]
    fn test_debug_impl() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(&temp_dir, &Config::default());
        let watcher = ConfigWatcher::new(&path, 100).expect("Failed to create watcher");
        assert!(format!("{:?}", watcher).contains("ConfigWatcher"));
    }
}
