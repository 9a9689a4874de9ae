//! Plugin lifecycle: wiring config, assets, engine and change detection.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use anyhow::Context;
use fontswap_config::{Config, ConfigChange, ConfigWatcher, reconcile_selection, scan_font_bundles};
use fontswap_fonts::{AssetResolver, load_shared_fonts};

use crate::classifier::KeepPolicy;
use crate::detector::ChangeDetector;
use crate::engine::{INITIAL_REASON, OverrideEngine};
use crate::error::FontSwapError;
use crate::host::Host;
use crate::scheduler::Scheduler;
use crate::schema::{Action, SchemaAdapter};

/// Directory under the font directory holding extra shared fonts.
pub const SHARED_FONT_DIR: &str = "Shared";

/// Debounce applied to config file events.
const CONFIG_DEBOUNCE_MS: u64 = 100;

/// A running font override attached to a host.
pub struct FontSwap {
    config: Config,
    config_path: Option<PathBuf>,
    resolver: AssetResolver,
    engine: Rc<OverrideEngine>,
    scheduler: Scheduler,
    detector: Option<ChangeDetector>,
    locale_unsubscribe: Option<Action>,
    watcher: Option<ConfigWatcher>,
    shut_down: bool,
}

impl std::fmt::Debug for FontSwap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSwap")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("detector", &self.detector)
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}

impl FontSwap {
    /// Start the override on `host`.
    ///
    /// Captures the host's default typeface, loads the selected bundle from
    /// the font directory under `plugin_dir` along with any faces in its
    /// [`SHARED_FONT_DIR`], subscribes to locale changes
    /// and, when enabled, applies the override and starts change detection.
    pub fn start(
        host: Rc<dyn Host>,
        mut config: Config,
        plugin_dir: impl AsRef<Path>,
        now: Instant,
    ) -> Self {
        let font_dir = config.resolved_font_dir(plugin_dir.as_ref());
        let bundles = scan_font_bundles(&font_dir);
        log::info!("Found {} font bundles in {}", bundles.len(), font_dir.display());
        reconcile_selection(&mut config, &bundles);

        let shared_dir = font_dir.join(SHARED_FONT_DIR);

        let policy = KeepPolicy::new(config.keep_original_latin, config.keep_original_digits);
        let engine = Rc::new(OverrideEngine::new(
            host,
            Rc::new(SchemaAdapter::new()),
            config.target_locale.clone(),
            policy,
        ));

        let mut plugin = Self {
            resolver: AssetResolver::new(font_dir),
            config,
            config_path: None,
            engine,
            scheduler: Scheduler::new(),
            detector: None,
            locale_unsubscribe: None,
            watcher: None,
            shut_down: false,
        };

        plugin.engine.capture_original_defaults();
        if let Err(e) = plugin.load_bundle(&plugin.config.font_bundle.clone()) {
            log::warn!("No replacement font loaded: {}", e);
        }
        if shared_dir.is_dir() {
            plugin.engine.add_shared_fonts(load_shared_fonts(&shared_dir));
        }
        plugin.register_locale_listener();
        plugin.engine.configure_fallbacks();

        if plugin.config.enabled {
            plugin.engine.enable(INITIAL_REASON);
            plugin.start_detection(now);
        } else {
            log::info!("Font override disabled in config");
        }
        plugin
    }

    /// Load the config file at `config_path` (writing defaults if missing),
    /// start, and watch the file for edits.
    ///
    /// # Errors
    /// Fails only if the config file cannot be read or written. A watcher
    /// that cannot be created is logged and skipped.
    pub fn start_with_config_file(
        host: Rc<dyn Host>,
        config_path: &Path,
        plugin_dir: impl AsRef<Path>,
        now: Instant,
    ) -> anyhow::Result<Self> {
        let config = Config::load_from(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;
        let selected = config.font_bundle.clone();

        let mut plugin = Self::start(host, config, plugin_dir, now);
        plugin.config_path = Some(config_path.to_path_buf());

        if plugin.config.font_bundle != selected {
            plugin
                .config
                .save_to(config_path)
                .context("Failed to save reconciled font bundle selection")?;
        }

        match ConfigWatcher::new(config_path, CONFIG_DEBOUNCE_MS) {
            Ok(watcher) => plugin.watcher = Some(watcher),
            Err(e) => log::warn!("Config hot reload unavailable: {:#}", e),
        }
        Ok(plugin)
    }

    pub fn engine(&self) -> &Rc<OverrideEngine> {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn detector(&self) -> Option<&ChangeDetector> {
        self.detector.as_ref()
    }

    pub fn has_locale_listener(&self) -> bool {
        self.locale_unsubscribe.is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn register_locale_listener(&mut self) {
        let weak = Rc::downgrade(&self.engine);
        let listener: Action = Rc::new(move || {
            if let Some(engine) = weak.upgrade() {
                engine.on_locale_changed();
            }
        });
        match self.engine.locale().subscribe_locale_update(listener) {
            Ok(unsubscribe) => {
                log::debug!("Locale update listener registered");
                self.locale_unsubscribe = Some(unsubscribe);
            }
            Err(e) => log::warn!(
                "Locale updates unavailable ({}); fonts refresh on scene load only",
                e
            ),
        }
    }

    fn load_bundle(&self, name: &str) -> Result<(), FontSwapError> {
        match self.resolver.load_replacement(name) {
            Ok(replacement) => {
                self.engine.set_replacement(replacement);
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "Failed to load font bundle {}: {}",
                    self.resolver.bundle_path(name).display(),
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Switch to another bundle. On failure the current replacement stays.
    pub fn select_bundle(&mut self, name: &str) -> Result<(), FontSwapError> {
        self.load_bundle(name)?;
        self.engine.configure_fallbacks();
        self.engine.apply("bundleChanged");
        Ok(())
    }

    fn start_detection(&mut self, now: Instant) {
        if self.detector.is_none() {
            self.detector = Some(ChangeDetector::start(
                Rc::clone(&self.engine),
                &self.scheduler,
                now,
            ));
        }
    }

    fn stop_detection(&mut self) {
        if let Some(detector) = self.detector.take() {
            detector.stop();
        }
    }

    /// Host loaded a new scene.
    pub fn on_scene_loaded(&self) {
        if self.shut_down {
            return;
        }
        self.engine.on_scene_loaded();
    }

    /// Replace the whole config and react to what changed.
    pub fn update_config(&mut self, config: Config, now: Instant) {
        let changes = Config::diff(&self.config, &config);
        self.config = config;
        self.on_config_changed(&changes, now);
    }

    /// React to individual value changes. The stored config must already
    /// hold the new values.
    pub fn on_config_changed(&mut self, changes: &[ConfigChange], now: Instant) {
        if self.shut_down {
            return;
        }
        for change in changes {
            log::debug!("Config change: {:?}", change);
            match change {
                ConfigChange::Enabled(true) => {
                    log::info!("Font override enabled");
                    self.engine.configure_fallbacks();
                    self.engine.enable("modEnabled");
                    self.start_detection(now);
                }
                ConfigChange::Enabled(false) => {
                    log::info!("Font override disabled; restoring original fonts");
                    self.stop_detection();
                    self.engine.disable();
                }
                ConfigChange::FontBundle(name) => {
                    // Error already logged; the previous replacement stays
                    let _ = self.select_bundle(name);
                }
                ConfigChange::KeepOriginal { latin, digits } => {
                    self.engine.set_policy(KeepPolicy::new(*latin, *digits));
                }
                ConfigChange::TargetLocale(target) => {
                    self.engine.set_target_locale(target);
                }
            }
        }
    }

    /// Per-frame tick: apply config file edits, then run due tasks.
    pub fn update(&mut self, now: Instant) {
        if self.shut_down {
            return;
        }
        let changes = match &self.watcher {
            Some(watcher) => watcher.poll_changes(&mut self.config),
            None => Vec::new(),
        };
        if !changes.is_empty() {
            self.on_config_changed(&changes, now);
        }
        self.scheduler.run_due(now);
    }

    /// Detach from the host. Fonts stay as they are. Safe to call twice.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if let Some(unsubscribe) = self.locale_unsubscribe.take() {
            unsubscribe();
        }
        self.stop_detection();
        self.watcher = None;
        log::info!("Font override shut down");
    }
}

impl Drop for FontSwap {
    fn drop(&mut self) {
        self.shutdown();
    }
}
