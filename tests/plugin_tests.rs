//! Tests for the plugin lifecycle.
//!
//! Covers startup against a font directory, bundle switching, config
//! changes applied at runtime, locale and scene notifications from the host,
//! and shutdown.

mod common;

use std::path::Path;
use std::time::Instant;

use common::{EMPTY_SFNT, host_dyn, named_face, typeface, write_bundle};
use fontswap::config::{Config, ConfigChange};
use fontswap::fonts::{AssetKind, AssetRef};
use fontswap::sim::{LocaleNames, SimHost};
use fontswap::{EngineState, FontSwap, SHARED_FONT_DIR, TextKind, TextObject};
use tempfile::TempDir;

fn font_dir(plugin_dir: &Path) -> std::path::PathBuf {
    plugin_dir.join("Font")
}

/// Plugin directory holding two bundles: `NotoSansSC.bundle` and
/// `Source.bundle`.
fn plugin_dir() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let fonts = font_dir(temp_dir.path());
    write_bundle(
        &fonts.join("NotoSansSC.bundle"),
        &[("NotoSansSC.ttf", EMPTY_SFNT), ("readme.txt", &b"license"[..])],
    );
    write_bundle(&fonts.join("Source.bundle"), &[("SourceHanSans.otf", EMPTY_SFNT)]);
    temp_dir
}

fn replacement_name(plugin: &FontSwap) -> Option<String> {
    plugin
        .engine()
        .replacement()
        .map(|r| r.typeface.name().to_string())
}

fn font_name(font: Option<AssetRef>) -> Option<String> {
    font.map(|f| f.name().to_string())
}

// ============================================================================
// Startup
// ============================================================================

#[test]
fn test_start_selects_first_bundle_and_applies() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let rich = host.spawn_text(TextKind::Structured, "任务", Some(typeface("Bender")));
    let plain = host.spawn_text(TextKind::Plain, "任务", Some(common::native("Arial")));

    let plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());

    assert_eq!(plugin.config().font_bundle, "NotoSansSC.bundle");
    assert_eq!(plugin.resolver().font_dir(), font_dir(dir.path()));
    assert_eq!(replacement_name(&plugin).as_deref(), Some("NotoSansSC"));
    assert_eq!(plugin.engine().state(), EngineState::Active);
    assert!(plugin.has_locale_listener());
    assert!(plugin.detector().is_some_and(|d| d.is_event_driven()));

    assert_eq!(font_name(rich.font()).as_deref(), Some("NotoSansSC"));
    assert_eq!(rich.font().map(|f| f.kind()), Some(AssetKind::Typeface));
    assert_eq!(plain.font().map(|f| f.kind()), Some(AssetKind::Native));
    assert_eq!(font_name(host.default_font()).as_deref(), Some("NotoSansSC"));
}

#[test]
fn test_start_keeps_configured_bundle() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let config = Config::default().with_font_bundle("source.bundle");

    let plugin = FontSwap::start(host_dyn(&host), config, dir.path(), Instant::now());
    assert_eq!(plugin.config().font_bundle, "Source.bundle");
    assert_eq!(replacement_name(&plugin).as_deref(), Some("SourceHanSans"));
}

#[test]
fn test_start_extends_replacement_fallbacks() {
    let dir = plugin_dir();
    let shared = typeface("SharedSymbols");
    let host = SimHost::builder()
        .language("ch")
        .shared_fonts(vec![AssetRef::clone(&shared)])
        .build();
    let locale = host.locale().expect("locale");

    let plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());
    let replacement = plugin.engine().replacement().expect("replacement");
    let fallbacks = replacement.typeface.fallbacks();

    assert!(fallbacks.contains(&shared));
    assert!(fallbacks.contains(&locale.font_for("ru").expect("ru font")));
    assert!(!fallbacks.contains(&replacement.typeface));
}

#[test]
fn test_start_adds_shared_font_dir_to_fallbacks() {
    let dir = plugin_dir();
    let shared_dir = font_dir(dir.path()).join(SHARED_FONT_DIR);
    std::fs::create_dir_all(&shared_dir).expect("create shared dir");
    std::fs::write(shared_dir.join("Symbols.ttf"), named_face("DiskSymbols")).expect("write");
    let host_shared = typeface("HostSymbols");
    let host = SimHost::builder()
        .language("ch")
        .shared_fonts(vec![AssetRef::clone(&host_shared)])
        .build();

    let plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());

    // The subdirectory is not offered as a bundle
    assert_eq!(plugin.config().font_bundle, "NotoSansSC.bundle");
    let replacement = plugin.engine().replacement().expect("replacement");
    let names: Vec<String> = replacement
        .typeface
        .fallbacks()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    let host_pos = names.iter().position(|n| n == "HostSymbols").expect("host font");
    let disk_pos = names.iter().position(|n| n == "DiskSymbols").expect("disk font");
    assert!(host_pos < disk_pos);
}

#[test]
fn test_start_on_non_target_locale_waits() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("en").build();
    let original = typeface("Bender");
    let text = host.spawn_text(TextKind::Structured, "任务", Some(AssetRef::clone(&original)));

    let plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());
    assert_eq!(plugin.engine().state(), EngineState::WatchingNonTarget);
    assert_eq!(text.font(), Some(AssetRef::clone(&original)));

    // The host switches language from its settings screen
    host.locale().expect("locale").set_language("ch");
    assert_eq!(plugin.engine().state(), EngineState::Active);
    assert_eq!(font_name(text.font()).as_deref(), Some("NotoSansSC"));
}

#[test]
fn test_start_with_empty_font_dir_degrades() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let host = SimHost::builder().language("ch").build();
    let original = typeface("Bender");
    let text = host.spawn_text(TextKind::Structured, "任务", Some(AssetRef::clone(&original)));

    let plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());
    assert!(plugin.engine().replacement().is_none());
    assert_eq!(plugin.config().font_bundle, "");
    assert_eq!(text.font(), Some(original));
}

#[test]
fn test_drifted_release_without_locale_listener_applies_on_scene_load() {
    let dir = plugin_dir();
    let host = SimHost::builder()
        .locale_names(LocaleNames::drifted())
        .language("ch")
        .build();

    let plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());
    assert!(!plugin.has_locale_listener());

    let late = host.spawn_text(TextKind::Structured, "任务", Some(typeface("Bender")));
    plugin.on_scene_loaded();
    assert_eq!(font_name(late.font()).as_deref(), Some("NotoSansSC"));
}

// ============================================================================
// Bundle switching
// ============================================================================

#[test]
fn test_select_bundle_switches_population() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let text = host.spawn_text(TextKind::Structured, "任务", Some(typeface("Bender")));
    let mut plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());

    plugin.select_bundle("Source.bundle").expect("Failed to switch bundle");
    assert_eq!(replacement_name(&plugin).as_deref(), Some("SourceHanSans"));
    assert_eq!(font_name(text.font()).as_deref(), Some("SourceHanSans"));
    assert_eq!(font_name(host.default_font()).as_deref(), Some("SourceHanSans"));
}

#[test]
fn test_failed_switch_keeps_current_replacement() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let text = host.spawn_text(TextKind::Structured, "任务", Some(typeface("Bender")));
    let mut plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());

    std::fs::write(font_dir(dir.path()).join("broken.bundle"), b"not a zip").expect("write");
    assert!(plugin.select_bundle("broken.bundle").is_err());
    assert!(plugin.select_bundle("missing.bundle").is_err());

    assert_eq!(replacement_name(&plugin).as_deref(), Some("NotoSansSC"));
    assert_eq!(font_name(text.font()).as_deref(), Some("NotoSansSC"));
}

#[test]
fn test_switch_then_disable_restores_first_originals() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let original = typeface("Bender");
    let text = host.spawn_text(TextKind::Structured, "任务", Some(AssetRef::clone(&original)));
    let mut plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());

    plugin.select_bundle("Source.bundle").expect("Failed to switch bundle");
    plugin.update_config(plugin.config().clone().with_enabled(false), Instant::now());
    assert_eq!(text.font(), Some(original));
}

// ============================================================================
// Config changes
// ============================================================================

#[test]
fn test_disable_and_reenable_through_config() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let original = typeface("Bender");
    let text = host.spawn_text(TextKind::Structured, "任务", Some(AssetRef::clone(&original)));
    let now = Instant::now();
    let mut plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), now);

    plugin.update_config(plugin.config().clone().with_enabled(false), now);
    assert_eq!(plugin.engine().state(), EngineState::Disabled);
    assert!(plugin.detector().is_none());
    assert_eq!(host.text_event_handlers(), 0);
    assert_eq!(text.font(), Some(AssetRef::clone(&original)));

    plugin.update_config(plugin.config().clone().with_enabled(true), now);
    assert_eq!(plugin.engine().state(), EngineState::Active);
    assert!(plugin.detector().is_some());
    assert_eq!(host.text_event_handlers(), 1);
    assert_eq!(font_name(text.font()).as_deref(), Some("NotoSansSC"));
}

#[test]
fn test_keep_original_change_reclassifies() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let original = typeface("Bender");
    let label = host.spawn_text(TextKind::Structured, "HP 100", Some(AssetRef::clone(&original)));
    let now = Instant::now();
    let mut plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), now);
    assert_eq!(font_name(label.font()).as_deref(), Some("NotoSansSC"));

    plugin.update_config(plugin.config().clone().with_keep_original(true, false), now);
    assert_eq!(label.font(), Some(original));

    // Content changes are now tracked
    label.set_text("生命 100");
    assert_eq!(font_name(label.font()).as_deref(), Some("NotoSansSC"));
}

#[test]
fn test_bundle_change_in_config_switches() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let text = host.spawn_text(TextKind::Structured, "任务", None);
    let now = Instant::now();
    let mut plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), now);

    plugin.update_config(plugin.config().clone().with_font_bundle("Source.bundle"), now);
    assert_eq!(font_name(text.font()).as_deref(), Some("SourceHanSans"));
}

#[test]
fn test_target_locale_change() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ru").build();
    let text = host.spawn_text(TextKind::Structured, "Задание", Some(typeface("BenderCyr")));
    let now = Instant::now();
    let mut plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), now);
    assert_eq!(plugin.engine().state(), EngineState::WatchingNonTarget);

    let mut config = plugin.config().clone();
    config.target_locale = "ru".to_string();
    plugin.update_config(config, now);
    assert_eq!(plugin.engine().state(), EngineState::Active);
    assert_eq!(font_name(text.font()).as_deref(), Some("NotoSansSC"));
}

#[test]
fn test_changes_ignored_after_shutdown() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let text = host.spawn_text(TextKind::Structured, "任务", Some(typeface("Bender")));
    let now = Instant::now();
    let mut plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), now);

    plugin.shutdown();
    plugin.on_config_changed(&[ConfigChange::Enabled(false)], now);
    assert_eq!(plugin.engine().state(), EngineState::Active);
    // Shutdown leaves the override in place
    assert_eq!(font_name(text.font()).as_deref(), Some("NotoSansSC"));
}

// ============================================================================
// Config file
// ============================================================================

#[test]
fn test_start_with_config_file_writes_reconciled_selection() {
    let dir = plugin_dir();
    let config_path = dir.path().join("config").join("fontswap.yaml");
    let host = SimHost::builder().language("ch").build();

    let plugin = FontSwap::start_with_config_file(host_dyn(&host), &config_path, dir.path(), Instant::now())
        .expect("Failed to start");
    assert_eq!(plugin.config_path(), Some(config_path.as_path()));
    assert_eq!(plugin.config().font_bundle, "NotoSansSC.bundle");

    let saved = Config::load_from(&config_path).expect("Failed to reload config");
    assert_eq!(saved.font_bundle, "NotoSansSC.bundle");
    assert_eq!(&saved, plugin.config());
}

#[test]
fn test_start_with_config_file_reads_existing_values() {
    let dir = plugin_dir();
    let config_path = dir.path().join("fontswap.yaml");
    Config::default()
        .with_font_bundle("Source.bundle")
        .with_enabled(false)
        .save_to(&config_path)
        .expect("Failed to save config");
    let host = SimHost::builder().language("ch").build();

    let plugin = FontSwap::start_with_config_file(host_dyn(&host), &config_path, dir.path(), Instant::now())
        .expect("Failed to start");
    assert_eq!(plugin.engine().state(), EngineState::Disabled);
    assert_eq!(replacement_name(&plugin).as_deref(), Some("SourceHanSans"));
}

#[test]
fn test_start_with_invalid_config_file_fails() {
    let dir = plugin_dir();
    let config_path = dir.path().join("fontswap.yaml");
    std::fs::write(&config_path, "target_locale: ''\n").expect("write");
    let host = SimHost::builder().language("ch").build();

    let err = FontSwap::start_with_config_file(host_dyn(&host), &config_path, dir.path(), Instant::now())
        .unwrap_err();
    assert!(format!("{err:#}").contains("fontswap.yaml"));
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn test_shutdown_detaches_everything_once() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").build();
    let locale = host.locale().expect("locale");
    let mut plugin = FontSwap::start(host_dyn(&host), Config::default(), dir.path(), Instant::now());
    assert_eq!(locale.listener_count(), 1);
    assert_eq!(host.text_event_handlers(), 1);

    plugin.shutdown();
    plugin.shutdown();
    assert!(plugin.is_shut_down());
    assert_eq!(locale.listener_count(), 0);
    assert_eq!(host.text_event_handlers(), 0);

    let late = host.spawn_text(TextKind::Structured, "任务", Some(typeface("Bender")));
    plugin.on_scene_loaded();
    assert_eq!(late.font_sets(), 0);
}

#[test]
fn test_poll_mode_runs_from_update() {
    let dir = plugin_dir();
    let host = SimHost::builder().language("ch").without_text_event().build();
    let original = typeface("Bender");
    let label = host.spawn_text(TextKind::Structured, "HP", Some(AssetRef::clone(&original)));
    let start = Instant::now();
    let config = Config::default().with_keep_original(true, false);
    let mut plugin = FontSwap::start(host_dyn(&host), config, dir.path(), start);
    assert!(plugin.detector().is_some_and(|d| d.is_polling()));
    assert_eq!(label.font(), Some(original));

    plugin.update(start);
    label.set_text("生命");
    plugin.update(start + fontswap::POLL_INTERVAL);
    assert_eq!(font_name(label.font()).as_deref(), Some("NotoSansSC"));

    plugin.shutdown();
    assert!(plugin.scheduler().is_empty());
}
