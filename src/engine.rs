//! Override state machine and the population passes.
//!
//! The engine decides whether the override is active from the host's locale,
//! and walks the live text objects to apply or revert the replacement font.
//! Per object, the keep-original policy picks either the replacement or the
//! font the object had before the override.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use fontswap_fonts::{AssetRef, LOCALE_FALLBACK_ORDER, ReplacementAsset, build_fallback_chain};

use crate::classifier::KeepPolicy;
use crate::guard::ReentrancyFlag;
use crate::host::{Host, TextKind, TextObject};
use crate::locale::LocaleBridge;
use crate::original_cache::OriginalStateCache;
use crate::schema::SchemaAdapter;

/// Apply reason that also fires the locale subsystem's own update event.
pub const INITIAL_REASON: &str = "initial";

/// Number of distinct font names logged after an apply pass.
const SAMPLE_FONT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Feature switched off; originals restored
    Disabled,
    /// Enabled, but the host is not showing the target locale
    WatchingNonTarget,
    /// Enabled and showing the target locale
    Active,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Disabled => f.write_str("disabled"),
            EngineState::WatchingNonTarget => f.write_str("watching"),
            EngineState::Active => f.write_str("active"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another pass is already running
    Reentrant,
    NotActive,
    NoReplacement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Skipped(SkipReason),
    /// Pass completed; `updated` objects had their font changed
    Applied { updated: usize },
}

impl ApplyOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }
}

/// Entry the locale font map held for a key before our first write to it.
#[derive(Debug)]
struct LocaleFontBackup {
    key: String,
    previous: Option<AssetRef>,
}

pub struct OverrideEngine {
    host: Rc<dyn Host>,
    locale: LocaleBridge,
    target_locale: RefCell<String>,
    state: Cell<EngineState>,
    replacement: RefCell<Option<ReplacementAsset>>,
    originals: RefCell<OriginalStateCache>,
    extra_shared_fonts: RefCell<Vec<AssetRef>>,
    locale_font_backups: RefCell<Vec<LocaleFontBackup>>,
    policy: Cell<KeepPolicy>,
    applying: ReentrancyFlag,
}

impl fmt::Debug for OverrideEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideEngine")
            .field("state", &self.state.get())
            .field("target_locale", &self.target_locale.borrow())
            .field("policy", &self.policy.get())
            .field("has_replacement", &self.replacement.borrow().is_some())
            .field("tracked_originals", &self.originals.borrow().len())
            .finish_non_exhaustive()
    }
}

impl OverrideEngine {
    /// A disabled engine; call [`OverrideEngine::enable`] to start.
    pub fn new(
        host: Rc<dyn Host>,
        adapter: Rc<SchemaAdapter>,
        target_locale: impl Into<String>,
        policy: KeepPolicy,
    ) -> Self {
        let locale = LocaleBridge::new(adapter, Rc::clone(&host));
        Self {
            host,
            locale,
            target_locale: RefCell::new(target_locale.into()),
            state: Cell::new(EngineState::Disabled),
            replacement: RefCell::new(None),
            originals: RefCell::new(OriginalStateCache::new()),
            extra_shared_fonts: RefCell::new(Vec::new()),
            locale_font_backups: RefCell::new(Vec::new()),
            policy: Cell::new(policy),
            applying: ReentrancyFlag::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state.get()
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn locale(&self) -> &LocaleBridge {
        &self.locale
    }

    pub fn policy(&self) -> KeepPolicy {
        self.policy.get()
    }

    pub fn replacement(&self) -> Option<ReplacementAsset> {
        self.replacement.borrow().clone()
    }

    pub fn is_applying(&self) -> bool {
        self.applying.is_held()
    }

    /// Read-only view of the original-font cache.
    pub fn with_originals<R>(&self, f: impl FnOnce(&OriginalStateCache) -> R) -> R {
        f(&self.originals.borrow())
    }

    fn transition(&self, next: EngineState) {
        let prev = self.state.replace(next);
        if prev != next {
            log::info!("Font override state: {} -> {}", prev, next);
        }
    }

    /// Remember the host's default typeface before anything overwrites it.
    pub fn capture_original_defaults(&self) {
        match self.locale.default_font() {
            Ok(font) => {
                if self.originals.borrow_mut().set_default_once(font) {
                    log::debug!("Captured original default typeface");
                }
            }
            Err(e) => log::debug!("Default typeface not captured: {}", e),
        }
    }

    /// Install a newly loaded replacement. Cached originals stay valid.
    pub fn set_replacement(&self, replacement: ReplacementAsset) {
        {
            let mut originals = self.originals.borrow_mut();
            originals.note_override(&replacement.typeface);
            if let Some(companion) = &replacement.companion {
                originals.note_override(companion);
            }
        }
        log::info!(
            "Replacement font: {} (native companion: {})",
            replacement.typeface.name(),
            if replacement.companion.is_some() { "yes" } else { "no" }
        );
        *self.replacement.borrow_mut() = Some(replacement);
    }

    /// Shared fonts loaded outside the host, appended after the host's own.
    pub fn add_shared_fonts(&self, fonts: impl IntoIterator<Item = AssetRef>) {
        self.extra_shared_fonts.borrow_mut().extend(fonts);
    }

    /// Extend the replacement's fallback table with the locale fonts and the
    /// shared fonts. Returns the number of entries added.
    pub fn configure_fallbacks(&self) -> usize {
        let Some(replacement) = self.replacement() else {
            return 0;
        };
        let locale_fonts = LOCALE_FALLBACK_ORDER
            .iter()
            .map(|key| self.locale.locale_font(key));
        let mut shared = self.host.shared_fonts();
        shared.extend(self.extra_shared_fonts.borrow().iter().cloned());
        build_fallback_chain(&replacement.typeface, locale_fonts, &shared)
    }

    /// Recompute the state from the host locale. A host without a locale
    /// subsystem is treated as showing the target locale.
    pub fn evaluate_locale(&self) -> EngineState {
        if self.state.get() == EngineState::Disabled {
            return EngineState::Disabled;
        }
        let next = if self.locale.instance().is_none() {
            log::debug!("Locale subsystem not available; override stays active");
            EngineState::Active
        } else {
            let current = self.locale.current_language();
            let target = self.target_locale.borrow();
            if current.eq_ignore_ascii_case(&target) {
                EngineState::Active
            } else {
                log::debug!("Current language {} is not {}", current, target);
                EngineState::WatchingNonTarget
            }
        };
        self.transition(next);
        next
    }

    /// Switch the feature on and apply if the target locale is showing.
    pub fn enable(&self, reason: &str) -> ApplyOutcome {
        if self.state.get() == EngineState::Disabled {
            self.transition(EngineState::WatchingNonTarget);
        }
        self.evaluate_locale();
        self.apply(reason)
    }

    /// Switch the feature off and restore every original.
    pub fn disable(&self) -> usize {
        self.transition(EngineState::Disabled);
        self.restore()
    }

    /// Locale-change notification from the host.
    ///
    /// Leaving the target locale does not revert fonts already swapped.
    pub fn on_locale_changed(&self) -> ApplyOutcome {
        if self.state.get() == EngineState::Disabled {
            return ApplyOutcome::Skipped(SkipReason::NotActive);
        }
        self.configure_fallbacks();
        self.evaluate_locale();
        self.apply("update")
    }

    pub fn on_scene_loaded(&self) -> ApplyOutcome {
        if self.state.get() == EngineState::Disabled {
            return ApplyOutcome::Skipped(SkipReason::NotActive);
        }
        self.evaluate_locale();
        self.apply("sceneLoaded")
    }

    /// Apply the override across the whole population.
    pub fn apply(&self, reason: &str) -> ApplyOutcome {
        let Some(_guard) = self.applying.try_acquire() else {
            log::debug!("Skipping apply ({}): a pass is already running", reason);
            return ApplyOutcome::Skipped(SkipReason::Reentrant);
        };
        if self.state.get() != EngineState::Active {
            log::debug!("Skipping apply ({}): state is {}", reason, self.state.get());
            return ApplyOutcome::Skipped(SkipReason::NotActive);
        }
        let Some(replacement) = self.replacement() else {
            log::warn!("Replacement font not loaded; skipping apply ({})", reason);
            return ApplyOutcome::Skipped(SkipReason::NoReplacement);
        };

        if self.locale.instance().is_some() {
            self.write_locale(&replacement, reason);
        }

        self.write_default_font(&replacement);
        let updated = self.refresh_population(&replacement);

        if reason.eq_ignore_ascii_case(INITIAL_REASON)
            && let Err(e) = self.locale.invoke_locale_updated()
        {
            log::debug!("Locale updated event not fired: {}", e);
        }

        log::info!("Font override applied: {} text objects updated ({})", updated, reason);
        self.log_sample_fonts(reason);
        ApplyOutcome::Applied { updated }
    }

    fn write_locale(&self, replacement: &ReplacementAsset, reason: &str) {
        let current = self.locale.current_language();
        match self.locale.applied_language() {
            Ok(applied) => log::info!(
                "Current language={}, applied language={} ({})",
                current,
                applied,
                reason
            ),
            Err(_) => log::info!("Current language={} ({})", current, reason),
        }

        let target = self.target_locale.borrow().clone();
        match self
            .locale
            .set_locale_font(&target, AssetRef::clone(&replacement.typeface))
        {
            Ok(previous) => {
                let mut backups = self.locale_font_backups.borrow_mut();
                if !backups.iter().any(|b| b.key == target) {
                    backups.push(LocaleFontBackup {
                        key: target,
                        previous,
                    });
                }
            }
            Err(e) => log::warn!("Locale font map not updated: {}", e),
        }

        if let Err(e) = self.locale.set_applied_language(&current) {
            log::debug!("Applied language not synced: {}", e);
        }
        if let Err(e) = self.locale.apply_locale_internal(&current) {
            log::debug!("Locale refresh not invoked: {}", e);
        }
    }

    fn write_default_font(&self, replacement: &ReplacementAsset) {
        self.capture_original_defaults();
        if let Err(e) = self
            .locale
            .set_default_font(AssetRef::clone(&replacement.typeface))
        {
            log::warn!("Default typeface not replaced: {}", e);
        }
    }

    fn refresh_population(&self, replacement: &ReplacementAsset) -> usize {
        let policy = self.policy.get();
        let mut updated = 0;
        for kind in TextKind::ALL {
            let Some(target) = replacement.asset_for(kind.asset_kind()) else {
                log::warn!("No native font companion; {:?} text left unchanged", kind);
                continue;
            };
            for object in self.host.find_text_objects(kind) {
                if self.reevaluate_with(&*object, target, policy) {
                    updated += 1;
                }
            }
        }
        updated
    }

    /// Pick and assign the font for one object. Returns whether it changed.
    fn reevaluate_with(
        &self,
        object: &dyn TextObject,
        replacement: &AssetRef,
        policy: KeepPolicy,
    ) -> bool {
        let current = object.font();
        self.originals
            .borrow_mut()
            .record_if_needed(object.id(), current.as_ref());

        let target = if policy.keeps_original(&object.text()) {
            self.originals
                .borrow()
                .original_for(object.id(), object.kind())
                .or_else(|| current.clone())
        } else {
            Some(AssetRef::clone(replacement))
        };

        match target {
            Some(target) if current.as_ref() != Some(&target) => {
                object.set_font(target);
                true
            }
            _ => false,
        }
    }

    /// Whether per-object change tracking has anything to do.
    pub fn tracking_enabled(&self) -> bool {
        self.state.get() == EngineState::Active
            && self.replacement.borrow().is_some()
            && self.policy.get().is_active()
    }

    /// Re-run the keep-original decision for a single object whose content
    /// changed. Returns whether its font changed.
    pub fn reevaluate(&self, object: &dyn TextObject) -> bool {
        if !self.tracking_enabled() {
            return false;
        }
        let target = {
            let replacement = self.replacement.borrow();
            replacement
                .as_ref()
                .and_then(|r| r.asset_for(object.kind().asset_kind()).cloned())
        };
        match target {
            Some(target) => self.reevaluate_with(object, &target, self.policy.get()),
            None => false,
        }
    }

    /// Change the keep-original policy and reclassify the population.
    pub fn set_policy(&self, policy: KeepPolicy) -> ApplyOutcome {
        if self.policy.replace(policy) == policy {
            return ApplyOutcome::Skipped(SkipReason::NotActive);
        }
        log::info!(
            "Keep original fonts: latin={}, digits={}",
            policy.latin,
            policy.digits
        );
        self.reclassify("configChanged")
    }

    /// Population pass without any locale writes.
    pub fn reclassify(&self, reason: &str) -> ApplyOutcome {
        let Some(_guard) = self.applying.try_acquire() else {
            return ApplyOutcome::Skipped(SkipReason::Reentrant);
        };
        if self.state.get() != EngineState::Active {
            return ApplyOutcome::Skipped(SkipReason::NotActive);
        }
        let Some(replacement) = self.replacement() else {
            return ApplyOutcome::Skipped(SkipReason::NoReplacement);
        };
        self.write_default_font(&replacement);
        let updated = self.refresh_population(&replacement);
        log::info!("Font classification refreshed: {} text objects updated ({})", updated, reason);
        ApplyOutcome::Applied { updated }
    }

    /// Change the target locale and re-evaluate.
    pub fn set_target_locale(&self, target: &str) -> ApplyOutcome {
        *self.target_locale.borrow_mut() = target.to_string();
        log::info!("Target locale: {}", target);
        if self.state.get() == EngineState::Disabled {
            return ApplyOutcome::Skipped(SkipReason::NotActive);
        }
        self.evaluate_locale();
        self.apply("targetChanged")
    }

    pub fn target_locale(&self) -> String {
        self.target_locale.borrow().clone()
    }

    /// Put every object, the default typeface and each locale map entry back
    /// to their pre-override values. Returns the number of objects changed.
    pub fn restore(&self) -> usize {
        if self.state.get() == EngineState::Active {
            self.transition(EngineState::WatchingNonTarget);
        }
        let Some(_guard) = self.applying.try_acquire() else {
            log::debug!("Skipping restore: a pass is already running");
            return 0;
        };

        let default = self.originals.borrow().default_font().cloned();
        if let Some(default) = default
            && let Err(e) = self.locale.set_default_font(default)
        {
            log::warn!("Default typeface not restored: {}", e);
        }

        let mut restored = 0;
        for kind in TextKind::ALL {
            for object in self.host.find_text_objects(kind) {
                let original = self.originals.borrow().original_for(object.id(), kind);
                let Some(original) = original else {
                    continue;
                };
                if object.font().as_ref() != Some(&original) {
                    object.set_font(original);
                    restored += 1;
                }
            }
        }

        let backups = std::mem::take(&mut *self.locale_font_backups.borrow_mut());
        for backup in backups.into_iter().rev() {
            if let Err(e) = self.locale.restore_locale_font(&backup.key, backup.previous) {
                log::warn!("Locale font map entry {} not restored: {}", backup.key, e);
            }
        }

        log::info!("Original fonts restored: {} text objects updated", restored);
        restored
    }

    fn log_sample_fonts(&self, reason: &str) {
        let objects = self.host.find_text_objects(TextKind::Structured);
        if objects.is_empty() {
            log::info!("No structured text objects found ({})", reason);
            return;
        }
        let mut seen = HashSet::new();
        for font in objects.iter().filter_map(|o| o.font()) {
            if seen.insert(font.id()) {
                log::info!("Sample text font: {} ({})", font.name(), reason);
                if seen.len() >= SAMPLE_FONT_LIMIT {
                    break;
                }
            }
        }
    }
}
