//! Content change detection for the keep-original policy.
//!
//! When the host exposes a content-changed event on its text type, the
//! detector subscribes and re-evaluates exactly the object that changed.
//! Otherwise it scans the population once per [`POLL_INTERVAL`] and only
//! re-evaluates objects whose text differs from the last scan. The mode is
//! chosen once, when the detector starts.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use crate::engine::OverrideEngine;
use crate::guard::ReentrancyFlag;
use crate::host::{TextKind, TextObject};
use crate::original_cache::LastSeenContent;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::schema::{DynObject, Handler, MemberBinding, SubscriptionId, Value};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Live subscription to the host's content-changed event.
pub struct EventSubscription {
    class: Rc<dyn DynObject>,
    binding: MemberBinding,
    id: SubscriptionId,
}

impl EventSubscription {
    fn remove(self) {
        if let Err(e) = self.binding.unsubscribe(&*self.class, self.id) {
            log::debug!("Removing {} handler failed: {}", self.binding.member_name, e);
        }
    }
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("event", &self.binding.member_name)
            .field("id", &self.id)
            .finish()
    }
}

#[derive(Debug)]
pub enum DetectionMode {
    EventDriven(EventSubscription),
    Polled(TaskHandle),
}

/// Counters from one poll pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub scanned: usize,
    /// Objects whose content changed and were re-evaluated
    pub reevaluated: usize,
    /// Objects whose font was reassigned
    pub updated: usize,
}

struct DetectorCore {
    engine: Rc<OverrideEngine>,
    handling: ReentrancyFlag,
    last_seen_structured: RefCell<LastSeenContent>,
    last_seen_plain: RefCell<LastSeenContent>,
}

impl DetectorCore {
    fn last_seen(&self, kind: TextKind) -> &RefCell<LastSeenContent> {
        match kind {
            TextKind::Structured => &self.last_seen_structured,
            TextKind::Plain => &self.last_seen_plain,
        }
    }

    fn handle_text_changed(&self, object: &dyn TextObject) -> bool {
        // Our own font writes echo back through the event
        let Some(_guard) = self.handling.try_acquire() else {
            return false;
        };
        if self.engine.is_applying() {
            return false;
        }
        self.engine.reevaluate(object)
    }

    fn poll_once(&self) -> PollStats {
        let mut stats = PollStats::default();
        if !self.engine.tracking_enabled() {
            return stats;
        }
        let Some(_guard) = self.handling.try_acquire() else {
            return stats;
        };

        for kind in TextKind::ALL {
            for object in self.engine.host().find_text_objects(kind) {
                stats.scanned += 1;
                let text = object.text();
                let changed = {
                    let mut seen = self.last_seen(kind).borrow_mut();
                    if seen.get(object.id()) == Some(&text) {
                        false
                    } else {
                        seen.insert(object.id(), text);
                        true
                    }
                };
                if changed {
                    stats.reevaluated += 1;
                    if self.engine.reevaluate(&*object) {
                        stats.updated += 1;
                    }
                }
            }
        }

        if stats.updated > 0 {
            log::debug!(
                "Text poll: {} scanned, {} changed, {} fonts updated",
                stats.scanned,
                stats.reevaluated,
                stats.updated
            );
        }
        stats
    }
}

/// Watches text content and re-runs the keep-original decision.
pub struct ChangeDetector {
    core: Rc<DetectorCore>,
    mode: RefCell<Option<DetectionMode>>,
}

impl std::fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("mode", &self.mode.borrow())
            .finish_non_exhaustive()
    }
}

impl ChangeDetector {
    /// Subscribe to the host's content-changed event, or schedule polling
    /// on `scheduler` if the event cannot be resolved.
    pub fn start(engine: Rc<OverrideEngine>, scheduler: &Scheduler, now: Instant) -> Self {
        let core = Rc::new(DetectorCore {
            engine,
            handling: ReentrancyFlag::new(),
            last_seen_structured: RefCell::new(LastSeenContent::default()),
            last_seen_plain: RefCell::new(LastSeenContent::default()),
        });

        let mode = match Self::subscribe(&core) {
            Some(subscription) => {
                log::info!(
                    "Subscribed to {} for keep-original tracking",
                    subscription.binding.member_name
                );
                DetectionMode::EventDriven(subscription)
            }
            None => {
                let weak: Weak<DetectorCore> = Rc::downgrade(&core);
                let handle = scheduler.every("text-poll", POLL_INTERVAL, now, move |_| {
                    if let Some(core) = weak.upgrade() {
                        core.poll_once();
                    }
                });
                log::info!(
                    "Text change event unavailable; polling every {:?}",
                    POLL_INTERVAL
                );
                DetectionMode::Polled(handle)
            }
        };

        Self {
            core,
            mode: RefCell::new(Some(mode)),
        }
    }

    fn subscribe(core: &Rc<DetectorCore>) -> Option<EventSubscription> {
        let (class, binding) = core.engine.locale().text_changed_event()?;
        let weak = Rc::downgrade(core);
        let handler: Handler = Rc::new(move |args: &[Value]| {
            let Some(core) = weak.upgrade() else {
                return;
            };
            if let Some(text) = args.first().and_then(Value::as_text) {
                core.handle_text_changed(&**text);
            }
        });
        match binding.subscribe(&*class, handler) {
            Ok(id) => Some(EventSubscription { class, binding, id }),
            Err(e) => {
                log::warn!("Subscribing to {} failed: {}", binding.member_name, e);
                None
            }
        }
    }

    pub fn is_event_driven(&self) -> bool {
        matches!(*self.mode.borrow(), Some(DetectionMode::EventDriven(_)))
    }

    pub fn is_polling(&self) -> bool {
        matches!(*self.mode.borrow(), Some(DetectionMode::Polled(_)))
    }

    pub fn is_running(&self) -> bool {
        self.mode.borrow().is_some()
    }

    /// Re-evaluate one object reported as changed. Returns whether its font
    /// changed; nested calls from inside a handler are ignored.
    pub fn handle_text_changed(&self, object: &dyn TextObject) -> bool {
        self.core.handle_text_changed(object)
    }

    /// Run one poll pass immediately.
    pub fn poll_once(&self) -> PollStats {
        self.core.poll_once()
    }

    /// Remove the subscription or cancel the poll task. Safe to call twice.
    pub fn stop(&self) {
        let Some(mode) = self.mode.borrow_mut().take() else {
            return;
        };
        match mode {
            DetectionMode::EventDriven(subscription) => subscription.remove(),
            DetectionMode::Polled(handle) => handle.cancel(),
        }
        log::debug!("Text change detection stopped");
    }
}

impl Drop for ChangeDetector {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeepPolicy;
    use crate::host::Host;
    use crate::schema::SchemaAdapter;
    use crate::sim::SimHost;
    use fontswap_fonts::{AssetKind, AssetRef, FontAsset, ReplacementAsset};

    fn active_engine(host: &Rc<SimHost>, policy: KeepPolicy) -> (Rc<OverrideEngine>, ReplacementAsset) {
        let host_dyn: Rc<dyn Host> = Rc::clone(host) as Rc<dyn Host>;
        let engine = Rc::new(OverrideEngine::new(
            host_dyn,
            Rc::new(SchemaAdapter::new()),
            "ch",
            policy,
        ));
        let swap = ReplacementAsset::new(
            FontAsset::new("Noto", AssetKind::Typeface),
            Some(FontAsset::new("Noto", AssetKind::Native)),
        );
        engine.set_replacement(swap.clone());
        engine.enable("initial");
        (engine, swap)
    }

    #[test]
    fn test_event_mode_selected_when_event_exists() {
        let host = SimHost::builder().language("ch").build();
        let (engine, _) = active_engine(&host, KeepPolicy::new(true, false));
        let scheduler = Scheduler::new();
        let detector = ChangeDetector::start(engine, &scheduler, Instant::now());

        assert!(detector.is_event_driven());
        assert!(scheduler.is_empty());
        assert_eq!(host.text_event_handlers(), 1);

        detector.stop();
        detector.stop();
        assert!(!detector.is_running());
        assert_eq!(host.text_event_handlers(), 0);
    }

    #[test]
    fn test_poll_mode_selected_without_event() {
        let host = SimHost::builder().language("ch").without_text_event().build();
        let (engine, _) = active_engine(&host, KeepPolicy::new(true, false));
        let scheduler = Scheduler::new();
        let detector = ChangeDetector::start(engine, &scheduler, Instant::now());

        assert!(detector.is_polling());
        assert_eq!(scheduler.len(), 1);
        drop(detector);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_event_reevaluates_changed_object() {
        let host = SimHost::builder().language("ch").build();
        let original = FontAsset::new("Bender", AssetKind::Typeface);
        let label = host.spawn_text(TextKind::Structured, "任务", Some(AssetRef::clone(&original)));
        let (engine, swap) = active_engine(&host, KeepPolicy::new(true, false));
        let scheduler = Scheduler::new();
        let _detector = ChangeDetector::start(engine, &scheduler, Instant::now());
        assert_eq!(label.font(), Some(AssetRef::clone(&swap.typeface)));

        label.set_text("Quest");
        assert_eq!(label.font(), Some(AssetRef::clone(&original)));

        label.set_text("任务 2");
        assert_eq!(label.font(), Some(swap.typeface));
    }

    #[test]
    fn test_no_tracking_without_keep_policy() {
        let host = SimHost::builder().language("ch").without_text_event().build();
        let label = host.spawn_text(
            TextKind::Structured,
            "任务",
            Some(FontAsset::new("Bender", AssetKind::Typeface)),
        );
        let (engine, _) = active_engine(&host, KeepPolicy::default());
        let scheduler = Scheduler::new();
        let detector = ChangeDetector::start(engine, &scheduler, Instant::now());

        label.set_text("Quest");
        assert_eq!(detector.poll_once(), PollStats::default());
    }

    #[test]
    fn test_poll_only_touches_changed_content() {
        let host = SimHost::builder().language("ch").without_text_event().build();
        let label = host.spawn_text(
            TextKind::Plain,
            "Quest",
            Some(FontAsset::new("Arial", AssetKind::Native)),
        );
        let (engine, _) = active_engine(&host, KeepPolicy::new(true, false));
        let scheduler = Scheduler::new();
        let detector = ChangeDetector::start(engine, &scheduler, Instant::now());

        let first = detector.poll_once();
        assert_eq!(first.scanned, 1);
        assert_eq!(first.reevaluated, 1);
        assert_eq!(detector.poll_once().reevaluated, 0);

        label.set_text("任务");
        let stats = detector.poll_once();
        assert_eq!(stats.reevaluated, 1);
        assert_eq!(stats.updated, 1);
    }
}
