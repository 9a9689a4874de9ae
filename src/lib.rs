// Library exports for the fontswap override core
//
// # Threading Policy
//
// Everything in this crate runs on the host's single update thread. Shared
// state follows these rules:
//
//   - `Rc` / `RefCell` / `Cell`  — engine, detector and scheduler state. Never
//                                  hold a `RefCell` borrow across a call into
//                                  the host: setting a font can raise events
//                                  that re-enter the engine.
//
//   - `ReentrancyFlag`           — passes that can trigger themselves (full
//                                  apply, single-object re-evaluation). A
//                                  nested call while the flag is held is a
//                                  no-op, never queued.
//
//   - `parking_lot` / `mpsc`     — only at the config watcher boundary, where
//                                  notify delivers events on its own thread.

/// Library version, for hosts that log it on load.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod classifier;
pub mod detector;
pub mod engine;
pub mod error;
pub mod guard;
pub mod host;
pub mod locale;
pub mod original_cache;
pub mod plugin;
pub mod scheduler;
pub mod schema;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use classifier::{KeepPolicy, should_keep_original};
pub use detector::{ChangeDetector, DetectionMode, POLL_INTERVAL, PollStats};
pub use engine::{ApplyOutcome, EngineState, OverrideEngine, SkipReason};
pub use error::FontSwapError;
pub use host::{Host, ObjectId, TextKind, TextObject};
pub use original_cache::{MAX_TRACKED_OBJECTS, OriginalStateCache};
pub use plugin::{FontSwap, SHARED_FONT_DIR};
pub use scheduler::{Scheduler, TaskHandle};
pub use schema::{Resolution, SchemaAdapter};

pub use fontswap_config as config;
pub use fontswap_fonts as fonts;
