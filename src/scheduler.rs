//! Cooperative recurring tasks driven by the host's update loop.
//!
//! Nothing here spawns threads. The host calls [`Scheduler::run_due`] once
//! per frame with its clock; tasks whose interval elapsed run inline.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

type Job = Box<dyn FnMut(Instant)>;

struct Task {
    name: &'static str,
    interval: Duration,
    next_due: Cell<Instant>,
    cancelled: Rc<Cell<bool>>,
    job: RefCell<Job>,
}

/// Handle used to stop a recurring task. Stopping twice is a no-op.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    name: &'static str,
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        if !self.cancelled.replace(true) {
            log::debug!("Stopped recurring task {}", self.name);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

#[derive(Default)]
pub struct Scheduler {
    tasks: RefCell<Vec<Rc<Task>>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.tasks.borrow().len())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` every `interval`, starting at the first `run_due` at or
    /// after `now`.
    pub fn every(
        &self,
        name: &'static str,
        interval: Duration,
        now: Instant,
        job: impl FnMut(Instant) + 'static,
    ) -> TaskHandle {
        let cancelled = Rc::new(Cell::new(false));
        self.tasks.borrow_mut().push(Rc::new(Task {
            name,
            interval,
            next_due: Cell::new(now),
            cancelled: Rc::clone(&cancelled),
            job: RefCell::new(Box::new(job)),
        }));
        log::debug!("Scheduled recurring task {} every {:?}", name, interval);
        TaskHandle { name, cancelled }
    }

    /// Run every task that is due at `now`. Returns how many ran.
    ///
    /// A slow pass only delays the next tick; missed ticks are not replayed.
    pub fn run_due(&self, now: Instant) -> usize {
        let due: Vec<Rc<Task>> = {
            let mut tasks = self.tasks.borrow_mut();
            tasks.retain(|t| !t.cancelled.get());
            tasks
                .iter()
                .filter(|t| t.next_due.get() <= now)
                .cloned()
                .collect()
        };

        let mut ran = 0;
        for task in due {
            if task.cancelled.get() {
                continue;
            }
            // A task never re-enters itself
            let Ok(mut job) = task.job.try_borrow_mut() else {
                continue;
            };
            task.next_due.set(now + task.interval);
            log::trace!("Running task {}", task.name);
            job(now);
            ran += 1;
        }
        ran
    }

    /// Number of live (not cancelled) tasks.
    pub fn len(&self) -> usize {
        self.tasks
            .borrow()
            .iter()
            .filter(|t| !t.cancelled.get())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
