//! Scoped re-entrancy guard for single-threaded passes.

use std::cell::Cell;

/// A flag that can be held by at most one scope at a time.
#[derive(Debug, Default)]
pub struct ReentrancyFlag {
    held: Cell<bool>,
}

impl ReentrancyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the flag, or `None` if some outer scope already holds it.
    /// The flag is released when the returned guard drops, on every exit path.
    pub fn try_acquire(&self) -> Option<ReentrancyGuard<'_>> {
        if self.held.replace(true) {
            return None;
        }
        Some(ReentrancyGuard { flag: self })
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }
}

#[must_use = "the flag is released as soon as the guard drops"]
#[derive(Debug)]
pub struct ReentrancyGuard<'a> {
    flag: &'a ReentrancyFlag,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.flag.held.set(false);
    }
}
