use std::time::Duration;

use tokio::time::Instant;

/// How long a click blocks further clicks.
pub const CLICK_LATCH: Duration = Duration::from_millis(100);

/// Drops clicks that arrive while a previous click is still latched.
#[derive(Debug, Clone)]
pub struct ClickGuard {
    latch: Duration,
    latched_until: Option<Instant>,
}

impl Default for ClickGuard {
    fn default() -> Self {
        Self::new(CLICK_LATCH)
    }
}

impl ClickGuard {
    pub fn new(latch: Duration) -> Self {
        Self {
            latch,
            latched_until: None,
        }
    }

    /// Take the latch if it is free.
    ///
    /// Returns false, and leaves the latch untouched, while a previous click
    /// still holds it.
    pub fn try_acquire(&mut self) -> bool {
        let now = Instant::now();
        if self.latched_until.is_some_and(|until| now < until) {
            return false;
        }
        self.latched_until = Some(now + self.latch);
        true
    }

    pub fn is_latched(&self) -> bool {
        self.latched_until
            .is_some_and(|until| Instant::now() < until)
    }
}
