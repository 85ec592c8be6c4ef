use std::time::{Duration, Instant};

/// Coalesce calls that arrive within `window` of each other into one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoalescePolicy {
    pub window: Duration,
}

impl CoalescePolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

/// Trailing-edge debounce as a plain state machine.
///
/// Every `touch` pushes the deadline to `now + window`; `fire` reports true
/// exactly once after the deadline passes, then disarms.
#[derive(Clone, Debug)]
pub struct Coalescer {
    policy: CoalescePolicy,
    deadline: Option<Instant>,
}

impl Coalescer {
    pub fn new(policy: CoalescePolicy) -> Self {
        Self {
            policy,
            deadline: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.policy.window);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Disarm without firing, e.g. after an unrelated full save.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    fn coalescer() -> Coalescer {
        Coalescer::new(CoalescePolicy::new(WINDOW))
    }

    #[test]
    fn test_idle_never_fires() {
        let mut c = coalescer();
        assert!(c.deadline().is_none());
        assert!(!c.fire(Instant::now() + Duration::from_secs(60)));
    }

    #[test]
    fn test_fires_once_after_window() {
        let start = Instant::now();
        let mut c = coalescer();
        c.touch(start);

        assert!(!c.fire(start + Duration::from_millis(499)));
        assert!(c.fire(start + WINDOW));
        assert!(!c.fire(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_touch_pushes_deadline() {
        let start = Instant::now();
        let mut c = coalescer();
        c.touch(start);
        c.touch(start + Duration::from_millis(400));

        assert_eq!(c.deadline(), Some(start + Duration::from_millis(900)));
        assert!(!c.fire(start + Duration::from_millis(600)));
        assert!(c.fire(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_cancel_disarms() {
        let start = Instant::now();
        let mut c = coalescer();
        c.touch(start);
        c.cancel();
        assert!(!c.fire(start + WINDOW * 2));
    }
}
