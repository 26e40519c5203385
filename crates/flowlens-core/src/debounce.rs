use std::time::Duration;
use std::time::Instant;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone)]
struct PendingFlush<T> {
    value: T,
    deadline: Instant,
}

/// Trailing-edge debouncer holding at most one pending value.
///
/// Every `schedule` restarts the quiet period, so only the last value of a
/// burst is released. A value equal to the last released one is dropped.
/// The host drives it with `poll` at `deadline()`.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<PendingFlush<T>>,
    last_flushed: Option<T>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            last_flushed: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Returns whether a flush is pending afterwards.
    pub fn schedule(&mut self, value: T, now: Instant) -> bool {
        if self.last_flushed.as_ref() == Some(&value) {
            self.pending = None;
            return false;
        }
        self.pending = Some(PendingFlush {
            value,
            deadline: now + self.quiet,
        });
        true
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.deadline <= now);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        self.release(pending.value)
    }

    /// Releases the pending value regardless of its deadline.
    pub fn flush_now(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        self.release(pending.value)
    }

    /// Records a value as already propagated without releasing anything.
    pub fn mark_flushed(&mut self, value: T) {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.value == value)
        {
            self.pending = None;
        }
        self.last_flushed = Some(value);
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_flushed(&self) -> Option<&T> {
        self.last_flushed.as_ref()
    }

    fn release(&mut self, value: T) -> Option<T> {
        if self.last_flushed.as_ref() == Some(&value) {
            return None;
        }
        self.last_flushed = Some(value.clone());
        Some(value)
    }
}

impl<T: Clone + PartialEq> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn burst_releases_only_the_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(1_000));
        let mut released = Vec::new();

        for (step, value) in ["a", "ab", "abc", "abcd"].into_iter().enumerate() {
            let now = start + ms(step as u64 * 200);
            debouncer.schedule(value, now);
            if let Some(value) = debouncer.poll(now) {
                released.push(value);
            }
        }
        assert_eq!(released, Vec::<&str>::new());
        assert_eq!(debouncer.deadline(), Some(start + ms(1_600)));

        assert_eq!(debouncer.poll(start + ms(1_599)), None);
        assert_eq!(debouncer.poll(start + ms(1_600)), Some("abcd"));
        assert_eq!(debouncer.poll(start + ms(5_000)), None);
    }

    #[test]
    fn value_equal_to_last_release_is_suppressed() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(100));
        debouncer.schedule(1, start);
        assert_eq!(debouncer.poll(start + ms(100)), Some(1));

        assert!(!debouncer.schedule(1, start + ms(200)));
        assert_eq!(debouncer.poll(start + ms(400)), None);
    }

    #[test]
    fn burst_returning_to_released_value_writes_nothing() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(100));
        debouncer.mark_flushed(7);
        debouncer.schedule(8, start);
        debouncer.schedule(7, start + ms(10));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.flush_now(), None);
    }

    #[test]
    fn mark_flushed_clears_matching_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(100));
        debouncer.schedule("x", start);
        debouncer.mark_flushed("x");
        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.last_flushed(), Some(&"x"));

        debouncer.schedule("y", start);
        debouncer.mark_flushed("z");
        assert!(debouncer.is_pending());
        debouncer.cancel();
        assert!(!debouncer.is_pending());
    }
}
