use core::sync::atomic::{AtomicBool, Ordering};

/// Cancellation token for an in-flight or future acquisition.
///
/// Share a reference with the acquiring driver via
/// [`Dht::with_cancel`](crate::Dht::with_cancel) and keep another for the
/// controlling thread or ISR. The flag is only inspected at the driver's
/// polling checkpoints, so cancellation latency is bounded by the remaining
/// duration of the current pulse segment, not instantaneous.
///
/// The flag is sticky: once set it also aborts subsequent reads until
/// [`reset`](CancelFlag::reset) re-arms it.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    /// Creates a cleared flag. `const`, so it can live in a `static`.
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clears the flag so the next read runs to completion.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_sticky_until_reset() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());

        flag.cancel();
        flag.cancel();
        assert!(flag.is_cancelled());

        flag.reset();
        assert!(!flag.is_cancelled());
    }
}
