//! Deadline-bounded busy-polling shared by all acquisition stages.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, PinState};

use crate::cancel::CancelFlag;
use crate::clock::MonotonicClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    /// The line left `level`; payload is the time spent at `level` in
    /// microseconds.
    Changed(u32),
    /// The deadline passed with the line still at `level`.
    Expired,
    /// The cancel flag tripped while waiting.
    Cancelled,
}

/// Busy-polls while the line holds `level`.
///
/// Samples the pin in a tight loop, measuring elapsed time against `clock`.
/// A non-zero `pace_us` inserts that delay between samples for stages where
/// hammering the line buys nothing. The cancel flag is checked once per
/// iteration. Timing-critical: no yielding beyond the optional pacing delay.
pub(crate) fn poll_while<P, D, C>(
    pin: &mut P,
    delay: &mut D,
    clock: &mut C,
    level: PinState,
    deadline_us: u32,
    pace_us: u32,
    cancel: Option<&CancelFlag>,
) -> Result<PollOutcome, P::Error>
where
    P: InputPin,
    D: DelayNs,
    C: MonotonicClock,
{
    let start = clock.now_micros();
    loop {
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            return Ok(PollOutcome::Cancelled);
        }
        let held = match level {
            PinState::Low => pin.is_low()?,
            PinState::High => pin.is_high()?,
        };
        let elapsed = clock.now_micros().saturating_sub(start);
        if !held {
            return Ok(PollOutcome::Changed(elapsed as u32));
        }
        if elapsed >= u64::from(deadline_us) {
            return Ok(PollOutcome::Expired);
        }
        if pace_us > 0 {
            delay.delay_us(pace_us);
        }
    }
}
