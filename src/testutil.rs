//! Scripted single-wire line simulator for the acquisition tests.
//!
//! Transaction mocks can script pin *states* but not *durations*, and the
//! decoders in this crate live off measured pulse widths. The simulator runs
//! a virtual microsecond timeline shared by a pin, a delay provider and a
//! clock: every pin sample costs one microsecond, delays advance their
//! nominal time, and the scripted trace starts playing the moment the host
//! releases the line.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

use crate::cancel::CancelFlag;
use crate::clock::MonotonicClock;

const SAMPLE_COST_US: u64 = 1;

struct Inner {
    now_us: u64,
    /// Line behavior after release as (level, duration) segments.
    trace: Vec<(PinState, u64)>,
    released_at: Option<u64>,
    /// Host-driven level while the host owns the line.
    driven: Option<PinState>,
    /// Trip this flag once the trace clock passes the given offset.
    cancel_at: Option<(u64, Rc<CancelFlag>)>,
}

impl Inner {
    fn advance(&mut self, us: u64) {
        self.now_us += us;
        if let (Some((offset, flag)), Some(released)) = (&self.cancel_at, self.released_at) {
            if self.now_us.saturating_sub(released) >= *offset {
                flag.cancel();
            }
        }
    }

    fn level(&self) -> PinState {
        if let Some(level) = self.driven {
            return level;
        }
        let Some(released) = self.released_at else {
            // Nobody drives before the first wake; the pull-up idles high.
            return PinState::High;
        };
        let mut t = self.now_us - released;
        for (level, duration) in &self.trace {
            if t < *duration {
                return *level;
            }
            t -= duration;
        }
        // Past the end of the trace the bus idles high again.
        PinState::High
    }
}

#[derive(Clone)]
pub(crate) struct LineSim(Rc<RefCell<Inner>>);

impl LineSim {
    pub(crate) fn new(trace: Vec<(PinState, u64)>) -> Self {
        LineSim(Rc::new(RefCell::new(Inner {
            now_us: 0,
            trace,
            released_at: None,
            driven: None,
            cancel_at: None,
        })))
    }

    pub(crate) fn pin(&self) -> SimPin {
        SimPin(self.clone())
    }

    pub(crate) fn delay(&self) -> SimDelay {
        SimDelay(self.clone())
    }

    pub(crate) fn clock(&self) -> SimClock {
        SimClock(self.clone())
    }

    /// Arranges for `flag` to trip `offset_us` after the (next) release.
    pub(crate) fn cancel_at(&self, offset_us: u64, flag: Rc<CancelFlag>) {
        self.0.borrow_mut().cancel_at = Some((offset_us, flag));
    }

    pub(crate) fn elapsed_since_release(&self) -> u64 {
        let inner = self.0.borrow();
        inner.now_us - inner.released_at.expect("line was never released")
    }
}

pub(crate) struct SimPin(LineSim);

impl ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut inner = self.0.0.borrow_mut();
        inner.advance(SAMPLE_COST_US);
        Ok(inner.level() == PinState::High)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.0.borrow_mut().driven = Some(PinState::Low);
        Ok(())
    }

    /// Releasing the line starts trace playback.
    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut inner = self.0.0.borrow_mut();
        inner.driven = None;
        inner.released_at = Some(inner.now_us);
        Ok(())
    }
}

pub(crate) struct SimDelay(LineSim);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.0.borrow_mut().advance(u64::from(ns) / 1_000);
    }
}

pub(crate) struct SimClock(LineSim);

impl MonotonicClock for SimClock {
    fn now_micros(&mut self) -> u64 {
        self.0.0.borrow().now_us
    }
}

/// Clock that jumps a fixed step on every sample, for transaction-mock tests
/// where the pin script controls the iteration count.
pub(crate) struct StepClock {
    now_us: u64,
    step_us: u64,
}

impl StepClock {
    pub(crate) fn new(step_us: u64) -> Self {
        Self { now_us: 0, step_us }
    }
}

impl MonotonicClock for StepClock {
    fn now_micros(&mut self) -> u64 {
        self.now_us += self.step_us;
        self.now_us
    }
}

pub(crate) fn ack_preamble() -> Vec<(PinState, u64)> {
    use PinState::{High, Low};
    // The sensor takes ~30 us to answer, then signals 80 us low, 80 us high.
    vec![(High, 30), (Low, 80), (High, 80)]
}

pub(crate) fn bit_segments(one: bool) -> [(PinState, u64); 2] {
    use PinState::{High, Low};
    if one {
        [(Low, 50), (High, 70)]
    } else {
        [(Low, 50), (High, 26)]
    }
}

/// Full transmission trace for the given frame bytes, MSB first.
pub(crate) fn frame_trace(bytes: [u8; 5]) -> Vec<(PinState, u64)> {
    let mut trace = ack_preamble();
    for byte in bytes {
        for i in 0..8 {
            trace.extend(bit_segments(byte & (1 << (7 - i)) != 0));
        }
    }
    // Closing low before the sensor lets go of the bus.
    trace.push((PinState::Low, 50));
    trace
}
