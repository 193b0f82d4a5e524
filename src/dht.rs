use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
};

use crate::cancel::CancelFlag;
use crate::clock::MonotonicClock;
use crate::error::DhtError;
use crate::poll::{PollOutcome, poll_while};
use crate::pulse::{self, N_BITS, PulseWidths, RawFrame, Reading, SensorVariant};

/// How long the host holds the line low to wake the sensor, in milliseconds.
/// The datasheets ask for at least 18 ms; 28 ms rides out slow sensors.
const WAKE_HOLD_MS: u32 = 28;

/// Window after release within which the sensor must pull the line low.
const START_TIMEOUT_US: u32 = 50_000;

/// Pacing between samples while waiting out the start window.
const START_PACE_US: u32 = 1;

/// Ceiling on any single response or bit segment. Far outside every timing
/// band, so hitting it means the line is stuck, not merely jittery.
const SEGMENT_DEADLINE_US: u32 = 1_000;

/// Driver for the DHT11/DHT22 family of humidity and temperature sensors.
///
/// One instance owns one data pin; the protocol is not reentrant, so keep at
/// most one read in flight per pin. Distinct pins share nothing and may be
/// read in parallel.
pub struct Dht<'c, PIN, DELAY, CLK> {
    pin: PIN,
    delay: DELAY,
    clock: CLK,
    variant: SensorVariant,
    cancel: Option<&'c CancelFlag>,
}

impl<'c, PIN, DELAY, CLK, E> Dht<'c, PIN, DELAY, CLK>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    CLK: MonotonicClock,
{
    /// Creates a new driver instance. Performs no I/O.
    ///
    /// # Arguments
    ///
    /// * `variant` - Which sensor hangs on the line; selects decode scaling.
    /// * `pin` - The GPIO pin connected to the data line. Must support both
    ///   input and output; on platforms where mode and pull-up switching are
    ///   explicit, the pin implementation handles them (`set_high` releases
    ///   the line, reads expect input mode with the pull-up engaged).
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    /// * `clock` - Monotonic microsecond counter for pulse width measurement.
    pub fn new(variant: SensorVariant, pin: PIN, delay: DELAY, clock: CLK) -> Self {
        Dht {
            pin,
            delay,
            clock,
            variant,
            cancel: None,
        }
    }

    /// Attaches a cancellation token checked at every polling checkpoint.
    ///
    /// Trip the flag from another thread or ISR and the read in flight
    /// returns [`DhtError::Cancelled`] within roughly one pulse segment. The
    /// flag is sticky across reads; re-arm with
    /// [`CancelFlag::reset`](crate::CancelFlag::reset).
    pub fn with_cancel(mut self, flag: &'c CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The variant this driver was configured for.
    pub fn variant(&self) -> SensorVariant {
        self.variant
    }

    /// Performs one complete acquisition-decode cycle.
    ///
    /// Wakes the sensor, times the 40 low/high pulse pairs it clocks out,
    /// validates each pair against the protocol bands, then reassembles and
    /// checksums the frame before scaling it into a [`Reading`]. Every
    /// failure aborts the whole cycle; no partial reading is ever produced.
    ///
    /// The call blocks and busy-polls for tens of milliseconds, so run it on
    /// a worker that can stall, never on a shared event loop. Retry policy is
    /// the caller's: the sensor needs at least one second of quiet line
    /// between reads, and a failed read is worth retrying after that pause.
    ///
    /// Whatever the outcome, the line is left parked in input mode with the
    /// pull-up idling it high.
    pub fn read(&mut self) -> Result<Reading, DhtError<E>> {
        let acquired = self.acquire();
        // Park the line before looking at the outcome, so error paths and
        // cancelled reads also leave it in input mode.
        let parked = self.pin.is_high();
        let pulses = acquired?;
        parked?;

        let frame = RawFrame::from_pulses(&pulses);
        if !frame.checksum_ok() {
            return Err(DhtError::ChecksumMismatch);
        }
        Ok(frame.decode(self.variant))
    }

    /// Runs the wake handshake and measures the 40 pulse pairs.
    fn acquire(&mut self) -> Result<[PulseWidths; N_BITS], DhtError<E>> {
        // Wake pulse: hold the line low long enough for the sensor to
        // notice, then release it to the sensor.
        self.pin.set_low()?;
        self.delay.delay_ms(WAKE_HOLD_MS);
        self.pin.set_high()?;

        // The sensor announces itself by pulling the line low.
        match self.poll(PinState::High, START_TIMEOUT_US, START_PACE_US)? {
            PollOutcome::Changed(_) => {}
            PollOutcome::Expired => return Err(DhtError::StartNotFound),
            PollOutcome::Cancelled => return Err(DhtError::Cancelled),
        }

        // Response preamble, nominally 80 us low then 80 us high. Presence
        // is all that gates bit acquisition; the widths are not checked.
        self.segment(PinState::Low)?;
        self.segment(PinState::High)?;

        let mut pulses = [PulseWidths::default(); N_BITS];
        for slot in pulses.iter_mut() {
            let low_us = self.segment(PinState::Low)?;
            if !pulse::low_in_band(low_us) {
                return Err(DhtError::TimingOutOfRange);
            }
            let high_us = self.segment(PinState::High)?;
            if !pulse::high_in_band(high_us) {
                return Err(DhtError::TimingOutOfRange);
            }
            *slot = PulseWidths { low_us, high_us };
        }
        Ok(pulses)
    }

    /// Waits out one line segment at `level` and returns its measured width.
    fn segment(&mut self, level: PinState) -> Result<u32, DhtError<E>> {
        match self.poll(level, SEGMENT_DEADLINE_US, 0)? {
            PollOutcome::Changed(elapsed_us) => Ok(elapsed_us),
            PollOutcome::Expired => Err(DhtError::TimingOutOfRange),
            PollOutcome::Cancelled => Err(DhtError::Cancelled),
        }
    }

    fn poll(
        &mut self,
        level: PinState,
        deadline_us: u32,
        pace_us: u32,
    ) -> Result<PollOutcome, DhtError<E>> {
        poll_while(
            &mut self.pin,
            &mut self.delay,
            &mut self.clock,
            level,
            deadline_us,
            pace_us,
            self.cancel,
        )
        .map_err(DhtError::PinError)
    }
}
