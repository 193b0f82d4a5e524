//! HC-SR04 ultrasonic distance sensor.
//!
//! The sensor measures distance by sound round-trip: a 10 us pulse on the
//! trigger pin fires an ultrasonic burst, and the sensor then holds its echo
//! pin high for as long as the sound took to come back. The width of that
//! high phase, timed with the [`MonotonicClock`], is the measurement.

use core::fmt;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
};

use crate::clock::MonotonicClock;
use crate::poll::{PollOutcome, poll_while};

/// Width of the trigger pulse that starts a measurement burst.
const TRIGGER_PULSE_US: u32 = 10;

/// How long to wait for the echo line to rise after triggering.
const ECHO_START_TIMEOUT_US: u32 = 10_000;

/// Ceiling on the echo phase; the sensor itself holds echo high for about
/// 38 ms when nothing reflects.
const ECHO_CEILING_US: u32 = 60_000;

/// Speed of sound at room temperature, in millimeters per microsecond.
const SPEED_OF_SOUND_MM_PER_US: f32 = 0.343;

/// Possible errors from the HC-SR04 driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoError<E> {
    /// The echo line never rose after the trigger pulse. Disconnected or
    /// still busy with the previous burst.
    NoEcho,
    /// The echo phase outlasted any measurable distance.
    OutOfRange,
    /// Error from a GPIO pin (trigger or echo).
    PinError(E),
}

impl<E> From<E> for EchoError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug> fmt::Display for EchoError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEcho => write!(f, "echo line never rose after trigger"),
            Self::OutOfRange => write!(f, "echo outlasted the measurable range"),
            Self::PinError(e) => write!(f, "GPIO pin error: {e:?}"),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl<E: fmt::Debug> std::error::Error for EchoError<E> {}

/// Schedule for an averaged measurement.
///
/// The first couple of readings after a quiet period are usually off, so
/// `discard` pulses run and are thrown away before the `sweeps` pulses that
/// actually get averaged. `pause_ms` separates consecutive pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sweep {
    pub sweeps: u32,
    pub discard: u32,
    pub pause_ms: u32,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            sweeps: 4,
            discard: 2,
            pause_ms: 1,
        }
    }
}

/// Driver for the HC-SR04, one dedicated trigger pin and one echo pin.
pub struct HcSr04<TRIG, ECHO, DELAY, CLK> {
    trigger: TRIG,
    echo: ECHO,
    delay: DELAY,
    clock: CLK,
}

impl<TRIG, ECHO, DELAY, CLK, E> HcSr04<TRIG, ECHO, DELAY, CLK>
where
    TRIG: OutputPin<Error = E>,
    ECHO: InputPin<Error = E>,
    DELAY: DelayNs,
    CLK: MonotonicClock,
{
    /// Creates a new driver instance. Performs no I/O; the trigger pin is
    /// expected to idle low.
    pub fn new(trigger: TRIG, echo: ECHO, delay: DELAY, clock: CLK) -> Self {
        HcSr04 {
            trigger,
            echo,
            delay,
            clock,
        }
    }

    /// Fires one burst and returns the raw round-trip echo time in
    /// microseconds. Blocks for up to the echo ceiling; run it on a worker
    /// that can stall.
    pub fn echo_time(&mut self) -> Result<u32, EchoError<E>> {
        self.trigger.set_high()?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low()?;

        // Rising edge of the echo phase.
        match poll_while(
            &mut self.echo,
            &mut self.delay,
            &mut self.clock,
            PinState::Low,
            ECHO_START_TIMEOUT_US,
            0,
            None,
        )? {
            PollOutcome::Changed(_) => {}
            PollOutcome::Expired | PollOutcome::Cancelled => return Err(EchoError::NoEcho),
        }

        // The width of the high phase is the round trip time.
        match poll_while(
            &mut self.echo,
            &mut self.delay,
            &mut self.clock,
            PinState::High,
            ECHO_CEILING_US,
            0,
            None,
        )? {
            PollOutcome::Changed(elapsed_us) => Ok(elapsed_us),
            PollOutcome::Expired | PollOutcome::Cancelled => Err(EchoError::OutOfRange),
        }
    }

    /// Runs `discard + sweeps` pulses per the schedule and returns the mean
    /// echo time of the last `sweeps` of them.
    pub fn echo_time_avg(&mut self, sweep: Sweep) -> Result<u32, EchoError<E>> {
        let mut sum: u64 = 0;
        for i in 0..sweep.discard + sweep.sweeps {
            let echo_us = self.echo_time()?;
            if i >= sweep.discard {
                sum += u64::from(echo_us);
            }
            self.delay.delay_ms(sweep.pause_ms);
        }
        Ok((sum / u64::from(sweep.sweeps.max(1))) as u32)
    }

    /// Averaged distance in millimeters using the default schedule.
    pub fn distance_mm(&mut self) -> Result<f32, EchoError<E>> {
        Ok(echo_time_to_mm(self.echo_time_avg(Sweep::default())?))
    }
}

/// Converts a round-trip echo time into a one-way distance in millimeters.
pub fn echo_time_to_mm(echo_us: u32) -> f32 {
    (echo_us / 2) as f32 * SPEED_OF_SOUND_MM_PER_US
}
