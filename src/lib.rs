//! Drivers for timing-encoded GPIO sensors, built on top of the
//! [`embedded-hal`] traits.
//!
//! The centerpiece is the DHT11/DHT22 (AM2302) single-wire decoder in [`dht`]:
//! it measures the 40 low/high pulse pairs the sensor clocks out, validates
//! each pair against the protocol's timing bands, reassembles the 40-bit frame
//! and checks its checksum before scaling the bytes into a humidity and
//! temperature [`Reading`]. The [`hcsr04`] module times HC-SR04 ultrasonic
//! echo pulses with the same seams, and [`onewire`] (behind the `std` feature)
//! scans the kernel's 1-Wire sysfs tree for temperature probes.
//!
//! # Seams
//! - [`InputPin`] and [`OutputPin`] for the data lines. Sensors that switch a
//!   single line between host-driven and sensor-driven phases expect the pin
//!   implementation to handle mode and pull-up switching (rppal-style `IoPin`
//!   wrappers do this on the Raspberry Pi).
//! - [`DelayNs`] for settle delays and poll pacing.
//! - [`MonotonicClock`], this crate's microsecond counter trait, for pulse
//!   width measurement.
//!
//! Acquisition is blocking and busy-polls with microsecond deadlines; run it
//! on a worker you can afford to stall for tens of milliseconds, never on a
//! shared event loop. A read in flight can be aborted from another thread or
//! ISR through a [`CancelFlag`].
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` on readings and errors
//! - `std`: std-backed [`clock::StdClock`], `std::error::Error` impls and the
//!   [`onewire`] scanner
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

#[cfg(all(not(test), feature = "std"))]
extern crate std;

pub mod cancel;
pub mod clock;
pub mod dht;
pub mod error;
pub mod hcsr04;
#[cfg(any(test, feature = "std"))]
pub mod onewire;
pub(crate) mod poll;
pub mod pulse;

#[cfg(test)]
pub(crate) mod testutil;

pub use cancel::CancelFlag;
pub use clock::MonotonicClock;
pub use dht::Dht;
pub use error::DhtError;
pub use pulse::{Reading, SensorVariant};
