use core::fmt;

/// Possible errors from the DHT11/DHT22 driver.
///
/// Every variant except [`PinError`](DhtError::PinError) is recoverable by
/// retrying after the sensor's quiescence interval (at least one second
/// between reads).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The sensor never pulled the line low within the start window after the
    /// wake pulse. Disconnected, miswired, or polled again too soon.
    StartNotFound,
    /// A measured pulse fell outside the protocol's timing bands, or a
    /// segment overran its deadline entirely. Electrical noise, a bad
    /// connection, or a sensor still settling from the previous read.
    TimingOutOfRange,
    /// The transmitted checksum byte does not match the four data bytes.
    ChecksumMismatch,
    /// The read was aborted through its [`CancelFlag`](crate::CancelFlag).
    Cancelled,
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartNotFound => write!(f, "sensor did not answer the wake pulse"),
            Self::TimingOutOfRange => write!(f, "pulse width outside protocol timing bands"),
            Self::ChecksumMismatch => write!(f, "frame checksum mismatch"),
            Self::Cancelled => write!(f, "read cancelled"),
            Self::PinError(e) => write!(f, "GPIO pin error: {e:?}"),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl<E: fmt::Debug> std::error::Error for DhtError<E> {}
