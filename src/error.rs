//! Error definitions for MP8862 driver.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<I2cError> {
    /// Underlying I2C transaction failed (NACK, arbitration loss, bus timeout).
    I2c(I2cError),
    /// Requested voltage/current exceeds the configured soft limit. Raised before any bus access.
    OutOfRange,
    /// Power-up retry budget exhausted; the enable pin has been deasserted again.
    HandshakeTimeout,
    /// Driving the hardware enable pin failed.
    EnablePin(embedded_hal::digital::ErrorKind),
    /// Burst longer than the driver's transfer buffer.
    InvalidConfig,
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::OutOfRange => write!(f, "parameter exceeds soft limit"),
            Error::HandshakeTimeout => write!(f, "power-up handshake not acknowledged"),
            Error::EnablePin(kind) => write!(f, "enable pin error: {:?}", kind),
            Error::InvalidConfig => write!(f, "burst length exceeds transfer buffer"),
        }
    }
}

impl<I2cError> Error<I2cError> {
    pub(crate) fn pin<P: embedded_hal::digital::Error>(err: P) -> Self {
        Error::EnablePin(err.kind())
    }
}
