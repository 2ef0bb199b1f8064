//! Unified error types for the water level gauge firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the supervisor's handling uniform.  All variants are `Copy` so they
//! can be passed through the cycle context without allocation.
//!
//! Most faults never reach this type: bad sensor lines and malformed modem
//! fields are absorbed into defaults where they occur.  What remains here
//! is what a port can genuinely fail with.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read.
    Sensor(SensorError),
    /// An AT command round-trip failed.
    Modem(ModemError),
    /// The datagram transport failed.
    Transport(TransportError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Modem(e) => write!(f, "modem: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error.
    AdcReadFailed,
    /// I2C transfer was not acknowledged.
    BusFailed,
    /// The sensor never signalled conversion complete.
    ConversionTimeout,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::BusFailed => write!(f, "I2C transfer failed"),
            Self::ConversionTimeout => write!(f, "conversion timed out"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Modem errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemError {
    /// No final result code before the command deadline.
    Timeout,
    /// The modem answered `ERROR`, `+CME ERROR` or `+CMS ERROR`.
    CommandFailed,
    /// The UART rejected a write.
    Io,
    /// The command does not fit the transmit buffer.
    CommandTooLong,
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "AT command timed out"),
            Self::CommandFailed => write!(f, "AT command returned an error"),
            Self::Io => write!(f, "UART I/O error"),
            Self::CommandTooLong => write!(f, "AT command too long"),
        }
    }
}

impl From<ModemError> for Error {
    fn from(e: ModemError) -> Self {
        Self::Modem(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Socket could not be created.
    SocketOpenFailed,
    /// Socket could not be bound to the server address.
    ConnectFailed,
    /// `send` was attempted before the socket was opened.
    NotConnected,
    /// The modem rejected or short-wrote the datagram.
    SendFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SocketOpenFailed => write!(f, "socket open failed"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::NotConnected => write!(f, "socket not connected"),
            Self::SendFailed => write!(f, "datagram send failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors from [`ConfigPort`](crate::app::ports::ConfigPort) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
