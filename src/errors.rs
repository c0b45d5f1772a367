//! Driver errors

use core::fmt;

/// Reasons a sweep description cannot be turned into register words.
/// Reported before any hardware access takes place.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Start frequency is negative
    NegativeStartFrequency,
    /// Bandwidth is zero or negative
    NonPositiveBandwidth,
    /// Ramp duration is zero or negative
    NonPositiveRampDuration,
    /// A parameter, or something derived from it, is NaN or infinite
    NonFinite,
    /// Bandwidth over ramp duration truncates to 0 Hz per step
    ZeroDeviation,
    /// Bandwidth over step deviation truncates to 0 steps
    ZeroSteps,
}

/// Driver error
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bus or GPIO bring-up failed
    Initialization,
    /// Sweep parameters could not be encoded
    Encoding(EncodingError),
    /// A register word was not committed, the device is now faulted
    Transfer,
    /// Control line could not be driven
    Pin,
    /// `initialize` has not been called yet
    NotInitialized,
    /// A previous write failed, `initialize` must be called again
    Faulted,
}

impl From<EncodingError> for Error {
    fn from(e: EncodingError) -> Self {
        Error::Encoding(e)
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            EncodingError::NegativeStartFrequency => "start frequency is negative",
            EncodingError::NonPositiveBandwidth => "bandwidth must be positive",
            EncodingError::NonPositiveRampDuration => "ramp duration must be positive",
            EncodingError::NonFinite => "non-finite sweep parameter",
            EncodingError::ZeroDeviation => "step deviation truncates to zero",
            EncodingError::ZeroSteps => "step count truncates to zero",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Initialization => f.write_str("bus or GPIO initialization failed"),
            Error::Encoding(e) => write!(f, "sweep encoding failed: {}", e),
            Error::Transfer => f.write_str("register transfer failed"),
            Error::Pin => f.write_str("control pin error"),
            Error::NotInitialized => f.write_str("device not initialized"),
            Error::Faulted => f.write_str("device faulted, re-initialize required"),
        }
    }
}
