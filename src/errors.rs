// src/errors.rs
//! Error handling for the SIDH engine.
//!
//! Every fallible operation returns [`Result`], whose error type [`SidhError`]
//! falls into one of four classes: arithmetic faults (inverse of zero, missing
//! square root) that the caller may recover from, format errors raised at the
//! encoding boundary, configuration errors, and randomness failures. The last
//! two are fatal for the operation in progress; none of them terminate the process.

use log::{debug, error, warn};
use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SidhError>;

/// Broad classification of an error, used for logging and for deciding
/// whether the caller can continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorClass {
    /// Field inverse of zero or square root of a non-residue
    Arithmetic,
    /// Malformed, wrong-length or out-of-range encodings and mismatched keys
    Format,
    /// Unknown or unusable parameter set, invalid strategy
    Config,
    /// Entropy source unavailable
    Randomness,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Arithmetic => write!(f, "ARITHMETIC"),
            ErrorClass::Format => write!(f, "FORMAT"),
            ErrorClass::Config => write!(f, "CONFIG"),
            ErrorClass::Randomness => write!(f, "RANDOMNESS"),
        }
    }
}

/// The specific arithmetic fault behind [`SidhError::Arithmetic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticFault {
    /// Attempted to invert zero
    ZeroInverse,
    /// The operand is a quadratic non-residue
    NoSquareRoot,
}

impl fmt::Display for ArithmeticFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithmeticFault::ZeroInverse => write!(f, "inverse of zero"),
            ArithmeticFault::NoSquareRoot => write!(f, "no square root exists"),
        }
    }
}

/// Error type for all SIDH operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SidhError {
    #[error("Arithmetic error in '{operation}': {fault}")]
    Arithmetic {
        operation: &'static str,
        fault: ArithmeticFault,
    },

    #[error("Invalid length for {context}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Value out of range for {context}: {reason}")]
    OutOfRange {
        context: &'static str,
        reason: String,
    },

    #[error("Malformed {context}: {reason}")]
    Malformed {
        context: &'static str,
        reason: String,
    },

    #[error("Key mismatch: {reason}")]
    KeyMismatch { reason: String },

    #[error("Unknown parameter set '{name}'")]
    UnknownParameterSet { name: String },

    #[error("Invalid configuration for '{parameter}': {reason}")]
    InvalidConfiguration {
        parameter: String,
        reason: String,
    },

    #[error("Randomness source failed while requesting {requested} bytes: {reason}")]
    RandomnessFailure { requested: usize, reason: String },
}

impl SidhError {
    /// Shorthand for an inverse-of-zero fault raised by `operation`.
    pub fn zero_inverse(operation: &'static str) -> Self {
        SidhError::Arithmetic {
            operation,
            fault: ArithmeticFault::ZeroInverse,
        }
    }

    /// Shorthand for a missing square root raised by `operation`.
    pub fn no_square_root(operation: &'static str) -> Self {
        SidhError::Arithmetic {
            operation,
            fault: ArithmeticFault::NoSquareRoot,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            SidhError::Arithmetic { .. } => ErrorClass::Arithmetic,
            SidhError::InvalidLength { .. }
            | SidhError::OutOfRange { .. }
            | SidhError::Malformed { .. }
            | SidhError::KeyMismatch { .. } => ErrorClass::Format,
            SidhError::UnknownParameterSet { .. } | SidhError::InvalidConfiguration { .. } => {
                ErrorClass::Config
            }
            SidhError::RandomnessFailure { .. } => ErrorClass::Randomness,
        }
    }

    /// Whether the error aborts the operation with no way to retry on the same inputs.
    ///
    /// Configuration and randomness failures are fatal. Arithmetic faults are
    /// reported to the caller, which decides how to recover (for instance by
    /// sampling another candidate point), and format errors reject the input.
    pub fn is_fatal(&self) -> bool {
        matches!(self.class(), ErrorClass::Config | ErrorClass::Randomness)
    }

    /// Log the error with the module and function that observed it.
    pub fn log_with_context(&self, module: &str, function: &str) {
        let message = format!("[{}::{}] [{}] {}", module, function, self.class(), self);
        match self.class() {
            ErrorClass::Config | ErrorClass::Randomness => error!("{}", message),
            ErrorClass::Format => warn!("{}", message),
            ErrorClass::Arithmetic => debug!("{}", message),
        }
    }
}

/// Extension trait for logging a result's error without consuming it
pub trait ResultExt<T> {
    fn log_on_error(self, module: &str, function: &str) -> Self;
}

impl<T> ResultExt<T> for Result<T> {
    fn log_on_error(self, module: &str, function: &str) -> Self {
        if let Err(ref error) = self {
            error.log_with_context(module, function);
        }
        self
    }
}
