//! Error types for IP5306 operations.

use embedded_hal::digital::ErrorKind as PinErrorKind;

use crate::press::{OperatingMode, PressKind};
use crate::registers::Register;

/// Charging current not representable by the weighted CHG_DIG_CTL0 encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CurrentError {
    /// Outside 50..=3150 mA.
    OutOfRange {
        /// Requested current in mA.
        milliamps: u16,
    },
    /// Not `50 + k × 100` mA.
    OffGrid {
        /// Requested current in mA.
        milliamps: u16,
    },
}

impl core::fmt::Display for CurrentError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfRange { milliamps } => {
                write!(f, "charging current {milliamps} mA outside 50..=3150 mA")
            }
            Self::OffGrid { milliamps } => {
                write!(f, "charging current {milliamps} mA is not 50 mA + a multiple of 100 mA")
            }
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for CurrentError {}

/// A raw field value with no named variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidField {
    /// Sub-register holding the field.
    pub register: Register,
    /// Raw field bits, right-aligned.
    pub bits: u8,
}

impl core::fmt::Display for InvalidField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} holds unknown field value {:#04b}", self.register.name(), self.bits)
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for InvalidField {}

/// Errors of the register-level driver ([`Ip5306`](crate::Ip5306)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The I²C transaction for `register` failed.
    ///
    /// Sub-registers handled earlier in the same grouped call keep their new
    /// cached value.
    Bus {
        /// Sub-register whose transaction failed.
        register: Register,
        /// Bus error.
        error: E,
    },
    /// A write of `register` was requested before it was ever read, so there
    /// is no retained byte to merge the fields into.
    NotCached {
        /// Sub-register without a retained byte.
        register: Register,
    },
    /// `register` was selected for writing but the supplied group value has
    /// no view for it.
    MissingFields {
        /// Selected sub-register.
        register: Register,
    },
    /// `register` is a read-only status register.
    ReadOnly {
        /// Selected sub-register.
        register: Register,
    },
    /// A raw field value has no named variant.
    InvalidField {
        /// Sub-register holding the field.
        register: Register,
        /// Raw field bits, right-aligned.
        bits: u8,
    },
    /// Requested charging current is not encodable.
    Current(CurrentError),
}

impl<E> Error<E> {
    /// Sub-register the error refers to, if any.
    pub fn register(&self) -> Option<Register> {
        match self {
            Self::Bus { register, .. }
            | Self::NotCached { register }
            | Self::MissingFields { register }
            | Self::ReadOnly { register }
            | Self::InvalidField { register, .. } => Some(*register),
            Self::Current(_) => Some(Register::ChgDigCtl0),
        }
    }
}

impl<E> From<CurrentError> for Error<E> {
    fn from(error: CurrentError) -> Self {
        Error::Current(error)
    }
}

impl<E> From<InvalidField> for Error<E> {
    fn from(InvalidField { register, bits }: InvalidField) -> Self {
        Error::InvalidField { register, bits }
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    #[allow(clippy::use_debug)] // bus errors only guarantee Debug
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus { register, error } => {
                write!(f, "I2C transaction on {} failed: {error:?}", register.name())
            }
            Self::NotCached { register } => {
                write!(f, "{} written before it was ever read", register.name())
            }
            Self::MissingFields { register } => {
                write!(f, "no field values supplied for {}", register.name())
            }
            Self::ReadOnly { register } => write!(f, "{} is read-only", register.name()),
            Self::InvalidField { register, bits } => {
                write!(f, "{} holds unknown field value {bits:#04b}", register.name())
            }
            Self::Current(error) => write!(f, "{error}"),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl<E: core::fmt::Debug> std::error::Error for Error<E> {}

/// Errors of the [`PressStateMachine`](crate::PressStateMachine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressError {
    /// The press is not legal in the current mode. Nothing was driven.
    IllegalTransition {
        /// Mode at the time of the request.
        from: OperatingMode,
        /// Requested press sequence.
        requested: PressKind,
    },
    /// Driving the KEY line or sampling IRQ failed.
    Pin(PinErrorKind),
}

impl core::fmt::Display for PressError {
    #[allow(clippy::use_debug)]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IllegalTransition { from, requested } => write!(
                f,
                "{} is not allowed while {}",
                requested.name(),
                from.name()
            ),
            Self::Pin(kind) => write!(f, "GPIO error: {kind:?}"),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for PressError {}
