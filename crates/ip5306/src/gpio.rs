//! Pin and clock seams used by the press state machine.
//!
//! The IP5306 KEY input is shared with a physical button, so the host must
//! not hold it as a plain output: it drives the line low only for the
//! duration of an emulated press and otherwise leaves it floating. That
//! needs a pin whose direction can change at runtime, which plain
//! `embedded_hal::digital::OutputPin` cannot express, hence [`ButtonLine`].

use embassy_time::Instant;
use embedded_hal::digital::{ErrorType, PinState};

/// Electrical configuration of the KEY line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineMode {
    /// Actively driven output.
    PushPull,
    /// High-impedance input, line released to the chip's pull-up.
    Floating,
}

impl LineMode {
    /// Short name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            LineMode::PushPull => "push-pull",
            LineMode::Floating => "floating",
        }
    }
}

/// A GPIO that can switch between driven output and floating input.
///
/// HALs with a flexible pin type (`Flex` on embassy-stm32 / nrf / rp)
/// implement this with a few lines:
///
/// ```rust,ignore
/// impl ButtonLine for KeyPin<'_> {
///     fn set_mode(&mut self, mode: LineMode) -> Result<(), Self::Error> {
///         match mode {
///             LineMode::PushPull => self.0.set_as_output(Speed::Low),
///             LineMode::Floating => self.0.set_as_input(Pull::None),
///         }
///         Ok(())
///     }
///     fn set_level(&mut self, level: PinState) -> Result<(), Self::Error> {
///         self.0.set_level(level.into());
///         Ok(())
///     }
/// }
/// ```
pub trait ButtonLine: ErrorType {
    /// Switch the line between output and floating input.
    fn set_mode(&mut self, mode: LineMode) -> Result<(), Self::Error>;

    /// Drive `level` while in [`LineMode::PushPull`].
    fn set_level(&mut self, level: PinState) -> Result<(), Self::Error>;
}

impl<T: ButtonLine + ?Sized> ButtonLine for &mut T {
    fn set_mode(&mut self, mode: LineMode) -> Result<(), Self::Error> {
        T::set_mode(self, mode)
    }

    fn set_level(&mut self, level: PinState) -> Result<(), Self::Error> {
        T::set_level(self, level)
    }
}

/// Monotonic time source.
pub trait Monotonic {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// [`Monotonic`] backed by the embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Monotonic for EmbassyClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Monotonic + ?Sized> Monotonic for &T {
    fn now(&self) -> Instant {
        T::now(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embassy_clock_is_monotonic() {
        let clock = EmbassyClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn line_mode_names() {
        assert_eq!(LineMode::PushPull.name(), "push-pull");
        assert_eq!(LineMode::Floating.name(), "floating");
    }
}
