//! Protocol constants and press-timing configuration.
//!
//! Constants are the values the IP5306 firmware and the KEY debounce logic
//! expect. [`PressConfig`] groups the ones the press state machine uses so a
//! board can override them (e.g. for an inverted IRQ level shifter).

use embassy_time::Duration;

/// 7-bit I²C address (8-bit wire address `0xEA`).
pub const IP5306_I2C_ADDR: u8 = 0xEA >> 1;

/// Upper bound for one register read.
///
/// `embedded-hal` transactions carry no per-call timeout; configure the I²C
/// peripheral with at least this value.
pub const BUS_READ_TIMEOUT: Duration = Duration::from_millis(5);

/// Time to allow after a register write; see [`BUS_READ_TIMEOUT`].
pub const BUS_WRITE_WAIT: Duration = Duration::from_millis(5);

/// Minimum KEY low time the chip debounces as a short press.
pub const SHORT_PRESS_THRESHOLD: Duration = Duration::from_millis(30);

/// KEY low time the chip treats as a long press (flashlight / boost toggle).
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(2000);

/// Emitted pulses are this many times the short-press threshold.
pub const PULSE_MULTIPLIER: u32 = 4;

/// Gap between the two pulses of a double press.
pub const INTER_PULSE_GAP: Duration = Duration::from_millis(100);

/// Time the chip needs to settle after a mode change.
pub const STATE_CHANGE_QUIET_PERIOD: Duration = Duration::from_millis(1000);

/// Margin added on top of [`STATE_CHANGE_QUIET_PERIOD`].
pub const STATE_CHANGE_MARGIN: Duration = Duration::from_millis(500);

/// Electrical level of the IRQ line while the boost output is working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqPolarity {
    /// IRQ is high while working (IP5306 default).
    #[default]
    ActiveHigh,
    /// IRQ is low while working (inverting level shifter on the board).
    ActiveLow,
}

impl IrqPolarity {
    /// Translate a sampled electrical level into "asserted".
    pub const fn is_asserted(self, is_high: bool) -> bool {
        match self {
            IrqPolarity::ActiveHigh => is_high,
            IrqPolarity::ActiveLow => !is_high,
        }
    }
}

/// Timing configuration of the [`PressStateMachine`](crate::PressStateMachine).
///
/// ```rust
/// use embassy_time::Duration;
/// use ip5306::PressConfig;
///
/// let config = PressConfig::default();
/// assert_eq!(config.pulse_width(), Duration::from_millis(120));
/// assert_eq!(config.guard_window(), Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressConfig {
    /// Short-press debounce threshold of the chip.
    pub short_press: Duration,
    /// Pulse width as a multiple of `short_press`.
    pub pulse_multiplier: u32,
    /// Gap between the pulses of a double press.
    pub inter_pulse_gap: Duration,
    /// Settling time after a mode change.
    pub quiet_period: Duration,
    /// Extra margin on top of `quiet_period`.
    pub quiet_margin: Duration,
    /// IRQ level while working.
    pub irq_polarity: IrqPolarity,
}

impl PressConfig {
    /// Low time of each emitted pulse.
    pub fn pulse_width(&self) -> Duration {
        Duration::from_ticks(
            self.short_press
                .as_ticks()
                .saturating_mul(u64::from(self.pulse_multiplier)),
        )
    }

    /// Time after a press during which `step` trusts the software estimate.
    pub fn guard_window(&self) -> Duration {
        Duration::from_ticks(
            self.quiet_period
                .as_ticks()
                .saturating_add(self.quiet_margin.as_ticks()),
        )
    }
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            short_press: SHORT_PRESS_THRESHOLD,
            pulse_multiplier: PULSE_MULTIPLIER,
            inter_pulse_gap: INTER_PULSE_GAP,
            quiet_period: STATE_CHANGE_QUIET_PERIOD,
            quiet_margin: STATE_CHANGE_MARGIN,
            irq_polarity: IrqPolarity::ActiveHigh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i2c_address_is_0x75() {
        assert_eq!(IP5306_I2C_ADDR, 0x75);
    }

    #[test]
    fn default_pulse_is_four_short_presses() {
        let config = PressConfig::default();
        assert_eq!(config.pulse_width(), Duration::from_millis(120));
        assert!(config.pulse_width() < LONG_PRESS_THRESHOLD);
    }

    #[test]
    fn default_guard_window_is_quiet_period_plus_margin() {
        assert_eq!(PressConfig::default().guard_window(), Duration::from_millis(1500));
    }

    #[test]
    fn irq_polarity_maps_levels() {
        assert!(IrqPolarity::ActiveHigh.is_asserted(true));
        assert!(!IrqPolarity::ActiveHigh.is_asserted(false));
        assert!(IrqPolarity::ActiveLow.is_asserted(false));
        assert!(!IrqPolarity::ActiveLow.is_asserted(true));
    }
}
