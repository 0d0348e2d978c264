//! KEY press emulation and operating-mode tracking.
//!
//! The IP5306 has no register that turns it on or off: the host has to press
//! its KEY input like a user would. A single short press wakes a sleeping
//! chip, two short presses within a second shut a working one down. After
//! either gesture the chip needs about a second to settle, during which the
//! IRQ line (high while the boost output is working) is not trustworthy.
//!
//! ```text
//!            step: IRQ deasserted                step: IRQ asserted
//!   Unknown ───────────────────────▶ Sleep ◀──────────────────────┐
//!      │                              │ wake_up()                  │
//!      │ step: IRQ asserted           ▼                            │
//!      │                          WakingUp ── guard elapsed, step ─┤
//!      ▼                                                           │
//!   Working ◀──────────────────────────────────────────────────────┘
//!      │ shutdown()
//!      ▼
//!   ShuttingDown ── guard elapsed, step ──▶ Sleep / Working
//! ```

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, InputPin, PinState};

use crate::config::PressConfig;
use crate::error::PressError;
use crate::gpio::{ButtonLine, LineMode, Monotonic};

/// Coarse estimate of what the IP5306 is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Not sampled yet.
    #[default]
    Unknown,
    /// Boost output off, chip asleep.
    Sleep,
    /// Boost output on.
    Working,
    /// Wake-up press sent, waiting for the chip to settle.
    WakingUp,
    /// Shutdown double press sent, waiting for the chip to settle.
    ShuttingDown,
}

impl OperatingMode {
    /// Short name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            OperatingMode::Unknown => "unknown",
            OperatingMode::Sleep => "asleep",
            OperatingMode::Working => "working",
            OperatingMode::WakingUp => "waking up",
            OperatingMode::ShuttingDown => "shutting down",
        }
    }

    /// Whether the mode is a press in flight whose outcome is not yet known.
    pub const fn is_transitional(self) -> bool {
        matches!(self, OperatingMode::WakingUp | OperatingMode::ShuttingDown)
    }
}

/// Emulated KEY gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressKind {
    /// One short press.
    WakeUp,
    /// Two short presses.
    Shutdown,
}

impl PressKind {
    /// Short name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            PressKind::WakeUp => "wake-up press",
            PressKind::Shutdown => "shutdown press",
        }
    }

    /// The only mode the gesture may be sent from.
    pub const fn allowed_from(self) -> OperatingMode {
        match self {
            PressKind::WakeUp => OperatingMode::Sleep,
            PressKind::Shutdown => OperatingMode::Working,
        }
    }

    /// Mode entered once the gesture has been sent.
    pub const fn pending_mode(self) -> OperatingMode {
        match self {
            PressKind::WakeUp => OperatingMode::WakingUp,
            PressKind::Shutdown => OperatingMode::ShuttingDown,
        }
    }

    /// Number of pulses in the gesture.
    pub const fn pulses(self) -> u8 {
        match self {
            PressKind::WakeUp => 1,
            PressKind::Shutdown => 2,
        }
    }
}

/// A mode change observed by [`PressStateMachine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeChange {
    /// Mode before the step.
    pub from: OperatingMode,
    /// Mode after the step.
    pub to: OperatingMode,
}

/// Drives the KEY line and tracks the IP5306 operating mode from IRQ.
///
/// - `L`: the KEY line ([`ButtonLine`])
/// - `P`: the IRQ input
/// - `D`: blocking delay used for pulse timing
/// - `C`: clock used to timestamp transitions
///
/// Presses block the caller for their whole duration (≈120 ms for a wake-up,
/// ≈340 ms for a shutdown with the default [`PressConfig`]).
pub struct PressStateMachine<L, P, D, C> {
    line: L,
    irq: P,
    delay: D,
    clock: C,
    config: PressConfig,
    mode: OperatingMode,
    last_change: Option<Instant>,
}

impl<L, P, D, C> PressStateMachine<L, P, D, C>
where
    L: ButtonLine,
    P: InputPin,
    D: DelayNs,
    C: Monotonic,
{
    /// State machine with the default timings. The mode starts
    /// [`Unknown`](OperatingMode::Unknown) until the first [`step`](Self::step).
    pub fn new(line: L, irq: P, delay: D, clock: C) -> Self {
        Self::with_config(line, irq, delay, clock, PressConfig::default())
    }

    /// State machine with explicit timings.
    pub fn with_config(line: L, irq: P, delay: D, clock: C, config: PressConfig) -> Self {
        Self {
            line,
            irq,
            delay,
            clock,
            config,
            mode: OperatingMode::Unknown,
            last_change: None,
        }
    }

    /// Current mode estimate.
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// When the mode last changed, if it ever did.
    pub fn last_change(&self) -> Option<Instant> {
        self.last_change
    }

    /// Timings in use.
    pub fn config(&self) -> &PressConfig {
        &self.config
    }

    /// Give the pins, delay and clock back.
    pub fn release(self) -> (L, P, D, C) {
        (self.line, self.irq, self.delay, self.clock)
    }

    /// Send a single short press to wake a sleeping chip.
    ///
    /// Only legal while [`Sleep`](OperatingMode::Sleep); otherwise nothing is
    /// driven and [`PressError::IllegalTransition`] is returned.
    pub fn wake_up(&mut self) -> Result<(), PressError> {
        self.press(PressKind::WakeUp)
    }

    /// Send a double short press to shut a working chip down.
    ///
    /// Only legal while [`Working`](OperatingMode::Working).
    pub fn shutdown(&mut self) -> Result<(), PressError> {
        self.press(PressKind::Shutdown)
    }

    /// [`step`](Self::step) at the clock's current instant.
    pub fn poll(&mut self) -> Result<Option<ModeChange>, PressError> {
        let now = self.clock.now();
        self.step(now)
    }

    /// Re-evaluate the mode at `now`.
    ///
    /// Within the guard window after a press the pending mode is kept and
    /// IRQ is not sampled. The window starts when the press has finished
    /// (at [`last_change`](Self::last_change)), not when it was requested:
    /// after [`shutdown`](Self::shutdown) that is ≈340 ms later with the
    /// default timings. Otherwise IRQ decides: asserted is
    /// [`Working`](OperatingMode::Working), deasserted is
    /// [`Sleep`](OperatingMode::Sleep).
    pub fn step(&mut self, now: Instant) -> Result<Option<ModeChange>, PressError> {
        if self.in_guard_window(now) {
            return Ok(None);
        }

        let is_high = self.irq.is_high().map_err(|e| PressError::Pin(e.kind()))?;
        let next = if self.config.irq_polarity.is_asserted(is_high) {
            OperatingMode::Working
        } else {
            OperatingMode::Sleep
        };

        if next == self.mode {
            return Ok(None);
        }
        let change = ModeChange {
            from: self.mode,
            to: next,
        };
        info!("IP5306 mode {} -> {}", change.from.name(), change.to.name());
        self.mode = next;
        self.last_change = Some(now);
        Ok(Some(change))
    }

    fn in_guard_window(&self, now: Instant) -> bool {
        if !self.mode.is_transitional() {
            return false;
        }
        let Some(since) = self.last_change else {
            return false;
        };
        let elapsed = now
            .checked_duration_since(since)
            .unwrap_or(Duration::from_ticks(0));
        elapsed < self.config.guard_window()
    }

    fn press(&mut self, kind: PressKind) -> Result<(), PressError> {
        if self.mode != kind.allowed_from() {
            warn!("IP5306 {} refused while {}", kind.name(), self.mode.name());
            return Err(PressError::IllegalTransition {
                from: self.mode,
                requested: kind,
            });
        }

        debug!("IP5306 sending {}", kind.name());
        for pulse in 0..kind.pulses() {
            if pulse > 0 {
                let gap = self.config.inter_pulse_gap;
                self.pause(gap);
            }
            self.pulse()?;
        }

        self.mode = kind.pending_mode();
        self.last_change = Some(self.clock.now());
        info!(
            "IP5306 mode {} -> {}",
            kind.allowed_from().name(),
            kind.pending_mode().name()
        );
        Ok(())
    }

    /// One low pulse on the KEY line, released to floating afterwards even if
    /// driving it failed.
    fn pulse(&mut self) -> Result<(), PressError> {
        let width = self.config.pulse_width();
        let driven = self
            .line
            .set_mode(LineMode::PushPull)
            .and_then(|()| self.line.set_level(PinState::Low));
        if driven.is_ok() {
            self.pause(width);
        }
        let released = self.line.set_mode(LineMode::Floating);
        driven.and(released).map_err(|e| {
            error!("IP5306 KEY line failed");
            PressError::Pin(e.kind())
        })
    }

    fn pause(&mut self, duration: Duration) {
        let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        self.delay.delay_ms(ms);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::config::IrqPolarity;
    use crate::mocks::{Event, Timeline};

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn first_step_leaves_unknown() {
        let timeline = Timeline::new();
        timeline.set_irq(false);
        let mut machine = timeline.press_state_machine();

        let change = machine.step(at(0)).unwrap();
        assert_eq!(
            change,
            Some(ModeChange {
                from: OperatingMode::Unknown,
                to: OperatingMode::Sleep
            })
        );
        assert_eq!(machine.last_change(), Some(at(0)));
        // nothing new on a second identical sample
        assert_eq!(machine.step(at(10)).unwrap(), None);
        assert_eq!(machine.last_change(), Some(at(0)));
    }

    #[test]
    fn wake_up_drives_one_pulse() {
        let timeline = Timeline::new();
        let mut machine = timeline.press_state_machine();
        machine.step(at(0)).unwrap();
        timeline.clear_events();

        machine.wake_up().unwrap();
        assert_eq!(machine.mode(), OperatingMode::WakingUp);
        assert_eq!(
            timeline.events(),
            vec![
                Event::Mode(LineMode::PushPull),
                Event::Level(PinState::Low),
                Event::Delay(Duration::from_millis(120)),
                Event::Mode(LineMode::Floating),
            ]
        );
        // timestamp taken after the pulse
        assert_eq!(machine.last_change(), Some(at(120)));
    }

    #[test]
    fn wake_up_refused_unless_asleep() {
        let timeline = Timeline::new();
        let mut machine = timeline.press_state_machine();

        let err = machine.wake_up().unwrap_err();
        assert_eq!(
            err,
            PressError::IllegalTransition {
                from: OperatingMode::Unknown,
                requested: PressKind::WakeUp
            }
        );
        timeline.set_irq(true);
        machine.step(at(0)).unwrap();
        assert!(machine.wake_up().is_err());
        assert!(timeline.line_events().is_empty());
    }

    #[test]
    fn shutdown_drives_two_pulses_with_gap() {
        let timeline = Timeline::new();
        timeline.set_irq(true);
        let mut machine = timeline.press_state_machine();
        machine.step(at(0)).unwrap();
        timeline.clear_events();

        machine.shutdown().unwrap();
        assert_eq!(machine.mode(), OperatingMode::ShuttingDown);
        let pulse = [
            Event::Mode(LineMode::PushPull),
            Event::Level(PinState::Low),
            Event::Delay(Duration::from_millis(120)),
            Event::Mode(LineMode::Floating),
        ];
        let mut expected = pulse.to_vec();
        expected.push(Event::Delay(Duration::from_millis(100)));
        expected.extend_from_slice(&pulse);
        assert_eq!(timeline.events(), expected);
        assert_eq!(machine.last_change(), Some(at(340)));
    }

    #[test]
    fn shutdown_refused_unless_working() {
        let timeline = Timeline::new();
        let mut machine = timeline.press_state_machine();
        machine.step(at(0)).unwrap();
        assert_eq!(
            machine.shutdown(),
            Err(PressError::IllegalTransition {
                from: OperatingMode::Sleep,
                requested: PressKind::Shutdown
            })
        );
        assert!(timeline.line_events().is_empty());
    }

    #[test]
    fn guard_window_holds_pending_mode() {
        let timeline = Timeline::new();
        let mut machine = timeline.press_state_machine();
        machine.step(at(0)).unwrap();
        machine.wake_up().unwrap();
        let pressed_at = machine.last_change().unwrap();
        timeline.set_irq(true);
        timeline.clear_events();

        assert_eq!(machine.step(pressed_at + Duration::from_millis(1499)).unwrap(), None);
        assert_eq!(machine.mode(), OperatingMode::WakingUp);
        assert!(timeline.events().is_empty(), "IRQ sampled inside the guard window");

        let change = machine.step(pressed_at + Duration::from_millis(1500)).unwrap();
        assert_eq!(
            change,
            Some(ModeChange {
                from: OperatingMode::WakingUp,
                to: OperatingMode::Working
            })
        );
    }

    #[test]
    fn step_before_press_timestamp_counts_as_no_time() {
        let timeline = Timeline::new();
        timeline.advance(Duration::from_millis(5_000));
        let mut machine = timeline.press_state_machine();
        machine.step(at(5_000)).unwrap();
        machine.wake_up().unwrap();

        assert_eq!(machine.step(at(0)).unwrap(), None);
        assert_eq!(machine.mode(), OperatingMode::WakingUp);
    }

    #[test]
    fn active_low_irq_is_inverted() {
        let timeline = Timeline::new();
        timeline.set_irq(false);
        let config = PressConfig {
            irq_polarity: IrqPolarity::ActiveLow,
            ..PressConfig::default()
        };
        let mut machine = PressStateMachine::with_config(
            timeline.button_line(),
            timeline.irq_pin(),
            timeline.delay(),
            timeline.clock(),
            config,
        );
        machine.step(at(0)).unwrap();
        assert_eq!(machine.mode(), OperatingMode::Working);
    }

    #[test]
    fn failed_drive_still_releases_line() {
        let timeline = Timeline::new();
        let mut machine = timeline.press_state_machine();
        machine.step(at(0)).unwrap();
        timeline.fail_level_writes(true);
        timeline.clear_events();

        let err = machine.wake_up().unwrap_err();
        assert!(matches!(err, PressError::Pin(_)));
        assert_eq!(machine.mode(), OperatingMode::Sleep);
        assert_eq!(
            timeline.events(),
            vec![Event::Mode(LineMode::PushPull), Event::Mode(LineMode::Floating)]
        );
    }

    #[test]
    fn guard_window_counts_from_end_of_shutdown() {
        let timeline = Timeline::new();
        timeline.set_irq(true);
        let mut machine = timeline.press_state_machine();
        machine.step(at(0)).unwrap();

        machine.shutdown().unwrap();
        timeline.set_irq(false);
        // 1500 ms after the call, but only 1160 ms after the last pulse
        assert_eq!(machine.step(at(1500)).unwrap(), None);
        assert_eq!(machine.mode(), OperatingMode::ShuttingDown);
        assert_eq!(
            machine.step(at(340 + 1500)).unwrap(),
            Some(ModeChange {
                from: OperatingMode::ShuttingDown,
                to: OperatingMode::Sleep
            })
        );
    }

    fn pulse_events() -> [Event; 4] {
        [
            Event::Mode(LineMode::PushPull),
            Event::Level(PinState::Low),
            Event::Delay(Duration::from_millis(120)),
            Event::Mode(LineMode::Floating),
        ]
    }

    #[test]
    fn working_shutdown_sleep_wake_cycle() {
        let timeline = Timeline::new();
        let mut machine = timeline.press_state_machine();

        // Unknown -> Working on the first sample.
        timeline.set_irq(true);
        assert_eq!(
            machine.poll().unwrap(),
            Some(ModeChange {
                from: OperatingMode::Unknown,
                to: OperatingMode::Working
            })
        );
        assert_eq!(machine.poll().unwrap(), None);

        // Double press.
        timeline.clear_events();
        machine.shutdown().unwrap();
        let mut expected = pulse_events().to_vec();
        expected.push(Event::Delay(Duration::from_millis(100)));
        expected.extend(pulse_events());
        assert_eq!(timeline.events(), expected);
        assert_eq!(machine.mode(), OperatingMode::ShuttingDown);

        // Still settling: IRQ already low but not trusted yet.
        timeline.set_irq(false);
        timeline.clear_events();
        timeline.advance(Duration::from_millis(600));
        assert_eq!(machine.poll().unwrap(), None);
        assert_eq!(machine.mode(), OperatingMode::ShuttingDown);
        assert!(timeline.events().is_empty());

        // Past the 1500 ms guard window.
        timeline.advance(Duration::from_millis(1000));
        assert_eq!(
            machine.poll().unwrap(),
            Some(ModeChange {
                from: OperatingMode::ShuttingDown,
                to: OperatingMode::Sleep
            })
        );
        assert_eq!(machine.last_change(), Some(timeline.now()));

        // A second shutdown is refused and drives nothing.
        timeline.clear_events();
        assert_eq!(
            machine.shutdown(),
            Err(PressError::IllegalTransition {
                from: OperatingMode::Sleep,
                requested: PressKind::Shutdown
            })
        );
        assert!(timeline.line_events().is_empty());

        // Wake it back up.
        machine.wake_up().unwrap();
        assert_eq!(timeline.line_events().len(), 3);
        timeline.set_irq(true);
        timeline.advance(Duration::from_millis(1500));
        assert_eq!(
            machine.poll().unwrap(),
            Some(ModeChange {
                from: OperatingMode::WakingUp,
                to: OperatingMode::Working
            })
        );
    }

    #[test]
    fn press_that_did_not_take_falls_back_to_sampled_mode() {
        let timeline = Timeline::new();
        let mut machine = timeline.press_state_machine();
        machine.poll().unwrap();
        assert_eq!(machine.mode(), OperatingMode::Sleep);

        // IRQ never rises: after the guard window the machine goes back to Sleep.
        machine.wake_up().unwrap();
        timeline.advance(Duration::from_millis(1500));
        assert_eq!(
            machine.poll().unwrap(),
            Some(ModeChange {
                from: OperatingMode::WakingUp,
                to: OperatingMode::Sleep
            })
        );
    }
}
