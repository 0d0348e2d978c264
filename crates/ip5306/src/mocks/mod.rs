//! Mock implementations for testing
//!
//! All mocks created from one [`Timeline`] share a simulated clock, the IRQ
//! level and an ordered event log, so a test can assert the exact sequence
//! of line changes and delays a press produced. [`MockDelay`] advances the
//! shared clock instead of sleeping.
//!
//! The I²C side is covered by `embedded-hal-mock`; these mocks only stand in
//! for the press state machine's collaborators.

#![cfg(any(test, feature = "std"))]

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, PinState};

use crate::gpio::{ButtonLine, LineMode, Monotonic};
use crate::press::PressStateMachine;

/// Something a mock observed, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// KEY line mode change.
    Mode(LineMode),
    /// KEY line level change.
    Level(PinState),
    /// Blocking delay.
    Delay(Duration),
    /// IRQ sampled, with the level read.
    IrqSampled(bool),
}

impl Event {
    /// Whether the event touched the KEY line.
    pub fn is_line_event(&self) -> bool {
        matches!(self, Event::Mode(_) | Event::Level(_))
    }
}

#[derive(Debug)]
struct State {
    now: Instant,
    irq_high: bool,
    fail_level_writes: bool,
    events: Vec<Event>,
}

/// Shared simulated world for the mocks.
#[derive(Debug, Clone)]
pub struct Timeline {
    state: Rc<RefCell<State>>,
}

impl Timeline {
    /// Clock at zero, IRQ low, empty log.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                now: Instant::from_ticks(0),
                irq_high: false,
                fail_level_writes: false,
                events: Vec::new(),
            })),
        }
    }

    /// KEY line mock.
    pub fn button_line(&self) -> MockButtonLine {
        MockButtonLine {
            timeline: self.clone(),
        }
    }

    /// IRQ pin mock.
    pub fn irq_pin(&self) -> MockIrqPin {
        MockIrqPin {
            timeline: self.clone(),
        }
    }

    /// Delay mock.
    pub fn delay(&self) -> MockDelay {
        MockDelay {
            timeline: self.clone(),
        }
    }

    /// Clock mock.
    pub fn clock(&self) -> MockClock {
        MockClock {
            timeline: self.clone(),
        }
    }

    /// State machine wired to this timeline with default timings.
    pub fn press_state_machine(
        &self,
    ) -> PressStateMachine<MockButtonLine, MockIrqPin, MockDelay, MockClock> {
        PressStateMachine::new(self.button_line(), self.irq_pin(), self.delay(), self.clock())
    }

    /// Set the IRQ level.
    pub fn set_irq(&self, high: bool) {
        self.state.borrow_mut().irq_high = high;
    }

    /// Make every `set_level` call fail with [`ErrorKind::Other`].
    pub fn fail_level_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_level_writes = fail;
    }

    /// Current simulated instant.
    pub fn now(&self) -> Instant {
        self.state.borrow().now
    }

    /// Move the simulated clock forward.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.borrow_mut();
        state.now = state.now.checked_add(by).unwrap_or(state.now);
    }

    /// Events so far.
    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// KEY line events so far.
    pub fn line_events(&self) -> Vec<Event> {
        self.state
            .borrow()
            .events
            .iter()
            .copied()
            .filter(Event::is_line_event)
            .collect()
    }

    /// Forget the logged events.
    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    fn record(&self, event: Event) {
        self.state.borrow_mut().events.push(event);
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock KEY line
#[derive(Debug, Clone)]
pub struct MockButtonLine {
    timeline: Timeline,
}

impl ErrorType for MockButtonLine {
    type Error = ErrorKind;
}

impl ButtonLine for MockButtonLine {
    fn set_mode(&mut self, mode: LineMode) -> Result<(), Self::Error> {
        self.timeline.record(Event::Mode(mode));
        Ok(())
    }

    fn set_level(&mut self, level: PinState) -> Result<(), Self::Error> {
        if self.timeline.state.borrow().fail_level_writes {
            return Err(ErrorKind::Other);
        }
        self.timeline.record(Event::Level(level));
        Ok(())
    }
}

/// Mock IRQ input
#[derive(Debug, Clone)]
pub struct MockIrqPin {
    timeline: Timeline,
}

impl ErrorType for MockIrqPin {
    type Error = ErrorKind;
}

impl InputPin for MockIrqPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let high = self.timeline.state.borrow().irq_high;
        self.timeline.record(Event::IrqSampled(high));
        Ok(high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Mock delay that advances the shared clock
#[derive(Debug, Clone)]
pub struct MockDelay {
    timeline: Timeline,
}

impl MockDelay {
    fn sleep(&mut self, duration: Duration) {
        self.timeline.record(Event::Delay(duration));
        self.timeline.advance(duration);
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        self.sleep(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Mock clock reading the shared simulated instant
#[derive(Debug, Clone)]
pub struct MockClock {
    timeline: Timeline,
}

impl Monotonic for MockClock {
    fn now(&self) -> Instant {
        self.timeline.now()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn delay_advances_shared_clock() {
        let timeline = Timeline::new();
        let mut delay = timeline.delay();
        let clock = timeline.clock();

        delay.delay_ms(120);
        assert_eq!(clock.now(), Instant::from_millis(120));
        assert_eq!(timeline.events(), vec![Event::Delay(Duration::from_millis(120))]);
    }

    #[test]
    fn irq_level_is_shared() {
        let timeline = Timeline::new();
        let mut irq = timeline.irq_pin();
        assert!(irq.is_low().unwrap_or(false));
        timeline.set_irq(true);
        assert!(irq.is_high().unwrap_or(false));
        assert!(timeline.line_events().is_empty());
    }

    #[test]
    fn failing_level_write_is_not_logged() {
        let timeline = Timeline::new();
        let mut line = timeline.button_line();
        timeline.fail_level_writes(true);
        assert_eq!(line.set_level(PinState::Low), Err(ErrorKind::Other));
        assert!(line.set_mode(LineMode::Floating).is_ok());
        assert_eq!(timeline.line_events(), vec![Event::Mode(LineMode::Floating)]);
    }
}
