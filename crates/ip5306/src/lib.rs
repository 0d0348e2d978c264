//! Driver for the IP5306 power-bank SoC.
//!
//! The IP5306 is a single-cell Li-ion charger / 5 V boost converter that is
//! only reachable over I²C (7-bit address `0x75`) plus a KEY input and an
//! IRQ output. This crate provides:
//!
//! - [`codec`]: pure decode/encode of the register bytes into typed fields,
//!   including the weighted-bit charging current ([`ChargingCurrent`]).
//! - [`Ip5306`]: grouped, partial read/modify/write of the System Control,
//!   Charger Control and Status register groups over any
//!   [`embedded_hal::i2c::I2c`] bus, retaining the raw bytes so unrelated
//!   bits are never clobbered.
//! - [`PressStateMachine`]: KEY press emulation (single pulse to wake,
//!   double pulse to shut down) and a coarse operating-mode estimate derived
//!   from the IRQ line.
//!
//! # Architecture
//!
//! ```text
//! Application
//!     ├── PressStateMachine ── ButtonLine + InputPin (IRQ) + DelayNs + Monotonic
//!     └── Ip5306 (DeviceController) ── I2c
//!             └── codec (pure, no I/O)
//! ```
//!
//! # Features
//!
//! - `std`: `std::error::Error` impls and the [`mocks`] module
//! - `defmt`: `defmt::Format` derives, diagnostics via defmt
//! - `tracing`: diagnostics via `tracing` (host builds)
//!
//! # Example
//!
//! ```no_run
//! use ip5306::{Ip5306, RegisterMask, ChargingCurrent};
//! # fn example<I: embedded_hal::i2c::I2c>(i2c: I) -> Result<(), ip5306::Error<I::Error>> {
//! let mut pmic = Ip5306::new(i2c);
//!
//! let sys = pmic.read_system_control(RegisterMask::SYS_CTL_ALL)?;
//! if let Some(ctl0) = sys.ctl0 {
//!     let _boost_on = ctl0.boost_enable;
//! }
//!
//! pmic.set_charging_current(ChargingCurrent::from_milliamps(1050)?)?;
//! # Ok(())
//! # }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)]
// Pedantic lints suppressed for this driver crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::struct_excessive_bools)] // register views are bags of flags

#[macro_use]
mod diag;

pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod gpio;
pub mod press;
pub mod registers;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use codec::{
    BatteryVoltage, BoostOffTrigger, ChargeFullStop, ChargerControl, ChargingCurrent,
    ConstantVoltageBoost, CurrentLoop, EndCurrentDetection, FlashlightTrigger, GroupFields,
    KeyEvents, LightLoadShutdownTime, RegisterFields, Status, SystemControl, UndervoltageLoop,
    WritableFields,
};
pub use config::{IrqPolarity, PressConfig, IP5306_I2C_ADDR};
pub use device::Ip5306;
pub use error::{CurrentError, Error, InvalidField, PressError};
pub use gpio::{ButtonLine, EmbassyClock, LineMode, Monotonic};
pub use press::{ModeChange, OperatingMode, PressKind, PressStateMachine};
pub use registers::{Register, RegisterGroup, RegisterMask};
