//! Pure register codec: raw bytes ⇄ typed fields.
//!
//! Every sub-register has a view type implementing [`RegisterFields`];
//! the host-writable ones also implement [`WritableFields`]. Decoding reads the field bits out of a raw byte; encoding takes the
//! *retained* raw byte of the last read and rewrites only the bits owned by
//! the view's fields, so reserved and unrelated bits survive verbatim.
//!
//! ```text
//! raw byte ──decode──▶ view ──(caller edits)──▶ view ──encode(retained)──▶ raw byte
//! ```
//!
//! Nothing in here touches the bus.

use crate::error::{CurrentError, InvalidField};
use crate::registers::{Register, RegisterGroup};

// ── Bit helpers ──────────────────────────────────────────────────────────────

/// Mask of `width` low bits. `width` is at most 8.
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
const fn low_mask(width: u8) -> u8 {
    ((1u16 << width) - 1) as u8
}

/// Right-aligned value of bits `[offset, offset + width)`.
#[allow(clippy::arithmetic_side_effects)]
pub const fn field_bits(raw: u8, offset: u8, width: u8) -> u8 {
    (raw >> offset) & low_mask(width)
}

/// `raw` with bits `[offset, offset + width)` replaced by `value`.
///
/// Bits of `value` above `width` are discarded; all other bits of `raw` are
/// returned unchanged.
#[allow(clippy::arithmetic_side_effects)]
pub const fn with_field_bits(raw: u8, offset: u8, width: u8, value: u8) -> u8 {
    let mask = low_mask(width) << offset;
    (raw & !mask) | ((value << offset) & mask)
}

/// Single-bit flag at `bit`.
pub const fn flag(raw: u8, bit: u8) -> bool {
    field_bits(raw, bit, 1) != 0
}

/// `raw` with the flag at `bit` set or cleared.
pub const fn with_flag(raw: u8, bit: u8, on: bool) -> u8 {
    with_field_bits(raw, bit, 1, on as u8)
}

fn decode_enum<T>(register: Register, raw: u8, offset: u8, width: u8) -> Result<T, InvalidField>
where
    T: TryFrom<u8, Error = u8>,
{
    T::try_from(field_bits(raw, offset, width)).map_err(|bits| InvalidField { register, bits })
}

// ── Enumerated fields ────────────────────────────────────────────────────────

/// Declares a closed enumeration stored in a `width`-bit field, with an
/// exhaustive mapping to and from the bit pattern.
macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $width:literal bits {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Field width in bits.
            pub const WIDTH: u8 = $width;

            /// Every variant.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl TryFrom<u8> for $name {
            type Error = u8;

            fn try_from(bits: u8) -> Result<Self, Self::Error> {
                match bits {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(bits),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }
    };
}

field_enum! {
    /// KEY gesture that turns the boost output off (SYS_CTL1 bit 7).
    BoostOffTrigger: 1 bits {
        /// Two short presses.
        ShortPressTwice = 0,
        /// One long press.
        LongPress = 1,
    }
}

field_enum! {
    /// KEY gesture that toggles the WLED flashlight (SYS_CTL1 bit 6).
    FlashlightTrigger: 1 bits {
        /// One long press.
        LongPress = 0,
        /// Two short presses.
        ShortPressTwice = 1,
    }
}

field_enum! {
    /// Light-load automatic shutdown delay (SYS_CTL2 bits 3..2).
    LightLoadShutdownTime: 2 bits {
        /// 8 s
        Sec8 = 0,
        /// 32 s
        Sec32 = 1,
        /// 16 s
        Sec16 = 2,
        /// 64 s
        Sec64 = 3,
    }
}

impl LightLoadShutdownTime {
    /// Delay in seconds.
    pub const fn seconds(self) -> u8 {
        match self {
            Self::Sec8 => 8,
            Self::Sec16 => 16,
            Self::Sec32 => 32,
            Self::Sec64 => 64,
        }
    }
}

field_enum! {
    /// Charge-full stop voltage for a 4.2 V cell (Charger_CTL0 bits 1..0).
    ///
    /// The same code maps to proportionally higher levels for 4.3/4.35/4.4 V
    /// cells. 4.14 V or 4.17 V is recommended.
    ChargeFullStop: 2 bits {
        /// 4.14 V
        Mv4140 = 0,
        /// 4.17 V
        Mv4170 = 1,
        /// 4.185 V
        Mv4185 = 2,
        /// 4.2 V
        Mv4200 = 3,
    }
}

field_enum! {
    /// Battery-side end-of-charge current (Charger_CTL1 bits 7..6).
    EndCurrentDetection: 2 bits {
        /// 200 mA
        Ma200 = 0,
        /// 400 mA
        Ma400 = 1,
        /// 500 mA
        Ma500 = 2,
        /// 600 mA
        Ma600 = 3,
    }
}

impl EndCurrentDetection {
    /// Threshold in mA.
    pub const fn milliamps(self) -> u16 {
        match self {
            Self::Ma200 => 200,
            Self::Ma400 => 400,
            Self::Ma500 => 500,
            Self::Ma600 => 600,
        }
    }
}

field_enum! {
    /// VOUT level below which the charger backs off its current
    /// (Charger_CTL1 bits 4..2).
    UndervoltageLoop: 3 bits {
        /// 4.45 V
        Mv4450 = 0,
        /// 4.5 V
        Mv4500 = 1,
        /// 4.55 V
        Mv4550 = 2,
        /// 4.6 V
        Mv4600 = 3,
        /// 4.65 V
        Mv4650 = 4,
        /// 4.7 V
        Mv4700 = 5,
        /// 4.75 V
        Mv4750 = 6,
        /// 4.8 V
        Mv4800 = 7,
    }
}

impl UndervoltageLoop {
    /// Threshold in mV.
    #[allow(clippy::arithmetic_side_effects)] // at most 4450 + 7 * 50
    pub const fn millivolts(self) -> u16 {
        4450 + (self as u16) * 50
    }
}

field_enum! {
    /// Cell chemistry full voltage (Charger_CTL2 bits 3..2).
    BatteryVoltage: 2 bits {
        /// 4.2 V
        Mv4200 = 0,
        /// 4.3 V
        Mv4300 = 1,
        /// 4.35 V
        Mv4350 = 2,
        /// 4.4 V
        Mv4400 = 3,
    }
}

impl BatteryVoltage {
    /// Nominal full voltage in mV.
    pub const fn millivolts(self) -> u16 {
        match self {
            Self::Mv4200 => 4200,
            Self::Mv4300 => 4300,
            Self::Mv4350 => 4350,
            Self::Mv4400 => 4400,
        }
    }
}

field_enum! {
    /// Constant-voltage phase overshoot (Charger_CTL2 bits 1..0).
    ///
    /// 28 mV is recommended for 4.2 V cells, 14 mV for the others.
    ConstantVoltageBoost: 2 bits {
        /// No boost.
        None = 0,
        /// +14 mV
        Mv14 = 1,
        /// +28 mV
        Mv28 = 2,
        /// +42 mV
        Mv42 = 3,
    }
}

field_enum! {
    /// Which side the constant-current loop regulates (Charger_CTL3 bit 5).
    CurrentLoop: 1 bits {
        /// Battery-side current.
        Battery = 0,
        /// VIN-side current.
        Vin = 1,
    }
}

// ── Charging current ─────────────────────────────────────────────────────────

/// VIN-side charging current, CHG_DIG_CTL0 bits 4..0.
///
/// The field is not a linear scale: each bit contributes a fixed weight on
/// top of a 50 mA base.
///
/// | bit | 4    | 3   | 2   | 1   | 0   |
/// |-----|------|-----|-----|-----|-----|
/// | mA  | 1600 | 800 | 400 | 200 | 100 |
///
/// ```rust
/// use ip5306::ChargingCurrent;
///
/// let current = ChargingCurrent::from_milliamps(750).unwrap();
/// assert_eq!(current.bits(), 0b00111);
/// assert_eq!(ChargingCurrent::from_bits(0b11111).milliamps(), 3150);
/// assert!(ChargingCurrent::from_milliamps(760).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct ChargingCurrent(u16);

impl ChargingCurrent {
    /// Current with every weight bit clear.
    pub const BASE_MA: u16 = 50;
    /// Weight of the lowest bit; every legal value is `BASE_MA + k × STEP_MA`.
    pub const STEP_MA: u16 = 100;
    /// Lowest encodable current.
    pub const MIN: Self = Self(50);
    /// Highest encodable current.
    pub const MAX: Self = Self(3150);
    /// Field width in bits.
    pub const WIDTH: u8 = 5;

    /// `(bit, weight)` pairs, heaviest first.
    const WEIGHTS: [(u8, u16); 5] = [(4, 1600), (3, 800), (2, 400), (1, 200), (0, 100)];

    /// Validate a current in mA.
    ///
    /// # Errors
    ///
    /// [`CurrentError::OutOfRange`] outside 50..=3150 mA,
    /// [`CurrentError::OffGrid`] when not `50 + k × 100` mA.
    #[allow(clippy::arithmetic_side_effects)] // range checked first
    pub const fn from_milliamps(milliamps: u16) -> Result<Self, CurrentError> {
        if milliamps < Self::MIN.0 || milliamps > Self::MAX.0 {
            return Err(CurrentError::OutOfRange { milliamps });
        }
        if (milliamps - Self::BASE_MA) % Self::STEP_MA != 0 {
            return Err(CurrentError::OffGrid { milliamps });
        }
        Ok(Self(milliamps))
    }

    /// Decode the five weight bits (bits above 4 are ignored).
    #[allow(clippy::arithmetic_side_effects)] // max 50 + 3100
    pub fn from_bits(bits: u8) -> Self {
        let sum = Self::WEIGHTS
            .iter()
            .filter(|(bit, _)| flag(bits, *bit))
            .map(|(_, weight)| *weight)
            .sum::<u16>();
        Self(Self::BASE_MA + sum)
    }

    /// Greedy decomposition into the five weight bits.
    ///
    /// Starting from `current - 50`, each weight from 1600 down to 100 is
    /// taken when the remainder still covers it. Exact for every value
    /// accepted by [`from_milliamps`](Self::from_milliamps).
    pub fn bits(self) -> u8 {
        let mut remainder = self.0.saturating_sub(Self::BASE_MA);
        let mut bits = 0;
        for (bit, weight) in Self::WEIGHTS {
            if remainder >= weight {
                bits = with_flag(bits, bit, true);
                remainder = remainder.saturating_sub(weight);
            }
        }
        bits
    }

    /// Current in mA.
    pub const fn milliamps(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for ChargingCurrent {
    type Error = CurrentError;

    fn try_from(milliamps: u16) -> Result<Self, Self::Error> {
        Self::from_milliamps(milliamps)
    }
}

impl From<ChargingCurrent> for u16 {
    fn from(current: ChargingCurrent) -> u16 {
        current.milliamps()
    }
}

// ── Sub-register views ───────────────────────────────────────────────────────

/// Typed view of one sub-register.
pub trait RegisterFields: Sized + Copy {
    /// Sub-register this view decodes.
    const REGISTER: Register;

    /// Extract the fields from a raw byte.
    ///
    /// # Errors
    ///
    /// [`InvalidField`] when a field value has no named variant.
    fn decode(raw: u8) -> Result<Self, InvalidField>;
}

/// View of a sub-register the host may write.
pub trait WritableFields: RegisterFields {
    /// Merge the fields into `retained`, changing only their bits.
    fn encode(&self, retained: u8) -> u8;

    /// Byte the sub-register holds once `written` has landed over `retained`.
    fn held_after_write(_retained: u8, written: u8) -> u8 {
        written
    }
}

/// SYS_CTL0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SysCtl0 {
    /// Boost (5 V output) enable. While disabled the chip cannot shut down
    /// on light load; only a double press puts it to sleep.
    pub boost_enable: bool,
    /// Charger enable. Toggle off/on to restart a finished charge without
    /// unplugging VIN.
    pub charger_enable: bool,
    /// Power on automatically when a load is plugged in.
    pub auto_power_on: bool,
    /// Keep the boost output on regardless of load.
    pub output_normally_open: bool,
    /// Allow the KEY to shut the chip down.
    pub key_shutdown_enable: bool,
}

impl SysCtl0 {
    const BOOST_ENABLE: u8 = 5;
    const CHARGER_ENABLE: u8 = 4;
    const AUTO_POWER_ON: u8 = 2;
    const OUTPUT_NORMALLY_OPEN: u8 = 1;
    const KEY_SHUTDOWN_ENABLE: u8 = 0;
}

impl RegisterFields for SysCtl0 {
    const REGISTER: Register = Register::SysCtl0;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self {
            boost_enable: flag(raw, Self::BOOST_ENABLE),
            charger_enable: flag(raw, Self::CHARGER_ENABLE),
            auto_power_on: flag(raw, Self::AUTO_POWER_ON),
            output_normally_open: flag(raw, Self::OUTPUT_NORMALLY_OPEN),
            key_shutdown_enable: flag(raw, Self::KEY_SHUTDOWN_ENABLE),
        })
    }
}

impl WritableFields for SysCtl0 {
    fn encode(&self, retained: u8) -> u8 {
        let raw = with_flag(retained, Self::BOOST_ENABLE, self.boost_enable);
        let raw = with_flag(raw, Self::CHARGER_ENABLE, self.charger_enable);
        let raw = with_flag(raw, Self::AUTO_POWER_ON, self.auto_power_on);
        let raw = with_flag(raw, Self::OUTPUT_NORMALLY_OPEN, self.output_normally_open);
        with_flag(raw, Self::KEY_SHUTDOWN_ENABLE, self.key_shutdown_enable)
    }
}

/// SYS_CTL1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SysCtl1 {
    /// Gesture that turns the boost off.
    pub boost_off_trigger: BoostOffTrigger,
    /// Gesture that toggles the flashlight.
    pub flashlight_trigger: FlashlightTrigger,
    /// A short press toggles the boost.
    pub short_press_switch_boost: bool,
    /// Re-enable the boost when VIN is unplugged.
    pub boost_after_vin_unplug: bool,
    /// Shut down at 3.0 V battery.
    pub batlow_3v0_shutdown: bool,
}

impl SysCtl1 {
    const BOOST_OFF_TRIGGER: u8 = 7;
    const FLASHLIGHT_TRIGGER: u8 = 6;
    const SHORT_PRESS_SWITCH_BOOST: u8 = 5;
    const BOOST_AFTER_VIN_UNPLUG: u8 = 2;
    const BATLOW_3V0_SHUTDOWN: u8 = 0;
}

impl RegisterFields for SysCtl1 {
    const REGISTER: Register = Register::SysCtl1;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self {
            boost_off_trigger: decode_enum(
                Self::REGISTER,
                raw,
                Self::BOOST_OFF_TRIGGER,
                BoostOffTrigger::WIDTH,
            )?,
            flashlight_trigger: decode_enum(
                Self::REGISTER,
                raw,
                Self::FLASHLIGHT_TRIGGER,
                FlashlightTrigger::WIDTH,
            )?,
            short_press_switch_boost: flag(raw, Self::SHORT_PRESS_SWITCH_BOOST),
            boost_after_vin_unplug: flag(raw, Self::BOOST_AFTER_VIN_UNPLUG),
            batlow_3v0_shutdown: flag(raw, Self::BATLOW_3V0_SHUTDOWN),
        })
    }
}

impl WritableFields for SysCtl1 {
    fn encode(&self, retained: u8) -> u8 {
        let raw = with_field_bits(
            retained,
            Self::BOOST_OFF_TRIGGER,
            BoostOffTrigger::WIDTH,
            self.boost_off_trigger.into(),
        );
        let raw = with_field_bits(
            raw,
            Self::FLASHLIGHT_TRIGGER,
            FlashlightTrigger::WIDTH,
            self.flashlight_trigger.into(),
        );
        let raw = with_flag(raw, Self::SHORT_PRESS_SWITCH_BOOST, self.short_press_switch_boost);
        let raw = with_flag(raw, Self::BOOST_AFTER_VIN_UNPLUG, self.boost_after_vin_unplug);
        with_flag(raw, Self::BATLOW_3V0_SHUTDOWN, self.batlow_3v0_shutdown)
    }
}

/// SYS_CTL2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SysCtl2 {
    /// Light-load shutdown delay.
    pub light_load_shutdown_time: LightLoadShutdownTime,
}

impl SysCtl2 {
    const LIGHT_LOAD_SHUTDOWN_TIME: u8 = 2;
}

impl RegisterFields for SysCtl2 {
    const REGISTER: Register = Register::SysCtl2;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self {
            light_load_shutdown_time: decode_enum(
                Self::REGISTER,
                raw,
                Self::LIGHT_LOAD_SHUTDOWN_TIME,
                LightLoadShutdownTime::WIDTH,
            )?,
        })
    }
}

impl WritableFields for SysCtl2 {
    fn encode(&self, retained: u8) -> u8 {
        with_field_bits(
            retained,
            Self::LIGHT_LOAD_SHUTDOWN_TIME,
            LightLoadShutdownTime::WIDTH,
            self.light_load_shutdown_time.into(),
        )
    }
}

/// Charger_CTL0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerCtl0 {
    /// Charge-full stop voltage.
    pub charge_full_stop: ChargeFullStop,
}

impl RegisterFields for ChargerCtl0 {
    const REGISTER: Register = Register::ChargerCtl0;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self {
            charge_full_stop: decode_enum(Self::REGISTER, raw, 0, ChargeFullStop::WIDTH)?,
        })
    }
}

impl WritableFields for ChargerCtl0 {
    fn encode(&self, retained: u8) -> u8 {
        with_field_bits(retained, 0, ChargeFullStop::WIDTH, self.charge_full_stop.into())
    }
}

/// Charger_CTL1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerCtl1 {
    /// End-of-charge current. Full detection checks current first, then voltage.
    pub end_current_detection: EndCurrentDetection,
    /// VOUT undervoltage loop while charging.
    pub undervoltage_loop: UndervoltageLoop,
}

impl ChargerCtl1 {
    const END_CURRENT_DETECTION: u8 = 6;
    const UNDERVOLTAGE_LOOP: u8 = 2;
}

impl RegisterFields for ChargerCtl1 {
    const REGISTER: Register = Register::ChargerCtl1;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self {
            end_current_detection: decode_enum(
                Self::REGISTER,
                raw,
                Self::END_CURRENT_DETECTION,
                EndCurrentDetection::WIDTH,
            )?,
            undervoltage_loop: decode_enum(
                Self::REGISTER,
                raw,
                Self::UNDERVOLTAGE_LOOP,
                UndervoltageLoop::WIDTH,
            )?,
        })
    }
}

impl WritableFields for ChargerCtl1 {
    fn encode(&self, retained: u8) -> u8 {
        let raw = with_field_bits(
            retained,
            Self::END_CURRENT_DETECTION,
            EndCurrentDetection::WIDTH,
            self.end_current_detection.into(),
        );
        with_field_bits(
            raw,
            Self::UNDERVOLTAGE_LOOP,
            UndervoltageLoop::WIDTH,
            self.undervoltage_loop.into(),
        )
    }
}

/// Charger_CTL2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerCtl2 {
    /// Cell full voltage.
    pub battery_voltage: BatteryVoltage,
    /// Constant-voltage overshoot.
    pub constant_voltage_boost: ConstantVoltageBoost,
}

impl ChargerCtl2 {
    const BATTERY_VOLTAGE: u8 = 2;
    const CONSTANT_VOLTAGE_BOOST: u8 = 0;
}

impl RegisterFields for ChargerCtl2 {
    const REGISTER: Register = Register::ChargerCtl2;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self {
            battery_voltage: decode_enum(
                Self::REGISTER,
                raw,
                Self::BATTERY_VOLTAGE,
                BatteryVoltage::WIDTH,
            )?,
            constant_voltage_boost: decode_enum(
                Self::REGISTER,
                raw,
                Self::CONSTANT_VOLTAGE_BOOST,
                ConstantVoltageBoost::WIDTH,
            )?,
        })
    }
}

impl WritableFields for ChargerCtl2 {
    fn encode(&self, retained: u8) -> u8 {
        let raw = with_field_bits(
            retained,
            Self::BATTERY_VOLTAGE,
            BatteryVoltage::WIDTH,
            self.battery_voltage.into(),
        );
        with_field_bits(
            raw,
            Self::CONSTANT_VOLTAGE_BOOST,
            ConstantVoltageBoost::WIDTH,
            self.constant_voltage_boost.into(),
        )
    }
}

/// Charger_CTL3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerCtl3 {
    /// Constant-current loop side.
    pub current_loop: CurrentLoop,
}

impl ChargerCtl3 {
    const CURRENT_LOOP: u8 = 5;
}

impl RegisterFields for ChargerCtl3 {
    const REGISTER: Register = Register::ChargerCtl3;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self {
            current_loop: decode_enum(Self::REGISTER, raw, Self::CURRENT_LOOP, CurrentLoop::WIDTH)?,
        })
    }
}

impl WritableFields for ChargerCtl3 {
    fn encode(&self, retained: u8) -> u8 {
        with_field_bits(
            retained,
            Self::CURRENT_LOOP,
            CurrentLoop::WIDTH,
            self.current_loop.into(),
        )
    }
}

/// CHG_DIG_CTL0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChgDigCtl0 {
    /// VIN-side charging current.
    pub charging_current: ChargingCurrent,
}

impl RegisterFields for ChgDigCtl0 {
    const REGISTER: Register = Register::ChgDigCtl0;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self {
            charging_current: ChargingCurrent::from_bits(field_bits(
                raw,
                0,
                ChargingCurrent::WIDTH,
            )),
        })
    }
}

impl WritableFields for ChgDigCtl0 {
    fn encode(&self, retained: u8) -> u8 {
        with_field_bits(retained, 0, ChargingCurrent::WIDTH, self.charging_current.bits())
    }
}

/// READ0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Read0 {
    /// Charger is running.
    pub charging_on: bool,
}

impl RegisterFields for Read0 {
    const REGISTER: Register = Register::Read0;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self { charging_on: flag(raw, 3) })
    }
}

/// READ1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Read1 {
    /// Battery is full.
    pub fully_charged: bool,
}

impl RegisterFields for Read1 {
    const REGISTER: Register = Register::Read1;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self { fully_charged: flag(raw, 3) })
    }
}

/// READ2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Read2 {
    /// Output is under light load (shutdown timer running).
    pub light_load: bool,
}

impl RegisterFields for Read2 {
    const REGISTER: Register = Register::Read2;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self { light_load: flag(raw, 2) })
    }
}

/// READ3: latched KEY events.
///
/// The flags are write-1-to-clear. As a decoded value each flag means
/// "event latched"; handed to [`WritableFields::encode`] each flag means
/// "acknowledge this event". Encoding writes a 1 only for flags that are
/// requested *and* set in the retained byte, writes 0 (no effect) to the
/// other flag bits, and keeps every non-flag bit verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvents {
    /// Double click latched.
    pub double_click: bool,
    /// Long press latched.
    pub long_press: bool,
    /// Short press latched.
    pub short_press: bool,
}

impl KeyEvents {
    const DOUBLE_CLICK: u8 = 2;
    const LONG_PRESS: u8 = 1;
    const SHORT_PRESS: u8 = 0;
    /// Bits 2..0 of READ3.
    pub const MASK: u8 = 0b0000_0111;

    /// No event.
    pub const NONE: Self = Self {
        double_click: false,
        long_press: false,
        short_press: false,
    };

    /// Every event.
    pub const ALL: Self = Self {
        double_click: true,
        long_press: true,
        short_press: true,
    };

    /// Whether any event is set.
    pub const fn any(self) -> bool {
        self.double_click || self.long_press || self.short_press
    }

    /// Flags as READ3 bit positions.
    pub const fn bits(self) -> u8 {
        with_flag(
            with_flag(
                with_flag(0, Self::DOUBLE_CLICK, self.double_click),
                Self::LONG_PRESS,
                self.long_press,
            ),
            Self::SHORT_PRESS,
            self.short_press,
        )
    }
}

impl RegisterFields for KeyEvents {
    const REGISTER: Register = Register::Read3;

    fn decode(raw: u8) -> Result<Self, InvalidField> {
        Ok(Self {
            double_click: flag(raw, Self::DOUBLE_CLICK),
            long_press: flag(raw, Self::LONG_PRESS),
            short_press: flag(raw, Self::SHORT_PRESS),
        })
    }

}

impl WritableFields for KeyEvents {
    fn encode(&self, retained: u8) -> u8 {
        let acknowledged = self.bits() & retained & Self::MASK;
        (retained & !Self::MASK) | acknowledged
    }

    /// Flags written as 1 are cleared, every other latched flag stays.
    fn held_after_write(retained: u8, written: u8) -> u8 {
        retained & !(written & Self::MASK)
    }
}

// ── Register groups ──────────────────────────────────────────────────────────

/// Merged view of a register group: one optional view per sub-register,
/// `None` while the sub-register has never been read.
pub trait GroupFields: Default + Copy {
    /// Group described by this view.
    const GROUP: RegisterGroup;

    /// Decode `raw` into the slot of `register`. Registers outside the group
    /// are ignored.
    ///
    /// # Errors
    ///
    /// [`InvalidField`] when a field value has no named variant.
    fn decode_register(&mut self, register: Register, raw: u8) -> Result<(), InvalidField>;

    /// Encode the slot of `register` into `retained`, or `None` when the slot
    /// is empty or the register is not writable through this group.
    fn encode_register(&self, register: Register, retained: u8) -> Option<u8>;

    /// Byte `register` holds once `written` has landed over `retained`.
    fn held_after_write(_register: Register, _retained: u8, written: u8) -> u8 {
        written
    }
}

fn decode_slot<R: RegisterFields>(slot: &mut Option<R>, raw: u8) -> Result<(), InvalidField> {
    *slot = Some(R::decode(raw)?);
    Ok(())
}

fn encode_slot<R: WritableFields>(slot: Option<&R>, retained: u8) -> Option<u8> {
    slot.map(|view| view.encode(retained))
}

/// System Control group (SYS_CTL0..SYS_CTL2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemControl {
    /// SYS_CTL0
    pub ctl0: Option<SysCtl0>,
    /// SYS_CTL1
    pub ctl1: Option<SysCtl1>,
    /// SYS_CTL2
    pub ctl2: Option<SysCtl2>,
}

impl GroupFields for SystemControl {
    const GROUP: RegisterGroup = RegisterGroup::SystemControl;

    fn decode_register(&mut self, register: Register, raw: u8) -> Result<(), InvalidField> {
        match register {
            Register::SysCtl0 => decode_slot(&mut self.ctl0, raw),
            Register::SysCtl1 => decode_slot(&mut self.ctl1, raw),
            Register::SysCtl2 => decode_slot(&mut self.ctl2, raw),
            _ => Ok(()),
        }
    }

    fn encode_register(&self, register: Register, retained: u8) -> Option<u8> {
        match register {
            Register::SysCtl0 => encode_slot(self.ctl0.as_ref(), retained),
            Register::SysCtl1 => encode_slot(self.ctl1.as_ref(), retained),
            Register::SysCtl2 => encode_slot(self.ctl2.as_ref(), retained),
            _ => None,
        }
    }
}

/// Charger Control group (Charger_CTL0..Charger_CTL3, CHG_DIG_CTL0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerControl {
    /// Charger_CTL0
    pub ctl0: Option<ChargerCtl0>,
    /// Charger_CTL1
    pub ctl1: Option<ChargerCtl1>,
    /// Charger_CTL2
    pub ctl2: Option<ChargerCtl2>,
    /// Charger_CTL3
    pub ctl3: Option<ChargerCtl3>,
    /// CHG_DIG_CTL0
    pub dig_ctl0: Option<ChgDigCtl0>,
}

impl GroupFields for ChargerControl {
    const GROUP: RegisterGroup = RegisterGroup::ChargerControl;

    fn decode_register(&mut self, register: Register, raw: u8) -> Result<(), InvalidField> {
        match register {
            Register::ChargerCtl0 => decode_slot(&mut self.ctl0, raw),
            Register::ChargerCtl1 => decode_slot(&mut self.ctl1, raw),
            Register::ChargerCtl2 => decode_slot(&mut self.ctl2, raw),
            Register::ChargerCtl3 => decode_slot(&mut self.ctl3, raw),
            Register::ChgDigCtl0 => decode_slot(&mut self.dig_ctl0, raw),
            _ => Ok(()),
        }
    }

    fn encode_register(&self, register: Register, retained: u8) -> Option<u8> {
        match register {
            Register::ChargerCtl0 => encode_slot(self.ctl0.as_ref(), retained),
            Register::ChargerCtl1 => encode_slot(self.ctl1.as_ref(), retained),
            Register::ChargerCtl2 => encode_slot(self.ctl2.as_ref(), retained),
            Register::ChargerCtl3 => encode_slot(self.ctl3.as_ref(), retained),
            Register::ChgDigCtl0 => encode_slot(self.dig_ctl0.as_ref(), retained),
            _ => None,
        }
    }
}

/// Status group (READ0..READ3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// READ0
    pub read0: Option<Read0>,
    /// READ1
    pub read1: Option<Read1>,
    /// READ2
    pub read2: Option<Read2>,
    /// READ3
    pub read3: Option<KeyEvents>,
}

impl GroupFields for Status {
    const GROUP: RegisterGroup = RegisterGroup::Status;

    fn decode_register(&mut self, register: Register, raw: u8) -> Result<(), InvalidField> {
        match register {
            Register::Read0 => decode_slot(&mut self.read0, raw),
            Register::Read1 => decode_slot(&mut self.read1, raw),
            Register::Read2 => decode_slot(&mut self.read2, raw),
            Register::Read3 => decode_slot(&mut self.read3, raw),
            _ => Ok(()),
        }
    }

    fn encode_register(&self, register: Register, retained: u8) -> Option<u8> {
        match register {
            Register::Read3 => encode_slot(self.read3.as_ref(), retained),
            _ => None,
        }
    }

    fn held_after_write(register: Register, retained: u8, written: u8) -> u8 {
        match register {
            Register::Read3 => KeyEvents::held_after_write(retained, written),
            _ => written,
        }
    }
}

// ── Group-level codec ────────────────────────────────────────────────────────

/// Decode SYS_CTL0..SYS_CTL2.
pub fn decode_system_control(b0: u8, b1: u8, b2: u8) -> Result<SystemControl, InvalidField> {
    Ok(SystemControl {
        ctl0: Some(SysCtl0::decode(b0)?),
        ctl1: Some(SysCtl1::decode(b1)?),
        ctl2: Some(SysCtl2::decode(b2)?),
    })
}

/// Merge `fields` into the retained SYS_CTL0..SYS_CTL2 bytes.
/// Sub-registers without a view keep their retained byte.
pub fn encode_system_control(retained: [u8; 3], fields: &SystemControl) -> [u8; 3] {
    encode_group(retained, fields)
}

/// Decode Charger_CTL0..Charger_CTL3 and CHG_DIG_CTL0.
pub fn decode_charger_control(
    b0: u8,
    b1: u8,
    b2: u8,
    b3: u8,
    b4: u8,
) -> Result<ChargerControl, InvalidField> {
    Ok(ChargerControl {
        ctl0: Some(ChargerCtl0::decode(b0)?),
        ctl1: Some(ChargerCtl1::decode(b1)?),
        ctl2: Some(ChargerCtl2::decode(b2)?),
        ctl3: Some(ChargerCtl3::decode(b3)?),
        dig_ctl0: Some(ChgDigCtl0::decode(b4)?),
    })
}

/// Merge `fields` into the retained Charger Control bytes.
/// Sub-registers without a view keep their retained byte.
pub fn encode_charger_control(retained: [u8; 5], fields: &ChargerControl) -> [u8; 5] {
    encode_group(retained, fields)
}

/// Decode READ0..READ3.
pub fn decode_status(b0: u8, b1: u8, b2: u8, b3: u8) -> Result<Status, InvalidField> {
    Ok(Status {
        read0: Some(Read0::decode(b0)?),
        read1: Some(Read1::decode(b1)?),
        read2: Some(Read2::decode(b2)?),
        read3: Some(KeyEvents::decode(b3)?),
    })
}

/// Acknowledge `events` against the retained READ3 byte (write-1-to-clear).
pub fn encode_status(retained_read3: u8, events: &KeyEvents) -> u8 {
    events.encode(retained_read3)
}

fn encode_group<G: GroupFields, const N: usize>(mut retained: [u8; N], fields: &G) -> [u8; N] {
    for (raw, register) in retained.iter_mut().zip(G::GROUP.registers()) {
        if let Some(encoded) = fields.encode_register(*register, *raw) {
            *raw = encoded;
        }
    }
    retained
}
