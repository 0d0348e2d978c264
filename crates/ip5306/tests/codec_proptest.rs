//! Property-based tests for the register codec.
//! Every encode must touch only the bits of its own fields, whatever the
//! retained byte holds.

use ip5306::codec::{ChargerCtl1, ChargerCtl2, ChgDigCtl0, SysCtl0, SysCtl1, SysCtl2};
use ip5306::{ChargingCurrent, KeyEvents, WritableFields};

/// Bits each view owns in its register.
const SYS_CTL0_BITS: u8 = 0b0011_0111;
const SYS_CTL1_BITS: u8 = 0b1110_0101;
const SYS_CTL2_BITS: u8 = 0b0000_1100;
const CHARGER_CTL1_BITS: u8 = 0b1101_1100;
const CHARGER_CTL2_BITS: u8 = 0b0000_1111;
const CHG_DIG_CTL0_BITS: u8 = 0b0001_1111;

fn assert_isolated<R: WritableFields + PartialEq + core::fmt::Debug>(
    retained: u8,
    source: u8,
    owned: u8,
) {
    // Decode a view from `source`, encode it over `retained`.
    let decoded = R::decode(source);
    assert!(decoded.is_ok(), "{source:#010b} did not decode");
    let Ok(view) = decoded else { return };
    let encoded = view.encode(retained);
    assert_eq!(encoded & !owned, retained & !owned, "foreign bits changed");
    assert_eq!(encoded & owned, source & owned, "owned bits not taken from view");
    assert_eq!(R::decode(encoded).ok(), Some(view));
}

proptest::proptest! {
    #[test]
    fn sys_ctl_encode_is_isolated(retained in 0u8..=255, source in 0u8..=255) {
        assert_isolated::<SysCtl0>(retained, source, SYS_CTL0_BITS);
        assert_isolated::<SysCtl1>(retained, source, SYS_CTL1_BITS);
        assert_isolated::<SysCtl2>(retained, source, SYS_CTL2_BITS);
    }

    #[test]
    fn charger_ctl_encode_is_isolated(retained in 0u8..=255, source in 0u8..=255) {
        assert_isolated::<ChargerCtl1>(retained, source, CHARGER_CTL1_BITS);
        assert_isolated::<ChargerCtl2>(retained, source, CHARGER_CTL2_BITS);
        assert_isolated::<ChgDigCtl0>(retained, source, CHG_DIG_CTL0_BITS);
    }

    /// Every 5-bit pattern decodes to a current that encodes back to it.
    #[test]
    fn charging_current_bits_round_trip(bits in 0u8..32) {
        let current = ChargingCurrent::from_bits(bits);
        assert!(ChargingCurrent::from_milliamps(current.milliamps()).is_ok());
        assert_eq!(current.bits(), bits);
    }

    /// Anything not on the 50 + k·100 grid is rejected, never rounded.
    #[test]
    fn off_grid_currents_are_rejected(milliamps in 0u16..=4000) {
        let on_grid = (50..=3150).contains(&milliamps) && milliamps % 100 == 50;
        assert_eq!(ChargingCurrent::from_milliamps(milliamps).is_ok(), on_grid);
    }

    /// Acknowledging never writes a 1 to a flag that was not latched, and
    /// never changes a non-flag bit.
    #[test]
    fn key_event_ack_never_sets_unlatched_flags(
        retained in 0u8..=255,
        double_click: bool,
        long_press: bool,
        short_press: bool,
    ) {
        let ack = KeyEvents { double_click, long_press, short_press };
        let written = ack.encode(retained);
        assert_eq!(written & !KeyEvents::MASK, retained & !KeyEvents::MASK);
        assert_eq!(written & KeyEvents::MASK & !retained, 0);
        assert_eq!(written & KeyEvents::MASK, ack.bits() & retained & KeyEvents::MASK);

        // what stays latched is exactly what was latched and not written
        let held = KeyEvents::held_after_write(retained, written);
        assert_eq!(held & KeyEvents::MASK, retained & KeyEvents::MASK & !ack.bits());
        assert_eq!(held & !KeyEvents::MASK, retained & !KeyEvents::MASK);
    }
}
