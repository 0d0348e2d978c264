//! IP5306 register map.
//!
//! Reference: Injoinic IP5306 I²C register description (SYS_CTL, Charger_CTL,
//! READ registers). All registers are 8 bits wide.

use core::ops::{BitOr, BitOrAssign};

/// SYS_CTL0: boost / charger enable, auto power-on, key shutdown.
pub const REG_SYS_CTL0: u8 = 0x00;
/// SYS_CTL1: key function selection, boost after VIN unplug, 3.0 V low-battery shutdown.
pub const REG_SYS_CTL1: u8 = 0x01;
/// SYS_CTL2: light-load shutdown time.
pub const REG_SYS_CTL2: u8 = 0x02;
/// Charger_CTL0: charge-full stop voltage.
pub const REG_CHARGER_CTL0: u8 = 0x20;
/// Charger_CTL1: end-of-charge current detection, charging undervoltage loop.
pub const REG_CHARGER_CTL1: u8 = 0x21;
/// Charger_CTL2: battery voltage, constant-voltage boost.
pub const REG_CHARGER_CTL2: u8 = 0x22;
/// Charger_CTL3: constant-current loop selection.
pub const REG_CHARGER_CTL3: u8 = 0x23;
/// CHG_DIG_CTL0: VIN-side charging current (weighted bits 4..0).
pub const REG_CHG_DIG_CTL0: u8 = 0x24;
/// READ0: charging-on flag.
pub const REG_READ0: u8 = 0x70;
/// READ1: charge-full flag.
pub const REG_READ1: u8 = 0x71;
/// READ2: output light-load flag.
pub const REG_READ2: u8 = 0x72;
/// READ3: KEY event flags (write 1 to clear).
pub const REG_READ3: u8 = 0x77;

/// One 8-bit sub-register of the IP5306.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// SYS_CTL0 (0x00)
    SysCtl0,
    /// SYS_CTL1 (0x01)
    SysCtl1,
    /// SYS_CTL2 (0x02)
    SysCtl2,
    /// Charger_CTL0 (0x20)
    ChargerCtl0,
    /// Charger_CTL1 (0x21)
    ChargerCtl1,
    /// Charger_CTL2 (0x22)
    ChargerCtl2,
    /// Charger_CTL3 (0x23)
    ChargerCtl3,
    /// CHG_DIG_CTL0 (0x24)
    ChgDigCtl0,
    /// READ0 (0x70)
    Read0,
    /// READ1 (0x71)
    Read1,
    /// READ2 (0x72)
    Read2,
    /// READ3 (0x77)
    Read3,
}

impl Register {
    /// Every register, in cache order.
    pub const ALL: [Register; 12] = [
        Register::SysCtl0,
        Register::SysCtl1,
        Register::SysCtl2,
        Register::ChargerCtl0,
        Register::ChargerCtl1,
        Register::ChargerCtl2,
        Register::ChargerCtl3,
        Register::ChgDigCtl0,
        Register::Read0,
        Register::Read1,
        Register::Read2,
        Register::Read3,
    ];

    /// I²C register address.
    pub const fn address(self) -> u8 {
        match self {
            Register::SysCtl0 => REG_SYS_CTL0,
            Register::SysCtl1 => REG_SYS_CTL1,
            Register::SysCtl2 => REG_SYS_CTL2,
            Register::ChargerCtl0 => REG_CHARGER_CTL0,
            Register::ChargerCtl1 => REG_CHARGER_CTL1,
            Register::ChargerCtl2 => REG_CHARGER_CTL2,
            Register::ChargerCtl3 => REG_CHARGER_CTL3,
            Register::ChgDigCtl0 => REG_CHG_DIG_CTL0,
            Register::Read0 => REG_READ0,
            Register::Read1 => REG_READ1,
            Register::Read2 => REG_READ2,
            Register::Read3 => REG_READ3,
        }
    }

    /// Datasheet name, used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Register::SysCtl0 => "SYS_CTL0",
            Register::SysCtl1 => "SYS_CTL1",
            Register::SysCtl2 => "SYS_CTL2",
            Register::ChargerCtl0 => "CHARGER_CTL0",
            Register::ChargerCtl1 => "CHARGER_CTL1",
            Register::ChargerCtl2 => "CHARGER_CTL2",
            Register::ChargerCtl3 => "CHARGER_CTL3",
            Register::ChgDigCtl0 => "CHG_DIG_CTL0",
            Register::Read0 => "READ0",
            Register::Read1 => "READ1",
            Register::Read2 => "READ2",
            Register::Read3 => "READ3",
        }
    }

    /// Position of this register's slot in the raw-byte cache.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Selector bit for this register in a [`RegisterMask`].
    #[allow(clippy::arithmetic_side_effects)] // index < 12
    pub const fn mask(self) -> RegisterMask {
        RegisterMask(1 << self.index())
    }

    /// Group this register belongs to.
    pub const fn group(self) -> RegisterGroup {
        match self {
            Register::SysCtl0 | Register::SysCtl1 | Register::SysCtl2 => {
                RegisterGroup::SystemControl
            }
            Register::ChargerCtl0
            | Register::ChargerCtl1
            | Register::ChargerCtl2
            | Register::ChargerCtl3
            | Register::ChgDigCtl0 => RegisterGroup::ChargerControl,
            Register::Read0 | Register::Read1 | Register::Read2 | Register::Read3 => {
                RegisterGroup::Status
            }
        }
    }

    /// Whether the host may write this register.
    ///
    /// READ0..READ2 are pure status; READ3 accepts write-1-to-clear.
    pub const fn is_writable(self) -> bool {
        !matches!(self, Register::Read0 | Register::Read1 | Register::Read2)
    }
}

/// Register group: a cluster of related sub-registers read and written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterGroup {
    /// SYS_CTL0..SYS_CTL2
    SystemControl,
    /// Charger_CTL0..Charger_CTL3, CHG_DIG_CTL0
    ChargerControl,
    /// READ0..READ3
    Status,
}

impl RegisterGroup {
    /// Sub-registers of the group, in bus access order.
    pub const fn registers(self) -> &'static [Register] {
        match self {
            RegisterGroup::SystemControl => {
                &[Register::SysCtl0, Register::SysCtl1, Register::SysCtl2]
            }
            RegisterGroup::ChargerControl => &[
                Register::ChargerCtl0,
                Register::ChargerCtl1,
                Register::ChargerCtl2,
                Register::ChargerCtl3,
                Register::ChgDigCtl0,
            ],
            RegisterGroup::Status => &[
                Register::Read0,
                Register::Read1,
                Register::Read2,
                Register::Read3,
            ],
        }
    }

    /// Mask selecting every sub-register of the group.
    pub const fn all(self) -> RegisterMask {
        match self {
            RegisterGroup::SystemControl => RegisterMask::SYS_CTL_ALL,
            RegisterGroup::ChargerControl => RegisterMask::CHARGER_CTL_ALL,
            RegisterGroup::Status => RegisterMask::READ_ALL,
        }
    }
}

/// Set of sub-registers to touch in a grouped read or write.
///
/// Each register owns bit `index` (octal selector constants), so a
/// mask can be stored or transmitted as a plain `u16`.
///
/// ```rust
/// use ip5306::{Register, RegisterMask};
///
/// let mask = RegisterMask::SYS_CTL0 | RegisterMask::SYS_CTL2;
/// assert!(mask.contains(Register::SysCtl2));
/// assert!(!mask.contains(Register::SysCtl1));
/// assert_eq!(RegisterMask::READ_ALL.bits(), 0o7400);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct RegisterMask(u16);

impl RegisterMask {
    /// No register selected.
    pub const NONE: Self = Self(0);
    /// SYS_CTL0
    pub const SYS_CTL0: Self = Self(0o0001);
    /// SYS_CTL1
    pub const SYS_CTL1: Self = Self(0o0002);
    /// SYS_CTL2
    pub const SYS_CTL2: Self = Self(0o0004);
    /// Every System Control sub-register.
    pub const SYS_CTL_ALL: Self = Self(0o0007);
    /// Charger_CTL0
    pub const CHARGER_CTL0: Self = Self(0o0010);
    /// Charger_CTL1
    pub const CHARGER_CTL1: Self = Self(0o0020);
    /// Charger_CTL2
    pub const CHARGER_CTL2: Self = Self(0o0040);
    /// Charger_CTL3
    pub const CHARGER_CTL3: Self = Self(0o0100);
    /// CHG_DIG_CTL0
    pub const CHG_DIG_CTL0: Self = Self(0o0200);
    /// Every Charger Control sub-register.
    pub const CHARGER_CTL_ALL: Self = Self(0o0370);
    /// READ0
    pub const READ0: Self = Self(0o0400);
    /// READ1
    pub const READ1: Self = Self(0o1000);
    /// READ2
    pub const READ2: Self = Self(0o2000);
    /// READ3
    pub const READ3: Self = Self(0o4000);
    /// Every Status sub-register.
    pub const READ_ALL: Self = Self(0o7400);

    /// Build a mask from raw selector bits. Unknown bits are dropped.
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & 0o7777)
    }

    /// Raw selector bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether `register` is selected.
    pub const fn contains(self, register: Register) -> bool {
        self.0 & register.mask().0 != 0
    }

    /// Whether no register is selected.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two masks.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for RegisterMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for RegisterMask {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl From<Register> for RegisterMask {
    fn from(register: Register) -> Self {
        register.mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_addresses_match_datasheet() {
        assert_eq!(Register::SysCtl0.address(), 0x00);
        assert_eq!(Register::SysCtl2.address(), 0x02);
        assert_eq!(Register::ChargerCtl0.address(), 0x20);
        assert_eq!(Register::ChgDigCtl0.address(), 0x24);
        assert_eq!(Register::Read0.address(), 0x70);
        assert_eq!(Register::Read2.address(), 0x72);
        assert_eq!(Register::Read3.address(), 0x77);
    }

    #[test]
    fn per_register_mask_matches_selector_constants() {
        let expected = [
            RegisterMask::SYS_CTL0,
            RegisterMask::SYS_CTL1,
            RegisterMask::SYS_CTL2,
            RegisterMask::CHARGER_CTL0,
            RegisterMask::CHARGER_CTL1,
            RegisterMask::CHARGER_CTL2,
            RegisterMask::CHARGER_CTL3,
            RegisterMask::CHG_DIG_CTL0,
            RegisterMask::READ0,
            RegisterMask::READ1,
            RegisterMask::READ2,
            RegisterMask::READ3,
        ];
        for (register, mask) in Register::ALL.iter().zip(expected) {
            assert_eq!(register.mask(), mask, "{}", register.name());
        }
    }

    #[test]
    fn group_all_masks_cover_exactly_their_registers() {
        for group in [
            RegisterGroup::SystemControl,
            RegisterGroup::ChargerControl,
            RegisterGroup::Status,
        ] {
            let union = group
                .registers()
                .iter()
                .fold(RegisterMask::NONE, |acc, r| acc | r.mask());
            assert_eq!(union, group.all());
            for register in group.registers() {
                assert_eq!(register.group(), group);
            }
        }
    }

    #[test]
    fn group_masks_do_not_overlap() {
        assert_eq!(RegisterMask::SYS_CTL_ALL.bits() & RegisterMask::CHARGER_CTL_ALL.bits(), 0);
        assert_eq!(RegisterMask::CHARGER_CTL_ALL.bits() & RegisterMask::READ_ALL.bits(), 0);
        assert_eq!(RegisterMask::SYS_CTL_ALL.bits() & RegisterMask::READ_ALL.bits(), 0);
    }

    #[test]
    fn only_read3_is_writable_in_status_group() {
        assert!(!Register::Read0.is_writable());
        assert!(!Register::Read1.is_writable());
        assert!(!Register::Read2.is_writable());
        assert!(Register::Read3.is_writable());
        assert!(Register::ChgDigCtl0.is_writable());
    }
}
