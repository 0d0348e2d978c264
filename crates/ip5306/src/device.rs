//! IP5306 register-level driver.
//!
//! [`Ip5306`] owns the I²C bus and one retained raw byte per sub-register.
//! Every successful read stores the byte it got; every successful write
//! stores the byte the chip holds afterwards. That is the byte sent, except
//! for READ3 where acknowledged flags read back cleared. Writes always start from the retained byte, so
//! bits the caller did not touch (including reserved ones) are written back
//! exactly as the chip reported them.
//!
//! Grouped operations take a [`RegisterMask`] and walk the selected
//! sub-registers in group order. They fail fast on the first bus error and
//! do not roll back: sub-registers handled earlier in the same call keep
//! their new cached value.

use embedded_hal::i2c::I2c;

use crate::codec::{
    BatteryVoltage, ChargeFullStop, ChargerControl, ChargerCtl0, ChargerCtl2, ChargingCurrent,
    ChgDigCtl0, GroupFields, KeyEvents, LightLoadShutdownTime, Read0, Read1, Read2,
    RegisterFields, Status, SysCtl0, SysCtl2, SystemControl, WritableFields,
};
use crate::config::IP5306_I2C_ADDR;
use crate::error::Error;
use crate::registers::{Register, RegisterMask};

/// IP5306 driver over a blocking I²C bus.
pub struct Ip5306<I> {
    i2c: I,
    address: u8,
    cache: [Option<u8>; Register::ALL.len()],
}

impl<I> Ip5306<I>
where
    I: I2c,
{
    /// Driver at the fixed address `0x75`. Nothing is read until asked.
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, IP5306_I2C_ADDR)
    }

    /// Driver at a non-default 7-bit address (some IP5306 clones move it).
    pub fn with_address(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            cache: [None; Register::ALL.len()],
        }
    }

    /// Give the bus back.
    pub fn release(self) -> I {
        self.i2c
    }

    /// 7-bit bus address in use.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Retained raw byte of `register`, if it was ever read or written.
    pub fn raw(&self, register: Register) -> Option<u8> {
        self.cache.get(register.index()).copied().flatten()
    }

    /// Forget every retained byte. Writes fail with
    /// [`Error::NotCached`] until the registers are read again.
    pub fn invalidate(&mut self) {
        self.cache = [None; Register::ALL.len()];
    }

    // ── Grouped access ───────────────────────────────────────────────────

    /// Read the selected SYS_CTL sub-registers.
    ///
    /// Returns every System Control sub-register ever read, decoded from
    /// the cache.
    pub fn read_system_control(
        &mut self,
        mask: RegisterMask,
    ) -> Result<SystemControl, Error<I::Error>> {
        self.read_group(mask)
    }

    /// Read the selected Charger_CTL / CHG_DIG_CTL0 sub-registers.
    pub fn read_charger_control(
        &mut self,
        mask: RegisterMask,
    ) -> Result<ChargerControl, Error<I::Error>> {
        self.read_group(mask)
    }

    /// Read the selected READ sub-registers.
    pub fn read_status(&mut self, mask: RegisterMask) -> Result<Status, Error<I::Error>> {
        self.read_group(mask)
    }

    /// Write the selected SYS_CTL sub-registers from `fields`.
    ///
    /// Each selected sub-register must have been read before and must have
    /// a view in `fields`. Mask bits of other groups are ignored.
    pub fn write_system_control(
        &mut self,
        fields: &SystemControl,
        mask: RegisterMask,
    ) -> Result<(), Error<I::Error>> {
        self.write_group(fields, mask)
    }

    /// Write the selected Charger_CTL / CHG_DIG_CTL0 sub-registers from `fields`.
    pub fn write_charger_control(
        &mut self,
        fields: &ChargerControl,
        mask: RegisterMask,
    ) -> Result<(), Error<I::Error>> {
        self.write_group(fields, mask)
    }

    /// Write the selected READ sub-registers. Only READ3 is writable; any
    /// other selected register fails with [`Error::ReadOnly`].
    pub fn write_status(&mut self, fields: &Status, mask: RegisterMask) -> Result<(), Error<I::Error>> {
        self.write_group(fields, mask)
    }

    /// Clear the latched KEY events in `events` (write-1-to-clear on READ3).
    ///
    /// Only events that were latched at the last READ3 read are cleared;
    /// events latched since then stay pending.
    pub fn acknowledge_key_events(&mut self, events: KeyEvents) -> Result<(), Error<I::Error>> {
        let fields = Status {
            read3: Some(events),
            ..Status::default()
        };
        self.write_status(&fields, RegisterMask::READ3)
    }

    // ── Single-register access ───────────────────────────────────────────

    /// Read one sub-register and decode it.
    pub fn read_register<R: RegisterFields>(&mut self) -> Result<R, Error<I::Error>> {
        let raw = self.fetch(R::REGISTER)?;
        Ok(R::decode(raw)?)
    }

    /// Decode one sub-register from the cache, without bus traffic.
    pub fn cached<R: RegisterFields>(&self) -> Result<R, Error<I::Error>> {
        let register = R::REGISTER;
        let raw = self.raw(register).ok_or(Error::NotCached { register })?;
        Ok(R::decode(raw)?)
    }

    /// Apply `f` to the cached view of one sub-register and write it back.
    ///
    /// Requires a prior read of the register. Returns the written view.
    pub fn modify<R, F>(&mut self, f: F) -> Result<R, Error<I::Error>>
    where
        R: WritableFields,
        F: FnOnce(&mut R),
    {
        let register = R::REGISTER;
        let retained = self.raw(register).ok_or(Error::NotCached { register })?;
        let mut view = R::decode(retained)?;
        f(&mut view);
        let written = view.encode(retained);
        self.store(register, written, R::held_after_write(retained, written))?;
        Ok(view)
    }

    /// Read one sub-register, apply `f` and write it back.
    pub fn update<R, F>(&mut self, f: F) -> Result<R, Error<I::Error>>
    where
        R: WritableFields,
        F: FnOnce(&mut R),
    {
        self.fetch(R::REGISTER)?;
        self.modify(f)
    }

    // ── Field shortcuts ──────────────────────────────────────────────────

    /// Turn the 5 V boost output on or off.
    pub fn set_boost_enabled(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        self.update(|ctl: &mut SysCtl0| ctl.boost_enable = on).map(drop)
    }

    /// Turn the charger on or off.
    pub fn set_charger_enabled(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        self.update(|ctl: &mut SysCtl0| ctl.charger_enable = on).map(drop)
    }

    /// Power on automatically when a load is plugged in.
    pub fn set_auto_power_on(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        self.update(|ctl: &mut SysCtl0| ctl.auto_power_on = on).map(drop)
    }

    /// Allow the KEY to shut the chip down.
    pub fn set_key_shutdown_enabled(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        self.update(|ctl: &mut SysCtl0| ctl.key_shutdown_enable = on).map(drop)
    }

    /// Light-load shutdown delay.
    pub fn set_light_load_shutdown_time(
        &mut self,
        time: LightLoadShutdownTime,
    ) -> Result<(), Error<I::Error>> {
        self.update(|ctl: &mut SysCtl2| ctl.light_load_shutdown_time = time).map(drop)
    }

    /// Charge-full stop voltage.
    pub fn set_charge_full_stop(&mut self, voltage: ChargeFullStop) -> Result<(), Error<I::Error>> {
        self.update(|ctl: &mut ChargerCtl0| ctl.charge_full_stop = voltage).map(drop)
    }

    /// Cell full voltage.
    pub fn set_battery_voltage(&mut self, voltage: BatteryVoltage) -> Result<(), Error<I::Error>> {
        self.update(|ctl: &mut ChargerCtl2| ctl.battery_voltage = voltage).map(drop)
    }

    /// Configured VIN-side charging current.
    pub fn charging_current(&mut self) -> Result<ChargingCurrent, Error<I::Error>> {
        self.read_register::<ChgDigCtl0>().map(|ctl| ctl.charging_current)
    }

    /// Set the VIN-side charging current.
    pub fn set_charging_current(&mut self, current: ChargingCurrent) -> Result<(), Error<I::Error>> {
        debug!("IP5306 charging current -> {} mA", current.milliamps());
        self.update(|ctl: &mut ChgDigCtl0| ctl.charging_current = current).map(drop)
    }

    /// Charger is running.
    pub fn is_charging(&mut self) -> Result<bool, Error<I::Error>> {
        self.read_register::<Read0>().map(|status| status.charging_on)
    }

    /// Battery is full.
    pub fn is_fully_charged(&mut self) -> Result<bool, Error<I::Error>> {
        self.read_register::<Read1>().map(|status| status.fully_charged)
    }

    /// Output is under light load.
    pub fn is_light_load(&mut self) -> Result<bool, Error<I::Error>> {
        self.read_register::<Read2>().map(|status| status.light_load)
    }

    /// Latched KEY events.
    pub fn key_events(&mut self) -> Result<KeyEvents, Error<I::Error>> {
        self.read_register::<KeyEvents>()
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn read_group<G: GroupFields>(&mut self, mask: RegisterMask) -> Result<G, Error<I::Error>> {
        for &register in G::GROUP.registers() {
            if mask.contains(register) {
                self.fetch(register)?;
            }
        }
        self.decode_cached()
    }

    fn decode_cached<G: GroupFields>(&self) -> Result<G, Error<I::Error>> {
        let mut fields = G::default();
        for &register in G::GROUP.registers() {
            if let Some(raw) = self.raw(register) {
                fields.decode_register(register, raw)?;
            }
        }
        Ok(fields)
    }

    fn write_group<G: GroupFields>(
        &mut self,
        fields: &G,
        mask: RegisterMask,
    ) -> Result<(), Error<I::Error>> {
        for &register in G::GROUP.registers() {
            if !mask.contains(register) {
                continue;
            }
            if !register.is_writable() {
                return Err(Error::ReadOnly { register });
            }
            let Some(retained) = self.raw(register) else {
                warn!("IP5306 {} written before it was read", register.name());
                return Err(Error::NotCached { register });
            };
            let written = fields
                .encode_register(register, retained)
                .ok_or(Error::MissingFields { register })?;
            self.store(register, written, G::held_after_write(register, retained, written))?;
        }
        Ok(())
    }

    /// One-byte read of `register`; caches the byte on success.
    fn fetch(&mut self, register: Register) -> Result<u8, Error<I::Error>> {
        let mut buf = [0u8; 1];
        if let Err(error) = self
            .i2c
            .write_read(self.address, &[register.address()], &mut buf)
        {
            warn!("IP5306 read of {} failed", register.name());
            return Err(Error::Bus { register, error });
        }
        let [raw] = buf;
        trace!("IP5306 {} -> {}", register.name(), raw);
        self.remember(register, raw);
        Ok(raw)
    }

    /// One-byte write of `register`; caches `held` on success.
    fn store(&mut self, register: Register, written: u8, held: u8) -> Result<(), Error<I::Error>> {
        if let Err(error) = self.i2c.write(self.address, &[register.address(), written]) {
            warn!("IP5306 write of {} failed", register.name());
            return Err(Error::Bus { register, error });
        }
        trace!("IP5306 {} <- {}", register.name(), written);
        self.remember(register, held);
        Ok(())
    }

    fn remember(&mut self, register: Register, raw: u8) {
        if let Some(slot) = self.cache.get_mut(register.index()) {
            *slot = Some(raw);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    const ADDR: u8 = IP5306_I2C_ADDR;

    fn read(register: Register, value: u8) -> Transaction {
        Transaction::write_read(ADDR, vec![register.address()], vec![value])
    }

    fn write(register: Register, value: u8) -> Transaction {
        Transaction::write(ADDR, vec![register.address(), value])
    }

    #[test]
    fn grouped_read_touches_only_selected_registers() {
        let expectations = [read(Register::SysCtl0, 0x37), read(Register::SysCtl2, 0x64)];
        let mut pmic = Ip5306::new(I2cMock::new(&expectations));

        let sys = pmic
            .read_system_control(RegisterMask::SYS_CTL0 | RegisterMask::SYS_CTL2)
            .unwrap();
        assert!(sys.ctl0.unwrap().boost_enable);
        assert!(sys.ctl1.is_none());
        assert_eq!(
            sys.ctl2.unwrap().light_load_shutdown_time,
            LightLoadShutdownTime::Sec32
        );
        assert_eq!(pmic.raw(Register::SysCtl1), None);

        pmic.release().done();
    }

    #[test]
    fn write_merges_into_retained_byte() {
        let expectations = [read(Register::SysCtl0, 0b1111_0111), write(Register::SysCtl0, 0b1101_0111)];
        let mut pmic = Ip5306::new(I2cMock::new(&expectations));

        let mut sys = pmic.read_system_control(RegisterMask::SYS_CTL0).unwrap();
        if let Some(ctl0) = sys.ctl0.as_mut() {
            ctl0.boost_enable = false;
        }
        pmic.write_system_control(&sys, RegisterMask::SYS_CTL0).unwrap();
        assert_eq!(pmic.raw(Register::SysCtl0), Some(0b1101_0111));

        pmic.release().done();
    }

    #[test]
    fn write_without_view_is_rejected() {
        let expectations = [read(Register::ChargerCtl0, 0x01)];
        let mut pmic = Ip5306::new(I2cMock::new(&expectations));
        pmic.read_charger_control(RegisterMask::CHARGER_CTL0).unwrap();

        let err = pmic
            .write_charger_control(&ChargerControl::default(), RegisterMask::CHARGER_CTL0)
            .unwrap_err();
        assert_eq!(err, Error::MissingFields { register: Register::ChargerCtl0 });

        pmic.release().done();
    }

    #[test]
    fn status_registers_other_than_read3_are_read_only() {
        let mut pmic = Ip5306::new(I2cMock::new(&[]));
        let err = pmic.write_status(&Status::default(), RegisterMask::READ_ALL).unwrap_err();
        assert_eq!(err, Error::ReadOnly { register: Register::Read0 });
        pmic.release().done();
    }

    #[test]
    fn modify_of_key_events_caches_cleared_flags() {
        let expectations = [read(Register::Read3, 0b0000_0011), write(Register::Read3, 0b0000_0001)];
        let mut pmic = Ip5306::new(I2cMock::new(&expectations));

        let events = pmic.update(|events: &mut KeyEvents| events.long_press = false).unwrap();
        assert!(events.short_press);
        assert_eq!(pmic.raw(Register::Read3), Some(0b0000_0010));
        assert_eq!(
            pmic.cached::<KeyEvents>().unwrap(),
            KeyEvents {
                long_press: true,
                ..KeyEvents::NONE
            }
        );
        pmic.release().done();
    }

    #[test]
    fn cached_needs_a_prior_read() {
        let expectations = [read(Register::Read1, 0b0000_1000)];
        let mut pmic = Ip5306::new(I2cMock::new(&expectations));

        assert_eq!(
            pmic.cached::<Read1>().unwrap_err(),
            Error::NotCached { register: Register::Read1 }
        );
        assert!(pmic.is_fully_charged().unwrap());
        assert!(pmic.cached::<Read1>().unwrap().fully_charged);

        pmic.release().done();
    }

    #[test]
    fn set_charging_current_is_read_modify_write() {
        let expectations = [
            read(Register::ChgDigCtl0, 0b1110_0001),
            // 1050 = 50 + 200 + 800
            write(Register::ChgDigCtl0, 0b1110_1010),
        ];
        let mut pmic = Ip5306::new(I2cMock::new(&expectations));

        pmic.set_charging_current(ChargingCurrent::from_milliamps(1050).unwrap())
            .unwrap();
        assert_eq!(
            pmic.cached::<ChgDigCtl0>().unwrap().charging_current.milliamps(),
            1050
        );

        pmic.release().done();
    }

    #[test]
    fn invalidate_forgets_retained_bytes() {
        let expectations = [read(Register::SysCtl2, 0x00)];
        let mut pmic = Ip5306::new(I2cMock::new(&expectations));
        pmic.read_system_control(RegisterMask::SYS_CTL2).unwrap();
        pmic.invalidate();
        assert_eq!(pmic.raw(Register::SysCtl2), None);
        pmic.release().done();
    }
}
