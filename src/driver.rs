//! Driver for MP8862.
//! Provides blocking I2C helpers; the async version mirrors this API behind the `async` feature.

use crate::data_types::{
    DeviceId, I2cAddress, LineCompensation, ProtectionMode, SoftLimits, SoftStart, Status,
    SwitchingMode,
};
use crate::error::Error;
use crate::registers::{
    Ctl1Bits, Ctl2Bits, IntMaskBits, InterruptBits, StatusBits, VoutGoBits, addr, code_to_ilim_ma,
    code_to_vout_mv, ilim_ma_to_code, join_vout_code, split_vout_code, vout_mv_to_code,
};

/// Address-only probe attempts made by [`Mp8862::probe`].
pub const PROBE_ATTEMPTS: u8 = 3;

/// Longest burst accepted by [`Mp8862::write_regs`] (covers 0x00..=0x0B in one go).
pub const MAX_BURST_LEN: usize = 16;

/// MP8862 driver.
///
/// `I2C` may be an owned bus or `&mut` of a bus shared with other devices; either way the
/// driver never outlives it.
pub struct Mp8862<I2C> {
    pub(crate) i2c: I2C,
    pub(crate) address: u8,
    initialized: bool,
    limits: SoftLimits,
}

impl<I2C> Mp8862<I2C> {
    /// Create a new driver instance with the default I2C address (0x69).
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, I2cAddress::default())
    }

    /// Create a new driver instance for the address selected by the ADD pin.
    pub fn with_address(i2c: I2C, address: I2cAddress) -> Self {
        Self {
            i2c,
            address: address.bits(),
            initialized: false,
            limits: SoftLimits::default(),
        }
    }

    /// Replace the default soft limits (5500 mV / 3000 mA).
    pub fn with_soft_limits(mut self, limits: SoftLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Return the 7-bit I2C address configured for this instance.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Whether the last [`init`](Self::init) found the device on the bus.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn soft_limits(&self) -> SoftLimits {
        self.limits
    }

    pub fn set_soft_limits(&mut self, limits: SoftLimits) {
        self.limits = limits;
    }

    /// Release the underlying bus.
    pub fn free(self) -> I2C {
        self.i2c
    }

    fn check_vout<E>(&self, mv: u16) -> Result<u16, Error<E>> {
        if mv > self.limits.vout_mv {
            #[cfg(feature = "defmt")]
            defmt::debug!("VOUT {} mV rejected, soft limit {} mV", mv, self.limits.vout_mv);
            return Err(Error::OutOfRange);
        }
        let code = vout_mv_to_code(mv);
        // Rounding bias may land one step above an unaligned limit.
        if code_to_vout_mv(code) > self.limits.vout_mv {
            return Ok(code - 1);
        }
        Ok(code)
    }

    fn check_ilim<E>(&self, ma: u16) -> Result<u8, Error<E>> {
        if ma > self.limits.iout_ma {
            #[cfg(feature = "defmt")]
            defmt::debug!("ILIM {} mA rejected, soft limit {} mA", ma, self.limits.iout_ma);
            return Err(Error::OutOfRange);
        }
        let code = ilim_ma_to_code(ma);
        if code_to_ilim_ma(code) > self.limits.iout_ma {
            return Ok(code - 1);
        }
        Ok(code)
    }
}

/// VOUT_L, VOUT_H and VOUT_GO payload for a setpoint code.
fn vout_payload(code: u16) -> [u8; 3] {
    let [low, high] = split_vout_code(code);
    [low, high, (VoutGoBits::GO | VoutGoBits::PG_DELAY_EN).bits()]
}

#[cfg(not(feature = "defmt"))]
fn warn_soft_en(_soft_en: bool) {}

#[cfg(feature = "defmt")]
fn warn_soft_en(soft_en: bool) {
    if !soft_en {
        defmt::warn!("set_enable(false) leaves CTL1.EN set; disable through the hardware EN pin");
    }
}

impl<I2C> Mp8862<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Probe the device and record the result in the initialization flag.
    ///
    /// Soft limits are left as they are; they are set to defaults only at construction.
    pub fn init(&mut self) -> Result<(), Error<I2C::Error>> {
        let probed = self.probe();
        self.initialized = probed.is_ok();
        probed
    }

    /// Address-only liveness check, retried up to [`PROBE_ATTEMPTS`] times.
    pub fn probe(&mut self) -> Result<(), Error<I2C::Error>> {
        let mut result = Ok(());
        for _ in 0..PROBE_ATTEMPTS {
            result = self.i2c.write(self.address, &[]).map_err(Error::I2c);
            if result.is_ok() {
                break;
            }
        }
        result
    }

    /// `true` when the device acknowledges its address.
    pub fn is_ready(&mut self) -> bool {
        self.probe().is_ok()
    }

    /// Write a single register.
    pub fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(Error::I2c)
    }

    /// Read a single register.
    pub fn read_reg(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    /// Update masked bits in a register (read-modify-write).
    pub fn update_reg(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg(reg)?;
        let new = (cur & !mask) | (value & mask);
        self.write_reg(reg, new)
    }

    /// Write a burst starting at a register. The device post-increments the register
    /// pointer and skips read-only registers on its own.
    pub fn write_regs(&mut self, start_reg: u8, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        let mut buf = [0u8; MAX_BURST_LEN + 1];
        if data.len() > MAX_BURST_LEN {
            return Err(Error::InvalidConfig);
        }
        buf[0] = start_reg;
        buf[1..=data.len()].copy_from_slice(data);
        self.i2c
            .write(self.address, &buf[..=data.len()])
            .map_err(Error::I2c)
    }

    /// Read a burst starting at a register. Unmapped addresses read as 0x00.
    pub fn read_regs(&mut self, start_reg: u8, data: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write_read(self.address, &[start_reg], data)
            .map_err(Error::I2c)
    }

    /// Set the output voltage setpoint (mV) and apply it with GO in the same transaction.
    ///
    /// Fails with [`Error::OutOfRange`] above the voltage soft limit without touching the
    /// bus; otherwise clamps to 20.47 V. The programmed value never exceeds the soft limit,
    /// so a request at an unaligned limit rounds down to the step below it.
    pub fn set_vout_mv(&mut self, mv: u16) -> Result<(), Error<I2C::Error>> {
        let code = self.check_vout(mv)?;
        self.write_regs(addr::VOUT_L, &vout_payload(code))
    }

    /// Read the output voltage setpoint (mV).
    pub fn get_vout_mv(&mut self) -> Result<u16, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.read_regs(addr::VOUT_L, &mut buf)?;
        Ok(code_to_vout_mv(join_vout_code(buf[0], buf[1])))
    }

    /// Set the output current limit (mA).
    ///
    /// Fails with [`Error::OutOfRange`] above the current soft limit without touching the
    /// bus; otherwise clamps to 4.0 A. Like [`set_vout_mv`](Self::set_vout_mv), the
    /// programmed value never exceeds the soft limit.
    pub fn set_ilim_ma(&mut self, ma: u16) -> Result<(), Error<I2C::Error>> {
        let code = self.check_ilim(ma)?;
        self.write_reg(addr::IOUT_LIM, code)
    }

    /// Read the output current limit (mA).
    pub fn get_ilim_ma(&mut self) -> Result<u16, Error<I2C::Error>> {
        let val = self.read_reg(addr::IOUT_LIM)?;
        Ok(code_to_ilim_ma(val))
    }

    /// Power-good indication from STATUS.
    pub fn read_pg(&mut self) -> Result<bool, Error<I2C::Error>> {
        Ok(self.read_status_raw()?.contains(StatusBits::PG))
    }

    /// Set the CTL1 soft-enable bit.
    ///
    /// This only ever sets EN: `soft_en = false` leaves the bit untouched. Turning the
    /// output off goes through the hardware EN pin or a raw CTL1 write.
    pub fn set_enable(&mut self, soft_en: bool) -> Result<(), Error<I2C::Error>> {
        warn_soft_en(soft_en);
        let mut ctl1 = Ctl1Bits::from_bits_retain(self.read_reg(addr::CTL1)?);
        ctl1.insert(Ctl1Bits::EN);
        self.write_reg(addr::CTL1, ctl1.bits())
    }

    /// Write the CTL1 reset value (soft EN set, hiccup, discharge, forced PWM).
    pub fn output_on(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg(addr::CTL1, Ctl1Bits::DEFAULT_OUTPUT_ON)
    }

    pub fn set_switching_mode(&mut self, mode: SwitchingMode) -> Result<(), Error<I2C::Error>> {
        self.update_reg(addr::CTL1, Ctl1Bits::MODE.bits(), mode.bits().bits())
    }

    pub fn set_protection_mode(&mut self, mode: ProtectionMode) -> Result<(), Error<I2C::Error>> {
        self.update_reg(addr::CTL1, Ctl1Bits::HICCUP_OCP_OVP.bits(), mode.bits().bits())
    }

    /// Enable or disable output discharge on EN/VIN shutdown.
    pub fn set_output_discharge(&mut self, enable: bool) -> Result<(), Error<I2C::Error>> {
        let value = if enable { Ctl1Bits::DISCH_EN.bits() } else { 0 };
        self.update_reg(addr::CTL1, Ctl1Bits::DISCH_EN.bits(), value)
    }

    pub fn set_soft_start(&mut self, ss: SoftStart) -> Result<(), Error<I2C::Error>> {
        let mask = (Ctl2Bits::SS0 | Ctl2Bits::SS1).bits();
        self.update_reg(addr::CTL2, mask, ss.bits().bits())
    }

    pub fn set_line_compensation(
        &mut self,
        comp: LineCompensation,
    ) -> Result<(), Error<I2C::Error>> {
        let mask = (Ctl2Bits::LINE_COMP0 | Ctl2Bits::LINE_COMP1).bits();
        self.update_reg(addr::CTL2, mask, comp.bits().bits())
    }

    /// Read STATUS register raw bits.
    pub fn read_status_raw(&mut self) -> Result<StatusBits, Error<I2C::Error>> {
        let val = self.read_reg(addr::STATUS)?;
        Ok(StatusBits::from_bits_truncate(val))
    }

    /// Decode STATUS.
    pub fn read_status(&mut self) -> Result<Status, Error<I2C::Error>> {
        Ok(Status::from(self.read_status_raw()?))
    }

    /// Read latched interrupt flags.
    pub fn read_interrupts(&mut self) -> Result<InterruptBits, Error<I2C::Error>> {
        let val = self.read_reg(addr::INTERRUPT)?;
        Ok(InterruptBits::from_bits_retain(val))
    }

    /// Clear all interrupt flags and release the ALT pin.
    pub fn clear_interrupts(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg(addr::INTERRUPT, InterruptBits::CLEAR_ALL)
    }

    /// Mask ALT sources; a set bit disables that source.
    pub fn set_interrupt_mask(&mut self, mask: IntMaskBits) -> Result<(), Error<I2C::Error>> {
        self.write_reg(addr::INT_MASK, mask.bits())
    }

    pub fn read_device_id(&mut self) -> Result<DeviceId, Error<I2C::Error>> {
        let part = self.read_reg(addr::ID1)?;
        let mut ids = [0u8; 3];
        self.read_regs(addr::MFR_ID, &mut ids)?;
        Ok(DeviceId {
            part,
            manufacturer: ids[0],
            device: ids[1],
            revision: ids[2],
        })
    }
}

#[cfg(feature = "async")]
impl<I2C> Mp8862<I2C>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    /// Async version of [`init`].
    pub async fn init_async(&mut self) -> Result<(), Error<I2C::Error>> {
        let probed = self.probe_async().await;
        self.initialized = probed.is_ok();
        probed
    }

    pub async fn probe_async(&mut self) -> Result<(), Error<I2C::Error>> {
        let mut result = Ok(());
        for _ in 0..PROBE_ATTEMPTS {
            result = self.i2c.write(self.address, &[]).await.map_err(Error::I2c);
            if result.is_ok() {
                break;
            }
        }
        result
    }

    pub async fn is_ready_async(&mut self) -> bool {
        self.probe_async().await.is_ok()
    }

    pub async fn write_reg_async(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[reg, value])
            .await
            .map_err(Error::I2c)
    }

    pub async fn read_reg_async(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .await
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    pub async fn update_reg_async(
        &mut self,
        reg: u8,
        mask: u8,
        value: u8,
    ) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg_async(reg).await?;
        let new = (cur & !mask) | (value & mask);
        self.write_reg_async(reg, new).await
    }

    pub async fn write_regs_async(
        &mut self,
        start_reg: u8,
        data: &[u8],
    ) -> Result<(), Error<I2C::Error>> {
        let mut buf = [0u8; MAX_BURST_LEN + 1];
        if data.len() > MAX_BURST_LEN {
            return Err(Error::InvalidConfig);
        }
        buf[0] = start_reg;
        buf[1..=data.len()].copy_from_slice(data);
        self.i2c
            .write(self.address, &buf[..=data.len()])
            .await
            .map_err(Error::I2c)
    }

    pub async fn read_regs_async(
        &mut self,
        start_reg: u8,
        data: &mut [u8],
    ) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write_read(self.address, &[start_reg], data)
            .await
            .map_err(Error::I2c)
    }

    pub async fn set_vout_mv_async(&mut self, mv: u16) -> Result<(), Error<I2C::Error>> {
        let code = self.check_vout(mv)?;
        self.write_regs_async(addr::VOUT_L, &vout_payload(code)).await
    }

    pub async fn get_vout_mv_async(&mut self) -> Result<u16, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.read_regs_async(addr::VOUT_L, &mut buf).await?;
        Ok(code_to_vout_mv(join_vout_code(buf[0], buf[1])))
    }

    pub async fn set_ilim_ma_async(&mut self, ma: u16) -> Result<(), Error<I2C::Error>> {
        let code = self.check_ilim(ma)?;
        self.write_reg_async(addr::IOUT_LIM, code).await
    }

    pub async fn get_ilim_ma_async(&mut self) -> Result<u16, Error<I2C::Error>> {
        let val = self.read_reg_async(addr::IOUT_LIM).await?;
        Ok(code_to_ilim_ma(val))
    }

    pub async fn read_pg_async(&mut self) -> Result<bool, Error<I2C::Error>> {
        Ok(self.read_status_raw_async().await?.contains(StatusBits::PG))
    }

    pub async fn set_enable_async(&mut self, soft_en: bool) -> Result<(), Error<I2C::Error>> {
        warn_soft_en(soft_en);
        let mut ctl1 = Ctl1Bits::from_bits_retain(self.read_reg_async(addr::CTL1).await?);
        ctl1.insert(Ctl1Bits::EN);
        self.write_reg_async(addr::CTL1, ctl1.bits()).await
    }

    pub async fn output_on_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg_async(addr::CTL1, Ctl1Bits::DEFAULT_OUTPUT_ON).await
    }

    pub async fn set_switching_mode_async(
        &mut self,
        mode: SwitchingMode,
    ) -> Result<(), Error<I2C::Error>> {
        self.update_reg_async(addr::CTL1, Ctl1Bits::MODE.bits(), mode.bits().bits())
            .await
    }

    pub async fn set_protection_mode_async(
        &mut self,
        mode: ProtectionMode,
    ) -> Result<(), Error<I2C::Error>> {
        self.update_reg_async(addr::CTL1, Ctl1Bits::HICCUP_OCP_OVP.bits(), mode.bits().bits())
            .await
    }

    pub async fn set_output_discharge_async(
        &mut self,
        enable: bool,
    ) -> Result<(), Error<I2C::Error>> {
        let value = if enable { Ctl1Bits::DISCH_EN.bits() } else { 0 };
        self.update_reg_async(addr::CTL1, Ctl1Bits::DISCH_EN.bits(), value)
            .await
    }

    pub async fn set_soft_start_async(&mut self, ss: SoftStart) -> Result<(), Error<I2C::Error>> {
        let mask = (Ctl2Bits::SS0 | Ctl2Bits::SS1).bits();
        self.update_reg_async(addr::CTL2, mask, ss.bits().bits()).await
    }

    pub async fn set_line_compensation_async(
        &mut self,
        comp: LineCompensation,
    ) -> Result<(), Error<I2C::Error>> {
        let mask = (Ctl2Bits::LINE_COMP0 | Ctl2Bits::LINE_COMP1).bits();
        self.update_reg_async(addr::CTL2, mask, comp.bits().bits()).await
    }

    pub async fn read_status_raw_async(&mut self) -> Result<StatusBits, Error<I2C::Error>> {
        let val = self.read_reg_async(addr::STATUS).await?;
        Ok(StatusBits::from_bits_truncate(val))
    }

    pub async fn read_status_async(&mut self) -> Result<Status, Error<I2C::Error>> {
        Ok(Status::from(self.read_status_raw_async().await?))
    }

    pub async fn read_interrupts_async(&mut self) -> Result<InterruptBits, Error<I2C::Error>> {
        let val = self.read_reg_async(addr::INTERRUPT).await?;
        Ok(InterruptBits::from_bits_retain(val))
    }

    pub async fn clear_interrupts_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg_async(addr::INTERRUPT, InterruptBits::CLEAR_ALL).await
    }

    pub async fn set_interrupt_mask_async(
        &mut self,
        mask: IntMaskBits,
    ) -> Result<(), Error<I2C::Error>> {
        self.write_reg_async(addr::INT_MASK, mask.bits()).await
    }

    pub async fn read_device_id_async(&mut self) -> Result<DeviceId, Error<I2C::Error>> {
        let part = self.read_reg_async(addr::ID1).await?;
        let mut ids = [0u8; 3];
        self.read_regs_async(addr::MFR_ID, &mut ids).await?;
        Ok(DeviceId {
            part,
            manufacturer: ids[0],
            device: ids[1],
            revision: ids[2],
        })
    }
}
