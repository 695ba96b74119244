//! Data types for MP8862 driver (based on datasheet).

use crate::registers::{Ctl1Bits, Ctl2Bits, DEFAULT_I2C_ADDRESS, StatusBits};

/// I2C slave addresses selected by the ADD pin divider.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum I2cAddress {
    /// ADD = 0.00 .. 0.25 * VCC.
    #[default]
    Addr0x69,
    /// ADD = 0.25 .. 0.50 * VCC.
    Addr0x6B,
    /// ADD = 0.50 .. 0.75 * VCC.
    Addr0x6D,
    /// ADD = 0.75 .. 1.00 * VCC.
    Addr0x6F,
}

impl I2cAddress {
    pub const fn bits(self) -> u8 {
        match self {
            I2cAddress::Addr0x69 => DEFAULT_I2C_ADDRESS,
            I2cAddress::Addr0x6B => 0x6B,
            I2cAddress::Addr0x6D => 0x6D,
            I2cAddress::Addr0x6F => 0x6F,
        }
    }
}

/// Software ceilings applied by the physical-unit setters before clamping.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SoftLimits {
    pub vout_mv: u16,
    pub iout_ma: u16,
}

impl SoftLimits {
    pub const DEFAULT_VOUT_MV: u16 = 5_500;
    pub const DEFAULT_IOUT_MA: u16 = 3_000;
}

impl Default for SoftLimits {
    fn default() -> Self {
        Self {
            vout_mv: Self::DEFAULT_VOUT_MV,
            iout_ma: Self::DEFAULT_IOUT_MA,
        }
    }
}

/// Light-load switching behaviour (CTL1.MODE).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SwitchingMode {
    /// Automatic PFM/PWM.
    AutoPfmPwm,
    /// Forced PWM (reset default).
    ForcedPwm,
}

/// Over-current / over-voltage response (CTL1.HICCUP_OCP_OVP).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProtectionMode {
    LatchOff,
    /// Reset default.
    Hiccup,
}

/// Output soft-start time (CTL2.SS).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SoftStart {
    Us300,
    Us500,
    Us700,
    /// Reset default.
    Us900,
}

/// Output voltage compensation against load current (CTL2.LINE_DROP_COMP), at 2 A.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineCompensation {
    /// Reset default.
    Off,
    Mv100,
    Mv200,
    Mv400,
}

impl SwitchingMode {
    pub(crate) fn bits(self) -> Ctl1Bits {
        match self {
            SwitchingMode::AutoPfmPwm => Ctl1Bits::empty(),
            SwitchingMode::ForcedPwm => Ctl1Bits::MODE,
        }
    }
}

impl ProtectionMode {
    pub(crate) fn bits(self) -> Ctl1Bits {
        match self {
            ProtectionMode::LatchOff => Ctl1Bits::empty(),
            ProtectionMode::Hiccup => Ctl1Bits::HICCUP_OCP_OVP,
        }
    }
}

impl SoftStart {
    pub(crate) fn bits(self) -> Ctl2Bits {
        match self {
            SoftStart::Us300 => Ctl2Bits::empty(),
            SoftStart::Us500 => Ctl2Bits::SS0,
            SoftStart::Us700 => Ctl2Bits::SS1,
            SoftStart::Us900 => Ctl2Bits::SS0 | Ctl2Bits::SS1,
        }
    }
}

impl LineCompensation {
    pub(crate) fn bits(self) -> Ctl2Bits {
        match self {
            LineCompensation::Off => Ctl2Bits::empty(),
            LineCompensation::Mv100 => Ctl2Bits::LINE_COMP0,
            LineCompensation::Mv200 => Ctl2Bits::LINE_COMP1,
            LineCompensation::Mv400 => Ctl2Bits::LINE_COMP0 | Ctl2Bits::LINE_COMP1,
        }
    }
}

/// Regulation loop in control, from STATUS.CC_CV.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputMode {
    ConstantVoltage,
    ConstantCurrent,
}

/// Decoded STATUS register (instantaneous values).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Status {
    pub power_good: bool,
    pub over_temp_protection: bool,
    pub over_temp_warning: bool,
    pub output_mode: OutputMode,
}

impl From<StatusBits> for Status {
    fn from(bits: StatusBits) -> Self {
        Self {
            power_good: bits.contains(StatusBits::PG),
            over_temp_protection: bits.contains(StatusBits::OTP),
            over_temp_warning: bits.contains(StatusBits::OTW),
            output_mode: if bits.contains(StatusBits::CC_CV) {
                OutputMode::ConstantCurrent
            } else {
                OutputMode::ConstantVoltage
            },
        }
    }
}

/// Identification registers.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeviceId {
    /// ID1: part number suffix (0x00 = MP8862-0000Q).
    pub part: u8,
    pub manufacturer: u8,
    pub device: u8,
    pub revision: u8,
}

impl DeviceId {
    /// Manufacturer and device ID match an MP8862.
    pub fn is_mp8862(&self) -> bool {
        self.manufacturer == crate::registers::MFR_ID_EXPECTED
            && self.device == crate::registers::DEV_ID_EXPECTED
    }
}

/// Logical states of the hardware power-up handshake. Used for tracing only.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PowerState {
    Disabled,
    EnableAsserted,
    HandshakePending,
    /// Hardware EN high, output held off through CTL1; registers accept commands.
    ControllableOff,
    /// Retry budget exhausted, enable pin rolled back.
    Failed,
}

/// Number of CTL1 write attempts that fit into the ~150 µs window after hardware EN rises.
///
/// At least three bytes (device address, register, value) must be acknowledged inside the
/// window, so 100 kHz buses cannot meet it and have no preset.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryBudget {
    /// ~25 µs per byte.
    I2c400kHz,
    /// ~10 µs per byte.
    I2c1MHz,
    /// ~3 µs per byte.
    I2c3400kHz,
    Custom(u8),
}

impl RetryBudget {
    pub const fn attempts(self) -> u8 {
        match self {
            RetryBudget::I2c400kHz => 4,
            RetryBudget::I2c1MHz => 13,
            RetryBudget::I2c3400kHz => 48,
            RetryBudget::Custom(n) => n,
        }
    }
}
