//! Register map and constants for MP8862.
//! Addresses, bit layouts and reset values follow the datasheet (revision 1 register map);
//! reserved addresses are listed with observed defaults only.

/// I2C address with ADD = 0.00 .. 0.25 * VCC.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x69;

/// Register addresses (7-bit device, 8-bit register pointer, auto-increment).
pub mod addr {
    /// VOUT[2:0] in bits 2-0.
    pub const VOUT_L: u8 = 0x00;
    /// VOUT[10:3].
    pub const VOUT_H: u8 = 0x01;
    /// GO_BIT (bit 0) and PG_DELAY_EN (bit 1).
    pub const VOUT_GO: u8 = 0x02;
    /// Output current limit, 7 bits, 50 mA LSB.
    pub const IOUT_LIM: u8 = 0x03;
    /// EN, HICCUP_OCP_OVP, DISCH_EN, MODE, FREQ.
    pub const CTL1: u8 = 0x04;
    /// LINE_DROP_COMP, SS.
    pub const CTL2: u8 = 0x05;
    /// PG, OTP, OTW, CC_CV (instantaneous).
    pub const STATUS: u8 = 0x09;
    /// Latched event flags; write 0xFF to release ALT.
    pub const INTERRUPT: u8 = 0x0A;
    pub const INT_MASK: u8 = 0x0B;
    /// Part number variant (0x00: MP8862-0000Q).
    pub const ID1: u8 = 0x0C;
    pub const MFR_ID: u8 = 0x27;
    pub const DEV_ID: u8 = 0x28;
    pub const IC_REV: u8 = 0x29;
}

/// Undocumented or reserved register addresses. No semantics are asserted for these;
/// the second value is the default observed after power-up, `None` where it varies.
pub const RESERVED: [(u8, Option<u8>); 13] = [
    (0x06, None),
    (0x07, None),
    (0x08, None),
    (0x0D, Some(0x30)),
    (0x40, Some(0x04)),
    (0x41, Some(0x3E)),
    (0x42, Some(0x00)),
    (0x43, Some(0x3C)),
    (0x44, Some(0xF0)),
    (0x45, Some(0x30)),
    (0x50, None),
    (0x51, None),
    (0x52, None),
];

/// Documented reset values of the writable registers.
pub const DEFAULTS: [(u8, u8); 6] = [
    (addr::VOUT_L, 0x04),
    (addr::VOUT_H, 0x3E),
    (addr::VOUT_GO, 0x00),
    (addr::IOUT_LIM, 0x3C),
    (addr::CTL1, 0xF0),
    (addr::CTL2, 0x30),
];

/// Expected MFR_ID content.
pub const MFR_ID_EXPECTED: u8 = 0x09;
/// Expected DEV_ID content.
pub const DEV_ID_EXPECTED: u8 = 0x58;

/// Output voltage DAC characteristics (11-bit code across VOUT_L/VOUT_H).
pub const VOUT_LSB_MV: u16 = 10;
pub const VOUT_CODE_MAX: u16 = 0x7FF;
/// Highest input that still encodes to `VOUT_CODE_MAX` (20.47 V effective).
pub const VOUT_CLAMP_MV: u16 = 20_480;
pub const VOUT_MAX_MV: u16 = VOUT_CODE_MAX * VOUT_LSB_MV;

/// Output current limit characteristics (7-bit code, ROC = 21.5 kΩ).
pub const ILIM_LSB_MA: u16 = 50;
pub const ILIM_CODE_MAX: u8 = 80;
/// Highest input that still encodes to `ILIM_CODE_MAX` (4.0 A effective).
pub const ILIM_CLAMP_MA: u16 = 4_025;
pub const ILIM_MAX_MA: u16 = ILIM_CODE_MAX as u16 * ILIM_LSB_MA;

/// Physical meaning of one raw LSB of a field.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scale {
    /// Field is a flag or enumerated selection.
    Raw,
    Millivolts(u16),
    Milliamps(u16),
}

/// A named bit field inside one register.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub register: u8,
    pub offset: u8,
    pub width: u8,
    pub scale: Scale,
}

impl Field {
    /// Mask of the field in register position.
    pub const fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) << self.offset) as u8
    }

    /// Largest raw value the field can hold.
    pub const fn max(&self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }

    /// Extract the field value from a register byte.
    pub const fn get(&self, reg: u8) -> u8 {
        (reg & self.mask()) >> self.offset
    }

    /// Replace the field inside `reg` with `value` (truncated to the field width).
    pub const fn set(&self, reg: u8, value: u8) -> u8 {
        (reg & !self.mask()) | ((value << self.offset) & self.mask())
    }
}

pub mod field {
    use super::{Field, ILIM_LSB_MA, Scale, VOUT_LSB_MV, addr};

    pub const VOUT_L: Field = Field {
        name: "VOUT[2:0]",
        register: addr::VOUT_L,
        offset: 0,
        width: 3,
        scale: Scale::Millivolts(VOUT_LSB_MV),
    };
    pub const VOUT_H: Field = Field {
        name: "VOUT[10:3]",
        register: addr::VOUT_H,
        offset: 0,
        width: 8,
        scale: Scale::Millivolts(VOUT_LSB_MV << 3),
    };
    pub const GO_BIT: Field = Field {
        name: "GO_BIT",
        register: addr::VOUT_GO,
        offset: 0,
        width: 1,
        scale: Scale::Raw,
    };
    pub const PG_DELAY_EN: Field = Field {
        name: "PG_DELAY_EN",
        register: addr::VOUT_GO,
        offset: 1,
        width: 1,
        scale: Scale::Raw,
    };
    pub const IOUT_LIM: Field = Field {
        name: "IOUT_LIM",
        register: addr::IOUT_LIM,
        offset: 0,
        width: 7,
        scale: Scale::Milliamps(ILIM_LSB_MA),
    };
    pub const FREQ: Field = Field {
        name: "FREQ",
        register: addr::CTL1,
        offset: 2,
        width: 2,
        scale: Scale::Raw,
    };
    pub const MODE: Field = Field {
        name: "MODE",
        register: addr::CTL1,
        offset: 4,
        width: 1,
        scale: Scale::Raw,
    };
    pub const DISCH_EN: Field = Field {
        name: "DISCH_EN",
        register: addr::CTL1,
        offset: 5,
        width: 1,
        scale: Scale::Raw,
    };
    pub const HICCUP_OCP_OVP: Field = Field {
        name: "HICCUP_OCP_OVP",
        register: addr::CTL1,
        offset: 6,
        width: 1,
        scale: Scale::Raw,
    };
    pub const EN: Field = Field {
        name: "EN",
        register: addr::CTL1,
        offset: 7,
        width: 1,
        scale: Scale::Raw,
    };
    pub const SS: Field = Field {
        name: "SS",
        register: addr::CTL2,
        offset: 4,
        width: 2,
        scale: Scale::Raw,
    };
    pub const LINE_DROP_COMP: Field = Field {
        name: "LINE_DROP_COMP",
        register: addr::CTL2,
        offset: 6,
        width: 2,
        scale: Scale::Raw,
    };
    pub const INT_MASK: Field = Field {
        name: "INT_MASK",
        register: addr::INT_MASK,
        offset: 0,
        width: 5,
        scale: Scale::Raw,
    };
}

/// All documented fields. The 11-bit voltage setpoint spans `VOUT_L` and `VOUT_H`;
/// each part carries the scale of its own LSB.
pub const FIELDS: [Field; 13] = [
    field::VOUT_L,
    field::VOUT_H,
    field::GO_BIT,
    field::PG_DELAY_EN,
    field::IOUT_LIM,
    field::FREQ,
    field::MODE,
    field::DISCH_EN,
    field::HICCUP_OCP_OVP,
    field::EN,
    field::SS,
    field::LINE_DROP_COMP,
    field::INT_MASK,
];

const _: () = assert!(field::VOUT_L.width + field::VOUT_H.width == 11);
const _: () = assert!(VOUT_CODE_MAX as u32 == (1u32 << 11) - 1);
const _: () = assert!(ILIM_CODE_MAX <= field::IOUT_LIM.max());
const _: () = assert!(vout_mv_to_code(VOUT_CLAMP_MV) == VOUT_CODE_MAX);
const _: () = assert!(ilim_ma_to_code(ILIM_CLAMP_MA) == ILIM_CODE_MAX);

bitflags::bitflags! {
    /// VOUT_GO register bits (0x02).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct VoutGoBits: u8 {
        /// Bit 0: apply VOUT_L/VOUT_H; self-clears once the new setpoint is reached.
        const GO          = 1 << 0;
        /// Bit 1: 100 µs rising delay on PG.
        const PG_DELAY_EN = 1 << 1;
    }

    /// CTL1 register bits (0x04).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Ctl1Bits: u8 {
        /// Bit 7: soft enable (takes over while hardware EN is high).
        const EN             = 1 << 7;
        /// Bit 6: OCP/OVP response, 0 = latch-off, 1 = hiccup.
        const HICCUP_OCP_OVP = 1 << 6;
        /// Bit 5: output discharge on EN or VIN shutdown.
        const DISCH_EN       = 1 << 5;
        /// Bit 4: 0 = auto PFM/PWM, 1 = forced PWM.
        const MODE           = 1 << 4;
        /// Bits 3-2: switching frequency, only 0b00 (500 kHz) is specified.
        const FREQ0          = 1 << 2;
        const FREQ1          = 1 << 3;
    }

    /// CTL2 register bits (0x05). Bits 3-0 reserved.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Ctl2Bits: u8 {
        const SS0         = 1 << 4;
        const SS1         = 1 << 5;
        const LINE_COMP0  = 1 << 6;
        const LINE_COMP1  = 1 << 7;
    }

    /// STATUS register bits (0x09). Bits 3-0 reserved.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct StatusBits: u8 {
        const PG    = 1 << 7;
        const OTP   = 1 << 6;
        const OTW   = 1 << 5;
        /// 1 = constant-current, 0 = constant-voltage.
        const CC_CV = 1 << 4;
    }

    /// INTERRUPT register bits (0x0A), edge-triggered.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct InterruptBits: u8 {
        const OTEMPP_ENTER     = 1 << 7;
        const OT_WARNING_ENTER = 1 << 6;
        const OC_ENTER         = 1 << 5;
        const OC_RECOVER       = 1 << 4;
        const UVP_FALLING      = 1 << 3;
        const OTEMPP_EXIT      = 1 << 2;
        const OT_WARNING_EXIT  = 1 << 1;
        const PG_RISING        = 1 << 0;
    }

    /// INT_MASK register bits (0x0B). A set bit disables that ALT source.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct IntMaskBits: u8 {
        const OTP_MSK = 1 << 4;
        const OTW_MSK = 1 << 3;
        /// Masks both OC/CC entry and recovery.
        const OC_MSK  = 1 << 2;
        const UVP_MSK = 1 << 1;
        const PG_MSK  = 1 << 0;
    }
}

impl Ctl1Bits {
    /// Hiccup, discharge, forced PWM, 500 kHz; soft EN cleared.
    pub const DEFAULT_OUTPUT_OFF: u8 = 0x70;
    /// Reset value: as `DEFAULT_OUTPUT_OFF` with soft EN set.
    pub const DEFAULT_OUTPUT_ON: u8 = 0xF0;
}

impl InterruptBits {
    /// Value written to INTERRUPT to clear all flags and release ALT.
    pub const CLEAR_ALL: u8 = 0xFF;
}

/// Convert millivolts to the 11-bit VOUT code. Clamps to `VOUT_CLAMP_MV`.
///
/// `(mv * 819 + 5 * 819) >> 13` approximates `mv / 10` with half-LSB rounding bias.
pub const fn vout_mv_to_code(mv: u16) -> u16 {
    let mv = (if mv > VOUT_CLAMP_MV { VOUT_CLAMP_MV } else { mv }) as u32;
    (((mv * 819 + 5 * 819) >> 13) as u16) & VOUT_CODE_MAX
}

/// Convert an 11-bit VOUT code to millivolts.
pub const fn code_to_vout_mv(code: u16) -> u16 {
    (code & VOUT_CODE_MAX) * VOUT_LSB_MV
}

/// Split a VOUT code into the (VOUT_L, VOUT_H) register bytes.
pub const fn split_vout_code(code: u16) -> [u8; 2] {
    [
        (code as u8) & field::VOUT_L.mask(),
        (code >> field::VOUT_L.width) as u8 & field::VOUT_H.mask(),
    ]
}

/// Join (VOUT_L, VOUT_H) register bytes into a VOUT code; reserved VOUT_L bits are dropped.
pub const fn join_vout_code(low: u8, high: u8) -> u16 {
    ((high as u16) << field::VOUT_L.width) | field::VOUT_L.get(low) as u16
}

/// Convert milliamps to the 7-bit IOUT_LIM code. Clamps to `ILIM_CLAMP_MA`.
///
/// `(ma * 1311 + 24 * 1311) >> 16` approximates `ma / 50` with rounding bias.
pub const fn ilim_ma_to_code(ma: u16) -> u8 {
    let ma = (if ma > ILIM_CLAMP_MA { ILIM_CLAMP_MA } else { ma }) as u32;
    (((ma * 1311 + 24 * 1311) >> 16) as u8) & field::IOUT_LIM.mask()
}

/// Convert an IOUT_LIM register value to milliamps.
pub const fn code_to_ilim_ma(code: u8) -> u16 {
    field::IOUT_LIM.get(code) as u16 * ILIM_LSB_MA
}
