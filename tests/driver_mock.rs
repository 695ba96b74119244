use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};
use mp8862_rs::data_types::{I2cAddress, OutputMode, SoftLimits, SoftStart, SwitchingMode};
use mp8862_rs::driver::Mp8862;
use mp8862_rs::error::Error;
use mp8862_rs::registers::IntMaskBits;

const NACK: ErrorKind = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);

#[test]
fn init_probes_address_and_sets_flag() {
    let expectations = [I2cTrans::write(0x69, vec![])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    assert!(!driver.is_initialized());
    driver.init().unwrap();
    assert!(driver.is_initialized());
    assert_eq!(driver.soft_limits(), SoftLimits { vout_mv: 5_500, iout_ma: 3_000 });
    driver.free().done();
}

#[test]
fn init_keeps_caller_soft_limits() {
    let limits = SoftLimits {
        vout_mv: 12_000,
        iout_ma: 1_500,
    };
    let expectations = [I2cTrans::write(0x69, vec![]), I2cTrans::write(0x69, vec![])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock).with_soft_limits(limits);
    driver.init().unwrap();
    driver.init().unwrap();
    assert_eq!(driver.soft_limits(), limits);
    driver.free().done();
}

#[test]
fn init_reports_absent_device_after_three_attempts() {
    let expectations = [
        I2cTrans::write(0x6D, vec![]).with_error(NACK),
        I2cTrans::write(0x6D, vec![]).with_error(NACK),
        I2cTrans::write(0x6D, vec![]).with_error(NACK),
    ];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::with_address(mock, I2cAddress::Addr0x6D);
    assert_eq!(driver.init(), Err(Error::I2c(NACK)));
    assert!(!driver.is_initialized());
    driver.free().done();
}

#[test]
fn is_ready_succeeds_on_retry() {
    let expectations = [
        I2cTrans::write(0x69, vec![]).with_error(NACK),
        I2cTrans::write(0x69, vec![]),
    ];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    assert!(driver.is_ready());
    assert!(!driver.is_initialized());
    driver.free().done();
}

#[test]
fn burst_write_and_read_use_single_transactions() {
    let expectations = [
        I2cTrans::write(0x69, vec![0x04, 0x70, 0x30]),
        I2cTrans::write_read(0x69, vec![0x27], vec![0x09, 0x58, 0x01]),
    ];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    driver.write_regs(0x04, &[0x70, 0x30]).unwrap();
    let mut buf = [0u8; 3];
    driver.read_regs(0x27, &mut buf).unwrap();
    assert_eq!(buf, [0x09, 0x58, 0x01]);
    driver.free().done();
}

#[test]
fn burst_longer_than_buffer_is_rejected() {
    let mock = I2cMock::new(&[]);
    let mut driver = Mp8862::new(mock);
    assert_eq!(driver.write_regs(0x00, &[0u8; 17]), Err(Error::InvalidConfig));
    driver.free().done();
}

#[test]
fn set_vout_writes_setpoint_and_go_in_one_transaction() {
    // 5000 mV -> code 500 -> VOUT_L = 0x04, VOUT_H = 0x3E, VOUT_GO = GO | PG_DELAY_EN
    let expectations = [I2cTrans::write(0x69, vec![0x00, 0x04, 0x3E, 0x03])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    driver.set_vout_mv(5_000).unwrap();
    driver.free().done();
}

#[test]
fn set_vout_above_soft_limit_never_touches_bus() {
    let mock = I2cMock::new(&[]);
    let mut driver = Mp8862::new(mock);
    assert_eq!(driver.set_vout_mv(6_000), Err(Error::OutOfRange));
    driver.free().done();
}

#[test]
fn set_vout_clamps_after_soft_limit_check() {
    let expectations = [I2cTrans::write(0x69, vec![0x00, 0x07, 0xFF, 0x03])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock).with_soft_limits(SoftLimits {
        vout_mv: u16::MAX,
        iout_ma: 3_000,
    });
    driver.set_vout_mv(22_000).unwrap();
    driver.free().done();
}

#[test]
fn get_vout_joins_both_registers() {
    let expectations = [I2cTrans::write_read(0x69, vec![0x00], vec![0xFC, 0x3E])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    assert_eq!(driver.get_vout_mv().unwrap(), 5_000);
    driver.free().done();
}

#[test]
fn set_ilim_clamps_to_4a_and_reads_back() {
    let expectations = [
        I2cTrans::write(0x69, vec![0x03, 80]),
        I2cTrans::write_read(0x69, vec![0x03], vec![80]),
    ];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    driver.set_soft_limits(SoftLimits {
        vout_mv: 5_500,
        iout_ma: 5_000,
    });
    driver.set_ilim_ma(4_025).unwrap();
    assert_eq!(driver.get_ilim_ma().unwrap(), 4_000);
    driver.free().done();
}

#[test]
fn set_ilim_above_soft_limit_never_touches_bus() {
    let mock = I2cMock::new(&[]);
    let mut driver = Mp8862::new(mock);
    assert_eq!(driver.set_ilim_ma(3_050), Err(Error::OutOfRange));
    driver.free().done();
}

#[test]
fn set_vout_at_unaligned_limit_rounds_down() {
    // 5498 mV would round to code 550 (5500 mV); code 549 is written instead.
    let expectations = [I2cTrans::write(0x69, vec![0x00, 0x05, 0x44, 0x03])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock).with_soft_limits(SoftLimits {
        vout_mv: 5_498,
        iout_ma: 3_000,
    });
    driver.set_vout_mv(5_498).unwrap();
    driver.free().done();
}

#[test]
fn set_vout_at_aligned_limit_is_accepted() {
    let expectations = [I2cTrans::write(0x69, vec![0x00, 0x06, 0x44, 0x03])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    driver.set_vout_mv(5_500).unwrap();
    driver.free().done();
}

#[test]
fn set_ilim_at_unaligned_limit_rounds_down() {
    // 2990 mA would round to code 60 (3000 mA).
    let expectations = [I2cTrans::write(0x69, vec![0x03, 59])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock).with_soft_limits(SoftLimits {
        vout_mv: 5_500,
        iout_ma: 2_990,
    });
    driver.set_ilim_ma(2_990).unwrap();
    driver.free().done();
}

#[test]
fn set_ilim_at_aligned_limit_is_accepted() {
    let expectations = [I2cTrans::write(0x69, vec![0x03, 60])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    driver.set_ilim_ma(3_000).unwrap();
    driver.free().done();
}

#[test]
fn transport_errors_are_surfaced() {
    let expectations = [I2cTrans::write(0x69, vec![0x03, 0x3C]).with_error(NACK)];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    assert_eq!(driver.set_ilim_ma(3_000), Err(Error::I2c(NACK)));
    driver.free().done();
}

#[test]
fn read_pg_checks_bit7() {
    let expectations = [
        I2cTrans::write_read(0x69, vec![0x09], vec![0x80]),
        I2cTrans::write_read(0x69, vec![0x09], vec![0x70]),
    ];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    assert!(driver.read_pg().unwrap());
    assert!(!driver.read_pg().unwrap());
    driver.free().done();
}

#[test]
fn set_enable_only_ever_sets_en() {
    let expectations = [
        I2cTrans::write_read(0x69, vec![0x04], vec![0x70]),
        I2cTrans::write(0x69, vec![0x04, 0xF0]),
        I2cTrans::write_read(0x69, vec![0x04], vec![0xF0]),
        I2cTrans::write(0x69, vec![0x04, 0xF0]),
        I2cTrans::write_read(0x69, vec![0x04], vec![0xF0]),
        I2cTrans::write(0x69, vec![0x04, 0xF0]),
    ];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    driver.set_enable(true).unwrap();
    driver.set_enable(true).unwrap();
    driver.set_enable(false).unwrap();
    driver.free().done();
}

#[test]
fn set_enable_skips_write_when_read_fails() {
    let expectations = [I2cTrans::write_read(0x69, vec![0x04], vec![0x00]).with_error(NACK)];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    assert_eq!(driver.set_enable(true), Err(Error::I2c(NACK)));
    driver.free().done();
}

#[test]
fn ctl_helpers_preserve_other_bits() {
    let expectations = [
        // forced PWM -> auto PFM/PWM clears bit 4 only
        I2cTrans::write_read(0x69, vec![0x04], vec![0xF0]),
        I2cTrans::write(0x69, vec![0x04, 0xE0]),
        // SS 900 µs -> 300 µs, line comp untouched
        I2cTrans::write_read(0x69, vec![0x05], vec![0x70]),
        I2cTrans::write(0x69, vec![0x05, 0x40]),
    ];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    driver.set_switching_mode(SwitchingMode::AutoPfmPwm).unwrap();
    driver.set_soft_start(SoftStart::Us300).unwrap();
    driver.free().done();
}

#[test]
fn output_on_writes_ctl1_reset_value() {
    let expectations = [I2cTrans::write(0x69, vec![0x04, 0xF0])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    driver.output_on().unwrap();
    driver.free().done();
}

#[test]
fn read_status_decodes_flags() {
    let expectations = [I2cTrans::write_read(0x69, vec![0x09], vec![0b1011_0000])];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    let status = driver.read_status().unwrap();
    assert!(status.power_good);
    assert!(!status.over_temp_protection);
    assert!(status.over_temp_warning);
    assert_eq!(status.output_mode, OutputMode::ConstantCurrent);
    driver.free().done();
}

#[test]
fn interrupts_read_clear_and_mask() {
    let expectations = [
        I2cTrans::write_read(0x69, vec![0x0A], vec![0x21]),
        I2cTrans::write(0x69, vec![0x0A, 0xFF]),
        I2cTrans::write(0x69, vec![0x0B, 0x18]),
    ];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    let flags = driver.read_interrupts().unwrap();
    assert_eq!(flags.bits(), 0x21);
    driver.clear_interrupts().unwrap();
    driver
        .set_interrupt_mask(IntMaskBits::OTP_MSK | IntMaskBits::OTW_MSK)
        .unwrap();
    driver.free().done();
}

#[test]
fn read_device_id_identifies_mp8862() {
    let expectations = [
        I2cTrans::write_read(0x69, vec![0x0C], vec![0x00]),
        I2cTrans::write_read(0x69, vec![0x27], vec![0x09, 0x58, 0x01]),
    ];
    let mock = I2cMock::new(&expectations);
    let mut driver = Mp8862::new(mock);
    let id = driver.read_device_id().unwrap();
    assert_eq!(id.part, 0x00);
    assert_eq!(id.revision, 0x01);
    assert!(id.is_mp8862());
    driver.free().done();
}

#[cfg(feature = "async")]
mod asynch {
    use embassy_futures::block_on;

    use super::*;

    #[test]
    fn set_and_get_vout() {
        let expectations = [
            I2cTrans::write(0x69, vec![0x00, 0x04, 0x3E, 0x03]),
            I2cTrans::write_read(0x69, vec![0x00], vec![0x04, 0x3E]),
        ];
        let mock = I2cMock::new(&expectations);
        let mut driver = Mp8862::new(mock);
        block_on(driver.set_vout_mv_async(5_000)).unwrap();
        assert_eq!(block_on(driver.get_vout_mv_async()).unwrap(), 5_000);
        driver.free().done();
    }

    #[test]
    fn set_vout_above_soft_limit_never_touches_bus() {
        let mock = I2cMock::new(&[]);
        let mut driver = Mp8862::new(mock);
        assert_eq!(block_on(driver.set_vout_mv_async(6_000)), Err(Error::OutOfRange));
        driver.free().done();
    }
}
