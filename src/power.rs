//! Time-critical hardware power-up.
//!
//! Once hardware EN rises, the MP8862 loads its reset defaults (soft EN set) and the output
//! starts rising after roughly 150 µs. Writing CTL1 = [`Ctl1Bits::DEFAULT_OUTPUT_OFF`] inside
//! that window keeps the output off while leaving the device responsive on I2C, so the
//! setpoint and current limit can be programmed before the rail comes up.
//!
//! The window is not timed here; the caller picks a [`RetryBudget`] that matches the bus
//! clock. If no attempt is acknowledged, EN is pulled low again before returning.
//!
//! ```ignore
//! let mut en = EnablePin::active_high(en_gpio);
//! dev.hardware_power_up(&mut en, 0, RetryBudget::I2c400kHz)?;
//! dev.set_vout_mv(5_000)?;
//! dev.output_on()?;
//! ```

use embedded_hal::digital::{OutputPin, PinState};

use crate::data_types::{PowerState, RetryBudget};
use crate::driver::Mp8862;
use crate::error::Error;
use crate::registers::{Ctl1Bits, addr};

/// Drives the converter's hardware EN line.
///
/// `id` identifies the caller's rail so a single implementation can serve several
/// converters (for example through a GPIO bank). It must switch the line synchronously:
/// an I2C GPIO expander is too slow for the power-up window.
pub trait EnableControl {
    type Error: embedded_hal::digital::Error;

    fn set_enable_pin(&mut self, id: u16, asserted: bool) -> Result<(), Self::Error>;
}

impl<T: EnableControl + ?Sized> EnableControl for &mut T {
    type Error = T::Error;

    fn set_enable_pin(&mut self, id: u16, asserted: bool) -> Result<(), Self::Error> {
        T::set_enable_pin(self, id, asserted)
    }
}

/// [`EnableControl`] over a single `embedded-hal` output pin. The `id` is ignored.
pub struct EnablePin<P> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> EnablePin<P> {
    /// EN is asserted by driving the pin high.
    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// EN is asserted by driving the pin low (e.g. through an inverter).
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    pub fn free(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> EnableControl for EnablePin<P> {
    type Error = P::Error;

    fn set_enable_pin(&mut self, _id: u16, asserted: bool) -> Result<(), Self::Error> {
        self.pin.set_state(PinState::from(asserted != self.active_low))
    }
}

#[cfg(feature = "defmt")]
fn trace_state(id: u16, state: PowerState) {
    defmt::trace!("power-up[{}]: {}", id, state);
}

#[cfg(not(feature = "defmt"))]
fn trace_state(_id: u16, _state: PowerState) {}

/// Deassert EN after a failed handshake. A failing rollback is reported instead of the
/// timeout, since the rail is then in an unknown state.
fn roll_back<EN: EnableControl, E>(enable: &mut EN, id: u16) -> Error<E> {
    trace_state(id, PowerState::Failed);
    match enable.set_enable_pin(id, false) {
        Ok(()) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("power-up[{}]: no ACK within retry budget, EN released", id);
            Error::HandshakeTimeout
        }
        Err(e) => {
            #[cfg(feature = "defmt")]
            defmt::error!("power-up[{}]: EN rollback failed", id);
            Error::pin(e)
        }
    }
}

/// Best-effort deassert after EN failed to assert; the assert error is what gets reported.
fn release_after_failed_assert<EN: EnableControl>(enable: &mut EN, id: u16) {
    match enable.set_enable_pin(id, false) {
        Ok(()) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("power-up[{}]: EN assert failed, EN released", id);
        }
        Err(_e) => {
            #[cfg(feature = "defmt")]
            defmt::error!("power-up[{}]: EN assert failed and release failed", id);
        }
    }
}

impl<I2C> Mp8862<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Assert hardware EN and hold the output off before it starts rising.
    ///
    /// Makes up to `budget.attempts()` independent CTL1 writes and stops at the first ACK.
    /// On success EN stays asserted, the output is off and the number of attempts used is
    /// returned. On exhaustion EN is deasserted and [`Error::HandshakeTimeout`] returned.
    pub fn hardware_power_up<EN: EnableControl>(
        &mut self,
        enable: &mut EN,
        id: u16,
        budget: RetryBudget,
    ) -> Result<u8, Error<I2C::Error>> {
        trace_state(id, PowerState::Disabled);
        if let Err(e) = enable.set_enable_pin(id, true) {
            release_after_failed_assert(enable, id);
            return Err(Error::pin(e));
        }
        trace_state(id, PowerState::EnableAsserted);

        let frame = [addr::CTL1, Ctl1Bits::DEFAULT_OUTPUT_OFF];
        for attempt in 1..=budget.attempts() {
            trace_state(id, PowerState::HandshakePending);
            if self.i2c.write(self.address, &frame).is_ok() {
                trace_state(id, PowerState::ControllableOff);
                return Ok(attempt);
            }
        }

        Err(roll_back(enable, id))
    }
}

#[cfg(feature = "async")]
impl<I2C> Mp8862<I2C>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    /// Async version of [`hardware_power_up`]. The executor must not preempt this future
    /// between EN and the first write for the window to hold.
    pub async fn hardware_power_up_async<EN: EnableControl>(
        &mut self,
        enable: &mut EN,
        id: u16,
        budget: RetryBudget,
    ) -> Result<u8, Error<I2C::Error>> {
        trace_state(id, PowerState::Disabled);
        if let Err(e) = enable.set_enable_pin(id, true) {
            release_after_failed_assert(enable, id);
            return Err(Error::pin(e));
        }
        trace_state(id, PowerState::EnableAsserted);

        let frame = [addr::CTL1, Ctl1Bits::DEFAULT_OUTPUT_OFF];
        for attempt in 1..=budget.attempts() {
            trace_state(id, PowerState::HandshakePending);
            if self.i2c.write(self.address, &frame).await.is_ok() {
                trace_state(id, PowerState::ControllableOff);
                return Ok(attempt);
            }
        }

        Err(roll_back(enable, id))
    }
}
