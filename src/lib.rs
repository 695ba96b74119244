//! MP8862 Rust Driver
//!
//! `no_std` driver for the MPS MP8862 2.8–22 V input, 2 A, four-switch buck-boost converter
//! with I2C interface. Built on `embedded-hal` 1.0 with an optional async mirror
//! (`async` feature) and `defmt` support (`defmt` feature).
//!
//! - [`driver`]: raw register access and millivolt/milliamp setters with soft limits.
//! - [`power`]: the time-critical hardware EN power-up handshake.
//! - [`registers`]: register map, field table and fixed-point conversions.

#![no_std]

pub mod data_types;
pub mod driver;
pub mod error;
pub mod power;
pub mod registers;

pub use data_types::{I2cAddress, RetryBudget, SoftLimits};
pub use driver::Mp8862;
pub use error::Error;
pub use power::{EnableControl, EnablePin};
pub use registers::DEFAULT_I2C_ADDRESS;
