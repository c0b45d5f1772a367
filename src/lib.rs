#![cfg_attr(not(test), no_std)]

//! [ADF4158](https://www.analog.com/en/products/adf4158.html) FMCW ramp synthesizer driver.
//!
//! Turns a [`config::SweepSpec`] into the ADF4158 register sequence and
//! clocks it out with the CE / LE / CS handshake.

pub mod constants;
pub mod register;
pub mod errors;
pub mod config;
pub mod transport;
pub mod device;
