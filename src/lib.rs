#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_os = "none", no_main)]

mod fmt;

pub mod config;
pub mod hardware;

// global logger
#[cfg(target_os = "none")]
use defmt_rtt as _;
// panic handler
#[cfg(target_os = "none")]
use panic_probe as _;
// memory layout
#[cfg(target_os = "none")]
use stm32f1xx_hal as _;
