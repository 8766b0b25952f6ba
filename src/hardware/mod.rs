//! 硬件外设
pub mod sim;
#[cfg(target_os = "none")]
pub mod stm32;
pub mod timer0;
