//! 全局配置

use crate::hardware::timer0::{ClockSource, Prescale, Priority, TimerConfig, Width};

/// Timer0 配置
///
/// 16 位计数, 内部指令周期时钟, 预分频 1:256, 重载值 0xFFFF, 低优先级中断。
/// 周期 = 256 × (65536 − 0xFFFF) = 256 个时钟。
/// 配置非法时编译失败。
pub const TIMER0: TimerConfig = match TimerConfig::new(
    Width::Bits16,
    ClockSource::Internal,
    Some(Prescale::Div256),
    TIMER0_RELOAD,
    Priority::Low,
) {
    Ok(config) => config,
    Err(_) => panic!("invalid Timer0 configuration"),
};

/// Timer0 重载值
pub const TIMER0_RELOAD: u16 = 0xFFFF;

// 溢出任务固定为 RTIC 优先级 1, 对应低优先级 NVIC 设置
const _: () = assert!(
    matches!(TIMER0.priority, Priority::Low),
    "timer0 overflow task is bound at RTIC priority 1"
);
