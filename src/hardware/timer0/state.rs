//! Timer0 外设状态
//!
//! 由寄存器值解码得到, 只读视图。

use super::period::{ClockSource, Edge, Prescale, Priority, Width};
use super::regs::{IntCon, IntCon2, RCon, Registers, T0Con};

/// 溢出中断状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsrState {
    /// 标志清零, 正在计数
    Idle,
    /// 计数器已溢出, 等待或正在执行中断服务
    Pending,
}

/// Timer0 外设状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer0State {
    pub enabled: bool,
    pub width: Width,
    pub clock_source: ClockSource,
    pub prescaler_enabled: bool,
    pub prescale: Prescale,
    pub counter: u16,
    pub reload: u16,
    pub overflow_flag: bool,
    pub interrupt_enabled: bool,
    pub priority: Priority,
    pub priority_levels_enabled: bool,
    pub global_high_enabled: bool,
    pub global_low_enabled: bool,
}

impl Timer0State {
    /// 从寄存器读取状态
    pub fn read<R: Registers>(regs: &R, reload: u16) -> Self {
        Self::decode(
            regs.t0con(),
            regs.intcon(),
            regs.intcon2(),
            regs.rcon(),
            regs.counter(),
            reload,
        )
    }

    pub fn decode(
        t0con: T0Con,
        intcon: IntCon,
        intcon2: IntCon2,
        rcon: RCon,
        counter: u16,
        reload: u16,
    ) -> Self {
        let width = if t0con.contains(T0Con::T08BIT) {
            Width::Bits8
        } else {
            Width::Bits16
        };
        let clock_source = if t0con.contains(T0Con::T0CS) {
            let edge = if t0con.contains(T0Con::T0SE) {
                Edge::Falling
            } else {
                Edge::Rising
            };
            ClockSource::External(edge)
        } else {
            ClockSource::Internal
        };
        let priority = if intcon2.contains(IntCon2::TMR0IP) {
            Priority::High
        } else {
            Priority::Low
        };

        Timer0State {
            enabled: t0con.contains(T0Con::TMR0ON),
            width,
            clock_source,
            prescaler_enabled: !t0con.contains(T0Con::PSA),
            prescale: Prescale::from_bits(t0con.prescale_bits()),
            counter: counter & width.max(),
            reload,
            overflow_flag: intcon.contains(IntCon::TMR0IF),
            interrupt_enabled: intcon.contains(IntCon::TMR0IE),
            priority,
            priority_levels_enabled: rcon.contains(RCon::IPEN),
            global_high_enabled: intcon.contains(IntCon::GIEH),
            global_low_enabled: intcon.contains(IntCon::GIEL),
        }
    }

    pub fn isr_state(&self) -> IsrState {
        if self.overflow_flag {
            IsrState::Pending
        } else {
            IsrState::Idle
        }
    }

    /// 溢出中断是否会被响应
    ///
    /// 优先级模式下需要对应优先级的全局使能,
    /// 兼容模式下 Timer0 只受 GIE (GIEH 位) 控制。
    pub fn interrupt_armed(&self) -> bool {
        if !self.interrupt_enabled {
            return false;
        }
        if !self.priority_levels_enabled {
            return self.global_high_enabled;
        }
        match self.priority {
            Priority::High => self.global_high_enabled,
            Priority::Low => self.global_low_enabled,
        }
    }
}
