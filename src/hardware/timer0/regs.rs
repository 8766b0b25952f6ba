//! Timer0 寄存器位定义
//!
//! T0CON 寄存器
//!
//! ```text
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! | TMR0ON | T08BIT |  T0CS  |  T0SE  |  PSA   |  T0PS2 |  T0PS1 |  T0PS0 |
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! ```
//!
//! - TMR0ON: 1 = 启动计数, 0 = 停止计数
//! - T08BIT: 1 = 8 位计数 (仅 TMR0L), 0 = 16 位计数 (TMR0H:TMR0L)
//! - T0CS:   1 = T0CKI 引脚时钟, 0 = 内部指令周期时钟
//! - T0SE:   1 = 下降沿计数, 0 = 上升沿计数 (仅外部时钟有效)
//! - PSA:    1 = 不使用预分频器, 0 = 时钟经过预分频器
//! - T0PS:   预分频比, 000 = 1:2 ... 111 = 1:256
//!
//! INTCON 寄存器
//!
//! ```text
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! |  GIEH  |  GIEL  | TMR0IE | INT0IE |  RBIE  | TMR0IF | INT0IF |  RBIF  |
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! ```
//!
//! IPEN = 1 时 GIEH/GIEL 分别使能高/低优先级中断;
//! IPEN = 0 时 GIEH 为全局中断使能 (GIE), GIEL 为外设中断使能 (PEIE)。
//!
//! INTCON2 中的 TMR0IP 选择 Timer0 溢出中断的优先级 (1 = 高, 0 = 低),
//! RCON 中的 IPEN 使能中断优先级。

use bitflags::bitflags;

/// 高优先级中断向量地址
pub const HIGH_PRIORITY_VECTOR: u16 = 0x0008;
/// 低优先级中断向量地址
pub const LOW_PRIORITY_VECTOR: u16 = 0x0018;

bitflags! {
    /// Timer0 控制寄存器
    pub struct T0Con: u8 {
        const TMR0ON = 1 << 7;
        const T08BIT = 1 << 6;
        const T0CS = 1 << 5;
        const T0SE = 1 << 4;
        const PSA = 1 << 3;
        const T0PS2 = 1 << 2;
        const T0PS1 = 1 << 1;
        const T0PS0 = 1;
        /// 预分频选择位掩码
        const T0PS = Self::T0PS2.bits | Self::T0PS1.bits | Self::T0PS0.bits;
    }
}

bitflags! {
    /// 中断控制寄存器
    pub struct IntCon: u8 {
        const GIEH = 1 << 7;
        const GIEL = 1 << 6;
        const TMR0IE = 1 << 5;
        const INT0IE = 1 << 4;
        const RBIE = 1 << 3;
        const TMR0IF = 1 << 2;
        const INT0IF = 1 << 1;
        const RBIF = 1;
    }
}

bitflags! {
    /// 中断控制寄存器 2
    pub struct IntCon2: u8 {
        const RBPU = 1 << 7;
        const INTEDG0 = 1 << 6;
        const INTEDG1 = 1 << 5;
        const INTEDG2 = 1 << 4;
        const TMR0IP = 1 << 2;
        const RBIP = 1;
    }
}

bitflags! {
    /// 复位控制寄存器
    pub struct RCon: u8 {
        const IPEN = 1 << 7;
        const SBOREN = 1 << 6;
        const RI = 1 << 4;
        const TO = 1 << 3;
        const PD = 1 << 2;
        const POR = 1 << 1;
        const BOR = 1;
    }
}

impl T0Con {
    /// 预分频选择位 (0..=7)
    pub fn prescale_bits(self) -> u8 {
        (self & Self::T0PS).bits()
    }
}

/// Timer0 寄存器访问接口
///
/// 计数器高字节写入缓冲区, 写低字节时缓冲区与低字节同时装入计数器,
/// 并清零预分频计数。8 位模式下只有低字节参与计数。
pub trait Registers {
    fn t0con(&self) -> T0Con;
    fn write_t0con(&mut self, value: T0Con);

    fn intcon(&self) -> IntCon;
    fn write_intcon(&mut self, value: IntCon);

    fn intcon2(&self) -> IntCon2;
    fn write_intcon2(&mut self, value: IntCon2);

    fn rcon(&self) -> RCon;
    fn write_rcon(&mut self, value: RCon);

    /// 写 TMR0H (缓冲)
    fn write_counter_high(&mut self, value: u8);
    /// 写 TMR0L, 同时装入缓冲的高字节
    fn write_counter_low(&mut self, value: u8);

    /// 当前计数值, 仅用于观测
    fn counter(&self) -> u16;

    fn modify_t0con(&mut self, f: impl FnOnce(T0Con) -> T0Con) {
        let value = f(self.t0con());
        self.write_t0con(value);
    }

    fn modify_intcon(&mut self, f: impl FnOnce(IntCon) -> IntCon) {
        let value = f(self.intcon());
        self.write_intcon(value);
    }

    fn modify_intcon2(&mut self, f: impl FnOnce(IntCon2) -> IntCon2) {
        let value = f(self.intcon2());
        self.write_intcon2(value);
    }

    fn modify_rcon(&mut self, f: impl FnOnce(RCon) -> RCon) {
        let value = f(self.rcon());
        self.write_rcon(value);
    }
}

#[cfg(target_os = "none")]
macro_rules! impl_format {
    ($($ty:ty),*) => {
        $(
            impl defmt::Format for $ty {
                fn format(&self, f: defmt::Formatter) {
                    defmt::write!(f, "{=u8:#x}", self.bits())
                }
            }
        )*
    };
}

#[cfg(target_os = "none")]
impl_format!(T0Con, IntCon, IntCon2, RCon);
