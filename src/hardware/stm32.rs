//! STM32F103 TIM3 寄存器映射
//!
//! 将 Timer0 的寄存器模型映射到 TIM3 和 NVIC:
//!
//! - TMR0ON -> CR1.CEN
//! - T08BIT -> ARR = 0xFF / 0xFFFF
//! - PSA, T0PS -> PSC = 分频比 - 1 / 0
//! - T0CS, T0SE -> SMCR 外部时钟模式 2 (ETR 引脚 PD2), ETP 选择下降沿
//! - TMR0H:TMR0L -> CNT, 高字节缓冲
//! - TMR0IE -> DIER.UIE, TMR0IF -> SR.UIF
//! - IPEN, TMR0IP -> NVIC 优先级
//! - GIEH, GIEL -> NVIC 屏蔽/使能 TIM3
//!
//! 调用前需使能 TIM3 时钟 (RCC_APB1ENR.TIM3EN)。

use cortex_m::peripheral::NVIC;
use stm32f1xx_hal::pac::{Interrupt, TIM3};

use super::timer0::regs::{IntCon, IntCon2, RCon, Registers, T0Con};
use super::timer0::{Prescale, Priority, Timer0State};

/// NVIC 优先级位数
pub const NVIC_PRIO_BITS: u8 = 4;

/// 高优先级, 对应 RTIC 优先级 2
pub const HIGH_PRIORITY: u8 = ((1 << NVIC_PRIO_BITS) - 2) << (8 - NVIC_PRIO_BITS);
/// 低优先级, 对应 RTIC 优先级 1
pub const LOW_PRIORITY: u8 = ((1 << NVIC_PRIO_BITS) - 1) << (8 - NVIC_PRIO_BITS);

/// TIM3 寄存器
pub struct Tim3Registers {
    tim: TIM3,
    nvic: NVIC,
    t0con: T0Con,
    /// 已写入 ARR/PSC/SMCR 的配置
    mode: Option<T0Con>,
    intcon: IntCon,
    intcon2: IntCon2,
    rcon: RCon,
    high_buffer: u8,
}

impl Tim3Registers {
    pub fn new(tim: TIM3, nvic: NVIC) -> Self {
        // 只有计数溢出产生更新中断, UG 不置位 UIF
        tim.cr1.modify(|_, w| w.cen().clear_bit().urs().set_bit());

        Tim3Registers {
            tim,
            nvic,
            t0con: T0Con::empty(),
            mode: None,
            intcon: IntCon::empty(),
            intcon2: IntCon2::empty(),
            rcon: RCon::empty(),
            high_buffer: 0,
        }
    }

    /// 写入位宽、预分频和时钟源, 并产生更新事件装载预分频值
    fn apply_mode(&mut self, t0con: T0Con) {
        let arr = if t0con.contains(T0Con::T08BIT) {
            0xFF
        } else {
            0xFFFF
        };
        let psc = if t0con.contains(T0Con::PSA) {
            0
        } else {
            Prescale::from_bits(t0con.prescale_bits()).ratio() - 1
        };

        #[allow(unused_unsafe)]
        unsafe {
            self.tim.arr.write(|w| w.arr().bits(arr));
            self.tim.psc.write(|w| w.psc().bits(psc));
        }
        self.tim.smcr.modify(|_, w| {
            w.ece()
                .bit(t0con.contains(T0Con::T0CS))
                .etp()
                .bit(t0con.contains(T0Con::T0SE))
        });
        self.tim.egr.write(|w| w.ug().set_bit());
    }

    /// 根据优先级设置 NVIC 优先级
    fn apply_priority(&mut self) {
        let state = self.decode();
        let priority = if !state.priority_levels_enabled {
            HIGH_PRIORITY
        } else {
            match state.priority {
                Priority::High => HIGH_PRIORITY,
                Priority::Low => LOW_PRIORITY,
            }
        };
        unsafe {
            self.nvic.set_priority(Interrupt::TIM3, priority);
        }
    }

    /// 根据全局中断使能屏蔽或使能 TIM3
    fn apply_global_enable(&mut self) {
        let state = self.decode();
        let enabled = if !state.priority_levels_enabled {
            state.global_high_enabled
        } else {
            match state.priority {
                Priority::High => state.global_high_enabled,
                Priority::Low => state.global_low_enabled,
            }
        };
        if enabled {
            unsafe {
                NVIC::unmask(Interrupt::TIM3);
            }
        } else {
            NVIC::mask(Interrupt::TIM3);
        }
    }

    fn decode(&self) -> Timer0State {
        Timer0State::decode(self.t0con, self.intcon, self.intcon2, self.rcon, 0, 0)
    }
}

impl Registers for Tim3Registers {
    fn t0con(&self) -> T0Con {
        let mut t0con = self.t0con;
        t0con.set(T0Con::TMR0ON, self.tim.cr1.read().cen().bit_is_set());
        t0con
    }

    fn write_t0con(&mut self, value: T0Con) {
        let running = value.contains(T0Con::TMR0ON);
        if !running {
            self.tim.cr1.modify(|_, w| w.cen().clear_bit());
        }
        // 更新事件会清零 CNT, 配置未变化时只切换 CEN
        let mode = value - T0Con::TMR0ON;
        if self.mode != Some(mode) {
            self.apply_mode(mode);
            self.mode = Some(mode);
        }
        self.t0con = value;
        if running {
            self.tim.cr1.modify(|_, w| w.cen().set_bit());
        }
    }

    fn intcon(&self) -> IntCon {
        let mut intcon = self.intcon;
        intcon.set(IntCon::TMR0IE, self.tim.dier.read().uie().bit_is_set());
        intcon.set(IntCon::TMR0IF, self.tim.sr.read().uif().bit_is_set());
        intcon
    }

    fn write_intcon(&mut self, value: IntCon) {
        self.tim
            .dier
            .modify(|_, w| w.uie().bit(value.contains(IntCon::TMR0IE)));
        if !value.contains(IntCon::TMR0IF) {
            self.tim.sr.modify(|_, w| w.uif().clear_bit());
        }

        let global = IntCon::GIEH | IntCon::GIEL;
        let changed = (self.intcon & global) != (value & global);
        self.intcon = value - IntCon::TMR0IF;
        if changed {
            self.apply_global_enable();
        }
    }

    fn intcon2(&self) -> IntCon2 {
        self.intcon2
    }

    fn write_intcon2(&mut self, value: IntCon2) {
        self.intcon2 = value;
        self.apply_priority();
        self.apply_global_enable();
    }

    fn rcon(&self) -> RCon {
        self.rcon
    }

    fn write_rcon(&mut self, value: RCon) {
        self.rcon = value;
        self.apply_priority();
        self.apply_global_enable();
    }

    fn write_counter_high(&mut self, value: u8) {
        self.high_buffer = value;
    }

    fn write_counter_low(&mut self, value: u8) {
        let cnt = if self.t0con.contains(T0Con::T08BIT) {
            value as u16
        } else {
            (self.high_buffer as u16) << 8 | value as u16
        };
        // 更新事件清零预分频计数, 随后写入计数值
        self.tim.egr.write(|w| w.ug().set_bit());
        #[allow(unused_unsafe)]
        unsafe {
            self.tim.cnt.write(|w| w.cnt().bits(cnt));
        }
    }

    fn counter(&self) -> u16 {
        self.tim.cnt.read().cnt().bits()
    }
}
