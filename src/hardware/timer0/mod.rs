//! # Timer0 定时中断
//!
//! 配置 Timer0 周期性溢出并产生低优先级中断, 每次溢出在中断中重新装载计数器,
//! 使每个周期长度一致。
//!
//! 计算公式: 周期 = 时钟周期 × 预分频比 × 计数次数,
//! 重载值 = 2^位宽 − 计数次数。
//!
//! 外设只能通过 [`Timer0::configure`] 和 [`Timer0::on_overflow`] 修改,
//! 寄存器句柄在 [`Timer0`] 内部持有。
pub mod period;
pub mod regs;
pub mod state;

use crate::fmt::{log_debug, log_info, log_trace};

pub use period::{ClockSource, ConfigError, Edge, Prescale, Priority, TimerConfig, Width};
pub use regs::{IntCon, IntCon2, RCon, Registers, T0Con};
pub use state::{IsrState, Timer0State};

/// 16 位模式下, 只写 TMR0L 时装入的高字节
///
/// 初始化时写入的高字节保留在 TMR0H 缓冲中, 之后只写低字节即可完成重载。
pub const AUTO_RELOAD_HIGH: u8 = 0xFF;

/// Timer0
pub struct Timer0<R: Registers> {
    regs: R,
    config: TimerConfig,
}

impl<R: Registers> Timer0<R> {
    /// 初始化 Timer0
    ///
    /// 1. 关闭计数, 写入位宽/时钟源/预分频
    /// 2. 装入初始计数值
    /// 3. 使能中断优先级, 设置优先级, 清除溢出标志, 使能溢出中断
    /// 4. 使能高/低优先级全局中断
    /// 5. 启动计数
    ///
    /// 重复调用会重新装入计数值, 当前周期的计时丢失。
    pub fn configure(mut regs: R, config: TimerConfig) -> Self {
        // 关闭计数后再写配置, 不会出现部分生效的配置
        regs.modify_t0con(|t0con| t0con - T0Con::TMR0ON);
        let control = config.control();
        regs.write_t0con(control);

        // 初始装载
        if config.width == Width::Bits16 {
            regs.write_counter_high(config.reload_high());
        }
        regs.write_counter_low(config.reload_low());

        // 中断: 优先级模式, 溢出中断优先级, 清除残留的溢出标志, 使能溢出中断
        regs.modify_rcon(|rcon| rcon | RCon::IPEN);
        regs.modify_intcon2(|intcon2| match config.priority {
            Priority::High => intcon2 | IntCon2::TMR0IP,
            Priority::Low => intcon2 - IntCon2::TMR0IP,
        });
        regs.modify_intcon(|intcon| intcon - IntCon::TMR0IF);
        regs.modify_intcon(|intcon| intcon | IntCon::TMR0IE);

        // 高优先级也同时使能, 以后加入的高优先级中断源不会被屏蔽
        regs.modify_intcon(|intcon| intcon | IntCon::GIEH | IntCon::GIEL);

        // 启动计数
        regs.write_t0con(control | T0Con::TMR0ON);

        log_info!(
            "timer0 configured: t0con={=u8:#x} reload={=u16:#x} period={=u32} ticks",
            (control | T0Con::TMR0ON).bits(),
            config.reload,
            config.period_ticks()
        );

        Timer0 { regs, config }
    }

    /// 溢出中断服务
    ///
    /// 由中断向量调用, 清除溢出标志并重新装载计数器后执行 `extension`。
    /// 溢出标志未置位时 (共享向量上的其他中断源) 直接返回 `false`。
    pub fn on_overflow(&mut self, extension: impl FnOnce()) -> bool {
        if !self.regs.intcon().contains(IntCon::TMR0IF) {
            return false;
        }

        // 先清除溢出标志, 否则返回后会立即再次进入中断
        self.regs.modify_intcon(|intcon| intcon - IntCon::TMR0IF);

        self.reload();

        log_trace!("timer0 overflow");

        extension();
        true
    }

    /// 重新装载计数器
    ///
    /// 高字节等于 [`AUTO_RELOAD_HIGH`] 时只写低字节,
    /// 否则先写高字节再写低字节。
    fn reload(&mut self) {
        if self.config.width == Width::Bits16 && self.config.reload_high() != AUTO_RELOAD_HIGH {
            self.regs.write_counter_high(self.config.reload_high());
        }
        self.regs.write_counter_low(self.config.reload_low());
    }

    /// 当前外设状态
    pub fn state(&self) -> Timer0State {
        Timer0State::read(&self.regs, self.config.reload)
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// 一个周期的外设时钟数
    pub fn period_ticks(&self) -> u32 {
        self.config.period_ticks()
    }

    /// 释放寄存器句柄, 计数器保持运行
    pub fn release(self) -> R {
        log_debug!("timer0 released");
        self.regs
    }
}
