//! Timer0 主机模拟
//!
//! [`SimTimer0`] 以时钟为单位模拟 Timer0 计数、预分频、TMR0H 缓冲与溢出标志,
//! 寄存器使用 `Cell` 保存, 与 MMIO 一样可通过共享引用访问。
//! [`SimCpu`] 模拟高/低优先级中断分派: 进入中断时清除对应的全局使能位,
//! 中断返回时恢复。

use core::cell::{Cell, RefCell};

use heapless::{HistoryBuffer, Vec};

use super::timer0::regs::{
    IntCon, IntCon2, RCon, Registers, T0Con, HIGH_PRIORITY_VECTOR, LOW_PRIORITY_VECTOR,
};
use super::timer0::{Edge, Prescale, Priority, Timer0State};

/// 写入记录容量
pub const JOURNAL_CAPACITY: usize = 32;
/// 时间戳记录容量
pub const HISTORY_CAPACITY: usize = 16;

/// 寄存器写入记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegWrite {
    T0Con(T0Con),
    IntCon(IntCon),
    IntCon2(IntCon2),
    RCon(RCon),
    CounterHigh(u8),
    CounterLow(u8),
}

/// 模拟 Timer0 外设
pub struct SimTimer0 {
    t0con: Cell<T0Con>,
    intcon: Cell<IntCon>,
    intcon2: Cell<IntCon2>,
    rcon: Cell<RCon>,
    counter: Cell<u16>,
    high_buffer: Cell<u8>,
    prescale_count: Cell<u16>,
    t0cki: Cell<bool>,
    now: Cell<u64>,
    overflows: Cell<u32>,
    overflow_times: RefCell<HistoryBuffer<u64, HISTORY_CAPACITY>>,
    journal: RefCell<Vec<RegWrite, JOURNAL_CAPACITY>>,
}

impl SimTimer0 {
    /// 上电复位状态
    ///
    /// T0CON 复位值为 0xFF (计数开启, 8 位, 外部时钟),
    /// INTCON2 复位值中 TMR0IP 为 1, RCON 中 IPEN 为 0。
    pub fn new() -> Self {
        SimTimer0 {
            t0con: Cell::new(T0Con::all()),
            intcon: Cell::new(IntCon::empty()),
            intcon2: Cell::new(IntCon2::all()),
            rcon: Cell::new(RCon::RI | RCon::TO | RCon::PD),
            counter: Cell::new(0),
            high_buffer: Cell::new(0),
            prescale_count: Cell::new(0),
            t0cki: Cell::new(false),
            now: Cell::new(0),
            overflows: Cell::new(0),
            overflow_times: RefCell::new(HistoryBuffer::new()),
            journal: RefCell::new(Vec::new()),
        }
    }

    /// 已经过的时钟数
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// 溢出次数
    pub fn overflow_count(&self) -> u32 {
        self.overflows.get()
    }

    /// 最近的溢出时间, 由旧到新
    pub fn overflow_times(&self) -> Vec<u64, HISTORY_CAPACITY> {
        self.overflow_times.borrow().oldest_ordered().copied().collect()
    }

    /// 寄存器写入记录
    pub fn journal(&self) -> Vec<RegWrite, JOURNAL_CAPACITY> {
        self.journal.borrow().clone()
    }

    pub fn clear_journal(&self) {
        self.journal.borrow_mut().clear();
    }

    /// 推进一个外设时钟
    pub fn tick(&self) {
        self.now.set(self.now.get() + 1);
        let t0con = self.t0con.get();
        if t0con.contains(T0Con::TMR0ON) && !t0con.contains(T0Con::T0CS) {
            self.clock_edge();
        }
    }

    /// 驱动 T0CKI 引脚电平
    pub fn drive_t0cki(&self, level: bool) {
        let previous = self.t0cki.replace(level);
        if previous == level {
            return;
        }
        let edge = if level { Edge::Rising } else { Edge::Falling };
        let t0con = self.t0con.get();
        let selected = if t0con.contains(T0Con::T0SE) {
            Edge::Falling
        } else {
            Edge::Rising
        };
        if t0con.contains(T0Con::TMR0ON) && t0con.contains(T0Con::T0CS) && edge == selected {
            self.clock_edge();
        }
    }

    /// 在 T0CKI 上产生一个完整脉冲
    pub fn pulse_t0cki(&self) {
        let level = self.t0cki.get();
        self.drive_t0cki(!level);
        self.drive_t0cki(level);
    }

    /// 中断分派时由硬件清除全局使能位
    fn set_intcon_bits(&self, bits: IntCon, value: bool) {
        let mut intcon = self.intcon.get();
        intcon.set(bits, value);
        self.intcon.set(intcon);
    }

    fn clock_edge(&self) {
        let t0con = self.t0con.get();
        if !t0con.contains(T0Con::PSA) {
            let ratio = Prescale::from_bits(t0con.prescale_bits()).ratio();
            let count = self.prescale_count.get() + 1;
            if count < ratio {
                self.prescale_count.set(count);
                return;
            }
            self.prescale_count.set(0);
        }
        self.increment();
    }

    fn increment(&self) {
        let max = if self.t0con.get().contains(T0Con::T08BIT) {
            0xFF
        } else {
            0xFFFF
        };
        let counter = self.counter.get() & max;
        if counter == max {
            self.counter.set(0);
            self.overflow();
        } else {
            self.counter.set(counter + 1);
        }
    }

    fn overflow(&self) {
        self.overflows.set(self.overflows.get() + 1);
        self.overflow_times.borrow_mut().write(self.now.get());
        self.set_intcon_bits(IntCon::TMR0IF, true);
    }

    fn record(&self, write: RegWrite) {
        // 记录满后丢弃
        let _ = self.journal.borrow_mut().push(write);
    }
}

impl Default for SimTimer0 {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers for &SimTimer0 {
    fn t0con(&self) -> T0Con {
        self.t0con.get()
    }

    fn write_t0con(&mut self, value: T0Con) {
        self.record(RegWrite::T0Con(value));
        self.t0con.set(value);
    }

    fn intcon(&self) -> IntCon {
        self.intcon.get()
    }

    fn write_intcon(&mut self, value: IntCon) {
        self.record(RegWrite::IntCon(value));
        self.intcon.set(value);
    }

    fn intcon2(&self) -> IntCon2 {
        self.intcon2.get()
    }

    fn write_intcon2(&mut self, value: IntCon2) {
        self.record(RegWrite::IntCon2(value));
        self.intcon2.set(value);
    }

    fn rcon(&self) -> RCon {
        self.rcon.get()
    }

    fn write_rcon(&mut self, value: RCon) {
        self.record(RegWrite::RCon(value));
        self.rcon.set(value);
    }

    fn write_counter_high(&mut self, value: u8) {
        self.record(RegWrite::CounterHigh(value));
        self.high_buffer.set(value);
    }

    fn write_counter_low(&mut self, value: u8) {
        self.record(RegWrite::CounterLow(value));
        let counter = if self.t0con.get().contains(T0Con::T08BIT) {
            value as u16
        } else {
            (self.high_buffer.get() as u16) << 8 | value as u16
        };
        self.counter.set(counter);
        // 写 TMR0 清零预分频计数
        self.prescale_count.set(0);
    }

    fn counter(&self) -> u16 {
        if self.t0con.get().contains(T0Con::T08BIT) {
            self.counter.get() & 0xFF
        } else {
            self.counter.get()
        }
    }
}

/// 模拟中断分派
pub struct SimCpu<'a> {
    timer: &'a SimTimer0,
    isr_cost: u32,
    dispatches: u32,
    dispatch_times: HistoryBuffer<u64, HISTORY_CAPACITY>,
    last_vector: Option<u16>,
}

impl<'a> SimCpu<'a> {
    pub fn new(timer: &'a SimTimer0) -> Self {
        SimCpu {
            timer,
            isr_cost: 0,
            dispatches: 0,
            dispatch_times: HistoryBuffer::new(),
            last_vector: None,
        }
    }

    /// 中断服务执行期间经过的时钟数
    ///
    /// 服务期间计数器照常计数, 溢出只置位标志。
    pub fn with_isr_cost(mut self, cycles: u32) -> Self {
        self.isr_cost = cycles;
        self
    }

    /// 中断分派次数
    pub fn dispatches(&self) -> u32 {
        self.dispatches
    }

    /// 最近的分派时间, 由旧到新
    pub fn dispatch_times(&self) -> Vec<u64, HISTORY_CAPACITY> {
        self.dispatch_times.oldest_ordered().copied().collect()
    }

    /// 最近一次分派的中断向量
    pub fn last_vector(&self) -> Option<u16> {
        self.last_vector
    }

    /// 当前待响应的中断向量
    pub fn pending_vector(&self) -> Option<u16> {
        let timer = &self.timer;
        let state = Timer0State::decode(
            timer.t0con(),
            timer.intcon(),
            timer.intcon2(),
            timer.rcon(),
            timer.counter(),
            0,
        );
        if !state.overflow_flag || !state.interrupt_armed() {
            return None;
        }
        if state.priority_levels_enabled && state.priority == Priority::Low {
            Some(LOW_PRIORITY_VECTOR)
        } else {
            Some(HIGH_PRIORITY_VECTOR)
        }
    }

    /// 推进一个时钟, 有待响应中断时分派
    pub fn step(&mut self, isr: &mut impl FnMut()) {
        self.timer.tick();
        if let Some(vector) = self.pending_vector() {
            self.dispatch(vector, isr);
        }
    }

    /// 运行至少 `clocks` 个时钟
    ///
    /// 中断服务在 [`SimCpu::step`] 内完整执行, 最后一次分派的服务时间
    /// 会超出目标时钟, 超出量不大于 `isr_cost`。
    pub fn run(&mut self, clocks: u64, mut isr: impl FnMut()) {
        let target = self.timer.now() + clocks;
        while self.timer.now() < target {
            self.step(&mut isr);
        }
    }

    fn dispatch(&mut self, vector: u16, isr: &mut impl FnMut()) {
        // 优先级模式下低优先级向量清除 GIEL, 其他情况清除 GIEH (GIE)
        let mask = if vector == LOW_PRIORITY_VECTOR {
            IntCon::GIEL
        } else {
            IntCon::GIEH
        };

        self.timer.set_intcon_bits(mask, false);
        self.dispatches += 1;
        self.dispatch_times.write(self.timer.now());
        self.last_vector = Some(vector);

        isr();
        for _ in 0..self.isr_cost {
            self.timer.tick();
        }

        // 中断返回
        self.timer.set_intcon_bits(mask, true);
    }
}
