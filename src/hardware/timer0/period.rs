//! Timer0 配置与周期计算
//!
//! 周期 (外设时钟数) = 预分频比 × (2^位宽 − 重载值)
//!
//! 重载值由计数次数得出: 重载值 = 2^位宽 − 计数次数,
//! 计数次数范围 1 ~ 2^位宽。

use core::fmt;

use super::regs::T0Con;

/// 计数位宽
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Bits8,
    Bits16,
}

impl Width {
    /// 计数范围, 即 2^位宽
    pub const fn modulus(self) -> u32 {
        match self {
            Width::Bits8 => 1 << 8,
            Width::Bits16 => 1 << 16,
        }
    }

    /// 计数最大值
    pub const fn max(self) -> u16 {
        (self.modulus() - 1) as u16
    }
}

/// 外部时钟计数边沿
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// 低到高跳变
    Rising,
    /// 高到低跳变
    Falling,
}

/// 时钟源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// 内部指令周期时钟 (Fosc/4)
    Internal,
    /// T0CKI 引脚
    External(Edge),
}

/// 预分频比
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prescale {
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
    Div256,
}

impl Prescale {
    pub const ALL: [Prescale; 8] = [
        Prescale::Div2,
        Prescale::Div4,
        Prescale::Div8,
        Prescale::Div16,
        Prescale::Div32,
        Prescale::Div64,
        Prescale::Div128,
        Prescale::Div256,
    ];

    /// T0PS2:T0PS0 编码
    pub const fn bits(self) -> u8 {
        match self {
            Prescale::Div2 => 0b000,
            Prescale::Div4 => 0b001,
            Prescale::Div8 => 0b010,
            Prescale::Div16 => 0b011,
            Prescale::Div32 => 0b100,
            Prescale::Div64 => 0b101,
            Prescale::Div128 => 0b110,
            Prescale::Div256 => 0b111,
        }
    }

    pub const fn from_bits(bits: u8) -> Prescale {
        match bits & 0b111 {
            0b000 => Prescale::Div2,
            0b001 => Prescale::Div4,
            0b010 => Prescale::Div8,
            0b011 => Prescale::Div16,
            0b100 => Prescale::Div32,
            0b101 => Prescale::Div64,
            0b110 => Prescale::Div128,
            _ => Prescale::Div256,
        }
    }

    pub const fn ratio(self) -> u16 {
        2 << self.bits()
    }

    pub const fn from_ratio(ratio: u16) -> Result<Prescale, ConfigError> {
        match ratio {
            2 => Ok(Prescale::Div2),
            4 => Ok(Prescale::Div4),
            8 => Ok(Prescale::Div8),
            16 => Ok(Prescale::Div16),
            32 => Ok(Prescale::Div32),
            64 => Ok(Prescale::Div64),
            128 => Ok(Prescale::Div128),
            256 => Ok(Prescale::Div256),
            _ => Err(ConfigError::UnsupportedPrescale(ratio)),
        }
    }
}

/// 中断优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Low,
}

/// 配置错误
///
/// 配置在编译期求值, 错误会导致编译失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// 不支持的预分频比
    UnsupportedPrescale(u16),
    /// 重载值超出位宽
    ReloadOutOfRange { reload: u16, width: Width },
    /// 计数次数超出范围
    CountOutOfRange { count: u32, width: Width },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedPrescale(ratio) => {
                write!(f, "unsupported prescale ratio 1:{}", ratio)
            }
            ConfigError::ReloadOutOfRange { reload, width } => {
                write!(f, "reload {:#06x} does not fit {:?}", reload, width)
            }
            ConfigError::CountOutOfRange { count, width } => {
                write!(f, "count {} out of range for {:?}", count, width)
            }
        }
    }
}

/// 一个周期的外设时钟数
pub const fn period_ticks(width: Width, ratio: u16, reload: u16) -> u32 {
    ratio as u32 * (width.modulus() - reload as u32)
}

/// Timer0 配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// 计数位宽
    pub width: Width,
    /// 时钟源
    pub clock_source: ClockSource,
    /// 预分频, None 表示不使用预分频器
    pub prescale: Option<Prescale>,
    /// 重载值
    pub reload: u16,
    /// 溢出中断优先级
    pub priority: Priority,
}

impl TimerConfig {
    pub const fn new(
        width: Width,
        clock_source: ClockSource,
        prescale: Option<Prescale>,
        reload: u16,
        priority: Priority,
    ) -> Result<Self, ConfigError> {
        if reload > width.max() {
            return Err(ConfigError::ReloadOutOfRange { reload, width });
        }
        Ok(TimerConfig {
            width,
            clock_source,
            prescale,
            reload,
            priority,
        })
    }

    /// 按计数次数配置
    /// count 范围: 1 ~ 2^位宽
    pub const fn with_count(
        width: Width,
        clock_source: ClockSource,
        prescale: Option<Prescale>,
        count: u32,
        priority: Priority,
    ) -> Result<Self, ConfigError> {
        if count == 0 || count > width.modulus() {
            return Err(ConfigError::CountOutOfRange { count, width });
        }
        let reload = (width.modulus() - count) as u16;
        TimerConfig::new(width, clock_source, prescale, reload, priority)
    }

    /// 实际分频比, 不使用预分频器时为 1
    pub const fn ratio(&self) -> u16 {
        match self.prescale {
            Some(prescale) => prescale.ratio(),
            None => 1,
        }
    }

    /// 一个周期的外设时钟数
    pub const fn period_ticks(&self) -> u32 {
        period_ticks(self.width, self.ratio(), self.reload)
    }

    /// 一个周期的时长, 单位纳秒
    /// clock_hz: 外设时钟频率 (内部时钟时为指令周期频率 Fosc/4)
    pub const fn period_ns(&self, clock_hz: u32) -> u64 {
        self.period_ticks() as u64 * 1_000_000_000 / clock_hz as u64
    }

    pub const fn reload_high(&self) -> u8 {
        (self.reload >> 8) as u8
    }

    pub const fn reload_low(&self) -> u8 {
        self.reload as u8
    }

    /// 配置对应的 T0CON, TMR0ON 保持清零
    pub fn control(&self) -> T0Con {
        let mut t0con = T0Con::empty();
        if self.width == Width::Bits8 {
            t0con |= T0Con::T08BIT;
        }
        if let ClockSource::External(edge) = self.clock_source {
            t0con |= T0Con::T0CS;
            if edge == Edge::Falling {
                t0con |= T0Con::T0SE;
            }
        }
        match self.prescale {
            Some(prescale) => t0con |= T0Con::from_bits_truncate(prescale.bits()),
            None => t0con |= T0Con::PSA,
        }
        t0con
    }
}

#[cfg(target_os = "none")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigError::UnsupportedPrescale(ratio) => {
                defmt::write!(f, "unsupported prescale ratio 1:{}", ratio)
            }
            ConfigError::ReloadOutOfRange { reload, .. } => {
                defmt::write!(f, "reload {=u16:#x} does not fit width", reload)
            }
            ConfigError::CountOutOfRange { count, .. } => {
                defmt::write!(f, "count {} out of range", count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: Width, prescale: Option<Prescale>, reload: u16) -> TimerConfig {
        TimerConfig::new(width, ClockSource::Internal, prescale, reload, Priority::Low).unwrap()
    }

    #[test]
    fn prescale_ratio_round_trips_through_bits() {
        for prescale in Prescale::ALL {
            assert_eq!(Prescale::from_bits(prescale.bits()), prescale);
            assert_eq!(Prescale::from_ratio(prescale.ratio()), Ok(prescale));
        }
        assert_eq!(Prescale::Div2.ratio(), 2);
        assert_eq!(Prescale::Div256.ratio(), 256);
    }

    #[test]
    fn unsupported_prescale_is_rejected() {
        for ratio in [0, 1, 3, 100, 512] {
            assert_eq!(
                Prescale::from_ratio(ratio),
                Err(ConfigError::UnsupportedPrescale(ratio))
            );
        }
    }

    #[test]
    fn period_formula_for_every_ratio_and_boundary() {
        for prescale in Prescale::ALL {
            let ratio = prescale.ratio() as u32;
            for (width, bits) in [(Width::Bits8, 8), (Width::Bits16, 16)] {
                let max = width.max();
                for reload in [0, 1, max / 2, max - 1, max] {
                    let expected = ratio * ((1u32 << bits) - reload as u32);
                    assert_eq!(config(width, Some(prescale), reload).period_ticks(), expected);
                }
                // 最小周期: 一次计数
                assert_eq!(config(width, Some(prescale), max).period_ticks(), ratio);
            }
        }
    }

    #[test]
    fn sixteen_bit_div256_boundaries() {
        let min = config(Width::Bits16, Some(Prescale::Div256), 0xFFFF);
        assert_eq!(min.period_ticks(), 256);

        let max = config(Width::Bits16, Some(Prescale::Div256), 0x0000);
        assert_eq!(max.period_ticks(), 16_777_216);
    }

    #[test]
    fn bypassed_prescaler_counts_every_tick() {
        let c = config(Width::Bits8, None, 0xF0);
        assert_eq!(c.ratio(), 1);
        assert_eq!(c.period_ticks(), 16);
    }

    #[test]
    fn reload_must_fit_width() {
        let err = TimerConfig::new(
            Width::Bits8,
            ClockSource::Internal,
            None,
            0x100,
            Priority::Low,
        );
        assert_eq!(
            err,
            Err(ConfigError::ReloadOutOfRange {
                reload: 0x100,
                width: Width::Bits8
            })
        );
    }

    #[test]
    fn count_derives_reload() {
        let c = TimerConfig::with_count(
            Width::Bits16,
            ClockSource::Internal,
            Some(Prescale::Div8),
            1000,
            Priority::Low,
        )
        .unwrap();
        assert_eq!(c.reload, 0xFFFF - 999);
        assert_eq!(c.period_ticks(), 8000);

        let full = TimerConfig::with_count(Width::Bits8, ClockSource::Internal, None, 256, Priority::Low)
            .unwrap();
        assert_eq!(full.reload, 0);

        for count in [0, 257] {
            assert_eq!(
                TimerConfig::with_count(Width::Bits8, ClockSource::Internal, None, count, Priority::Low),
                Err(ConfigError::CountOutOfRange {
                    count,
                    width: Width::Bits8
                })
            );
        }
    }

    #[test]
    fn period_in_nanoseconds() {
        // 48MHz 晶振, 指令周期 12MHz
        let c = config(Width::Bits16, Some(Prescale::Div256), 0xFFFF);
        assert_eq!(c.period_ns(12_000_000), 21_333);
    }

    #[test]
    fn control_byte_encoding() {
        let original = config(Width::Bits16, Some(Prescale::Div256), 0xFFFF);
        assert_eq!(original.control().bits(), 0x07);

        let external = TimerConfig::new(
            Width::Bits8,
            ClockSource::External(Edge::Falling),
            None,
            0,
            Priority::High,
        )
        .unwrap();
        assert_eq!(
            external.control(),
            T0Con::T08BIT | T0Con::T0CS | T0Con::T0SE | T0Con::PSA
        );
    }

    #[test]
    fn config_error_display() {
        assert_eq!(
            ConfigError::UnsupportedPrescale(3).to_string(),
            "unsupported prescale ratio 1:3"
        );
        assert_eq!(
            ConfigError::ReloadOutOfRange {
                reload: 0x100,
                width: Width::Bits8
            }
            .to_string(),
            "reload 0x0100 does not fit Bits8"
        );
    }
}
