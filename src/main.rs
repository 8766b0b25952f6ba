#![no_std]
#![no_main]

use stm32f103_tick::{
    config::TIMER0,
    hardware::{stm32::Tim3Registers, timer0::Timer0},
};

use cortex_m::asm::wfi;
use defmt::println;
use stm32f1xx_hal::{flash::FlashExt, prelude::_stm32_hal_rcc_RccExt};

// 定义应用程序资源和任务
// TIM3 中断在编译期绑定到 Timer0 溢出中断服务
#[rtic::app(device = stm32f1xx_hal::pac, peripherals = true)]
mod app {
    use super::*;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        timer0: Timer0<Tim3Registers>,
    }

    // 初始化函数
    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        println!("init start ...");

        // 使能 TIM3 时钟
        ctx.device.RCC.apb1enr.modify(|_, w| w.tim3en().set_bit());

        let mut flash = ctx.device.FLASH.constrain();
        let rcc = ctx.device.RCC.constrain();

        // 初始化时钟
        let clocks = rcc.cfgr.freeze(&mut flash.acr);

        // 初始化 Timer0, 中断在 init 返回后开启
        let regs = Tim3Registers::new(ctx.device.TIM3, ctx.core.NVIC);
        let timer0 = Timer0::configure(regs, TIMER0);

        println!(
            "timer0 period: {} ticks, {} ns",
            timer0.period_ticks(),
            TIMER0.period_ns(clocks.pclk1_tim().raw())
        );
        println!("init end ...");

        (Shared {}, Local { timer0 })
    }

    /// Timer0 溢出中断
    #[task(binds = TIM3, priority = 1, local = [timer0])]
    fn timer0_overflow(ctx: timer0_overflow::Context) {
        ctx.local.timer0.on_overflow(|| {
            // 每个周期执行一次的应用逻辑
        });
    }

    /// 任务处理
    #[idle(local = [], shared = [])]
    fn idle(_ctx: idle::Context) -> ! {
        loop {
            wfi();
        }
    }
}
