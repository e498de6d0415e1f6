// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Millisecond tick driven by SysTick.
//!
//! The counter is free-running and wraps after about 49.7 days; callers compare ticks with
//! `wrapping_sub`.

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::{syst::SystClkSource, SYST};
use stm32f7xx_hal::rcc::Clocks;

static MILLIS: AtomicU32 = AtomicU32::new(0);

/// Rate of the tick interrupt.
pub const TICK_HZ: u32 = 1_000;

/// Start SysTick at [`TICK_HZ`] from the core clock.
pub fn start(mut syst: SYST, clocks: &Clocks) {
    let reload = clocks.sysclk().raw() / TICK_HZ - 1;

    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(reload);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
}

/// Milliseconds since [`start`].
#[inline]
pub fn now_ms() -> u32 {
    MILLIS.load(Ordering::Relaxed)
}

/// Advance the tick. Call from the `SysTick` exception only.
#[inline]
pub fn on_tick() {
    MILLIS.fetch_add(1, Ordering::Relaxed);
}

/// Spin until `ms` milliseconds have passed. Needs the tick running.
pub fn busy_wait_ms(ms: u32) {
    let start = now_ms();
    while now_ms().wrapping_sub(start) < ms {
        cortex_m::asm::nop();
    }
}
