// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Unrecoverable-fault routine.
//!
//! Interrupts are masked and the fault LED blinks forever. The blink is timed with cycle-counted
//! delays since SysTick no longer runs once interrupts are off.

use cortex_m::{asm, interrupt};
use dyno_core::Indicator;
use embedded_hal::digital::OutputPin;
use stm32f7xx_hal::pac;

/// Core cycles per half blink period (about 250 ms at 216 MHz).
const HALF_PERIOD_CYCLES: u32 = 54_000_000;

/// Fault LED pin number on GPIOB.
const FAULT_LED_PIN: u8 = 4;

/// Halt with the fault LED blinking.
pub fn halt<PIN: OutputPin>(indicator: &mut Indicator<PIN>) -> ! {
    interrupt::disable();
    loop {
        indicator.toggle();
        asm::delay(HALF_PERIOD_CYCLES);
    }
}

/// Halt without owning the fault LED. Used from exception handlers.
pub fn halt_unowned() -> ! {
    interrupt::disable();
    let gpiob = unsafe { &*pac::GPIOB::ptr() };
    let mask = 1 << FAULT_LED_PIN;
    loop {
        gpiob.odr.modify(|r, w| unsafe { w.bits(r.bits() ^ mask) });
        asm::delay(HALF_PERIOD_CYCLES);
    }
}
