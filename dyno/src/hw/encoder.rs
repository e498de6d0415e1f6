// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Quadrature encoder on TIM2 in encoder mode.
//!
//! TIM2 is a 32-bit timer, but the auto-reload is set to `0xFFFF` so the count wraps like a 16-bit
//! register in both directions. Only the low half-word is reported.

use dyno_core::hal::CounterRegister;
use stm32f7xx_hal::pac;

pub struct Encoder<TIM> {
    tim: TIM,
}

impl<TIM> Encoder<TIM> {
    /// Consume the wrapper and return the underlying timer peripheral.
    #[inline]
    pub fn free(self) -> TIM {
        self.tim
    }
}

impl Encoder<pac::TIM2> {
    /// Configure TIM2 as a 16-bit quadrature counter on CH1/CH2 (PA0/PA1).
    pub fn tim2(tim2: pac::TIM2) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim2en().set_bit());

        let tim = tim2;

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit());

        // Auto-reload: wrap at 16 bits
        tim.arr.write(|w| w.bits(0xFFFF));

        // Slave mode: encoder mode 3 (count on both TI1 and TI2)
        tim.smcr.modify(|_, w| w.sms().bits(0b011));

        // Configure CH1/CH2 as inputs from TI1/TI2
        tim.ccmr1_input().modify(|_, w| w.cc1s().ti1().cc2s().ti2());

        // Non-inverted, both channels enabled.
        tim.ccer.modify(|_, w| {
            w.cc1p()
                .clear_bit()
                .cc2p()
                .clear_bit()
                .cc1e()
                .set_bit()
                .cc2e()
                .set_bit()
        });

        tim.cnt.write(|w| w.bits(0));
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }
}

impl CounterRegister for Encoder<pac::TIM2> {
    #[inline]
    fn read(&self) -> u16 {
        self.tim.cnt.read().bits() as u16
    }

    #[inline]
    fn reset(&mut self) {
        self.tim.cnt.write(|w| w.bits(0));
    }
}
