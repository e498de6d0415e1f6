// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Rising-edge input capture channels used as pulse interrupt sources.
//!
//! Each channel raises its timer's capture interrupt on every rising edge. The interrupt handler
//! acknowledges the edge and bumps a [`PulseAccumulator`](dyno_core::PulseAccumulator); the
//! captured timer value itself is never used.
//!
//! - `RpmCapture`: TIM4 CH4 on PB9, the speed sensor.
//! - `IndexCapture`: TIM5 CH3 on PA2, the encoder index (Z) output.

use cortex_m::peripheral::NVIC;
use dyno_core::hal::InterruptSource;
use stm32f7xx_hal::pac::{self, Interrupt};

/// Input filter: f_DTS/16, N = 8.
const INPUT_FILTER: u8 = 0b1010;

pub struct RpmCapture {
    tim: pac::TIM4,
}

impl RpmCapture {
    /// Configure TIM4 CH4 for rising-edge capture. The interrupt stays masked until enabled.
    pub fn tim4(tim4: pac::TIM4) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim4en().set_bit());

        let tim = tim4;

        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| unsafe { w.bits(0) });
        tim.arr.write(|w| unsafe { w.bits(0xFFFF) });

        // CC4 mapped on TI4, filtered
        tim.ccmr2_input()
            .modify(|_, w| unsafe { w.cc4s().bits(0b01).ic4f().bits(INPUT_FILTER) });

        // Rising edge, capture enabled
        tim.ccer.modify(|_, w| w.cc4p().clear_bit().cc4np().clear_bit().cc4e().set_bit());

        tim.dier.modify(|_, w| w.cc4ie().clear_bit());
        tim.sr.modify(|_, w| w.cc4if().clear_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    pub fn free(self) -> pac::TIM4 {
        self.tim
    }
}

impl InterruptSource for RpmCapture {
    fn enable(&mut self) {
        self.tim.sr.modify(|_, w| w.cc4if().clear_bit());
        self.tim.dier.modify(|_, w| w.cc4ie().set_bit());
        unsafe { NVIC::unmask(Interrupt::TIM4) };
    }

    fn disable(&mut self) {
        NVIC::mask(Interrupt::TIM4);
        self.tim.dier.modify(|_, w| w.cc4ie().clear_bit());
    }
}

/// Clear the pending capture flag. Call from the `TIM4` handler.
#[inline]
pub fn acknowledge_rpm_edge() {
    let tim = unsafe { &*pac::TIM4::ptr() };
    tim.sr.modify(|_, w| w.cc4if().clear_bit());
}

#[cfg(feature = "phase-z")]
pub struct IndexCapture {
    tim: pac::TIM5,
}

#[cfg(feature = "phase-z")]
impl IndexCapture {
    /// Configure TIM5 CH3 for rising-edge capture. The interrupt stays masked until enabled.
    pub fn tim5(tim5: pac::TIM5) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim5en().set_bit());

        let tim = tim5;

        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| unsafe { w.bits(0) });
        tim.arr.write(|w| unsafe { w.bits(0xFFFF_FFFF) });

        // CC3 mapped on TI3, filtered
        tim.ccmr2_input()
            .modify(|_, w| unsafe { w.cc3s().bits(0b01).ic3f().bits(INPUT_FILTER) });

        tim.ccer.modify(|_, w| w.cc3p().clear_bit().cc3np().clear_bit().cc3e().set_bit());

        tim.dier.modify(|_, w| w.cc3ie().clear_bit());
        tim.sr.modify(|_, w| w.cc3if().clear_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    pub fn free(self) -> pac::TIM5 {
        self.tim
    }
}

#[cfg(feature = "phase-z")]
impl InterruptSource for IndexCapture {
    fn enable(&mut self) {
        self.tim.sr.modify(|_, w| w.cc3if().clear_bit());
        self.tim.dier.modify(|_, w| w.cc3ie().set_bit());
        unsafe { NVIC::unmask(Interrupt::TIM5) };
    }

    fn disable(&mut self) {
        NVIC::mask(Interrupt::TIM5);
        self.tim.dier.modify(|_, w| w.cc3ie().clear_bit());
    }
}

/// Clear the pending capture flag. Call from the `TIM5` handler.
#[cfg(feature = "phase-z")]
#[inline]
pub fn acknowledge_index_edge() {
    let tim = unsafe { &*pac::TIM5::ptr() };
    tim.sr.modify(|_, w| w.cc3if().clear_bit());
}
