// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F767 dyno board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiob, Alternate, Output, PushPull},
    pac,
    prelude::*,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB);
/// ```
pub struct BoardPins {
    pub leds: LedPins,
    pub encoder: EncoderPins,
    pub rpm: gpiob::PB9<Alternate<2>>,
    pub index: gpioa::PA2<Alternate<2>>,
    pub spi1: Spi1Pins,
    pub usb: UsbPins,
}

pub struct LedPins {
    pub running: gpiob::PB3<Output<PushPull>>,
    pub fault: gpiob::PB4<Output<PushPull>>,
}

/// TIM2 quadrature inputs
pub struct EncoderPins {
    pub tim2_ch1: gpioa::PA0<Alternate<1>>,
    pub tim2_ch2: gpioa::PA1<Alternate<1>>,
}

/// SPI1 SCK/MISO/MOSI and the MAX6675 chip select
pub struct Spi1Pins {
    pub sck: gpioa::PA5<Alternate<5>>,
    pub miso: gpioa::PA6<Alternate<5>>,
    pub mosi: gpioa::PA7<Alternate<5>>,
    pub cs: gpiob::PB0<Output<PushPull>>,
}

/// USB OTG FS data lines
pub struct UsbPins {
    pub dm: gpioa::PA11<Alternate<10>>,
    pub dp: gpioa::PA12<Alternate<10>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpiob: pac::GPIOB) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();

        Self {
            leds: LedPins {
                running: gpiob.pb3.into_push_pull_output(),
                fault: gpiob.pb4.into_push_pull_output(),
            },

            encoder: EncoderPins {
                tim2_ch1: gpioa.pa0.into_alternate::<1>(),
                tim2_ch2: gpioa.pa1.into_alternate::<1>(),
            },

            rpm: gpiob.pb9.into_alternate::<2>(), // TIM4_CH4
            index: gpioa.pa2.into_alternate::<2>(), // TIM5_CH3

            spi1: Spi1Pins {
                sck: gpioa.pa5.into_alternate::<5>(),
                miso: gpioa.pa6.into_alternate::<5>(),
                mosi: gpioa.pa7.into_alternate::<5>(),
                cs: gpiob.pb0.into_push_pull_output(),
            },

            usb: UsbPins {
                dm: gpioa.pa11.into_alternate::<10>(),
                dp: gpioa.pa12.into_alternate::<10>(),
            },
        }
    }
}
