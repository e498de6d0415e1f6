// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Push-pull outputs exposed through `embedded-hal` 1.0.
//!
//! The HAL's pins implement the 0.2 digital traits; the acquisition core wants the 1.0 ones.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use stm32f7xx_hal::gpio::{self, PushPull};

/// A GPIO driven as a push-pull output, generic over any pin.
pub struct Output<const P: char, const N: u8> {
    pin: gpio::Pin<P, N, gpio::Output<PushPull>>,
}

impl<const P: char, const N: u8> Output<P, N> {
    /// Reconfigure `pin` as a push-pull output, driven low.
    pub fn push_pull<MODE>(pin: gpio::Pin<P, N, MODE>) -> Self {
        let mut pin = pin.into_push_pull_output();
        pin.set_low();
        Self { pin }
    }

    pub fn free(self) -> gpio::Pin<P, N, gpio::Output<PushPull>> {
        self.pin
    }
}

impl<const P: char, const N: u8> ErrorType for Output<P, N> {
    type Error = Infallible;
}

impl<const P: char, const N: u8> OutputPin for Output<P, N> {
    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low();
        Ok(())
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high();
        Ok(())
    }
}
