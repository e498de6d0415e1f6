// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial Peripheral Interface (SPI) bus for the thermocouple converter.
//!
//! - `ProbeSpi` wraps a configured HAL SPI instance with 8-bit words and exposes it as an
//!   `embedded-hal` 1.0 [`SpiBus`]. Every transfer is bounded by
//!   [`TRANSFER_TIMEOUT_MS`](dyno_core::probe::TRANSFER_TIMEOUT_MS).
//! - Chip select is a plain [`Output`](super::gpio::Output) driven by the probe driver.

use embedded_hal::spi::{self as eh_spi, ErrorKind, ErrorType, SpiBus};
use embedded_hal_02::spi::FullDuplex;
use stm32f7xx_hal::spi::{self, Enabled, Spi};

use dyno_core::probe::TRANSFER_TIMEOUT_MS;

use super::tick;

/// Filler byte clocked out while reading.
const FILL: u8 = 0x00;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError {
    /// The transfer did not complete within the timeout.
    Timeout,
    Overrun,
    ModeFault,
    FrameFormat,
}

impl From<spi::Error> for SpiError {
    fn from(error: spi::Error) -> Self {
        match error {
            spi::Error::Overrun => SpiError::Overrun,
            spi::Error::ModeFault => SpiError::ModeFault,
            spi::Error::FrameFormat => SpiError::FrameFormat,
        }
    }
}

impl eh_spi::Error for SpiError {
    fn kind(&self) -> ErrorKind {
        match self {
            SpiError::Timeout => ErrorKind::Other,
            SpiError::Overrun => ErrorKind::Overrun,
            SpiError::ModeFault => ErrorKind::ModeFault,
            SpiError::FrameFormat => ErrorKind::FrameFormat,
        }
    }
}

/// Wrapper around an enabled HAL SPI instance (8-bit words).
pub struct ProbeSpi<I, P> {
    spi: Spi<I, P, Enabled<u8>>,
    timeout_ms: u32,
}

impl<I, P> ProbeSpi<I, P>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    pub fn new(spi: Spi<I, P, Enabled<u8>>) -> Self {
        Self {
            spi,
            timeout_ms: TRANSFER_TIMEOUT_MS,
        }
    }

    /// Full-duplex exchange of one byte, giving up once `started` is older than the timeout.
    fn exchange(&mut self, byte: u8, started: u32) -> Result<u8, SpiError> {
        self.spin(started, |spi| spi.send(byte))?;
        self.spin(started, |spi| spi.read())
    }

    fn spin<T>(
        &mut self,
        started: u32,
        mut op: impl FnMut(&mut Spi<I, P, Enabled<u8>>) -> nb::Result<T, spi::Error>,
    ) -> Result<T, SpiError> {
        loop {
            match op(&mut self.spi) {
                Ok(value) => return Ok(value),
                Err(nb::Error::Other(e)) => return Err(e.into()),
                Err(nb::Error::WouldBlock) => {
                    if tick::now_ms().wrapping_sub(started) > self.timeout_ms {
                        return Err(SpiError::Timeout);
                    }
                }
            }
        }
    }

    pub fn free(self) -> Spi<I, P, Enabled<u8>> {
        self.spi
    }
}

impl<I, P> ErrorType for ProbeSpi<I, P> {
    type Error = SpiError;
}

impl<I, P> SpiBus<u8> for ProbeSpi<I, P>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let started = tick::now_ms();
        for word in words.iter_mut() {
            *word = self.exchange(FILL, started)?;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let started = tick::now_ms();
        for &word in words {
            self.exchange(word, started)?;
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let started = tick::now_ms();
        let len = read.len().max(write.len());
        for i in 0..len {
            let out = write.get(i).copied().unwrap_or(FILL);
            let got = self.exchange(out, started)?;
            if let Some(slot) = read.get_mut(i) {
                *slot = got;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let started = tick::now_ms();
        for word in words.iter_mut() {
            *word = self.exchange(*word, started)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // Every exchange waits for its RX byte, so nothing is left in flight.
        Ok(())
    }
}
