// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MAX6675 K-type thermocouple converter.
//!
//! The MAX6675 is read-only: pulling CS low freezes the last conversion and clocks it out as one
//! big-endian 16-bit word.
//!
//! | Bits | Meaning |
//! | ---- | ------- |
//! | 15 | dummy sign bit, always 0 |
//! | 14..3 | temperature, 0.25 °C per LSB |
//! | 2 | thermocouple input open |
//! | 1 | device ID |
//! | 0 | three-state |
//!
//! The bus runs in SPI mode 0, MSB first, and is expected to bound the transfer by
//! [`TRANSFER_TIMEOUT_MS`]; a conversion takes up to 220 ms.

use core::fmt;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Upper bound for one 2-byte transfer.
pub const TRANSFER_TIMEOUT_MS: u32 = 250;

/// Bit 2 of the raw word: no thermocouple attached.
const OPEN_INPUT: u16 = 1 << 2;

/// Degrees per LSB of the 13-bit value.
const RESOLUTION_C: f32 = 0.25;

/// A temperature in degrees Celsius.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Celsius(pub f32);

impl Celsius {
    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }
}

/// Decode a raw MAX6675 word. `None` if the thermocouple is not connected.
pub fn decode_raw(raw: u16) -> Option<Celsius> {
    if raw & OPEN_INPUT != 0 {
        return None;
    }
    Some(Celsius(f32::from(raw >> 3) * RESOLUTION_C))
}

/// Errors from a probe read.
#[derive(Debug, PartialEq)]
pub enum ProbeError<E> {
    /// The SPI transfer failed or timed out.
    Bus(E),
    /// Driving the chip-select line failed.
    ChipSelect,
    /// The converter reports no thermocouple on its input.
    NotConnected,
}

impl<E> ProbeError<E> {
    /// Short static description, for logging without formatting the bus error.
    pub fn describe(&self) -> &'static str {
        match self {
            ProbeError::Bus(_) => "bus error",
            ProbeError::ChipSelect => "chip select error",
            ProbeError::NotConnected => "thermocouple not connected",
        }
    }
}

impl<E> From<E> for ProbeError<E> {
    fn from(error: E) -> Self {
        ProbeError::Bus(error)
    }
}

impl<E: fmt::Debug> fmt::Display for ProbeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProbeError::Bus(e) => write!(f, "SPI error: {:?}", e),
            ProbeError::ChipSelect => write!(f, "chip select error"),
            ProbeError::NotConnected => write!(f, "thermocouple not connected"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for ProbeError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ProbeError::Bus(e) => defmt::write!(f, "SPI error: {}", e),
            ProbeError::ChipSelect => defmt::write!(f, "chip select error"),
            ProbeError::NotConnected => defmt::write!(f, "thermocouple not connected"),
        }
    }
}

/// MAX6675 on a dedicated bus with a manual, active-low chip select.
pub struct Max6675<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> Max6675<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Take ownership of the bus and chip select. CS is driven inactive (high).
    pub fn new(spi: SPI, mut cs: CS) -> Self {
        cs.set_high().ok();
        Self { spi, cs }
    }

    /// Clock out the raw 16-bit word.
    ///
    /// Chip select is released again whether or not the transfer succeeded.
    pub fn read_raw(&mut self) -> Result<u16, ProbeError<SPI::Error>> {
        let mut buf = [0u8; 2];

        self.cs.set_low().map_err(|_| ProbeError::ChipSelect)?;
        let transfer = self
            .spi
            .read(&mut buf)
            .and_then(|()| self.spi.flush());
        let released = self.cs.set_high();

        transfer?;
        released.map_err(|_| ProbeError::ChipSelect)?;

        Ok(u16::from_be_bytes(buf))
    }

    /// Read the current temperature.
    pub fn read(&mut self) -> Result<Celsius, ProbeError<SPI::Error>> {
        let raw = self.read_raw()?;
        decode_raw(raw).ok_or(ProbeError::NotConnected)
    }

    pub fn free(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}
