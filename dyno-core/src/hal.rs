// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Semantic interfaces to the hardware collaborators.
//!
//! The acquisition core never touches registers. Board support code implements these traits for
//! its timer, interrupt and USB wrappers; tests implement them with plain cells. The thermocouple
//! transfer goes through `embedded_hal::spi::SpiBus` and `embedded_hal::digital::OutputPin`
//! instead, since those already describe it.

/// A free-running 16-bit up/down counter driven by two quadrature phase inputs.
pub trait CounterRegister {
    /// Current raw counter value. Counts wrap modulo 65536 in both directions.
    fn read(&self) -> u16;

    /// Set the counter back to zero.
    fn reset(&mut self);
}

/// An interrupt source that can be switched on and off from the foreground.
pub trait InterruptSource {
    fn enable(&mut self);
    fn disable(&mut self);
}

/// The link to the host.
pub trait Transport {
    type Error;

    /// Whether a host-side session is open (e.g. the virtual COM port has DTR asserted).
    fn is_open(&self) -> bool;

    /// Queue as much of `bytes` as the link can take right now, without blocking.
    ///
    /// Returns the number of bytes accepted; `Ok(0)` means the link is full.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error>;
}
