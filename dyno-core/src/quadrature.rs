// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Direction-filtered quadrature pulse counting.
//!
//! The counting itself happens in a timer running in encoder mode; no interrupt is involved. Each
//! read looks at the counter as a signed 16-bit delta: values up to the midpoint are forward
//! (clockwise) pulses and are reported, anything above is reverse rotation and is thrown away.
//! The counter is zeroed on every read either way, so reverse motion never leaves a negative
//! balance behind for the next window.

use crate::hal::CounterRegister;

/// Largest raw counter value still treated as forward rotation.
///
/// `0x8000` is the midpoint of the 16-bit range and is counted as forward.
pub const FORWARD_LIMIT: u16 = 0x8000;

pub struct QuadratureCounter<C> {
    counter: C,
}

impl<C> QuadratureCounter<C> {
    pub fn new(counter: C) -> Self {
        Self { counter }
    }

    /// Release the underlying counter register.
    #[inline]
    pub fn free(self) -> C {
        self.counter
    }
}

impl<C: CounterRegister> QuadratureCounter<C> {
    /// Take the pulses counted since the last read and zero the counter.
    ///
    /// Returns `None` when the counter went backwards.
    pub fn read_and_reset(&mut self) -> Option<u16> {
        let raw = self.counter.read();
        self.counter.reset();

        if raw <= FORWARD_LIMIT {
            Some(raw)
        } else {
            trace!("encoder reverse reading discarded: {=u16:#x}", raw);
            None
        }
    }

    /// Forward pulses since the last read, zero if the shaft ran backwards.
    #[inline]
    pub fn drain(&mut self) -> u32 {
        self.read_and_reset().map_or(0, u32::from)
    }

    /// Zero the counter without looking at it.
    #[inline]
    pub fn reset(&mut self) {
        self.counter.reset();
    }
}
