// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt-fed pulse counting.
//!
//! A [`PulseAccumulator`] is shared between an input-capture interrupt handler, which calls
//! [`record_edge`](PulseAccumulator::record_edge) once per rising edge, and the foreground loop,
//! which drains it once per sampling window. Draining is a single atomic swap with zero, so an
//! edge that lands during the drain is counted in exactly one of the two windows.
//!
//! Typical board wiring:
//!
//! ```ignore
//! static RPM_PULSES: PulseAccumulator = PulseAccumulator::new();
//!
//! #[interrupt]
//! fn TIM4() {
//!     capture::acknowledge_rpm_edge();
//!     RPM_PULSES.record_edge();
//! }
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use crate::hal::InterruptSource;

/// Wrapping edge counter written from interrupt context.
pub struct PulseAccumulator {
    pulses: AtomicU32,
}

impl PulseAccumulator {
    pub const fn new() -> Self {
        Self {
            pulses: AtomicU32::new(0),
        }
    }

    /// Count one edge. Called from the capture interrupt.
    #[inline]
    pub fn record_edge(&self) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
    }

    /// Take the edges counted so far and start again from zero.
    #[inline]
    pub fn read_and_reset(&self) -> u32 {
        self.pulses.swap(0, Ordering::AcqRel)
    }

    /// Current count, without resetting.
    #[inline]
    pub fn peek(&self) -> u32 {
        self.pulses.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset(&self) {
        self.pulses.store(0, Ordering::Relaxed);
    }
}

impl Default for PulseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// An accumulator together with the interrupt source that feeds it.
pub struct CaptureChannel<'a, IRQ> {
    pulses: &'a PulseAccumulator,
    irq: IRQ,
}

impl<'a, IRQ: InterruptSource> CaptureChannel<'a, IRQ> {
    pub fn new(pulses: &'a PulseAccumulator, irq: IRQ) -> Self {
        Self { pulses, irq }
    }

    /// Clear the count and start taking edges.
    pub fn arm(&mut self) {
        self.pulses.reset();
        self.irq.enable();
    }

    /// Stop taking edges and clear the count.
    pub fn disarm(&mut self) {
        self.irq.disable();
        self.pulses.reset();
    }

    #[inline]
    pub fn drain(&self) -> u32 {
        self.pulses.read_and_reset()
    }

    pub fn free(self) -> IRQ {
        self.irq
    }
}

/// Placeholder interrupt source for boards without an index (Z) channel.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoIndex;

impl InterruptSource for NoIndex {
    fn enable(&mut self) {}
    fn disable(&mut self) {}
}
