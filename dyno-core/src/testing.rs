// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host-side stand-ins for the board collaborators.
//!
//! Every fake is a cheap handle around shared cells, so a test can keep one clone to inject
//! stimulus and inspect effects while the code under test owns the other.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{ErrorKind, ErrorType as SpiErrorType, SpiBus};

use crate::hal::{CounterRegister, InterruptSource, Transport};
use crate::window::FRAME_LEN;

/// Quadrature counter register.
#[derive(Clone, Default)]
pub struct FakeCounter {
    value: Rc<Cell<u16>>,
}

impl FakeCounter {
    pub fn forward(&self, pulses: u32) {
        self.value.set(self.value.get().wrapping_add(pulses as u16));
    }

    pub fn reverse(&self, pulses: u32) {
        self.value.set(self.value.get().wrapping_sub(pulses as u16));
    }

    pub fn raw(&self) -> u16 {
        self.value.get()
    }
}

impl CounterRegister for FakeCounter {
    fn read(&self) -> u16 {
        self.value.get()
    }

    fn reset(&mut self) {
        self.value.set(0);
    }
}

/// Interrupt enable bit.
#[derive(Clone, Default)]
pub struct FakeIrq {
    enabled: Rc<Cell<bool>>,
}

impl FakeIrq {
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl InterruptSource for FakeIrq {
    fn enable(&mut self) {
        self.enabled.set(true);
    }

    fn disable(&mut self) {
        self.enabled.set(false);
    }
}

/// Push-pull output; starts low.
#[derive(Clone, Default)]
pub struct FakePin {
    high: Rc<Cell<bool>>,
}

impl FakePin {
    pub fn is_high(&self) -> bool {
        self.high.get()
    }
}

impl PinErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high.set(true);
        Ok(())
    }
}

/// Read-only SPI device returning a fixed 16-bit word, or a fixed error.
#[derive(Clone)]
pub struct FakeSpi {
    response: Rc<Cell<Result<u16, ErrorKind>>>,
    reads: Rc<Cell<usize>>,
    cs: Rc<RefCell<Option<FakePin>>>,
    cs_low_seen: Rc<Cell<Option<bool>>>,
}

impl Default for FakeSpi {
    fn default() -> Self {
        Self {
            response: Rc::new(Cell::new(Ok(0))),
            reads: Rc::new(Cell::new(0)),
            cs: Rc::new(RefCell::new(None)),
            cs_low_seen: Rc::new(Cell::new(None)),
        }
    }
}

impl FakeSpi {
    pub fn respond(&self, raw: u16) {
        self.response.set(Ok(raw));
    }

    pub fn fail(&self, kind: ErrorKind) {
        self.response.set(Err(kind));
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Record the chip-select level whenever a transfer happens.
    pub fn watch(&self, cs: FakePin) {
        *self.cs.borrow_mut() = Some(cs);
    }

    pub fn cs_low_during_transfer(&self) -> Option<bool> {
        self.cs_low_seen.get()
    }
}

impl SpiErrorType for FakeSpi {
    type Error = ErrorKind;
}

impl SpiBus<u8> for FakeSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.reads.set(self.reads.get() + 1);
        if let Some(cs) = self.cs.borrow().as_ref() {
            self.cs_low_seen.set(Some(!cs.is_high()));
        }
        let raw = self.response.get()?;
        for (dst, src) in words.iter_mut().zip(raw.to_be_bytes()) {
            *dst = src;
        }
        Ok(())
    }

    fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
        self.read(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.read(words)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkDown;

/// Host link recording the byte stream written to it.
///
/// Room is unlimited by default; [`set_room`](Self::set_room) caps how many more bytes the link
/// accepts before reporting itself full.
#[derive(Clone, Default)]
pub struct FakeTransport {
    open: Rc<Cell<bool>>,
    fail: Rc<Cell<bool>>,
    room: Rc<Cell<Option<usize>>>,
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl FakeTransport {
    pub fn open() -> Self {
        let link = Self::default();
        link.set_open(true);
        link
    }

    pub fn closed() -> Self {
        Self::default()
    }

    pub fn set_open(&self, open: bool) {
        self.open.set(open);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn set_room(&self, bytes: usize) {
        self.room.set(Some(bytes));
    }

    pub fn unlimited_room(&self) {
        self.room.set(None);
    }

    /// Forget everything written so far.
    pub fn clear(&self) {
        self.bytes.borrow_mut().clear();
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    /// The stream cut into frame-sized pieces.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.bytes
            .borrow()
            .chunks(FRAME_LEN)
            .map(|c| c.to_vec())
            .collect()
    }
}

impl Transport for FakeTransport {
    type Error = LinkDown;

    fn is_open(&self) -> bool {
        self.open.get()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        if self.fail.get() {
            return Err(LinkDown);
        }
        let n = match self.room.get() {
            Some(room) => {
                let n = room.min(bytes.len());
                self.room.set(Some(room - n));
                n
            }
            None => bytes.len(),
        };
        self.bytes.borrow_mut().extend_from_slice(&bytes[..n]);
        Ok(n)
    }
}
