// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fire-and-forget frame output.
//!
//! Frames go out only while the host has the port open. Anything sent while it is closed is
//! dropped on the floor: there is no queue and no retry, and the next window simply replaces it.
//!
//! The transport may take a frame in pieces. Once the first byte of a frame is accepted, the rest
//! of it is held back and pushed out by [`service`](FrameTransmitter::service) or the next
//! [`send`](FrameTransmitter::send) before any other frame starts, so the host only ever sees
//! whole frames. Frames are only ever dropped at a frame boundary.

use core::fmt;

use crate::hal::Transport;
use crate::window::{SampleWindow, FRAME_LEN};

#[derive(Debug, PartialEq)]
pub enum TransmitError<E> {
    /// No host session; the frame was dropped.
    NotReady,
    /// The tail of the previous frame has not drained yet; the frame was dropped.
    Busy,
    /// The transport rejected the write.
    Transport(E),
}

impl<E> TransmitError<E> {
    pub fn describe(&self) -> &'static str {
        match self {
            TransmitError::NotReady => "transport not ready",
            TransmitError::Busy => "previous frame still draining",
            TransmitError::Transport(_) => "transport write failed",
        }
    }
}

impl<E: fmt::Debug> fmt::Display for TransmitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransmitError::NotReady => write!(f, "transport not ready"),
            TransmitError::Busy => write!(f, "previous frame still draining"),
            TransmitError::Transport(e) => write!(f, "transport error: {:?}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for TransmitError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            TransmitError::NotReady => defmt::write!(f, "transport not ready"),
            TransmitError::Busy => defmt::write!(f, "previous frame still draining"),
            TransmitError::Transport(e) => defmt::write!(f, "transport error: {}", e),
        }
    }
}

pub struct FrameTransmitter<T> {
    transport: T,

    /// The frame currently going out. Bytes from `sent` on are still owed to the host.
    frame: [u8; FRAME_LEN],
    sent: usize,
}

impl<T: Transport> FrameTransmitter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            frame: [0; FRAME_LEN],
            sent: FRAME_LEN,
        }
    }

    /// Whether a frame sent now would go out.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.transport.is_open()
    }

    /// Whether part of a frame is still waiting for room on the link.
    #[inline]
    pub fn has_backlog(&self) -> bool {
        self.sent < FRAME_LEN
    }

    /// Encode `window` and write it, if the host is listening.
    ///
    /// `Ok` means the frame is committed: it has gone out, or its tail is held back and will
    /// follow before anything else.
    pub fn send(&mut self, window: &SampleWindow) -> Result<(), TransmitError<T::Error>> {
        if !self.transport.is_open() {
            self.discard_backlog();
            return Err(TransmitError::NotReady);
        }
        if self.drain()? {
            return Err(TransmitError::Busy);
        }

        self.frame = window.encode();
        self.sent = 0;
        self.drain()?;
        Ok(())
    }

    /// Push out any held-back tail. Drops it instead once the host has closed the port, so a new
    /// session starts on a frame boundary.
    pub fn service(&mut self) -> Result<(), TransmitError<T::Error>> {
        if !self.has_backlog() {
            return Ok(());
        }
        if !self.transport.is_open() {
            self.discard_backlog();
            return Err(TransmitError::NotReady);
        }
        self.drain()?;
        Ok(())
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn free(self) -> T {
        self.transport
    }

    fn discard_backlog(&mut self) {
        if self.has_backlog() {
            debug!("discarding {=usize} unsent frame bytes", FRAME_LEN - self.sent);
        }
        self.sent = FRAME_LEN;
    }

    /// Write as much of the owed bytes as the link takes. `Ok(true)` if some are still owed.
    fn drain(&mut self) -> Result<bool, TransmitError<T::Error>> {
        while self.sent < FRAME_LEN {
            let n = self
                .transport
                .write(&self.frame[self.sent..])
                .map_err(TransmitError::Transport)?;
            if n == 0 {
                return Ok(true);
            }
            self.sent += n.min(FRAME_LEN - self.sent);
        }
        Ok(false)
    }
}
