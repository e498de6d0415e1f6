// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! The per-period measurement record and its wire format.
//!
//! A frame is the six fields of [`SampleWindow`] in declaration order, each 4 bytes little-endian
//! with no padding, followed by a single `\n`:
//!
//! | Offset | Field | Type |
//! | ------ | ----- | ---- |
//! | 0 | `period` | `u32` |
//! | 4 | `pulse_enc_max` | `u32` |
//! | 8 | `pulse_enc` | `u32` |
//! | 12 | `pulse_enc_z` | `u32` |
//! | 16 | `pulse_rpm` | `u32` |
//! | 20 | `temperature` | `f32` (IEEE 754 bits) |
//! | 24 | terminator | `0x0A` |
//!
//! The layout is produced field by field, so it does not depend on the target's struct layout.

use core::fmt;

/// Size of the packed record, without terminator.
pub const WINDOW_SIZE: usize = 24;

/// Size of one frame on the wire.
pub const FRAME_LEN: usize = WINDOW_SIZE + 1;

/// Last byte of every frame.
pub const FRAME_TERMINATOR: u8 = b'\n';

/// One sampling period worth of measurements.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleWindow {
    /// Milliseconds since the previous emitted window.
    pub period: u32,
    /// Configured encoder pulses per revolution.
    pub pulse_enc_max: u32,
    /// Forward encoder pulses counted over `period`.
    pub pulse_enc: u32,
    /// Revolution index count.
    pub pulse_enc_z: u32,
    /// RPM-channel pulses counted over `period`.
    pub pulse_rpm: u32,
    /// Last good thermocouple reading in degrees Celsius.
    pub temperature: f32,
}

impl SampleWindow {
    /// A zeroed window for an encoder with `pulse_enc_max` pulses per revolution.
    pub const fn new(pulse_enc_max: u32) -> Self {
        Self {
            period: 0,
            pulse_enc_max,
            pulse_enc: 0,
            pulse_enc_z: 0,
            pulse_rpm: 0,
            temperature: 0.0,
        }
    }

    /// Serialize into a terminated frame.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let words = [
            self.period,
            self.pulse_enc_max,
            self.pulse_enc,
            self.pulse_enc_z,
            self.pulse_rpm,
            self.temperature.to_bits(),
        ];

        let mut frame = [0u8; FRAME_LEN];
        for (slot, word) in frame[..WINDOW_SIZE].chunks_exact_mut(4).zip(words) {
            slot.copy_from_slice(&word.to_le_bytes());
        }
        frame[WINDOW_SIZE] = FRAME_TERMINATOR;
        frame
    }

    /// Parse exactly one frame, as produced by [`encode`](Self::encode).
    pub fn decode(frame: &[u8]) -> Result<Self, FrameError> {
        if frame.len() != FRAME_LEN {
            return Err(FrameError::Length { found: frame.len() });
        }
        let terminator = frame[WINDOW_SIZE];
        if terminator != FRAME_TERMINATOR {
            return Err(FrameError::Terminator { found: terminator });
        }

        let mut words = [0u32; WINDOW_SIZE / 4];
        for (word, bytes) in words.iter_mut().zip(frame[..WINDOW_SIZE].chunks_exact(4)) {
            *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        Ok(Self {
            period: words[0],
            pulse_enc_max: words[1],
            pulse_enc: words[2],
            pulse_enc_z: words[3],
            pulse_rpm: words[4],
            temperature: f32::from_bits(words[5]),
        })
    }
}

/// Why a byte slice is not a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frames are exactly [`FRAME_LEN`] bytes.
    Length { found: usize },
    /// The last byte was not `\n`.
    Terminator { found: u8 },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrameError::Length { found } => {
                write!(f, "frame is {} bytes, expected {}", found, FRAME_LEN)
            }
            FrameError::Terminator { found } => {
                write!(f, "frame ends with 0x{:02X} instead of newline", found)
            }
        }
    }
}
