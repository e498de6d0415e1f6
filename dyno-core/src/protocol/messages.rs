// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command messages the host sends to start and stop acquisition.
//!
//! A packet is three bytes: `[START_BYTE, id, checksum]`, where the checksum is the wrapping sum
//! of every byte after the sync byte (for a bare command, just the id).

/// Sync byte for the protocol.
pub const START_BYTE: u8 = 0xA5;

// Message IDs
pub const MSG_START: u8 = 0x10;
pub const MSG_STOP: u8 = 0x11;

/// Length of an encoded command packet.
pub const PACKET_LEN: usize = 3;

/// Control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Start,
    Stop,
}

impl Command {
    #[inline]
    pub fn id(self) -> u8 {
        match self {
            Command::Start => MSG_START,
            Command::Stop => MSG_STOP,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            MSG_START => Some(Command::Start),
            MSG_STOP => Some(Command::Stop),
            _ => None,
        }
    }

    /// Build the packet the host sends for this command.
    pub fn encode(self) -> [u8; PACKET_LEN] {
        let id = self.id();
        [START_BYTE, id, id]
    }
}
