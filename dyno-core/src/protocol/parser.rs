// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-at-a-time parser for the command protocol.
//!
//! Garbage between packets, unknown ids and bad checksums all drop the parser back to hunting
//! for the next sync byte. A sync byte where an id or checksum was expected starts a new packet.

use crate::protocol::messages::*;

enum State {
    WaitStart,
    WaitId,
    WaitChecksum { id: u8 },
}

pub struct Parser {
    state: State,
    checksum: u8,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::WaitStart,
            checksum: 0,
        }
    }

    /// Process a single incoming byte. Returns `Some(Command)` if a complete packet is received.
    pub fn push(&mut self, byte: u8) -> Option<Command> {
        match self.state {
            State::WaitStart => {
                if byte == START_BYTE {
                    self.state = State::WaitId;
                    self.checksum = 0;
                }
            }
            State::WaitId => {
                if byte == START_BYTE {
                    // Repeated sync byte: the packet starts here.
                    self.checksum = 0;
                    return None;
                }
                self.checksum = self.checksum.wrapping_add(byte);

                if Command::from_id(byte).is_some() {
                    self.state = State::WaitChecksum { id: byte };
                } else {
                    debug!("unknown command id {=u8:#x}", byte);
                    self.state = State::WaitStart;
                }
            }
            State::WaitChecksum { id } => {
                if byte == self.checksum {
                    self.state = State::WaitStart;
                    return Command::from_id(id);
                }
                debug!("command checksum mismatch");

                if byte == START_BYTE {
                    self.state = State::WaitId;
                    self.checksum = 0;
                } else {
                    self.state = State::WaitStart;
                }
            }
        }
        None
    }

    /// Feed a buffer, yielding every complete command in it, in order.
    ///
    /// The iterator is lazy: bytes after the last one pulled are not consumed.
    pub fn commands<'p>(&'p mut self, bytes: &'p [u8]) -> impl Iterator<Item = Command> + 'p {
        bytes.iter().filter_map(move |&b| self.push(b))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
