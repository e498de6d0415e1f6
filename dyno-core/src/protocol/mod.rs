// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host-to-device control packets.

pub mod messages;
pub mod parser;

pub use messages::Command;
pub use parser::Parser;
