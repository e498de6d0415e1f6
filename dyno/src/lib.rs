// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Dyno Firmware
//!
//! Board support for the dyno measurement front-end, targeting an STM32F767 MCU. The acquisition
//! pipeline itself lives in `dyno-core`; this crate binds it to the timers, SPI bus, USB port and
//! LEDs of the board.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hw`] | MCU-level wrappers around timers, SPI, USB, GPIO and SysTick |
//! | [`fault`] | Fault halt routine |
//!
//! ## Features
//!
//! - **`defmt`**: log over RTT.
//! - **`phase-z`**: count revolutions from the encoder index output on PA2.
//!
//! ## Getting Started
//!
//! Build docs:
//!
//! ```bash
//! cargo doc -p dyno --no-deps --open --target thumbv7em-none-eabihf
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run -p dyno --release --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![no_std]

pub mod fault;
pub mod hw;
