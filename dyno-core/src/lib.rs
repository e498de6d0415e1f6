// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Dyno Core
//!
//! Hardware-independent acquisition and framing pipeline for the dyno measurement front-end. The
//! firmware crate (`dyno`) wires these components to STM32F7 peripherals; everything in here is
//! written against the small semantic traits in [`hal`] and the `embedded-hal` 1.0 traits, so it
//! also runs (and is tested) on the host.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hal`] | Collaborator traits: counter register, interrupt source, transport |
//! | [`config`] | Session constants (PPR, RPM, sampling period) |
//! | [`quadrature`] | Direction-filtered quadrature counter |
//! | [`pulse`] | Interrupt-fed pulse accumulators and capture channels |
//! | [`probe`] | MAX6675 thermocouple read protocol |
//! | [`window`] | `SampleWindow` record and its binary frame codec |
//! | [`transmit`] | Fire-and-forget frame transmitter |
//! | [`indicator`] | LED indicator abstraction |
//! | [`protocol`] | Host start/stop command packets |
//! | [`acquisition`] | The fixed-period sampling loop |
//!
//! ## Features
//!
//! - **`defmt`**: log through `defmt` and derive `defmt::Format` on public types.
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod acquisition;
pub mod config;
pub mod hal;
pub mod indicator;
pub mod probe;
pub mod protocol;
pub mod pulse;
pub mod quadrature;
pub mod transmit;
pub mod window;

#[cfg(test)]
mod testing;

pub use acquisition::{AcquisitionLoop, RunState};
pub use config::DynoConfig;
pub use indicator::Indicator;
pub use probe::{Celsius, Max6675, ProbeError};
pub use protocol::{Command, Parser};
pub use pulse::{CaptureChannel, NoIndex, PulseAccumulator};
pub use quadrature::QuadratureCounter;
pub use transmit::{FrameTransmitter, TransmitError};
pub use window::{FrameError, SampleWindow, FRAME_LEN};
