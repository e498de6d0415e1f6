// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod capture;
pub mod encoder;
pub mod gpio;
pub mod pins;
pub mod spi;
pub mod tick;
pub mod usb;

pub use capture::RpmCapture;
#[cfg(feature = "phase-z")]
pub use capture::IndexCapture;
pub use encoder::Encoder;
pub use gpio::Output;
pub use pins::BoardPins;
pub use spi::ProbeSpi;
pub use usb::UsbTransport;
