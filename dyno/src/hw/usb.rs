// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USB CDC-ACM virtual COM port.
//!
//! The port is the only link to the host. Frames go out through the [`Transport`] impl; incoming
//! bytes for the command parser come from [`UsbTransport::receive`], which must run often enough
//! to keep the device enumerated.

use dyno_core::hal::Transport;
use stm32f7xx_hal::otg_fs::UsbBusType;
use usb_device::bus::UsbBusAllocator;
use usb_device::device::{StringDescriptors, UsbDevice, UsbDeviceBuilder, UsbDeviceState, UsbVidPid};
use usb_device::UsbError;
use usbd_serial::{SerialPort, USB_CLASS_CDC};

/// pid.codes test VID/PID.
const VID_PID: UsbVidPid = UsbVidPid(0x1209, 0x0001);

pub struct UsbTransport<'a> {
    device: UsbDevice<'a, UsbBusType>,
    serial: SerialPort<'a, UsbBusType>,
}

impl<'a> UsbTransport<'a> {
    pub fn new(bus: &'a UsbBusAllocator<UsbBusType>) -> Result<Self, UsbError> {
        let serial = SerialPort::new(bus);
        let device = UsbDeviceBuilder::new(bus, VID_PID)
            .strings(&[StringDescriptors::default()
                .manufacturer("Dyno")
                .product("Dyno measurement front-end")
                .serial_number("0001")])
            .map_err(|_| UsbError::InvalidState)?
            .device_class(USB_CLASS_CDC)
            .build();

        Ok(Self { device, serial })
    }

    /// Service the USB stack and copy any bytes the host sent into `buf`.
    ///
    /// Returns how many bytes were received.
    pub fn receive(&mut self, buf: &mut [u8]) -> usize {
        if !self.device.poll(&mut [&mut self.serial]) {
            return 0;
        }
        self.serial.read(buf).unwrap_or(0)
    }
}

impl Transport for UsbTransport<'_> {
    type Error = UsbError;

    fn is_open(&self) -> bool {
        self.device.state() == UsbDeviceState::Configured && self.serial.dtr()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        match self.serial.write(bytes) {
            Ok(n) => Ok(n),
            Err(UsbError::WouldBlock) => Ok(0),
            Err(e) => Err(e),
        }
    }
}
