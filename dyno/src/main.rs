// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![no_main]
#![no_std]

use cortex_m_rt::{entry, exception, ExceptionFrame};
use panic_halt as _;

#[cfg(feature = "defmt")]
use defmt_rtt as _;

use hal::{
    otg_fs::{UsbBus, UsbBusType, USB},
    pac::{self, interrupt},
    prelude::*,
    rcc::{HSEClock, HSEClockMode, PLL48CLK},
    spi::{Mode, Phase, Polarity, Spi},
};
use stm32f7xx_hal as hal;
use usb_device::bus::UsbBusAllocator;

use dyno::{
    fault,
    hw::{self, tick, BoardPins, Encoder, Output, ProbeSpi, RpmCapture, UsbTransport},
};
use dyno_core::{
    AcquisitionLoop, CaptureChannel, DynoConfig, FrameTransmitter, Indicator, Max6675,
    Parser, PulseAccumulator, QuadratureCounter,
};

#[macro_use]
mod fmt;

/// Start acquiring at power-up instead of waiting for a host start command.
const AUTO_START: bool = true;

/// Startup blinks on both LEDs.
const STARTUP_BLINKS: u32 = 3;
const STARTUP_BLINK_MS: u32 = 100;

/// MAX6675 maximum SCK is 4.3 MHz.
const PROBE_SCK_HZ: u32 = 1_000_000;

static RPM_PULSES: PulseAccumulator = PulseAccumulator::new();
#[cfg(feature = "phase-z")]
static INDEX_PULSES: PulseAccumulator = PulseAccumulator::new();

#[cfg(feature = "defmt")]
defmt::timestamp!("{=u32:ms}", tick::now_ms());

#[entry]
fn main() -> ! {
    // Peripherals
    let (Some(dp), Some(cp)) = (pac::Peripherals::take(), cortex_m::Peripherals::take()) else {
        fault::halt_unowned();
    };

    // Clocks: 8 MHz ST-LINK MCO, 216 MHz core, 48 MHz for USB
    let rcc = dp.RCC.constrain();
    let clocks = rcc
        .cfgr
        .hse(HSEClock::new(8.MHz(), HSEClockMode::Bypass))
        .use_pll()
        .use_pll48clk(PLL48CLK::Pllq)
        .sysclk(216.MHz())
        .freeze();
    let mut apb2 = rcc.apb2;

    tick::start(cp.SYST, &clocks);

    let pins = BoardPins::new(dp.GPIOA, dp.GPIOB);

    // LEDs
    let mut running_led = Indicator::active_high(Output::push_pull(pins.leds.running));
    let mut fault_led = Indicator::active_high(Output::push_pull(pins.leds.fault));

    for _ in 0..STARTUP_BLINKS * 2 {
        running_led.toggle();
        fault_led.toggle();
        tick::busy_wait_ms(STARTUP_BLINK_MS);
    }

    // TIM2 quadrature encoder, TIM4 RPM capture
    // Pins only need their alternate function set.
    let _encoder_pins = pins.encoder;
    let _rpm_pin = pins.rpm;
    let encoder = Encoder::tim2(dp.TIM2);
    let rpm = RpmCapture::tim4(dp.TIM4);

    // SPI1 + MAX6675
    let spi_mode = Mode {
        polarity: Polarity::IdleLow,
        phase: Phase::CaptureOnFirstTransition,
    };
    let spi1 = Spi::new(dp.SPI1, (pins.spi1.sck, pins.spi1.miso, pins.spi1.mosi)).enable::<u8>(
        spi_mode,
        PROBE_SCK_HZ.Hz(),
        &clocks,
        &mut apb2,
    );
    let probe = Max6675::new(ProbeSpi::new(spi1), Output::push_pull(pins.spi1.cs));

    // USB CDC
    let usb = USB::new(
        dp.OTG_FS_GLOBAL,
        dp.OTG_FS_DEVICE,
        dp.OTG_FS_PWRCLK,
        (pins.usb.dm, pins.usb.dp),
        &clocks,
    );
    let Some(ep_memory) = cortex_m::singleton!(: [u32; 1024] = [0; 1024]) else {
        fault::halt(&mut fault_led);
    };
    let Some(usb_bus) =
        cortex_m::singleton!(: UsbBusAllocator<UsbBusType> = UsbBus::new(usb, ep_memory))
    else {
        fault::halt(&mut fault_led);
    };
    let link = match UsbTransport::new(usb_bus) {
        Ok(link) => link,
        Err(_) => {
            error!("USB device setup failed");
            fault::halt(&mut fault_led);
        }
    };

    let rig = AcquisitionLoop::new(
        DynoConfig::DEFAULT,
        QuadratureCounter::new(encoder),
        CaptureChannel::new(&RPM_PULSES, rpm),
        probe,
        FrameTransmitter::new(link),
        running_led,
    );
    let rig = match rig {
        Ok(rig) => rig,
        Err(e) => {
            error!("invalid configuration: {}", e);
            fault::halt(&mut fault_led);
        }
    };

    #[cfg(feature = "phase-z")]
    let rig = {
        let _index_pin = pins.index;
        rig.with_index_channel(CaptureChannel::new(
            &INDEX_PULSES,
            hw::IndexCapture::tim5(dp.TIM5),
        ))
    };
    let mut rig = rig;

    info!(
        "dyno ready: {=u32} ppr, {=u32} ms period",
        rig.config().max_ppr,
        rig.config().period_ms
    );

    if AUTO_START {
        rig.start();
    }

    let mut parser = Parser::new();
    let mut rx = [0u8; 64];
    loop {
        let n = rig.transport_mut().receive(&mut rx);
        for command in parser.commands(&rx[..n]) {
            info!("host command: {}", command);
            rig.handle(command);
        }
        rig.poll(tick::now_ms());
    }
}

#[interrupt]
fn TIM4() {
    hw::capture::acknowledge_rpm_edge();
    RPM_PULSES.record_edge();
}

#[cfg(feature = "phase-z")]
#[interrupt]
fn TIM5() {
    hw::capture::acknowledge_index_edge();
    INDEX_PULSES.record_edge();
}

#[exception]
fn SysTick() {
    tick::on_tick();
}

#[exception]
unsafe fn HardFault(_frame: &ExceptionFrame) -> ! {
    fault::halt_unowned()
}
