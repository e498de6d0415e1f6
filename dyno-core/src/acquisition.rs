// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! The fixed-period acquisition loop.
//!
//! [`AcquisitionLoop`] owns every piece of the pipeline and is driven from the firmware's
//! foreground loop with the current millisecond tick:
//!
//! ```ignore
//! rig.start();
//!
//! loop {
//!     let n = rig.transport_mut().receive(&mut rx);
//!     for cmd in parser.commands(&rx[..n]) {
//!         rig.handle(cmd);
//!     }
//!     rig.poll(tick::now_ms());
//! }
//! ```
//!
//! Once per period, and only while the host has the port open, a poll:
//!
//! 1. drains the quadrature counter into `pulse_enc` and derives `pulse_enc_z`,
//! 2. drains the RPM accumulator into `pulse_rpm`,
//! 3. sends the frame,
//! 4. reads the thermocouple into `temperature` for the *next* frame.
//!
//! The probe is read after the frame goes out so its transfer timeout can never delay the pulse
//! snapshot. Each frame therefore carries the temperature read one period earlier.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::config::{ConfigError, DynoConfig};
use crate::hal::{CounterRegister, InterruptSource, Transport};
use crate::indicator::Indicator;
use crate::probe::Max6675;
use crate::protocol::Command;
use crate::pulse::{CaptureChannel, NoIndex};
use crate::quadrature::QuadratureCounter;
use crate::transmit::FrameTransmitter;
use crate::window::SampleWindow;

/// Operating state of the loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// Capture interrupts off, nothing sampled or sent.
    Idle,
    /// Capture interrupts on, sampling every period.
    Running,
}

pub struct AcquisitionLoop<'a, ENC, RPM, IDX, SPI, CS, TX, LED>
where
    LED: OutputPin,
{
    config: DynoConfig,
    state: RunState,
    window: SampleWindow,

    /// Tick of the last emitted window. `None` until the first poll of a session.
    last_emit_ms: Option<u32>,

    encoder: QuadratureCounter<ENC>,
    rpm: CaptureChannel<'a, RPM>,
    index: Option<CaptureChannel<'a, IDX>>,
    probe: Max6675<SPI, CS>,
    transmitter: FrameTransmitter<TX>,
    indicator: Indicator<LED>,
}

impl<'a, ENC, RPM, SPI, CS, TX, LED> AcquisitionLoop<'a, ENC, RPM, NoIndex, SPI, CS, TX, LED>
where
    ENC: CounterRegister,
    RPM: InterruptSource,
    SPI: SpiBus<u8>,
    CS: OutputPin,
    TX: Transport,
    LED: OutputPin,
{
    /// Assemble the pipeline. The loop starts out [`Idle`](RunState::Idle).
    ///
    /// Without an index channel, `pulse_enc_z` is derived as `pulse_enc / max_ppr`.
    pub fn new(
        config: DynoConfig,
        encoder: QuadratureCounter<ENC>,
        rpm: CaptureChannel<'a, RPM>,
        probe: Max6675<SPI, CS>,
        transmitter: FrameTransmitter<TX>,
        indicator: Indicator<LED>,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        Ok(Self {
            config,
            state: RunState::Idle,
            window: SampleWindow::new(config.max_ppr),
            last_emit_ms: None,
            encoder,
            rpm,
            index: None,
            probe,
            transmitter,
            indicator,
        })
    }

    /// Count `pulse_enc_z` from a dedicated index (Z) channel instead of deriving it.
    pub fn with_index_channel<IDX: InterruptSource>(
        self,
        index: CaptureChannel<'a, IDX>,
    ) -> AcquisitionLoop<'a, ENC, RPM, IDX, SPI, CS, TX, LED> {
        AcquisitionLoop {
            config: self.config,
            state: self.state,
            window: self.window,
            last_emit_ms: self.last_emit_ms,
            encoder: self.encoder,
            rpm: self.rpm,
            index: Some(index),
            probe: self.probe,
            transmitter: self.transmitter,
            indicator: self.indicator,
        }
    }
}

impl<'a, ENC, RPM, IDX, SPI, CS, TX, LED> AcquisitionLoop<'a, ENC, RPM, IDX, SPI, CS, TX, LED>
where
    ENC: CounterRegister,
    RPM: InterruptSource,
    IDX: InterruptSource,
    SPI: SpiBus<u8>,
    CS: OutputPin,
    TX: Transport,
    LED: OutputPin,
{
    /// Begin a session: clear all counts, enable capture interrupts, light the indicator.
    pub fn start(&mut self) {
        if self.state == RunState::Running {
            return;
        }

        self.clear();
        self.rpm.arm();
        if let Some(index) = self.index.as_mut() {
            index.arm();
        }
        self.indicator.on();
        self.state = RunState::Running;

        info!("acquisition started");
    }

    /// End the session: disable capture interrupts, clear all counts, dim the indicator.
    pub fn stop(&mut self) {
        self.rpm.disarm();
        if let Some(index) = self.index.as_mut() {
            index.disarm();
        }
        self.clear();
        self.indicator.off();
        self.state = RunState::Idle;

        info!("acquisition stopped");
    }

    /// Apply a host command.
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
        }
    }

    /// Run one iteration. `now_ms` is a free-running millisecond tick.
    ///
    /// Returns the window that went out on the wire, if one did.
    pub fn poll(&mut self, now_ms: u32) -> Option<SampleWindow> {
        if let Err(e) = self.transmitter.service() {
            debug!("frame tail: {=str}", e.describe());
        }

        if self.state != RunState::Running {
            return None;
        }

        let Some(last_emit_ms) = self.last_emit_ms else {
            self.last_emit_ms = Some(now_ms);
            return None;
        };

        let elapsed = now_ms.wrapping_sub(last_emit_ms);
        if elapsed < self.config.period_ms || !self.transmitter.is_ready() {
            return None;
        }
        self.last_emit_ms = Some(now_ms);

        let window = &mut self.window;
        window.pulse_enc = self.encoder.drain();
        window.pulse_enc_z = match self.index.as_ref() {
            Some(index) => index.drain(),
            None => window.pulse_enc / window.pulse_enc_max,
        };
        window.pulse_rpm = self.rpm.drain();
        window.period = elapsed;

        let frame = *window;
        let sent = match self.transmitter.send(&frame) {
            Ok(()) => Some(frame),
            Err(e) => {
                warn!("frame dropped: {=str}", e.describe());
                None
            }
        };

        match self.probe.read() {
            Ok(temperature) => self.window.temperature = temperature.value(),
            Err(e) => debug!("temperature kept: {=str}", e.describe()),
        }

        sent
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &DynoConfig {
        &self.config
    }

    /// The window being built. Its temperature is what the next frame will carry.
    #[inline]
    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    #[inline]
    pub fn transport(&self) -> &TX {
        self.transmitter.transport()
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut TX {
        self.transmitter.transport_mut()
    }

    fn clear(&mut self) {
        self.encoder.reset();
        self.rpm.drain();
        if let Some(index) = self.index.as_ref() {
            index.drain();
        }
        self.window = SampleWindow::new(self.config.max_ppr);
        self.last_emit_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Parser;
    use crate::pulse::PulseAccumulator;
    use crate::testing::{FakeCounter, FakeIrq, FakePin, FakeSpi, FakeTransport};
    use crate::window::FRAME_LEN;
    use embedded_hal::spi::ErrorKind;

    type Rig<'a> =
        AcquisitionLoop<'a, FakeCounter, FakeIrq, NoIndex, FakeSpi, FakePin, FakeTransport, FakePin>;

    struct Bench {
        counter: FakeCounter,
        irq: FakeIrq,
        spi: FakeSpi,
        link: FakeTransport,
        led: FakePin,
    }

    impl Bench {
        fn new() -> Self {
            Self {
                counter: FakeCounter::default(),
                irq: FakeIrq::default(),
                spi: FakeSpi::default(),
                link: FakeTransport::open(),
                led: FakePin::default(),
            }
        }

        fn rig<'a>(&self, rpm: &'a PulseAccumulator) -> Rig<'a> {
            self.rig_with(rpm, DynoConfig::DEFAULT)
        }

        fn rig_with<'a>(&self, rpm: &'a PulseAccumulator, config: DynoConfig) -> Rig<'a> {
            AcquisitionLoop::new(
                config,
                QuadratureCounter::new(self.counter.clone()),
                CaptureChannel::new(rpm, self.irq.clone()),
                Max6675::new(self.spi.clone(), FakePin::default()),
                FrameTransmitter::new(self.link.clone()),
                Indicator::active_high(self.led.clone()),
            )
            .expect("default config is valid")
        }

        fn decoded_frames(&self) -> Vec<SampleWindow> {
            self.link
                .frames()
                .iter()
                .map(|f| SampleWindow::decode(f).expect("well-formed frame"))
                .collect()
        }
    }

    fn edges(acc: &PulseAccumulator, n: u32) {
        for _ in 0..n {
            acc.record_edge();
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let result = AcquisitionLoop::new(
            DynoConfig::new().with_max_ppr(0),
            QuadratureCounter::new(bench.counter.clone()),
            CaptureChannel::new(&rpm, bench.irq.clone()),
            Max6675::new(bench.spi.clone(), FakePin::default()),
            FrameTransmitter::new(bench.link.clone()),
            Indicator::active_high(bench.led.clone()),
        );
        assert!(matches!(result, Err(ConfigError::ZeroPulsesPerRev)));
    }

    #[test]
    fn idle_loop_does_nothing() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        assert_eq!(rig.state(), RunState::Idle);
        assert!(!bench.irq.is_enabled());
        assert!(!bench.led.is_high());

        for now in (0..2000).step_by(100) {
            assert_eq!(rig.poll(now), None);
        }
        assert!(bench.link.frames().is_empty());
        assert_eq!(bench.spi.reads(), 0);
    }

    #[test]
    fn start_enables_capture_and_indicator() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        rig.start();
        assert_eq!(rig.state(), RunState::Running);
        assert!(bench.irq.is_enabled());
        assert!(bench.led.is_high());
    }

    #[test]
    fn end_to_end_window_with_lagged_temperature() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        bench.spi.respond(0x0208); // 16.25 °C
        rig.start();
        assert_eq!(rig.poll(1_000), None);

        bench.counter.forward(360);
        edges(&rpm, 100);
        assert_eq!(rig.poll(1_100), None);

        let first = rig.poll(1_200).expect("window is due");
        assert_eq!(first.period, 200);
        assert_eq!(first.pulse_enc_max, 360);
        assert_eq!(first.pulse_enc, 360);
        assert_eq!(first.pulse_enc_z, 1);
        assert_eq!(first.pulse_rpm, 100);
        // The probe is read after sending, so the first frame has no reading yet.
        assert_eq!(first.temperature, 0.0);
        assert_eq!(rig.window().temperature, 16.25);

        bench.spi.respond(0x0190); // 12.5 °C
        let second = rig.poll(1_400).expect("window is due");
        assert_eq!(second.temperature, 16.25);
        assert_eq!(second.pulse_enc, 0);
        assert_eq!(second.pulse_rpm, 0);

        assert_eq!(bench.decoded_frames(), vec![first, second]);
    }

    #[test]
    fn frame_goes_out_only_after_a_full_period() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        rig.start();
        rig.poll(0);
        assert_eq!(rig.poll(199), None);
        let w = rig.poll(250).expect("window is due");
        assert_eq!(w.period, 250);

        // The next period is measured from the last emission, not from the schedule.
        assert_eq!(rig.poll(449), None);
        assert_eq!(rig.poll(450).map(|w| w.period), Some(200));
    }

    #[test]
    fn closed_transport_skips_sampling_entirely() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        bench.link.set_open(false);
        rig.start();
        rig.poll(0);

        bench.counter.forward(50);
        edges(&rpm, 7);
        assert_eq!(rig.poll(200), None);
        assert_eq!(rig.poll(400), None);

        assert!(bench.link.frames().is_empty());
        assert_eq!(bench.spi.reads(), 0);
        // Counts keep accumulating for the window that does go out.
        assert_eq!(rpm.peek(), 7);
        assert_eq!(bench.counter.raw(), 50);

        bench.link.set_open(true);
        let w = rig.poll(500).expect("window is due");
        assert_eq!(w.period, 500);
        assert_eq!(w.pulse_enc, 50);
        assert_eq!(w.pulse_rpm, 7);
    }

    #[test]
    fn reverse_rotation_reports_zero() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        rig.start();
        rig.poll(0);
        bench.counter.forward(400);
        rig.poll(200);

        bench.counter.reverse(90);
        let w = rig.poll(400).expect("window is due");
        assert_eq!(w.pulse_enc, 0);
        assert_eq!(w.pulse_enc_z, 0);
        assert_eq!(bench.counter.raw(), 0);
    }

    #[test]
    fn revolutions_are_derived_from_ppr() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig_with(&rpm, DynoConfig::new().with_max_ppr(100));

        rig.start();
        rig.poll(0);
        bench.counter.forward(299);
        let w = rig.poll(200).expect("window is due");
        assert_eq!(w.pulse_enc_max, 100);
        assert_eq!(w.pulse_enc_z, 2);
    }

    #[test]
    fn index_channel_replaces_derived_revolutions() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let z = PulseAccumulator::new();
        let z_irq = FakeIrq::default();
        let mut rig = bench
            .rig(&rpm)
            .with_index_channel(CaptureChannel::new(&z, z_irq.clone()));

        rig.start();
        assert!(z_irq.is_enabled());
        rig.poll(0);

        bench.counter.forward(720);
        edges(&z, 3);
        let w = rig.poll(200).expect("window is due");
        assert_eq!(w.pulse_enc, 720);
        assert_eq!(w.pulse_enc_z, 3);

        rig.stop();
        assert!(!z_irq.is_enabled());
    }

    #[test]
    fn probe_failures_keep_previous_temperature() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        bench.spi.respond(0x0320); // 25.0 °C
        rig.start();
        rig.poll(0);
        rig.poll(200);
        assert_eq!(rig.window().temperature, 25.0);

        bench.spi.respond(0x0204); // open thermocouple
        let w = rig.poll(400).expect("window is due");
        assert_eq!(w.temperature, 25.0);
        assert_eq!(rig.window().temperature, 25.0);

        bench.spi.fail(ErrorKind::Overrun);
        let w = rig.poll(600).expect("window is due");
        assert_eq!(w.temperature, 25.0);
        assert_eq!(rig.window().temperature, 25.0);

        assert_eq!(bench.link.frames().len(), 3);
    }

    #[test]
    fn failed_write_still_consumes_the_window() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        rig.start();
        rig.poll(0);
        edges(&rpm, 12);
        bench.link.fail_writes(true);
        assert_eq!(rig.poll(200), None);

        bench.link.fail_writes(false);
        let w = rig.poll(400).expect("window is due");
        assert_eq!(w.pulse_rpm, 0);
        assert_eq!(w.period, 200);
    }

    #[test]
    fn stop_then_start_yields_a_clean_window() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig_with(&rpm, DynoConfig::new().with_max_ppr(500));

        bench.spi.respond(0x0320);
        rig.start();
        rig.poll(0);
        bench.counter.forward(1234);
        edges(&rpm, 55);
        rig.poll(200);
        bench.counter.forward(10);
        edges(&rpm, 5);

        rig.stop();
        assert_eq!(rig.state(), RunState::Idle);
        assert!(!bench.irq.is_enabled());
        assert!(!bench.led.is_high());
        assert_eq!(*rig.window(), SampleWindow::new(500));

        rig.start();
        assert_eq!(*rig.window(), SampleWindow::new(500));
        assert_eq!(rpm.peek(), 0);
        assert_eq!(bench.counter.raw(), 0);

        rig.poll(5_000);
        let w = rig.poll(5_200).expect("window is due");
        assert_eq!(w.pulse_enc, 0);
        assert_eq!(w.pulse_rpm, 0);
        assert_eq!(w.temperature, 0.0);
    }

    #[test]
    fn edges_while_idle_do_not_leak_into_the_session() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        bench.counter.forward(80);
        edges(&rpm, 9);
        rig.start();
        rig.poll(0);
        let w = rig.poll(200).expect("window is due");
        assert_eq!(w.pulse_enc, 0);
        assert_eq!(w.pulse_rpm, 0);
    }

    #[test]
    fn tick_wraparound_does_not_stall() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        rig.start();
        rig.poll(u32::MAX - 99);
        assert_eq!(rig.poll(50), None);
        assert_eq!(rig.poll(100).map(|w| w.period), Some(200));
    }

    #[test]
    fn host_commands_drive_the_state_machine() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        rig.handle(Command::Start);
        assert_eq!(rig.state(), RunState::Running);
        rig.handle(Command::Start);
        assert_eq!(rig.state(), RunState::Running);
        rig.handle(Command::Stop);
        assert_eq!(rig.state(), RunState::Idle);
    }

    #[test]
    fn stop_and_start_in_one_burst_resets_the_session() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        bench.spi.respond(0x0320); // 25.0 °C
        rig.start();
        rig.poll(0);
        rig.poll(200);
        bench.counter.forward(50);
        edges(&rpm, 9);
        assert_eq!(rig.window().temperature, 25.0);

        let mut burst = Command::Stop.encode().to_vec();
        burst.extend_from_slice(&Command::Start.encode());
        let mut parser = Parser::new();
        for command in parser.commands(&burst) {
            rig.handle(command);
        }

        assert_eq!(rig.state(), RunState::Running);
        assert_eq!(*rig.window(), SampleWindow::new(360));
        assert_eq!(rpm.peek(), 0);
        assert_eq!(bench.counter.raw(), 0);
    }

    #[test]
    fn split_frames_reach_the_host_whole() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        rig.start();
        rig.poll(0);
        edges(&rpm, 4);
        bench.link.set_room(10);
        assert!(rig.poll(200).is_some());
        assert_eq!(bench.link.bytes().len(), 10);

        // The tail goes out on a later iteration, before the next window is due.
        bench.link.unlimited_room();
        assert_eq!(rig.poll(250), None);
        assert_eq!(bench.link.bytes().len(), FRAME_LEN);

        edges(&rpm, 6);
        rig.poll(400);
        let frames = bench.decoded_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].pulse_rpm, 4);
        assert_eq!(frames[1].pulse_rpm, 6);
    }

    #[test]
    fn window_due_while_link_is_stalled_is_dropped_whole() {
        let bench = Bench::new();
        let rpm = PulseAccumulator::new();
        let mut rig = bench.rig(&rpm);

        rig.start();
        rig.poll(0);
        bench.link.set_room(10);
        rig.poll(200);
        assert_eq!(rig.poll(400), None);

        bench.link.unlimited_room();
        rig.poll(600);
        let frames = bench.decoded_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].period, 200);
        assert_eq!(frames[1].period, 200);
    }
}
