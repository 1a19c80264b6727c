//! IR transmitter: frame → pulse train → RMT.
//!
//! Pulse trains are built by pure functions so the timing tables are tested
//! on the host.  Marks are carrier bursts (38 kHz), spaces are silence.
//!
//! ```text
//!  NEC       9000 mark, 4500 space, 32 × (560 mark + 560/1690 space), 560 mark
//!  stateful  3400 mark, 1750 space, 48 × (450 mark + 420/1300 space), 450 mark
//! ```
//!
//! NEC codes go out MSB first; stateful frames byte by byte, LSB first.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `TxRmtDriver` on RMT channel 0, 1 µs ticks, carrier enabled.
//! The receiver is suspended for the duration so the unit does not decode
//! its own transmission.
//! On host/test: counts frames; a static flag injects peripheral faults.

use heapless::Vec;

use crate::dispatch::IrFrame;
use crate::error::TransmitError;

/// One level held for `duration_us`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    /// Carrier on.
    pub mark: bool,
    pub duration_us: u16,
}

impl Pulse {
    const fn mark(duration_us: u16) -> Self {
        Self {
            mark: true,
            duration_us,
        }
    }

    const fn space(duration_us: u16) -> Self {
        Self {
            mark: false,
            duration_us,
        }
    }
}

pub const MAX_PULSES: usize = 128;
pub type PulseTrain = Vec<Pulse, MAX_PULSES>;

/// Timing table for a pulse-distance protocol.
struct Timing {
    leader_mark: u16,
    leader_space: u16,
    bit_mark: u16,
    zero_space: u16,
    one_space: u16,
}

pub(crate) const NEC_LEADER_MARK_US: u16 = 9000;
pub(crate) const NEC_LEADER_SPACE_US: u16 = 4500;
pub(crate) const NEC_REPEAT_SPACE_US: u16 = 2250;
pub(crate) const NEC_BIT_MARK_US: u16 = 560;
pub(crate) const NEC_ZERO_SPACE_US: u16 = 560;
pub(crate) const NEC_ONE_SPACE_US: u16 = 1690;

const NEC: Timing = Timing {
    leader_mark: NEC_LEADER_MARK_US,
    leader_space: NEC_LEADER_SPACE_US,
    bit_mark: NEC_BIT_MARK_US,
    zero_space: NEC_ZERO_SPACE_US,
    one_space: NEC_ONE_SPACE_US,
};

const STATEFUL: Timing = Timing {
    leader_mark: 3400,
    leader_space: 1750,
    bit_mark: 450,
    zero_space: 420,
    one_space: 1300,
};

fn encode_bits(
    timing: &Timing,
    bits: impl Iterator<Item = bool>,
) -> Result<PulseTrain, TransmitError> {
    let mut train = PulseTrain::new();
    let mut push = |p: Pulse| train.push(p).map_err(|_| TransmitError::FrameTooLong);

    push(Pulse::mark(timing.leader_mark))?;
    push(Pulse::space(timing.leader_space))?;
    for bit in bits {
        push(Pulse::mark(timing.bit_mark))?;
        push(Pulse::space(if bit { timing.one_space } else { timing.zero_space }))?;
    }
    push(Pulse::mark(timing.bit_mark))?;
    Ok(train)
}

pub fn nec_pulses(code: u32) -> Result<PulseTrain, TransmitError> {
    encode_bits(&NEC, (0..32).rev().map(|i| (code >> i) & 1 == 1))
}

pub fn stateful_pulses(frame: &[u8]) -> Result<PulseTrain, TransmitError> {
    encode_bits(
        &STATEFUL,
        frame.iter().flat_map(|&b| (0..8).map(move |i| (b >> i) & 1 == 1)),
    )
}

pub fn pulses_for(frame: &IrFrame) -> Result<PulseTrain, TransmitError> {
    match frame {
        IrFrame::Nec(code) => nec_pulses(*code),
        IrFrame::Stateful(bytes) => stateful_pulses(bytes),
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_TX_FAULT: core::sync::atomic::AtomicBool = core::sync::atomic::AtomicBool::new(false);

/// Make every following transmit fail with a peripheral error.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_tx_fault(fault: bool) {
    SIM_TX_FAULT.store(fault, core::sync::atomic::Ordering::Relaxed);
}

// ── Driver ────────────────────────────────────────────────────

pub struct IrTransmitter {
    #[cfg(target_os = "espidf")]
    driver: esp_idf_hal::rmt::TxRmtDriver<'static>,
    frames_sent: u32,
}

impl IrTransmitter {
    #[cfg(target_os = "espidf")]
    pub fn new<C: esp_idf_hal::rmt::RmtChannel>(
        channel: impl esp_idf_hal::peripheral::Peripheral<P = C> + 'static,
        pin: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::gpio::OutputPin> + 'static,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        use esp_idf_hal::rmt::config::{CarrierConfig, DutyPercent, TransmitConfig};
        use esp_idf_hal::units::Hertz;

        let carrier = CarrierConfig::new()
            .frequency(Hertz(crate::pins::IR_CARRIER_HZ))
            .duty_percent(DutyPercent::new(33)?);
        // 80 MHz APB / 80 = 1 µs per tick.
        let config = TransmitConfig::new().clock_divider(80).carrier(Some(carrier));
        let driver = esp_idf_hal::rmt::TxRmtDriver::new(channel, pin, &config)?;
        log::info!("ir_tx: RMT ready, carrier {} Hz", crate::pins::IR_CARRIER_HZ);
        Ok(Self {
            driver,
            frames_sent: 0,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self { frames_sent: 0 }
    }

    pub fn transmit(&mut self, frame: &IrFrame) -> Result<(), TransmitError> {
        let train = pulses_for(frame)?;
        self.send_train(&train)?;
        self.frames_sent = self.frames_sent.wrapping_add(1);
        log::debug!("ir_tx: {:?} sent ({} pulses)", frame, train.len());
        Ok(())
    }

    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    #[cfg(target_os = "espidf")]
    fn send_train(&mut self, train: &PulseTrain) -> Result<(), TransmitError> {
        use esp_idf_hal::rmt::{PinState, Pulse as RmtPulse, PulseTicks, VariableLengthSignal};

        let rmt_err = |e: esp_idf_hal::sys::EspError| TransmitError::Peripheral(e.code());

        let mut signal = VariableLengthSignal::new();
        for p in train {
            let level = if p.mark { PinState::High } else { PinState::Low };
            let ticks = PulseTicks::new(p.duration_us).map_err(rmt_err)?;
            signal.push(&[RmtPulse::new(level, ticks)]).map_err(rmt_err)?;
        }

        super::ir_rx::suspend(true);
        let sent = self.driver.start_blocking(&signal);
        super::ir_rx::suspend(false);
        sent.map_err(rmt_err)
    }

    #[cfg(not(target_os = "espidf"))]
    fn send_train(&mut self, _train: &PulseTrain) -> Result<(), TransmitError> {
        if SIM_TX_FAULT.load(core::sync::atomic::Ordering::Relaxed) {
            return Err(TransmitError::Peripheral(-1));
        }
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for IrTransmitter {
    fn default() -> Self {
        Self::new()
    }
}
