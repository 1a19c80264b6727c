//! IR receiver: edge timing capture and NEC decoding.
//!
//! The demodulator output toggles on every mark/space boundary.  The GPIO
//! ISR records the time between edges into a lock-free buffer; the main
//! loop picks up a frame once the line has been quiet for
//! [`FRAME_GAP_US`] and decodes it.
//!
//! ```text
//!   ISR:  edge ─▶ Δt since last edge ─▶ EDGE_DURATIONS[n++]
//!         Δt > FRAME_GAP_US          ─▶ new frame (or close the current one)
//!   loop: quiet ≥ FRAME_GAP_US       ─▶ copy, reset, decode_nec()
//! ```
//!
//! Capture is suspended while the unit transmits so it never decodes its
//! own frames.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: the edge ISR is registered by `hw_init::init_isr_service`.
//! On host/test: codes are injected with [`sim_inject_code`].

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicUsize, Ordering};

use heapless::Vec;

use super::ir_tx::{
    NEC_BIT_MARK_US, NEC_LEADER_MARK_US, NEC_LEADER_SPACE_US, NEC_ONE_SPACE_US,
    NEC_REPEAT_SPACE_US, NEC_ZERO_SPACE_US,
};
use crate::inbound::NEC_REPEAT;

pub const MAX_EDGES: usize = 72;
/// Silence longer than any mark or space: frame boundary.
pub const FRAME_GAP_US: u32 = 15_000;

pub type EdgeDurations = Vec<u16, MAX_EDGES>;

static EDGE_DURATIONS: [AtomicU16; MAX_EDGES] = [const { AtomicU16::new(0) }; MAX_EDGES];
static EDGE_COUNT: AtomicUsize = AtomicUsize::new(0);
/// Set when a frame was closed by a gap but not yet collected.
static FRAME_READY: AtomicBool = AtomicBool::new(false);
/// Truncated microsecond timestamp of the last edge.
static LAST_EDGE_US: AtomicU32 = AtomicU32::new(0);
static RX_SUSPENDED: AtomicBool = AtomicBool::new(false);

/// Ignore edges while the transmitter is active.
pub fn suspend(suspended: bool) {
    RX_SUSPENDED.store(suspended, Ordering::Release);
    if !suspended {
        EDGE_COUNT.store(0, Ordering::Release);
        FRAME_READY.store(false, Ordering::Release);
    }
}

/// ISR handler for any edge on the receiver pin.  Lock-free.
#[allow(unused)]
pub fn edge_isr_handler(now_us: i64) {
    let now = now_us as u32;
    let gap = now.wrapping_sub(LAST_EDGE_US.swap(now, Ordering::AcqRel));
    if RX_SUSPENDED.load(Ordering::Acquire) || FRAME_READY.load(Ordering::Acquire) {
        return;
    }

    let n = EDGE_COUNT.load(Ordering::Acquire);
    if gap > FRAME_GAP_US {
        // Leading edge of a frame.  A previous, uncollected frame is closed
        // rather than overwritten.
        if n > 0 {
            FRAME_READY.store(true, Ordering::Release);
        }
        return;
    }
    if n < MAX_EDGES {
        EDGE_DURATIONS[n].store(gap.min(u32::from(u16::MAX)) as u16, Ordering::Relaxed);
        EDGE_COUNT.store(n + 1, Ordering::Release);
    }
}

/// Collect a completed frame, if any.
pub fn take_frame(now_us: i64) -> Option<EdgeDurations> {
    let n = EDGE_COUNT.load(Ordering::Acquire);
    if n == 0 {
        return None;
    }
    let quiet = (now_us as u32).wrapping_sub(LAST_EDGE_US.load(Ordering::Acquire)) > FRAME_GAP_US;
    if !quiet && !FRAME_READY.load(Ordering::Acquire) {
        return None;
    }

    let frame = EDGE_DURATIONS[..n]
        .iter()
        .map(|d| d.load(Ordering::Relaxed))
        .collect();
    EDGE_COUNT.store(0, Ordering::Release);
    FRAME_READY.store(false, Ordering::Release);
    Some(frame)
}

/// Within ±25 % of the nominal duration.
fn near(actual: u16, nominal: u16) -> bool {
    let (a, n) = (u32::from(actual) * 4, u32::from(nominal));
    a >= n * 3 && a <= n * 5
}

/// Decode mark/space durations (µs, starting with the leader mark) into a
/// 32-bit NEC code, MSB first.  Repeat frames decode to [`NEC_REPEAT`].
pub fn decode_nec(durations: &[u16]) -> Option<u32> {
    if durations.len() < 3 || !near(durations[0], NEC_LEADER_MARK_US) {
        return None;
    }
    if near(durations[1], NEC_REPEAT_SPACE_US) {
        return Some(NEC_REPEAT);
    }
    if !near(durations[1], NEC_LEADER_SPACE_US) || durations.len() < 2 + 64 {
        return None;
    }

    let mut code = 0u32;
    for pair in durations[2..66].chunks_exact(2) {
        if !near(pair[0], NEC_BIT_MARK_US) {
            return None;
        }
        let bit = if near(pair[1], NEC_ONE_SPACE_US) {
            1
        } else if near(pair[1], NEC_ZERO_SPACE_US) {
            0
        } else {
            return None;
        };
        code = (code << 1) | bit;
    }
    Some(code)
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_CODE: AtomicU32 = AtomicU32::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_PENDING: AtomicBool = AtomicBool::new(false);

/// Pretend the receiver captured `code`.
#[cfg(not(target_os = "espidf"))]
pub fn sim_inject_code(code: u32) {
    SIM_CODE.store(code, Ordering::Relaxed);
    SIM_PENDING.store(true, Ordering::Release);
}

// ── Driver ────────────────────────────────────────────────────

pub struct IrReceiver;

impl IrReceiver {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "espidf")]
    pub fn take_code(&mut self) -> Option<u32> {
        // SAFETY: monotonic timer read.
        let now_us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        let frame = take_frame(now_us)?;
        let code = decode_nec(&frame);
        if code.is_none() {
            log::debug!("ir_rx: undecodable frame ({} edges)", frame.len());
        }
        code
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn take_code(&mut self) -> Option<u32> {
        if RX_SUSPENDED.load(Ordering::Acquire) {
            return None;
        }
        SIM_PENDING
            .swap(false, Ordering::AcqRel)
            .then(|| SIM_CODE.load(Ordering::Relaxed))
    }
}

impl Default for IrReceiver {
    fn default() -> Self {
        Self::new()
    }
}
