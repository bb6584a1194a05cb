use core::sync::atomic::{AtomicI16, AtomicU16, AtomicU8, Ordering};

use bitflags::bitflags;
use log::warn;

use crate::entropy::Harvester;
use crate::scan::ScanHardware;

pub const LED_SAMPLES_PER_RAIL: u8 = 4;
pub const ADC_MAX: u16 = 4095;
pub const NOT_SAMPLED: u16 = u16::MAX;
pub const DEFAULT_LED_TIMEOUT_CYCLES: u16 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rail {
    /// Feedback of framebuffer rows 0-7.
    Low,
    /// Feedback of framebuffer rows 8-15.
    High,
}

impl Rail {
    fn index(self) -> usize {
        self as usize
    }

    pub fn mask(self) -> Rails {
        match self {
            Rail::Low => Rails::LOW,
            Rail::High => Rails::HIGH,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Rails: u8 {
        const LOW = 1 << 0;
        const HIGH = 1 << 1;
    }
}

impl Rails {
    pub fn lit_by(rows: u16) -> Self {
        let mut rails = Rails::empty();
        rails.set(Rails::LOW, rows & 0x00ff != 0);
        rails.set(Rails::HIGH, rows & 0xff00 != 0);
        rails
    }

    fn first(self) -> Option<Rail> {
        if self.contains(Rails::LOW) {
            Some(Rail::Low)
        } else if self.contains(Rails::HIGH) {
            Some(Rail::High)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LedState {
    Idle,
    Requested,
    InProgress,
    Ready,
}

impl LedState {
    fn from_u8(val: u8) -> Self {
        match val {
            1 => LedState::Requested,
            2 => LedState::InProgress,
            3 => LedState::Ready,
            _ => LedState::Idle,
        }
    }
}

/// Foreground-facing half of the LED feedback sampler.
///
/// Averages are written by the scan side strictly before the state becomes
/// `Ready`, and only read by `collect` after it observed `Ready`.
pub struct LedRequest {
    state: AtomicU8,
    requested: AtomicU8,
    generation: AtomicU8,
    sampled: AtomicU8,
    averages: [AtomicU16; 2],
    calibration: AtomicI16,
}

impl LedRequest {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(LedState::Idle as u8),
            requested: AtomicU8::new(0),
            generation: AtomicU8::new(0),
            sampled: AtomicU8::new(0),
            averages: [AtomicU16::new(0), AtomicU16::new(0)],
            calibration: AtomicI16::new(0),
        }
    }

    pub fn request(&self) {
        self.request_rails(Rails::all());
    }

    pub fn request_rails(&self, rails: Rails) {
        self.requested.store(rails.bits(), Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Relaxed);
        self.state.store(LedState::Requested as u8, Ordering::Release);
    }

    pub fn state(&self) -> LedState {
        LedState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LedState::Ready
    }

    pub fn set_calibration(&self, offset: i16) {
        self.calibration.store(offset, Ordering::Relaxed);
    }

    pub fn calibration(&self) -> i16 {
        self.calibration.load(Ordering::Relaxed)
    }

    /// Returns the calibrated averages of both rails and resets the request.
    ///
    /// A rail that was not sampled (not requested, never lit, timed out, or the
    /// request was not ready yet) reads as `NOT_SAMPLED`.
    pub fn collect(&self) -> (u16, u16) {
        let state = self.state.swap(LedState::Idle as u8, Ordering::AcqRel);

        if LedState::from_u8(state) != LedState::Ready {
            return (NOT_SAMPLED, NOT_SAMPLED);
        }

        let sampled = Rails::from_bits_truncate(self.sampled.load(Ordering::Relaxed));
        let calibration = self.calibration() as i32;

        let value = |rail: Rail| {
            if sampled.contains(rail.mask()) {
                let avg = self.averages[rail.index()].load(Ordering::Relaxed) as i32;
                (avg + calibration).clamp(0, ADC_MAX as i32) as u16
            } else {
                NOT_SAMPLED
            }
        };

        (value(Rail::Low), value(Rail::High))
    }

    fn requested(&self) -> Rails {
        Rails::from_bits_truncate(self.requested.load(Ordering::Relaxed))
    }

    fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    fn transition(&self, from: LedState, to: LedState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for LedRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Rails lit in the scan framebuffer, by any code and under the held plane mix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FrameRails {
    pub lit: Rails,
    pub held: Rails,
}

/// Scan-side half of the LED feedback sampler. Lives inside the scan engine.
pub struct LedSampler {
    timeout_cycles: u16,
    age: u16,
    generation: u8,
    remaining: Rails,
    done: Rails,
    current: Option<Rail>,
    settling: bool,
    count: u8,
    sums: [u32; 2],
    converting: Option<Rail>,
}

impl LedSampler {
    pub fn new(timeout_cycles: u16) -> Self {
        Self {
            timeout_cycles,
            age: 0,
            generation: 0,
            remaining: Rails::empty(),
            done: Rails::empty(),
            current: None,
            settling: false,
            count: 0,
            sums: [0; 2],
            converting: None,
        }
    }

    pub(crate) fn converting(&self) -> bool {
        self.converting.is_some()
    }

    /// Idle display window while the output holds `held`. May promote a
    /// pending request and start one conversion.
    ///
    /// `frame` reports the rails with any non-zero pixel in the frame and the
    /// rails lit under the held plane mix. Only the latter can be measured
    /// here; a request whose rails are lit by dim pixels alone is published
    /// at once with nothing sampled.
    pub(crate) fn on_hold(
        &mut self,
        req: &LedRequest,
        held: u16,
        frame: impl FnOnce() -> FrameRails,
        hw: &mut impl ScanHardware,
    ) {
        match req.state() {
            LedState::Requested => {
                let requested = req.requested();
                let frame = frame();
                let sampleable = frame.held & requested;

                if (frame.lit & requested).is_empty() {
                    return;
                }

                if sampleable.is_empty() {
                    self.restart(Rails::empty());
                    self.publish(req, LedState::Requested);
                    return;
                }

                if (Rails::lit_by(held) & sampleable).is_empty() {
                    return;
                }

                if !req.transition(LedState::Requested, LedState::InProgress) {
                    return;
                }

                self.restart(sampleable);
            }
            LedState::InProgress => {}
            LedState::Idle | LedState::Ready => {
                self.converting = None;
                return;
            }
        }

        if self.converting.is_some() {
            return;
        }

        let lit = Rails::lit_by(held) & self.remaining;

        let rail = match self.current {
            Some(rail) if lit.contains(rail.mask()) => rail,
            Some(_) => return,
            None => match lit.first() {
                Some(rail) => {
                    self.current = Some(rail);
                    self.settling = true;
                    rail
                }
                None => return,
            },
        };

        if hw.start_conversion(rail) {
            self.converting = Some(rail);
        }
    }

    pub(crate) fn harvest(
        &mut self,
        req: &LedRequest,
        entropy: &Harvester,
        hw: &mut impl ScanHardware,
    ) {
        let Some(rail) = self.converting.take() else {
            return;
        };

        // Still converting: drop it, the next hold window retries.
        let Some(raw) = hw.conversion() else {
            return;
        };

        entropy.mix(raw as u32);

        if req.state() != LedState::InProgress {
            return;
        }

        if self.settling {
            self.settling = false;
            return;
        }

        self.sums[rail.index()] += raw as u32;
        self.count += 1;

        if self.count == LED_SAMPLES_PER_RAIL {
            self.done |= rail.mask();
            self.remaining.remove(rail.mask());
            self.current = None;
            self.count = 0;
        }

        if self.remaining.is_empty() {
            self.publish(req, LedState::InProgress);
        }
    }

    pub(crate) fn end_cycle(&mut self, req: &LedRequest) {
        let generation = req.generation();
        if generation != self.generation {
            self.generation = generation;
            self.age = 0;
        }

        let state = req.state();

        if !matches!(state, LedState::Requested | LedState::InProgress) {
            self.age = 0;
            return;
        }

        self.age = self.age.saturating_add(1);

        if self.timeout_cycles != 0 && self.age >= self.timeout_cycles {
            warn!(
                "LED sample timed out after {} cycles, rails done: {:?}",
                self.age, self.done
            );

            if state == LedState::Requested {
                self.restart(Rails::empty());
            }

            self.publish(req, state);
        }
    }

    fn restart(&mut self, rails: Rails) {
        self.age = 0;
        self.remaining = rails;
        self.done = Rails::empty();
        self.current = None;
        self.settling = false;
        self.count = 0;
        self.sums = [0; 2];
        self.converting = None;
    }

    fn publish(&mut self, req: &LedRequest, from: LedState) {
        for rail in [Rail::Low, Rail::High] {
            let avg = self.sums[rail.index()] / LED_SAMPLES_PER_RAIL as u32;
            req.averages[rail.index()].store(avg as u16, Ordering::Relaxed);
        }
        req.sampled.store(self.done.bits(), Ordering::Relaxed);

        req.transition(from, LedState::Ready);

        self.remaining = Rails::empty();
        self.current = None;
        self.converting = None;
        self.age = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_without_ready_is_unsampled() {
        let req = LedRequest::new();
        req.request();

        assert_eq!(req.collect(), (NOT_SAMPLED, NOT_SAMPLED));
        assert_eq!(req.state(), LedState::Idle);
    }

    #[test]
    fn collect_applies_saturating_calibration() {
        let req = LedRequest::new();
        req.averages[0].store(4090, Ordering::Relaxed);
        req.averages[1].store(3, Ordering::Relaxed);
        req.sampled.store(Rails::all().bits(), Ordering::Relaxed);

        req.set_calibration(10);
        req.state.store(LedState::Ready as u8, Ordering::Relaxed);
        assert_eq!(req.collect(), (ADC_MAX, 13));

        req.set_calibration(-10);
        req.state.store(LedState::Ready as u8, Ordering::Relaxed);
        assert_eq!(req.collect(), (4080, 0));
    }

    #[test]
    fn rails_follow_row_word_halves() {
        assert_eq!(Rails::lit_by(0), Rails::empty());
        assert_eq!(Rails::lit_by(0x0001), Rails::LOW);
        assert_eq!(Rails::lit_by(0x8000), Rails::HIGH);
        assert_eq!(Rails::lit_by(0x0180), Rails::all());
    }

    #[test]
    fn stale_request_times_out_to_ready() {
        let req = LedRequest::new();
        let mut sampler = LedSampler::new(3);
        req.request();

        sampler.end_cycle(&req);
        sampler.end_cycle(&req);
        assert_eq!(req.state(), LedState::Requested);

        sampler.end_cycle(&req);
        assert!(req.is_ready());
        assert_eq!(req.collect(), (NOT_SAMPLED, NOT_SAMPLED));
    }

    #[test]
    fn new_request_restarts_the_timeout() {
        let req = LedRequest::new();
        let mut sampler = LedSampler::new(3);
        req.request();

        sampler.end_cycle(&req);
        sampler.end_cycle(&req);
        req.request_rails(Rails::HIGH);

        sampler.end_cycle(&req);
        sampler.end_cycle(&req);
        assert_eq!(req.state(), LedState::Requested);

        sampler.end_cycle(&req);
        assert!(req.is_ready());
    }

    #[test]
    fn zero_timeout_waits_forever() {
        let req = LedRequest::new();
        let mut sampler = LedSampler::new(0);
        req.request();

        for _ in 0..1000 {
            sampler.end_cycle(&req);
        }

        assert_eq!(req.state(), LedState::Requested);
    }
}
