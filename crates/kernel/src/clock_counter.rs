//! Wraparound tolerant elapsed time on top of a free running hardware counter.
//!
//! All deadline computations go through [`elapsed_between`]: the difference is taken with
//! unsigned wrapping subtraction and masked to the counter width, so one wrap of the counter
//! between two reads still yields the right interval.

use crate::Hertz;
use core::sync::atomic::{AtomicU32, Ordering};
use hal_interface::TickSource;

/// One unit of the free running hardware counter.
pub type ClockTick = u32;

/// Core clock frequency resolved by the boot sequence, in Hz. Zero until published.
static G_SYSTEM_CORE_CLOCK: AtomicU32 = AtomicU32::new(0);

/// Publishes the resolved core clock for every downstream timing computation.
pub fn publish_core_clock(p_clock: Hertz) {
    G_SYSTEM_CORE_CLOCK.store(p_clock.to_u32(), Ordering::Relaxed);
}

/// Returns the core clock published at boot.
pub fn system_core_clock() -> Hertz {
    Hertz(G_SYSTEM_CORE_CLOCK.load(Ordering::Relaxed))
}

/// Ticks elapsed from `p_baseline` to `p_current` on a counter of `p_mask` width.
///
/// Valid as long as the counter wrapped at most once between both samples.
#[inline]
pub fn elapsed_between(p_baseline: ClockTick, p_current: ClockTick, p_mask: u32) -> u32 {
    p_current.wrapping_sub(p_baseline) & p_mask
}

/// Monotonic time base over a [`TickSource`].
///
/// Reading has no side effect and is a single register load, so the same counter can be used
/// from the main loop and from interrupt handlers.
pub struct ClockCounter<T: TickSource> {
    source: T,
}

impl<T: TickSource> ClockCounter<T> {
    pub const fn new(p_source: T) -> ClockCounter<T> {
        ClockCounter { source: p_source }
    }

    /// Current tick value.
    #[inline]
    pub fn now(&self) -> ClockTick {
        self.source.ticks() & T::MASK
    }

    /// Ticks elapsed since `p_baseline`.
    #[inline]
    pub fn elapsed(&self, p_baseline: ClockTick) -> u32 {
        elapsed_between(p_baseline, self.now(), T::MASK)
    }

    /// Ticks elapsed between `p_baseline` and an already sampled `p_current`.
    #[inline]
    pub fn elapsed_at(&self, p_baseline: ClockTick, p_current: ClockTick) -> u32 {
        elapsed_between(p_baseline, p_current, T::MASK)
    }

    /// `true` once strictly more than `p_period` ticks separate `p_baseline` from `p_current`.
    #[inline]
    pub fn has_elapsed(&self, p_baseline: ClockTick, p_current: ClockTick, p_period: u32) -> bool {
        self.elapsed_at(p_baseline, p_current) > p_period
    }

    pub fn source(&self) -> &T {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use proptest::prelude::*;

    struct FakeCounter(Cell<u32>);

    impl TickSource for FakeCounter {
        fn ticks(&self) -> u32 {
            self.0.get()
        }
    }

    struct FakeSysTick(Cell<u32>);

    impl TickSource for FakeSysTick {
        const MASK: u32 = 0x00FF_FFFF;

        fn ticks(&self) -> u32 {
            self.0.get()
        }
    }

    #[test]
    fn elapsed_survives_one_wrap() {
        let l_counter = ClockCounter::new(FakeCounter(Cell::new(1)));
        // u32::MAX -> 0 -> 1
        assert_eq!(l_counter.elapsed(u32::MAX), 2);
        assert_eq!(l_counter.elapsed(u32::MAX - 1), 3);
    }

    #[test]
    fn elapsed_without_wrap() {
        let l_counter = ClockCounter::new(FakeCounter(Cell::new(1500)));
        assert_eq!(l_counter.elapsed(1000), 500);
        assert!(l_counter.has_elapsed(1000, l_counter.now(), 499));
        assert!(!l_counter.has_elapsed(1000, l_counter.now(), 500));
    }

    #[test]
    fn has_elapsed_across_a_wrap() {
        let l_counter = ClockCounter::new(FakeSysTick(Cell::new(0)));
        assert!(l_counter.has_elapsed(0x00FF_FFF0, 0x0000_0001, 0x10));
        assert!(!l_counter.has_elapsed(0x00FF_FFF0, 0x0000_0000, 0x10));
    }

    #[test]
    fn narrow_counter_wraps_at_its_width() {
        let l_counter = ClockCounter::new(FakeSysTick(Cell::new(0x0000_0003)));
        assert_eq!(l_counter.elapsed(0x00FF_FFFE), 5);
        // Upper garbage bits of the register are ignored.
        l_counter.source().0.set(0xAB00_0010);
        assert_eq!(l_counter.now(), 0x10);
    }

    #[test]
    fn published_clock_is_visible() {
        publish_core_clock(Hertz(64_000_000));
        assert_eq!(system_core_clock(), Hertz(64_000_000));
    }

    proptest! {
        #[test]
        fn elapsed_matches_true_interval(p_baseline in any::<u32>(), p_delta in any::<u32>()) {
            let l_current = p_baseline.wrapping_add(p_delta);
            prop_assert_eq!(elapsed_between(p_baseline, l_current, u32::MAX), p_delta);
        }

        #[test]
        fn elapsed_matches_on_24_bit_counter(
            p_baseline in 0u32..0x0100_0000,
            p_delta in 0u32..0x0100_0000,
        ) {
            let l_current = (p_baseline + p_delta) & 0x00FF_FFFF;
            prop_assert_eq!(elapsed_between(p_baseline, l_current, 0x00FF_FFFF), p_delta);
        }
    }
}
