use core::fmt::Display;

/// A wrapper struct representing a frequency in Hertz.
///
/// Used for the core clock published at boot and for every period derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Hertz(pub u32);

impl Display for Hertz {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

impl Hertz {
    pub fn to_u32(&self) -> u32 {
        self.0
    }

    /// Number of ticks in `1 / p_divisor` second, i.e. `clock / p_divisor`.
    ///
    /// A zero divisor yields the full second.
    pub fn ticks_per(&self, p_divisor: u32) -> u32 {
        self.0 / p_divisor.max(1)
    }

    /// Number of ticks elapsing during `p_duration`.
    ///
    /// Saturates at `u32::MAX`: a 32-bit counter cannot measure longer than one wrap.
    pub fn ticks_for(&self, p_duration: Milliseconds) -> u32 {
        u32::try_from(self.0 as u64 * p_duration.0 as u64 / 1000).unwrap_or(u32::MAX)
    }
}

/// A wrapper struct representing a duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Milliseconds(pub u32);

impl Display for Milliseconds {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ms", self.0)
    }
}

impl Milliseconds {
    pub fn to_u32(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_periods_derive_from_core_clock() {
        let l_clock = Hertz(216_000_000);
        assert_eq!(l_clock.ticks_per(20), 10_800_000);
        assert_eq!(l_clock.ticks_per(2), 108_000_000);
    }

    #[test]
    fn milliseconds_do_not_overflow_on_fast_clocks() {
        let l_clock = Hertz(480_000_000);
        assert_eq!(l_clock.ticks_for(Milliseconds(5000)), 2_400_000_000);
        assert_eq!(l_clock.ticks_for(Milliseconds(1)), 480_000);
    }

    #[test]
    fn durations_past_one_counter_wrap_saturate() {
        let l_clock = Hertz(216_000_000);
        assert_eq!(l_clock.ticks_for(Milliseconds(19_884)), 4_294_944_000);
        assert_eq!(l_clock.ticks_for(Milliseconds(20_000)), u32::MAX);
        assert_eq!(l_clock.ticks_for(Milliseconds(u32::MAX)), u32::MAX);
    }
}
