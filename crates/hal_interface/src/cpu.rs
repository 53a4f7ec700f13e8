//! Core control contract used by the boot sequence.
//!
//! Every method maps to one step of the MCU bring-up. Implementations are thin wrappers over
//! the vendor start-up code and the Cortex-M system control block.

use crate::HalResult;

/// Clock configuration requested at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockRequest {
    /// The core runs at a fixed, board-defined speed. Nothing needs to be configured.
    Fixed(u32),
    /// Start the oscillator and the PLL to reach `target` Hz.
    ///
    /// `xtal == 0` selects the internal RC oscillator as PLL source.
    Crystal { xtal: u32, target: u32 },
}

impl ClockRequest {
    /// Frequency the caller expects to run at once the clock tree is configured.
    pub fn target_hz(&self) -> u32 {
        match self {
            ClockRequest::Fixed(l_hz) => *l_hz,
            ClockRequest::Crystal { target, .. } => *target,
        }
    }
}

/// CPU and clock tree control.
pub trait Cpu {
    /// Prepares the MCU for running code: RAM regions, flash wait states, watchdog.
    fn preinit(&mut self);

    /// Applies static data initialization (.data copy, .bss zero, constructors).
    ///
    /// On targets where the reset handler already did the work this is a no-op.
    fn runtime_init(&mut self);

    /// Points the vector table offset register to the application vector table.
    fn install_vector_table(&mut self);

    /// Configures the clock tree and returns the resolved core frequency in Hz.
    ///
    /// # Errors
    /// Returns [`crate::HalError::ClockNotStarted`] if the oscillator or PLL did not lock.
    fn configure_clock(&mut self, p_request: ClockRequest) -> HalResult<u32>;

    /// Enables the floating point coprocessor if the core has one.
    fn enable_fpu(&mut self);

    /// Enables the instruction cache if the core has one.
    fn enable_icache(&mut self);

    /// Starts the free running cycle counter used as tick source.
    fn start_tick_source(&mut self);

    fn enable_interrupts(&mut self);

    fn disable_interrupts(&mut self);
}
