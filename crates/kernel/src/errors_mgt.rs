//! Error/exception management for the bring-up core.
//!
//! This module provides:
//! - A `HardFault` exception handler that prints the exception frame over semihosting.
//! - A custom `#[panic_handler]` that prints panic information, waits, then resets the MCU.
//! - [`fatal_halt`], the terminal state of an unrecoverable bootstrap failure.
//!
//! A fatal bootstrap error does not reset: resetting would run the same failing sequence again
//! or, worse, execute a half written image. The core stays in a busy spin until power cycle.

use crate::KernelError;
#[cfg(target_os = "none")]
use crate::{Hertz, Milliseconds, system_core_clock};
#[cfg(target_os = "none")]
use core::panic::PanicInfo;
#[cfg(target_os = "none")]
use cortex_m_rt::{ExceptionFrame, exception};
#[cfg(target_os = "none")]
use cortex_m_semihosting::hprintln;

/// Delay before reset after a panic.
#[cfg(target_os = "none")]
const K_PANIC_RESET_DELAY: Milliseconds = Milliseconds(5000);

/// Cortex-M HardFault exception handler.
///
/// Prints the exception frame and loops indefinitely.
#[cfg(target_os = "none")]
#[exception]
unsafe fn HardFault(ef: &ExceptionFrame) -> ! {
    hprintln!("{:#?}", ef);

    #[allow(clippy::empty_loop)]
    loop {}
}

/// Panic handler.
///
/// Prints the panic information using semihosting, then waits and resets the MCU.
#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    hprintln!("Bring-up has panicked !!!!!");
    hprintln!("{}", info);
    hprintln!("\r\nSystem will reboot in {}...", K_PANIC_RESET_DELAY);

    // Before the clock is published the core runs on its reset oscillator
    let l_clock = match system_core_clock().to_u32() {
        0 => 16_000_000,
        l_hz => l_hz,
    };
    cortex_m::asm::delay(Hertz(l_clock).ticks_for(K_PANIC_RESET_DELAY));

    cortex_m::peripheral::SCB::sys_reset();
}

/// Reports `p_err` and stops the system forever.
///
/// Used for every failure of the one-shot boot sequence. There is no retry and no watchdog
/// handling at this layer.
pub fn fatal_halt(p_err: &KernelError) -> ! {
    report(p_err);

    loop {
        core::hint::spin_loop();
    }
}

#[cfg(target_os = "none")]
fn report(p_err: &KernelError) {
    hprintln!("{}", p_err.to_string().as_str());
    hprintln!("System halted.");
}

#[cfg(not(target_os = "none"))]
fn report(_p_err: &KernelError) {}
